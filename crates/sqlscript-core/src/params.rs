//! Named parameter bags.
//!
//! [`Params`] is the ordered `name -> value` collection passed alongside a
//! script key. It feeds both tag substitution and statement binding. Name
//! lookups ignore case, and setting an existing name replaces its value in
//! place.

use crate::Result;
use crate::error::Error;
use crate::value::Value;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Ordered collection of named values with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, Value)>,
}

/// Compare two parameter names ignoring case, with Unicode lowercase folding.
pub fn same_name(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
        || a.chars()
            .flat_map(char::to_lowercase)
            .eq(b.chars().flat_map(char::to_lowercase))
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Params::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a value, replacing any entry whose name matches ignoring case.
    ///
    /// A replaced entry keeps its position and original spelling.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| same_name(n, &name)) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| same_name(n, name))
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(n, _)| same_name(n, name))?;
        Some(self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Merge `other` into `self`; names already present are overwritten.
    pub fn extend(&mut self, other: Params) {
        for (name, value) in other.entries {
            self.set(name, value);
        }
    }

    /// Enumerate the fields of any serializable value.
    ///
    /// The value must serialize to a map (a struct, a map, or a unit
    /// `Option::None`, which yields no parameters). Field values convert
    /// structurally, see `From<serde_json::Value> for Value`.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        match serde_json::to_value(value)? {
            serde_json::Value::Object(map) => Ok(map
                .into_iter()
                .fold(Params::new(), |params, (name, v)| params.with(name, v))),
            serde_json::Value::Null => Ok(Params::new()),
            other => Err(Error::Serde(format!(
                "expected a struct or map for parameters, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a sequence",
        serde_json::Value::Object(_) => "a map",
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = (&'a str, &'a Value);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a Value)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.set(k, v);
        }
        params
    }
}

/// Anything that can be viewed as a set of named parameters.
///
/// Implement it for your own types with `#[derive(ToParams)]`, or go through
/// [`Params::from_serialize`] for serde types.
pub trait ToParams {
    fn to_params(&self) -> Params;
}

impl ToParams for Params {
    fn to_params(&self) -> Params {
        self.clone()
    }
}

impl ToParams for () {
    fn to_params(&self) -> Params {
        Params::new()
    }
}

impl<T: ToParams + ?Sized> ToParams for &T {
    fn to_params(&self) -> Params {
        (**self).to_params()
    }
}

impl<T: ToParams> ToParams for Option<T> {
    fn to_params(&self) -> Params {
        self.as_ref().map(ToParams::to_params).unwrap_or_default()
    }
}

impl<K, V, S> ToParams for HashMap<K, V, S>
where
    K: AsRef<str>,
    V: Clone + Into<Value>,
{
    fn to_params(&self) -> Params {
        self.iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.clone()))
            .collect()
    }
}

impl<K, V> ToParams for BTreeMap<K, V>
where
    K: AsRef<str>,
    V: Clone + Into<Value>,
{
    fn to_params(&self) -> Params {
        self.iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.clone()))
            .collect()
    }
}

impl<K, V> ToParams for [(K, V)]
where
    K: AsRef<str>,
    V: Clone + Into<Value>,
{
    fn to_params(&self) -> Params {
        self.iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.clone()))
            .collect()
    }
}

impl<K, V> ToParams for Vec<(K, V)>
where
    K: AsRef<str>,
    V: Clone + Into<Value>,
{
    fn to_params(&self) -> Params {
        self.as_slice().to_params()
    }
}

impl<K, V, const N: usize> ToParams for [(K, V); N]
where
    K: AsRef<str>,
    V: Clone + Into<Value>,
{
    fn to_params(&self) -> Params {
        self.as_slice().to_params()
    }
}

/// Build a [`Params`] from `name => value` pairs.
///
/// ```
/// use sqlscript_core::params;
///
/// let p = params! { "TableName" => "Fruit", "limit" => 10 };
/// assert_eq!(p.len(), 2);
/// assert!(p.contains("tablename"));
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::Params::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::Params::new()$(.with($name, $value))+
    };
}
