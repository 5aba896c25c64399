//! In-memory script registry.
//!
//! A [`ScriptRegistry`] maps script keys to SQL text. Keys compare through
//! the registry's [`KeyComparer`] (case-insensitive by default); writing an
//! existing key replaces its text. The map sits behind a reader/writer lock,
//! so a registry shared as `Arc<ScriptRegistry>` can be read and populated
//! from any thread.

use crate::loader::ScriptLoader;
use crate::template::TagTemplate;
use parking_lot::RwLock;
use sqlscript_core::{Error, Params, Result, ToParams};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// How script keys are compared.
#[derive(Clone, Default)]
pub enum KeyComparer {
    /// Unicode lowercase folding.
    #[default]
    IgnoreCase,
    /// ASCII-only case folding.
    IgnoreAsciiCase,
    /// Exact byte comparison.
    Ordinal,
    /// Keys are equal when the function maps them to the same string.
    Custom(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl KeyComparer {
    /// Create a custom comparer from a normalizing function.
    pub fn custom(normalize: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        KeyComparer::Custom(Arc::new(normalize))
    }

    /// The canonical form two equal keys share.
    pub fn normalize(&self, key: &str) -> String {
        match self {
            KeyComparer::IgnoreCase => key.to_lowercase(),
            KeyComparer::IgnoreAsciiCase => key.to_ascii_lowercase(),
            KeyComparer::Ordinal => key.to_string(),
            KeyComparer::Custom(normalize) => normalize(key),
        }
    }

    pub fn equals(&self, a: &str, b: &str) -> bool {
        self.normalize(a) == self.normalize(b)
    }
}

impl fmt::Debug for KeyComparer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyComparer::IgnoreCase => f.write_str("IgnoreCase"),
            KeyComparer::IgnoreAsciiCase => f.write_str("IgnoreAsciiCase"),
            KeyComparer::Ordinal => f.write_str("Ordinal"),
            KeyComparer::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    /// Key as last written.
    key: String,
    text: Arc<str>,
}

/// Keyed store of SQL scripts with tag substitution on resolve.
#[derive(Debug, Default)]
pub struct ScriptRegistry {
    scripts: RwLock<HashMap<String, Entry>>,
    comparer: KeyComparer,
    template: TagTemplate,
}

impl ScriptRegistry {
    /// An empty registry with case-insensitive keys and the default template.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty registry using `comparer` for keys.
    pub fn with_comparer(comparer: KeyComparer) -> Self {
        Self {
            comparer,
            ..Self::default()
        }
    }

    /// Replace the substitution template. Intended for construction time.
    pub fn with_template(mut self, template: TagTemplate) -> Self {
        self.template = template;
        self
    }

    /// Loader writing into this registry.
    pub fn add(&self) -> ScriptLoader<'_> {
        ScriptLoader::new(self)
    }

    pub fn comparer(&self) -> &KeyComparer {
        &self.comparer
    }

    pub fn template(&self) -> &TagTemplate {
        &self.template
    }

    /// Store `text` under `key`, replacing any earlier script with an equal
    /// key. Returns true when a script was replaced.
    pub(crate) fn insert(&self, key: &str, text: impl Into<Arc<str>>) -> bool {
        let entry = Entry {
            key: key.to_string(),
            text: text.into(),
        };
        let replaced = self
            .scripts
            .write()
            .insert(self.comparer.normalize(key), entry)
            .is_some();
        tracing::debug!(key, replaced, "registered SQL script");
        replaced
    }

    fn lookup(&self, key: &str) -> Result<Arc<str>> {
        self.scripts
            .read()
            .get(&self.comparer.normalize(key))
            .map(|entry| Arc::clone(&entry.text))
            .ok_or_else(|| Error::script_not_found(key))
    }

    /// Raw SQL text stored under `key`.
    pub fn get(&self, key: &str) -> Result<Arc<str>> {
        self.lookup(key)
    }

    /// SQL text stored under `key` with tags replaced from `params`.
    pub fn get_with(&self, key: &str, params: impl ToParams) -> Result<String> {
        let text = self.lookup(key)?;
        Ok(self.template.render(&text, &params.to_params()).into_owned())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.scripts
            .read()
            .contains_key(&self.comparer.normalize(key))
    }

    pub fn len(&self) -> usize {
        self.scripts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.read().is_empty()
    }

    /// Keys currently stored, sorted, in the spelling last written.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .scripts
            .read()
            .values()
            .map(|entry| entry.key.clone())
            .collect();
        keys.sort();
        keys
    }
}

/// Resolves script keys to executable SQL text.
///
/// Implemented by the registry itself and by everything that carries one
/// (script-bound connections, [`Scripted`](crate::Scripted) pairs).
pub trait ScriptResolver {
    /// SQL text for `key` with tags replaced from `params`.
    fn script_sql(&self, key: &str, params: &Params) -> Result<String>;
}

impl ScriptResolver for ScriptRegistry {
    fn script_sql(&self, key: &str, params: &Params) -> Result<String> {
        self.get_with(key, params)
    }
}

impl<R: ScriptResolver + ?Sized> ScriptResolver for &R {
    fn script_sql(&self, key: &str, params: &Params) -> Result<String> {
        (**self).script_sql(key, params)
    }
}

impl<R: ScriptResolver + ?Sized> ScriptResolver for Arc<R> {
    fn script_sql(&self, key: &str, params: &Params) -> Result<String> {
        (**self).script_sql(key, params)
    }
}
