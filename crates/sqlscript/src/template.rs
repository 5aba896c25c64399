//! Delimiter-bounded tag substitution.
//!
//! A tag is a name wrapped in a start and stop delimiter, `[<TableName>]`
//! with the default template. [`TagTemplate::render`] replaces each tag with
//! the matching value from a [`TagValues`] source in a single left-to-right
//! pass. There is no nesting and no escaping; an unterminated tag is copied
//! through literally.
//!
//! ```
//! use sqlscript::{MissingTag, TagTemplate, params};
//!
//! let template = TagTemplate::default();
//! let sql = template.render("select * from [<TableName>]", &params! { "tablename" => "Fruit" });
//! assert_eq!(sql, "select * from Fruit");
//!
//! let lenient = TagTemplate::moustache();
//! assert_eq!(lenient.missing(), MissingTag::Empty);
//! assert_eq!(lenient.render("a {{x}} b", &params! {}), "a  b");
//! ```

use serde::{Deserialize, Serialize};
use sqlscript_core::{Error, Params, Result, same_name};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Write as _};

/// What to emit for a tag whose name has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingTag {
    /// Drop the tag.
    Empty,
    /// Keep the tag text, delimiters included.
    #[default]
    Source,
}

/// Delimiters and missing-value policy for tag substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTemplate", into = "RawTemplate")]
pub struct TagTemplate {
    start: String,
    stop: String,
    missing: MissingTag,
}

#[derive(Serialize, Deserialize)]
struct RawTemplate {
    #[serde(default = "default_start")]
    start: String,
    #[serde(default = "default_stop")]
    stop: String,
    #[serde(default)]
    missing: MissingTag,
}

fn default_start() -> String {
    "[<".to_string()
}

fn default_stop() -> String {
    ">]".to_string()
}

impl TryFrom<RawTemplate> for TagTemplate {
    type Error = Error;

    fn try_from(raw: RawTemplate) -> Result<Self> {
        Ok(TagTemplate::with_delimiters(raw.start, raw.stop)?.on_missing(raw.missing))
    }
}

impl From<TagTemplate> for RawTemplate {
    fn from(t: TagTemplate) -> Self {
        RawTemplate {
            start: t.start,
            stop: t.stop,
            missing: t.missing,
        }
    }
}

impl Default for TagTemplate {
    /// `[<` / `>]`, keeping unmatched tags.
    fn default() -> Self {
        Self {
            start: default_start(),
            stop: default_stop(),
            missing: MissingTag::Source,
        }
    }
}

impl TagTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single angle brackets, `<name>`, keeping unmatched tags.
    pub fn angle() -> Self {
        Self {
            start: "<".to_string(),
            stop: ">".to_string(),
            missing: MissingTag::Source,
        }
    }

    /// Moustache braces, `{{name}}`, dropping unmatched tags.
    pub fn moustache() -> Self {
        Self {
            start: "{{".to_string(),
            stop: "}}".to_string(),
            missing: MissingTag::Empty,
        }
    }

    /// Custom delimiters. Both must be non-empty.
    pub fn with_delimiters(start: impl Into<String>, stop: impl Into<String>) -> Result<Self> {
        let start = start.into();
        let stop = stop.into();
        if start.is_empty() {
            return Err(Error::invalid_argument("start"));
        }
        if stop.is_empty() {
            return Err(Error::invalid_argument("stop"));
        }
        Ok(Self {
            start,
            stop,
            missing: MissingTag::Source,
        })
    }

    pub fn on_missing(mut self, missing: MissingTag) -> Self {
        self.missing = missing;
        self
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn stop(&self) -> &str {
        &self.stop
    }

    pub fn missing(&self) -> MissingTag {
        self.missing
    }

    /// Replace every tag in `text`.
    ///
    /// Text without a complete tag comes back borrowed.
    pub fn render<'a, V: TagValues + ?Sized>(&self, text: &'a str, values: &V) -> Cow<'a, str> {
        let mut out: Option<String> = None;
        let mut cursor = 0;

        while cursor < text.len() {
            let Some(x) = text[cursor..].find(&self.start).map(|i| cursor + i) else {
                break;
            };
            let name_start = x + self.start.len();
            let Some(y) = text[name_start..].find(&self.stop).map(|i| name_start + i) else {
                break;
            };

            let buf = out.get_or_insert_with(|| String::with_capacity(text.len()));
            buf.push_str(&text[cursor..x]);
            cursor = y + self.stop.len();

            let name = &text[name_start..y];
            if !values.write_tag(name, buf) && self.missing == MissingTag::Source {
                buf.push_str(&text[x..cursor]);
            }
        }

        match out {
            Some(mut buf) => {
                buf.push_str(&text[cursor..]);
                Cow::Owned(buf)
            }
            None => Cow::Borrowed(text),
        }
    }
}

/// A source of tag values, looked up by tag name ignoring case.
pub trait TagValues {
    /// Append the value named `name` to `out`; `false` when there is none.
    fn write_tag(&self, name: &str, out: &mut String) -> bool;
}

impl TagValues for Params {
    fn write_tag(&self, name: &str, out: &mut String) -> bool {
        match self.get(name) {
            Some(value) => {
                let _ = write!(out, "{value}");
                true
            }
            None => false,
        }
    }
}

impl<T: TagValues + ?Sized> TagValues for &T {
    fn write_tag(&self, name: &str, out: &mut String) -> bool {
        (**self).write_tag(name, out)
    }
}

fn write_found<'v, V: Display + 'v>(
    mut entries: impl Iterator<Item = (&'v str, &'v V)>,
    name: &str,
    out: &mut String,
) -> bool {
    match entries.find(|(key, _)| same_name(key, name)) {
        Some((_, value)) => {
            let _ = write!(out, "{value}");
            true
        }
        None => false,
    }
}

impl<K: AsRef<str>, V: Display, S> TagValues for HashMap<K, V, S> {
    fn write_tag(&self, name: &str, out: &mut String) -> bool {
        write_found(self.iter().map(|(k, v)| (k.as_ref(), v)), name, out)
    }
}

impl<K: AsRef<str>, V: Display> TagValues for BTreeMap<K, V> {
    fn write_tag(&self, name: &str, out: &mut String) -> bool {
        write_found(self.iter().map(|(k, v)| (k.as_ref(), v)), name, out)
    }
}
