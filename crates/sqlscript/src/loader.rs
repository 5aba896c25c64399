//! Populating a registry from resource containers, directories, files and
//! literal strings.
//!
//! Every operation validates its arguments before touching any I/O, writes
//! each script as soon as it has been read, and stops at the first failure.
//! Scripts written before a failure stay in the registry.

use crate::registry::ScriptRegistry;
use asupersync::{Cx, Outcome};
use futures::future::join_all;
use sqlscript_core::{Error, ResourceError, ResourceErrorKind, Result};
use std::borrow::Cow;
use std::path::Path;

/// Character encoding of script bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
    /// ISO-8859-1; every byte is one character.
    Latin1,
}

impl TextEncoding {
    /// Decode `bytes`, dropping a leading byte-order mark of this encoding.
    pub fn decode(self, bytes: &[u8]) -> std::result::Result<String, String> {
        match self {
            TextEncoding::Utf8 => {
                let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string())
            }
            TextEncoding::Utf16Le => {
                let bytes = bytes.strip_prefix(b"\xFF\xFE").unwrap_or(bytes);
                decode_utf16(bytes, u16::from_le_bytes)
            }
            TextEncoding::Utf16Be => {
                let bytes = bytes.strip_prefix(b"\xFE\xFF").unwrap_or(bytes);
                decode_utf16(bytes, u16::from_be_bytes)
            }
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> std::result::Result<String, String> {
    if bytes.len() % 2 != 0 {
        return Err(format!("odd byte length {} for UTF-16 text", bytes.len()));
    }
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| e.to_string())
}

/// How a file or resource name becomes a script key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyStyle {
    /// The name including its extension, `Users.sql`.
    #[default]
    FileName,
    /// The name without its final extension, `Users`.
    FileStem,
}

impl KeyStyle {
    fn apply(self, name: &str) -> &str {
        match self {
            KeyStyle::FileName => name,
            KeyStyle::FileStem => match name.rfind('.') {
                Some(dot) if dot > 0 => &name[..dot],
                _ => name,
            },
        }
    }
}

/// A named set of binary resources, such as scripts compiled into the binary.
pub trait ResourceContainer: Send + Sync {
    /// Container name used in error messages.
    fn name(&self) -> &str;

    /// Every resource name, in a stable order.
    fn resource_names(&self) -> Vec<String>;

    /// Contents of a resource, or `None` when it cannot be opened.
    fn open(&self, name: &str) -> Option<Cow<'_, [u8]>>;

    /// Asynchronous form of [`open`](ResourceContainer::open).
    fn read_async(&self, name: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send {
        async move { Ok(self.open(name).map(Cow::into_owned)) }
    }
}

/// A static table of resources.
///
/// Usually built with [`embedded_resources!`](crate::embedded_resources),
/// which embeds files through `include_bytes!`.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedResources {
    name: &'static str,
    entries: &'static [(&'static str, &'static [u8])],
}

impl EmbeddedResources {
    pub const fn new(name: &'static str, entries: &'static [(&'static str, &'static [u8])]) -> Self {
        Self { name, entries }
    }

    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceContainer for EmbeddedResources {
    fn name(&self) -> &str {
        self.name
    }

    fn resource_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(name, _)| (*name).to_string())
            .collect()
    }

    fn open(&self, name: &str) -> Option<Cow<'_, [u8]>> {
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, bytes)| Cow::Borrowed(*bytes))
    }
}

/// Build an [`EmbeddedResources`] table from files embedded at compile time.
///
/// Paths are relative to the invoking source file, as with `include_bytes!`.
///
/// ```ignore
/// static SCRIPTS: EmbeddedResources = sqlscript::embedded_resources!("app";
///     "app.sql.Users.sql" => "../sql/Users.sql",
///     "app.sql.Orders.sql" => "../sql/Orders.sql",
/// );
/// ```
#[macro_export]
macro_rules! embedded_resources {
    ($name:expr; $($resource:expr => $path:expr),* $(,)?) => {{
        const ENTRIES: &[(&str, &[u8])] = &[$(($resource, include_bytes!($path))),*];
        $crate::EmbeddedResources::new($name, ENTRIES)
    }};
}

/// Container-relative key: the prefix and one leading separator removed.
fn container_key<'n>(name: &'n str, prefix: &str) -> Option<&'n str> {
    let rest = name.strip_prefix(prefix)?;
    let rest = rest
        .strip_prefix(['.', '/', '\\'])
        .unwrap_or(rest);
    (!rest.is_empty()).then_some(rest)
}

fn decode_error(resource: &str, container: &str, message: String) -> Error {
    Error::Resource(ResourceError {
        kind: ResourceErrorKind::Decode,
        resource: resource.to_string(),
        container: container.to_string(),
        message: Some(message),
    })
}

/// Writes scripts into a [`ScriptRegistry`]. Obtained from
/// [`ScriptRegistry::add`].
#[derive(Debug, Clone, Copy)]
pub struct ScriptLoader<'r> {
    registry: &'r ScriptRegistry,
    encoding: TextEncoding,
    key_style: KeyStyle,
}

impl<'r> ScriptLoader<'r> {
    pub(crate) fn new(registry: &'r ScriptRegistry) -> Self {
        Self {
            registry,
            encoding: TextEncoding::Utf8,
            key_style: KeyStyle::FileName,
        }
    }

    /// Encoding of resource and file bytes (UTF-8 by default).
    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// How names become keys (file name with extension by default).
    pub fn key_style(mut self, key_style: KeyStyle) -> Self {
        self.key_style = key_style;
        self
    }

    fn store(&self, name: &str, bytes: &[u8], resource: &str, container: &str) -> Result<()> {
        let text = self
            .encoding
            .decode(bytes)
            .map_err(|message| decode_error(resource, container, message))?;
        self.registry.insert(self.key_style.apply(name), text);
        Ok(())
    }

    /// Load every resource whose name starts with `prefix`.
    ///
    /// Returns the number of scripts written.
    #[tracing::instrument(level = "debug", skip(self, container), fields(container = container.name()))]
    pub fn from_container<C: ResourceContainer + ?Sized>(
        &self,
        container: &C,
        prefix: &str,
    ) -> Result<usize> {
        if prefix.is_empty() {
            return Err(Error::invalid_argument("prefix"));
        }

        let mut loaded = 0;
        for resource in container.resource_names() {
            let Some(key) = container_key(&resource, prefix) else {
                continue;
            };
            let bytes = container
                .open(&resource)
                .ok_or_else(|| Error::resource_not_found(&resource, container.name()))?;
            self.store(key, &bytes, &resource, container.name())?;
            loaded += 1;
        }

        tracing::debug!(loaded, "loaded scripts from container");
        Ok(loaded)
    }

    /// Concurrent form of [`from_container`](Self::from_container).
    ///
    /// All matching resources are read at once. Each script is written as
    /// soon as its read completes; when several reads fail, the failure of
    /// the resource listed first is returned. Two resources mapping to the
    /// same key race, and the later write wins.
    #[tracing::instrument(level = "debug", skip(self, cx, container), fields(container = container.name()))]
    pub async fn from_container_async<C: ResourceContainer + ?Sized>(
        &self,
        cx: &Cx,
        container: &C,
        prefix: &str,
    ) -> Outcome<usize, Error> {
        if prefix.is_empty() {
            return Outcome::Err(Error::invalid_argument("prefix"));
        }
        if let Some(reason) = cx.cancel_reason() {
            return Outcome::Cancelled(reason);
        }

        let names = container.resource_names();
        let reads = names.iter().filter_map(|resource| {
            let key = container_key(resource, prefix)?;
            Some(async move {
                let bytes = container
                    .read_async(resource)
                    .await?
                    .ok_or_else(|| Error::resource_not_found(resource, container.name()))?;
                self.store(key, &bytes, resource, container.name())
            })
        });

        let mut loaded = 0;
        for result in join_all(reads).await {
            if let Err(e) = result {
                return Outcome::Err(e);
            }
            loaded += 1;
        }

        tracing::debug!(loaded, "loaded scripts from container");
        Outcome::Ok(loaded)
    }

    /// Load every `*.sql` file directly inside `path`, in file-name order.
    ///
    /// The extension match ignores case; subdirectories are not visited.
    /// Symbolic links to files are followed.
    #[tracing::instrument(level = "debug", skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn from_directory(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Error::invalid_argument("path"));
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let file_path = entry.path();
            let is_sql = file_path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"));
            if is_sql && file_path.is_file() {
                files.push(file_path);
            }
        }
        files.sort();

        let container = path.display().to_string();
        for file in &files {
            self.load_file(file, &container)?;
        }

        tracing::debug!(loaded = files.len(), "loaded scripts from directory");
        Ok(files.len())
    }

    /// Load a single file. Returns the key it was stored under.
    pub fn from_file(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Error::invalid_argument("path"));
        }
        let container = path
            .parent()
            .map(|parent| parent.display().to_string())
            .unwrap_or_default();
        self.load_file(path, &container)
    }

    fn load_file(&self, path: &Path, container: &str) -> Result<String> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::invalid_argument("path"))?;
        let bytes = std::fs::read(path)?;
        self.store(&file_name, &bytes, &file_name, container)?;
        Ok(self.key_style.apply(&file_name).to_string())
    }

    /// Store `text` under `key` as given. No I/O, no key style applied.
    pub fn from_literal(&self, key: &str, text: impl Into<String>) -> Result<()> {
        if key.is_empty() {
            return Err(Error::invalid_argument("key"));
        }
        self.registry.insert(key, text.into());
        Ok(())
    }
}
