//! JSON dialect documents.
//!
//! A dialect is a root object with an optional `include` list (paths
//! relative to the including file, merged first) and a `messages` list:
//!
//! ```text
//! {
//!   "include": ["common.json"],
//!   "messages": [
//!     { "id": 0, "name": "HEARTBEAT",
//!       "fields": [ { "type": "uint32_t", "name": "custom_mode" } ] }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::LoaderConfig;
use crate::definition::MessageDefinition;
use crate::error::{Result, SchemaError};
use crate::field::FieldSpec;
use crate::registry::Schema;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DialectDocument {
    #[serde(default)]
    include: Vec<PathBuf>,
    #[serde(default)]
    messages: Vec<MessageEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MessageEntry {
    id: u32,
    name: String,
    #[serde(default)]
    fields: Vec<FieldEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldEntry {
    #[serde(rename = "type")]
    type_spec: String,
    name: String,
}

impl MessageEntry {
    fn into_definition(self) -> Result<MessageDefinition> {
        let id = u8::try_from(self.id).map_err(|_| SchemaError::IdOutOfRange {
            message: self.name.clone(),
            id: self.id,
        })?;
        let fields = self
            .fields
            .into_iter()
            .map(|field| FieldSpec::parse(&field.type_spec, field.name))
            .collect::<Result<Vec<_>>>()?;
        MessageDefinition::new(id, self.name, fields)
    }
}

impl Schema {
    /// Build a schema from a self-contained JSON dialect document.
    ///
    /// Documents with an `include` list must be loaded from a file so the
    /// includes can be resolved; see [`Schema::from_file`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: DialectDocument = serde_json::from_str(json)?;
        if !document.include.is_empty() {
            return Err(SchemaError::LoadFailed(
                "includes require a dialect file path".to_string(),
            ));
        }
        let mut schema = Schema::new();
        register_messages(&mut schema, document.messages)?;
        Ok(schema)
    }

    /// Load a dialect file and its includes.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_file_with_config(path, LoaderConfig::default())
    }

    /// Load a dialect file and its includes with explicit limits.
    pub fn from_file_with_config(path: &Path, config: LoaderConfig) -> Result<Self> {
        let mut loader = Loader {
            config,
            schema: Schema::new(),
            active: HashSet::new(),
        };
        loader.load(path, 0)?;
        tracing::debug!(
            path = %path.display(),
            messages = loader.schema.len(),
            "loaded dialect"
        );
        Ok(loader.schema)
    }
}

struct Loader {
    config: LoaderConfig,
    schema: Schema,
    /// Files on the current include path, for cycle detection.
    active: HashSet<PathBuf>,
}

impl Loader {
    fn load(&mut self, path: &Path, depth: usize) -> Result<()> {
        if depth > self.config.max_include_depth {
            return Err(SchemaError::IncludeTooDeep(self.config.max_include_depth));
        }

        let canonical = std::fs::canonicalize(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;
        if !self.active.insert(canonical.clone()) {
            return Err(SchemaError::IncludeCycle(canonical));
        }

        let content = read_limited(&canonical, self.config.max_file_size)?;
        let document: DialectDocument = serde_json::from_str(&content)?;
        let base = canonical.parent().map(Path::to_path_buf).unwrap_or_default();

        for include in &document.include {
            self.load(&base.join(include), depth + 1)?;
        }
        register_messages(&mut self.schema, document.messages)?;

        self.active.remove(&canonical);
        Ok(())
    }
}

fn register_messages(schema: &mut Schema, messages: Vec<MessageEntry>) -> Result<()> {
    for entry in messages {
        schema.register(entry.into_definition()?);
    }
    Ok(())
}

fn read_limited(path: &Path, max_bytes: usize) -> Result<String> {
    let file = std::fs::File::open(path)
        .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;

    let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
    let mut content = String::new();
    file.take(read_limit)
        .read_to_string(&mut content)
        .map_err(|err| {
            SchemaError::LoadFailed(format!("failed reading {}: {err}", path.display()))
        })?;
    if content.len() > max_bytes {
        return Err(SchemaError::LoadFailed(format!(
            "dialect file too large: {}",
            path.display()
        )));
    }
    Ok(content)
}
