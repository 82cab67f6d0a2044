//! Layered property lookup and `{{key}}` template substitution
//!
//! A [`PropertySet`] is an ordered list of layers searched from the highest
//! precedence down. The bottom layer holds values loaded from properties
//! files, the top layer holds values exported by steps while a run executes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::common::paths;
use crate::common::{Error, Result};

/// Opening delimiter of a placeholder
const TAG_START: &str = "{{";
/// Closing delimiter of a placeholder
const TAG_END: &str = "}}";

/// Name of the layer holding properties-file values
pub const FILE_LAYER: &str = "file";
/// Name of the layer holding step exports
pub const RUNTIME_LAYER: &str = "runtime";

/// A named map of properties
#[derive(Debug, Clone, PartialEq, Eq)]
struct Layer {
    name: String,
    values: BTreeMap<String, String>,
}

/// Layered key/value store used for variable substitution
///
/// Layers are stored lowest precedence first; the runtime layer is always last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySet {
    layers: Vec<Layer>,
}

impl Default for PropertySet {
    fn default() -> Self {
        Self::new(BTreeMap::new())
    }
}

impl PropertySet {
    /// Create a set with the given file-loaded values and an empty runtime layer
    pub fn new(file_values: BTreeMap<String, String>) -> Self {
        Self {
            layers: vec![
                Layer {
                    name: FILE_LAYER.to_string(),
                    values: file_values,
                },
                Layer {
                    name: RUNTIME_LAYER.to_string(),
                    values: BTreeMap::new(),
                },
            ],
        }
    }

    /// Add a named layer directly beneath the runtime layer
    pub fn with_layer(mut self, name: &str, values: BTreeMap<String, String>) -> Self {
        let at = self.layers.len() - 1;
        self.layers.insert(
            at,
            Layer {
                name: name.to_string(),
                values,
            },
        );
        self
    }

    /// Layer names, lowest precedence first
    pub fn layers(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.name.as_str()).collect()
    }

    /// Look a key up, walking layers from highest to lowest precedence
    pub fn get(&self, key: &str) -> Option<&str> {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| layer.values.get(key))
            .map(String::as_str)
    }

    /// Look a key up, failing with `UnresolvedProperty` for the given step
    pub fn resolve(&self, key: &str, step: usize) -> Result<&str> {
        self.get(key).ok_or_else(|| Error::UnresolvedProperty {
            key: key.to_string(),
            step,
        })
    }

    /// Replace every `{{key}}` placeholder in `text`
    ///
    /// Substitution is single-pass: resolved values are copied verbatim and
    /// never scanned for further placeholders. An opening `{{` without a
    /// closing `}}` is kept as literal text.
    pub fn resolve_template(&self, text: &str, step: usize) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find(TAG_START) {
            let after = &rest[start + TAG_START.len()..];
            let Some(end) = after.find(TAG_END) else {
                break;
            };

            out.push_str(&rest[..start]);
            let key = after[..end].trim();
            out.push_str(self.resolve(key, step)?);
            rest = &after[end + TAG_END.len()..];
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Write a value into the runtime layer
    pub fn export(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if let Some(runtime) = self.layers.last_mut() {
            runtime.values.insert(key.into(), value.into());
        }
    }

    /// Values currently held by the runtime layer
    pub fn runtime(&self) -> &BTreeMap<String, String> {
        // The runtime layer is created in `new` and never removed
        &self.layers[self.layers.len() - 1].values
    }
}

/// Parse line-oriented `key=value` properties text
///
/// Accepts `=` or `:` separators, `#` and `!` comment lines, and a trailing
/// backslash to continue a value on the next line.
pub fn parse_properties(content: &str, path: &Path) -> Result<BTreeMap<String, String>> {
    let mut values = BTreeMap::new();
    let mut pending = String::new();
    let mut pending_line = 0;

    for (i, raw) in content.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();

        if pending.is_empty() {
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            pending_line = line_no;
        }

        if let Some(stripped) = line.strip_suffix('\\') {
            pending.push_str(stripped);
            continue;
        }
        pending.push_str(line);

        let entry = std::mem::take(&mut pending);
        let (key, value) = split_entry(&entry).ok_or_else(|| Error::PropertiesParse {
            path: path.to_path_buf(),
            line: pending_line,
            message: format!("expected 'key=value', got '{}'", entry),
        })?;
        values.insert(key.to_string(), value.to_string());
    }

    if !pending.is_empty() {
        return Err(Error::PropertiesParse {
            path: path.to_path_buf(),
            line: pending_line,
            message: "file ends inside a line continuation".to_string(),
        });
    }

    Ok(values)
}

fn split_entry(entry: &str) -> Option<(&str, &str)> {
    let sep = entry.find(['=', ':'])?;
    let key = entry[..sep].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, entry[sep + 1..].trim()))
}

/// Load a single properties file, which must exist
pub fn load_properties_file(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
    parse_properties(&content, path)
}

/// Build the file-loaded layer for a run
///
/// Files are merged lowest precedence first: the global properties file in
/// the config directory, the workspace `local.properties`, then `custom`.
/// Missing global/workspace files are skipped; a missing `custom` file is an error.
pub fn load_layered(workspace: &Path, custom: Option<&Path>) -> Result<BTreeMap<String, String>> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(global) = paths::global_properties_path() {
        candidates.push(global);
    }
    candidates.push(paths::local_properties_path(workspace));

    let mut merged = BTreeMap::new();
    for path in candidates {
        if path.is_file() {
            let values = load_properties_file(&path)?;
            tracing::trace!(path = %path.display(), count = values.len(), "Loaded properties file");
            merged.extend(values);
        } else {
            tracing::trace!(path = %path.display(), "Properties file not found");
        }
    }

    if let Some(custom) = custom {
        let values = load_properties_file(custom)?;
        tracing::trace!(path = %custom.display(), count = values.len(), "Loaded custom properties");
        merged.extend(values);
    }

    tracing::debug!(count = merged.len(), "Loaded properties");
    Ok(merged)
}
