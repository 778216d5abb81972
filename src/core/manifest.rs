//! Package manifest reading and byte-reproducible rewriting.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{Error, Result};

/// A `package.json`-style manifest held as a parsed JSON document.
///
/// The document keeps its key order, so a read-patch-write cycle changes
/// only the fields it touches. Output is 2-space-indented JSON with a
/// trailing newline — the manifest is committed and published as-is, so
/// the serialization must be reproducible byte for byte.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    document: Value,
}

impl Manifest {
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::internal_io(
                format!("Error reading {}: {}", path.display(), e),
                Some("read manifest".to_string()),
            )
        })?;
        let document: Value =
            serde_json::from_str(&content).map_err(|e| Error::manifest_invalid_json(path, e))?;
        if !document.is_object() {
            return Err(Error::internal_unexpected(format!(
                "Manifest root in {} is not a JSON object",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> Option<&str> {
        self.document.get("version").and_then(Value::as_str)
    }

    /// Read the version field, failing when absent or not a string.
    pub fn require_version(&self) -> Result<String> {
        self.version()
            .map(str::to_string)
            .ok_or_else(|| Error::manifest_missing_key("version", &self.path))
    }

    pub fn set_version(&mut self, version: &str) {
        if let Some(object) = self.document.as_object_mut() {
            object.insert(
                "version".to_string(),
                Value::String(version.to_string()),
            );
        }
    }

    /// Write the document back to its file verbatim.
    pub fn write(&self) -> Result<()> {
        let serialized = to_pretty_string(&self.document)?;
        fs::write(&self.path, serialized).map_err(|e| {
            Error::internal_io(
                format!("Error writing {}: {}", self.path.display(), e),
                Some("write manifest".to_string()),
            )
        })
    }
}

/// 2-space-indented JSON plus a trailing newline.
pub fn to_pretty_string(value: &Value) -> Result<String> {
    let body = serde_json::to_string_pretty(value)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize manifest".to_string())))?;
    Ok(format!("{}\n", body))
}
