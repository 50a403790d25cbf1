//! JSON export and import of label sets.
//!
//! The file format is a plain JSON array of labels. Import is all-or-nothing:
//! the whole payload is checked before any label is returned.

use crate::model::Label;
use anyhow::{Context, Result};
use labelkit_core::ValidationError;
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Default file name for exported label data
pub const LABELS_FILE_NAME: &str = "labels.json";

/// Properties every imported label must carry with a non-empty value
pub const REQUIRED_FIELDS: [&str; 5] = ["id", "size", "elements", "uuid", "shortUuid"];

/// Serialize labels as a pretty-printed JSON array.
pub fn export_labels_json(labels: &[Label]) -> Result<String> {
    serde_json::to_string_pretty(labels).context("Failed to serialize labels")
}

/// Write labels to `path` as JSON.
pub fn save_labels(path: impl AsRef<Path>, labels: &[Label]) -> Result<()> {
    let json = export_labels_json(labels)?;
    std::fs::write(path.as_ref(), json)
        .with_context(|| format!("Failed to write {}", path.as_ref().display()))?;
    info!("Saved {} labels to {}", labels.len(), path.as_ref().display());
    Ok(())
}

fn has_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Parse and validate an imported label set.
pub fn import_labels_json(json: &str) -> Result<Vec<Label>, ValidationError> {
    let data: Value = serde_json::from_str(json).map_err(|e| ValidationError::Malformed {
        reason: e.to_string(),
    })?;

    let entries = data.as_array().ok_or(ValidationError::NotAnArray)?;

    for (index, entry) in entries.iter().enumerate() {
        for field in REQUIRED_FIELDS {
            if !has_value(entry.get(field)) {
                return Err(ValidationError::MissingField {
                    index,
                    field: field.to_string(),
                });
            }
        }
    }

    serde_json::from_value(data).map_err(|e| ValidationError::Malformed {
        reason: e.to_string(),
    })
}

/// Read and validate a label set from `path`.
pub fn load_labels(path: impl AsRef<Path>) -> Result<Vec<Label>> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;
    let labels = import_labels_json(&content)?;
    info!("Loaded {} labels from {}", labels.len(), path.as_ref().display());
    Ok(labels)
}
