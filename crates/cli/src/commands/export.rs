//! Reading Shopify JSON exports.
//!
//! An export is either a bare array of records or the Admin API envelope,
//! an object holding the array under its resource name:
//!
//! ```json
//! [{"id": 1, ...}]
//! {"orders": [{"id": 1, ...}]}
//! ```

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while loading an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {origin}: {source}")]
    Json {
        origin: String,
        source: serde_json::Error,
    },

    #[error("{origin}: expected an array or an object with a \"{key}\" array")]
    Shape { origin: String, key: &'static str },
}

/// Load the records of one resource from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not hold `key` records.
pub fn load<T: DeserializeOwned>(path: &Path, key: &'static str) -> Result<Vec<T>, ExportError> {
    let text = std::fs::read_to_string(path).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse(&text, key, &path.display().to_string())
}

/// Load a file if one was given, otherwise no records.
///
/// # Errors
///
/// See [`load`].
pub fn load_optional<T: DeserializeOwned>(
    path: Option<&Path>,
    key: &'static str,
) -> Result<Vec<T>, ExportError> {
    path.map_or_else(|| Ok(Vec::new()), |path| load(path, key))
}

/// Parse export text; `origin` names the source in error messages.
///
/// # Errors
///
/// Returns an error for invalid JSON, a wrong shape or records that do not
/// match `T`.
pub fn parse<T: DeserializeOwned>(
    text: &str,
    key: &'static str,
    origin: &str,
) -> Result<Vec<T>, ExportError> {
    let json_error = |source: serde_json::Error| ExportError::Json {
        origin: origin.to_string(),
        source,
    };

    let value: Value = serde_json::from_str(text).map_err(json_error)?;
    let records = match value {
        array @ Value::Array(_) => array,
        Value::Object(mut map) => map.remove(key).ok_or_else(|| ExportError::Shape {
            origin: origin.to_string(),
            key,
        })?,
        _ => {
            return Err(ExportError::Shape {
                origin: origin.to_string(),
                key,
            });
        }
    };

    serde_json::from_value(records).map_err(json_error)
}
