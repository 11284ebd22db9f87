//! Nested settings object served by `/api/v1/settings`.

use serde::{Deserialize, Serialize};

/// Server settings, kept as an opaque nested JSON object.
///
/// Sections and keys are owned by the backend; the client only reads
/// values by dotted path and writes the whole object back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(pub serde_json::Map<String, serde_json::Value>);

impl Settings {
    /// Look up a value by dotted path, e.g. `"dask.num_workers"`.
    pub fn get_path(&self, path: &str) -> Option<&serde_json::Value> {
        let mut parts = path.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Top-level section names in server order.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
