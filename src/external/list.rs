use std::path::Path;

use crate::error::DispatchError;

/// Read the ordered list of external tool identifiers.
///
/// The file holds a JSON array of strings; each string is the file name of an
/// executable in the discovery directory.
pub async fn load_dynamic_identifiers(path: &Path) -> Result<Vec<String>, DispatchError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        DispatchError::Config(format!(
            "failed to read dynamic plugin list {}: {}",
            path.display(),
            e
        ))
    })?;

    serde_json::from_str(&raw).map_err(|e| {
        DispatchError::Config(format!(
            "invalid dynamic plugin list {}: {}",
            path.display(),
            e
        ))
    })
}
