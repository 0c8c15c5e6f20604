use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Failed to read reference file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid reference JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Code -> label maps used to decode page file names
///
/// Loaded once per batch from JSON shaped
/// `{"states": {...}, "datatypes": {...}, "periods": {...}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferenceMaps {
    pub states: HashMap<String, String>,
    pub datatypes: HashMap<String, String>,
    pub periods: HashMap<String, String>,
}

impl ReferenceMaps {
    pub fn from_json_str(json: &str) -> Result<Self, ReferenceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ReferenceError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_str() {
        let maps = ReferenceMaps::from_json_str(
            r#"{
                "states": {"06": "CA"},
                "datatypes": {"03": "unemployment"},
                "periods": {"01": "Jan"}
            }"#,
        )
        .unwrap();

        assert_eq!(maps.states["06"], "CA");
        assert_eq!(maps.datatypes["03"], "unemployment");
        assert_eq!(maps.periods["01"], "Jan");
    }

    #[test]
    fn test_missing_section_is_error() {
        let result = ReferenceMaps::from_json_str(r#"{"states": {}}"#);
        assert!(matches!(result, Err(ReferenceError::Json(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ReferenceMaps::from_json_file(Path::new("/nonexistent/reference.json"));
        assert!(matches!(result, Err(ReferenceError::Io(_))));
    }
}
