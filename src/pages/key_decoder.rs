/// Page file name decoding
///
/// Pages are saved as `<state_code>-<datatype_code>-<year>-<period_code>.<ext>`;
/// e.g. `06-03-2020-01.html` decodes to (CA, unemployment, 2020, Jan).
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use super::reference::ReferenceMaps;
use crate::report::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    State,
    Datatype,
    Period,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dimension::State => "state",
            Dimension::Datatype => "datatype",
            Dimension::Period => "period",
        })
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum KeyDecodeError {
    #[error("Malformed identifier '{0}': expected <state>-<datatype>-<year>-<period>")]
    Malformed(String),

    #[error("Invalid year '{0}'")]
    InvalidYear(String),

    /// Reference data gap, not a bad file name
    #[error("Unknown {dimension} code '{code}'")]
    UnknownCode { dimension: Dimension, code: String },
}

impl KeyDecodeError {
    pub fn outcome(&self) -> Outcome {
        match self {
            KeyDecodeError::UnknownCode { .. } => Outcome::ReferenceLookupError,
            KeyDecodeError::Malformed(_) | KeyDecodeError::InvalidYear(_) => Outcome::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilenameKey {
    pub state: String,
    pub datatype: String,
    pub year: i32,
    pub period: String,
}

impl FilenameKey {
    /// Decode an identifier without extension, e.g. `06-03-2020-01`
    pub fn decode(identifier: &str, maps: &ReferenceMaps) -> Result<Self, KeyDecodeError> {
        let tokens: Vec<&str> = identifier.split('-').collect();
        let [state_code, datatype_code, year, period_code] = tokens[..] else {
            return Err(KeyDecodeError::Malformed(identifier.to_string()));
        };
        if tokens.iter().any(|t| t.is_empty()) {
            return Err(KeyDecodeError::Malformed(identifier.to_string()));
        }

        let year = year
            .parse::<i32>()
            .map_err(|_| KeyDecodeError::InvalidYear(year.to_string()))?;

        Ok(FilenameKey {
            state: lookup(&maps.states, Dimension::State, state_code)?,
            datatype: lookup(&maps.datatypes, Dimension::Datatype, datatype_code)?,
            year,
            period: lookup(&maps.periods, Dimension::Period, period_code)?,
        })
    }

    /// Decode from a page path, ignoring directories and the extension
    pub fn from_path(path: &Path, maps: &ReferenceMaps) -> Result<Self, KeyDecodeError> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| KeyDecodeError::Malformed(path.display().to_string()))?;

        Self::decode(&stem, maps)
    }
}

fn lookup(
    map: &HashMap<String, String>,
    dimension: Dimension,
    code: &str,
) -> Result<String, KeyDecodeError> {
    map.get(code)
        .cloned()
        .ok_or_else(|| KeyDecodeError::UnknownCode {
            dimension,
            code: code.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maps() -> ReferenceMaps {
        let mut maps = ReferenceMaps::default();
        maps.states.insert("06".to_string(), "CA".to_string());
        maps.datatypes
            .insert("03".to_string(), "unemployment".to_string());
        maps.periods.insert("01".to_string(), "Jan".to_string());
        maps
    }

    #[test]
    fn test_decode_valid_identifier() {
        let key = FilenameKey::decode("06-03-2020-01", &maps()).unwrap();
        assert_eq!(
            key,
            FilenameKey {
                state: "CA".to_string(),
                datatype: "unemployment".to_string(),
                year: 2020,
                period: "Jan".to_string(),
            }
        );
    }

    #[test]
    fn test_from_path_strips_extension() {
        let key = FilenameKey::from_path(Path::new("data/pages/06-03-2020-01.html"), &maps())
            .unwrap();
        assert_eq!(key.period, "Jan");
        assert_eq!(key.year, 2020);
    }

    #[test]
    fn test_wrong_token_count_is_malformed() {
        assert!(matches!(
            FilenameKey::decode("06-03-2020", &maps()),
            Err(KeyDecodeError::Malformed(_))
        ));
        assert!(matches!(
            FilenameKey::decode("06-03-2020-01-x", &maps()),
            Err(KeyDecodeError::Malformed(_))
        ));
        assert!(matches!(
            FilenameKey::decode("06--2020-01", &maps()),
            Err(KeyDecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_non_numeric_year_is_invalid_year() {
        let err = FilenameKey::decode("06-03-20x0-01", &maps()).unwrap_err();
        assert_eq!(err, KeyDecodeError::InvalidYear("20x0".to_string()));
        assert_eq!(err.outcome(), Outcome::Failed);
    }

    #[test]
    fn test_unknown_code_is_lookup_error() {
        let err = FilenameKey::decode("48-03-2020-01", &maps()).unwrap_err();
        assert_eq!(
            err,
            KeyDecodeError::UnknownCode {
                dimension: Dimension::State,
                code: "48".to_string(),
            }
        );
        assert_eq!(err.outcome(), Outcome::ReferenceLookupError);
    }

    #[test]
    fn test_unknown_period_is_lookup_error() {
        let err = FilenameKey::decode("06-03-2020-13", &maps()).unwrap_err();
        assert!(matches!(
            err,
            KeyDecodeError::UnknownCode {
                dimension: Dimension::Period,
                ..
            }
        ));
    }
}
