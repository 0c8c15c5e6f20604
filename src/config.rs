use std::env;
use std::path::PathBuf;

use crate::pages::nested_index::CollisionPolicy;
use crate::workbook::wide_table::ExclusionPolicy;

pub const DEFAULT_ENTITY_MARKER: &str = "County";
pub const DEFAULT_EXCLUSION_TOKEN: &str = "city";
pub const DEFAULT_HEADER_SKIP: usize = 2;

#[derive(Debug, Clone)]
pub struct Config {
    pub entity_marker: String,
    /// Empty string disables exclusion
    pub exclusion_token: String,
    pub output_dir: PathBuf,
    pub collision_policy: CollisionPolicy,
    pub header_skip: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            entity_marker: DEFAULT_ENTITY_MARKER.to_string(),
            exclusion_token: DEFAULT_EXCLUSION_TOKEN.to_string(),
            output_dir: PathBuf::from("output"),
            collision_policy: CollisionPolicy::LastWriteWins,
            header_skip: DEFAULT_HEADER_SKIP,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let collision_policy = match env::var("COLLISION_POLICY") {
            Ok(raw) => raw.parse::<CollisionPolicy>()?,
            Err(_) => CollisionPolicy::LastWriteWins,
        };

        Ok(Config {
            entity_marker: env::var("ENTITY_MARKER")
                .unwrap_or_else(|_| DEFAULT_ENTITY_MARKER.to_string()),
            exclusion_token: env::var("EXCLUSION_TOKEN")
                .unwrap_or_else(|_| DEFAULT_EXCLUSION_TOKEN.to_string()),
            output_dir: env::var("OUTPUT_DIR")
                .unwrap_or_else(|_| "output".to_string())
                .into(),
            collision_policy,
            header_skip: env::var("HEADER_SKIP")
                .unwrap_or_else(|_| DEFAULT_HEADER_SKIP.to_string())
                .parse()
                .unwrap_or(DEFAULT_HEADER_SKIP),
        })
    }

    pub fn exclusion_policy(&self) -> ExclusionPolicy {
        ExclusionPolicy::new(&self.exclusion_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.entity_marker, "County");
        assert_eq!(config.exclusion_token, "city");
        assert_eq!(config.header_skip, 2);
        assert_eq!(config.collision_policy, CollisionPolicy::LastWriteWins);
    }

    #[test]
    fn test_exclusion_policy_from_config() {
        let config = Config::default();
        let policy = config.exclusion_policy();
        assert!(policy.excludes("Beta City"));
        assert!(!policy.excludes("Alpha County"));
    }
}
