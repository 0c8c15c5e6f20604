/// Nested index: year -> period -> state -> datatype -> (entity -> value)
///
/// Every level is an ordered map, so serialization is deterministic and the
/// final index is the same for any document order. The only order-sensitive
/// case is a true collision (same path and entity from two documents), which
/// is resolved by the configured `CollisionPolicy`.
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::warn;

use super::cell_scraper::ScrapedObservation;
use super::key_decoder::FilenameKey;

pub type Leaf = BTreeMap<String, f64>;
type DatatypeLevel = BTreeMap<String, Leaf>;
type StateLevel = BTreeMap<String, DatatypeLevel>;
type PeriodLevel = BTreeMap<String, StateLevel>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Later documents overwrite earlier values
    #[default]
    LastWriteWins,
    /// Earlier values are kept; colliding entities are ignored
    FirstWriteWins,
    /// A colliding document is rejected without writing anything
    Error,
}

impl CollisionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionPolicy::LastWriteWins => "last-write-wins",
            CollisionPolicy::FirstWriteWins => "first-write-wins",
            CollisionPolicy::Error => "error",
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "last-write-wins" | "last" => Ok(CollisionPolicy::LastWriteWins),
            "first-write-wins" | "first" => Ok(CollisionPolicy::FirstWriteWins),
            "error" => Ok(CollisionPolicy::Error),
            other => Err(format!(
                "Invalid collision policy '{other}'. \
                 Valid: last-write-wins, first-write-wins, error"
            )),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum IndexError {
    #[error("{year}/{period}/{state}/{datatype} already has values for {entities:?}")]
    Collision {
        year: i32,
        period: String,
        state: String,
        datatype: String,
        entities: Vec<String>,
    },

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),
}

/// What one document write did to the index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: usize,
    /// Entities that already had a value from an earlier document
    pub collisions: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NestedIndex {
    policy: CollisionPolicy,
    tree: BTreeMap<i32, PeriodLevel>,
}

impl NestedIndex {
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            tree: BTreeMap::new(),
        }
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Leaf map for a key, created (with all parent levels) if missing
    pub fn ensure_path(&mut self, key: &FilenameKey) -> &mut Leaf {
        self.tree
            .entry(key.year)
            .or_default()
            .entry(key.period.clone())
            .or_default()
            .entry(key.state.clone())
            .or_default()
            .entry(key.datatype.clone())
            .or_default()
    }

    pub fn leaf(&self, key: &FilenameKey) -> Option<&Leaf> {
        self.tree
            .get(&key.year)?
            .get(&key.period)?
            .get(&key.state)?
            .get(&key.datatype)
    }

    pub fn get(&self, key: &FilenameKey, entity: &str) -> Option<f64> {
        self.leaf(key)?.get(entity).copied()
    }

    /// Write one document's observations under `key`
    ///
    /// Collisions are judged against values already in the index before this
    /// document; a repeated entity inside one document keeps its last value.
    pub fn insert_document(
        &mut self,
        key: &FilenameKey,
        observations: &[ScrapedObservation],
    ) -> Result<WriteSummary, IndexError> {
        let mut colliding: Vec<String> = match self.leaf(key) {
            Some(existing) => observations
                .iter()
                .filter(|obs| existing.contains_key(&obs.entity))
                .map(|obs| obs.entity.clone())
                .collect(),
            None => Vec::new(),
        };
        colliding.sort();
        colliding.dedup();

        if !colliding.is_empty() && self.policy == CollisionPolicy::Error {
            return Err(IndexError::Collision {
                year: key.year,
                period: key.period.clone(),
                state: key.state.clone(),
                datatype: key.datatype.clone(),
                entities: colliding,
            });
        }

        let policy = self.policy;
        let leaf = self.ensure_path(key);
        let mut written = 0;
        for obs in observations {
            let is_collision = colliding.binary_search(&obs.entity).is_ok();
            if is_collision && policy == CollisionPolicy::FirstWriteWins {
                continue;
            }
            leaf.insert(obs.entity.clone(), obs.value);
            written += 1;
        }

        if !colliding.is_empty() {
            warn!(
                "{} entities collided at {}/{}/{}/{} ({})",
                colliding.len(),
                key.year,
                key.period,
                key.state,
                key.datatype,
                policy
            );
        }

        Ok(WriteSummary {
            written,
            collisions: colliding.len(),
        })
    }

    /// Number of entity values across all leaves
    pub fn value_count(&self) -> usize {
        self.tree
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(BTreeMap::values)
            .flat_map(BTreeMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String, IndexError> {
        serde_json::to_string_pretty(self).map_err(|e| IndexError::Json(e.to_string()))
    }

    pub fn write_json_file(&self, path: &Path) -> Result<(), IndexError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| IndexError::Io(e.to_string()))?;
        }
        fs::write(path, self.to_json_pretty()?).map_err(|e| IndexError::Io(e.to_string()))
    }
}

impl Serialize for NestedIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.tree.serialize(serializer)
    }
}
