/// Wide table assembly
///
/// Per-entity tables are outer-joined on `(year, period_code, time_label)`.
/// Rows and columns live in ordered maps, so the result does not depend on the
/// order in which entity tables are joined.
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::{debug, info, warn};

use super::table_extractor::EntityTable;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeKey {
    pub year: i32,
    pub period_code: String,
    pub time_label: String,
}

/// Case-insensitive substring exclusion on entity names
#[derive(Debug, Clone, Default)]
pub struct ExclusionPolicy {
    token: Option<String>,
}

impl ExclusionPolicy {
    /// An empty (or whitespace) token disables exclusion
    pub fn new(token: &str) -> Self {
        let token = token.trim().to_lowercase();
        Self {
            token: (!token.is_empty()).then_some(token),
        }
    }

    pub fn none() -> Self {
        Self { token: None }
    }

    pub fn excludes(&self, entity: &str) -> bool {
        self.token
            .as_deref()
            .is_some_and(|token| entity.to_lowercase().contains(token))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    entities: BTreeSet<String>,
    rows: BTreeMap<TimeKey, BTreeMap<String, f64>>,
}

impl WideTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the included tables, returning the wide table and the excluded entity names
    pub fn assemble<'a>(
        tables: impl IntoIterator<Item = &'a EntityTable>,
        policy: &ExclusionPolicy,
    ) -> (WideTable, Vec<String>) {
        let mut wide = WideTable::new();
        let mut excluded = Vec::new();

        for table in tables {
            if policy.excludes(&table.entity) {
                info!("Skipping '{}': matches exclusion policy", table.entity);
                excluded.push(table.entity.clone());
                continue;
            }
            wide.join(table);
        }

        info!(
            "Wide table: {} entities, {} rows",
            wide.entity_count(),
            wide.row_count()
        );
        (wide, excluded)
    }

    /// Full outer join of one entity table into this table
    ///
    /// Keys new to the table add rows; existing keys gain the entity's value.
    /// Joining an entity that is already a column overwrites its values at
    /// shared keys.
    pub fn join(&mut self, table: &EntityTable) {
        if !self.entities.insert(table.entity.clone()) {
            warn!(
                "Entity '{}' joined twice; later values overwrite earlier ones",
                table.entity
            );
        }

        for record in &table.records {
            let key = TimeKey {
                year: record.year,
                period_code: record.period_code.clone(),
                time_label: record.time_label.clone(),
            };
            let previous = self
                .rows
                .entry(key)
                .or_default()
                .insert(table.entity.clone(), record.value);

            if previous.is_some() {
                debug!(
                    "'{}' has duplicate key ({}, {}, {})",
                    table.entity, record.year, record.period_code, record.time_label
                );
            }
        }
    }

    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(String::as_str)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &TimeKey> {
        self.rows.keys()
    }

    pub fn value(&self, key: &TimeKey, entity: &str) -> Option<f64> {
        self.rows.get(key).and_then(|row| row.get(entity)).copied()
    }

    /// Rows in key order with one cell per entity column (`None` = null)
    pub fn rows(&self) -> impl Iterator<Item = (&TimeKey, Vec<Option<f64>>)> {
        self.rows.iter().map(move |(key, values)| {
            let cells = self
                .entities
                .iter()
                .map(|entity| values.get(entity).copied())
                .collect();
            (key, cells)
        })
    }

    /// Serialize as CSV: `year,period_code,time_label,<entity...>`, nulls empty
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = vec!["year", "period_code", "time_label"];
        header.extend(self.entities());
        csv_writer.write_record(&header)?;

        for (key, cells) in self.rows() {
            let mut record = vec![
                key.year.to_string(),
                key.period_code.clone(),
                key.time_label.clone(),
            ];
            record.extend(
                cells
                    .into_iter()
                    .map(|cell| cell.map(|v| v.to_string()).unwrap_or_default()),
            );
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_csv_file(&self, path: &Path) -> Result<(), csv::Error> {
        let file = File::create(path)?;
        self.write_csv(file)
    }
}
