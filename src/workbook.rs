// Workbook module
//
// Extracts per-county time series from multi-section spreadsheets:
// - grid: cell grid read from a worksheet
// - segmenter: marker-row segmentation into entity sections
// - header_locator / table_extractor: canonical 4-column tables per section
// - wide_table: outer join of entity tables keyed by time
// - aggregator: sheet-by-sheet batch driver

pub mod aggregator;
pub mod grid;
pub mod header_locator;
pub mod segmenter;
pub mod table_extractor;
pub mod wide_table;

pub use aggregator::{WorkbookAggregator, WorkbookRun};
pub use grid::{Cell, RawGrid};
pub use segmenter::Section;
pub use table_extractor::{EntityTable, TableRecord};
pub use wide_table::{ExclusionPolicy, TimeKey, WideTable};

use thiserror::Error;

use crate::report::Outcome;

#[derive(Error, Debug)]
pub enum WorkbookError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Failed to read sheet '{sheet}': {msg}")]
    SheetRead { sheet: String, msg: String },

    #[error("Sheet '{sheet}' has no row ending with '{measure}'")]
    SheetSkipped { sheet: String, measure: String },

    #[error("No header row found for '{entity}' in rows {start_row}..{end_row}")]
    SectionDropped {
        entity: String,
        start_row: usize,
        end_row: usize,
    },

    #[error("Data block for '{entity}' has {columns} complete columns, expected 4")]
    ExtractionMismatch { entity: String, columns: usize },

    #[error("Invalid data at row {row}, col {col}: {msg}")]
    InvalidCell { row: usize, col: usize, msg: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl WorkbookError {
    /// Report category for this failure
    pub fn outcome(&self) -> Outcome {
        match self {
            WorkbookError::SheetSkipped { .. } => Outcome::SheetSkipped,
            WorkbookError::SectionDropped { .. } => Outcome::SectionDropped,
            WorkbookError::ExtractionMismatch { .. } | WorkbookError::InvalidCell { .. } => {
                Outcome::ExtractionMismatch
            }
            _ => Outcome::Failed,
        }
    }
}
