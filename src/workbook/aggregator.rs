use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Reader};
use tracing::{debug, info, instrument, warn};

use super::grid::RawGrid;
use super::header_locator::locate_header;
use super::segmenter::{Section, SheetSegmenter};
use super::table_extractor::{extract_table, EntityTable};
use super::wide_table::{ExclusionPolicy, WideTable};
use super::WorkbookError;
use crate::config::Config;
use crate::report::{Outcome, RunReport};
use crate::utils::aggregated_output_path;

/// Result of one workbook run
#[derive(Debug, Clone)]
pub struct WorkbookRun {
    pub table: WideTable,
    pub report: RunReport,
}

impl WorkbookRun {
    /// Write the wide table next to its siblings in `output_dir`
    pub fn write_csv(
        &self,
        output_dir: &Path,
        source: &Path,
        measure_label: &str,
    ) -> Result<PathBuf, WorkbookError> {
        fs::create_dir_all(output_dir)?;
        let path = aggregated_output_path(output_dir, source, measure_label);
        self.table.write_csv_file(&path)?;
        info!("Saved aggregated data to {}", path.display());
        Ok(path)
    }
}

/// Drives segmentation, extraction and the wide join across a workbook's sheets
pub struct WorkbookAggregator {
    measure_label: String,
    segmenter: SheetSegmenter,
    exclusion: ExclusionPolicy,
}

impl WorkbookAggregator {
    pub fn new(measure_label: &str, config: &Config) -> Self {
        Self {
            measure_label: measure_label.to_string(),
            segmenter: SheetSegmenter::new(measure_label, config.entity_marker.clone())
                .with_exclusion(config.exclusion_policy()),
            exclusion: config.exclusion_policy(),
        }
    }

    /// Read every sheet of the workbook at `path` and aggregate them
    #[instrument(skip(self), fields(measure = %self.measure_label))]
    pub fn aggregate_file(&self, path: &Path) -> Result<WorkbookRun, WorkbookError> {
        info!("Parsing workbook: {}", path.display());

        let mut workbook = match open_workbook_auto(path) {
            Ok(wb) => wb,
            Err(e) => return Err(WorkbookError::WorkbookOpen(e.to_string())),
        };

        let sheet_names = workbook.sheet_names().to_owned();
        debug!("Found {} sheets", sheet_names.len());

        let mut sheets = Vec::with_capacity(sheet_names.len());
        let mut unreadable = 0;
        for sheet_name in sheet_names {
            match workbook.worksheet_range(&sheet_name) {
                Ok(range) => sheets.push((sheet_name, RawGrid::from(&range))),
                Err(e) => {
                    let err = WorkbookError::SheetRead {
                        sheet: sheet_name,
                        msg: e.to_string(),
                    };
                    warn!("{}", err);
                    unreadable += 1;
                }
            }
        }

        let mut run = self.aggregate_sheets(sheets);
        for _ in 0..unreadable {
            run.report.record(Outcome::Failed);
        }
        Ok(run)
    }

    /// Aggregate already-loaded sheets, in order
    pub fn aggregate_sheets(
        &self,
        sheets: impl IntoIterator<Item = (String, RawGrid)>,
    ) -> WorkbookRun {
        let mut report = RunReport::new();
        let mut tables: BTreeMap<String, EntityTable> = BTreeMap::new();

        for (sheet_name, grid) in sheets {
            match self.extract_sheet(&sheet_name, &grid, &mut report) {
                Ok(sheet_tables) => {
                    for table in sheet_tables {
                        if let Some(previous) = tables.insert(table.entity.clone(), table) {
                            warn!(
                                "Sheet '{}' replaces earlier table for '{}'",
                                sheet_name, previous.entity
                            );
                        }
                    }
                }
                Err(e) => {
                    info!("Skipping sheet '{}': {}", sheet_name, e);
                    report.record(e.outcome());
                }
            }
        }

        let (table, excluded) = WideTable::assemble(tables.values(), &self.exclusion);
        for _ in &excluded {
            report.record(Outcome::Excluded);
        }
        for _ in 0..table.entity_count() {
            report.record(Outcome::Succeeded);
        }

        info!("Total rows in aggregated data: {}", table.row_count());
        info!("Entities included: {}", table.entity_count());

        WorkbookRun { table, report }
    }

    /// Extract every entity table on one sheet
    ///
    /// Section failures are logged and counted in `report`; only a sheet
    /// without the measure marker fails as a whole.
    pub fn extract_sheet(
        &self,
        sheet_name: &str,
        grid: &RawGrid,
        report: &mut RunReport,
    ) -> Result<Vec<EntityTable>, WorkbookError> {
        let sections = self
            .segmenter
            .segment(grid)
            .ok_or_else(|| WorkbookError::SheetSkipped {
                sheet: sheet_name.to_string(),
                measure: self.measure_label.clone(),
            })?;

        info!("Sheet '{}': {} sections", sheet_name, sections.len());

        let mut tables = Vec::new();
        for section in &sections {
            match extract_section(grid, section) {
                Ok(table) => {
                    debug!("✓ '{}': {} rows", table.entity, table.len());
                    tables.push(table);
                }
                Err(e) => {
                    warn!("Sheet '{}': {}", sheet_name, e);
                    report.record(e.outcome());
                }
            }
        }

        Ok(tables)
    }
}

/// Header lookup plus table extraction for a single section
pub fn extract_section(grid: &RawGrid, section: &Section) -> Result<EntityTable, WorkbookError> {
    let header_row =
        locate_header(grid, section).ok_or_else(|| WorkbookError::SectionDropped {
            entity: section.entity_name.clone(),
            start_row: section.start_row,
            end_row: section.end_row,
        })?;

    extract_table(grid, header_row, section.end_row, &section.entity_name)
}
