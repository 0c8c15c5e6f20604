/// Canonical table extraction for one entity section
///
/// The data block is every row after the header up to the section end. Any
/// column with a single empty cell anywhere in the block is dropped whole; the
/// surviving columns must be exactly `year, period_code, time_label, value`.
use serde::Serialize;
use tracing::debug;

use super::grid::{Cell, RawGrid};
use super::WorkbookError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRecord {
    pub year: i32,
    pub period_code: String,
    pub time_label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityTable {
    pub entity: String,
    pub records: Vec<TableRecord>,
}

impl EntityTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Extract rows `(header_row, end_row)` into a canonical table
pub fn extract_table(
    grid: &RawGrid,
    header_row: usize,
    end_row: usize,
    entity: &str,
) -> Result<EntityTable, WorkbookError> {
    let data_rows: Vec<usize> = (header_row + 1..end_row.min(grid.height())).collect();

    let complete_columns: Vec<usize> = (0..grid.width())
        .filter(|&col| data_rows.iter().all(|&row| !grid.get(row, col).is_empty()))
        .collect();

    debug!(
        "'{}': {} data rows, {} of {} columns complete",
        entity,
        data_rows.len(),
        complete_columns.len(),
        grid.width()
    );

    let [year_col, period_col, label_col, value_col] = complete_columns[..] else {
        return Err(WorkbookError::ExtractionMismatch {
            entity: entity.to_string(),
            columns: complete_columns.len(),
        });
    };

    let records = data_rows
        .iter()
        .map(|&row| {
            Ok(TableRecord {
                year: parse_year(grid.get(row, year_col), row, year_col)?,
                period_code: cell_text(grid.get(row, period_col), row, period_col)?,
                time_label: cell_text(grid.get(row, label_col), row, label_col)?,
                value: parse_value(grid.get(row, value_col), row, value_col)?,
            })
        })
        .collect::<Result<Vec<_>, WorkbookError>>()?;

    Ok(EntityTable {
        entity: entity.to_string(),
        records,
    })
}

fn cell_text(cell: &Cell, row: usize, col: usize) -> Result<String, WorkbookError> {
    cell.as_text()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| WorkbookError::InvalidCell {
            row,
            col,
            msg: "Expected text, got empty cell".to_string(),
        })
}

fn parse_year(cell: &Cell, row: usize, col: usize) -> Result<i32, WorkbookError> {
    let invalid = |msg: String| WorkbookError::InvalidCell { row, col, msg };

    let number = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(format!("Cannot parse year: {s}")))?,
        Cell::Empty => return Err(invalid("Expected year, got empty cell".to_string())),
    };

    if number.fract() != 0.0 || number < i32::MIN as f64 || number > i32::MAX as f64 {
        return Err(invalid(format!("Year is not a whole number: {number}")));
    }
    Ok(number as i32)
}

fn parse_value(cell: &Cell, row: usize, col: usize) -> Result<f64, WorkbookError> {
    let invalid = |msg: String| WorkbookError::InvalidCell { row, col, msg };

    let value = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(format!("Cannot parse value: {s}")))?,
        Cell::Empty => return Err(invalid("Expected number, got empty cell".to_string())),
    };

    if !value.is_finite() {
        return Err(invalid(format!("Value is not finite: {value}")));
    }
    Ok(value)
}
