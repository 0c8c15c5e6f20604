/// Cell grid read from one worksheet
///
/// Sheets are read once into a `RawGrid` and never mutated; all segmentation
/// works on row indices into this grid.
use calamine::{Data, Range};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Cell::Number(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Display text of the cell, `None` for empty cells
    ///
    /// Whole numbers render without a fractional part so `2020.0` reads as `2020`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Number(n) => Some(format_number(*n)),
            Cell::Text(s) => Some(s.clone()),
            Cell::Empty => None,
        }
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                if s.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(s.clone())
                }
            }
            Data::Bool(b) => Cell::Text(if *b { "True" } else { "False" }.to_string()),
            // Spreadsheet error values (#N/A, #DIV/0!) count as missing
            Data::Error(_) | Data::Empty => Cell::Empty,
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

/// Rows of heterogeneous cells; rows may be ragged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    rows: Vec<Vec<Cell>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Widest row in the grid
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn row(&self, idx: usize) -> &[Cell] {
        self.rows.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cell at (row, col); positions past a short row read as empty
    pub fn get(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&Cell::Empty)
    }

    /// Non-empty cell texts of a row in column order
    pub fn row_values(&self, idx: usize) -> Vec<String> {
        self.row(idx).iter().filter_map(Cell::as_text).collect()
    }

    /// Non-empty cell texts of a row joined by single spaces
    pub fn row_text(&self, idx: usize) -> String {
        self.row_values(idx).join(" ")
    }
}

impl From<&Range<Data>> for RawGrid {
    fn from(range: &Range<Data>) -> Self {
        RawGrid::new(
            range
                .rows()
                .map(|row| row.iter().map(Cell::from).collect())
                .collect(),
        )
    }
}

/// Build a grid row from mixed literals: `row![2020, "1", "Jan", 5.0]`
#[macro_export]
macro_rules! row {
    ($($cell:expr),* $(,)?) => {
        vec![$($crate::workbook::grid::Cell::from($cell)),*]
    };
}
