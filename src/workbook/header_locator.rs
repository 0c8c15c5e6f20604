use super::grid::RawGrid;
use super::segmenter::Section;

/// Find the first row in `[start_row, end_row)` that looks like the table header
///
/// A header row has cells reading `year` and `period` plus at least one of
/// `label` or `value` (trimmed, case-insensitive, whole-cell matches).
pub fn locate_header(grid: &RawGrid, section: &Section) -> Option<usize> {
    (section.start_row..section.end_row.min(grid.height())).find(|&row_idx| {
        let values: Vec<String> = grid
            .row_values(row_idx)
            .iter()
            .map(|v| v.trim().to_lowercase())
            .collect();
        let has = |token: &str| values.iter().any(|v| v == token);

        has("year") && has("period") && (has("label") || has("value"))
    })
}
