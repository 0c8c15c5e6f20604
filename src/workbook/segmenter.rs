/// Sheet segmentation by marker rows
///
/// A sheet qualifies when some row's text ends with the measure-type label
/// (e.g. "... Annual Unemployment Rate"). Each row whose text contains the
/// entity marker ("County") opens a section that runs until the next marker
/// row or the end of the grid. Rows naming an excluded entity ("Beta City")
/// also open a section, so their data never leaks into the previous entity.
use tracing::debug;

use super::grid::{Cell, RawGrid};
use super::wide_table::ExclusionPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub entity_name: String,
    pub start_row: usize,
    /// Exclusive
    pub end_row: usize,
}

pub struct SheetSegmenter {
    measure_label: String,
    entity_marker: String,
    exclusion: ExclusionPolicy,
}

impl SheetSegmenter {
    pub fn new(measure_label: &str, entity_marker: impl Into<String>) -> Self {
        Self {
            measure_label: measure_label.trim().to_lowercase(),
            entity_marker: entity_marker.into(),
            exclusion: ExclusionPolicy::none(),
        }
    }

    /// Treat rows matching the exclusion policy as section boundaries
    pub fn with_exclusion(mut self, exclusion: ExclusionPolicy) -> Self {
        self.exclusion = exclusion;
        self
    }

    fn is_entity_row(&self, grid: &RawGrid, row_idx: usize, row_text: &str) -> bool {
        if row_text.contains(&self.entity_marker) {
            return true;
        }
        // Data rows never name an entity
        self.exclusion.excludes(row_text) && !grid.row(row_idx).iter().any(Cell::is_number)
    }

    /// Segment a grid into ordered, contiguous entity sections
    ///
    /// Returns `None` when no row carries the measure-type label; the sheet
    /// then contributes nothing.
    pub fn segment(&self, grid: &RawGrid) -> Option<Vec<Section>> {
        let mut is_measure_sheet = false;
        let mut starts: Vec<(usize, String)> = Vec::new();

        for row_idx in 0..grid.height() {
            let row_text = grid.row_text(row_idx);

            if row_text.trim().to_lowercase().ends_with(&self.measure_label) {
                debug!("Measure marker at row {}: '{}'", row_idx, row_text);
                is_measure_sheet = true;
                continue;
            }

            if self.is_entity_row(grid, row_idx, &row_text) {
                starts.push((row_idx, row_text.trim().to_string()));
            }
        }

        if !is_measure_sheet {
            return None;
        }

        let sections = starts
            .iter()
            .enumerate()
            .map(|(i, (start_row, entity_name))| Section {
                entity_name: entity_name.clone(),
                start_row: *start_row,
                end_row: starts
                    .get(i + 1)
                    .map(|(next, _)| *next)
                    .unwrap_or(grid.height()),
            })
            .collect::<Vec<_>>();

        debug!("Found {} entity sections", sections.len());
        Some(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row;

    fn segmenter() -> SheetSegmenter {
        SheetSegmenter::new("unemployment rate", "County")
    }

    #[test]
    fn test_sheet_without_measure_marker_is_skipped() {
        let grid = RawGrid::new(vec![
            row!["X Annual Labor Force"],
            row!["Alpha County"],
            row!["Year", "Period", "Label", "Value"],
        ]);
        assert_eq!(segmenter().segment(&grid), None);
    }

    #[test]
    fn test_sections_are_contiguous() {
        let grid = RawGrid::new(vec![
            row!["X Annual Unemployment Rate"],
            row!["Alpha County"],
            row!["Year", "Period", "Label", "Value"],
            row![2020, 1, "Jan", 5.0],
            row!["Beta County"],
            row!["Year", "Period", "Label", "Value"],
            row![2020, 1, "Jan", 6.0],
        ]);

        let sections = segmenter().segment(&grid).unwrap();
        assert_eq!(
            sections,
            vec![
                Section {
                    entity_name: "Alpha County".to_string(),
                    start_row: 1,
                    end_row: 4,
                },
                Section {
                    entity_name: "Beta County".to_string(),
                    start_row: 4,
                    end_row: 7,
                },
            ]
        );
    }

    #[test]
    fn test_measure_match_is_case_insensitive_suffix() {
        let grid = RawGrid::new(vec![
            row!["  Annual UNEMPLOYMENT RATE  "],
            row!["Alpha County"],
        ]);
        let sections = segmenter().segment(&grid).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].start_row, 1);
    }

    #[test]
    fn test_measure_row_does_not_open_section() {
        // The marker row also mentions County but must not become an entity
        let grid = RawGrid::new(vec![
            row!["Orange County Unemployment Rate"],
            row!["Alpha County"],
        ]);
        let sections = segmenter().segment(&grid).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].entity_name, "Alpha County");
    }

    #[test]
    fn test_measure_label_mid_row_does_not_qualify() {
        let grid = RawGrid::new(vec![
            row!["Unemployment Rate by County"],
            row!["Alpha County"],
        ]);
        assert_eq!(segmenter().segment(&grid), None);
    }

    #[test]
    fn test_entity_name_joins_split_cells() {
        let grid = RawGrid::new(vec![
            row!["Unemployment Rate"],
            row!["", "Alpha", "County"],
        ]);
        let sections = segmenter().segment(&grid).unwrap();
        assert_eq!(sections[0].entity_name, "Alpha County");
    }

    #[test]
    fn test_marker_is_case_sensitive() {
        let grid = RawGrid::new(vec![row!["Unemployment Rate"], row!["alpha county"]]);
        assert!(segmenter().segment(&grid).unwrap().is_empty());
    }

    #[test]
    fn test_excluded_entity_row_closes_previous_section() {
        let grid = RawGrid::new(vec![
            row!["X Annual Unemployment Rate"],
            row!["Alpha County"],
            row!["Year", "Period", "Label", "Value"],
            row![2020, 1, "Jan", 5.0],
            row!["Beta City"],
            row!["Year", "Period", "Label", "Value"],
            row![2020, 1, "Jan", 6.0],
        ]);

        let sections = segmenter()
            .with_exclusion(ExclusionPolicy::new("city"))
            .segment(&grid)
            .unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].end_row, 4);
        assert_eq!(sections[1].entity_name, "Beta City");
        assert_eq!(sections[1].start_row, 4);
    }

    #[test]
    fn test_numeric_row_mentioning_token_is_not_a_boundary() {
        let grid = RawGrid::new(vec![
            row!["Unemployment Rate"],
            row!["Alpha County"],
            row![2020, 1, "City Jan", 5.0],
        ]);

        let sections = segmenter()
            .with_exclusion(ExclusionPolicy::new("city"))
            .segment(&grid)
            .unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].end_row, 3);
    }
}
