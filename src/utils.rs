/// Shared utility functions for the county series extractors
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Turn a measure-type label into a file-name friendly slug
///
/// The label is trimmed, lower-cased and every whitespace run becomes a single `_`.
///
/// # Examples
///
/// ```
/// use county_series::utils::slugify;
///
/// assert_eq!(slugify("Unemployment Rate"), "unemployment_rate");
/// assert_eq!(slugify("  Labor  Force "), "labor_force");
/// ```
pub fn slugify(label: &str) -> String {
    WHITESPACE_RE
        .replace_all(label.trim(), "_")
        .to_lowercase()
}

/// Build the aggregated CSV path for a source workbook and measure label
///
/// `data/laus_2020.xlsx` + `Unemployment Rate` lands at
/// `<output_dir>/laus_2020_unemployment_rate_aggregated.csv`.
pub fn aggregated_output_path(output_dir: &Path, source: &Path, measure_label: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "workbook".to_string());

    output_dir.join(format!("{stem}_{}_aggregated.csv", slugify(measure_label)))
}
