/// Header/value cell scraping from statistics output pages
///
/// A data page has a state `<select>` with a chosen option and an output table:
/// ```text
/// <th class="OutputHead">Area</th><th class="OutputHead">Period</th>
/// <th class="OutputHead">Alpha</th> ...        <- entity names after 2 leading headers
/// <td class="OutputCell">7.5</td> ...           <- one value per entity
/// ```
use scraper::{Html, Selector};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::key_decoder::FilenameKey;
use crate::config::DEFAULT_HEADER_SKIP;
use crate::report::Outcome;

#[derive(Error, Debug, PartialEq)]
pub enum ScrapeError {
    #[error("Invalid selector '{selector}': {msg}")]
    InvalidSelector { selector: String, msg: String },

    #[error("No selection marker found; not a data page")]
    NotDataPage,

    #[error("Found {entities} entity headers but {values} value cells")]
    CountMismatch { entities: usize, values: usize },

    #[error("Failed to parse value cell: '{0}'")]
    InvalidValue(String),
}

impl ScrapeError {
    pub fn outcome(&self) -> Outcome {
        match self {
            ScrapeError::NotDataPage => Outcome::DocumentSkipped,
            ScrapeError::CountMismatch { .. } => Outcome::CountMismatch,
            ScrapeError::InvalidSelector { .. } | ScrapeError::InvalidValue(_) => Outcome::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedObservation {
    pub key: FilenameKey,
    pub entity: String,
    pub value: f64,
}

/// CSS selectors and header offset for one page layout
#[derive(Debug, Clone)]
pub struct ScrapeSelectors {
    pub marker: String,
    pub header: String,
    pub value: String,
    /// Leading header cells that are not entity names
    pub header_skip: usize,
}

impl Default for ScrapeSelectors {
    fn default() -> Self {
        Self {
            marker: r#"select[name="state"] option[selected]"#.to_string(),
            header: "th.OutputHead".to_string(),
            value: "td.OutputCell".to_string(),
            header_skip: DEFAULT_HEADER_SKIP,
        }
    }
}

pub struct CellScraper {
    marker: Selector,
    header: Selector,
    value: Selector,
    header_skip: usize,
}

impl CellScraper {
    pub fn new(selectors: &ScrapeSelectors) -> Result<Self, ScrapeError> {
        Ok(Self {
            marker: parse_selector(&selectors.marker)?,
            header: parse_selector(&selectors.header)?,
            value: parse_selector(&selectors.value)?,
            header_skip: selectors.header_skip,
        })
    }

    /// Scrape a page into observations tagged with `key`
    ///
    /// Either every entity/value pair is returned or none is.
    pub fn scrape(
        &self,
        html: &str,
        key: &FilenameKey,
    ) -> Result<Vec<ScrapedObservation>, ScrapeError> {
        let document = Html::parse_document(html);
        let pairs = self.scrape_cells(&document)?;

        Ok(pairs
            .into_iter()
            .map(|(entity, value)| ScrapedObservation {
                key: key.clone(),
                entity,
                value,
            })
            .collect())
    }

    /// Paired `(entity, value)` cells in document order
    pub fn scrape_cells(&self, document: &Html) -> Result<Vec<(String, f64)>, ScrapeError> {
        if document.select(&self.marker).next().is_none() {
            return Err(ScrapeError::NotDataPage);
        }

        let entities: Vec<String> = document
            .select(&self.header)
            .skip(self.header_skip)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect();

        let raw_values: Vec<String> = document
            .select(&self.value)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect();

        debug!(
            "Found {} entity headers and {} value cells",
            entities.len(),
            raw_values.len()
        );

        if entities.len() != raw_values.len() {
            return Err(ScrapeError::CountMismatch {
                entities: entities.len(),
                values: raw_values.len(),
            });
        }

        let values = raw_values
            .iter()
            .map(|raw| match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                _ => Err(ScrapeError::InvalidValue(raw.clone())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entities.into_iter().zip(values).collect())
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector {
        selector: selector.to_string(),
        msg: format!("{e:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scraper() -> CellScraper {
        CellScraper::new(&ScrapeSelectors::default()).unwrap()
    }

    fn key() -> FilenameKey {
        FilenameKey {
            state: "CA".to_string(),
            datatype: "unemployment".to_string(),
            year: 2020,
            period: "Jan".to_string(),
        }
    }

    fn page(headers: &[&str], values: &[&str]) -> String {
        let heads: String = headers
            .iter()
            .map(|h| format!(r#"<th class="OutputHead">{h}</th>"#))
            .collect();
        let cells: String = values
            .iter()
            .map(|v| format!(r#"<td class="OutputCell">{v}</td>"#))
            .collect();
        format!(
            r#"<html><body>
            <form><select name="state">
                <option value="01">Alabama</option>
                <option value="06" selected>California</option>
            </select></form>
            <table><tr>{heads}</tr><tr>{cells}</tr></table>
            </body></html>"#
        )
    }

    #[test]
    fn test_scrape_pairs_in_order() {
        let html = page(&["Area", "Period", "Alpha", "Beta"], &["7.5", " 8.25 "]);
        let observations = scraper().scrape(&html, &key()).unwrap();

        assert_eq!(observations.len(), 2);
        assert_eq!(observations[0].entity, "Alpha");
        assert_eq!(observations[0].value, 7.5);
        assert_eq!(observations[1].entity, "Beta");
        assert_eq!(observations[1].value, 8.25);
        assert_eq!(observations[1].key, key());
    }

    #[test]
    fn test_page_without_selected_option_is_not_data_page() {
        let html = r#"<html><body>
            <select name="state"><option value="06">California</option></select>
            <table><tr><th class="OutputHead">Alpha</th></tr></table>
            </body></html>"#;

        let result = scraper().scrape(html, &key());
        assert_eq!(result, Err(ScrapeError::NotDataPage));
        assert_eq!(ScrapeError::NotDataPage.outcome(), Outcome::DocumentSkipped);
    }

    #[test]
    fn test_count_mismatch_rejects_document() {
        let html = page(&["Area", "Period", "Alpha", "Beta"], &["7.5"]);
        let result = scraper().scrape(&html, &key());
        assert_eq!(
            result,
            Err(ScrapeError::CountMismatch {
                entities: 2,
                values: 1,
            })
        );
    }

    #[test]
    fn test_fewer_headers_than_offset() {
        let html = page(&["Area"], &[]);
        let observations = scraper().scrape(&html, &key()).unwrap();
        assert!(observations.is_empty());
    }

    #[test]
    fn test_unparseable_value_is_invalid() {
        let html = page(&["Area", "Period", "Alpha"], &["n/a"]);
        let result = scraper().scrape(&html, &key());
        assert_eq!(result, Err(ScrapeError::InvalidValue("n/a".to_string())));
    }

    #[test]
    fn test_non_finite_value_is_invalid() {
        for raw in ["NaN", "inf", "-infinity"] {
            let html = page(&["Area", "Period", "Alpha"], &[raw]);
            let result = scraper().scrape(&html, &key());
            assert_eq!(result, Err(ScrapeError::InvalidValue(raw.to_string())));
        }
    }

    #[test]
    fn test_custom_header_offset() {
        let selectors = ScrapeSelectors {
            header_skip: 0,
            ..ScrapeSelectors::default()
        };
        let scraper = CellScraper::new(&selectors).unwrap();
        let html = page(&["Alpha"], &["1.0"]);
        let observations = scraper.scrape(&html, &key()).unwrap();
        assert_eq!(observations[0].entity, "Alpha");
    }

    #[test]
    fn test_invalid_selector() {
        let selectors = ScrapeSelectors {
            header: "th[".to_string(),
            ..ScrapeSelectors::default()
        };
        assert!(matches!(
            CellScraper::new(&selectors),
            Err(ScrapeError::InvalidSelector { .. })
        ));
    }
}
