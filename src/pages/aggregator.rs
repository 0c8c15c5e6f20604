use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use super::cell_scraper::{CellScraper, ScrapeError, ScrapeSelectors};
use super::key_decoder::{FilenameKey, KeyDecodeError};
use super::nested_index::{CollisionPolicy, IndexError, NestedIndex, WriteSummary};
use super::reference::ReferenceMaps;
use crate::report::{Outcome, RunReport};

/// Why a single page contributed nothing
#[derive(Error, Debug)]
pub enum PageError {
    #[error(transparent)]
    Key(#[from] KeyDecodeError),

    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PageError {
    pub fn outcome(&self) -> Outcome {
        match self {
            PageError::Key(e) => e.outcome(),
            PageError::Scrape(e) => e.outcome(),
            PageError::Index(IndexError::Collision { .. }) => Outcome::Collision,
            PageError::Index(_) | PageError::Io(_) => Outcome::Failed,
        }
    }
}

/// Accumulated state of one page batch
///
/// Created empty per run, threaded through every document, written once.
#[derive(Debug, Clone)]
pub struct PageRun {
    pub index: NestedIndex,
    pub report: RunReport,
}

impl PageRun {
    pub fn new(policy: CollisionPolicy) -> Self {
        Self {
            index: NestedIndex::new(policy),
            report: RunReport::new(),
        }
    }
}

pub struct PageAggregator {
    maps: ReferenceMaps,
    scraper: CellScraper,
}

impl PageAggregator {
    pub fn new(maps: ReferenceMaps, selectors: &ScrapeSelectors) -> Result<Self, ScrapeError> {
        Ok(Self {
            maps,
            scraper: CellScraper::new(selectors)?,
        })
    }

    /// Page files in a directory, sorted by name
    pub fn list_pages(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut pages = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() {
                pages.push(path);
            }
        }
        pages.sort();
        Ok(pages)
    }

    /// Process every page in `dir` into a fresh run
    pub fn aggregate_dir(
        &self,
        dir: &Path,
        policy: CollisionPolicy,
    ) -> std::io::Result<PageRun> {
        let pages = Self::list_pages(dir)?;
        let mut run = PageRun::new(policy);
        info!(
            "Found {} pages in {} (collision policy: {})",
            pages.len(),
            dir.display(),
            run.index.policy()
        );

        for path in &pages {
            self.process_file(&mut run, path);
        }

        info!(
            "Nested index holds {} values from {} documents",
            run.index.value_count(),
            run.report.succeeded()
        );
        Ok(run)
    }

    /// Read, decode and fold one page; failures are logged and counted
    ///
    /// A document that overwrote or kept earlier values is counted as both
    /// succeeded and a collision.
    pub fn process_file(&self, run: &mut PageRun, path: &Path) {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let result = FilenameKey::from_path(path, &self.maps)
            .map_err(PageError::from)
            .and_then(|key| {
                let html = fs::read_to_string(path)?;
                self.process_document(&mut run.index, &key, &html)
            });

        let outcome = match &result {
            Ok(summary) => {
                info!("SUCCESS - {} ({} values)", name, summary.written);
                if summary.collisions > 0 {
                    warn!(
                        "COLLISION - {}: {} values already present ({})",
                        name,
                        summary.collisions,
                        run.index.policy()
                    );
                    run.report.record(Outcome::Collision);
                }
                Outcome::Succeeded
            }
            Err(e) => {
                let outcome = e.outcome();
                match outcome {
                    Outcome::DocumentSkipped => info!("SKIPPED - {}: {}", name, e),
                    Outcome::ReferenceLookupError => error!("LOOKUP FAILED - {}: {}", name, e),
                    _ => warn!("FAILED - {}: {}", name, e),
                }
                outcome
            }
        };
        run.report.record(outcome);
    }

    /// Scrape one decoded page and write it into `index`
    ///
    /// Returns what the write did, including collisions with earlier documents.
    #[instrument(skip(self, index, html), fields(html_size = html.len()))]
    pub fn process_document(
        &self,
        index: &mut NestedIndex,
        key: &FilenameKey,
        html: &str,
    ) -> Result<WriteSummary, PageError> {
        let observations = self.scraper.scrape(html, key)?;
        debug!("Scraped {} observations", observations.len());

        Ok(index.insert_document(key, &observations)?)
    }
}
