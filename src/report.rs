use std::collections::BTreeMap;
use std::fmt;

use tracing::{info, warn};

/// Per-unit result categories (sheet, section, entity or document)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    Succeeded,
    Excluded,
    SheetSkipped,
    SectionDropped,
    ExtractionMismatch,
    ReferenceLookupError,
    DocumentSkipped,
    CountMismatch,
    Collision,
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Succeeded => "succeeded",
            Outcome::Excluded => "excluded",
            Outcome::SheetSkipped => "sheet_skipped",
            Outcome::SectionDropped => "section_dropped",
            Outcome::ExtractionMismatch => "extraction_mismatch",
            Outcome::ReferenceLookupError => "reference_lookup_error",
            Outcome::DocumentSkipped => "document_skipped",
            Outcome::CountMismatch => "count_mismatch",
            Outcome::Collision => "collision",
            Outcome::Failed => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Succeeded,
    /// Nothing made it into the output
    Failed,
}

/// Tally of unit outcomes for one batch run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    counts: BTreeMap<Outcome, usize>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: Outcome) {
        *self.counts.entry(outcome).or_insert(0) += 1;
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.counts.get(&outcome).copied().unwrap_or(0)
    }

    pub fn succeeded(&self) -> usize {
        self.count(Outcome::Succeeded)
    }

    /// Units that did not succeed and were not deliberately excluded
    pub fn problems(&self) -> usize {
        self.counts
            .iter()
            .filter(|(outcome, _)| !matches!(outcome, Outcome::Succeeded | Outcome::Excluded))
            .map(|(_, n)| n)
            .sum()
    }

    pub fn status(&self) -> RunStatus {
        if self.succeeded() == 0 {
            RunStatus::Failed
        } else {
            RunStatus::Succeeded
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Outcome, usize)> + '_ {
        self.counts.iter().map(|(outcome, n)| (*outcome, *n))
    }

    /// Emit the end-of-run summary
    pub fn log_summary(&self, run: &str) {
        for (outcome, n) in self.iter() {
            info!("{run}: {outcome} = {n}");
        }
        match self.status() {
            RunStatus::Succeeded => info!(
                "{run} finished: {} succeeded, {} problems",
                self.succeeded(),
                self.problems()
            ),
            RunStatus::Failed => warn!("{run} failed: no unit succeeded"),
        }
    }
}
