// Pages module
//
// Folds scraped HTML statistics pages into one nested index:
// - reference: code -> label lookup maps
// - key_decoder: `<state>-<datatype>-<year>-<period>` file names
// - cell_scraper: header/value cells from an output table
// - nested_index: year -> period -> state -> datatype -> entity -> value
// - aggregator: directory batch driver

pub mod aggregator;
pub mod cell_scraper;
pub mod key_decoder;
pub mod nested_index;
pub mod reference;

pub use aggregator::{PageAggregator, PageRun};
pub use cell_scraper::{CellScraper, ScrapeError, ScrapeSelectors, ScrapedObservation};
pub use key_decoder::{FilenameKey, KeyDecodeError};
pub use nested_index::{CollisionPolicy, IndexError, NestedIndex};
pub use reference::ReferenceMaps;
