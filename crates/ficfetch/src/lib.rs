//! ficfetch - fan-fiction corpus toolkit
//!
//! This crate retrieves long-form fan-fiction works from a remote archive,
//! strips markup and boilerplate, and concatenates the cleaned text into a
//! single corpus file suitable as language-model training data.
//!
//! ## Pipeline
//!
//! Work id list → [`WorkFetcher`] → raw `.txt` → [`Cleaner`] →
//! `.training.txt` → [`merge`] → aggregate corpus file.
//!
//! [`Pipeline`] drives the sequence for a single work or a list file. The
//! optional [`SearchCrawler`] discovers works from a listing page and
//! fetches them with bounded parallelism.

pub mod clean;
mod error;
pub mod fetch;
pub mod merge;
pub mod pipeline;
pub mod search;

pub use clean::{CleanRules, CleanedLine, Cleaner, MIN_LINE_LENGTH};
pub use error::FicError;
pub use fetch::{FetchOptions, WorkFetcher, DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
pub use merge::{merge, MergeSummary, DEFAULT_MERGED_NAME, TRAINING_SUFFIX};
pub use pipeline::{BatchReport, Pipeline, WorkReport};
pub use search::{SearchCrawler, SearchOptions};
