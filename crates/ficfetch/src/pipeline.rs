//! Batch driver
//!
//! Runs the fetch-if-absent + clean sequence for one work or for every
//! work id in a list file, then merges the cleaned documents into the
//! aggregate corpus file. Strictly sequential; the first failing work
//! aborts the batch.

use crate::clean::Cleaner;
use crate::error::FicError;
use crate::fetch::WorkFetcher;
use crate::merge::{self, MergeSummary, TRAINING_SUFFIX};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::info;

/// Outcome of processing one work
#[derive(Debug, Clone, Serialize)]
pub struct WorkReport {
    /// Work identifier
    pub id: String,
    /// Path of the cleaned document
    pub cleaned_path: PathBuf,
    /// Characters of cleaned line content written (markers excluded)
    pub chars: usize,
}

/// Outcome of a full batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Per-work outcomes, in list order
    pub works: Vec<WorkReport>,
    /// Merge outcome
    pub merge: MergeSummary,
}

/// Batch pipeline over an output directory
#[derive(Debug, Clone)]
pub struct Pipeline {
    fetcher: WorkFetcher,
    cleaner: Cleaner,
    dir: PathBuf,
    merged_name: String,
}

impl Pipeline {
    /// Create a pipeline with default fetcher and cleaner
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, FicError> {
        Ok(Self::with_parts(
            WorkFetcher::new()?,
            Cleaner::new(),
            dir,
            merge::DEFAULT_MERGED_NAME,
        ))
    }

    /// Create a pipeline from explicit parts
    pub fn with_parts(
        fetcher: WorkFetcher,
        cleaner: Cleaner,
        dir: impl Into<PathBuf>,
        merged_name: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            cleaner,
            dir: dir.into(),
            merged_name: merged_name.into(),
        }
    }

    /// Path of a work's raw document
    pub fn raw_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.txt"))
    }

    /// Path of a work's cleaned document
    pub fn cleaned_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}{TRAINING_SUFFIX}"))
    }

    /// Fetch a work's raw document if absent, then clean-rewrite it
    pub async fn process_work(&self, id: &str) -> Result<WorkReport, FicError> {
        let raw = self.raw_path(id);
        if !raw.exists() {
            self.fetcher.fetch_work(id, &raw).await?;
        }

        let cleaned = self.cleaned_path(id);
        let chars = self.cleaner.clean_rewrite(&raw, &cleaned)?;
        info!(id, path = %cleaned.display(), chars, "cleaned work");

        Ok(WorkReport {
            id: id.to_string(),
            cleaned_path: cleaned,
            chars,
        })
    }

    /// Process exactly one work; no merge step
    pub async fn run_single(&self, id: &str) -> Result<WorkReport, FicError> {
        self.process_work(id).await
    }

    /// Process every work id in a list file, then merge the directory
    pub async fn run_list(&self, list_path: &Path) -> Result<BatchReport, FicError> {
        let ids = read_id_list(list_path)?;

        let mut works = Vec::with_capacity(ids.len());
        for id in &ids {
            works.push(self.process_work(id).await?);
        }

        let merge = merge::merge(&self.dir, &self.merged_name)?;
        Ok(BatchReport { works, merge })
    }
}

/// Read work ids from a list file
///
/// One id per line; blank lines and `#`-prefixed lines are skipped. Id
/// syntax is not validated.
fn read_id_list(path: &Path) -> Result<Vec<String>, FicError> {
    let reader = BufReader::new(File::open(path)?);
    let mut ids = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let id = line.trim();
        if id.is_empty() || id.starts_with('#') {
            continue;
        }
        ids.push(id.to_string());
    }
    Ok(ids)
}
