//! Corpus merging
//!
//! Concatenates all cleaned per-work files in a directory into one
//! aggregate corpus file.

use crate::error::FicError;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Filename suffix identifying cleaned documents
pub const TRAINING_SUFFIX: &str = ".training.txt";

/// Default name of the aggregate corpus file
pub const DEFAULT_MERGED_NAME: &str = "input.txt";

/// Outcome of a merge run
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MergeSummary {
    /// Number of cleaned files merged
    pub files: usize,
    /// Total bytes copied into the aggregate file
    pub bytes: u64,
}

/// Merge all `*.training.txt` files in `dir` into `dir/<output_name>`
///
/// The aggregate file is created (truncating any previous run). Files are
/// copied in directory-enumeration order, which is not guaranteed to be
/// sorted. Any open or copy error aborts the merge.
pub fn merge(dir: &Path, output_name: &str) -> Result<MergeSummary, FicError> {
    let merged_path = dir.join(output_name);
    let mut out = BufWriter::new(File::create(&merged_path)?);

    let mut summary = MergeSummary::default();
    for entry in dir.read_dir()? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        // Never merge the aggregate file into itself
        if !name.ends_with(TRAINING_SUFFIX) || name == output_name {
            continue;
        }

        let mut src = File::open(entry.path())?;
        summary.bytes += io::copy(&mut src, &mut out)?;
        summary.files += 1;
    }
    out.flush()?;

    info!(
        files = summary.files,
        bytes = summary.bytes,
        merged = %merged_path.display(),
        "merged corpus"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_merge_counts_files_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1.training.txt"), "aaaa").unwrap();
        fs::write(dir.path().join("2.training.txt"), "bbbbbb").unwrap();
        fs::write(dir.path().join("3.training.txt"), "cc").unwrap();

        let summary = merge(dir.path(), DEFAULT_MERGED_NAME).unwrap();

        assert_eq!(summary.files, 3);
        assert_eq!(summary.bytes, 12);
        let merged = fs::read_to_string(dir.path().join(DEFAULT_MERGED_NAME)).unwrap();
        assert_eq!(merged.len(), 12);
    }

    #[test]
    fn test_merge_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1.training.txt"), "keep").unwrap();
        fs::write(dir.path().join("1.txt"), "raw document").unwrap();
        fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let summary = merge(dir.path(), DEFAULT_MERGED_NAME).unwrap();

        assert_eq!(summary.files, 1);
        assert_eq!(
            fs::read_to_string(dir.path().join(DEFAULT_MERGED_NAME)).unwrap(),
            "keep"
        );
    }

    #[test]
    fn test_merge_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let summary = merge(dir.path(), DEFAULT_MERGED_NAME).unwrap();

        assert_eq!(summary.files, 0);
        assert_eq!(summary.bytes, 0);
        assert!(dir.path().join(DEFAULT_MERGED_NAME).exists());
    }

    #[test]
    fn test_merge_excludes_own_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1.training.txt"), "data").unwrap();

        let summary = merge(dir.path(), "all.training.txt").unwrap();

        assert_eq!(summary.files, 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("all.training.txt")).unwrap(),
            "data"
        );
    }

    #[test]
    fn test_merge_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = merge(&dir.path().join("missing"), DEFAULT_MERGED_NAME);
        assert!(matches!(result, Err(FicError::Io(_))));
    }
}
