//! Line-oriented text cleaning
//!
//! Turns a raw extracted document into delimited sentence blocks suitable
//! for language-model training. A line either qualifies (too short lines
//! and lines carrying site boilerplate are dropped) and is appended to the
//! current block, or it acts as a block boundary.

use crate::error::FicError;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Minimum line length (bytes, after trimming) for a line to qualify
pub const MIN_LINE_LENGTH: usize = 20;

/// Default stop phrases: a line containing any of these (case-insensitive)
/// is dropped. Covers navigation/metadata markers, URLs, horizontal rules,
/// ellipses and author notes.
const STOP_PHRASES: &[&str] = &[
    "notes:",
    "summary:",
    "chapter text",
    "disclaimer:",
    "disclaimers:",
    "https://",
    "http://",
    "****",
    "....",
    ". . .",
    "—--",
    "author note",
];

/// Default ordered replacement table. Order matters: later replacements
/// may act on text produced by earlier ones.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("***", ""),
    ("__", ""),
    ("~*~", ""),
    ("''", "\" "),
    ("‘", "\""),
    ("’ ", "\""),
    ("“", "\""),
    ("”", "\""),
    ("' ", "\" "),
    (" '", " \""),
    (".'", ".\""),
];

/// Immutable cleaning rule set
///
/// The defaults reproduce the fixed AO3 rule set; tests can construct
/// alternate rule sets instead of patching process-wide state.
#[derive(Debug, Clone)]
pub struct CleanRules {
    /// Minimum qualifying line length in bytes, after trimming
    pub min_line_length: usize,
    /// Lowercase stop phrases; containment disqualifies a line
    pub stop_phrases: Vec<String>,
    /// Ordered global substring replacements
    pub replacements: Vec<(String, String)>,
    /// Emitted when a block opens (empty by default, a no-op)
    pub start_token: String,
    /// Emitted when a block closes
    pub end_token: String,
}

impl Default for CleanRules {
    fn default() -> Self {
        Self {
            min_line_length: MIN_LINE_LENGTH,
            stop_phrases: STOP_PHRASES.iter().map(|s| s.to_string()).collect(),
            replacements: REPLACEMENTS
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            start_token: String::new(),
            end_token: "\n".to_string(),
        }
    }
}

/// Result of cleaning a single line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedLine {
    /// Transformed line text (empty if skipped)
    pub text: String,
    /// Byte length of the transformed text
    pub len: usize,
    /// True if the line was dropped and acts as a block boundary
    pub skipped: bool,
}

impl CleanedLine {
    fn skip() -> Self {
        Self {
            text: String::new(),
            len: 0,
            skipped: true,
        }
    }
}

/// Line cleaner configured with an immutable rule set
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    rules: CleanRules,
}

impl Cleaner {
    /// Create a cleaner with the default AO3 rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cleaner with a custom rule set
    pub fn with_rules(rules: CleanRules) -> Self {
        Self { rules }
    }

    /// Clean a single line
    ///
    /// Trims spaces, drops lines below the minimum length or containing a
    /// stop phrase, normalizes a paragraph-opening single quote, then
    /// applies the ordered replacement table.
    pub fn clean_line(&self, s: &str) -> CleanedLine {
        let line = s.trim_matches(' ');

        if line.len() < self.rules.min_line_length {
            return CleanedLine::skip();
        }

        let checks = line.to_lowercase();
        if self.rules.stop_phrases.iter().any(|w| checks.contains(w)) {
            return CleanedLine::skip();
        }

        let mut line = if let Some(rest) = line.strip_prefix('\'') {
            format!("\"{rest}")
        } else {
            line.to_string()
        };

        for (from, to) in &self.rules.replacements {
            line = line.replace(from.as_str(), to);
        }

        let len = line.len();
        CleanedLine {
            text: line,
            len,
            skipped: false,
        }
    }

    /// Clean a raw document into delimited sentence blocks
    ///
    /// Reads `source` line by line and writes blocks of qualifying lines to
    /// `target`. Consecutive qualifying lines concatenate directly; a
    /// skipped line closes the open block with the end token plus a
    /// newline; a block still open at end of input is closed with the bare
    /// end token. Returns the accumulated byte length of emitted line
    /// content, markers excluded.
    pub fn clean_rewrite(&self, source: &Path, target: &Path) -> Result<usize, FicError> {
        let reader = BufReader::new(File::open(source)?);
        let mut writer = BufWriter::new(File::create(target)?);

        let mut total = 0;
        let mut in_block = false;

        for line in reader.lines() {
            let cleaned = self.clean_line(&line?);
            if !cleaned.skipped {
                if !in_block {
                    writer.write_all(self.rules.start_token.as_bytes())?;
                    in_block = true;
                }
                writer.write_all(cleaned.text.as_bytes())?;
                total += cleaned.len;
            } else if in_block {
                writer.write_all(self.rules.end_token.as_bytes())?;
                writer.write_all(b"\n")?;
                in_block = false;
            }
        }
        if in_block {
            writer.write_all(self.rules.end_token.as_bytes())?;
        }
        writer.flush()?;

        debug!(source = %source.display(), target = %target.display(), total, "cleaned document");
        Ok(total)
    }
}
