/*!
 * Concurrent, order-preserving content reading
 *
 * Candidate files are handed to a dedicated, bounded rayon pool. Results come
 * back in input order no matter which worker finishes first: the indexed
 * collect writes every slot exactly once and only returns when the whole
 * batch is done.
 */

use std::fs;
use std::panic::{self, AssertUnwindSafe};

use indicatif::ProgressBar;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::encoding;
use crate::error::{FolderCatError, Result};
use crate::filter::FilterCriteria;
use crate::minify::minify;
use crate::sensitive::{SensitiveScanner, REDACTION_MARKER};
use crate::types::{CandidateFile, FileReadResult, ReadOutcome, SkipReason};

/// Default number of reader threads
pub const DEFAULT_THREADS: usize = 4;

/// Width of the separator lines around a file header
pub const SEPARATOR_WIDTH: usize = 40;

/// Hook called from the worker once per finished file
pub trait ProgressReporter: Sync {
    /// Called with the file and its outcome
    fn report(&self, file: &CandidateFile, result: &FileReadResult);
}

// Implement ProgressReporter for closures
impl<F> ProgressReporter for F
where
    F: Fn(&CandidateFile, &FileReadResult) + Sync,
{
    fn report(&self, file: &CandidateFile, result: &FileReadResult) {
        self(file, result)
    }
}

impl ProgressReporter for ProgressBar {
    fn report(&self, file: &CandidateFile, _result: &FileReadResult) {
        self.inc(1);

        // Truncate long names to avoid display issues
        let name = file.display_path();
        let shown = if name.chars().count() > 40 {
            let tail: String = name.chars().rev().take(37).collect::<Vec<_>>().into_iter().rev().collect();
            format!("...{}", tail)
        } else {
            name
        };
        self.set_message(format!("Current file: {}", shown));
    }
}

/// Reads candidate files on a bounded worker pool
pub struct ConcurrentReader {
    pool: ThreadPool,
    scanner: SensitiveScanner,
}

impl ConcurrentReader {
    /// Create a reader with `threads` workers (at least one)
    pub fn new(threads: usize, scanner: SensitiveScanner) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("foldercat-reader-{}", i))
            .build()
            .map_err(|e| FolderCatError::Reader(e.to_string()))?;

        Ok(Self { pool, scanner })
    }

    /// Number of worker threads
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Process every file; result `i` belongs to `files[i]`
    pub fn read_all(&self, files: &[CandidateFile], criteria: &FilterCriteria) -> Vec<FileReadResult> {
        self.read_all_with_progress(files, criteria, &|_: &CandidateFile, _: &FileReadResult| {})
    }

    /// Like [`read_all`](Self::read_all), reporting each finished file
    pub fn read_all_with_progress<P>(
        &self,
        files: &[CandidateFile],
        criteria: &FilterCriteria,
        progress: &P,
    ) -> Vec<FileReadResult>
    where
        P: ProgressReporter + ?Sized,
    {
        self.pool.install(|| {
            files
                .par_iter()
                .map(|file| {
                    let result = self.read_guarded(file, criteria);
                    progress.report(file, &result);
                    result
                })
                .collect()
        })
    }

    /// Process one file; a panic becomes a read error for that file only
    fn read_guarded(&self, file: &CandidateFile, criteria: &FilterCriteria) -> FileReadResult {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.read_one(file, criteria)))
            .unwrap_or_else(|_| ReadOutcome::ReadError("internal error while processing file".to_string()));

        FileReadResult {
            file: file.clone(),
            outcome,
        }
    }

    /// Run one file through classification, decoding and the content filters
    ///
    /// A file that cannot be opened is already reported as binary by the
    /// sampling step, so `ReadError` only covers a file that changes between
    /// sampling and the full read (deleted, truncated or made unreadable).
    fn read_one(&self, file: &CandidateFile, criteria: &FilterCriteria) -> ReadOutcome {
        let shown = file.display_path();

        if encoding::is_binary(&file.path) {
            log::info!("Skipping binary file: {}", shown);
            return ReadOutcome::Skipped(SkipReason::Binary);
        }

        let bytes = match fs::read(&file.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("Could not read {}: {}", shown, e);
                return ReadOutcome::ReadError(e.to_string());
            }
        };

        let mut content = encoding::decode(&bytes, encoding::sniff_encoding(&bytes));

        if let Some(rule) = self.scanner.matched_rule(&content) {
            log::warn!("Sensitive content ({}) detected in {}, masking", rule, shown);
            content = REDACTION_MARKER.to_string();
        }

        if criteria.minify() {
            content = minify(&content, &file.extension);
        }

        if !criteria.keyword_matches(&content) {
            log::debug!("Skipping {}: keyword not found", shown);
            return ReadOutcome::Skipped(SkipReason::KeywordMismatch);
        }

        if !criteria.regex_matches(&content) {
            log::debug!("Skipping {}: regex did not match", shown);
            return ReadOutcome::Skipped(SkipReason::RegexMismatch);
        }

        ReadOutcome::Included(format_block(&shown, &content))
    }
}

/// Format one file's content block
pub fn format_block(path: &str, content: &str) -> String {
    let separator = "-".repeat(SEPARATOR_WIDTH);
    format!("\n{separator}\nFile: {path}\n{separator}\n{content}\n")
}

/// Concatenate the visible blocks of a batch in order
pub fn render_blocks(results: &[FileReadResult]) -> String {
    results
        .iter()
        .filter_map(FileReadResult::rendered_block)
        .collect()
}
