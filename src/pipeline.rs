/*!
 * End-to-end run: validate, list, collect, read, aggregate
 */

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::filter::FilterCriteria;
use crate::reader::{render_blocks, ConcurrentReader, ProgressReporter, DEFAULT_THREADS};
use crate::scanner::{self, FileCollector, TraversalOptions, TreeWalker};
use crate::sensitive::SensitiveScanner;
use crate::types::{
    AggregatedOutput, CandidateFile, FileReadResult, OutputFormat, Rejection, TreeEntry,
};
use crate::utils::validate_root;
use crate::writer::Aggregator;

/// Settings of a run that are not filters
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Reader worker threads
    pub threads: usize,
    /// Traversal backend settings
    pub traversal: TraversalOptions,
    /// Output encoding
    pub format: OutputFormat,
    /// Text placed before the payload
    pub prompt: Option<String>,
    /// Use the extended sensitive content rules
    pub strict_masking: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            traversal: TraversalOptions::default(),
            format: OutputFormat::default(),
            prompt: None,
            strict_masking: false,
        }
    }
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Canonical root that was scanned
    pub root: PathBuf,
    /// Aggregated payload
    pub output: AggregatedOutput,
    /// Structural listing
    pub tree: Vec<TreeEntry>,
    /// Per-file outcomes in traversal order
    pub results: Vec<FileReadResult>,
    /// Files dropped before reading
    pub rejected: Vec<Rejection>,
    /// Wall time of the run
    pub duration: Duration,
}

/// Drives one run over a root
#[derive(Debug, Clone)]
pub struct Pipeline {
    criteria: FilterCriteria,
    options: PipelineOptions,
}

impl Pipeline {
    /// Create a pipeline
    pub fn new(criteria: FilterCriteria, options: PipelineOptions) -> Self {
        Self { criteria, options }
    }

    /// Filters in effect
    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Run without progress reporting
    pub fn run(&self, root: &Path) -> Result<RunOutput> {
        self.run_with_progress(root, &|_: &CandidateFile, _: &FileReadResult| {}, |_| {})
    }

    /// Run, announcing the candidate count through `on_start` and each
    /// finished file through `progress`
    pub fn run_with_progress<P, S>(&self, root: &Path, progress: &P, on_start: S) -> Result<RunOutput>
    where
        P: ProgressReporter + ?Sized,
        S: FnOnce(usize),
    {
        let start = Instant::now();
        let root = validate_root(root)?;
        log::info!("Scanning {}", root.display());

        let tree = TreeWalker::new(self.options.traversal.clone()).walk(&root, &self.criteria)?;
        let structure = scanner::render(&tree);

        let collection = FileCollector::new(self.options.traversal.clone())
            .collect_detailed(&root, &self.criteria)?;
        on_start(collection.candidates.len());

        let masking = if self.options.strict_masking {
            SensitiveScanner::extended()
        } else {
            SensitiveScanner::basic()
        };
        let reader = ConcurrentReader::new(self.options.threads, masking)?;
        let results = reader.read_all_with_progress(&collection.candidates, &self.criteria, progress);
        let contents = render_blocks(&results);

        let output = Aggregator::new()
            .with_prompt(self.options.prompt.clone())
            .format(&structure, &contents, self.options.format)?;

        let duration = start.elapsed();
        log::info!("Run finished in {:.2?}", duration);

        Ok(RunOutput {
            root,
            output,
            tree,
            results,
            rejected: collection.rejected,
            duration,
        })
    }
}
