/*!
 * foldercat - Concatenate a directory's structure and file contents
 *
 * This library walks a directory tree, renders its structure and gathers the
 * contents of the files that pass a set of filters into one text, JSON,
 * Markdown or HTML document, ready to hand to a Large Language Model.
 */

pub mod clipboard;
pub mod config;
pub mod encoding;
pub mod error;
pub mod filter;
pub mod minify;
pub mod persist;
pub mod pipeline;
pub mod profile;
pub mod prompt;
pub mod reader;
pub mod report;
pub mod scanner;
pub mod sensitive;
pub mod types;
pub mod utils;
pub mod writer;

#[cfg(test)]
mod tests;

// Re-export main components for easier access
pub use config::Config;
pub use error::{FolderCatError, Result};
pub use filter::{FilterCriteria, FilterCriteriaBuilder};
pub use pipeline::{Pipeline, PipelineOptions, RunOutput};
pub use reader::ConcurrentReader;
pub use report::{Reporter, RunReport};
pub use scanner::{FileCollector, TraversalOptions, TreeWalker};
pub use sensitive::SensitiveScanner;
pub use types::{
    AggregatedOutput, CandidateFile, EntryKind, FileReadResult, OutputFormat, ReadOutcome,
    SkipReason, TreeEntry,
};
pub use utils::{format_file_size, validate_root};
pub use writer::Aggregator;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
