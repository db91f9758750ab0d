/*!
 * Core types and data structures for foldercat
 */

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Kind of a structural listing line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Directory that survived the folder filters
    Directory,
    /// File that survived the name and extension filters
    File,
    /// A directory below the root that could not be listed
    Error,
}

impl EntryKind {
    /// Marker printed in front of the entry name
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Directory => "[DIR]",
            Self::File => "[FILE]",
            Self::Error => "[ERROR]",
        }
    }
}

/// One line of the structural listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Entry kind
    pub kind: EntryKind,
    /// Nesting depth, 0 for direct children of the root
    pub depth: usize,
    /// Entry name, or the error message for error entries
    pub name: String,
    /// Size in bytes (files only)
    pub size: Option<u64>,
}

impl TreeEntry {
    /// Render the entry as one line of the listing
    pub fn render(&self) -> String {
        format!("{}{} {}", "    ".repeat(self.depth), self.kind.marker(), self.name)
    }
}

/// A file that passed every metadata-level filter and is eligible for reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Absolute path
    pub path: PathBuf,
    /// Path relative to the scan root
    pub relative: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Lowercased extension with its leading dot, empty if none
    pub extension: String,
}

impl CandidateFile {
    /// Relative path with `/` separators regardless of platform
    pub fn display_path(&self) -> String {
        slash_path(&self.relative)
    }
}

/// Why a file did not make it into the aggregated contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SkipReason {
    /// Content looks binary or its encoding could not be determined
    Binary,
    /// Keyword filter did not match
    KeywordMismatch,
    /// Regex filter did not match
    RegexMismatch,
    /// File is smaller than the minimum size
    BelowMinSize,
    /// File was last modified before the cutoff
    BeforeModifiedAfter,
    /// A path segment matches an excluded folder
    ExcludedByFolder,
    /// File extension is excluded
    ExcludedByExtension,
    /// File is not part of the explicit selection
    NotInSelection,
}

/// Result of processing one candidate file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Formatted content block ready for aggregation
    Included(String),
    /// File was filtered out
    Skipped(SkipReason),
    /// File could not be read
    ReadError(String),
}

/// Candidate file together with its processing outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReadResult {
    /// The file this result belongs to
    pub file: CandidateFile,
    /// What happened to it
    pub outcome: ReadOutcome,
}

impl FileReadResult {
    /// Text this result contributes to the aggregated contents
    pub fn rendered_block(&self) -> Option<String> {
        match &self.outcome {
            ReadOutcome::Included(block) => Some(block.clone()),
            ReadOutcome::ReadError(message) => Some(format!(
                "\n[ERROR] Could not read {}: {}\n",
                self.file.display_path(),
                message
            )),
            ReadOutcome::Skipped(_) => None,
        }
    }
}

/// A file dropped by the collector before any content was read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Path relative to the scan root
    pub relative: PathBuf,
    /// Predicate that fired first
    pub reason: SkipReason,
}

/// Supported output encodings
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    ValueEnum,
    EnumIter,
    EnumString,
    Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text
    #[default]
    #[value(alias = "text")]
    #[strum(to_string = "txt", serialize = "text")]
    #[serde(alias = "text")]
    Txt,
    /// JSON object with the structure and contents as strings
    Json,
    /// Markdown with fenced sections
    Md,
    /// HTML page rendered from the Markdown document
    Html,
}

impl OutputFormat {
    /// File extension used when persisting this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Json => "json",
            Self::Md => "md",
            Self::Html => "html",
        }
    }
}

/// Final payload of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedOutput {
    format: OutputFormat,
    payload: String,
}

impl AggregatedOutput {
    /// Wrap a finished payload
    pub fn new(format: OutputFormat, payload: String) -> Self {
        Self { format, payload }
    }

    /// Format tag
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Payload text
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Consume the output and return its payload
    pub fn into_payload(self) -> String {
        self.payload
    }
}

impl fmt::Display for AggregatedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.payload)
    }
}

/// Join the normal components of a path with `/`
pub fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
