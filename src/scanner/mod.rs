/*!
 * Directory traversal shared by the tree walker and the file collector
 *
 * Both consumers see the same entries in the same order: lexicographic by
 * file name at each level, depth-first, a directory before its contents.
 * Excluded names and directories failing the folder filter are pruned here
 * together with their whole subtree. A pruned entry is still reported once,
 * as [`Visit::Pruned`], so the collector can account for it.
 */

mod collector;
mod tree;

pub use collector::{Collection, FileCollector};
pub use tree::{render, TreeWalker};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use ignore::WalkBuilder;
use walkdir::WalkDir;

use crate::error::{FolderCatError, Result};
use crate::filter::FilterCriteria;
use crate::types::{slash_path, SkipReason};

/// Traversal backend settings
#[derive(Debug, Clone, Default)]
pub struct TraversalOptions {
    /// Honour .gitignore / .ignore files
    pub respect_gitignore: bool,
    /// Extra ignore file name to honour alongside .gitignore
    pub gitignore_path: Option<PathBuf>,
}

/// One step of a traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Visit {
    Directory {
        path: PathBuf,
        relative: PathBuf,
        depth: usize,
    },
    File {
        path: PathBuf,
        relative: PathBuf,
        depth: usize,
    },
    /// A directory below the root that could not be listed
    Error { depth: usize, message: String },
    /// An entry dropped by the pruning rule, standing for its whole subtree
    Pruned { relative: PathBuf, reason: SkipReason },
}

/// Entries pruned inside a walker's filter, in the order they were met
#[derive(Debug, Clone, Default)]
struct PrunedSink(Arc<Mutex<Vec<Visit>>>);

impl PrunedSink {
    fn record(&self, root: &Path, path: &Path, reason: SkipReason) {
        if let Ok(mut pruned) = self.0.lock() {
            pruned.push(Visit::Pruned {
                relative: path.strip_prefix(root).unwrap_or(path).to_path_buf(),
                reason,
            });
        }
    }

    /// Move everything recorded so far to the end of `visits`
    fn drain_into(&self, visits: &mut Vec<Visit>) {
        if let Ok(mut pruned) = self.0.lock() {
            visits.append(&mut pruned);
        }
    }

    /// Apply the pruning rule, recording the entry when it is dropped
    fn keep(&self, criteria: &FilterCriteria, root: &Path, path: &Path, is_dir: bool) -> bool {
        match prune_reason(criteria, root, path, is_dir) {
            Some(reason) => {
                self.record(root, path, reason);
                false
            }
            None => true,
        }
    }
}

/// Walk `root` and return every surviving entry in listing order
///
/// Failing to list the root itself is fatal. Failures further down become
/// [`Visit::Error`] entries and the walk carries on.
pub(crate) fn traverse(
    root: &Path,
    criteria: &FilterCriteria,
    options: &TraversalOptions,
) -> Result<Vec<Visit>> {
    fs::read_dir(root).map_err(|source| FolderCatError::RootUnlistable {
        path: root.to_path_buf(),
        source,
    })?;

    if options.respect_gitignore {
        Ok(traverse_with_ignore(root, criteria, options))
    } else {
        Ok(traverse_with_walkdir(root, criteria))
    }
}

fn traverse_with_walkdir(root: &Path, criteria: &FilterCriteria) -> Vec<Visit> {
    let sink = PrunedSink::default();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0 || sink.keep(criteria, root, e.path(), e.file_type().is_dir())
        });

    let mut visits = Vec::new();
    for result in walker {
        // Entries pruned while fetching this one come first
        sink.drain_into(&mut visits);
        match result {
            Ok(entry) if entry.depth() == 0 => {}
            Ok(entry) => visits.push(make_visit(
                root,
                entry.path(),
                entry.depth() - 1,
                entry.file_type().is_dir(),
            )),
            Err(err) => {
                let message = err
                    .io_error()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| err.to_string());
                visits.push(make_error(root, err.path(), err.depth(), &message));
            }
        }
    }
    sink.drain_into(&mut visits);
    visits
}

fn traverse_with_ignore(
    root: &Path,
    criteria: &FilterCriteria,
    options: &TraversalOptions,
) -> Vec<Visit> {
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .git_ignore(true)
        .git_exclude(true)
        .ignore(true)
        .parents(true)
        .require_git(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b));

    if let Some(gitignore_path) = &options.gitignore_path {
        builder.add_custom_ignore_filename(gitignore_path);
    }

    let sink = PrunedSink::default();
    let filter_sink = sink.clone();
    let filter_criteria = criteria.clone();
    let filter_root = root.to_path_buf();
    builder.filter_entry(move |e| {
        e.depth() == 0
            || filter_sink.keep(
                &filter_criteria,
                &filter_root,
                e.path(),
                e.file_type().is_some_and(|ft| ft.is_dir()),
            )
    });

    let mut visits = Vec::new();
    for result in builder.build() {
        sink.drain_into(&mut visits);
        match result {
            Ok(entry) if entry.depth() == 0 => {}
            Ok(entry) => visits.push(make_visit(
                root,
                entry.path(),
                entry.depth() - 1,
                entry.file_type().is_some_and(|ft| ft.is_dir()),
            )),
            Err(err) => {
                let (path, depth) = ignore_error_location(&err);
                visits.push(make_error(root, path, depth.unwrap_or(0), &err.to_string()));
            }
        }
    }
    sink.drain_into(&mut visits);
    visits
}

/// Pruning rule applied to every entry below the root
fn prune_reason(criteria: &FilterCriteria, root: &Path, path: &Path, is_dir: bool) -> Option<SkipReason> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy();

    if criteria.is_excluded_name(&name, relative) || (is_dir && !criteria.folder_matches(&name)) {
        return Some(SkipReason::ExcludedByFolder);
    }
    None
}

fn make_visit(root: &Path, path: &Path, depth: usize, is_dir: bool) -> Visit {
    let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    if is_dir {
        Visit::Directory {
            path: path.to_path_buf(),
            relative,
            depth,
        }
    } else {
        Visit::File {
            path: path.to_path_buf(),
            relative,
            depth,
        }
    }
}

/// Place an error entry at the children level of the directory that failed
fn make_error(root: &Path, path: Option<&Path>, fallback_depth: usize, message: &str) -> Visit {
    let relative = path.and_then(|p| p.strip_prefix(root).ok());
    let depth = relative
        .map(|r| r.components().count())
        .unwrap_or(fallback_depth);
    let shown = relative
        .map(slash_path)
        .unwrap_or_else(|| path.map(|p| p.display().to_string()).unwrap_or_default());

    log::warn!("Could not list directory {}: {}", shown, message);
    Visit::Error {
        depth,
        message: format!("Could not list directory {}: {}", shown, message),
    }
}

fn ignore_error_location(err: &ignore::Error) -> (Option<&Path>, Option<usize>) {
    match err {
        ignore::Error::WithPath { path, err } => {
            let (_, depth) = ignore_error_location(err);
            (Some(path.as_path()), depth)
        }
        ignore::Error::WithDepth { depth, err } => {
            let (path, _) = ignore_error_location(err);
            (path, Some(*depth))
        }
        ignore::Error::WithLineNumber { err, .. } => ignore_error_location(err),
        _ => (None, None),
    }
}
