/*!
 * Structural listing of a directory tree
 */

use std::fs;
use std::path::Path;

use super::{traverse, TraversalOptions, Visit};
use crate::error::Result;
use crate::filter::FilterCriteria;
use crate::types::{EntryKind, TreeEntry};
use crate::utils::extension_of;

/// Produces the ordered `[DIR]` / `[FILE]` / `[ERROR]` listing of a root
#[derive(Debug, Clone, Default)]
pub struct TreeWalker {
    options: TraversalOptions,
}

impl TreeWalker {
    /// Create a new tree walker
    pub fn new(options: TraversalOptions) -> Self {
        Self { options }
    }

    /// List the root. Only a root that cannot be listed is an error.
    pub fn walk(&self, root: &Path, criteria: &FilterCriteria) -> Result<Vec<TreeEntry>> {
        let entries = traverse(root, criteria, &self.options)?
            .into_iter()
            .filter_map(|visit| match visit {
                Visit::Directory { path, depth, .. } => Some(TreeEntry {
                    kind: EntryKind::Directory,
                    depth,
                    name: file_name(&path),
                    size: None,
                }),
                Visit::File { path, depth, .. } => {
                    if criteria.is_excluded_extension(&extension_of(&path)) {
                        return None;
                    }
                    Some(TreeEntry {
                        kind: EntryKind::File,
                        depth,
                        name: file_name(&path),
                        size: fs::metadata(&path).ok().map(|m| m.len()),
                    })
                }
                Visit::Error { depth, message } => Some(TreeEntry {
                    kind: EntryKind::Error,
                    depth,
                    name: message,
                    size: None,
                }),
                Visit::Pruned { .. } => None,
            })
            .collect();

        Ok(entries)
    }
}

/// Render a listing, one entry per line
pub fn render(entries: &[TreeEntry]) -> String {
    entries
        .iter()
        .map(TreeEntry::render)
        .collect::<Vec<_>>()
        .join("\n")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}
