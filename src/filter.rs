/*!
 * Filter criteria shared by the walker, the collector and the reader
 */

use std::collections::BTreeSet;
use std::path::Path;
use std::time::SystemTime;

use glob_match::glob_match;
use regex::{Regex, RegexBuilder};

use crate::error::Result;
use crate::types::slash_path;
use crate::utils::normalize_extension;

/// Immutable set of inclusion and exclusion predicates for one run
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    excluded_folders: BTreeSet<String>,
    excluded_extensions: BTreeSet<String>,
    folder_filter: Option<String>,
    keyword: Option<String>,
    regex: Option<Regex>,
    min_size: u64,
    modified_after: Option<SystemTime>,
    selection: BTreeSet<String>,
    minify: bool,
}

impl FilterCriteria {
    /// Start building a new set of criteria
    pub fn builder() -> FilterCriteriaBuilder {
        FilterCriteriaBuilder::default()
    }

    /// Excluded folder names or patterns
    pub fn excluded_folders(&self) -> &BTreeSet<String> {
        &self.excluded_folders
    }

    /// Excluded extensions, lowercased with a leading dot
    pub fn excluded_extensions(&self) -> &BTreeSet<String> {
        &self.excluded_extensions
    }

    /// Folder-name substring filter
    pub fn folder_filter(&self) -> Option<&str> {
        self.folder_filter.as_deref()
    }

    /// Keyword as given by the user
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    /// Compiled content regex
    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }

    /// Minimum file size in bytes
    pub fn min_size(&self) -> u64 {
        self.min_size
    }

    /// Modification-time cutoff
    pub fn modified_after(&self) -> Option<SystemTime> {
        self.modified_after
    }

    /// Explicitly selected relative paths
    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    /// Whether content should be minified
    pub fn minify(&self) -> bool {
        self.minify
    }

    /// Check whether an entry name, at `relative` under the root, hits an
    /// excluded folder pattern
    ///
    /// Plain names compare against the entry name, glob patterns are matched
    /// against it, and patterns containing `/` compare against the whole
    /// relative path.
    pub fn is_excluded_name(&self, name: &str, relative: &Path) -> bool {
        self.excluded_folders.iter().any(|pattern| {
            if pattern.contains('/') {
                let relative = slash_path(relative);
                let pattern = pattern.trim_matches('/');
                relative == pattern || relative.starts_with(&format!("{}/", pattern))
            } else {
                pattern == name || glob_match(pattern, name)
            }
        })
    }

    /// Check whether a normalized extension is excluded
    pub fn is_excluded_extension(&self, extension: &str) -> bool {
        !extension.is_empty() && self.excluded_extensions.contains(extension)
    }

    /// Check whether a directory name passes the folder filter
    pub fn folder_matches(&self, name: &str) -> bool {
        match &self.folder_filter {
            Some(filter) => name.contains(filter.as_str()),
            None => true,
        }
    }

    /// Check whether a file is part of the explicit selection, if there is one
    pub fn is_selected(&self, relative: &Path, absolute: &Path) -> bool {
        if self.selection.is_empty() {
            return true;
        }
        self.selection.contains(&slash_path(relative))
            || self.selection.contains(&absolute.to_string_lossy().to_string())
    }

    /// Case-insensitive keyword test; passes when no keyword is set
    pub fn keyword_matches(&self, content: &str) -> bool {
        match &self.keyword {
            Some(keyword) => content.to_lowercase().contains(&keyword.to_lowercase()),
            None => true,
        }
    }

    /// Case-insensitive regex test; passes when no regex is set
    pub fn regex_matches(&self, content: &str) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(content),
            None => true,
        }
    }
}

/// Builder for [`FilterCriteria`]
#[derive(Debug, Clone, Default)]
pub struct FilterCriteriaBuilder {
    excluded_folders: Vec<String>,
    excluded_extensions: Vec<String>,
    folder_filter: Option<String>,
    keyword: Option<String>,
    regex: Option<String>,
    min_size: u64,
    modified_after: Option<SystemTime>,
    selection: Vec<String>,
    minify: bool,
}

impl FilterCriteriaBuilder {
    /// Folder names (or glob patterns, or relative paths) to skip
    pub fn exclude_folders<I, S>(mut self, folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_folders.extend(folders.into_iter().map(Into::into));
        self
    }

    /// Extensions to skip, with or without the leading dot
    pub fn exclude_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_extensions
            .extend(extensions.into_iter().map(Into::into));
        self
    }

    /// Only descend into folders whose name contains this substring
    pub fn folder_filter(mut self, filter: Option<String>) -> Self {
        self.folder_filter = filter;
        self
    }

    /// Keep only files containing this keyword
    pub fn keyword(mut self, keyword: Option<String>) -> Self {
        self.keyword = keyword;
        self
    }

    /// Keep only files matching this regex
    pub fn regex(mut self, regex: Option<String>) -> Self {
        self.regex = regex;
        self
    }

    /// Minimum file size in bytes
    pub fn min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Skip files last modified before this instant
    pub fn modified_after(mut self, modified_after: Option<SystemTime>) -> Self {
        self.modified_after = modified_after;
        self
    }

    /// Restrict reading to these relative (or absolute) paths
    pub fn select<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Minify file contents
    pub fn minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    /// Normalize every field and compile the regex
    pub fn build(self) -> Result<FilterCriteria> {
        let regex = match self.regex.filter(|r| !r.is_empty()) {
            Some(pattern) => Some(RegexBuilder::new(&pattern).case_insensitive(true).build()?),
            None => None,
        };

        Ok(FilterCriteria {
            excluded_folders: self
                .excluded_folders
                .into_iter()
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect(),
            excluded_extensions: self
                .excluded_extensions
                .iter()
                .map(|e| normalize_extension(e))
                .filter(|e| !e.is_empty())
                .collect(),
            folder_filter: self.folder_filter.filter(|f| !f.is_empty()),
            keyword: self.keyword.filter(|k| !k.is_empty()),
            regex,
            min_size: self.min_size,
            modified_after: self.modified_after,
            selection: self
                .selection
                .into_iter()
                .map(|p| normalize_selection(&p))
                .filter(|p| !p.is_empty())
                .collect(),
            minify: self.minify,
        })
    }
}

/// Normalize a selected path: forward slashes, no `./` prefix
fn normalize_selection(path: &str) -> String {
    let path = path.trim();
    if Path::new(path).is_absolute() {
        return path.to_string();
    }
    slash_path(Path::new(&path.replace('\\', "/")))
}
