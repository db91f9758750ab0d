/*!
 * Collection of the files eligible for content reading
 */

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use super::{traverse, TraversalOptions, Visit};
use crate::error::Result;
use crate::filter::FilterCriteria;
use crate::types::{slash_path, CandidateFile, Rejection, SkipReason};
use crate::utils::extension_of;

/// Candidates in traversal order, plus the files the metadata filters dropped
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Files eligible for reading
    pub candidates: Vec<CandidateFile>,
    /// Files dropped, with the first predicate that fired
    pub rejected: Vec<Rejection>,
}

/// Applies the metadata-level filters to every regular file under a root
#[derive(Debug, Clone, Default)]
pub struct FileCollector {
    options: TraversalOptions,
}

impl FileCollector {
    /// Create a new file collector
    pub fn new(options: TraversalOptions) -> Self {
        Self { options }
    }

    /// Eligible files in traversal order
    pub fn collect(&self, root: &Path, criteria: &FilterCriteria) -> Result<Vec<CandidateFile>> {
        Ok(self.collect_detailed(root, criteria)?.candidates)
    }

    /// Eligible files together with the rejected ones
    pub fn collect_detailed(&self, root: &Path, criteria: &FilterCriteria) -> Result<Collection> {
        let mut collection = Collection::default();

        for visit in traverse(root, criteria, &self.options)? {
            let (path, relative) = match visit {
                Visit::File { path, relative, .. } => (path, relative),
                // One rejection stands for a whole pruned subtree
                Visit::Pruned { relative, reason } => {
                    log::debug!("Skipping {}: {}", slash_path(&relative), reason);
                    collection.rejected.push(Rejection { relative, reason });
                    continue;
                }
                Visit::Directory { .. } | Visit::Error { .. } => continue,
            };

            // Follows symlinks; dangling links and special files are dropped
            let metadata = match fs::metadata(&path) {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    log::debug!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            let candidate = CandidateFile {
                extension: extension_of(&path),
                size: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                path,
                relative,
            };

            match rejection_reason(criteria, &candidate) {
                Some(reason) => {
                    log::debug!("Skipping {}: {}", candidate.display_path(), reason);
                    collection.rejected.push(Rejection {
                        relative: candidate.relative,
                        reason,
                    });
                }
                None => collection.candidates.push(candidate),
            }
        }

        log::info!(
            "Collected {} files ({} rejected)",
            collection.candidates.len(),
            collection.rejected.len()
        );
        Ok(collection)
    }
}

/// First metadata predicate that excludes `file`, if any
///
/// Excluded folders never get this far; the traversal prunes them.
fn rejection_reason(criteria: &FilterCriteria, file: &CandidateFile) -> Option<SkipReason> {
    if criteria.is_excluded_extension(&file.extension) {
        return Some(SkipReason::ExcludedByExtension);
    }
    if !criteria.is_selected(&file.relative, &file.path) {
        return Some(SkipReason::NotInSelection);
    }
    if file.size < criteria.min_size() {
        return Some(SkipReason::BelowMinSize);
    }
    if let Some(cutoff) = criteria.modified_after() {
        if file.modified < cutoff {
            return Some(SkipReason::BeforeModifiedAfter);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    use filetime::{set_file_mtime, FileTime};
    use tempfile::tempdir;

    fn relative_paths(files: &[CandidateFile]) -> Vec<String> {
        files.iter().map(CandidateFile::display_path).collect()
    }

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_collect_orders_like_the_tree() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        write(root, "sub/c.py", "import os");
        write(root, "a.txt", "hello world");
        write(root, "b.log", "log");

        let criteria = FilterCriteria::builder()
            .exclude_extensions([".log"])
            .build()
            .unwrap();
        let collection = FileCollector::default()
            .collect_detailed(root, &criteria)
            .unwrap();

        assert_eq!(relative_paths(&collection.candidates), vec!["a.txt", "sub/c.py"]);
        assert_eq!(
            collection.rejected,
            vec![Rejection {
                relative: PathBuf::from("b.log"),
                reason: SkipReason::ExcludedByExtension,
            }]
        );

        let first = collection.candidates[0].clone();
        assert_eq!(first.path, root.join("a.txt"));
        assert_eq!(first.size, 11);
        assert_eq!(first.extension, ".txt");
    }

    #[test]
    fn test_each_predicate_individually() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        write(root, "keep.rs", "fn main() {}");
        write(root, "tiny.rs", "x");
        write(root, "image.PNG", "not really");
        write(root, "old.rs", "fn old() {}");
        set_file_mtime(root.join("old.rs"), FileTime::from_unix_time(0, 0)).unwrap();

        let collector = FileCollector::default();

        let by_ext = FilterCriteria::builder().exclude_extensions(["png"]).build().unwrap();
        let names = relative_paths(&collector.collect(root, &by_ext).unwrap());
        assert!(!names.contains(&"image.PNG".to_string()));
        assert_eq!(names.len(), 3);

        let by_size = FilterCriteria::builder().min_size(5).build().unwrap();
        let names = relative_paths(&collector.collect(root, &by_size).unwrap());
        assert!(!names.contains(&"tiny.rs".to_string()));
        assert_eq!(names.len(), 3);

        let cutoff = SystemTime::UNIX_EPOCH + Duration::from_secs(86_400);
        let by_date = FilterCriteria::builder().modified_after(Some(cutoff)).build().unwrap();
        let names = relative_paths(&collector.collect(root, &by_date).unwrap());
        assert!(!names.contains(&"old.rs".to_string()));
        assert_eq!(names.len(), 3);

        let by_selection = FilterCriteria::builder().select(["keep.rs"]).build().unwrap();
        let names = relative_paths(&collector.collect(root, &by_selection).unwrap());
        assert_eq!(names, vec!["keep.rs"]);
    }

    #[test]
    fn test_predicates_in_combination() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        write(root, "src/lib.rs", "pub fn lib() {}");
        write(root, "src/big.rs", &"x".repeat(100));
        write(root, "src/notes.md", &"y".repeat(100));
        write(root, "vendor/dep.rs", &"z".repeat(100));

        let criteria = FilterCriteria::builder()
            .exclude_extensions([".md"])
            .min_size(50)
            .select(["src/big.rs", "src/lib.rs", "src/notes.md"])
            .build()
            .unwrap();
        let collection = FileCollector::default()
            .collect_detailed(root, &criteria)
            .unwrap();

        assert_eq!(relative_paths(&collection.candidates), vec!["src/big.rs"]);
        let reasons: Vec<_> = collection.rejected.iter().map(|r| r.reason).collect();
        assert_eq!(
            reasons,
            vec![
                SkipReason::BelowMinSize,
                SkipReason::ExcludedByExtension,
                SkipReason::NotInSelection,
            ]
        );
    }

    #[test]
    fn test_modified_after_boundary() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        write(root, "ancient.txt", "old");
        write(root, "fresh.txt", "new");

        let now = SystemTime::now();
        set_file_mtime(root.join("ancient.txt"), FileTime::from_unix_time(0, 0)).unwrap();
        set_file_mtime(root.join("fresh.txt"), FileTime::from_system_time(now)).unwrap();
        let fresh_mtime = fs::metadata(root.join("fresh.txt")).unwrap().modified().unwrap();

        let criteria = FilterCriteria::builder()
            .modified_after(Some(fresh_mtime))
            .build()
            .unwrap();
        let collection = FileCollector::default()
            .collect_detailed(root, &criteria)
            .unwrap();

        assert_eq!(relative_paths(&collection.candidates), vec!["fresh.txt"]);
        assert_eq!(collection.rejected[0].reason, SkipReason::BeforeModifiedAfter);
    }

    #[test]
    fn test_excluded_segment_with_path_pattern() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        write(root, "public/build/app.js", "built");
        write(root, "public/index.html", "<html></html>");
        write(root, "build/keep.js", "source");

        let criteria = FilterCriteria::builder()
            .exclude_folders(["public/build"])
            .build()
            .unwrap();
        let collection = FileCollector::default()
            .collect_detailed(root, &criteria)
            .unwrap();
        assert_eq!(
            relative_paths(&collection.candidates),
            vec!["build/keep.js", "public/index.html"]
        );
        assert_eq!(
            collection.rejected,
            vec![Rejection {
                relative: PathBuf::from("public/build"),
                reason: SkipReason::ExcludedByFolder,
            }]
        );
    }

    #[test]
    fn test_pruned_folders_are_recorded() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        write(root, ".git/HEAD", "ref: refs/heads/main");
        write(root, ".git/objects/ab/cdef", "blob");
        write(root, "docs/guide.md", "guide");
        write(root, "src/main.rs", "fn main() {}");
        write(root, "src/node_modules/pkg/index.js", "module.exports = {}");

        let criteria = FilterCriteria::builder()
            .exclude_folders([".git", "node_modules"])
            .folder_filter(Some("src".to_string()))
            .build()
            .unwrap();
        let collection = FileCollector::default()
            .collect_detailed(root, &criteria)
            .unwrap();

        assert_eq!(relative_paths(&collection.candidates), vec!["src/main.rs"]);
        let rejected: Vec<_> = collection
            .rejected
            .iter()
            .map(|r| (slash_path(&r.relative), r.reason))
            .collect();
        assert_eq!(
            rejected,
            vec![
                (".git".to_string(), SkipReason::ExcludedByFolder),
                ("docs".to_string(), SkipReason::ExcludedByFolder),
                ("src/node_modules".to_string(), SkipReason::ExcludedByFolder),
            ]
        );
    }
}
