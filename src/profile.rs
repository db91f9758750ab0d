/*!
 * Project presets and saved profiles
 *
 * A project type supplies default exclusions and an optional folder filter.
 * Those defaults can be overridden per type from a `config.json`. Profiles
 * are named snapshots of the effective settings stored in `profiles.json`.
 */

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::{FolderCatError, Result, ResultExt};
use crate::types::OutputFormat;

/// Name of the profiles file inside the configuration directory
pub const PROFILES_FILE: &str = "profiles.json";

/// Kinds of project with built-in defaults
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
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
pub enum ProjectType {
    Python,
    Nodejs,
    Java,
    Go,
    Laravel,
    Nextjs,
    Reactjs,
    #[default]
    Generic,
}

/// Default filters of a project type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectDefaults {
    /// Folder names pruned from the walk
    pub exclude_folders: Vec<String>,
    /// Extensions left out of the listing and contents
    pub exclude_extensions: Vec<String>,
    /// Folder-name substring filter
    pub filter_folder: Option<String>,
}

fn preset(folders: &[&str], extensions: &[&str], filter: Option<&str>) -> ProjectDefaults {
    ProjectDefaults {
        exclude_folders: folders.iter().map(|f| f.to_string()).collect(),
        exclude_extensions: extensions.iter().map(|e| e.to_string()).collect(),
        filter_folder: filter.map(str::to_string),
    }
}

impl ProjectType {
    /// Built-in defaults for this project type
    pub fn defaults(&self) -> ProjectDefaults {
        match self {
            Self::Python => preset(
                &[".git", ".venv", "__pycache__"],
                &[".svg", ".pyc", ".jpg", ".png", ".bin"],
                None,
            ),
            Self::Nodejs | Self::Reactjs => preset(
                &[".git", "node_modules", "dist", "build"],
                &[".svg", ".log", ".jpg", ".png", ".bin"],
                Some("src"),
            ),
            Self::Java => preset(
                &[".git", "target", ".idea"],
                &[".svg", ".class", ".jpg", ".png", ".bin"],
                Some("src"),
            ),
            Self::Go => preset(&[".git", "vendor"], &[".svg", ".jpg", ".png", ".bin"], None),
            Self::Laravel => preset(
                &[".git", "vendor", "storage", "public/build"],
                &[".svg", ".jpg", ".png", ".bin", ".lock"],
                Some("app"),
            ),
            Self::Nextjs => preset(
                &[".git", "node_modules", ".next", "public"],
                &[".svg", ".jpg", ".png", ".bin"],
                Some("pages"),
            ),
            Self::Generic => preset(&[".git"], &[".svg", ".jpg", ".png", ".bin"], None),
        }
    }
}

/// Guess the project type from marker files at the root
pub fn detect_project_type(root: &Path) -> ProjectType {
    let has = |name: &str| root.join(name).is_file();

    let detected = if has("composer.json") {
        ProjectType::Laravel
    } else if has("next.config.js") || has("next.config.mjs") {
        ProjectType::Nextjs
    } else if has("package.json") {
        let manifest = fs::read_to_string(root.join("package.json")).unwrap_or_default();
        if manifest.contains("\"react\"") {
            ProjectType::Reactjs
        } else {
            ProjectType::Nodejs
        }
    } else if has("pyproject.toml") || has("requirements.txt") || has("setup.py") {
        ProjectType::Python
    } else if has("pom.xml") || has("build.gradle") {
        ProjectType::Java
    } else if has("go.mod") {
        ProjectType::Go
    } else {
        ProjectType::Generic
    };

    log::debug!("Detected project type {} for {}", detected, root.display());
    detected
}

/// Project defaults with per-type overrides from a `config.json`
#[derive(Debug, Clone, Default)]
pub struct ProjectPresets {
    overrides: BTreeMap<ProjectType, ProjectDefaults>,
}

impl ProjectPresets {
    /// Load overrides, keyed by project type name
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Reading project config {}", path.display()))?;
        let overrides = serde_json::from_str(&text).map_err(|e| {
            FolderCatError::Config(format!("Invalid project config {}: {}", path.display(), e))
        })?;
        Ok(Self { overrides })
    }

    /// Defaults for `project_type`, overrides first
    pub fn defaults_for(&self, project_type: ProjectType) -> ProjectDefaults {
        self.overrides
            .get(&project_type)
            .cloned()
            .unwrap_or_else(|| project_type.defaults())
    }
}

/// Named snapshot of run settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub project_type: Option<ProjectType>,
    pub filter_folder: Option<String>,
    pub exclude_folders: Option<Vec<String>>,
    pub exclude_extensions: Option<Vec<String>>,
    pub keyword: Option<String>,
    pub regex: Option<String>,
    pub output_format: Option<OutputFormat>,
    pub min_size: Option<u64>,
    /// Date as given on the command line
    pub modified_after: Option<String>,
}

/// All saved profiles, by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileStore {
    profiles: BTreeMap<String, Profile>,
}

impl ProfileStore {
    /// Default location of the profiles file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("foldercat").join(PROFILES_FILE))
    }

    /// Load the store; a missing file is an empty store
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Reading profiles {}", path.display()))?;
        serde_json::from_str(&text).map_err(|e| {
            FolderCatError::Config(format!("Invalid profiles file {}: {}", path.display(), e))
        })
    }

    /// Write the store as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("Writing profiles {}", path.display()))?;
        log::info!("Saved {} profile(s) to {}", self.profiles.len(), path.display());
        Ok(())
    }

    /// Look up a profile by name
    pub fn get(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| FolderCatError::Config(format!("Unknown profile: {}", name)))
    }

    /// Add or replace a profile
    pub fn insert(&mut self, name: impl Into<String>, profile: Profile) {
        self.profiles.insert(name.into(), profile);
    }

    /// Saved profile names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;
    use tempfile::tempdir;

    #[test]
    fn test_every_type_excludes_git() {
        for project_type in ProjectType::iter() {
            let defaults = project_type.defaults();
            assert!(defaults.exclude_folders.contains(&".git".to_string()));
            assert!(defaults.exclude_extensions.iter().all(|e| e.starts_with('.')));
        }
        assert_eq!(ProjectType::Laravel.defaults().filter_folder.as_deref(), Some("app"));
        assert_eq!(ProjectType::Python.defaults().filter_folder, None);
    }

    #[test]
    fn test_detect_project_type() {
        let cases: &[(&str, &str, ProjectType)] = &[
            ("composer.json", "{}", ProjectType::Laravel),
            ("next.config.mjs", "", ProjectType::Nextjs),
            ("package.json", "{\"dependencies\": {\"react\": \"18\"}}", ProjectType::Reactjs),
            ("package.json", "{\"name\": \"cli\"}", ProjectType::Nodejs),
            ("requirements.txt", "requests", ProjectType::Python),
            ("pom.xml", "<project/>", ProjectType::Java),
            ("go.mod", "module x", ProjectType::Go),
            ("README.md", "# hi", ProjectType::Generic),
        ];

        for (marker, content, expected) in cases {
            let temp_dir = tempdir().unwrap();
            fs::write(temp_dir.path().join(marker), content).unwrap();
            assert_eq!(detect_project_type(temp_dir.path()), *expected, "marker {}", marker);
        }
    }

    #[test]
    fn test_presets_override_one_type() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"python": {"exclude_folders": [".git", "build"], "filter_folder": "pkg"}}"#,
        )
        .unwrap();

        let presets = ProjectPresets::load(&path).unwrap();
        let python = presets.defaults_for(ProjectType::Python);
        assert_eq!(python.exclude_folders, vec![".git", "build"]);
        assert!(python.exclude_extensions.is_empty());
        assert_eq!(python.filter_folder.as_deref(), Some("pkg"));
        assert_eq!(presets.defaults_for(ProjectType::Go), ProjectType::Go.defaults());
    }

    #[test]
    fn test_invalid_presets_are_config_errors() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"cobol": {}}"#).unwrap();
        let err = ProjectPresets::load(&path).unwrap_err();
        assert!(matches!(err, FolderCatError::Config(_)));
    }

    #[test]
    fn test_profile_store_save_and_load() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested/profiles.json");

        let mut store = ProfileStore::load(&path).unwrap();
        assert_eq!(store.names().count(), 0);

        store.insert(
            "backend",
            Profile {
                project_type: Some(ProjectType::Python),
                keyword: Some("مدل".to_string()),
                output_format: Some(OutputFormat::Md),
                min_size: Some(10),
                ..Default::default()
            },
        );
        store.save(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("مدل"));
        assert!(text.contains("\"output_format\": \"md\""));

        let loaded = ProfileStore::load(&path).unwrap();
        assert_eq!(loaded, store);
        assert_eq!(loaded.get("backend").unwrap().min_size, Some(10));
        assert!(matches!(loaded.get("frontend"), Err(FolderCatError::Config(_))));
    }
}
