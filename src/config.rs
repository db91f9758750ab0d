/*!
 * Configuration handling for foldercat
 *
 * Every filter field resolves as: explicit flag, then the selected profile,
 * then the project-type preset.
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use clap::Parser;
use clap_complete::Shell;

use crate::error::{FolderCatError, Result};
use crate::filter::FilterCriteria;
use crate::persist::{PersistOptions, DEFAULT_MAX_CHARS, DEFAULT_OUTPUT_DIR};
use crate::pipeline::PipelineOptions;
use crate::profile::{detect_project_type, Profile, ProfileStore, ProjectPresets, ProjectType};
use crate::prompt::PromptTemplate;
use crate::reader::DEFAULT_THREADS;
use crate::scanner::TraversalOptions;
use crate::types::{slash_path, OutputFormat};
use crate::utils::validate_root;
use crate::{bail, ensure};

/// Command-line arguments for foldercat
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "foldercat",
    version = env!("CARGO_PKG_VERSION"),
    about = "Concatenate a project's structure and file contents into one document",
    long_about = "Walks a directory tree, renders its structure, and concatenates the contents of the files that pass the filters into a single text, JSON, Markdown or HTML document, ready to hand to a language model."
)]
pub struct Args {
    /// Directory to process
    #[clap(default_value = ".")]
    pub directory: PathBuf,

    /// Comma-separated folder names (or globs, or relative paths) to skip
    #[clap(short = 'e', long, value_delimiter = ',')]
    pub exclude_folders: Option<Vec<String>>,

    /// Comma-separated file extensions to skip, e.g. .log,.md
    #[clap(short = 'x', long, value_delimiter = ',')]
    pub exclude_extensions: Option<Vec<String>>,

    /// Only descend into folders whose name contains this text
    #[clap(short = 'F', long = "filter")]
    pub filter_folder: Option<String>,

    /// Only include files containing this keyword (case-insensitive)
    #[clap(short = 'K', long)]
    pub keyword: Option<String>,

    /// Only include files matching this regex (case-insensitive)
    #[clap(short = 'R', long)]
    pub regex: Option<String>,

    /// Output format
    #[clap(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Project type; auto-detected when omitted
    #[clap(short = 'P', long, value_enum)]
    pub project_type: Option<ProjectType>,

    /// Minimum file size in bytes
    #[clap(long)]
    pub min_size: Option<u64>,

    /// Only include files modified after this date (YYYY-MM-DD or RFC 3339)
    #[clap(long)]
    pub modified_after: Option<String>,

    /// Comma-separated relative paths; only these files are read
    #[clap(long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Strip comments and collapse blank lines
    #[clap(long)]
    pub minify: bool,

    /// Number of threads to use for reading
    #[clap(long, default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// Respect .gitignore files
    #[clap(long)]
    pub respect_gitignore: bool,

    /// Additional ignore file name to honour (implies --respect-gitignore)
    #[clap(long)]
    pub gitignore_path: Option<PathBuf>,

    /// Prompt placed before the output
    #[clap(long, value_enum)]
    pub prompt: Option<PromptTemplate>,

    /// Directory for output files [default: <DIRECTORY>/output]
    #[clap(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Split output longer than --max-chars into numbered parts
    #[clap(long)]
    pub split: bool,

    /// Part size in characters when splitting
    #[clap(long, default_value_t = DEFAULT_MAX_CHARS)]
    pub max_chars: usize,

    /// Print the output to stdout instead of saving it
    #[clap(long, conflicts_with_all = ["split", "open"])]
    pub stdout: bool,

    /// Copy output to the system clipboard
    #[clap(long)]
    pub copy: bool,

    /// Open the saved file with the system viewer
    #[clap(long)]
    pub open: bool,

    /// Load settings from a saved profile
    #[clap(long)]
    pub profile: Option<String>,

    /// Save the effective settings under this profile name
    #[clap(long, value_name = "NAME")]
    pub save_profile: Option<String>,

    /// Profiles file [default: <config dir>/foldercat/profiles.json]
    #[clap(long)]
    pub profiles_file: Option<PathBuf>,

    /// JSON file overriding project-type presets
    #[clap(long = "config", value_name = "FILE")]
    pub project_config: Option<PathBuf>,

    /// Also mask passwords, bearer tokens, card numbers and emails
    #[clap(long)]
    pub strict_masking: bool,

    /// Generate shell completions
    #[clap(long = "generate", value_enum)]
    pub generate: Option<Shell>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Silence logs and the progress bar
    #[clap(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write log records to this file instead of stderr
    #[clap(long)]
    pub log_file: Option<PathBuf>,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory to process
    pub root: PathBuf,
    /// Resolved project type
    pub project_type: ProjectType,
    /// Excluded folder patterns
    pub exclude_folders: Vec<String>,
    /// Excluded extensions
    pub exclude_extensions: Vec<String>,
    /// Folder-name substring filter
    pub filter_folder: Option<String>,
    /// Keyword filter
    pub keyword: Option<String>,
    /// Regex filter
    pub regex: Option<String>,
    /// Minimum file size in bytes
    pub min_size: u64,
    /// Date as given by the user
    pub modified_after: Option<String>,
    /// Allow-list of relative paths
    pub select: Vec<String>,
    /// Minify contents
    pub minify: bool,
    /// Output format
    pub format: OutputFormat,
    /// Prompt template
    pub prompt: Option<PromptTemplate>,
    /// Number of reader threads
    pub num_threads: usize,
    /// Whether to respect .gitignore files
    pub respect_gitignore: bool,
    /// Custom ignore file name
    pub gitignore_path: Option<PathBuf>,
    /// Output directory
    pub output_dir: PathBuf,
    /// Split long output
    pub split: bool,
    /// Part size when splitting
    pub max_chars: usize,
    /// Print instead of saving
    pub stdout: bool,
    /// Copy output to clipboard
    pub copy: bool,
    /// Open the saved file
    pub open: bool,
    /// Extended masking rules
    pub strict_masking: bool,
    /// Profile name to save the settings under
    pub save_profile: Option<String>,
    /// Profiles file location
    pub profiles_file: Option<PathBuf>,
}

impl Config {
    /// Create configuration from command-line arguments
    ///
    /// Reads the profiles file when `--profile` is given and the preset file
    /// when `--config` is given.
    pub fn from_args(args: Args) -> Result<Self> {
        let profiles_file = args.profiles_file.clone().or_else(ProfileStore::default_path);

        let profile = match &args.profile {
            Some(name) => {
                let Some(path) = &profiles_file else {
                    bail!(Config, "No configuration directory for profiles; use --profiles-file");
                };
                let profile = ProfileStore::load(path)?.get(name)?.clone();
                log::info!("Loaded profile '{}'", name);
                profile
            }
            None => Profile::default(),
        };

        let presets = match &args.project_config {
            Some(path) => ProjectPresets::load(path)?,
            None => ProjectPresets::default(),
        };

        let root = args.directory;
        let project_type = args
            .project_type
            .or(profile.project_type)
            .unwrap_or_else(|| detect_project_type(&root));
        let preset = presets.defaults_for(project_type);

        Ok(Self {
            project_type,
            exclude_folders: args
                .exclude_folders
                .or(profile.exclude_folders)
                .unwrap_or(preset.exclude_folders),
            exclude_extensions: args
                .exclude_extensions
                .or(profile.exclude_extensions)
                .unwrap_or(preset.exclude_extensions),
            filter_folder: args
                .filter_folder
                .or(profile.filter_folder)
                .or(preset.filter_folder),
            keyword: args.keyword.or(profile.keyword),
            regex: args.regex.or(profile.regex),
            min_size: args.min_size.or(profile.min_size).unwrap_or(0),
            modified_after: args.modified_after.or(profile.modified_after),
            select: args.select,
            minify: args.minify,
            format: args.format.or(profile.output_format).unwrap_or_default(),
            prompt: args.prompt,
            num_threads: args.threads,
            respect_gitignore: args.respect_gitignore || args.gitignore_path.is_some(),
            gitignore_path: args.gitignore_path,
            output_dir: args
                .output_dir
                .unwrap_or_else(|| root.join(DEFAULT_OUTPUT_DIR)),
            split: args.split,
            max_chars: args.max_chars,
            stdout: args.stdout,
            copy: args.copy,
            open: args.open,
            strict_masking: args.strict_masking,
            save_profile: args.save_profile,
            profiles_file,
            root,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validate_root(&self.root)?;

        ensure!(self.num_threads > 0, InvalidArgument, "--threads must be at least 1");
        ensure!(self.max_chars > 0, InvalidArgument, "--max-chars must be at least 1");

        if !self.stdout && self.output_dir.exists() && !self.output_dir.is_dir() {
            bail!(
                InvalidArgument,
                "Output path is not a directory: {}",
                self.output_dir.display()
            );
        }

        if let Some(date) = &self.modified_after {
            parse_modified_after(date)?;
        }

        Ok(())
    }

    /// Filter criteria for this run
    pub fn criteria(&self) -> Result<FilterCriteria> {
        let modified_after = self
            .modified_after
            .as_deref()
            .map(parse_modified_after)
            .transpose()?;

        let mut excluded_folders = self.exclude_folders.clone();
        if let Some(pattern) = self.output_dir_pattern() {
            excluded_folders.push(pattern);
        }

        FilterCriteria::builder()
            .exclude_folders(excluded_folders)
            .exclude_extensions(self.exclude_extensions.iter())
            .folder_filter(self.filter_folder.clone())
            .keyword(self.keyword.clone())
            .regex(self.regex.clone())
            .min_size(self.min_size)
            .modified_after(modified_after)
            .select(self.select.iter())
            .minify(self.minify)
            .build()
    }

    /// Non-filter run settings
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            threads: self.num_threads,
            traversal: TraversalOptions {
                respect_gitignore: self.respect_gitignore,
                gitignore_path: self.gitignore_path.clone(),
            },
            format: self.format,
            prompt: self.prompt.map(|p| p.text().to_string()),
            strict_masking: self.strict_masking,
        }
    }

    /// Where and how to save the output
    pub fn persist_options(&self) -> PersistOptions {
        PersistOptions {
            output_dir: self.output_dir.clone(),
            split: self.split,
            max_chars: self.max_chars,
        }
    }

    /// Snapshot of the effective settings for `--save-profile`
    pub fn to_profile(&self) -> Profile {
        Profile {
            project_type: Some(self.project_type),
            filter_folder: self.filter_folder.clone(),
            exclude_folders: Some(self.exclude_folders.clone()),
            exclude_extensions: Some(self.exclude_extensions.clone()),
            keyword: self.keyword.clone(),
            regex: self.regex.clone(),
            output_format: Some(self.format),
            min_size: Some(self.min_size),
            modified_after: self.modified_after.clone(),
        }
    }

    /// Root-anchored exclusion for an output directory inside the root
    fn output_dir_pattern(&self) -> Option<String> {
        let relative = match self.output_dir.strip_prefix(&self.root) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => {
                let root = fs::canonicalize(&self.root).ok()?;
                let output = absolute(&self.output_dir);
                output.strip_prefix(&root).ok()?.to_path_buf()
            }
        };

        let relative = slash_path(&relative);
        if relative.is_empty() {
            return None;
        }
        Some(format!("{}/", relative))
    }
}

/// Absolute form of `path`, canonical for the part that exists
fn absolute(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => absolute(parent).join(name),
        _ => std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf()),
    }
}

/// Parse a `--modified-after` value: a local date or an RFC 3339 timestamp
pub fn parse_modified_after(value: &str) -> Result<SystemTime> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .and_then(|naive| Local.from_local_datetime(&naive).earliest())
            .ok_or_else(|| FolderCatError::Config(format!("Invalid local date: {}", value)))?;
        return Ok(SystemTime::from(midnight));
    }

    DateTime::parse_from_rfc3339(value)
        .map(SystemTime::from)
        .map_err(|_| {
            FolderCatError::Config(format!(
                "Invalid date '{}': expected YYYY-MM-DD or an RFC 3339 timestamp",
                value
            ))
        })
}
