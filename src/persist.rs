/*!
 * Saving, splitting, copying and opening the aggregated output
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::clipboard;
use crate::error::{Result, ResultExt};
use crate::types::AggregatedOutput;

/// Base name of every output file
pub const FILE_STEM: &str = "project_structure";

/// Directory name used under the root when none is given
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Default part size in characters when splitting
pub const DEFAULT_MAX_CHARS: usize = 12_000;

/// Where and how to persist a payload
#[derive(Debug, Clone)]
pub struct PersistOptions {
    /// Directory receiving the files
    pub output_dir: PathBuf,
    /// Split payloads longer than `max_chars`
    pub split: bool,
    /// Part size in characters
    pub max_chars: usize,
}

impl PersistOptions {
    /// Options writing to `output_dir` without splitting
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            split: false,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

/// Write the payload and return the files created, in part order
pub fn save_output(output: &AggregatedOutput, options: &PersistOptions) -> Result<Vec<PathBuf>> {
    let dir = &options.output_dir;
    fs::create_dir_all(dir).with_context(|| format!("Creating output directory {}", dir.display()))?;

    let extension = output.format().extension();
    let index = next_index(dir, extension);

    let parts = if options.split {
        split_chars(output.payload(), options.max_chars)
    } else {
        vec![output.payload()]
    };

    let mut written = Vec::with_capacity(parts.len());
    if parts.len() == 1 {
        let path = dir.join(format!("{FILE_STEM}_{index}.{extension}"));
        write_atomic(&path, parts[0])?;
        written.push(path);
    } else {
        for (k, part) in parts.iter().enumerate() {
            let path = dir.join(format!("{FILE_STEM}_{index}_part{}.{extension}", k + 1));
            write_atomic(&path, part)?;
            written.push(path);
        }
    }

    log::info!("Output saved in {} file(s) under {}", written.len(), dir.display());
    Ok(written)
}

/// Copy the payload to the system clipboard
pub fn copy_output(output: &AggregatedOutput) -> Result<()> {
    clipboard::copy_to_clipboard(output.payload())?;
    log::info!("Output copied to clipboard");
    Ok(())
}

/// Launch the platform viewer for `path`; failures are only logged
pub fn open_file(path: &Path) {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(windows) {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else {
        Command::new("xdg-open")
    };

    let spawned = command
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    if let Err(e) = spawned {
        log::warn!("Could not open file {}: {}", path.display(), e);
    }
}

/// First index with no existing output file of this extension
fn next_index(dir: &Path, extension: &str) -> usize {
    (1..)
        .find(|n| {
            !dir.join(format!("{FILE_STEM}_{n}.{extension}")).exists()
                && !dir.join(format!("{FILE_STEM}_{n}_part1.{extension}")).exists()
        })
        .unwrap_or(1)
}

/// Split `text` into pieces of at most `max_chars` characters
pub fn split_chars(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut parts = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (offset, _) in text.char_indices() {
        if count == max_chars {
            parts.push(&text[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() || parts.is_empty() {
        parts.push(&text[start..]);
    }
    parts
}

/// Write through a `.partial` sibling so a file never appears half-written
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    fs::write(&partial, contents).with_context(|| format!("Writing {}", partial.display()))?;
    fs::rename(&partial, path).with_context(|| format!("Renaming to {}", path.display()))?;
    Ok(())
}
