/*!
 * System clipboard access through the platform's copy utilities
 *
 * No clipboard crate is linked. The payload is piped into the first copy
 * command found for the current platform (`pbcopy`, `wl-copy`, `xclip`, ...).
 */

use std::env;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use thiserror::Error;

/// Environment variable naming a copy command to use instead of detection
pub const CLIPBOARD_ENV: &str = "FOLDERCAT_CLIPBOARD";

/// Error type for clipboard operations
#[derive(Error, Debug)]
pub enum ClipboardError {
    /// The copy command could not be started
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    /// The copy command ran and failed
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// No copy command exists on this system
    #[error("No suitable clipboard mechanism found")]
    NoClipboardFound,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for clipboard operations
pub type Result<T> = std::result::Result<T, ClipboardError>;

/// A command that reads the text to copy from stdin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyCommand {
    program: String,
    args: Vec<String>,
}

impl CopyCommand {
    /// Build a command from a program and its arguments
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a whitespace-separated command line
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program, parts))
    }

    /// Program name
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Pipe `text` into the command and wait for it
    pub fn pipe(&self, text: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|_| ClipboardError::CommandNotFound(self.program.clone()))?;

        {
            let stdin = child.stdin.as_mut().ok_or_else(|| {
                ClipboardError::CommandFailed(format!("Failed to open stdin for {}", self.program))
            })?;
            stdin.write_all(text.as_bytes())?;
        }

        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::CommandFailed(format!(
                "{} exited with status: {}",
                self.program, status
            )))
        }
    }
}

/// Copy text to the system clipboard
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let command = clipboard_command()?;
    log::debug!("Copying {} bytes with {}", text.len(), command.program());
    command.pipe(text)
}

/// The copy command for this system: the override, else the first one found
pub fn clipboard_command() -> Result<CopyCommand> {
    if let Some(command) = env::var(CLIPBOARD_ENV).ok().as_deref().and_then(CopyCommand::parse) {
        return Ok(command);
    }

    candidates()
        .iter()
        .find(|c| command_exists(c.program()))
        .cloned()
        .ok_or(ClipboardError::NoClipboardFound)
}

/// Whether `program` resolves to a file on `PATH`
pub fn command_exists(program: &str) -> bool {
    let Some(paths) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&paths).any(|dir| {
        let candidate = dir.join(program);
        candidate.is_file() || (cfg!(windows) && candidate.with_extension("exe").is_file())
    })
}

/// Copy commands for this platform, in order of preference
fn candidates() -> &'static [CopyCommand] {
    static CANDIDATES: OnceLock<Vec<CopyCommand>> = OnceLock::new();
    CANDIDATES.get_or_init(|| {
        let mut commands = Vec::new();
        if env::var_os("TMUX").is_some() {
            commands.push(CopyCommand::new("tmux", ["load-buffer", "-w", "-"]));
        }

        if cfg!(target_os = "macos") {
            commands.push(CopyCommand::new("pbcopy", Vec::<String>::new()));
        } else if cfg!(windows) || env::var_os("WSL_DISTRO_NAME").is_some() {
            commands.push(CopyCommand::new("clip.exe", Vec::<String>::new()));
        } else {
            if env::var_os("WAYLAND_DISPLAY").is_some() {
                commands.push(CopyCommand::new("wl-copy", Vec::<String>::new()));
            }
            commands.push(CopyCommand::new("xclip", ["-selection", "clipboard", "-in"]));
            commands.push(CopyCommand::new("xsel", ["-b", "-i"]));
            commands.push(CopyCommand::new("termux-clipboard-set", Vec::<String>::new()));
        }
        commands
    })
}
