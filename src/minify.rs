/*!
 * Best-effort comment stripping keyed by file extension
 *
 * Minification is lossy. It never fails: a rule that panics leaves the
 * original text untouched.
 */

use std::panic::{self, AssertUnwindSafe};

use once_cell::sync::Lazy;
use regex::Regex;

static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
// `//` preceded by `:` is a URL scheme, not a comment
static LINE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|[^:])//[^\n]*").unwrap());
static MARKUP_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

/// Comment syntax family of a language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentFamily {
    /// `#` line comments, triple-quoted blocks preserved
    Hash,
    /// `//` line and `/* */` block comments
    Brace,
    /// `<!-- -->` comments
    Markup,
}

impl CommentFamily {
    /// Family for an extension, with or without the leading dot
    pub fn for_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.').to_lowercase();
        match extension.as_str() {
            "py" | "pyw" | "rb" | "sh" | "bash" | "zsh" | "pl" | "pm" | "r" | "yaml" | "yml"
            | "toml" => Some(Self::Hash),
            "c" | "h" | "cc" | "cpp" | "hpp" | "cs" | "java" | "js" | "jsx" | "mjs" | "ts"
            | "tsx" | "go" | "rs" | "swift" | "kt" | "kts" | "scala" | "php" | "dart" | "css"
            | "scss" | "less" => Some(Self::Brace),
            "html" | "htm" | "xml" | "xhtml" | "svg" | "vue" => Some(Self::Markup),
            _ => None,
        }
    }

    fn strip(&self, text: &str) -> String {
        match self {
            Self::Hash => strip_hash_comments(text),
            Self::Brace => {
                let without_blocks = BLOCK_COMMENT.replace_all(text, "");
                LINE_COMMENT.replace_all(&without_blocks, "$1").into_owned()
            }
            Self::Markup => MARKUP_COMMENT.replace_all(text, "").into_owned(),
        }
    }
}

/// Strip comments for the language of `extension` and collapse blank runs
///
/// Unknown extensions pass through unchanged.
pub fn minify(text: &str, extension: &str) -> String {
    let Some(family) = CommentFamily::for_extension(extension) else {
        return text.to_string();
    };

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        collapse_blank_lines(&family.strip(text))
    }));

    match result {
        Ok(minified) => minified,
        Err(_) => {
            log::warn!("Minification failed for a .{} file, keeping original", extension.trim_start_matches('.'));
            text.to_string()
        }
    }
}

fn strip_hash_comments(text: &str) -> String {
    let mut in_block = false;
    let mut kept = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim_start();
        if !in_block && trimmed.starts_with('#') {
            continue;
        }

        let markers = line.matches("\"\"\"").count() + line.matches("'''").count();
        if markers % 2 == 1 {
            in_block = !in_block;
        }
        kept.push(line);
    }

    rejoin(kept, text)
}

/// Reduce every run of two or more blank lines to a single blank line
pub fn collapse_blank_lines(text: &str) -> String {
    let mut kept = Vec::new();
    let mut previous_blank = false;

    for line in text.lines() {
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        previous_blank = blank;
        kept.push(line);
    }

    rejoin(kept, text)
}

fn rejoin(lines: Vec<&str>, original: &str) -> String {
    let mut joined = lines.join("\n");
    if original.ends_with('\n') && !joined.is_empty() {
        joined.push('\n');
    }
    joined
}
