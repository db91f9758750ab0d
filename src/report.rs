/*!
 * Run summary rendered as console tables
 */

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::pipeline::RunOutput;
use crate::types::{ReadOutcome, SkipReason};
use crate::utils::{format_file_size, format_number};

/// How many of the largest included files are listed
const LARGEST_FILES: usize = 10;

/// One included file in the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReportInfo {
    /// Relative path
    pub path: String,
    /// Size on disk
    pub size: u64,
    /// Lines in the content block
    pub lines: usize,
    /// Characters in the content block
    pub chars: usize,
}

/// Statistics of one run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Files written by the run
    pub output_files: Vec<PathBuf>,
    /// Wall time
    pub duration: Duration,
    /// Files whose content was aggregated
    pub included: usize,
    /// Skipped files per reason, collector and reader together
    pub skipped: BTreeMap<SkipReason, usize>,
    /// Files that could not be read
    pub errors: usize,
    /// Characters in the aggregated payload
    pub total_chars: usize,
    /// Lines in the aggregated payload
    pub total_lines: usize,
    /// Included files, largest first
    pub files: Vec<FileReportInfo>,
}

impl RunReport {
    /// Summarize a run and the files it was saved to
    pub fn from_run(run: &RunOutput, output_files: Vec<PathBuf>) -> Self {
        let mut skipped = BTreeMap::new();
        for rejection in &run.rejected {
            *skipped.entry(rejection.reason).or_insert(0) += 1;
        }

        let mut included = 0;
        let mut errors = 0;
        let mut files = Vec::new();
        for result in &run.results {
            match &result.outcome {
                ReadOutcome::Included(block) => {
                    included += 1;
                    files.push(FileReportInfo {
                        path: result.file.display_path(),
                        size: result.file.size,
                        lines: block.lines().count(),
                        chars: block.chars().count(),
                    });
                }
                ReadOutcome::Skipped(reason) => *skipped.entry(*reason).or_insert(0) += 1,
                ReadOutcome::ReadError(_) => errors += 1,
            }
        }
        files.sort_by(|a, b| b.chars.cmp(&a.chars).then_with(|| a.path.cmp(&b.path)));

        let payload = run.output.payload();
        Self {
            output_files,
            duration: run.duration,
            included,
            skipped,
            errors,
            total_chars: payload.chars().count(),
            total_lines: payload.lines().count(),
            files,
        }
    }

    /// Total number of skipped files
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    /// Token estimate at four characters per token
    pub fn estimated_tokens(&self) -> usize {
        self.total_chars / 4
    }
}

/// Renders run reports for the console
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter;

impl Reporter {
    /// Create a new reporter
    pub fn new() -> Self {
        Self
    }

    /// Print the report to stdout
    pub fn print_report(&self, report: &RunReport) {
        println!("\n{}", self.generate_report(report));
    }

    /// Render the files table followed by the summary table
    pub fn generate_report(&self, report: &RunReport) -> String {
        let mut sections = Vec::new();

        if !report.files.is_empty() {
            let title = if report.files.len() > LARGEST_FILES {
                format!("TOP {} LARGEST FILES", LARGEST_FILES)
            } else {
                "INCLUDED FILES".to_string()
            };
            sections.push(format!("{}\n{}", title, self.files_table(report)));
        }

        sections.push(format!("EXTRACTION COMPLETE\n{}", self.summary_table(report)));
        sections.join("\n\n")
    }

    fn summary_table(&self, report: &RunReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let row = |key: &str, value: String| SummaryRow {
            key: key.to_string(),
            value,
        };

        let outputs = if report.output_files.is_empty() {
            "-".to_string()
        } else {
            report
                .output_files
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join("\n")
        };

        let mut rows = vec![
            row("Output", outputs),
            row("Process Time", format!("{:.4?}", report.duration)),
            row("Files Included", format_number(report.included)),
            row("Files Skipped", format_number(report.skipped_total())),
            row("Read Errors", format_number(report.errors)),
        ];
        for (reason, count) in &report.skipped {
            rows.push(row(&format!("  skipped: {}", reason), format_number(*count)));
        }
        rows.push(row("Total Lines", format_number(report.total_lines)));
        rows.push(row(
            "LLM Tokens",
            format!("{} tokens (estimated)", format_number(report.estimated_tokens())),
        ));

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn files_table(&self, report: &RunReport) -> String {
        #[derive(Tabled)]
        struct FileRow {
            #[tabled(rename = "File Path")]
            path: String,

            #[tabled(rename = "Size")]
            size: String,

            #[tabled(rename = "Lines")]
            lines: String,

            #[tabled(rename = "Est. Tokens")]
            tokens: String,
        }

        let rows: Vec<FileRow> = report
            .files
            .iter()
            .take(LARGEST_FILES)
            .map(|info| FileRow {
                path: truncate_path(&info.path, 60),
                size: format_file_size(info.size),
                lines: format_number(info.lines),
                tokens: format_number(info.chars / 4),
            })
            .collect();

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }
}

/// Keep the trailing segments of a long path behind a `...` prefix
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let mut kept = Vec::new();
    let mut len = 3;
    for segment in path.rsplit('/') {
        let segment_len = segment.chars().count() + 1;
        if len + segment_len > max_len {
            break;
        }
        kept.push(segment);
        len += segment_len;
    }

    if kept.is_empty() {
        let tail: String = path
            .chars()
            .rev()
            .take(max_len.saturating_sub(3))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        return format!("...{}", tail);
    }

    kept.reverse();
    format!(".../{}", kept.join("/"))
}
