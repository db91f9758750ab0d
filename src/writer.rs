/*!
 * Output formatting for foldercat
 *
 * The Markdown and HTML renderings share one document model: a heading and a
 * fenced block for the structure, then the same for the contents.
 *
 * A prompt preamble is prepended to txt and Markdown payloads. JSON carries it
 * as a leading `prompt` key and HTML as an escaped paragraph at the top of the
 * body, so both stay parseable.
 */

use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;

use crate::error::Result;
use crate::types::{AggregatedOutput, OutputFormat};

const STRUCTURE_HEADING: &str = "Project Structure";
const CONTENTS_HEADING: &str = "File Contents";

/// JSON shape of an aggregated run
#[derive(Debug, Serialize)]
struct JsonDocument<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    folder_structure: &'a str,
    file_contents: &'a str,
}

/// One heading with its fenced body
struct Section<'a> {
    heading: &'a str,
    language: &'a str,
    body: &'a str,
}

impl Section<'_> {
    fn to_markdown(&self) -> String {
        let fence = fence_for(self.body);
        format!(
            "# {}\n\n{fence}{}\n{}\n{fence}",
            self.heading, self.language, self.body
        )
    }

    fn write_html<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_event(Event::Start(BytesStart::new("h1")))?;
        writer.write_event(Event::Text(BytesText::new(self.heading)))?;
        writer.write_event(Event::End(BytesEnd::new("h1")))?;

        let class = format!("language-{}", self.language);
        writer.write_event(Event::Start(BytesStart::new("pre")))?;
        writer.write_event(Event::Start(
            BytesStart::new("code").with_attributes([("class", class.as_str())]),
        ))?;
        writer.write_event(Event::Text(BytesText::new(self.body)))?;
        writer.write_event(Event::End(BytesEnd::new("code")))?;
        writer.write_event(Event::End(BytesEnd::new("pre")))?;
        Ok(())
    }
}

/// A backtick fence longer than any backtick run inside `body`
fn fence_for(body: &str) -> String {
    let longest = body
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

/// Combines the structural listing and the concatenated contents
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    prompt: Option<String>,
}

impl Aggregator {
    /// Create an aggregator without a prompt preamble
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text placed in front of every payload
    pub fn with_prompt(mut self, prompt: Option<String>) -> Self {
        self.prompt = prompt.filter(|p| !p.is_empty());
        self
    }

    /// Render `structure` and `contents` as `format`
    pub fn format(
        &self,
        structure: &str,
        contents: &str,
        format: OutputFormat,
    ) -> Result<AggregatedOutput> {
        let prompt = self.prompt.as_deref();
        let payload = match format {
            OutputFormat::Txt => with_preamble(
                prompt,
                format!("Folder Structure:\n{structure}\n\nFile Contents:{contents}"),
            ),
            OutputFormat::Json => serde_json::to_string_pretty(&JsonDocument {
                prompt,
                folder_structure: structure,
                file_contents: contents,
            })?,
            OutputFormat::Md => with_preamble(
                prompt,
                sections(structure, contents)
                    .iter()
                    .map(Section::to_markdown)
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            ),
            OutputFormat::Html => render_html(prompt, &sections(structure, contents))?,
        };

        log::debug!("Aggregated {} characters as {}", payload.chars().count(), format);
        Ok(AggregatedOutput::new(format, payload))
    }
}

fn with_preamble(prompt: Option<&str>, body: String) -> String {
    match prompt {
        Some(prompt) => format!("{prompt}\n\n{body}"),
        None => body,
    }
}

fn sections<'a>(structure: &'a str, contents: &'a str) -> [Section<'a>; 2] {
    [
        Section {
            heading: STRUCTURE_HEADING,
            language: "tree",
            body: structure,
        },
        Section {
            heading: CONTENTS_HEADING,
            language: "text",
            body: contents,
        },
    ]
}

fn render_html(prompt: Option<&str>, sections: &[Section<'_>]) -> Result<String> {
    let mut writer = Writer::new(Vec::new());

    writer.write_event(Event::DocType(BytesText::from_escaped("html")))?;
    writer.write_event(Event::Start(
        BytesStart::new("html").with_attributes([("lang", "en")]),
    ))?;

    writer.write_event(Event::Start(BytesStart::new("head")))?;
    writer.write_event(Event::Empty(
        BytesStart::new("meta").with_attributes([("charset", "UTF-8")]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("title")))?;
    writer.write_event(Event::Text(BytesText::new(STRUCTURE_HEADING)))?;
    writer.write_event(Event::End(BytesEnd::new("title")))?;
    writer.write_event(Event::End(BytesEnd::new("head")))?;

    writer.write_event(Event::Start(BytesStart::new("body")))?;
    if let Some(prompt) = prompt {
        writer.write_event(Event::Start(
            BytesStart::new("p").with_attributes([("class", "prompt")]),
        ))?;
        writer.write_event(Event::Text(BytesText::new(prompt)))?;
        writer.write_event(Event::End(BytesEnd::new("p")))?;
    }
    for section in sections {
        section.write_html(&mut writer)?;
    }
    writer.write_event(Event::End(BytesEnd::new("body")))?;
    writer.write_event(Event::End(BytesEnd::new("html")))?;

    let bytes = writer.into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
