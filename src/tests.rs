/*!
 * End-to-end tests for foldercat runs
 */

use std::fs::{self, File};
use std::io::{self, Write};

use quick_xml::events::Event;
use quick_xml::Reader;
use tempfile::tempdir;

use crate::filter::FilterCriteria;
use crate::pipeline::{Pipeline, PipelineOptions};
use crate::scanner::TraversalOptions;
use crate::sensitive::REDACTION_MARKER;
use crate::types::{OutputFormat, ReadOutcome, SkipReason};

// Helper function to create the reference project layout
fn setup_test_directory() -> io::Result<tempfile::TempDir> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path();

    fs::create_dir(root.join("sub"))?;
    fs::create_dir(root.join(".git"))?;
    writeln!(File::create(root.join(".git").join("config"))?, "[core]")?;

    write!(File::create(root.join("a.txt"))?, "hello world")?;
    write!(File::create(root.join("b.log"))?, "noise")?;
    write!(File::create(root.join("sub").join("c.py"))?, "import os")?;

    Ok(temp_dir)
}

fn reference_criteria() -> FilterCriteria {
    FilterCriteria::builder()
        .exclude_folders([".git"])
        .exclude_extensions([".log"])
        .build()
        .unwrap()
}

fn options(format: OutputFormat) -> PipelineOptions {
    PipelineOptions {
        format,
        ..Default::default()
    }
}

fn separator() -> String {
    "-".repeat(40)
}

#[test]
fn test_reference_scenario_text_output() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;

    let run = Pipeline::new(reference_criteria(), options(OutputFormat::Txt))
        .run(temp_dir.path())
        .unwrap();

    let structure = "[FILE] a.txt\n[DIR] sub\n    [FILE] c.py";
    let contents = format!(
        "\n{0}\nFile: a.txt\n{0}\nhello world\n\n{0}\nFile: sub/c.py\n{0}\nimport os\n",
        separator()
    );
    assert_eq!(
        run.output.payload(),
        format!("Folder Structure:\n{structure}\n\nFile Contents:{contents}")
    );
    assert_eq!(run.results.len(), 2);
    // The pruned .git folder is recorded once, ahead of b.log
    assert_eq!(run.rejected.len(), 2);
    assert_eq!(run.rejected[0].reason, SkipReason::ExcludedByFolder);
    assert_eq!(run.rejected[1].reason, SkipReason::ExcludedByExtension);

    Ok(())
}

#[test]
fn test_keyword_scenario() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    let criteria = FilterCriteria::builder()
        .exclude_folders([".git"])
        .exclude_extensions([".log"])
        .keyword(Some("import".to_string()))
        .build()
        .unwrap();

    let run = Pipeline::new(criteria, options(OutputFormat::Txt))
        .run(temp_dir.path())
        .unwrap();

    let payload = run.output.payload();
    assert!(payload.contains("File: sub/c.py"));
    assert!(!payload.contains("hello world"));
    // The listing is not affected by content filters
    assert!(payload.contains("[FILE] a.txt"));
    assert_eq!(
        run.results[0].outcome,
        ReadOutcome::Skipped(SkipReason::KeywordMismatch)
    );

    Ok(())
}

#[test]
fn test_runs_are_byte_identical() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    for i in 0..20 {
        fs::write(temp_dir.path().join("sub").join(format!("m{:02}.py", i)), format!("x = {}\n", i))?;
    }

    let pipeline = Pipeline::new(
        reference_criteria(),
        PipelineOptions {
            threads: 8,
            ..options(OutputFormat::Md)
        },
    );
    let first = pipeline.run(temp_dir.path()).unwrap();
    let second = pipeline.run(temp_dir.path()).unwrap();
    assert_eq!(first.output, second.output);

    let single = Pipeline::new(
        reference_criteria(),
        PipelineOptions {
            threads: 1,
            ..options(OutputFormat::Md)
        },
    )
    .run(temp_dir.path())
    .unwrap();
    assert_eq!(first.output, single.output);

    Ok(())
}

#[test]
fn test_binary_files_are_listed_but_not_read() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    File::create(temp_dir.path().join("image.dat"))?.write_all(&[0u8, 159, 146, 150, 0, 0, 1, 2])?;

    let run = Pipeline::new(reference_criteria(), options(OutputFormat::Txt))
        .run(temp_dir.path())
        .unwrap();

    let payload = run.output.payload();
    assert!(payload.contains("[FILE] image.dat"));
    assert!(!payload.contains("File: image.dat"));
    assert!(run
        .results
        .iter()
        .any(|r| r.outcome == ReadOutcome::Skipped(SkipReason::Binary)));

    Ok(())
}

#[test]
fn test_sensitive_file_is_redacted() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    fs::write(
        temp_dir.path().join("settings.py"),
        "DEBUG = True\nSECRET_KEY = 'abc123'\n",
    )?;

    let run = Pipeline::new(reference_criteria(), options(OutputFormat::Txt))
        .run(temp_dir.path())
        .unwrap();

    let payload = run.output.payload();
    assert!(payload.contains(&format!("File: settings.py\n{}\n{}\n", separator(), REDACTION_MARKER)));
    assert!(!payload.contains("abc123"));
    assert!(!payload.contains("DEBUG = True"));

    Ok(())
}

#[test]
fn test_strict_masking_covers_emails() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    fs::write(temp_dir.path().join("AUTHORS"), "Jane <jane@example.com>\n")?;

    let basic = Pipeline::new(reference_criteria(), options(OutputFormat::Txt))
        .run(temp_dir.path())
        .unwrap();
    assert!(basic.output.payload().contains("jane@example.com"));

    let strict = Pipeline::new(
        reference_criteria(),
        PipelineOptions {
            strict_masking: true,
            ..options(OutputFormat::Txt)
        },
    )
    .run(temp_dir.path())
    .unwrap();
    assert!(!strict.output.payload().contains("jane@example.com"));
    assert!(strict.output.payload().contains(REDACTION_MARKER));

    Ok(())
}

#[test]
fn test_json_output() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    fs::write(temp_dir.path().join("notes.txt"), "café ☕\n")?;

    let run = Pipeline::new(reference_criteria(), options(OutputFormat::Json))
        .run(temp_dir.path())
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(run.output.payload()).unwrap();
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert_eq!(
        object["folder_structure"],
        "[FILE] a.txt\n[FILE] notes.txt\n[DIR] sub\n    [FILE] c.py"
    );
    assert!(object["file_contents"].as_str().unwrap().contains("café ☕"));
    assert!(run.output.payload().contains("café ☕"));

    Ok(())
}

#[test]
fn test_html_validity() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    fs::write(temp_dir.path().join("page.html"), "<p class=\"x\">Tom & Jerry</p>\n")?;

    let run = Pipeline::new(reference_criteria(), options(OutputFormat::Html))
        .run(temp_dir.path())
        .unwrap();

    let mut reader = Reader::from_str(run.output.payload());
    let mut code_blocks = 0;
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) if e.name().as_ref() == b"code" => code_blocks += 1,
            Ok(_) => {}
            Err(e) => panic!("Error parsing HTML output: {:?}", e),
        }
    }
    assert_eq!(code_blocks, 2);
    assert!(run.output.payload().contains("Tom &amp; Jerry"));

    Ok(())
}

#[test]
fn test_folder_filter_and_minify() -> io::Result<()> {
    let temp_dir = tempdir()?;
    let root = temp_dir.path();
    fs::create_dir_all(root.join("src"))?;
    fs::create_dir_all(root.join("docs"))?;
    fs::write(root.join("src").join("app.py"), "# comment\nx = 1\n\n\n\ny = 2\n")?;
    fs::write(root.join("docs").join("guide.md"), "guide")?;
    fs::write(root.join("top.txt"), "top level")?;

    let criteria = FilterCriteria::builder()
        .folder_filter(Some("src".to_string()))
        .minify(true)
        .build()
        .unwrap();
    let run = Pipeline::new(criteria, options(OutputFormat::Txt))
        .run(root)
        .unwrap();

    let payload = run.output.payload();
    assert!(payload.contains("[DIR] src\n    [FILE] app.py\n[FILE] top.txt"));
    assert!(!payload.contains("docs"));
    assert!(payload.contains(&format!("File: src/app.py\n{}\nx = 1\n\ny = 2\n\n", separator())));

    Ok(())
}

#[test]
fn test_respect_gitignore() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    let mut gitignore = File::create(temp_dir.path().join(".gitignore"))?;
    writeln!(gitignore, "# Ignore all .py files")?;
    writeln!(gitignore, "*.py")?;

    let ignoring = Pipeline::new(
        reference_criteria(),
        PipelineOptions {
            traversal: TraversalOptions {
                respect_gitignore: true,
                gitignore_path: None,
            },
            ..options(OutputFormat::Txt)
        },
    )
    .run(temp_dir.path())
    .unwrap();
    assert!(!ignoring.output.payload().contains("c.py"));
    assert!(ignoring.output.payload().contains("[FILE] .gitignore"));

    let plain = Pipeline::new(reference_criteria(), options(OutputFormat::Txt))
        .run(temp_dir.path())
        .unwrap();
    assert!(plain.output.payload().contains("File: sub/c.py"));

    Ok(())
}

#[test]
fn test_invalid_roots() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    let pipeline = Pipeline::new(FilterCriteria::default(), PipelineOptions::default());

    let missing = pipeline.run(&temp_dir.path().join("missing")).unwrap_err();
    assert!(missing.is_invalid_root());

    let file = pipeline.run(&temp_dir.path().join("a.txt")).unwrap_err();
    assert!(file.is_invalid_root());

    Ok(())
}

#[test]
fn test_empty_directory() -> io::Result<()> {
    let temp_dir = tempdir()?;
    let run = Pipeline::new(FilterCriteria::default(), PipelineOptions::default())
        .run(temp_dir.path())
        .unwrap();
    assert_eq!(run.output.payload(), "Folder Structure:\n\n\nFile Contents:");
    assert!(run.tree.is_empty());
    Ok(())
}

#[test]
fn test_latin1_file_keeps_accents() -> io::Result<()> {
    let temp_dir = setup_test_directory()?;
    let mut bytes = b"R\xe9sum\xe9: caf\xe9 au lait, na\xefve fa\xe7ade, d\xe9j\xe0 vu. ".to_vec();
    bytes.extend_from_slice("Plain ASCII padding. ".repeat(10).as_bytes());
    fs::write(temp_dir.path().join("notes.txt"), &bytes)?;

    let run = Pipeline::new(reference_criteria(), options(OutputFormat::Txt))
        .run(temp_dir.path())
        .unwrap();

    let payload = run.output.payload();
    assert!(payload.contains("File: notes.txt"));
    assert!(payload.contains("Résumé: café au lait, naïve façade, déjà vu."));
    assert!(!payload.contains('\u{FFFD}'));

    Ok(())
}
