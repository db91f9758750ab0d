/*!
 * Command-line interface for foldercat
 */

use std::fs::File;
use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use foldercat::config::{Args, Config};
use foldercat::error::{FolderCatError, Result, ResultExt};
use foldercat::persist::{copy_output, open_file, save_output};
use foldercat::pipeline::Pipeline;
use foldercat::profile::ProfileStore;
use foldercat::report::{Reporter, RunReport};

fn setup_logging(quiet: bool, verbose: u8, log_file: Option<&Path>) -> Result<()> {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(log_level).format_timestamp(None);

    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("Creating log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
    log::trace!("Logger initialized with level: {:?}", log_level);
    Ok(())
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos}/{len} ({percent}%) Elapsed: {elapsed_precise}",
    ) {
        progress.set_style(style);
    }
    progress.enable_steady_tick(Duration::from_millis(100));
    progress.set_prefix("Scanning");
    progress
}

fn run(args: Args) -> Result<()> {
    let quiet = args.quiet;
    let config = Config::from_args(args)?;
    config.validate()?;

    let criteria = config.criteria()?;
    let pipeline = Pipeline::new(criteria, config.pipeline_options());

    log::info!(
        "Project type: {}, format: {}, threads: {}",
        config.project_type,
        config.format,
        config.num_threads
    );
    if config.respect_gitignore {
        log::info!(
            "{}",
            match &config.gitignore_path {
                Some(path) => format!("Using custom ignore file: {}", path.display()),
                None => "Respecting .gitignore files in the project".to_string(),
            }
        );
    }

    let progress = progress_bar(quiet || config.stdout);
    let run = pipeline.run_with_progress(&config.root, &progress, |total| {
        progress.set_length(total as u64);
        progress.set_prefix("Reading");
    });
    progress.finish_and_clear();
    let run = run?;

    if config.copy {
        if let Err(e) = copy_output(&run.output) {
            log::warn!("Could not copy output to clipboard: {}", e);
        }
    }

    let saved = if config.stdout {
        println!("{}", run.output);
        Vec::new()
    } else {
        let saved = save_output(&run.output, &config.persist_options())?;
        if config.open {
            if let Some(first) = saved.first() {
                open_file(first);
            }
        }
        saved
    };

    if let Some(name) = &config.save_profile {
        let Some(path) = &config.profiles_file else {
            return Err(FolderCatError::Config(
                "No configuration directory for profiles; use --profiles-file".to_string(),
            ));
        };
        let mut store = ProfileStore::load(path)?;
        store.insert(name.clone(), config.to_profile());
        store.save(path)?;
        if !quiet {
            eprintln!("Profile '{}' saved to {}", name, path.display());
        }
    }

    if !quiet && !config.stdout {
        Reporter::new().print_report(&RunReport::from_run(&run, saved));
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(shell) = args.generate {
        clap_complete::generate(shell, &mut Args::command(), "foldercat", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    if let Err(e) = setup_logging(args.quiet, args.verbose, args.log_file.as_deref()) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_invalid_root() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
