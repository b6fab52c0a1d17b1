//! Command-line interface for Surveyor

mod args;

pub use args::{Args, Command};

use crate::analysis::{ProjectCache, ProjectScanner, RebuildReport, RelationshipData, SearchCriteria};
use crate::config::{Config, OutputFormat, DEFAULT_CONFIG_FILE};
use crate::error::Result;
use crate::output::DiagramGenerator;
use crate::watch::watch_project;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Once;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT_LOGGING: Once = Once::new();

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Analyze {
            path,
            output,
            format,
            exclude,
            extensions,
            config,
            verbose,
        } => {
            init_logging(verbose);
            let cfg = load_config(config.as_deref(), exclude, extensions, Some(format), None)?;
            let cache = ProjectCache::new(ProjectScanner::new(&path, &cfg.scan));

            let spinner = progress_spinner("Analyzing project...");
            let report = cache.rebuild()?;
            spinner.finish_and_clear();

            eprintln!(
                "Analyzed {} files: {} nodes, {} edges",
                report.files_scanned, report.nodes, report.edges
            );
            report_parse_errors(&report);

            let data = cache.query(&SearchCriteria::all())?;
            render(&data, &cfg, output.as_deref())
        }

        Command::Query {
            path,
            directory,
            name,
            related,
            format,
            config,
            verbose,
        } => {
            init_logging(verbose);
            let cfg = load_config(config.as_deref(), Vec::new(), Vec::new(), Some(format), None)?;
            let cache = ProjectCache::new(ProjectScanner::new(&path, &cfg.scan));

            // Without filters this is a plain full-graph query
            let criteria = SearchCriteria {
                include_all: directory.is_none() && name.is_none(),
                directory,
                file_name: name,
                include_related_nodes: related,
            };

            let spinner = progress_spinner("Querying project...");
            let data = cache.query(&criteria)?;
            spinner.finish_and_clear();

            eprintln!("Matched {} nodes, {} edges", data.nodes.len(), data.edges.len());
            render(&data, &cfg, None)
        }

        Command::Watch {
            path,
            debounce,
            config,
            verbose,
        } => {
            init_logging(verbose);
            let cfg = load_config(config.as_deref(), Vec::new(), Vec::new(), None, debounce)?;
            let cache = ProjectCache::new(ProjectScanner::new(&path, &cfg.scan));

            let report = cache.rebuild()?;
            eprintln!(
                "Analyzed {} files: {} nodes, {} edges",
                report.files_scanned, report.nodes, report.edges
            );
            report_parse_errors(&report);
            eprintln!("Watching {} for changes (Ctrl+C to stop)", path.display());

            watch_project(
                &cache,
                &cfg.scan.extensions,
                Duration::from_millis(cfg.watch.debounce_ms),
                |report| {
                    eprintln!(
                        "Project changed: {} files, {} nodes, {} edges",
                        report.files_scanned, report.nodes, report.edges
                    );
                },
            )
        }

        Command::Version => {
            println!("surveyor {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Resolve config from an explicit path (errors surface) or the default
/// file (missing or broken falls back to defaults), then apply CLI
/// overrides.
fn load_config(
    config: Option<&Path>,
    exclude: Vec<String>,
    extensions: Vec<String>,
    format: Option<String>,
    debounce_ms: Option<u64>,
) -> Result<Config> {
    let mut cfg = match config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(Path::new(DEFAULT_CONFIG_FILE)),
    };
    cfg.merge_cli(exclude, extensions, format, debounce_ms);
    cfg.validate()?;
    debug!("configuration: {:?}", cfg);
    Ok(cfg)
}

/// Logs go to stderr so stdout stays clean for piped output
fn init_logging(verbose: bool) {
    INIT_LOGGING.call_once(|| {
        let default_filter = if verbose { "surveyor=debug" } else { "surveyor=info" };
        let filter = EnvFilter::try_from_env("SURVEYOR_LOG")
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(filter)
            .init();
    });
}

fn progress_spinner(message: &'static str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn report_parse_errors(report: &RebuildReport) {
    if report.parse_errors.is_empty() {
        return;
    }
    eprintln!("Parse errors ({}):", report.parse_errors.len());
    for (path, err) in report.parse_errors.iter().take(5) {
        eprintln!("  {}: {}", path.display(), err);
    }
    if report.parse_errors.len() > 5 {
        eprintln!("  ... and {} more", report.parse_errors.len() - 5);
    }
}

fn render(data: &RelationshipData, cfg: &Config, output: Option<&Path>) -> Result<()> {
    let text = match cfg.output.format {
        OutputFormat::Json => {
            if cfg.output.pretty {
                serde_json::to_string_pretty(data)?
            } else {
                serde_json::to_string(data)?
            }
        }
        OutputFormat::Mermaid => DiagramGenerator::new()
            .with_direction(&cfg.output.direction)
            .generate(data),
    };

    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            eprintln!("Output written to {}", path.display());
        }
        None => println!("{}", text),
    }

    Ok(())
}
