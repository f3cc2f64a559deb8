//! Polygraph Features CLI
//!
//! Batch feature extraction over stimulus intervals.

use anyhow::Context;
use clap::{Parser, Subcommand};
use polygraph_features::{
    batch::{BatchError, BatchRunner},
    config::Config,
    core::parse_log_file,
    report::{format_summary, summarize, FeatureTable, FileSink, OutputFormat},
    runlog::{create_shared_log_with_persistence, RunStats},
    source::JsonSessionSource,
    VERSION,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "polygraph-features")]
#[command(version = VERSION)]
#[command(about = "Stimulus-interval feature extraction for polygraph recordings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every session in the data directory
    Run {
        /// Directory holding the session signal files
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Directory holding the stimulus logs
        #[arg(long)]
        log_dir: Option<PathBuf>,

        /// Output file for the feature table
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Output format (csv, json or jsonl)
        #[arg(long)]
        format: Option<String>,

        /// Skip the column statistics printout
        #[arg(long)]
        no_summary: bool,
    },

    /// Parse a single stimulus log and print its intervals
    ParseLog {
        /// Path to the log file
        path: PathBuf,
    },

    /// Show statistics of the last run
    Status,

    /// Show configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            data_dir,
            log_dir,
            output,
            format,
            no_summary,
        } => cmd_run(data_dir, log_dir, output, format, !no_summary),
        Commands::ParseLog { path } => cmd_parse_log(&path),
        Commands::Status => cmd_status(),
        Commands::Config { save } => cmd_config(save),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        tracing::warn!("Could not load configuration, using defaults: {e}");
        Config::default()
    })
}

fn cmd_run(
    data_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    format: Option<String>,
    show_summary: bool,
) -> anyhow::Result<()> {
    let mut config = load_config();
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = log_dir {
        config.log_dir = dir;
    }
    let format = match format {
        Some(f) => f.parse::<OutputFormat>()?,
        None => config.output_format,
    };
    let output_path =
        output.unwrap_or_else(|| config.output_path.with_extension(format.extension()));

    println!("Polygraph Features v{VERSION}");
    println!("  Data directory: {:?}", config.data_dir);
    println!("  Log directory: {:?}", config.log_dir);
    println!();

    let source = JsonSessionSource::new(&config.data_dir, &config.data_suffix);
    let session_ids = source
        .discover()
        .with_context(|| format!("could not scan {:?}", config.data_dir))?;
    if session_ids.is_empty() {
        tracing::warn!(
            "No files matching '*{}' in {:?}",
            config.data_suffix,
            config.data_dir
        );
    }

    let run_log = create_shared_log_with_persistence(config.run_stats_path());
    let report = BatchRunner::from_config(&source, &config)
        .with_run_log(run_log.clone())
        .run(&session_ids);

    for result in &report.sessions {
        let count = result.outcome.records().len();
        if count > 0 {
            println!("{}: {count} interval(s)", result.session_id);
        }
    }

    let mut sink = FileSink::new(&output_path, format);
    let written = match report.write_to(&mut sink) {
        Ok(table) => Some(table),
        Err(BatchError::NoRecords { .. }) => {
            println!("No data to save");
            None
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(table) = written {
        println!();
        println!("Results saved to {output_path:?}");
        println!("Sessions processed: {}", table.session_count());
        println!("Intervals processed: {}", table.row_count());

        if show_summary {
            print_summary(&table);
        }
    }

    if let Err(e) = run_log.save() {
        tracing::warn!("Could not save run statistics: {e}");
    }

    println!();
    println!("{}", run_log.summary());
    Ok(())
}

fn print_summary(table: &FeatureTable) {
    println!();
    println!("Line length statistics:");
    let line_lengths = summarize(table, &table.line_length_columns());
    print!("{}", format_summary(&line_lengths));

    println!();
    println!("Mean value statistics:");
    let means = summarize(table, &table.mean_columns());
    print!("{}", format_summary(&means));
}

fn cmd_parse_log(path: &Path) -> anyhow::Result<()> {
    let parsed = parse_log_file(path);

    println!("{}", serde_json::to_string_pretty(&parsed.intervals)?);

    if !parsed.warnings.is_empty() {
        eprintln!();
        eprintln!("{} warning(s):", parsed.warnings.len());
        for warning in &parsed.warnings {
            eprintln!("  - {warning}");
        }
    }
    Ok(())
}

fn cmd_status() -> anyhow::Result<()> {
    let config = load_config();
    let stats_path = config.run_stats_path();

    println!("Polygraph Features Status");
    println!("=========================");
    println!();

    if stats_path.exists() {
        let stats = RunStats::load(&stats_path)
            .with_context(|| format!("could not read {stats_path:?}"))?;
        println!("{stats}");
    } else {
        println!("No previous run found.");
        println!("Run 'polygraph-features run' to process sessions.");
    }
    Ok(())
}

fn cmd_config(save: bool) -> anyhow::Result<()> {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);

    if save {
        config.save()?;
        println!();
        println!("Saved to {:?}", Config::config_path());
    }
    Ok(())
}
