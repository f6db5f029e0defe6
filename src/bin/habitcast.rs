//! Habitcast CLI - Command-line interface for the habitcast pipeline
//!
//! Commands:
//! - run: Execute the full pipeline over a sources file
//! - validate: Check that a sources file aligns under a schema
//! - schema: Print the built-in subject schema

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use habitcast::pipeline::{run_pipeline, PipelineConfig};
use habitcast::schema::TableSchema;
use habitcast::types::SourceTable;
use habitcast::{DataAligner, HABITCAST_VERSION};

/// Habitcast - Next-day habit prediction from daily behavioral signals
#[derive(Parser)]
#[command(name = "habitcast")]
#[command(version = HABITCAST_VERSION)]
#[command(about = "Predict next-day purchase events from daily signals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute the full pipeline over a sources file
    Run {
        /// Input file with a JSON array of source tables (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the run report (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Schema file; omitted means the built-in subject schema
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Pipeline configuration file; omitted means schema defaults
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check that a sources file parses and aligns under a schema
    Validate {
        /// Input file with a JSON array of source tables (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Schema file; omitted means the built-in subject schema
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    /// Print the built-in subject schema
    Schema {
        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: SchemaFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum SchemaFormat {
    /// Pretty-printed JSON
    Json,
    /// One line per column
    Table,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Run {
            input,
            output,
            schema,
            config,
        } => cmd_run(&input, &output, schema.as_deref(), config.as_deref()),

        Commands::Validate { input, schema } => cmd_validate(&input, schema.as_deref()),

        Commands::Schema { format } => cmd_schema(format),
    }
}

fn cmd_run(
    input: &Path,
    output: &Path,
    schema_path: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<(), CliError> {
    let sources = read_sources(input)?;
    let schema = read_schema(schema_path)?;

    let config = match config_path {
        Some(path) => serde_json::from_str::<PipelineConfig>(&fs::read_to_string(path)?)?,
        None => PipelineConfig::for_schema(&schema),
    };

    let run = run_pipeline(&sources, &schema, &config)?;
    let report = run.to_json()?;

    if output.to_string_lossy() == "-" {
        println!("{report}");
    } else {
        fs::write(output, report)?;
    }

    Ok(())
}

fn cmd_validate(input: &Path, schema_path: Option<&Path>) -> Result<(), CliError> {
    let sources = read_sources(input)?;
    let schema = read_schema(schema_path)?;

    let aligned = DataAligner::align(&sources, &schema)?;
    println!(
        "ok: {} sources aligned into {} days x {} columns",
        sources.len(),
        aligned.len(),
        aligned.columns.len()
    );

    let total_imputed: usize = aligned.imputed_counts.values().sum();
    if total_imputed > 0 {
        println!("note: {total_imputed} cells imputed");
        for (column, count) in &aligned.imputed_counts {
            if *count > 0 {
                println!("  {column}: {count}");
            }
        }
    }

    Ok(())
}

fn cmd_schema(format: SchemaFormat) -> Result<(), CliError> {
    let schema = TableSchema::subject_default();
    match format {
        SchemaFormat::Json => println!("{}", serde_json::to_string_pretty(&schema)?),
        SchemaFormat::Table => {
            for column in &schema.columns {
                let leak = if column.encodes_target {
                    "  [encodes target]"
                } else {
                    ""
                };
                println!(
                    "{:<24} {:?} / {:?}{}",
                    column.name, column.domain, column.impute, leak
                );
            }
            println!("target: {}", schema.target);
        }
    }
    Ok(())
}

fn read_sources(input: &Path) -> Result<Vec<SourceTable>, CliError> {
    let data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };
    Ok(serde_json::from_str(&data)?)
}

fn read_schema(path: Option<&Path>) -> Result<TableSchema, CliError> {
    match path {
        Some(path) => Ok(serde_json::from_str(&fs::read_to_string(path)?)?),
        None => Ok(TableSchema::subject_default()),
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Pipeline(#[from] habitcast::PipelineError),
}
