use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use pleadings_lib::{
    commands::filings,
    core::{errors::AppResult, types::ExportFilingRequest},
    render::ExportFormat,
};

#[derive(Parser)]
#[command(name = "pleadings")]
#[command(about = "Parse court-filing text and export print-ready pleadings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse extracted filing text and show the caption and body
    Parse {
        /// UTF-8 text file, one extracted line per line
        input: PathBuf,
        /// Print the full parse as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export a filing to DOCX, PDF or markdown
    Export {
        /// Extracted text file, or a `.json` document tree
        input: PathBuf,
        #[arg(short, long, value_parser = parse_format)]
        format: ExportFormat,
        #[arg(short, long)]
        output: PathBuf,
        /// Document title for metadata and the running header
        #[arg(long)]
        title: Option<String>,
        /// Formatting rules JSON; defaults to the Indiana trial-court profile
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Choice-field option sets JSON
        #[arg(long)]
        options: Option<PathBuf>,
    },
}

fn parse_format(raw: &str) -> Result<ExportFormat, String> {
    raw.parse().map_err(|err: pleadings_lib::core::errors::AppError| err.to_string())
}

fn path_string(path: PathBuf) -> String {
    path.to_string_lossy().to_string()
}

fn run(cli: Cli) -> AppResult<()> {
    match cli.command {
        Commands::Parse { input, json } => {
            let response = filings::ingest_filing(&path_string(input))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
                return Ok(());
            }
            match &response.parsed.caption {
                Some(caption) => {
                    println!("court:  {}", caption.court);
                    println!("county: {}", caption.county);
                    println!("cause:  {}", caption.cause_number);
                    for party in &caption.parties {
                        println!("party:  {} ({})", party.name, party.role);
                    }
                }
                None => println!("no caption found"),
            }
            println!("body starts at line {}", response.parsed.body_start + 1);
            println!(
                "{} nodes, {} headings",
                response.node_count, response.heading_count
            );
        }
        Commands::Export {
            input,
            format,
            output,
            title,
            rules,
            options,
        } => {
            let response = filings::export_filing(ExportFilingRequest {
                input_path: path_string(input),
                output_path: path_string(output),
                format,
                title,
                rules_path: rules.map(path_string),
                options_path: options.map(path_string),
            })?;
            println!("wrote {} ({} bytes)", response.file_path, response.bytes_written);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    pleadings_lib::init_logging();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error [{}]: {err}", err.code());
            ExitCode::FAILURE
        }
    }
}
