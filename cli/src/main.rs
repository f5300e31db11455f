//! MedQR CLI - QR labels for controlled medication.

mod args;
mod commands;
mod ui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use medqr_core::{Config, TemplateSchema};
use tracing_subscriber::EnvFilter;

use crate::args::{BatchArgs, EncodeArgs, ScanArgs};

#[derive(Parser)]
#[command(name = "medqr")]
#[command(about = "QR labels for repackaged controlled medication", long_about = None)]
struct Cli {
    /// Directory for the scan log and default outputs
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode one record into a print-sized QR PNG
    Encode(EncodeArgs),
    /// Encode every row of a CSV template into a zip of PNGs
    Batch(BatchArgs),
    /// Print a CSV template with a sample row
    Template {
        /// Column layout: legacy or product-code
        #[arg(long, default_value = "legacy")]
        schema: TemplateSchema,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Decode a scanned payload and print its fields
    Decode {
        /// Payload text; read from stdin when omitted
        payload: Option<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Read scans from a keyboard-wedge scanner and log them
    Scan(ScanArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("medqr=info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = Config::default();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    match cli.command {
        Commands::Encode(args) => commands::encode(args, &config)?,
        Commands::Batch(args) => commands::batch(args, &config)?,
        Commands::Template { schema, output } => commands::template(schema, output)?,
        Commands::Decode { payload, json } => commands::decode(payload, json)?,
        Commands::Scan(args) => commands::scan(args, &config).await?,
    }

    Ok(())
}
