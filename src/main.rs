use clap::{Parser, Subcommand};
use colored::Colorize;
use oncostat::cli;
use oncostat::error::StatResult;
use oncostat::types::Month;
use oncostat::writer::OutputFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oncostat")]
#[command(about = "Normalize the chemotherapy unit's monthly statistics spreadsheet.")]
#[command(long_about = "oncostat - Chemotherapy statistics normalizer
Four titled blocks x 12 month columns -> one row per procedure and month

INPUT:
  .csv (UTF-8 or Latin-1), .xlsx, .xlsm, .xlsb, .xls, .ods
  Header-less grid: column A holds labels, columns B..M hold JAN. .. DEZ.

COMMANDS:
  normalize   - Reshape the sheet into the flat audit table
  inspect     - Show where each block was found
  indicators  - Monthly management indicators
  report      - Narrative report for one month
  watch       - Re-normalize on every save

EXAMPLES:
  oncostat normalize quimio_2025.xlsx -o base.csv
  oncostat normalize quimio_2025.xlsx --format json
  oncostat indicators quimio_2025.xlsx --month fev
  oncostat report quimio_2025.xlsx --month MAR. -o parecer.txt

LOGGING:
  RUST_LOG=oncostat=debug oncostat normalize quimio_2025.xlsx")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Normalize the statistics sheet into a flat table.

Locates the four blocks by their titles in column A, melts each block's
month columns into rows, drops zero quantities and block totals, and
abbreviates the procedure labels.

OUTPUT COLUMNS:
  Procedimento, Mes, Quantidade, Procedimento_Original,
  Subgrupo, Profissional, Procedimento_Curto

The output format follows the --output extension (.csv, .json, .yaml,
.xlsx) unless --format is given. Without --output, --format prints the
table to stdout.")]
    /// Normalize a statistics sheet into the flat audit table
    Normalize {
        /// Path to the statistics sheet
        input: PathBuf,

        /// Output file (.csv, .json, .yaml or .xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (overrides the --output extension)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Show verbose progress
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the rows where each block and the footer were found
    Inspect {
        /// Path to the statistics sheet
        input: PathBuf,
    },

    #[command(long_about = "Compute the monthly management indicators.

PER MONTH:
  Patients, first-visit patients, production (nurse + technician actions),
  adverse events (extravasation, spill), event rate per 1000 actions,
  actions per patient, change against the previous month and the
  venous access devices to stock for the next cycle.

With --month, also lists the top activities and every adverse event.")]
    /// Compute monthly indicators
    Indicators {
        /// Path to the statistics sheet
        input: PathBuf,

        /// Single month (JAN. .. DEZ., dot and case optional)
        #[arg(short, long)]
        month: Option<Month>,
    },

    /// Render the narrative report for one month
    Report {
        /// Path to the statistics sheet
        input: PathBuf,

        /// Month to report on (JAN. .. DEZ., dot and case optional)
        #[arg(short, long)]
        month: Month,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    #[command(long_about = "Watch the sheet and re-normalize on every save.

Each change triggers a full, independent run. Errors are printed and the
watcher keeps running. Stop with Ctrl+C.")]
    /// Watch a sheet and re-normalize on changes
    Watch {
        /// Path to the statistics sheet
        input: PathBuf,

        /// Show verbose progress
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "oncostat=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        eprintln!("{} {}", "❌ Error:".bold().red(), e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> StatResult<()> {
    match command {
        Commands::Normalize {
            input,
            output,
            format,
            verbose,
        } => cli::normalize(input, output, format, verbose),

        Commands::Inspect { input } => cli::inspect(input),

        Commands::Indicators { input, month } => cli::indicators(input, month),

        Commands::Report {
            input,
            month,
            output,
        } => cli::report(input, month, output),

        Commands::Watch { input, verbose } => cli::watch(input, verbose),
    }
}
