// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use barcode_catalog::logging::{self, LogTarget};
use barcode_catalog::{Session, Settings};

#[derive(Parser)]
#[command(name = "barcode-catalog", version, about = "Load barcode/price spreadsheets and browse them")]
struct Cli {
    /// Config file (default: ./barcode-catalog.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fail on invalid prices instead of replacing them with 0.0
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the interactive viewer (default)
    Ui {
        /// Spreadsheet to load on startup
        file: Option<PathBuf>,
    },
    /// Print the entries of a spreadsheet as "barcode - price" lines
    List {
        file: PathBuf,

        /// Print a JSON object instead
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if cli.strict {
        settings.ingest.strict = true;
    }

    match cli.command.unwrap_or(Command::Ui { file: None }) {
        Command::List { file, json } => {
            logging::init_with_config(&settings.logging, LogTarget::Terminal);
            run_list(&file, &settings, json)
        }
        Command::Ui { file } => {
            logging::init_with_config(&settings.logging, LogTarget::FileOnly);
            run_ui_mode(file, settings)
        }
    }
}

fn run_list(file: &Path, settings: &Settings, json: bool) -> Result<()> {
    let mut session = Session::new(settings.ingest.clone());
    session
        .load(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(session.catalog())?);
    } else {
        for line in session.list().lines() {
            println!("{}", line);
        }
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(file: Option<PathBuf>, settings: Settings) -> Result<()> {
    let session = Session::new(settings.ingest);
    let mut app = ui::App::new(session);

    if let Some(path) = file {
        app.open_file(&path.to_string_lossy());
    }

    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_file: Option<PathBuf>, _settings: Settings) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or print a file with: barcode-catalog list <FILE>");
    std::process::exit(1);
}
