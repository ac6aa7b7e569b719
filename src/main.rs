use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::path::PathBuf;
use vitalstore::{Backend, BackendKind, Config, RecordStore, codec};

#[derive(Parser)]
#[command(name = "vitalstore")]
#[command(about = "VitalStore CLI - Record and review vital-sign readings, latest first")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the config file (default: platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured backend (file, sqlite, memory)
    #[arg(short, long)]
    backend: Option<BackendKind>,

    /// Override the configured data directory
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a new set of readings
    Add {
        /// Body temperature, e.g. 36.5
        #[arg(short, long)]
        temperature: String,

        /// Blood pressure, e.g. 120/80
        #[arg(short = 'p', long)]
        blood_pressure: String,

        /// Heart rate, e.g. 75
        #[arg(short = 'r', long)]
        heart_rate: String,
    },

    /// Show all readings, latest first
    List,

    /// Remove readings by position as shown by `list`
    Remove {
        #[arg(required = true)]
        positions: Vec<usize>,
    },

    /// Write all readings to a JSONL file
    Export { path: PathBuf },
}

fn main() -> Result<()> {
    // Setup tracing; stderr keeps command output clean
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let mut store = config.open_store()?;
    if let Some(err) = store.load_error() {
        eprintln!("{} stored readings could not be read, starting empty: {}", "warning:".yellow(), err);
    }

    match cli.command {
        Commands::Add {
            temperature,
            blood_pressure,
            heart_rate,
        } => {
            require_filled(&[
                ("temperature", &temperature),
                ("blood pressure", &blood_pressure),
                ("heart rate", &heart_rate),
            ])?;
            store.insert(temperature, blood_pressure, heart_rate);
            report_persist(&store);
            println!("Saved. {} readings recorded", store.len());
        }
        Commands::List => print_entries(&store),
        Commands::Remove { positions } => {
            let before = store.len();
            store.remove_at(positions);
            report_persist(&store);
            println!("Removed {}. {} readings remaining", before - store.len(), store.len());
        }
        Commands::Export { path } => {
            codec::write_jsonl(&path, store.entries())?;
            println!("Exported {} readings to {}", store.len(), path.display());
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match cli.config.clone().or_else(Config::default_path) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }

    Ok(config)
}

fn require_filled(fields: &[(&str, &String)]) -> Result<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(eyre!("Please fill in all fields (missing: {})", missing.join(", ")))
    }
}

fn report_persist<B: Backend>(store: &RecordStore<B>) {
    if let Some(err) = store.last_persist_error() {
        eprintln!("{} change kept in memory but not saved: {}", "warning:".yellow(), err);
    }
}

fn print_entries<B: Backend>(store: &RecordStore<B>) {
    println!("{} ({} readings)", "Vital signs".bold(), store.len());

    if store.is_empty() {
        println!("{}", "No entries".dimmed());
        return;
    }

    for (position, entry) in store.entries().iter().enumerate() {
        let when = entry.created_at().with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M");
        println!(
            "{:>3}  {}  {} {}  {} {}  {} {}",
            position,
            when.to_string().cyan(),
            "temp".blue(),
            entry.temperature(),
            "bp".red(),
            entry.blood_pressure(),
            "hr".green(),
            entry.heart_rate(),
        );
    }
}
