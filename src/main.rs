use anyhow::Result;
use clap::{Parser, Subcommand};
use fd_lock::RwLock;
use groundhog::config::{self, parse_duration};
use groundhog::report::{render_record, Reporter};
use groundhog::runner::run_workout;
use groundhog::{JsonStorage, WorkoutConfiguration, WorkoutSession};
use std::fs::OpenOptions;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "groundhog")]
#[command(about = "An interval workout recorder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interval workout
    Start {
        /// Length of each active phase (e.g. 30s, 1m)
        #[arg(short, long)]
        active: Option<String>,
        /// Length of each rest phase (e.g. 10s)
        #[arg(short, long)]
        rest: Option<String>,
        /// Number of active/rest cycles
        #[arg(short, long)]
        cycles: Option<u32>,
    },
    /// Show recorded workouts
    Report {
        /// Only show the most recent N workouts
        #[arg(short, long)]
        last: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("GROUNDHOG_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load_config()?;
    let storage = JsonStorage::new()?;

    match cli.command {
        Commands::Start {
            active,
            rest,
            cycles,
        } => {
            let base_dir = JsonStorage::base_dir()?;
            let lock_path = base_dir.join("groundhog.lock");
            let lock_file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(lock_path)?;

            let mut lock = RwLock::new(lock_file);
            let _guard = lock.try_write().map_err(|_| {
                anyhow::anyhow!("Another workout is already running. Finish it before starting a new one.")
            })?;

            let active = parse_duration(active.as_deref().unwrap_or(config.active.as_str()))?;
            let rest = parse_duration(rest.as_deref().unwrap_or(config.rest.as_str()))?;
            let cycles = cycles.unwrap_or(config.cycles);
            let workout = WorkoutConfiguration::new(active, rest, cycles)?;
            let session = WorkoutSession::new(workout, config.clock_skew_tolerance()?);

            let interrupted = Arc::new(AtomicBool::new(false));
            {
                let interrupted = Arc::clone(&interrupted);
                ctrlc::set_handler(move || interrupted.store(true, Ordering::Relaxed))?;
            }

            if let Some(record) =
                run_workout(session, &storage, config.tick_interval()?, interrupted)?
            {
                println!("\nWorkout complete.");
                print!("{}", render_record(&record));
            }
        }
        Commands::Report { last } => {
            let reporter = Reporter::new(storage);
            reporter.report(last)?;
        }
    }

    Ok(())
}
