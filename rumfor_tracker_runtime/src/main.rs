//! Tracker harness — replay event fixtures and report on the store.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rumfor_application_engine::events::EventEnvelope;
use rumfor_tracker_runtime::drift::{self, status_counts};
use rumfor_tracker_runtime::replay;
use rumfor_tracker_runtime::snapshot;

#[derive(Parser, Debug)]
#[command(name = "rumfor-tracker", version, about = "Rumfor application status tracker harness")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rebuild the application store from an events JSON fixture
    Replay(ReplayArgs),
    /// Replay a fixture twice and verify the hashes agree
    Verify(VerifyArgs),
}

#[derive(Parser, Debug)]
struct ReplayArgs {
    /// Path to a JSON array of event envelopes
    events: PathBuf,

    /// Optionally write a snapshot of the final state into this directory
    #[arg(long, value_name = "DIR")]
    snapshot_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct VerifyArgs {
    /// Path to a JSON array of event envelopes
    events: PathBuf,
}

fn load_events(path: &PathBuf) -> Result<Vec<EventEnvelope>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let events: Vec<EventEnvelope> = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(events)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Replay(args) => {
            let events = load_events(&args.events)?;
            let (state, hash) = replay::rebuild_state(&events)?;

            println!("events applied: {}", events.len());
            println!("applications:   {}", state.applications.len());
            for (status, count) in status_counts(&state) {
                println!("  {:<16} {}", status.as_str(), count);
            }
            println!("canonical hash: {}", hash);

            if let Some(dir) = args.snapshot_dir {
                let path = snapshot::save_snapshot(&dir, events.len() as u64, &state)?;
                println!("snapshot:       {}", path.display());
            }
        }
        Commands::Verify(args) => {
            let events = load_events(&args.events)?;
            drift::verify_determinism(&events)?;
            let hash = replay::rebuild_hash(&events)?;
            println!("ok: {} events, hash {}", events.len(), hash);
        }
    }
    Ok(())
}
