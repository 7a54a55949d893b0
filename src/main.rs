//! # TaskBeat
//!
//! Task lifecycle event processor: schedules due-date reminders,
//! sweeps and delivers the ones that are due, and regenerates
//! recurring tasks when they complete.
//!
//! Usage:
//!   taskbeat serve                     # Start gateway + reminder sweep
//!   taskbeat serve --port 4000        # Custom gateway port
//!   taskbeat check                     # Run one reminder sweep and exit

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use taskbeat_core::TaskBeatConfig;
use taskbeat_gateway::AppState;
use taskbeat_recurrence::{CompletionHandler, HttpTaskSink};
use taskbeat_reminder::{HttpNotifier, ReminderEngine, ReminderSweep};

#[derive(Parser)]
#[command(
    name = "taskbeat",
    version,
    about = "Task lifecycle event processor — reminders & recurring tasks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway and the reminder sweep loop
    Serve {
        /// Override the gateway port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run a single reminder sweep and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let mut config = TaskBeatConfig::load(cli.config.as_deref())?;

    let store: Arc<dyn taskbeat_state::ReminderStore> =
        taskbeat_state::create_store(&config.state_store)?.into();
    let engine = Arc::new(ReminderEngine::new(store));
    let notifier = Arc::new(HttpNotifier::new(&config.dispatch)?);
    let sweep = Arc::new(ReminderSweep::new(engine.clone(), notifier));
    let sink = Arc::new(HttpTaskSink::new(&config.dispatch)?);
    let completion = Arc::new(CompletionHandler::new(sink));

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.gateway.port = port;
            }

            let poll_secs = config.scheduler.poll_interval_secs;
            let sweep_task = sweep.clone();
            tokio::spawn(async move {
                sweep_task.run(poll_secs).await;
            });
            tracing::info!(poll_secs, "Reminder sweep started");

            let state = Arc::new(AppState {
                engine,
                completion,
                sweep,
            });
            taskbeat_gateway::serve(&config.gateway, state).await?;
        }
        Commands::Check => {
            let delivered = sweep.tick(chrono::Utc::now()).await?;
            println!("Delivered {delivered} reminder(s)");
        }
    }

    Ok(())
}
