use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use embercast::config::Config;
use embercast::runner::ShardRunner;
use embercast::scheduler::{clock, SlotRange, SlotTable};

#[derive(Parser)]
#[command(
    name = "embercast",
    version,
    about = "Sharded consumer for the embercast post queue",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the consumer loop for the configured shard
    Run,

    /// Print the shard's slot range and clock position, then exit
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    setup_tracing(&cli.log_format, cli.verbose)?;

    match cli.command {
        Commands::Run => run().await?,
        Commands::Info => info()?,
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("embercast=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("embercast=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

async fn run() -> Result<()> {
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!(shard = config.server_id, "embercast consumer starting");

    let mut runner = ShardRunner::new(config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, requesting shutdown");
            let _ = shutdown_tx.send(true);
        }
    });

    runner.run(shutdown_rx).await?;

    tracing::info!("embercast consumer stopped");
    Ok(())
}

fn info() -> Result<()> {
    let config = Config::from_env()?;
    config.validate()?;

    let range = SlotRange::for_shard(config.server_id);
    let table = SlotTable::for_range(range)?;
    let current = clock::current_slot(&table)?;
    let entry = table.entry(current)?;

    println!("{}", config.display());
    println!();
    println!("Slot range: [{}, {}]", range.min(), range.max());
    println!("Table entries: {}", table.len());
    println!(
        "Current slot: {} (weekday {} at {})",
        current, entry.weekday, entry.time
    );

    Ok(())
}
