/*!
Notification Listener
*/

use std::path::PathBuf;
use clap::{Arg, Command};
use tokio::io::BufReader;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use notification_listener::core::{
    command_channel,
    config::ListenerConfig,
    error::BoxError,
    output_plugins::OutputManager,
    tracker::NotificationTracker,
};

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let matches = Command::new("Notification Listener")
        .version(clap::crate_version!())
        .about("Captures, deduplicates and streams desktop notifications")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to a TOML configuration file")
                .value_name("PATH")
        )
        .arg(
            Arg::new("feed")
                .short('f')
                .long("feed")
                .help("Notification feed spool to watch (JSON lines)")
                .value_name("PATH")
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .help("Log filter used when RUST_LOG is unset")
                .value_name("LEVEL")
        )
        .get_matches();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => ListenerConfig::from_file(path).await?,
        None => ListenerConfig::default(),
    };
    if let Some(feed) = matches.get_one::<String>("feed") {
        config.feed.spool_path = PathBuf::from(feed);
    }

    let level = matches
        .get_one::<String>("log-level")
        .cloned()
        .unwrap_or_else(|| config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let tracker = NotificationTracker::from_config(config.clone());
    let facade = tracker.facade();

    // This process is the single subscriber; it forwards to the configured outputs
    let mut outputs = OutputManager::new(&config.outputs);
    outputs.initialize().await?;
    let subscription = facade.subscribe().await;
    let output_task = tokio::spawn(async move {
        outputs.run(subscription).await;
        if let Err(e) = outputs.finalize().await {
            warn!("Output finalization failed: {}", e);
        }
    });

    // Method calls arrive on stdin; closing stdin does not stop ingestion
    let command_facade = facade.clone();
    tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        if let Err(e) = command_channel::serve(&command_facade, stdin, tokio::io::stdout()).await {
            error!("Command channel error: {}", e);
        }
    });

    tokio::select! {
        result = tracker.start() => {
            if let Err(e) = result {
                error!("Listener error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Shutdown");
        }
    }

    tracker.shutdown().await;
    if let Err(e) = output_task.await {
        error!("Output task failed: {}", e);
    }

    Ok(())
}
