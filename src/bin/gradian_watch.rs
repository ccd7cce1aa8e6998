//! Joins or creates a game and logs every snapshot the session publishes.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use gradian_client::config::ClientConfig;
use gradian_client::connection::SessionHandle;
use gradian_client::state::machine::Snapshot;
use gradian_client::state::session::SessionRequest;
use gradian_client::transport::WsConnector;

#[derive(Parser, Debug)]
#[command(name = "gradian-watch", about = "Follow a Gradian game session")]
#[command(group(ArgGroup::new("session").required(true).args(["join", "create"])))]
struct Args {
    /// Server base url (defaults to GRADIAN_SERVER_URL or ws://localhost:8000)
    #[arg(long)]
    url: Option<String>,

    /// Join an existing game
    #[arg(long)]
    join: Option<u64>,

    /// Create a game running this card module
    #[arg(long)]
    create: Option<String>,

    /// Player name announced to the server
    #[arg(long, default_value = "watcher")]
    name: String,

    /// Request a round start whenever the game allows it
    #[arg(long)]
    auto_start: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn request(&self) -> Result<SessionRequest> {
        match (&self.join, &self.create) {
            (Some(game_id), _) => Ok(SessionRequest::join(*game_id, self.name.clone())),
            (None, Some(module_id)) => Ok(SessionRequest::create(module_id.clone(), self.name.clone())),
            (None, None) => anyhow::bail!("one of --join or --create is required"),
        }
    }

    fn config(&self) -> Result<ClientConfig> {
        let config = match &self.url {
            Some(url) => ClientConfig::new(url),
            None => ClientConfig::from_env(),
        };
        config.context("invalid server address")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = args.config()?;
    let request = args.request()?;
    let mut handle = SessionHandle::open(&config, Arc::new(WsConnector), request)
        .context("failed to open session")?;
    let mut snapshots = handle.subscribe();
    let mut start_requested = false;

    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        info!(%snapshot, "snapshot");
        debug!(json = %snapshot.to_json(), "snapshot detail");

        if let Some(error) = snapshot.error() {
            warn!(%error, "server reported error");
        }
        if snapshot.is_terminal() {
            break;
        }

        match &snapshot {
            Snapshot::Waiting { info, .. }
                if args.auto_start && !start_requested && info.can_start() =>
            {
                start_requested = true;
                if let Err(err) = handle.start_round().await {
                    warn!(error = %err, "start-round rejected");
                }
            }
            Snapshot::Playing { .. } => start_requested = false,
            _ => {}
        }

        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    handle.close().await;
    info!(snapshot = %handle.snapshot(), "session finished");
    Ok(())
}
