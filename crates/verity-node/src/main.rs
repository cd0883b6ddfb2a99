//! verity-node: host process for the Verity judge.
//!
//! Single OS process running a Tokio runtime. Clients speak line-delimited
//! JSON-RPC on stdin/stdout; logs go to stderr.

mod commands;
mod config;
mod events;
mod rpc;

use std::sync::Arc;

use tokio::io::BufReader;
use tokio::sync::Mutex;
use tracing::{error, info};
use verity_judge::{Clock, Engine, SystemClock};
use verity_store::SqliteStore;

use crate::config::NodeConfig;
use crate::events::EventBus;

/// The engine as the node runs it.
pub type NodeEngine = Engine<SqliteStore, EventBus>;

/// Node-wide shared state.
pub struct NodeState {
    /// The judge. Every request holds the lock for its whole operation.
    pub engine: Mutex<NodeEngine>,
    /// Configuration.
    pub config: NodeConfig,
    /// Event bus for pushing events to subscribers.
    pub event_bus: EventBus,
    /// Source of `now` for every operation.
    pub clock: Arc<dyn Clock>,
}

impl NodeState {
    /// Build the state around an opened store.
    pub fn new(store: SqliteStore, config: NodeConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let event_bus = EventBus::new(config.logging.event_buffer);
        let engine = Engine::new(store, config.judge.clone(), event_bus.clone())?;
        Ok(Self {
            engine: Mutex::new(engine),
            config,
            event_bus,
            clock,
        })
    }

    /// Current time.
    pub fn now(&self) -> u64 {
        self.clock.now()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = NodeConfig::load()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("verity={}", config.logging.log_level).parse()?),
        )
        .init();

    info!("Verity node starting");

    // 2. Open store
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let db_path = config.db_path();
    let store = SqliteStore::open(&db_path)?;
    info!("Store opened at {:?}", db_path);

    // 3. Build node state
    let state = Arc::new(NodeState::new(store, config, Arc::new(SystemClock))?);
    info!(
        collateral = state.config.judge.collateral_requirement,
        bucket_width = state.config.judge.bucket_width,
        starting_epoch = state.config.judge.starting_epoch,
        "Judge ready"
    );

    // 4. Serve stdin/stdout until EOF or Ctrl-C
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    tokio::select! {
        result = rpc::serve(state.clone(), stdin, stdout) => {
            if let Err(e) = result {
                error!("RPC loop error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    info!("Node stopped");
    Ok(())
}
