//! Client orchestration: shards → pumps → dispatcher.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use gust_runtime::GustClient;
//!
//! // Loads gust.toml from the default locations and GUST_* variables
//! let client = GustClient::new()?;
//!
//! client.dispatcher().subscribe(|event: EventContext<BanCreateEvent>| {
//!     tracing::info!(user = %event.user().tag(), "ban");
//! })?;
//!
//! client.attach_shard(ShardId::new(0), transport.feed(0))?;
//! client.run().await?;
//! ```

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use gust_core::{DecodeContext, EntityLookup, GatewayShard, PassthroughLookup, ShardFeed, ShardId};
use gust_framework::{Dispatcher, DispatcherState, PumpStats, ShardPump};
use parking_lot::Mutex;
use tokio::signal;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use crate::config::{self, ConfigLoader, GustConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// A gateway client: one dispatcher fed by any number of shards.
pub struct GustClient {
    config: GustConfig,
    dispatcher: Dispatcher,
    lookup: Arc<dyn EntityLookup>,
    shards: Mutex<HashSet<ShardId>>,
    pending: Mutex<Vec<(DecodeContext, ShardFeed)>>,
    pumps: TaskTracker,
    stats: Arc<Mutex<HashMap<ShardId, PumpStats>>>,
}

impl GustClient {
    /// Loads configuration from the default locations and environment.
    pub fn new() -> RuntimeResult<Self> {
        Self::from_config(config::load_config()?)
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Initializes logging and a configured dispatcher from `config`.
    pub fn from_config(config: GustConfig) -> RuntimeResult<Self> {
        logging::init_from_config(&config.logging);

        let table = config.gateway.requirement_table()?;
        let dispatcher = Dispatcher::with_diagnostics_capacity(config.dispatch.diagnostics_capacity);
        dispatcher.configure(config.gateway.intents, table)?;

        info!(
            intents = %config.gateway.intents,
            log_level = %config.logging.level,
            "client initialized from configuration"
        );

        Ok(Self {
            config,
            dispatcher,
            lookup: Arc::new(PassthroughLookup),
            shards: Mutex::new(HashSet::new()),
            pending: Mutex::new(Vec::new()),
            pumps: TaskTracker::new(),
            stats: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Replaces the entity lookup used by shards attached afterwards.
    pub fn with_lookup(mut self, lookup: Arc<dyn EntityLookup>) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn config(&self) -> &GustConfig {
        &self.config
    }

    /// The dispatcher; subscribe through it.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Attaches a shard's feed.
    ///
    /// Before [`start`](Self::start) the feed is held back; afterwards a pump
    /// is spawned immediately, which requires a Tokio runtime.
    pub fn attach_shard(&self, shard: impl GatewayShard, feed: ShardFeed) -> RuntimeResult<()> {
        let shard_id = shard.shard_id();
        if !self.shards.lock().insert(shard_id) {
            return Err(RuntimeError::ShardAttached(shard_id));
        }

        let context = DecodeContext::with_lookup(shard, Arc::clone(&self.lookup));
        match self.dispatcher.state() {
            DispatcherState::Running => self.spawn_pump(context, feed),
            _ => {
                debug!(shard = %shard_id, "shard attached, waiting for start");
                self.pending.lock().push((context, feed));
            }
        }
        Ok(())
    }

    /// Starts dispatching and spawns a pump for every attached shard.
    pub fn start(&self) -> RuntimeResult<()> {
        self.dispatcher.start()?;

        let pending = std::mem::take(&mut *self.pending.lock());
        info!(shards = pending.len(), "client started");
        for (context, feed) in pending {
            self.spawn_pump(context, feed);
        }
        Ok(())
    }

    fn spawn_pump(&self, context: DecodeContext, feed: ShardFeed) {
        let shard = context.shard();
        let pump = ShardPump::new(self.dispatcher.clone(), context);
        let stats = Arc::clone(&self.stats);
        self.pumps.spawn(async move {
            let result = pump.run(feed).await;
            stats.lock().insert(shard, result);
        });
    }

    /// Counters of every pump that has stopped.
    pub fn pump_stats(&self) -> HashMap<ShardId, PumpStats> {
        self.stats.lock().clone()
    }

    /// Starts, waits for Ctrl+C or SIGTERM, then shuts down.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.start()?;
        info!("gust client is running. Press Ctrl+C to stop.");

        let shutdown = self.dispatcher.shutdown_token();
        tokio::select! {
            result = wait_for_signal() => result?,
            _ = shutdown.cancelled() => debug!("dispatcher shut down elsewhere"),
        }

        self.shutdown().await;
        Ok(())
    }

    /// Starts, waits for `until`, then shuts down.
    pub async fn run_until<F>(&self, until: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start()?;
        until.await;
        self.shutdown().await;
        Ok(())
    }

    /// Stops every pump and drains the dispatcher.
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
        self.pumps.close();
        self.pumps.wait().await;
        self.pending.lock().clear();
        info!("client stopped");
    }
}

impl std::fmt::Debug for GustClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GustClient")
            .field("dispatcher", &self.dispatcher)
            .field("shards", &self.shards.lock().len())
            .finish()
    }
}

/// Waits for Ctrl+C, or SIGTERM on Unix.
async fn wait_for_signal() -> RuntimeResult<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                info!("received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("received Ctrl+C, shutting down");
    }

    Ok(())
}

// =============================================================================
// ClientBuilder
// =============================================================================

/// Builder for a [`GustClient`] with custom configuration sources.
///
/// ```rust,ignore
/// let client = GustClient::builder()
///     .config_file("deploy/gust.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct ClientBuilder {
    config_loader: ConfigLoader,
    lookup: Option<Arc<dyn EntityLookup>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            lookup: None,
        }
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    pub fn merge(mut self, config: GustConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Resolves entity fragments through a cache instead of plain decoding.
    pub fn lookup(mut self, lookup: Arc<dyn EntityLookup>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn build(self) -> RuntimeResult<GustClient> {
        let config = self.config_loader.load()?;
        let client = GustClient::from_config(config)?;
        Ok(match self.lookup {
            Some(lookup) => client.with_lookup(lookup),
            None => client,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use futures::stream;
    use gust_core::event::GuildLeaveEvent;
    use gust_core::{EventContext, Intents, RawDispatch};
    use serde_json::json;

    use super::*;

    fn client() -> GustClient {
        GustClient::from_config(GustConfig::default()).unwrap()
    }

    fn leaves(ids: &[u64]) -> ShardFeed {
        let items: Vec<RawDispatch> = ids
            .iter()
            .map(|id| RawDispatch::new("GUILD_DELETE", json!({ "id": id.to_string() })))
            .collect();
        stream::iter(items).boxed()
    }

    #[test]
    fn test_from_config_configures_dispatcher() {
        let client = client();
        assert_eq!(client.dispatcher().state(), DispatcherState::Configured);
        assert_eq!(
            client.dispatcher().declared_intents(),
            client.config().gateway.intents
        );
        assert!(client.dispatcher().declared_intents().contains(Intents::GUILDS));
    }

    #[test]
    fn test_duplicate_shard_is_rejected() {
        let client = client();
        client.attach_shard(ShardId::new(0), leaves(&[])).unwrap();
        assert!(matches!(
            client.attach_shard(ShardId::new(0), leaves(&[])),
            Err(RuntimeError::ShardAttached(_))
        ));
    }

    #[tokio::test]
    async fn test_pending_shards_are_pumped_on_start() {
        let client = client();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        client
            .dispatcher()
            .subscribe(move |event: EventContext<GuildLeaveEvent>| {
                sink.lock().push((event.shard.get(), event.guild_id.get()));
            })
            .unwrap();

        client.attach_shard(ShardId::new(0), leaves(&[1, 2])).unwrap();
        client.attach_shard(ShardId::new(1), leaves(&[3])).unwrap();

        client.start().unwrap();
        client.pumps.close();
        client.pumps.wait().await;

        let mut seen = seen.lock().clone();
        seen.sort();
        assert_eq!(seen, vec![(0, 1), (0, 2), (1, 3)]);

        let stats = client.pump_stats();
        assert_eq!(stats[&ShardId::new(0)].dispatched, 2);
        assert_eq!(stats[&ShardId::new(1)].dispatched, 1);

        client.shutdown().await;
        assert!(client.dispatcher().is_shutdown());
    }

    #[tokio::test]
    async fn test_run_until_shuts_down() {
        let client = client();
        client
            .run_until(async {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            })
            .await
            .unwrap();
        assert!(client.dispatcher().is_shutdown());

        let late = GuildLeaveEvent {
            shard: ShardId::new(0),
            guild_id: gust_core::Snowflake::new(1),
        };
        assert!(client.dispatcher().dispatch(late.into()).is_err());
    }
}
