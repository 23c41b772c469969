// In crates/engine/src/lib.rs

pub mod bot;
pub mod config;
pub mod error;
pub mod feed;

pub use bot::{CommandEffect, TradingBot};
pub use config::EngineConfig;
pub use error::{Error, Result};

use crate::feed::{FeedEvent, FeedEventKind, FeedSettings, Generation};
use api_client::MarketSource;
use events::{Command, ConnectionStatus, EngineSnapshot};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

const COMMAND_QUEUE_SIZE: usize = 64;
const FEED_QUEUE_SIZE: usize = 1024;

struct CommandRequest {
    command: Command,
    ack: oneshot::Sender<Result<()>>,
}

/// Cloneable access to a running [`Engine`]: submit commands, read snapshots.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<CommandRequest>,
    snapshots: watch::Receiver<Arc<EngineSnapshot>>,
}

impl EngineHandle {
    /// Queues a command and waits for the engine to apply it.
    pub async fn submit(&self, command: Command) -> Result<()> {
        let (ack, reply) = oneshot::channel();
        self.commands
            .send(CommandRequest { command, ack })
            .await
            .map_err(|_| Error::EngineStopped)?;
        reply.await.map_err(|_| Error::EngineStopped)?
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// A receiver notified on every new snapshot version.
    pub fn subscribe(&self) -> watch::Receiver<Arc<EngineSnapshot>> {
        self.snapshots.clone()
    }
}

/// The single writer for one symbol.
///
/// All state lives in the [`TradingBot`]; feed events and user commands are
/// funnelled into this task and applied one at a time. Readers only ever see
/// the snapshot published after each applied event.
pub struct Engine {
    bot: TradingBot,
    config: EngineConfig,
    source: Arc<dyn MarketSource>,
    commands: mpsc::Receiver<CommandRequest>,
    feed_tx: mpsc::Sender<FeedEvent>,
    feed_rx: mpsc::Receiver<FeedEvent>,
    snapshot_tx: watch::Sender<Arc<EngineSnapshot>>,
    version: u64,
    generation: Generation,
    status: ConnectionStatus,
    feed_task: Option<JoinHandle<()>>,
}

impl Engine {
    pub fn new(config: EngineConfig, source: Arc<dyn MarketSource>) -> Result<(Self, EngineHandle)> {
        let bot = TradingBot::new(config.clone())?;
        let (command_tx, commands) = mpsc::channel(COMMAND_QUEUE_SIZE);
        let (feed_tx, feed_rx) = mpsc::channel(FEED_QUEUE_SIZE);

        let status = ConnectionStatus::Disconnected;
        let (snapshot_tx, snapshots) = watch::channel(Arc::new(bot.snapshot(0, status)));

        let engine = Self {
            bot,
            config,
            source,
            commands,
            feed_tx,
            feed_rx,
            snapshot_tx,
            version: 0,
            generation: 0,
            status,
            feed_task: None,
        };
        let handle = EngineHandle {
            commands: command_tx,
            snapshots,
        };
        Ok((engine, handle))
    }

    /// Runs until every [`EngineHandle`] has been dropped.
    pub async fn run(mut self) {
        tracing::info!(symbol = %self.config.symbol, "Engine started.");
        self.start_feed();
        self.publish();

        loop {
            let changed = tokio::select! {
                request = self.commands.recv() => match request {
                    Some(request) => self.handle_command(request).await,
                    None => break,
                },
                Some(event) = self.feed_rx.recv() => self.handle_feed_event(event).await,
            };
            if changed {
                self.publish();
            }
        }

        self.stop_feed();
        tracing::info!(symbol = %self.config.symbol, "Engine stopped.");
    }

    fn start_feed(&mut self) {
        self.stop_feed();
        self.generation += 1;
        self.status = ConnectionStatus::Disconnected;

        let settings = FeedSettings {
            symbol: self.config.symbol.clone(),
            interval: self.bot.parameters().interval,
            history_limit: self.config.history_limit,
            reconnect_delay: self.config.reconnect_delay,
        };
        self.feed_task = Some(tokio::spawn(feed::run_feed(
            self.source.clone(),
            settings,
            self.generation,
            self.feed_tx.clone(),
        )));
    }

    fn stop_feed(&mut self) {
        if let Some(task) = self.feed_task.take() {
            task.abort();
        }
    }

    /// Applies one command and publishes before acknowledging it. Returns
    /// `false` since nothing is left to publish.
    async fn handle_command(&mut self, request: CommandRequest) -> bool {
        let CommandRequest { command, ack } = request;
        tracing::debug!(%command, "Applying command.");

        let result = match self.bot.apply_command(command).await {
            Ok(CommandEffect::IntervalChanged(interval)) => {
                self.bot.reset_market();
                self.start_feed();
                tracing::info!(%interval, generation = self.generation, "Feed restarted for new interval.");
                Ok(())
            }
            Ok(CommandEffect::None) => Ok(()),
            Err(e) => Err(e),
        };

        // Acknowledge only once the snapshot reflects the command.
        self.publish();
        // The caller may have given up waiting; the command is applied regardless.
        let _ = ack.send(result);
        false
    }

    async fn handle_feed_event(&mut self, event: FeedEvent) -> bool {
        if event.generation != self.generation {
            tracing::debug!(
                stale = event.generation,
                current = self.generation,
                "Discarding event from a previous feed."
            );
            return false;
        }

        match event.kind {
            FeedEventKind::Status(status) => {
                if status == self.status {
                    return false;
                }
                self.status = status;
                if status == ConnectionStatus::Live {
                    self.bot.log_mut().success("Live stream connected");
                }
                true
            }
            FeedEventKind::History(history) => {
                self.bot.bootstrap(history);
                true
            }
            FeedEventKind::HistoryFailed(reason) => {
                self.bot
                    .log_mut()
                    .warning(format!("History unavailable, continuing live-only: {reason}"));
                true
            }
            FeedEventKind::Bar(update) => self.bot.on_bar(update).await,
            FeedEventKind::Disconnected(reason) => {
                self.status = ConnectionStatus::Disconnected;
                self.bot.log_mut().error(format!(
                    "Connection lost: {reason}. Retrying in {}s",
                    self.config.reconnect_delay.as_secs()
                ));
                true
            }
        }
    }

    fn publish(&mut self) {
        self.version += 1;
        let snapshot = self.bot.snapshot(self.version, self.status);
        self.snapshot_tx.send_replace(Arc::new(snapshot));
    }
}
