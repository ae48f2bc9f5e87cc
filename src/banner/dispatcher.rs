//! Hand-off between the event dispatch path and render workers.
//!
//! The dispatch path only calls [`WelcomeDispatcher::dispatch`], a
//! non-blocking `try_send` into a bounded queue. A single receive loop drains
//! the queue and runs each render on its own task, so a slow avatar host
//! delays one join, not the queue.

use super::renderer::{BannerRenderer, MemberJoinEvent, WelcomeMessage};
use super::BannerError;
use crate::metrics::BannerMetrics;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, warn};

/// Delivery side of the chat platform.
#[async_trait]
pub trait WelcomeSink: Send + Sync {
    async fn deliver(&self, channel_id: u64, message: &WelcomeMessage)
        -> Result<(), BannerError>;
}

/// Why a join event was not queued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("welcome queue is full, dropping join for guild {guild_id}")]
    QueueFull { guild_id: u64 },

    #[error("welcome dispatcher is shut down")]
    Closed,
}

/// Bounded queue of join events feeding render tasks.
#[derive(Debug)]
pub struct WelcomeDispatcher {
    sender: mpsc::Sender<MemberJoinEvent>,
    worker: JoinHandle<()>,
    metrics: Arc<BannerMetrics>,
}

impl WelcomeDispatcher {
    /// Start the receive loop on the current runtime.
    pub fn start(
        renderer: Arc<BannerRenderer>,
        sink: Arc<dyn WelcomeSink>,
        capacity: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let metrics = Arc::clone(renderer.metrics());
        let worker = tokio::spawn(run_worker(renderer, sink, receiver));

        Self {
            sender,
            worker,
            metrics,
        }
    }

    /// Queue a join without waiting.
    pub fn dispatch(&self, event: MemberJoinEvent) -> Result<(), DispatchError> {
        let guild_id = event.guild_id;
        self.sender.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                self.metrics.increment_queue_rejections();
                warn!(guild_id, "Welcome queue full, dropping join event");
                DispatchError::QueueFull { guild_id }
            }
            mpsc::error::TrySendError::Closed(_) => DispatchError::Closed,
        })
    }

    /// Stop accepting joins and wait for queued and in-flight renders.
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(e) = self.worker.await {
            error!(error = %e, "Welcome worker terminated abnormally");
        }
    }
}

async fn run_worker(
    renderer: Arc<BannerRenderer>,
    sink: Arc<dyn WelcomeSink>,
    mut receiver: mpsc::Receiver<MemberJoinEvent>,
) {
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            event = receiver.recv() => {
                let Some(event) = event else { break };
                let renderer = Arc::clone(&renderer);
                let sink = Arc::clone(&sink);
                in_flight.spawn(async move {
                    let message = renderer.render(&event).await;
                    deliver(sink.as_ref(), message).await;
                });
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    error!(error = %e, "Welcome render task failed");
                }
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "Welcome render task failed");
        }
    }
}

async fn deliver(sink: &dyn WelcomeSink, message: WelcomeMessage) {
    let Some(channel_id) = message.channel_id else {
        debug!(
            guild_id = message.guild_id,
            member_id = message.member_id,
            "No welcome channel configured, skipping delivery"
        );
        return;
    };

    if let Err(e) = sink.deliver(channel_id, &message).await {
        warn!(
            guild_id = message.guild_id,
            channel_id,
            reason = e.reason(),
            error = %e,
            "Failed to deliver welcome message"
        );
    }
}
