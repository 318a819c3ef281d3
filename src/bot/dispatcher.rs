//! Per-user event serialization.
//!
//! Each user with pending events gets one worker task fed by a bounded
//! queue, so a user's events are handled one at a time and in arrival order
//! while different users proceed in parallel. A worker that sees no events
//! for `idle_timeout` removes itself from the map.

use async_trait::async_trait;
use custodybot_types::{InboundEvent, UserId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::SendError, error::TrySendError};
use tracing::{debug, warn};

/// Handles a single event. Called at most once at a time per user.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    async fn handle(&self, event: InboundEvent);
}

struct Worker {
    generation: u64,
    sender: mpsc::Sender<InboundEvent>,
}

struct Inner {
    handler: Arc<dyn EventHandler>,
    workers: DashMap<UserId, Worker>,
    next_generation: AtomicU64,
    queue_capacity: usize,
    idle_timeout: Duration,
}

#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("workers", &self.inner.workers.len())
            .field("queue_capacity", &self.inner.queue_capacity)
            .field("idle_timeout", &self.inner.idle_timeout)
            .finish()
    }
}

impl Dispatcher {
    pub fn new(handler: Arc<dyn EventHandler>, queue_capacity: usize, idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                handler,
                workers: DashMap::new(),
                next_generation: AtomicU64::new(1),
                queue_capacity: queue_capacity.max(1),
                idle_timeout,
            }),
        }
    }

    /// Number of users with a live worker
    pub fn worker_count(&self) -> usize {
        self.inner.workers.len()
    }

    /// Queue an event behind any earlier events from the same user.
    ///
    /// Waits only when that user's queue is full.
    pub async fn dispatch(&self, mut event: InboundEvent) {
        let user_id = event.user_id;
        loop {
            let worker = self
                .inner
                .workers
                .entry(user_id)
                .or_insert_with(|| self.spawn_worker(user_id));
            // The enqueue happens under the map's shard lock, so a worker
            // cannot retire between the lookup and the send.
            let outcome = worker.sender.try_send(event);
            let sender = worker.sender.clone();
            drop(worker);

            match outcome {
                Ok(()) => return,
                Err(TrySendError::Full(returned)) => event = returned,
                Err(TrySendError::Closed(returned)) => {
                    self.inner
                        .workers
                        .remove_if(&user_id, |_, w| w.sender.is_closed());
                    event = returned;
                    continue;
                }
            }

            match sender.send(event).await {
                Ok(()) => return,
                Err(SendError(returned)) => {
                    debug!("Worker for user {} retired mid-send, retrying", user_id);
                    event = returned;
                }
            }
        }
    }

    fn spawn_worker(&self, user_id: UserId) -> Worker {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.inner.queue_capacity);
        tokio::spawn(run_worker(self.inner.clone(), user_id, generation, receiver));
        debug!("Spawned worker {} for user {}", generation, user_id);
        Worker { generation, sender }
    }
}

async fn run_worker(
    inner: Arc<Inner>,
    user_id: UserId,
    generation: u64,
    mut receiver: mpsc::Receiver<InboundEvent>,
) {
    loop {
        match tokio::time::timeout(inner.idle_timeout, receiver.recv()).await {
            Ok(Some(event)) => inner.handler.handle(event).await,
            Ok(None) => break,
            Err(_) => {
                let retired = inner
                    .workers
                    .remove_if(&user_id, |_, w| {
                        w.generation == generation && receiver.is_empty()
                    })
                    .is_some();
                let still_registered = inner
                    .workers
                    .get(&user_id)
                    .is_some_and(|w| w.generation == generation);
                if retired || !still_registered {
                    break;
                }
            }
        }
    }

    receiver.close();
    let mut drained = 0usize;
    while let Some(event) = receiver.recv().await {
        drained += 1;
        inner.handler.handle(event).await;
    }
    if drained > 0 {
        warn!("Worker {} for user {} drained {} late event(s)", generation, user_id, drained);
    }
    debug!("Worker {} for user {} exited", generation, user_id);
}
