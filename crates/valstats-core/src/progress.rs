//! Progress reporting for a single lookup
//!
//! A [`ProgressTracker`] owns one channel per invocation. A background task
//! started by [`ProgressTracker::start`] consumes events in emission order
//! and hands each to a [`ProgressRenderer`]. The first `Error` or `Done`
//! ends consumption and closes the channel; later sends are dropped.
//!
//! Closing happens exactly once: the consumer and [`ProgressTracker::stop`]
//! race on an `Open -> Closed` transition and only the winner releases the
//! channel. Producers never wait on a consumer that has gone away, since
//! every send also watches the closed signal.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Event emitted while a lookup runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Intermediate status line
    Update(String),
    /// Terminal failure; `detail` is internal, `user_message` is displayable
    Error { detail: String, user_message: String },
    /// Terminal success
    Done,
}

impl ProgressEvent {
    /// Whether this event ends the invocation
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProgressEvent::Update(_))
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Update(message) => write!(f, "{}", message),
            ProgressEvent::Error { user_message, .. } => write!(f, "error: {}", user_message),
            ProgressEvent::Done => write!(f, "done"),
        }
    }
}

/// Presents progress events to the user
#[async_trait]
pub trait ProgressRenderer: Send + Sync + 'static {
    async fn render(&self, event: &ProgressEvent);
}

const OPEN: u8 = 0;
const CLOSED: u8 = 1;

/// Channel state shared by producer and consumer
struct ChannelState {
    state: AtomicU8,
    closed_tx: watch::Sender<bool>,
}

impl ChannelState {
    fn is_closed(&self) -> bool {
        self.state.load(Ordering::Acquire) == CLOSED
    }

    /// Transition to `Closed`. Returns true for the single caller that won.
    fn close(&self) -> bool {
        let won = self
            .state
            .compare_exchange(OPEN, CLOSED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.closed_tx.send_replace(true);
        }
        won
    }
}

/// Resolves once the channel is closed or its state is gone.
async fn wait_closed(closed_rx: &mut watch::Receiver<bool>) {
    loop {
        let closed = *closed_rx.borrow_and_update();
        if closed || closed_rx.changed().await.is_err() {
            return;
        }
    }
}

/// Per-invocation progress channel
pub struct ProgressTracker {
    tx: mpsc::Sender<ProgressEvent>,
    rx: Mutex<Option<mpsc::Receiver<ProgressEvent>>>,
    shared: Arc<ChannelState>,
    closed_rx: watch::Receiver<bool>,
    started: AtomicBool,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    /// Create a tracker whose channel holds at most one pending event.
    ///
    /// The producer can run at most one event ahead of rendering. Events
    /// sent before [`ProgressTracker::start`] are dropped.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        let (closed_tx, closed_rx) = watch::channel(false);

        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            shared: Arc::new(ChannelState {
                state: AtomicU8::new(OPEN),
                closed_tx,
            }),
            closed_rx,
            started: AtomicBool::new(false),
            consumer: Mutex::new(None),
        }
    }

    /// Spawn the consumer task. Calling it again has no effect.
    pub async fn start(&self, renderer: Arc<dyn ProgressRenderer>) {
        let Some(mut rx) = self.rx.lock().await.take() else {
            return;
        };
        let shared = Arc::clone(&self.shared);
        let mut closed_rx = self.closed_rx.clone();
        self.started.store(true, Ordering::Release);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    event = rx.recv() => {
                        let Some(event) = event else { break };
                        renderer.render(&event).await;
                        if event.is_terminal() {
                            break;
                        }
                    }
                    _ = wait_closed(&mut closed_rx) => break,
                }
            }

            if shared.close() {
                debug!("progress channel closed by consumer");
            }
            // Dropping the receiver makes pending and future sends fail fast.
            drop(rx);
        });

        *self.consumer.lock().await = Some(handle);
    }

    /// Close the channel without a terminal event. Safe to call repeatedly.
    pub fn stop(&self) {
        if self.shared.close() {
            debug!("progress channel closed by stop");
        }
    }

    /// Whether the channel has been released
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Emit an intermediate status line
    pub async fn send_update(&self, message: impl Into<String>) {
        self.send(ProgressEvent::Update(message.into())).await;
    }

    /// Emit the terminal failure event
    pub async fn send_error(&self, detail: impl Into<String>, user_message: impl Into<String>) {
        self.send(ProgressEvent::Error {
            detail: detail.into(),
            user_message: user_message.into(),
        })
        .await;
    }

    /// Emit the terminal success event
    pub async fn send_done(&self) {
        self.send(ProgressEvent::Done).await;
    }

    async fn send(&self, event: ProgressEvent) {
        if self.shared.is_closed() {
            return;
        }
        if !self.started.load(Ordering::Acquire) {
            debug!("progress consumer not started, event dropped");
            return;
        }

        let mut closed_rx = self.closed_rx.clone();
        tokio::select! {
            result = self.tx.send(event) => {
                if result.is_err() {
                    debug!("progress consumer gone, event dropped");
                }
            }
            _ = wait_closed(&mut closed_rx) => {}
        }
    }

    /// Wait for the consumer task to finish rendering.
    ///
    /// Returns immediately if the consumer was never started.
    pub async fn finished(&self) {
        let handle = self.consumer.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "progress consumer panicked");
            }
        }
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        // Wakes a consumer still waiting on a lookup that never finished.
        self.shared.close();
    }
}
