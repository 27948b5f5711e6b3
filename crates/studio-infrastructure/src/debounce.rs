//! Debounced persistence of the session collection.
//!
//! Session-list changes can arrive in bursts (rename, reorder, state
//! fold). The saver coalesces them and writes one snapshot after the
//! configured quiet period, keeping only the most recent snapshot.

use std::sync::Arc;
use std::time::Duration;
use studio_core::session::ChatSession;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::session_store::SessionStore;

/// Quiet period used by [`DebouncedSaver::spawn_default`].
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

enum Command {
    Save(Vec<ChatSession>),
    Flush(oneshot::Sender<()>),
}

/// Coalesces save requests and writes at most one snapshot per quiet
/// period. The latest snapshot always wins.
pub struct DebouncedSaver {
    tx: mpsc::UnboundedSender<Command>,
    handle: JoinHandle<()>,
}

impl DebouncedSaver {
    /// Spawns the saver task with the default 500ms quiet period.
    pub fn spawn_default(store: Arc<SessionStore>) -> Self {
        Self::spawn(store, DEFAULT_DEBOUNCE)
    }

    /// Spawns the saver task.
    pub fn spawn(store: Arc<SessionStore>, delay: Duration) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Command>();

        let handle = tokio::spawn(async move {
            let mut pending: Option<Vec<ChatSession>> = None;

            loop {
                let cmd = if pending.is_some() {
                    tokio::select! {
                        cmd = rx.recv() => cmd,
                        _ = tokio::time::sleep(delay) => {
                            if let Some(snapshot) = pending.take() {
                                write_snapshot(&store, &snapshot);
                            }
                            continue;
                        }
                    }
                } else {
                    rx.recv().await
                };

                match cmd {
                    Some(Command::Save(snapshot)) => pending = Some(snapshot),
                    Some(Command::Flush(ack)) => {
                        if let Some(snapshot) = pending.take() {
                            write_snapshot(&store, &snapshot);
                        }
                        let _ = ack.send(());
                    }
                    None => {
                        // Sender dropped: write whatever is pending and stop.
                        if let Some(snapshot) = pending.take() {
                            write_snapshot(&store, &snapshot);
                        }
                        break;
                    }
                }
            }
        });

        Self { tx, handle }
    }

    /// Requests a save of the given snapshot. Returns immediately; the
    /// write happens after the quiet period.
    pub fn request_save(&self, sessions: Vec<ChatSession>) {
        let _ = self.tx.send(Command::Save(sessions));
    }

    /// Writes any pending snapshot immediately and waits for it.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Flushes and stops the saver task.
    pub async fn shutdown(self) {
        self.flush().await;
        drop(self.tx);
        let _ = self.handle.await;
    }
}

fn write_snapshot(store: &SessionStore, sessions: &[ChatSession]) {
    if let Err(err) = store.save(sessions) {
        tracing::error!("Failed to persist session collection: {err:#}");
    }
}
