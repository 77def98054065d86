//! Connectivity event logging
//!
//! Runs beside the main work as its own task, logging every session state
//! change it receives. It never touches the namespace. Call
//! [`EventWatcher::stop`] before dropping the connection so the task is
//! gone by the time the session closes.

use futures_util::stream::{BoxStream, StreamExt};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::remote::ConnectionEvent;

/// Handle to the event logging task
pub struct EventWatcher {
    token: CancellationToken,
    handle: JoinHandle<usize>,
}

impl EventWatcher {
    /// Start logging events from `events`
    pub fn spawn(events: BoxStream<'static, ConnectionEvent>) -> Self {
        let token = CancellationToken::new();
        let handle = tokio::spawn(run(events, token.clone()));
        Self { token, handle }
    }

    /// Cancel the task and wait for it to finish
    ///
    /// Returns the number of events that were logged.
    pub async fn stop(self) -> usize {
        self.token.cancel();
        match self.handle.await {
            Ok(seen) => seen,
            Err(e) => {
                warn!("Event watcher task failed: {}", e);
                0
            }
        }
    }
}

async fn run(mut events: BoxStream<'static, ConnectionEvent>, token: CancellationToken) -> usize {
    let mut seen = 0;
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!("Event watcher exiting");
                break;
            }
            event = events.next() => match event {
                Some(event) => {
                    seen += 1;
                    if event.is_terminal() {
                        warn!("Session event: {:?}", event);
                    } else {
                        info!("Session event: {:?}", event);
                    }
                }
                None => {
                    debug!("Event stream ended");
                    // Stay alive until cancelled so stop() is the only exit path
                    token.cancelled().await;
                    break;
                }
            },
        }
    }
    seen
}
