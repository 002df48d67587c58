//! Fixed-interval refresh of an open chat conversation.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::endpoints::is_success;
use super::ApiClient;

pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Background task refetching one conversation's messages.
///
/// The first fetch happens immediately. A fetch that outlasts the interval
/// delays the next one instead of overlapping it. Dropping the poller stops it.
pub struct ChatPoller {
    friend_id: i64,
    messages: watch::Receiver<Vec<Value>>,
    handle: JoinHandle<()>,
}

impl ChatPoller {
    pub fn start(client: Arc<ApiClient>, friend_id: i64) -> Self {
        Self::with_interval(client, friend_id, POLL_INTERVAL)
    }

    pub fn with_interval(client: Arc<ApiClient>, friend_id: i64, period: Duration) -> Self {
        let (tx, rx) = watch::channel(Vec::new());
        let handle = tokio::spawn(run(client, friend_id, period, tx));
        tracing::debug!("Chat polling started for friend {}", friend_id);
        Self {
            friend_id,
            messages: rx,
            handle,
        }
    }

    pub fn friend_id(&self) -> i64 {
        self.friend_id
    }

    /// Latest known message list.
    pub fn messages(&self) -> Vec<Value> {
        self.messages.borrow().clone()
    }

    /// Receiver notified whenever the message list changes.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Value>> {
        self.messages.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop polling. Same as dropping the poller.
    pub fn stop(self) {}
}

impl Drop for ChatPoller {
    fn drop(&mut self) {
        self.handle.abort();
        tracing::debug!("Chat polling stopped for friend {}", self.friend_id);
    }
}

async fn run(client: Arc<ApiClient>, friend_id: i64, period: Duration, tx: watch::Sender<Vec<Value>>) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match client.messages().list(friend_id).await {
            Ok(result) if is_success(&result) => {
                let Some(messages) = result.get("messages").and_then(Value::as_array) else {
                    continue;
                };
                // Only the count is compared: edits to existing messages are not picked up.
                if messages.len() != tx.borrow().len() {
                    tx.send_replace(messages.clone());
                }
            }
            Ok(_) => {}
            Err(e) => tracing::debug!("Chat poll for friend {} failed: {}", friend_id, e),
        }

        if tx.is_closed() {
            return;
        }
    }
}

/// The chat view's single open conversation. Opening another conversation
/// stops the previous poller first.
#[derive(Default)]
pub struct ActiveConversation {
    poller: Option<ChatPoller>,
}

impl ActiveConversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, client: Arc<ApiClient>, friend_id: i64) -> &ChatPoller {
        self.open_with_interval(client, friend_id, POLL_INTERVAL)
    }

    pub fn open_with_interval(&mut self, client: Arc<ApiClient>, friend_id: i64, period: Duration) -> &ChatPoller {
        self.close();
        self.poller.insert(ChatPoller::with_interval(client, friend_id, period))
    }

    /// Stop polling, e.g. when navigating away from the chat page.
    pub fn close(&mut self) {
        self.poller = None;
    }

    pub fn current(&self) -> Option<&ChatPoller> {
        self.poller.as_ref()
    }
}
