//! `db_change` fan-out: a local broadcast channel every mutation publishes
//! to, plus a best-effort HTTP nudge to the main app so its UI can
//! invalidate caches without polling.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, trace};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
pub struct DbChange {
    pub table: String,
    pub user: Option<String>,
}

impl DbChange {
    pub fn new(table: impl Into<String>, user: Option<String>) -> Self {
        Self {
            table: table.into(),
            user,
        }
    }
}

#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<DbChange>,
    http: reqwest::Client,
    notify_url: Option<String>,
}

impl ChangeNotifier {
    pub fn new(notify_url: Option<String>) -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            http: reqwest::Client::new(),
            notify_url,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DbChange> {
        self.tx.subscribe()
    }

    /// Publish a change. Notifications are best-effort — a lagged or
    /// absent subscriber never blocks the caller, and the table is the
    /// source of truth; subscribers must re-read, not trust this payload.
    pub async fn publish(&self, change: DbChange) {
        trace!(table = %change.table, user = ?change.user, "db_change");
        let _ = self.tx.send(change.clone());

        if let Some(url) = &self.notify_url {
            if let Err(err) = self.http.post(url).json(&change).send().await {
                debug!(error = %err, "best-effort db_change HTTP notify failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let notifier = ChangeNotifier::new(None);
        let mut rx = notifier.subscribe();
        notifier.publish(DbChange::new("trades", Some("dan".to_string()))).await;
        let change = rx.recv().await.unwrap();
        assert_eq!(change.table, "trades");
        assert_eq!(change.user.as_deref(), Some("dan"));
    }

    #[tokio::test]
    async fn test_publish_without_subscriber_does_not_panic() {
        let notifier = ChangeNotifier::new(None);
        notifier.publish(DbChange::new("fills", None)).await;
    }
}
