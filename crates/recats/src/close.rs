//! Close-intent queue and single-writer drain (spec.md §4.6 steps 5-6).
//!
//! The supervisor never calls TradeManager directly — `recats` sits below
//! `rectrade` in the dependency graph (`rectrade` already depends on it), so
//! calling back up would be circular. Instead the supervisor enqueues a
//! [`reccore::CloseIntent`] and a single drain task, holding the one
//! [`TradeCloser`] implementation injected at startup, serializes calls into
//! it. That serialization — not a lock on the trade row — is what delivers
//! the at-most-one-close-per-trade guarantee (spec.md §5).

use async_trait::async_trait;
use reccore::CloseIntent;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Implemented by TradeManager (in `rectrade`, once transformed) and wired
/// into the supervisor at process startup.
#[async_trait]
pub trait TradeCloser: Send + Sync {
    async fn close_trade(&self, intent: CloseIntent) -> Result<(), String>;
}

/// Drain the close-intent queue one intent at a time, forwarding each to
/// `closer`. Runs until the sender side is dropped or `token` fires.
pub async fn drain_close_intents(
    mut rx: mpsc::Receiver<CloseIntent>,
    closer: std::sync::Arc<dyn TradeCloser>,
    token: tokio_util::sync::CancellationToken,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                info!("close-intent drain shutting down");
                return;
            }
            intent = rx.recv() => {
                match intent {
                    Some(intent) => {
                        let trade_id = intent.trade_id;
                        match closer.close_trade(intent).await {
                            Ok(()) => info!(trade_id, "close intent delivered"),
                            Err(err) => warn!(trade_id, error = %err, "close intent rejected by trade manager"),
                        }
                    }
                    None => {
                        error!("close-intent channel closed, drain exiting");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingCloser {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TradeCloser for CountingCloser {
        async fn close_trade(&self, _intent: CloseIntent) -> Result<(), String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_drain_forwards_every_intent_in_order() {
        let (tx, rx) = mpsc::channel(8);
        let closer = Arc::new(CountingCloser {
            calls: AtomicUsize::new(0),
        });
        let token = tokio_util::sync::CancellationToken::new();

        let drain_token = token.clone();
        let drain_closer = closer.clone();
        let handle = tokio::spawn(drain_close_intents(rx, drain_closer, drain_token));

        for i in 0..3 {
            tx.send(CloseIntent::new(i, i, 1_000 + i as i64))
                .await
                .unwrap();
        }
        drop(tx);

        handle.await.unwrap();
        assert_eq!(closer.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_drain_stops_on_cancellation() {
        let (tx, rx) = mpsc::channel(8);
        let closer = Arc::new(CountingCloser {
            calls: AtomicUsize::new(0),
        });
        let token = tokio_util::sync::CancellationToken::new();

        let drain_token = token.clone();
        let drain_closer = closer.clone();
        let handle = tokio::spawn(drain_close_intents(rx, drain_closer, drain_token));

        token.cancel();
        handle.await.unwrap();
        drop(tx);
        assert_eq!(closer.calls.load(Ordering::SeqCst), 0);
    }
}
