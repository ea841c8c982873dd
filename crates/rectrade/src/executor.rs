//! TradeExecutor (spec.md §4.9): a single-writer queue that places and
//! flattens orders serially per account.
//!
//! Grounded on the teacher workspace's `hip3-executor::batch::BatchScheduler`
//! (one worker task draining one `mpsc` queue) and
//! `hip3-executor::executor_loop`'s retry-with-budget / fail-fast-on-permanent
//! split, adapted from Hyperliquid's signed-batch wire protocol to Kalshi's
//! single-order REST calls. Serialization through one queue, not per-ticket
//! locks, is what prevents rate-limit interleaving across concurrent
//! `open_trade`/`close_trade` calls (spec.md §5).

use std::time::Duration;

use reccore::{EventTicker, Price, TicketId, TradeSide};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::{OrderAction, OrderClient, OrderType, RawOrderAck};
use crate::error::{ExecutorError, ExecutorResult};

/// Total wall-clock time a single ticket may spend retrying transient
/// errors before the executor gives up and reports failure (spec.md §4.9).
const RETRY_BUDGET: Duration = Duration::from_secs(30);
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Queue depth before `submit_open`/`submit_close` start applying
/// backpressure to their callers.
const DEFAULT_QUEUE_CAPACITY: usize = 256;

enum JobKind {
    Open {
        ticket_id: TicketId,
        contract: EventTicker,
        side: TradeSide,
        price: Price,
        count: i64,
    },
    Close {
        ticket_id: TicketId,
        contract: EventTicker,
        side: TradeSide,
        count: i64,
    },
}

impl JobKind {
    fn ticket_id(&self) -> &TicketId {
        match self {
            Self::Open { ticket_id, .. } | Self::Close { ticket_id, .. } => ticket_id,
        }
    }
}

struct Job {
    kind: JobKind,
    reply: oneshot::Sender<ExecutorResult<RawOrderAck>>,
}

/// Handle callers submit work through; the actual queue worker runs in a
/// separately spawned task (see [`TradeExecutor::spawn`]).
pub struct TradeExecutor {
    tx: mpsc::Sender<Job>,
}

impl TradeExecutor {
    /// Spawn the single-writer worker and return the handle callers submit
    /// jobs through, plus the worker's join handle (awaited at shutdown).
    pub fn spawn(
        client: OrderClient,
        token: CancellationToken,
    ) -> (Self, tokio::task::JoinHandle<()>) {
        Self::spawn_with_capacity(client, DEFAULT_QUEUE_CAPACITY, token)
    }

    pub fn spawn_with_capacity(
        client: OrderClient,
        queue_capacity: usize,
        token: CancellationToken,
    ) -> (Self, tokio::task::JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let worker = Worker { client, rx };
        let handle = tokio::spawn(worker.run(token));
        (Self { tx }, handle)
    }

    /// Enqueue a buy order for a newly opened trade. Resolves once the
    /// order is placed, permanently rejected, or the retry budget runs out.
    pub async fn submit_open(
        &self,
        ticket_id: &TicketId,
        contract: &EventTicker,
        side: TradeSide,
        price: Price,
        count: i64,
    ) -> ExecutorResult<RawOrderAck> {
        self.submit(JobKind::Open {
            ticket_id: ticket_id.clone(),
            contract: contract.clone(),
            side,
            price,
            count,
        })
        .await
    }

    /// Enqueue a flattening sell order for a trade moving `open -> closing`.
    pub async fn submit_close(
        &self,
        ticket_id: &TicketId,
        contract: &EventTicker,
        side: TradeSide,
        count: i64,
    ) -> ExecutorResult<RawOrderAck> {
        self.submit(JobKind::Close {
            ticket_id: ticket_id.clone(),
            contract: contract.clone(),
            side,
            count,
        })
        .await
    }

    async fn submit(&self, kind: JobKind) -> ExecutorResult<RawOrderAck> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Job {
                kind,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ExecutorError::QueueClosed)?;

        reply_rx.await.map_err(|_| ExecutorError::QueueClosed)?
    }
}

struct Worker {
    client: OrderClient,
    rx: mpsc::Receiver<Job>,
}

impl Worker {
    async fn run(mut self, token: CancellationToken) {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("TradeExecutor worker shutting down");
                    return;
                }
                job = self.rx.recv() => {
                    match job {
                        Some(job) => self.process(job).await,
                        None => {
                            info!("TradeExecutor queue closed, worker exiting");
                            return;
                        }
                    }
                }
            }
        }
    }

    async fn process(&self, job: Job) {
        let ticket_id = job.kind.ticket_id().clone();
        let result = self.execute_with_retry(&job.kind).await;

        match &result {
            Ok(ack) => info!(
                ticket_id = %ticket_id,
                order_id = %ack.order_id,
                status = %ack.status,
                "ticket executed"
            ),
            Err(err) => warn!(ticket_id = %ticket_id, error = %err, "ticket execution failed"),
        }

        // Caller may have dropped the receiver (e.g. process shutdown); the
        // ticket itself has already reached the exchange or failed.
        let _ = job.reply.send(result);
    }

    async fn execute_with_retry(&self, kind: &JobKind) -> ExecutorResult<RawOrderAck> {
        let deadline = Instant::now() + RETRY_BUDGET;
        let mut delay = INITIAL_BACKOFF;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            match self.place(kind).await {
                Ok(ack) => return Ok(ack),
                Err(err) if err.is_permanent() => return Err(err),
                Err(err) => {
                    if Instant::now() >= deadline {
                        return Err(ExecutorError::RetryBudgetExhausted {
                            attempts: attempt,
                            last_error: err.to_string(),
                        });
                    }
                    warn!(
                        ticket_id = %kind.ticket_id(),
                        attempt,
                        error = %err,
                        "transient exchange error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_BACKOFF);
                }
            }
        }
    }

    async fn place(&self, kind: &JobKind) -> ExecutorResult<RawOrderAck> {
        match kind {
            JobKind::Open {
                ticket_id,
                contract,
                side,
                price,
                count,
            } => {
                self.client
                    .place_order(
                        ticket_id.as_str(),
                        contract.as_str(),
                        *side,
                        OrderAction::Buy,
                        OrderType::Limit,
                        Some(price.inner()),
                        *count,
                    )
                    .await
            }
            JobKind::Close {
                ticket_id,
                contract,
                side,
                count,
            } => {
                // "{ticket_id}-close" keeps the closing leg's idempotency
                // key deterministic across TradeManager retries, separate
                // from the opening leg's key.
                let close_id = format!("{ticket_id}-close");
                self.client
                    .place_order(
                        &close_id,
                        contract.as_str(),
                        *side,
                        OrderAction::Sell,
                        OrderType::Market,
                        None,
                        *count,
                    )
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_budget_and_backoff_are_bounded() {
        assert!(RETRY_BUDGET >= Duration::from_secs(10));
        assert!(INITIAL_BACKOFF < MAX_BACKOFF);
    }
}
