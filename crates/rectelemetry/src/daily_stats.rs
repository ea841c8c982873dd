//! Daily statistics output.
//!
//! Outputs a daily summary of key per-contract metrics:
//! - entry_triggers: entry candidates triggered (buy/sell split)
//! - trade_pnl: PnL distribution (P50/P95/P99) in basis points
//! - holding_time: position holding time distribution (P50/P95/P99)
//! - gate_blocked: risk gate block count

use crate::metrics::{
    ENTRY_TRIGGERS_TOTAL, GATE_BLOCKED_TOTAL, POSITION_HOLDING_TIME_MS, TRADE_PNL_BPS,
};
use chrono::{DateTime, Utc};
use prometheus::core::Collector;
use std::collections::HashMap;
use tracing::info;

/// Daily statistics for one contract.
#[derive(Debug, Clone)]
pub struct ContractDailyStats {
    pub contract: String,
    pub entry_triggers_yes: u64,
    pub entry_triggers_no: u64,
    pub gate_blocked_total: u64,
    pub pnl_p50_bps: f64,
    pub pnl_p95_bps: f64,
    pub pnl_p99_bps: f64,
    pub holding_time_p50_ms: f64,
    pub holding_time_p95_ms: f64,
    pub holding_time_p99_ms: f64,
}

/// Daily statistics reporter.
pub struct DailyStatsReporter {
    contracts: Vec<String>,
    start_time: DateTime<Utc>,
}

impl DailyStatsReporter {
    /// Create a new daily stats reporter.
    pub fn new(contracts: Vec<String>) -> Self {
        Self {
            contracts,
            start_time: Utc::now(),
        }
    }

    /// Get current statistics for all watched contracts.
    pub fn get_stats(&self) -> Vec<ContractDailyStats> {
        self.contracts
            .iter()
            .map(|contract| self.get_contract_stats(contract))
            .collect()
    }

    /// Get statistics for a single contract.
    fn get_contract_stats(&self, contract: &str) -> ContractDailyStats {
        let entry_triggers_yes = self.get_counter_value(&ENTRY_TRIGGERS_TOTAL, &[contract, "YES"]);
        let entry_triggers_no = self.get_counter_value(&ENTRY_TRIGGERS_TOTAL, &[contract, "NO"]);

        let gate_blocked_total = self.sum_gate_blocked(contract);

        let (pnl_p50_bps, pnl_p95_bps, pnl_p99_bps) =
            self.get_histogram_percentiles_any_exit_reason(&TRADE_PNL_BPS, contract);
        let (holding_time_p50_ms, holding_time_p95_ms, holding_time_p99_ms) =
            self.get_histogram_percentiles_any_exit_reason(&POSITION_HOLDING_TIME_MS, contract);

        ContractDailyStats {
            contract: contract.to_string(),
            entry_triggers_yes,
            entry_triggers_no,
            gate_blocked_total,
            pnl_p50_bps,
            pnl_p95_bps,
            pnl_p99_bps,
            holding_time_p50_ms,
            holding_time_p95_ms,
            holding_time_p99_ms,
        }
    }

    fn get_counter_value(&self, counter: &prometheus::CounterVec, labels: &[&str]) -> u64 {
        counter.with_label_values(labels).get() as u64
    }

    /// Sum `GATE_BLOCKED_TOTAL` across every gate name for one contract —
    /// the gate label varies per predicate, so this aggregates rather than
    /// requiring a caller to know every gate name up front.
    fn sum_gate_blocked(&self, contract: &str) -> u64 {
        let mut total = 0u64;
        for mf in GATE_BLOCKED_TOTAL.collect() {
            for m in mf.get_metric() {
                let label_pairs = m.get_label();
                if label_pairs.len() != 2 {
                    continue;
                }
                if label_pairs[1].get_value() == contract {
                    total += m.get_counter().get_value() as u64;
                }
            }
        }
        total
    }

    /// Percentiles for a histogram keyed by `[contract, exit_reason]`,
    /// aggregated across every exit reason for one contract.
    fn get_histogram_percentiles_any_exit_reason(
        &self,
        histogram: &prometheus::HistogramVec,
        contract: &str,
    ) -> (f64, f64, f64) {
        let mut buckets_by_bound: HashMap<u64, (f64, u64)> = HashMap::new();
        let mut bound_order: Vec<f64> = Vec::new();

        for mf in histogram.collect() {
            for m in mf.get_metric() {
                let label_pairs = m.get_label();
                if label_pairs.len() != 2 || label_pairs[0].get_value() != contract {
                    continue;
                }
                let h = m.get_histogram();
                for b in h.get_bucket() {
                    let bound = b.get_upper_bound();
                    let key = bound.to_bits();
                    let entry = buckets_by_bound.entry(key).or_insert_with(|| {
                        bound_order.push(bound);
                        (bound, 0)
                    });
                    entry.1 += b.get_cumulative_count();
                }
            }
        }

        if buckets_by_bound.is_empty() {
            return (0.0, 0.0, 0.0);
        }

        bound_order.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let total_count = bound_order
            .last()
            .and_then(|b| buckets_by_bound.get(&b.to_bits()))
            .map(|(_, c)| *c)
            .unwrap_or(0);

        let p50 = self.percentile_from_sorted(&bound_order, &buckets_by_bound, total_count, 0.50);
        let p95 = self.percentile_from_sorted(&bound_order, &buckets_by_bound, total_count, 0.95);
        let p99 = self.percentile_from_sorted(&bound_order, &buckets_by_bound, total_count, 0.99);
        (p50, p95, p99)
    }

    /// Calculate a percentile from sorted bucket bounds via linear
    /// interpolation within the bucket that first reaches the target count.
    fn percentile_from_sorted(
        &self,
        bound_order: &[f64],
        buckets_by_bound: &HashMap<u64, (f64, u64)>,
        total_count: u64,
        percentile: f64,
    ) -> f64 {
        if total_count == 0 {
            return 0.0;
        }
        let target = (total_count as f64 * percentile) as u64;
        let mut prev_bound = 0.0;
        let mut prev_count = 0u64;

        for bound in bound_order {
            let (upper_bound, cumulative_count) = buckets_by_bound[&bound.to_bits()];
            if cumulative_count >= target {
                let bucket_count = cumulative_count - prev_count;
                if bucket_count == 0 {
                    return upper_bound;
                }
                let position = (target - prev_count) as f64 / bucket_count as f64;
                return prev_bound + position * (upper_bound - prev_bound);
            }
            prev_bound = upper_bound;
            prev_count = cumulative_count;
        }

        bound_order.last().copied().unwrap_or(0.0)
    }

    /// Output daily statistics to logs.
    pub fn output_daily_summary(&self) {
        let stats = self.get_stats();
        let duration = Utc::now() - self.start_time;
        let hours = duration.num_hours();
        let minutes = duration.num_minutes() % 60;

        info!("========== Daily Statistics Summary ==========");
        info!(
            "Period: {} ({} hours {} minutes)",
            self.start_time.format("%Y-%m-%d %H:%M:%S UTC"),
            hours,
            minutes
        );

        for s in &stats {
            info!("--- {} ---", s.contract);
            info!(
                "  Entry triggers: {} (yes: {}, no: {})",
                s.entry_triggers_yes + s.entry_triggers_no,
                s.entry_triggers_yes,
                s.entry_triggers_no
            );
            info!("  Gate blocked: {}", s.gate_blocked_total);
            info!(
                "  PnL (bps): P50={:.1}, P95={:.1}, P99={:.1}",
                s.pnl_p50_bps, s.pnl_p95_bps, s.pnl_p99_bps
            );
            info!(
                "  Holding time (ms): P50={:.1}, P95={:.1}, P99={:.1}",
                s.holding_time_p50_ms, s.holding_time_p95_ms, s.holding_time_p99_ms
            );
        }

        info!("==============================================");
    }

    /// Get JSON-formatted statistics.
    pub fn to_json(&self) -> HashMap<String, ContractDailyStats> {
        self.get_stats()
            .into_iter()
            .map(|s| (s.contract.clone(), s))
            .collect()
    }
}
