//! Exchange-engine observability counters.
//!
//! Ambient instrumentation, not a protocol feature: a handful of atomic
//! counters updated alongside the `EX00x` log points, in the style of
//! `kimberlite_vsr::instrumentation::Metrics`. Exposed as a global singleton
//! so callers don't need to thread a handle through every exchange.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global counters for this process's exchange engine activity.
pub static METRICS: ExchangeMetrics = ExchangeMetrics::new();

/// Thread-safe exchange-lifecycle counters.
#[derive(Debug)]
pub struct ExchangeMetrics {
    started_total: AtomicU64,
    timed_out_total: AtomicU64,
    completed_total: AtomicU64,
    repairs_emitted_total: AtomicU64,
}

impl ExchangeMetrics {
    const fn new() -> Self {
        Self {
            started_total: AtomicU64::new(0),
            timed_out_total: AtomicU64::new(0),
            completed_total: AtomicU64::new(0),
            repairs_emitted_total: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_started(&self) {
        self.started_total.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_terminal(&self, terminal_phase: crate::types::Phase) {
        if terminal_phase == crate::types::Phase::TimedOut {
            self.timed_out_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.completed_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_repairs(&self, count: u64) {
        self.repairs_emitted_total.fetch_add(count, Ordering::Relaxed);
    }

    /// Snapshot of the counters, gated behind the `metrics` feature so
    /// plain builds carry no public surface beyond the atomics themselves.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn snapshot(&self) -> ExchangeMetricsSnapshot {
        ExchangeMetricsSnapshot {
            started_total: self.started_total.load(Ordering::Relaxed),
            timed_out_total: self.timed_out_total.load(Ordering::Relaxed),
            completed_total: self.completed_total.load(Ordering::Relaxed),
            repairs_emitted_total: self.repairs_emitted_total.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time read of [`ExchangeMetrics`].
#[cfg(feature = "metrics")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeMetricsSnapshot {
    pub started_total: u64,
    pub timed_out_total: u64,
    pub completed_total: u64,
    pub repairs_emitted_total: u64,
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use super::*;
    use crate::types::Phase;

    #[test]
    fn counters_increment_independently() {
        let m = ExchangeMetrics::new();
        m.record_started();
        m.record_started();
        m.record_terminal(Phase::Complete);
        m.record_terminal(Phase::TimedOut);
        m.record_repairs(3);

        let snap = m.snapshot();
        assert_eq!(snap.started_total, 2);
        assert_eq!(snap.completed_total, 1);
        assert_eq!(snap.timed_out_total, 1);
        assert_eq!(snap.repairs_emitted_total, 3);
    }
}
