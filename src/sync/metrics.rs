//! # Queue Metrics
//!
//! Outcome counters for processing cycles. Session-local, never persisted.

use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct QueueMetrics {
    pub total_cycles: u64,
    pub delivered: u64,
    pub rejected: u64,
    pub retried: u64,
    pub dropped: u64,
    pub last_cycle_duration: Option<Duration>,
    cycle_start: Option<Instant>,
}

/// Copy of the counters for observers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub total_cycles: u64,
    pub delivered: u64,
    pub rejected: u64,
    pub retried: u64,
    pub dropped: u64,
    pub last_cycle_duration: Option<Duration>,
}

impl MetricsSnapshot {
    /// Share of finished sends that were delivered
    pub fn success_rate(&self) -> f64 {
        let finished = self.delivered + self.rejected + self.dropped;
        if finished == 0 {
            0.0
        } else {
            self.delivered as f64 / finished as f64
        }
    }
}

impl QueueMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle_start(&mut self) {
        self.cycle_start = Some(Instant::now());
        self.total_cycles += 1;
    }

    fn finish_cycle(&mut self) {
        if let Some(start) = self.cycle_start.take() {
            self.last_cycle_duration = Some(start.elapsed());
        }
    }

    pub fn record_delivered(&mut self) {
        self.finish_cycle();
        self.delivered += 1;
    }

    pub fn record_rejected(&mut self) {
        self.finish_cycle();
        self.rejected += 1;
    }

    pub fn record_retry(&mut self) {
        self.finish_cycle();
        self.retried += 1;
    }

    pub fn record_dropped(&mut self) {
        self.finish_cycle();
        self.dropped += 1;
    }

    /// Cycle whose entry vanished while in flight
    pub fn record_abandoned(&mut self) {
        self.finish_cycle();
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_cycles: self.total_cycles,
            delivered: self.delivered,
            rejected: self.rejected,
            retried: self.retried,
            dropped: self.dropped,
            last_cycle_duration: self.last_cycle_duration,
        }
    }
}
