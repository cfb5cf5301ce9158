//! Summary of a finished monitoring run.

use std::time::Duration;

use serde::Serialize;

use hashwatch_baseline::DiffResult;
use hashwatch_core::{Fingerprint, ScanStats};

use crate::decider::{AlertOutcome, Decision};
use crate::notify::Delivery;

/// Everything a caller needs to report on one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Scan counters.
    pub stats: ScanStats,
    /// Time spent scanning and hashing.
    #[serde(skip)]
    pub scan_duration: Duration,
    /// Current snapshot against the baseline.
    pub diff: DiffResult,
    /// Fingerprint of `diff`.
    pub fingerprint: Fingerprint,
    /// Trigger decision.
    pub decision: Decision,
    /// Sink results, empty unless triggered.
    pub deliveries: Vec<Delivery>,
    /// Whether the baseline file was rewritten.
    pub baseline_updated: bool,
}

impl RunReport {
    pub(crate) fn new(
        stats: ScanStats,
        scan_duration: Duration,
        diff: DiffResult,
        fingerprint: Fingerprint,
        outcome: AlertOutcome,
    ) -> Self {
        Self {
            stats,
            scan_duration,
            diff,
            fingerprint,
            decision: outcome.decision,
            deliveries: outcome.deliveries,
            baseline_updated: outcome.baseline_updated,
        }
    }

    /// Whether an alert condition was detected.
    pub fn triggered(&self) -> bool {
        self.decision.triggered
    }

    /// Whether any sink failed to deliver.
    pub fn delivery_failed(&self) -> bool {
        self.deliveries.iter().any(|d| !d.is_ok())
    }

    /// Sinks that failed, in invocation order.
    pub fn failed_deliveries(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.iter().filter(|d| !d.is_ok())
    }
}
