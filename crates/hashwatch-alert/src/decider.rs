//! Alert trigger policy and sink dispatch.

use std::fmt;

use serde::Serialize;

use hashwatch_baseline::{BaselineError, BaselineStore, DiffResult};
use hashwatch_core::{AlertConfig, Fingerprint, Snapshot};

use crate::notify::{Delivery, Notifier, OutputFormat, sinks_for};
use crate::report::AlertReport;

/// Why an alert fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerReason {
    /// Files appeared since the baseline.
    FilesAdded { count: usize },
    /// Files disappeared since the baseline.
    FilesRemoved { count: usize },
    /// File contents changed since the baseline.
    FilesChanged { count: usize },
    /// The computed fingerprint differs from the one the caller expected.
    FingerprintMismatch { expected: String },
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FilesAdded { count } => write!(f, "{count} file(s) added"),
            Self::FilesRemoved { count } => write!(f, "{count} file(s) removed"),
            Self::FilesChanged { count } => write!(f, "{count} file(s) changed"),
            Self::FingerprintMismatch { expected } => {
                write!(f, "fingerprint does not match expected {expected}")
            }
        }
    }
}

/// Result of applying the trigger policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Whether an alert must be raised.
    pub triggered: bool,
    /// Every condition that fired, empty when not triggered.
    pub reasons: Vec<TriggerReason>,
}

/// What happened after a decision was acted on.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlertOutcome {
    /// The decision that was acted on.
    pub decision: Decision,
    /// One entry per sink invoked, in invocation order.
    pub deliveries: Vec<Delivery>,
    /// Whether the baseline was replaced with the current snapshot.
    pub baseline_updated: bool,
}

/// Applies the trigger policy and fans alerts out to the configured sinks.
pub struct AlertDecider {
    sinks: Vec<Box<dyn Notifier>>,
}

impl AlertDecider {
    /// Create a decider with an explicit sink list, invoked in order.
    pub fn new(sinks: Vec<Box<dyn Notifier>>) -> Self {
        Self { sinks }
    }

    /// Create a decider with the sinks selected by the alert channel.
    pub fn from_config(alert: &AlertConfig, format: OutputFormat) -> Self {
        Self::new(sinks_for(alert, format))
    }

    /// Names of the configured sinks, in invocation order.
    pub fn sink_names(&self) -> impl Iterator<Item = &str> {
        self.sinks.iter().map(|s| s.name())
    }

    /// Decide whether `diff` (with its computed `fingerprint`) warrants an
    /// alert.
    ///
    /// A supplied `expected` fingerprint that does not match fires even
    /// when the diff itself is empty. Blank values count as not supplied.
    pub fn evaluate(
        diff: &DiffResult,
        fingerprint: &Fingerprint,
        expected: Option<&str>,
    ) -> Decision {
        let mut reasons = Vec::new();

        if !diff.added.is_empty() {
            reasons.push(TriggerReason::FilesAdded {
                count: diff.added.len(),
            });
        }
        if !diff.removed.is_empty() {
            reasons.push(TriggerReason::FilesRemoved {
                count: diff.removed.len(),
            });
        }
        if !diff.changed.is_empty() {
            reasons.push(TriggerReason::FilesChanged {
                count: diff.changed.len(),
            });
        }
        let expected = expected.map(str::trim).filter(|e| !e.is_empty());
        if let Some(expected) = expected.filter(|e| !fingerprint.matches(e)) {
            reasons.push(TriggerReason::FingerprintMismatch {
                expected: expected.to_string(),
            });
        }

        Decision {
            triggered: !reasons.is_empty(),
            reasons,
        }
    }

    /// Act on `decision`.
    ///
    /// When triggered, every sink receives the same report and a failing
    /// sink never stops the ones after it. Afterwards `current` replaces
    /// the baseline in `persist_to`, if given. A baseline write failure is
    /// returned as an error; delivery failures only show up in the outcome.
    pub fn handle(
        &self,
        decision: Decision,
        diff: &DiffResult,
        fingerprint: &Fingerprint,
        current: &Snapshot,
        persist_to: Option<&BaselineStore>,
    ) -> Result<AlertOutcome, BaselineError> {
        if !decision.triggered {
            tracing::info!("Everything OK");
            return Ok(AlertOutcome {
                decision,
                ..Default::default()
            });
        }

        tracing::info!("Sending alerts now...");
        let report = AlertReport::new(diff.clone(), fingerprint.clone(), decision.reasons.clone());

        let deliveries = self
            .sinks
            .iter()
            .map(|sink| match sink.notify(&report) {
                Ok(()) => Delivery::sent(sink.name()),
                Err(e) => {
                    tracing::error!(sink = sink.name(), "Alert delivery failed: {e}");
                    Delivery::failed(sink.name(), &e)
                }
            })
            .collect();

        let baseline_updated = match persist_to {
            Some(store) => {
                store.save(current)?;
                true
            }
            None => false,
        };

        Ok(AlertOutcome {
            decision,
            deliveries,
            baseline_updated,
        })
    }
}

impl fmt::Debug for AlertDecider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertDecider")
            .field("sinks", &self.sink_names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashwatch_core::{FileHash, HashAlgorithm};

    fn diff_with_added() -> DiffResult {
        let mut diff = DiffResult::default();
        diff.added.insert("/a", FileHash::new("01"));
        diff
    }

    #[test]
    fn test_empty_diff_not_triggered() {
        let diff = DiffResult::default();
        let fp = diff.fingerprint(HashAlgorithm::Sha1);

        let decision = AlertDecider::evaluate(&diff, &fp, None);
        assert!(!decision.triggered);
        assert!(decision.reasons.is_empty());
    }

    #[test]
    fn test_added_triggers() {
        let diff = diff_with_added();
        let fp = diff.fingerprint(HashAlgorithm::Sha1);

        let decision = AlertDecider::evaluate(&diff, &fp, None);
        assert!(decision.triggered);
        assert_eq!(decision.reasons, vec![TriggerReason::FilesAdded { count: 1 }]);
    }

    #[test]
    fn test_matching_expected_fingerprint_ignores_case() {
        let diff = DiffResult::default();
        let fp = diff.fingerprint(HashAlgorithm::Sha1);
        let expected = fp.as_str().to_ascii_uppercase();

        assert!(!AlertDecider::evaluate(&diff, &fp, Some(&expected)).triggered);
    }

    #[test]
    fn test_blank_expected_fingerprint_is_ignored() {
        let diff = DiffResult::default();
        let fp = diff.fingerprint(HashAlgorithm::Sha1);

        for blank in ["", "   ", "\t\n"] {
            let decision = AlertDecider::evaluate(&diff, &fp, Some(blank));
            assert!(!decision.triggered, "{blank:?} should not trigger");
            assert!(decision.reasons.is_empty());
        }
    }

    #[test]
    fn test_mismatched_expected_fingerprint_triggers() {
        let diff = DiffResult::default();
        let fp = diff.fingerprint(HashAlgorithm::Sha1);

        let decision = AlertDecider::evaluate(&diff, &fp, Some("deadbeef"));
        assert!(decision.triggered);
        assert_eq!(
            decision.reasons,
            vec![TriggerReason::FingerprintMismatch {
                expected: "deadbeef".to_string()
            }]
        );
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(
            TriggerReason::FilesRemoved { count: 2 }.to_string(),
            "2 file(s) removed"
        );
    }

    #[test]
    fn test_not_triggered_invokes_nothing() {
        let decider = AlertDecider::new(Vec::new());
        let diff = DiffResult::default();
        let fp = diff.fingerprint(HashAlgorithm::Sha1);

        let outcome = decider
            .handle(Decision::default(), &diff, &fp, &Snapshot::new(), None)
            .unwrap();
        assert!(outcome.deliveries.is_empty());
        assert!(!outcome.baseline_updated);
    }
}
