//! Alert rendering shared by every sink.

use std::fmt::{self, Write as _};

use chrono::{DateTime, Local};
use serde::Serialize;

use hashwatch_baseline::DiffResult;
use hashwatch_core::{Fingerprint, Snapshot};

use crate::decider::TriggerReason;

/// Everything a sink needs to describe one alert.
#[derive(Debug, Clone, Serialize)]
pub struct AlertReport {
    /// When the check ran.
    pub checked_at: DateTime<Local>,
    /// Why the alert fired.
    pub reasons: Vec<TriggerReason>,
    /// Computed aggregate fingerprint.
    pub fingerprint: Fingerprint,
    /// The three-way diff.
    #[serde(flatten)]
    pub diff: DiffResult,
}

impl AlertReport {
    /// Create a report stamped with the current local time.
    pub fn new(diff: DiffResult, fingerprint: Fingerprint, reasons: Vec<TriggerReason>) -> Self {
        Self {
            checked_at: Local::now(),
            reasons,
            fingerprint,
            diff,
        }
    }

    /// Plain-text rendering used for logs, console and mail bodies.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        push_section(&mut out, "new", &self.diff.added);
        push_section(&mut out, "deleted", &self.diff.removed);
        push_section(&mut out, "changed", &self.diff.changed);

        let _ = writeln!(out, "fingerprint: {}", self.fingerprint);
        for reason in &self.reasons {
            let _ = writeln!(out, "reason: {reason}");
        }
        let _ = writeln!(out, "checked at: {}", self.checked_at.format("%Y-%m-%d %H:%M:%S"));
        out
    }

    /// JSON rendering for machine consumers.
    pub fn render_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for AlertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_text())
    }
}

fn push_section(out: &mut String, title: &str, entries: &Snapshot) {
    let _ = writeln!(out, "{title}: {}", entries.len());
    for (path, hash) in entries {
        let _ = writeln!(out, "  {}={}", path.display(), hash);
    }
}
