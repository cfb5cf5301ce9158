use crate::notify::{DeliveryError, Notifier};
use crate::report::AlertReport;

/// Writes the alert into the process log, one event per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    fn notify(&self, report: &AlertReport) -> Result<(), DeliveryError> {
        for line in report.render_text().lines() {
            tracing::warn!("{line}");
        }
        Ok(())
    }
}
