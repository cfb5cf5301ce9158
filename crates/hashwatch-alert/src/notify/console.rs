use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use crate::notify::{DeliveryError, Notifier, OutputFormat};
use crate::report::AlertReport;

/// Writes the alert to a stream, stdout in the CLI.
#[derive(Debug)]
pub struct ConsoleNotifier<W = io::Stdout> {
    out: Mutex<W>,
    format: OutputFormat,
}

impl ConsoleNotifier<io::Stdout> {
    /// Console sink on the process stdout.
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(io::stdout(), format)
    }
}

impl<W: Write + Send> ConsoleNotifier<W> {
    /// Console sink on an arbitrary writer.
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out: Mutex::new(out),
            format,
        }
    }

    /// Take the writer back.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Notifier for ConsoleNotifier<W> {
    fn name(&self) -> &str {
        "console"
    }

    fn notify(&self, report: &AlertReport) -> Result<(), DeliveryError> {
        let rendered = match self.format {
            OutputFormat::Text => report.render_text(),
            OutputFormat::Json => {
                let mut json = report
                    .render_json()
                    .map_err(|e| DeliveryError::Message(e.to_string()))?;
                json.push('\n');
                json
            }
        };

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        out.write_all(rendered.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decider::TriggerReason;
    use hashwatch_baseline::DiffResult;
    use hashwatch_core::{FileHash, HashAlgorithm};

    fn report() -> AlertReport {
        let mut diff = DiffResult::default();
        diff.removed.insert("/b", FileHash::new("02"));
        let fingerprint = diff.fingerprint(HashAlgorithm::Sha1);
        AlertReport::new(diff, fingerprint, vec![TriggerReason::FilesRemoved { count: 1 }])
    }

    #[test]
    fn test_text_output() {
        let sink = ConsoleNotifier::new(Vec::new(), OutputFormat::Text);
        sink.notify(&report()).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.contains("deleted: 1\n  /b=02\n"));
    }

    #[test]
    fn test_json_output() {
        let sink = ConsoleNotifier::new(Vec::new(), OutputFormat::Json);
        sink.notify(&report()).unwrap();

        let json: serde_json::Value = serde_json::from_slice(&sink.into_inner()).unwrap();
        assert_eq!(json["removed"]["/b"], "02");
    }
}
