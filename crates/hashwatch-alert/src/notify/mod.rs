//! Notification sinks.
//!
//! Every alert channel is a [`Notifier`]. The decider only talks to this
//! trait, so transports can be swapped or faked in tests.

mod console;
mod logging;
mod mail;

use std::io;

use serde::Serialize;
use thiserror::Error;

use hashwatch_core::{AlertChannel, AlertConfig};

use crate::report::AlertReport;

pub use console::ConsoleNotifier;
pub use logging::LogNotifier;
pub use mail::{MailEnvelope, SendmailNotifier, SmtpNotifier};

/// A sink failed to deliver an alert.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Writing the rendering failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The alert could not be turned into a valid message.
    #[error("Invalid message: {0}")]
    Message(String),

    /// The transport refused or could not reach its endpoint.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// A destination for alerts.
pub trait Notifier: Send + Sync {
    /// Short name used in logs and run reports.
    fn name(&self) -> &str;

    /// Deliver `report`.
    fn notify(&self, report: &AlertReport) -> Result<(), DeliveryError>;
}

/// How the console sink renders reports.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable sections.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Record of one sink invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    /// Sink name.
    pub sink: String,
    /// Failure message, `None` when delivered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Delivery {
    /// A successful delivery.
    pub fn sent(sink: &str) -> Self {
        Self {
            sink: sink.to_string(),
            error: None,
        }
    }

    /// A failed delivery.
    pub fn failed(sink: &str, error: &DeliveryError) -> Self {
        Self {
            sink: sink.to_string(),
            error: Some(error.to_string()),
        }
    }

    /// Whether the sink accepted the alert.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Build the sinks for a channel, in invocation order.
///
/// Every channel logs; all but `log-only` also write to stdout, and the
/// email channels finally send mail.
pub fn sinks_for(alert: &AlertConfig, format: OutputFormat) -> Vec<Box<dyn Notifier>> {
    let mut sinks: Vec<Box<dyn Notifier>> = vec![Box::new(LogNotifier)];

    if alert.channel != AlertChannel::LogOnly {
        sinks.push(Box::new(ConsoleNotifier::stdout(format)));
    }

    match alert.channel {
        AlertChannel::EmailDirect => {
            sinks.push(Box::new(SendmailNotifier::new(MailEnvelope::from_config(alert))));
        }
        AlertChannel::EmailSmtp => {
            if let Some(smtp) = &alert.smtp {
                sinks.push(Box::new(SmtpNotifier::new(
                    MailEnvelope::from_config(alert),
                    smtp,
                )));
            }
        }
        AlertChannel::LogOnly | AlertChannel::Console => {}
    }

    sinks
}
