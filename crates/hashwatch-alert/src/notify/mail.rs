use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SendmailTransport, SmtpTransport, Transport};

use hashwatch_core::{AlertConfig, SmtpConfig};

use crate::notify::{DeliveryError, Notifier};
use crate::report::AlertReport;

/// Addressing shared by the mail sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailEnvelope {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
}

impl MailEnvelope {
    /// Addressing taken from the alert settings.
    pub fn from_config(alert: &AlertConfig) -> Self {
        Self {
            from: alert.sender(),
            to: alert.to.clone().unwrap_or_default(),
            subject: alert.subject.clone(),
        }
    }

    /// Build a plain-text mail carrying the text rendering of `report`.
    pub fn build_message(&self, report: &AlertReport) -> Result<Message, DeliveryError> {
        let from: Mailbox = self
            .from
            .parse()
            .map_err(|e| DeliveryError::Message(format!("sender '{}': {e}", self.from)))?;
        let to: Mailbox = self
            .to
            .parse()
            .map_err(|e| DeliveryError::Message(format!("recipient '{}': {e}", self.to)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(self.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(report.render_text())
            .map_err(|e| DeliveryError::Message(e.to_string()))
    }
}

/// Hands the alert to the local `sendmail` binary.
#[derive(Debug)]
pub struct SendmailNotifier {
    envelope: MailEnvelope,
    transport: SendmailTransport,
}

impl SendmailNotifier {
    /// Deliver through the local `sendmail` binary.
    pub fn new(envelope: MailEnvelope) -> Self {
        Self {
            envelope,
            transport: SendmailTransport::new(),
        }
    }
}

impl Notifier for SendmailNotifier {
    fn name(&self) -> &str {
        "sendmail"
    }

    fn notify(&self, report: &AlertReport) -> Result<(), DeliveryError> {
        let message = self.envelope.build_message(report)?;
        self.transport
            .send(&message)
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        tracing::info!("Alert mailed to {}", self.envelope.to);
        Ok(())
    }
}

/// Submits the alert to an SMTP server, with login when configured.
#[derive(Debug)]
pub struct SmtpNotifier {
    envelope: MailEnvelope,
    server: String,
    transport: SmtpTransport,
}

impl SmtpNotifier {
    /// The connection is only opened when an alert is sent.
    pub fn new(envelope: MailEnvelope, smtp: &SmtpConfig) -> Self {
        let mut builder = SmtpTransport::builder_dangerous(&smtp.server).port(smtp.port);
        if let (Some(user), Some(pass)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Self {
            envelope,
            server: format!("{}:{}", smtp.server, smtp.port),
            transport: builder.build(),
        }
    }
}

impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "smtp"
    }

    fn notify(&self, report: &AlertReport) -> Result<(), DeliveryError> {
        let message = self.envelope.build_message(report)?;
        self.transport
            .send(&message)
            .map_err(|e| DeliveryError::Transport(format!("{}: {e}", self.server)))?;
        tracing::info!("Alert mailed to {} via {}", self.envelope.to, self.server);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashwatch_baseline::DiffResult;
    use hashwatch_core::{AlertChannel, DEFAULT_SUBJECT, FileHash, HashAlgorithm};

    fn report() -> AlertReport {
        let mut diff = DiffResult::default();
        diff.changed.insert("/etc/passwd", FileHash::new("ab"));
        let fingerprint = diff.fingerprint(HashAlgorithm::Sha1);
        AlertReport::new(diff, fingerprint, Vec::new())
    }

    fn envelope(to: &str) -> MailEnvelope {
        let alert = AlertConfig {
            channel: AlertChannel::EmailDirect,
            to: Some(to.to_string()),
            ..Default::default()
        };
        MailEnvelope::from_config(&alert)
    }

    #[test]
    fn test_envelope_from_config() {
        let envelope = envelope("ops@example.com");
        assert_eq!(envelope.from, "hashwatch@localhost");
        assert_eq!(envelope.subject, DEFAULT_SUBJECT);
    }

    #[test]
    fn test_build_message() {
        let message = envelope("ops@example.com").build_message(&report()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("To: ops@example.com"));
        assert!(raw.contains("Subject: ALERT: File hashes on your server have changed"));
        assert!(raw.contains("/etc/passwd=ab"));
    }

    #[test]
    fn test_bad_recipient_is_message_error() {
        let err = envelope("not an address").build_message(&report()).unwrap_err();
        assert!(matches!(err, DeliveryError::Message(_)));
    }

    #[test]
    fn test_unreachable_smtp_is_transport_error() {
        let smtp = SmtpConfig {
            server: "127.0.0.1".to_string(),
            port: 1,
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
        };
        let sink = SmtpNotifier::new(envelope("ops@example.com"), &smtp);

        let err = sink.notify(&report()).unwrap_err();
        assert!(matches!(err, DeliveryError::Transport(_)));
    }
}
