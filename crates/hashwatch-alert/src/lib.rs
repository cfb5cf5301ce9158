//! Alerting for hashwatch.
//!
//! This crate decides whether a diff warrants an alert, fans the alert out
//! to the configured [`Notifier`] sinks and drives a complete run through
//! [`Monitor`]:
//!
//! 1. authorize the caller
//! 2. snapshot the include paths
//! 3. load the baseline and diff
//! 4. evaluate the trigger policy, notify, and replace the baseline
//!
//! Delivery failures never hide a detection; they are reported per sink in
//! the [`RunReport`].

mod decider;
mod monitor;
pub mod notify;
mod outcome;
mod report;

pub use decider::{AlertDecider, AlertOutcome, Decision, TriggerReason};
pub use monitor::{Monitor, RunRequest, WatchError};
pub use notify::{Delivery, DeliveryError, Notifier, OutputFormat};
pub use outcome::RunReport;
pub use report::AlertReport;
