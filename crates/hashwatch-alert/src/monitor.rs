//! One monitoring run from authorization to baseline update.

use thiserror::Error;

use hashwatch_baseline::{BaselineError, BaselineStore, DiffEngine};
use hashwatch_core::{AuthError, ConfigError, ScanError, ScanOutcome, WatchConfig};
use hashwatch_scan::{DirectoryWalker, JwalkWalker, Snapshotter};

use crate::decider::{AlertDecider, AlertOutcome};
use crate::notify::OutputFormat;
use crate::outcome::RunReport;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The caller did not present the configured secret.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The config failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A root could not be walked or a file could not be hashed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The baseline could not be read or written.
    #[error(transparent)]
    Baseline(#[from] BaselineError),
}

/// Per-invocation inputs.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Secret supplied by the caller.
    pub password: Option<String>,
    /// Fingerprint the caller expects this run to produce.
    pub expected_fingerprint: Option<String>,
    /// Allow the baseline to be overwritten after an alert.
    pub update_baseline: bool,
}

impl Default for RunRequest {
    fn default() -> Self {
        Self {
            password: None,
            expected_fingerprint: None,
            update_baseline: true,
        }
    }
}

impl RunRequest {
    /// Create a request with no secret and no expected fingerprint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply the access secret.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Supply the expected fingerprint.
    pub fn with_expected_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.expected_fingerprint = Some(fingerprint.into());
        self
    }

    /// Keep the baseline untouched even when an alert fires.
    pub fn without_baseline_update(mut self) -> Self {
        self.update_baseline = false;
        self
    }
}

/// Ties the scanner, baseline store and decider together for one config.
pub struct Monitor<W = JwalkWalker> {
    config: WatchConfig,
    scanner: Snapshotter<W>,
    store: BaselineStore,
    decider: AlertDecider,
}

impl Monitor<JwalkWalker> {
    /// Create a monitor with the default walker and the channel's sinks.
    pub fn new(config: WatchConfig, format: OutputFormat) -> Result<Self, WatchError> {
        let scanner = Snapshotter::for_config(&config);
        let decider = AlertDecider::from_config(&config.alert, format);
        Self::with_parts(config, scanner, decider)
    }
}

impl<W: DirectoryWalker> Monitor<W> {
    /// Create a monitor from explicit parts.
    pub fn with_parts(
        config: WatchConfig,
        scanner: Snapshotter<W>,
        decider: AlertDecider,
    ) -> Result<Self, WatchError> {
        config.validate()?;
        let store = BaselineStore::new(&config.baseline_file);
        Ok(Self {
            config,
            scanner,
            store,
            decider,
        })
    }

    /// The config this monitor runs with.
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// The baseline store in use.
    pub fn store(&self) -> &BaselineStore {
        &self.store
    }

    /// Full run: snapshot, diff against the baseline, alert and persist.
    pub fn check(&self, request: &RunRequest) -> Result<RunReport, WatchError> {
        self.run(request, true)
    }

    /// Same as [`check`](Self::check) without notifying or persisting.
    pub fn preview(&self, request: &RunRequest) -> Result<RunReport, WatchError> {
        self.run(request, false)
    }

    /// Scan and write the baseline unconditionally.
    pub fn init_baseline(&self, password: Option<&str>) -> Result<ScanOutcome, WatchError> {
        self.authorize(password)?;
        let outcome = self.scan()?;
        self.store.save(&outcome.snapshot)?;
        Ok(outcome)
    }

    fn run(&self, request: &RunRequest, act: bool) -> Result<RunReport, WatchError> {
        self.authorize(request.password.as_deref())?;
        let outcome = self.scan()?;
        let baseline = self.store.load()?;

        let diff = DiffEngine::diff(&outcome.snapshot, &baseline);
        let fingerprint = diff.fingerprint(self.config.hash_algorithm);
        tracing::info!("Overall fingerprint is: {fingerprint}");

        let decision =
            AlertDecider::evaluate(&diff, &fingerprint, request.expected_fingerprint.as_deref());

        let alert = if act {
            let persist_to = (self.config.overwrite_baseline && request.update_baseline)
                .then_some(&self.store);
            self.decider
                .handle(decision, &diff, &fingerprint, &outcome.snapshot, persist_to)?
        } else {
            AlertOutcome {
                decision,
                ..Default::default()
            }
        };

        Ok(RunReport::new(
            outcome.stats,
            outcome.duration,
            diff,
            fingerprint,
            alert,
        ))
    }

    fn authorize(&self, password: Option<&str>) -> Result<(), WatchError> {
        tracing::info!("Checking password...");
        self.config.authorize(password).inspect_err(|e| {
            tracing::error!("Authorization failed: {e}");
        })?;
        Ok(())
    }

    fn scan(&self) -> Result<ScanOutcome, WatchError> {
        tracing::info!("Checking files...");
        let outcome = self.scanner.scan(&self.config)?;
        tracing::info!(
            files = outcome.stats.files_hashed,
            elapsed_ms = outcome.duration.as_millis() as u64,
            "Snapshot complete"
        );
        Ok(outcome)
    }
}
