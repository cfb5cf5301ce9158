//! Monitor configuration types.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, ConfigError};
use crate::filter::{ExclusionMode, PathFilter};
use crate::hash::HashAlgorithm;

/// Name of the config file inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default subject line for alert mails.
pub const DEFAULT_SUBJECT: &str = "ALERT: File hashes on your server have changed";

/// Configuration for a monitoring run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Access secret. When set, callers must supply the same value.
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub password: Option<String>,

    /// Roots to walk.
    pub include_paths: Vec<PathBuf>,

    /// Folder prefixes to skip.
    #[builder(default)]
    #[serde(default)]
    pub exclude_folders: Vec<String>,

    /// File extensions to skip (case-insensitive, no leading dot).
    #[builder(default)]
    #[serde(default)]
    pub exclude_extensions: Vec<String>,

    /// How exclude folders are matched.
    #[builder(default)]
    #[serde(default)]
    pub exclusion_mode: ExclusionMode,

    /// Where the baseline is stored.
    #[builder(default = "default_baseline_file()")]
    #[serde(default = "default_baseline_file")]
    pub baseline_file: PathBuf,

    /// Log file to append to (stderr when unset).
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Default log filter, overridden by `RUST_LOG`.
    #[builder(default = "default_log_level()")]
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Replace the baseline with the current snapshot after an alert.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub overwrite_baseline: bool,

    /// Digest used for file hashes and the fingerprint.
    #[builder(default)]
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,

    /// Follow symbolic links while walking.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Number of hashing threads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Alert delivery settings.
    #[builder(default)]
    #[serde(default)]
    pub alert: AlertConfig,
}

fn default_true() -> bool {
    true
}

fn default_baseline_file() -> PathBuf {
    PathBuf::from("hashwatch.baseline")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl WatchConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.include_paths {
            Some(ref paths) if !paths.is_empty() => Ok(()),
            _ => Err("At least one include path is required".to_string()),
        }
    }
}

impl WatchConfig {
    /// Create a new config builder.
    pub fn builder() -> WatchConfigBuilder {
        WatchConfigBuilder::default()
    }

    /// Create a simple config watching a single root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            password: None,
            include_paths: vec![root.into()],
            exclude_folders: Vec::new(),
            exclude_extensions: Vec::new(),
            exclusion_mode: ExclusionMode::default(),
            baseline_file: default_baseline_file(),
            log_file: None,
            log_level: default_log_level(),
            overwrite_baseline: true,
            hash_algorithm: HashAlgorithm::default(),
            follow_symlinks: false,
            threads: 0,
            alert: AlertConfig::default(),
        }
    }

    /// Default config location, `<config dir>/hashwatch/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("hashwatch").join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoDefaultLocation)
    }

    /// Load and validate a TOML config file.
    ///
    /// Relative include paths, baseline and log file are resolved against
    /// the directory containing the config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;

        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            config.resolve_relative_to(base);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse config from a TOML string without validating it.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Make relative paths absolute against `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        for include in &mut self.include_paths {
            if include.is_relative() {
                *include = base.join(&*include);
            }
        }
        if self.baseline_file.is_relative() {
            self.baseline_file = base.join(&self.baseline_file);
        }
        if let Some(log_file) = self.log_file.as_mut().filter(|p| p.is_relative()) {
            *log_file = base.join(&*log_file);
        }
    }

    /// Check the config is usable before any scanning starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.include_paths.is_empty() {
            return Err(ConfigError::invalid("include_paths must not be empty"));
        }
        if self.baseline_file.as_os_str().is_empty() {
            return Err(ConfigError::invalid("baseline_file must not be empty"));
        }
        self.alert.validate()
    }

    /// Build the path filter described by this config.
    pub fn path_filter(&self) -> PathFilter {
        PathFilter::new(
            &self.exclude_folders,
            &self.exclude_extensions,
            self.exclusion_mode,
        )
    }

    /// Check a caller-supplied password against the configured one.
    ///
    /// An unset or empty configured password allows every caller.
    pub fn authorize(&self, provided: Option<&str>) -> Result<(), AuthError> {
        let expected = match self.password.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => return Ok(()),
        };
        let provided = provided.ok_or(AuthError::Missing)?;
        if constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
            Ok(())
        } else {
            Err(AuthError::Mismatch)
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Which sinks receive an alert.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AlertChannel {
    /// Log file only.
    LogOnly,
    /// Log file and console output.
    #[default]
    Console,
    /// Log, console and mail through the local sendmail binary.
    EmailDirect,
    /// Log, console and mail through an authenticated SMTP server.
    EmailSmtp,
}

impl AlertChannel {
    /// Whether this channel sends mail.
    pub fn is_email(self) -> bool {
        matches!(self, AlertChannel::EmailDirect | AlertChannel::EmailSmtp)
    }
}

/// Alert delivery configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertConfig {
    /// Selected channel.
    #[serde(default)]
    pub channel: AlertChannel,

    /// Recipient address for email channels.
    #[serde(default)]
    pub to: Option<String>,

    /// Sender address; the SMTP username or `hashwatch@localhost` if unset.
    #[serde(default)]
    pub from: Option<String>,

    /// Mail subject.
    #[serde(default = "default_subject")]
    pub subject: String,

    /// SMTP server settings for [`AlertChannel::EmailSmtp`].
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

fn default_subject() -> String {
    DEFAULT_SUBJECT.to_string()
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            channel: AlertChannel::default(),
            to: None,
            from: None,
            subject: default_subject(),
            smtp: None,
        }
    }
}

impl AlertConfig {
    /// Check the channel has everything it needs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel.is_email() && self.to.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::invalid(format!(
                "alert.to is required for channel '{}'",
                self.channel
            )));
        }
        if self.channel == AlertChannel::EmailSmtp {
            match &self.smtp {
                Some(smtp) if !smtp.server.is_empty() => {
                    // Half a credential pair would silently disable auth.
                    if smtp.username.is_some() != smtp.password.is_some() {
                        return Err(ConfigError::invalid(
                            "alert.smtp.username and alert.smtp.password must be set together",
                        ));
                    }
                }
                _ => {
                    return Err(ConfigError::invalid(
                        "[alert.smtp] with a server is required for channel 'email-smtp'",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Sender address used for outgoing mail.
    pub fn sender(&self) -> String {
        self.from
            .clone()
            .or_else(|| {
                self.smtp
                    .as_ref()
                    .and_then(|s| s.username.clone())
                    .filter(|u| u.contains('@'))
            })
            .unwrap_or_else(|| "hashwatch@localhost".to_string())
    }
}

/// SMTP submission settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmtpConfig {
    /// Server host name or address.
    pub server: String,

    /// Server port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Login user.
    #[serde(default)]
    pub username: Option<String>,

    /// Login password.
    #[serde(default)]
    pub password: Option<String>,
}

fn default_smtp_port() -> u16 {
    25
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self::new("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = WatchConfig::builder()
            .include_paths(vec![PathBuf::from("/var/www")])
            .exclude_folders(vec!["/var/www/cache".to_string()])
            .password("secret")
            .threads(4usize)
            .build()
            .unwrap();

        assert_eq!(config.include_paths, vec![PathBuf::from("/var/www")]);
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert_eq!(config.threads, 4);
        assert!(config.overwrite_baseline);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha1);
    }

    #[test]
    fn test_builder_requires_include_paths() {
        assert!(WatchConfig::builder().build().is_err());
        assert!(WatchConfig::builder().include_paths(Vec::<PathBuf>::new()).build().is_err());
    }

    #[test]
    fn test_authorize() {
        let mut config = WatchConfig::new("/tmp");
        assert_eq!(config.authorize(None), Ok(()));

        config.password = Some("secretPassword".to_string());
        assert_eq!(config.authorize(Some("secretPassword")), Ok(()));
        assert_eq!(config.authorize(Some("secret")), Err(AuthError::Mismatch));
        assert_eq!(config.authorize(None), Err(AuthError::Missing));

        config.password = Some(String::new());
        assert_eq!(config.authorize(None), Ok(()));
    }

    #[test]
    fn test_from_toml_defaults() {
        let config = WatchConfig::from_toml(r#"include_paths = ["/tmp"]"#).unwrap();

        assert_eq!(config.baseline_file, PathBuf::from("hashwatch.baseline"));
        assert_eq!(config.alert.channel, AlertChannel::Console);
        assert_eq!(config.alert.subject, DEFAULT_SUBJECT);
        assert_eq!(config.exclusion_mode, ExclusionMode::Prefix);
        assert!(config.overwrite_baseline);
    }

    #[test]
    fn test_unknown_channel_rejected() {
        let err = WatchConfig::from_toml(
            r#"
            include_paths = ["/tmp"]
            [alert]
            channel = "carrier-pigeon"
            "#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_smtp_channel_requires_server() {
        let config = WatchConfig::from_toml(
            r#"
            include_paths = ["/tmp"]
            [alert]
            channel = "email-smtp"
            to = "alerts@example.com"
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_smtp_credentials_set_together() {
        let source = |credentials: &str| {
            format!(
                r#"
                include_paths = ["/tmp"]
                [alert]
                channel = "email-smtp"
                to = "alerts@example.com"
                [alert.smtp]
                server = "mail.example.com"
                {credentials}
                "#
            )
        };

        let user_only = WatchConfig::from_toml(&source(r#"username = "watch@example.com""#)).unwrap();
        assert!(matches!(user_only.validate(), Err(ConfigError::Invalid { .. })));

        let pass_only = WatchConfig::from_toml(&source(r#"password = "hunter2""#)).unwrap();
        assert!(matches!(pass_only.validate(), Err(ConfigError::Invalid { .. })));

        let both = WatchConfig::from_toml(&source(
            "username = \"watch@example.com\"\npassword = \"hunter2\"",
        ))
        .unwrap();
        assert!(both.validate().is_ok());

        assert!(WatchConfig::from_toml(&source("")).unwrap().validate().is_ok());
    }

    #[test]
    fn test_email_channel_requires_recipient() {
        let mut config = WatchConfig::new("/tmp");
        config.alert.channel = AlertChannel::EmailDirect;
        assert!(config.validate().is_err());

        config.alert.to = Some("alerts@example.com".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_relative_paths() {
        let mut config = WatchConfig::new("site");
        config.include_paths.push(PathBuf::from("/abs"));
        config.log_file = Some(PathBuf::from("watch.log"));
        config.resolve_relative_to(Path::new("/etc/hashwatch"));

        assert_eq!(
            config.include_paths,
            vec![PathBuf::from("/etc/hashwatch/site"), PathBuf::from("/abs")]
        );
        assert_eq!(config.baseline_file, PathBuf::from("/etc/hashwatch/hashwatch.baseline"));
        assert_eq!(config.log_file, Some(PathBuf::from("/etc/hashwatch/watch.log")));
    }

    #[test]
    fn test_sender_fallbacks() {
        let mut alert = AlertConfig::default();
        assert_eq!(alert.sender(), "hashwatch@localhost");

        alert.smtp = Some(SmtpConfig {
            server: "mail".to_string(),
            port: 25,
            username: Some("ops@example.com".to_string()),
            password: None,
        });
        assert_eq!(alert.sender(), "ops@example.com");

        alert.from = Some("fim@example.com".to_string());
        assert_eq!(alert.sender(), "fim@example.com");
    }
}
