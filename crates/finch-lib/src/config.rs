//! Connection tuning: TOML-based, platform-aware path.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::connection::ConnectionConfig;
use crate::protocol::{KEEPALIVE_TICK, PING_THRESHOLD, READ_TIMEOUT, REPLY_DEADLINE};
use crate::retry::RetryConfig;

/// Header comment prepended to saved config files.
const CONFIG_HEADER: &str =
    "# Finch connection settings. Edits made while a robot is connected apply on the next open.\n\n";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Idle time before the keep-alive pings the robot.
    #[serde(default = "default_ping_threshold_ms")]
    pub ping_threshold_ms: u64,

    /// Keep-alive wake-up interval.
    #[serde(default = "default_keepalive_tick_ms")]
    pub keepalive_tick_ms: u64,

    /// Timeout of one HID read.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Overall wait for a matching reply.
    #[serde(default = "default_reply_deadline_ms")]
    pub reply_deadline_ms: u64,

    /// Write attempts before giving up (including the first).
    #[serde(default = "default_write_attempts")]
    pub write_attempts: u32,

    /// Delay after the first rejected write; doubles up to `write_backoff_max_ms`.
    #[serde(default = "default_write_backoff_ms")]
    pub write_backoff_ms: u64,

    #[serde(default = "default_write_backoff_max_ms")]
    pub write_backoff_max_ms: u64,

    /// Close the connection when a keep-alive ping fails.
    #[serde(default = "default_true")]
    pub close_on_keepalive_failure: bool,
}

fn default_ping_threshold_ms() -> u64 {
    PING_THRESHOLD.as_millis() as u64
}
fn default_keepalive_tick_ms() -> u64 {
    KEEPALIVE_TICK.as_millis() as u64
}
fn default_read_timeout_ms() -> u64 {
    READ_TIMEOUT.as_millis() as u64
}
fn default_reply_deadline_ms() -> u64 {
    REPLY_DEADLINE.as_millis() as u64
}
fn default_write_attempts() -> u32 {
    RetryConfig::default().max_attempts
}
fn default_write_backoff_ms() -> u64 {
    RetryConfig::default().initial_delay.as_millis() as u64
}
fn default_write_backoff_max_ms() -> u64 {
    RetryConfig::default().max_delay.as_millis() as u64
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ping_threshold_ms: default_ping_threshold_ms(),
            keepalive_tick_ms: default_keepalive_tick_ms(),
            read_timeout_ms: default_read_timeout_ms(),
            reply_deadline_ms: default_reply_deadline_ms(),
            write_attempts: default_write_attempts(),
            write_backoff_ms: default_write_backoff_ms(),
            write_backoff_max_ms: default_write_backoff_max_ms(),
            close_on_keepalive_failure: true,
        }
    }
}

/// Problems [`Config::validate`] can report.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A duration field is zero.
    ZeroDuration(&'static str),
    /// `write_attempts` is zero.
    NoWriteAttempts,
    /// The keep-alive would tick less often than it needs to ping.
    TickExceedsThreshold { tick_ms: u64, threshold_ms: u64 },
    /// A single read may outlast the whole reply deadline.
    ReadExceedsDeadline { read_ms: u64, deadline_ms: u64 },
    /// The initial write backoff is above its cap.
    BackoffAboveMax { initial_ms: u64, max_ms: u64 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ZeroDuration(field) => write!(f, "{field} must be greater than 0"),
            ValidationError::NoWriteAttempts => write!(f, "write_attempts must be at least 1"),
            ValidationError::TickExceedsThreshold {
                tick_ms,
                threshold_ms,
            } => write!(
                f,
                "keepalive_tick_ms ({tick_ms}) exceeds ping_threshold_ms ({threshold_ms})"
            ),
            ValidationError::ReadExceedsDeadline {
                read_ms,
                deadline_ms,
            } => write!(
                f,
                "read_timeout_ms ({read_ms}) exceeds reply_deadline_ms ({deadline_ms})"
            ),
            ValidationError::BackoffAboveMax { initial_ms, max_ms } => write!(
                f,
                "write_backoff_ms ({initial_ms}) exceeds write_backoff_max_ms ({max_ms})"
            ),
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("finch"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Load config from disk, or return defaults if not found.
    pub fn load() -> Self {
        let (config, warnings) = Self::load_with_warnings();
        for w in &warnings {
            log::warn!("{w}");
        }
        config
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Load config from an arbitrary path.
    ///
    /// Missing file: defaults, no warnings. Unparseable file: defaults and one warning.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Save atomically (temp file, then rename), with a header comment.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let serialized = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = format!("{CONFIG_HEADER}{serialized}");
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &contents)?;
        match std::fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(_) => {
                // Rename can fail across filesystems
                let result = std::fs::write(path, &contents);
                let _ = std::fs::remove_file(&tmp);
                result
            }
        }
    }

    /// Check every field, collecting all problems.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (field, value) in [
            ("ping_threshold_ms", self.ping_threshold_ms),
            ("keepalive_tick_ms", self.keepalive_tick_ms),
            ("read_timeout_ms", self.read_timeout_ms),
            ("reply_deadline_ms", self.reply_deadline_ms),
        ] {
            if value == 0 {
                errors.push(ValidationError::ZeroDuration(field));
            }
        }
        if self.write_attempts == 0 {
            errors.push(ValidationError::NoWriteAttempts);
        }
        if self.keepalive_tick_ms > self.ping_threshold_ms {
            errors.push(ValidationError::TickExceedsThreshold {
                tick_ms: self.keepalive_tick_ms,
                threshold_ms: self.ping_threshold_ms,
            });
        }
        if self.read_timeout_ms > self.reply_deadline_ms {
            errors.push(ValidationError::ReadExceedsDeadline {
                read_ms: self.read_timeout_ms,
                deadline_ms: self.reply_deadline_ms,
            });
        }
        if self.write_backoff_ms > self.write_backoff_max_ms {
            errors.push(ValidationError::BackoffAboveMax {
                initial_ms: self.write_backoff_ms,
                max_ms: self.write_backoff_max_ms,
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, then convert. All problems are joined into one error.
    pub fn try_connection_config(&self) -> crate::error::Result<ConnectionConfig> {
        self.validate().map_err(|errors| {
            let joined: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            crate::FinchError::Config(joined.join("; "))
        })?;
        Ok(self.connection_config())
    }

    /// Runtime connection parameters.
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            ping_threshold: Duration::from_millis(self.ping_threshold_ms),
            keepalive_tick: Duration::from_millis(self.keepalive_tick_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            reply_deadline: Duration::from_millis(self.reply_deadline_ms),
            retry: RetryConfig {
                max_attempts: self.write_attempts,
                initial_delay: Duration::from_millis(self.write_backoff_ms),
                max_delay: Duration::from_millis(self.write_backoff_max_ms),
                ..RetryConfig::default()
            },
            close_on_keepalive_failure: self.close_on_keepalive_failure,
        }
    }
}
