//! Configuration management for the ticketer.
//!
//! Loads configuration from environment variables with sensible defaults.
//! A value that fails to parse falls back to its default.

use crate::payload::DEFAULT_BASE_URL;
use crate::validation::{FormRules, ROLL_NUMBER_MAX, ROLL_NUMBER_MIN};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default name of the downloaded image
pub const DEFAULT_DOWNLOAD_FILE: &str = "qr_code.png";

/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "ticketer=info,ticketer_runtime=info";

/// Which completion wins when generate requests overlap
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionPolicy {
    /// Only the result of the most recently issued request is shown
    #[default]
    LatestRequest,
    /// Every result is shown as it arrives; the last to finish stays
    LastCompletion,
}

impl fmt::Display for CompletionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LatestRequest => "latest-request",
            Self::LastCompletion => "last-completion",
        })
    }
}

impl FromStr for CompletionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest-request" => Ok(Self::LatestRequest),
            "last-completion" => Ok(Self::LastCompletion),
            other => Err(format!("unknown completion policy: {other}")),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Form behaviour
    pub form: FormSettings,
    /// Image rendering
    pub qr: QrConfig,
    /// Terminal front end
    pub cli: CliConfig,
}

/// Everything the form reducer needs to know
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSettings {
    /// Validation rules
    pub rules: FormRules,
    /// Prefix of every ticket link
    pub base_url: String,
    /// Name the downloaded image is saved under
    pub download_file_name: String,
    /// How overlapping generate requests resolve
    pub completion_policy: CompletionPolicy,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            rules: FormRules::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            download_file_name: DEFAULT_DOWNLOAD_FILE.to_string(),
            completion_policy: CompletionPolicy::default(),
        }
    }
}

/// QR rendering configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrConfig {
    /// Pixels per module edge
    pub scale: u32,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self { scale: 4 }
    }
}

/// Terminal front end configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Directory downloads are written to
    pub download_dir: PathBuf,
    /// How long to wait for the code to render, in seconds
    pub encode_timeout: u64,
    /// `tracing` filter directives, e.g. `ticketer=debug`
    pub log_level: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("."),
            encode_timeout: 10,
            log_level: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl CliConfig {
    /// [`CliConfig::encode_timeout`] as a duration
    #[must_use]
    pub const fn encode_timeout(&self) -> Duration {
        Duration::from_secs(self.encode_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Reads a `.env` file first if one is present.
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns the raw value of a key.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut roll_min: i64 = parsed(&lookup, "TICKETER_ROLL_MIN").unwrap_or(ROLL_NUMBER_MIN);
        let mut roll_max: i64 = parsed(&lookup, "TICKETER_ROLL_MAX").unwrap_or(ROLL_NUMBER_MAX);
        if roll_min > roll_max {
            tracing::warn!(
                roll_min,
                roll_max,
                "Roll number range is empty, using the default range"
            );
            roll_min = ROLL_NUMBER_MIN;
            roll_max = ROLL_NUMBER_MAX;
        }

        Self {
            form: FormSettings {
                rules: FormRules {
                    roll_numbers: roll_min..=roll_max,
                    trim_required: parsed(&lookup, "TICKETER_TRIM_REQUIRED").unwrap_or(false),
                    restrict_gender: parsed(&lookup, "TICKETER_RESTRICT_GENDER").unwrap_or(false),
                },
                base_url: lookup("TICKETER_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                download_file_name: lookup("TICKETER_DOWNLOAD_FILE")
                    .unwrap_or_else(|| DEFAULT_DOWNLOAD_FILE.to_string()),
                completion_policy: parsed(&lookup, "TICKETER_COMPLETION_POLICY").unwrap_or_default(),
            },
            qr: QrConfig {
                scale: parsed(&lookup, "TICKETER_QR_SCALE")
                    .filter(|scale: &u32| *scale > 0)
                    .unwrap_or(4),
            },
            cli: CliConfig {
                download_dir: lookup("TICKETER_DOWNLOAD_DIR")
                    .map_or_else(|| PathBuf::from("."), PathBuf::from),
                encode_timeout: parsed(&lookup, "TICKETER_ENCODE_TIMEOUT_SECS").unwrap_or(10),
                log_level: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            },
        }
    }
}

/// Parse the value of `key`, or `None` if it is unset or malformed
fn parsed<T: FromStr>(lookup: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse().ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_published_form() {
        let config = Config::default();
        assert_eq!(config.form.rules, FormRules::default());
        assert!(!config.form.rules.restrict_gender);
        assert_eq!(config.form.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.form.download_file_name, "qr_code.png");
        assert_eq!(config.form.completion_policy, CompletionPolicy::LatestRequest);
        assert_eq!(config.qr.scale, 4);
        assert_eq!(config.cli.encode_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn values_are_read_from_lookup() {
        let config = Config::from_lookup(lookup_from(&[
            ("TICKETER_ROLL_MIN", "1"),
            ("TICKETER_ROLL_MAX", "99"),
            ("TICKETER_TRIM_REQUIRED", "true"),
            ("TICKETER_RESTRICT_GENDER", "true"),
            ("TICKETER_COMPLETION_POLICY", "last-completion"),
            ("TICKETER_BASE_URL", "https://tickets.example/t"),
            ("TICKETER_DOWNLOAD_FILE", "ticket.png"),
            ("TICKETER_DOWNLOAD_DIR", "/tmp/tickets"),
            ("TICKETER_QR_SCALE", "8"),
            ("TICKETER_ENCODE_TIMEOUT_SECS", "3"),
        ]));

        assert_eq!(config.form.rules.roll_numbers, 1..=99);
        assert!(config.form.rules.trim_required);
        assert!(config.form.rules.restrict_gender);
        assert_eq!(config.form.completion_policy, CompletionPolicy::LastCompletion);
        assert_eq!(config.form.base_url, "https://tickets.example/t");
        assert_eq!(config.form.download_file_name, "ticket.png");
        assert_eq!(config.cli.download_dir, PathBuf::from("/tmp/tickets"));
        assert_eq!(config.qr.scale, 8);
        assert_eq!(config.cli.encode_timeout, 3);
    }

    #[test]
    fn unparseable_values_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("TICKETER_ROLL_MIN", "lots"),
            ("TICKETER_QR_SCALE", "0"),
            ("TICKETER_COMPLETION_POLICY", "whenever"),
        ]));
        assert_eq!(config.form.rules.roll_numbers, ROLL_NUMBER_MIN..=ROLL_NUMBER_MAX);
        assert_eq!(config.qr.scale, 4);
        assert_eq!(config.form.completion_policy, CompletionPolicy::LatestRequest);
    }

    #[test]
    fn inverted_range_falls_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("TICKETER_ROLL_MIN", "50"),
            ("TICKETER_ROLL_MAX", "10"),
        ]));
        assert_eq!(config.form.rules.roll_numbers, ROLL_NUMBER_MIN..=ROLL_NUMBER_MAX);
    }

    #[test]
    fn completion_policy_round_trips_through_text() {
        for policy in [CompletionPolicy::LatestRequest, CompletionPolicy::LastCompletion] {
            assert_eq!(policy.to_string().parse::<CompletionPolicy>(), Ok(policy));
        }
    }
}
