/// Configuration schema and defaults for busdash.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[general]`, `[timing]`, `[jitter]`, and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level busdash configuration.
///
/// Maps directly to the `~/.busdash/config.toml` and `.busdash.toml` file
/// schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusdashConfig {
    pub general: GeneralConfig,
    pub timing: TimingConfig,
    pub jitter: JitterConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [general]
// ---------------------------------------------------------------------------

/// Presentation pace presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pace {
    /// Staged transitions with the demo delays (default).
    #[default]
    Demo,
    /// Every presentation delay collapsed to zero. The refresh period is kept.
    Instant,
}

impl std::fmt::Display for Pace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Demo => write!(f, "demo"),
            Self::Instant => write!(f, "instant"),
        }
    }
}

/// General busdash settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Presentation pace: `demo` or `instant`.
    pub pace: Pace,
}

// ---------------------------------------------------------------------------
// [timing]
// ---------------------------------------------------------------------------

/// Delays and periods used by the dashboard controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay between an accepted login and the main view appearing.
    pub login_delay_ms: u64,
    /// Delay before a requested section becomes active.
    pub navigation_delay_ms: u64,
    /// Period of the metric refresh loop.
    pub refresh_interval_secs: u64,
    /// Lifetime of a transient notification.
    pub notification_ttl_ms: u64,
    /// How long the approval control stays in its approved state.
    pub approval_reset_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            login_delay_ms: 1000,
            navigation_delay_ms: 300,
            refresh_interval_secs: 30,
            notification_ttl_ms: 3000,
            approval_reset_ms: 3000,
        }
    }
}

// ---------------------------------------------------------------------------
// [jitter]
// ---------------------------------------------------------------------------

/// Random jitter settings for the metric refresh loop.
///
/// Each scale multiplies a uniform sample in `[-0.05, 0.05]`. The resulting
/// offset is always clamped to 5% of the field's baseline, so scales only
/// shape how visible the jitter is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitterConfig {
    /// Fixed RNG seed. Unset means a fresh entropy seed per run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub performance_scale: f64,
    pub active_buses_scale: f64,
    pub passengers_scale: f64,
    pub savings_scale: f64,
    pub accuracy_scale: f64,
    pub uptime_scale: f64,
}

impl Default for JitterConfig {
    fn default() -> Self {
        Self {
            seed: None,
            performance_scale: 1.0,
            active_buses_scale: 2.0,
            passengers_scale: 100.0,
            savings_scale: 1000.0,
            accuracy_scale: 1.0,
            uptime_scale: 0.1,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Activity log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether session activity is appended to `~/.busdash/activity.jsonl`.
    pub enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// Pace application
// ---------------------------------------------------------------------------

impl BusdashConfig {
    /// Apply the pace preset's overrides to this config.
    ///
    /// Runs after all layers are merged, so an `instant` pace wins over any
    /// delay set in a file.
    pub fn apply_pace(&mut self) {
        match self.general.pace {
            Pace::Demo => {}
            Pace::Instant => {
                self.timing.login_delay_ms = 0;
                self.timing.navigation_delay_ms = 0;
            }
        }
    }

    /// Defaults with the `instant` pace applied and a fixed seed.
    ///
    /// Handy for scripted runs where every transition should commit
    /// synchronously and jitter should be reproducible.
    pub fn instant(seed: u64) -> Self {
        let mut config = Self::default();
        config.general.pace = Pace::Instant;
        config.jitter.seed = Some(seed);
        config.logging.enabled = false;
        config.apply_pace();
        config
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl BusdashConfig {
    /// Generate the annotated default TOML config file content.
    ///
    /// Used by `busdash config init`.
    pub fn default_toml() -> String {
        r#"# busdash Configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (BUSDASH_*)
#   2. Project config (.busdash.toml in current directory)
#   3. User global config (~/.busdash/config.toml)
#   4. Built-in defaults

[general]
pace = "demo"                 # demo | instant

[timing]
login_delay_ms = 1000
navigation_delay_ms = 300
refresh_interval_secs = 30
notification_ttl_ms = 3000
approval_reset_ms = 3000

[jitter]
# seed = 42                   # Fix the RNG for reproducible runs
performance_scale = 1.0
active_buses_scale = 2.0
passengers_scale = 100.0
savings_scale = 1000.0
accuracy_scale = 1.0
uptime_scale = 0.1

[logging]
enabled = true                # ~/.busdash/activity.jsonl
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = BusdashConfig::default();
        assert_eq!(config.general.pace, Pace::Demo);
        assert_eq!(config.timing.login_delay_ms, 1000);
        assert_eq!(config.timing.navigation_delay_ms, 300);
        assert_eq!(config.timing.refresh_interval_secs, 30);
        assert_eq!(config.timing.notification_ttl_ms, 3000);
        assert_eq!(config.jitter.seed, None);
        assert!(config.logging.enabled);
    }

    #[test]
    fn deserialize_minimal_toml() {
        let toml_str = r#"
[timing]
refresh_interval_secs = 10
"#;
        let config: BusdashConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.timing.refresh_interval_secs, 10);
        assert_eq!(config.timing.login_delay_ms, 1000);
        assert_eq!(config.jitter.passengers_scale, 100.0);
    }

    #[test]
    fn deserialize_seed_and_pace() {
        let toml_str = r#"
[general]
pace = "instant"

[jitter]
seed = 7
"#;
        let config: BusdashConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.pace, Pace::Instant);
        assert_eq!(config.jitter.seed, Some(7));
    }

    #[test]
    fn empty_toml_produces_defaults() {
        let config: BusdashConfig = toml::from_str("").unwrap();
        assert_eq!(config, BusdashConfig::default());
    }

    #[test]
    fn instant_pace_zeroes_presentation_delays() {
        let mut config = BusdashConfig::default();
        config.general.pace = Pace::Instant;
        config.apply_pace();
        assert_eq!(config.timing.login_delay_ms, 0);
        assert_eq!(config.timing.navigation_delay_ms, 0);
        assert_eq!(config.timing.refresh_interval_secs, 30);
        assert_eq!(config.timing.notification_ttl_ms, 3000);
    }

    #[test]
    fn demo_pace_is_noop() {
        let mut config = BusdashConfig::default();
        let before = config.clone();
        config.apply_pace();
        assert_eq!(config, before);
    }

    #[test]
    fn default_toml_parses_back() {
        let config: BusdashConfig = toml::from_str(&BusdashConfig::default_toml()).unwrap();
        assert_eq!(config, BusdashConfig::default());
    }

    #[test]
    fn pace_display() {
        assert_eq!(Pace::Demo.to_string(), "demo");
        assert_eq!(Pace::Instant.to_string(), "instant");
    }
}
