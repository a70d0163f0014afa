// =============================================================================
// Runtime Configuration: Service settings with atomic save
// =============================================================================
//
// Settings for the HTTP surface around the signal engine. The indicator
// periods and rule thresholds are fixed constants of the engine and do not
// live here.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_history_limit() -> usize {
    100
}

fn default_max_demo_days() -> usize {
    1_000
}

fn default_demo_days() -> usize {
    120
}

fn default_demo_start_price() -> f64 {
    100.0
}

fn default_seed() -> u64 {
    42
}

fn default_max_batch_series() -> usize {
    32
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Address the REST API listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Number of most recent bars used by the market analysis snapshot.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    // --- Demo data ----------------------------------------------------------

    /// Upper bound on bars generated per demo request.
    #[serde(default = "default_max_demo_days")]
    pub max_demo_days: usize,

    /// Bars generated when a demo request does not say.
    #[serde(default = "default_demo_days")]
    pub demo_days: usize,

    #[serde(default = "default_demo_start_price")]
    pub demo_start_price: f64,

    /// Seed used when a demo request does not supply one.
    #[serde(default = "default_seed")]
    pub default_seed: u64,

    // --- Limits -------------------------------------------------------------

    /// Maximum number of series accepted by one batch analysis request.
    #[serde(default = "default_max_batch_series")]
    pub max_batch_series: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            history_limit: default_history_limit(),
            max_demo_days: default_max_demo_days(),
            demo_days: default_demo_days(),
            demo_start_price: default_demo_start_price(),
            default_seed: default_seed(),
            max_batch_series: default_max_batch_series(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("invalid runtime config in {}", path.display()))?;

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            history_limit = config.history_limit,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }

    /// Reject settings the API cannot work with.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.history_limit > 0, "history_limit must be positive");
        ensure!(self.max_demo_days > 0, "max_demo_days must be positive");
        ensure!(self.max_batch_series > 0, "max_batch_series must be positive");
        ensure!(
            self.demo_start_price.is_finite() && self.demo_start_price > 0.0,
            "demo_start_price must be a positive number"
        );
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.bind_addr, "0.0.0.0:3001");
        assert_eq!(cfg.history_limit, 100);
        assert_eq!(cfg.demo_days, 120);
        assert_eq!(cfg.default_seed, 42);
        assert!((cfg.demo_start_price - 100.0).abs() < f64::EPSILON);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.history_limit, 100);
        assert_eq!(cfg.max_batch_series, 32);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "bind_addr": "127.0.0.1:8080", "history_limit": 250 }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080");
        assert_eq!(cfg.history_limit, 250);
        assert_eq!(cfg.max_demo_days, 1_000);
    }

    #[test]
    fn zero_history_limit_is_invalid() {
        let cfg = RuntimeConfig {
            history_limit: 0,
            ..RuntimeConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("trendsignal-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("runtime_config.json");

        let cfg = RuntimeConfig {
            history_limit: 77,
            ..RuntimeConfig::default()
        };
        cfg.save(&path).unwrap();
        let loaded = RuntimeConfig::load(&path).unwrap();
        assert_eq!(loaded.history_limit, 77);
        assert!(!path.with_extension("json.tmp").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_missing_file_errors() {
        let err = RuntimeConfig::load("/nonexistent/trendsignal.json").unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
