//! Harness configuration stored in `tabletest.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::session::{DEFAULT_TIMEOUT_MS, Session};

/// Harness configuration (TOML).
///
/// Intended to be edited by humans; missing fields default to sensible
/// values and a missing file means defaults throughout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HarnessConfig {
    /// Inter-command delay in milliseconds. Negative pauses before every
    /// command (single-step mode).
    pub speed_ms: i64,

    /// Wait deadline in milliseconds for `…AndWait` and `waitFor*`
    /// conditions.
    pub timeout_ms: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            speed_ms: 0,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(anyhow!("timeout_ms must be > 0"));
        }
        Ok(())
    }

    /// Build a fresh session configured from this file.
    pub fn session(&self) -> Session {
        let mut session = Session::new();
        session.set_speed_ms(self.speed_ms);
        session.set_timeout(Duration::from_millis(self.timeout_ms));
        session
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `HarnessConfig::default()`.
pub fn load_config(path: &Path) -> Result<HarnessConfig> {
    if !path.exists() {
        let cfg = HarnessConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: HarnessConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &HarnessConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    // A bare filename has an empty parent; nothing to create then.
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, buf).with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, HarnessConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("tabletest.toml");
        let cfg = HarnessConfig {
            speed_ms: 250,
            timeout_ms: 5_000,
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cfg = HarnessConfig {
            speed_ms: 0,
            timeout_ms: 0,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn session_reflects_config() {
        let cfg = HarnessConfig {
            speed_ms: -1,
            timeout_ms: 1_000,
        };
        let session = cfg.session();
        assert_eq!(session.speed_ms(), -1);
        assert_eq!(session.timeout(), Duration::from_millis(1_000));
    }
}
