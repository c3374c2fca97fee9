//! Runtime settings read from the environment.
//!
//! The binary loads `.env` with `dotenvy` before reading them.

use std::env;
use std::str::FromStr;

use crate::chart::DEFAULT_BUCKETS;
use crate::convert::DEFAULT_PREVIEW_ROWS;
use crate::transform::clean::DEFAULT_FILL_VALUE;
use crate::transform::pipeline::DEFAULT_INSPECT_ROWS;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 50;

/// Settings shared by the CLI and the HTTP server.
#[derive(Debug, Clone, PartialEq)]
pub struct SweeperConfig {
    /// `SWEEPER_PORT`
    pub port: u16,
    /// `SWEEPER_MAX_UPLOAD_MB`
    pub max_upload_mb: usize,
    /// `SWEEPER_PREVIEW_ROWS`: rows shown when inspecting an upload.
    pub preview_rows: usize,
    /// `SWEEPER_EXPORT_ROWS`: rows kept by PDF and image exports.
    pub export_rows: usize,
    /// `SWEEPER_BUCKETS`
    pub buckets: usize,
    /// `SWEEPER_FILL_VALUE`
    pub fill_value: String,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            preview_rows: DEFAULT_INSPECT_ROWS,
            export_rows: DEFAULT_PREVIEW_ROWS,
            buckets: DEFAULT_BUCKETS,
            fill_value: DEFAULT_FILL_VALUE.to_string(),
        }
    }
}

impl SweeperConfig {
    /// Read `SWEEPER_*` variables from the process environment.
    /// Missing or malformed values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parsed(&lookup, "SWEEPER_PORT").unwrap_or(defaults.port),
            max_upload_mb: parsed(&lookup, "SWEEPER_MAX_UPLOAD_MB")
                .filter(|mb| *mb > 0)
                .unwrap_or(defaults.max_upload_mb),
            preview_rows: parsed(&lookup, "SWEEPER_PREVIEW_ROWS").unwrap_or(defaults.preview_rows),
            export_rows: parsed(&lookup, "SWEEPER_EXPORT_ROWS").unwrap_or(defaults.export_rows),
            buckets: parsed(&lookup, "SWEEPER_BUCKETS")
                .filter(|b| *b > 0)
                .unwrap_or(defaults.buckets),
            fill_value: lookup("SWEEPER_FILL_VALUE")
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.fill_value),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> SweeperConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SweeperConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg, SweeperConfig::default());
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.preview_rows, 5);
        assert_eq!(cfg.export_rows, 20);
        assert_eq!(cfg.fill_value, "N/A");
        assert_eq!(cfg.max_upload_bytes(), 50 * 1024 * 1024);
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("SWEEPER_PORT", "8080"),
            ("SWEEPER_EXPORT_ROWS", " 100 "),
            ("SWEEPER_FILL_VALUE", "-"),
        ]);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.export_rows, 100);
        assert_eq!(cfg.fill_value, "-");
    }

    #[test]
    fn test_from_env_reads_process_environment() {
        env::set_var("SWEEPER_FILL_VALUE", "missing");
        let config = SweeperConfig::from_env();
        env::remove_var("SWEEPER_FILL_VALUE");
        assert_eq!(config.fill_value, "missing");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let cfg = config(&[
            ("SWEEPER_PORT", "eighty"),
            ("SWEEPER_BUCKETS", "0"),
            ("SWEEPER_MAX_UPLOAD_MB", "-1"),
        ]);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.buckets, DEFAULT_BUCKETS);
        assert_eq!(cfg.max_upload_mb, DEFAULT_MAX_UPLOAD_MB);
    }
}
