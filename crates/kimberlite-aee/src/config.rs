//! Configuration for the exchange engine: the recognized options from the
//! protocol spec, loadable from an `[anti_entropy]` TOML table the way the
//! rest of this workspace loads nested config sections.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunable constants governing one exchange's timing and narrowing budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AeeConfig {
    /// Base inter-phase pause before jitter, in milliseconds.
    pub transition_pause_ms: u64,
    /// Deadline for the `fetch_root`/`fetch_branches` phases, in milliseconds.
    pub cache_timeout_ms: u64,
    /// Deadline for the `fetch_clocks` phase, in milliseconds.
    pub scan_timeout_ms: u64,
    /// Maximum `BranchId`s carried from `RootConfirm` into `BranchCompare`.
    pub max_branch_results: usize,
    /// Maximum `SegmentId`s carried from `BranchConfirm` into `ClockCompare`.
    pub max_clock_results: usize,
}

impl Default for AeeConfig {
    fn default() -> Self {
        Self {
            transition_pause_ms: 1_000,
            cache_timeout_ms: 60_000,
            scan_timeout_ms: 600_000,
            max_branch_results: 16,
            max_clock_results: 128,
        }
    }
}

impl AeeConfig {
    #[must_use]
    pub fn transition_pause(&self) -> Duration {
        Duration::from_millis(self.transition_pause_ms)
    }

    #[must_use]
    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    #[must_use]
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }

    /// Parses an `[anti_entropy]` TOML table, falling back to defaults for
    /// any field left unset.
    ///
    /// # Errors
    ///
    /// Returns a `toml::de::Error` if `raw` is not valid TOML for this shape.
    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_constants() {
        let cfg = AeeConfig::default();
        assert_eq!(cfg.transition_pause_ms, 1_000);
        assert_eq!(cfg.cache_timeout_ms, 60_000);
        assert_eq!(cfg.scan_timeout_ms, 600_000);
        assert_eq!(cfg.max_branch_results, 16);
        assert_eq!(cfg.max_clock_results, 128);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let cfg = AeeConfig::from_toml("scan_timeout_ms = 120000\n").unwrap();
        assert_eq!(cfg.scan_timeout_ms, 120_000);
        assert_eq!(cfg.transition_pause_ms, 1_000);
    }
}
