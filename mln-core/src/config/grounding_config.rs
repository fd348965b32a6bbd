//! Builder configuration flags.

use serde::{Deserialize, Serialize};

/// Flags accepted by `GroundingBuilder`.
///
/// `#[serde(default)]` so a partial TOML document only needs to name the
/// flags it wants to override.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundingConfig {
    /// Rewrite negative-weight clauses into positive-weight unit clauses
    /// over negated atoms.
    pub no_neg_weights: bool,
    /// For a negated unit clause, emit a positive-weight constraint over
    /// the negated atom instead of carrying the negative weight forward.
    pub eliminate_negated_unit: bool,
    /// Accumulate a clause-origin -> frequency map per ground constraint.
    pub create_dependency_map: bool,
    /// Multiplier on `cpu_count` used to derive `N_shards`. Values <= 1.0
    /// have no effect: `N_shards = max(ratio * cpu_count, cpu_count)`, so
    /// the shard count never drops below `cpu_count`.
    pub parallelism_ratio: f64,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            no_neg_weights: false,
            eliminate_negated_unit: false,
            create_dependency_map: false,
            parallelism_ratio: 1.0,
        }
    }
}

impl GroundingConfig {
    /// Parse from a TOML document, falling back to defaults for any field
    /// the document omits.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// `N_shards`, derived from the host's available parallelism. Always
    /// at least 1 even on a single-core host.
    pub fn effective_shard_count(&self) -> usize {
        let cpu_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let scaled = (self.parallelism_ratio * cpu_count as f64).ceil() as usize;
        scaled.max(cpu_count).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ratio_does_not_shrink_shard_count() {
        let cfg = GroundingConfig::default();
        let cpu_count = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        assert_eq!(cfg.effective_shard_count(), cpu_count);
    }

    #[test]
    fn ratio_above_one_scales_up() {
        let cfg = GroundingConfig {
            parallelism_ratio: 4.0,
            ..Default::default()
        };
        let cpu_count = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        assert_eq!(cfg.effective_shard_count(), (4.0 * cpu_count as f64).ceil() as usize);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg = GroundingConfig::from_toml("no_neg_weights = true\n").unwrap();
        assert!(cfg.no_neg_weights);
        assert!(!cfg.create_dependency_map);
        assert_eq!(cfg.parallelism_ratio, 1.0);
    }
}
