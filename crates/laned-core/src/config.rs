use serde::{Deserialize, Serialize};

use crate::error::LanedError;

/// Which shipped `SelectionStrategy` a `LanedConfig` should resolve to. Kept
/// separate from `Arc<dyn SelectionStrategy>` itself so configuration stays
/// plain data — the caller is responsible for turning a `StrategyKind` into
/// a concrete strategy instance (see `laned-strategy`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    RoundRobin,
    ThreadAffinity,
    LeastUsed,
}

impl Default for StrategyKind {
    fn default() -> Self {
        StrategyKind::RoundRobin
    }
}

/// Declarative configuration for a `LanedManager`, loadable from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanedConfig {
    /// Metrics and log tag for this manager's connection.
    pub connection_name: String,
    /// Number of lanes to open; validated against `[1, 64]` by `validate`.
    /// Defaults to the host's visible CPU count, clamped into range, when
    /// omitted from the source TOML.
    #[serde(default = "default_num_lanes")]
    pub num_lanes: usize,
    /// Lane-selection strategy to resolve at construction time.
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Prefix applied to every metric name this manager's sink emits.
    #[serde(default = "default_metric_prefix")]
    pub metric_prefix: String,
}

fn default_metric_prefix() -> String {
    "laned".to_string()
}

fn default_num_lanes() -> usize {
    num_cpus::get().clamp(1, 64)
}

impl LanedConfig {
    pub fn validate(&self) -> Result<(), LanedError> {
        if !(1..=64).contains(&self.num_lanes) {
            return Err(LanedError::InvalidLaneCount {
                requested: self.num_lanes,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_toml() {
        let cfg: LanedConfig = toml::from_str(
            r#"
            connection_name = "upstream-a"
            num_lanes = 8
            "#,
        )
        .unwrap();
        assert_eq!(cfg.connection_name, "upstream-a");
        assert_eq!(cfg.num_lanes, 8);
        assert_eq!(cfg.strategy, StrategyKind::RoundRobin);
        assert_eq!(cfg.metric_prefix, "laned");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_lane_count() {
        let cfg = LanedConfig {
            connection_name: "upstream-a".to_string(),
            num_lanes: 0,
            strategy: StrategyKind::RoundRobin,
            metric_prefix: "laned".to_string(),
        };
        assert!(matches!(
            cfg.validate(),
            Err(LanedError::InvalidLaneCount { requested: 0 })
        ));

        let cfg = LanedConfig {
            num_lanes: 65,
            ..cfg
        };
        assert!(matches!(
            cfg.validate(),
            Err(LanedError::InvalidLaneCount { requested: 65 })
        ));
    }

    #[test]
    fn num_lanes_defaults_to_visible_cpu_count() {
        let cfg: LanedConfig = toml::from_str(
            r#"
            connection_name = "upstream-c"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.num_lanes, num_cpus::get().clamp(1, 64));
    }

    #[test]
    fn parses_explicit_strategy() {
        let cfg: LanedConfig = toml::from_str(
            r#"
            connection_name = "upstream-b"
            num_lanes = 4
            strategy = "least-used"
            metric_prefix = "custom"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.strategy, StrategyKind::LeastUsed);
        assert_eq!(cfg.metric_prefix, "custom");
    }
}
