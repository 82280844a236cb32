//! `SimulationConfig`: the typed, `serde`-backed scenario description
//! handed to `threadsim-runner` (SPEC_FULL §10.3). This loads and
//! validates configuration only — the interactive CLI grammar that
//! would produce one of these interactively remains out of scope (§1).

use crate::error::{ConfigError, ConfigResult};
use crate::value::PropertyValue;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_radio_model")]
    pub radio_model: String,
    #[serde(default)]
    pub radio: RadioModelConfigSpec,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
}

fn default_radio_model() -> String {
    "ideal".to_string()
}

fn default_speed() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct RadioModelConfigSpec {
    #[serde(default = "default_shadow_fading_sigma_db")]
    pub shadow_fading_sigma_db: f64,
    #[serde(default = "default_cca_ed_threshold_dbm")]
    pub cca_ed_threshold_dbm: f64,
    #[serde(default = "default_min_sir_db")]
    pub min_sir_db: f64,
    #[serde(default)]
    pub global_packet_loss_ratio: f64,
    #[serde(default = "default_ideal_rssi_dbm")]
    pub ideal_rssi_dbm: f64,
}

fn default_shadow_fading_sigma_db() -> f64 {
    4.0
}
fn default_cca_ed_threshold_dbm() -> f64 {
    -85.0
}
fn default_min_sir_db() -> f64 {
    4.0
}
fn default_ideal_rssi_dbm() -> f64 {
    -60.0
}

impl Default for RadioModelConfigSpec {
    fn default() -> Self {
        RadioModelConfigSpec {
            shadow_fading_sigma_db: default_shadow_fading_sigma_db(),
            cca_ed_threshold_dbm: default_cca_ed_threshold_dbm(),
            min_sir_db: default_min_sir_db(),
            global_packet_loss_ratio: 0.0,
            ideal_rssi_dbm: default_ideal_rssi_dbm(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
    pub id: u32,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default = "default_radio_range_units")]
    pub radio_range_units: f64,
    #[serde(default)]
    pub tx_power_dbm: i8,
    #[serde(default = "default_rx_sensitivity_dbm")]
    pub rx_sensitivity_dbm: i8,
    #[serde(default)]
    pub fail_duration_us: u64,
    #[serde(default)]
    pub fail_interval_us: u64,
    /// Forward-compatible per-node overrides (e.g. future knobs that
    /// don't yet warrant a typed field of their own).
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

fn default_radio_range_units() -> f64 {
    100.0
}
fn default_rx_sensitivity_dbm() -> i8 {
    -100
}

impl SimulationConfig {
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let config: SimulationConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        Self::from_yaml_str(&text)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.speed < 0.0 {
            return Err(ConfigError::Invalid { message: "speed must be >= 0".to_string() });
        }
        let mut seen = std::collections::HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id) {
                return Err(ConfigError::Invalid { message: format!("duplicate node id {}", node.id) });
            }
            if node.fail_duration_us != 0 && node.fail_duration_us >= node.fail_interval_us {
                return Err(ConfigError::Invalid {
                    message: format!("node {}: fail_duration_us must be < fail_interval_us", node.id),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_yaml() {
        let yaml = r#"
nodes:
  - id: 1
    x: 0
    y: 0
  - id: 2
    x: 50
    y: 0
"#;
        let config = SimulationConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.radio_model, "ideal");
        assert_eq!(config.speed, 1.0);
    }

    #[test]
    fn rejects_duplicate_node_ids() {
        let yaml = "nodes:\n  - id: 1\n  - id: 1\n";
        assert!(SimulationConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn rejects_invalid_fail_window() {
        let yaml = "nodes:\n  - id: 1\n    fail_duration_us: 100\n    fail_interval_us: 50\n";
        assert!(SimulationConfig::from_yaml_str(yaml).is_err());
    }
}
