use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::fusion::CriticalCombination;

const DEFAULT_API_ADDR: &str = "127.0.0.1:8001";
const DEFAULT_MODEL_LABEL: &str = "YOLO + TimeSformer Fusion Engine";
const DEFAULT_PERSON_LABEL: &str = "person";
const DEFAULT_WEAPON_LABELS: &[&str] = &["knife"];

const DEFAULT_SPATIAL_WEIGHT: f64 = 0.6;
const DEFAULT_TEMPORAL_WEIGHT: f64 = 0.4;
const DEFAULT_AGREEMENT_BONUS: f64 = 1.2;
const DEFAULT_AGREEMENT_CAP: f64 = 0.95;
const DEFAULT_SPATIAL_ONLY_FACTOR: f64 = 0.7;
const DEFAULT_TEMPORAL_ONLY_FACTOR: f64 = 0.6;
const DEFAULT_QUIET_FACTOR: f64 = 0.5;
const DEFAULT_CRITICAL_FLOOR: f64 = 0.85;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Deserialize, Default)]
struct ServiceConfigFile {
    api: Option<ApiConfigFile>,
    fusion: Option<FusionConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ApiConfigFile {
    addr: Option<String>,
    key: Option<String>,
    key_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct FusionConfigFile {
    weights: Option<FusionWeights>,
    agreement_bonus: Option<f64>,
    agreement_cap: Option<f64>,
    spatial_only_factor: Option<f64>,
    temporal_only_factor: Option<f64>,
    quiet_factor: Option<f64>,
    critical_confidence_floor: Option<f64>,
    person_label: Option<String>,
    weapon_labels: Option<Vec<String>>,
    extra_critical_combinations: Option<Vec<CriticalCombination>>,
    model_label: Option<String>,
}

/// Relative trust in each modality when both flag an anomaly.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct FusionWeights {
    pub spatial: f64,
    pub temporal: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            spatial: DEFAULT_SPATIAL_WEIGHT,
            temporal: DEFAULT_TEMPORAL_WEIGHT,
        }
    }
}

/// Read-only engine configuration, fixed at engine construction.
#[derive(Clone, Debug, PartialEq)]
pub struct FusionConfig {
    pub weights: FusionWeights,
    /// Multiplier applied when both modalities agree on an anomaly.
    pub agreement_bonus: f64,
    pub agreement_cap: f64,
    pub spatial_only_factor: f64,
    pub temporal_only_factor: f64,
    /// Applied to the weaker score when neither modality flags an anomaly.
    pub quiet_factor: f64,
    pub critical_confidence_floor: f64,
    pub person_label: String,
    pub weapon_labels: Vec<String>,
    /// Appended after the built-in critical table.
    pub extra_critical_combinations: Vec<CriticalCombination>,
    pub model_label: String,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            weights: FusionWeights::default(),
            agreement_bonus: DEFAULT_AGREEMENT_BONUS,
            agreement_cap: DEFAULT_AGREEMENT_CAP,
            spatial_only_factor: DEFAULT_SPATIAL_ONLY_FACTOR,
            temporal_only_factor: DEFAULT_TEMPORAL_ONLY_FACTOR,
            quiet_factor: DEFAULT_QUIET_FACTOR,
            critical_confidence_floor: DEFAULT_CRITICAL_FLOOR,
            person_label: DEFAULT_PERSON_LABEL.to_string(),
            weapon_labels: DEFAULT_WEAPON_LABELS
                .iter()
                .map(|label| label.to_string())
                .collect(),
            extra_critical_combinations: Vec::new(),
            model_label: DEFAULT_MODEL_LABEL.to_string(),
        }
    }
}

impl FusionConfig {
    /// Load a standalone engine config file (JSON, or TOML by extension).
    pub fn from_path(path: &Path) -> Result<Self> {
        let file: FusionConfigFile = read_config_file(path)?;
        let cfg = Self::from_file(file);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: FusionConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            weights: file.weights.unwrap_or(defaults.weights),
            agreement_bonus: file.agreement_bonus.unwrap_or(defaults.agreement_bonus),
            agreement_cap: file.agreement_cap.unwrap_or(defaults.agreement_cap),
            spatial_only_factor: file
                .spatial_only_factor
                .unwrap_or(defaults.spatial_only_factor),
            temporal_only_factor: file
                .temporal_only_factor
                .unwrap_or(defaults.temporal_only_factor),
            quiet_factor: file.quiet_factor.unwrap_or(defaults.quiet_factor),
            critical_confidence_floor: file
                .critical_confidence_floor
                .unwrap_or(defaults.critical_confidence_floor),
            person_label: file.person_label.unwrap_or(defaults.person_label),
            weapon_labels: file.weapon_labels.unwrap_or(defaults.weapon_labels),
            extra_critical_combinations: file.extra_critical_combinations.unwrap_or_default(),
            model_label: file.model_label.unwrap_or(defaults.model_label),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let unit_fields = [
            ("weights.spatial", self.weights.spatial),
            ("weights.temporal", self.weights.temporal),
            ("agreement_cap", self.agreement_cap),
            ("spatial_only_factor", self.spatial_only_factor),
            ("temporal_only_factor", self.temporal_only_factor),
            ("quiet_factor", self.quiet_factor),
            ("critical_confidence_floor", self.critical_confidence_floor),
        ];
        for (name, value) in unit_fields {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("{} must be within [0, 1], got {}", name, value));
            }
        }

        let sum = self.weights.spatial + self.weights.temporal;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(anyhow!("fusion weights must sum to 1, got {}", sum));
        }
        if !self.agreement_bonus.is_finite() || self.agreement_bonus < 1.0 {
            return Err(anyhow!(
                "agreement_bonus must be >= 1, got {}",
                self.agreement_bonus
            ));
        }
        if self.person_label.trim().is_empty() {
            return Err(anyhow!("person_label must not be empty"));
        }
        if self.weapon_labels.iter().any(|label| label.trim().is_empty()) {
            return Err(anyhow!("weapon_labels must not contain empty labels"));
        }
        if self
            .extra_critical_combinations
            .iter()
            .any(|combo| combo.object.trim().is_empty())
        {
            return Err(anyhow!("critical combination object label must not be empty"));
        }
        if self.model_label.trim().is_empty() {
            return Err(anyhow!("model_label must not be empty"));
        }
        Ok(())
    }

    pub fn is_weapon(&self, label: &str) -> bool {
        self.weapon_labels.iter().any(|weapon| weapon == label)
    }
}

/// Configuration for the `fusiond` service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub api_addr: String,
    /// Bearer key required by the API. Generated at startup when absent.
    pub api_key: Option<String>,
    pub api_key_path: Option<PathBuf>,
    pub fusion: FusionConfig,
}

impl ServiceConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("FUSION_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ServiceConfigFile) -> Self {
        let api_addr = file
            .api
            .as_ref()
            .and_then(|api| api.addr.clone())
            .unwrap_or_else(|| DEFAULT_API_ADDR.to_string());
        let api_key = file.api.as_ref().and_then(|api| api.key.clone());
        let api_key_path = file.api.and_then(|api| api.key_path);
        let fusion = FusionConfig::from_file(file.fusion.unwrap_or_default());
        Self {
            api_addr,
            api_key,
            api_key_path,
            fusion,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(addr) = std::env::var("FUSION_API_ADDR") {
            if !addr.trim().is_empty() {
                self.api_addr = addr;
            }
        }
        if let Ok(key) = std::env::var("FUSION_API_KEY") {
            if !key.trim().is_empty() {
                self.api_key = Some(key.trim().to_string());
            }
        }
        if let Ok(path) = std::env::var("FUSION_API_KEY_PATH") {
            if !path.trim().is_empty() {
                self.api_key_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(label) = std::env::var("FUSION_MODEL_LABEL") {
            if !label.trim().is_empty() {
                self.fusion.model_label = label;
            }
        }
        if let Ok(weight) = std::env::var("FUSION_SPATIAL_WEIGHT") {
            let spatial: f64 = weight
                .trim()
                .parse()
                .map_err(|_| anyhow!("FUSION_SPATIAL_WEIGHT must be a number"))?;
            self.fusion.weights = FusionWeights {
                spatial,
                temporal: 1.0 - spatial,
            };
        }
        if let Ok(floor) = std::env::var("FUSION_CRITICAL_FLOOR") {
            self.fusion.critical_confidence_floor = floor
                .trim()
                .parse()
                .map_err(|_| anyhow!("FUSION_CRITICAL_FLOOR must be a number"))?;
        }
        if let Ok(labels) = std::env::var("FUSION_WEAPON_LABELS") {
            let parsed = split_csv(&labels);
            if !parsed.is_empty() {
                self.fusion.weapon_labels = parsed;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.api_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|e| anyhow!("invalid api addr {}: {}", self.api_addr, e))?;
        if let Some(key) = &self.api_key {
            if key.trim().is_empty() {
                return Err(anyhow!("api key must not be empty"));
            }
        }
        self.fusion.validate()
    }
}

fn read_config_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = FusionConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.weights.spatial, 0.6);
        assert_eq!(cfg.weights.temporal, 0.4);
        assert!(cfg.is_weapon("knife"));
        assert!(!cfg.is_weapon("spoon"));
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let cfg = FusionConfig {
            weights: FusionWeights {
                spatial: 0.7,
                temporal: 0.7,
            },
            ..FusionConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_floor_and_bonus() {
        let cfg = FusionConfig {
            critical_confidence_floor: 1.5,
            ..FusionConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = FusionConfig {
            agreement_bonus: 0.9,
            ..FusionConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = FusionConfig {
            quiet_factor: f64::NAN,
            ..FusionConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let file: FusionConfigFile =
            serde_json::from_str(r#"{"agreement_cap": 0.9, "weapon_labels": ["knife", "scissors"]}"#)
                .unwrap();
        let cfg = FusionConfig::from_file(file);
        assert_eq!(cfg.agreement_cap, 0.9);
        assert_eq!(cfg.weapon_labels, vec!["knife", "scissors"]);
        assert_eq!(cfg.agreement_bonus, 1.2);
        assert_eq!(cfg.model_label, "YOLO + TimeSformer Fusion Engine");
    }

    #[test]
    fn split_csv_drops_blanks() {
        assert_eq!(split_csv(" knife, ,bat "), vec!["knife", "bat"]);
    }
}
