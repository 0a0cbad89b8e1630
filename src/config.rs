use std::path::PathBuf;

use crate::error::RiskError;

pub const DEFAULT_DATA_PATH: &str = "crime_20_24_clean.csv";
pub const DEFAULT_MODEL_PATH: &str = "crime_risk_model.json";

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Blend weights for the danger index:
/// `danger = volume * crime_norm + severity * severity_index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DangerWeights {
    pub volume: f64,
    pub severity: f64,
}

impl Default for DangerWeights {
    fn default() -> Self {
        DangerWeights {
            volume: 0.5,
            severity: 0.5,
        }
    }
}

impl DangerWeights {
    /// Weights must be finite, non-negative and sum to 1 so the blend stays
    /// within `[0, 1]`.
    pub fn new(volume: f64, severity: f64) -> Result<Self, RiskError> {
        if !volume.is_finite() || !severity.is_finite() {
            return Err(RiskError::InvalidWeights {
                message: format!("weights must be finite (volume {volume}, severity {severity})"),
            });
        }
        if volume < 0.0 || severity < 0.0 {
            return Err(RiskError::InvalidWeights {
                message: format!(
                    "weights must be non-negative (volume {volume}, severity {severity})"
                ),
            });
        }
        if (volume + severity - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(RiskError::InvalidWeights {
                message: format!("weights must sum to 1, got {}", volume + severity),
            });
        }

        Ok(Self { volume, severity })
    }

    pub fn blend(&self, crime_norm: f64, severity_index: f64) -> f64 {
        self.volume * crime_norm + self.severity * severity_index
    }
}

/// Resolved settings shared by every command.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    pub weights: DangerWeights,
}

impl AppConfig {
    pub fn new(
        data_path: PathBuf,
        model_path: PathBuf,
        volume_weight: f64,
        severity_weight: f64,
    ) -> Result<Self, RiskError> {
        Ok(Self {
            data_path,
            model_path,
            weights: DangerWeights::new(volume_weight, severity_weight)?,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            weights: DangerWeights::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_even_blend() {
        let weights = DangerWeights::default();
        assert_eq!(weights.volume, 0.5);
        assert_eq!(weights.severity, 0.5);
        assert_eq!(weights.blend(1.0, 0.5), 0.75);
    }

    #[test]
    fn accepts_alternative_blend() {
        let weights = DangerWeights::new(0.3, 0.7).unwrap();
        assert!((weights.blend(1.0, 0.0) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_weights() {
        assert!(DangerWeights::new(0.6, 0.6).is_err());
        assert!(DangerWeights::new(-0.5, 1.5).is_err());
        assert!(DangerWeights::new(f64::NAN, 0.5).is_err());
    }

    #[test]
    fn app_config_validates_weights() {
        let config = AppConfig::new("a.csv".into(), "m.json".into(), 0.25, 0.75).unwrap();
        assert_eq!(config.weights.severity, 0.75);
        assert!(AppConfig::new("a.csv".into(), "m.json".into(), 1.0, 1.0).is_err());
        assert_eq!(AppConfig::default().data_path, PathBuf::from(DEFAULT_DATA_PATH));
    }
}
