//! Point risk prediction from a pre-built classifier artifact.
//!
//! The artifact is a versioned JSON document holding the label of every
//! observed (area, month, weekday, hour) bucket plus a per-area fallback
//! label from the area scoring run.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::parse_timestamp;
use crate::models::{AreaRiskReport, DayOfWeek, MonthName, RiskLevel, TrainingRow};

pub const ARTIFACT_VERSION: u32 = 1;

/// Errors raised while loading or querying a classifier.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Reading or writing the artifact failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The artifact is not valid JSON for this format.
    #[error("Artifact format error: {0}")]
    Json(#[from] serde_json::Error),

    /// The artifact was written by an incompatible version.
    #[error("Unsupported artifact version {found}")]
    UnsupportedVersion {
        /// Version found in the artifact.
        found: u32,
    },

    /// The area never appeared in the training data.
    #[error("Unknown area: {0}")]
    UnknownArea(String),

    /// The query itself is malformed.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// Input features for a single prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionQuery {
    pub area_name: String,
    pub hour: u32,
    pub day_of_week: DayOfWeek,
    pub month: MonthName,
}

impl PredictionQuery {
    /// Builds a query from an area and a moment in time.
    pub fn at(area_name: &str, moment: NaiveDateTime) -> Self {
        Self {
            area_name: area_name.to_string(),
            hour: moment.hour(),
            day_of_week: DayOfWeek::from_weekday(moment.weekday()),
            month: MonthName::from_number(moment.month()),
        }
    }

    /// Parses the timestamp with the same layouts accepted for incidents.
    pub fn parse(area_name: &str, timestamp: &str) -> Result<Self, ClassifierError> {
        let moment = parse_timestamp(timestamp).ok_or_else(|| {
            ClassifierError::InvalidQuery(format!("unparsable timestamp {timestamp:?}"))
        })?;
        Ok(Self::at(area_name, moment))
    }
}

pub trait RiskClassifier {
    fn predict(&self, query: &PredictionQuery) -> Result<RiskLevel, ClassifierError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BucketLabel {
    area_name: String,
    month: MonthName,
    day_of_week: DayOfWeek,
    hour: u32,
    risk_level: RiskLevel,
}

/// Serialized classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelArtifact {
    version: u32,
    buckets: Vec<BucketLabel>,
    area_fallback: BTreeMap<String, RiskLevel>,
}

impl ModelArtifact {
    pub fn build(rows: &[TrainingRow], areas: &AreaRiskReport) -> Self {
        let buckets = rows
            .iter()
            .map(|row| BucketLabel {
                area_name: row.area_name.clone(),
                month: row.month,
                day_of_week: row.day_of_week,
                hour: row.hour,
                risk_level: row.risk_level,
            })
            .collect();
        let area_fallback = areas
            .areas
            .iter()
            .map(|area| (area.area_name.clone(), area.risk_level))
            .collect();

        Self {
            version: ARTIFACT_VERSION,
            buckets,
            area_fallback,
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ClassifierError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!(
            "Wrote classifier artifact with {} buckets to {}",
            self.buckets.len(),
            path.display()
        );
        Ok(())
    }
}

type BucketKey = (String, MonthName, DayOfWeek, u32);

/// Table classifier: exact bucket label, else the area's overall label.
#[derive(Debug, Clone)]
pub struct LookupClassifier {
    table: BTreeMap<BucketKey, RiskLevel>,
    area_fallback: BTreeMap<String, RiskLevel>,
}

impl LookupClassifier {
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ClassifierError> {
        if artifact.version != ARTIFACT_VERSION {
            return Err(ClassifierError::UnsupportedVersion {
                found: artifact.version,
            });
        }

        let table = artifact
            .buckets
            .into_iter()
            .map(|bucket| {
                (
                    (bucket.area_name, bucket.month, bucket.day_of_week, bucket.hour),
                    bucket.risk_level,
                )
            })
            .collect();

        Ok(Self {
            table,
            area_fallback: artifact.area_fallback,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let text = std::fs::read_to_string(path)?;
        let artifact: ModelArtifact = serde_json::from_str(&text)?;
        let classifier = Self::from_artifact(artifact)?;
        log::info!(
            "Loaded classifier with {} buckets across {} areas from {}",
            classifier.table.len(),
            classifier.area_fallback.len(),
            path.display()
        );
        Ok(classifier)
    }

    pub fn areas(&self) -> impl Iterator<Item = &str> {
        self.area_fallback.keys().map(String::as_str)
    }
}

impl RiskClassifier for LookupClassifier {
    fn predict(&self, query: &PredictionQuery) -> Result<RiskLevel, ClassifierError> {
        if query.hour > 23 {
            return Err(ClassifierError::InvalidQuery(format!(
                "hour {} is outside 0-23",
                query.hour
            )));
        }

        let fallback = self
            .area_fallback
            .get(&query.area_name)
            .copied()
            .ok_or_else(|| ClassifierError::UnknownArea(query.area_name.clone()))?;

        let key = (
            query.area_name.clone(),
            query.month,
            query.day_of_week,
            query.hour,
        );
        match self.table.get(&key) {
            Some(level) => Ok(*level),
            None => {
                log::debug!(
                    "No training bucket for {} {} {} {:02}h; using area label {fallback}",
                    query.area_name,
                    query.month,
                    query.day_of_week,
                    query.hour
                );
                Ok(fallback)
            }
        }
    }
}

/// User-facing explanation shown alongside a prediction.
pub fn explain(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => {
            "The area and time you selected have historically had a high number of serious crimes."
        }
        RiskLevel::Medium => "The area and time you selected have moderate crime levels.",
        RiskLevel::Low => "The area and time you selected have historically had fewer crimes.",
    }
}
