use std::collections::BTreeMap;

use crate::config::DangerWeights;
use crate::error::RiskError;
use crate::models::{
    AreaRiskReport, AreaSummary, Centroid, DayOfWeek, Incident, IncidentRecord, MonthName,
    RiskLevel, TierBounds, TrainingRow,
};

/// Running totals for one group, filled in a single pass.
#[derive(Debug, Default, Clone)]
struct Accumulator {
    total: usize,
    part1: usize,
    lat_sum: f64,
    lon_sum: f64,
    located: usize,
}

impl Accumulator {
    fn push(&mut self, incident: &impl IncidentRecord) {
        self.total += 1;
        if incident.is_part1() {
            self.part1 += 1;
        }
        if let Some(location) = incident.location() {
            self.lat_sum += location.lat;
            self.lon_sum += location.lon;
            self.located += 1;
        }
    }

    fn centroid(&self) -> Option<Centroid> {
        if self.located == 0 {
            return None;
        }
        let count = self.located as f64;
        Some(Centroid {
            lat: self.lat_sum / count,
            lon: self.lon_sum / count,
        })
    }
}

/// A finalized group after normalization and ranking.
#[derive(Debug, Clone, PartialEq)]
struct ScoredGroup<K> {
    key: K,
    total_crimes: usize,
    part1_crimes: usize,
    centroid: Option<Centroid>,
    severity_index: f64,
    crime_norm: f64,
    danger_index: f64,
    risk_level: RiskLevel,
}

fn aggregate_by<T, K, F>(incidents: &[T], key: F) -> BTreeMap<K, Accumulator>
where
    T: IncidentRecord,
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut groups: BTreeMap<K, Accumulator> = BTreeMap::new();
    for incident in incidents {
        groups.entry(key(incident)).or_default().push(incident);
    }
    groups
}

/// Second pass: global normalization, blending and tier assignment. Only
/// called once every group is final.
fn rank<K>(
    groups: BTreeMap<K, Accumulator>,
    weights: &DangerWeights,
) -> Result<(Vec<ScoredGroup<K>>, TierBounds), RiskError> {
    let max_total = groups.values().map(|group| group.total).max().unwrap_or(0);
    if max_total == 0 {
        return Err(RiskError::EmptyInput);
    }

    let mut scored: Vec<ScoredGroup<K>> = groups
        .into_iter()
        .map(|(key, group)| {
            let severity_index = group.part1 as f64 / group.total as f64;
            let crime_norm = group.total as f64 / max_total as f64;
            ScoredGroup {
                centroid: group.centroid(),
                key,
                total_crimes: group.total,
                part1_crimes: group.part1,
                severity_index,
                crime_norm,
                danger_index: weights.blend(crime_norm, severity_index),
                risk_level: RiskLevel::Low,
            }
        })
        .collect();

    let danger: Vec<f64> = scored.iter().map(|group| group.danger_index).collect();
    let bounds = tier_bounds(&danger);
    for group in &mut scored {
        group.risk_level = bounds.classify(group.danger_index);
    }

    Ok((scored, bounds))
}

/// Quantile at `q` with linear interpolation between order statistics.
/// `sorted` must be non-empty and ascending.
fn interpolate(sorted: &[f64], q: f64) -> f64 {
    let position = (sorted.len() - 1) as f64 * q;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Cut points splitting `values` into equal-count tiers, one per risk level.
pub fn tier_bounds(values: &[f64]) -> TierBounds {
    if values.is_empty() {
        return TierBounds {
            cut_points: Vec::new(),
        };
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let tiers = RiskLevel::ALL.len();
    let cut_points = (1..tiers)
        .map(|tier| interpolate(&sorted, tier as f64 / tiers as f64))
        .collect();

    TierBounds { cut_points }
}

/// Scores every area present in `incidents`.
pub fn score_areas<T: IncidentRecord>(
    incidents: &[T],
    weights: &DangerWeights,
) -> Result<AreaRiskReport, RiskError> {
    if incidents.is_empty() {
        return Err(RiskError::EmptyInput);
    }

    let groups = aggregate_by(incidents, |incident| incident.area_name().to_string());
    log::debug!(
        "Aggregated {} incidents into {} areas",
        incidents.len(),
        groups.len()
    );

    let (scored, bounds) = rank(groups, weights)?;

    let areas: Vec<AreaSummary> = scored
        .into_iter()
        .map(|group| AreaSummary {
            area_name: group.key,
            total_crimes: group.total_crimes,
            part1_crimes: group.part1_crimes,
            centroid: group.centroid,
            severity_index: group.severity_index,
            crime_norm: group.crime_norm,
            danger_index: group.danger_index,
            risk_level: group.risk_level,
        })
        .collect();

    for area in areas.iter().filter(|area| area.centroid.is_none()) {
        log::warn!(
            "Area {} has no incidents with valid coordinates; centroid is undefined",
            area.area_name
        );
    }

    let danger_min = areas
        .iter()
        .map(|area| area.danger_index)
        .fold(f64::INFINITY, f64::min);
    let danger_max = areas
        .iter()
        .map(|area| area.danger_index)
        .fold(f64::NEG_INFINITY, f64::max);

    Ok(AreaRiskReport {
        areas,
        danger_min,
        danger_max,
        bounds,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct TimeBucket {
    area_name: String,
    month: MonthName,
    day_of_week: DayOfWeek,
    hour: u32,
}

/// Applies the area scoring per (area, month, weekday, hour) bucket to
/// produce the classifier training labels. Rows come back sorted by bucket.
pub fn label_time_buckets(
    incidents: &[Incident],
    weights: &DangerWeights,
) -> Result<Vec<TrainingRow>, RiskError> {
    if incidents.is_empty() {
        return Err(RiskError::EmptyInput);
    }

    let groups = aggregate_by(incidents, |incident| TimeBucket {
        area_name: incident.raw.area_name.clone(),
        month: incident.month_name,
        day_of_week: incident.day_of_week,
        hour: incident.hour,
    });
    log::debug!("Labeling {} time buckets", groups.len());

    let (scored, bounds) = rank(groups, weights)?;
    log::info!(
        "Training labels use tier cut points {:?} across {} buckets",
        bounds.cut_points,
        scored.len()
    );

    Ok(scored
        .into_iter()
        .map(|group| TrainingRow {
            area_name: group.key.area_name,
            month: group.key.month,
            day_of_week: group.key.day_of_week,
            hour: group.key.hour,
            total_crimes: group.total_crimes,
            part1_crimes: group.part1_crimes,
            danger_index: group.danger_index,
            risk_level: group.risk_level,
        })
        .collect())
}
