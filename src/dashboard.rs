use std::collections::{BTreeMap, HashMap};

use crate::config::DangerWeights;
use crate::error::RiskError;
use crate::models::{AreaRiskReport, DayOfWeek, Incident, MonthName};
use crate::risk;

pub const TOP_CRIME_TYPES: usize = 10;
pub const TOP_PREMISES: usize = 5;
pub const AGE_BIN_WIDTH: i32 = 5;
pub const AGE_LIMIT: i32 = 95;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: MonthName,
    pub count: usize,
}

/// Incident counts by weekday (Monday first) and hour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourlyHeatmap {
    pub counts: [[usize; 24]; 7],
}

impl HourlyHeatmap {
    pub fn get(&self, day: DayOfWeek, hour: u32) -> usize {
        self.counts[day.index()][hour as usize]
    }

    /// The busiest (day, hour) cell, earliest first on ties.
    pub fn peak(&self) -> Option<(DayOfWeek, u32, usize)> {
        let mut best: Option<(DayOfWeek, u32, usize)> = None;
        for day in DayOfWeek::ALL {
            for (hour, &count) in self.counts[day.index()].iter().enumerate() {
                if count > 0 && best.map_or(true, |(_, _, top)| count > top) {
                    best = Some((day, hour as u32, count));
                }
            }
        }
        best
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrimeTypeRow {
    pub crime_type: String,
    /// Parallel to [`PremisesBreakdown::premises`].
    pub counts: Vec<usize>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PremisesBreakdown {
    pub premises: Vec<String>,
    pub rows: Vec<CrimeTypeRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeBand {
    pub label: String,
    pub female: usize,
    pub male: usize,
}

/// All chart data plus the area risk scores.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub incident_count: usize,
    pub monthly: Vec<MonthlyCount>,
    pub hourly: HourlyHeatmap,
    pub premises: PremisesBreakdown,
    pub victims: Vec<AgeBand>,
    pub areas: AreaRiskReport,
}

pub fn build_dashboard(
    incidents: &[Incident],
    weights: &DangerWeights,
) -> Result<Dashboard, RiskError> {
    let areas = risk::score_areas(incidents, weights)?;

    Ok(Dashboard {
        incident_count: incidents.len(),
        monthly: monthly_trend(incidents),
        hourly: hourly_heatmap(incidents),
        premises: crime_types_by_premises(incidents, TOP_CRIME_TYPES, TOP_PREMISES),
        victims: victim_age_by_sex(incidents),
        areas,
    })
}

pub fn monthly_trend(incidents: &[Incident]) -> Vec<MonthlyCount> {
    let mut counts: BTreeMap<(i32, MonthName), usize> = BTreeMap::new();
    for incident in incidents {
        *counts
            .entry((incident.year, incident.month_name))
            .or_insert(0) += 1;
    }

    counts
        .into_iter()
        .map(|((year, month), count)| MonthlyCount { year, month, count })
        .collect()
}

pub fn hourly_heatmap(incidents: &[Incident]) -> HourlyHeatmap {
    let mut counts = [[0usize; 24]; 7];
    for incident in incidents {
        counts[incident.day_of_week.index()][incident.hour as usize] += 1;
    }
    HourlyHeatmap { counts }
}

/// Most frequent values, count descending then name ascending.
fn top_values<'a>(values: impl Iterator<Item = &'a str>, limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(value, _)| value.to_string())
        .collect()
}

/// Counts of the top crime types within the top premises. Only incidents
/// whose type and premises are both in the top sets are counted.
pub fn crime_types_by_premises(
    incidents: &[Incident],
    top_types: usize,
    top_premises: usize,
) -> PremisesBreakdown {
    let crime_types = top_values(
        incidents
            .iter()
            .filter_map(|i| i.raw.crime_description.as_deref()),
        top_types,
    );
    let premises = top_values(
        incidents
            .iter()
            .filter_map(|i| i.raw.premises_description.as_deref()),
        top_premises,
    );

    let mut rows: Vec<CrimeTypeRow> = crime_types
        .iter()
        .map(|crime_type| CrimeTypeRow {
            crime_type: crime_type.clone(),
            counts: vec![0; premises.len()],
            total: 0,
        })
        .collect();

    for incident in incidents {
        let (Some(crime_type), Some(premise)) = (
            incident.raw.crime_description.as_deref(),
            incident.raw.premises_description.as_deref(),
        ) else {
            continue;
        };
        let Some(row) = crime_types.iter().position(|t| t == crime_type) else {
            continue;
        };
        let Some(column) = premises.iter().position(|p| p == premise) else {
            continue;
        };
        rows[row].counts[column] += 1;
        rows[row].total += 1;
    }

    rows.retain(|row| row.total > 0);
    rows.sort_by(|a, b| b.total.cmp(&a.total));

    PremisesBreakdown { premises, rows }
}

/// Victim counts in 5-year age bands (`0-4` through `90-94`) for female
/// and male victims. Other sex codes and ages outside the bands are dropped.
pub fn victim_age_by_sex(incidents: &[Incident]) -> Vec<AgeBand> {
    let mut bands: Vec<AgeBand> = (0..AGE_LIMIT)
        .step_by(AGE_BIN_WIDTH as usize)
        .map(|start| AgeBand {
            label: format!("{start}-{}", start + AGE_BIN_WIDTH - 1),
            female: 0,
            male: 0,
        })
        .collect();

    for incident in incidents {
        let Some(age) = incident.raw.victim_age else {
            continue;
        };
        if !(0..AGE_LIMIT).contains(&age) {
            continue;
        }
        let band = &mut bands[(age / AGE_BIN_WIDTH) as usize];
        match incident.raw.victim_sex.as_deref() {
            Some("F") => band.female += 1,
            Some("M") => band.male += 1,
            _ => {}
        }
    }

    bands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::derive_features;
    use crate::features::tests::raw;
    use crate::models::RawIncident;

    fn incident(
        occurred_at: &str,
        crime: &str,
        premises: &str,
        age: i32,
        sex: &str,
    ) -> RawIncident {
        let mut row = raw("1", occurred_at, "Central", 2);
        row.crime_description = Some(crime.to_string());
        row.premises_description = Some(premises.to_string());
        row.victim_age = Some(age);
        row.victim_sex = Some(sex.to_string());
        row
    }

    fn sample() -> Vec<Incident> {
        derive_features(&[
            incident("2022-01-03 12:00:00", "VEHICLE - STOLEN", "STREET", 0, "X"),
            incident("2022-01-10 12:30:00", "VEHICLE - STOLEN", "STREET", 27, "M"),
            incident("2022-02-14 04:00:00", "BATTERY - SIMPLE ASSAULT", "SIDEWALK", 25, "F"),
            incident("2021-12-31 23:00:00", "BURGLARY", "SINGLE FAMILY DWELLING", 94, "F"),
            incident("2023-01-06 12:15:00", "VEHICLE - STOLEN", "PARKING LOT", 99, "M"),
        ])
        .unwrap()
    }

    #[test]
    fn monthly_counts_in_calendar_order() {
        let monthly = monthly_trend(&sample());
        let keys: Vec<(i32, MonthName, usize)> = monthly
            .iter()
            .map(|m| (m.year, m.month, m.count))
            .collect();
        assert_eq!(
            keys,
            vec![
                (2021, MonthName::December, 1),
                (2022, MonthName::January, 2),
                (2022, MonthName::February, 1),
                (2023, MonthName::January, 1),
            ]
        );
    }

    #[test]
    fn heatmap_counts_day_and_hour() {
        let heatmap = hourly_heatmap(&sample());
        assert_eq!(heatmap.get(DayOfWeek::Monday, 12), 2);
        assert_eq!(heatmap.get(DayOfWeek::Friday, 12), 1);
        assert_eq!(heatmap.get(DayOfWeek::Friday, 23), 1);
        assert_eq!(heatmap.peak(), Some((DayOfWeek::Monday, 12, 2)));
        assert_eq!(heatmap.counts.iter().flatten().sum::<usize>(), 5);
    }

    #[test]
    fn premises_breakdown_uses_top_sets() {
        let breakdown = crime_types_by_premises(&sample(), 2, 2);
        assert_eq!(breakdown.premises, vec!["STREET", "PARKING LOT"]);
        assert_eq!(breakdown.rows.len(), 1);
        assert_eq!(breakdown.rows[0].crime_type, "VEHICLE - STOLEN");
        assert_eq!(breakdown.rows[0].counts, vec![2, 1]);
        assert_eq!(breakdown.rows[0].total, 3);
    }

    #[test]
    fn victim_bands_split_by_sex() {
        let bands = victim_age_by_sex(&sample());
        assert_eq!(bands.len(), 19);
        assert_eq!(bands[0].label, "0-4");
        assert_eq!(bands[18].label, "90-94");
        assert_eq!(bands[5].male, 1);
        assert_eq!(bands[5].female, 1);
        assert_eq!(bands[18].female, 1);
        assert_eq!(bands[0].male + bands[0].female, 0);
        let total: usize = bands.iter().map(|b| b.male + b.female).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn dashboard_includes_area_scores() {
        let dashboard = build_dashboard(&sample(), &DangerWeights::default()).unwrap();
        assert_eq!(dashboard.incident_count, 5);
        assert_eq!(dashboard.areas.areas.len(), 1);
        assert!(build_dashboard(&[], &DangerWeights::default()).is_err());
    }
}
