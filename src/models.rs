use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// One row of the incident CSV, as loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawIncident {
    #[serde(rename = "dr_no")]
    pub id: String,
    #[serde(rename = "date_occ")]
    pub occurred_at: String,
    pub area_name: String,
    #[serde(rename = "part_1-2", default, deserialize_with = "csv::invalid_option")]
    pub category_code: Option<i64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub lon: Option<f64>,
    #[serde(rename = "crm_cd_desc", default)]
    pub crime_description: Option<String>,
    #[serde(rename = "premis_desc", default)]
    pub premises_description: Option<String>,
    #[serde(rename = "vict_age", default, deserialize_with = "csv::invalid_option")]
    pub victim_age: Option<i32>,
    #[serde(rename = "vict_sex", default)]
    pub victim_sex: Option<String>,
}

/// An incident with its calendar features derived from `occurred_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    pub raw: RawIncident,
    pub occurred_at: NaiveDateTime,
    pub year: i32,
    pub month_name: MonthName,
    pub day_of_week: DayOfWeek,
    pub hour: u32,
}

impl Incident {
    pub fn new(raw: RawIncident, occurred_at: NaiveDateTime) -> Self {
        Self {
            year: occurred_at.year(),
            month_name: MonthName::from_number(occurred_at.month()),
            day_of_week: DayOfWeek::from_weekday(occurred_at.weekday()),
            hour: occurred_at.hour(),
            occurred_at,
            raw,
        }
    }
}

/// The minimum an incident must carry to be scored.
pub trait IncidentRecord {
    fn area_name(&self) -> &str;

    /// Whether this is a Part 1 (serious) offense.
    fn is_part1(&self) -> bool;

    /// Valid coordinates, or `None` if missing or unusable.
    fn location(&self) -> Option<Centroid>;
}

impl IncidentRecord for RawIncident {
    fn area_name(&self) -> &str {
        &self.area_name
    }

    fn is_part1(&self) -> bool {
        self.category_code == Some(1)
    }

    fn location(&self) -> Option<Centroid> {
        Centroid::from_coordinates(self.lat?, self.lon?)
    }
}

impl IncidentRecord for Incident {
    fn area_name(&self) -> &str {
        self.raw.area_name()
    }

    fn is_part1(&self) -> bool {
        self.raw.is_part1()
    }

    fn location(&self) -> Option<Centroid> {
        self.raw.location()
    }
}

/// Day of week in canonical Monday-first order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [Self; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    #[must_use]
    pub const fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }

    /// Zero-based index with Monday as 0.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Month in canonical January-first order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum MonthName {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl MonthName {
    pub const ALL: [Self; 12] = [
        Self::January,
        Self::February,
        Self::March,
        Self::April,
        Self::May,
        Self::June,
        Self::July,
        Self::August,
        Self::September,
        Self::October,
        Self::November,
        Self::December,
    ];

    /// Maps a 1-based month number (as returned by chrono) to its name.
    /// Values past 12 clamp to December.
    #[must_use]
    pub fn from_number(month: u32) -> Self {
        Self::ALL[(month.clamp(1, 12) - 1) as usize]
    }

    /// 1-based month number.
    #[must_use]
    pub const fn number(self) -> u32 {
        self as u32 + 1
    }
}

/// Three-tier risk label, ordered `Low < Medium < High`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Label for a zero-based tier; tiers past the top clamp to `High`.
    #[must_use]
    pub fn from_tier(tier: usize) -> Self {
        Self::ALL[tier.min(Self::ALL.len() - 1)]
    }
}

/// Mean location of an area's incidents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub lat: f64,
    pub lon: f64,
}

impl Centroid {
    /// Returns `None` for non-finite, out-of-range, or `(0, 0)` placeholder
    /// coordinates.
    #[must_use]
    pub fn from_coordinates(lat: f64, lon: f64) -> Option<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }
        if lat == 0.0 && lon == 0.0 {
            return None;
        }
        Some(Self { lat, lon })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaSummary {
    pub area_name: String,
    pub total_crimes: usize,
    pub part1_crimes: usize,
    /// `None` when no incident in the area had valid coordinates.
    pub centroid: Option<Centroid>,
    pub severity_index: f64,
    pub crime_norm: f64,
    pub danger_index: f64,
    pub risk_level: RiskLevel,
}

/// Quantile cut points separating consecutive risk tiers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierBounds {
    /// Ascending; `cut_points[i]` is the inclusive upper bound of tier `i`.
    pub cut_points: Vec<f64>,
}

impl TierBounds {
    #[must_use]
    pub fn classify(&self, danger_index: f64) -> RiskLevel {
        let tier = self
            .cut_points
            .iter()
            .position(|&cut| danger_index <= cut)
            .unwrap_or(self.cut_points.len());
        RiskLevel::from_tier(tier)
    }
}

/// Everything the map collaborator needs from one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaRiskReport {
    /// Sorted by `area_name`.
    pub areas: Vec<AreaSummary>,
    pub danger_min: f64,
    pub danger_max: f64,
    pub bounds: TierBounds,
}

impl AreaRiskReport {
    #[must_use]
    pub fn area(&self, area_name: &str) -> Option<&AreaSummary> {
        self.areas
            .binary_search_by(|summary| summary.area_name.as_str().cmp(area_name))
            .ok()
            .map(|index| &self.areas[index])
    }
}

/// One labeled row of the classifier training set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub area_name: String,
    pub month: MonthName,
    pub day_of_week: DayOfWeek,
    pub hour: u32,
    pub total_crimes: usize,
    pub part1_crimes: usize,
    pub danger_index: f64,
    pub risk_level: RiskLevel,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn vocabularies_follow_canonical_order() {
        let days: Vec<String> = DayOfWeek::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(
            days,
            ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
        );
        assert_eq!(MonthName::ALL[0].to_string(), "January");
        assert_eq!(MonthName::ALL[11].to_string(), "December");
        assert!(MonthName::March < MonthName::April);
        assert_eq!(DayOfWeek::from_str("Friday").unwrap(), DayOfWeek::Friday);
    }

    #[test]
    fn month_numbers_are_one_based() {
        for (index, month) in MonthName::ALL.iter().enumerate() {
            assert_eq!(month.number() as usize, index + 1);
            assert_eq!(MonthName::from_number(month.number()), *month);
        }
    }

    #[test]
    fn risk_levels_are_ordered() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert_eq!(RiskLevel::from_tier(7), RiskLevel::High);
        assert_eq!(RiskLevel::from_str("Medium").unwrap(), RiskLevel::Medium);
    }

    #[test]
    fn rejects_placeholder_and_out_of_range_coordinates() {
        assert!(Centroid::from_coordinates(0.0, 0.0).is_none());
        assert!(Centroid::from_coordinates(f64::NAN, -118.2).is_none());
        assert!(Centroid::from_coordinates(91.0, -118.2).is_none());
        assert!(Centroid::from_coordinates(34.05, -181.0).is_none());
        assert!(Centroid::from_coordinates(34.05, -118.25).is_some());
    }

    #[test]
    fn part1_requires_exact_code_one() {
        let mut raw = RawIncident {
            id: "1".to_string(),
            occurred_at: "2023-01-01 00:00:00".to_string(),
            area_name: "Central".to_string(),
            category_code: Some(1),
            lat: None,
            lon: Some(-118.2),
            crime_description: None,
            premises_description: None,
            victim_age: None,
            victim_sex: None,
        };
        assert!(raw.is_part1());
        assert!(raw.location().is_none());

        raw.category_code = Some(2);
        assert!(!raw.is_part1());
        raw.category_code = None;
        assert!(!raw.is_part1());
    }

    #[test]
    fn tier_bounds_are_right_closed() {
        let bounds = TierBounds {
            cut_points: vec![0.4, 0.6],
        };
        assert_eq!(bounds.classify(0.4), RiskLevel::Low);
        assert_eq!(bounds.classify(0.5), RiskLevel::Medium);
        assert_eq!(bounds.classify(0.6), RiskLevel::Medium);
        assert_eq!(bounds.classify(0.61), RiskLevel::High);
    }
}
