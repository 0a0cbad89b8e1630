//! Calendar feature derivation.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::RiskError;
use crate::models::{DayOfWeek, Incident, MonthName, RawIncident};

pub const DAY_ORDER: [DayOfWeek; 7] = DayOfWeek::ALL;
pub const MONTH_ORDER: [MonthName; 12] = MonthName::ALL;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parses an occurrence timestamp in any of the layouts found in LAPD exports.
/// Offsets are dropped in favour of the local wall-clock time.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed);
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Derives year, month, weekday and hour for every incident.
///
/// Fails on the first unparsable timestamp and returns nothing for the
/// batch. The input slice is left untouched.
pub fn derive_features(raw: &[RawIncident]) -> Result<Vec<Incident>, RiskError> {
    let mut incidents = Vec::with_capacity(raw.len());

    for (index, row) in raw.iter().enumerate() {
        let occurred_at =
            parse_timestamp(&row.occurred_at).ok_or_else(|| RiskError::DataFormat {
                row: index + 1,
                id: row.id.clone(),
                value: row.occurred_at.clone(),
            })?;
        incidents.push(Incident::new(row.clone(), occurred_at));
    }

    log::debug!("Derived calendar features for {} incidents", incidents.len());
    Ok(incidents)
}
