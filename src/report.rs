use std::fmt::Write;

use crate::dashboard::Dashboard;
use crate::models::{AreaSummary, DayOfWeek, MonthName};

const LABEL_WIDTH: usize = 15;

fn truncate_label(label: &str) -> String {
    if label.chars().count() > LABEL_WIDTH {
        let head: String = label.chars().take(LABEL_WIDTH).collect();
        format!("{head}...")
    } else {
        label.to_string()
    }
}

/// Areas ordered most dangerous first, ties by name.
pub fn ranked_areas(dashboard: &Dashboard) -> Vec<&AreaSummary> {
    let mut areas: Vec<&AreaSummary> = dashboard.areas.areas.iter().collect();
    areas.sort_by(|a, b| {
        b.danger_index
            .total_cmp(&a.danger_index)
            .then_with(|| a.area_name.cmp(&b.area_name))
    });
    areas
}

pub fn build_report(source: &str, dashboard: &Dashboard) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# LAPD Crime Dataset");
    let _ = writeln!(
        output,
        "Generated from {} ({} incidents)",
        source, dashboard.incident_count
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Crime Throughout the Years");
    if dashboard.monthly.is_empty() {
        let _ = writeln!(output, "No incidents recorded.");
    } else {
        let mut years: Vec<i32> = dashboard.monthly.iter().map(|m| m.year).collect();
        years.dedup();

        let _ = write!(output, "| Month |");
        for year in &years {
            let _ = write!(output, " {year} |");
        }
        let _ = writeln!(output);
        let _ = writeln!(output, "|---|{}", "---|".repeat(years.len()));

        for month in MonthName::ALL {
            let _ = write!(output, "| {month} |");
            for year in &years {
                let count = dashboard
                    .monthly
                    .iter()
                    .find(|m| m.year == *year && m.month == month)
                    .map_or(0, |m| m.count);
                let _ = write!(output, " {count} |");
            }
            let _ = writeln!(output);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Crime Throughout the Days");
    match dashboard.hourly.peak() {
        Some((day, hour, count)) => {
            let _ = writeln!(output, "Busiest slot: {day} at {hour:02}:00 ({count} incidents)");
        }
        None => {
            let _ = writeln!(output, "No incidents recorded.");
        }
    }
    let _ = writeln!(output);
    let _ = write!(output, "| Day |");
    for hour in 0..24 {
        let _ = write!(output, " {hour} |");
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "|---|{}", "---|".repeat(24));
    for day in DayOfWeek::ALL {
        let _ = write!(output, "| {day} |");
        for count in dashboard.hourly.counts[day.index()] {
            let _ = write!(output, " {count} |");
        }
        let _ = writeln!(output);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Type of Crimes");
    let premises = &dashboard.premises;
    if premises.rows.is_empty() {
        let _ = writeln!(output, "No crime types recorded.");
    } else {
        let _ = write!(output, "| Crime Type |");
        for premise in &premises.premises {
            let _ = write!(output, " {premise} |");
        }
        let _ = writeln!(output, " Total |");
        let _ = writeln!(output, "|---|{}---|", "---|".repeat(premises.premises.len()));
        for row in &premises.rows {
            let _ = write!(output, "| {} |", truncate_label(&row.crime_type));
            for count in &row.counts {
                let _ = write!(output, " {count} |");
            }
            let _ = writeln!(output, " {} |", row.total);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Crime and Gender");
    let _ = writeln!(output, "| Age Group | F | M |");
    let _ = writeln!(output, "|---|---|---|");
    for band in &dashboard.victims {
        let _ = writeln!(output, "| {} | {} | {} |", band.label, band.female, band.male);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Crime Area");
    let _ = writeln!(
        output,
        "Danger index range {:.2} to {:.2}; tier cut points {}",
        dashboard.areas.danger_min,
        dashboard.areas.danger_max,
        dashboard
            .areas
            .bounds
            .cut_points
            .iter()
            .map(|cut| format!("{cut:.3}"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "| Area | Total Crimes | Risk Level | Danger Index |");
    let _ = writeln!(output, "|---|---|---|---|");
    for area in ranked_areas(dashboard) {
        let _ = writeln!(
            output,
            "| {} | {} | {} | {:.2} |",
            area.area_name, area.total_crimes, area.risk_level, area.danger_index
        );
    }

    output
}
