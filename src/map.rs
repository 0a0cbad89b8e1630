//! `GeoJSON` export of the area danger map.

use serde_json::{json, Value};

use crate::models::AreaRiskReport;

pub const MAP_CENTER: (f64, f64) = (34.05, -118.25);
pub const MAP_ZOOM: u8 = 10;
pub const MARKER_SCALE: f64 = 35.0;

/// ColorBrewer YlOrRd, 9 classes.
const YL_OR_RD_9: [(u8, u8, u8); 9] = [
    (0xff, 0xff, 0xcc),
    (0xff, 0xed, 0xa0),
    (0xfe, 0xd9, 0x76),
    (0xfe, 0xb2, 0x4c),
    (0xfd, 0x8d, 0x3c),
    (0xfc, 0x4e, 0x2a),
    (0xe3, 0x1a, 0x1c),
    (0xbd, 0x00, 0x26),
    (0x80, 0x00, 0x26),
];

/// Linear color scale over `[min, max]`.
#[derive(Debug, Clone, Copy)]
pub struct ColorScale {
    min: f64,
    max: f64,
}

impl ColorScale {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Hex color for `value`; out-of-range values clamp to the ends.
    pub fn color(&self, value: f64) -> String {
        let span = self.max - self.min;
        let t = if span > 0.0 {
            ((value - self.min) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let position = t * (YL_OR_RD_9.len() - 1) as f64;
        let lower = position.floor() as usize;
        let upper = (lower + 1).min(YL_OR_RD_9.len() - 1);
        let fraction = position - lower as f64;

        let mix = |a: u8, b: u8| -> u8 {
            (f64::from(a) + (f64::from(b) - f64::from(a)) * fraction).round() as u8
        };
        let (r0, g0, b0) = YL_OR_RD_9[lower];
        let (r1, g1, b1) = YL_OR_RD_9[upper];
        format!("#{:02x}{:02x}{:02x}", mix(r0, r1), mix(g0, g1), mix(b0, b1))
    }
}

/// One point feature per located area. Areas without a centroid are listed
/// under `unlocatedAreas` instead of being placed at a made-up position.
pub fn area_feature_collection(report: &AreaRiskReport) -> Value {
    let scale = ColorScale::new(report.danger_min, report.danger_max);
    let mut features = Vec::new();
    let mut unlocated = Vec::new();

    for area in &report.areas {
        let Some(centroid) = area.centroid else {
            unlocated.push(area.area_name.clone());
            continue;
        };

        features.push(json!({
            "type": "Feature",
            "geometry": {
                "type": "Point",
                "coordinates": [centroid.lon, centroid.lat]
            },
            "properties": {
                "areaName": area.area_name,
                "totalCrimes": area.total_crimes,
                "part1Crimes": area.part1_crimes,
                "severityIndex": area.severity_index,
                "crimeNorm": area.crime_norm,
                "dangerIndex": area.danger_index,
                "riskLevel": area.risk_level.to_string(),
                "radius": area.danger_index * MARKER_SCALE,
                "color": scale.color(area.danger_index),
            }
        }));
    }

    if !unlocated.is_empty() {
        log::warn!(
            "{} areas left off the map without coordinates: {}",
            unlocated.len(),
            unlocated.join(", ")
        );
    }

    json!({
        "type": "FeatureCollection",
        "features": features,
        "dangerRange": {
            "min": report.danger_min,
            "max": report.danger_max,
        },
        "tierCutPoints": report.bounds.cut_points,
        "view": {
            "center": [MAP_CENTER.0, MAP_CENTER.1],
            "zoom": MAP_ZOOM,
        },
        "unlocatedAreas": unlocated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DangerWeights;
    use crate::features::tests::raw;
    use crate::risk::score_areas;

    #[test]
    fn scale_spans_palette() {
        let scale = ColorScale::new(0.2, 0.8);
        assert_eq!(scale.color(0.2), "#ffffcc");
        assert_eq!(scale.color(0.8), "#800026");
        assert_eq!(scale.color(5.0), "#800026");
        assert_eq!(scale.color(0.5), "#fd8d3c");
        assert_eq!(ColorScale::new(0.5, 0.5).color(0.5), "#ffffcc");
    }

    #[test]
    fn exports_located_areas_only() {
        let mut rows = vec![
            raw("1", "2023-01-01 00:00:00", "Central", 1),
            raw("2", "2023-01-01 00:00:00", "Central", 1),
            raw("3", "2023-01-01 00:00:00", "Harbor", 2),
        ];
        rows[2].lat = None;

        let report = score_areas(&rows, &DangerWeights::default()).unwrap();
        let map = area_feature_collection(&report);

        assert_eq!(map["type"], "FeatureCollection");
        let features = map["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);

        let central = &features[0];
        assert_eq!(central["properties"]["areaName"], "Central");
        assert_eq!(central["properties"]["riskLevel"], "High");
        assert_eq!(central["properties"]["radius"], 35.0);
        assert_eq!(central["properties"]["color"], "#800026");
        assert_eq!(central["geometry"]["coordinates"][0], -118.25);

        assert_eq!(map["unlocatedAreas"], json!(["Harbor"]));
        assert_eq!(map["dangerRange"]["max"], 1.0);
    }
}
