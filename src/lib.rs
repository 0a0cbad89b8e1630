//! Area risk scoring over LAPD crime incidents.
//!
//! Raw CSV rows are loaded through a [`loader::DatasetLoader`], enriched
//! with calendar features by [`features::derive_features`], and scored per
//! area by [`risk::score_areas`]. The scores feed the markdown dashboard,
//! the `GeoJSON` map and the training labels behind the risk classifier.

pub mod classifier;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod features;
pub mod loader;
pub mod map;
pub mod models;
pub mod report;
pub mod risk;
