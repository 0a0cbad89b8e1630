use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use la_crime_risk::classifier::{explain, ModelArtifact, PredictionQuery, RiskClassifier};
use la_crime_risk::config::{AppConfig, DEFAULT_DATA_PATH, DEFAULT_MODEL_PATH};
use la_crime_risk::dashboard::build_dashboard;
use la_crime_risk::features::derive_features;
use la_crime_risk::loader::{DatasetLoader, FileLoader};
use la_crime_risk::models::{Incident, RiskLevel};
use la_crime_risk::{map, report, risk};

#[derive(Parser)]
#[command(name = "la-crime-risk")]
#[command(about = "Crime risk dashboard and area risk predictor for LAPD incident data", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Incident CSV file
    #[arg(long, global = true, env = "CRIME_DATA_PATH", default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,
    /// Classifier artifact
    #[arg(long, global = true, env = "CRIME_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,
    /// Weight of normalized crime volume in the danger index
    #[arg(long, global = true, default_value_t = 0.5)]
    volume_weight: f64,
    /// Weight of the Part 1 share in the danger index
    #[arg(long, global = true, default_value_t = 0.5)]
    severity_weight: f64,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank areas by danger index
    Areas {
        #[arg(long, default_value_t = 25)]
        limit: usize,
    },
    /// Generate the markdown dashboard
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export the area danger map as GeoJSON
    Map {
        #[arg(long, default_value = "areas.geojson")]
        out: PathBuf,
    },
    /// Write per (area, month, weekday, hour) training labels as CSV
    Labels {
        #[arg(long, default_value = "training_labels.csv")]
        out: PathBuf,
    },
    /// Build the classifier artifact at the configured model path
    BuildModel,
    /// Predict the risk level for an area at a given time
    Predict {
        #[arg(long)]
        area: String,
        /// Timestamp, e.g. "2024-01-05 14:30"
        #[arg(long)]
        at: String,
    },
}

fn load_derived(loader: &dyn DatasetLoader) -> anyhow::Result<Vec<Incident>> {
    let raw = loader.load_incidents()?;
    let incidents = derive_features(&raw).context("incident file contains corrupt timestamps")?;
    Ok(incidents)
}

fn write_training_labels(
    incidents: &[Incident],
    config: &AppConfig,
    out: &Path,
) -> anyhow::Result<usize> {
    let rows = risk::label_time_buckets(incidents, &config.weights)?;
    let mut writer = csv::Writer::from_path(out)
        .with_context(|| format!("failed to create {}", out.display()))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(rows.len())
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::new(
        cli.global.data,
        cli.global.model,
        cli.global.volume_weight,
        cli.global.severity_weight,
    )?;
    let loader = FileLoader::from_config(&config);
    log::debug!("Using {config:?}");

    match cli.command {
        Commands::Areas { limit } => {
            let incidents = load_derived(&loader)?;
            let scores = risk::score_areas(&incidents, &config.weights)?;

            let mut ranked: Vec<_> = scores.areas.iter().collect();
            ranked.sort_by(|a, b| b.danger_index.total_cmp(&a.danger_index));

            println!("Areas by danger index:");
            for area in ranked.iter().take(limit) {
                let location = area.centroid.map_or_else(
                    || "no location".to_string(),
                    |c| format!("{:.4}, {:.4}", c.lat, c.lon),
                );
                println!(
                    "- {} [{}] danger {:.2} ({} crimes, {} Part 1, {})",
                    area.area_name,
                    area.risk_level,
                    area.danger_index,
                    area.total_crimes,
                    area.part1_crimes,
                    location
                );
            }
        }
        Commands::Report { out } => {
            let incidents = load_derived(&loader)?;
            let dashboard = build_dashboard(&incidents, &config.weights)?;
            let source = loader.data_path().display().to_string();
            std::fs::write(&out, report::build_report(&source, &dashboard))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Map { out } => {
            let incidents = load_derived(&loader)?;
            let scores = risk::score_areas(&incidents, &config.weights)?;
            let geojson = map::area_feature_collection(&scores);
            std::fs::write(&out, serde_json::to_string_pretty(&geojson)?)?;
            println!(
                "Map with {} areas written to {}.",
                scores.areas.len(),
                out.display()
            );
        }
        Commands::Labels { out } => {
            let incidents = load_derived(&loader)?;
            let written = write_training_labels(&incidents, &config, &out)?;
            println!("Wrote {written} labeled buckets to {}.", out.display());
        }
        Commands::BuildModel => {
            let incidents = load_derived(&loader)?;
            let labels = risk::label_time_buckets(&incidents, &config.weights)?;
            let areas = risk::score_areas(&incidents, &config.weights)?;
            ModelArtifact::build(&labels, &areas).save(&config.model_path)?;
            println!("Classifier written to {}.", config.model_path.display());
        }
        Commands::Predict { area, at } => {
            let classifier = loader
                .load_classifier()
                .context("failed to load classifier; run build-model first")?;
            let query = PredictionQuery::parse(&area, &at)?;
            let level = classifier.predict(&query)?;

            let marker = match level {
                RiskLevel::High => "🔴",
                RiskLevel::Medium => "🟡",
                RiskLevel::Low => "🟢",
            };
            println!("{marker} {level} Risk");
            println!("{}", explain(level));
        }
    }

    Ok(())
}
