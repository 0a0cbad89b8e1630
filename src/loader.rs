//! Dataset and classifier loading.
//!
//! Both the dashboard and the predictor go through a single
//! [`DatasetLoader`], constructed once at startup and passed by reference.

use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::classifier::{ClassifierError, LookupClassifier, RiskClassifier};
use crate::config::AppConfig;
use crate::models::RawIncident;

/// Errors that can occur while loading inputs.
#[derive(Debug, Error)]
pub enum LoadError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The incident CSV could not be parsed.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// File being read.
        path: String,
        /// Underlying parser error.
        source: csv::Error,
    },

    /// The classifier artifact could not be loaded.
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),
}

pub trait DatasetLoader {
    fn load_incidents(&self) -> Result<Vec<RawIncident>, LoadError>;

    fn load_classifier(&self) -> Result<Box<dyn RiskClassifier>, LoadError>;
}

/// Loads the incident CSV and classifier artifact from local files.
#[derive(Debug, Clone)]
pub struct FileLoader {
    data_path: PathBuf,
    model_path: PathBuf,
}

impl FileLoader {
    pub fn new(data_path: impl Into<PathBuf>, model_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            model_path: model_path.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.data_path, &config.model_path)
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }
}

impl DatasetLoader for FileLoader {
    fn load_incidents(&self) -> Result<Vec<RawIncident>, LoadError> {
        let path = self.data_path.display().to_string();
        let file = std::fs::File::open(&self.data_path)?;
        let incidents =
            read_incidents(file).map_err(|source| LoadError::Csv { path: path.clone(), source })?;
        log::info!("Loaded {} incidents from {path}", incidents.len());
        Ok(incidents)
    }

    fn load_classifier(&self) -> Result<Box<dyn RiskClassifier>, LoadError> {
        let classifier = LookupClassifier::load(&self.model_path)?;
        Ok(Box::new(classifier))
    }
}

/// Parses incident rows from CSV with a header line. Any malformed row
/// aborts the read.
pub fn read_incidents<R: Read>(reader: R) -> Result<Vec<RawIncident>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    reader.deserialize::<RawIncident>().collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = "\
dr_no,date_occ,area_name,part_1-2,lat,lon,crm_cd_desc,premis_desc,vict_age,vict_sex
190326475,2020-03-01 21:30:00,Wilshire,1,34.0375,-118.3506,VEHICLE - STOLEN,STREET,0,M
200106753,2020-02-08 18:00:00,Central,1,34.0444,-118.2628,BURGLARY FROM VEHICLE,PARKING LOT,47,M
200320258,2020-11-04 17:00:00,Southwest,2,,,THEFT OF IDENTITY,SINGLE FAMILY DWELLING,19,X
";

    #[test]
    fn reads_lapd_columns() {
        let incidents = read_incidents(SAMPLE.as_bytes()).unwrap();
        assert_eq!(incidents.len(), 3);

        let first = &incidents[0];
        assert_eq!(first.id, "190326475");
        assert_eq!(first.area_name, "Wilshire");
        assert_eq!(first.category_code, Some(1));
        assert_eq!(first.crime_description.as_deref(), Some("VEHICLE - STOLEN"));
        assert_eq!(first.premises_description.as_deref(), Some("STREET"));

        let last = &incidents[2];
        assert_eq!(last.category_code, Some(2));
        assert!(last.lat.is_none());
        assert!(last.lon.is_none());
        assert_eq!(last.victim_age, Some(19));
        assert_eq!(last.victim_sex.as_deref(), Some("X"));
    }

    #[test]
    fn tolerates_missing_optional_columns() {
        let csv = "dr_no,date_occ,area_name\n1,2021-01-01 00:00:00,Newton\n";
        let incidents = read_incidents(csv.as_bytes()).unwrap();
        assert_eq!(incidents[0].category_code, None);
        assert!(incidents[0].crime_description.is_none());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let loader = FileLoader::new(file.path(), "missing-model.json");
        assert_eq!(loader.load_incidents().unwrap().len(), 3);
        assert!(matches!(
            loader.load_classifier(),
            Err(LoadError::Classifier(ClassifierError::Io(_)))
        ));
    }

    #[test]
    fn missing_data_file_is_an_io_error() {
        let loader = FileLoader::new("/nonexistent/crimes.csv", "model.json");
        assert!(matches!(loader.load_incidents(), Err(LoadError::Io(_))));
    }
}
