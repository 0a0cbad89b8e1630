use thiserror::Error;

/// Errors raised by the feature and scoring pipeline.
#[derive(Debug, Error)]
pub enum RiskError {
    /// A timestamp could not be parsed; the whole batch is rejected.
    #[error("Data format error: incident {id} (row {row}) has unparsable timestamp {value:?}")]
    DataFormat {
        /// 1-based position of the incident within the batch.
        row: usize,
        /// Identifier of the offending incident.
        id: String,
        /// The raw timestamp text.
        value: String,
    },

    /// Scoring needs at least one incident to normalize against.
    #[error("Empty input: at least one incident is required to score areas")]
    EmptyInput,

    /// Blend weights were rejected.
    #[error("Invalid danger weights: {message}")]
    InvalidWeights {
        /// Description of what went wrong.
        message: String,
    },
}
