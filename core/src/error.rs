use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The class x risk warranty model cannot price devices missing either tag.
    #[error("ESW surcharge refused: {} device(s) missing class or risk tag ({})", .serials.len(), .serials.join(", "))]
    IncompleteWarrantyData { serials: Vec<String> },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ForecastResult<T> = Result<T, ForecastError>;
