use thiserror::Error;

#[derive(Error, Debug)]
pub enum FermeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("Unrecognized query: {0}")]
    UnrecognizedQuery(String),

    #[error("Plot {0} has no sowing date")]
    MissingSowingDate(i64),

    #[error("Plot {plot_id} has an invalid sowing date: {value}")]
    InvalidSowingDate { plot_id: i64, value: String },
}

pub type Result<T> = std::result::Result<T, FermeError>;
