use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChurnError {
    #[error("Missing artifact: {artifact} not found at {path}")]
    MissingArtifact { artifact: String, path: String },

    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Degenerate batch: cannot score a batch of {size} record(s)")]
    DegenerateBatch { size: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChurnError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field:  field.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(artifact: impl Into<String>, path: impl Into<String>) -> Self {
        Self::MissingArtifact {
            artifact: artifact.into(),
            path:     path.into(),
        }
    }
}

pub type ChurnResult<T> = Result<T, ChurnError>;
