use thiserror::Error;

#[derive(Debug, Error)]
pub enum CourtflowError {
    #[error("not initialized: run 'courtflow init'")]
    NotInitialized,

    #[error("store unavailable: {0}")]
    Transport(String),

    #[error("{collection} record not found: {id}")]
    NotFound { collection: String, id: String },

    #[error("invalid activity order: {0}")]
    InvalidOrder(String),

    #[error("invalid value '{value}' for field '{field}'")]
    InvalidValue { field: String, value: String },

    #[error("invalid category: {0}")]
    InvalidCategory(String),

    #[error("malformed {collection} row: {reason}")]
    MalformedRow { collection: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CourtflowError {
    pub fn not_found(collection: impl std::fmt::Display, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.into(),
        }
    }

    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Input was rejected before any store call was made.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidOrder(_) | Self::InvalidValue { .. } | Self::InvalidCategory(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for CourtflowError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CourtflowError>;
