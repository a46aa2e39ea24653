use crate::store::StoreError;

/// Errors surfaced by core services.
///
/// The variants map onto the three failure tiers the API exposes: caller mistakes
/// (`Validation`, `NotFound`, `Precondition`), authentication problems (`Unauthorized`,
/// `Forbidden`) and everything else, which is reported as an internal error.
#[derive(Debug, thiserror::Error)]
pub enum HisError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Precondition(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("invalid record code: {0}")]
    Code(#[from] his_ids::IdError),
    #[error("credential error: {0}")]
    Credentials(String),
    #[error("failed to render PDF: {0}")]
    Pdf(String),
    #[error("failed to read catalogue file: {0}")]
    CatalogRead(std::io::Error),
    #[error("invalid catalogue file: {0}")]
    CatalogParse(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl HisError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// True for errors caused by the caller rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            HisError::Validation(_)
                | HisError::NotFound(_)
                | HisError::Precondition(_)
                | HisError::Unauthorized(_)
                | HisError::Forbidden(_)
                | HisError::Store(StoreError::Duplicate(_))
        )
    }
}

pub type HisResult<T> = std::result::Result<T, HisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        assert_eq!(HisError::NotFound("Patient").to_string(), "Patient not found");
    }

    #[test]
    fn test_duplicate_is_client_error() {
        let err = HisError::from(StoreError::Duplicate("users_email".into()));
        assert!(err.is_client_error());
        assert!(!HisError::Pdf("boom".into()).is_client_error());
    }
}
