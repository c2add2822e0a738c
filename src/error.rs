/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid history export: {0}")]
    Format(String),

    #[error("YouTube API key not configured. Set YOUTUBE_API_KEY to enable watch-time enrichment.")]
    CredentialMissing,

    #[error("YouTube API key looks like a placeholder. Replace it with a real key from the Google Cloud Console.")]
    CredentialInvalid,

    #[error("YouTube API rejected the key: {0}")]
    CredentialRejected(String),

    #[error("Quota or network error: {0}")]
    QuotaOrNetwork(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("External API error: {0}")]
    ExternalApi(String),
}

impl AppError {
    /// Credential-phase errors abort enrichment before any batch call is
    /// issued. Batch-level errors are recorded per batch and skipped.
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            AppError::CredentialMissing
                | AppError::CredentialInvalid
                | AppError::CredentialRejected(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_errors_are_terminal() {
        assert!(AppError::CredentialMissing.is_credential_error());
        assert!(AppError::CredentialInvalid.is_credential_error());
        assert!(AppError::CredentialRejected("403".to_string()).is_credential_error());
    }

    #[test]
    fn test_batch_errors_are_not_terminal() {
        assert!(!AppError::QuotaOrNetwork("quota exceeded".to_string()).is_credential_error());
        assert!(!AppError::Format("not an array".to_string()).is_credential_error());
    }
}
