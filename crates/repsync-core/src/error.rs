use thiserror::Error;

/// Application-wide error types.
///
/// This enum represents all possible errors that can occur in Repsync.
/// It uses the `thiserror` crate for ergonomic error handling and automatic
/// conversion from underlying library errors.
///
/// # Error Conversion
///
/// Most errors automatically convert from their source types using the
/// `#[from]` attribute:
/// - `sqlx::Error` → `AppError::DatabaseError`
/// - `serde_json::Error` → `AppError::SerializationError`
/// - `csv::Error` → `AppError::CsvError`
///
/// # Examples
///
/// ```no_run
/// use repsync_core::error::AppError;
///
/// fn example() -> Result<(), AppError> {
///     Err(AppError::Generic("Something went wrong".to_string()))
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Database operation failed.
    ///
    /// Wraps all SQLx errors except unique-constraint violations, which are
    /// surfaced separately as [`AppError::DuplicateName`] so the reconciler
    /// can recover from concurrent-create races.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// A unique constraint on an entity name was violated.
    ///
    /// The reconciler treats this as evidence that a concurrent writer
    /// created the same natural key and downgrades the row to a skip
    /// instead of failing the batch.
    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// HTTP client request failed.
    #[error("API Client error: {0}")]
    ClientError(String),

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// CSV file could not be parsed.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A referenced entity does not exist.
    ///
    /// Raised when an import row names an entity that must pre-exist,
    /// e.g. equipment referenced by an exercise row.
    #[error("Not found: {0}")]
    EntityNotFound(String),

    /// Configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Network or connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded. Please wait and try again.")]
    RateLimitExceeded,

    /// Generic application error for cases not covered by specific variants.
    ///
    /// Use this sparingly - prefer creating specific error variants
    /// for better error handling and debugging.
    #[error("Error: {0}")]
    Generic(String),
}

impl AppError {
    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::DatabaseError(e) => {
                if e.to_string().contains("connection") {
                    "Cannot connect to database. Is PostgreSQL running?\n   Try: docker-compose up -d".to_string()
                } else {
                    format!("Database error: {}", e)
                }
            }
            AppError::ClientError(msg) => {
                if msg.contains("timeout") || msg.contains("timed out") {
                    "Request timed out. The source API may be slow or unreachable.\n   Try again later or check the source URL.".to_string()
                } else if msg.contains("connect") {
                    format!(
                        "Cannot connect to source API: {}\n   Check your internet connection and the source URL.",
                        msg
                    )
                } else {
                    format!("API error: {}", msg)
                }
            }
            AppError::NetworkError(msg) => {
                format!("Network error: {}\n   Check your internet connection.", msg)
            }
            AppError::Timeout(secs) => {
                format!(
                    "Request timed out after {} seconds.\n   The server may be overloaded. Try again later.",
                    secs
                )
            }
            AppError::RateLimitExceeded => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            AppError::InvalidUrl(url) => {
                format!("Invalid URL: {}\n   Example: https://wger.de/api/v2", url)
            }
            _ => self.to_string(),
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// # Examples
    ///
    /// ```
    /// use repsync_core::error::AppError;
    ///
    /// // Network errors are retryable
    /// let err = AppError::NetworkError("connection reset".to_string());
    /// assert!(err.is_retryable());
    ///
    /// // A missing referenced entity is NOT retryable
    /// let err = AppError::EntityNotFound("equipment 'Barbell'".to_string());
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::NetworkError(_)
                | AppError::Timeout(_)
                | AppError::RateLimitExceeded
                | AppError::ClientError(_)
        )
    }

    /// Returns true if this error is a unique-constraint violation.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, AppError::DuplicateName(_))
    }
}
