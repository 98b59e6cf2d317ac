//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout pgchat.
//! All errors are structured and map to specific error codes for JSON output.
//!
//! # Error Categories
//! Fatal (the program halts before or instead of the chat loop):
//! - `ConfigSectionNotFound`: The settings file has no such section
//! - `ConfigError`: The settings file could not be read or parsed
//! - `InvalidSettings`: Required settings are missing or malformed
//! - `MissingCredential`: No database password was configured
//! - `ConnectionFailed`: The database could not be reached or rejected the login
//! - `MissingApiKey`: No API key was supplied for the model service
//!
//! Recoverable (reported inline, the session continues):
//! - `QueryExecutionFailed`: A single query failed
//! - `AgentTurnFailed`: The reasoning loop failed to produce an answer

use thiserror::Error;

/// Main error type for pgchat operations
#[derive(Error, Debug)]
pub enum ChatError {
    /// The requested section is absent from the settings file
    #[error("Section {section} not found in the {file} file")]
    ConfigSectionNotFound { section: String, file: String },

    /// Settings file could not be read or parsed
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Required settings are missing or have invalid values
    #[error("Invalid database settings: {0}")]
    InvalidSettings(String),

    /// Database password is absent or empty
    #[error("Database password is missing in the configuration")]
    MissingCredential,

    /// Database connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query execution failed: {0}")]
    QueryExecutionFailed(String),

    /// The reasoning loop failed for this turn
    #[error("Failed to process the query: {0}")]
    AgentTurnFailed(String),

    /// No API key for the model service
    #[error("API key not found. Please provide one to start the session")]
    MissingApiKey,
}

impl ChatError {
    /// Convert error to error code string for JSON output
    ///
    /// Error codes are stable and suitable for programmatic handling.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigSectionNotFound { .. } => "CONFIG_SECTION_NOT_FOUND",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidSettings(_) => "INVALID_SETTINGS",
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::QueryExecutionFailed(_) => "QUERY_EXECUTION_FAILED",
            Self::AgentTurnFailed(_) => "AGENT_TURN_FAILED",
            Self::MissingApiKey => "MISSING_API_KEY",
        }
    }

    /// Whether this error ends the session
    ///
    /// Per-query and per-turn failures are local; everything else means there
    /// is no usable handle or model client to continue with.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::QueryExecutionFailed(_) | Self::AgentTurnFailed(_))
    }

    /// Get human-readable error message (no credentials)
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Create a section-not-found error
    pub fn section_not_found(section: impl Into<String>, file: impl Into<String>) -> Self {
        Self::ConfigSectionNotFound {
            section: section.into(),
            file: file.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create an invalid settings error
    pub fn invalid_settings(message: impl Into<String>) -> Self {
        Self::InvalidSettings(message.into())
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Create a query failed error
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryExecutionFailed(message.into())
    }

    /// Create an agent turn error
    pub fn agent_failed(message: impl Into<String>) -> Self {
        Self::AgentTurnFailed(message.into())
    }
}

/// Result type alias for pgchat operations
pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ChatError::section_not_found("postgresql", "database.ini").error_code(),
            "CONFIG_SECTION_NOT_FOUND"
        );
        assert_eq!(ChatError::config_error("test").error_code(), "CONFIG_ERROR");
        assert_eq!(ChatError::invalid_settings("test").error_code(), "INVALID_SETTINGS");
        assert_eq!(ChatError::MissingCredential.error_code(), "MISSING_CREDENTIAL");
        assert_eq!(ChatError::connection_failed("test").error_code(), "CONNECTION_FAILED");
        assert_eq!(ChatError::query_failed("test").error_code(), "QUERY_EXECUTION_FAILED");
        assert_eq!(ChatError::agent_failed("test").error_code(), "AGENT_TURN_FAILED");
        assert_eq!(ChatError::MissingApiKey.error_code(), "MISSING_API_KEY");
    }

    #[test]
    fn test_section_not_found_message_names_section_and_file() {
        let err = ChatError::section_not_found("postgresql", "database.ini");
        assert_eq!(err.message(), "Section postgresql not found in the database.ini file");
    }

    #[test]
    fn test_fatal_split() {
        assert!(ChatError::section_not_found("s", "f").is_fatal());
        assert!(ChatError::MissingCredential.is_fatal());
        assert!(ChatError::connection_failed("refused").is_fatal());
        assert!(ChatError::MissingApiKey.is_fatal());

        assert!(!ChatError::query_failed("syntax error").is_fatal());
        assert!(!ChatError::agent_failed("timeout").is_fatal());
    }

    #[test]
    fn test_error_constructors() {
        let err = ChatError::connection_failed("test");
        assert!(matches!(err, ChatError::ConnectionFailed(_)));

        let err = ChatError::query_failed("test");
        assert!(matches!(err, ChatError::QueryExecutionFailed(_)));

        let err = ChatError::agent_failed("test");
        assert!(matches!(err, ChatError::AgentTurnFailed(_)));

        let err = ChatError::section_not_found("a", "b");
        assert!(matches!(err, ChatError::ConfigSectionNotFound { .. }));
    }
}
