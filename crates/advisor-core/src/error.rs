// Error handling for the insight advisor

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types surfaced by prioritization and recommendation generation
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum AdvisorError {
    /// Malformed recommendation structure. Logged and excluded, never fatal.
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// AI completion failed or exceeded the run deadline.
    #[error("Generation error for {opportunity}: {message}")]
    Generation {
        opportunity: String,
        message: String,
        timed_out: bool,
    },

    /// AI response did not match the expected structured form.
    #[error("Parsing error: {context} - {message}")]
    Parsing { context: String, message: String },

    /// Invalid weights or thresholds supplied at construction.
    #[error("Configuration error: {field} - {message}")]
    Configuration { field: String, message: String },

    #[error("Internal error during {context}: {message}")]
    Internal { context: String, message: String },
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

pub type AdvisorResult<T> = Result<T, AdvisorError>;

impl AdvisorError {
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        AdvisorError::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AdvisorError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn parsing(context: impl Into<String>, message: impl Into<String>) -> Self {
        AdvisorError::Parsing {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn generation(opportunity: impl Into<String>, message: impl Into<String>) -> Self {
        AdvisorError::Generation {
            opportunity: opportunity.into(),
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn timeout(opportunity: impl Into<String>) -> Self {
        AdvisorError::Generation {
            opportunity: opportunity.into(),
            message: "completion deadline exceeded".to_string(),
            timed_out: true,
        }
    }

    pub fn internal(context: impl Into<String>, message: impl Into<String>) -> Self {
        AdvisorError::Internal {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Whether a template fallback may recover from this error.
    /// Parsing failures are treated the same as generation failures.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AdvisorError::Generation { .. } | AdvisorError::Parsing { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AdvisorError::Generation { timed_out: true, .. })
    }

    /// Append a secondary failure to this error's message, keeping its kind
    /// and timeout flag.
    pub fn with_secondary(self, label: &str, other: &AdvisorError) -> Self {
        let suffix = format!("; {} failed: {}", label, other);
        match self {
            AdvisorError::Validation { field, message } => AdvisorError::Validation {
                field,
                message: message + &suffix,
            },
            AdvisorError::Generation {
                opportunity,
                message,
                timed_out,
            } => AdvisorError::Generation {
                opportunity,
                message: message + &suffix,
                timed_out,
            },
            AdvisorError::Parsing { context, message } => AdvisorError::Parsing {
                context,
                message: message + &suffix,
            },
            AdvisorError::Configuration { field, message } => AdvisorError::Configuration {
                field,
                message: message + &suffix,
            },
            AdvisorError::Internal { context, message } => AdvisorError::Internal {
                context,
                message: message + &suffix,
            },
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AdvisorError::Internal { .. } => ErrorSeverity::Critical,
            AdvisorError::Configuration { .. } => ErrorSeverity::Critical,
            AdvisorError::Generation { .. } => ErrorSeverity::Medium,
            AdvisorError::Parsing { .. } => ErrorSeverity::Medium,
            AdvisorError::Validation { .. } => ErrorSeverity::Low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_errors() {
        assert!(AdvisorError::generation("habit", "boom").is_recoverable());
        assert!(AdvisorError::parsing("ai response", "not json").is_recoverable());
        assert!(AdvisorError::timeout("habit").is_recoverable());
        assert!(!AdvisorError::configuration("weights", "sum is zero").is_recoverable());
        assert!(!AdvisorError::validation("title", "empty").is_recoverable());
    }

    #[test]
    fn test_timeout_flag_and_severity() {
        let err = AdvisorError::timeout("action");
        assert!(err.is_timeout());
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(!AdvisorError::generation("action", "x").is_timeout());
        assert_eq!(
            AdvisorError::internal("prioritization", "nan").severity(),
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn test_secondary_failure_keeps_primary_kind() {
        let fallback = AdvisorError::configuration("templates.t.variables", "no value for 'mood'");
        let err = AdvisorError::timeout("habit").with_secondary("template fallback", &fallback);
        assert!(err.is_timeout());
        let text = err.to_string();
        assert!(text.contains("completion deadline exceeded"));
        assert!(text.contains("template fallback failed"));
        assert!(text.contains("mood"));
    }

    #[test]
    fn test_display_includes_context() {
        let err = AdvisorError::configuration("similarity_threshold", "must be within [0, 1]");
        assert_eq!(
            err.to_string(),
            "Configuration error: similarity_threshold - must be within [0, 1]"
        );
    }
}
