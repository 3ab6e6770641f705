//! # StageKit Common
//!
//! Common utilities, error types, and logging configuration shared by the StageKit crates.
//!
//! ## Features
//!
//! - Unified error type for setup and configuration failures
//! - Logging configuration and setup
//! - JSON configuration for the stage runner

use thiserror::Error;

pub mod config;
pub mod logging;

pub use config::{CanvasConfig, LogSettings, StageKitConfig};
pub use logging::{init_logging, try_init_logging, LogConfig, LogFormat};

/// Unified error type for StageKit.
#[derive(Error, Debug)]
pub enum StageKitError {
    /// Configuration errors.
    #[error("Config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Rendering errors (stage setup or frame submission).
    #[error("Render error: {message}")]
    Render {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Logging could not be installed.
    #[error("Logging error: {0}")]
    Logging(String),

    /// I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl StageKitError {
    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config error with source.
    pub fn config_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a render error.
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
            source: None,
        }
    }

    /// Create a render error with source.
    pub fn render_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Render {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get the error category for log fields.
    pub fn category(&self) -> &'static str {
        match self {
            StageKitError::Config { .. } => "config",
            StageKitError::Render { .. } => "render",
            StageKitError::Logging(_) => "logging",
            StageKitError::Io(_) => "io",
            StageKitError::Json(_) => "json",
            StageKitError::NotFound(_) => "not_found",
            StageKitError::InvalidArgument(_) => "invalid_argument",
        }
    }
}

/// Result type alias for StageKit operations.
pub type Result<T> = std::result::Result<T, StageKitError>;

/// Extension trait for Option.
pub trait OptionExt<T> {
    /// Convert None to a NotFound error.
    fn ok_or_not_found(self, resource: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, resource: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| StageKitError::NotFound(resource.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_categories() {
        assert_eq!(StageKitError::config("test").category(), "config");
        assert_eq!(StageKitError::render("test").category(), "render");
        assert_eq!(
            StageKitError::InvalidArgument("x".into()).category(),
            "invalid_argument"
        );
    }

    #[test]
    fn test_render_with_source_keeps_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "gpu gone");
        let err = StageKitError::render_with_source("stage setup failed", io);
        assert_eq!(err.to_string(), "Render error: stage setup failed");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_option_ext() {
        let some: Option<i32> = Some(42);
        assert_eq!(some.ok_or_not_found("test").unwrap(), 42);

        let none: Option<i32> = None;
        assert!(matches!(
            none.ok_or_not_found("stage"),
            Err(StageKitError::NotFound(name)) if name == "stage"
        ));
    }
}
