//! Unified error hierarchy for GlycoSim
//!
//! The metabolic core treats physiological outcomes (reserve exhaustion,
//! clamped inputs) as data, never as errors; this hierarchy covers the
//! surfaces that can actually fail: file import/export, configuration,
//! and degenerate calculation inputs.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all GlycoSim operations
#[derive(Debug, Error)]
pub enum GlycoError {
    /// Workout / lab-report import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Calculation errors
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised while parsing external workout or lab-report files
#[derive(Debug, Error)]
pub enum ImportError {
    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Unsupported file format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Format-specific parsing failure
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// A column or element the parser requires is missing
    #[error("Missing required data: {field}")]
    MissingData { field: String },

    /// IO failure while reading
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while writing simulation output
#[derive(Debug, Error)]
pub enum ExportError {
    /// Unsupported output format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Write failure
    #[error("Export failed to {path}: {reason}")]
    ExportFailed { path: PathBuf, reason: String },

    /// IO failure while writing
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Calculation errors; degenerate inputs the core cannot default away
#[derive(Debug, Error)]
pub enum CalculationError {
    /// Invalid parameter value
    #[error("Invalid parameter for {calculation}: {parameter}={value}")]
    InvalidParameter {
        calculation: String,
        parameter: String,
        value: String,
    },

    /// Not enough data to perform the calculation
    #[error("Insufficient data for {calculation}: {reason}")]
    InsufficientData { calculation: String, reason: String },
}

/// Result type alias for GlycoSim operations
pub type Result<T> = std::result::Result<T, GlycoError>;

/// Error severity levels, mapped to tracing levels for log reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Critical,
    Error,
    Warning,
}

impl ErrorSeverity {
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical | ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}

impl GlycoError {
    /// Severity for log reporting
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            GlycoError::Import(ImportError::FileNotFound { .. }) => ErrorSeverity::Warning,
            GlycoError::Import(_) => ErrorSeverity::Error,
            GlycoError::Export(_) => ErrorSeverity::Error,
            GlycoError::Calculation(_) => ErrorSeverity::Warning,
            GlycoError::Configuration(_) => ErrorSeverity::Error,
            GlycoError::Io(_) => ErrorSeverity::Error,
            GlycoError::Internal(_) => ErrorSeverity::Critical,
        }
    }

    /// User-facing message without internal detail
    pub fn user_message(&self) -> String {
        match self {
            GlycoError::Import(ImportError::FileNotFound { path }) => {
                format!("Could not find input file: {}", path.display())
            }
            GlycoError::Import(ImportError::MissingData { field }) => {
                format!(
                    "The uploaded file is missing required data: {}. Check the column headers.",
                    field
                )
            }
            GlycoError::Configuration(msg) => {
                format!("Configuration problem: {}. Run `glycosim config` to inspect.", msg)
            }
            _ => self.to_string(),
        }
    }
}
