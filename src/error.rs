//! Error types for the wallaby scheduling engine.

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for wallaby operations.
#[derive(Error, Debug)]
pub enum WallabyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scheduling error: {0}")]
    Scheduling(#[from] SchedulingError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Scheduling-rule violations and lookup failures raised by the engine.
#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("Cannot schedule on closure date {date} ({name})")]
    ClosureViolation { date: NaiveDate, name: String },

    #[error("Camp events cannot fall on a weekend: {date}")]
    WeekendViolation { date: NaiveDate },

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Order is not paid: {0}")]
    OrderNotPaid(String),

    #[error("Recurring template not found: {0}")]
    TemplateNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Student not found: {0}")]
    StudentNotFound(String),

    #[error("No location supplied or location unknown: {0}")]
    MissingLocation(String),

    #[error("Invalid recurring template: {0}")]
    InvalidTemplate(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// Storage-related errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for wallaby operations.
pub type Result<T> = std::result::Result<T, WallabyError>;
