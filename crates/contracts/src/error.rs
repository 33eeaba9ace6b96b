//! Layered error definitions
//!
//! Categorized by source: config / source / scan / conversion

use thiserror::Error;

/// Unified extraction error
#[derive(Debug, Error)]
pub enum ExtractError {
    // ===== Configuration Errors =====
    /// Engine cannot be initialized with the current settings
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Textual timestamp could not be parsed
    #[error("invalid timestamp '{value}': {message}")]
    TimestampParse { value: String, message: String },

    // ===== Lifecycle Errors =====
    /// `extract()` before a successful `init()`
    #[error("extractor not initialized, call init() first")]
    Uninitialized,

    // ===== Source Errors =====
    /// Frame source failed to open its stream
    #[error("frame source unavailable: {0}")]
    SourceUnavailable(#[source] SourceError),

    /// Frame source failed mid-scan
    #[error("frame source failed at position {position}: {source}")]
    Source {
        position: usize,
        #[source]
        source: SourceError,
    },

    // ===== Conversion Errors =====
    /// Buffer length disagrees with its resolution
    #[error("{kind} buffer mismatch: expected {expected} values for {width}x{height}, got {actual}")]
    BufferMismatch {
        kind: &'static str,
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// Projector returned a different number of points than requested
    #[error("projector returned {actual} points, expected {expected}")]
    Projection { expected: usize, actual: usize },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Create configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create timestamp parse error
    pub fn timestamp_parse(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TimestampParse {
            value: value.into(),
            message: message.into(),
        }
    }
}

/// Error reported by a `FrameSource` implementation
#[derive(Debug, Error)]
pub enum SourceError {
    /// Recording could not be opened
    #[error("cannot open recording '{path}': {message}")]
    Open { path: String, message: String },

    /// Recording metadata is malformed
    #[error("malformed recording: {message}")]
    Malformed { message: String },

    /// Frame data could not be decoded
    #[error("cannot decode frame {index}: {message}")]
    Decode { index: usize, message: String },

    /// `advance()` past the last frame
    #[error("end of stream after {frame_count} frames")]
    EndOfStream { frame_count: usize },

    /// Source used before `open()` or after `release()`
    #[error("source is not open")]
    NotOpen,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Create malformed-recording error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Create decode error
    pub fn decode(index: usize, message: impl Into<String>) -> Self {
        Self::Decode {
            index,
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, ExtractError>;
