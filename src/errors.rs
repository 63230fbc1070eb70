/*!
 * Error types for the office-translator application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 *
 * Only `AppError::Configuration`, `AppError::UnsupportedFormat` and
 * `AppError::Codec` end a run. `TranslationError` is absorbed per leaf by the
 * translation port and never escapes a document walk.
 */

use thiserror::Error;

/// Errors that can occur when calling a translation backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting or quota
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Operation the backend does not offer
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl TranslationError {
    /// Whether another attempt at the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

/// Errors raised while reading or writing an office package
#[derive(Error, Debug)]
pub enum CodecError {
    /// File system failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The ZIP container could not be read or written
    #[error("ZIP error: {0}")]
    Zip(String),

    /// A package part is not well-formed XML
    #[error("XML error in {part}: {message}")]
    Xml {
        /// Part name inside the package
        part: String,
        /// Parser message
        message: String,
    },

    /// A part required by the format is absent
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// The XML is well-formed but does not describe a valid document
    #[error("Malformed document: {0}")]
    Malformed(String),

    /// The package exceeds a safety limit
    #[error("Package limit exceeded: {0}")]
    Limit(String),

    /// The spreadsheet reader or writer rejected the workbook
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),
}

impl From<zip::result::ZipError> for CodecError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::Zip(error.to_string())
    }
}

impl From<calamine::XlsxError> for CodecError {
    fn from(error: calamine::XlsxError) -> Self {
        Self::Spreadsheet(error.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for CodecError {
    fn from(error: rust_xlsxwriter::XlsxError) -> Self {
        Self::Spreadsheet(error.to_string())
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid settings, detected before any document I/O
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The input path does not name a supported document type
    #[error("Unsupported file type: {0}. Supported types are .xlsx and .pptx")]
    UnsupportedFormat(String),

    /// Error from the document codec
    #[error("Document error: {0}")]
    Codec(#[from] CodecError),

    /// Backend failure outside a document walk (terminology import)
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),
}

impl AppError {
    /// Recognized user-facing failures, as opposed to unexpected ones
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::UnsupportedFormat(_))
    }
}
