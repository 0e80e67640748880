//! Error types for the design renderer

use thiserror::Error;

/// Result type alias for rendering operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning a page description into HTML
#[derive(Error, Debug)]
pub enum Error {
    /// A color string could not be parsed
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// An element is missing fields its renderer needs
    #[error("Invalid element: {0}")]
    InvalidElement(String),

    /// SVG markup could not be parsed or rewritten
    #[error("SVG processing failed: {0}")]
    SvgError(String),

    /// Network error while fetching an asset
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Failed to render content
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The page JSON could not be decoded
    #[error("Failed to parse page: {0}")]
    ParseError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ParseError(err.to_string())
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::SvgError(err.to_string())
    }
}
