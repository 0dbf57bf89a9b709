//! Error types for pageshow

use crate::document::ElementId;
use thiserror::Error;

/// Result type alias for pageshow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for pageshow operations
#[derive(Error, Debug)]
pub enum Error {
    /// An element the feature depends on is not in the document
    #[error("Missing element: {0}")]
    MissingElement(String),

    /// The element was removed from the document after it was resolved
    #[error("Element {0} is detached from the document")]
    DetachedElement(ElementId),

    /// Selector could not be parsed
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// No image in the set has known natural dimensions
    #[error("No image has known natural dimensions")]
    NoImageDimensions,

    /// The host refused to start media playback
    #[error("Playback rejected: {0}")]
    PlaybackRejected(String),

    /// Invalid input parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image probing error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error describes a degraded page rather than a fault.
    ///
    /// Missing elements and unmeasurable image sets are expected on some
    /// pages and are reported as warnings.
    pub fn is_degradation(&self) -> bool {
        matches!(
            self,
            Error::MissingElement(_) | Error::NoImageDimensions | Error::PlaybackRejected(_)
        )
    }
}
