//! Error types for the pagination engine.

use std::io;
use thiserror::Error;

use crate::geometry::PageClass;

/// Result type alias for notice-pager operations.
pub type Result<T> = std::result::Result<T, PaginationError>;

/// Errors surfaced by the pagination pipeline.
///
/// Only configuration-level problems ever reach the caller of
/// [`crate::pagination::paginate`]. Content-level anomalies (measurement
/// gaps, rows that cannot be split) are absorbed by the allocator.
#[derive(Error, Debug)]
pub enum PaginationError {
    /// The page geometry leaves no room for content on some page class.
    #[error("page geometry leaves {available}px of content height on {class} pages")]
    Configuration { class: PageClass, available: f32 },

    /// A geometry or policy field is negative or not a finite number.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The measurer could not report a height for a node.
    #[error("measurement failed: {0}")]
    Measurement(String),

    /// Fragments do not reconstruct the original content sequence.
    #[error("content not conserved: {0}")]
    Conservation(String),

    /// A font file could not be parsed.
    #[error("font error: {0}")]
    Font(String),

    /// Configuration or output JSON could not be (de)serialised.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error when reading configuration, fonts or input files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl PaginationError {
    /// True for errors that abort pagination before any page is produced.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PaginationError::Configuration { .. } | PaginationError::InvalidGeometry(_)
        )
    }
}
