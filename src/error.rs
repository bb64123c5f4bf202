//! Error types for polyline decoding and route analysis.
//!
//! Structural problems with the input (bad polylines, empty point sets, invalid
//! bounding boxes, routes too short to measure) are fatal and surface as
//! [`AnalysisError`]. Failing to fetch green-space data is reported as a
//! [`FetchError`] by the collaborator, but the orchestrator never lets it escape:
//! it degrades to an empty green-space set instead.

use thiserror::Error;

use crate::BoundingBox;

/// A malformed encoded polyline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The string ended in the middle of a value, or a latitude had no longitude.
    #[error("polyline truncated at byte {position}")]
    Truncated { position: usize },

    /// A byte outside the polyline alphabet (`?` to `~`).
    #[error("invalid polyline byte 0x{byte:02x} at position {position}")]
    InvalidCharacter { byte: u8, position: usize },

    /// A value used more continuation chunks than fit in 64 bits, or a running
    /// coordinate total left the `i64` range.
    #[error("polyline value overflows at byte {position}")]
    Overflow { position: usize },
}

/// Fatal errors returned by the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("failed to decode route polyline: {0}")]
    Decode(#[from] DecodeError),

    #[error("cannot compute a bounding box of zero points")]
    EmptyInput,

    #[error(
        "invalid bounding box (south={}, west={}, north={}, east={})",
        .0.south, .0.west, .0.north, .0.east
    )]
    InvalidBoundingBox(BoundingBox),

    #[error("route needs at least 2 points, got {points}")]
    Route { points: usize },
}

/// Failure reported by a green-space source.
///
/// Never surfaced by [`crate::analyze_route`]; see
/// [`crate::GreenSpaceOutcome::Unavailable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("green-space fetch failed: {message}")]
pub struct FetchError {
    pub message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
