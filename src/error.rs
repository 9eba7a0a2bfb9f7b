// In: src/error.rs

//! This module defines the single, unified error type for the entire ndpack library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NdPackError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to our library's logic)
    // =========================================================================
    #[error("Data length {actual} does not match shape product {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Unsupported dtype: {0}")]
    UnsupportedDtype(String),

    #[error("Malformed array header: {0}")]
    MalformedHeader(String),

    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    #[error("Index {index} out of bounds for axis {axis} with extent {extent}")]
    IndexOutOfBounds {
        axis: usize,
        index: i64,
        extent: usize,
    },

    #[error("Axis {axis} out of bounds for an array of {ndim} dimensions")]
    AxisOutOfBounds { axis: isize, ndim: usize },

    #[error("Too many indices: got {given} for an array of {ndim} dimensions")]
    TooManyIndices { given: usize, ndim: usize },

    #[error("Cannot broadcast {actual} values onto {expected} target positions")]
    BroadcastMismatch { expected: usize, actual: usize },

    #[error("Reshape accepts at most one wildcard (-1) dimension")]
    MultipleWildcards,

    #[error("Known dimensions (product {known}) do not evenly divide {size} elements")]
    IndivisibleShape { size: usize, known: usize },

    #[error("Requested shape holds {actual} elements, but the array has {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Invalid axis permutation: {0}")]
    InvalidPermutation(String),

    #[error("Could not determine the interchange format of the value")]
    FormatUnknown,

    #[error("Missing or invalid metadata field: {0}")]
    MissingMetadata(String),

    #[error("Invalid encoded payload: {0}")]
    InvalidEncoding(String),

    #[error("Cannot reduce an array with zero elements")]
    EmptyReduction,

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the underlying I/O subsystem (e.g., file not found).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically during header/value parsing.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An error from a safe byte-casting operation failing.
    #[error("Byte slice casting error: {0}")]
    PodCast(String), // Manual `From` impl is needed as bytemuck::PodCastError doesn't impl Error

    // =========================================================================
    // === Low-Level Buffer Errors
    // =========================================================================
    #[error("Buffer length mismatch: expected a multiple of {0}, got {1}")]
    BufferMismatch(usize, usize),
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

impl From<bytemuck::PodCastError> for NdPackError {
    fn from(err: bytemuck::PodCastError) -> Self {
        NdPackError::PodCast(err.to_string())
    }
}
