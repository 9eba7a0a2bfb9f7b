// In: src/format/mod.rs

//! Defines all on-wire structures and constants for the binary array formats.
//! This is the single source of truth for the single-array payload layout and
//! for the archive container conventions built on top of it.

use crate::array::{DataBuffer, NdArray};
use crate::error::NdPackError;
use crate::types::DType;

pub mod npy;
pub mod npz;

//==================================================================================
// I. Single-Array Payload Format
//==================================================================================

/// The magic number identifying a binary array payload.
pub const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";
/// Offset of the (major, minor) format version bytes.
pub const NPY_VERSION_OFFSET: usize = 6;
/// Offset of the header-length field. Two little-endian bytes for format
/// version 1.x, four for 2.x.
pub const NPY_HEADER_LEN_OFFSET: usize = 8;
/// The format version written by the encoder.
pub const NPY_WRITE_VERSION: (u8, u8) = (1, 0);
/// Headers are padded so that the data offset lands on this alignment.
pub const NPY_HEADER_ALIGN: usize = 64;

//==================================================================================
// II. Archive Container
//==================================================================================

/// The entry-name suffix stripped to form an archive result key.
pub const ARCHIVE_ENTRY_SUFFIX: &str = ".npy";

//==================================================================================
// III. Parsed Payload Record
//==================================================================================

/// The raw result of parsing one binary array payload, before it is wrapped
/// into an `NdArray`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayRecord {
    /// Canonical element type resolved from the header descriptor.
    pub dtype: DType,
    /// Decoded element storage (half-precision already expanded when the
    /// load options ask for it).
    pub data: DataBuffer,
    /// Dimension extents from the header, row-major.
    pub shape: Vec<usize>,
    /// Column-major layout flag, carried through from the header verbatim.
    pub fortran_order: bool,
}

impl ArrayRecord {
    /// Wraps the record into an `NdArray`, enforcing the shape/length
    /// invariant.
    pub fn into_array(self) -> Result<NdArray, NdPackError> {
        NdArray::new(self.data, self.shape, self.dtype)
    }
}
