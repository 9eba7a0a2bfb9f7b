//! This module defines the canonical, type-safe representation of element
//! types used throughout the ndpack pipeline.

use crate::error::NdPackError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The canonical, internal representation of an element type.
///
/// This enum replaces the string-tag registry of previous designs: both lookup
/// surfaces (canonical name and binary descriptor) resolve into one closed set
/// of variants, so an unrecognized tag is an explicit error arm rather than a
/// silent fallthrough, and a duplicated descriptor is impossible to express.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float16,
    Float32,
    Float64,
}

/// The kind of in-memory storage buffer an element type decodes into.
///
/// This differs from the wire dtype in exactly one place: `float16` payloads
/// expand to 32-bit float storage on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl DType {
    /// Resolves a binary descriptor tag (e.g. `<f4`, `|u1`, `u2`) into a `DType`.
    ///
    /// Little-endian (`<`) and byte-order-irrelevant (`|`, `=`) prefixes are
    /// accepted; big-endian payloads are not supported.
    pub fn from_descr(tag: &str) -> Result<Self, NdPackError> {
        let code = tag
            .strip_prefix(&['<', '|', '='][..])
            .unwrap_or(tag);
        match code {
            "u1" => Ok(Self::UInt8),
            "u2" => Ok(Self::UInt16),
            "u4" => Ok(Self::UInt32),
            "u8" => Ok(Self::UInt64),
            "i1" => Ok(Self::Int8),
            "i2" => Ok(Self::Int16),
            "i4" => Ok(Self::Int32),
            "i8" => Ok(Self::Int64),
            "f2" => Ok(Self::Float16),
            "f4" => Ok(Self::Float32),
            "f8" => Ok(Self::Float64),
            _ => Err(NdPackError::UnsupportedDtype(tag.to_string())),
        }
    }

    /// Resolves a canonical dtype name (e.g. `"float32"`) into a `DType`.
    pub fn from_name(name: &str) -> Result<Self, NdPackError> {
        match name {
            "uint8" => Ok(Self::UInt8),
            "uint16" => Ok(Self::UInt16),
            "uint32" => Ok(Self::UInt32),
            "uint64" => Ok(Self::UInt64),
            "int8" => Ok(Self::Int8),
            "int16" => Ok(Self::Int16),
            "int32" => Ok(Self::Int32),
            "int64" => Ok(Self::Int64),
            "float16" => Ok(Self::Float16),
            "float32" => Ok(Self::Float32),
            "float64" => Ok(Self::Float64),

            name => Err(NdPackError::UnsupportedDtype(name.to_string())),
        }
    }

    /// The canonical dtype name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float16 => "float16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    /// The canonical on-wire binary descriptor tag.
    pub fn descr(&self) -> &'static str {
        match self {
            Self::UInt8 => "|u1",
            Self::UInt16 => "<u2",
            Self::UInt32 => "<u4",
            Self::UInt64 => "<u8",
            Self::Int8 => "|i1",
            Self::Int16 => "<i2",
            Self::Int32 => "<i4",
            Self::Int64 => "<i8",
            Self::Float16 => "<f2",
            Self::Float32 => "<f4",
            Self::Float64 => "<f8",
        }
    }

    /// The on-wire width of one element, in bytes.
    pub fn size_of(&self) -> usize {
        match self {
            Self::UInt8 | Self::Int8 => 1,
            Self::UInt16 | Self::Int16 | Self::Float16 => 2,
            Self::UInt32 | Self::Int32 | Self::Float32 => 4,
            Self::UInt64 | Self::Int64 | Self::Float64 => 8,
        }
    }

    /// The in-memory storage kind this dtype decodes into. `float16` expands
    /// to 32-bit float storage.
    pub fn storage(&self) -> StorageKind {
        match self {
            Self::UInt8 => StorageKind::U8,
            Self::UInt16 => StorageKind::U16,
            Self::UInt32 => StorageKind::U32,
            Self::UInt64 => StorageKind::U64,
            Self::Int8 => StorageKind::I8,
            Self::Int16 => StorageKind::I16,
            Self::Int32 => StorageKind::I32,
            Self::Int64 => StorageKind::I64,
            Self::Float16 | Self::Float32 => StorageKind::F32,
            Self::Float64 => StorageKind::F64,
        }
    }

    /// Returns `true` if the dtype is a signed integer.
    pub fn is_signed_int(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    /// Returns `true` if the dtype is an unsigned integer.
    pub fn is_unsigned_int(&self) -> bool {
        matches!(
            self,
            Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64
        )
    }

    /// Returns `true` if the dtype is a floating-point number.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float16 | Self::Float32 | Self::Float64)
    }

    /// Returns `true` if the dtype carries a post-load conversion step
    /// (half-precision expansion).
    pub fn expands_on_load(&self) -> bool {
        matches!(self, Self::Float16)
    }

    /// Every supported dtype, in canonical order. Used by tests to sweep the
    /// lookup surfaces.
    pub const ALL: [DType; 11] = [
        Self::UInt8,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::Float16,
        Self::Float32,
        Self::Float64,
    ];
}

/// Provides the canonical string representation for a `DType`.
impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // These string representations are part of the public contract.
        f.write_str(self.name())
    }
}

//==================================================================================
// Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_roundtrip_all_dtypes() {
        for dtype in DType::ALL {
            assert_eq!(DType::from_name(dtype.name()).unwrap(), dtype);
        }
    }

    #[test]
    fn test_descr_roundtrip_all_dtypes() {
        for dtype in DType::ALL {
            assert_eq!(DType::from_descr(dtype.descr()).unwrap(), dtype);
        }
    }

    #[test]
    fn test_descr_prefix_variants() {
        assert_eq!(DType::from_descr("<u4").unwrap(), DType::UInt32);
        assert_eq!(DType::from_descr("|u4").unwrap(), DType::UInt32);
        assert_eq!(DType::from_descr("u4").unwrap(), DType::UInt32);
        assert_eq!(DType::from_descr("=f8").unwrap(), DType::Float64);
    }

    #[test]
    fn test_unknown_descr_is_rejected() {
        assert!(matches!(
            DType::from_descr(">f4"),
            Err(NdPackError::UnsupportedDtype(_))
        ));
        assert!(matches!(
            DType::from_descr("<c8"),
            Err(NdPackError::UnsupportedDtype(_))
        ));
        assert!(matches!(
            DType::from_name("complex64"),
            Err(NdPackError::UnsupportedDtype(_))
        ));
    }

    #[test]
    fn test_half_precision_storage_expands() {
        assert_eq!(DType::Float16.storage(), StorageKind::F32);
        assert_eq!(DType::Float16.size_of(), 2);
        assert!(DType::Float16.expands_on_load());
        assert!(!DType::Float32.expands_on_load());
    }
}
