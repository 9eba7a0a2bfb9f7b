//! The homogeneous element storage behind an `NdArray`, and the `Scalar`
//! value type used to move single elements across the API boundary.
//!
//! `DataBuffer` is a closed enum over the ten native storage vectors. Every
//! operation that needs per-element-type behavior dispatches with an
//! exhaustive match, so there is exactly one arm per storage kind and no
//! string-driven fallthrough anywhere.

use std::fmt;

use crate::kernels::cast;
use crate::types::{DType, StorageKind};

//==================================================================================
// 1. Scalar
//==================================================================================

/// A single element read out of, or written into, a buffer.
///
/// 64-bit integer lanes stay in their native representation end to end, so a
/// `u64::MAX` element survives every code path without rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    UInt(u64),
    Int(i64),
    Float(f64),
}

impl Scalar {
    pub fn as_u64(&self) -> u64 {
        match *self {
            Scalar::UInt(v) => v,
            Scalar::Int(v) => v as u64,
            Scalar::Float(v) => v as u64,
        }
    }

    pub fn as_i64(&self) -> i64 {
        match *self {
            Scalar::UInt(v) => v as i64,
            Scalar::Int(v) => v,
            Scalar::Float(v) => v as i64,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Scalar::UInt(v) => v as f64,
            Scalar::Int(v) => v as f64,
            Scalar::Float(v) => v,
        }
    }
}

impl From<u64> for Scalar {
    fn from(v: u64) -> Self {
        Scalar::UInt(v)
    }
}

impl From<u32> for Scalar {
    fn from(v: u32) -> Self {
        Scalar::UInt(v as u64)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v as i64)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::Float(v as f64)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::UInt(v) => write!(f, "{}", v),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
        }
    }
}

//==================================================================================
// 2. DataBuffer
//==================================================================================

/// A homogeneous, fixed-length numeric storage buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum DataBuffer {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Evaluates `$body` with `$v` bound to whichever storage vector is live.
macro_rules! dispatch {
    ($self:expr, $v:ident => $body:expr) => {
        match $self {
            DataBuffer::U8($v) => $body,
            DataBuffer::U16($v) => $body,
            DataBuffer::U32($v) => $body,
            DataBuffer::U64($v) => $body,
            DataBuffer::I8($v) => $body,
            DataBuffer::I16($v) => $body,
            DataBuffer::I32($v) => $body,
            DataBuffer::I64($v) => $body,
            DataBuffer::F32($v) => $body,
            DataBuffer::F64($v) => $body,
        }
    };
}

/// Like `dispatch!`, but wraps the result of `$body` back into the same
/// variant, producing a new buffer of the same storage kind.
macro_rules! rebuild {
    ($self:expr, $v:ident => $body:expr) => {
        match $self {
            DataBuffer::U8($v) => DataBuffer::U8($body),
            DataBuffer::U16($v) => DataBuffer::U16($body),
            DataBuffer::U32($v) => DataBuffer::U32($body),
            DataBuffer::U64($v) => DataBuffer::U64($body),
            DataBuffer::I8($v) => DataBuffer::I8($body),
            DataBuffer::I16($v) => DataBuffer::I16($body),
            DataBuffer::I32($v) => DataBuffer::I32($body),
            DataBuffer::I64($v) => DataBuffer::I64($body),
            DataBuffer::F32($v) => DataBuffer::F32($body),
            DataBuffer::F64($v) => DataBuffer::F64($body),
        }
    };
}

impl DataBuffer {
    /// Number of elements in the buffer.
    pub fn len(&self) -> usize {
        dispatch!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The storage kind of the live variant.
    pub fn kind(&self) -> StorageKind {
        match self {
            DataBuffer::U8(_) => StorageKind::U8,
            DataBuffer::U16(_) => StorageKind::U16,
            DataBuffer::U32(_) => StorageKind::U32,
            DataBuffer::U64(_) => StorageKind::U64,
            DataBuffer::I8(_) => StorageKind::I8,
            DataBuffer::I16(_) => StorageKind::I16,
            DataBuffer::I32(_) => StorageKind::I32,
            DataBuffer::I64(_) => StorageKind::I64,
            DataBuffer::F32(_) => StorageKind::F32,
            DataBuffer::F64(_) => StorageKind::F64,
        }
    }

    /// Whether this buffer is a legal storage for `dtype`. `float16` accepts
    /// both expanded (f32) and raw packed (u16) storage.
    pub fn matches(&self, dtype: DType) -> bool {
        self.kind() == dtype.storage()
            || (dtype == DType::Float16 && self.kind() == StorageKind::U16)
    }

    /// Reads the element at `index`.
    ///
    /// The index must already be bounds-checked by the caller; flat offsets
    /// inside this crate are always derived from a validated shape.
    pub fn get(&self, index: usize) -> Scalar {
        match self {
            DataBuffer::U8(v) => Scalar::UInt(u64::from(v[index])),
            DataBuffer::U16(v) => Scalar::UInt(u64::from(v[index])),
            DataBuffer::U32(v) => Scalar::UInt(u64::from(v[index])),
            DataBuffer::U64(v) => Scalar::UInt(v[index]),
            DataBuffer::I8(v) => Scalar::Int(i64::from(v[index])),
            DataBuffer::I16(v) => Scalar::Int(i64::from(v[index])),
            DataBuffer::I32(v) => Scalar::Int(i64::from(v[index])),
            DataBuffer::I64(v) => Scalar::Int(v[index]),
            DataBuffer::F32(v) => Scalar::Float(f64::from(v[index])),
            DataBuffer::F64(v) => Scalar::Float(v[index]),
        }
    }

    /// Writes `value` at `index`, converting to the element type with the
    /// usual numeric casts (out-of-range values truncate, as typed stores do).
    pub fn set(&mut self, index: usize, value: Scalar) {
        match self {
            DataBuffer::U8(v) => v[index] = value.as_u64() as u8,
            DataBuffer::U16(v) => v[index] = value.as_u64() as u16,
            DataBuffer::U32(v) => v[index] = value.as_u64() as u32,
            DataBuffer::U64(v) => v[index] = value.as_u64(),
            DataBuffer::I8(v) => v[index] = value.as_i64() as i8,
            DataBuffer::I16(v) => v[index] = value.as_i64() as i16,
            DataBuffer::I32(v) => v[index] = value.as_i64() as i32,
            DataBuffer::I64(v) => v[index] = value.as_i64(),
            DataBuffer::F32(v) => v[index] = value.as_f64() as f32,
            DataBuffer::F64(v) => v[index] = value.as_f64(),
        }
    }

    /// Builds a new buffer of the same kind by picking elements at `indices`,
    /// in order.
    pub fn gather(&self, indices: &[usize]) -> DataBuffer {
        rebuild!(self, v => indices.iter().map(|&i| v[i]).collect())
    }

    /// Builds a new buffer of the same kind and length where element `i` of
    /// this buffer lands at position `mapping[i]`. `mapping` must be a
    /// permutation of `0..len`.
    pub fn scatter(&self, mapping: &[usize]) -> DataBuffer {
        rebuild!(self, v => {
            let mut out = vec![Default::default(); mapping.len()];
            for (i, &dst) in mapping.iter().enumerate() {
                out[dst] = v[i];
            }
            out
        })
    }

    /// Builds a buffer of `dtype`'s storage kind out of scalar values.
    /// This is the factory used by the JSON decode paths; 64-bit integer
    /// dtypes go through the native u64/i64 lanes, everything else through
    /// the numeric casts.
    pub fn from_scalars(dtype: DType, values: &[Scalar]) -> DataBuffer {
        match dtype.storage() {
            StorageKind::U8 => DataBuffer::U8(values.iter().map(|s| s.as_u64() as u8).collect()),
            StorageKind::U16 => {
                DataBuffer::U16(values.iter().map(|s| s.as_u64() as u16).collect())
            }
            StorageKind::U32 => {
                DataBuffer::U32(values.iter().map(|s| s.as_u64() as u32).collect())
            }
            StorageKind::U64 => DataBuffer::U64(values.iter().map(|s| s.as_u64()).collect()),
            StorageKind::I8 => DataBuffer::I8(values.iter().map(|s| s.as_i64() as i8).collect()),
            StorageKind::I16 => {
                DataBuffer::I16(values.iter().map(|s| s.as_i64() as i16).collect())
            }
            StorageKind::I32 => {
                DataBuffer::I32(values.iter().map(|s| s.as_i64() as i32).collect())
            }
            StorageKind::I64 => DataBuffer::I64(values.iter().map(|s| s.as_i64()).collect()),
            StorageKind::F32 => {
                DataBuffer::F32(values.iter().map(|s| s.as_f64() as f32).collect())
            }
            StorageKind::F64 => DataBuffer::F64(values.iter().map(|s| s.as_f64()).collect()),
        }
    }

    /// Flat copy of every element as a `Scalar`.
    pub fn to_scalars(&self) -> Vec<Scalar> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }

    /// Serializes the buffer into little-endian element bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        dispatch!(self, v => cast::typed_slice_to_bytes(v))
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_preserve_u64_precision() {
        let mut buf = DataBuffer::U64(vec![0, 0]);
        buf.set(1, Scalar::UInt(u64::MAX));
        assert_eq!(buf.get(1), Scalar::UInt(u64::MAX));
        assert_eq!(buf.get(0), Scalar::UInt(0));
    }

    #[test]
    fn test_set_truncates_like_a_typed_store() {
        let mut buf = DataBuffer::U8(vec![0]);
        buf.set(0, Scalar::UInt(300));
        assert_eq!(buf.get(0), Scalar::UInt(300 % 256));
    }

    #[test]
    fn test_gather_keeps_storage_kind() {
        let buf = DataBuffer::I16(vec![10, 20, 30, 40]);
        let picked = buf.gather(&[3, 0]);
        assert_eq!(picked, DataBuffer::I16(vec![40, 10]));
    }

    #[test]
    fn test_scatter_permutes() {
        let buf = DataBuffer::F64(vec![1.0, 2.0, 3.0]);
        let out = buf.scatter(&[2, 0, 1]);
        assert_eq!(out, DataBuffer::F64(vec![2.0, 3.0, 1.0]));
    }

    #[test]
    fn test_from_scalars_uses_native_integer_lanes() {
        let values = [Scalar::UInt(u64::MAX), Scalar::UInt(1)];
        let buf = DataBuffer::from_scalars(DType::UInt64, &values);
        assert_eq!(buf, DataBuffer::U64(vec![u64::MAX, 1]));
    }

    #[test]
    fn test_matches_accepts_raw_half_storage() {
        assert!(DataBuffer::F32(vec![]).matches(DType::Float16));
        assert!(DataBuffer::U16(vec![]).matches(DType::Float16));
        assert!(!DataBuffer::F64(vec![]).matches(DType::Float16));
    }
}
