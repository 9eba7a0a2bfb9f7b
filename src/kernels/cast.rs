//! This module contains the pure, stateless kernels for constructing typed
//! element buffers out of raw little-endian bytes.
//!
//! This is the explicit dtype-to-buffer factory: callers resolve a `DType`
//! first and dispatch through `buffer_from_le_bytes`, rather than deriving a
//! constructor from some existing buffer value. This module is PURE RUST,
//! panic-free, and relies on `bytemuck` for safety.

use bytemuck::{Pod, Zeroable};

use crate::array::DataBuffer;
use crate::error::NdPackError;
use crate::kernels::float16;
use crate::types::{DType, StorageKind};

//==================================================================================
// 1. Generic Slice Conversions
//==================================================================================

/// Copies a raw byte slice into an owned, typed vector.
///
/// The copy goes through `bytemuck`, so misaligned input is fine. Fails with
/// `BufferMismatch` when the byte length is not a whole number of elements.
/// Assumes little-endian element bytes on a little-endian target.
pub fn bytes_to_vec<T: Pod>(bytes: &[u8]) -> Result<Vec<T>, NdPackError> {
    let elem = std::mem::size_of::<T>();
    if bytes.len() % elem != 0 {
        return Err(NdPackError::BufferMismatch(elem, bytes.len()));
    }
    let mut out = vec![T::zeroed(); bytes.len() / elem];
    bytemuck::cast_slice_mut::<T, u8>(out.as_mut_slice()).copy_from_slice(bytes);
    Ok(out)
}

/// Converts a typed slice into a `Vec<u8>`. This involves a copy.
/// Assumes a little-endian target.
pub fn typed_slice_to_bytes<T: Pod>(data: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(data).to_vec()
}

//==================================================================================
// 2. Dtype-Dispatched Buffer Factory
//==================================================================================

/// Builds the storage buffer for `dtype` from raw little-endian payload bytes.
///
/// `float16` payloads are expanded to 32-bit float storage element-wise when
/// `expand_half` is set; otherwise the packed 16-bit patterns are kept in an
/// unsigned 16-bit buffer.
pub fn buffer_from_le_bytes(
    dtype: DType,
    bytes: &[u8],
    expand_half: bool,
) -> Result<DataBuffer, NdPackError> {
    if dtype == DType::Float16 {
        let packed: Vec<u16> = bytes_to_vec(bytes)?;
        return Ok(if expand_half {
            DataBuffer::F32(float16::decode_slice(&packed))
        } else {
            DataBuffer::U16(packed)
        });
    }

    Ok(match dtype.storage() {
        StorageKind::U8 => DataBuffer::U8(bytes_to_vec(bytes)?),
        StorageKind::U16 => DataBuffer::U16(bytes_to_vec(bytes)?),
        StorageKind::U32 => DataBuffer::U32(bytes_to_vec(bytes)?),
        StorageKind::U64 => DataBuffer::U64(bytes_to_vec(bytes)?),
        StorageKind::I8 => DataBuffer::I8(bytes_to_vec(bytes)?),
        StorageKind::I16 => DataBuffer::I16(bytes_to_vec(bytes)?),
        StorageKind::I32 => DataBuffer::I32(bytes_to_vec(bytes)?),
        StorageKind::I64 => DataBuffer::I64(bytes_to_vec(bytes)?),
        StorageKind::F32 => DataBuffer::F32(bytes_to_vec(bytes)?),
        StorageKind::F64 => DataBuffer::F64(bytes_to_vec(bytes)?),
    })
}

//==================================================================================
// 3. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_to_vec_roundtrip_u32() {
        let original: Vec<u32> = vec![0, 127, 128, 1000, u32::MAX];
        let bytes = typed_slice_to_bytes(&original);
        let decoded: Vec<u32> = bytes_to_vec(&bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_bytes_to_vec_length_mismatch() {
        let bytes = [1u8, 2, 3];
        let result: Result<Vec<u32>, _> = bytes_to_vec(&bytes);
        assert!(matches!(result, Err(NdPackError::BufferMismatch(4, 3))));
    }

    #[test]
    fn test_buffer_factory_dispatches_by_dtype() {
        let bytes = 42i64.to_le_bytes();
        let buffer = buffer_from_le_bytes(DType::Int64, &bytes, true).unwrap();
        assert_eq!(buffer, DataBuffer::I64(vec![42]));

        let bytes = 1.5f64.to_le_bytes();
        let buffer = buffer_from_le_bytes(DType::Float64, &bytes, true).unwrap();
        assert_eq!(buffer, DataBuffer::F64(vec![1.5]));
    }

    #[test]
    fn test_buffer_factory_expands_half_precision() {
        // 0x3C00 is 1.0, 0xC000 is -2.0 in binary16.
        let bytes = [0x00u8, 0x3C, 0x00, 0xC0];
        let expanded = buffer_from_le_bytes(DType::Float16, &bytes, true).unwrap();
        assert_eq!(expanded, DataBuffer::F32(vec![1.0, -2.0]));

        let raw = buffer_from_le_bytes(DType::Float16, &bytes, false).unwrap();
        assert_eq!(raw, DataBuffer::U16(vec![0x3C00, 0xC000]));
    }
}
