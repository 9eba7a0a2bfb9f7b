//! The shape/stride/dtype-carrying array value type and its operations.
//!
//! An `NdArray` owns a homogeneous storage buffer plus a row-major shape.
//! Every producing operation (reductions, transpose, wildcard `get`) builds a
//! fresh, independent array; the two exceptions are `reshape` and `flatten`,
//! which return views sharing the storage allocation. Mutation through `set`
//! is copy-on-write, so writing to a view never writes through to its source.

mod buffer;
mod index;
mod reduce;
mod shape;

pub use buffer::{DataBuffer, Scalar};
pub use index::{Fill, Idx, Item};

use std::fmt;
use std::sync::Arc;

use crate::error::NdPackError;
use crate::types::DType;

//==================================================================================
// 1. The NdArray Value Type
//==================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    data: Arc<DataBuffer>,
    shape: Vec<usize>,
    dtype: DType,
}

impl NdArray {
    /// Wraps a storage buffer with a shape and dtype.
    ///
    /// An empty shape is a scalar (size 1); a zero extent anywhere gives
    /// size 0. Fails with `ShapeMismatch` when the buffer length disagrees
    /// with the shape product.
    pub fn new(data: DataBuffer, shape: Vec<usize>, dtype: DType) -> Result<Self, NdPackError> {
        let size: usize = shape.iter().product();
        if data.len() != size {
            return Err(NdPackError::ShapeMismatch {
                expected: size,
                actual: data.len(),
            });
        }
        if !data.matches(dtype) {
            return Err(NdPackError::InternalError(format!(
                "storage kind {:?} does not match dtype {}",
                data.kind(),
                dtype
            )));
        }
        Ok(Self {
            data: Arc::new(data),
            shape,
            dtype,
        })
    }

    /// Total number of elements (product of the shape).
    pub fn size(&self) -> usize {
        self.shape.iter().product()
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Flat, row-major copy of every element.
    pub fn to_scalars(&self) -> Vec<Scalar> {
        self.data.to_scalars()
    }

    /// True when two arrays share the same storage allocation, i.e. one is a
    /// view of the other.
    pub fn shares_storage(&self, other: &NdArray) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub(crate) fn buffer(&self) -> &DataBuffer {
        &self.data
    }

    /// Mutable access to the storage. Copy-on-write: if the buffer is shared
    /// with a view, the write happens on a private copy.
    pub(crate) fn buffer_mut(&mut self) -> &mut DataBuffer {
        Arc::make_mut(&mut self.data)
    }

    /// A view over the same storage with a different (already validated) shape.
    pub(crate) fn view_with_shape(&self, shape: Vec<usize>) -> NdArray {
        NdArray {
            data: Arc::clone(&self.data),
            shape,
            dtype: self.dtype,
        }
    }
}

//==================================================================================
// 2. Human-Readable Summary
//==================================================================================

impl fmt::Display for NdArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ndim() == 1 {
            write!(f, "[")?;
            for (i, value) in self.to_scalars().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", value)?;
            }
            write!(f, "]")
        } else {
            write!(f, "NdArray(shape={:?}, dtype={})", self.shape, self.dtype)
        }
    }
}

//==================================================================================
// 3. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_validates_shape_product() {
        let result = NdArray::new(DataBuffer::F64(vec![1.0, 2.0]), vec![3], DType::Float64);
        assert!(matches!(
            result,
            Err(NdPackError::ShapeMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_empty_shape_is_a_scalar() {
        let arr = NdArray::new(DataBuffer::I64(vec![7]), vec![], DType::Int64).unwrap();
        assert_eq!(arr.size(), 1);
        assert_eq!(arr.ndim(), 0);
    }

    #[test]
    fn test_zero_extent_gives_size_zero() {
        let arr = NdArray::new(DataBuffer::F32(vec![]), vec![0, 3], DType::Float32).unwrap();
        assert_eq!(arr.size(), 0);
        assert_eq!(arr.ndim(), 2);
    }

    #[test]
    fn test_display_lists_one_dimensional_arrays() {
        let arr = NdArray::new(DataBuffer::I64(vec![1, 2, 3]), vec![3], DType::Int64).unwrap();
        assert_eq!(arr.to_string(), "[1, 2, 3]");
    }

    #[test]
    fn test_display_summarizes_higher_ranks() {
        let arr = NdArray::new(
            DataBuffer::F32(vec![0.0; 6]),
            vec![2, 3],
            DType::Float32,
        )
        .unwrap();
        assert_eq!(arr.to_string(), "NdArray(shape=[2, 3], dtype=float32)");
    }
}
