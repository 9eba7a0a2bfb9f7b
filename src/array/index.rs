//! Bounds-checked flat-index translation, partial indexing, and element
//! assignment.
//!
//! An index is a sequence of per-axis selectors: a concrete position
//! (negative values resolve from the end, Python-style) or a wildcard
//! selecting the whole axis. Axes beyond the supplied selectors are
//! implicitly wildcarded. A fully-specified index resolves to one flat
//! offset; any wildcard turns the operation into an enumeration over every
//! matching offset, in row-major order.

use crate::array::{NdArray, Scalar};
use crate::error::NdPackError;

//==================================================================================
// 1. Selector & Result Types
//==================================================================================

/// One per-axis selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idx {
    /// A concrete position along the axis; negative values count from the end.
    At(i64),
    /// Every position along the axis.
    All,
}

/// The result of a `get`: a scalar for a fully-specified index, a fresh
/// array of the reduced shape otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Scalar(Scalar),
    Array(NdArray),
}

impl Item {
    pub fn into_scalar(self) -> Option<Scalar> {
        match self {
            Item::Scalar(s) => Some(s),
            Item::Array(_) => None,
        }
    }

    pub fn into_array(self) -> Option<NdArray> {
        match self {
            Item::Array(a) => Some(a),
            Item::Scalar(_) => None,
        }
    }
}

/// The right-hand side of a `set`: one scalar broadcast to every target
/// position, or a sequence distributed element-wise.
#[derive(Debug, Clone)]
pub enum Fill {
    Scalar(Scalar),
    Values(Vec<Scalar>),
}

impl From<Scalar> for Fill {
    fn from(s: Scalar) -> Self {
        Fill::Scalar(s)
    }
}

impl From<f64> for Fill {
    fn from(v: f64) -> Self {
        Fill::Scalar(Scalar::Float(v))
    }
}

impl From<i64> for Fill {
    fn from(v: i64) -> Self {
        Fill::Scalar(Scalar::Int(v))
    }
}

impl From<u64> for Fill {
    fn from(v: u64) -> Self {
        Fill::Scalar(Scalar::UInt(v))
    }
}

impl From<Vec<Scalar>> for Fill {
    fn from(v: Vec<Scalar>) -> Self {
        Fill::Values(v)
    }
}

impl From<&NdArray> for Fill {
    fn from(a: &NdArray) -> Self {
        Fill::Values(a.to_scalars())
    }
}

//==================================================================================
// 2. Stride Arithmetic
//==================================================================================

/// Row-major strides: `stride[i] = product(shape[i+1..])`.
pub(crate) fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Resolves one signed position against an axis extent.
fn resolve_position(index: i64, extent: usize, axis: usize) -> Result<usize, NdPackError> {
    let resolved = if index < 0 {
        index + extent as i64
    } else {
        index
    };
    if resolved < 0 || resolved >= extent as i64 {
        return Err(NdPackError::IndexOutOfBounds {
            axis,
            index,
            extent,
        });
    }
    Ok(resolved as usize)
}

/// Per-axis resolution of a selector list: `Some(position)` for a fixed axis,
/// `None` for a wildcarded one (explicit or trailing).
fn resolve_selectors(
    index: &[Idx],
    shape: &[usize],
) -> Result<(Vec<Option<usize>>, bool), NdPackError> {
    if index.len() > shape.len() {
        return Err(NdPackError::TooManyIndices {
            given: index.len(),
            ndim: shape.len(),
        });
    }
    let mut fixed = Vec::with_capacity(shape.len());
    let mut has_wildcard = false;
    for (axis, &extent) in shape.iter().enumerate() {
        match index.get(axis) {
            Some(Idx::At(i)) => fixed.push(Some(resolve_position(*i, extent, axis)?)),
            Some(Idx::All) | None => {
                fixed.push(None);
                has_wildcard = true;
            }
        }
    }
    Ok((fixed, has_wildcard))
}

/// Every flat offset matching the fixed axes, enumerated over the wildcarded
/// axes in row-major order (last free axis fastest).
fn enumerate_offsets(fixed: &[Option<usize>], shape: &[usize], strides: &[usize]) -> Vec<usize> {
    let base: usize = fixed
        .iter()
        .zip(strides)
        .filter_map(|(f, &s)| f.map(|i| i * s))
        .sum();
    let free: Vec<usize> = (0..shape.len()).filter(|&d| fixed[d].is_none()).collect();
    let total: usize = free.iter().map(|&d| shape[d]).product();

    let mut offsets = Vec::with_capacity(total);
    let mut counters = vec![0usize; free.len()];
    for _ in 0..total {
        let off: usize = counters
            .iter()
            .zip(&free)
            .map(|(&c, &d)| c * strides[d])
            .sum();
        offsets.push(base + off);
        for k in (0..counters.len()).rev() {
            counters[k] += 1;
            if counters[k] < shape[free[k]] {
                break;
            }
            counters[k] = 0;
        }
    }
    offsets
}

//==================================================================================
// 3. Public get / set
//==================================================================================

impl NdArray {
    /// Reads at an index.
    ///
    /// A fully-specified index returns the element as a scalar. An index with
    /// any wildcard (explicit or trailing) returns a fresh array of the
    /// reduced shape: wildcarded axes are kept, fixed axes are dropped.
    pub fn get(&self, index: &[Idx]) -> Result<Item, NdPackError> {
        let (fixed, has_wildcard) = resolve_selectors(index, self.shape())?;
        let strides = row_major_strides(self.shape());

        if !has_wildcard {
            let mut flat = 0usize;
            for (position, &stride) in fixed.iter().zip(&strides) {
                if let Some(p) = position {
                    flat += p * stride;
                }
            }
            return Ok(Item::Scalar(self.buffer().get(flat)));
        }

        let kept_shape: Vec<usize> = self
            .shape()
            .iter()
            .enumerate()
            .filter(|&(d, _)| fixed[d].is_none())
            .map(|(_, &e)| e)
            .collect();
        let offsets = enumerate_offsets(&fixed, self.shape(), &strides);
        let data = self.buffer().gather(&offsets);
        Ok(Item::Array(NdArray::new(data, kept_shape, self.dtype())?))
    }

    /// Writes at an index.
    ///
    /// A scalar fill is broadcast to every matching position; a sequence fill
    /// is distributed element-wise in the same row-major enumeration order,
    /// failing with `BroadcastMismatch` when the lengths disagree.
    pub fn set(&mut self, index: &[Idx], value: impl Into<Fill>) -> Result<(), NdPackError> {
        let (fixed, has_wildcard) = resolve_selectors(index, self.shape())?;
        let strides = row_major_strides(self.shape());

        let offsets = if has_wildcard {
            enumerate_offsets(&fixed, self.shape(), &strides)
        } else {
            let mut flat = 0usize;
            for (position, &stride) in fixed.iter().zip(&strides) {
                if let Some(p) = position {
                    flat += p * stride;
                }
            }
            vec![flat]
        };

        match value.into() {
            Fill::Scalar(s) => {
                let buffer = self.buffer_mut();
                for &off in &offsets {
                    buffer.set(off, s);
                }
            }
            Fill::Values(values) => {
                if values.len() != offsets.len() {
                    return Err(NdPackError::BroadcastMismatch {
                        expected: offsets.len(),
                        actual: values.len(),
                    });
                }
                let buffer = self.buffer_mut();
                for (&off, &v) in offsets.iter().zip(&values) {
                    buffer.set(off, v);
                }
            }
        }
        Ok(())
    }
}

//==================================================================================
// 4. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::DataBuffer;
    use crate::types::DType;

    fn fixture_2x3() -> NdArray {
        NdArray::new(
            DataBuffer::I64(vec![1, 2, 3, 4, 5, 6]),
            vec![2, 3],
            DType::Int64,
        )
        .unwrap()
    }

    #[test]
    fn test_fully_specified_get_returns_scalar() {
        let arr = fixture_2x3();
        let item = arr.get(&[Idx::At(1), Idx::At(2)]).unwrap();
        assert_eq!(item, Item::Scalar(Scalar::Int(6)));
    }

    #[test]
    fn test_negative_index_resolves_from_the_end() {
        let arr = fixture_2x3();
        let item = arr.get(&[Idx::At(0), Idx::At(-1)]).unwrap();
        assert_eq!(item, Item::Scalar(Scalar::Int(3)));
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let arr = fixture_2x3();
        assert!(matches!(
            arr.get(&[Idx::At(0), Idx::At(3)]),
            Err(NdPackError::IndexOutOfBounds {
                axis: 1,
                index: 3,
                extent: 3
            })
        ));
        assert!(matches!(
            arr.get(&[Idx::At(-3)]),
            Err(NdPackError::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_too_many_indices_is_rejected() {
        let arr = fixture_2x3();
        assert!(matches!(
            arr.get(&[Idx::At(0), Idx::At(0), Idx::At(0)]),
            Err(NdPackError::TooManyIndices { given: 3, ndim: 2 })
        ));
    }

    #[test]
    fn test_wildcard_get_returns_reduced_array() {
        let arr = fixture_2x3();
        let row = arr
            .get(&[Idx::At(1), Idx::All])
            .unwrap()
            .into_array()
            .unwrap();
        assert_eq!(row.shape(), &[3]);
        assert_eq!(
            row.to_scalars(),
            vec![Scalar::Int(4), Scalar::Int(5), Scalar::Int(6)]
        );

        let column = arr
            .get(&[Idx::All, Idx::At(0)])
            .unwrap()
            .into_array()
            .unwrap();
        assert_eq!(column.shape(), &[2]);
        assert_eq!(column.to_scalars(), vec![Scalar::Int(1), Scalar::Int(4)]);
    }

    #[test]
    fn test_trailing_axes_are_implicitly_wildcarded() {
        let arr = fixture_2x3();
        let row = arr.get(&[Idx::At(0)]).unwrap().into_array().unwrap();
        assert_eq!(row.shape(), &[3]);
        assert_eq!(
            row.to_scalars(),
            vec![Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)]
        );
    }

    #[test]
    fn test_empty_index_on_scalar_array() {
        let arr = NdArray::new(DataBuffer::F64(vec![9.5]), vec![], DType::Float64).unwrap();
        assert_eq!(
            arr.get(&[]).unwrap(),
            Item::Scalar(Scalar::Float(9.5))
        );
    }

    #[test]
    fn test_set_single_element() {
        let mut arr = fixture_2x3();
        arr.set(&[Idx::At(0), Idx::At(1)], 42i64).unwrap();
        assert_eq!(
            arr.get(&[Idx::At(0), Idx::At(1)]).unwrap(),
            Item::Scalar(Scalar::Int(42))
        );
    }

    #[test]
    fn test_set_broadcasts_a_scalar_over_wildcards() {
        let mut arr = fixture_2x3();
        arr.set(&[Idx::All, Idx::At(1)], 0i64).unwrap();
        assert_eq!(
            arr.to_scalars(),
            vec![
                Scalar::Int(1),
                Scalar::Int(0),
                Scalar::Int(3),
                Scalar::Int(4),
                Scalar::Int(0),
                Scalar::Int(6)
            ]
        );
    }

    #[test]
    fn test_set_distributes_a_sequence() {
        let mut arr = fixture_2x3();
        arr.set(
            &[Idx::At(1), Idx::All],
            vec![Scalar::Int(7), Scalar::Int(8), Scalar::Int(9)],
        )
        .unwrap();
        assert_eq!(
            arr.to_scalars(),
            vec![
                Scalar::Int(1),
                Scalar::Int(2),
                Scalar::Int(3),
                Scalar::Int(7),
                Scalar::Int(8),
                Scalar::Int(9)
            ]
        );
    }

    #[test]
    fn test_set_with_mismatched_sequence_is_rejected() {
        let mut arr = fixture_2x3();
        let result = arr.set(
            &[Idx::At(1), Idx::All],
            vec![Scalar::Int(7), Scalar::Int(8)],
        );
        assert!(matches!(
            result,
            Err(NdPackError::BroadcastMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_set_on_a_view_copies_instead_of_aliasing() {
        let arr = fixture_2x3();
        let mut flat = arr.flatten().unwrap();
        assert!(arr.shares_storage(&flat));
        flat.set(&[Idx::At(0)], 99i64).unwrap();
        assert!(!arr.shares_storage(&flat));
        // The source is untouched.
        assert_eq!(
            arr.get(&[Idx::At(0), Idx::At(0)]).unwrap(),
            Item::Scalar(Scalar::Int(1))
        );
        assert_eq!(
            flat.get(&[Idx::At(0)]).unwrap(),
            Item::Scalar(Scalar::Int(99))
        );
    }
}
