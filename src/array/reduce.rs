//! Axis-generalized reductions: `sum`, `mean`, `range`, `min`, `max`.
//!
//! The axis form of every reduction walks the flat source buffer once: each
//! flat index is decomposed into its per-axis multi-index, and a destination
//! flat index is recomposed from every axis except the reduced one. `range`
//! tracks a running minimum and maximum per destination cell in that same
//! single pass, and `min`/`max` are defined by slicing its output rather than
//! by a second pass of their own.

use num_traits::Bounded;

use crate::array::index::row_major_strides;
use crate::array::{DataBuffer, Idx, Item, NdArray, Scalar};
use crate::error::NdPackError;
use crate::types::DType;

//==================================================================================
// 1. Axis Resolution & Offset Mapping
//==================================================================================

/// Resolves a signed axis against the array rank. Negative axes count from
/// the end.
fn resolve_axis(axis: isize, ndim: usize) -> Result<usize, NdPackError> {
    let resolved = if axis < 0 { axis + ndim as isize } else { axis };
    if resolved < 0 || resolved >= ndim as isize {
        return Err(NdPackError::AxisOutOfBounds { axis, ndim });
    }
    Ok(resolved as usize)
}

/// For every flat source index, the destination flat index obtained by
/// dropping axis `ax` from its multi-index. Returns the pair list and the
/// reduced shape. The caller guarantees a non-empty source.
fn axis_offsets(shape: &[usize], ax: usize) -> (Vec<(usize, usize)>, Vec<usize>) {
    let strides = row_major_strides(shape);
    let dst_shape: Vec<usize> = shape
        .iter()
        .enumerate()
        .filter(|&(d, _)| d != ax)
        .map(|(_, &e)| e)
        .collect();
    let dst_strides = row_major_strides(&dst_shape);

    let size: usize = shape.iter().product();
    let mut pairs = Vec::with_capacity(size);
    for flat in 0..size {
        let mut dst = 0usize;
        let mut out_d = 0usize;
        for d in 0..shape.len() {
            let position = (flat / strides[d]) % shape[d];
            if d != ax {
                dst += position * dst_strides[out_d];
                out_d += 1;
            }
        }
        pairs.push((flat, dst));
    }
    (pairs, dst_shape)
}

//==================================================================================
// 2. Per-Storage Accumulation Kernels
//==================================================================================

macro_rules! sum_pairs_int {
    ($v:expr, $Var:ident, $T:ty, $pairs:expr, $dst_len:expr) => {{
        let mut acc: Vec<$T> = vec![0; $dst_len];
        for &(s, d) in $pairs {
            acc[d] = acc[d].wrapping_add($v[s]);
        }
        DataBuffer::$Var(acc)
    }};
}

macro_rules! sum_pairs_float {
    ($v:expr, $Var:ident, $pairs:expr, $dst_len:expr) => {{
        let mut acc = vec![0.0; $dst_len];
        for &(s, d) in $pairs {
            acc[d] += $v[s];
        }
        DataBuffer::$Var(acc)
    }};
}

/// Dtype-preserving accumulation of source elements into destination cells.
/// Integer lanes wrap on overflow, as typed stores do.
fn sum_pairs(buffer: &DataBuffer, pairs: &[(usize, usize)], dst_len: usize) -> DataBuffer {
    match buffer {
        DataBuffer::U8(v) => sum_pairs_int!(v, U8, u8, pairs, dst_len),
        DataBuffer::U16(v) => sum_pairs_int!(v, U16, u16, pairs, dst_len),
        DataBuffer::U32(v) => sum_pairs_int!(v, U32, u32, pairs, dst_len),
        DataBuffer::U64(v) => sum_pairs_int!(v, U64, u64, pairs, dst_len),
        DataBuffer::I8(v) => sum_pairs_int!(v, I8, i8, pairs, dst_len),
        DataBuffer::I16(v) => sum_pairs_int!(v, I16, i16, pairs, dst_len),
        DataBuffer::I32(v) => sum_pairs_int!(v, I32, i32, pairs, dst_len),
        DataBuffer::I64(v) => sum_pairs_int!(v, I64, i64, pairs, dst_len),
        DataBuffer::F32(v) => sum_pairs_float!(v, F32, pairs, dst_len),
        DataBuffer::F64(v) => sum_pairs_float!(v, F64, pairs, dst_len),
    }
}

macro_rules! range_pairs_impl {
    ($v:expr, $T:ty, $Var:ident, $pairs:expr, $dst_len:expr) => {{
        let mut lo = vec![<$T as Bounded>::max_value(); $dst_len];
        let mut hi = vec![<$T as Bounded>::min_value(); $dst_len];
        for &(s, d) in $pairs {
            let x = $v[s];
            if x < lo[d] {
                lo[d] = x;
            }
            if x > hi[d] {
                hi[d] = x;
            }
        }
        // Interleave: the trailing dimension of length 2 has stride 1.
        let mut out = Vec::with_capacity($dst_len * 2);
        for d in 0..$dst_len {
            out.push(lo[d]);
            out.push(hi[d]);
        }
        DataBuffer::$Var(out)
    }};
}

/// Single-pass running min+max per destination cell.
fn range_pairs(buffer: &DataBuffer, pairs: &[(usize, usize)], dst_len: usize) -> DataBuffer {
    match buffer {
        DataBuffer::U8(v) => range_pairs_impl!(v, u8, U8, pairs, dst_len),
        DataBuffer::U16(v) => range_pairs_impl!(v, u16, U16, pairs, dst_len),
        DataBuffer::U32(v) => range_pairs_impl!(v, u32, U32, pairs, dst_len),
        DataBuffer::U64(v) => range_pairs_impl!(v, u64, U64, pairs, dst_len),
        DataBuffer::I8(v) => range_pairs_impl!(v, i8, I8, pairs, dst_len),
        DataBuffer::I16(v) => range_pairs_impl!(v, i16, I16, pairs, dst_len),
        DataBuffer::I32(v) => range_pairs_impl!(v, i32, I32, pairs, dst_len),
        DataBuffer::I64(v) => range_pairs_impl!(v, i64, I64, pairs, dst_len),
        DataBuffer::F32(v) => range_pairs_impl!(v, f32, F32, pairs, dst_len),
        DataBuffer::F64(v) => range_pairs_impl!(v, f64, F64, pairs, dst_len),
    }
}

/// Full left-fold of every element, in the widest native lane for the
/// buffer's numeric class.
fn fold_sum(buffer: &DataBuffer) -> Scalar {
    match buffer {
        DataBuffer::U8(v) => {
            Scalar::UInt(v.iter().fold(0u64, |a, &x| a.wrapping_add(u64::from(x))))
        }
        DataBuffer::U16(v) => {
            Scalar::UInt(v.iter().fold(0u64, |a, &x| a.wrapping_add(u64::from(x))))
        }
        DataBuffer::U32(v) => {
            Scalar::UInt(v.iter().fold(0u64, |a, &x| a.wrapping_add(u64::from(x))))
        }
        DataBuffer::U64(v) => Scalar::UInt(v.iter().fold(0u64, |a, &x| a.wrapping_add(x))),
        DataBuffer::I8(v) => {
            Scalar::Int(v.iter().fold(0i64, |a, &x| a.wrapping_add(i64::from(x))))
        }
        DataBuffer::I16(v) => {
            Scalar::Int(v.iter().fold(0i64, |a, &x| a.wrapping_add(i64::from(x))))
        }
        DataBuffer::I32(v) => {
            Scalar::Int(v.iter().fold(0i64, |a, &x| a.wrapping_add(i64::from(x))))
        }
        DataBuffer::I64(v) => Scalar::Int(v.iter().fold(0i64, |a, &x| a.wrapping_add(x))),
        DataBuffer::F32(v) => Scalar::Float(v.iter().map(|&x| f64::from(x)).sum()),
        DataBuffer::F64(v) => Scalar::Float(v.iter().sum()),
    }
}

//==================================================================================
// 3. Public Reductions
//==================================================================================

impl NdArray {
    /// Sums elements. `axis = None` folds everything into one scalar;
    /// `axis = Some(k)` drops dimension `k`, accumulating into the remaining
    /// cells. The result keeps the source dtype.
    pub fn sum(&self, axis: Option<isize>) -> Result<Item, NdPackError> {
        if self.size() == 0 {
            return Err(NdPackError::EmptyReduction);
        }
        match axis {
            None => Ok(Item::Scalar(fold_sum(self.buffer()))),
            Some(axis) => {
                let ax = resolve_axis(axis, self.ndim())?;
                let (pairs, dst_shape) = axis_offsets(self.shape(), ax);
                let dst_len = dst_shape.iter().product();
                let out = sum_pairs(self.buffer(), &pairs, dst_len);
                Ok(Item::Array(NdArray::new(out, dst_shape, self.dtype())?))
            }
        }
    }

    /// Arithmetic mean. Always produces `float64` results so that integer
    /// arrays do not truncate per-cell.
    pub fn mean(&self, axis: Option<isize>) -> Result<Item, NdPackError> {
        if self.size() == 0 {
            return Err(NdPackError::EmptyReduction);
        }
        match axis {
            None => Ok(Item::Scalar(Scalar::Float(
                fold_sum(self.buffer()).as_f64() / self.size() as f64,
            ))),
            Some(axis) => {
                let ax = resolve_axis(axis, self.ndim())?;
                let (pairs, dst_shape) = axis_offsets(self.shape(), ax);
                let dst_len: usize = dst_shape.iter().product();
                let mut acc = vec![0f64; dst_len];
                for &(s, d) in &pairs {
                    acc[d] += self.buffer().get(s).as_f64();
                }
                let extent = self.shape()[ax] as f64;
                for cell in acc.iter_mut() {
                    *cell /= extent;
                }
                Ok(Item::Array(NdArray::new(
                    DataBuffer::F64(acc),
                    dst_shape,
                    DType::Float64,
                )?))
            }
        }
    }

    /// Combined minimum and maximum in one pass. The result's trailing
    /// dimension is exactly 2 (index 0 = min, index 1 = max): shape `[2]`
    /// for a full reduction, `[...reduced, 2]` for an axis reduction.
    pub fn range(&self, axis: Option<isize>) -> Result<NdArray, NdPackError> {
        if self.size() == 0 {
            return Err(NdPackError::EmptyReduction);
        }
        match axis {
            None => {
                let pairs: Vec<(usize, usize)> = (0..self.size()).map(|i| (i, 0)).collect();
                let out = range_pairs(self.buffer(), &pairs, 1);
                NdArray::new(out, vec![2], self.dtype())
            }
            Some(axis) => {
                let ax = resolve_axis(axis, self.ndim())?;
                let (pairs, dst_shape) = axis_offsets(self.shape(), ax);
                let dst_len: usize = dst_shape.iter().product();
                let out = range_pairs(self.buffer(), &pairs, dst_len);
                let mut shape = dst_shape;
                shape.push(2);
                NdArray::new(out, shape, self.dtype())
            }
        }
    }

    /// Minimum, defined as slice 0 of `range` output.
    pub fn min(&self, axis: Option<isize>) -> Result<Item, NdPackError> {
        self.range_side(axis, 0)
    }

    /// Maximum, defined as slice 1 of `range` output.
    pub fn max(&self, axis: Option<isize>) -> Result<Item, NdPackError> {
        self.range_side(axis, 1)
    }

    fn range_side(&self, axis: Option<isize>, side: i64) -> Result<Item, NdPackError> {
        let extremes = self.range(axis)?;
        if axis.is_none() {
            extremes.get(&[Idx::At(side)])
        } else {
            let mut index = vec![Idx::All; extremes.ndim() - 1];
            index.push(Idx::At(side));
            extremes.get(&index)
        }
    }
}

//==================================================================================
// 4. Unit Tests
//==================================================================================
