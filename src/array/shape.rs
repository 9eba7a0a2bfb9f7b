//! Shape transforms: `reshape` and `flatten` (views), `transpose` (copy).
//!
//! The view/copy split is part of the contract: reshaping never touches
//! element storage, it only re-labels the same flat buffer, while transposing
//! must physically reorder elements and therefore always allocates.

use crate::array::index::row_major_strides;
use crate::array::NdArray;
use crate::error::NdPackError;

impl NdArray {
    /// Re-labels the flat buffer with a new shape.
    ///
    /// At most one dimension may be the wildcard `-1`, which is inferred from
    /// the total size. Returns a view: the result shares this array's storage
    /// allocation and copies no elements. (Writes through `set` are
    /// copy-on-write, so mutating the view leaves the source untouched.)
    pub fn reshape(&self, new_shape: &[isize]) -> Result<NdArray, NdPackError> {
        let size = self.size();

        let mut wildcard: Option<usize> = None;
        let mut known: usize = 1;
        for (position, &dim) in new_shape.iter().enumerate() {
            if dim == -1 {
                if wildcard.is_some() {
                    return Err(NdPackError::MultipleWildcards);
                }
                wildcard = Some(position);
            } else if dim < 0 {
                return Err(NdPackError::SizeMismatch {
                    expected: size,
                    actual: 0,
                });
            } else {
                known *= dim as usize;
            }
        }

        let resolved: Vec<usize> = match wildcard {
            Some(position) => {
                if known == 0 || size % known != 0 {
                    return Err(NdPackError::IndivisibleShape { size, known });
                }
                new_shape
                    .iter()
                    .enumerate()
                    .map(|(i, &dim)| {
                        if i == position {
                            size / known
                        } else {
                            dim as usize
                        }
                    })
                    .collect()
            }
            None => new_shape.iter().map(|&dim| dim as usize).collect(),
        };

        let product: usize = resolved.iter().product();
        if product != size {
            return Err(NdPackError::SizeMismatch {
                expected: size,
                actual: product,
            });
        }

        Ok(self.view_with_shape(resolved))
    }

    /// One-dimensional view over the same storage.
    pub fn flatten(&self) -> Result<NdArray, NdPackError> {
        self.reshape(&[self.size() as isize])
    }

    /// Permutes the axes, physically reordering elements into a fresh buffer.
    ///
    /// `axes = None` reverses all dimensions. Otherwise `axes` must be a
    /// permutation of `0..ndim`.
    pub fn transpose(&self, axes: Option<&[usize]>) -> Result<NdArray, NdPackError> {
        let ndim = self.ndim();

        let perm: Vec<usize> = match axes {
            None => (0..ndim).rev().collect(),
            Some(axes) => {
                if axes.len() != ndim {
                    return Err(NdPackError::InvalidPermutation(format!(
                        "expected {} axes, got {}",
                        ndim,
                        axes.len()
                    )));
                }
                let mut seen = vec![false; ndim];
                for &ax in axes {
                    if ax >= ndim {
                        return Err(NdPackError::InvalidPermutation(format!(
                            "axis {} out of range for {} dimensions",
                            ax, ndim
                        )));
                    }
                    if seen[ax] {
                        return Err(NdPackError::InvalidPermutation(format!(
                            "axis {} appears more than once",
                            ax
                        )));
                    }
                    seen[ax] = true;
                }
                axes.to_vec()
            }
        };

        let src_shape = self.shape();
        let dst_shape: Vec<usize> = perm.iter().map(|&p| src_shape[p]).collect();
        let src_strides = row_major_strides(src_shape);
        let dst_strides = row_major_strides(&dst_shape);

        let size = self.size();
        let mut mapping = vec![0usize; size];
        for (flat, slot) in mapping.iter_mut().enumerate() {
            // dst_multi[i] = src_multi[perm[i]]; recompose the destination
            // flat index directly from the source decomposition.
            let mut dst = 0usize;
            for (i, &p) in perm.iter().enumerate() {
                let position = (flat / src_strides[p]) % src_shape[p];
                dst += position * dst_strides[i];
            }
            *slot = dst;
        }

        let data = self.buffer().scatter(&mapping);
        NdArray::new(data, dst_shape, self.dtype())
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
