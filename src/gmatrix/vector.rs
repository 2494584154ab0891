use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use crate::traits::Scalar;

use super::GMatrix;

/// Dynamically-sized vector (wraps an N×1 `GMatrix`).
///
/// Used for row/column extraction and single right-hand-side solves.
///
/// # Examples
///
/// ```
/// use vecmath::GVector;
///
/// let v = GVector::from_slice(&[1.0_f64, 2.0, 3.0]);
/// assert_eq!(v[0], 1.0);
/// assert_eq!(v.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GVector<T> {
    pub(crate) inner: GMatrix<T>,
}

impl<T: Scalar> GVector<T> {
    /// Create a vector from a flat slice.
    pub fn from_slice(data: &[T]) -> Self {
        Self {
            inner: GMatrix::from_rows(data.len(), 1, data),
        }
    }

    /// Create a vector from an owned `Vec`.
    ///
    /// ```
    /// use vecmath::GVector;
    /// let v = GVector::from_vec(vec![1.0, 2.0, 3.0]);
    /// assert_eq!(v[2], 3.0);
    /// ```
    pub fn from_vec(data: Vec<T>) -> Self {
        let n = data.len();
        Self {
            inner: GMatrix::from_vec(n, 1, data),
        }
    }

    /// Create a zero vector of length `n`.
    pub fn zeros(n: usize) -> Self {
        Self {
            inner: GMatrix::zeros(n, 1),
        }
    }
}

impl<T> GVector<T> {
    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.nrows()
    }

    /// Whether the vector is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// View the vector data as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.inner.as_slice()
    }

    /// View the vector data as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.inner.as_mut_slice()
    }

    /// The vector as an N×1 column matrix.
    #[inline]
    pub fn as_column(&self) -> &GMatrix<T> {
        &self.inner
    }

    /// Consume the vector, returning its storage.
    #[inline]
    pub fn into_vec(self) -> Vec<T> {
        self.inner.into_vec()
    }
}

impl<T> From<GVector<T>> for GMatrix<T> {
    /// The vector as an N×1 column matrix.
    fn from(v: GVector<T>) -> Self {
        v.inner
    }
}

// ── Index ───────────────────────────────────────────────────────────

impl<T> Index<usize> for GVector<T> {
    type Output = T;

    #[inline]
    fn index(&self, i: usize) -> &T {
        &self.inner[(i, 0)]
    }
}

impl<T> IndexMut<usize> for GVector<T> {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.inner[(i, 0)]
    }
}
