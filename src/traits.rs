use core::fmt::Debug;
use num_traits::{Float, Num, One, Zero};

/// Trait for types that can be used as matrix elements.
///
/// Blanket-implemented for all types satisfying the bounds.
/// Covers `f32`, `f64`, and all integer types.
pub trait Scalar: Copy + PartialEq + Debug + Zero + One + Num {}

impl<T: Copy + PartialEq + Debug + Zero + One + Num> Scalar for T {}

/// Trait for floating-point matrix elements.
///
/// Required by the decompositions (LU, SVD) and everything built on them.
pub trait FloatScalar: Scalar + Float {
    /// Convert an `f64` literal into `Self`.
    ///
    /// Every tuning constant in the kernels is written as an `f64`; for `f32`
    /// this rounds to the nearest representable value.
    #[inline]
    fn lit(x: f64) -> Self {
        <Self as num_traits::NumCast>::from(x).unwrap_or_else(Self::nan)
    }

    /// `|a|` carrying the sign of `b` (Fortran `SIGN`). `b == 0` counts as positive.
    #[inline]
    fn with_sign_of(self, b: Self) -> Self {
        if b >= Self::zero() {
            self.abs()
        } else {
            -self.abs()
        }
    }
}

impl<T: Scalar + Float> FloatScalar for T {}

/// Read-only access to a matrix-like type.
///
/// This trait allows the kernels to operate generically over
/// `GMatrix` and any other row/column addressable storage.
pub trait MatrixRef<T> {
    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
    fn get(&self, row: usize, col: usize) -> &T;
}

/// Mutable access to a matrix-like type.
///
/// Extends `MatrixRef` with mutable element access, enabling
/// in-place algorithms (LU, bidiagonalization) to work generically.
pub trait MatrixMut<T>: MatrixRef<T> {
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T;

    /// Swap two rows in place.
    fn swap_rows(&mut self, a: usize, b: usize)
    where
        T: Copy,
    {
        if a == b {
            return;
        }
        for j in 0..self.ncols() {
            let tmp = *self.get(a, j);
            *self.get_mut(a, j) = *self.get(b, j);
            *self.get_mut(b, j) = tmp;
        }
    }
}

impl<T, const M: usize, const N: usize> MatrixRef<T> for [[T; N]; M] {
    #[inline]
    fn nrows(&self) -> usize {
        M
    }

    #[inline]
    fn ncols(&self) -> usize {
        N
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> &T {
        &self[row][col]
    }
}

impl<T, const M: usize, const N: usize> MatrixMut<T> for [[T; N]; M] {
    #[inline]
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        &mut self[row][col]
    }
}
