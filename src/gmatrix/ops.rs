use alloc::vec::Vec;
use core::ops::{Add, Mul, Neg, Sub};

use crate::linalg::LinalgError;
use crate::traits::Scalar;

use super::GMatrix;

/// Unwrap an operator result, panicking with the error's `Display` text.
#[inline]
fn or_panic<R>(result: Result<R, LinalgError>) -> R {
    match result {
        Ok(r) => r,
        Err(e) => panic!("{}", e),
    }
}

impl<T: Scalar> GMatrix<T> {
    #[inline]
    fn check_same_shape(&self, rhs: &GMatrix<T>) -> Result<(), LinalgError> {
        LinalgError::check_size((self.nrows, self.ncols), (rhs.nrows, rhs.ncols))
    }

    #[inline]
    fn check_product(&self, rhs: &GMatrix<T>) -> Result<(), LinalgError> {
        LinalgError::check_size((self.ncols, rhs.ncols), (rhs.nrows, rhs.ncols))
    }

    /// `self · rhs` into a fresh buffer; shapes already checked.
    fn product(&self, rhs: &GMatrix<T>) -> GMatrix<T> {
        let (m, k, p) = (self.nrows, self.ncols, rhs.ncols);
        let mut out = GMatrix::zeros(m, p);
        for i in 0..m {
            for l in 0..k {
                let a = self.data[i * k + l];
                if a == T::zero() {
                    continue;
                }
                let rhs_row = &rhs.data[l * p..(l + 1) * p];
                let out_row = &mut out.data[i * p..(i + 1) * p];
                for (o, &b) in out_row.iter_mut().zip(rhs_row) {
                    *o = *o + a * b;
                }
            }
        }
        out
    }

    // ── Transpose ───────────────────────────────────────────────────

    /// Transpose into a new matrix.
    ///
    /// ```
    /// use vecmath::GMatrix;
    /// let m = GMatrix::from_rows(2, 3, &[1, 2, 3, 4, 5, 6]);
    /// let t = m.transpose();
    /// assert_eq!(t.nrows(), 3);
    /// assert_eq!(t[(2, 1)], 6);
    /// ```
    pub fn transpose(&self) -> GMatrix<T> {
        GMatrix::from_fn(self.ncols, self.nrows, |i, j| self.data[j * self.ncols + i])
    }

    /// Transpose in place. Square matrices swap element pairs; other shapes
    /// go through a temporary buffer.
    pub fn transpose_in_place(&mut self) {
        if self.is_square() {
            let n = self.nrows;
            for i in 0..n {
                for j in (i + 1)..n {
                    self.data.swap(i * n + j, j * n + i);
                }
            }
        } else {
            *self = self.transpose();
        }
    }

    /// Overwrite `self` with the transpose of `src`.
    ///
    /// `self` must already be `src.ncols() x src.nrows()`.
    pub fn transpose_from(&mut self, src: &GMatrix<T>) -> Result<(), LinalgError> {
        LinalgError::check_size((src.ncols, src.nrows), (self.nrows, self.ncols))?;
        for i in 0..self.nrows {
            for j in 0..self.ncols {
                self.data[i * self.ncols + j] = src.data[j * src.ncols + i];
            }
        }
        Ok(())
    }

    // ── Element-wise arithmetic ─────────────────────────────────────

    /// `self + rhs`, or `MismatchedSize` if the shapes differ.
    ///
    /// ```
    /// use vecmath::GMatrix;
    /// let a = GMatrix::from_rows(1, 2, &[1, 2]);
    /// let b = GMatrix::from_rows(1, 2, &[10, 20]);
    /// assert_eq!(a.try_add(&b).unwrap().as_slice(), &[11, 22]);
    /// assert!(a.try_add(&GMatrix::zeros(2, 1)).is_err());
    /// ```
    pub fn try_add(&self, rhs: &GMatrix<T>) -> Result<GMatrix<T>, LinalgError> {
        self.check_same_shape(rhs)?;
        let data: Vec<T> = self.data.iter().zip(&rhs.data).map(|(&a, &b)| a + b).collect();
        Ok(GMatrix {
            data,
            nrows: self.nrows,
            ncols: self.ncols,
        })
    }

    /// `self += rhs`; `self` is untouched on error.
    pub fn try_add_assign(&mut self, rhs: &GMatrix<T>) -> Result<(), LinalgError> {
        self.check_same_shape(rhs)?;
        for (a, &b) in self.data.iter_mut().zip(&rhs.data) {
            *a = *a + b;
        }
        Ok(())
    }

    /// `self - rhs`, or `MismatchedSize` if the shapes differ.
    pub fn try_sub(&self, rhs: &GMatrix<T>) -> Result<GMatrix<T>, LinalgError> {
        self.check_same_shape(rhs)?;
        let data: Vec<T> = self.data.iter().zip(&rhs.data).map(|(&a, &b)| a - b).collect();
        Ok(GMatrix {
            data,
            nrows: self.nrows,
            ncols: self.ncols,
        })
    }

    /// `self -= rhs`; `self` is untouched on error.
    pub fn try_sub_assign(&mut self, rhs: &GMatrix<T>) -> Result<(), LinalgError> {
        self.check_same_shape(rhs)?;
        for (a, &b) in self.data.iter_mut().zip(&rhs.data) {
            *a = *a - b;
        }
        Ok(())
    }

    /// Negate every element in place.
    pub fn negate(&mut self) {
        for x in self.data.iter_mut() {
            *x = T::zero() - *x;
        }
    }

    // ── Matrix multiplication ───────────────────────────────────────

    /// `self · rhs`: (M×K)·(K×P) → (M×P).
    pub fn try_mul(&self, rhs: &GMatrix<T>) -> Result<GMatrix<T>, LinalgError> {
        self.check_product(rhs)?;
        Ok(self.product(rhs))
    }

    /// `self = self · rhs`, computed into a temporary and then moved in.
    /// The shape of `self` becomes `self.nrows() x rhs.ncols()`.
    pub fn try_mul_assign(&mut self, rhs: &GMatrix<T>) -> Result<(), LinalgError> {
        self.check_product(rhs)?;
        *self = self.product(rhs);
        Ok(())
    }

    /// Write `self · rhs` into `out`, which must already be `M×P`.
    ///
    /// ```
    /// use vecmath::GMatrix;
    /// let a = GMatrix::from_rows(2, 2, &[1, 2, 3, 4]);
    /// let mut out = GMatrix::zeros(2, 2);
    /// a.mul_into(&GMatrix::identity(2), &mut out).unwrap();
    /// assert_eq!(out, a);
    /// ```
    pub fn mul_into(&self, rhs: &GMatrix<T>, out: &mut GMatrix<T>) -> Result<(), LinalgError> {
        self.check_product(rhs)?;
        LinalgError::check_size((self.nrows, rhs.ncols), (out.nrows, out.ncols))?;
        *out = self.product(rhs);
        Ok(())
    }
}

// ── Operators (panic on shape mismatch) ─────────────────────────────

impl<T: Scalar> Add<&GMatrix<T>> for &GMatrix<T> {
    type Output = GMatrix<T>;

    fn add(self, rhs: &GMatrix<T>) -> GMatrix<T> {
        or_panic(self.try_add(rhs))
    }
}

impl<T: Scalar> Add<&GMatrix<T>> for GMatrix<T> {
    type Output = GMatrix<T>;

    fn add(mut self, rhs: &GMatrix<T>) -> GMatrix<T> {
        or_panic(self.try_add_assign(rhs));
        self
    }
}

impl<T: Scalar> Sub<&GMatrix<T>> for &GMatrix<T> {
    type Output = GMatrix<T>;

    fn sub(self, rhs: &GMatrix<T>) -> GMatrix<T> {
        or_panic(self.try_sub(rhs))
    }
}

impl<T: Scalar> Sub<&GMatrix<T>> for GMatrix<T> {
    type Output = GMatrix<T>;

    fn sub(mut self, rhs: &GMatrix<T>) -> GMatrix<T> {
        or_panic(self.try_sub_assign(rhs));
        self
    }
}

impl<T: Scalar> Mul<&GMatrix<T>> for &GMatrix<T> {
    type Output = GMatrix<T>;

    fn mul(self, rhs: &GMatrix<T>) -> GMatrix<T> {
        or_panic(self.try_mul(rhs))
    }
}

impl<T: Scalar> Mul<&GMatrix<T>> for GMatrix<T> {
    type Output = GMatrix<T>;

    fn mul(self, rhs: &GMatrix<T>) -> GMatrix<T> {
        &self * rhs
    }
}

impl<T: Scalar> Neg for &GMatrix<T> {
    type Output = GMatrix<T>;

    fn neg(self) -> GMatrix<T> {
        let mut out = self.clone();
        out.negate();
        out
    }
}

impl<T: Scalar> Neg for GMatrix<T> {
    type Output = GMatrix<T>;

    fn neg(mut self) -> GMatrix<T> {
        self.negate();
        self
    }
}
