use crate::linalg::{svd, LinalgError, LuDecomposition, SvdDecomposition};
use crate::traits::{FloatScalar, MatrixMut};

use super::{GMatrix, GVector};

impl<T: FloatScalar> GMatrix<T> {
    /// LU decomposition with scaled partial pivoting.
    pub fn lu(&self) -> Result<LuDecomposition<T>, LinalgError> {
        LuDecomposition::new(self)
    }

    /// Matrix inverse.
    ///
    /// ```
    /// use vecmath::GMatrix;
    /// let a = GMatrix::from_rows(2, 2, &[4.0_f64, 7.0, 2.0, 6.0]);
    /// let inv = a.invert().unwrap();
    /// let id = &a * &inv;
    /// assert!((id[(0, 0)] - 1.0).abs() < 1e-12);
    /// assert!(id[(0, 1)].abs() < 1e-12);
    /// ```
    pub fn invert(&self) -> Result<GMatrix<T>, LinalgError> {
        Ok(self.lu()?.inverse())
    }

    /// Replace `self` with its inverse. On error `self` is unchanged.
    pub fn invert_in_place(&mut self) -> Result<(), LinalgError> {
        *self = self.invert()?;
        Ok(())
    }

    /// Solve `A X = B` for every column of `b`.
    pub fn solve(&self, b: &GMatrix<T>) -> Result<GMatrix<T>, LinalgError> {
        self.lu()?.solve(b)
    }

    /// Solve `A x = b` for a single vector.
    ///
    /// ```
    /// use vecmath::{GMatrix, GVector};
    /// let a = GMatrix::from_rows(2, 2, &[2.0_f64, 1.0, 1.0, 3.0]);
    /// let x = a.solve_vector(&GVector::from_slice(&[3.0, 5.0])).unwrap();
    /// assert!((x[0] - 0.8).abs() < 1e-12);
    /// assert!((x[1] - 1.4).abs() < 1e-12);
    /// ```
    pub fn solve_vector(&self, b: &GVector<T>) -> Result<GVector<T>, LinalgError> {
        self.lu()?.solve_vector(b)
    }

    /// Determinant via LU. A matrix LU rejects as singular has determinant 0.
    ///
    /// ```
    /// use vecmath::GMatrix;
    /// let a = GMatrix::from_rows(2, 2, &[3.0_f64, 8.0, 4.0, 6.0]);
    /// assert!((a.det().unwrap() + 14.0).abs() < 1e-12);
    /// ```
    pub fn det(&self) -> Result<T, LinalgError> {
        match self.lu() {
            Ok(lu) => Ok(lu.det()),
            Err(LinalgError::SingularMatrix) => Ok(T::zero()),
            Err(e) => Err(e),
        }
    }

    /// Singular value decomposition.
    pub fn svd(&self) -> Result<SvdDecomposition<T>, LinalgError> {
        SvdDecomposition::new(self)
    }

    /// Singular value decomposition into caller-provided `U` (m×m), `W`
    /// (m×n) and `V` (n×n). Returns the number of singular values produced.
    pub fn svd_into(
        &self,
        u: &mut impl MatrixMut<T>,
        w: &mut impl MatrixMut<T>,
        v: &mut impl MatrixMut<T>,
    ) -> Result<usize, LinalgError> {
        svd(self, u, w, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!(
            (a - b).abs() < tol,
            "{}: {} vs {} (diff {})",
            msg,
            a,
            b,
            (a - b).abs()
        );
    }

    #[test]
    fn invert_in_place_round_trip() {
        let a = GMatrix::from_rows(3, 3, &[
            2.0_f64, 0.0, 1.0,
            1.0, 3.0, 0.0,
            0.0, 1.0, 4.0,
        ]);
        let mut b = a.clone();
        b.invert_in_place().unwrap();
        b.invert_in_place().unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_near(b[(i, j)], a[(i, j)], 1e-12, &format!("[({},{})]", i, j));
            }
        }
    }

    #[test]
    fn invert_in_place_singular_untouched() {
        let mut a = GMatrix::from_rows(2, 2, &[1.0_f64, 2.0, 0.0, 0.0]);
        assert_eq!(a.invert_in_place(), Err(LinalgError::SingularMatrix));
        assert_eq!(a.as_slice(), &[1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn det_of_singular_is_zero() {
        let a = GMatrix::from_rows(2, 2, &[1.0_f64, 2.0, 2.0, 4.0]);
        assert_eq!(a.det(), Ok(0.0));
        let rect = GMatrix::<f64>::zeros(2, 3);
        assert!(rect.det().is_err());
    }

    #[test]
    fn solve_vector_size_mismatch() {
        let a = GMatrix::<f64>::identity(3);
        assert_eq!(
            a.solve_vector(&GVector::from_slice(&[1.0, 2.0])),
            Err(LinalgError::MismatchedSize {
                expected: (3, 1),
                got: (2, 1)
            })
        );
    }

    #[test]
    fn svd_into_matches_svd() {
        let a = GMatrix::from_rows(3, 2, &[3.0_f64, 1.0, 1.0, 3.0, 0.0, 0.0]);
        let mut u = GMatrix::zeros(3, 3);
        let mut w = GMatrix::zeros(3, 2);
        let mut v = GMatrix::zeros(2, 2);
        assert_eq!(a.svd_into(&mut u, &mut w, &mut v), Ok(2));
        let s = a.svd().unwrap();
        assert_near(w[(0, 0)], s.w()[0], 1e-15, "w0");
        assert_near(w[(1, 1)], s.w()[1], 1e-15, "w1");
        assert_near(w[(0, 0)], 4.0, 1e-13, "sigma0");
        assert_near(w[(1, 1)], 2.0, 1e-13, "sigma1");
    }
}
