use crate::linalg::LinalgError;
use crate::traits::{MatrixRef, Scalar};

use super::GMatrix;

impl<T: Scalar> GMatrix<T> {
    /// Copy the `rows x cols` block of `src` starting at `(src_row, src_col)`
    /// into `self` starting at `(dst_row, dst_col)`.
    ///
    /// Fails with `MismatchedSize` if the block does not fit in either
    /// matrix; nothing is written in that case.
    ///
    /// ```
    /// use vecmath::GMatrix;
    /// let src = GMatrix::from_fn(3, 3, |i, j| (i * 3 + j) as f64);
    /// let mut dst = GMatrix::<f64>::zeros(2, 4);
    /// dst.copy_sub_matrix(&src, 1, 1, 2, 2, 0, 2).unwrap();
    /// assert_eq!(dst.row(0), &[0.0, 0.0, 4.0, 5.0]);
    /// assert_eq!(dst.row(1), &[0.0, 0.0, 7.0, 8.0]);
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn copy_sub_matrix(
        &mut self,
        src: &impl MatrixRef<T>,
        src_row: usize,
        src_col: usize,
        rows: usize,
        cols: usize,
        dst_row: usize,
        dst_col: usize,
    ) -> Result<(), LinalgError> {
        let src_end = (src_row + rows, src_col + cols);
        if src_end.0 > src.nrows() || src_end.1 > src.ncols() {
            return Err(LinalgError::MismatchedSize {
                expected: (src.nrows(), src.ncols()),
                got: src_end,
            });
        }
        let dst_end = (dst_row + rows, dst_col + cols);
        if dst_end.0 > self.nrows || dst_end.1 > self.ncols {
            return Err(LinalgError::MismatchedSize {
                expected: (self.nrows, self.ncols),
                got: dst_end,
            });
        }

        for r in 0..rows {
            for c in 0..cols {
                self[(dst_row + r, dst_col + c)] = *src.get(src_row + r, src_col + c);
            }
        }
        Ok(())
    }

    /// Extract the `rows x cols` sub-matrix starting at `(i, j)`.
    ///
    /// Panics if the block extends beyond the matrix bounds.
    pub fn block(&self, i: usize, j: usize, rows: usize, cols: usize) -> Self {
        assert!(
            i + rows <= self.nrows && j + cols <= self.ncols,
            "block ({},{}) size {}x{} out of bounds for {}x{} matrix",
            i,
            j,
            rows,
            cols,
            self.nrows,
            self.ncols,
        );
        GMatrix::from_fn(rows, cols, |r, c| self[(i + r, j + c)])
    }

    /// Write all of `src` into `self` starting at `(i, j)`.
    pub fn set_block(&mut self, i: usize, j: usize, src: &GMatrix<T>) -> Result<(), LinalgError> {
        self.copy_sub_matrix(src, 0, 0, src.nrows, src.ncols, i, j)
    }
}
