mod block;
mod linalg;
mod ops;
mod vector;

pub use vector::GVector;

use alloc::vec;
use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use crate::linalg::LinalgError;
use crate::traits::{MatrixMut, MatrixRef, Scalar};

/// Dynamically-sized heap-allocated matrix.
///
/// Row-major `Vec<T>` storage holding exactly `nrows * ncols` elements.
/// Dimensions are set at runtime and can change through [`resize`](Self::resize).
/// Implements [`MatrixRef`] and [`MatrixMut`], so all generic linalg free
/// functions work with `GMatrix` out of the box.
///
/// # Examples
///
/// ```
/// use vecmath::GMatrix;
///
/// let a = GMatrix::from_rows(2, 2, &[1.0_f64, 2.0, 3.0, 4.0]);
/// assert_eq!(a[(0, 1)], 2.0);
/// assert_eq!(a.nrows(), 2);
/// assert_eq!(a.ncols(), 2);
///
/// let b = GMatrix::<f64>::identity(3);
/// assert_eq!(b[(0, 0)], 1.0);
/// assert_eq!(b[(0, 1)], 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GMatrix<T> {
    data: Vec<T>,
    nrows: usize,
    ncols: usize,
}

// ── Constructors ────────────────────────────────────────────────────

impl<T: Scalar> GMatrix<T> {
    /// Create an `nrows x ncols` matrix of zeros.
    ///
    /// ```
    /// use vecmath::GMatrix;
    /// let m = GMatrix::<f64>::zeros(2, 3);
    /// assert_eq!(m.nrows(), 2);
    /// assert_eq!(m.ncols(), 3);
    /// assert_eq!(m[(1, 2)], 0.0);
    /// ```
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![T::zero(); nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Create an `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        m.set_identity();
        m
    }

    /// Create a square matrix with `diag` on its diagonal.
    ///
    /// ```
    /// use vecmath::GMatrix;
    /// let m = GMatrix::from_diag(&[2.0_f64, 3.0]);
    /// assert_eq!(m[(1, 1)], 3.0);
    /// assert_eq!(m[(0, 1)], 0.0);
    /// ```
    pub fn from_diag(diag: &[T]) -> Self {
        let n = diag.len();
        let mut m = Self::zeros(n, n);
        for (i, &d) in diag.iter().enumerate() {
            m[(i, i)] = d;
        }
        m
    }

    /// Create a matrix from a flat slice in row-major order.
    ///
    /// Panics if `row_major.len() != nrows * ncols`.
    ///
    /// ```
    /// use vecmath::GMatrix;
    /// let m = GMatrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// assert_eq!(m[(0, 2)], 3.0);
    /// assert_eq!(m[(1, 0)], 4.0);
    /// ```
    pub fn from_rows(nrows: usize, ncols: usize, row_major: &[T]) -> Self {
        assert_eq!(
            row_major.len(),
            nrows * ncols,
            "slice length {} does not match {}x{} matrix",
            row_major.len(),
            nrows,
            ncols,
        );
        Self {
            data: row_major.to_vec(),
            nrows,
            ncols,
        }
    }

    /// Create a matrix from an owned row-major `Vec<T>`.
    ///
    /// Panics if `data.len() != nrows * ncols`.
    pub fn from_vec(nrows: usize, ncols: usize, data: Vec<T>) -> Self {
        assert_eq!(
            data.len(),
            nrows * ncols,
            "vec length {} does not match {}x{} matrix",
            data.len(),
            nrows,
            ncols,
        );
        Self { data, nrows, ncols }
    }

    /// Copy any [`MatrixRef`] into a new `GMatrix`.
    pub fn from_matrix_ref(src: &impl MatrixRef<T>) -> Self {
        Self::from_fn(src.nrows(), src.ncols(), |i, j| *src.get(i, j))
    }

    /// Element at `(row, col)`, or `None` when out of range.
    #[inline]
    pub fn get_element(&self, row: usize, col: usize) -> Option<T> {
        if row < self.nrows && col < self.ncols {
            Some(self.data[row * self.ncols + col])
        } else {
            None
        }
    }

    /// Overwrite the element at `(row, col)`, returning the previous value.
    /// Out-of-range positions return `None` and write nothing.
    #[inline]
    pub fn set_element(&mut self, row: usize, col: usize, value: T) -> Option<T> {
        if row < self.nrows && col < self.ncols {
            Some(core::mem::replace(&mut self.data[row * self.ncols + col], value))
        } else {
            None
        }
    }

    /// Row `i` as a vector. Panics if `i` is out of range.
    pub fn get_row(&self, i: usize) -> GVector<T> {
        GVector::from_slice(self.row(i))
    }

    /// Copy row `i` into `out`, which must hold exactly `ncols` elements.
    pub fn get_row_into(&self, i: usize, out: &mut [T]) -> Result<(), LinalgError> {
        LinalgError::check_size((1, self.ncols), (1, out.len()))?;
        out.copy_from_slice(self.row(i));
        Ok(())
    }

    /// Overwrite row `i` from a slice of exactly `ncols` elements.
    ///
    /// ```
    /// use vecmath::GMatrix;
    /// let mut m = GMatrix::<f64>::zeros(2, 2);
    /// m.set_row(1, &[3.0, 4.0]).unwrap();
    /// assert_eq!(m[(1, 0)], 3.0);
    /// assert!(m.set_row(0, &[1.0]).is_err());
    /// ```
    pub fn set_row(&mut self, i: usize, values: &[T]) -> Result<(), LinalgError> {
        LinalgError::check_size((1, self.ncols), (1, values.len()))?;
        let start = i * self.ncols;
        self.data[start..start + self.ncols].copy_from_slice(values);
        Ok(())
    }

    /// Column `j` as a vector. Panics if `j` is out of range.
    pub fn get_column(&self, j: usize) -> GVector<T> {
        GVector::from_vec((0..self.nrows).map(|i| self[(i, j)]).collect())
    }

    /// Copy column `j` into `out`, which must hold exactly `nrows` elements.
    pub fn get_column_into(&self, j: usize, out: &mut [T]) -> Result<(), LinalgError> {
        LinalgError::check_size((self.nrows, 1), (out.len(), 1))?;
        for (i, o) in out.iter_mut().enumerate() {
            *o = self[(i, j)];
        }
        Ok(())
    }

    /// Overwrite column `j` from a slice of exactly `nrows` elements.
    pub fn set_column(&mut self, j: usize, values: &[T]) -> Result<(), LinalgError> {
        LinalgError::check_size((self.nrows, 1), (values.len(), 1))?;
        for (i, &v) in values.iter().enumerate() {
            self[(i, j)] = v;
        }
        Ok(())
    }

    /// Change the dimensions, keeping the overlapping top-left block and
    /// zero-filling new cells.
    ///
    /// ```
    /// use vecmath::GMatrix;
    /// let mut m = GMatrix::from_rows(2, 2, &[1, 2, 3, 4]);
    /// m.resize(3, 1);
    /// assert_eq!(m.as_slice(), &[1, 3, 0]);
    /// ```
    pub fn resize(&mut self, nrows: usize, ncols: usize) {
        if nrows == self.nrows && ncols == self.ncols {
            return;
        }
        let mut data = vec![T::zero(); nrows * ncols];
        for i in 0..nrows.min(self.nrows) {
            for j in 0..ncols.min(self.ncols) {
                data[i * ncols + j] = self.data[i * self.ncols + j];
            }
        }
        self.data = data;
        self.nrows = nrows;
        self.ncols = ncols;
    }

    /// Ones on the main diagonal, zeros elsewhere (any shape).
    pub fn set_identity(&mut self) {
        self.set_zero();
        for i in 0..self.nrows.min(self.ncols) {
            self.data[i * self.ncols + i] = T::one();
        }
    }

    /// Set every element to zero.
    pub fn set_zero(&mut self) {
        for x in self.data.iter_mut() {
            *x = T::zero();
        }
    }
}

impl<T> GMatrix<T> {
    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Whether the matrix is square.
    #[inline]
    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    /// Create a matrix by calling `f(row, col)` for each element.
    ///
    /// ```
    /// use vecmath::GMatrix;
    /// let m = GMatrix::from_fn(3, 3, |i, j| if i == j { 1.0_f64 } else { 0.0 });
    /// assert_eq!(m[(0, 0)], 1.0);
    /// assert_eq!(m[(0, 1)], 0.0);
    /// ```
    pub fn from_fn(nrows: usize, ncols: usize, f: impl Fn(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(nrows * ncols);
        for i in 0..nrows {
            for j in 0..ncols {
                data.push(f(i, j));
            }
        }
        Self { data, nrows, ncols }
    }

    /// Row `i` as a slice.
    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.ncols..(i + 1) * self.ncols]
    }

    /// The elements in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The elements in row-major order, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the matrix, returning its row-major storage.
    #[inline]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

// ── MatrixRef / MatrixMut ───────────────────────────────────────────

impl<T> MatrixRef<T> for GMatrix<T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> &T {
        &self.data[row * self.ncols + col]
    }
}

impl<T> MatrixMut<T> for GMatrix<T> {
    #[inline]
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        &mut self.data[row * self.ncols + col]
    }

    fn swap_rows(&mut self, a: usize, b: usize)
    where
        T: Copy,
    {
        if a == b {
            return;
        }
        let n = self.ncols;
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.data.split_at_mut(hi * n);
        head[lo * n..(lo + 1) * n].swap_with_slice(&mut tail[..n]);
    }
}

// ── Index ───────────────────────────────────────────────────────────

impl<T> Index<(usize, usize)> for GMatrix<T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        &self.data[row * self.ncols + col]
    }
}

impl<T> IndexMut<(usize, usize)> for GMatrix<T> {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        &mut self.data[row * self.ncols + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeros() {
        let m = GMatrix::<f64>::zeros(3, 4);
        assert_eq!(m.nrows(), 3);
        assert_eq!(m.ncols(), 4);
        assert!(m.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn identity() {
        let m = GMatrix::<f64>::identity(3);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(m[(i, j)], expected);
            }
        }
    }

    #[test]
    fn from_rows_is_row_major() {
        let m = GMatrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(m[(0, 0)], 1.0);
        assert_eq!(m[(0, 2)], 3.0);
        assert_eq!(m[(1, 0)], 4.0);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
    }

    #[test]
    #[should_panic(expected = "slice length")]
    fn from_rows_wrong_length() {
        let _ = GMatrix::from_rows(2, 2, &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn element_access() {
        let mut m = GMatrix::from_rows(2, 2, &[1, 2, 3, 4]);
        assert_eq!(m.get_element(1, 0), Some(3));
        assert_eq!(m.get_element(2, 0), None);
        assert_eq!(m.set_element(0, 1, 9), Some(2));
        assert_eq!(m[(0, 1)], 9);
        assert_eq!(m.set_element(0, 2, 9), None);
    }

    #[test]
    fn rows_and_columns() {
        let mut m = GMatrix::from_rows(2, 3, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(m.get_row(1).as_slice(), &[4, 5, 6]);
        assert_eq!(m.get_column(2).as_slice(), &[3, 6]);

        let mut col = [0; 2];
        m.get_column_into(0, &mut col).unwrap();
        assert_eq!(col, [1, 4]);
        let mut row = [0; 2];
        assert_eq!(
            m.get_row_into(0, &mut row),
            Err(LinalgError::MismatchedSize {
                expected: (1, 3),
                got: (1, 2)
            })
        );

        m.set_column(1, &[7, 8]).unwrap();
        assert_eq!(m.as_slice(), &[1, 7, 3, 4, 8, 6]);
        assert!(m.set_column(1, &[7, 8, 9]).is_err());
        assert_eq!(m.as_slice(), &[1, 7, 3, 4, 8, 6]);
    }

    #[test]
    fn resize_preserves_overlap() {
        let mut m = GMatrix::from_rows(2, 3, &[1, 2, 3, 4, 5, 6]);
        m.resize(3, 2);
        assert_eq!(m.as_slice(), &[1, 2, 4, 5, 0, 0]);
        m.resize(1, 4);
        assert_eq!(m.as_slice(), &[1, 2, 0, 0]);
    }

    #[test]
    fn set_identity_rectangular() {
        let mut m = GMatrix::from_rows(2, 3, &[9, 9, 9, 9, 9, 9]);
        m.set_identity();
        assert_eq!(m.as_slice(), &[1, 0, 0, 0, 1, 0]);
        m.set_zero();
        assert!(m.as_slice().iter().all(|&x| x == 0));
    }

    #[test]
    fn swap_rows() {
        let mut m = GMatrix::from_rows(3, 2, &[1, 2, 3, 4, 5, 6]);
        m.swap_rows(2, 0);
        assert_eq!(m.as_slice(), &[5, 6, 3, 4, 1, 2]);
        m.swap_rows(1, 1);
        assert_eq!(m.as_slice(), &[5, 6, 3, 4, 1, 2]);
    }

    #[test]
    fn matrix_ref_trait() {
        let m = GMatrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        fn trace<T: Scalar>(m: &impl MatrixRef<T>) -> T {
            let mut sum = T::zero();
            let n = m.nrows().min(m.ncols());
            for i in 0..n {
                sum = sum + *m.get(i, i);
            }
            sum
        }
        assert_eq!(trace(&m), 5.0);
    }

    #[test]
    fn from_matrix_ref_copies_arrays() {
        let a = [[1.0_f64, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let m = GMatrix::from_matrix_ref(&a);
        assert_eq!(m.nrows(), 3);
        assert_eq!(m[(2, 1)], 6.0);
    }
}
