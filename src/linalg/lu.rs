#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use crate::linalg::LinalgError;
use crate::traits::{FloatScalar, MatrixMut, MatrixRef};
#[cfg(feature = "alloc")]
use crate::{GMatrix, GVector};

/// Perform LU decomposition with scaled partial pivoting, in place.
///
/// Crout's method with implicit row scaling: each candidate pivot is
/// weighted by the reciprocal of the largest magnitude in its row, so the
/// pivot choice does not depend on how individual equations are scaled.
///
/// On return, `a` contains both L and U packed together:
/// - Upper triangle (including diagonal): U
/// - Lower triangle (excluding diagonal): L (diagonal of L is implicitly 1)
///
/// `pivots[j]` records the row exchanged with row `j` at step `j`
/// (exchanges are applied in order `j = 0..n`). Returns the exchange
/// parity: `1` for an even number of row exchanges, `-1` for odd.
///
/// Fails with `MismatchedSize` if `a` is not square or `pivots.len()` is not
/// `n`, before touching `a`. Fails with `SingularMatrix` if a row is entirely
/// zero (also before touching `a`) or if a pivot is exactly zero; in the
/// latter case `a` holds a partial factorization.
///
/// ```
/// use vecmath::GMatrix;
/// use vecmath::linalg::lu_decompose;
///
/// let mut a = GMatrix::from_rows(2, 2, &[2.0_f64, 1.0, 4.0, 3.0]);
/// let mut pivots = [0usize; 2];
/// let parity = lu_decompose(&mut a, &mut pivots).unwrap();
/// assert_eq!(pivots, [1, 1]);
/// assert_eq!(parity, -1.0);
/// ```
#[cfg(feature = "alloc")]
pub fn lu_decompose<T: FloatScalar>(
    a: &mut impl MatrixMut<T>,
    pivots: &mut [usize],
) -> Result<T, LinalgError> {
    let n = a.nrows();
    LinalgError::check_size((n, n), (n, a.ncols()))?;
    LinalgError::check_size((n, 1), (pivots.len(), 1))?;

    let mut scale = Vec::with_capacity(n);
    for i in 0..n {
        let mut big = T::zero();
        for j in 0..n {
            let v = a.get(i, j).abs();
            if v > big {
                big = v;
            }
        }
        if big == T::zero() {
            tracing::debug!(row = i, "LU decomposition: zero row");
            return Err(LinalgError::SingularMatrix);
        }
        scale.push(T::one() / big);
    }

    let mut parity = T::one();

    for j in 0..n {
        // U entries above the diagonal
        for i in 0..j {
            let mut sum = *a.get(i, j);
            for k in 0..i {
                sum = sum - *a.get(i, k) * *a.get(k, j);
            }
            *a.get_mut(i, j) = sum;
        }

        // Diagonal and below, tracking the best scaled pivot
        let mut big = T::zero();
        let mut imax = j;
        for i in j..n {
            let mut sum = *a.get(i, j);
            for k in 0..j {
                sum = sum - *a.get(i, k) * *a.get(k, j);
            }
            *a.get_mut(i, j) = sum;
            let weighted = scale[i] * sum.abs();
            if weighted >= big {
                big = weighted;
                imax = i;
            }
        }

        if imax != j {
            a.swap_rows(imax, j);
            parity = -parity;
            scale[imax] = scale[j];
        }
        pivots[j] = imax;

        let pivot = *a.get(j, j);
        if pivot == T::zero() {
            tracing::debug!(step = j, "LU decomposition: zero pivot");
            return Err(LinalgError::SingularMatrix);
        }

        if j + 1 < n {
            let inv_pivot = T::one() / pivot;
            for i in (j + 1)..n {
                *a.get_mut(i, j) = *a.get(i, j) * inv_pivot;
            }
        }
    }

    Ok(parity)
}

/// Solve `A X = B` in place given the packed LU factors and pivot record.
///
/// `b` holds one right-hand side per column and is overwritten with the
/// solutions. All columns are solved in the same pass.
///
/// Fails with `MismatchedSize` (before writing) if `lu` is not square,
/// `pivots.len() != n`, or `b` does not have `n` rows.
pub fn lu_back_substitute<T: FloatScalar>(
    lu: &impl MatrixRef<T>,
    pivots: &[usize],
    b: &mut impl MatrixMut<T>,
) -> Result<(), LinalgError> {
    let n = lu.nrows();
    LinalgError::check_size((n, n), (n, lu.ncols()))?;
    LinalgError::check_size((n, 1), (pivots.len(), 1))?;
    LinalgError::check_size((n, b.ncols()), (b.nrows(), b.ncols()))?;

    for col in 0..b.ncols() {
        // Apply the exchanges and forward substitute (L y = P b). Leading
        // zeros of the permuted rhs are skipped.
        let mut first_nonzero: Option<usize> = None;
        for i in 0..n {
            let ip = pivots[i];
            let mut sum = *b.get(ip, col);
            *b.get_mut(ip, col) = *b.get(i, col);
            if let Some(start) = first_nonzero {
                for j in start..i {
                    sum = sum - *lu.get(i, j) * *b.get(j, col);
                }
            } else if sum != T::zero() {
                first_nonzero = Some(i);
            }
            *b.get_mut(i, col) = sum;
        }

        // Back substitution (U x = y)
        for i in (0..n).rev() {
            let mut sum = *b.get(i, col);
            for j in (i + 1)..n {
                sum = sum - *lu.get(i, j) * *b.get(j, col);
            }
            *b.get_mut(i, col) = sum / *lu.get(i, i);
        }
    }

    Ok(())
}

/// LU decomposition in place for a fixed-size array (row-major `m[row][col]`).
///
/// Same algorithm as [`lu_decompose`] but stack-only: intended for the 3×3
/// and 4×4 cases, where the compiler fully unrolls every loop. The exchange
/// parity is not tracked; these forms only feed inversion and solving.
#[inline(always)]
pub fn lu_decompose_array<T: FloatScalar, const N: usize>(
    m: &mut [[T; N]; N],
    pivots: &mut [usize; N],
) -> Result<(), LinalgError> {
    let mut scale = [T::zero(); N];
    for i in 0..N {
        let mut big = T::zero();
        for j in 0..N {
            let v = m[i][j].abs();
            if v > big {
                big = v;
            }
        }
        if big == T::zero() {
            return Err(LinalgError::SingularMatrix);
        }
        scale[i] = T::one() / big;
    }

    for j in 0..N {
        for i in 0..j {
            let mut sum = m[i][j];
            for k in 0..i {
                sum = sum - m[i][k] * m[k][j];
            }
            m[i][j] = sum;
        }

        let mut big = T::zero();
        let mut imax = j;
        for i in j..N {
            let mut sum = m[i][j];
            for k in 0..j {
                sum = sum - m[i][k] * m[k][j];
            }
            m[i][j] = sum;
            let weighted = scale[i] * sum.abs();
            if weighted >= big {
                big = weighted;
                imax = i;
            }
        }

        if imax != j {
            m.swap(imax, j);
            scale[imax] = scale[j];
        }
        pivots[j] = imax;

        if m[j][j] == T::zero() {
            return Err(LinalgError::SingularMatrix);
        }

        if j + 1 < N {
            let inv_pivot = T::one() / m[j][j];
            for i in (j + 1)..N {
                m[i][j] = m[i][j] * inv_pivot;
            }
        }
    }

    Ok(())
}

/// Back substitution for [`lu_decompose_array`] factors.
///
/// `b` is `N×K`: `K` right-hand sides stored as columns, overwritten with
/// the solutions.
#[inline(always)]
pub fn lu_back_substitute_array<T: FloatScalar, const N: usize, const K: usize>(
    lu: &[[T; N]; N],
    pivots: &[usize; N],
    b: &mut [[T; K]; N],
) {
    for col in 0..K {
        let mut first_nonzero: Option<usize> = None;
        for i in 0..N {
            let ip = pivots[i];
            let mut sum = b[ip][col];
            b[ip][col] = b[i][col];
            if let Some(start) = first_nonzero {
                for j in start..i {
                    sum = sum - lu[i][j] * b[j][col];
                }
            } else if sum != T::zero() {
                first_nonzero = Some(i);
            }
            b[i][col] = sum;
        }

        for i in (0..N).rev() {
            let mut sum = b[i][col];
            for j in (i + 1)..N {
                sum = sum - lu[i][j] * b[j][col];
            }
            b[i][col] = sum / lu[i][i];
        }
    }
}

/// LU decomposition of a dynamically-sized square matrix.
///
/// Stores the packed L/U factors, the pivot record, and the exchange parity.
///
/// # Example
///
/// ```
/// use vecmath::GMatrix;
///
/// let a = GMatrix::from_rows(2, 2, &[2.0_f64, 1.0, 5.0, 3.0]);
/// let lu = a.lu().unwrap();
///
/// let b = GMatrix::from_rows(2, 1, &[4.0, 11.0]);
/// let x = lu.solve(&b).unwrap();
/// assert!((x[(0, 0)] - 1.0).abs() < 1e-12);
/// assert!((x[(1, 0)] - 2.0).abs() < 1e-12);
/// assert!((lu.det() - 1.0).abs() < 1e-12);
/// ```
#[cfg(feature = "alloc")]
#[derive(Debug, Clone)]
pub struct LuDecomposition<T> {
    lu: GMatrix<T>,
    pivots: Vec<usize>,
    parity: T,
}

#[cfg(feature = "alloc")]
impl<T: FloatScalar> LuDecomposition<T> {
    /// Decompose a copy of `a`. The input is never modified.
    pub fn new(a: &impl MatrixRef<T>) -> Result<Self, LinalgError> {
        let mut lu = GMatrix::from_matrix_ref(a);
        let mut pivots = vec![0usize; lu.nrows()];
        let parity = lu_decompose(&mut lu, &mut pivots)?;
        Ok(Self { lu, pivots, parity })
    }

    /// Packed L (strictly lower) and U (upper, with diagonal) factors.
    #[inline]
    pub fn lu(&self) -> &GMatrix<T> {
        &self.lu
    }

    /// Pivot record: row exchanged with row `j` at step `j`.
    #[inline]
    pub fn pivots(&self) -> &[usize] {
        &self.pivots
    }

    /// Exchange parity, `1` or `-1`.
    #[inline]
    pub fn parity(&self) -> T {
        self.parity
    }

    /// Dimension of the decomposed matrix.
    #[inline]
    pub fn dim(&self) -> usize {
        self.lu.nrows()
    }

    /// Solve `A X = B` in place for every column of `b`.
    pub fn solve_in_place(&self, b: &mut impl MatrixMut<T>) -> Result<(), LinalgError> {
        lu_back_substitute(&self.lu, &self.pivots, b)
    }

    /// Solve `A X = B`, returning `X`.
    pub fn solve(&self, b: &GMatrix<T>) -> Result<GMatrix<T>, LinalgError> {
        let mut x = b.clone();
        self.solve_in_place(&mut x)?;
        Ok(x)
    }

    /// Solve `A x = b` for a single vector.
    pub fn solve_vector(&self, b: &GVector<T>) -> Result<GVector<T>, LinalgError> {
        let n = self.dim();
        LinalgError::check_size((n, 1), (b.len(), 1))?;
        let mut x = GMatrix::from_vec(n, 1, b.as_slice().to_vec());
        self.solve_in_place(&mut x)?;
        Ok(GVector::from_vec(x.into_vec()))
    }

    /// Compute the matrix inverse by back-substituting the identity.
    pub fn inverse(&self) -> GMatrix<T> {
        let mut inv = GMatrix::identity(self.dim());
        // Shapes are consistent by construction.
        let _ = lu_back_substitute(&self.lu, &self.pivots, &mut inv);
        inv
    }

    /// Compute the determinant: parity times the product of U's diagonal.
    pub fn det(&self) -> T {
        let mut d = self.parity;
        for i in 0..self.dim() {
            d = d * self.lu[(i, i)];
        }
        d
    }

    /// Split the packed factors into unit-lower `L` and upper `U`.
    ///
    /// `L · U` equals the input with the recorded row exchanges applied.
    pub fn unpack(&self) -> (GMatrix<T>, GMatrix<T>) {
        let n = self.dim();
        let l = GMatrix::from_fn(n, n, |i, j| {
            if i == j {
                T::one()
            } else if i > j {
                self.lu[(i, j)]
            } else {
                T::zero()
            }
        });
        let u = GMatrix::from_fn(n, n, |i, j| if i <= j { self.lu[(i, j)] } else { T::zero() });
        (l, u)
    }

    /// Undo the recorded row exchanges on `m` (maps `P·A` back to `A`).
    pub fn unpermute_rows(&self, m: &mut impl MatrixMut<T>) -> Result<(), LinalgError> {
        let n = self.dim();
        LinalgError::check_size((n, m.ncols()), (m.nrows(), m.ncols()))?;
        for j in (0..n).rev() {
            m.swap_rows(j, self.pivots[j]);
        }
        Ok(())
    }
}
