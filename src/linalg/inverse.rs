use crate::linalg::lu::{lu_back_substitute_array, lu_decompose_array};
use crate::linalg::LinalgError;
use crate::traits::{FloatScalar, MatrixRef};
#[cfg(feature = "alloc")]
use crate::linalg::lu::LuDecomposition;
#[cfg(feature = "alloc")]
use crate::GMatrix;
#[cfg(feature = "alloc")]
use alloc::vec;

/// Invert a square matrix.
///
/// The input is copied and decomposed; on `SingularMatrix` nothing is
/// returned, so a partial inverse can never escape.
///
/// ```
/// use vecmath::GMatrix;
/// use vecmath::linalg::invert;
///
/// let a = GMatrix::from_rows(2, 2, &[4.0_f64, 0.0, 3.0, -5.0]);
/// let inv = invert(&a).unwrap();
/// let prod = &a * &inv;
/// assert!((prod[(0, 0)] - 1.0).abs() < 1e-12);
/// assert!(prod[(1, 0)].abs() < 1e-12);
/// ```
#[cfg(feature = "alloc")]
pub fn invert<T: FloatScalar>(a: &impl MatrixRef<T>) -> Result<GMatrix<T>, LinalgError> {
    Ok(LuDecomposition::new(a)?.inverse())
}

/// Solve `A X = B` for every column of `b`.
#[cfg(feature = "alloc")]
pub fn solve<T: FloatScalar>(
    a: &impl MatrixRef<T>,
    b: &impl MatrixRef<T>,
) -> Result<GMatrix<T>, LinalgError> {
    let n = a.nrows();
    LinalgError::check_size((n, n), (n, a.ncols()))?;
    LinalgError::check_size((n, b.ncols()), (b.nrows(), b.ncols()))?;
    let lu = LuDecomposition::new(a)?;
    let mut x = GMatrix::from_matrix_ref(b);
    lu.solve_in_place(&mut x)?;
    Ok(x)
}

/// Back-solve through an SVD `A = U · diag(w) · Vᵀ`: `x = V · diag(1/w) · Uᵀ · b`.
///
/// `u` is `m×m`, `v` is `n×n`, `w` holds at most `min(m, n)` singular values
/// and `b` is `m×k`; the result is `n×k`. Exactly-zero singular values are
/// skipped, which gives the minimum-norm least-squares solution when the
/// caller has already zeroed the ones it considers negligible.
#[cfg(feature = "alloc")]
pub fn svd_back_substitute<T: FloatScalar>(
    u: &impl MatrixRef<T>,
    w: &[T],
    v: &impl MatrixRef<T>,
    b: &impl MatrixRef<T>,
) -> Result<GMatrix<T>, LinalgError> {
    let m = u.nrows();
    let n = v.nrows();
    LinalgError::check_size((m, m), (m, u.ncols()))?;
    LinalgError::check_size((n, n), (n, v.ncols()))?;
    if w.len() > m.min(n) {
        return Err(LinalgError::MismatchedSize {
            expected: (m.min(n), 1),
            got: (w.len(), 1),
        });
    }
    LinalgError::check_size((m, b.ncols()), (b.nrows(), b.ncols()))?;

    let k = b.ncols();
    let mut x = GMatrix::zeros(n, k);
    let mut tmp = vec![T::zero(); w.len()];
    for col in 0..k {
        for (j, t) in tmp.iter_mut().enumerate() {
            *t = T::zero();
            if w[j] != T::zero() {
                let mut sum = T::zero();
                for i in 0..m {
                    sum = sum + *u.get(i, j) * *b.get(i, col);
                }
                *t = sum / w[j];
            }
        }
        for i in 0..n {
            let mut sum = T::zero();
            for (j, &t) in tmp.iter().enumerate() {
                sum = sum + *v.get(i, j) * t;
            }
            x[(i, col)] = sum;
        }
    }
    Ok(x)
}

/// Invert a fixed-size square array matrix without heap allocation.
///
/// ```
/// use vecmath::linalg::invert_array;
///
/// let a = [[4.0_f64, 7.0], [2.0, 6.0]];
/// let inv = invert_array(&a).unwrap();
/// assert!((inv[0][0] - 0.6).abs() < 1e-12);
/// assert!((inv[0][1] + 0.7).abs() < 1e-12);
/// ```
pub fn invert_array<T: FloatScalar, const N: usize>(
    m: &[[T; N]; N],
) -> Result<[[T; N]; N], LinalgError> {
    let mut lu = *m;
    let mut pivots = [0usize; N];
    lu_decompose_array(&mut lu, &mut pivots)?;
    let mut inv = [[T::zero(); N]; N];
    for (i, row) in inv.iter_mut().enumerate() {
        row[i] = T::one();
    }
    lu_back_substitute_array(&lu, &pivots, &mut inv);
    Ok(inv)
}

/// Solve `A X = B` for fixed-size arrays; `b` holds `K` right-hand sides as columns.
pub fn solve_array<T: FloatScalar, const N: usize, const K: usize>(
    a: &[[T; N]; N],
    b: &[[T; K]; N],
) -> Result<[[T; K]; N], LinalgError> {
    let mut lu = *a;
    let mut pivots = [0usize; N];
    lu_decompose_array(&mut lu, &mut pivots)?;
    let mut x = *b;
    lu_back_substitute_array(&lu, &pivots, &mut x);
    Ok(x)
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

    #[cfg(feature = "alloc")]
    #[test]
    fn invert_3x3() {
        let a = GMatrix::from_rows(3, 3, &[
            2.0_f64, -1.0, 0.0,
            -1.0, 2.0, -1.0,
            0.0, -1.0, 2.0,
        ]);
        let inv = invert(&a).unwrap();
        let expected = [[0.75, 0.5, 0.25], [0.5, 1.0, 0.5], [0.25, 0.5, 0.75]];
        for i in 0..3 {
            for j in 0..3 {
                assert_near(inv[(i, j)], expected[i][j], 1e-12, &format!("inv[({},{})]", i, j));
            }
        }
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn invert_singular_fails() {
        let a = GMatrix::from_rows(3, 3, &[
            1.0_f64, 2.0, 3.0,
            0.0, 0.0, 0.0,
            4.0, 5.0, 6.0,
        ]);
        assert_eq!(invert(&a), Err(LinalgError::SingularMatrix));
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn invert_non_square_fails() {
        let a = GMatrix::<f64>::zeros(2, 3);
        assert!(matches!(invert(&a), Err(LinalgError::MismatchedSize { .. })));
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn solve_system() {
        let a = GMatrix::from_rows(2, 2, &[1.0_f64, 1.0, 1.0, -1.0]);
        let b = GMatrix::from_rows(2, 1, &[3.0, 1.0]);
        let x = solve(&a, &b).unwrap();
        assert_near(x[(0, 0)], 2.0, 1e-14, "x0");
        assert_near(x[(1, 0)], 1.0, 1e-14, "x1");

        let bad = GMatrix::<f64>::zeros(3, 1);
        assert_eq!(
            solve(&a, &bad),
            Err(LinalgError::MismatchedSize {
                expected: (2, 1),
                got: (3, 1)
            })
        );
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn svd_back_substitute_diagonal() {
        let u = GMatrix::<f64>::identity(2);
        let v = GMatrix::<f64>::identity(2);
        let b = GMatrix::from_rows(2, 1, &[4.0, 9.0]);
        let x = svd_back_substitute(&u, &[2.0, 3.0], &v, &b).unwrap();
        assert_near(x[(0, 0)], 2.0, 1e-15, "x0");
        assert_near(x[(1, 0)], 3.0, 1e-15, "x1");

        // A zero singular value drops that component
        let x = svd_back_substitute(&u, &[2.0, 0.0], &v, &b).unwrap();
        assert_near(x[(0, 0)], 2.0, 1e-15, "x0");
        assert_eq!(x[(1, 0)], 0.0);
    }

    #[test]
    fn invert_array_4x4() {
        let a = [
            [4.0_f64, 1.0, 0.0, 0.0],
            [1.0, 4.0, 1.0, 0.0],
            [0.0, 1.0, 4.0, 1.0],
            [0.0, 0.0, 1.0, 4.0],
        ];
        let inv = invert_array(&a).unwrap();
        for i in 0..4 {
            for j in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += a[i][k] * inv[k][j];
                }
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_near(sum, expected, 1e-12, &format!("(A A^-1)[({},{})]", i, j));
            }
        }
    }

    #[test]
    fn invert_array_singular() {
        let z = [[1.0_f64, 2.0, 3.0], [0.0, 0.0, 0.0], [7.0, 8.0, 9.0]];
        assert_eq!(invert_array(&z), Err(LinalgError::SingularMatrix));
    }

    #[test]
    fn solve_array_3x3() {
        let a = [[3.0_f64, 2.0, -1.0], [2.0, -2.0, 4.0], [-1.0, 0.5, -1.0]];
        let b = [[1.0], [-2.0], [0.0]];
        let x = solve_array(&a, &b).unwrap();
        assert_near(x[0][0], 1.0, 1e-12, "x0");
        assert_near(x[1][0], -2.0, 1e-12, "x1");
        assert_near(x[2][0], -2.0, 1e-12, "x2");
    }
}
