use alloc::vec;
use alloc::vec::Vec;

use crate::linalg::inverse::svd_back_substitute;
use crate::linalg::rotation::{compute_rot, negligible, shifted_sweep, solve_2x2_block};
use crate::linalg::LinalgError;
use crate::traits::{FloatScalar, MatrixMut, MatrixRef};
use crate::GMatrix;

/// Sweep budget of a band, per singular value it holds. A band that runs out
/// keeps whatever values it has reached.
const MAX_SWEEPS_PER_VALUE: usize = 30;

// ── Householder bidiagonalization ───────────────────────────────────

/// `sqrt(Σ x²)` kept as `scale · sqrt(ssq)` with every ratio `|x| / scale`
/// at most 1, so no square over- or underflows.
fn scaled_norm<T: FloatScalar>(values: impl Iterator<Item = T>) -> T {
    let mut scale = T::zero();
    let mut ssq = T::one();
    for x in values {
        let ax = x.abs();
        if ax == T::zero() {
            continue;
        }
        if scale < ax {
            let r = scale / ax;
            ssq = T::one() + ssq * r * r;
            scale = ax;
        } else {
            let r = ax / scale;
            ssq = ssq + r * r;
        }
    }
    scale * ssq.sqrt()
}

/// Reflector `H = I − tau · w · wᵀ` sending `(head, tail)` to `(−sigma, 0)`.
///
/// `w` has an implicit leading 1 and its tail is the segment divided by
/// `v0 = head + sigma`.
struct Reflector<T> {
    sigma: T,
    v0: T,
    tau: T,
}

impl<T: FloatScalar> Reflector<T> {
    /// `None` when the tail is exactly zero and there is nothing to reflect.
    fn new(head: T, tail_norm: T) -> Option<Self> {
        if tail_norm == T::zero() {
            return None;
        }
        let sigma = head.hypot(tail_norm).with_sign_of(head);
        let v0 = head + sigma;
        Some(Self {
            sigma,
            v0,
            tau: v0 / sigma,
        })
    }
}

/// Reflect rows `k..m` so column `k` is zero below the diagonal, and fold
/// the reflector into `U` from the right. Returns the new `a[k][k]`.
///
/// The zeroed entries are overwritten with the reflector tail.
fn reduce_column<T: FloatScalar>(
    a: &mut impl MatrixMut<T>,
    u: &mut impl MatrixMut<T>,
    k: usize,
) -> T {
    let m = a.nrows();
    let n = a.ncols();
    let head = *a.get(k, k);
    let tail = scaled_norm(((k + 1)..m).map(|i| *a.get(i, k)));
    let h = match Reflector::new(head, tail) {
        Some(h) => h,
        None => return head,
    };

    for i in (k + 1)..m {
        let w = *a.get(i, k) / h.v0;
        *a.get_mut(i, k) = w;
    }

    for j in (k + 1)..n {
        let mut p = *a.get(k, j);
        for i in (k + 1)..m {
            p = p + *a.get(i, k) * *a.get(i, j);
        }
        p = p * h.tau;
        *a.get_mut(k, j) = *a.get(k, j) - p;
        for i in (k + 1)..m {
            let w = *a.get(i, k);
            *a.get_mut(i, j) = *a.get(i, j) - p * w;
        }
    }

    for r in 0..m {
        let mut p = *u.get(r, k);
        for i in (k + 1)..m {
            p = p + *u.get(r, i) * *a.get(i, k);
        }
        p = p * h.tau;
        *u.get_mut(r, k) = *u.get(r, k) - p;
        for i in (k + 1)..m {
            let w = *a.get(i, k);
            *u.get_mut(r, i) = *u.get(r, i) - p * w;
        }
    }

    -h.sigma
}

/// Reflect columns `k+1..n` so row `k` is zero right of the superdiagonal,
/// and fold the reflector into `V`. Returns the new `a[k][k+1]`.
fn reduce_row<T: FloatScalar>(
    a: &mut impl MatrixMut<T>,
    v: &mut impl MatrixMut<T>,
    k: usize,
) -> T {
    let m = a.nrows();
    let n = a.ncols();
    let head = *a.get(k, k + 1);
    let tail = scaled_norm(((k + 2)..n).map(|j| *a.get(k, j)));
    let h = match Reflector::new(head, tail) {
        Some(h) => h,
        None => return head,
    };

    for j in (k + 2)..n {
        let w = *a.get(k, j) / h.v0;
        *a.get_mut(k, j) = w;
    }

    for i in (k + 1)..m {
        let mut p = *a.get(i, k + 1);
        for j in (k + 2)..n {
            p = p + *a.get(i, j) * *a.get(k, j);
        }
        p = p * h.tau;
        *a.get_mut(i, k + 1) = *a.get(i, k + 1) - p;
        for j in (k + 2)..n {
            let w = *a.get(k, j);
            *a.get_mut(i, j) = *a.get(i, j) - p * w;
        }
    }

    for r in 0..n {
        let mut p = *v.get(r, k + 1);
        for j in (k + 2)..n {
            p = p + *v.get(r, j) * *a.get(k, j);
        }
        p = p * h.tau;
        *v.get_mut(r, k + 1) = *v.get(r, k + 1) - p;
        for j in (k + 2)..n {
            let w = *a.get(k, j);
            *v.get_mut(r, j) = *v.get(r, j) - p * w;
        }
    }

    -h.sigma
}

/// Bring an M×N matrix (M ≥ N) to upper bidiagonal form, `A = U · B · Vᵀ`.
///
/// Column and row reflectors alternate; `u` and `v` must start orthogonal
/// (normally the identity) and accumulate them. `a` is used as scratch. A
/// segment that is already exactly zero is left alone, so a diagonal input
/// keeps `U` and `V` untouched.
pub(crate) fn bidiagonalize<T: FloatScalar>(
    a: &mut impl MatrixMut<T>,
    diag: &mut [T],
    off_diag: &mut [T],
    u: &mut impl MatrixMut<T>,
    v: &mut impl MatrixMut<T>,
) {
    let n = a.ncols();
    debug_assert!(a.nrows() >= n, "bidiagonalize requires M >= N");
    debug_assert!(diag.len() == n && off_diag.len() + 1 == n);

    for k in 0..n {
        diag[k] = reduce_column(a, u, k);
        if k + 1 < n {
            off_diag[k] = reduce_row(a, v, k);
        }
    }
}

// ── Implicit-shift QR on the bidiagonal ─────────────────────────────

/// Drive the superdiagonal of `bidiag(diag, off_diag)` to zero.
///
/// Work is organised as a stack of `(lo, hi)` bands. Each band deflates from
/// its bottom end as trailing entries become negligible; a negligible
/// interior entry splits it, and the lower half is finished before the upper
/// one. Two-wide bands are solved in closed form. A zero on the diagonal is
/// chased off the band first, since the shifted sweep cannot make progress
/// through it.
///
/// Singular values are left signed and unsorted.
pub(crate) fn diagonalize<T: FloatScalar>(
    diag: &mut [T],
    off_diag: &mut [T],
    u: &mut impl MatrixMut<T>,
    v: &mut impl MatrixMut<T>,
) {
    diagonalize_within(diag, off_diag, u, v, MAX_SWEEPS_PER_VALUE);
}

/// [`diagonalize`] with an explicit sweep budget per singular value.
fn diagonalize_within<T: FloatScalar>(
    diag: &mut [T],
    off_diag: &mut [T],
    u: &mut impl MatrixMut<T>,
    v: &mut impl MatrixMut<T>,
    sweeps_per_value: usize,
) {
    let n = diag.len();
    if n < 2 {
        return;
    }

    let anorm = diag
        .iter()
        .chain(off_diag.iter())
        .fold(T::zero(), |acc, x| acc.max(x.abs()));
    let zero_tol = T::epsilon() * anorm;

    let mut bands: Vec<(usize, usize)> = vec![(0, n - 1)];
    while let Some((lo, mut hi)) = bands.pop() {
        let budget = sweeps_per_value * (hi - lo + 1);
        let mut sweeps = 0;

        loop {
            while hi > lo && negligible(off_diag[hi - 1], diag[hi - 1], diag[hi]) {
                off_diag[hi - 1] = T::zero();
                hi -= 1;
            }
            if hi == lo {
                break;
            }

            if let Some(i) = (lo..hi - 1)
                .rev()
                .find(|&i| negligible(off_diag[i], diag[i], diag[i + 1]))
            {
                off_diag[i] = T::zero();
                tracing::trace!(lo, hi, split = i, "SVD band split");
                bands.push((lo, i));
                bands.push((i + 1, hi));
                break;
            }

            if hi - lo == 1 {
                solve_2x2_block(diag, off_diag, lo, u, v);
                break;
            }

            if sweeps == budget {
                tracing::debug!(
                    lo,
                    hi,
                    residual = ?off_diag[hi - 1],
                    "SVD band did not converge, keeping current values"
                );
                break;
            }
            sweeps += 1;

            if let Some(k) = (lo..=hi).find(|&k| diag[k].abs() <= zero_tol) {
                tracing::trace!(index = k, "SVD zero-diagonal chase");
                diag[k] = T::zero();
                if k < hi {
                    chase_row(diag, off_diag, k, hi, u);
                } else {
                    chase_column(diag, off_diag, lo, hi, v);
                }
                continue;
            }

            shifted_sweep(diag, off_diag, lo, hi, u, v);
        }
    }
}

/// `diag[k] == 0` with `k < hi`: left rotations against rows `k+1..=hi`
/// push `off_diag[k]` off the end of the band, leaving row `k` zero.
fn chase_row<T: FloatScalar>(
    diag: &mut [T],
    off_diag: &mut [T],
    k: usize,
    hi: usize,
    u: &mut impl MatrixMut<T>,
) {
    let mut z = off_diag[k];
    off_diag[k] = T::zero();
    for j in (k + 1)..=hi {
        let (rot, r) = compute_rot(diag[j], z);
        diag[j] = r;
        if j < hi {
            z = -rot.sin * off_diag[j];
            off_diag[j] = rot.cos * off_diag[j];
        }
        rot.rotate_columns(u, j, k);
    }
}

/// `diag[hi] == 0`: right rotations against columns `hi-1..=lo` push
/// `off_diag[hi - 1]` off the top of the band, leaving column `hi` zero.
fn chase_column<T: FloatScalar>(
    diag: &mut [T],
    off_diag: &mut [T],
    lo: usize,
    hi: usize,
    v: &mut impl MatrixMut<T>,
) {
    let mut z = off_diag[hi - 1];
    off_diag[hi - 1] = T::zero();
    for j in (lo..hi).rev() {
        let (rot, r) = compute_rot(diag[j], z);
        diag[j] = r;
        if j > lo {
            z = -rot.sin * off_diag[j - 1];
            off_diag[j - 1] = rot.cos * off_diag[j - 1];
        }
        rot.rotate_columns(v, j, hi);
    }
}

fn negate_column<T: FloatScalar>(m: &mut impl MatrixMut<T>, col: usize) {
    for row in 0..m.nrows() {
        let val = *m.get(row, col);
        *m.get_mut(row, col) = -val;
    }
}

fn swap_columns<T: FloatScalar>(m: &mut impl MatrixMut<T>, a: usize, b: usize) {
    for row in 0..m.nrows() {
        let tmp = *m.get(row, a);
        *m.get_mut(row, a) = *m.get(row, b);
        *m.get_mut(row, b) = tmp;
    }
}

/// Make singular values non-negative (sign absorbed into `U`) and sort them
/// descending, permuting `U` and `V` columns alongside.
fn normalize<T: FloatScalar>(
    diag: &mut [T],
    u: &mut impl MatrixMut<T>,
    v: &mut impl MatrixMut<T>,
) {
    let n = diag.len();
    for i in 0..n {
        if diag[i] < T::zero() {
            diag[i] = -diag[i];
            negate_column(u, i);
        }
    }

    for i in 0..n {
        let mut max_idx = i;
        for j in (i + 1)..n {
            if diag[j] > diag[max_idx] {
                max_idx = j;
            }
        }
        if max_idx != i {
            diag.swap(i, max_idx);
            swap_columns(u, i, max_idx);
            swap_columns(v, i, max_idx);
        }
    }
}

/// Factor an M×N matrix with M ≥ N; `work` is consumed.
fn factorize_tall<T: FloatScalar>(mut work: GMatrix<T>) -> (GMatrix<T>, Vec<T>, GMatrix<T>) {
    let m = work.nrows();
    let n = work.ncols();
    let mut u = GMatrix::identity(m);
    let mut v = GMatrix::identity(n);
    let mut diag = vec![T::zero(); n];
    let mut off_diag = vec![T::zero(); n - 1];

    if m == 2 && n == 2 {
        // One left rotation makes a 2×2 upper triangular.
        let (rot, r) = compute_rot(work[(0, 0)], work[(1, 0)]);
        diag[0] = r;
        off_diag[0] = rot.cos * work[(0, 1)] + rot.sin * work[(1, 1)];
        diag[1] = rot.cos * work[(1, 1)] - rot.sin * work[(0, 1)];
        u[(0, 0)] = rot.cos;
        u[(1, 0)] = rot.sin;
        u[(0, 1)] = -rot.sin;
        u[(1, 1)] = rot.cos;
    } else {
        bidiagonalize(&mut work, &mut diag, &mut off_diag, &mut u, &mut v);
    }

    diagonalize(&mut diag, &mut off_diag, &mut u, &mut v);
    normalize(&mut diag, &mut u, &mut v);
    (u, diag, v)
}

/// `(U, w, V)` for any non-empty matrix. Wide inputs factor the transpose.
fn factorize<T: FloatScalar>(a: &impl MatrixRef<T>) -> (GMatrix<T>, Vec<T>, GMatrix<T>) {
    let m = a.nrows();
    let n = a.ncols();
    if m < n {
        let at = GMatrix::from_fn(n, m, |i, j| *a.get(j, i));
        let (u, w, v) = factorize_tall(at);
        (v, w, u)
    } else {
        factorize_tall(GMatrix::from_matrix_ref(a))
    }
}

fn check_non_empty(m: usize, n: usize) -> Result<(), LinalgError> {
    LinalgError::check_size((m.max(1), n.max(1)), (m, n))
}

/// Singular value decomposition `A = U · W · Vᵀ` into caller-provided outputs.
///
/// `u` must be `m×m`, `w` `m×n` and `v` `n×n`; both dimensions of `a` must be
/// at least 1. Every size is checked before any output is written. On
/// success `w` holds the singular values, non-negative and descending, on
/// its diagonal and zeros elsewhere.
///
/// The returned count is the number of singular values produced,
/// `min(m, n)`; it is not thresholded. Use
/// [`SvdDecomposition::numerical_rank`] for a tolerance-based rank.
///
/// Iteration is best-effort: a band that exhausts its sweep budget keeps its
/// current values and no error is raised.
///
/// ```
/// use vecmath::GMatrix;
/// use vecmath::linalg::svd;
///
/// let a = GMatrix::from_rows(2, 3, &[3.0_f64, 0.0, 0.0, 0.0, -4.0, 0.0]);
/// let mut u = GMatrix::zeros(2, 2);
/// let mut w = GMatrix::zeros(2, 3);
/// let mut v = GMatrix::zeros(3, 3);
/// let count = svd(&a, &mut u, &mut w, &mut v).unwrap();
/// assert_eq!(count, 2);
/// assert!((w[(0, 0)] - 4.0).abs() < 1e-14);
/// assert!((w[(1, 1)] - 3.0).abs() < 1e-14);
/// ```
pub fn svd<T: FloatScalar>(
    a: &impl MatrixRef<T>,
    u: &mut impl MatrixMut<T>,
    w: &mut impl MatrixMut<T>,
    v: &mut impl MatrixMut<T>,
) -> Result<usize, LinalgError> {
    let m = a.nrows();
    let n = a.ncols();
    check_non_empty(m, n)?;
    LinalgError::check_size((m, m), (u.nrows(), u.ncols()))?;
    LinalgError::check_size((m, n), (w.nrows(), w.ncols()))?;
    LinalgError::check_size((n, n), (v.nrows(), v.ncols()))?;

    let (uf, sv, vf) = factorize(a);
    for i in 0..m {
        for j in 0..m {
            *u.get_mut(i, j) = uf[(i, j)];
        }
        for j in 0..n {
            *w.get_mut(i, j) = if i == j { sv[i] } else { T::zero() };
        }
    }
    for i in 0..n {
        for j in 0..n {
            *v.get_mut(i, j) = vf[(i, j)];
        }
    }
    Ok(sv.len())
}

/// Singular value decomposition of a dynamically-sized matrix.
///
/// `A = U · W · Vᵀ` with `U` m×m, `V` n×n and the singular values stored
/// once, non-negative and descending.
///
/// # Example
///
/// ```
/// use vecmath::GMatrix;
///
/// let a = GMatrix::from_rows(3, 2, &[1.0_f64, 0.0, 0.0, 1.0, 1.0, 1.0]);
/// let svd = a.svd().unwrap();
/// assert_eq!(svd.rank(), 2);
/// assert!((svd.w()[0] - 3.0_f64.sqrt()).abs() < 1e-12);
/// assert!((svd.w()[1] - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct SvdDecomposition<T> {
    u: GMatrix<T>,
    w: Vec<T>,
    v: GMatrix<T>,
}

impl<T: FloatScalar> SvdDecomposition<T> {
    /// Decompose `a`. Fails with `MismatchedSize` if either dimension is zero.
    pub fn new(a: &impl MatrixRef<T>) -> Result<Self, LinalgError> {
        check_non_empty(a.nrows(), a.ncols())?;
        let (u, w, v) = factorize(a);
        Ok(Self { u, w, v })
    }

    /// Left singular vectors (m×m).
    #[inline]
    pub fn u(&self) -> &GMatrix<T> {
        &self.u
    }

    /// Singular values, non-negative and descending.
    #[inline]
    pub fn w(&self) -> &[T] {
        &self.w
    }

    /// Right singular vectors (n×n).
    #[inline]
    pub fn v(&self) -> &GMatrix<T> {
        &self.v
    }

    /// The m×n matrix `W` with the singular values on its diagonal.
    pub fn singular_matrix(&self) -> GMatrix<T> {
        let mut w = GMatrix::zeros(self.u.nrows(), self.v.nrows());
        for (i, &s) in self.w.iter().enumerate() {
            w[(i, i)] = s;
        }
        w
    }

    /// Number of singular values produced, `min(m, n)`.
    #[inline]
    pub fn rank(&self) -> usize {
        self.w.len()
    }

    /// Number of singular values strictly greater than `tol`.
    pub fn numerical_rank(&self, tol: T) -> usize {
        self.w.iter().filter(|&&s| s > tol).count()
    }

    /// Ratio of the largest to the smallest singular value (infinite when
    /// the smallest is zero).
    pub fn condition_number(&self) -> T {
        let n = self.w.len();
        if self.w[n - 1] == T::zero() {
            T::infinity()
        } else {
            self.w[0] / self.w[n - 1]
        }
    }

    /// Solve `A X = B` through the factors, skipping zero singular values.
    pub fn solve(&self, b: &impl MatrixRef<T>) -> Result<GMatrix<T>, LinalgError> {
        svd_back_substitute(&self.u, &self.w, &self.v, b)
    }
}
