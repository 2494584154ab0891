//! Fixed 3×3 SVD used to split a matrix into per-axis scale and rotation.
//!
//! Stack-only: bidiagonalization is four Givens steps and the QR loop works
//! on a band with at most two superdiagonal entries.

use crate::linalg::rotation::{compute_rot, negligible, shifted_sweep, solve_2x2_block, Rotation};
use crate::traits::FloatScalar;

/// Sweep budget of the 3×3 QR loop.
const MAX_SWEEPS: usize = 10;

/// Absolute tolerance of the almost-equal test on singular values.
const EQUAL_ABS_TOL: f64 = 1e-6;
/// Relative tolerance of the almost-equal test on singular values.
const EQUAL_REL_TOL: f64 = 1e-4;

type Mat3<T> = [[T; 3]; 3];

fn identity3<T: FloatScalar>() -> Mat3<T> {
    let mut m = [[T::zero(); 3]; 3];
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = T::one();
    }
    m
}

/// Rotation zeroing `b` against `a`.
///
/// An exactly zero `b` needs no rotation; an `a` below the smallest normal
/// value gets the 90° swap `(0, 1)` directly.
fn eliminate<T: FloatScalar>(a: T, b: T) -> Option<Rotation<T>> {
    if b == T::zero() {
        None
    } else if a.abs() < T::min_positive_value() {
        Some(Rotation {
            cos: T::zero(),
            sin: T::one(),
        })
    } else {
        Some(compute_rot(a, b).0)
    }
}

/// `row_p ← c·row_p + s·row_q`, `row_q ← c·row_q − s·row_p`.
fn rotate_rows<T: FloatScalar>(m: &mut Mat3<T>, rot: &Rotation<T>, p: usize, q: usize) {
    for col in 0..3 {
        let a = m[p][col];
        let b = m[q][col];
        m[p][col] = rot.cos * a + rot.sin * b;
        m[q][col] = rot.cos * b - rot.sin * a;
    }
}

/// Left step: zero `b[q][col]` against `b[p][col]`.
fn left_step<T: FloatScalar>(b: &mut Mat3<T>, u: &mut Mat3<T>, p: usize, q: usize, col: usize) {
    if let Some(rot) = eliminate(b[p][col], b[q][col]) {
        rotate_rows(b, &rot, p, q);
        rot.rotate_columns(u, p, q);
    }
    b[q][col] = T::zero();
}

/// Right step: zero `b[row][q]` against `b[row][p]`.
fn right_step<T: FloatScalar>(b: &mut Mat3<T>, v: &mut Mat3<T>, p: usize, q: usize, row: usize) {
    if let Some(rot) = eliminate(b[row][p], b[row][q]) {
        rot.rotate_columns(b, p, q);
        rot.rotate_columns(v, p, q);
    }
    b[row][q] = T::zero();
}

/// Upper bidiagonal `(d, e)` with `M = U · B · Vᵀ`.
fn bidiagonal3<T: FloatScalar>(m: &Mat3<T>) -> (Mat3<T>, [T; 3], [T; 2], Mat3<T>) {
    let mut b = *m;
    let mut u = identity3::<T>();
    let mut v = identity3::<T>();

    left_step(&mut b, &mut u, 0, 1, 0);
    left_step(&mut b, &mut u, 0, 2, 0);
    right_step(&mut b, &mut v, 1, 2, 0);
    left_step(&mut b, &mut u, 1, 2, 1);

    (u, [b[0][0], b[1][1], b[2][2]], [b[0][1], b[1][2]], v)
}

/// QR sweeps on the 3×3 bidiagonal, at most `max_sweeps` of them. Out of
/// budget, `(d, e)` keep their current values.
fn diagonalize3<T: FloatScalar>(
    d: &mut [T; 3],
    e: &mut [T; 2],
    u: &mut Mat3<T>,
    v: &mut Mat3<T>,
    max_sweeps: usize,
) {
    for _ in 0..max_sweeps {
        let top = negligible(e[0], d[0], d[1]);
        let bottom = negligible(e[1], d[1], d[2]);
        if top && bottom {
            *e = [T::zero(); 2];
            return;
        }
        if top {
            e[0] = T::zero();
            solve_2x2_block(d, e, 1, u, v);
            return;
        }
        if bottom {
            e[1] = T::zero();
            solve_2x2_block(d, e, 0, u, v);
            return;
        }
        shifted_sweep(d, e, 0, 2, u, v);
    }
    tracing::debug!(residual = ?e, "3x3 SVD did not converge, keeping current values");
}

/// Signed singular values with `M = U · diag(s) · Vᵀ`.
pub(crate) fn svd3<T: FloatScalar>(m: &Mat3<T>) -> (Mat3<T>, [T; 3], Mat3<T>) {
    let (mut u, mut d, mut e, mut v) = bidiagonal3(m);
    diagonalize3(&mut d, &mut e, &mut u, &mut v, MAX_SWEEPS);
    (u, d, v)
}

fn almost_equal<T: FloatScalar>(a: T, b: T) -> bool {
    let diff = (a - b).abs();
    diff <= T::lit(EQUAL_ABS_TOL) || diff <= T::lit(EQUAL_REL_TOL) * a.abs().max(b.abs())
}

/// Indices `0..3` ordered by `key` descending; ties keep index order.
fn order_desc<T: FloatScalar>(key: [T; 3]) -> [usize; 3] {
    let mut idx = [0, 1, 2];
    for i in 1..3 {
        let mut j = i;
        while j > 0 && key[idx[j]] > key[idx[j - 1]] {
            idx.swap(j, j - 1);
            j -= 1;
        }
    }
    idx
}

/// Factor a 3×3 matrix into per-axis scale and a rotation.
///
/// The rotation is the orthogonal polar factor `U · diag(sign s) · Vᵀ`, the
/// same whichever side the scale was applied on: both `diag(s) · R` and
/// `R · diag(s)` give back `R`. Negative singular values fold their sign
/// into it, so every scale factor is non-negative.
///
/// Each scale factor is paired with the row of `M` whose norm has the same
/// rank, so `diag(s) · R` returns `s` in its original axis order. When the
/// singular values are all ≈1 or all mutually equal there is nothing to
/// pair and they are returned in decomposition order.
///
/// ```
/// use vecmath::linalg::factor_scale_rotation;
///
/// let (c, s) = (0.8_f64, 0.6_f64);
/// let m = [[2.0 * c, -2.0 * s, 0.0], [3.0 * s, 3.0 * c, 0.0], [0.0, 0.0, 5.0]];
/// let (scale, rot) = factor_scale_rotation(&m);
/// assert!((scale[0] - 2.0).abs() < 1e-12);
/// assert!((scale[1] - 3.0).abs() < 1e-12);
/// assert!((scale[2] - 5.0).abs() < 1e-12);
/// assert!((rot[0][1] + s).abs() < 1e-12);
/// ```
pub fn factor_scale_rotation<T: FloatScalar>(m: &[[T; 3]; 3]) -> ([T; 3], [[T; 3]; 3]) {
    let (u, s, v) = svd3(m);
    let one = T::one();
    let mag = [s[0].abs(), s[1].abs(), s[2].abs()];
    let sign = [
        one.with_sign_of(s[0]),
        one.with_sign_of(s[1]),
        one.with_sign_of(s[2]),
    ];

    let mut rot = [[T::zero(); 3]; 3];
    for (i, row) in rot.iter_mut().enumerate() {
        for (j, r) in row.iter_mut().enumerate() {
            let mut sum = T::zero();
            for k in 0..3 {
                sum = sum + u[i][k] * sign[k] * v[j][k];
            }
            *r = sum;
        }
    }

    let all_unit = mag.iter().all(|&x| almost_equal(x, one));
    let all_equal = almost_equal(mag[0], mag[1])
        && almost_equal(mag[1], mag[2])
        && almost_equal(mag[0], mag[2]);
    if all_unit || all_equal {
        return (mag, rot);
    }

    let row_norms = [
        m[0][0].hypot(m[0][1]).hypot(m[0][2]),
        m[1][0].hypot(m[1][1]).hypot(m[1][2]),
        m[2][0].hypot(m[2][1]).hypot(m[2][2]),
    ];
    let out_order = order_desc(mag);
    let in_order = order_desc(row_norms);

    let mut scale = [T::zero(); 3];
    for k in 0..3 {
        scale[in_order[k]] = mag[out_order[k]];
    }
    (scale, rot)
}
