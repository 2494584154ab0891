//! Plane-rotation primitives shared by the SVD engines.
//!
//! - [`compute_rot`]: a Givens rotation zeroing the second component of
//!   `(f, g)`, with power-of-two rescaling so `hypot` never over/underflows.
//! - [`compute_shift`]: both singular values of a 2×2 upper triangular
//!   matrix, used as the Wilkinson-style shift.
//! - [`compute_2x2`]: the full closed-form SVD of a 2×2 upper triangular
//!   matrix, rotations included.
//!
//! The bidiagonal sweep kernels at the bottom are built from these and are
//! driven by both the general engine and the fixed 3×3 path.

use crate::traits::{FloatScalar, MatrixMut};

/// A plane rotation `[[cos, sin], [-sin, cos]]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation<T> {
    pub cos: T,
    pub sin: T,
}

impl<T: FloatScalar> Rotation<T> {
    /// The identity rotation.
    #[inline]
    pub fn identity() -> Self {
        Self {
            cos: T::one(),
            sin: T::zero(),
        }
    }

    /// Rotate columns `i` and `j` of `m`:
    /// `col_i ← c·col_i + s·col_j`, `col_j ← c·col_j − s·col_i`.
    ///
    /// This is how a rotation applied to the working bidiagonal is folded
    /// into the `U`/`V` accumulators.
    #[inline]
    pub fn rotate_columns(&self, m: &mut impl MatrixMut<T>, i: usize, j: usize) {
        for row in 0..m.nrows() {
            let a = *m.get(row, i);
            let b = *m.get(row, j);
            *m.get_mut(row, i) = self.cos * a + self.sin * b;
            *m.get_mut(row, j) = self.cos * b - self.sin * a;
        }
    }
}

/// Closed-form SVD of a 2×2 upper triangular matrix `[[f, g], [0, h]]`.
///
/// ```text
/// [ cl  sl ] [ f  g ] [ cr -sr ]   [ ssmax   0   ]
/// [-sl  cl ] [ 0  h ] [ sr  cr ] = [   0   ssmin ]
/// ```
///
/// `|ssmax| >= |ssmin|`; either may be negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoByTwo<T> {
    pub ssmax: T,
    pub ssmin: T,
    pub left: Rotation<T>,
    pub right: Rotation<T>,
}

/// Power-of-two thresholds `(safmn2, safmx2)` outside of which
/// [`compute_rot`] rescales its inputs before taking `hypot`.
///
/// `safmn2 = 2^trunc(log2(safe_min / (eps / 2)) / 2)`; for `f64` this is
/// `2^-484 ≈ 2.002e-146` and `safmx2 = 2^484 ≈ 4.995e145`.
#[inline]
fn rot_scaling<T: FloatScalar>() -> (T, T) {
    let two = T::lit(2.0);
    let half_eps = T::epsilon() / two;
    let exp = ((T::min_positive_value().log2() - half_eps.log2()) / two).trunc();
    let safmn2 = two.powi(exp.to_i32().unwrap_or(0));
    (safmn2, T::one() / safmn2)
}

/// Givens rotation `(c, s)` and `r` such that
///
/// ```text
/// [ c  s ] [ f ]   [ r ]
/// [-s  c ] [ g ] = [ 0 ]
/// ```
///
/// Exact zeros are handled directly. Otherwise both inputs are rescaled by
/// powers of two into a safe range before `hypot`, and the rescale is undone
/// on `r`. When `|f| > |g|` the signs are normalised so that `c >= 0`.
///
/// ```
/// use vecmath::linalg::compute_rot;
///
/// let (rot, r) = compute_rot(3.0_f64, 4.0);
/// assert!((r - 5.0).abs() < 1e-15);
/// assert!((rot.cos - 0.6).abs() < 1e-15);
/// assert!((-rot.sin * 3.0 + rot.cos * 4.0).abs() < 1e-15);
/// ```
pub fn compute_rot<T: FloatScalar>(f: T, g: T) -> (Rotation<T>, T) {
    if g == T::zero() {
        return (Rotation::identity(), f);
    }
    if f == T::zero() {
        return (
            Rotation {
                cos: T::zero(),
                sin: T::one(),
            },
            g,
        );
    }

    let (safmn2, safmx2) = rot_scaling::<T>();
    let mut f1 = f;
    let mut g1 = g;
    let mut scale = f1.abs().max(g1.abs());

    let (mut cos, mut sin, mut r);
    if scale >= safmx2 {
        let mut count = 0usize;
        while scale >= safmx2 && count < 20 {
            f1 = f1 * safmn2;
            g1 = g1 * safmn2;
            scale = f1.abs().max(g1.abs());
            count += 1;
        }
        r = f1.hypot(g1);
        cos = f1 / r;
        sin = g1 / r;
        for _ in 0..count {
            r = r * safmx2;
        }
    } else if scale <= safmn2 {
        let mut count = 0usize;
        while scale <= safmn2 && count < 20 {
            f1 = f1 * safmx2;
            g1 = g1 * safmx2;
            scale = f1.abs().max(g1.abs());
            count += 1;
        }
        r = f1.hypot(g1);
        cos = f1 / r;
        sin = g1 / r;
        for _ in 0..count {
            r = r * safmn2;
        }
    } else {
        r = f1.hypot(g1);
        cos = f1 / r;
        sin = g1 / r;
    }

    if f.abs() > g.abs() && cos < T::zero() {
        cos = -cos;
        sin = -sin;
        r = -r;
    }

    (Rotation { cos, sin }, r)
}

/// Singular values `(ssmin, ssmax)` of `[[f, g], [0, h]]`.
///
/// Works on ratios of the largest and smallest magnitudes so that no
/// intermediate overflows; the large magnitude is never divided by a tiny
/// one directly.
pub fn compute_shift<T: FloatScalar>(f: T, g: T, h: T) -> (T, T) {
    let one = T::one();
    let two = T::lit(2.0);
    let fa = f.abs();
    let ga = g.abs();
    let ha = h.abs();
    let fhmn = fa.min(ha);
    let fhmx = fa.max(ha);

    if fhmn == T::zero() {
        let ssmax = if fhmx == T::zero() {
            ga
        } else {
            let big = fhmx.max(ga);
            let small = fhmx.min(ga);
            big * (one + (small / big) * (small / big)).sqrt()
        };
        return (T::zero(), ssmax);
    }

    if ga < fhmx {
        let as_ = one + fhmn / fhmx;
        let at = (fhmx - fhmn) / fhmx;
        let au = (ga / fhmx) * (ga / fhmx);
        let c = two / ((as_ * as_ + au).sqrt() + (at * at + au).sqrt());
        (fhmn * c, fhmx / c)
    } else {
        let au = fhmx / ga;
        if au == T::zero() {
            // fhmx/ga underflowed: ssmin is fhmn*fhmx/ga to working precision
            ((fhmn * fhmx) / ga, ga)
        } else {
            let as_ = one + fhmn / fhmx;
            let at = (fhmx - fhmn) / fhmx;
            let c = one / ((one + (as_ * au) * (as_ * au)).sqrt()
                + (one + (at * au) * (at * au)).sqrt());
            let ssmin = (fhmn * c) * au;
            (ssmin + ssmin, ga / (c + c))
        }
    }
}

/// Closed-form SVD of the 2×2 upper triangular matrix `[[f, g], [0, h]]`.
///
/// `f` and `h` are swapped when `|h| > |f|` so the larger diagonal entry is
/// always treated first; the swap is undone when assigning the rotations.
/// If `g` dominates `f` to working precision a direct formula is used;
/// otherwise the larger singular value is recovered from a quadratic-form
/// solve and both rotations follow algebraically. Finally the signs of both
/// singular values are fixed from the rotation signs and the signs of the
/// inputs, so that the identity in [`TwoByTwo`] holds exactly.
///
/// ```
/// use vecmath::linalg::compute_2x2;
///
/// let s = compute_2x2(3.0_f64, 0.0, -5.0);
/// assert!((s.ssmax.abs() - 5.0).abs() < 1e-15);
/// assert!((s.ssmin.abs() - 3.0).abs() < 1e-15);
/// ```
pub fn compute_2x2<T: FloatScalar>(f: T, g: T, h: T) -> TwoByTwo<T> {
    let one = T::one();
    let two = T::lit(2.0);
    let four = T::lit(4.0);
    let half = T::lit(0.5);

    let mut ft = f;
    let mut fa = ft.abs();
    let mut ht = h;
    let mut ha = h.abs();

    // Which of f, g, h has the largest magnitude: 1, 2 or 3.
    let mut pmax = 1;
    let swap = ha > fa;
    if swap {
        pmax = 3;
        core::mem::swap(&mut ft, &mut ht);
        core::mem::swap(&mut fa, &mut ha);
    }

    let gt = g;
    let ga = gt.abs();

    let (mut ssmin, mut ssmax, clt, slt, crt, srt);
    if ga == T::zero() {
        ssmin = ha;
        ssmax = fa;
        clt = one;
        crt = one;
        slt = T::zero();
        srt = T::zero();
    } else {
        let mut g_small = true;
        let mut direct = (T::zero(), T::zero(), T::zero(), T::zero(), T::zero(), T::zero());
        if ga > fa {
            pmax = 2;
            if fa / ga < T::epsilon() {
                g_small = false;
                let smax = ga;
                let smin = if ha > one {
                    fa / (ga / ha)
                } else {
                    (fa / ga) * ha
                };
                direct = (smin, smax, one, ht / gt, ft / gt, one);
            }
        }

        if g_small {
            let d = fa - ha;
            let mut l = if d == fa { one } else { d / fa };
            let m = gt / ft;
            let mut t = two - l;
            let mm = m * m;
            let tt = t * t;
            let s = (tt + mm).sqrt();
            let r = if l == T::zero() {
                m.abs()
            } else {
                (l * l + mm).sqrt()
            };
            let a = half * (s + r);
            ssmin = ha / a;
            ssmax = fa * a;

            if mm == T::zero() {
                t = if l == T::zero() {
                    two.with_sign_of(ft) * one.with_sign_of(gt)
                } else {
                    gt / d.with_sign_of(ft) + m / t
                };
            } else {
                t = (m / (s + t) + m / (r + l)) * (one + a);
            }
            l = (t * t + four).sqrt();
            let c_r = two / l;
            let s_r = t / l;
            clt = (c_r + s_r * m) / a;
            slt = (ht / ft) * s_r / a;
            crt = c_r;
            srt = s_r;
        } else {
            ssmin = direct.0;
            ssmax = direct.1;
            clt = direct.2;
            slt = direct.3;
            crt = direct.4;
            srt = direct.5;
        }
    }

    let (left, right) = if swap {
        (
            Rotation { cos: srt, sin: crt },
            Rotation { cos: slt, sin: clt },
        )
    } else {
        (
            Rotation { cos: clt, sin: slt },
            Rotation { cos: crt, sin: srt },
        )
    };

    let tsign = match pmax {
        1 => one.with_sign_of(right.cos) * one.with_sign_of(left.cos) * one.with_sign_of(f),
        2 => one.with_sign_of(right.sin) * one.with_sign_of(left.cos) * one.with_sign_of(g),
        _ => one.with_sign_of(right.sin) * one.with_sign_of(left.sin) * one.with_sign_of(h),
    };
    ssmax = ssmax.with_sign_of(tsign);
    ssmin = ssmin.with_sign_of(tsign * one.with_sign_of(f) * one.with_sign_of(h));

    TwoByTwo {
        ssmax,
        ssmin,
        left,
        right,
    }
}

/// Tolerance below which a superdiagonal entry counts as zero: `22·ε`, i.e.
/// `≈ 4.89e-15` for `f64`.
///
/// Applied relative to the two diagonal entries the superdiagonal couples,
/// not as a fixed absolute threshold. An absolute `4.89e-15` would deflate
/// every entry of a matrix scaled by `1e-20` on the first check and never
/// deflate one scaled by `1e20`; the relative form behaves the same at any
/// magnitude and carries over to `f32` through `ε`.
#[inline]
pub(crate) fn convergence_tol<T: FloatScalar>() -> T {
    T::epsilon() * T::lit(22.0)
}

/// Whether the superdiagonal entry `e` coupling `d0` and `d1` can be dropped.
#[inline]
pub(crate) fn negligible<T: FloatScalar>(e: T, d0: T, d1: T) -> bool {
    let e = e.abs();
    e <= convergence_tol::<T>() * (d0.abs() + d1.abs()) || e < T::min_positive_value()
}

/// Diagonalize the 2×2 block at `(i, i + 1)` of the bidiagonal `(d, e)` in
/// closed form and fold both rotations into the accumulators.
pub(crate) fn solve_2x2_block<T: FloatScalar>(
    d: &mut [T],
    e: &mut [T],
    i: usize,
    u: &mut impl MatrixMut<T>,
    v: &mut impl MatrixMut<T>,
) {
    let s = compute_2x2(d[i], e[i], d[i + 1]);
    d[i] = s.ssmax;
    d[i + 1] = s.ssmin;
    e[i] = T::zero();
    s.left.rotate_columns(u, i, i + 1);
    s.right.rotate_columns(v, i, i + 1);
}

/// One implicit-shift QR sweep over the unreduced band `lo..=hi` (`hi > lo`).
///
/// The shift is the smaller singular value of the trailing 2×2 block. It is
/// dropped (zero-shift sweep) when it is negligible against `|d[lo]|`. Right
/// rotations go into `v`, left rotations into `u`.
pub(crate) fn shifted_sweep<T: FloatScalar>(
    d: &mut [T],
    e: &mut [T],
    lo: usize,
    hi: usize,
    u: &mut impl MatrixMut<T>,
    v: &mut impl MatrixMut<T>,
) {
    let (mut shift, _) = compute_shift(d[hi - 1], e[hi - 1], d[hi]);
    let sll = d[lo].abs();
    if sll == T::zero() || (shift / sll) * (shift / sll) < T::epsilon() {
        shift = T::zero();
    }

    let mut f = if shift == T::zero() {
        d[lo]
    } else {
        (sll - shift) * (T::one().with_sign_of(d[lo]) + shift / d[lo])
    };
    let mut g = e[lo];

    for i in lo..hi {
        let (right, r) = compute_rot(f, g);
        if i > lo {
            e[i - 1] = r;
        }
        f = right.cos * d[i] + right.sin * e[i];
        e[i] = right.cos * e[i] - right.sin * d[i];
        g = right.sin * d[i + 1];
        d[i + 1] = right.cos * d[i + 1];

        let (left, r) = compute_rot(f, g);
        d[i] = r;
        f = left.cos * e[i] + left.sin * d[i + 1];
        d[i + 1] = left.cos * d[i + 1] - left.sin * e[i];
        if i + 1 < hi {
            g = left.sin * e[i + 1];
            e[i + 1] = left.cos * e[i + 1];
        }

        right.rotate_columns(v, i, i + 1);
        left.rotate_columns(u, i, i + 1);
    }
    e[hi - 1] = f;
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

    /// Check `L · [[f, g], [0, h]] · R = diag(ssmax, ssmin)`.
    fn check_2x2(f: f64, g: f64, h: f64) {
        let s = compute_2x2(f, g, h);
        let (cl, sl) = (s.left.cos, s.left.sin);
        let (cr, sr) = (s.right.cos, s.right.sin);
        assert_near(cl * cl + sl * sl, 1.0, 1e-14, "left unit");
        assert_near(cr * cr + sr * sr, 1.0, 1e-14, "right unit");

        // L·B
        let lb = [[cl * f, cl * g + sl * h], [-sl * f, -sl * g + cl * h]];
        // (L·B)·R with R = [[cr, -sr], [sr, cr]]
        let out = [
            [lb[0][0] * cr + lb[0][1] * sr, -lb[0][0] * sr + lb[0][1] * cr],
            [lb[1][0] * cr + lb[1][1] * sr, -lb[1][0] * sr + lb[1][1] * cr],
        ];
        let scale = f.abs().max(g.abs()).max(h.abs()).max(1.0);
        let tol = 1e-13 * scale;
        assert_near(out[0][0], s.ssmax, tol, "ssmax");
        assert_near(out[1][1], s.ssmin, tol, "ssmin");
        assert_near(out[0][1], 0.0, tol, "off 01");
        assert_near(out[1][0], 0.0, tol, "off 10");
        assert!(s.ssmax.abs() >= s.ssmin.abs());
    }

    #[test]
    fn rot_zero_cases() {
        let (rot, r) = compute_rot(2.0_f64, 0.0);
        assert_eq!(rot, Rotation::identity());
        assert_eq!(r, 2.0);

        let (rot, r) = compute_rot(0.0_f64, -3.0);
        assert_eq!(rot.cos, 0.0);
        assert_eq!(rot.sin, 1.0);
        assert_eq!(r, -3.0);
    }

    #[test]
    fn rot_sign_normalised() {
        let (rot, r) = compute_rot(-4.0_f64, 3.0);
        assert!(rot.cos > 0.0);
        assert_near(r, -5.0, 1e-15, "r");
        assert_near(rot.cos * -4.0 + rot.sin * 3.0, r, 1e-15, "c f + s g");
        assert_near(-rot.sin * -4.0 + rot.cos * 3.0, 0.0, 1e-15, "-s f + c g");
    }

    #[test]
    fn rot_huge_and_tiny_inputs() {
        for &(f, g) in &[(3e200_f64, 4e200), (3e-200, 4e-200), (1e300, 1e-300), (-1e-300, 2e-300)] {
            let (rot, r) = compute_rot(f, g);
            assert!(r.is_finite() && r != 0.0, "r = {} for ({}, {})", r, f, g);
            assert_near(rot.cos * rot.cos + rot.sin * rot.sin, 1.0, 1e-14, "unit");
            assert_near((rot.cos * f + rot.sin * g) / r, 1.0, 1e-14, "r");
        }
    }

    #[test]
    fn scaling_thresholds_f64() {
        let (safmn2, safmx2) = rot_scaling::<f64>();
        assert_near(safmn2 / 2.002083095183101e-146, 1.0, 1e-12, "safmn2");
        assert_near(safmx2 / 4.994797680505588e145, 1.0, 1e-12, "safmx2");
    }

    #[test]
    fn shift_golden_ratio() {
        // [[1, 1], [0, 1]] has singular values (sqrt(5) ± 1) / 2
        let (ssmin, ssmax) = compute_shift(1.0_f64, 1.0, 1.0);
        let root5 = 5.0_f64.sqrt();
        assert_near(ssmin, (root5 - 1.0) / 2.0, 1e-15, "ssmin");
        assert_near(ssmax, (root5 + 1.0) / 2.0, 1e-15, "ssmax");
    }

    #[test]
    fn shift_degenerate() {
        assert_eq!(compute_shift(0.0_f64, 0.0, 0.0), (0.0, 0.0));
        let (ssmin, ssmax) = compute_shift(0.0_f64, 3.0, 4.0);
        assert_eq!(ssmin, 0.0);
        assert_near(ssmax, 5.0, 1e-15, "ssmax");
        // g dominates both diagonal entries
        let (ssmin, ssmax) = compute_shift(1e-3_f64, 1e3, 2e-3);
        assert_near(ssmin * ssmax, 2e-6, 1e-18, "product = |det|");
    }

    #[test]
    fn closed_form_general() {
        check_2x2(3.0, 2.0, 1.0);
        check_2x2(1.0, 2.0, 3.0);
        check_2x2(-3.0, 2.0, 1.0);
        check_2x2(3.0, -2.0, -1.0);
        check_2x2(1.0, 1.0, 1.0);
        check_2x2(2.0, 0.0, -5.0);
        check_2x2(0.0, 1.0, 2.0);
        check_2x2(4.0, 0.5, 0.0);
    }

    #[test]
    fn closed_form_g_dominates() {
        check_2x2(1e-20, 1.0, 1e-20);
        check_2x2(1e-18, -3.0, 2.0);
    }

    #[test]
    fn closed_form_identity_rotations_for_diagonal() {
        let s = compute_2x2(1.0_f64, 0.0, 1.0);
        assert_eq!(s.left, Rotation::identity());
        assert_eq!(s.right, Rotation::identity());
        assert_eq!((s.ssmax, s.ssmin), (1.0, 1.0));
    }

    #[test]
    fn rotate_columns_is_orthogonal() {
        let mut m = [[1.0_f64, 2.0], [3.0, 4.0]];
        let (rot, _) = compute_rot(1.0_f64, 1.0);
        rot.rotate_columns(&mut m, 0, 1);
        let h = core::f64::consts::FRAC_1_SQRT_2;
        assert_near(m[0][0], 3.0 * h, 1e-15, "m00");
        assert_near(m[0][1], 1.0 * h, 1e-15, "m01");
        assert_near(m[1][0], 7.0 * h, 1e-15, "m10");
        assert_near(m[1][1], 1.0 * h, 1e-15, "m11");
    }

    /// Rebuild `U · bidiag(d, e) · Vᵀ` for 3×3 accumulators.
    fn rebuild3(u: &[[f64; 3]; 3], d: &[f64; 3], e: &[f64; 2], v: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
        let mut b = [[0.0; 3]; 3];
        for i in 0..3 {
            b[i][i] = d[i];
        }
        b[0][1] = e[0];
        b[1][2] = e[1];
        let mut out = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                let mut sum = 0.0;
                for k in 0..3 {
                    for l in 0..3 {
                        sum += u[i][k] * b[k][l] * v[j][l];
                    }
                }
                out[i][j] = sum;
            }
        }
        out
    }

    #[test]
    fn sweeps_preserve_product_and_converge() {
        let mut d = [4.0_f64, 3.0, 2.0];
        let mut e = [1.0_f64, 0.5];
        let mut u = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let mut v = u;
        let original = rebuild3(&u, &d, &e, &v);

        for _ in 0..8 {
            if negligible(e[1], d[1], d[2]) {
                break;
            }
            shifted_sweep(&mut d, &mut e, 0, 2, &mut u, &mut v);
        }
        assert!(negligible(e[1], d[1], d[2]), "trailing entry {} did not converge", e[1]);

        let rebuilt = rebuild3(&u, &d, &e, &v);
        for i in 0..3 {
            for j in 0..3 {
                assert_near(rebuilt[i][j], original[i][j], 1e-12, "U B Vt");
            }
        }
    }

    #[test]
    fn two_by_two_block_diagonalizes() {
        let mut d = [5.0_f64, 3.0, 1.0];
        let mut e = [0.0_f64, 2.0];
        let mut u = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let mut v = u;
        let original = rebuild3(&u, &d, &e, &v);

        solve_2x2_block(&mut d, &mut e, 1, &mut u, &mut v);
        assert_eq!(e, [0.0, 0.0]);
        assert_eq!(d[0], 5.0);
        let rebuilt = rebuild3(&u, &d, &e, &v);
        for i in 0..3 {
            for j in 0..3 {
                assert_near(rebuilt[i][j], original[i][j], 1e-13, "U B Vt");
            }
        }
    }

    #[test]
    fn negligible_is_relative() {
        assert!(negligible(1e-16_f64, 1.0, 1.0));
        assert!(!negligible(1e-16_f64, 1e-3, 1e-3));
        assert!(negligible(0.0_f64, 0.0, 0.0));
        assert!(!negligible(1e-30_f64, 0.0, 0.0));
    }
}
