pub(crate) mod inverse;
pub(crate) mod lu;
pub(crate) mod rotation;
#[cfg(feature = "alloc")]
pub(crate) mod svd;
pub(crate) mod svd3;

#[cfg(feature = "alloc")]
pub use inverse::{invert, solve, svd_back_substitute};
pub use inverse::{invert_array, solve_array};
#[cfg(feature = "alloc")]
pub use lu::{lu_decompose, LuDecomposition};
pub use lu::{lu_back_substitute, lu_back_substitute_array, lu_decompose_array};
pub use rotation::{compute_2x2, compute_rot, compute_shift, Rotation, TwoByTwo};
#[cfg(feature = "alloc")]
pub use svd::{svd, SvdDecomposition};
pub use svd3::factor_scale_rotation;

/// Errors from matrix operations and decompositions.
///
/// Every check that can fail happens before the operation writes to any of
/// its outputs, so an `Err` always leaves the caller's data untouched.
///
/// ```
/// use vecmath::GMatrix;
/// use vecmath::linalg::LinalgError;
///
/// let singular = GMatrix::from_rows(2, 2, &[1.0_f64, 2.0, 2.0, 4.0]);
/// assert_eq!(singular.invert().unwrap_err(), LinalgError::SingularMatrix);
///
/// let a = GMatrix::<f64>::zeros(2, 3);
/// let b = GMatrix::<f64>::zeros(3, 3);
/// assert!(matches!(a.try_add(&b), Err(LinalgError::MismatchedSize { .. })));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinalgError {
    /// Operand or output dimensions violate the operation's contract.
    MismatchedSize {
        /// Required `(rows, cols)`.
        expected: (usize, usize),
        /// Supplied `(rows, cols)`.
        got: (usize, usize),
    },
    /// A zero pivot (or an all-zero row) was met during LU decomposition.
    SingularMatrix,
}

impl LinalgError {
    #[inline]
    pub(crate) fn check_size(
        expected: (usize, usize),
        got: (usize, usize),
    ) -> Result<(), LinalgError> {
        if expected == got {
            Ok(())
        } else {
            Err(LinalgError::MismatchedSize { expected, got })
        }
    }
}

impl core::fmt::Display for LinalgError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LinalgError::MismatchedSize { expected, got } => write!(
                f,
                "mismatched size: expected {}x{}, got {}x{}",
                expected.0, expected.1, got.0, got.1
            ),
            LinalgError::SingularMatrix => write!(f, "matrix is singular"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LinalgError {}
