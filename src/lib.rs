//! # vecmath
//!
//! Dense matrix storage with LU inversion/solving and singular value
//! decomposition kernels, no-std compatible.
//!
//! ## Quick start
//!
//! ```
//! use vecmath::GMatrix;
//!
//! // Solve a linear system Ax = b
//! let a = GMatrix::from_rows(3, 3, &[
//!     2.0_f64, 1.0, -1.0,
//!     -3.0, -1.0, 2.0,
//!     -2.0, 1.0, 2.0,
//! ]);
//! let b = GMatrix::from_rows(3, 1, &[8.0, -11.0, -3.0]);
//! let x = a.solve(&b).unwrap(); // x = [2, 3, -1]
//! assert!((x[(1, 0)] - 3.0).abs() < 1e-12);
//!
//! // Factor it
//! let svd = a.svd().unwrap();
//! assert_eq!(svd.rank(), 3);
//! ```
//!
//! ## Modules
//!
//! - [`gmatrix`]: Heap-allocated `GMatrix<T>` with runtime dimensions
//!   (requires `alloc` feature, included with `std`). `Vec<T>` row-major
//!   storage with fallible `try_*` arithmetic, resizing and sub-block copies.
//!   Implements [`MatrixRef`] / [`MatrixMut`], so all linalg free functions
//!   work automatically. [`GVector<T>`] for single-index vector access.
//!
//! - [`linalg`]: Crout LU with implicit row scaling (general and fixed-size
//!   array forms), inversion and solving built on it, the general m×n SVD
//!   engine, the plane-rotation primitives it is built from, and a fixed 3×3
//!   factorization into per-axis scale and rotation.
//!
//! - [`traits`]: Element trait hierarchy:
//!   - [`Scalar`]: all matrix elements (`Copy + PartialEq + Debug + Zero + One + Num`)
//!   - [`FloatScalar`]: real floats (`Scalar + Float`), used by every decomposition
//!   - [`MatrixRef`] / [`MatrixMut`]: generic read/write access for algorithms
//!
//! ## Diagnostics
//!
//! Kernels emit [`tracing`](https://docs.rs/tracing) events (`debug` for
//! singular pivots and unconverged SVD bands, `trace` for band splits). No
//! subscriber is installed by this crate.
//!
//! ## Cargo features
//!
//! | Feature   | Default  | Description |
//! |-----------|----------|-------------|
//! | `std`     | yes      | Implies `alloc`. Hardware FPU via system libm |
//! | `alloc`   | via std  | `GMatrix` / `GVector`, general LU and SVD |
//!
//! Without `alloc` the fixed-size kernels (`lu_decompose_array`,
//! `invert_array`, `solve_array`, `factor_scale_rotation`) remain available.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
pub mod gmatrix;
pub mod linalg;
pub mod traits;

#[cfg(feature = "alloc")]
pub use gmatrix::{GMatrix, GVector};
pub use traits::{FloatScalar, MatrixMut, MatrixRef, Scalar};
