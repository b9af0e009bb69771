//! Filter operations
//!
//! This module provides the gaussian convolution engine: kernel generation, the
//! per-range convolution worker and the threaded orchestration on top of them.

/// Filter kernels
pub mod kernels;

/// Errors raised while validating filter inputs.
mod error;
pub use error::FilterError;

/// Range convolution worker
mod convolution;
pub use convolution::*;

/// Filter operations
mod ops;
pub use ops::*;
