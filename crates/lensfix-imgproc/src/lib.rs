#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// camera model and lens distortion module.
pub mod calibration;

/// color transformations module.
pub mod color;

/// utilities for interpolation.
pub mod interpolation;

/// module containing parallization utilities.
pub mod parallel;

/// image undistortion module.
pub mod undistort;
