#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for I/O operations.
///
/// Defines [`error::IoError`] variants for file access and encoding/decoding failures.
pub mod error;

/// High-level image reading functions.
///
/// See [`functional::read_image_png_any`] to read a PNG file of any 8-bit layout.
pub mod functional;

/// PNG image encoding and decoding.
///
/// Read and write PNG images with a fixed channel layout.
pub mod png;
