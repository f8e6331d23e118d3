#![doc = include_str!("../README.md")]

#[doc(inline)]
pub use lensfix_image as image;

#[doc(inline)]
pub use lensfix_imgproc as imgproc;

#[doc(inline)]
pub use lensfix_io as io;
