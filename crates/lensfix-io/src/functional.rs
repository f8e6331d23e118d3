use std::path::Path;

use lensfix_image::{Image, ImageSize};
use png::ColorType;

use crate::{error::IoError, png::read_png_impl};

/// A generic 8-bit image in any of the layouts a PNG file can decode to.
#[derive(Debug, Clone, PartialEq)]
pub enum GenericImage {
    /// 8-bit grayscale image
    L8(Image<u8, 1>),
    /// 8-bit grayscale image with alpha channel
    La8(Image<u8, 2>),
    /// 8-bit RGB image
    Rgb8(Image<u8, 3>),
    /// 8-bit RGB image with alpha channel
    Rgba8(Image<u8, 4>),
}

impl GenericImage {
    /// The size of the wrapped image.
    pub fn size(&self) -> ImageSize {
        match self {
            GenericImage::L8(img) => img.size(),
            GenericImage::La8(img) => img.size(),
            GenericImage::Rgb8(img) => img.size(),
            GenericImage::Rgba8(img) => img.size(),
        }
    }

    /// The number of channels of the wrapped image.
    pub fn num_channels(&self) -> usize {
        match self {
            GenericImage::L8(_) => 1,
            GenericImage::La8(_) => 2,
            GenericImage::Rgb8(_) => 3,
            GenericImage::Rgba8(_) => 4,
        }
    }
}

/// Reads a PNG image of any layout from the given file path.
///
/// Palette and low bit depth images are expanded and 16-bit images are
/// reduced to 8 bits per sample.
///
/// # Arguments
///
/// * `file_path` - The path to a valid PNG file.
///
/// # Returns
///
/// The decoded image, tagged with its channel layout.
pub fn read_image_png_any(file_path: impl AsRef<Path>) -> Result<GenericImage, IoError> {
    let (buf, size, color_type) = read_png_impl(file_path)?;

    let image = match color_type {
        ColorType::Grayscale => GenericImage::L8(Image::new(size, buf)?),
        ColorType::GrayscaleAlpha => GenericImage::La8(Image::new(size, buf)?),
        ColorType::Rgb => GenericImage::Rgb8(Image::new(size, buf)?),
        ColorType::Rgba => GenericImage::Rgba8(Image::new(size, buf)?),
        other => {
            return Err(IoError::PngDecodeError(format!(
                "unsupported color type after expansion: {other:?}"
            )))
        }
    };

    Ok(image)
}
