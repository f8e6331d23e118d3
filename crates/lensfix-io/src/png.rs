use std::{fs, fs::File, io::BufWriter, path::Path};

use lensfix_image::{Image, ImageSize};
use png::{BitDepth, ColorType, Decoder, Encoder, Transformations};

use crate::error::IoError;

/// Read a PNG image with a single channel (mono8).
///
/// # Arguments
///
/// * `file_path` - The path to the PNG file.
///
/// # Returns
///
/// A grayscale image with a single channel (mono8).
///
/// # Errors
///
/// Fails with [`IoError::PngDecodeError`] when the file is not a grayscale PNG.
pub fn read_image_png_mono8(file_path: impl AsRef<Path>) -> Result<Image<u8, 1>, IoError> {
    let (buf, size, color_type) = read_png_impl(file_path)?;
    expect_color_type(color_type, ColorType::Grayscale)?;
    Ok(Image::new(size, buf)?)
}

/// Read a PNG image with a three channels (rgb8).
///
/// # Arguments
///
/// * `file_path` - The path to the PNG file.
///
/// # Returns
///
/// A RGB image with three channels (rgb8).
pub fn read_image_png_rgb8(file_path: impl AsRef<Path>) -> Result<Image<u8, 3>, IoError> {
    let (buf, size, color_type) = read_png_impl(file_path)?;
    expect_color_type(color_type, ColorType::Rgb)?;
    Ok(Image::new(size, buf)?)
}

/// Read a PNG image with a four channels (rgba8).
///
/// # Arguments
///
/// * `file_path` - The path to the PNG file.
///
/// # Returns
///
/// A RGBA image with four channels (rgba8).
pub fn read_image_png_rgba8(file_path: impl AsRef<Path>) -> Result<Image<u8, 4>, IoError> {
    let (buf, size, color_type) = read_png_impl(file_path)?;
    expect_color_type(color_type, ColorType::Rgba)?;
    Ok(Image::new(size, buf)?)
}

fn expect_color_type(got: ColorType, expected: ColorType) -> Result<(), IoError> {
    if got != expected {
        return Err(IoError::PngDecodeError(format!(
            "expected a {expected:?} image, found {got:?}"
        )));
    }
    Ok(())
}

// utility function to read the png file, palette and sub-byte images are
// expanded and 16-bit samples are stripped so the buffer is always 8-bit
pub(crate) fn read_png_impl(
    file_path: impl AsRef<Path>,
) -> Result<(Vec<u8>, ImageSize, ColorType), IoError> {
    // verify the file exists
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    // verify the file extension
    match file_path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("png") => {}
        _ => return Err(IoError::InvalidFileExtension(file_path.to_path_buf())),
    }

    let file = fs::File::open(file_path)?;
    let mut decoder = Decoder::new(file);
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);

    let mut reader = decoder
        .read_info()
        .map_err(|e| IoError::PngDecodeError(e.to_string()))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| IoError::PngDecodeError(e.to_string()))?;
    buf.truncate(info.buffer_size());

    let size = ImageSize {
        width: info.width as usize,
        height: info.height as usize,
    };

    log::debug!(
        "decoded {} as {:?} with {}",
        file_path.display(),
        info.color_type,
        size
    );

    Ok((buf, size, info.color_type))
}

/// Writes the given PNG _(rgb8)_ data to the given file path.
///
/// # Arguments
///
/// - `file_path` - The path to the PNG image.
/// - `image` - The image containing the PNG image data.
pub fn write_image_png_rgb8(
    file_path: impl AsRef<Path>,
    image: &Image<u8, 3>,
) -> Result<(), IoError> {
    write_png_impl(
        file_path,
        image.as_slice(),
        image.size(),
        BitDepth::Eight,
        ColorType::Rgb,
    )
}

/// Writes the given PNG _(grayscale 8-bit)_ data to the given file path.
///
/// # Arguments
///
/// - `file_path` - The path to the PNG image.
/// - `image` - The image containing the PNG image data.
pub fn write_image_png_gray8(
    file_path: impl AsRef<Path>,
    image: &Image<u8, 1>,
) -> Result<(), IoError> {
    write_png_impl(
        file_path,
        image.as_slice(),
        image.size(),
        BitDepth::Eight,
        ColorType::Grayscale,
    )
}

fn write_png_impl(
    file_path: impl AsRef<Path>,
    image_data: &[u8],
    image_size: ImageSize,
    // Make sure you set `depth` correctly
    depth: BitDepth,
    color_type: ColorType,
) -> Result<(), IoError> {
    let file = File::create(file_path)?;

    let mut encoder = Encoder::new(
        BufWriter::new(file),
        image_size.width as u32,
        image_size.height as u32,
    );
    encoder.set_color(color_type);
    encoder.set_depth(depth);

    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::PngEncodingError(e.to_string()))?;
    writer
        .write_image_data(image_data)
        .map_err(|e| IoError::PngEncodingError(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| IoError::PngEncodingError(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_png_gray8() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("gradient.png");

        let data = (0..16 * 9).map(|i| i as u8).collect();
        let image = Image::<u8, 1>::new([16, 9].into(), data)?;
        write_image_png_gray8(&file_path, &image)?;

        let image_back = read_image_png_mono8(&file_path)?;
        assert_eq!(image_back, image);
        Ok(())
    }

    #[test]
    fn read_write_png_rgb8() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("rgb.png");

        let data = (0..4 * 3 * 3).map(|i| (i * 5) as u8).collect();
        let image = Image::<u8, 3>::new([4, 3].into(), data)?;
        write_image_png_rgb8(&file_path, &image)?;

        assert_eq!(read_image_png_rgb8(&file_path)?, image);
        Ok(())
    }

    #[test]
    fn read_png_wrong_layout() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("rgb.png");

        let image = Image::<u8, 3>::from_size_val([2, 2].into(), 1)?;
        write_image_png_rgb8(&file_path, &image)?;

        assert!(matches!(
            read_image_png_mono8(&file_path),
            Err(IoError::PngDecodeError(_))
        ));
        assert!(matches!(
            read_image_png_rgba8(&file_path),
            Err(IoError::PngDecodeError(_))
        ));
        Ok(())
    }

    #[test]
    fn read_png_missing_file() {
        let res = read_image_png_mono8("does/not/exist.png");
        assert!(matches!(res, Err(IoError::FileDoesNotExist(_))));
    }

    #[test]
    fn read_png_invalid_extension() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("image.jpg");
        std::fs::write(&file_path, b"not a png")?;

        let res = read_image_png_mono8(&file_path);
        assert!(matches!(res, Err(IoError::InvalidFileExtension(_))));
        Ok(())
    }

    #[test]
    fn read_png_corrupted() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("broken.png");
        std::fs::write(&file_path, b"definitely not a png")?;

        let res = read_image_png_mono8(&file_path);
        assert!(matches!(res, Err(IoError::PngDecodeError(_))));
        Ok(())
    }
}
