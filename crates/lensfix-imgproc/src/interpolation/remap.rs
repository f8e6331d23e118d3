use crate::parallel::{self, ExecutionStrategy, ParallelError};

use super::interpolate::interpolate_pixel;
use super::InterpolationMode;
use lensfix_image::{Image, ImageDtype, ImageSize};
use thiserror::Error;

/// Errors raised by [`remap`].
#[derive(Error, Debug, PartialEq)]
pub enum RemapError {
    /// The x and y maps have different sizes.
    #[error("map_x size {0} does not match map_y size {1}")]
    MapSizeMismatch(ImageSize, ImageSize),

    /// The output image does not have the size of the maps.
    #[error("output size {0} does not match map size {1}")]
    OutputSizeMismatch(ImageSize, ImageSize),

    /// The rows could not be scheduled.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}

/// Apply generic geometric transformation to an image.
///
/// For every output pixel `(x, y)` the source is sampled at
/// `(map_x[y, x], map_y[y, x])`. Samples that fall outside
/// `[0, cols) x [0, rows)` of the source, or are NaN, are filled with
/// `border_value` on every channel.
///
/// # Arguments
///
/// * `src` - The input image container with shape (height, width, C).
/// * `dst` - The output image container with shape (height, width, C).
/// * `map_x` - The x coordinates of the pixels to interpolate.
/// * `map_y` - The y coordinates of the pixels to interpolate.
/// * `interpolation` - The interpolation mode to use.
/// * `border_value` - The value written where the sample is out of bounds.
/// * `strategy` - How the output rows are distributed across threads.
///
/// # Errors
///
/// * The mapx and mapy must have the same size.
/// * The output image must have the same size as the mapx and mapy.
pub fn remap<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    map_x: &Image<f32, 1>,
    map_y: &Image<f32, 1>,
    interpolation: InterpolationMode,
    border_value: f32,
    strategy: ExecutionStrategy,
) -> Result<(), RemapError> {
    if map_x.size() != map_y.size() {
        return Err(RemapError::MapSizeMismatch(map_x.size(), map_y.size()));
    }

    if dst.size() != map_x.size() {
        return Err(RemapError::OutputSizeMismatch(dst.size(), map_x.size()));
    }

    let (cols, rows) = (src.cols() as f32, src.rows() as f32);
    let border = T::from_f32(border_value);

    parallel::iter_rows_resample(strategy, dst, map_x, map_y, |x, y, dst_pixel| {
        // negated comparison so that NaN lands on the border
        if !(x >= 0.0 && x < cols && y >= 0.0 && y < rows) {
            dst_pixel.fill(border);
            return;
        }

        let pixel = interpolate_pixel(src, x, y, interpolation);
        dst_pixel
            .iter_mut()
            .zip(pixel)
            .for_each(|(d, s)| *d = T::from_f32(s));
    })?;

    Ok(())
}
