use lensfix_image::{Image, ImageError, ImageSize};
use rayon::prelude::*;

/// Create a meshgrid of x and y coordinates computed from a function
///
/// The rows of the grid are filled in parallel.
///
/// # Arguments
///
/// * `cols` - The number of columns indicating the width of the grid
/// * `rows` - The number of rows indicating the height of the grid
/// * `f` - Maps a `(col, row)` position to the pair stored in the two maps
///
/// # Returns
///
/// A tuple of single channel images of shape (rows, cols) holding the first
/// and second component returned by `f`.
pub fn meshgrid_from_fn(
    cols: usize,
    rows: usize,
    f: impl Fn(usize, usize) -> (f32, f32) + Send + Sync,
) -> Result<(Image<f32, 1>, Image<f32, 1>), ImageError> {
    let size = ImageSize {
        width: cols,
        height: rows,
    };

    let mut map_x = vec![0.0f32; rows * cols];
    let mut map_y = vec![0.0f32; rows * cols];

    if cols > 0 {
        map_x
            .par_chunks_exact_mut(cols)
            .zip(map_y.par_chunks_exact_mut(cols))
            .enumerate()
            .for_each(|(r, (xrow, yrow))| {
                xrow.iter_mut()
                    .zip(yrow.iter_mut())
                    .enumerate()
                    .for_each(|(c, (x, y))| {
                        (*x, *y) = f(c, r);
                    });
            });
    }

    Ok((Image::new(size, map_x)?, Image::new(size, map_y)?))
}
