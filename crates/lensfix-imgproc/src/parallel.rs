use rayon::prelude::*;
use thiserror::Error;

use lensfix_image::Image;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),
}

/// Controls how row-partitioned operations are executed.
///
/// Every strategy hands each output row to exactly one worker, so the result
/// does not depend on the strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool, one task per output row.
    #[default]
    ParallelRows,

    /// Run sequentially on the current thread.
    ///
    /// Useful for small images, debugging, or when the overhead of parallelization
    /// outweighs the benefits.
    Serial,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    Fixed(usize),
}

/// Apply a function to each pixel in the image in parallel.
pub fn par_iter_rows<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&[T1], &mut [T2]) + Send + Sync,
) where
    T1: Send + Sync,
    T2: Send + Sync,
{
    let cols = src.cols();
    if cols == 0 || C1 == 0 || C2 == 0 {
        return;
    }

    src.as_slice()
        .par_chunks_exact(C1 * cols)
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C2 * cols))
        .for_each(|(src_chunk, dst_chunk)| {
            src_chunk
                .chunks_exact(C1)
                .zip(dst_chunk.chunks_exact_mut(C2))
                .for_each(|(src_pixel, dst_pixel)| {
                    f(src_pixel, dst_pixel);
                });
        });
}

/// Apply a function to each destination pixel given its sampling coordinates.
///
/// The destination and the two maps must share the same size; the caller checks it.
///
/// # Arguments
///
/// * `strategy` - How the rows are distributed.
/// * `dst` - The output image.
/// * `map_x` - The x coordinate to sample for each output pixel.
/// * `map_y` - The y coordinate to sample for each output pixel.
/// * `f` - Receives `(x, y, dst_pixel)` and fills the pixel.
pub fn iter_rows_resample<T, const C: usize>(
    strategy: ExecutionStrategy,
    dst: &mut Image<T, C>,
    map_x: &Image<f32, 1>,
    map_y: &Image<f32, 1>,
    f: impl Fn(f32, f32, &mut [T]) + Send + Sync,
) -> Result<(), ParallelError>
where
    T: Send + Sync,
{
    let cols = dst.cols();
    if cols == 0 || C == 0 {
        return Ok(());
    }

    let row_op = |((dst_row, map_x_row), map_y_row): ((&mut [T], &[f32]), &[f32])| {
        dst_row
            .chunks_exact_mut(C)
            .zip(map_x_row.iter().zip(map_y_row.iter()))
            .for_each(|(dst_pixel, (&x, &y))| f(x, y, dst_pixel));
    };

    let dst_slice = dst.as_slice_mut();
    let (map_x_slice, map_y_slice) = (map_x.as_slice(), map_y.as_slice());

    let par_rows = |dst_slice: &mut [T]| {
        dst_slice
            .par_chunks_exact_mut(C * cols)
            .zip(map_x_slice.par_chunks_exact(cols))
            .zip(map_y_slice.par_chunks_exact(cols))
            .for_each(&row_op);
    };

    match strategy {
        ExecutionStrategy::Serial => {
            dst_slice
                .chunks_exact_mut(C * cols)
                .zip(map_x_slice.chunks_exact(cols))
                .zip(map_y_slice.chunks_exact(cols))
                .for_each(&row_op);
        }
        ExecutionStrategy::ParallelRows => par_rows(dst_slice),
        ExecutionStrategy::Fixed(n) => {
            if n == 0 {
                return Err(ParallelError::InvalidThreadCount(n));
            }
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| ParallelError::BuildError(e.to_string()))?;

            pool.install(|| par_rows(dst_slice));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lensfix_image::{ImageError, ImageSize};

    fn coordinate_maps(size: ImageSize) -> Result<(Image<f32, 1>, Image<f32, 1>), ImageError> {
        let xs = (0..size.height)
            .flat_map(|_| (0..size.width).map(|c| c as f32))
            .collect();
        let ys = (0..size.height)
            .flat_map(|r| std::iter::repeat(r as f32).take(size.width))
            .collect();
        Ok((Image::new(size, xs)?, Image::new(size, ys)?))
    }

    #[test]
    fn test_par_iter_rows() -> Result<(), ImageError> {
        let src = Image::<u8, 2>::new([2, 2].into(), vec![1, 2, 3, 4, 5, 6, 7, 8])?;
        let mut dst = Image::<u8, 1>::from_size_val(src.size(), 0)?;

        par_iter_rows(&src, &mut dst, |s, d| d[0] = s[0] + s[1]);

        assert_eq!(dst.as_slice(), &[3, 7, 11, 15]);
        Ok(())
    }

    #[test]
    fn test_resample_strategies_agree() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 5,
            height: 3,
        };
        let (map_x, map_y) = coordinate_maps(size)?;

        let mut outputs = vec![];
        for strategy in [
            ExecutionStrategy::Serial,
            ExecutionStrategy::ParallelRows,
            ExecutionStrategy::Fixed(2),
        ] {
            let mut dst = Image::<f32, 2>::from_size_val(size, 0.0)?;
            iter_rows_resample(strategy, &mut dst, &map_x, &map_y, |x, y, px| {
                px[0] = x;
                px[1] = y;
            })?;
            outputs.push(dst);
        }

        assert_eq!(outputs[0].get([2, 4, 0]), Some(&4.0));
        assert_eq!(outputs[0].get([2, 4, 1]), Some(&2.0));
        assert_eq!(outputs[0], outputs[1]);
        assert_eq!(outputs[0], outputs[2]);
        Ok(())
    }

    #[test]
    fn test_resample_fixed_zero_threads() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 2,
            height: 2,
        };
        let (map_x, map_y) = coordinate_maps(size)?;
        let mut dst = Image::<f32, 1>::from_size_val(size, 0.0)?;

        let res = iter_rows_resample(
            ExecutionStrategy::Fixed(0),
            &mut dst,
            &map_x,
            &map_y,
            |_, _, _| {},
        );
        assert_eq!(res, Err(ParallelError::InvalidThreadCount(0)));
        Ok(())
    }

    #[test]
    fn test_resample_empty_image() -> Result<(), Box<dyn std::error::Error>> {
        let size = ImageSize {
            width: 0,
            height: 0,
        };
        let (map_x, map_y) = coordinate_maps(size)?;
        let mut dst = Image::<u8, 1>::from_size_val(size, 0)?;
        iter_rows_resample(
            ExecutionStrategy::ParallelRows,
            &mut dst,
            &map_x,
            &map_y,
            |_, _, _| {},
        )?;
        assert!(dst.as_slice().is_empty());
        Ok(())
    }
}
