use std::time::Instant;

use crate::calibration::{
    distortion::{generate_correction_map_polynomial, PolynomialDistortion},
    CalibrationError, CameraIntrinsic,
};
use crate::interpolation::{remap, InterpolationMode, RemapError};
use crate::parallel::{ExecutionStrategy, ParallelError};
use lensfix_image::{Image, ImageDtype, ImageError, ImageSize};
use thiserror::Error;

/// Errors raised while correcting lens distortion.
#[derive(Error, Debug, PartialEq)]
pub enum UndistortError {
    /// The camera parameters were rejected before any pixel was processed.
    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    /// The source, destination or correction map sizes disagree.
    #[error("source size ({0}, {1}) does not match destination size ({2}, {3})")]
    DimensionMismatch(usize, usize, usize, usize),

    /// An image buffer could not be allocated.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The rows could not be scheduled.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}

impl From<RemapError> for UndistortError {
    fn from(err: RemapError) -> Self {
        match err {
            RemapError::MapSizeMismatch(a, b) | RemapError::OutputSizeMismatch(a, b) => {
                UndistortError::DimensionMismatch(a.width, a.height, b.width, b.height)
            }
            RemapError::Parallel(e) => UndistortError::Parallel(e),
        }
    }
}

fn check_same_size(src: ImageSize, dst: ImageSize) -> Result<(), UndistortError> {
    if src != dst {
        return Err(UndistortError::DimensionMismatch(
            src.width, src.height, dst.width, dst.height,
        ));
    }
    Ok(())
}

/// A precomputed backward map from corrected pixels to distorted source locations.
///
/// Building the map is the expensive part of the correction; keep it around to
/// correct a stream of frames of the same size.
#[derive(Debug, Clone)]
pub struct CorrectionMap {
    map_x: Image<f32, 1>,
    map_y: Image<f32, 1>,
}

impl CorrectionMap {
    /// Compute the map for images of the given size.
    pub fn new(
        intrinsic: &CameraIntrinsic,
        distortion: &PolynomialDistortion,
        size: ImageSize,
    ) -> Result<Self, CalibrationError> {
        let (map_x, map_y) = generate_correction_map_polynomial(intrinsic, distortion, size)?;
        Ok(Self { map_x, map_y })
    }

    /// The size of the images this map applies to.
    pub fn size(&self) -> ImageSize {
        self.map_x.size()
    }

    /// The x coordinate in the distorted image for each corrected pixel.
    pub fn map_x(&self) -> &Image<f32, 1> {
        &self.map_x
    }

    /// The y coordinate in the distorted image for each corrected pixel.
    pub fn map_y(&self) -> &Image<f32, 1> {
        &self.map_y
    }
}

/// Removes radial and tangential lens distortion from images.
///
/// Each output pixel is normalized with the intrinsics, pushed through the
/// forward Brown-Conrady model and sampled from the distorted source at the
/// resulting location. Output pixels whose source location lies outside the
/// image get the border value.
///
/// # Example
///
/// ```
/// use lensfix_image::{Image, ImageSize};
/// use lensfix_imgproc::calibration::{distortion::PolynomialDistortion, CameraIntrinsic};
/// use lensfix_imgproc::undistort::DistortionCorrector;
///
/// let intrinsic = CameraIntrinsic::new(100.0, 100.0, 50.0, 50.0);
/// let corrector = DistortionCorrector::new(intrinsic, PolynomialDistortion::default()).unwrap();
///
/// let image = Image::<u8, 1>::from_size_val(ImageSize { width: 100, height: 100 }, 9).unwrap();
/// let corrected = corrector.correct(&image).unwrap();
///
/// assert_eq!(corrected, image);
/// ```
#[derive(Debug, Clone)]
pub struct DistortionCorrector {
    intrinsic: CameraIntrinsic,
    distortion: PolynomialDistortion,
    interpolation: InterpolationMode,
    border_value: f32,
    strategy: ExecutionStrategy,
}

impl DistortionCorrector {
    /// Create a corrector for a camera.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::InvalidIntrinsics`] for a zero, negative or
    /// non-finite focal length and [`CalibrationError::InvalidDistortion`] for a
    /// non-finite coefficient.
    pub fn new(
        intrinsic: CameraIntrinsic,
        distortion: PolynomialDistortion,
    ) -> Result<Self, UndistortError> {
        intrinsic.validate()?;
        distortion.validate()?;

        Ok(Self {
            intrinsic,
            distortion,
            interpolation: InterpolationMode::default(),
            border_value: 0.0,
            strategy: ExecutionStrategy::default(),
        })
    }

    /// Set the interpolation used to sample the distorted image.
    pub fn with_interpolation(mut self, interpolation: InterpolationMode) -> Self {
        self.interpolation = interpolation;
        self
    }

    /// Set the value written where the source location falls outside the image.
    pub fn with_border_value(mut self, border_value: f32) -> Self {
        self.border_value = border_value;
        self
    }

    /// Set how the output rows are distributed across threads.
    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// The camera intrinsics.
    pub fn intrinsic(&self) -> &CameraIntrinsic {
        &self.intrinsic
    }

    /// The distortion coefficients.
    pub fn distortion(&self) -> &PolynomialDistortion {
        &self.distortion
    }

    /// Compute the backward map for images of the given size.
    pub fn correction_map(&self, size: ImageSize) -> Result<CorrectionMap, UndistortError> {
        Ok(CorrectionMap::new(&self.intrinsic, &self.distortion, size)?)
    }

    /// Correct an image into a newly allocated image of the same size.
    pub fn correct<T: ImageDtype, const C: usize>(
        &self,
        src: &Image<T, C>,
    ) -> Result<Image<T, C>, UndistortError> {
        let mut dst = Image::from_size_val(src.size(), T::default())?;
        self.correct_into(src, &mut dst)?;
        Ok(dst)
    }

    /// Correct an image into a caller provided buffer.
    ///
    /// # Errors
    ///
    /// Returns [`UndistortError::DimensionMismatch`] when `dst` is not the size of `src`.
    pub fn correct_into<T: ImageDtype, const C: usize>(
        &self,
        src: &Image<T, C>,
        dst: &mut Image<T, C>,
    ) -> Result<(), UndistortError> {
        check_same_size(src.size(), dst.size())?;

        let map = self.correction_map(src.size())?;
        self.correct_with_map(&map, src, dst)
    }

    /// Correct an image with a precomputed map.
    ///
    /// # Errors
    ///
    /// Returns [`UndistortError::DimensionMismatch`] when the map, `src` and
    /// `dst` do not all share the same size.
    pub fn correct_with_map<T: ImageDtype, const C: usize>(
        &self,
        map: &CorrectionMap,
        src: &Image<T, C>,
        dst: &mut Image<T, C>,
    ) -> Result<(), UndistortError> {
        check_same_size(src.size(), dst.size())?;
        check_same_size(map.size(), src.size())?;

        let start = Instant::now();

        remap(
            src,
            dst,
            &map.map_x,
            &map.map_y,
            self.interpolation,
            self.border_value,
            self.strategy,
        )?;

        log::debug!(
            "corrected {} with {} channel(s) using {:?} in {:?}",
            src.size(),
            C,
            self.interpolation,
            start.elapsed()
        );

        Ok(())
    }
}

/// Undistort an image given the camera intrinsics and distortion coefficients.
///
/// Bilinear or nearest sampling as requested, zero border and row-parallel execution.
///
/// # Arguments
///
/// * `src` - The distorted input image.
/// * `dst` - The output image, with the same size as `src`.
/// * `intrinsic` - The intrinsic parameters of the camera.
/// * `distortion` - The distortion parameters of the camera.
/// * `interpolation` - The interpolation mode to use.
pub fn undistort_image<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    intrinsic: &CameraIntrinsic,
    distortion: &PolynomialDistortion,
    interpolation: InterpolationMode,
) -> Result<(), UndistortError> {
    DistortionCorrector::new(*intrinsic, *distortion)?
        .with_interpolation(interpolation)
        .correct_into(src, dst)
}
