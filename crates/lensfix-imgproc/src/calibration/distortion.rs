use super::{CalibrationError, CameraIntrinsic};
use crate::interpolation::grid::meshgrid_from_fn;
use lensfix_image::{Image, ImageSize};
use serde::{Deserialize, Serialize};

/// Represents the Brown-Conrady distortion parameters of a camera
///
/// # Fields
///
/// * `k1` - The first radial distortion coefficient
/// * `k2` - The second radial distortion coefficient
/// * `p1` - The first tangential distortion coefficient
/// * `p2` - The second tangential distortion coefficient
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PolynomialDistortion {
    /// The first radial distortion coefficient
    #[serde(default)]
    pub k1: f64,
    /// The second radial distortion coefficient
    #[serde(default)]
    pub k2: f64,
    /// The first tangential distortion coefficient
    #[serde(default)]
    pub p1: f64,
    /// The second tangential distortion coefficient
    #[serde(default)]
    pub p2: f64,
}

impl PolynomialDistortion {
    /// Create a new set of distortion coefficients.
    pub fn new(k1: f64, k2: f64, p1: f64, p2: f64) -> Self {
        Self { k1, k2, p1, p2 }
    }

    /// Whether all coefficients are zero, i.e. the lens is an ideal pinhole.
    pub fn is_identity(&self) -> bool {
        self.k1 == 0.0 && self.k2 == 0.0 && self.p1 == 0.0 && self.p2 == 0.0
    }

    /// Check that every coefficient is finite.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let coeffs = [
            ("k1", self.k1),
            ("k2", self.k2),
            ("p1", self.p1),
            ("p2", self.p2),
        ];
        match coeffs.iter().find(|(_, c)| !c.is_finite()) {
            Some((name, _)) => Err(CalibrationError::InvalidDistortion(*name)),
            None => Ok(()),
        }
    }
}

/// Apply the Brown-Conrady model to a point in normalized coordinates.
///
/// # Arguments
///
/// * `x` - The x coordinate of the undistorted normalized point
/// * `y` - The y coordinate of the undistorted normalized point
/// * `distortion` - The distortion parameters of the camera
///
/// # Returns
///
/// The distorted normalized point `(x_d, y_d)`.
pub fn distort_normalized(x: f64, y: f64, distortion: &PolynomialDistortion) -> (f64, f64) {
    let (k1, k2, p1, p2) = (distortion.k1, distortion.k2, distortion.p1, distortion.p2);

    // calculate the radial distance
    let r2 = x * x + y * y;

    // radial distortion
    let kr = 1.0 + k1 * r2 + k2 * r2 * r2;

    // tangential distortion
    let xd = x * kr + 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x);
    let yd = y * kr + p1 * (r2 + 2.0 * y * y) + 2.0 * p2 * x * y;

    (xd, yd)
}

/// Distort a point using polynomial distortion
///
/// # Arguments
///
/// * `x` - The x coordinate of the point in the undistorted image
/// * `y` - The y coordinate of the point in the undistorted image
/// * `intrinsic` - The intrinsic parameters of the camera
/// * `distortion` - The distortion parameters of the camera
///
/// # Returns
///
/// * `x` - The x coordinate of the distorted point
/// * `y` - The y coordinate of the distorted point
pub fn distort_point_polynomial(
    x: f64,
    y: f64,
    intrinsic: &CameraIntrinsic,
    distortion: &PolynomialDistortion,
) -> (f64, f64) {
    let (xn, yn) = intrinsic.normalize(x, y);
    let (xd, yd) = distort_normalized(xn, yn, distortion);

    // equal to `fx * xd + cx`, written as a displacement so that a zero
    // displacement maps every pixel exactly onto itself
    (
        x + intrinsic.fx * (xd - xn),
        y + intrinsic.fy * (yd - yn),
    )
}

/// Generate the undistortion map for a polynomial distortion model
///
/// Every entry holds the location in the distorted image that the matching
/// pixel of the corrected image is sampled from.
///
/// # Arguments
///
/// * `intrinsic` - The intrinsic parameters of the camera
/// * `distortion` - The distortion parameters of the camera
/// * `size` - The size of the image
///
/// # Returns
///
/// * `map_x` - The x map for undistorting the image
/// * `map_y` - The y map for undistorting the image
///
/// # Errors
///
/// Fails before computing anything when the intrinsics or the coefficients are invalid.
pub fn generate_correction_map_polynomial(
    intrinsic: &CameraIntrinsic,
    distortion: &PolynomialDistortion,
    size: ImageSize,
) -> Result<(Image<f32, 1>, Image<f32, 1>), CalibrationError> {
    intrinsic.validate()?;
    distortion.validate()?;

    let (map_x, map_y) = meshgrid_from_fn(size.width, size.height, |x, y| {
        let (xdst, ydst) = distort_point_polynomial(x as f64, y as f64, intrinsic, distortion);
        (xdst as f32, ydst as f32)
    })?;

    Ok((map_x, map_y))
}
