use serde::{Deserialize, Serialize};
use thiserror::Error;

/// lens distortion module.
pub mod distortion;

/// Errors raised while validating camera parameters or building correction maps.
#[derive(Error, Debug, PartialEq)]
pub enum CalibrationError {
    /// The focal lengths must be finite and strictly positive, the principal point finite.
    #[error("invalid camera intrinsics: fx={fx}, fy={fy}, cx={cx}, cy={cy}")]
    InvalidIntrinsics {
        /// The focal length in the x direction
        fx: f64,
        /// The focal length in the y direction
        fy: f64,
        /// The x coordinate of the principal point
        cx: f64,
        /// The y coordinate of the principal point
        cy: f64,
    },

    /// A distortion coefficient is NaN or infinite.
    #[error("distortion coefficient {0} is not finite")]
    InvalidDistortion(&'static str),

    /// The correction map could not be allocated.
    #[error(transparent)]
    Image(#[from] lensfix_image::ImageError),
}

/// Represents the instrinsic parameters of a pinhole camera
///
/// # Fields
///
/// * `fx` - The focal length in the x direction
/// * `fy` - The focal length in the y direction
/// * `cx` - The x coordinate of the principal point
/// * `cy` - The y coordinate of the principal point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsic {
    /// The focal length in the x direction
    pub fx: f64,
    /// The focal length in the y direction
    pub fy: f64,
    /// The x coordinate of the principal point
    pub cx: f64,
    /// The y coordinate of the principal point
    pub cy: f64,
}

impl CameraIntrinsic {
    /// Create a new set of pinhole intrinsics.
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Check that the intrinsics describe a usable pinhole camera.
    ///
    /// # Errors
    ///
    /// Returns [`CalibrationError::InvalidIntrinsics`] when a focal length is zero,
    /// negative or not finite, or when the principal point is not finite.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let focal_ok = |f: f64| f.is_finite() && f > 0.0;
        if focal_ok(self.fx) && focal_ok(self.fy) && self.cx.is_finite() && self.cy.is_finite() {
            return Ok(());
        }

        Err(CalibrationError::InvalidIntrinsics {
            fx: self.fx,
            fy: self.fy,
            cx: self.cx,
            cy: self.cy,
        })
    }

    /// Convert a pixel coordinate to normalized image coordinates.
    pub fn normalize(&self, u: f64, v: f64) -> (f64, f64) {
        ((u - self.cx) / self.fx, (v - self.cy) / self.fy)
    }

    /// Convert normalized image coordinates back to a pixel coordinate.
    ///
    /// The correction map does not call this: it adds the scaled displacement
    /// `fx * (x_d - x)` to the original pixel instead, which keeps the
    /// zero-distortion map exactly equal to the pixel grid. `fx * x + cx`
    /// rounds away from the input pixel for most intrinsics.
    pub fn denormalize(&self, x: f64, y: f64) -> (f64, f64) {
        (self.fx * x + self.cx, self.fy * y + self.cy)
    }
}
