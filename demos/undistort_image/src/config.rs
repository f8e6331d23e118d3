use std::{fs::File, io::BufReader, path::Path};

use lensfix::imgproc::calibration::{distortion::PolynomialDistortion, CameraIntrinsic};
use serde::{Deserialize, Serialize};

/// Camera parameters read from a JSON file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub intrinsic: CameraIntrinsic,
    #[serde(default)]
    pub distortion: PolynomialDistortion,
}

impl Default for CameraConfig {
    // EuRoC MAV cam0
    fn default() -> Self {
        Self {
            intrinsic: CameraIntrinsic::new(458.654, 457.296, 367.215, 248.375),
            distortion: PolynomialDistortion::new(
                -0.28340811,
                0.07395907,
                0.00019359,
                1.76187114e-05,
            ),
        }
    }
}

/// Per-parameter values given on the command line, applied on top of the file.
#[derive(Debug, Default, Clone, Copy)]
pub struct CameraOverrides {
    pub fx: Option<f64>,
    pub fy: Option<f64>,
    pub cx: Option<f64>,
    pub cy: Option<f64>,
    pub k1: Option<f64>,
    pub k2: Option<f64>,
    pub p1: Option<f64>,
    pub p2: Option<f64>,
}

impl CameraConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let file = File::open(path.as_ref())?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: &CameraOverrides) -> Self {
        let fields = [
            (&mut self.intrinsic.fx, overrides.fx),
            (&mut self.intrinsic.fy, overrides.fy),
            (&mut self.intrinsic.cx, overrides.cx),
            (&mut self.intrinsic.cy, overrides.cy),
            (&mut self.distortion.k1, overrides.k1),
            (&mut self.distortion.k2, overrides.k2),
            (&mut self.distortion.p1, overrides.p1),
            (&mut self.distortion.p2, overrides.p2),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
        self
    }
}
