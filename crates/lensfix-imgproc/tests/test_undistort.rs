use lensfix_image::{Image, ImageSize};
use lensfix_imgproc::calibration::distortion::{distort_point_polynomial, PolynomialDistortion};
use lensfix_imgproc::calibration::{CalibrationError, CameraIntrinsic};
use lensfix_imgproc::interpolation::InterpolationMode;
use lensfix_imgproc::parallel::ExecutionStrategy;
use lensfix_imgproc::undistort::{DistortionCorrector, UndistortError};

fn euroc_intrinsic() -> CameraIntrinsic {
    CameraIntrinsic::new(458.654, 457.296, 367.215, 248.375)
}

fn euroc_distortion() -> PolynomialDistortion {
    PolynomialDistortion::new(-0.28340811, 0.07395907, 0.00019359, 1.76187114e-05)
}

fn gradient_image(size: ImageSize) -> Result<Image<u8, 1>, UndistortError> {
    let data = (0..size.height)
        .flat_map(|v| (0..size.width).map(move |u| ((u * 7 + v * 13) % 256) as u8))
        .collect();
    Ok(Image::new(size, data)?)
}

fn source_in_bounds(u: usize, v: usize, size: ImageSize) -> bool {
    let (ud, vd) = distort_point_polynomial(
        u as f64,
        v as f64,
        &euroc_intrinsic(),
        &euroc_distortion(),
    );
    let (ud, vd) = (ud as f32, vd as f32);
    ud >= 0.0 && ud < size.width as f32 && vd >= 0.0 && vd < size.height as f32
}

#[test]
fn constant_image_euroc() -> Result<(), UndistortError> {
    let size = ImageSize {
        width: 500,
        height: 500,
    };
    let src = Image::<u8, 1>::from_size_val(size, 200)?;

    let corrector = DistortionCorrector::new(euroc_intrinsic(), euroc_distortion())?;
    let dst = corrector.correct(&src)?;

    assert_eq!(dst.size(), size);
    for v in 0..size.height {
        for u in 0..size.width {
            let expected = if source_in_bounds(u, v, size) { 200 } else { 0 };
            assert_eq!(dst.get_pixel(u, v, 0)?, &expected, "pixel ({u}, {v})");
        }
    }

    // the source is untouched
    assert!(src.as_slice().iter().all(|&p| p == 200));
    Ok(())
}

#[test]
fn out_of_bounds_samples_are_zero() -> Result<(), UndistortError> {
    // the principal point lies outside this crop, so part of it maps off the source
    let size = ImageSize {
        width: 200,
        height: 120,
    };
    let src = Image::<u8, 1>::from_size_val(size, 255)?;

    for mode in [InterpolationMode::Nearest, InterpolationMode::Bilinear] {
        let dst = DistortionCorrector::new(euroc_intrinsic(), euroc_distortion())?
            .with_interpolation(mode)
            .correct(&src)?;

        let mut num_border = 0;
        for v in 0..size.height {
            for u in 0..size.width {
                let pixel = *dst.get_pixel(u, v, 0)?;
                if source_in_bounds(u, v, size) {
                    assert_eq!(pixel, 255);
                } else {
                    assert_eq!(pixel, 0);
                    num_border += 1;
                }
            }
        }
        assert!(num_border > 0);
    }
    Ok(())
}

#[test]
fn identity_distortion_single_bright_pixel() -> Result<(), UndistortError> {
    let size = ImageSize {
        width: 100,
        height: 100,
    };
    let mut src = Image::<u8, 1>::from_size_val(size, 0)?;
    src.set_pixel(50, 50, 0, 255)?;

    let intrinsic = CameraIntrinsic::new(100.0, 100.0, 50.0, 50.0);
    for mode in [InterpolationMode::Nearest, InterpolationMode::Bilinear] {
        let dst = DistortionCorrector::new(intrinsic, PolynomialDistortion::default())?
            .with_interpolation(mode)
            .correct(&src)?;
        assert_eq!(dst, src);
    }
    Ok(())
}

#[test]
fn identity_distortion_preserves_content() -> Result<(), UndistortError> {
    let src = gradient_image(ImageSize {
        width: 37,
        height: 23,
    })?;
    let intrinsic = CameraIntrinsic::new(31.7, 29.3, 17.9, 11.2);

    let dst = DistortionCorrector::new(intrinsic, PolynomialDistortion::default())?.correct(&src)?;
    assert_eq!(dst, src);
    Ok(())
}

#[test]
fn negative_focal_length_is_rejected() {
    let intrinsic = CameraIntrinsic::new(-458.654, 457.296, 367.215, 248.375);
    let res = DistortionCorrector::new(intrinsic, euroc_distortion());
    assert!(matches!(
        res,
        Err(UndistortError::Calibration(
            CalibrationError::InvalidIntrinsics { .. }
        ))
    ));
}

#[test]
fn zero_focal_length_is_rejected() {
    let intrinsic = CameraIntrinsic::new(458.654, 0.0, 367.215, 248.375);
    let res = DistortionCorrector::new(intrinsic, euroc_distortion());
    assert!(res.is_err());
}

#[test]
fn output_size_matches_input() -> Result<(), UndistortError> {
    let corrector = DistortionCorrector::new(euroc_intrinsic(), euroc_distortion())?;
    for (width, height) in [(1, 1), (13, 7), (7, 13), (0, 0), (752, 480)] {
        let size = ImageSize { width, height };
        let src = Image::<u8, 1>::from_size_val(size, 10)?;
        assert_eq!(corrector.correct(&src)?.size(), size);
    }
    Ok(())
}

#[test]
fn output_is_deterministic_across_strategies() -> Result<(), UndistortError> {
    let src = gradient_image(ImageSize {
        width: 320,
        height: 240,
    })?;

    let corrector = DistortionCorrector::new(euroc_intrinsic(), euroc_distortion())?;
    let reference = corrector.correct(&src)?;

    assert_eq!(corrector.correct(&src)?, reference);
    for strategy in [ExecutionStrategy::Serial, ExecutionStrategy::Fixed(3)] {
        let dst = corrector.clone().with_strategy(strategy).correct(&src)?;
        assert_eq!(dst, reference);
    }
    Ok(())
}

#[test]
fn color_channels_are_corrected_independently() -> Result<(), UndistortError> {
    let size = ImageSize {
        width: 64,
        height: 48,
    };
    let gray = gradient_image(size)?;
    let rgb_data = gray
        .as_slice()
        .iter()
        .flat_map(|&p| [p, 255 - p, p / 2])
        .collect();
    let rgb = Image::<u8, 3>::new(size, rgb_data)?;

    let corrector = DistortionCorrector::new(
        CameraIntrinsic::new(60.0, 60.0, 32.0, 24.0),
        PolynomialDistortion::new(-0.2, 0.05, 0.001, 0.0005),
    )?;

    let rgb_corrected = corrector.correct(&rgb)?;
    for (c, channel) in rgb.split_channels()?.iter().enumerate() {
        let expected = corrector.correct(channel)?;
        assert_eq!(rgb_corrected.channel(c)?, expected);
    }
    Ok(())
}
