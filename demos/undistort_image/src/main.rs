use argh::FromArgs;
use std::path::PathBuf;
use std::time::Instant;

use lensfix::image::Image;
use lensfix::imgproc::{
    color, interpolation::InterpolationMode, parallel::ExecutionStrategy,
    undistort::DistortionCorrector,
};
use lensfix::io::{functional::GenericImage, functional::read_image_png_any, png as P};

mod config;

use config::{CameraConfig, CameraOverrides};

#[derive(FromArgs)]
/// Remove lens distortion from an image
struct Args {
    /// path to the distorted input image
    #[argh(option, short = 'i')]
    image_path: PathBuf,

    /// path to write the corrected image to
    #[argh(option, short = 'o')]
    output_path: PathBuf,

    /// path to a JSON file with the camera intrinsics and distortion
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// focal length in x, in pixels
    #[argh(option)]
    fx: Option<f64>,

    /// focal length in y, in pixels
    #[argh(option)]
    fy: Option<f64>,

    /// principal point x, in pixels
    #[argh(option)]
    cx: Option<f64>,

    /// principal point y, in pixels
    #[argh(option)]
    cy: Option<f64>,

    /// first radial distortion coefficient
    #[argh(option)]
    k1: Option<f64>,

    /// second radial distortion coefficient
    #[argh(option)]
    k2: Option<f64>,

    /// first tangential distortion coefficient
    #[argh(option)]
    p1: Option<f64>,

    /// second tangential distortion coefficient
    #[argh(option)]
    p2: Option<f64>,

    /// interpolation mode: nearest or bilinear
    #[argh(option, default = "InterpolationMode::Bilinear")]
    interpolation: InterpolationMode,

    /// value for pixels that map outside the source image
    #[argh(option, default = "0.0")]
    border_value: f32,

    /// keep the color channels of an RGB input instead of converting to grayscale
    #[argh(switch)]
    color: bool,

    /// number of worker threads, 0 uses the global pool
    #[argh(option, default = "0")]
    num_threads: usize,
}

impl Args {
    fn overrides(&self) -> CameraOverrides {
        CameraOverrides {
            fx: self.fx,
            fy: self.fy,
            cx: self.cx,
            cy: self.cy,
            k1: self.k1,
            k2: self.k2,
            p1: self.p1,
            p2: self.p2,
        }
    }

    fn strategy(&self) -> ExecutionStrategy {
        match self.num_threads {
            0 => ExecutionStrategy::ParallelRows,
            n => ExecutionStrategy::Fixed(n),
        }
    }
}

fn to_gray(image: GenericImage) -> Result<Image<u8, 1>, Box<dyn std::error::Error>> {
    let gray = match image {
        GenericImage::L8(gray) => gray,
        GenericImage::La8(gray_alpha) => gray_alpha.channel(0)?,
        GenericImage::Rgb8(rgb) => {
            let mut gray = Image::from_size_val(rgb.size(), 0u8)?;
            color::gray_from_rgb_u8(&rgb, &mut gray)?;
            gray
        }
        GenericImage::Rgba8(rgba) => {
            let mut gray = Image::from_size_val(rgba.size(), 0u8)?;
            color::gray_from_rgba_u8(&rgba, &mut gray)?;
            gray
        }
    };
    Ok(gray)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let camera = match &args.config {
        Some(path) => CameraConfig::from_file(path)?,
        None => CameraConfig::default(),
    }
    .with_overrides(&args.overrides());
    log::info!("camera: {:?}", camera);

    let corrector = DistortionCorrector::new(camera.intrinsic, camera.distortion)?
        .with_interpolation(args.interpolation)
        .with_border_value(args.border_value)
        .with_strategy(args.strategy());

    // read the image
    let image = read_image_png_any(&args.image_path)?;
    let size = image.size();
    log::info!(
        "The width is: {}, the height is: {}, the number of channels is: {}",
        size.width,
        size.height,
        image.num_channels()
    );

    let start = Instant::now();
    match image {
        GenericImage::Rgb8(rgb) if args.color => {
            let corrected = corrector.correct(&rgb)?;
            log::info!("time used: {:?}", start.elapsed());
            P::write_image_png_rgb8(&args.output_path, &corrected)?;
        }
        image => {
            if args.color {
                log::warn!("--color only applies to RGB images, writing grayscale");
            }
            let gray = to_gray(image)?;
            let corrected = corrector.correct(&gray)?;
            log::info!("time used: {:?}", start.elapsed());
            P::write_image_png_gray8(&args.output_path, &corrected)?;
        }
    }

    log::info!("wrote {}", args.output_path.display());

    Ok(())
}
