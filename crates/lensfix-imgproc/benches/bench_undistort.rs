use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use std::hint::black_box;

use lensfix_image::{Image, ImageSize};
use lensfix_imgproc::{
    calibration::{distortion::PolynomialDistortion, CameraIntrinsic},
    interpolation::InterpolationMode,
    parallel::ExecutionStrategy,
    undistort::DistortionCorrector,
};

fn random_image(size: ImageSize) -> Image<u8, 1> {
    let mut rng = rand::rng();
    let data = (0..size.width * size.height)
        .map(|_| rng.random_range(0..=255))
        .collect();
    Image::new(size, data).unwrap()
}

fn bench_undistort(c: &mut Criterion) {
    let mut group = c.benchmark_group("Undistort");

    let intrinsic = CameraIntrinsic::new(458.654, 457.296, 367.215, 248.375);
    let distortion =
        PolynomialDistortion::new(-0.28340811, 0.07395907, 0.00019359, 1.76187114e-05);

    for (width, height) in [(752, 480), (1920, 1080)].iter() {
        let size = ImageSize {
            width: *width,
            height: *height,
        };
        let src = random_image(size);
        let mut dst = Image::<u8, 1>::from_size_val(size, 0).unwrap();

        let parameter_string = format!("{width}x{height}");

        for (name, strategy) in [
            ("serial", ExecutionStrategy::Serial),
            ("parallel_rows", ExecutionStrategy::ParallelRows),
        ] {
            for mode in [InterpolationMode::Nearest, InterpolationMode::Bilinear] {
                let corrector = DistortionCorrector::new(intrinsic, distortion)
                    .unwrap()
                    .with_strategy(strategy)
                    .with_interpolation(mode);

                group.bench_with_input(
                    BenchmarkId::new(format!("correct_{name}_{mode:?}"), &parameter_string),
                    &src,
                    |b, src| b.iter(|| black_box(corrector.correct_into(src, &mut dst))),
                );

                let map = corrector.correction_map(size).unwrap();
                group.bench_with_input(
                    BenchmarkId::new(format!("cached_map_{name}_{mode:?}"), &parameter_string),
                    &src,
                    |b, src| b.iter(|| black_box(corrector.correct_with_map(&map, src, &mut dst))),
                );
            }
        }
    }

    group.finish();
}

criterion_group!(benches, bench_undistort);
criterion_main!(benches);
