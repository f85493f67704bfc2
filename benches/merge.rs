#[macro_use]
extern crate bencher;

extern crate deepops;
use deepops::prelude::*;

use bencher::Bencher;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A deep image with up to eight semi transparent samples per pixel.
fn random_image(size: (usize, usize)) -> DeepImage {
    let mut random = StdRng::seed_from_u64(0);
    let bounds = IntegerBounds::from_dimensions(size);
    let sample_counts: Vec<u32> = (0 .. bounds.area()).map(|_| random.random_range(0 ..= 8)).collect();

    let mut values = Vec::new();
    for _ in 0 .. sample_counts.iter().sum::<u32>() {
        let alpha = random.random_range(0.05 .. 0.6_f32);
        let front = random.random_range(0.0 .. 100.0_f32);
        values.extend_from_slice(&[0.5 * alpha, 0.3 * alpha, 0.1 * alpha, alpha, front, front]);
    }

    let plane = DeepPlane::new(bounds, ChannelSet::rgba_deep(), sample_counts, values).unwrap();
    DeepImage::new(Format::square_pixels(size), plane)
}

/// Merge nine pixels with equal weights, like a box filter
fn merge_nine_pixels(bench: &mut Bencher) {
    let image = random_image((3, 3));
    let channels = ChannelSet::rgba_deep();
    let pixels: Vec<DeepPixel<'_>> = image.plane().bounds().positions().map(|position| image.plane().pixel(position)).collect();
    let weights = vec![1.0 / 9.0; 9];

    bench.iter(||{
        let merged = merge_deep_pixels(&pixels, &weights, &channels, MergeOptions::default()).unwrap();
        bencher::black_box(merged);
    })
}

/// Blur a small image by two pixels
fn blur(bench: &mut Bencher) {
    let image = random_image((32, 32));
    let blur = DeepBlur::with_source(image, BlurOptions::new((2.0, 2.0)));
    let bounds = IntegerBounds::from_dimensions((32, 32));

    bench.iter(||{
        let plane = blur.fetch(bounds, &ChannelSet::rgba_deep()).unwrap();
        bencher::black_box(plane);
    })
}

/// Downscale a small image to half its size
fn reformat_half(bench: &mut Bencher) {
    let image = random_image((32, 32));
    let reformat = DeepReformat::with_source(image, ReformatOptions::scale(0.5, 0.5));
    let bounds = IntegerBounds::from_dimensions((16, 16));

    bench.iter(||{
        let plane = reformat.fetch(bounds, &ChannelSet::rgba_deep()).unwrap();
        bencher::black_box(plane);
    })
}

benchmark_group!(merge,
    merge_nine_pixels,
    blur,
    reformat_half
);

benchmark_main!(merge);
