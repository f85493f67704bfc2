//! Separable gaussian convolution kernels for blurring deep images.

use crate::math::Vec2;
use std::f32::consts::PI;


/// Blur sizes are converted to kernel radius and sigma
/// in the same way that common flat blur nodes do it.
pub const RADIUS_PER_SIZE: f32 = 1.5;

/// See `RADIUS_PER_SIZE`.
pub const SIGMA_PER_SIZE: f32 = 0.425;

/// The largest number of weights a blur kernel may have, as many as an 8192 × 8192 pixel kernel.
pub const MAX_KERNEL_WEIGHTS: usize = 1 << 26;


/// A normalized two-dimensional gaussian kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKernel {
    radius: Vec2<usize>,
    weights: Vec<f32>,
}

impl GaussianKernel {

    /// Create a kernel with the specified half-size and standard deviation per axis.
    pub fn new(radius: Vec2<usize>, sigma: Vec2<f32>) -> Self {
        Self { radius, weights: gaussian_weights(radius, sigma) }
    }

    /// Create the kernel for a blur of the specified size.
    /// The radius is `floor(|size| * 1.5)` and sigma is `size * 0.425` per axis.
    pub fn from_blur_size(size: Vec2<f32>) -> Self {
        let sigma = size.map(|size| size * SIGMA_PER_SIZE);
        Self::new(Self::radius_for_blur_size(size), sigma)
    }

    /// The radius of the kernel for a blur of the specified size, `floor(|size| * 1.5)` per axis.
    /// Saturates for huge sizes.
    pub fn radius_for_blur_size(size: Vec2<f32>) -> Vec2<usize> {
        size.map(|size| (size.abs() * RADIUS_PER_SIZE).floor() as usize)
    }

    /// The number of weights of a kernel with the specified radius,
    /// or `None` if that number does not fit into `usize`.
    pub fn weight_count(radius: Vec2<usize>) -> Option<usize> {
        let width = radius.x().checked_mul(2)?.checked_add(1)?;
        let height = radius.y().checked_mul(2)?.checked_add(1)?;
        width.checked_mul(height)
    }

    /// The half-size of the kernel per axis, excluding the center pixel.
    pub fn radius(&self) -> Vec2<usize> {
        self.radius
    }

    /// The number of pixels covered by this kernel per axis.
    pub fn dimensions(&self) -> Vec2<usize> {
        self.radius.map(|radius| radius * 2 + 1)
    }

    /// All weights, with the horizontal offset in the outer loop
    /// and the vertical offset in the inner loop. Sums up to one.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// The pixel offsets in the same order as the weights.
    pub fn offsets(&self) -> impl Iterator<Item = Vec2<i32>> {
        let Vec2(rx, ry) = self.radius.map(|radius| radius as i32);
        (-rx ..= rx).flat_map(move |x| (-ry ..= ry).map(move |y| Vec2(x, y)))
    }
}


/// Compute the normalized weights of a gaussian kernel with the specified radius and sigma.
///
/// The result contains `(2 * radius.x + 1) * (2 * radius.y + 1)` weights,
/// with the horizontal offset `-radius.x ..= radius.x` in the outer loop
/// and the vertical offset in the inner loop.
/// A sigma of zero results in a constant profile along that axis.
pub fn gaussian_weights(radius: Vec2<usize>, sigma: Vec2<f32>) -> Vec<f32> {
    let horizontal = half_profile(radius.x(), sigma.x());

    let vertical = if radius.y() == radius.x() { horizontal.clone() }
        else { half_profile(radius.y(), sigma.y()) };

    let mut weights = Vec::with_capacity((radius.x() * 2 + 1) * (radius.y() * 2 + 1));

    for x in mirrored(radius.x()) {
        for y in mirrored(radius.y()) {
            weights.push(horizontal[x] * vertical[y]);
        }
    }

    let sum: f32 = weights.iter().sum();
    let normalization = 1.0 / sum;

    for weight in &mut weights {
        *weight *= normalization;
    }

    weights
}

/// The gaussian density at the distances `0 ..= radius`.
fn half_profile(radius: usize, sigma: f32) -> Vec<f32> {
    let double_variance = 2.0 * sigma * sigma;

    // no blur along this axis, also avoids dividing by zero
    if sigma == 0.0 || double_variance == 0.0 {
        return vec![1.0; radius + 1];
    }

    let scale = 1.0 / (PI * double_variance).sqrt();

    (0 ..= radius)
        .map(|distance| {
            let distance = distance as f32;
            (-(distance * distance) / double_variance).exp() * scale
        })
        .collect()
}

/// The absolute values of `-radius ..= radius`.
fn mirrored(radius: usize) -> impl Iterator<Item = usize> {
    let radius = radius as isize;
    (-radius ..= radius).map(isize::unsigned_abs)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn assert_normalized(weights: &[f32]) {
        let sum: f32 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "sum is {}", sum);
    }

    #[test]
    fn weights_sum_to_one() {
        for &(radius, sigma) in &[
            (Vec2(0, 0), Vec2(0.0, 0.0)),
            (Vec2(1, 1), Vec2(0.425, 0.425)),
            (Vec2(3, 1), Vec2(0.0, 0.5)),
            (Vec2(7, 2), Vec2(2.125, 0.85)),
            (Vec2(4, 4), Vec2(1.7, 0.0)),
        ] {
            let weights = gaussian_weights(radius, sigma);
            assert_eq!(weights.len(), (radius.x() * 2 + 1) * (radius.y() * 2 + 1));
            assert_normalized(&weights);
        }
    }

    #[test]
    fn zero_sigma_is_a_box() {
        let weights = gaussian_weights(Vec2(1, 2), Vec2(0.0, 0.0));
        assert_eq!(weights.len(), 15);
        assert!(weights.iter().all(|&weight| (weight - 1.0 / 15.0).abs() < 1e-7));
    }

    #[test]
    fn center_weighs_most() {
        let kernel = GaussianKernel::from_blur_size(Vec2(2.0, 2.0));
        assert_eq!(kernel.radius(), Vec2(3, 3));
        assert_eq!(kernel.dimensions(), Vec2(7, 7));

        let (center_index, _) = kernel.offsets().enumerate()
            .find(|(_, offset)| *offset == Vec2(0, 0)).unwrap();

        let max = kernel.weights().iter().cloned().fold(0.0, f32::max);
        assert_eq!(kernel.weights()[center_index], max);
        assert_eq!(center_index, 24);
    }

    #[test]
    fn offsets_iterate_x_outer() {
        let kernel = GaussianKernel::new(Vec2(1, 0), Vec2(1.0, 0.0));
        let offsets: Vec<Vec2<i32>> = kernel.offsets().collect();
        assert_eq!(offsets, vec![Vec2(-1, 0), Vec2(0, 0), Vec2(1, 0)]);

        let tall = GaussianKernel::new(Vec2(0, 1), Vec2(0.0, 1.0));
        let offsets: Vec<Vec2<i32>> = tall.offsets().collect();
        assert_eq!(offsets, vec![Vec2(0, -1), Vec2(0, 0), Vec2(0, 1)]);
    }

    #[test]
    fn equal_radius_reuses_horizontal_profile() {
        // the vertical sigma is ignored when both radii match
        let reused = gaussian_weights(Vec2(2, 2), Vec2(0.85, 0.0));
        let symmetric = gaussian_weights(Vec2(2, 2), Vec2(0.85, 0.85));
        assert_eq!(reused, symmetric);
    }

    #[test]
    fn weight_count_detects_overflow() {
        assert_eq!(GaussianKernel::weight_count(Vec2(1, 2)), Some(15));
        assert_eq!(GaussianKernel::weight_count(Vec2(usize::MAX / 2, 0)), Some(usize::MAX));
        assert_eq!(GaussianKernel::weight_count(Vec2(usize::MAX, 0)), None);
        assert_eq!(GaussianKernel::weight_count(Vec2(usize::MAX / 4, 1)), None);

        let huge = GaussianKernel::radius_for_blur_size(Vec2(1e7, 1e30));
        assert_eq!(huge, Vec2(15_000_000, usize::MAX));
    }

    #[test]
    fn zero_size_is_identity() {
        let kernel = GaussianKernel::from_blur_size(Vec2(0.0, 0.0));
        assert_eq!(kernel.weights(), &[1.0]);
        assert_eq!(kernel.offsets().collect::<Vec<_>>(), vec![Vec2(0, 0)]);
    }
}
