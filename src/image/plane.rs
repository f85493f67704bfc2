
//! Deep sample storage for a rectangular region of pixels.
//!
//! Each pixel can have a variable number of samples at different depths.
//! The samples of all pixels are stored in a flat array, with a separate
//! array tracking how many samples each pixel has.

use crate::error::{Error, Result, UnitResult};
use crate::image::deep::compositing::composite_front_to_back;
use crate::image::flat::FlatImage;
use crate::image::pixel::{DeepOutPixel, DeepPixel};
use crate::math::Vec2;
use crate::meta::bounds::IntegerBounds;
use crate::meta::channel::ChannelSet;
use std::convert::TryFrom;


/// Storage for the deep samples of all pixels inside a rectangle.
///
/// # Memory Layout
///
/// The samples are stored in a flat array, with pixel sample arrays concatenated
/// together in scan order. Each sample stores one value per channel.
///
/// ```text
/// Pixel (0,0): 3 samples  -> samples 0..3
/// Pixel (1,0): 0 samples  -> (empty)
/// Pixel (2,0): 5 samples  -> samples 3..8
/// Pixel (3,0): 2 samples  -> samples 8..10
/// ...
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DeepPlane {
    bounds: IntegerBounds,
    channels: ChannelSet,

    /// Number of samples for each pixel (row-major: width × height).
    sample_counts: Vec<u32>,

    /// `cumulative_offsets[pixel_index]` is the sum of all sample counts before this pixel.
    /// Length is `sample_counts.len() + 1`, with the last element being the total sample count.
    cumulative_offsets: Vec<usize>,

    /// Interleaved values: for each pixel, for each sample, for each channel.
    values: Vec<f32>,
}

impl DeepPlane {

    /// Creates new deep sample storage from sample counts and interleaved sample values.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `sample_counts` length doesn't match the area of the bounds
    /// - the length of `values` doesn't match the sum of `sample_counts` times the channel count
    pub fn new(
        bounds: IntegerBounds,
        channels: ChannelSet,
        sample_counts: Vec<u32>,
        values: Vec<f32>,
    ) -> Result<Self> {
        bounds.validate()?;

        let pixel_count = bounds.area();
        if sample_counts.len() != pixel_count {
            return Err(Error::invalid(format!(
                "sample_counts length {} doesn't match bounds {}×{} = {}",
                sample_counts.len(), bounds.size.width(), bounds.size.height(), pixel_count
            )));
        }

        let total_samples: u64 = sample_counts.iter().map(|&count| u64::from(count)).sum();
        let total_samples = usize::try_from(total_samples).map_err(|_| {
            Error::invalid(format!("total sample count {} exceeds usize::MAX", total_samples))
        })?;

        let expected_values = total_samples * channels.len();
        if values.len() != expected_values {
            return Err(Error::invalid(format!(
                "{} sample values don't match {} samples with {} channels",
                values.len(), total_samples, channels.len()
            )));
        }

        let cumulative_offsets = cumulative_offsets(&sample_counts);
        Ok(Self { bounds, channels, sample_counts, cumulative_offsets, values })
    }

    /// Creates empty deep sample storage (all pixels have 0 samples).
    pub fn empty(bounds: IntegerBounds, channels: ChannelSet) -> Self {
        let pixel_count = bounds.area();

        Self {
            bounds, channels,
            sample_counts: vec![0; pixel_count],
            cumulative_offsets: vec![0; pixel_count + 1],
            values: Vec::new(),
        }
    }

    /// The region of pixels stored in this plane.
    #[inline]
    pub fn bounds(&self) -> IntegerBounds {
        self.bounds
    }

    /// The channels each sample has a value for.
    #[inline]
    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    /// Returns the total number of samples across all pixels.
    #[inline]
    pub fn total_sample_count(&self) -> usize {
        self.cumulative_offsets.last().copied().unwrap_or(0)
    }

    /// Returns a reference to the sample counts array.
    #[inline]
    pub fn sample_counts(&self) -> &[u32] {
        &self.sample_counts
    }

    /// Number of samples of the pixel at the specified position.
    /// Pixels outside of the bounds have no samples.
    pub fn sample_count(&self, position: Vec2<i32>) -> usize {
        self.bounds.index_of(position).map_or(0, |index| self.sample_counts[index] as usize)
    }

    /// A view of all samples of the pixel at the specified position.
    /// Pixels outside of the bounds are empty.
    pub fn pixel(&self, position: Vec2<i32>) -> DeepPixel<'_> {
        match self.bounds.index_of(position) {
            None => DeepPixel::empty(&self.channels),
            Some(index) => DeepPixel::from_complete_samples(&self.channels, self.pixel_values(index)),
        }
    }

    fn pixel_values(&self, pixel_index: usize) -> &[f32] {
        let stride = self.channels.len();
        let start = self.cumulative_offsets[pixel_index] * stride;
        let end = self.cumulative_offsets[pixel_index + 1] * stride;
        &self.values[start .. end]
    }

    /// Copy the pixels of another region into a new plane.
    /// Pixels of the region outside of this plane are empty.
    /// Keeps only the requested channels that this plane has.
    pub fn crop(&self, bounds: IntegerBounds, channels: &ChannelSet) -> DeepPlane {
        let channels = self.channels.intersection(channels);
        let channel_indices: Vec<usize> = channels.iter()
            .filter_map(|channel| self.channels.index_of(channel))
            .collect();

        let mut output = DeepOutputPlane::new(channels, bounds);

        for position in bounds.positions() {
            let mut pixel = DeepOutPixel::new();

            if let Some(index) = self.bounds.index_of(position) {
                let values = self.pixel_values(index);
                pixel.reserve_more(self.sample_counts[index] as usize * channel_indices.len());

                for sample in values.chunks(self.channels.len().max(1)) {
                    for &channel in &channel_indices { pixel.push(sample[channel]); }
                }
            }

            output.push_complete(pixel);
        }

        output.into_complete_plane()
    }

    /// Composite every pixel front to back into a flat image with the same channels.
    pub fn flatten(&self) -> FlatImage {
        let mut flat = FlatImage::new(self.bounds, self.channels.clone());

        for position in self.bounds.positions() {
            let pixel = self.pixel(position);
            let values = composite_front_to_back(pixel.front_to_back(), &self.channels);

            for (channel, value) in self.channels.iter().zip(values) {
                flat.set(position, channel, value);
            }
        }

        flat
    }

    /// Returns statistics about the deep samples.
    ///
    /// Useful for debugging and understanding the sample distribution.
    pub fn statistics(&self) -> DeepSampleStatistics {
        let max_samples = self.sample_counts.iter().copied().max().unwrap_or(0);
        let min_samples = self.sample_counts.iter().copied().min().unwrap_or(0);
        let pixels_with_samples = self.sample_counts.iter().filter(|&&count| count > 0).count();

        let average_samples = if self.sample_counts.is_empty() { 0.0 }
            else { self.total_sample_count() as f64 / self.sample_counts.len() as f64 };

        DeepSampleStatistics {
            pixel_count: self.sample_counts.len(),
            total_samples: self.total_sample_count(),
            min_samples_per_pixel: min_samples,
            max_samples_per_pixel: max_samples,
            average_samples_per_pixel: average_samples,
            pixels_with_samples,
        }
    }
}

fn cumulative_offsets(sample_counts: &[u32]) -> Vec<usize> {
    let mut cumulative_offsets = Vec::with_capacity(sample_counts.len() + 1);
    cumulative_offsets.push(0);

    let mut offset = 0_usize;
    for &count in sample_counts {
        offset += count as usize;
        cumulative_offsets.push(offset);
    }

    cumulative_offsets
}


/// Statistics about deep sample distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeepSampleStatistics {

    /// Total number of pixels in the plane.
    pub pixel_count: usize,

    /// Total number of samples across all pixels.
    pub total_samples: usize,

    /// Minimum samples in any single pixel.
    pub min_samples_per_pixel: u32,

    /// Maximum samples in any single pixel.
    pub max_samples_per_pixel: u32,

    /// Average samples per pixel.
    pub average_samples_per_pixel: f64,

    /// Number of pixels that have at least one sample.
    pub pixels_with_samples: usize,
}


/// Builds a deep plane pixel by pixel, in scan order.
#[derive(Debug, Clone)]
pub struct DeepOutputPlane {
    bounds: IntegerBounds,
    channels: ChannelSet,
    sample_counts: Vec<u32>,
    values: Vec<f32>,
}

impl DeepOutputPlane {

    /// Start building a plane for the specified channels and region.
    pub fn new(channels: ChannelSet, bounds: IntegerBounds) -> Self {
        Self { sample_counts: Vec::with_capacity(bounds.area()), values: Vec::new(), bounds, channels }
    }

    /// The channels that every appended sample must have a value for.
    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    /// The region this plane will cover.
    pub fn bounds(&self) -> IntegerBounds {
        self.bounds
    }

    /// Number of pixels appended so far.
    pub fn pixel_count(&self) -> usize {
        self.sample_counts.len()
    }

    /// Append the next pixel in scan order.
    /// Returns an error if the pixel has an incomplete sample,
    /// or if the plane already contains all of its pixels.
    pub fn add_pixel(&mut self, pixel: DeepOutPixel) -> UnitResult {
        let channel_count = self.channels.len();

        let is_complete = if channel_count == 0 { pixel.is_empty() } else { pixel.len() % channel_count == 0 };
        if !is_complete {
            return Err(Error::invalid(format!(
                "output pixel with {} values does not fit {} channels", pixel.len(), channel_count
            )));
        }

        if self.sample_counts.len() >= self.bounds.area() {
            return Err(Error::invalid("more pixels than the output bounds contain"));
        }

        let sample_count = u32::try_from(pixel.sample_count(channel_count))
            .map_err(|_| Error::invalid("too many samples in one pixel"))?;

        self.push_complete_values(sample_count, pixel);
        Ok(())
    }

    /// The pixel was created from this planes channels.
    pub(crate) fn push_complete(&mut self, pixel: DeepOutPixel) {
        let sample_count = pixel.sample_count(self.channels.len()) as u32;
        self.push_complete_values(sample_count, pixel);
    }

    fn push_complete_values(&mut self, sample_count: u32, pixel: DeepOutPixel) {
        self.sample_counts.push(sample_count);

        if self.values.is_empty() { self.values = pixel.into_values(); }
        else { self.values.extend_from_slice(pixel.values()); }
    }

    /// Finish building the plane.
    /// Returns an error if not every pixel of the bounds was appended.
    pub fn into_plane(self) -> Result<DeepPlane> {
        if self.sample_counts.len() != self.bounds.area() {
            return Err(Error::invalid(format!(
                "output plane has {} of {} pixels", self.sample_counts.len(), self.bounds.area()
            )));
        }

        Ok(self.into_complete_plane())
    }

    /// Every pixel of the bounds was appended.
    pub(crate) fn into_complete_plane(self) -> DeepPlane {
        let cumulative_offsets = cumulative_offsets(&self.sample_counts);

        DeepPlane {
            bounds: self.bounds,
            channels: self.channels,
            sample_counts: self.sample_counts,
            cumulative_offsets,
            values: self.values,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::channel::Channel;

    fn alpha_depth() -> ChannelSet {
        ChannelSet::new(vec![Channel::Alpha, Channel::DeepFront])
    }

    #[test]
    fn empty_plane() {
        let plane = DeepPlane::empty(IntegerBounds::new((-5, -5), (10, 10)), alpha_depth());

        assert_eq!(plane.sample_counts().len(), 100);
        assert_eq!(plane.total_sample_count(), 0);
        assert_eq!(plane.sample_count(Vec2(0, 0)), 0);
        assert!(plane.pixel(Vec2(4, 4)).is_empty());
    }

    #[test]
    fn new_plane_indexes_pixels() {
        let bounds = IntegerBounds::new((10, 20), (2, 2));
        let plane = DeepPlane::new(bounds, alpha_depth(), vec![1, 0, 2, 1], vec![
            0.1, 1.0,
            0.2, 2.0, 0.3, 1.5,
            0.4, 4.0,
        ]).unwrap();

        assert_eq!(plane.total_sample_count(), 4);
        assert_eq!(plane.sample_count(Vec2(10, 20)), 1);
        assert_eq!(plane.sample_count(Vec2(11, 20)), 0);
        assert_eq!(plane.sample_count(Vec2(10, 21)), 2);

        let pixel = plane.pixel(Vec2(10, 21));
        assert_eq!(pixel.ordered_sample(1, &Channel::Alpha), 0.3);
        assert_eq!(pixel.unordered_sample(0, &Channel::Alpha), 0.2);
    }

    #[test]
    fn pixels_outside_are_empty() {
        let plane = DeepPlane::new(IntegerBounds::from_dimensions((1, 1)), alpha_depth(), vec![1], vec![1.0, 1.0]).unwrap();
        assert!(plane.pixel(Vec2(-1, 0)).is_empty());
        assert_eq!(plane.sample_count(Vec2(1, 0)), 0);
    }

    #[test]
    fn validation_errors() {
        let bounds = IntegerBounds::from_dimensions((2, 2));

        // wrong sample_counts length
        assert!(DeepPlane::new(bounds, alpha_depth(), vec![1, 0, 2], vec![0.0; 6]).is_err());

        // wrong value count
        assert!(DeepPlane::new(bounds, alpha_depth(), vec![1, 0, 2, 1], vec![0.0; 4]).is_err());
    }

    #[test]
    fn statistics() {
        let counts = vec![0, 5, 2, 0, 10, 1];
        let plane = DeepPlane::new(IntegerBounds::from_dimensions((3, 2)), ChannelSet::from(Channel::Alpha), counts, vec![0.0; 18]).unwrap();
        let stats = plane.statistics();

        assert_eq!(stats.pixel_count, 6);
        assert_eq!(stats.total_samples, 18);
        assert_eq!(stats.min_samples_per_pixel, 0);
        assert_eq!(stats.max_samples_per_pixel, 10);
        assert_eq!(stats.pixels_with_samples, 4);
        assert!((stats.average_samples_per_pixel - 3.0).abs() < 0.001);
    }

    #[test]
    fn crop_extends_and_selects_channels() {
        let channels = ChannelSet::new(vec![Channel::Red, Channel::Alpha, Channel::DeepFront]);
        let plane = DeepPlane::new(IntegerBounds::from_dimensions((2, 1)), channels, vec![1, 1], vec![
            0.5, 0.5, 1.0,
            0.2, 0.25, 2.0,
        ]).unwrap();

        let requested = ChannelSet::new(vec![Channel::Alpha, Channel::Green]);
        let cropped = plane.crop(IntegerBounds::new((1, 0), (2, 1)), &requested);

        assert_eq!(cropped.channels(), &ChannelSet::from(Channel::Alpha));
        assert_eq!(cropped.sample_count(Vec2(1, 0)), 1);
        assert_eq!(cropped.pixel(Vec2(1, 0)).unordered_sample(0, &Channel::Alpha), 0.25);
        assert_eq!(cropped.sample_count(Vec2(2, 0)), 0);
    }

    #[test]
    fn output_plane_checks_pixel_count() {
        let mut output = DeepOutputPlane::new(alpha_depth(), IntegerBounds::from_dimensions((2, 1)));

        let mut pixel = DeepOutPixel::new();
        pixel.push_sample(&[0.5, 1.0]);
        output.add_pixel(pixel).unwrap();

        let mut incomplete = DeepOutPixel::new();
        incomplete.push(0.5);
        assert!(output.add_pixel(incomplete).is_err());

        assert!(output.clone().into_plane().is_err());

        output.add_pixel(DeepOutPixel::new()).unwrap();
        assert!(output.add_pixel(DeepOutPixel::new()).is_err());

        let plane = output.into_plane().unwrap();
        assert_eq!(plane.sample_counts(), &[1, 0]);
    }
}
