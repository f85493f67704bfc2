
//! Flat images: one value per channel and pixel.
//! Used as mask inputs and as the result of flattening deep planes.

use crate::error::{Error, Result};
use crate::math::Vec2;
use crate::meta::bounds::IntegerBounds;
use crate::meta::channel::{Channel, ChannelSet};


/// A flat image with planar storage: all values of the first channel,
/// then all values of the second channel, and so on, each in scan order.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatImage {
    bounds: IntegerBounds,
    channels: ChannelSet,
    values: Vec<f32>,
}

impl FlatImage {

    /// A black image, all values are zero.
    pub fn new(bounds: IntegerBounds, channels: ChannelSet) -> Self {
        let values = vec![0.0; bounds.area() * channels.len()];
        Self { bounds, channels, values }
    }

    /// Create an image from planar values.
    /// Returns an error if the number of values does not match bounds and channels.
    pub fn from_planar_values(bounds: IntegerBounds, channels: ChannelSet, values: Vec<f32>) -> Result<Self> {
        if values.len() != bounds.area() * channels.len() {
            return Err(Error::invalid(format!(
                "{} flat values don't match {} pixels with {} channels",
                values.len(), bounds.area(), channels.len()
            )));
        }

        Ok(Self { bounds, channels, values })
    }

    /// Create a single channel image by evaluating a function for each pixel.
    pub fn from_fn(bounds: IntegerBounds, channel: Channel, value: impl Fn(Vec2<i32>) -> f32) -> Self {
        let values = bounds.positions().map(value).collect();
        Self { bounds, channels: ChannelSet::from(channel), values }
    }

    /// The region containing pixel values. Everything outside is zero.
    pub fn bounds(&self) -> IntegerBounds {
        self.bounds
    }

    /// The channels of this image.
    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    fn value_index(&self, position: Vec2<i32>, channel: &Channel) -> Option<usize> {
        let channel = self.channels.index_of(channel)?;
        let pixel = self.bounds.index_of(position)?;
        Some(channel * self.bounds.area() + pixel)
    }

    /// The value of a channel at a pixel.
    /// Pixels outside the bounds and channels not in this image read as zero.
    pub fn get(&self, position: Vec2<i32>, channel: &Channel) -> f32 {
        self.value_index(position, channel).map_or(0.0, |index| self.values[index])
    }

    /// Overwrite the value of a channel at a pixel.
    /// Has no effect outside the bounds or for channels not in this image.
    pub fn set(&mut self, position: Vec2<i32>, channel: &Channel, value: f32) {
        if let Some(index) = self.value_index(position, channel) {
            self.values[index] = value;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outside_reads_zero() {
        let image = FlatImage::from_fn(IntegerBounds::new((1, 1), (2, 2)), Channel::Alpha, |position| position.x() as f32);

        assert_eq!(image.get(Vec2(2, 2), &Channel::Alpha), 2.0);
        assert_eq!(image.get(Vec2(0, 0), &Channel::Alpha), 0.0);
        assert_eq!(image.get(Vec2(1, 1), &Channel::Red), 0.0);
    }

    #[test]
    fn planar_layout() {
        let channels = ChannelSet::new(vec![Channel::Red, Channel::Alpha]);
        let image = FlatImage::from_planar_values(IntegerBounds::from_dimensions((2, 1)), channels.clone(), vec![1.0, 2.0, 3.0, 4.0]).unwrap();

        assert_eq!(image.get(Vec2(1, 0), &Channel::Red), 2.0);
        assert_eq!(image.get(Vec2(0, 0), &Channel::Alpha), 3.0);
        assert!(FlatImage::from_planar_values(IntegerBounds::from_dimensions((2, 1)), channels, vec![1.0]).is_err());
    }
}
