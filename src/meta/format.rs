
//! Image formats: the resolution and pixel shape of an image area.

use crate::error::{Error, UnitResult};
use crate::math::Vec2;
use crate::meta::bounds::IntegerBounds;


/// The image area an image is intended to be displayed in,
/// starting at the origin, together with the shape of its pixels.
/// Pixels outside of the format may still carry data (the bounding box may be larger).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Format {

    /// Width and height of the image area in pixels.
    pub size: Vec2<usize>,

    /// Width of a pixel divided by its height.
    pub pixel_aspect: f64,
}

impl Format {

    /// Create a format with the specified resolution and pixel aspect ratio.
    pub fn new(size: impl Into<Vec2<usize>>, pixel_aspect: f64) -> Self {
        Self { size: size.into(), pixel_aspect }
    }

    /// Create a format with square pixels.
    pub fn square_pixels(size: impl Into<Vec2<usize>>) -> Self {
        Self::new(size, 1.0)
    }

    /// The image area as integer bounds.
    pub fn bounds(&self) -> IntegerBounds {
        IntegerBounds::from_dimensions(self.size)
    }

    /// The integer center of the image area, rounded down.
    pub fn center(&self) -> Vec2<f64> {
        self.size.map(|size| (size / 2) as f64)
    }

    /// The exact center of the image area, half of the size.
    pub fn area_center(&self) -> Vec2<f64> {
        self.size.map(|size| size as f64 * 0.5)
    }

    /// Validate this instance.
    pub fn validate(&self) -> UnitResult {
        if !(self.pixel_aspect.is_finite() && self.pixel_aspect > 0.0) {
            return Err(Error::invalid("pixel aspect ratio must be positive"));
        }

        self.bounds().validate()
    }
}

impl Default for Format {
    fn default() -> Self {
        Self::square_pixels(Vec2(0, 0))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_is_rounded_down() {
        assert_eq!(Format::square_pixels((1920, 1080)).center(), Vec2(960.0, 540.0));
        assert_eq!(Format::square_pixels((5, 3)).center(), Vec2(2.0, 1.0));
        assert_eq!(Format::square_pixels((5, 3)).area_center(), Vec2(2.5, 1.5));
    }

    #[test]
    fn invalid_pixel_aspect() {
        assert!(Format::new((10, 10), 0.0).validate().is_err());
        assert!(Format::new((10, 10), 2.0).validate().is_ok());
    }
}
