
//! An in-memory deep image, the leaf of every operator graph.

use crate::error::Result;
use crate::image::DeepPlane;
use crate::meta::bounds::IntegerBounds;
use crate::meta::channel::ChannelSet;
use crate::meta::format::Format;
use crate::meta::DeepInfo;
use crate::ops::DeepSource;


/// A deep plane that is already computed, together with its format.
#[derive(Debug, Clone, PartialEq)]
pub struct DeepImage {
    format: Format,
    plane: DeepPlane,
}

impl DeepImage {

    /// Wrap a deep plane. Its bounds become the bounding box of the image.
    pub fn new(format: Format, plane: DeepPlane) -> Self {
        Self { format, plane }
    }

    /// An image without any pixels or channels.
    pub fn empty() -> Self {
        Self::new(Format::default(), DeepPlane::empty(IntegerBounds::zero(), ChannelSet::empty()))
    }

    /// The stored samples.
    pub fn plane(&self) -> &DeepPlane {
        &self.plane
    }

    /// The format of the image.
    pub fn format(&self) -> Format {
        self.format
    }
}

impl DeepSource for DeepImage {
    fn deep_info(&self) -> Result<DeepInfo> {
        Ok(DeepInfo::new(self.format, self.plane.bounds(), self.plane.channels().clone()))
    }

    fn fetch(&self, bounds: IntegerBounds, channels: &ChannelSet) -> Result<DeepPlane> {
        Ok(self.plane.crop(bounds, channels))
    }
}
