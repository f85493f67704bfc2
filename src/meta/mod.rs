
//! Describes the meta data of a deep image:
//! where its pixels are, which channels its samples have, and its format.

pub mod bounds;
pub mod channel;
pub mod format;

use crate::error::UnitResult;
use self::bounds::IntegerBounds;
use self::channel::ChannelSet;
use self::format::Format;


/// Everything a downstream operator needs to know about a deep image
/// before requesting any of its pixels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeepInfo {

    /// The intended display area and pixel shape.
    pub format: Format,

    /// The region that contains any samples. Pixels outside are empty.
    pub bounds: IntegerBounds,

    /// The channels that samples of this image carry.
    pub channels: ChannelSet,
}

impl DeepInfo {

    /// Create deep info from its parts.
    pub fn new(format: Format, bounds: IntegerBounds, channels: ChannelSet) -> Self {
        Self { format, bounds, channels }
    }

    /// The info of a node without any connected input: no pixels, no channels.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Validate this instance.
    pub fn validate(&self) -> UnitResult {
        self.bounds.validate()?;
        self.format.validate()
    }
}
