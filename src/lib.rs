
//! Deep image compositing operators.
//!
//! Deep images store a variable number of depth-sorted samples per pixel.
//! This crate merges weighted deep pixels in depth order,
//! which is the basis of the blur, keymix and reformat operators in `ops`.

#![forbid(unsafe_code)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused_extern_crates,
    unused,
    missing_debug_implementations,
    clippy::all,
)]

pub mod math;
pub mod meta;
pub mod image;
pub mod ops;
pub mod error;


/// Re-exports of all the types needed for composing deep operators.
pub mod prelude {

    // main exports
    pub use crate::ops::{DeepSource, FlatSource, DeepOp, Input, InputKind, Request};
    pub use crate::ops::source::DeepImage;
    pub use crate::ops::blur::{DeepBlur, BlurOptions};
    pub use crate::ops::keymix::{DeepKeymix, KeymixOptions, BoundsPolicy};
    pub use crate::ops::reformat::{DeepReformat, ReformatOptions};

    // core data types
    pub use crate::image::{DeepPixel, DeepOutPixel, DeepPlane, DeepOutputPlane, FlatImage};
    pub use crate::image::deep::merge::{merge_deep_pixels, MergeOptions};
    pub use crate::image::deep::resample::{ResizeMode, ResizeType};

    // secondary data types
    pub use crate::meta::{DeepInfo, bounds::IntegerBounds, format::Format};
    pub use crate::meta::channel::{Channel, ChannelSet};
    pub use crate::math::Vec2;
    pub use crate::error::{Error, Result, UnitResult};
}
