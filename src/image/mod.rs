
//! Storage for deep and flat images.
//! A deep plane holds a variable number of samples per pixel,
//! and pixel views provide depth-ordered access to these samples.

pub mod pixel;
pub mod plane;
pub mod flat;
pub mod deep;

pub use pixel::{DeepPixel, DeepOutPixel};
pub use plane::{DeepPlane, DeepOutputPlane, DeepSampleStatistics};
pub use flat::FlatImage;
