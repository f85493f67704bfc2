
//! Deep operators and the interface through which they talk to their inputs.
//!
//! Every operator is itself a `DeepSource`, so operators can be chained into graphs.
//! A host first asks for `deep_info` (validation), optionally collects the `deep_requests`
//! to prepare its caches, and then calls `fetch` for each region it needs (the engine).

pub mod source;
pub mod blur;
pub mod keymix;
pub mod reformat;

use crate::error::{Error, Result, UnitResult};
use crate::image::{DeepPlane, FlatImage};
use crate::math::Vec2;
use crate::meta::bounds::IntegerBounds;
use crate::meta::channel::{Channel, ChannelSet};
use crate::meta::DeepInfo;
use std::fmt;
use std::sync::Arc;


/// Anything that produces deep pixels on request.
pub trait DeepSource: Send + Sync {

    /// Describe the image without computing any pixels.
    fn deep_info(&self) -> Result<DeepInfo>;

    /// Compute the samples of all pixels inside the region, for the requested channels.
    /// Pixels outside the bounds of the image are empty.
    fn fetch(&self, bounds: IntegerBounds, channels: &ChannelSet) -> Result<DeepPlane>;
}

/// Anything that produces flat pixel values, used as masks.
pub trait FlatSource: Send + Sync {

    /// The region containing pixel values.
    fn bounds(&self) -> IntegerBounds;

    /// The channels of this image.
    fn channels(&self) -> &ChannelSet;

    /// The value of a channel at a pixel, clamped to the range from zero to one.
    fn sample(&self, position: Vec2<i32>, channel: &Channel) -> f32;
}

impl FlatSource for FlatImage {
    fn bounds(&self) -> IntegerBounds { FlatImage::bounds(self) }
    fn channels(&self) -> &ChannelSet { FlatImage::channels(self) }

    fn sample(&self, position: Vec2<i32>, channel: &Channel) -> f32 {
        self.get(position, channel).clamp(0.0, 1.0)
    }
}


/// What kind of source is connected to an input slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Deep,
    Flat,
    Absent,
}

/// A connection to an input slot of an operator.
#[derive(Clone, Default)]
pub enum Input {
    Deep(Arc<dyn DeepSource>),
    Flat(Arc<dyn FlatSource>),

    #[default]
    Absent,
}

impl Input {

    /// Connect a deep source.
    pub fn deep(source: impl DeepSource + 'static) -> Self {
        Input::Deep(Arc::new(source))
    }

    /// Connect a flat source.
    pub fn flat(source: impl FlatSource + 'static) -> Self {
        Input::Flat(Arc::new(source))
    }

    /// The capability of the connected source.
    pub fn kind(&self) -> InputKind {
        match self {
            Input::Deep(_) => InputKind::Deep,
            Input::Flat(_) => InputKind::Flat,
            Input::Absent => InputKind::Absent,
        }
    }

    /// The connected deep source, if any.
    pub fn as_deep(&self) -> Option<&dyn DeepSource> {
        match self {
            Input::Deep(source) => Some(source.as_ref()),
            _ => None,
        }
    }

    /// The connected flat source, if any.
    pub fn as_flat(&self) -> Option<&dyn FlatSource> {
        match self {
            Input::Flat(source) => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "Input::{:?}", self.kind())
    }
}

impl From<Arc<dyn DeepSource>> for Input {
    fn from(source: Arc<dyn DeepSource>) -> Self { Input::Deep(source) }
}

impl From<Arc<dyn FlatSource>> for Input {
    fn from(source: Arc<dyn FlatSource>) -> Self { Input::Flat(source) }
}


/// The data an operator needs from one of its inputs
/// in order to compute a region.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {

    /// Index of the input slot.
    pub input: usize,

    /// The region needed from that input.
    pub bounds: IntegerBounds,

    /// The channels needed from that input.
    pub channels: ChannelSet,

    /// How often the region will be requested.
    pub count: usize,
}


/// An operator with input slots, as seen by the host.
pub trait DeepOp: DeepSource {

    /// The name of the operator type.
    fn class_name(&self) -> &'static str;

    /// Inputs below this index must be connected.
    fn minimum_inputs(&self) -> usize;

    /// The number of input slots.
    fn maximum_inputs(&self) -> usize;

    /// A short name of the input slot.
    fn input_label(&self, _index: usize) -> &'static str { "" }

    /// Whether a source of this kind may be connected to the input slot.
    fn test_input(&self, index: usize, kind: InputKind) -> bool;

    /// All input slots.
    fn inputs(&self) -> &[Input];

    /// All input slots, for connecting sources. Use `set_input` instead,
    /// which checks the kind of the source.
    fn inputs_mut(&mut self) -> &mut [Input];

    /// Which regions of which inputs the engine will fetch
    /// in order to compute the specified output region.
    fn deep_requests(&self, bounds: IntegerBounds, channels: &ChannelSet, count: usize) -> Result<Vec<Request>>;

    /// Connect a source to an input slot, or disconnect it with `Input::Absent`.
    /// Returns an error if the slot does not exist or does not accept this kind of source.
    fn set_input(&mut self, index: usize, input: Input) -> UnitResult {
        if index >= self.maximum_inputs() {
            return Err(Error::invalid(format!("{} has no input {}", self.class_name(), index)));
        }

        let kind = input.kind();
        if kind != InputKind::Absent && !self.test_input(index, kind) {
            return Err(Error::invalid(format!(
                "input {} of {} does not accept {:?} sources", index, self.class_name(), kind
            )));
        }

        self.inputs_mut()[index] = input;
        Ok(())
    }

    /// The source connected to an input slot.
    fn input(&self, index: usize) -> &Input {
        self.inputs().get(index).unwrap_or(&ABSENT)
    }
}

static ABSENT: Input = Input::Absent;

/// The deep source connected to a required input,
/// or an upstream error if nothing is connected.
pub(crate) fn required_deep_input<'i>(inputs: &'i [Input], index: usize, class_name: &str) -> Result<&'i dyn DeepSource> {
    inputs.get(index)
        .and_then(Input::as_deep)
        .ok_or_else(|| Error::upstream(format!("{} requires a deep source at input {}", class_name, index)))
}

/// The requested channels plus alpha and depth, which merging needs
/// to order and weigh the samples even if they are not part of the output.
pub(crate) fn merge_input_channels(channels: &ChannelSet) -> ChannelSet {
    let mut input_channels = channels.clone();
    input_channels.insert(Channel::Alpha);
    input_channels.insert(Channel::DeepFront);
    input_channels.insert(Channel::DeepBack);
    input_channels
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::blur::{BlurOptions, DeepBlur};
    use crate::ops::source::DeepImage;

    #[test]
    fn input_kinds_are_checked_once() {
        let mut blur = DeepBlur::new(BlurOptions::default());
        let mask = FlatImage::new(IntegerBounds::from_dimensions((2, 2)), ChannelSet::from(Channel::Alpha));

        assert!(blur.set_input(0, Input::flat(mask)).is_err());
        assert!(blur.set_input(1, Input::deep(DeepImage::empty())).is_err());
        assert!(blur.set_input(0, Input::deep(DeepImage::empty())).is_ok());

        assert_eq!(blur.input(0).kind(), InputKind::Deep);
        assert_eq!(blur.input(7).kind(), InputKind::Absent);

        blur.set_input(0, Input::Absent).unwrap();
        assert_eq!(blur.input(0).kind(), InputKind::Absent);
    }

    #[test]
    fn missing_required_input_is_an_upstream_error() {
        let inputs = [Input::Absent];
        match required_deep_input(&inputs, 0, "Test") {
            Err(Error::Upstream(_)) => {},
            _ => panic!("expected an upstream error"),
        }
    }

    #[test]
    fn merge_inputs_always_have_alpha_and_depth() {
        let color = ChannelSet::new(vec![Channel::Red, Channel::named("mask")]);
        let expected = ChannelSet::new(vec![
            Channel::Red, Channel::Alpha, Channel::DeepFront, Channel::DeepBack, Channel::named("mask"),
        ]);

        assert_eq!(merge_input_channels(&color), expected);
        assert_eq!(merge_input_channels(&expected), expected);
    }

    #[test]
    fn flat_samples_are_clamped() {
        let mask = FlatImage::from_fn(IntegerBounds::from_dimensions((2, 1)), Channel::Alpha, |position| position.x() as f32 * 3.0 - 1.0);
        assert_eq!(FlatSource::sample(&mask, Vec2(0, 0), &Channel::Alpha), 0.0);
        assert_eq!(FlatSource::sample(&mask, Vec2(1, 0), &Channel::Alpha), 1.0);
    }
}
