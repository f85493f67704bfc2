
//! Mixing two deep images through a flat mask.
//!
//! Where the mask is zero, the output is input B. Where it is one, the output is input A.
//! Everywhere in between, both pixels are merged with the weights `1 - mask` and `mask`,
//! without discarding any sample.

use crate::error::{Error, Result, UnitResult};
use crate::image::deep::merge::{merge_deep_pixels, MergeOptions};
use crate::image::{DeepOutPixel, DeepOutputPlane, DeepPixel, DeepPlane};
use crate::math::Vec2;
use crate::meta::bounds::IntegerBounds;
use crate::meta::channel::{Channel, ChannelSet};
use crate::meta::DeepInfo;
use crate::ops::{required_deep_input, DeepOp, DeepSource, FlatSource, Input, InputKind, Request};


/// Which bounding box the mixed image has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoundsPolicy {

    /// The union of both inputs.
    #[default]
    Union,

    /// The bounding box of input B.
    B,

    /// The bounding box of input A.
    A,
}

/// Parameters of a deep keymix.
#[derive(Debug, Clone, PartialEq)]
pub struct KeymixOptions {

    /// The channel of the mask input that controls the mix.
    pub mask_channel: Channel,

    /// Use one minus the mask value.
    pub invert_mask: bool,

    /// Dissolve between B only at zero and the full keymix at one.
    pub mix: f32,

    /// Which bounding box the output has.
    pub bounds: BoundsPolicy,
}

impl Default for KeymixOptions {
    fn default() -> Self {
        KeymixOptions {
            mask_channel: Channel::Alpha,
            invert_mask: false,
            mix: 1.0,
            bounds: BoundsPolicy::Union,
        }
    }
}

impl KeymixOptions {

    /// Replace the mask channel.
    pub fn with_mask_channel(self, mask_channel: Channel) -> Self {
        KeymixOptions { mask_channel, .. self }
    }

    /// Use one minus the mask value.
    pub fn with_inverted_mask(self, invert_mask: bool) -> Self {
        KeymixOptions { invert_mask, .. self }
    }

    /// Replace the mix factor.
    pub fn with_mix(self, mix: f32) -> Self {
        KeymixOptions { mix, .. self }
    }

    /// Replace the bounding box policy.
    pub fn with_bounds(self, bounds: BoundsPolicy) -> Self {
        KeymixOptions { bounds, .. self }
    }

    /// Validate this instance.
    pub fn validate(&self) -> UnitResult {
        if !self.mix.is_finite() {
            return Err(Error::invalid("keymix mix factor must be finite"));
        }

        Ok(())
    }

    /// The weight of input A at a pixel.
    /// Without a mask, input B is used everywhere.
    fn mask_value(&self, mask: Option<&dyn FlatSource>, position: Vec2<i32>) -> f32 {
        let mask = match mask {
            Some(mask) => mask,
            None => return 0.0,
        };

        let value = mask.sample(position, &self.mask_channel).clamp(0.0, 1.0);
        let value = if self.invert_mask { 1.0 - value } else { value };
        value * self.mix
    }
}


/// Mixes input A over input B where the mask is set.
#[derive(Debug, Clone)]
pub struct DeepKeymix {
    options: KeymixOptions,
    inputs: [Input; 3],
}

impl DeepKeymix {

    /// Index of the background input.
    pub const B: usize = 0;

    /// Index of the foreground input.
    pub const A: usize = 1;

    /// Index of the flat mask input.
    pub const MASK: usize = 2;

    /// A keymix without connected inputs.
    pub fn new(options: KeymixOptions) -> Self {
        DeepKeymix { options, inputs: Default::default() }
    }

    /// The current parameters.
    pub fn options(&self) -> &KeymixOptions {
        &self.options
    }

    /// Replace the parameters. Affects all later requests.
    pub fn set_options(&mut self, options: KeymixOptions) {
        self.options = options;
    }
}

impl DeepSource for DeepKeymix {
    fn deep_info(&self) -> Result<DeepInfo> {
        let b = match self.inputs[Self::B].as_deep() {
            Some(b) => b.deep_info()?,
            None => return Ok(DeepInfo::empty()),
        };

        let a = match self.inputs[Self::A].as_deep() {
            Some(a) => a.deep_info()?,
            None => return Ok(b),
        };

        let bounds = match self.options.bounds {
            BoundsPolicy::Union => b.bounds.union(a.bounds),
            BoundsPolicy::B => b.bounds,
            BoundsPolicy::A => a.bounds,
        };

        Ok(DeepInfo::new(b.format, bounds, b.channels.union(&a.channels)))
    }

    fn fetch(&self, bounds: IntegerBounds, channels: &ChannelSet) -> Result<DeepPlane> {
        self.options.validate()?;

        let b = required_deep_input(&self.inputs, Self::B, self.class_name())?;
        let b_plane = b.fetch(bounds, &b.deep_info()?.channels)?;
        let mut output = DeepOutputPlane::new(channels.clone(), bounds);

        let a = match self.inputs[Self::A].as_deep() {
            Some(a) => a,
            None => {
                log::debug!("keymix of {:?} passes input B through, input A is not connected", bounds);

                for position in bounds.positions() {
                    output.add_pixel(copy_samples(&b_plane.pixel(position), channels))?;
                }

                return output.into_plane();
            },
        };

        let a_plane = a.fetch(bounds, &a.deep_info()?.channels)?;
        let mask = self.inputs[Self::MASK].as_flat();

        log::debug!("mixing {:?}, mask connected: {}", bounds, mask.is_some());

        for position in bounds.positions() {
            let mask_value = self.options.mask_value(mask, position);
            let b_pixel = b_plane.pixel(position);
            let a_pixel = a_plane.pixel(position);

            let pixel = if mask_value == 0.0 { copy_samples(&b_pixel, channels) }
                else if mask_value == 1.0 { copy_samples(&a_pixel, channels) }
                else {
                    let weights = [1.0 - mask_value, mask_value];
                    merge_deep_pixels(&[b_pixel, a_pixel], &weights, channels, MergeOptions::KEEP_ALL)?
                };

            output.add_pixel(pixel)?;
        }

        let output = output.into_plane()?;
        log::debug!("mixed {:?}: {:?}", bounds, output.statistics());
        Ok(output)
    }
}

impl DeepOp for DeepKeymix {
    fn class_name(&self) -> &'static str { "DeepKeymix" }
    fn minimum_inputs(&self) -> usize { 3 }
    fn maximum_inputs(&self) -> usize { 3 }

    fn input_label(&self, index: usize) -> &'static str {
        match index {
            Self::B => "B",
            Self::A => "A",
            Self::MASK => "mask",
            _ => "",
        }
    }

    fn test_input(&self, index: usize, kind: InputKind) -> bool {
        match index {
            Self::MASK => kind == InputKind::Flat,
            _ => kind == InputKind::Deep,
        }
    }

    fn inputs(&self) -> &[Input] { &self.inputs }
    fn inputs_mut(&mut self) -> &mut [Input] { &mut self.inputs }

    fn deep_requests(&self, bounds: IntegerBounds, _channels: &ChannelSet, count: usize) -> Result<Vec<Request>> {
        let mut requests = Vec::with_capacity(3);

        let b = match self.inputs[Self::B].as_deep() {
            Some(b) => b,
            None => return Ok(requests),
        };

        requests.push(Request { input: Self::B, bounds, channels: b.deep_info()?.channels, count });

        if let Some(a) = self.inputs[Self::A].as_deep() {
            requests.push(Request { input: Self::A, bounds, channels: a.deep_info()?.channels, count });

            if self.inputs[Self::MASK].as_flat().is_some() {
                let channels = ChannelSet::from(self.options.mask_channel.clone());
                requests.push(Request { input: Self::MASK, bounds, channels, count });
            }
        }

        Ok(requests)
    }
}

/// All samples of the pixel in storage order, with one value per output channel.
fn copy_samples(pixel: &DeepPixel<'_>, channels: &ChannelSet) -> DeepOutPixel {
    let mut output = DeepOutPixel::with_capacity(pixel.sample_count() * channels.len());

    for index in 0 .. pixel.sample_count() {
        for channel in channels {
            output.push(pixel.unordered_sample(index, channel));
        }
    }

    output
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::FlatImage;
    use crate::meta::format::Format;
    use crate::ops::source::DeepImage;

    fn channels() -> ChannelSet {
        ChannelSet::new(vec![Channel::Red, Channel::Alpha, Channel::DeepFront])
    }

    fn single_pixel(samples: &[f32]) -> DeepImage {
        let bounds = IntegerBounds::from_dimensions((1, 1));
        let count = (samples.len() / 3) as u32;
        let plane = DeepPlane::new(bounds, channels(), vec![count], samples.to_vec()).unwrap();
        DeepImage::new(Format::square_pixels((1, 1)), plane)
    }

    fn keymix(mask: f32, options: KeymixOptions) -> DeepKeymix {
        let mut keymix = DeepKeymix::new(options);
        keymix.set_input(DeepKeymix::B, Input::deep(single_pixel(&[0.2, 1.0, 5.0, 0.1, 0.5, 2.0]))).unwrap();
        keymix.set_input(DeepKeymix::A, Input::deep(single_pixel(&[0.8, 1.0, 5.0]))).unwrap();

        let mask = FlatImage::from_fn(IntegerBounds::from_dimensions((1, 1)), Channel::Alpha, |_| mask);
        keymix.set_input(DeepKeymix::MASK, Input::flat(mask)).unwrap();
        keymix
    }

    fn values(keymix: &DeepKeymix) -> Vec<f32> {
        let plane = keymix.fetch(IntegerBounds::from_dimensions((1, 1)), &channels()).unwrap();
        let pixel = plane.pixel(Vec2(0, 0));
        (0 .. pixel.sample_count()).flat_map(|index| pixel.unordered_values(index).to_vec()).collect()
    }

    #[test]
    fn boundary_mask_values_copy_inputs() {
        // storage order is kept, not depth order
        assert_eq!(values(&keymix(0.0, KeymixOptions::default())), vec![0.2, 1.0, 5.0, 0.1, 0.5, 2.0]);
        assert_eq!(values(&keymix(1.0, KeymixOptions::default())), vec![0.8, 1.0, 5.0]);

        let inverted = KeymixOptions::default().with_inverted_mask(true);
        assert_eq!(values(&keymix(1.0, inverted)), vec![0.2, 1.0, 5.0, 0.1, 0.5, 2.0]);

        let no_mix = KeymixOptions::default().with_mix(0.0);
        assert_eq!(values(&keymix(1.0, no_mix)), vec![0.2, 1.0, 5.0, 0.1, 0.5, 2.0]);
    }

    #[test]
    fn intermediate_mask_keeps_all_samples() {
        let plane = keymix(0.5, KeymixOptions::default())
            .fetch(IntegerBounds::from_dimensions((1, 1)), &channels()).unwrap();

        // two samples of B and one of A, none dropped
        assert_eq!(plane.total_sample_count(), 3);
    }

    #[test]
    fn bounds_and_channels() {
        let mut keymix = DeepKeymix::new(KeymixOptions::default());
        assert_eq!(keymix.deep_info().unwrap(), DeepInfo::empty());

        let wide = DeepPlane::empty(IntegerBounds::new((-5, 0), (2, 1)), ChannelSet::from(Channel::named("Z2")));
        keymix.set_input(DeepKeymix::B, Input::deep(single_pixel(&[]))).unwrap();
        keymix.set_input(DeepKeymix::A, Input::deep(DeepImage::new(Format::square_pixels((1, 1)), wide))).unwrap();

        let info = keymix.deep_info().unwrap();
        assert_eq!(info.bounds, IntegerBounds::new((-5, 0), (6, 1)));
        assert_eq!(info.channels.len(), 4);

        keymix.set_options(KeymixOptions::default().with_bounds(BoundsPolicy::A));
        assert_eq!(keymix.deep_info().unwrap().bounds, IntegerBounds::new((-5, 0), (2, 1)));
    }

    #[test]
    fn requests_per_input() {
        let keymix = keymix(0.5, KeymixOptions::default());
        let requests = keymix.deep_requests(IntegerBounds::from_dimensions((1, 1)), &channels(), 1).unwrap();

        let inputs: Vec<usize> = requests.iter().map(|request| request.input).collect();
        assert_eq!(inputs, vec![DeepKeymix::B, DeepKeymix::A, DeepKeymix::MASK]);
        assert_eq!(requests[2].channels, ChannelSet::from(Channel::Alpha));
    }

    #[test]
    fn mask_must_be_flat() {
        let mut keymix = DeepKeymix::new(KeymixOptions::default());
        assert!(keymix.set_input(DeepKeymix::MASK, Input::deep(single_pixel(&[]))).is_err());
        assert_eq!(keymix.input_label(DeepKeymix::MASK), "mask");
    }
}
