
//! Resizing deep images to another format, into a box, or by a scale factor.
//!
//! Each output pixel merges the input pixels below its cubic filter footprint.

use crate::error::{Error, Result, UnitResult};
use crate::image::deep::merge::{merge_deep_pixels, MergeOptions};
use crate::image::deep::resample::{ResampleGeometry, ResizeMode, ResizeType};
use crate::image::{DeepOutputPlane, DeepPixel, DeepPlane};
use crate::math::Vec2;
use crate::meta::bounds::IntegerBounds;
use crate::meta::channel::ChannelSet;
use crate::meta::format::Format;
use crate::meta::DeepInfo;
use crate::ops::{merge_input_channels, required_deep_input, DeepOp, DeepSource, Input, InputKind, Request};
use smallvec::SmallVec;


/// Parameters of a deep reformat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReformatOptions {

    /// How the output format is determined.
    pub mode: ResizeMode,

    /// Which direction controls the scale factor.
    pub resize: ResizeType,

    /// Align the image centers. Otherwise, the lower left corners are aligned.
    pub center: bool,

    /// Keep pixels outside the output format instead of clipping them.
    pub preserve_bounds: bool,

    /// Which samples the merge may discard.
    pub merge: MergeOptions,
}

impl ReformatOptions {

    fn with_mode(mode: ResizeMode) -> Self {
        ReformatOptions {
            mode,
            resize: ResizeType::Width,
            center: true,
            preserve_bounds: false,
            merge: MergeOptions::default(),
        }
    }

    /// Convert the image area of the input to the specified format.
    pub fn to_format(format: Format) -> Self {
        Self::with_mode(ResizeMode::ToFormat(format))
    }

    /// Scale into a box of the specified size, with square pixels.
    /// Unless `with_fixed_box` is used, only the width of the box is used.
    pub fn to_box(width: usize, height: usize) -> Self {
        Self::with_mode(ResizeMode::ToBox { size: Vec2(width, height), fixed: false, pixel_aspect: 1.0 })
    }

    /// Scale the image by a factor per axis.
    pub fn scale(x: f64, y: f64) -> Self {
        Self::with_mode(ResizeMode::Scale(Vec2(x, y)))
    }

    /// Force the output to have exactly the shape of the box. Has no effect on other modes.
    pub fn with_fixed_box(self, fixed: bool) -> Self {
        match self.mode {
            ResizeMode::ToBox { size, pixel_aspect, .. } =>
                ReformatOptions { mode: ResizeMode::ToBox { size, fixed, pixel_aspect }, .. self },

            _ => self,
        }
    }

    /// The pixel aspect ratio of the box. Has no effect on other modes.
    pub fn with_box_pixel_aspect(self, pixel_aspect: f64) -> Self {
        match self.mode {
            ResizeMode::ToBox { size, fixed, .. } =>
                ReformatOptions { mode: ResizeMode::ToBox { size, fixed, pixel_aspect }, .. self },

            _ => self,
        }
    }

    /// Replace the resize type.
    pub fn with_resize(self, resize: ResizeType) -> Self {
        ReformatOptions { resize, .. self }
    }

    /// Align the centers or the lower left corners.
    pub fn with_center(self, center: bool) -> Self {
        ReformatOptions { center, .. self }
    }

    /// Keep or clip pixels outside the output format.
    pub fn with_preserve_bounds(self, preserve_bounds: bool) -> Self {
        ReformatOptions { preserve_bounds, .. self }
    }

    /// Replace the merge options.
    pub fn with_merge(self, merge: MergeOptions) -> Self {
        ReformatOptions { merge, .. self }
    }

    /// Validate this instance.
    pub fn validate(&self) -> UnitResult {
        match self.mode {
            ResizeMode::ToFormat(format) => format.validate()?,

            ResizeMode::ToBox { pixel_aspect, .. } => {
                if !(pixel_aspect.is_finite() && pixel_aspect > 0.0) {
                    return Err(Error::invalid("box pixel aspect ratio must be positive"));
                }
            },

            ResizeMode::Scale(Vec2(x, y)) => {
                if !(x.is_finite() && y.is_finite()) {
                    return Err(Error::invalid("scale must be finite"));
                }
            },
        }

        self.merge.validate()
    }

    /// The resample geometry for an input of the specified format.
    pub fn geometry(&self, input_format: Format) -> ResampleGeometry {
        ResampleGeometry::compute(input_format, self.mode, self.resize, self.center)
    }
}


/// Resizes a deep input.
#[derive(Debug, Clone)]
pub struct DeepReformat {
    options: ReformatOptions,
    inputs: [Input; 1],
}

impl DeepReformat {

    /// A reformat without a connected input.
    pub fn new(options: ReformatOptions) -> Self {
        DeepReformat { options, inputs: Default::default() }
    }

    /// A reformat of the specified source.
    pub fn with_source(source: impl DeepSource + 'static, options: ReformatOptions) -> Self {
        DeepReformat { options, inputs: [Input::deep(source)] }
    }

    /// The current parameters.
    pub fn options(&self) -> &ReformatOptions {
        &self.options
    }

    /// Replace the parameters. Affects all later requests.
    pub fn set_options(&mut self, options: ReformatOptions) {
        self.options = options;
    }
}

impl DeepSource for DeepReformat {
    fn deep_info(&self) -> Result<DeepInfo> {
        let input = match self.inputs[0].as_deep() {
            Some(input) => input.deep_info()?,
            None => return Ok(DeepInfo::empty()),
        };

        let geometry = self.options.geometry(input.format);
        let bounds = geometry.output_bounds(input.bounds, self.options.preserve_bounds);

        Ok(DeepInfo::new(geometry.output_format(), bounds, input.channels))
    }

    fn fetch(&self, bounds: IntegerBounds, channels: &ChannelSet) -> Result<DeepPlane> {
        self.options.validate()?;

        let input = required_deep_input(&self.inputs, 0, self.class_name())?;
        let geometry = self.options.geometry(input.deep_info()?.format);
        let request = geometry.input_request(bounds);

        log::debug!(
            "reformatting {:?} from {:?} with scale factor {:?}",
            bounds, request, geometry.scale_factor()
        );

        let plane = input.fetch(request, &merge_input_channels(channels))?;
        let mut output = DeepOutputPlane::new(channels.clone(), bounds);

        let mut pixels: Vec<DeepPixel<'_>> = Vec::new();
        let mut weights: SmallVec<[f32; 16]> = SmallVec::new();

        for position in bounds.positions() {
            let footprint = geometry.footprint(position);

            pixels.clear();
            weights.clear();

            for &(input_position, weight) in &footprint {
                pixels.push(plane.pixel(input_position));
                weights.push(weight);
            }

            let merged = merge_deep_pixels(&pixels, &weights, channels, self.options.merge)?;
            output.add_pixel(merged)?;
        }

        let output = output.into_plane()?;
        log::debug!("reformatted {:?}: {:?}", bounds, output.statistics());
        Ok(output)
    }
}

impl DeepOp for DeepReformat {
    fn class_name(&self) -> &'static str { "DeepReformat" }
    fn minimum_inputs(&self) -> usize { 1 }
    fn maximum_inputs(&self) -> usize { 1 }

    fn test_input(&self, _index: usize, kind: InputKind) -> bool {
        kind == InputKind::Deep
    }

    fn inputs(&self) -> &[Input] { &self.inputs }
    fn inputs_mut(&mut self) -> &mut [Input] { &mut self.inputs }

    fn deep_requests(&self, bounds: IntegerBounds, channels: &ChannelSet, count: usize) -> Result<Vec<Request>> {
        let input = match self.inputs[0].as_deep() {
            Some(input) => input,
            None => return Ok(Vec::new()),
        };

        let geometry = self.options.geometry(input.deep_info()?.format);

        Ok(vec![ Request {
            input: 0,
            bounds: geometry.input_request(bounds),
            channels: merge_input_channels(channels),
            count,
        } ])
    }
}
