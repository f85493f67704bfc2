
//! Gaussian blur of deep images.
//!
//! Each output pixel merges all input pixels below the kernel,
//! weighted by the gaussian, keeping every sample at its own depth.
//! The number of samples grows quickly with the blur size.

use crate::error::{Error, Result, UnitResult};
use crate::image::deep::gaussian::{GaussianKernel, MAX_KERNEL_WEIGHTS};
use crate::image::deep::merge::{merge_deep_pixels, MergeOptions};
use crate::image::{DeepOutputPlane, DeepPixel, DeepPlane};
use crate::math::Vec2;
use crate::meta::bounds::IntegerBounds;
use crate::meta::channel::ChannelSet;
use crate::meta::DeepInfo;
use crate::ops::{merge_input_channels, required_deep_input, DeepOp, DeepSource, Input, InputKind, Request};


/// Parameters of a deep blur.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlurOptions {

    /// Blur size per axis, in pixels.
    pub size: Vec2<f32>,

    /// Which samples the merge may discard.
    pub merge: MergeOptions,
}

impl Default for BlurOptions {
    fn default() -> Self {
        BlurOptions { size: Vec2(0.0, 0.0), merge: MergeOptions::default() }
    }
}

impl BlurOptions {

    /// Blur with the specified size and the default merge options.
    pub fn new(size: impl Into<Vec2<f32>>) -> Self {
        BlurOptions { size: size.into(), .. Self::default() }
    }

    /// Replace the merge options.
    pub fn with_merge(self, merge: MergeOptions) -> Self {
        BlurOptions { merge, .. self }
    }

    /// Validate this instance.
    pub fn validate(&self) -> UnitResult {
        let Vec2(x, y) = self.size;

        if !(x.is_finite() && y.is_finite() && x >= 0.0 && y >= 0.0) {
            return Err(Error::invalid(format!("blur size {:?} must be finite and not negative", self.size)));
        }

        let radius = GaussianKernel::radius_for_blur_size(self.size);
        let fits = GaussianKernel::weight_count(radius).is_some_and(|count| count <= MAX_KERNEL_WEIGHTS);

        if !fits {
            return Err(Error::invalid(format!("blur size {:?} is too large", self.size)));
        }

        self.merge.validate()
    }
}


/// Blurs a deep input with a gaussian kernel.
#[derive(Debug, Clone)]
pub struct DeepBlur {
    options: BlurOptions,
    inputs: [Input; 1],
}

impl DeepBlur {

    /// A blur without a connected input.
    pub fn new(options: BlurOptions) -> Self {
        DeepBlur { options, inputs: Default::default() }
    }

    /// A blur of the specified source.
    pub fn with_source(source: impl DeepSource + 'static, options: BlurOptions) -> Self {
        DeepBlur { options, inputs: [Input::deep(source)] }
    }

    /// The current parameters.
    pub fn options(&self) -> &BlurOptions {
        &self.options
    }

    /// Replace the parameters. Affects all later requests.
    pub fn set_options(&mut self, options: BlurOptions) {
        self.options = options;
    }

    fn kernel(&self) -> GaussianKernel {
        GaussianKernel::from_blur_size(self.options.size)
    }

    fn request_bounds(kernel: &GaussianKernel, bounds: IntegerBounds) -> IntegerBounds {
        bounds.dilate(kernel.radius().map(|radius| i32::try_from(radius).unwrap_or(i32::MAX / 2)))
    }
}

impl DeepSource for DeepBlur {

    /// The bounding box is not grown by the kernel.
    fn deep_info(&self) -> Result<DeepInfo> {
        match self.inputs[0].as_deep() {
            Some(input) => input.deep_info(),
            None => Ok(DeepInfo::empty()),
        }
    }

    fn fetch(&self, bounds: IntegerBounds, channels: &ChannelSet) -> Result<DeepPlane> {
        self.options.validate()?;

        let input = required_deep_input(&self.inputs, 0, self.class_name())?;
        let kernel = self.kernel();
        let request = Self::request_bounds(&kernel, bounds);

        log::debug!(
            "blurring {:?} from {:?} with a kernel of {:?} pixels",
            bounds, request, kernel.dimensions()
        );

        let plane = input.fetch(request, &merge_input_channels(channels))?;
        let mut output = DeepOutputPlane::new(channels.clone(), bounds);
        let mut pixels: Vec<DeepPixel<'_>> = Vec::with_capacity(kernel.weights().len());

        for position in bounds.positions() {
            pixels.clear();
            pixels.extend(kernel.offsets().map(|offset| plane.pixel(position + offset)));

            let merged = merge_deep_pixels(&pixels, kernel.weights(), channels, self.options.merge)?;
            output.add_pixel(merged)?;
        }

        let output = output.into_plane()?;
        log::debug!("blurred {:?}: {:?}", bounds, output.statistics());
        Ok(output)
    }
}

impl DeepOp for DeepBlur {
    fn class_name(&self) -> &'static str { "DeepBlur" }
    fn minimum_inputs(&self) -> usize { 1 }
    fn maximum_inputs(&self) -> usize { 1 }

    fn test_input(&self, _index: usize, kind: InputKind) -> bool {
        kind == InputKind::Deep
    }

    fn inputs(&self) -> &[Input] { &self.inputs }
    fn inputs_mut(&mut self) -> &mut [Input] { &mut self.inputs }

    fn deep_requests(&self, bounds: IntegerBounds, channels: &ChannelSet, count: usize) -> Result<Vec<Request>> {
        if self.inputs[0].as_deep().is_none() {
            return Ok(Vec::new());
        }

        self.options.validate()?;

        Ok(vec![ Request {
            input: 0,
            bounds: Self::request_bounds(&self.kernel(), bounds),
            channels: merge_input_channels(channels),
            count,
        } ])
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::image::deep::compositing::composite_front_to_back;
    use crate::meta::channel::Channel;
    use crate::meta::format::Format;
    use crate::ops::source::DeepImage;

    fn channels() -> ChannelSet {
        ChannelSet::new(vec![Channel::Red, Channel::Alpha, Channel::DeepFront, Channel::DeepBack])
    }

    /// A single opaque sample at the origin of an otherwise empty 5×5 image.
    fn dot() -> DeepImage {
        let bounds = IntegerBounds::new((-2, -2), (5, 5));
        let mut counts = vec![0; 25];
        counts[12] = 1;

        let plane = DeepPlane::new(bounds, channels(), counts, vec![1.0, 1.0, 10.0, 10.0]).unwrap();
        DeepImage::new(Format::square_pixels((5, 5)), plane)
    }

    #[test]
    fn zero_size_reproduces_input() {
        let blur = DeepBlur::with_source(dot(), BlurOptions::default());
        let bounds = IntegerBounds::new((-2, -2), (5, 5));
        let output = blur.fetch(bounds, &channels()).unwrap();

        assert_eq!(output, dot().plane().clone());
    }

    #[test]
    fn blur_spreads_coverage() {
        let blur = DeepBlur::with_source(dot(), BlurOptions::new((1.0, 1.0)));
        let bounds = IntegerBounds::new((-2, -2), (5, 5));
        let output = blur.fetch(bounds, &channels()).unwrap();

        // radius 1 spreads the dot to its direct neighbours only
        assert_eq!(output.statistics().pixels_with_samples, 9);
        assert_eq!(output.sample_count(Vec2(2, 2)), 0);

        let center = composite_front_to_back(output.pixel(Vec2(0, 0)).front_to_back(), &channels());
        let corner = composite_front_to_back(output.pixel(Vec2(1, 1)).front_to_back(), &channels());
        assert!(center[1] > corner[1]);
        assert_eq!(center[2], 10.0);

        let flat = output.flatten();
        let coverage: f32 = bounds.positions().map(|position| flat.get(position, &Channel::Alpha)).sum();
        assert!((coverage - 1.0).abs() < 1e-5);
    }

    #[test]
    fn requests_grow_by_radius() {
        let blur = DeepBlur::with_source(dot(), BlurOptions::new((2.0, 0.0)));
        let requests = blur.deep_requests(IntegerBounds::new((0, 0), (4, 4)), &channels(), 1).unwrap();

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].bounds, IntegerBounds::new((-3, 0), (10, 4)));

        let unconnected = DeepBlur::new(BlurOptions::default());
        assert!(unconnected.deep_requests(IntegerBounds::new((0, 0), (4, 4)), &channels(), 1).unwrap().is_empty());
        assert_eq!(unconnected.deep_info().unwrap(), DeepInfo::empty());
    }

    #[test]
    fn color_only_request_matches_full_request() {
        let blur = DeepBlur::with_source(dot(), BlurOptions::new((1.0, 1.0)));
        let bounds = IntegerBounds::new((-2, -2), (5, 5));

        let red = ChannelSet::from(Channel::Red);
        let color = blur.fetch(bounds, &red).unwrap();
        let full = blur.fetch(bounds, &channels()).unwrap();

        assert_eq!(color.channels(), &red);
        assert_eq!(color.sample_counts(), full.sample_counts());
        assert_eq!(color.statistics().pixels_with_samples, 9);

        for position in bounds.positions() {
            let (color, full) = (color.pixel(position), full.pixel(position));

            for index in 0 .. full.sample_count() {
                assert_eq!(color.unordered_values(index), &full.unordered_values(index)[.. 1]);
            }
        }

        let requests = blur.deep_requests(bounds, &red, 1).unwrap();
        assert_eq!(requests[0].channels, channels());
    }

    #[test]
    fn huge_size_is_rejected() {
        let options = BlurOptions::new((1e7, 1e7));
        assert!(matches!(options.validate(), Err(Error::Invalid(_))));
        assert!(BlurOptions::new((1e7, 0.0)).validate().is_ok());

        let blur = DeepBlur::with_source(dot(), options);
        let bounds = IntegerBounds::from_dimensions((1, 1));
        assert!(matches!(blur.fetch(bounds, &channels()), Err(Error::Invalid(_))));
        assert!(matches!(blur.deep_requests(bounds, &channels(), 1), Err(Error::Invalid(_))));
    }

    #[test]
    fn invalid_size_and_missing_input() {
        let negative = DeepBlur::with_source(dot(), BlurOptions::new((-1.0, 0.0)));
        assert!(matches!(negative.fetch(IntegerBounds::from_dimensions((1, 1)), &channels()), Err(Error::Invalid(_))));

        let unconnected = DeepBlur::new(BlurOptions::default());
        assert!(matches!(unconnected.fetch(IntegerBounds::from_dimensions((1, 1)), &channels()), Err(Error::Upstream(_))));
    }
}
