//! Geometry for resampling deep images to a different resolution.
//!
//! The transform maps output pixel coordinates back into the input image,
//! so that each output pixel can gather the input pixels below its filter footprint.

use crate::math::{cubic_kernel, Vec2};
use crate::meta::bounds::IntegerBounds;
use crate::meta::format::Format;
use kurbo::{Affine, Point};
use smallvec::SmallVec;


/// How the size of the output format is determined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeMode {

    /// Convert the image area of the input format to the specified format.
    ToFormat(Format),

    /// Scale into a box measured in pixels.
    ToBox {

        /// Width and height of the box. The height is only used if `fixed` is set.
        size: Vec2<usize>,

        /// If set, the output has exactly the shape of the box.
        /// Otherwise, the output height follows the aspect ratio of the input.
        fixed: bool,

        /// The pixel aspect ratio of the output format.
        pixel_aspect: f64,
    },

    /// Scale the image by a factor per axis.
    /// The output format is rounded to whole pixels.
    Scale(Vec2<f64>),
}

/// Which direction controls the scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResizeType {

    /// Don't scale the pixels at all, only translate them.
    None,

    /// Scale so that the image fills the output width.
    #[default]
    Width,

    /// Scale so that the image fills the output height.
    Height,

    /// Scale uniformly so that the whole image fits into the output.
    Fit,

    /// Scale uniformly so that the image covers the whole output.
    Fill,

    /// Scale each axis independently to match the output exactly.
    Distort,
}


/// An input pixel and its filter weight.
pub type FootprintSample = (Vec2<i32>, f32);

/// The input pixels contributing to one output pixel.
pub type Footprint = SmallVec<[FootprintSample; 16]>;


/// The immutable geometry of one resample pass,
/// computed from the input format and the resize options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampleGeometry {
    output_format: Format,

    /// Input pixels per output pixel, per axis.
    scale_factor: Vec2<f64>,

    resize: ResizeType,

    /// Maps output coordinates to input coordinates.
    to_input: Affine,

    /// Maps input coordinates to output coordinates.
    to_output: Affine,
}

impl ResampleGeometry {

    /// Compute the output format, the scale factors and the transform.
    /// Zero or non-finite scale ratios fall back to a scale factor of one.
    pub fn compute(input_format: Format, mode: ResizeMode, resize: ResizeType, center: bool) -> Self {
        let input_size = input_format.size.map(|size| size as f64);

        let (output_format, mut scale_factor) = match mode {
            ResizeMode::ToFormat(format) => {
                let target = format.size.map(|size| size as f64);
                (format, input_size.zip_with(target, scale_ratio))
            },

            ResizeMode::ToBox { size, fixed, pixel_aspect } => {
                let width_factor = scale_ratio(input_size.width(), size.width() as f64);

                if fixed {
                    let height_factor = scale_ratio(input_size.height(), size.height() as f64);
                    (Format::new(size, pixel_aspect), Vec2(width_factor, height_factor))
                }
                else {
                    let height = if input_size.width() > 0.0 {
                        (size.width() as f64 * input_size.height() / input_size.width()) as usize
                    } else { 0 };

                    (Format::new((size.width(), height), pixel_aspect), Vec2(width_factor, width_factor))
                }
            },

            ResizeMode::Scale(scale) => {
                let factor = scale.map(|scale| scale_ratio(1.0, scale));
                let size = input_size.zip_with(factor, |size, factor| (size / factor).round() as usize);
                (Format::new(size, input_format.pixel_aspect), factor)
            },
        };

        let input_aspect = input_format.pixel_aspect;
        let output_aspect = output_format.pixel_aspect;
        let same_aspect = input_aspect == output_aspect;

        // the input pixel aspect divided by the output pixel aspect
        let aspect = input_aspect / output_aspect;

        let Vec2(x, y) = &mut scale_factor;
        match resize {
            ResizeType::None | ResizeType::Distort => {},

            ResizeType::Width => {
                *y = *x;
                if !same_aspect { *y *= aspect; }
            },

            ResizeType::Height => {
                *x = *y;
                if !same_aspect { *x /= aspect; }
            },

            ResizeType::Fit => {
                if same_aspect { *x = x.max(*y); *y = *x; }
                else if *x > *y / aspect { *y = *x * aspect; }
                else { *x = *y / aspect; }
            },

            ResizeType::Fill => {
                if same_aspect { *x = x.min(*y); *y = *x; }
                else if *x < *y / aspect { *y = *x * aspect; }
                else { *x = *y / aspect; }
            },
        }

        let to_input = if resize == ResizeType::None {
            // whole pixel shift, samples are never split between pixels
            let input_center = input_format.center();
            let output_center = output_format.center();

            if center { Affine::translate((input_center.x() - output_center.x(), input_center.y() - output_center.y())) }
            else { Affine::IDENTITY }
        }
        else {
            let input_center = input_format.area_center();
            let output_center = output_format.area_center();

            // scale around pixel centers
            let mut transform = Affine::translate((-0.5, -0.5));
            if center { transform = transform * Affine::translate((input_center.x(), input_center.y())); }
            transform = transform * Affine::scale_non_uniform(scale_factor.x(), scale_factor.y());
            if center { transform = transform * Affine::translate((-output_center.x(), -output_center.y())); }
            transform * Affine::translate((0.5, 0.5))
        };

        ResampleGeometry {
            output_format,
            scale_factor,
            resize,
            to_input,
            to_output: to_input.inverse(),
        }
    }

    /// The format of the resampled image.
    pub fn output_format(&self) -> Format {
        self.output_format
    }

    /// Input pixels per output pixel, per axis.
    pub fn scale_factor(&self) -> Vec2<f64> {
        self.scale_factor
    }

    /// Output pixels per input pixel, per axis. The reciprocal of the scale factor.
    pub fn magnification(&self) -> Vec2<f64> {
        self.scale_factor.map(|factor| 1.0 / factor)
    }

    /// The direction that controlled the scale factor.
    pub fn resize(&self) -> ResizeType {
        self.resize
    }

    /// The transform from output coordinates to input coordinates.
    pub fn transform(&self) -> Affine {
        self.to_input
    }

    /// Map an output coordinate into the input image.
    pub fn to_input(&self, output: Vec2<f64>) -> Vec2<f64> {
        apply(self.to_input, output)
    }

    /// Map an input coordinate into the output image.
    pub fn to_output(&self, input: Vec2<f64>) -> Vec2<f64> {
        apply(self.to_output, input)
    }

    /// The bounding box of the resampled image.
    /// Unless `preserve` is set, the box is clipped to the output format.
    pub fn output_bounds(&self, input_bounds: IntegerBounds, preserve: bool) -> IntegerBounds {
        let bounds = self.map_bounds(input_bounds, self.to_output);
        if preserve { bounds } else { bounds.intersect(self.output_format.bounds()) }
    }

    /// The input region required to compute the specified output region,
    /// including the filter footprint of the pixels at the border.
    pub fn input_request(&self, output_bounds: IntegerBounds) -> IntegerBounds {
        let margin = self.scale_factor.map(|factor| factor.ceil() as i32);
        self.map_bounds(output_bounds, self.to_input).dilate(margin)
    }

    fn map_bounds(&self, bounds: IntegerBounds, transform: Affine) -> IntegerBounds {
        let start = apply(transform, bounds.position.map(f64::from));
        let end = apply(transform, bounds.end().map(f64::from));
        IntegerBounds::rounded_out(start.into(), end.into())
    }

    /// The input pixels and their normalized cubic filter weights for one output pixel,
    /// with the horizontal position in the outer loop and the vertical position in the inner loop.
    /// Pixels with zero weight are omitted.
    pub fn footprint(&self, position: Vec2<i32>) -> Footprint {
        let center = self.to_input(position.map(f64::from));

        if self.resize == ResizeType::None {
            let nearest = center.map(|coordinate| coordinate.floor() as i32);
            return smallvec::smallvec![(nearest, 1.0)];
        }

        let corner = self.to_input((position - Vec2(1, 1)).map(f64::from));
        let other_corner = self.to_input((position + Vec2(1, 1)).map(f64::from));
        let area = IntegerBounds::rounded_out(corner.into(), other_corner.into());

        // the filter widens when shrinking the image
        let filter_size = self.scale_factor.map(|factor| factor.max(1.0));

        let mut footprint = Footprint::new();
        let mut weight_sum = 0.0_f32;

        for x in area.position.x() ..= area.end().x() {
            for y in area.position.y() ..= area.end().y() {
                let distance = Vec2(
                    (center.x() - f64::from(x)).abs() / filter_size.x(),
                    (center.y() - f64::from(y)).abs() / filter_size.y(),
                );

                let weight = (cubic_kernel(distance.x()) * cubic_kernel(distance.y())) as f32;
                if weight > 0.0 {
                    footprint.push((Vec2(x, y), weight));
                    weight_sum += weight;
                }
            }
        }

        if weight_sum > 0.0 {
            let normalization = 1.0 / weight_sum;
            for (_, weight) in &mut footprint {
                *weight *= normalization;
            }
        }
        else {
            log::warn!("resample footprint of pixel {:?} has no weight", position);
        }

        footprint
    }
}

/// `numerator / denominator`, or one if that is not a positive finite number.
fn scale_ratio(numerator: f64, denominator: f64) -> f64 {
    let ratio = numerator / denominator;

    if ratio.is_finite() && ratio > 0.0 { ratio }
    else {
        log::warn!("degenerate resample ratio {} / {}, using a scale factor of one", numerator, denominator);
        1.0
    }
}

fn apply(transform: Affine, point: Vec2<f64>) -> Vec2<f64> {
    let Point { x, y } = transform * Point::new(point.x(), point.y());
    Vec2(x, y)
}
