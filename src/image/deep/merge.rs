//! Merging multiple weighted deep pixels into a single deep pixel.
//!
//! The samples of all inputs are visited in one front-to-back pass.
//! Each output sample receives an alpha that makes the accumulated alpha of the output
//! equal the weighted average of the accumulated alphas of all inputs at that depth.
//! Compositing the output therefore approximates the weighted average
//! of compositing each input, while keeping every sample at its own depth.
//!
//! ```
//! use deepops::image::deep::merge::{merge_deep_pixels, MergeOptions};
//! use deepops::image::pixel::DeepPixel;
//! use deepops::meta::channel::{Channel, ChannelSet};
//!
//! # fn main() -> deepops::error::Result<()> {
//! let channels = ChannelSet::new(vec![Channel::Red, Channel::Alpha, Channel::DeepFront]);
//! let dark = [0.2, 1.0, 5.0];
//! let bright = [0.8, 1.0, 5.0];
//!
//! let inputs = [DeepPixel::new(&channels, &dark)?, DeepPixel::new(&channels, &bright)?];
//! let merged = merge_deep_pixels(&inputs, &[0.5, 0.5], &channels, MergeOptions::KEEP_ALL)?;
//!
//! // half of the dark sample, then the bright sample covering the rest
//! assert_eq!(merged.values(), &[0.1, 0.5, 5.0, 0.8, 1.0, 5.0]);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result, UnitResult};
use crate::image::pixel::{DeepOutPixel, DeepPixel};
use crate::meta::channel::{Channel, ChannelSet};
use smallvec::SmallVec;


/// Controls which samples a merge may discard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeOptions {

    /// Stop merging as soon as an emitted sample is fully opaque,
    /// because all remaining samples of all inputs are hidden behind it.
    pub drop_hidden: bool,

    /// Discard samples whose alpha is equal to or smaller than `alpha_threshold`.
    pub drop_transparent: bool,

    /// If `drop_transparent` is set, samples with this alpha or less are discarded.
    /// A threshold above zero may slightly change the resulting image.
    pub alpha_threshold: f32,
}

impl MergeOptions {

    /// Never discard any sample. Used for mixing, which must not lose samples.
    pub const KEEP_ALL: MergeOptions = MergeOptions {
        drop_hidden: false,
        drop_transparent: false,
        alpha_threshold: 0.0,
    };

    /// Validate this instance.
    pub fn validate(&self) -> UnitResult {
        if !(0.0 ..= 1.0).contains(&self.alpha_threshold) {
            return Err(Error::invalid(format!(
                "alpha threshold {} is not between zero and one", self.alpha_threshold
            )));
        }

        Ok(())
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions { drop_hidden: true, drop_transparent: true, alpha_threshold: 0.0 }
    }
}


/// Merge weighted deep pixels into one deep pixel with the specified output channels.
///
/// The inputs are processed in strict front-to-back order across all pixels.
/// When several inputs have a sample at the same depth, the input with the lower index comes first.
/// Output samples keep the depth of the sample they originate from,
/// all other channels are rescaled to the alpha computed for the output sample.
/// Output channels that an input does not have are emitted as zero.
///
/// Returns an error if the number of weights does not match the number of inputs.
pub fn merge_deep_pixels(
    inputs: &[DeepPixel<'_>],
    weights: &[f32],
    channels: &ChannelSet,
    options: MergeOptions,
) -> Result<DeepOutPixel> {
    if inputs.len() != weights.len() {
        return Err(Error::invalid(format!(
            "{} weights for {} deep pixels", weights.len(), inputs.len()
        )));
    }

    let mut output = DeepOutPixel::new();
    let mut cursors: SmallVec<[InputCursor<'_, '_>; 16]> = inputs.iter()
        .map(|pixel| InputCursor::new(pixel, channels))
        .collect();

    // the accumulated alpha of the output so far
    let mut combined_alpha = 0.0_f32;

    // the weighted average of the accumulated alphas of all inputs at the current depth
    let mut designated_alpha = 0.0_f32;

    while let Some(nearest) = nearest_input(&cursors) {
        let weight = weights[nearest];
        let cursor = &mut cursors[nearest];

        let sample = cursor.current_sample();
        let alpha = cursor.alpha_of(sample);

        let is_dropped = options.drop_transparent && alpha <= options.alpha_threshold;

        if !is_dropped {
            if alpha == 0.0 {
                output.reserve_more(channels.len());
                cursor.emit_unchanged(sample, &mut output);
            }
            else {
                designated_alpha -= cursor.accumulated_alpha * weight;
                cursor.accumulated_alpha += alpha * (1.0 - cursor.accumulated_alpha);
                designated_alpha += cursor.accumulated_alpha * weight;

                let new_alpha = if designated_alpha < 1.0 {
                    // raise the accumulated alpha of the output exactly to the designated alpha
                    if combined_alpha < 1.0 { ((designated_alpha - combined_alpha) / (1.0 - combined_alpha)).max(0.0) }
                    else { 0.0 }
                }
                else {
                    alpha
                };

                combined_alpha += new_alpha * (1.0 - combined_alpha);

                let is_new_alpha_dropped = options.drop_transparent && new_alpha <= options.alpha_threshold;

                if !is_new_alpha_dropped {
                    output.reserve_more(channels.len());
                    cursor.emit_rescaled(sample, new_alpha, new_alpha / alpha, &mut output);

                    if new_alpha == 1.0 && options.drop_hidden {
                        return Ok(output);
                    }
                }
            }
        }

        cursor.advance();
    }

    Ok(output)
}

/// The input with the closest unconsumed sample.
/// On equal depths, the input with the lowest index wins.
fn nearest_input(cursors: &[InputCursor<'_, '_>]) -> Option<usize> {
    let mut nearest: Option<(usize, f32)> = None;

    for (index, cursor) in cursors.iter().enumerate() {
        if cursor.is_exhausted() { continue; }

        match nearest {
            Some((_, nearest_depth)) if !(cursor.next_depth < nearest_depth) => {},
            _ => nearest = Some((index, cursor.next_depth)),
        }
    }

    nearest.map(|(index, _)| index)
}


/// Merge state of one input pixel.
#[derive(Debug)]
struct InputCursor<'v, 'p> {
    pixel: &'v DeepPixel<'p>,

    /// For each output channel, the index of that channel in the input samples.
    channel_indices: SmallVec<[Option<usize>; 8]>,

    /// For each output channel, whether it is a depth channel.
    is_depth: SmallVec<[bool; 8]>,

    /// Index of the output alpha channel.
    output_alpha: Option<usize>,

    front_index: Option<usize>,
    alpha_index: Option<usize>,

    /// Number of samples processed so far, closest first.
    consumed: usize,

    /// Front depth of the next unconsumed sample, or infinity.
    next_depth: f32,

    /// The alpha accumulated by this input up to the processed depth.
    accumulated_alpha: f32,
}

impl<'v, 'p> InputCursor<'v, 'p> {
    fn new(pixel: &'v DeepPixel<'p>, output_channels: &ChannelSet) -> Self {
        let input_channels = pixel.channels();

        let mut cursor = InputCursor {
            pixel,
            channel_indices: output_channels.iter().map(|channel| input_channels.index_of(channel)).collect(),
            is_depth: output_channels.iter().map(Channel::is_depth).collect(),
            output_alpha: output_channels.index_of(&Channel::Alpha),
            front_index: input_channels.index_of(&Channel::DeepFront),
            alpha_index: input_channels.index_of(&Channel::Alpha),
            consumed: 0,
            next_depth: f32::INFINITY,
            accumulated_alpha: 0.0,
        };

        cursor.next_depth = cursor.front_depth_of_next();
        cursor
    }

    #[inline]
    fn is_exhausted(&self) -> bool {
        self.consumed >= self.pixel.sample_count()
    }

    fn front_depth_of_next(&self) -> f32 {
        if self.is_exhausted() { return f32::INFINITY; }
        self.front_index.map_or(0.0, |front| self.current_sample()[front])
    }

    #[inline]
    fn current_sample(&self) -> &'p [f32] {
        self.pixel.closest_values(self.consumed)
    }

    #[inline]
    fn alpha_of(&self, sample: &[f32]) -> f32 {
        self.alpha_index.map_or(0.0, |alpha| sample[alpha])
    }

    fn advance(&mut self) {
        self.consumed += 1;
        self.next_depth = self.front_depth_of_next();
    }

    fn emit_unchanged(&self, sample: &[f32], output: &mut DeepOutPixel) {
        for index in &self.channel_indices {
            output.push(index.map_or(0.0, |index| sample[index]));
        }
    }

    /// Depths pass through, alpha becomes `new_alpha`, everything else is multiplied by `factor`.
    fn emit_rescaled(&self, sample: &[f32], new_alpha: f32, factor: f32, output: &mut DeepOutPixel) {
        for (output_index, (index, &is_depth)) in self.channel_indices.iter().zip(&self.is_depth).enumerate() {
            let value = match index {
                None => 0.0,
                Some(_) if Some(output_index) == self.output_alpha => new_alpha,
                Some(index) if is_depth => sample[*index],
                Some(index) => sample[*index] * factor,
            };

            output.push(value);
        }
    }
}
