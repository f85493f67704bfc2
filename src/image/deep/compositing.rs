//! Deep data compositing operations.
//!
//! Flattens deep samples with the standard front-to-back "over" operation:
//! ```text
//! output_value += sample_value * (1 - output_alpha)
//! output_alpha += sample_alpha * (1 - output_alpha)
//! ```
//! All values except depths are expected to be premultiplied by alpha.
//!
//! ## Example
//!
//! ```
//! use deepops::image::deep::compositing::composite_front_to_back;
//! use deepops::meta::channel::{Channel, ChannelSet};
//!
//! let channels = ChannelSet::new(vec![Channel::Red, Channel::Alpha, Channel::DeepFront]);
//! let red_then_black = [[0.5, 0.5, 1.0], [0.0, 0.5, 2.0]];
//!
//! let flat = composite_front_to_back(red_then_black.iter().map(|sample| &sample[..]), &channels);
//! assert_eq!(flat, vec![0.5, 0.75, 1.0]);
//! ```

use crate::meta::channel::{Channel, ChannelSet};


/// Composite samples that are sorted front to back into one flat value per channel.
///
/// Depth channels report the depth of the closest sample.
/// Stops as soon as the accumulated alpha reaches one,
/// because everything behind is hidden.
/// Without an alpha channel, every sample is treated as fully transparent.
pub fn composite_front_to_back<'s>(
    samples: impl IntoIterator<Item = &'s [f32]>,
    channels: &ChannelSet,
) -> Vec<f32> {
    let alpha_index = channels.index_of(&Channel::Alpha);
    let mut output = vec![0.0; channels.len()];
    let mut output_alpha = 0.0;

    for (sample_index, sample) in samples.into_iter().enumerate() {
        let transparency = 1.0 - output_alpha;

        for ((channel, value), output) in channels.iter().zip(sample).zip(output.iter_mut()) {
            if channel.is_depth() {
                if sample_index == 0 { *output = *value; }
            }
            else {
                *output += value * transparency;
            }
        }

        if let Some(alpha_index) = alpha_index {
            output_alpha = output[alpha_index];
        }

        // everything behind is occluded
        if output_alpha >= 1.0 {
            break;
        }
    }

    output
}

/// The accumulated alpha after each of the samples, which are sorted front to back.
/// Without an alpha channel, the accumulated alpha stays zero.
pub fn accumulated_alpha<'s>(
    samples: impl IntoIterator<Item = &'s [f32]>,
    channels: &ChannelSet,
) -> Vec<f32> {
    let alpha_index = channels.index_of(&Channel::Alpha);
    let mut accumulated = 0.0_f32;

    samples.into_iter()
        .map(|sample| {
            let alpha = alpha_index.map_or(0.0, |index| sample[index]);
            accumulated += alpha * (1.0 - accumulated);
            accumulated
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    fn rgba() -> ChannelSet {
        ChannelSet::new(vec![Channel::Red, Channel::Green, Channel::Blue, Channel::Alpha, Channel::DeepFront])
    }

    fn composite(samples: &[[f32; 5]]) -> Vec<f32> {
        composite_front_to_back(samples.iter().map(|sample| &sample[..]), &rgba())
    }

    #[test]
    fn single_sample_compositing() {
        let flat = composite(&[[0.5, 0.0, 0.0, 0.5, 1.0]]);
        assert_eq!(flat, vec![0.5, 0.0, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn two_samples_compositing() {
        let flat = composite(&[
            [0.5, 0.0, 0.0, 0.5, 1.0],
            [0.0, 0.5, 0.0, 0.5, 2.0],
        ]);

        // First sample contributes: R=0.5 (0.5 red * 0.5 alpha)
        // Second sample contributes: G=0.25 (0.5 green * 0.5 alpha * 0.5 transparency)
        // Alpha: 0.5 + 0.5 * 0.5 = 0.75
        assert!((flat[3] - 0.75).abs() < 0.0001);
        assert!((flat[0] - 0.5).abs() < 0.0001);
        assert!((flat[1] - 0.25).abs() < 0.0001);
        assert_eq!(flat[4], 1.0);
    }

    #[test]
    fn opaque_sample_hides_the_rest() {
        let flat = composite(&[
            [1.0, 0.0, 0.0, 1.0, 1.0],
            [0.0, 1.0, 0.0, 1.0, 2.0],
        ]);

        assert_eq!(flat, vec![1.0, 0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn accumulated_alpha_profile() {
        let channels = ChannelSet::from(Channel::Alpha);
        let samples = [[0.5_f32], [0.5], [1.0]];
        let profile = accumulated_alpha(samples.iter().map(|sample| &sample[..]), &channels);
        assert_eq!(profile, vec![0.5, 0.75, 1.0]);
    }
}
