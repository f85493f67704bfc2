
//! Views into the samples of a single deep pixel, and the output pixel being built.

use crate::error::{Error, Result};
use crate::meta::channel::{Channel, ChannelSet};
use smallvec::SmallVec;


/// A read-only view of all samples at one pixel position.
///
/// The samples can be accessed in storage order (unordered)
/// or sorted by depth (ordered). Ordered index `0` is the farthest sample,
/// the last ordered index is the sample closest to the camera.
///
/// # Memory Layout
///
/// The view borrows interleaved sample values:
/// ```text
/// [Sample0: Chan0, Chan1, Chan2, ...]
/// [Sample1: Chan0, Chan1, Chan2, ...]
/// ```
#[derive(Debug, Clone)]
pub struct DeepPixel<'p> {
    channels: &'p ChannelSet,
    values: &'p [f32],

    /// Storage indices of the samples, sorted from closest to farthest.
    closest_first: SmallVec<[u32; 16]>,
}

impl<'p> DeepPixel<'p> {

    /// Create a view of interleaved sample values.
    /// Returns an error if the value count is not a multiple of the channel count.
    pub fn new(channels: &'p ChannelSet, values: &'p [f32]) -> Result<Self> {
        let channel_count = channels.len();

        let is_complete = if channel_count == 0 { values.is_empty() } else { values.len() % channel_count == 0 };
        if !is_complete {
            return Err(Error::invalid(format!(
                "{} sample values do not fit {} channels", values.len(), channel_count
            )));
        }

        Ok(Self::from_complete_samples(channels, values))
    }

    /// A pixel without any samples.
    pub fn empty(channels: &'p ChannelSet) -> Self {
        Self::from_complete_samples(channels, &[])
    }

    /// The value count must be a multiple of the channel count.
    pub(crate) fn from_complete_samples(channels: &'p ChannelSet, values: &'p [f32]) -> Self {
        let sample_count = if channels.is_empty() { 0 } else { values.len() / channels.len() };
        let mut closest_first: SmallVec<[u32; 16]> = (0 .. sample_count as u32).collect();

        if let Some(front) = channels.index_of(&Channel::DeepFront) {
            let back = channels.index_of(&Channel::DeepBack).unwrap_or(front);
            let stride = channels.len();
            let depth = |sample: u32, channel: usize| values[sample as usize * stride + channel];

            // stable, so equal depths keep their storage order. nan sorts last
            closest_first.sort_by(|&a, &b| {
                depth(a, front).total_cmp(&depth(b, front))
                    .then_with(|| depth(a, back).total_cmp(&depth(b, back)))
            });
        }

        Self { channels, values, closest_first }
    }

    /// The channels that this pixel has values for.
    #[inline]
    pub fn channels(&self) -> &'p ChannelSet {
        self.channels
    }

    /// Number of samples in this pixel.
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.closest_first.len()
    }

    /// Whether this pixel has no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.closest_first.is_empty()
    }

    /// All values of a sample in storage order.
    /// Panics if the index is not smaller than the sample count.
    pub fn unordered_values(&self, index: usize) -> &'p [f32] {
        let stride = self.channels.len();
        &self.values[index * stride .. (index + 1) * stride]
    }

    /// All values of a sample in depth order, where index `0` is the farthest sample.
    /// Panics if the index is not smaller than the sample count.
    pub fn ordered_values(&self, index: usize) -> &'p [f32] {
        self.closest_values(self.sample_count() - 1 - index)
    }

    /// All values of the `nth` closest sample, where `0` is the closest.
    pub(crate) fn closest_values(&self, nth: usize) -> &'p [f32] {
        self.unordered_values(self.closest_first[nth] as usize)
    }

    /// The value of one channel of a sample in storage order.
    /// Channels that this pixel does not have read as zero.
    pub fn unordered_sample(&self, index: usize, channel: &Channel) -> f32 {
        self.channels.index_of(channel)
            .map_or(0.0, |channel| self.unordered_values(index)[channel])
    }

    /// The value of one channel of a sample in depth order, where index `0` is the farthest sample.
    /// Channels that this pixel does not have read as zero.
    pub fn ordered_sample(&self, index: usize, channel: &Channel) -> f32 {
        self.channels.index_of(channel)
            .map_or(0.0, |channel| self.ordered_values(index)[channel])
    }

    /// Iterate the values of all samples, starting with the sample closest to the camera.
    pub fn front_to_back(&self) -> impl Iterator<Item = &'p [f32]> + '_ {
        (0 .. self.sample_count()).map(move |nth| self.closest_values(nth))
    }
}


/// The samples of one output pixel, built front to back.
/// Values can only be appended, one value per output channel and sample,
/// in the order of the output channel set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeepOutPixel {
    values: Vec<f32>,
}

impl DeepOutPixel {

    /// An output pixel without samples.
    pub fn new() -> Self {
        Self::default()
    }

    /// An output pixel without samples that can hold the specified number of values without reallocating.
    pub fn with_capacity(value_count: usize) -> Self {
        Self { values: Vec::with_capacity(value_count) }
    }

    /// Make room for at least this many more values.
    #[inline]
    pub fn reserve_more(&mut self, value_count: usize) {
        self.values.reserve(value_count);
    }

    /// Append the next value.
    #[inline]
    pub fn push(&mut self, value: f32) {
        self.values.push(value);
    }

    /// Append all values of a complete sample.
    pub fn push_sample(&mut self, values: &[f32]) {
        self.values.extend_from_slice(values);
    }

    /// All values appended so far.
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of values appended so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no value has been appended yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of complete samples, given the number of output channels.
    pub fn sample_count(&self, channel_count: usize) -> usize {
        if channel_count == 0 { 0 } else { self.values.len() / channel_count }
    }

    /// Iterate the samples in the order they were appended,
    /// given the number of output channels.
    pub fn samples(&self, channel_count: usize) -> std::slice::Chunks<'_, f32> {
        self.values.chunks(channel_count.max(1))
    }

    pub(crate) fn into_values(self) -> Vec<f32> {
        self.values
    }
}
