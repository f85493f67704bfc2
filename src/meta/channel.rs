
//! Channel identifiers and ordered channel sets.

use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;


/// Identifies one value of a deep sample.
/// The variant order defines the order of channels inside a [`ChannelSet`],
/// which is also the order in which sample values are stored.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {

    /// Red color, premultiplied by alpha.
    Red,

    /// Green color, premultiplied by alpha.
    Green,

    /// Blue color, premultiplied by alpha.
    Blue,

    /// Opacity of the sample.
    Alpha,

    /// Distance from the camera to the front of the sample.
    DeepFront,

    /// Distance from the camera to the back of the sample.
    /// Equal to the front for flat (non-volumetric) samples.
    DeepBack,

    /// Any other channel, identified by name, for example `"mask"` or `"N.x"`.
    Custom(Cow<'static, str>),
}

impl Channel {

    /// Create a channel by name. The names `R`, `G`, `B`, `A`,
    /// `Z` and `ZBack` refer to the builtin channels.
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();

        match name.as_ref() {
            "R" | "r" | "red" => Channel::Red,
            "G" | "g" | "green" => Channel::Green,
            "B" | "b" | "blue" => Channel::Blue,
            "A" | "a" | "alpha" => Channel::Alpha,
            "Z" | "deep.front" => Channel::DeepFront,
            "ZBack" | "deep.back" => Channel::DeepBack,
            _ => Channel::Custom(name),
        }
    }

    /// Whether this channel stores a depth instead of a premultiplied value.
    /// Depth values are never scaled when merging.
    #[inline]
    pub fn is_depth(&self) -> bool {
        matches!(self, Channel::DeepFront | Channel::DeepBack)
    }

    /// The conventional name of this channel.
    pub fn name(&self) -> &str {
        match self {
            Channel::Red => "R",
            Channel::Green => "G",
            Channel::Blue => "B",
            Channel::Alpha => "A",
            Channel::DeepFront => "Z",
            Channel::DeepBack => "ZBack",
            Channel::Custom(name) => name,
        }
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.name())
    }
}


/// A sorted set of channels without duplicates.
/// Deep samples store one value per channel, in the order of this set.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct ChannelSet {
    list: SmallVec<[Channel; 8]>,
}

impl ChannelSet {

    /// A set without any channel.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Red, green, blue, alpha, deep front and deep back.
    pub fn rgba_deep() -> Self {
        Self::new(vec![
            Channel::Red, Channel::Green, Channel::Blue, Channel::Alpha,
            Channel::DeepFront, Channel::DeepBack,
        ])
    }

    /// Create a set from any list of channels. Sorts and removes duplicates.
    pub fn new(channels: impl IntoIterator<Item = Channel>) -> Self {
        let mut list: SmallVec<[Channel; 8]> = channels.into_iter().collect();
        list.sort();
        list.dedup();
        Self { list }
    }

    /// Number of channels in this set.
    #[inline]
    pub fn len(&self) -> usize { self.list.len() }

    /// Whether this set contains no channels.
    #[inline]
    pub fn is_empty(&self) -> bool { self.list.is_empty() }

    /// Whether the channel is part of this set.
    #[inline]
    pub fn contains(&self, channel: &Channel) -> bool {
        self.index_of(channel).is_some()
    }

    /// Position of the channel inside this set,
    /// which is also the position of its value inside a stored sample.
    #[inline]
    pub fn index_of(&self, channel: &Channel) -> Option<usize> {
        self.list.binary_search(channel).ok()
    }

    /// Iterate the channels in set order.
    pub fn iter(&self) -> std::slice::Iter<'_, Channel> {
        self.list.iter()
    }

    /// All channels that are in this or the other set.
    pub fn union(&self, other: &ChannelSet) -> ChannelSet {
        ChannelSet::new(self.iter().chain(other.iter()).cloned())
    }

    /// All channels that are in both sets.
    pub fn intersection(&self, other: &ChannelSet) -> ChannelSet {
        ChannelSet::new(self.iter().filter(|channel| other.contains(channel)).cloned())
    }

    /// Add a channel, keeping the set sorted.
    pub fn insert(&mut self, channel: Channel) {
        if let Err(index) = self.list.binary_search(&channel) {
            self.list.insert(index, channel);
        }
    }
}

impl fmt::Debug for ChannelSet {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.list.iter()).finish()
    }
}

impl<'s> IntoIterator for &'s ChannelSet {
    type Item = &'s Channel;
    type IntoIter = std::slice::Iter<'s, Channel>;
    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

impl FromIterator<Channel> for ChannelSet {
    fn from_iter<I: IntoIterator<Item = Channel>>(iter: I) -> Self {
        ChannelSet::new(iter)
    }
}

impl From<Channel> for ChannelSet {
    fn from(channel: Channel) -> Self {
        ChannelSet::new(Some(channel))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_is_sorted_and_deduplicated() {
        let set = ChannelSet::new(vec![
            Channel::DeepBack, Channel::Alpha, Channel::named("mask"), Channel::Red, Channel::Alpha,
        ]);

        let names: Vec<&str> = set.iter().map(Channel::name).collect();
        assert_eq!(names, vec!["R", "A", "ZBack", "mask"]);
        assert_eq!(set.index_of(&Channel::Alpha), Some(1));
        assert_eq!(set.index_of(&Channel::Green), None);
    }

    #[test]
    fn named_channels_resolve_to_builtins() {
        assert_eq!(Channel::named("A"), Channel::Alpha);
        assert_eq!(Channel::named("Z"), Channel::DeepFront);
        assert_eq!(Channel::named("N.x"), Channel::Custom(Cow::Borrowed("N.x")));
    }

    #[test]
    fn union_and_intersection() {
        let color = ChannelSet::new(vec![Channel::Red, Channel::Alpha]);
        let depth = ChannelSet::new(vec![Channel::Alpha, Channel::DeepFront]);

        assert_eq!(color.union(&depth).len(), 3);
        assert_eq!(color.intersection(&depth), ChannelSet::from(Channel::Alpha));
    }

    #[test]
    fn insert_keeps_order() {
        let mut set = ChannelSet::from(Channel::DeepFront);
        set.insert(Channel::Red);
        set.insert(Channel::Red);
        assert_eq!(set.iter().cloned().collect::<Vec<_>>(), vec![Channel::Red, Channel::DeepFront]);
    }
}
