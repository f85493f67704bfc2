
//! Error type definitions.

use std::borrow::Cow;
use std::fmt;


/// A result that may contain a deep operator error.
pub type Result<T> = std::result::Result<T, Error>;

/// A result that, if ok, contains nothing, and otherwise contains a deep operator error.
pub type UnitResult = Result<()>;


/// An error that may happen while validating or evaluating a deep operator.
/// Degenerate parameters and numeric edge cases are never reported as errors,
/// they are resolved by the algorithms themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {

    /// The configuration or the supplied data is inconsistent,
    /// for example a weight list that does not match the input pixels,
    /// or a sample buffer whose length does not match the sample counts.
    Invalid(Cow<'static, str>),

    /// A required input is not connected, or fetching its data failed.
    /// The whole region request fails, no partial output is produced.
    Upstream(Cow<'static, str>),
}

impl Error {

    /// Create an error of the variant `Invalid`.
    pub(crate) fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Error::Invalid(message.into())
    }

    /// Create an error of the variant `Upstream`.
    pub(crate) fn upstream(message: impl Into<Cow<'static, str>>) -> Self {
        Error::Upstream(message.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Invalid(message) => write!(formatter, "invalid deep data: {}", message),
            Error::Upstream(message) => write!(formatter, "upstream unavailable: {}", message),
        }
    }
}

impl std::error::Error for Error {}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_category() {
        assert_eq!(Error::invalid("weights").to_string(), "invalid deep data: weights");
        assert_eq!(Error::upstream("input B").to_string(), "upstream unavailable: input B");
    }
}
