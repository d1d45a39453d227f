//! Strongly-typed identifiers for features and labels.

use std::fmt;

use bincode::{
    de::Decoder,
    enc::Encoder,
    error::{DecodeError, EncodeError},
    Decode, Encode,
};

/// Identifies a named feature.
///
/// Feature ids are dense and assigned in first-seen order starting at 0.
/// `FeatureId(n)` where `n` equals the size of a frozen mapping denotes a
/// feature that was never seen while the mapping could grow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(pub u64);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for FeatureId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies a tag (class).
///
/// Label ids are dense and assigned in first-seen order starting at 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId(pub u64);

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for LabelId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl Encode for LabelId {
    fn encode<E: Encoder>(&self, encoder: &mut E) -> Result<(), EncodeError> {
        self.0.encode(encoder)
    }
}

impl Decode for LabelId {
    fn decode<D: Decoder>(decoder: &mut D) -> Result<Self, DecodeError> {
        Ok(Self(u64::decode(decoder)?))
    }
}
