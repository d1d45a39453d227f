//! Definition of errors.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

pub type Result<T, E = SeqTagError> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum SeqTagError {
    MissingMapping(MissingMappingError),
    NotFound(NotFoundError),
    InvalidMapping(InvalidMappingError),
    InvalidArgument(InvalidArgumentError),
    UTF8Error(std::string::FromUtf8Error),
    CastError(std::num::TryFromIntError),
    DecodeError(bincode::error::DecodeError),
    EncodeError(bincode::error::EncodeError),
    IOError(std::io::Error),
}

impl SeqTagError {
    pub(crate) fn missing_mapping<P>(kind: &'static str, path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self::MissingMapping(MissingMappingError {
            kind,
            path: path.into(),
        })
    }

    pub(crate) fn not_found<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::NotFound(NotFoundError { msg: msg.into() })
    }

    pub(crate) fn invalid_mapping<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidMapping(InvalidMappingError { msg: msg.into() })
    }

    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }
}

impl fmt::Display for SeqTagError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MissingMapping(e) => e.fmt(f),
            Self::NotFound(e) => e.fmt(f),
            Self::InvalidMapping(e) => e.fmt(f),
            Self::InvalidArgument(e) => e.fmt(f),
            Self::UTF8Error(e) => e.fmt(f),
            Self::CastError(e) => e.fmt(f),
            Self::DecodeError(e) => e.fmt(f),
            Self::EncodeError(e) => e.fmt(f),
            Self::IOError(e) => e.fmt(f),
        }
    }
}

impl Error for SeqTagError {}

/// Error used when a mapping file is absent or cannot be opened.
#[derive(Debug)]
pub struct MissingMappingError {
    /// Which mapping was requested (`"feature"` or `"label"`).
    pub(crate) kind: &'static str,

    /// Path that was probed.
    pub(crate) path: PathBuf,
}

impl MissingMappingError {
    /// Returns which mapping was missing.
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl fmt::Display for MissingMappingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "MissingMappingError: missing {} mapping: {}",
            self.kind,
            self.path.display()
        )
    }
}

impl Error for MissingMappingError {}

/// Error used when a key or a value is absent from a bidirectional mapping.
#[derive(Debug)]
pub struct NotFoundError {
    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "NotFoundError: {}", self.msg)
    }
}

impl Error for NotFoundError {}

/// Error used when a loaded mapping breaks the dense id invariant.
#[derive(Debug)]
pub struct InvalidMappingError {
    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidMappingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidMappingError: {}", self.msg)
    }
}

impl Error for InvalidMappingError {}

/// Error used when the argument is invalid.
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// Name of the argument.
    pub(crate) arg: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

impl From<std::string::FromUtf8Error> for SeqTagError {
    fn from(error: std::string::FromUtf8Error) -> Self {
        Self::UTF8Error(error)
    }
}

impl From<std::num::TryFromIntError> for SeqTagError {
    fn from(error: std::num::TryFromIntError) -> Self {
        Self::CastError(error)
    }
}

impl From<bincode::error::DecodeError> for SeqTagError {
    fn from(error: bincode::error::DecodeError) -> Self {
        Self::DecodeError(error)
    }
}

impl From<bincode::error::EncodeError> for SeqTagError {
    fn from(error: bincode::error::EncodeError) -> Self {
        Self::EncodeError(error)
    }
}

impl From<std::io::Error> for SeqTagError {
    fn from(error: std::io::Error) -> Self {
        Self::IOError(error)
    }
}
