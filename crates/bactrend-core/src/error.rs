use core::fmt;

/// Failure to write a PDU into the caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// The output buffer ran out. The ReadRange encoder relies on this to
    /// stop adding items.
    BufferTooSmall,
    ValueOutOfRange,
    InvalidLength,
    /// The value has no wire form in this codec, e.g. an unsupported range.
    Unsupported,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BufferTooSmall => "output buffer too small",
            Self::ValueOutOfRange => "value out of range",
            Self::InvalidLength => "invalid length",
            Self::Unsupported => "no encoding for value",
        })
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

/// Failure to parse a PDU. The ReadRange handler maps these onto reject
/// reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    UnexpectedEof,
    InvalidTag,
    InvalidLength,
    InvalidValue,
    /// A CHOICE carried a context tag number this decoder does not know.
    UnknownChoice(u8),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => f.write_str("input ends early"),
            Self::InvalidTag => f.write_str("unexpected tag"),
            Self::InvalidLength => f.write_str("invalid length"),
            Self::InvalidValue => f.write_str("invalid value"),
            Self::UnknownChoice(tag) => write!(f, "unknown choice [{tag}]"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}
