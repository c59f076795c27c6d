use crate::compress::CompressionError;
use std::fmt;

use serde::{de, ser};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum Error {
    /// Occurs when the value can't be serialized to MessagePack, usually because it contains a
    /// type with no MessagePack representation.
    Encode(rmp_serde::encode::Error),
    /// Occurs when the LZ4 compressor rejects the serialized payload.
    Compress(CompressionError),
    /// Buffer ended before the step could read everything the envelope promised.
    LengthTooShort {
        step: &'static str,
        actual: usize,
        expected: usize,
    },
    /// Payload or envelope length is larger than can be encoded, or larger than the decoder is
    /// allowed to allocate.
    LengthTooLong { max: usize, actual: usize },
    /// Envelope opcode matched, but the header is internally inconsistent.
    BadEnvelope(String),
    /// Envelope opcode matched, but the extension type isn't ours.
    UnknownExtType(i8),
    /// Envelope opcode and extension type matched, but the compression format is not supported.
    UnknownFormat(u8),
    /// LZ4 block didn't decompress to exactly the declared original length.
    FailDecompress(CompressionError),
    /// The (possibly decompressed) payload isn't valid MessagePack, or doesn't fit the target
    /// type.
    Decode(rmp_serde::decode::Error),
    /// Occurs when a serde impl in this crate rejects a value
    SerdeFail(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Encode(ref err) => write!(f, "MessagePack encoding failed: {}", err),
            Error::Compress(ref err) => write!(f, "Failed compression step: {}", err),
            Error::LengthTooShort {
                step,
                actual,
                expected,
            } => write!(
                f,
                "Expected data length {}, but got {} on step [{}]",
                expected, actual, step
            ),
            Error::LengthTooLong { max, actual } => write!(
                f,
                "Data too long: was {} bytes, maximum allowed is {}",
                actual, max
            ),
            Error::BadEnvelope(ref err) => write!(f, "Malformed envelope: {}", err),
            Error::UnknownExtType(ty) => write!(
                f,
                "Envelope has extension type {}, expected {}",
                ty,
                crate::EXT_TYPE_LZ4
            ),
            Error::UnknownFormat(format) => {
                write!(f, "Unsupported compression format 0x{:02x}", format)
            }
            Error::FailDecompress(ref err) => write!(f, "Failed decompression step: {}", err),
            Error::Decode(ref err) => write!(f, "MessagePack decoding failed: {}", err),
            Error::SerdeFail(ref msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Encode(ref err) => Some(err),
            Error::Compress(ref err) => Some(err),
            Error::FailDecompress(ref err) => Some(err),
            Error::Decode(ref err) => Some(err),
            _ => None,
        }
    }
}

impl std::convert::From<rmp_serde::encode::Error> for Error {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Self::Encode(e)
    }
}

impl std::convert::From<rmp_serde::decode::Error> for Error {
    fn from(e: rmp_serde::decode::Error) -> Self {
        Self::Decode(e)
    }
}

impl ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::SerdeFail(msg.to_string())
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::SerdeFail(msg.to_string())
    }
}
