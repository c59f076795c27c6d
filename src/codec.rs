//! Encoding & decoding of compressed MessagePack.
//!
//! A [`Codec`] holds the settings for both directions. It is plain configuration, so it can be
//! copied freely and shared across threads; every call works only on its own buffers.
//!
//! Encoding always compresses and always wraps the result in an [envelope](crate::envelope),
//! even when compression makes the payload larger. Decoding accepts envelopes and plain
//! MessagePack alike.

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, trace, warn};

use crate::{
    compress::{Format, DEFAULT_LEVEL, LZ4_MAX_INPUT_SIZE, MAX_LEVEL},
    envelope::Envelope,
    error::{Error, Result},
    value::Value,
};

/// The largest uncompressed MessagePack payload that can be encoded or decoded.
pub const MAX_PLAIN_LEN: usize = LZ4_MAX_INPUT_SIZE;

/// How structs are laid out in MessagePack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StructMode {
    /// Structs are maps keyed by field name.
    #[default]
    Named,
    /// Structs are arrays of field values, in declaration order. More compact, but the decoding
    /// side must agree on field order and count.
    Positional,
}

/// Settings for encoding and decoding compressed MessagePack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Codec {
    mode: StructMode,
    level: u8,
    max_decoded_len: usize,
}

impl std::default::Default for Codec {
    fn default() -> Self {
        Self {
            mode: StructMode::Named,
            level: DEFAULT_LEVEL,
            max_decoded_len: MAX_PLAIN_LEN,
        }
    }
}

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how structs are laid out.
    pub fn mode(mut self, mode: StructMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the LZ4 high-compression level. Values are clamped to 1-12.
    pub fn level(mut self, level: u8) -> Self {
        self.level = level.clamp(1, MAX_LEVEL);
        self
    }

    /// Limit how large a decompressed payload may be. Envelopes claiming a larger original
    /// length are rejected before anything is allocated. Can't be raised past
    /// [`MAX_PLAIN_LEN`].
    pub fn max_decoded_len(mut self, max: usize) -> Self {
        self.max_decoded_len = max.min(MAX_PLAIN_LEN);
        self
    }

    pub fn get_mode(&self) -> StructMode {
        self.mode
    }

    pub fn get_level(&self) -> u8 {
        self.level
    }

    pub fn get_max_decoded_len(&self) -> usize {
        self.max_decoded_len
    }

    /// Serialize a value as MessagePack, compress it, and wrap it in an envelope.
    ///
    /// Fails if the value can't be serialized, or if the serialized form is too large to
    /// compress.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        let plain = match self.mode {
            StructMode::Named => rmp_serde::to_vec_named(value)?,
            StructMode::Positional => rmp_serde::to_vec(value)?,
        };
        if plain.len() > MAX_PLAIN_LEN {
            return Err(Error::LengthTooLong {
                max: MAX_PLAIN_LEN,
                actual: plain.len(),
            });
        }

        let format = Format::Lz4Block;
        let compressed = format
            .compress(&plain, self.level)
            .map_err(Error::Compress)?;
        let envelope = Envelope::new(format, plain.len(), &compressed)?;
        trace!(
            plain = plain.len(),
            compressed = compressed.len(),
            size_class = ?envelope.size_class(),
            "encoded envelope"
        );
        Ok(envelope.as_vec())
    }

    /// Decode a buffer produced by [`encode`](Self::encode), or a plain MessagePack buffer.
    ///
    /// A buffer starting with an ext8/ext16/ext32 opcode must be a valid envelope; anything else
    /// is handed straight to the MessagePack decoder.
    pub fn decode<T: DeserializeOwned>(&self, buf: &[u8]) -> Result<T> {
        let envelope = match Envelope::split(buf) {
            Ok(Some(envelope)) => envelope,
            Ok(None) => {
                debug!(len = buf.len(), "no envelope, decoding as plain msgpack");
                return Ok(rmp_serde::from_slice(buf)?);
            }
            Err(e) => {
                warn!(len = buf.len(), "rejected envelope: {}", e);
                return Err(e);
            }
        };

        let original_len = envelope.original_len();
        if original_len > self.max_decoded_len {
            warn!(
                original_len,
                max = self.max_decoded_len,
                "envelope original length over limit"
            );
            return Err(Error::LengthTooLong {
                max: self.max_decoded_len,
                actual: original_len,
            });
        }

        let bound = envelope.format().max_expansion(envelope.compressed().len());
        if original_len > bound {
            warn!(
                original_len,
                compressed = envelope.compressed().len(),
                "envelope original length can't come from its compressed block"
            );
            return Err(Error::LengthTooLong {
                max: bound,
                actual: original_len,
            });
        }

        let plain = envelope
            .format()
            .decompress(envelope.compressed(), original_len)
            .map_err(|e| {
                warn!("envelope failed to decompress: {}", e);
                Error::FailDecompress(e)
            })?;
        trace!(
            compressed = envelope.compressed().len(),
            plain = plain.len(),
            size_class = ?envelope.size_class(),
            "decompressed envelope"
        );
        Ok(rmp_serde::from_slice(&plain)?)
    }

    /// Encode a [`Value`].
    pub fn encode_value(&self, value: &Value) -> Result<Vec<u8>> {
        self.encode(value)
    }

    /// Decode into a [`Value`], without needing to know the payload's shape ahead of time.
    pub fn decode_value(&self, buf: &[u8]) -> Result<Value> {
        self.decode(buf)
    }
}

/// Encode a value with default settings, laying out structs as maps.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Codec::new().encode(value)
}

/// Encode a value with default settings, laying out structs as positional arrays.
pub fn encode_as_array<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Codec::new().mode(StructMode::Positional).encode(value)
}

/// Decode a buffer made by [`encode`], or a plain MessagePack buffer.
pub fn decode<T: DeserializeOwned>(buf: &[u8]) -> Result<T> {
    Codec::new().decode(buf)
}

/// Decode a buffer made by [`encode_as_array`], or a plain MessagePack buffer.
pub fn decode_as_array<T: DeserializeOwned>(buf: &[u8]) -> Result<T> {
    Codec::new().mode(StructMode::Positional).decode(buf)
}
