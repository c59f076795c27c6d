//! The compressed envelope.
//!
//! An envelope is a MessagePack ext value whose body holds an LZ4-compressed MessagePack payload.
//! It always uses one of the three variable-length ext opcodes, never a fixext one:
//!
//! ```text
//! +--------+=========+----------+----------+----------+==========+
//! | opcode |  size   | ext type |  format  | orig len |   data   |
//! +--------+=========+----------+----------+----------+==========+
//!     1     1/2/4 BE      1          1        4 BE     size - 6
//! ```
//!
//! - `opcode` is `0xc7` (ext8), `0xc8` (ext16), or `0xc9` (ext32), and selects the width of
//!   `size`.
//! - `size` counts every byte after it: the ext type, the format, the original length, and the
//!   compressed data. The encoder always picks the narrowest opcode that can hold it.
//! - `ext type` is always [`EXT_TYPE_LZ4`](crate::EXT_TYPE_LZ4).
//! - `format` is a [`Format`] byte; only [`FORMAT_LZ4_BLOCK`](crate::FORMAT_LZ4_BLOCK) exists.
//! - `orig len` is the exact length of the uncompressed MessagePack payload.
//!
//! A buffer that doesn't start with one of the three opcodes isn't an envelope at all, and is
//! read as plain MessagePack. A buffer that does start with one must be a well-formed envelope.

use std::convert::TryFrom;

use byteorder::{BigEndian, ReadBytesExt};

use crate::{
    compress::Format,
    error::{Error, Result},
    marker::{ExtType, SizeClass},
};

/// Bytes of envelope body ahead of the compressed data: ext type, format, and original length.
pub const ENVELOPE_OVERHEAD: usize = 1 + 1 + 4;

/// A parsed or ready-to-write envelope, borrowing its compressed data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Envelope<'a> {
    size_class: SizeClass,
    format: Format,
    original_len: u32,
    compressed: &'a [u8],
}

impl<'a> Envelope<'a> {
    /// Wrap an already-compressed block, using the narrowest size class that fits.
    pub fn new(format: Format, original_len: usize, compressed: &'a [u8]) -> Result<Self> {
        let body_len = Self::body_len_of(compressed)?;
        let size_class = SizeClass::for_len(body_len).ok_or(Error::LengthTooLong {
            max: SizeClass::Ext32.max_len(),
            actual: body_len,
        })?;
        Self::with_size_class(size_class, format, original_len, compressed)
    }

    /// Wrap an already-compressed block with a specific size class. Fails if the size class is
    /// too narrow for the block. Wider-than-needed classes are allowed, and decode identically.
    pub fn with_size_class(
        size_class: SizeClass,
        format: Format,
        original_len: usize,
        compressed: &'a [u8],
    ) -> Result<Self> {
        let body_len = Self::body_len_of(compressed)?;
        if body_len > size_class.max_len() {
            return Err(Error::LengthTooLong {
                max: size_class.max_len(),
                actual: body_len,
            });
        }
        let original_len = u32::try_from(original_len).map_err(|_| Error::LengthTooLong {
            max: u32::MAX as usize,
            actual: original_len,
        })?;
        Ok(Self {
            size_class,
            format,
            original_len,
            compressed,
        })
    }

    fn body_len_of(compressed: &[u8]) -> Result<usize> {
        compressed
            .len()
            .checked_add(ENVELOPE_OVERHEAD)
            .ok_or(Error::LengthTooLong {
                max: usize::MAX - ENVELOPE_OVERHEAD,
                actual: compressed.len(),
            })
    }

    /// Attempt to parse an envelope from the start of `buf`.
    ///
    /// Returns `Ok(None)` if the first byte isn't an envelope opcode, in which case the buffer
    /// should be read as plain MessagePack. Once the opcode matches, any inconsistency is an
    /// error. Bytes past the declared envelope size are ignored.
    pub fn split(buf: &'a [u8]) -> Result<Option<Self>> {
        let (&opcode, mut buf) = buf.split_first().ok_or(Error::LengthTooShort {
            step: "get envelope opcode",
            actual: 0,
            expected: 1,
        })?;
        let size_class = match SizeClass::from_u8(opcode) {
            Some(class) => class,
            None => return Ok(None),
        };

        let available = buf.len();
        let declared = match size_class {
            SizeClass::Ext8 => buf.read_u8().map(usize::from),
            SizeClass::Ext16 => buf.read_u16::<BigEndian>().map(usize::from),
            SizeClass::Ext32 => buf.read_u32::<BigEndian>().map(|v| v as usize),
        }
        .map_err(|_| Error::LengthTooShort {
            step: "get envelope size",
            actual: available,
            expected: size_class.field_len(),
        })?;

        if declared < ENVELOPE_OVERHEAD {
            return Err(Error::BadEnvelope(format!(
                "declared size {} is smaller than the {}-byte envelope header",
                declared, ENVELOPE_OVERHEAD
            )));
        }
        if buf.len() < declared {
            return Err(Error::LengthTooShort {
                step: "get envelope body",
                actual: buf.len(),
                expected: declared,
            });
        }
        let body = &buf[..declared];
        let (header, compressed) = body.split_at(ENVELOPE_OVERHEAD);

        let ext_type = header[0] as i8;
        if ExtType::from_i8(ext_type) != Some(ExtType::Lz4) {
            return Err(Error::UnknownExtType(ext_type));
        }
        let format = Format::try_from(header[1]).map_err(Error::UnknownFormat)?;
        let original_len = u32::from_be_bytes([header[2], header[3], header[4], header[5]]);

        Ok(Some(Self {
            size_class,
            format,
            original_len,
            compressed,
        }))
    }

    pub fn size_class(&self) -> SizeClass {
        self.size_class
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Length of the payload before compression.
    pub fn original_len(&self) -> usize {
        self.original_len as usize
    }

    pub fn compressed(&self) -> &'a [u8] {
        self.compressed
    }

    /// Value written into the size field.
    pub fn body_len(&self) -> usize {
        ENVELOPE_OVERHEAD + self.compressed.len()
    }

    /// Total encoded size of the envelope.
    pub fn size(&self) -> usize {
        1 + self.size_class.field_len() + self.body_len()
    }

    /// Encode the envelope onto the end of a byte vector.
    pub fn encode_vec(&self, buf: &mut Vec<u8>) {
        buf.reserve(self.size());
        self.size_class.encode_ext_marker(buf, self.body_len());
        buf.push(ExtType::Lz4.into_i8() as u8);
        buf.push(self.format.into());
        buf.extend_from_slice(&self.original_len.to_be_bytes());
        buf.extend_from_slice(self.compressed);
    }

    /// Convert into a byte vector. For extending an existing byte vector, see
    /// [`encode_vec`](Self::encode_vec).
    pub fn as_vec(&self) -> Vec<u8> {
        let mut v = Vec::new();
        self.encode_vec(&mut v);
        v
    }
}

/// Check if a buffer starts with a complete envelope header this crate can decompress. Doesn't
/// attempt decompression.
pub fn is_compressed(buf: &[u8]) -> bool {
    matches!(Envelope::split(buf), Ok(Some(_)))
}
