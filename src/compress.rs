use std::{convert::TryFrom, fmt, io};

use lz4::block::CompressionMode;

#[derive(Debug)]
pub enum CompressionError {
    /// The LZ4 library reported a failure.
    Lz4Inner(io::Error),
    /// Decompressed size didn't match the size promised by the envelope.
    SizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for CompressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionError::Lz4Inner(err) => write!(f, "lz4 failure ({})", err),
            CompressionError::SizeMismatch { expected, actual } => write!(
                f,
                "Decompressed size is {} bytes, but envelope promised {}",
                actual, expected
            ),
        }
    }
}

impl std::error::Error for CompressionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompressionError::Lz4Inner(err) => Some(err),
            CompressionError::SizeMismatch { .. } => None,
        }
    }
}

impl From<io::Error> for CompressionError {
    fn from(value: io::Error) -> Self {
        CompressionError::Lz4Inner(value)
    }
}

/// The compression format identifier for a single raw LZ4 block, compressed in high-compression
/// mode and stored without a size prefix.
pub const FORMAT_LZ4_BLOCK: u8 = 0xd2;

/// Largest input the LZ4 block API accepts (`LZ4_MAX_INPUT_SIZE`).
pub const LZ4_MAX_INPUT_SIZE: usize = 0x7E00_0000;

/// Default LZ4 HC compression level (`LZ4HC_CLEVEL_DEFAULT`).
pub const DEFAULT_LEVEL: u8 = 9;

/// Highest LZ4 HC compression level (`LZ4HC_CLEVEL_MAX`).
pub const MAX_LEVEL: u8 = 12;

/// Compression formats a decoder knows how to undo. Encoded as the single byte following the
/// extension type inside an envelope.
///
/// Only one format exists today. Unrecognized bytes must be rejected, never guessed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Single LZ4 block, high-compression mode
    Lz4Block,
}

impl From<Format> for u8 {
    fn from(val: Format) -> u8 {
        match val {
            Format::Lz4Block => FORMAT_LZ4_BLOCK,
        }
    }
}

impl TryFrom<u8> for Format {
    type Error = u8;
    fn try_from(val: u8) -> Result<Format, u8> {
        match val {
            FORMAT_LZ4_BLOCK => Ok(Format::Lz4Block),
            _ => Err(val),
        }
    }
}

impl Format {
    /// Compress `src` as a single block at the given level, returning the compressed bytes.
    pub(crate) fn compress(&self, src: &[u8], level: u8) -> Result<Vec<u8>, CompressionError> {
        match self {
            Format::Lz4Block => lz4_compress(src, level),
        }
    }

    /// Upper bound on how many bytes a compressed block of `compressed_len` bytes can expand to.
    /// An LZ4 match length grows by at most 255 per input byte.
    pub(crate) fn max_expansion(&self, compressed_len: usize) -> usize {
        match self {
            Format::Lz4Block => compressed_len.saturating_mul(255).saturating_add(16),
        }
    }

    /// Decompress `src` into a buffer of exactly `original_len` bytes. Fails if the block is
    /// corrupt or doesn't fill the buffer exactly.
    pub(crate) fn decompress(
        &self,
        src: &[u8],
        original_len: usize,
    ) -> Result<Vec<u8>, CompressionError> {
        match self {
            Format::Lz4Block => lz4_decompress(src, original_len),
        }
    }
}

fn lz4_compress(input: &[u8], level: u8) -> Result<Vec<u8>, CompressionError> {
    let mut output = vec![0u8; lz4::block::compress_bound(input.len())?];
    let mode = CompressionMode::HIGHCOMPRESSION(level.clamp(1, MAX_LEVEL) as i32);
    let used_len = lz4::block::compress_to_buffer(input, Some(mode), false, &mut output)?;
    output.truncate(used_len);
    Ok(output)
}

fn lz4_decompress(input: &[u8], original_len: usize) -> Result<Vec<u8>, CompressionError> {
    let size = i32::try_from(original_len).map_err(|_| {
        CompressionError::Lz4Inner(io::Error::new(
            io::ErrorKind::InvalidInput,
            "original length exceeds the lz4 block limit",
        ))
    })?;
    let mut output = vec![0u8; original_len];
    let used_len = lz4::block::decompress_to_buffer(input, Some(size), &mut output)?;
    if used_len != original_len {
        return Err(CompressionError::SizeMismatch {
            expected: original_len,
            actual: used_len,
        });
    }
    Ok(output)
}
