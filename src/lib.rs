//! lz4-pack is MessagePack with transparent LZ4 compression. Any `serde` value can be encoded
//! into a single buffer that's smaller than its plain MessagePack form, and decoded back without
//! the caller needing to know whether compression was applied.
//!
//! Encoding takes three steps:
//!
//! 1. Serialize the value as MessagePack, with structs either as maps keyed by field name
//!    ([`encode`]) or as positional arrays ([`encode_as_array`]).
//! 2. Compress the MessagePack as a single LZ4 block, in high-compression mode.
//! 3. Wrap the block in an [envelope](envelope): a MessagePack ext value of type
//!    [`EXT_TYPE_LZ4`], tagged with the compression format and the original length.
//!
//! Decoding reverses this. Buffers that don't start with an envelope are read as plain
//! MessagePack, so anything a standard MessagePack encoder produced can be decoded too, as long
//! as it doesn't open with an ext8/ext16/ext32 value.
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct Message {
//!     id: u32,
//!     lines: Vec<String>,
//! }
//!
//! let msg = Message { id: 42, lines: vec!["Hello World".to_string(); 100] };
//! let encoded = lz4_pack::encode(&msg).unwrap();
//! let decoded: Message = lz4_pack::decode(&encoded).unwrap();
//! assert_eq!(decoded, msg);
//! ```
//!
//! Values of unknown shape can be decoded into a [`Value`], and MessagePack timestamps map to
//! [`Timestamp`].

mod codec;
mod compress;
pub mod envelope;
pub mod error;
mod integer;
mod marker;
mod timestamp;
mod value;

pub use self::codec::{decode, decode_as_array, encode, encode_as_array, Codec, StructMode};
pub use self::codec::MAX_PLAIN_LEN;
pub use self::compress::{CompressionError, Format, FORMAT_LZ4_BLOCK};
pub use self::envelope::{is_compressed, Envelope, ENVELOPE_OVERHEAD};
pub use self::error::{Error, Result};
pub use self::integer::Integer;
pub use self::marker::{SizeClass, EXT_TYPE_LZ4, EXT_TYPE_TIMESTAMP};
pub use self::timestamp::Timestamp;
pub use self::value::{from_value, to_value, Value};
