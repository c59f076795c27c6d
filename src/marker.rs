use std::convert::TryFrom;

/// MessagePack ext opcodes that can open a compressed envelope.
///
/// Each one selects the width of the big-endian size field that follows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeClass {
    Ext8,
    Ext16,
    Ext32,
}

impl SizeClass {
    /// Construct a size class from a single byte. Returns `None` for every byte that isn't one of
    /// the three ext opcodes, including the fixext opcodes.
    pub fn from_u8(n: u8) -> Option<SizeClass> {
        match n {
            0xc7 => Some(SizeClass::Ext8),
            0xc8 => Some(SizeClass::Ext16),
            0xc9 => Some(SizeClass::Ext32),
            _ => None,
        }
    }

    pub fn into_u8(self) -> u8 {
        match self {
            SizeClass::Ext8 => 0xc7,
            SizeClass::Ext16 => 0xc8,
            SizeClass::Ext32 => 0xc9,
        }
    }

    /// Number of bytes in the size field following the opcode.
    pub fn field_len(self) -> usize {
        match self {
            SizeClass::Ext8 => 1,
            SizeClass::Ext16 => 2,
            SizeClass::Ext32 => 4,
        }
    }

    /// Largest body length the size field can hold.
    pub fn max_len(self) -> usize {
        match self {
            SizeClass::Ext8 => u8::MAX as usize,
            SizeClass::Ext16 => u16::MAX as usize,
            SizeClass::Ext32 => u32::MAX as usize,
        }
    }

    /// Pick the smallest size class able to hold a body of `len` bytes. Returns `None` if even
    /// ext32 can't.
    pub fn for_len(len: usize) -> Option<SizeClass> {
        [SizeClass::Ext8, SizeClass::Ext16, SizeClass::Ext32]
            .into_iter()
            .find(|class| len <= class.max_len())
    }

    /// Write the opcode and the big-endian size field. Panics if `len` doesn't fit; callers pick
    /// the class with [`for_len`](Self::for_len) first.
    pub fn encode_ext_marker(self, buf: &mut Vec<u8>, len: usize) {
        assert!(len <= self.max_len());
        buf.push(self.into());
        match self {
            SizeClass::Ext8 => buf.push(len as u8),
            SizeClass::Ext16 => buf.extend_from_slice(&(len as u16).to_be_bytes()),
            SizeClass::Ext32 => buf.extend_from_slice(&(len as u32).to_be_bytes()),
        }
    }
}

impl TryFrom<u8> for SizeClass {
    type Error = u8;
    fn try_from(val: u8) -> Result<SizeClass, u8> {
        SizeClass::from_u8(val).ok_or(val)
    }
}

impl From<SizeClass> for u8 {
    fn from(val: SizeClass) -> u8 {
        val.into_u8()
    }
}

/// Extension type carrying an LZ4-compressed MessagePack payload.
pub const EXT_TYPE_LZ4: i8 = 99;

/// MessagePack's own timestamp extension type.
pub const EXT_TYPE_TIMESTAMP: i8 = -1;

/// Defines the Ext Types that this library relies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtType {
    Timestamp,
    Lz4,
}

impl ExtType {
    /// Return the assigned extension type.
    pub fn into_i8(self) -> i8 {
        match self {
            ExtType::Timestamp => EXT_TYPE_TIMESTAMP,
            ExtType::Lz4 => EXT_TYPE_LZ4,
        }
    }

    /// Convert from assigned extension type. Returns `None` if type isn't recognized.
    pub fn from_i8(v: i8) -> Option<ExtType> {
        match v {
            EXT_TYPE_TIMESTAMP => Some(ExtType::Timestamp),
            EXT_TYPE_LZ4 => Some(ExtType::Lz4),
            _ => None,
        }
    }
}

impl From<ExtType> for i8 {
    fn from(val: ExtType) -> i8 {
        val.into_i8()
    }
}
