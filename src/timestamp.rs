use std::cmp;
use std::convert::TryFrom;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use byteorder::{BigEndian, ReadBytesExt};
use serde::{
    de::{Deserialize, Deserializer, Error},
    ser::{Serialize, Serializer},
};
use serde_bytes::ByteBuf;

use crate::marker::{ExtType, EXT_TYPE_TIMESTAMP};

const MAX_NANOSEC: u32 = 999_999_999;

/// Structure for holding a MessagePack timestamp: seconds since the Unix epoch, plus nanoseconds.
///
/// Encodes as MessagePack's timestamp extension (type -1), using the 32-bit, 64-bit, or 96-bit
/// form, whichever is smallest. Any struct field of this type survives an encode/decode round
/// trip, in both struct modes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Timestamp {
    sec: i64,
    nano: u32,
}

impl Timestamp {
    /// Create a timestamp from a raw seconds + nanoseconds value. Fails if nanoseconds is a full
    /// second or more.
    pub fn from_utc(sec: i64, nano: u32) -> Option<Timestamp> {
        if nano > MAX_NANOSEC {
            None
        } else {
            Some(Timestamp { sec, nano })
        }
    }

    pub fn from_sec(sec: i64) -> Timestamp {
        Timestamp { sec, nano: 0 }
    }

    /// Minimum possible time that can be represented
    pub fn min_value() -> Timestamp {
        Timestamp {
            sec: i64::MIN,
            nano: 0,
        }
    }

    /// Maximum possible time that can be represented
    pub fn max_value() -> Timestamp {
        Timestamp {
            sec: i64::MAX,
            nano: MAX_NANOSEC,
        }
    }

    /// Seconds since the Unix epoch. Negative for times before it.
    pub fn seconds(&self) -> i64 {
        self.sec
    }

    /// Nanoseconds past [`seconds`](Self::seconds). Always under one second.
    pub fn subsec_nanos(&self) -> u32 {
        self.nano
    }

    /// Shift the timestamp forward by whole seconds, or `None` if that leaves the `i64` range.
    pub fn checked_add_secs(self, secs: i64) -> Option<Timestamp> {
        let sec = self.sec.checked_add(secs)?;
        Some(Timestamp { sec, ..self })
    }

    /// Shift the timestamp back by whole seconds, or `None` if that leaves the `i64` range.
    pub fn checked_sub_secs(self, secs: i64) -> Option<Timestamp> {
        let sec = self.sec.checked_sub(secs)?;
        Some(Timestamp { sec, ..self })
    }

    /// Convert into a byte vector holding the extension data (not including the ext header). For
    /// extending an existing byte vector, see [`encode_vec`](Self::encode_vec).
    pub fn as_vec(&self) -> Vec<u8> {
        let mut v = Vec::new();
        self.encode_vec(&mut v);
        v
    }

    /// Encode the extension data onto a byte vector, in one of 3 formats:
    /// 1. If nanoseconds is zero & seconds maps to a u32, the seconds as big-endian u32.
    /// 2. If seconds fits in 34 unsigned bits, nanoseconds in the upper 30 bits and seconds in
    ///    the lower 34 bits of a big-endian u64.
    /// 3. Otherwise, the nanoseconds as big-endian u32, then the seconds as big-endian i64.
    pub fn encode_vec(&self, vec: &mut Vec<u8>) {
        if self.sec >> 34 == 0 {
            let data64 = ((self.nano as u64) << 34) | (self.sec as u64);
            if data64 & 0xffff_ffff_0000_0000 == 0 {
                vec.extend_from_slice(&(data64 as u32).to_be_bytes());
            } else {
                vec.extend_from_slice(&data64.to_be_bytes());
            }
        } else {
            vec.reserve(4 + 8);
            vec.extend_from_slice(&self.nano.to_be_bytes());
            vec.extend_from_slice(&self.sec.to_be_bytes());
        }
    }

    pub fn size(&self) -> usize {
        if self.sec >> 34 == 0 {
            if self.nano == 0 && self.sec >> 32 == 0 {
                4
            } else {
                8
            }
        } else {
            12
        }
    }
}

impl cmp::Ord for Timestamp {
    fn cmp(&self, other: &Timestamp) -> cmp::Ordering {
        (self.sec, self.nano).cmp(&(other.sec, other.nano))
    }
}

impl cmp::PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Timestamp) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "UTC: {} sec + {} ns", self.sec, self.nano)
    }
}

impl TryFrom<SystemTime> for Timestamp {
    type Error = String;
    fn try_from(value: SystemTime) -> Result<Self, Self::Error> {
        match value.duration_since(UNIX_EPOCH) {
            Ok(t) => {
                let sec = i64::try_from(t.as_secs())
                    .map_err(|_| String::from("time is too far after the Unix epoch"))?;
                Ok(Timestamp {
                    sec,
                    nano: t.subsec_nanos(),
                })
            }
            Err(e) => {
                // Before the epoch: round the seconds down so nanoseconds stay positive
                let t = e.duration();
                let mut sec = -i64::try_from(t.as_secs())
                    .map_err(|_| String::from("time is too far before the Unix epoch"))?;
                let mut nano = t.subsec_nanos();
                if nano != 0 {
                    sec -= 1;
                    nano = 1_000_000_000 - nano;
                }
                Ok(Timestamp { sec, nano })
            }
        }
    }
}

impl From<Timestamp> for SystemTime {
    fn from(value: Timestamp) -> Self {
        if value.sec >= 0 {
            UNIX_EPOCH + Duration::new(value.sec as u64, value.nano)
        } else {
            UNIX_EPOCH - Duration::from_secs(value.sec.unsigned_abs())
                + Duration::from_nanos(value.nano as u64)
        }
    }
}

impl TryFrom<&[u8]> for Timestamp {
    type Error = String;
    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let mut raw = value;
        let read_err = |_| String::from("truncated timestamp");
        let (sec, nano) = match value.len() {
            4 => (raw.read_u32::<BigEndian>().map_err(read_err)? as i64, 0),
            8 => {
                let data64 = raw.read_u64::<BigEndian>().map_err(read_err)?;
                ((data64 & 0x0000_0003_ffff_ffff) as i64, (data64 >> 34) as u32)
            }
            12 => {
                let nano = raw.read_u32::<BigEndian>().map_err(read_err)?;
                let sec = raw.read_i64::<BigEndian>().map_err(read_err)?;
                (sec, nano)
            }
            _ => {
                return Err(format!(
                    "not a recognized Timestamp length ({} bytes)",
                    value.len()
                ))
            }
        };
        Timestamp::from_utc(sec, nano)
            .ok_or_else(|| format!("timestamp nanoseconds out of range ({})", nano))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let value = (ExtType::Timestamp.into_i8(), ByteBuf::from(self.as_vec()));
        serializer.serialize_newtype_struct(rmp_serde::MSGPACK_EXT_STRUCT_NAME, &value)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TimeVisitor;

        impl<'de> serde::de::Visitor<'de> for TimeVisitor {
            type Value = Timestamp;

            fn expecting(&self, fmt: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
                write!(fmt, "msgpack extension of type {}", EXT_TYPE_TIMESTAMP)
            }

            fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                let (tag, data): (i8, ByteBuf) = Deserialize::deserialize(deserializer)?;
                timestamp_from_ext(tag, &data).map_err(D::Error::custom)
            }
        }

        deserializer.deserialize_newtype_struct(rmp_serde::MSGPACK_EXT_STRUCT_NAME, TimeVisitor)
    }
}

/// Decode the data of an extension value as a timestamp, checking the extension type first.
pub(crate) fn timestamp_from_ext(tag: i8, data: &[u8]) -> Result<Timestamp, String> {
    if tag != EXT_TYPE_TIMESTAMP {
        return Err(format!(
            "expected extension type {} for a timestamp, got {}",
            EXT_TYPE_TIMESTAMP, tag
        ));
    }
    Timestamp::try_from(data)
}
