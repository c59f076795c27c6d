use std::convert::TryFrom;
use std::fmt;

use serde::{
    de::{Deserialize, Deserializer, Visitor},
    ser::{Serialize, Serializer},
};

/// Sign-split storage. Variant order gives the numeric order: every negative value sorts before
/// every non-negative one.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Repr {
    /// Always below zero.
    Neg(i64),
    /// Always zero or above.
    Pos(u64),
}

/// A MessagePack integer: anything from `i64::MIN` up to `u64::MAX`.
///
/// MessagePack only cares about the numeric value, not the width or signedness it was written
/// with, so `Integer::from(7u8) == Integer::from(7i64)`. Convert back into a Rust integer with
/// `TryFrom`, which fails rather than truncating.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Integer(Repr);

impl Default for Repr {
    fn default() -> Self {
        Repr::Pos(0)
    }
}

impl Integer {
    /// Smallest representable value, `i64::MIN`.
    pub fn min_value() -> Integer {
        Integer(Repr::Neg(i64::MIN))
    }

    /// Largest representable value, `u64::MAX`.
    pub fn max_value() -> Integer {
        Integer(Repr::Pos(u64::MAX))
    }

    pub fn is_i64(&self) -> bool {
        self.as_i64().is_some()
    }

    pub fn is_u64(&self) -> bool {
        matches!(self.0, Repr::Pos(_))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.0 {
            Repr::Neg(n) => Some(n),
            Repr::Pos(n) => i64::try_from(n).ok(),
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.0 {
            Repr::Neg(_) => None,
            Repr::Pos(n) => Some(n),
        }
    }
}

impl fmt::Debug for Integer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            Repr::Neg(n) => write!(f, "{}", n),
            Repr::Pos(n) => write!(f, "{}", n),
        }
    }
}

macro_rules! integer_conversions {
    (unsigned: $($u:ty),*; signed: $($s:ty),*) => {
        $(
            impl From<$u> for Integer {
                fn from(n: $u) -> Self {
                    Integer(Repr::Pos(n as u64))
                }
            }
        )*
        $(
            impl From<$s> for Integer {
                fn from(n: $s) -> Self {
                    let n = n as i64;
                    Integer(if n < 0 { Repr::Neg(n) } else { Repr::Pos(n as u64) })
                }
            }
        )*
        $(
            impl TryFrom<Integer> for $u {
                type Error = Integer;
                fn try_from(v: Integer) -> Result<Self, Integer> {
                    v.as_u64().and_then(|n| <$u>::try_from(n).ok()).ok_or(v)
                }
            }
        )*
        $(
            impl TryFrom<Integer> for $s {
                type Error = Integer;
                fn try_from(v: Integer) -> Result<Self, Integer> {
                    v.as_i64().and_then(|n| <$s>::try_from(n).ok()).ok_or(v)
                }
            }
        )*
    };
}

integer_conversions!(unsigned: u8, u16, u32, u64, usize; signed: i8, i16, i32, i64, isize);

impl Serialize for Integer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Repr::Neg(n) => serializer.serialize_i64(n),
            Repr::Pos(n) => serializer.serialize_u64(n),
        }
    }
}

impl<'de> Deserialize<'de> for Integer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IntegerVisitor;

        impl<'de> Visitor<'de> for IntegerVisitor {
            type Value = Integer;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a MessagePack integer")
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Integer, E> {
                Ok(Integer::from(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Integer, E> {
                Ok(Integer::from(v))
            }
        }

        deserializer.deserialize_any(IntegerVisitor)
    }
}
