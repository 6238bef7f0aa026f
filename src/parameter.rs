/*!
    The object dictionary entry and its local store representation.

    A [Parameter] couples the identity `(index, subindex)` with the metadata announced by the
    device (name, widths, data type, object code, flag sets) and the raw value buffer. The
    typed accessors interpret that buffer through the [crate::data] codec, with a raw bytes
    escape hatch for entries whose declared type the client does not model.

    Parameters serialize to JSON with camelCase keys and the enumerated fields emitted as their
    numeric codes, so that a dump can be fed back unchanged.
*/

use core::cmp::Ordering;
use core::fmt;
use core::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::data::{self, FromValue, Value};
use crate::error::{EthernetError, EthernetResult};
use crate::objects::Object;

/// object code of a dictionary entry, the kind of object it is
#[repr(u16)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ObjectCode {
    Deftype = 0x0005,
    Defstruct = 0x0006,
    Var = 0x0007,
    Array = 0x0008,
    Record = 0x0009,
}

impl TryFrom<u16> for ObjectCode {
    type Error = u16;
    fn try_from(code: u16) -> Result<Self, u16> {
        Ok(match code {
            0x0005 => Self::Deftype,
            0x0006 => Self::Defstruct,
            0x0007 => Self::Var,
            0x0008 => Self::Array,
            0x0009 => Self::Record,
            _ => return Err(code),
        })
    }
}

/**
    flag set of a dictionary entry

    One bit set serves both the `flags` field (PDO mapping eligibility, backup, startup) and
    the `access` field (read/write permission per communication state PO/SO/OP). The constants
    follow the device's own numbering so the raw word can be stored and compared directly.
*/
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectFlags(pub u16);

impl ObjectFlags {
    pub const NONE: Self = Self(0x0000);

    pub const PO_RD: Self = Self(0x0001);
    pub const SO_RD: Self = Self(0x0002);
    pub const OP_RD: Self = Self(0x0004);
    pub const ALL_RD: Self = Self(0x0007);

    pub const PO_WR: Self = Self(0x0008);
    pub const SO_WR: Self = Self(0x0010);
    pub const OP_WR: Self = Self(0x0020);
    pub const ALL_WR: Self = Self(0x0038);

    pub const PO_RDWR: Self = Self(0x0009);
    pub const SO_RDWR: Self = Self(0x0012);
    pub const OP_RDWR: Self = Self(0x0024);
    pub const ALL_RDWR: Self = Self(0x003f);

    pub const RXPDO_MAP: Self = Self(0x0040);
    pub const TXPDO_MAP: Self = Self(0x0080);
    pub const RXTXPDO_MAP: Self = Self(0x00c0);

    pub const BACKUP: Self = Self(0x0100);
    pub const STARTUP: Self = Self(0x0200);

    pub const ALL_LIST_FLAGS: Self = Self(0x03c0);

    /// true if every bit of `other` is set in `self`
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
    /// true if any bit of `other` is set in `self`
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ObjectFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}
impl BitOrAssign for ObjectFlags {
    fn bitor_assign(&mut self, rhs: Self) { self.0 |= rhs.0 }
}
impl BitAnd for ObjectFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self { Self(self.0 & rhs.0) }
}

impl fmt::Display for ObjectFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/**
    one entry of the device's object dictionary

    The value lives in [Self::data] as the raw little endian buffer exchanged with the device.
    [Self::value] and the typed getters decode it according to [Self::data_type], which is kept
    as the raw 16 bit code so that entries with types unknown to this client survive a dictionary
    fetch (their value stays accessible through [Self::data]).

    Entries order by `(index, subindex)` and compare equal on that identity alone.
*/
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    #[serde(default)]
    pub name: String,
    pub index: u16,
    pub subindex: u8,
    /// announced size in bits
    pub bit_length: u16,
    /// size of [Self::data] in bytes, `ceil(bit_length / 8)` after a dictionary fetch
    pub byte_length: usize,
    /// raw data type code, see [crate::data::ObjectDataType] for the known values
    pub data_type: u16,
    /// raw object code, see [ObjectCode] for the known values
    pub code: u16,
    /// PDO mapping eligibility and list flags
    pub flags: ObjectFlags,
    /// read/write permission per communication state
    pub access: ObjectFlags,
    /// raw value buffer, little endian
    #[serde(default)]
    pub data: Vec<u8>,
}

impl Parameter {
    /// blank entry with the given identity and data type, mostly for tests and manual setups
    pub fn new(index: u16, subindex: u8, data_type: data::ObjectDataType) -> Self {
        Self {
            index,
            subindex,
            data_type: data_type as u16,
            .. Self::default()
        }
    }

    /// the entry's dictionary address
    pub fn object(&self) -> Object {
        Object::sub(self.index, self.subindex)
    }

    /// decode the raw buffer according to the declared data type
    pub fn value(&self) -> EthernetResult<Value> {
        data::decode(self.data_type, &self.data)
    }

    /// decoded value as type `T`, failing on a type mismatch
    pub fn get<T: FromValue>(&self) -> EthernetResult<T> {
        let value = self.value()?;
        T::from_value(&value).ok_or(EthernetError::TypeMismatch {
            expected: T::KIND,
            got: value.kind(),
        })
    }

    /// decoded value as type `T`, `None` on any mismatch or codec failure
    pub fn try_get<T: FromValue>(&self) -> Option<T> {
        T::from_value(&self.value().ok()?)
    }

    /**
        re-encode the buffer from the given value

        The value must match the declared data type ([Value::Bytes] replaces the buffer
        verbatim instead). [Self::byte_length] is reset to the encoded length.
    */
    pub fn set_value(&mut self, value: Value) -> EthernetResult<()> {
        self.data = data::encode(self.data_type, &value, self.byte_length)?;
        self.byte_length = self.data.len();
        Ok(())
    }

    /**
        set the value only if `T` matches the type expected for the declared data type

        A raw byte vector is always accepted. Returns whether the value was stored.
    */
    pub fn try_set<T: Into<Value>>(&mut self, value: T) -> bool {
        let value = value.into();
        match value.kind() {
            data::ValueKind::Bytes => self.set_value(value).is_ok(),
            kind => {
                data::expected_kind(self.data_type) == Some(kind)
                    && self.set_value(value).is_ok()
            }
        }
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.subindex == other.subindex
    }
}
impl Eq for Parameter {}

impl PartialOrd for Parameter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Parameter {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.index, self.subindex).cmp(&(other.index, other.subindex))
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\" bits:{} type:{:#06x} flags:{} access:{}",
            self.object(), self.name, self.bit_length, self.data_type, self.flags, self.access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ObjectDataType;

    fn position_actual() -> Parameter {
        let mut parameter = Parameter::new(0x6064, 0, ObjectDataType::Integer32);
        parameter.name = "Position actual value".into();
        parameter.bit_length = 32;
        parameter.byte_length = 4;
        parameter.code = ObjectCode::Var as u16;
        parameter.flags = ObjectFlags::TXPDO_MAP;
        parameter.access = ObjectFlags::ALL_RD;
        parameter.data = vec![0; 4];
        parameter
    }

    #[test]
    fn typed_roundtrip() {
        let mut parameter = position_actual();
        parameter.set_value(Value::I32(-250_000)).unwrap();
        assert_eq!(parameter.get::<i32>().unwrap(), -250_000);
        assert_eq!(parameter.byte_length, 4);
        assert_eq!(parameter.data.len(), 4);
    }

    #[test]
    fn typed_getter_checks_the_type() {
        let parameter = position_actual();
        assert!(matches!(
            parameter.get::<u32>(),
            Err(EthernetError::TypeMismatch { .. }),
        ));
        assert_eq!(parameter.try_get::<u32>(), None);
        assert_eq!(parameter.try_get::<i32>(), Some(0));
    }

    #[test]
    fn try_set_rejects_foreign_types() {
        let mut parameter = position_actual();
        assert!(!parameter.try_set(12u16));
        assert!(parameter.try_set(12i32));
        assert_eq!(parameter.get::<i32>().unwrap(), 12);
        // the raw escape hatch always passes
        assert!(parameter.try_set(vec![0x01, 0x02]));
        assert_eq!(parameter.data, [0x01, 0x02]);
        assert_eq!(parameter.byte_length, 2);
    }

    #[test]
    fn ordering_by_identity() {
        let mut a = Parameter::new(0x6040, 0, ObjectDataType::Unsigned16);
        let b = Parameter::new(0x6040, 1, ObjectDataType::Unsigned16);
        let c = Parameter::new(0x6041, 0, ObjectDataType::Unsigned16);
        assert!(a < b && b < c);
        // equality is on identity, not content
        a.name = "Controlword".into();
        assert_eq!(a, Parameter::new(0x6040, 0, ObjectDataType::Unsigned8));
    }

    #[test]
    fn json_uses_numeric_codes() {
        let parameter = position_actual();
        let json = serde_json::to_value(&parameter).unwrap();
        assert_eq!(json["index"], 0x6064);
        assert_eq!(json["dataType"], 0x0004);
        assert_eq!(json["code"], 0x0007);
        assert_eq!(json["flags"], 0x0080);
        assert_eq!(json["access"], 0x0007);
        assert_eq!(json["bitLength"], 32);
        assert_eq!(json["byteLength"], 4);
        assert_eq!(json["data"], serde_json::json!([0, 0, 0, 0]));

        let back: Parameter = serde_json::from_value(json).unwrap();
        assert_eq!(back.name, parameter.name);
        assert_eq!(back.data, parameter.data);
        assert_eq!(back.flags, parameter.flags);
    }
}
