use crate::err::{DeserializationError, DeserializationResult};
use crate::string_pool::StringPool;

use std::borrow::Cow;

pub const RES_VALUE_TRUE: u32 = 0xFFFF_FFFF;
pub const RES_VALUE_FALSE: u32 = 0x0000_0000;

/// A typed attribute value, decoded from the `(type, data, raw index)`
/// triple carried by each attribute record.
///
/// Only the kinds that occur in manifests are decoded; the complex numeric
/// kinds (float, dimension, fraction) are recognized but deliberately left
/// unrendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResValue {
    Null { empty: bool },
    Reference(u32),
    Attribute(u32),
    String(String),
    Float,
    Dimension,
    Fraction,
    DynamicReference(u32),
    IntDec(i32),
    IntHex(u32),
    /// `None` when the raw word is neither the all-ones true marker nor zero.
    Boolean(Option<bool>),
    Unknown(u8),
}

impl ResValue {
    pub fn decode(
        value_type: u8,
        data: u32,
        raw_value_index: Option<u32>,
        strings: &StringPool,
        offset: u64,
    ) -> DeserializationResult<ResValue> {
        let value = match value_type {
            0x00 => ResValue::Null { empty: data != 0 },
            0x01 => ResValue::Reference(data),
            0x02 => ResValue::Attribute(data),
            0x03 => match raw_value_index {
                None => ResValue::String(String::new()),
                Some(index) => {
                    let string = strings.get(index).ok_or(
                        DeserializationError::StringIndexOutOfRange {
                            index,
                            len: strings.len(),
                            offset,
                        },
                    )?;
                    ResValue::String(string.to_owned())
                }
            },
            0x04 => ResValue::Float,
            0x05 => ResValue::Dimension,
            0x06 => ResValue::Fraction,
            0x07 => ResValue::DynamicReference(data),
            0x10 => ResValue::IntDec(data as i32),
            0x11 => ResValue::IntHex(data),
            0x12 => ResValue::Boolean(match data {
                RES_VALUE_TRUE => Some(true),
                RES_VALUE_FALSE => Some(false),
                _ => None,
            }),
            other => ResValue::Unknown(other),
        };

        Ok(value)
    }

    /// The canonical textual form used by the renderer and the query
    /// helpers.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            ResValue::Null { empty: false } => Cow::Borrowed("<undefined>"),
            ResValue::Null { empty: true } => Cow::Borrowed("<empty>"),
            ResValue::Reference(id) => Cow::Owned(format!("@res/0x{id:08X}")),
            ResValue::Attribute(id) => Cow::Owned(format!("@attr/0x{id:08X}")),
            ResValue::String(s) => Cow::Borrowed(s.as_str()),
            ResValue::Float | ResValue::Dimension | ResValue::Fraction => Cow::Borrowed(""),
            ResValue::DynamicReference(id) => Cow::Owned(format!("@dyn/0x{id:08X}")),
            ResValue::IntDec(num) => Cow::Owned(num.to_string()),
            ResValue::IntHex(num) => Cow::Owned(format!("0x{num:08X}")),
            ResValue::Boolean(Some(true)) => Cow::Borrowed("true"),
            ResValue::Boolean(Some(false)) => Cow::Borrowed("false"),
            ResValue::Boolean(None) => Cow::Borrowed("unknown"),
            ResValue::Unknown(_) => Cow::Borrowed("unknown"),
        }
    }
}
