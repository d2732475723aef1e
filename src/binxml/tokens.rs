use crate::binxml::model::{XmlAttribute, XmlElement};
use crate::binxml::value_variant::ResValue;
use crate::err::{DeserializationError, DeserializationResult};
use crate::string_pool::StringPool;

use byteorder::ReadBytesExt;
use log::{trace, warn};
use std::io::Cursor;

/// Sentinel written by the encoder ahead of every attribute block:
/// attribute start 20 packed with attribute size 20.
pub const ATTRIBUTE_MARKER: u32 = 0x0014_0014;

/// A negative string index denotes absence and yields the empty string.
fn pool_string<'a>(
    strings: &'a StringPool,
    index: i32,
    offset: u64,
) -> DeserializationResult<&'a str> {
    if index < 0 {
        return Ok("");
    }
    strings
        .get(index as u32)
        .ok_or(DeserializationError::StringIndexOutOfRange {
            index: index as u32,
            len: strings.len(),
            offset,
        })
}

/// Reads a start-element body; on return the cursor sits on the next
/// chunk's tag.
pub fn read_start_element(
    cursor: &mut Cursor<&[u8]>,
    strings: &StringPool,
) -> DeserializationResult<XmlElement> {
    let _line = try_read!(cursor, u32, "start_element_line")?;
    let _comment = try_read!(cursor, i32, "start_element_comment")?;

    let namespace_index = try_read!(cursor, i32, "start_element_namespace")?;
    let namespace = pool_string(strings, namespace_index, cursor.position())?;

    let name_index = try_read!(cursor, i32, "start_element_name")?;
    let name = pool_string(strings, name_index, cursor.position())?.to_owned();

    let attributes = read_attributes(cursor, strings)?;

    trace!("start tag [{}] namespace [{}]", name, namespace);

    Ok(XmlElement { name, attributes })
}

fn read_attributes(
    cursor: &mut Cursor<&[u8]>,
    strings: &StringPool,
) -> DeserializationResult<Vec<XmlAttribute>> {
    let marker = try_read!(cursor, u32, "attribute_marker")?;
    if marker != ATTRIBUTE_MARKER {
        return Err(DeserializationError::UnexpectedAttributeMarker {
            found: marker,
            offset: cursor.position() - 4,
        });
    }

    let count = try_read!(cursor, u32, "attribute_count")?;
    let _trailing = try_read!(cursor, u32, "attribute_trailing")?;

    let mut attributes = Vec::new();
    for _ in 0..count {
        let _namespace_index = try_read!(cursor, i32, "attribute_namespace")?;
        let name_index = try_read!(cursor, i32, "attribute_name")?;
        let raw_index = try_read!(cursor, i32, "attribute_raw_value")?;
        let _size = try_read!(cursor, u16, "attribute_size")?;
        let _res0 = try_read!(cursor, u8, "attribute_res0")?;
        let value_type = try_read!(cursor, u8, "attribute_type")?;
        let data = try_read!(cursor, u32, "attribute_data")?;

        let name = pool_string(strings, name_index, cursor.position())?;
        if name.is_empty() {
            warn!("skipping attribute with empty name");
            continue;
        }

        let raw_value_index = if raw_index >= 0 {
            Some(raw_index as u32)
        } else {
            None
        };
        let value = ResValue::decode(value_type, data, raw_value_index, strings, cursor.position())?;
        trace!("  attribute [{}] value [{}]", name, value.render());

        attributes.push(XmlAttribute {
            name: name.to_owned(),
            value: value.render().into_owned(),
            raw_value_index,
        });
    }

    Ok(attributes)
}

/// Reads an end-element body, returning the tag name.
pub fn read_end_element(
    cursor: &mut Cursor<&[u8]>,
    strings: &StringPool,
) -> DeserializationResult<String> {
    let _line = try_read!(cursor, u32, "end_element_line")?;
    let _comment = try_read!(cursor, i32, "end_element_comment")?;

    let namespace_index = try_read!(cursor, i32, "end_element_namespace")?;
    let namespace = pool_string(strings, namespace_index, cursor.position())?;

    let name_index = try_read!(cursor, i32, "end_element_name")?;
    let name = pool_string(strings, name_index, cursor.position())?;

    trace!("end tag [{}] namespace [{}]", name, namespace);

    Ok(name.to_owned())
}

/// Reads a cdata body, returning the character data.
pub fn read_cdata(
    cursor: &mut Cursor<&[u8]>,
    strings: &StringPool,
) -> DeserializationResult<String> {
    let _line = try_read!(cursor, u32, "cdata_line")?;
    let _comment = try_read!(cursor, i32, "cdata_comment")?;

    let data_index = try_read!(cursor, i32, "cdata_string")?;
    let text = pool_string(strings, data_index, cursor.position())?.to_owned();

    // Trailing typed value, unused for character data.
    let _ = try_read!(cursor, u32, "cdata_value_header")?;
    let _ = try_read!(cursor, u32, "cdata_value_data")?;

    trace!("cdata [{}]", text);

    Ok(text)
}
