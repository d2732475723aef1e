use crate::axml_header::{BinaryXmlHeader, BINARY_XML_HEADER_SIZE};
use crate::err::{DeserializationError, DeserializationResult};

use byteorder::ReadBytesExt;
use encoding::all::UTF_16LE;
use encoding::{DecoderTrap, Encoding};
use log::trace;
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolEncoding {
    Utf8,
    Utf16,
}

/// Physical extent of one string's payload inside the buffer, excluding the
/// length prefix and the terminator. This is the byte range an in-place
/// rewrite is allowed to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringSlot {
    pub offset: usize,
    pub len: usize,
}

/// The decoded shared string table.
///
/// Strings are referenced by 32-bit index from every tag and attribute in
/// the chunk stream. Physically the pool is an offset table followed by
/// length-prefixed entries; both UTF-8 and UTF-16LE encodings appear in the
/// wild, selected by a header flag.
#[derive(Debug)]
pub struct StringPool {
    strings: Vec<String>,
    slots: Vec<StringSlot>,
    encoding: PoolEncoding,
}

impl StringPool {
    pub fn decode(data: &[u8], header: &BinaryXmlHeader) -> DeserializationResult<StringPool> {
        let count = header.num_strings as usize;
        let encoding = if header.is_utf8() {
            PoolEncoding::Utf8
        } else {
            PoolEncoding::Utf16
        };

        let mut cursor = Cursor::new(data);
        cursor.set_position(BINARY_XML_HEADER_SIZE as u64);

        let mut offsets = Vec::new();
        for _ in 0..count {
            offsets.push(try_read!(cursor, u32, "string_offset")?);
        }

        let origin = header.string_data_origin();
        trace!("decoding {} strings from origin {}", count, origin);

        let mut strings = Vec::with_capacity(offsets.len());
        let mut slots = Vec::with_capacity(offsets.len());
        for offset in offsets {
            let at = origin + offset as usize;
            let (string, slot) = match encoding {
                PoolEncoding::Utf8 => decode_utf8_entry(data, at)?,
                PoolEncoding::Utf16 => decode_utf16_entry(data, at)?,
            };
            strings.push(string);
            slots.push(slot);
        }

        Ok(StringPool {
            strings,
            slots,
            encoding,
        })
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn encoding(&self) -> PoolEncoding {
        self.encoding
    }

    pub fn get(&self, index: u32) -> Option<&str> {
        self.strings.get(index as usize).map(String::as_str)
    }

    /// The payload extent of the `index`-th string, for in-place rewrites.
    pub fn raw_slot(&self, index: u32) -> Option<StringSlot> {
        self.slots.get(index as usize).copied()
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }
}

fn slice_at<'a>(
    data: &'a [u8],
    offset: usize,
    len: usize,
    what: &'static str,
) -> DeserializationResult<&'a [u8]> {
    let truncated = || DeserializationError::Truncated {
        what,
        offset: offset as u64,
        need: len,
        have: data.len().saturating_sub(offset),
    };
    let end = offset.checked_add(len).ok_or_else(truncated)?;
    data.get(offset..end).ok_or_else(truncated)
}

/// An 8-bit length unit; the high bit signals a second unit holding the low
/// byte of a 15-bit length.
fn read_utf8_len(data: &[u8], at: usize) -> DeserializationResult<(usize, usize)> {
    let bytes = slice_at(data, at, 1, "utf-8 length prefix")?;
    let first = bytes[0] as usize;
    if first & 0x80 == 0 {
        return Ok((first, 1));
    }
    let bytes = slice_at(data, at, 2, "utf-8 long length prefix")?;
    Ok((((first & 0x7F) << 8) | bytes[1] as usize, 2))
}

/// A 16-bit length unit; the high bit signals a second unit holding the low
/// word of a 31-bit length.
fn read_utf16_len(data: &[u8], at: usize) -> DeserializationResult<(usize, usize)> {
    let bytes = slice_at(data, at, 2, "utf-16 length prefix")?;
    let first = u16::from_le_bytes([bytes[0], bytes[1]]) as usize;
    if first & 0x8000 == 0 {
        return Ok((first, 2));
    }
    let bytes = slice_at(data, at, 4, "utf-16 long length prefix")?;
    let second = u16::from_le_bytes([bytes[2], bytes[3]]) as usize;
    Ok((((first & 0x7FFF) << 16) | second, 4))
}

fn decode_utf8_entry(data: &[u8], at: usize) -> DeserializationResult<(String, StringSlot)> {
    // A UTF-16 character count (unused for decoding) followed by the byte count.
    let (_char_count, prefix) = read_utf8_len(data, at)?;
    let (byte_count, prefix2) = read_utf8_len(data, at + prefix)?;

    let start = at + prefix + prefix2;
    let payload = slice_at(data, start, byte_count, "utf-8 string payload")?;
    let string = std::str::from_utf8(payload)
        .map_err(|e| DeserializationError::FailedToDecodeUTF8String {
            source: e,
            offset: start as u64,
        })?
        .to_owned();

    Ok((
        string,
        StringSlot {
            offset: start,
            len: byte_count,
        },
    ))
}

fn decode_utf16_entry(data: &[u8], at: usize) -> DeserializationResult<(String, StringSlot)> {
    // The stored count is UTF-16 code units, not bytes.
    let (unit_count, prefix) = read_utf16_len(data, at)?;
    let byte_count = unit_count * 2;

    let start = at + prefix;
    let payload = slice_at(data, start, byte_count, "utf-16 string payload")?;
    let string = UTF_16LE.decode(payload, DecoderTrap::Strict).map_err(|m| {
        DeserializationError::FailedToDecodeUTF16String {
            message: m.into_owned(),
            offset: start as u64,
        }
    })?;

    Ok((
        string,
        StringSlot {
            offset: start,
            len: byte_count,
        },
    ))
}
