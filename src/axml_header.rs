use crate::err::{DeserializationError, DeserializationResult};

use byteorder::ReadBytesExt;
use std::io::Cursor;

/// `RES_XML_TYPE` as written by aapt: chunk type `0x0003` packed with its
/// 8-byte header size.
pub const BINARY_XML_MAGIC: u32 = 0x0008_0003;

/// `RES_STRING_POOL_TYPE`.
pub const STRING_POOL_MAGIC: u16 = 0x0001;

/// Size of the fixed file prologue: the 8-byte outer chunk header followed
/// by the 28-byte string pool chunk header.
pub const BINARY_XML_HEADER_SIZE: usize = 36;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PoolFlags: u32 {
        const SORTED = 0x1;
        const UTF8 = 0x100;
    }
}

/// The fixed prologue of a binary XML document.
///
/// The outer chunk header and the string pool chunk header always appear
/// back to back at offset 0, so they are read as one fixed-layout struct,
/// the way the platform encoder lays them out.
#[derive(Debug, PartialEq, Eq)]
pub struct BinaryXmlHeader {
    pub header_size: u16,
    /// Total size of the string pool chunk, including its 8-byte preamble.
    pub chunk_size: u32,
    pub num_strings: u32,
    pub num_styles: u32,
    pub flags: PoolFlags,
    /// As declared by the encoder. Relative to the pool chunk start at byte
    /// 8, so it is 8 short of the absolute string data origin; use
    /// [`BinaryXmlHeader::string_data_origin`] instead.
    pub strings_offset: u32,
    pub styles_offset: u32,
}

impl BinaryXmlHeader {
    pub fn from_bytes(data: &[u8]) -> DeserializationResult<BinaryXmlHeader> {
        let mut cursor = Cursor::new(data);

        let magic = try_read!(cursor, u32, "xml_magic")?;
        if magic != BINARY_XML_MAGIC {
            return Err(DeserializationError::InvalidMagic { found: magic });
        }

        // Total file size; nothing downstream needs it.
        let _reserved = try_read!(cursor, u32, "file_size")?;

        let pool_magic = try_read!(cursor, u16, "string_pool_id")?;
        if pool_magic != STRING_POOL_MAGIC {
            return Err(DeserializationError::InvalidStringPoolMagic { found: pool_magic });
        }

        let header_size = try_read!(cursor, u16, "string_pool_header_size")?;
        let chunk_size = try_read!(cursor, u32, "string_pool_chunk_size")?;
        let num_strings = try_read!(cursor, u32, "string_pool_num_strings")?;
        let num_styles = try_read!(cursor, u32, "string_pool_num_styles")?;
        let raw_flags = try_read!(cursor, u32, "string_pool_flags")?;
        let strings_offset = try_read!(cursor, u32, "string_pool_strings_offset")?;
        let styles_offset = try_read!(cursor, u32, "string_pool_styles_offset")?;

        if u64::from(chunk_size) + 8 > data.len() as u64 {
            return Err(DeserializationError::DeclaredSizeExceedsBuffer {
                declared: u64::from(chunk_size),
                actual: data.len() as u64,
            });
        }

        Ok(BinaryXmlHeader {
            header_size,
            chunk_size,
            num_strings,
            num_styles,
            flags: PoolFlags::from_bits_truncate(raw_flags),
            strings_offset,
            styles_offset,
        })
    }

    pub fn is_utf8(&self) -> bool {
        self.flags.contains(PoolFlags::UTF8)
    }

    /// Absolute offset where the encoded strings begin.
    ///
    /// Computed as `header + offset table` rather than trusting the declared
    /// `strings_offset`, which is relative to the pool chunk and lands 8
    /// bytes short when misread as absolute.
    pub fn string_data_origin(&self) -> usize {
        BINARY_XML_HEADER_SIZE + self.num_strings as usize * 4
    }

    /// Absolute offset of the first chunk after the string pool, or zero
    /// when the header declares no pool.
    pub fn xml_chunk_offset(&self) -> u64 {
        if self.chunk_size == 0 {
            0
        } else {
            8 + u64::from(self.chunk_size)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensure_env_logger_initialized;

    fn minimal_header_bytes() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&BINARY_XML_MAGIC.to_le_bytes());
        data.extend_from_slice(&36_u32.to_le_bytes()); // file size
        data.extend_from_slice(&STRING_POOL_MAGIC.to_le_bytes());
        data.extend_from_slice(&28_u16.to_le_bytes()); // pool header size
        data.extend_from_slice(&28_u32.to_le_bytes()); // pool chunk size
        data.extend_from_slice(&0_u32.to_le_bytes()); // num strings
        data.extend_from_slice(&0_u32.to_le_bytes()); // num styles
        data.extend_from_slice(&0x100_u32.to_le_bytes()); // flags (utf-8)
        data.extend_from_slice(&28_u32.to_le_bytes()); // strings offset
        data.extend_from_slice(&0_u32.to_le_bytes()); // styles offset
        data
    }

    #[test]
    fn parses_minimal_header() {
        ensure_env_logger_initialized();
        let data = minimal_header_bytes();
        let header = BinaryXmlHeader::from_bytes(&data).unwrap();

        assert_eq!(header.num_strings, 0);
        assert!(header.is_utf8());
        assert_eq!(header.string_data_origin(), 36);
        assert_eq!(header.xml_chunk_offset(), 36);
    }

    #[test]
    fn rejects_wrong_magic() {
        ensure_env_logger_initialized();
        let mut data = minimal_header_bytes();
        data[0] = 0xFF;

        let err = BinaryXmlHeader::from_bytes(&data).unwrap_err();
        assert!(matches!(err, DeserializationError::InvalidMagic { .. }));
    }

    #[test]
    fn rejects_wrong_string_pool_id() {
        ensure_env_logger_initialized();
        let mut data = minimal_header_bytes();
        data[8] = 0x42;

        let err = BinaryXmlHeader::from_bytes(&data).unwrap_err();
        assert!(matches!(
            err,
            DeserializationError::InvalidStringPoolMagic { .. }
        ));
    }

    #[test]
    fn rejects_declared_size_past_buffer() {
        ensure_env_logger_initialized();
        let mut data = minimal_header_bytes();
        data[12..16].copy_from_slice(&1024_u32.to_le_bytes());

        let err = BinaryXmlHeader::from_bytes(&data).unwrap_err();
        assert!(matches!(
            err,
            DeserializationError::DeclaredSizeExceedsBuffer { .. }
        ));
    }

    #[test]
    fn truncated_header_is_an_error() {
        ensure_env_logger_initialized();
        let data = minimal_header_bytes();

        let err = BinaryXmlHeader::from_bytes(&data[..20]).unwrap_err();
        assert!(matches!(err, DeserializationError::FailedToRead { .. }));
    }
}
