/// Reads a little-endian value from the cursor, capturing the field name and
/// position nicely on failure.
macro_rules! try_read {
    ($cursor: ident, u8, $name: expr) => {
        $cursor
            .read_u8()
            .map_err(|e| $crate::err::DeserializationError::FailedToRead {
                t: "u8",
                name: $name,
                offset: $cursor.position(),
                source: e,
            })
    };

    ($cursor: ident, u16, $name: expr) => {
        $cursor
            .read_u16::<byteorder::LittleEndian>()
            .map_err(|e| $crate::err::DeserializationError::FailedToRead {
                t: "u16",
                name: $name,
                offset: $cursor.position(),
                source: e,
            })
    };

    ($cursor: ident, i32, $name: expr) => {
        $cursor
            .read_i32::<byteorder::LittleEndian>()
            .map_err(|e| $crate::err::DeserializationError::FailedToRead {
                t: "i32",
                name: $name,
                offset: $cursor.position(),
                source: e,
            })
    };

    ($cursor: ident, u32, $name: expr) => {
        $cursor
            .read_u32::<byteorder::LittleEndian>()
            .map_err(|e| $crate::err::DeserializationError::FailedToRead {
                t: "u32",
                name: $name,
                offset: $cursor.position(),
                source: e,
            })
    };
}
