use thiserror::Error;

pub type Result<T> = std::result::Result<T, AxmlError>;

pub type DeserializationResult<T> = std::result::Result<T, DeserializationError>;

pub type ApkResult<T> = std::result::Result<T, ApkError>;

/// Errors raised while interpreting the raw chunk stream.
#[derive(Debug, Error)]
pub enum DeserializationError {
    #[error("Offset {offset}: An I/O error has occurred while trying to read {t} ({name})")]
    FailedToRead {
        t: &'static str,
        name: &'static str,
        offset: u64,
        source: std::io::Error,
    },

    #[error("Invalid binary XML magic, expected `0x00080003`, found `{found:#010x}`")]
    InvalidMagic { found: u32 },

    #[error("Invalid string pool chunk id, expected `0x0001`, found `{found:#06x}`")]
    InvalidStringPoolMagic { found: u16 },

    #[error("Declared string pool chunk size {declared} exceeds buffer length {actual}")]
    DeclaredSizeExceedsBuffer { declared: u64, actual: u64 },

    #[error("Offset {offset}: {what} needs {need} bytes, only {have} are available")]
    Truncated {
        what: &'static str,
        offset: u64,
        need: usize,
        have: usize,
    },

    #[error("Offset {offset}: string index {index} is out of range for a pool of {len} strings")]
    StringIndexOutOfRange { index: u32, len: usize, offset: u64 },

    #[error("Offset {offset}: unexpected attribute marker `{found:#010x}`")]
    UnexpectedAttributeMarker { found: u32, offset: u64 },

    #[error("Offset {offset}: chunk declares impossible size {size}")]
    InvalidChunkSize { size: u32, offset: u64 },

    #[error("Offset {offset}: failed to decode UTF-16 string: {message}")]
    FailedToDecodeUTF16String { message: String, offset: u64 },

    #[error("Offset {offset}: failed to decode UTF-8 string")]
    FailedToDecodeUTF8String {
        source: std::str::Utf8Error,
        offset: u64,
    },
}

/// Top-level error type of the crate.
#[derive(Debug, Error)]
pub enum AxmlError {
    #[error(transparent)]
    Deserialization {
        #[from]
        source: DeserializationError,
    },

    /// The string pool cannot be resized in place; replacements must encode
    /// to exactly the byte length of the slot they overwrite.
    #[error("Cannot rewrite attribute `{attribute}` in place: {reason}")]
    UnsupportedMutation { attribute: String, reason: String },

    #[error("An I/O error has occurred")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Writing XML failed")]
    XmlOutput {
        #[from]
        source: quick_xml::Error,
    },
}

/// Errors surfaced by the APK facade.
#[derive(Debug, Error)]
pub enum ApkError {
    #[error("No AndroidManifest.xml in `{path}`")]
    MissingAndroidManifest { path: String },

    #[error("AndroidManifest.xml in `{path}` has no application element")]
    MalformedAndroidManifest { path: String },

    #[error("Failed to read archive")]
    Zip {
        #[from]
        source: zip::result::ZipError,
    },

    #[error("An I/O error has occurred")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error(transparent)]
    Axml {
        #[from]
        source: AxmlError,
    },
}
