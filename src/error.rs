/// Custom Result type for twobit operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the twobit library, encompassing all possible error cases
/// that can occur while reading, decoding, or writing 2bit files.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    /// Structural violations of the 2bit format
    HeaderError(#[from] HeaderError),
    /// Errors that occur while looking up or decoding sequences
    ReadError(#[from] ReadError),
    /// Errors that occur while encoding or writing sequences
    WriteError(#[from] WriteError),
    /// Standard I/O errors from the Rust standard library
    IoError(#[from] std::io::Error),
    /// UTF-8 encoding/decoding errors
    Utf8Error(#[from] std::str::Utf8Error),
    /// Generic errors raised by user-provided processors
    AnyhowError(#[from] anyhow::Error),
}
impl Error {
    /// Returns true if the file is not a well-formed 2bit file
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::HeaderError(_))
    }

    /// Returns true if the error stems from the underlying storage (including short reads)
    #[must_use]
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::IoError(_))
    }

    /// Returns true if a sequence name lookup failed
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ReadError(ReadError::UnknownSequence(_)))
    }

    /// Returns true if a requested sub-range was invalid
    #[must_use]
    pub fn is_range_error(&self) -> bool {
        matches!(self, Self::ReadError(ReadError::InvalidRange { .. }))
    }
}

/// Errors raised while validating the structure of a 2bit file
///
/// These are always fatal: the file is either well-formed or rejected.
#[derive(thiserror::Error, Debug)]
pub enum HeaderError {
    /// The magic number matches neither the forward nor the byte-swapped constant
    ///
    /// # Arguments
    /// * `u32` - The invalid magic number that was found
    #[error("Invalid magic number: {0:#010x}. Bad 2bit file")]
    InvalidMagicNumber(u32),

    /// The format version in the header is not supported
    ///
    /// # Arguments
    /// * `u32` - The unsupported version number that was found
    #[error("Unexpected version number: {0}. Bad 2bit file")]
    InvalidFormatVersion(u32),

    /// The reserved header field is not zero
    ///
    /// # Arguments
    /// * `u32` - The value found in the reserved field
    #[error("Unexpected reserved value in header: {0}. Bad 2bit file")]
    InvalidReservedBytes(u32),

    /// The zero-check field trailing a sequence's region tables is not zero
    #[error("Unexpected data ({value}) after region tables of sequence '{name}'. Bad 2bit file")]
    UnexpectedData { name: String, value: u32 },

    /// A sequence name in the index is not valid UTF-8
    ///
    /// # Arguments
    /// * `usize` - The position of the entry in the index table
    #[error("Sequence name of index entry {0} is not valid UTF-8")]
    InvalidSequenceName(usize),
}

/// Errors that can occur while looking up or decoding sequences
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// The file being read is not a regular file (e.g., it might be a directory or special file)
    #[error("File is not regular")]
    IncompatibleFile,

    /// No sequence with the requested name exists in the file
    ///
    /// # Arguments
    /// * `String` - The requested name
    #[error("Unknown sequence '{0}'")]
    UnknownSequence(String),

    /// The requested sub-range lies outside the sequence or is reversed
    #[error("Requested range [{begin}, {end}) is invalid for a sequence of length {len}")]
    InvalidRange { begin: u32, end: u32, len: u32 },

    /// The packed payload ends before the declared sequence length
    ///
    /// # Arguments
    /// * `String` - The name of the truncated sequence
    #[error("Packed data of sequence '{0}' is truncated")]
    TruncatedSequence(String),
}

/// Errors that can occur while encoding or writing 2bit data
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    /// Names are stored with a one byte length prefix
    #[error("Sequence name '{0}' is longer than 255 bytes")]
    NameTooLong(String),

    /// Every sequence needs a non-empty name
    #[error("Sequence names must not be empty")]
    EmptyName,

    /// Names are the lookup key and must be unique within a file
    #[error("Duplicate sequence name '{0}'")]
    DuplicateName(String),

    /// Sequence lengths are stored as u32
    #[error("Sequence '{name}' has {len} bases which exceeds the 2bit limit of 4294967295")]
    SequenceTooLong { name: String, len: usize },

    /// The sequence count is stored as u32
    #[error("Too many sequences for a single 2bit file: {0}")]
    TooManySequences(usize),

    /// Sequence offsets are stored as u32
    #[error("File size would exceed the 4GB limit of the 2bit format (offset {0})")]
    FileTooLarge(u64),

    /// The sequence contains invalid nucleotide characters
    ///
    /// # Arguments
    /// * `String` - Description of the invalid nucleotides found
    #[error("Invalid nucleotides found in sequence: {0}")]
    InvalidNucleotideSequence(String),
}
