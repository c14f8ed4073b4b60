//! Header module for the twobit library
//!
//! This module provides the file header structure of the 2bit format and the byte-order
//! detection that governs every multi-byte integer in the file. The header is a fixed
//! 16-byte block:
//!
//! ```text
//! magic:u32  version:u32(=0)  sequenceCount:u32  reserved:u32(=0)
//! ```
//!
//! The magic number doubles as a byte-order mark: files written on a machine of the
//! opposite endianness carry the byte-reversed constant.

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{error::Result, HeaderError};

/// Magic number of 2bit files as read in the file's own byte order
pub const MAGIC: u32 = 0x1A41_2743;

/// The magic number as it appears when read with the opposite byte order
pub const REVERSE_MAGIC: u32 = MAGIC.swap_bytes();

/// The only format version defined for 2bit files
pub const VERSION: u32 = 0;

/// Value of the reserved header field
pub const RESERVED: u32 = 0;

/// Size of the header in bytes
pub const SIZE_HEADER: usize = 16;

/// Byte order of the multi-byte integers in a 2bit file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Little,
    Big,
}
impl Default for Endianness {
    fn default() -> Self {
        Self::native()
    }
}
impl Endianness {
    /// The byte order of the running machine
    #[must_use]
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    /// Whether integers in this byte order must be swapped on the running machine
    #[must_use]
    pub fn is_swapped(self) -> bool {
        self != Self::native()
    }

    /// Detects the byte order from the four raw magic bytes
    ///
    /// Returns `None` if the bytes match neither orientation of [`MAGIC`].
    #[must_use]
    pub fn detect(raw: [u8; 4]) -> Option<Self> {
        match LittleEndian::read_u32(&raw) {
            MAGIC => Some(Self::Little),
            REVERSE_MAGIC => Some(Self::Big),
            _ => None,
        }
    }

    /// Reads a u32 in this byte order
    pub fn read_u32<R: Read>(self, reader: &mut R) -> io::Result<u32> {
        match self {
            Self::Little => reader.read_u32::<LittleEndian>(),
            Self::Big => reader.read_u32::<BigEndian>(),
        }
    }

    /// Writes a u32 in this byte order
    pub fn write_u32<W: Write>(self, writer: &mut W, value: u32) -> io::Result<()> {
        match self {
            Self::Little => writer.write_u32::<LittleEndian>(value),
            Self::Big => writer.write_u32::<BigEndian>(value),
        }
    }
}

/// Header structure for 2bit files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwoBitHeader {
    /// Magic number to identify the file format
    ///
    /// Always [`MAGIC`] once interpreted in the detected byte order
    pub magic: u32,

    /// Version of the file format (always 0)
    pub version: u32,

    /// Number of entries in the name/offset index following the header
    pub sequence_count: u32,

    /// Reserved field (always 0)
    pub reserved: u32,

    /// Byte order of every multi-byte integer in the file
    pub endian: Endianness,
}
impl TwoBitHeader {
    /// Creates a header declaring `sequence_count` sequences, written in native byte order
    #[must_use]
    pub fn new(sequence_count: u32) -> Self {
        Self::with_endian(sequence_count, Endianness::native())
    }

    /// Creates a header declaring `sequence_count` sequences in the given byte order
    #[must_use]
    pub fn with_endian(sequence_count: u32, endian: Endianness) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            sequence_count,
            reserved: RESERVED,
            endian,
        }
    }

    /// Whether the file's integers are stored in the non-native byte order
    #[must_use]
    pub fn is_swapped(&self) -> bool {
        self.endian.is_swapped()
    }

    /// Reads and validates a header from a reader positioned at the start of a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The stream ends before 16 bytes could be read
    /// * The magic number is neither the forward nor the reversed constant
    /// * The version is not [`VERSION`]
    /// * The reserved field is not zero
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self> {
        let mut raw = [0u8; 4];
        reader.read_exact(&mut raw)?;
        let Some(endian) = Endianness::detect(raw) else {
            return Err(HeaderError::InvalidMagicNumber(LittleEndian::read_u32(&raw)).into());
        };

        let version = endian.read_u32(reader)?;
        let sequence_count = endian.read_u32(reader)?;
        let reserved = endian.read_u32(reader)?;

        if version != VERSION {
            return Err(HeaderError::InvalidFormatVersion(version).into());
        }
        if reserved != RESERVED {
            return Err(HeaderError::InvalidReservedBytes(reserved).into());
        }

        log::debug!(
            "2bit header: {sequence_count} sequences, {endian:?} endian (swapped: {})",
            endian.is_swapped()
        );

        Ok(Self {
            magic: MAGIC,
            version,
            sequence_count,
            reserved,
            endian,
        })
    }

    /// Writes the header to a writer in its own byte order
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.endian.write_u32(writer, self.magic)?;
        self.endian.write_u32(writer, self.version)?;
        self.endian.write_u32(writer, self.sequence_count)?;
        self.endian.write_u32(writer, self.reserved)?;
        Ok(())
    }
}

#[cfg(test)]
mod testing {
    use std::io::Cursor;

    use super::*;
    use crate::Error;

    fn header_bytes(endian: Endianness, fields: [u32; 4]) -> Vec<u8> {
        let mut buf = Vec::new();
        for field in fields {
            endian.write_u32(&mut buf, field).unwrap();
        }
        buf
    }

    #[test]
    fn test_header_round_trip_both_orders() -> Result<()> {
        for endian in [Endianness::Little, Endianness::Big] {
            let header = TwoBitHeader::with_endian(3, endian);
            let mut buf = Vec::new();
            header.write_bytes(&mut buf)?;
            assert_eq!(buf.len(), SIZE_HEADER);

            let parsed = TwoBitHeader::from_reader(&mut Cursor::new(buf))?;
            assert_eq!(parsed, header);
        }
        Ok(())
    }

    #[test]
    fn test_big_endian_magic_bytes() {
        let buf = header_bytes(Endianness::Big, [MAGIC, 0, 1, 0]);
        assert_eq!(&buf[..4], &[0x1A, 0x41, 0x27, 0x43]);
        assert_eq!(Endianness::detect([0x43, 0x27, 0x41, 0x1A]), Some(Endianness::Little));
        assert_eq!(Endianness::detect([0x1A, 0x41, 0x27, 0x43]), Some(Endianness::Big));
    }

    #[test]
    fn test_bad_magic() {
        let buf = header_bytes(Endianness::Little, [0xDEAD_BEEF, 0, 1, 0]);
        let err = TwoBitHeader::from_reader(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(
            err,
            Error::HeaderError(HeaderError::InvalidMagicNumber(0xDEAD_BEEF))
        ));
    }

    #[test]
    fn test_bad_version() {
        let buf = header_bytes(Endianness::Little, [MAGIC, 1, 1, 0]);
        let err = TwoBitHeader::from_reader(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(
            err,
            Error::HeaderError(HeaderError::InvalidFormatVersion(1))
        ));
    }

    #[test]
    fn test_bad_reserved() {
        let buf = header_bytes(Endianness::Big, [MAGIC, 0, 1, 7]);
        let err = TwoBitHeader::from_reader(&mut Cursor::new(buf)).unwrap_err();
        assert!(matches!(
            err,
            Error::HeaderError(HeaderError::InvalidReservedBytes(7))
        ));
    }

    #[test]
    fn test_short_header() {
        let mut buf = header_bytes(Endianness::Little, [MAGIC, 0, 1, 0]);
        buf.truncate(10);
        let err = TwoBitHeader::from_reader(&mut Cursor::new(buf)).unwrap_err();
        assert!(err.is_io_error());
    }
}
