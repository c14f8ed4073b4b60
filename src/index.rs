//! Name/offset index of a 2bit file
//!
//! The index table directly follows the header and lists every sequence as
//!
//! ```text
//! nameLen:u8  name:bytes[nameLen]  offset:u32
//! ```
//!
//! [`SequenceIndex`] parses the header and the table, then seeks to every offset to
//! populate the per-sequence metadata. Population is eager: once built, the index never
//! touches the underlying stream again.

use std::collections::HashMap;
use std::io::{Read, Seek};
use std::sync::Arc;

use byteorder::ReadBytesExt;

use crate::{
    error::{HeaderError, Result},
    header::TwoBitHeader,
    meta::SequenceMeta,
};

/// Upper bound on the number of index entries preallocated from the header count
const MAX_PREALLOC: usize = 1 << 16;

/// A single entry of the name/offset table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub name: String,
    pub offset: u32,
}

/// Reads the name/offset table following the header
///
/// Entries are returned in file order.
pub fn read_entries<R: Read>(reader: &mut R, header: &TwoBitHeader) -> Result<Vec<IndexEntry>> {
    let count = header.sequence_count as usize;
    let mut entries = Vec::with_capacity(count.min(MAX_PREALLOC));
    let mut name_buf = [0u8; u8::MAX as usize];
    for idx in 0..count {
        let name_len = reader.read_u8()? as usize;
        reader.read_exact(&mut name_buf[..name_len])?;
        let name = std::str::from_utf8(&name_buf[..name_len])
            .map_err(|_| HeaderError::InvalidSequenceName(idx))?
            .to_string();
        let offset = header.endian.read_u32(reader)?;
        entries.push(IndexEntry { name, offset });
    }
    Ok(entries)
}

/// Fully populated metadata of every sequence in a 2bit file
#[derive(Debug, Clone)]
pub struct SequenceIndex {
    /// The validated file header
    header: TwoBitHeader,

    /// Sequence names in file order
    names: Vec<String>,

    /// Metadata keyed by sequence name
    sequences: HashMap<String, Arc<SequenceMeta>>,
}
impl SequenceIndex {
    /// Parses the header, the name/offset table, and every sequence record
    ///
    /// The reader may be positioned anywhere; it is rewound to the start of the stream.
    /// Any failure aborts the whole parse.
    ///
    /// Duplicate names are not rejected: the first record with a given name is the one
    /// reachable by lookup, while [`names`](Self::names) lists every entry.
    pub fn from_reader<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        reader.rewind()?;
        let header = TwoBitHeader::from_reader(reader)?;
        let entries = read_entries(reader, &header)?;

        let mut names = Vec::with_capacity(entries.len());
        let mut sequences = HashMap::with_capacity(entries.len());
        for IndexEntry { name, offset } in entries {
            if !sequences.contains_key(&name) {
                let meta = SequenceMeta::from_reader(reader, name.clone(), offset, header.endian)?;
                sequences.insert(name.clone(), Arc::new(meta));
            }
            names.push(name);
        }

        log::debug!("indexed {} sequences", names.len());
        Ok(Self {
            header,
            names,
            sequences,
        })
    }

    #[must_use]
    pub fn header(&self) -> TwoBitHeader {
        self.header
    }

    /// Sequence names in file order
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Metadata of the named sequence
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<SequenceMeta>> {
        self.sequences.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sequences.contains_key(name)
    }

    /// Declared length of every sequence, keyed by name
    #[must_use]
    pub fn lengths(&self) -> HashMap<String, u32> {
        self.sequences
            .iter()
            .map(|(name, meta)| (name.clone(), meta.dna_size))
            .collect()
    }

    /// Metadata in file order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<SequenceMeta>> + '_ {
        self.names.iter().filter_map(|name| self.sequences.get(name))
    }

    /// Number of entries in the name/offset table
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
