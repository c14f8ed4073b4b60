use std::io::{Read, Seek, SeekFrom};

use crate::{
    error::{HeaderError, Result},
    header::Endianness,
    region::RegionList,
};

/// Per-sequence metadata of a 2bit file
///
/// One entry exists for every name in the file's index. Entries are fully populated
/// while the file is opened and are immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceMeta {
    /// Name of the sequence (unique key within a file)
    pub name: String,

    /// Byte offset of the sequence record, as listed in the index
    pub offset: u32,

    /// Byte order inherited from the file header
    pub endian: Endianness,

    /// Number of bases in the sequence
    pub dna_size: u32,

    /// Runs of unknown bases
    pub n_regions: RegionList,

    /// Runs of soft-masked bases
    pub mask_regions: RegionList,

    /// Byte offset where the packed 2-bit payload begins
    pub packed_pos: u64,
}
impl SequenceMeta {
    /// Reads the sequence record located at `offset`
    ///
    /// The record is read in its on-disk field order: length, N-region table,
    /// mask-region table, a reserved u32 that must be zero, then the packed payload
    /// whose position is recorded.
    pub fn from_reader<R: Read + Seek>(
        reader: &mut R,
        name: String,
        offset: u32,
        endian: Endianness,
    ) -> Result<Self> {
        reader.seek(SeekFrom::Start(u64::from(offset)))?;
        let dna_size = endian.read_u32(reader)?;
        let n_regions = RegionList::from_reader(reader, endian)?;
        let mask_regions = RegionList::from_reader(reader, endian)?;

        let value = endian.read_u32(reader)?;
        if value != 0 {
            return Err(HeaderError::UnexpectedData { name, value }.into());
        }
        let packed_pos = reader.stream_position()?;

        log::trace!(
            "sequence '{name}': {dna_size} bases, {} N-blocks, {} mask blocks, at {packed_pos}",
            n_regions.len(),
            mask_regions.len()
        );

        Ok(Self {
            name,
            offset,
            endian,
            dna_size,
            n_regions,
            mask_regions,
            packed_pos,
        })
    }

    /// Number of bytes holding the packed payload: `ceil(dna_size / 4)`
    #[must_use]
    pub fn packed_bytes(&self) -> u64 {
        u64::from(self.dna_size.div_ceil(4))
    }

    /// Byte offset one past the end of the packed payload
    #[must_use]
    pub fn end_pos(&self) -> u64 {
        self.packed_pos + self.packed_bytes()
    }

    /// Whether the integers of this record are stored in non-native byte order
    #[must_use]
    pub fn is_swapped(&self) -> bool {
        self.endian.is_swapped()
    }
}
