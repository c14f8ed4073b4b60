use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;

use crate::{
    error::{ReadError, Result},
    index::SequenceIndex,
    read::TwoBitRead,
    sequence::PackedSource,
};

/// A 2bit reader backed by a memory mapping of the whole file
///
/// Parsing goes through the same path as [`TwoBitFile`](crate::TwoBitFile), but decoding
/// slices the mapping instead of reopening the file.
#[derive(Debug, Clone)]
pub struct MmapReader {
    /// Memory mapped file contents
    mmap: Arc<Mmap>,

    /// Metadata of every sequence in the file
    index: Arc<SequenceIndex>,
}
impl MmapReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        // Verify input file is a file before attempting to map
        let file = File::open(path)?;
        if !file.metadata()?.is_file() {
            return Err(ReadError::IncompatibleFile.into());
        }

        // Safety: the file is open and won't be modified while mapped
        let mmap = unsafe { Mmap::map(&file)? };

        let index = SequenceIndex::from_reader(&mut Cursor::new(&mmap[..]))?;

        // Immediately validate that every packed payload lies within the mapping
        let size = mmap.len() as u64;
        if let Some(meta) = index.iter().find(|meta| meta.end_pos() > size) {
            return Err(ReadError::TruncatedSequence(meta.name.clone()).into());
        }

        Ok(Self {
            mmap: Arc::new(mmap),
            index: Arc::new(index),
        })
    }

    /// Size of the mapped file in bytes
    #[must_use]
    pub fn size(&self) -> usize {
        self.mmap.len()
    }
}
impl TwoBitRead for MmapReader {
    fn index(&self) -> &SequenceIndex {
        &self.index
    }

    fn source(&self) -> PackedSource {
        PackedSource::Mmap(Arc::clone(&self.mmap))
    }
}
