//! # twobit
//!
//! Reader and writer for the UCSC 2bit genome sequence format.
//!
//! A 2bit file stores every nucleotide in two bits, with runs of unknown bases (`N`)
//! and soft-masked (lowercase) runs kept in per-sequence region tables. The file starts
//! with a header and a name/offset index, so any sequence, and any sub-range of it,
//! can be decoded without reading the rest of the file.
//!
//! ## Reading
//!
//! ```no_run
//! use twobit::{TwoBitFile, TwoBitRead};
//!
//! let file = TwoBitFile::open("genome.2bit").unwrap();
//! for name in file.sequence_names() {
//!     let seq = file.get(name).unwrap();
//!     println!("{name}: {} bp", seq.len());
//! }
//!
//! // decode a sub-range of a sequence (0-based, half-open)
//! let region = file.fetch("chr1", 1000, 2000).unwrap();
//! assert_eq!(region.len(), 1000);
//! ```
//!
//! ## Writing
//!
//! ```
//! use twobit::TwoBitWriter;
//!
//! let mut writer = TwoBitWriter::new(Vec::new());
//! writer.add("chr1", b"ACGTNNacgt").unwrap();
//! let bytes = writer.finish().unwrap();
//! assert_eq!(&bytes[..4], &0x1A41_2743u32.to_le_bytes());
//! ```

mod error;
mod file;
mod header;
mod index;
mod meta;
mod mmap;
mod parallel;
mod policy;
mod read;
mod region;
mod sequence;
mod writer;

pub use error::{Error, HeaderError, ReadError, Result, WriteError};
pub use file::TwoBitFile;
pub use header::{Endianness, TwoBitHeader, MAGIC, REVERSE_MAGIC, SIZE_HEADER, VERSION};
pub use index::{read_entries, IndexEntry, SequenceIndex};
pub use meta::SequenceMeta;
pub use mmap::MmapReader;
pub use parallel::{DecodedRecord, ParallelProcessor, ParallelReader};
pub use policy::Policy;
pub use read::TwoBitRead;
pub use region::{RegionEvent, RegionList};
pub use sequence::{PackedSource, TwoBitSequence, BASES};
pub use writer::{EncodedSequence, TwoBitWriter, TwoBitWriterBuilder};

/// Seed for the random number generator used by [`Policy::RandomDraw`]
pub const RNG_SEED: u64 = 42;
