//! Sequence decoding
//!
//! Bases are packed four to a byte, most significant bit-pair first, using the
//! alphabet `T=00 C=01 A=10 G=11`. Decoding a sub-range reads only the bytes covering
//! it, unpacks the codes, then overlays the region tables: N-regions overwrite the base
//! with `N`, and mask regions lowercase whatever is there. The mask is applied last, so
//! a masked N-region decodes as `n`.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::Mmap;

use crate::{
    error::{ReadError, Result},
    meta::SequenceMeta,
    region::RegionList,
};

/// Base for each 2-bit code
pub const BASES: [u8; 4] = *b"TCAG";

/// Four decoded bases for every possible packed byte
const UNPACK: [[u8; 4]; 256] = build_unpack_table();

const fn build_unpack_table() -> [[u8; 4]; 256] {
    let mut table = [[0u8; 4]; 256];
    let mut byte = 0;
    while byte < 256 {
        let mut slot = 0;
        while slot < 4 {
            let shift = 6 - 2 * slot;
            table[byte][slot] = BASES[(byte >> shift) & 0b11];
            slot += 1;
        }
        byte += 1;
    }
    table
}

/// Byte range of the packed payload covering bases `[begin, end)`, relative to the payload start
#[must_use]
pub fn packed_span(begin: u32, end: u32) -> (u64, usize) {
    if begin >= end {
        return (u64::from(begin / 4), 0);
    }
    let first = begin / 4;
    let last = (end - 1) / 4;
    (u64::from(first), (last - first + 1) as usize)
}

/// Unpacks bases `[begin, end)` from `packed`, which must start at byte `begin / 4`
///
/// Decoded bases are appended to `out`.
pub fn unpack(packed: &[u8], begin: u32, end: u32, out: &mut Vec<u8>) {
    if begin >= end {
        return;
    }
    out.reserve((end - begin) as usize);
    let skip = (begin % 4) as usize;
    let mut remaining = (end - begin) as usize;
    for (idx, &byte) in packed.iter().enumerate() {
        let bases = &UNPACK[byte as usize];
        let from = if idx == 0 { skip } else { 0 };
        let take = (4 - from).min(remaining);
        out.extend_from_slice(&bases[from..from + take]);
        remaining -= take;
        if remaining == 0 {
            break;
        }
    }
}

/// Overlays N-regions and mask regions on bases decoded from `[begin, end)`
///
/// `bases` must hold exactly the decoded bases of that range.
pub fn apply_regions(
    n_regions: &RegionList,
    mask_regions: &RegionList,
    begin: u32,
    end: u32,
    bases: &mut [u8],
) {
    for range in n_regions.covered(begin, end) {
        bases[(range.start - begin) as usize..(range.end - begin) as usize].fill(b'N');
    }
    for range in mask_regions.covered(begin, end) {
        bases[(range.start - begin) as usize..(range.end - begin) as usize].make_ascii_lowercase();
    }
}

/// Validates a requested sub-range against a sequence length
pub fn check_range(begin: u32, end: u32, len: u32) -> Result<()> {
    if begin > end || end > len {
        return Err(ReadError::InvalidRange { begin, end, len }.into());
    }
    Ok(())
}

/// Decodes bases `[begin, end)` of a sequence from the packed bytes covering them
///
/// Decoded bases are appended to `out`.
pub fn decode_packed(
    meta: &SequenceMeta,
    packed: &[u8],
    begin: u32,
    end: u32,
    out: &mut Vec<u8>,
) -> Result<()> {
    check_range(begin, end, meta.dna_size)?;
    let (_, n_bytes) = packed_span(begin, end);
    if packed.len() < n_bytes {
        return Err(ReadError::TruncatedSequence(meta.name.clone()).into());
    }
    let start = out.len();
    unpack(&packed[..n_bytes], begin, end, out);
    apply_regions(
        &meta.n_regions,
        &meta.mask_regions,
        begin,
        end,
        &mut out[start..],
    );
    Ok(())
}

/// Where the packed payload of a sequence is read from
#[derive(Debug, Clone)]
pub enum PackedSource {
    /// Reopen the file at this path for every decode
    Path(Arc<PathBuf>),
    /// Slice a shared memory mapping of the file
    Mmap(Arc<Mmap>),
}
impl PackedSource {
    /// Reads the packed bytes covering `[begin, end)` of `meta` and decodes them into `out`
    fn decode_into(
        &self,
        meta: &SequenceMeta,
        begin: u32,
        end: u32,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        check_range(begin, end, meta.dna_size)?;
        let (rel, n_bytes) = packed_span(begin, end);
        if n_bytes == 0 {
            return Ok(());
        }
        let pos = meta.packed_pos + rel;
        match self {
            Self::Path(path) => {
                let packed = read_packed(path, pos, n_bytes)?;
                decode_packed(meta, &packed, begin, end, out)
            }
            Self::Mmap(mmap) => {
                let lbound = usize::try_from(pos)
                    .map_err(|_| ReadError::TruncatedSequence(meta.name.clone()))?;
                let rbound = lbound.saturating_add(n_bytes).min(mmap.len());
                let packed = mmap.get(lbound..rbound).unwrap_or_default();
                decode_packed(meta, packed, begin, end, out)
            }
        }
    }
}

/// Reads `n_bytes` at `pos` with a short-lived handle
fn read_packed(path: &Path, pos: u64, n_bytes: usize) -> Result<Vec<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(pos))?;
    let mut packed = vec![0u8; n_bytes];
    file.read_exact(&mut packed)?;
    Ok(packed)
}

/// Decoding accessor for a single named sequence
///
/// Accessors are cheap to create and hold no open file handle; every decode re-reads
/// the packed bytes from storage.
#[derive(Debug, Clone)]
pub struct TwoBitSequence {
    meta: Arc<SequenceMeta>,
    source: PackedSource,
}
impl TwoBitSequence {
    #[must_use]
    pub fn new(meta: Arc<SequenceMeta>, source: PackedSource) -> Self {
        Self { meta, source }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Number of bases in the sequence
    #[must_use]
    pub fn len(&self) -> u32 {
        self.meta.dna_size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meta.dna_size == 0
    }

    #[must_use]
    pub fn meta(&self) -> &SequenceMeta {
        &self.meta
    }

    #[must_use]
    pub fn n_regions(&self) -> &RegionList {
        &self.meta.n_regions
    }

    #[must_use]
    pub fn mask_regions(&self) -> &RegionList {
        &self.meta.mask_regions
    }

    /// Appends the full decoded sequence to `dbuf`
    pub fn decode(&self, dbuf: &mut Vec<u8>) -> Result<()> {
        self.decode_range(0, self.len(), dbuf)
    }

    /// Appends the decoded bases `[begin, end)` to `dbuf`
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::InvalidRange`] if `begin > end` or `end > len`.
    pub fn decode_range(&self, begin: u32, end: u32, dbuf: &mut Vec<u8>) -> Result<()> {
        self.source.decode_into(&self.meta, begin, end, dbuf)
    }

    /// Decodes the full sequence
    pub fn sequence(&self) -> Result<String> {
        self.subsequence(0, self.len())
    }

    /// Decodes bases `[begin, end)`
    pub fn subsequence(&self, begin: u32, end: u32) -> Result<String> {
        let mut dbuf = Vec::with_capacity(end.saturating_sub(begin) as usize);
        self.decode_range(begin, end, &mut dbuf)?;
        Ok(String::from_utf8(dbuf).map_err(|e| e.utf8_error())?)
    }
}
