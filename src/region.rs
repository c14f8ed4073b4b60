//! Run-length encoded region tables
//!
//! Each sequence in a 2bit file carries two region tables, one for runs of unknown
//! bases (`N`) and one for soft-masked (lowercase) runs. On disk a table is stored as
//!
//! ```text
//! count:u32  starts:u32[count]  lengths:u32[count]
//! ```
//!
//! In memory the table is turned into a sorted list of signed events: a leading
//! `(0, 0)` sentinel followed by `(start, +1)` and `(start + length, -1)` for every
//! block. Accumulating the deltas along the list yields the number of regions covering
//! a position, and a position is inside a region iff that count is positive. The running
//! count after every event is precomputed so membership queries are a binary search.

use std::io::{Read, Write};
use std::ops::Range;

use crate::{error::Result, header::Endianness};

/// Upper bound on the number of entries preallocated from an untrusted count
const MAX_PREALLOC: usize = 1 << 16;

/// A single boundary in the sweep-line encoding of a region table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionEvent {
    /// Position of the boundary (0-based)
    pub pos: u32,
    /// `+1` for a region start, `-1` for a region end, `0` for the sentinel
    pub delta: i32,
}
impl RegionEvent {
    pub const SENTINEL: Self = Self { pos: 0, delta: 0 };
}

/// An N-region or mask-region table of a single sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionList {
    /// `(start, length)` blocks in file order
    blocks: Vec<(u32, u32)>,
    /// Sentinel followed by the boundaries sorted by position
    events: Vec<RegionEvent>,
    /// Running sum of `delta` after each event
    depth: Vec<i32>,
}
impl Default for RegionList {
    fn default() -> Self {
        Self::from_blocks(std::iter::empty())
    }
}
impl RegionList {
    /// Builds the event list from `(start, length)` blocks
    ///
    /// Blocks are not validated. Overlapping or out-of-range blocks are accepted and
    /// simply produce the membership their events imply.
    pub fn from_blocks<I: IntoIterator<Item = (u32, u32)>>(blocks: I) -> Self {
        let blocks: Vec<(u32, u32)> = blocks.into_iter().collect();

        let mut events = Vec::with_capacity(1 + 2 * blocks.len());
        events.push(RegionEvent::SENTINEL);
        for &(start, len) in &blocks {
            events.push(RegionEvent { pos: start, delta: 1 });
            events.push(RegionEvent {
                pos: start.saturating_add(len),
                delta: -1,
            });
        }
        // stable sort keeps the sentinel first and ties in emission order
        events[1..].sort_by_key(|event| event.pos);

        let depth = events
            .iter()
            .scan(0i32, |acc, event| {
                *acc += event.delta;
                Some(*acc)
            })
            .collect();

        Self {
            blocks,
            events,
            depth,
        }
    }

    /// Reads a region table (count, starts, lengths) in the given byte order
    pub fn from_reader<R: Read>(reader: &mut R, endian: Endianness) -> Result<Self> {
        let count = endian.read_u32(reader)? as usize;
        let starts = read_u32_run(reader, endian, count)?;
        let lengths = read_u32_run(reader, endian, count)?;
        Ok(Self::from_blocks(starts.into_iter().zip(lengths)))
    }

    /// Writes the region table (count, starts, lengths) in the given byte order
    pub fn write_bytes<W: Write>(&self, writer: &mut W, endian: Endianness) -> Result<()> {
        endian.write_u32(writer, self.blocks.len() as u32)?;
        for &(start, _) in &self.blocks {
            endian.write_u32(writer, start)?;
        }
        for &(_, len) in &self.blocks {
            endian.write_u32(writer, len)?;
        }
        Ok(())
    }

    /// Size of the serialized table in bytes
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        4 + 8 * self.blocks.len() as u64
    }

    /// Number of blocks in the table
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The sorted event list, starting with the `(0, 0)` sentinel
    #[must_use]
    pub fn events(&self) -> &[RegionEvent] {
        &self.events
    }

    /// Iterates over the blocks as half-open ranges in file order
    pub fn iter(&self) -> impl Iterator<Item = Range<u32>> + '_ {
        self.blocks
            .iter()
            .map(|&(start, len)| start..start.saturating_add(len))
    }

    /// Number of regions covering `pos`
    #[must_use]
    pub fn depth_at(&self, pos: u32) -> i32 {
        // the sentinel at position 0 guarantees at least one event satisfies the predicate
        let idx = self.events.partition_point(|event| event.pos <= pos);
        self.depth[idx - 1]
    }

    /// Whether `pos` lies inside any region
    #[must_use]
    pub fn contains(&self, pos: u32) -> bool {
        self.depth_at(pos) > 0
    }

    /// Returns the covered parts of `[begin, end)` as disjoint, ascending ranges
    #[must_use]
    pub fn covered(&self, begin: u32, end: u32) -> Vec<Range<u32>> {
        let mut ranges = Vec::new();
        if begin >= end {
            return ranges;
        }

        let mut idx = self.events.partition_point(|event| event.pos <= begin);
        let mut open = (self.depth[idx - 1] > 0).then_some(begin);

        while idx < self.events.len() && self.events[idx].pos < end {
            let pos = self.events[idx].pos;
            match (open, self.depth[idx] > 0) {
                (None, true) => open = Some(pos),
                (Some(start), false) => {
                    if pos > start {
                        ranges.push(start..pos);
                    }
                    open = None;
                }
                _ => {}
            }
            idx += 1;
        }
        if let Some(start) = open {
            ranges.push(start..end);
        }
        ranges
    }
}

/// Reads `count` u32 values without trusting `count` for the allocation size
fn read_u32_run<R: Read>(reader: &mut R, endian: Endianness, count: usize) -> Result<Vec<u32>> {
    let mut values = Vec::with_capacity(count.min(MAX_PREALLOC));
    for _ in 0..count {
        values.push(endian.read_u32(reader)?);
    }
    Ok(values)
}
