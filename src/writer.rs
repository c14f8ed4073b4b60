//! 2bit writer module
//!
//! This module encodes nucleotide sequences into the 2bit layout:
//! - Bases are packed four to a byte with the alphabet `T=00 C=01 A=10 G=11`
//! - Runs of `N` become the N-region table and are packed as `T`
//! - Runs of lowercase bases become the mask-region table, unless masking is turned off
//! - Characters outside `ACGTN` are mapped by a configurable [`Policy`]
//!
//! The header and the name/offset index precede all sequence records, so every
//! sequence is encoded in memory first and the file is emitted by
//! [`TwoBitWriter::finish`].

use std::collections::HashSet;
use std::io::Write;

use rand::{rngs::SmallRng, SeedableRng};

use crate::{
    error::{Result, WriteError},
    header::{Endianness, TwoBitHeader, SIZE_HEADER},
    region::RegionList,
    Policy, RNG_SEED,
};

/// Packs a single base into its 2-bit code; anything that is not `C`, `A`, or `G` packs as `T`
#[must_use]
pub fn base_code(base: u8) -> u8 {
    match base {
        b'C' | b'c' => 0b01,
        b'A' | b'a' => 0b10,
        b'G' | b'g' => 0b11,
        _ => 0b00,
    }
}

/// Packs bases four to a byte, most significant bit-pair first
#[must_use]
pub fn pack(sequence: &[u8]) -> Vec<u8> {
    sequence
        .chunks(4)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (slot, &base)| {
                    byte | (base_code(base) << (6 - 2 * slot))
                })
        })
        .collect()
}

/// Collects maximal runs of bases matching `pred` as `(start, length)` blocks
fn runs<F: Fn(u8) -> bool>(sequence: &[u8], pred: F) -> Vec<(u32, u32)> {
    let mut blocks = Vec::new();
    let mut start = None;
    for (pos, &base) in sequence.iter().enumerate() {
        match (start, pred(base)) {
            (None, true) => start = Some(pos),
            (Some(s), false) => {
                blocks.push((s as u32, (pos - s) as u32));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        blocks.push((s as u32, (sequence.len() - s) as u32));
    }
    blocks
}

/// A single sequence encoded into its on-disk record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSequence {
    pub name: String,
    pub dna_size: u32,
    pub n_regions: RegionList,
    pub mask_regions: RegionList,
    pub packed: Vec<u8>,
}
impl EncodedSequence {
    /// Encodes a sequence made only of `ACGTN` in either case
    pub fn encode(name: &str, sequence: &[u8]) -> Result<Self> {
        let dna_size = u32::try_from(sequence.len()).map_err(|_| WriteError::SequenceTooLong {
            name: name.to_string(),
            len: sequence.len(),
        })?;
        Ok(Self {
            name: name.to_string(),
            dna_size,
            n_regions: RegionList::from_blocks(runs(sequence, |b| b.eq_ignore_ascii_case(&b'N'))),
            mask_regions: RegionList::from_blocks(runs(sequence, |b| b.is_ascii_lowercase())),
            packed: pack(sequence),
        })
    }

    /// Size of the serialized record in bytes
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        4 + self.n_regions.size_bytes()
            + self.mask_regions.size_bytes()
            + 4
            + self.packed.len() as u64
    }

    /// Writes the record: length, N-regions, mask regions, zero field, packed bases
    pub fn write_bytes<W: Write>(&self, writer: &mut W, endian: Endianness) -> Result<()> {
        endian.write_u32(writer, self.dna_size)?;
        self.n_regions.write_bytes(writer, endian)?;
        self.mask_regions.write_bytes(writer, endian)?;
        endian.write_u32(writer, 0)?;
        writer.write_all(&self.packed)?;
        Ok(())
    }
}

/// Builder for [`TwoBitWriter`]
#[derive(Debug, Default, Clone, Copy)]
pub struct TwoBitWriterBuilder {
    endian: Option<Endianness>,
    policy: Option<Policy>,
    mask: Option<bool>,
}
impl TwoBitWriterBuilder {
    /// Byte order of the written file (native by default)
    #[must_use]
    pub fn endian(mut self, endian: Endianness) -> Self {
        self.endian = Some(endian);
        self
    }

    /// Handling of characters outside `ACGTN` ([`Policy::MarkAsN`] by default)
    #[must_use]
    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Whether lowercase runs are stored as mask regions (on by default)
    ///
    /// With masking off, lowercase bases are stored as their uppercase counterparts.
    #[must_use]
    pub fn mask(mut self, mask: bool) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn build<W: Write>(self, inner: W) -> TwoBitWriter<W> {
        TwoBitWriter {
            inner,
            endian: self.endian.unwrap_or_default(),
            policy: self.policy.unwrap_or_default(),
            mask: self.mask.unwrap_or(true),
            rng: SmallRng::seed_from_u64(RNG_SEED),
            records: Vec::new(),
            names: HashSet::new(),
            ibuf: Vec::new(),
        }
    }
}

/// Collects sequences and writes them as a 2bit file
pub struct TwoBitWriter<W: Write> {
    /// Inner writer
    inner: W,

    /// Byte order of every integer written
    endian: Endianness,

    /// Invalid nucleotide policy
    policy: Policy,

    /// Keep lowercase runs as mask regions
    mask: bool,

    /// Random number generator for the `RandomDraw` policy
    /// Seeded with `RNG_SEED` for reproducibility
    rng: SmallRng,

    /// Encoded sequences in insertion order
    records: Vec<EncodedSequence>,

    /// Names already added
    names: HashSet<String>,

    /// Reusable buffer for sequences rewritten by the policy
    ibuf: Vec<u8>,
}
impl<W: Write> TwoBitWriter<W> {
    /// Creates a writer with native byte order and the default policy
    pub fn new(inner: W) -> Self {
        TwoBitWriterBuilder::default().build(inner)
    }

    /// Encodes a sequence and queues it for writing
    ///
    /// Returns `Ok(true)` if the sequence was queued and `Ok(false)` if it was skipped
    /// by the invalid nucleotide policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty, longer than 255 bytes, or already used,
    /// if the sequence is too long for the format, or if the policy rejects it.
    pub fn add(&mut self, name: &str, sequence: &[u8]) -> Result<bool> {
        if name.is_empty() {
            return Err(WriteError::EmptyName.into());
        }
        if name.len() > u8::MAX as usize {
            return Err(WriteError::NameTooLong(name.to_string()).into());
        }
        if self.names.contains(name) {
            return Err(WriteError::DuplicateName(name.to_string()).into());
        }

        let mut encoded = if sequence.iter().all(|&b| Policy::is_valid(b)) {
            EncodedSequence::encode(name, sequence)?
        } else if self.policy.handle(sequence, &mut self.ibuf, &mut self.rng)? {
            EncodedSequence::encode(name, &self.ibuf)?
        } else {
            log::warn!("skipping sequence '{name}' with invalid nucleotides");
            return Ok(false);
        };
        if !self.mask {
            encoded.mask_regions = RegionList::default();
        }

        self.names.insert(name.to_string());
        self.records.push(encoded);
        Ok(true)
    }

    /// Number of sequences queued so far
    #[must_use]
    pub fn num_sequences(&self) -> usize {
        self.records.len()
    }

    /// Writes header, index, and every queued sequence, then returns the inner writer
    ///
    /// # Errors
    ///
    /// Returns an error if the file would exceed the 4GB offset range of the format or
    /// if writing fails.
    pub fn finish(mut self) -> Result<W> {
        let count = u32::try_from(self.records.len())
            .map_err(|_| WriteError::TooManySequences(self.records.len()))?;
        let header = TwoBitHeader::with_endian(count, self.endian);

        let index_size: u64 = self
            .records
            .iter()
            .map(|record| 1 + record.name.len() as u64 + 4)
            .sum();
        let mut pos = SIZE_HEADER as u64 + index_size;
        let mut offsets = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let offset = u32::try_from(pos).map_err(|_| WriteError::FileTooLarge(pos))?;
            offsets.push(offset);
            pos += record.size_bytes();
        }

        header.write_bytes(&mut self.inner)?;
        for (record, &offset) in self.records.iter().zip(&offsets) {
            self.inner.write_all(&[record.name.len() as u8])?;
            self.inner.write_all(record.name.as_bytes())?;
            self.endian.write_u32(&mut self.inner, offset)?;
        }
        for record in &self.records {
            record.write_bytes(&mut self.inner, self.endian)?;
        }
        self.inner.flush()?;

        log::debug!("wrote {} sequences ({pos} bytes)", self.records.len());
        Ok(self.inner)
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::Error;

    #[test]
    fn test_pack_alphabet() {
        assert_eq!(pack(b"ACGTACGT"), vec![0b1001_1100, 0b1001_1100]);
        assert_eq!(pack(b"TCAG"), vec![0b0001_1011]);
        // trailing bases fill the high bit-pairs first
        assert_eq!(pack(b"GA"), vec![0b1110_0000]);
        assert_eq!(pack(b"nN"), vec![0]);
    }

    #[test]
    fn test_runs() {
        assert_eq!(runs(b"NNacgNtn", |b| b == b'N'), vec![(0, 2), (5, 1)]);
        assert_eq!(runs(b"NNacgNtn", |b| b.is_ascii_lowercase()), vec![(2, 3), (6, 2)]);
        assert!(runs(b"", |_| true).is_empty());
    }

    #[test]
    fn test_encoded_record_layout() -> Result<()> {
        let encoded = EncodedSequence::encode("chr1", b"acNNACGTA")?;
        assert_eq!(encoded.dna_size, 9);
        assert_eq!(encoded.n_regions.iter().collect::<Vec<_>>(), vec![2..4]);
        assert_eq!(encoded.mask_regions.iter().collect::<Vec<_>>(), vec![0..2]);
        assert_eq!(encoded.packed.len(), 3);

        let mut buf = Vec::new();
        encoded.write_bytes(&mut buf, Endianness::Little)?;
        assert_eq!(buf.len() as u64, encoded.size_bytes());
        Ok(())
    }

    #[test]
    fn test_name_validation() {
        let mut writer = TwoBitWriter::new(Vec::new());
        assert!(matches!(
            writer.add("", b"ACGT").unwrap_err(),
            Error::WriteError(WriteError::EmptyName)
        ));
        let long = "x".repeat(256);
        assert!(matches!(
            writer.add(&long, b"ACGT").unwrap_err(),
            Error::WriteError(WriteError::NameTooLong(_))
        ));
        assert!(writer.add(&"x".repeat(255), b"ACGT").unwrap());
        assert!(writer.add("chr1", b"ACGT").unwrap());
        assert!(matches!(
            writer.add("chr1", b"ACGT").unwrap_err(),
            Error::WriteError(WriteError::DuplicateName(_))
        ));
        assert_eq!(writer.num_sequences(), 2);
    }

    #[test]
    fn test_policy_skip() -> Result<()> {
        let mut writer = TwoBitWriterBuilder::default()
            .policy(Policy::IgnoreSequence)
            .build(Vec::new());
        assert!(!writer.add("bad", b"ACRT")?);
        assert!(writer.add("good", b"ACNT")?);
        assert_eq!(writer.num_sequences(), 1);
        Ok(())
    }

    #[test]
    fn test_mask_disabled() -> Result<()> {
        let mut writer = TwoBitWriterBuilder::default()
            .mask(false)
            .build(Vec::new());
        writer.add("chr1", b"acgtNNnnACGT")?;
        assert!(writer.records[0].mask_regions.is_empty());
        assert_eq!(writer.records[0].n_regions.iter().collect::<Vec<_>>(), vec![4..8]);

        let mut masked = TwoBitWriter::new(Vec::new());
        masked.add("chr1", b"acgtNNnnACGT")?;
        assert_eq!(
            masked.records[0].mask_regions.iter().collect::<Vec<_>>(),
            vec![0..4, 6..8]
        );
        assert_eq!(masked.records[0].packed, writer.records[0].packed);
        Ok(())
    }

    #[test]
    fn test_file_layout() -> Result<()> {
        let mut writer = TwoBitWriterBuilder::default()
            .endian(Endianness::Little)
            .build(Vec::new());
        writer.add("chr1", b"ACGTACGT")?;
        let buf = writer.finish()?;

        // header (16) + index (1 + 4 + 4) + record (4 + 4 + 4 + 4 + 2)
        assert_eq!(buf.len(), 16 + 9 + 18);
        assert_eq!(&buf[..4], &[0x43, 0x27, 0x41, 0x1A]);
        assert_eq!(buf[16], 4);
        assert_eq!(&buf[17..21], b"chr1");
        assert_eq!(&buf[21..25], &25u32.to_le_bytes());
        assert_eq!(&buf[25..29], &8u32.to_le_bytes());
        assert_eq!(&buf[41..], &[0b1001_1100, 0b1001_1100]);
        Ok(())
    }
}
