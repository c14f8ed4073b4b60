use std::io::Write;

use anyhow::Result;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use tempfile::NamedTempFile;
use twobit::{
    Endianness, MmapReader, Policy, TwoBitFile, TwoBitRead, TwoBitWriterBuilder, RNG_SEED,
};

/// Random sequence with occasional N runs and soft-masked runs
fn random_genomic(rng: &mut SmallRng, len: usize) -> Vec<u8> {
    let mut seq = Vec::with_capacity(len);
    while seq.len() < len {
        let run = rng.random_range(1..40).min(len - seq.len());
        let kind = rng.random_range(0..10);
        for _ in 0..run {
            let base = match rng.random_range(0..4) {
                0 => b'A',
                1 => b'C',
                2 => b'G',
                _ => b'T',
            };
            seq.push(match kind {
                0 => b'N',
                1 | 2 => base.to_ascii_lowercase(),
                _ => base,
            });
        }
    }
    seq
}

fn write_file(records: &[(String, Vec<u8>)], endian: Endianness) -> Result<NamedTempFile> {
    let mut writer = TwoBitWriterBuilder::default()
        .endian(endian)
        .build(Vec::new());
    for (name, seq) in records {
        writer.add(name, seq)?;
    }
    let mut tmp = NamedTempFile::new()?;
    tmp.write_all(&writer.finish()?)?;
    tmp.flush()?;
    Ok(tmp)
}

fn fixture() -> Vec<(String, Vec<u8>)> {
    let mut rng = SmallRng::seed_from_u64(RNG_SEED);
    (0..8)
        .map(|i| {
            let len = rng.random_range(0..3000);
            (format!("chr{i}"), random_genomic(&mut rng, len))
        })
        .collect()
}

#[test]
fn decode_matches_source() -> Result<()> {
    let records = fixture();
    let tmp = write_file(&records, Endianness::Little)?;
    let file = TwoBitFile::open(tmp.path())?;

    assert_eq!(file.num_sequences(), records.len());
    let lengths = file.sequence_lengths();
    for (name, seq) in &records {
        assert_eq!(lengths[name] as usize, seq.len());
        let decoded = file.get(name)?.sequence()?;
        assert_eq!(decoded.len(), seq.len());
        assert_eq!(decoded.as_bytes(), seq.as_slice());
    }
    Ok(())
}

#[test]
fn readers_agree_on_subranges() -> Result<()> {
    let records = fixture();
    let tmp = write_file(&records, Endianness::Big)?;
    let file = TwoBitFile::open(tmp.path())?;
    let mmap = MmapReader::new(tmp.path())?;
    assert!(file.header().endian == Endianness::Big);

    let mut rng = SmallRng::seed_from_u64(RNG_SEED + 1);
    for (name, seq) in &records {
        for _ in 0..20 {
            let a = rng.random_range(0..=seq.len());
            let b = rng.random_range(0..=seq.len());
            let (begin, end) = (a.min(b) as u32, a.max(b) as u32);
            let from_file = file.fetch(name, begin, end)?;
            let from_mmap = mmap.fetch(name, begin, end)?;
            assert_eq!(from_file, from_mmap);
            assert_eq!(from_file.as_bytes(), &seq[begin as usize..end as usize]);
        }
    }
    Ok(())
}

#[test]
fn region_events_are_balanced() -> Result<()> {
    let records = fixture();
    let tmp = write_file(&records, Endianness::Little)?;
    let file = TwoBitFile::open(tmp.path())?;
    for sequence in file.sequences() {
        for regions in [sequence.n_regions(), sequence.mask_regions()] {
            let mut depth = 0;
            for event in regions.events() {
                depth += event.delta;
                assert!(depth >= 0);
            }
            assert_eq!(depth, 0);
        }
    }
    Ok(())
}

#[test]
fn random_draw_policy_is_reproducible() -> Result<()> {
    let records = vec![("chr1".to_string(), b"ACRYKMacgtSW".to_vec())];
    let encode = || -> Result<Vec<u8>> {
        let mut writer = TwoBitWriterBuilder::default()
            .policy(Policy::RandomDraw)
            .build(Vec::new());
        for (name, seq) in &records {
            writer.add(name, seq)?;
        }
        Ok(writer.finish()?)
    };
    assert_eq!(encode()?, encode()?);

    let mut tmp = NamedTempFile::new()?;
    tmp.write_all(&encode()?)?;
    tmp.flush()?;
    let decoded = TwoBitFile::open(tmp.path())?.fetch("chr1", 0, 12)?;
    assert!(decoded.bytes().all(|b| b"ACGTacgt".contains(&b)));
    assert_eq!(&decoded[6..10], "acgt");
    Ok(())
}
