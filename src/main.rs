#[macro_use]
extern crate log;

use std::{
    fs::File,
    io::{stdout, BufWriter, Write},
    path::Path,
};

use anyhow::{bail, Result};
use clap::Parser;
use seq_io::fasta::{Reader, Record};

use twobit::{TwoBitFile, TwoBitRead, TwoBitWriterBuilder};

mod cli;

use cli::{Cli, Commands};

/// Appends `ext` to `path` unless it already ends with one of `accepted`
fn with_extension(path: &str, ext: &str, accepted: &[&str]) -> String {
    if accepted.iter().any(|suffix| path.ends_with(suffix)) {
        path.to_string()
    } else {
        format!("{path}{ext}")
    }
}

/// Refuses to clobber an existing file unless overwriting was requested
fn check_output(path: &str, overwrite: bool) -> Result<()> {
    if !overwrite && Path::new(path).exists() {
        bail!("File {path} already exists, use --overwrite to over write");
    }
    Ok(())
}

/// Creates a `BufWriter` for the given output option, defaulting to standard output
fn get_writer(output: Option<&str>) -> Result<BufWriter<Box<dyn Write>>> {
    let inner: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(stdout()),
    };
    Ok(BufWriter::new(inner))
}

/// Writes one FASTA record, wrapping the sequence every `width` bases (0 disables wrapping)
fn write_fasta<W: Write>(writer: &mut W, name: &str, bases: &[u8], width: usize) -> Result<()> {
    writeln!(writer, ">{name}")?;
    let width = if width == 0 { bases.len().max(1) } else { width };
    for line in bases.chunks(width) {
        writer.write_all(line)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Sequence name taken from a FASTA header line
fn record_name(head: &[u8], trim_at_whitespace: bool) -> Result<&str> {
    let name = if trim_at_whitespace {
        let end = memchr::memchr2(b' ', b'\t', head).unwrap_or(head.len());
        &head[..end]
    } else {
        head
    };
    Ok(std::str::from_utf8(name)?.trim_end())
}

fn two_bit_to_fa(
    input: &str,
    output: Option<&str>,
    width: usize,
    overwrite: bool,
    seq: Option<&str>,
    start: Option<u32>,
    end: Option<u32>,
) -> Result<()> {
    let output = output.map(|path| with_extension(path, ".fasta", &[".fasta", ".fa", ".fna"]));
    if let Some(path) = &output {
        check_output(path, overwrite)?;
    }

    let file = TwoBitFile::open(input)?;
    let mut writer = get_writer(output.as_deref())?;
    let mut dbuf = Vec::new();

    if let Some(name) = seq {
        let sequence = file.get(name)?;
        let begin = start.unwrap_or(0);
        let end = end.unwrap_or(sequence.len());
        sequence.decode_range(begin, end, &mut dbuf)?;
        let header = if start.is_some() || end != sequence.len() {
            format!("{name}:{begin}-{end}")
        } else {
            name.to_string()
        };
        write_fasta(&mut writer, &header, &dbuf, width)?;
    } else {
        for sequence in file.sequences() {
            dbuf.clear();
            sequence.decode(&mut dbuf)?;
            write_fasta(&mut writer, sequence.name(), &dbuf, width)?;
        }
    }
    writer.flush()?;
    info!("Wrote {} sequences from {input}", if seq.is_some() { 1 } else { file.num_sequences() });
    Ok(())
}

fn fa_to_two_bit(
    inputs: &[String],
    output: &str,
    overwrite: bool,
    trim_name_at_whitespace: bool,
    no_mask: bool,
    policy: twobit::Policy,
    endian: twobit::Endianness,
) -> Result<()> {
    let output = with_extension(output, ".2bit", &[".2bit"]);
    check_output(&output, overwrite)?;

    let mut writer = TwoBitWriterBuilder::default()
        .policy(policy)
        .endian(endian)
        .mask(!no_mask)
        .build(Vec::new());

    let mut skipped = 0;
    for input in inputs {
        let (handle, _comp) = niffler::from_path(input)?;
        let mut reader = Reader::new(handle);
        while let Some(record) = reader.next() {
            let record = record?;
            let name = record_name(record.head(), trim_name_at_whitespace)?;
            if !writer.add(name, &record.full_seq())? {
                skipped += 1;
            }
        }
    }
    let num_sequences = writer.num_sequences();
    let bytes = writer.finish()?;

    let mut out = File::create(&output).map(BufWriter::new)?;
    out.write_all(&bytes)?;
    out.flush()?;

    info!("Wrote {num_sequences} sequences to {output}");
    if skipped > 0 {
        warn!("Skipped {skipped} sequences with invalid nucleotides");
    }
    Ok(())
}

fn try_main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ToFa {
            input,
            output,
            width,
            overwrite,
            seq,
            start,
            end,
        } => two_bit_to_fa(
            &input,
            output.as_deref(),
            width,
            overwrite,
            seq.as_deref(),
            start,
            end,
        )?,
        Commands::FromFa {
            input,
            output,
            overwrite,
            trim_name_at_whitespace,
            no_mask,
            policy,
            big_endian,
        } => fa_to_two_bit(
            &input,
            &output,
            overwrite,
            trim_name_at_whitespace,
            no_mask,
            policy.into(),
            cli::endian(big_endian),
        )?,
    }
    Ok(())
}

fn main() {
    if let Err(err) = try_main() {
        error!("{}", err);

        // report any errors that are produced
        err.chain()
            .skip(1)
            .for_each(|cause| error!("  because: {}", cause));
        std::process::exit(1);
    }
}
