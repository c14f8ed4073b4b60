use std::sync::Arc;

use crate::{read::TwoBitRead, sequence::TwoBitSequence, Result};

/// A decoded sequence handed to a [`ParallelProcessor`]
#[derive(Debug, Clone, Copy)]
pub struct DecodedRecord<'a> {
    /// Position of the sequence in file order
    pub index: usize,
    /// Accessor the bases were decoded from
    pub sequence: &'a TwoBitSequence,
    /// The fully decoded bases
    pub bases: &'a [u8],
}
impl DecodedRecord<'_> {
    #[must_use]
    pub fn name(&self) -> &str {
        self.sequence.name()
    }
}

/// Trait for 2bit readers that can decode sequences in parallel
///
/// This is implemented by the **reader** not by the **processor**.
/// For the **processor**, see the [`ParallelProcessor`] trait.
pub trait ParallelReader {
    fn process_parallel<P: ParallelProcessor + Clone + 'static>(
        self,
        processor: P,
        num_threads: usize,
    ) -> Result<()>;
}

/// Trait for types that can process decoded sequences in parallel.
///
/// This is implemented by the **processor** not by the **reader**.
/// For the **reader**, see the [`ParallelReader`] trait.
pub trait ParallelProcessor: Send + Clone {
    /// Process a single decoded sequence
    fn process_record(&mut self, record: DecodedRecord<'_>) -> Result<()>;

    /// Called when a thread finishes its share of sequences
    fn on_batch_complete(&mut self) -> Result<()> {
        Ok(())
    }

    /// Set the thread ID for this processor
    ///
    /// Each thread should call this method with its own unique ID.
    fn set_tid(&mut self, _tid: usize) {}

    /// Get the thread ID for this processor
    fn get_tid(&self) -> Option<usize> {
        None
    }
}

impl<T: TwoBitRead + Send + Sync + 'static> ParallelReader for T {
    /// Decodes every sequence, distributing contiguous runs of sequences across threads
    ///
    /// Each decode reads through its own short-lived access to the file. A thread count
    /// of zero uses all available cores.
    fn process_parallel<P: ParallelProcessor + Clone + 'static>(
        self,
        processor: P,
        num_threads: usize,
    ) -> Result<()> {
        let num_threads = if num_threads == 0 {
            num_cpus::get()
        } else {
            num_threads.min(num_cpus::get())
        };

        let sequences = Arc::new(self.sequences());
        let num_sequences = sequences.len();
        if num_sequences == 0 {
            return Ok(());
        }
        let per_thread = num_sequences.div_ceil(num_threads);

        let mut handles = Vec::new();
        for tid in 0..num_threads {
            let mut processor = processor.clone();
            let sequences = Arc::clone(&sequences);
            processor.set_tid(tid);

            let handle = std::thread::spawn(move || -> Result<()> {
                let start_idx = tid * per_thread;
                let end_idx = (start_idx + per_thread).min(num_sequences);
                if start_idx >= end_idx {
                    return Ok(());
                }

                let mut dbuf = Vec::new();
                let assigned = sequences.iter().enumerate().take(end_idx).skip(start_idx);
                for (index, sequence) in assigned {
                    dbuf.clear();
                    sequence.decode(&mut dbuf)?;
                    processor.process_record(DecodedRecord {
                        index,
                        sequence,
                        bases: &dbuf,
                    })?;
                }
                processor.on_batch_complete()?;
                Ok(())
            });
            handles.push(handle);
        }

        log::debug!("decoding {num_sequences} sequences on {num_threads} threads");
        // every thread is joined before the first error is reported
        let mut first_err = None;
        for handle in handles {
            let outcome = handle.join().unwrap_or_else(|_| {
                Err(anyhow::anyhow!("sequence processing thread panicked").into())
            });
            if let Err(err) = outcome {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod testing {
    use std::io::Write;

    use parking_lot::Mutex;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::{MmapReader, TwoBitFile, TwoBitWriterBuilder};

    #[derive(Clone, Default)]
    struct Collector {
        seen: Arc<Mutex<Vec<(usize, String, String)>>>,
        tid: Option<usize>,
    }
    impl ParallelProcessor for Collector {
        fn process_record(&mut self, record: DecodedRecord<'_>) -> Result<()> {
            let bases = String::from_utf8(record.bases.to_vec()).map_err(|e| e.utf8_error())?;
            self.seen
                .lock()
                .push((record.index, record.name().to_string(), bases));
            Ok(())
        }
        fn set_tid(&mut self, tid: usize) {
            self.tid = Some(tid);
        }
        fn get_tid(&self) -> Option<usize> {
            self.tid
        }
    }

    fn fixture() -> Result<(NamedTempFile, Vec<(String, String)>)> {
        let records: Vec<(String, String)> = (0..13)
            .map(|i| (format!("seq{i}"), "ACGTN".repeat(i + 1).to_lowercase()))
            .collect();
        let mut writer = TwoBitWriterBuilder::default().build(Vec::new());
        for (name, seq) in &records {
            writer.add(name, seq.as_bytes())?;
        }
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(&writer.finish()?)?;
        tmp.flush()?;
        Ok((tmp, records))
    }

    fn check(seen: &Mutex<Vec<(usize, String, String)>>, records: &[(String, String)]) {
        let mut seen = seen.lock().clone();
        seen.sort();
        assert_eq!(seen.len(), records.len());
        for (idx, name, bases) in seen {
            assert_eq!(&records[idx].0, &name);
            assert_eq!(&records[idx].1, &bases);
        }
    }

    #[test]
    fn test_parallel_file() -> Result<()> {
        let (tmp, records) = fixture()?;
        let collector = Collector::default();
        TwoBitFile::open(tmp.path())?.process_parallel(collector.clone(), 4)?;
        check(&collector.seen, &records);
        Ok(())
    }

    #[derive(Clone, Default)]
    struct FailFirst {
        inner: Collector,
    }
    impl ParallelProcessor for FailFirst {
        fn process_record(&mut self, record: DecodedRecord<'_>) -> Result<()> {
            if record.index == 0 {
                return Err(anyhow::anyhow!("rejected {}", record.name()).into());
            }
            self.inner.process_record(record)
        }
    }

    #[test]
    fn test_parallel_error_waits_for_all_threads() -> Result<()> {
        let (tmp, records) = fixture()?;
        let processor = FailFirst::default();
        let err = TwoBitFile::open(tmp.path())?
            .process_parallel(processor.clone(), 4)
            .unwrap_err();
        assert!(err.to_string().contains("rejected seq0"));

        // the failing thread stops at its first sequence, every other thread ran to completion
        let per_thread = records.len().div_ceil(4.min(num_cpus::get()));
        let mut seen: Vec<usize> = processor.inner.seen.lock().iter().map(|s| s.0).collect();
        seen.sort_unstable();
        assert_eq!(seen, (per_thread..records.len()).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn test_parallel_mmap_all_cores() -> Result<()> {
        let (tmp, records) = fixture()?;
        let collector = Collector::default();
        MmapReader::new(tmp.path())?.process_parallel(collector.clone(), 0)?;
        check(&collector.seen, &records);
        Ok(())
    }
}
