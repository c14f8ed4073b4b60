//! Path-backed 2bit reader
//!
//! [`TwoBitFile`] opens the file once to parse the header, the name/offset index, and
//! every sequence record, then closes it. Decoding reopens the file with a short-lived
//! handle for each call, so a `TwoBitFile` holds no open descriptor and can be shared
//! across threads freely.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    error::{ReadError, Result},
    index::SequenceIndex,
    read::TwoBitRead,
    sequence::PackedSource,
};

/// A parsed 2bit file that decodes sequences by reopening its path
///
/// Cloning is cheap: clones share the immutable index. Use [`reload`](Self::reload) to
/// pick up changes made to the file on disk.
#[derive(Debug, Clone)]
pub struct TwoBitFile {
    /// Path of the underlying file
    path: Arc<PathBuf>,

    /// Metadata of every sequence in the file
    index: Arc<SequenceIndex>,
}
impl TwoBitFile {
    /// Opens and fully indexes a 2bit file
    ///
    /// The file handle is closed before this returns, on success and on failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a readable regular file, or if any part of
    /// the header, index, or sequence records is malformed or truncated.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let index = Self::read_index(&path)?;
        Ok(Self {
            path: Arc::new(path),
            index: Arc::new(index),
        })
    }

    fn read_index(path: &Path) -> Result<SequenceIndex> {
        // Verify input file is a file before attempting to parse
        let file = File::open(path)?;
        if !file.metadata()?.is_file() {
            return Err(ReadError::IncompatibleFile.into());
        }
        log::debug!("indexing {}", path.display());
        let mut reader = BufReader::new(file);
        SequenceIndex::from_reader(&mut reader)
    }

    /// Re-parses the file from disk, replacing the shared index of this instance
    ///
    /// On failure the previous index is kept.
    pub fn reload(&mut self) -> Result<()> {
        self.index = Arc::new(Self::read_index(&self.path)?);
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
impl TwoBitRead for TwoBitFile {
    fn index(&self) -> &SequenceIndex {
        &self.index
    }

    fn source(&self) -> PackedSource {
        PackedSource::Path(Arc::clone(&self.path))
    }
}

#[cfg(test)]
mod testing {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::{Error, TwoBitWriterBuilder};

    fn write_file(records: &[(&str, &[u8])]) -> Result<NamedTempFile> {
        let mut writer = TwoBitWriterBuilder::default().build(Vec::new());
        for (name, seq) in records {
            writer.add(name, seq)?;
        }
        let mut file = NamedTempFile::new()?;
        file.write_all(&writer.finish()?)?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_open_and_lookup() -> Result<()> {
        let tmp = write_file(&[("chr1", b"ACGTACGT"), ("chr2", b"NNNNacgt")])?;
        let file = TwoBitFile::open(tmp.path())?;
        assert_eq!(file.num_sequences(), 2);
        assert_eq!(file.sequence_names(), &["chr1", "chr2"]);
        assert_eq!(file.get("chr1")?.sequence()?, "ACGTACGT");
        assert_eq!(file.fetch("chr2", 2, 6)?, "NNac");
        Ok(())
    }

    #[test]
    fn test_unknown_name_keeps_file_usable() -> Result<()> {
        let tmp = write_file(&[("chr1", b"ACGTACGT")])?;
        let file = TwoBitFile::open(tmp.path())?;
        let err = file.get("chrX").unwrap_err();
        assert!(err.is_not_found());
        assert!(!file.contains("chrX"));
        assert_eq!(file.get("chr1")?.sequence()?, "ACGTACGT");
        Ok(())
    }

    #[test]
    fn test_clone_shares_index() -> Result<()> {
        let tmp = write_file(&[("chr1", b"ACGT")])?;
        let file = TwoBitFile::open(tmp.path())?;
        let copy = file.clone();
        assert!(Arc::ptr_eq(&file.index, &copy.index));
        assert_eq!(copy.fetch("chr1", 0, 4)?, "ACGT");
        Ok(())
    }

    #[test]
    fn test_reload_picks_up_changes() -> Result<()> {
        let tmp = write_file(&[("chr1", b"ACGT")])?;
        let mut file = TwoBitFile::open(tmp.path())?;
        let copy = file.clone();

        let mut writer = TwoBitWriterBuilder::default().build(Vec::new());
        writer.add("chrA", b"GG")?;
        writer.add("chrB", b"TT")?;
        std::fs::write(tmp.path(), writer.finish()?)?;

        file.reload()?;
        assert_eq!(file.sequence_names(), &["chrA", "chrB"]);
        // the clone still sees the index it was created with
        assert_eq!(copy.sequence_names(), &["chr1"]);
        Ok(())
    }

    #[test]
    fn test_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TwoBitFile::open(dir.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = TwoBitFile::open("/nonexistent/path/to/file.2bit").unwrap_err();
        assert!(matches!(err, Error::IoError(_)));
    }
}
