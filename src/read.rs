use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    error::{ReadError, Result},
    header::TwoBitHeader,
    index::SequenceIndex,
    sequence::{PackedSource, TwoBitSequence},
};

/// Shared lookup surface of the 2bit readers
///
/// Implementors only provide the parsed index and the source of packed bytes; every
/// lookup is answered from the in-memory index, and decoding goes through the
/// [`TwoBitSequence`] accessors handed out by [`get`](Self::get).
pub trait TwoBitRead {
    /// The fully populated index of the file
    fn index(&self) -> &SequenceIndex;

    /// Where accessors read packed bases from
    fn source(&self) -> PackedSource;

    fn header(&self) -> TwoBitHeader {
        self.index().header()
    }

    /// Sequence names in file order
    fn sequence_names(&self) -> &[String] {
        self.index().names()
    }

    /// Whether a sequence with this name exists
    fn contains(&self, name: &str) -> bool {
        self.index().contains(name)
    }

    /// Declared length of every sequence, keyed by name
    fn sequence_lengths(&self) -> HashMap<String, u32> {
        self.index().lengths()
    }

    /// Number of sequences declared by the file
    fn num_sequences(&self) -> usize {
        self.index().len()
    }

    /// Returns a decoding accessor for the named sequence
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::UnknownSequence`] if the name is not in the file.
    fn get(&self, name: &str) -> Result<TwoBitSequence> {
        let meta = self
            .index()
            .get(name)
            .ok_or_else(|| ReadError::UnknownSequence(name.to_string()))?;
        Ok(TwoBitSequence::new(Arc::clone(meta), self.source()))
    }

    /// Decodes bases `[begin, end)` of the named sequence
    fn fetch(&self, name: &str, begin: u32, end: u32) -> Result<String> {
        self.get(name)?.subsequence(begin, end)
    }

    /// Accessors for every sequence in file order
    fn sequences(&self) -> Vec<TwoBitSequence> {
        let source = self.source();
        self.index()
            .iter()
            .map(|meta| TwoBitSequence::new(Arc::clone(meta), source.clone()))
            .collect()
    }
}
