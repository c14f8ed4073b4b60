use rand::Rng;

use crate::{error::WriteError, Result};

/// Policy for handling characters outside `ACGTN` (in either case) when encoding
///
/// The 2bit alphabet only holds `A`, `C`, `G`, `T`, with `N` runs and lowercase runs
/// stored as region tables. Anything else (IUPAC ambiguity codes, gaps, stray bytes)
/// must be mapped before packing. Replacements keep the case of the original
/// character so soft-masking is preserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Policy {
    /// Store invalid characters as `N`
    #[default]
    MarkAsN,
    IgnoreSequence,
    BreakOnInvalid,
    RandomDraw,
    SetToA,
    SetToC,
    SetToG,
    SetToT,
}
impl Policy {
    /// Whether the byte can be stored without applying a policy
    #[must_use]
    pub fn is_valid(base: u8) -> bool {
        matches!(base.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T' | b'N')
    }

    fn with_case(original: u8, replacement: u8) -> u8 {
        if original.is_ascii_lowercase() {
            replacement.to_ascii_lowercase()
        } else {
            replacement
        }
    }

    fn fill_with_known(sequence: &[u8], val: u8, ibuf: &mut Vec<u8>) {
        for &n in sequence {
            ibuf.push(if Self::is_valid(n) {
                n
            } else {
                Self::with_case(n, val)
            });
        }
    }

    fn fill_with_random<R: Rng>(sequence: &[u8], rng: &mut R, ibuf: &mut Vec<u8>) {
        for &n in sequence {
            ibuf.push(if Self::is_valid(n) {
                n
            } else {
                let base = match rng.random_range(0..4) {
                    0 => b'A',
                    1 => b'C',
                    2 => b'G',
                    _ => b'T',
                };
                Self::with_case(n, base)
            });
        }
    }

    /// Convert the sequence according to the policy
    ///
    /// First clears the input buffer to ensure that it is empty.
    ///
    /// Returns a boolean indicating whether the sequence should be processed further.
    /// Returns an error if the sequence should be broken on invalid nucleotides.
    ///
    /// # Arguments
    /// * `sequence` - The sequence to be converted
    /// * `ibuf` - The buffer to store the converted sequence
    /// * `rng` - The random number generator
    pub fn handle<R: Rng>(&self, sequence: &[u8], ibuf: &mut Vec<u8>, rng: &mut R) -> Result<bool> {
        ibuf.clear();

        match self {
            Self::MarkAsN => {
                Self::fill_with_known(sequence, b'N', ibuf);
                Ok(true)
            }
            Self::IgnoreSequence => Ok(false),
            Self::BreakOnInvalid => {
                let invalid: String = sequence
                    .iter()
                    .filter(|&&n| !Self::is_valid(n))
                    .map(|&n| char::from(n))
                    .collect();
                Err(WriteError::InvalidNucleotideSequence(invalid).into())
            }
            Self::RandomDraw => {
                Self::fill_with_random(sequence, rng, ibuf);
                Ok(true)
            }
            Self::SetToA => {
                Self::fill_with_known(sequence, b'A', ibuf);
                Ok(true)
            }
            Self::SetToC => {
                Self::fill_with_known(sequence, b'C', ibuf);
                Ok(true)
            }
            Self::SetToG => {
                Self::fill_with_known(sequence, b'G', ibuf);
                Ok(true)
            }
            Self::SetToT => {
                Self::fill_with_known(sequence, b'T', ibuf);
                Ok(true)
            }
        }
    }
}
