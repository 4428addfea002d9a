//! Encoded storage for nucleotide sequences and validated sequence sets.

use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::ops::Index;
use std::ops::Range;
use std::str::FromStr;

use generic_array::GenericArray;

use super::abc::Nucleotide;
use super::abc::Symbol;
use super::abc::K;
use super::err::InputError;
use super::err::InvalidSymbol;

// --- EncodedSequence ---------------------------------------------------------

/// A nucleotide sequence encoded with the DNA alphabet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct EncodedSequence {
    data: Vec<Nucleotide>,
}

impl EncodedSequence {
    /// Create a new encoded sequence.
    pub fn new(data: Vec<Nucleotide>) -> Self {
        Self { data }
    }

    /// Create a new encoded sequence from a textual representation.
    pub fn encode<S: AsRef<[u8]>>(sequence: S) -> Result<Self, InvalidSymbol> {
        sequence
            .as_ref()
            .iter()
            .map(|&c| Nucleotide::from_ascii(c))
            .collect::<Result<_, _>>()
            .map(Self::new)
    }

    /// Return the number of symbols in the sequence.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check whether the sequence is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over the symbols in the sequence.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Nucleotide> {
        self.data.iter()
    }

    /// Get the window of `width` symbols starting at `start`.
    ///
    /// # Panics
    ///
    /// Panics if the window does not fit in the sequence.
    #[inline]
    pub fn window(&self, start: usize, width: usize) -> &[Nucleotide] {
        &self.data[start..start + width]
    }

    /// Iterate over every window of `width` symbols, in offset order.
    #[inline]
    pub fn windows(&self, width: usize) -> std::slice::Windows<'_, Nucleotide> {
        self.data.windows(width)
    }

    /// Copy out a subsequence as a new encoded sequence.
    pub fn subsequence(&self, range: Range<usize>) -> Self {
        Self::new(self.data[range].to_vec())
    }
}

impl AsRef<EncodedSequence> for EncodedSequence {
    fn as_ref(&self) -> &Self {
        self
    }
}

impl AsRef<[Nucleotide]> for EncodedSequence {
    fn as_ref(&self) -> &[Nucleotide] {
        self.data.as_slice()
    }
}

impl Display for EncodedSequence {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        for c in self.data.iter() {
            write!(f, "{}", c.as_char())?;
        }
        Ok(())
    }
}

impl FromStr for EncodedSequence {
    type Err = InvalidSymbol;
    fn from_str(seq: &str) -> Result<Self, Self::Err> {
        seq.chars()
            .map(Nucleotide::from_char)
            .collect::<Result<_, _>>()
            .map(Self::new)
    }
}

impl From<Vec<Nucleotide>> for EncodedSequence {
    fn from(data: Vec<Nucleotide>) -> Self {
        Self::new(data)
    }
}

impl Index<usize> for EncodedSequence {
    type Output = Nucleotide;
    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl<'a> IntoIterator for &'a EncodedSequence {
    type Item = &'a Nucleotide;
    type IntoIter = std::slice::Iter<'a, Nucleotide>;
    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

// --- SymbolCount -------------------------------------------------------------

/// A trait for counting the number of occurences of a symbol in a sequence.
pub trait SymbolCount {
    /// Count the number of occurences of the given symbol.
    fn count_symbol(&self, symbol: Nucleotide) -> usize;

    /// Count the number of occurences of every symbol, in index order.
    fn count_symbols(&self) -> GenericArray<usize, K>;
}

impl<T: AsRef<[Nucleotide]>> SymbolCount for T {
    fn count_symbol(&self, symbol: Nucleotide) -> usize {
        self.as_ref().iter().filter(|&&s| s == symbol).count()
    }

    fn count_symbols(&self) -> GenericArray<usize, K> {
        let mut counts = GenericArray::<usize, K>::default();
        for s in self.as_ref() {
            counts[s.as_index()] += 1;
        }
        counts
    }
}

// --- SequenceSet -------------------------------------------------------------

/// A non-empty, ordered collection of sequences of identical length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceSet {
    sequences: Vec<EncodedSequence>,
    length: usize,
}

impl SequenceSet {
    /// Create a new sequence set, checking that all sequences share a length.
    pub fn new(sequences: Vec<EncodedSequence>) -> Result<Self, InputError> {
        let length = sequences.first().map(|s| s.len()).ok_or(InputError::Empty)?;
        if let Some((index, seq)) = sequences
            .iter()
            .enumerate()
            .find(|(_, s)| s.len() != length)
        {
            return Err(InputError::LengthMismatch {
                index,
                expected: length,
                found: seq.len(),
            });
        }
        Ok(Self { sequences, length })
    }

    /// Encode and validate textual sequences.
    pub fn encode<I>(sequences: I) -> Result<Self, InputError>
    where
        I: IntoIterator,
        <I as IntoIterator>::Item: AsRef<[u8]>,
    {
        let encoded = sequences
            .into_iter()
            .map(EncodedSequence::encode)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(encoded)
    }

    /// Check that a motif of the given width fits in the sequences.
    ///
    /// The width must be at least 1 and strictly smaller than the
    /// sequence length.
    pub fn check_width(&self, width: usize) -> Result<(), InputError> {
        if width == 0 || width >= self.length {
            Err(InputError::InvalidWidth {
                width,
                length: self.length,
            })
        } else {
            Ok(())
        }
    }

    /// The number of sequences in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Always `false`, since sequence sets cannot be empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// The common length of all sequences.
    #[inline]
    pub fn sequence_length(&self) -> usize {
        self.length
    }

    /// The number of candidate start offsets for a motif of `width`.
    #[inline]
    pub fn offsets(&self, width: usize) -> usize {
        self.length - width + 1
    }

    /// Iterate over the sequences.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, EncodedSequence> {
        self.sequences.iter()
    }

    /// Count the literal occurences of every symbol across all sequences.
    pub fn count_symbols(&self) -> GenericArray<usize, K> {
        let mut total = GenericArray::<usize, K>::default();
        for seq in self.sequences.iter() {
            for (t, c) in total.iter_mut().zip(seq.count_symbols()) {
                *t += c;
            }
        }
        total
    }
}

impl AsRef<[EncodedSequence]> for SequenceSet {
    fn as_ref(&self) -> &[EncodedSequence] {
        &self.sequences
    }
}

impl Index<usize> for SequenceSet {
    type Output = EncodedSequence;
    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.sequences[index]
    }
}

impl<'a> IntoIterator for &'a SequenceSet {
    type Item = &'a EncodedSequence;
    type IntoIter = std::slice::Iter<'a, EncodedSequence>;
    fn into_iter(self) -> Self::IntoIter {
        self.sequences.iter()
    }
}
