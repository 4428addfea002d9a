//! Count, frequency and log-odds matrices built from aligned instances.
//!
//! Matrices store one row per motif position and one column per symbol,
//! so `matrix[i][s.as_index()]` is the value of symbol `s` at position `i`.

use super::abc::Dna;
use super::abc::Nucleotide;
use super::abc::Symbol;
use super::abc::K;
use super::dense::DenseMatrix;
use super::err::DomainError;
use super::err::Error;
use super::err::InputError;
use super::seq::EncodedSequence;

/// The frequency used to replace zero cells before taking logarithms.
pub const DEFAULT_PSEUDOCOUNT: f64 = 0.1;

fn check_width(expected: usize, found: usize) -> Result<(), InputError> {
    if expected == found {
        Ok(())
    } else {
        Err(InputError::LengthMismatch {
            index: 0,
            expected,
            found,
        })
    }
}

/// The most frequent symbol of a row, first in `ACGT` order on ties.
pub(crate) fn best_symbol(row: &[f64]) -> Nucleotide {
    let mut best = Nucleotide::A;
    let mut max = 0.0;
    for (&p, &symbol) in row.iter().zip(Dna::symbols()) {
        if p > max {
            max = p;
            best = symbol;
        }
    }
    best
}

// --- CountMatrix -------------------------------------------------------------

/// A matrix storing symbol occurences at each position.
#[derive(Clone, Debug, PartialEq)]
pub struct CountMatrix {
    /// The actual counts for each position of the motif.
    data: DenseMatrix<u32, K>,
    /// The number of sequences from which this count matrix was obtained.
    n: u32,
}

impl CountMatrix {
    /// Create a new count matrix without checking the contents.
    fn new_unchecked(data: DenseMatrix<u32, K>, n: u32) -> Self {
        Self { data, n }
    }

    /// Create an empty count matrix for motifs of the given width.
    pub fn empty(width: usize) -> Self {
        Self::new_unchecked(DenseMatrix::new(width), 0)
    }

    /// Create a new count matrix from the given sequences.
    ///
    /// All sequences must have the same length, otherwise the index of the
    /// first offending sequence is reported.
    pub fn from_sequences<I>(sequences: I) -> Result<Self, InputError>
    where
        I: IntoIterator,
        <I as IntoIterator>::Item: AsRef<[Nucleotide]>,
    {
        let mut n = 0;
        let mut data: Option<DenseMatrix<u32, K>> = None;
        for (index, seq) in sequences.into_iter().enumerate() {
            let seq = seq.as_ref();
            let d = data.get_or_insert_with(|| DenseMatrix::new(seq.len()));
            if seq.len() != d.rows() {
                return Err(InputError::LengthMismatch {
                    index,
                    expected: d.rows(),
                    found: seq.len(),
                });
            }
            for (i, x) in seq.iter().enumerate() {
                d[i][x.as_index()] += 1;
            }
            n += 1;
        }
        Ok(Self::new_unchecked(data.unwrap_or_else(|| DenseMatrix::new(0)), n))
    }

    /// Add the counts of one instance.
    ///
    /// # Panics
    ///
    /// Panics if the instance is not as long as the matrix.
    pub(crate) fn include(&mut self, instance: &[Nucleotide]) {
        assert_eq!(instance.len(), self.data.rows());
        for (i, x) in instance.iter().enumerate() {
            self.data[i][x.as_index()] += 1;
        }
        self.n += 1;
    }

    /// Remove the counts of one instance previously included.
    pub(crate) fn exclude(&mut self, instance: &[Nucleotide]) {
        assert_eq!(instance.len(), self.data.rows());
        for (i, x) in instance.iter().enumerate() {
            self.data[i][x.as_index()] -= 1;
        }
        self.n -= 1;
    }

    /// Build a frequency matrix by dividing counts by the instance count.
    pub fn to_freq(&self) -> Result<FrequencyMatrix, InputError> {
        if self.n == 0 {
            return Err(InputError::Empty);
        }
        let n = self.n as f64;
        let mut probas = DenseMatrix::new(self.data.rows());
        for (src, dst) in self.data.iter().zip(probas.iter_mut()) {
            for (&x, y) in src.iter().zip(dst.iter_mut()) {
                *y = x as f64 / n;
            }
        }
        Ok(FrequencyMatrix { data: probas })
    }

    /// The raw counts from the count matrix.
    #[inline]
    pub fn counts(&self) -> &DenseMatrix<u32, K> {
        &self.data
    }

    /// The number of instances counted in this matrix.
    #[inline]
    pub fn instances(&self) -> u32 {
        self.n
    }

    /// The width of the motif represented by this matrix.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.rows()
    }

    /// Check whether the matrix has no positions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.rows() == 0
    }
}

impl AsRef<DenseMatrix<u32, K>> for CountMatrix {
    fn as_ref(&self) -> &DenseMatrix<u32, K> {
        &self.data
    }
}

impl FromIterator<EncodedSequence> for Result<CountMatrix, InputError> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = EncodedSequence>,
    {
        CountMatrix::from_sequences(iter)
    }
}

// --- FrequencyMatrix ---------------------------------------------------------

/// A matrix storing symbol frequencies at each position.
#[derive(Clone, Debug, PartialEq)]
pub struct FrequencyMatrix {
    data: DenseMatrix<f64, K>,
}

impl FrequencyMatrix {
    /// Create a new frequency matrix from raw frequencies.
    pub fn new(data: DenseMatrix<f64, K>) -> Self {
        Self { data }
    }

    /// Replace every zero cell with `low`.
    ///
    /// Rows are not renormalized afterwards, so a row containing zeros
    /// sums to more than one.
    pub fn with_pseudocounts(&self, low: f64) -> Self {
        let mut data = self.data.clone();
        for row in data.iter_mut() {
            for x in row.iter_mut().filter(|x| **x == 0.0) {
                *x = low;
            }
        }
        Self { data }
    }

    /// Convert to a log-odds matrix of `-ln(frequency)` costs.
    ///
    /// Fails on the first zero cell; call [`with_pseudocounts`] beforehand.
    ///
    /// [`with_pseudocounts`]: FrequencyMatrix::with_pseudocounts
    pub fn to_scoring(&self) -> Result<ScoringMatrix, DomainError> {
        let mut costs = DenseMatrix::new(self.data.rows());
        for (position, (src, dst)) in self.data.iter().zip(costs.iter_mut()).enumerate() {
            for (j, (&x, y)) in src.iter().zip(dst.iter_mut()).enumerate() {
                if x == 0.0 {
                    let symbol = Nucleotide::from_index(j).map(char::from).unwrap_or('?');
                    return Err(DomainError::LogOfZero { position, symbol });
                }
                *y = -x.ln();
            }
        }
        Ok(ScoringMatrix { data: costs })
    }

    /// Compute the probability of a motif instance as a product of frequencies.
    pub fn score<S: AsRef<[Nucleotide]>>(&self, instance: S) -> Result<f64, InputError> {
        let instance = instance.as_ref();
        check_width(self.len(), instance.len())?;
        Ok(instance
            .iter()
            .zip(self.data.iter())
            .map(|(s, row)| row[s.as_index()])
            .product())
    }

    /// The most frequent symbol at every position.
    pub fn consensus(&self) -> EncodedSequence {
        self.data
            .iter()
            .map(best_symbol)
            .collect::<Vec<_>>()
            .into()
    }

    /// The frequencies of the matrix.
    #[inline]
    pub fn frequencies(&self) -> &DenseMatrix<f64, K> {
        &self.data
    }

    /// The width of the motif represented by this matrix.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.rows()
    }

    /// Check whether the matrix has no positions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.rows() == 0
    }
}

impl AsRef<DenseMatrix<f64, K>> for FrequencyMatrix {
    fn as_ref(&self) -> &DenseMatrix<f64, K> {
        &self.data
    }
}

// --- ScoringMatrix -----------------------------------------------------------

/// A matrix storing log-odds costs of symbol occurences at each position.
///
/// Scores are costs: a lower score is a better match.
#[doc(alias = "LogOddsMatrix")]
#[derive(Clone, Debug, PartialEq)]
pub struct ScoringMatrix {
    data: DenseMatrix<f64, K>,
}

impl ScoringMatrix {
    /// Build a scoring matrix from aligned instances in a single step.
    pub fn from_instances<I>(instances: I, pseudocount: f64) -> Result<Self, Error>
    where
        I: IntoIterator,
        <I as IntoIterator>::Item: AsRef<[Nucleotide]>,
    {
        let freq = CountMatrix::from_sequences(instances)?.to_freq()?;
        Ok(freq.with_pseudocounts(pseudocount).to_scoring()?)
    }

    /// Compute the cost of a motif instance as a sum of log-odds.
    pub fn score<S: AsRef<[Nucleotide]>>(&self, instance: S) -> Result<f64, InputError> {
        let instance = instance.as_ref();
        check_width(self.len(), instance.len())?;
        Ok(self.score_unchecked(instance))
    }

    #[inline]
    fn score_unchecked(&self, instance: &[Nucleotide]) -> f64 {
        instance
            .iter()
            .zip(self.data.iter())
            .map(|(s, row)| row[s.as_index()])
            .sum()
    }

    /// Find the start offset of the lowest-cost window in a sequence.
    ///
    /// The first offset wins ties. Returns `None` if the sequence is
    /// shorter than the matrix.
    pub fn best_position<S: AsRef<[Nucleotide]>>(&self, sequence: S) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, window) in sequence.as_ref().windows(self.len().max(1)).enumerate() {
            let score = self.score_unchecked(window);
            match best {
                Some((_, s)) if s <= score => (),
                _ => best = Some((i, score)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// The log-odds costs of the matrix.
    #[inline]
    pub fn weights(&self) -> &DenseMatrix<f64, K> {
        &self.data
    }

    /// The width of the motif represented by this matrix.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.rows()
    }

    /// Check whether the matrix has no positions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.rows() == 0
    }
}

impl AsRef<DenseMatrix<f64, K>> for ScoringMatrix {
    fn as_ref(&self) -> &DenseMatrix<f64, K> {
        &self.data
    }
}
