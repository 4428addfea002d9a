//! Motif instances extracted from a sequence set.

use super::abc::Nucleotide;
use super::err::Error;
use super::err::InputError;
use super::pwm::CountMatrix;
use super::pwm::FrequencyMatrix;
use super::pwm::ScoringMatrix;
use super::seq::EncodedSequence;
use super::seq::SequenceSet;

/// The placement of a motif in every sequence of a set.
///
/// Instance `i` is the window of sequence `i` starting at `starts()[i]`.
/// Two alignments compare equal when their instances are equal, whatever
/// their offsets.
#[derive(Clone, Debug)]
pub struct Alignment {
    starts: Vec<usize>,
    instances: Vec<EncodedSequence>,
}

impl Alignment {
    /// Extract the windows of `width` symbols at the given offsets.
    ///
    /// # Panics
    ///
    /// Panics if there is not one offset per sequence, or if a window
    /// does not fit in its sequence.
    pub fn from_starts(sequences: &SequenceSet, starts: Vec<usize>, width: usize) -> Self {
        assert_eq!(starts.len(), sequences.len());
        let instances = sequences
            .iter()
            .zip(starts.iter())
            .map(|(seq, &start)| seq.subsequence(start..start + width))
            .collect();
        Self { starts, instances }
    }

    /// The start offset of the motif in each sequence.
    #[inline]
    pub fn starts(&self) -> &[usize] {
        &self.starts
    }

    /// The motif instance of each sequence.
    #[inline]
    pub fn instances(&self) -> &[EncodedSequence] {
        &self.instances
    }

    /// The width of the motif.
    #[inline]
    pub fn width(&self) -> usize {
        self.instances.first().map(|s| s.len()).unwrap_or(0)
    }

    /// The number of instances.
    #[inline]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Check whether the alignment has no instances.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// The instances as strings.
    pub fn to_strings(&self) -> Vec<String> {
        self.instances.iter().map(|s| s.to_string()).collect()
    }

    /// Count the symbols at each motif position.
    pub fn count_matrix(&self) -> Result<CountMatrix, InputError> {
        CountMatrix::from_sequences(&self.instances)
    }

    /// The frequency of each symbol at each motif position.
    pub fn frequency_matrix(&self) -> Result<FrequencyMatrix, InputError> {
        self.count_matrix()?.to_freq()
    }

    /// Score every instance against the alignment's own log-odds matrix.
    ///
    /// Lower scores are closer to the motif.
    pub fn instance_costs(&self, pseudocount: f64) -> Result<Vec<f64>, Error> {
        let pssm = ScoringMatrix::from_instances(&self.instances, pseudocount)?;
        self.instances
            .iter()
            .map(|s| pssm.score(s).map_err(Error::from))
            .collect()
    }

    /// The probability of every instance under the alignment's own
    /// frequency matrix, without pseudocounts.
    pub fn instance_probabilities(&self) -> Result<Vec<f64>, Error> {
        let freq = self.frequency_matrix()?;
        self.instances
            .iter()
            .map(|s| freq.score(s).map_err(Error::from))
            .collect()
    }

    /// Score every instance against the log-odds matrix of a known motif.
    pub fn solution_costs<S: AsRef<[Nucleotide]>>(
        &self,
        solution: S,
        pseudocount: f64,
    ) -> Result<Vec<f64>, Error> {
        let pssm = ScoringMatrix::from_instances([solution.as_ref()], pseudocount)?;
        self.instances
            .iter()
            .map(|s| pssm.score(s).map_err(Error::from))
            .collect()
    }

    /// Count, for every instance, the sequences containing it literally.
    pub fn occurrences(&self, sequences: &SequenceSet) -> Vec<usize> {
        self.instances
            .iter()
            .map(|instance| {
                let instance: &[Nucleotide] = instance.as_ref();
                sequences
                    .iter()
                    .filter(|seq| seq.windows(instance.len().max(1)).any(|w| w == instance))
                    .count()
            })
            .collect()
    }

    /// Count the literal matches between each instance and `consensus`.
    pub fn identity<S: AsRef<[Nucleotide]>>(&self, consensus: S) -> Vec<usize> {
        let consensus = consensus.as_ref();
        self.instances
            .iter()
            .map(|s| s.iter().zip(consensus).filter(|(a, b)| a == b).count())
            .collect()
    }
}

impl PartialEq for Alignment {
    fn eq(&self, other: &Self) -> bool {
        self.instances == other.instances
    }
}

impl Eq for Alignment {}
