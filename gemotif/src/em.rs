//! Expectation-maximization motif finder in the one-occurrence-per-sequence model.
//!
//! The finder alternates between an E-step, computing for every sequence
//! a distribution over motif start offsets given the current beliefs, and
//! an M-step, re-estimating the beliefs from the expected symbol counts.
//! Row 0 of the [`BeliefMatrix`] is the background distribution, rows
//! `1..=width` are the motif positions.

use generic_array::GenericArray;
use log::debug;
use log::trace;
use log::warn;
use rand::Rng;
use rand_distr::Exp1;

use super::abc::Symbol;
use super::abc::K;
use super::align::Alignment;
use super::config::EmConfig;
use super::dense::DenseMatrix;
use super::err::DomainError;
use super::err::Error;
use super::pwm::best_symbol;
use super::seq::EncodedSequence;
use super::seq::SequenceSet;

// --- BeliefMatrix ------------------------------------------------------------

/// Symbol emission probabilities of the background and each motif position.
#[derive(Clone, Debug, PartialEq)]
pub struct BeliefMatrix {
    data: DenseMatrix<f64, K>,
}

impl BeliefMatrix {
    /// Create a belief matrix from raw probabilities.
    ///
    /// Row 0 is the background, and every row should sum to one.
    pub fn new(data: DenseMatrix<f64, K>) -> Self {
        Self { data }
    }

    /// Draw every row independently from a flat Dirichlet distribution.
    pub fn random<R: Rng + ?Sized>(width: usize, rng: &mut R) -> Self {
        let mut data = DenseMatrix::new(width + 1);
        for row in data.iter_mut() {
            for x in row.iter_mut() {
                *x = rng.sample::<f64, _>(Exp1);
            }
            let total: f64 = row.iter().sum();
            if total > 0.0 {
                row.iter_mut().for_each(|x| *x /= total);
            } else {
                row.fill(1.0 / row.len() as f64);
            }
        }
        Self { data }
    }

    /// The width of the motif, excluding the background row.
    #[inline]
    pub fn width(&self) -> usize {
        self.data.rows() - 1
    }

    /// The background emission probabilities.
    #[inline]
    pub fn background(&self) -> &[f64] {
        &self.data[0]
    }

    /// The raw probabilities, background first.
    #[inline]
    pub fn probabilities(&self) -> &DenseMatrix<f64, K> {
        &self.data
    }

    /// The total absolute elementwise difference with another matrix.
    pub fn difference(&self, other: &Self) -> f64 {
        self.data
            .as_flat()
            .iter()
            .zip(other.data.as_flat())
            .map(|(a, b)| (a - b).abs())
            .sum()
    }

    /// The most likely symbol at every motif position.
    ///
    /// The first symbol in `ACGT` order wins ties.
    pub fn consensus(&self) -> EncodedSequence {
        self.data
            .iter()
            .skip(1)
            .map(best_symbol)
            .collect::<Vec<_>>()
            .into()
    }

    /// The log-probability of a sequence given the motif starts at `start`.
    ///
    /// Symbols outside the window are emitted by the background, symbols
    /// inside it by the matching motif position. An impossible placement
    /// gives negative infinity.
    pub fn log_likelihood(&self, sequence: &EncodedSequence, start: usize) -> f64 {
        let width = self.width();
        sequence
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let row = if i >= start && i < start + width {
                    i - start + 1
                } else {
                    0
                };
                self.data[row][s.as_index()].ln()
            })
            .sum()
    }

    /// The log-likelihood of every motif offset, up to a term shared by
    /// all offsets of the sequence.
    ///
    /// Each offset scores its window against the background it replaces,
    /// so only the window is visited. An offset leaving a symbol the
    /// background cannot emit outside its window is impossible and gives
    /// negative infinity.
    pub fn log_odds(&self, sequence: &EncodedSequence) -> Vec<f64> {
        let width = self.width();
        let n = sequence.len();
        if n < width {
            return Vec::new();
        }

        let mut logs = DenseMatrix::<f64, K>::new(self.data.rows());
        for (src, dst) in self.data.iter().zip(logs.iter_mut()) {
            for (&p, l) in src.iter().zip(dst.iter_mut()) {
                *l = p.ln();
            }
        }

        // prefix counts of the positions the background cannot emit
        let mut zeros = Vec::with_capacity(n + 1);
        zeros.push(0usize);
        for s in sequence.iter() {
            let z = zeros[zeros.len() - 1];
            if logs[0][s.as_index()] == f64::NEG_INFINITY {
                zeros.push(z + 1);
            } else {
                zeros.push(z);
            }
        }

        (0..=n - width)
            .map(|j| {
                if zeros[n] - (zeros[j + width] - zeros[j]) > 0 {
                    return f64::NEG_INFINITY;
                }
                sequence
                    .window(j, width)
                    .iter()
                    .enumerate()
                    .map(|(k, s)| {
                        let background = logs[0][s.as_index()];
                        let motif = logs[k + 1][s.as_index()];
                        if background == f64::NEG_INFINITY {
                            motif
                        } else {
                            motif - background
                        }
                    })
                    .sum()
            })
            .collect()
    }
}

/// Log-sum-exp over a slice, negative infinity if every term is.
fn log_sum_exp(xs: &[f64]) -> f64 {
    let max = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = xs.iter().map(|&x| (x - max).exp()).sum();
    max + sum.ln()
}

impl AsRef<DenseMatrix<f64, K>> for BeliefMatrix {
    fn as_ref(&self) -> &DenseMatrix<f64, K> {
        &self.data
    }
}

// --- HiddenVariables ---------------------------------------------------------

/// For every sequence, a distribution over the motif start offsets.
#[derive(Clone, Debug, PartialEq)]
pub struct HiddenVariables {
    data: Vec<Vec<f64>>,
}

impl HiddenVariables {
    /// The number of sequences.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check whether there are no sequences.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over the offset distributions of every sequence.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Vec<f64>> {
        self.data.iter()
    }

    /// The offset distribution of sequence `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i]
    }

    /// The most likely offset of every sequence, first maximum on ties.
    pub fn best_offsets(&self) -> Vec<usize> {
        self.data
            .iter()
            .map(|row| {
                let mut best = 0;
                for (j, &p) in row.iter().enumerate() {
                    if p > row[best] {
                        best = j;
                    }
                }
                best
            })
            .collect()
    }
}

// --- EmResult ----------------------------------------------------------------

/// The outcome of a single EM run.
#[derive(Clone, Debug)]
pub struct EmResult {
    /// The instance at the most likely offset of every sequence.
    pub alignment: Alignment,
    /// The final beliefs.
    pub beliefs: BeliefMatrix,
    /// The consensus motif of the final beliefs.
    pub consensus: EncodedSequence,
    /// The number of literal matches between instances and consensus.
    pub score: usize,
    /// The number of E/M iterations performed.
    pub iterations: usize,
}

// --- EmSolver ----------------------------------------------------------------

/// An expectation-maximization motif finder over a sequence set.
#[derive(Debug, Clone)]
pub struct EmSolver<'a> {
    data: &'a SequenceSet,
    width: usize,
    config: EmConfig,
    /// Literal symbol counts over all sequences.
    totals: GenericArray<usize, K>,
}

impl<'a> EmSolver<'a> {
    /// Create a new solver for motifs of the given width.
    pub fn new(data: &'a SequenceSet, width: usize, config: EmConfig) -> Result<Self, Error> {
        data.check_width(width)?;
        Ok(Self {
            totals: data.count_symbols(),
            data,
            width,
            config,
        })
    }

    /// Compute the hidden variables under the given beliefs.
    ///
    /// Likelihoods are normalized in log space, so every row sums to one
    /// whatever the sequence length. A row where every placement is
    /// impossible is left as all zeros.
    pub fn expectation(&self, beliefs: &BeliefMatrix) -> HiddenVariables {
        let data = self
            .data
            .iter()
            .map(|seq| {
                let logs = beliefs.log_odds(seq);
                let total = log_sum_exp(&logs);
                if total == f64::NEG_INFINITY {
                    return vec![0.0; logs.len()];
                }
                logs.iter().map(|&l| (l - total).exp()).collect()
            })
            .collect();
        HiddenVariables { data }
    }

    /// Re-estimate the beliefs from the expected counts of the hidden variables.
    pub fn maximization(&self, hidden: &HiddenVariables) -> Result<BeliefMatrix, DomainError> {
        let width = self.width;
        let mut counts = DenseMatrix::<f64, K>::new(width + 1);

        // expected counts at every motif position
        for (seq, row) in self.data.iter().zip(hidden.iter()) {
            for (j, &h) in row.iter().enumerate() {
                for (k, s) in seq.window(j, width).iter().enumerate() {
                    counts[k + 1][s.as_index()] += h;
                }
            }
        }

        // background is what remains of the literal counts, rounding
        // can leave it slightly below zero
        for (c, &total) in self.totals.iter().enumerate() {
            let motif: f64 = (1..=width).map(|k| counts[k][c]).sum();
            counts[0][c] = (total as f64 - motif).max(0.0);
        }

        for (i, row) in counts.iter_mut().enumerate() {
            row.iter_mut().for_each(|x| *x += self.config.pseudocount);
            let total: f64 = row.iter().sum();
            if !(total > 0.0 && total.is_finite()) {
                return Err(DomainError::NonPositiveTotal { row: i });
            }
            row.iter_mut().for_each(|x| *x /= total);
        }

        Ok(BeliefMatrix::new(counts))
    }

    /// Iterate E/M steps from the given beliefs until convergence.
    pub fn refine(&self, mut beliefs: BeliefMatrix) -> Result<EmResult, Error> {
        let mut iterations = 0;
        loop {
            let hidden = self.expectation(&beliefs);
            let updated = self.maximization(&hidden)?;
            iterations += 1;
            let diff = beliefs.difference(&updated);
            trace!("em iteration {}: difference={}", iterations, diff);
            if diff < self.config.epsilon {
                debug!("em converged after {} iterations", iterations);
                return Ok(self.finish(&hidden, updated, iterations));
            }
            if let Some(max) = self.config.max_iterations {
                if iterations >= max {
                    warn!("em stopped after {} iterations (difference={})", iterations, diff);
                    return Ok(self.finish(&hidden, updated, iterations));
                }
            }
            beliefs = updated;
        }
    }

    /// Run EM from random initial beliefs.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<EmResult, Error> {
        self.refine(BeliefMatrix::random(self.width, rng))
    }

    /// Run EM once and extract the most likely instance of every sequence.
    pub fn find_motif<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Alignment, Error> {
        self.run(rng).map(|result| result.alignment)
    }

    fn finish(&self, hidden: &HiddenVariables, beliefs: BeliefMatrix, iterations: usize) -> EmResult {
        let alignment = Alignment::from_starts(self.data, hidden.best_offsets(), self.width);
        let consensus = beliefs.consensus();
        let score = alignment.identity(&consensus).iter().sum();
        EmResult {
            alignment,
            beliefs,
            consensus,
            score,
            iterations,
        }
    }
}

/// Run a single EM trial and return the extracted motif instances.
pub fn find_motif_em<R: Rng + ?Sized>(
    sequences: &SequenceSet,
    width: usize,
    config: &EmConfig,
    rng: &mut R,
) -> Result<Alignment, Error> {
    EmSolver::new(sequences, width, config.clone())?.find_motif(rng)
}

#[cfg(test)]
mod test {
    use rand::rngs::StdRng;
    use rand::Rng;
    use rand::SeedableRng;

    use super::*;

    fn uniform(width: usize) -> BeliefMatrix {
        let mut data = DenseMatrix::new(width + 1);
        data.fill(0.25);
        BeliefMatrix::new(data)
    }

    #[test]
    fn random_rows_sum_to_one() {
        let mut rng = StdRng::seed_from_u64(1);
        let beliefs = BeliefMatrix::random(6, &mut rng);
        assert_eq!(beliefs.width(), 6);
        for row in beliefs.probabilities().iter() {
            let total: f64 = row.iter().sum();
            assert!((total - 1.0).abs() < 1e-12);
            assert!(row.iter().all(|&x| (0.0..=1.0).contains(&x)));
        }
    }

    #[test]
    fn log_likelihood_uses_background_outside_window() {
        let beliefs = BeliefMatrix::new(DenseMatrix::from_rows([
            [0.4, 0.3, 0.2, 0.1],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
        ]));
        let seq = EncodedSequence::encode("GACT").unwrap();
        // G (bg) * A (pos 1) * C (pos 2) * T (bg)
        let expected = (0.2f64 * 0.1).ln();
        assert!((beliefs.log_likelihood(&seq, 1) - expected).abs() < 1e-12);
        assert_eq!(beliefs.log_likelihood(&seq, 0), f64::NEG_INFINITY);

        // A and C replace a background of 0.4 and 0.3
        let odds = beliefs.log_odds(&seq);
        assert_eq!(odds.len(), 3);
        assert_eq!(odds[0], f64::NEG_INFINITY);
        assert!((odds[1] + (0.4f64 * 0.3).ln()).abs() < 1e-12);
        assert_eq!(odds[2], f64::NEG_INFINITY);
    }

    #[test]
    fn log_odds_background_zeros() {
        let beliefs = BeliefMatrix::new(DenseMatrix::from_rows([
            [0.5, 0.5, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ]));
        // G can only be emitted by the motif
        let seq = EncodedSequence::encode("AGA").unwrap();
        let odds = beliefs.log_odds(&seq);
        assert_eq!(odds[0], f64::NEG_INFINITY);
        assert_eq!(odds[1], 0.0);
        assert_eq!(odds[2], f64::NEG_INFINITY);
        assert_eq!(beliefs.log_likelihood(&seq, 1), 2.0 * 0.5f64.ln());
    }

    #[test]
    fn log_odds_match_log_likelihoods() {
        let mut rng = StdRng::seed_from_u64(9);
        let beliefs = BeliefMatrix::random(5, &mut rng);
        let seq = EncodedSequence::encode("ACGTTGCATGCAAGTCCGAT").unwrap();
        let odds = beliefs.log_odds(&seq);
        assert_eq!(odds.len(), 16);
        let base = beliefs.log_likelihood(&seq, 0);
        for (j, l) in odds.iter().enumerate() {
            let expected = beliefs.log_likelihood(&seq, j) - base;
            assert!(
                (l - odds[0] - expected).abs() < 1e-9,
                "offset {}: {} != {}",
                j,
                l - odds[0],
                expected
            );
        }
    }

    #[test]
    fn expectation_rows_are_distributions() {
        let set = SequenceSet::encode(["ACGTAC", "TTACGA"]).unwrap();
        let solver = EmSolver::new(&set, 3, EmConfig::default()).unwrap();
        let hidden = solver.expectation(&uniform(3));
        assert_eq!(hidden.len(), 2);
        for row in hidden.iter() {
            assert_eq!(row.len(), 4);
            for &p in row {
                assert!((p - 0.25).abs() < 1e-12);
            }
        }
        assert_eq!(hidden.best_offsets(), vec![0, 0]);
    }

    #[test]
    fn expectation_zero_row_left_unnormalized() {
        let beliefs = BeliefMatrix::new(DenseMatrix::from_rows([
            [0.5, 0.5, 0.0, 0.0],
            [0.5, 0.5, 0.0, 0.0],
        ]));
        let set = SequenceSet::encode(["GG", "AC"]).unwrap();
        let solver = EmSolver::new(&set, 1, EmConfig::default()).unwrap();
        let hidden = solver.expectation(&beliefs);
        assert_eq!(hidden.row(0), &[0.0, 0.0]);
        for &p in hidden.row(1) {
            assert!((p - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn expectation_long_sequences() {
        let mut rng = StdRng::seed_from_u64(4);
        let sequences = (0..3)
            .map(|_| {
                (0..2000)
                    .map(|_| b"ACGT"[rng.gen_range(0..4)])
                    .collect::<Vec<u8>>()
            })
            .collect::<Vec<_>>();
        let set = SequenceSet::encode(&sequences).unwrap();
        let solver = EmSolver::new(&set, 8, EmConfig::default()).unwrap();
        let hidden = solver.expectation(&BeliefMatrix::random(8, &mut rng));
        for row in hidden.iter() {
            let total: f64 = row.iter().sum();
            assert!((total - 1.0).abs() < 1e-9, "row sums to {}", total);
        }
    }

    #[test]
    fn maximization_background_subtraction() {
        let set = SequenceSet::encode(["AAC"]).unwrap();
        let solver = EmSolver::new(&set, 1, EmConfig::default().with_pseudocount(0.0)).unwrap();
        let hidden = HiddenVariables {
            data: vec![vec![0.5, 0.25, 0.25]],
        };
        let beliefs = solver.maximization(&hidden).unwrap();
        // motif: A = 0.5 + 0.25, C = 0.25; background: A = 2 - 0.75, C = 1 - 0.25
        let motif = &beliefs.probabilities()[1];
        assert!((motif[0] - 0.75).abs() < 1e-12);
        assert!((motif[1] - 0.25).abs() < 1e-12);
        let background = beliefs.background();
        assert!((background[0] - 1.25 / 2.0).abs() < 1e-12);
        assert!((background[1] - 0.75 / 2.0).abs() < 1e-12);
    }

    #[test]
    fn maximization_background_never_negative() {
        let set = SequenceSet::encode(["AACG"]).unwrap();
        let solver = EmSolver::new(&set, 2, EmConfig::default().with_pseudocount(0.0)).unwrap();
        // expected motif counts of A exceed its two literal occurrences
        let hidden = HiddenVariables {
            data: vec![vec![1.0, 1.0, 0.0]],
        };
        let beliefs = solver.maximization(&hidden).unwrap();
        assert_eq!(beliefs.background(), &[0.0, 0.0, 1.0, 0.0]);
        assert!(beliefs.probabilities().as_flat().iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn maximization_rows_sum_to_one() {
        let set = SequenceSet::encode(["ACGTTGCA", "TTGCAACG", "GGTTGCAA"]).unwrap();
        let solver = EmSolver::new(&set, 4, EmConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let hidden = solver.expectation(&BeliefMatrix::random(4, &mut rng));
        let beliefs = solver.maximization(&hidden).unwrap();
        for row in beliefs.probabilities().iter() {
            let total: f64 = row.iter().sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn consensus_ties_pick_first_symbol() {
        let beliefs = BeliefMatrix::new(DenseMatrix::from_rows([
            [0.25, 0.25, 0.25, 0.25],
            [0.1, 0.4, 0.4, 0.1],
            [0.0, 0.0, 0.0, 1.0],
        ]));
        assert_eq!(beliefs.consensus().to_string(), "CT");
    }
}
