//! Deterministic-update Gibbs sampler for one-occurrence-per-sequence motifs.
//!
//! The sampler starts from uniformly random offsets, then refines each
//! sequence in turn with the lowest-cost window under a scoring matrix
//! built from every *other* sequence. Updates are applied immediately, so
//! later sequences of a pass already see the new placement. The search
//! stops once a full pass leaves every offset unchanged, or fails with
//! [`Error::ConvergenceTimeout`] when the [`Budget`] runs out.
//!
//! [`Budget`]: crate::config::Budget

use std::time::Instant;

use log::debug;
use log::trace;
use rand::distributions::Uniform;
use rand::Rng;

use super::align::Alignment;
use super::config::GibbsConfig;
use super::err::Error;
use super::err::InputError;
use super::pwm::CountMatrix;
use super::pwm::ScoringMatrix;
use super::seq::SequenceSet;

/// The state of a [`GibbsSampler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    /// Passes are still changing offsets.
    Iterating,
    /// The last pass left every offset unchanged.
    Converged,
    /// The budget ran out before convergence.
    TimedOut,
}

/// The outcome of a converged Gibbs run.
#[derive(Clone, Debug, PartialEq)]
pub struct GibbsResult {
    /// The instances at the converged offsets.
    pub alignment: Alignment,
    /// The number of passes performed, including the final unchanged one.
    pub passes: usize,
}

/// Check that a sequence set and a width can be used by the sampler.
pub(crate) fn check_input(data: &SequenceSet, width: usize) -> Result<(), InputError> {
    data.check_width(width)?;
    if data.len() < 2 {
        return Err(InputError::TooFewSequences {
            required: 2,
            found: data.len(),
        });
    }
    Ok(())
}

/// A Gibbs sampler refining motif offsets in a sequence set.
#[derive(Debug, Clone)]
pub struct GibbsSampler<'a> {
    /// A reference to the sequences being aligned.
    data: &'a SequenceSet,
    /// The sampler parameters.
    config: GibbsConfig,
    /// The width of the motif.
    width: usize,
    /// The start positions of the motif in each sequence.
    starts: Vec<usize>,
    /// The counts of the instances at the current start positions.
    motif: CountMatrix,
    /// The number of full passes performed so far.
    passes: usize,
    state: SamplerState,
}

impl<'a> GibbsSampler<'a> {
    /// Create a new sampler with uniformly random initial offsets.
    pub fn new<R: Rng + ?Sized>(
        data: &'a SequenceSet,
        width: usize,
        config: GibbsConfig,
        rng: &mut R,
    ) -> Result<Self, Error> {
        check_input(data, width)?;
        let offsets = Uniform::new(0, data.offsets(width));
        let starts = (0..data.len()).map(|_| rng.sample(offsets)).collect();
        Ok(Self::with_starts(data, width, config, starts))
    }

    /// Create a new sampler from known initial offsets.
    ///
    /// # Panics
    ///
    /// Panics if there is not one valid offset per sequence.
    pub fn with_starts(
        data: &'a SequenceSet,
        width: usize,
        config: GibbsConfig,
        starts: Vec<usize>,
    ) -> Self {
        assert_eq!(starts.len(), data.len());
        let mut motif = CountMatrix::empty(width);
        for (seq, &start) in data.iter().zip(starts.iter()) {
            motif.include(seq.window(start, width));
        }
        Self {
            data,
            config,
            width,
            starts,
            motif,
            passes: 0,
            state: SamplerState::Iterating,
        }
    }

    /// The current start offset of the motif in each sequence.
    #[inline]
    pub fn starts(&self) -> &[usize] {
        &self.starts
    }

    /// The current state of the sampler.
    #[inline]
    pub fn state(&self) -> SamplerState {
        self.state
    }

    /// The number of full passes performed so far.
    #[inline]
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// The motif instances at the current offsets.
    pub fn alignment(&self) -> Alignment {
        Alignment::from_starts(self.data, self.starts.clone(), self.width)
    }

    fn prepare_pssm(&self) -> Result<ScoringMatrix, Error> {
        let freq = self.motif.to_freq()?;
        Ok(freq.with_pseudocounts(self.config.pseudocount).to_scoring()?)
    }

    /// Refine the offset of sequence `z` against all other sequences.
    ///
    /// Returns `true` if the offset changed.
    fn update_holdout(&mut self, z: usize) -> Result<bool, Error> {
        let data = self.data;
        let seq = &data[z];
        let previous = self.starts[z];
        self.motif.exclude(seq.window(previous, self.width));
        let pssm = self.prepare_pssm()?;
        let start = pssm.best_position(seq).unwrap_or(previous);
        self.motif.include(seq.window(start, self.width));
        self.starts[z] = start;
        Ok(start != previous)
    }

    /// Perform one refinement pass over every sequence, in order.
    ///
    /// Returns `true` if any offset changed.
    pub fn pass(&mut self) -> Result<bool, Error> {
        let mut changed = false;
        for z in 0..self.starts.len() {
            changed |= self.update_holdout(z)?;
        }
        self.passes += 1;
        if !changed {
            self.state = SamplerState::Converged;
        }
        trace!("gibbs pass {}: changed={}", self.passes, changed);
        Ok(changed)
    }

    /// Run passes until convergence or until the budget is exhausted.
    pub fn run(mut self) -> Result<GibbsResult, Error> {
        let started = Instant::now();
        while self.state == SamplerState::Iterating {
            if self.config.budget.exhausted(self.passes, started) {
                self.state = SamplerState::TimedOut;
                return Err(Error::ConvergenceTimeout {
                    passes: self.passes,
                    elapsed: started.elapsed(),
                });
            }
            self.pass()?;
        }
        debug!("gibbs converged after {} passes", self.passes);
        Ok(GibbsResult {
            alignment: self.alignment(),
            passes: self.passes,
        })
    }
}

/// Run a single Gibbs trial.
pub fn gibbs_sample<R: Rng + ?Sized>(
    sequences: &SequenceSet,
    width: usize,
    config: &GibbsConfig,
    rng: &mut R,
) -> Result<GibbsResult, Error> {
    GibbsSampler::new(sequences, width, config.clone(), rng)?.run()
}
