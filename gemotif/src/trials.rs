//! Independent repetitions of the stochastic searches.
//!
//! Every trial gets its own generator, seeded from the caller's generator
//! before any trial runs. Results are always collected in trial order, so
//! the selected winner only depends on the seed, including when the
//! `parallel` feature distributes trials over a thread pool.

use log::debug;
use log::warn;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::config::EmConfig;
use super::config::GibbsConfig;
use super::em::EmResult;
use super::em::EmSolver;
use super::err::Error;
use super::gibbs::check_input;
use super::gibbs::GibbsResult;
use super::gibbs::GibbsSampler;
use super::seq::SequenceSet;

/// Find the item occuring the most often by equality.
///
/// The first of the maximal items wins ties. Returns `None` on an empty
/// slice.
pub fn most_frequent<T: PartialEq>(items: &[T]) -> Option<&T> {
    let mut best: Option<(&T, usize)> = None;
    for item in items {
        let count = items.iter().filter(|&x| x == item).count();
        match best {
            Some((_, c)) if c >= count => (),
            _ => best = Some((item, count)),
        }
    }
    best.map(|(item, _)| item)
}

fn seeds<R: Rng + ?Sized>(rng: &mut R, trials: usize) -> Vec<u64> {
    (0..trials).map(|_| rng.gen()).collect()
}

#[cfg(not(feature = "parallel"))]
fn run_trials<T, F>(seeds: Vec<u64>, trial: F) -> Vec<T>
where
    T: Send,
    F: Fn(&mut StdRng) -> T + Sync,
{
    seeds
        .into_iter()
        .map(|seed| trial(&mut StdRng::seed_from_u64(seed)))
        .collect()
}

#[cfg(feature = "parallel")]
fn run_trials<T, F>(seeds: Vec<u64>, trial: F) -> Vec<T>
where
    T: Send,
    F: Fn(&mut StdRng) -> T + Sync,
{
    seeds
        .into_par_iter()
        .map(|seed| trial(&mut StdRng::seed_from_u64(seed)))
        .collect()
}

/// Run the Gibbs sampler `trials` times and keep the most frequent result.
///
/// Trials that time out are skipped. Alignments are compared by their
/// instances, and the first trial reaching the most frequent one is
/// returned.
pub fn best_of_gibbs<R: Rng + ?Sized>(
    sequences: &SequenceSet,
    width: usize,
    trials: usize,
    config: &GibbsConfig,
    rng: &mut R,
) -> Result<GibbsResult, Error> {
    check_input(sequences, width)?;
    let results = run_trials(seeds(rng, trials), |rng| {
        GibbsSampler::new(sequences, width, config.clone(), rng)?.run()
    });

    let mut converged = Vec::with_capacity(results.len());
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok(run) => converged.push(run),
            Err(e) if e.is_recoverable() => warn!("skipping gibbs trial {}: {}", i, e),
            Err(e) => return Err(e),
        }
    }
    debug!("{} of {} gibbs trials converged", converged.len(), trials);

    let alignments = converged
        .iter()
        .map(|run| &run.alignment)
        .collect::<Vec<_>>();
    let index = most_frequent(&alignments)
        .and_then(|&winner| alignments.iter().position(|&a| a == winner))
        .ok_or(Error::NoSuccessfulTrial { trials })?;
    Ok(converged.swap_remove(index))
}

/// Run the EM finder `trials` times and keep the best-scoring result.
///
/// Each run is scored by the literal matches between its instances and
/// its own consensus; the first of the highest-scoring runs is returned.
pub fn best_of_em<R: Rng + ?Sized>(
    sequences: &SequenceSet,
    width: usize,
    trials: usize,
    config: &EmConfig,
    rng: &mut R,
) -> Result<EmResult, Error> {
    let solver = EmSolver::new(sequences, width, config.clone())?;
    let results = run_trials(seeds(rng, trials), |rng| solver.run(rng));

    let mut best: Option<EmResult> = None;
    for result in results {
        let result = result?;
        match &best {
            Some(b) if b.score >= result.score => (),
            _ => best = Some(result),
        }
    }
    best.ok_or(Error::NoSuccessfulTrial { trials })
}
