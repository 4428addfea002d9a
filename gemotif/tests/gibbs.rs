extern crate gemotif;
extern crate rand;

use gemotif::Budget;
use gemotif::Error;
use gemotif::GibbsConfig;
use gemotif::GibbsSampler;
use gemotif::SamplerState;
use gemotif::SequenceSet;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

const MOTIF: &str = "TTGACGCA";

/// Plant `MOTIF` once at a random offset of uniformly random sequences.
fn planted<R: Rng>(n: usize, length: usize, rng: &mut R) -> (SequenceSet, Vec<usize>) {
    let mut starts = Vec::with_capacity(n);
    let sequences = (0..n)
        .map(|_| {
            let mut seq = (0..length)
                .map(|_| b"ACGT"[rng.gen_range(0..4)])
                .collect::<Vec<u8>>();
            let start = rng.gen_range(0..=length - MOTIF.len());
            seq[start..start + MOTIF.len()].copy_from_slice(MOTIF.as_bytes());
            starts.push(start);
            seq
        })
        .collect::<Vec<_>>();
    (SequenceSet::encode(&sequences).unwrap(), starts)
}

// A single greedy trial only finds the planted motif from some of its
// random starts; seed 5 is one of them.
#[test]
fn single_trial_planted_motif() {
    let mut rng = StdRng::seed_from_u64(5);
    let (set, starts) = planted(10, 40, &mut rng);
    let config = GibbsConfig::default().with_budget(Budget::Passes(1000));
    let result = gemotif::gibbs_sample(&set, MOTIF.len(), &config, &mut rng).unwrap();
    assert_eq!(result.alignment.starts(), starts.as_slice());
    assert!(result.passes >= 2);
    for instance in result.alignment.to_strings() {
        assert_eq!(instance, MOTIF);
    }
}

// With seed 22, the planted alignment is reached by 7 of the 20 trials,
// the most frequent of the converged alignments.
#[test]
fn best_of_trials_planted_motif() {
    let mut rng = StdRng::seed_from_u64(22);
    let (set, starts) = planted(10, 40, &mut rng);
    let config = GibbsConfig::default().with_budget(Budget::Passes(1000));
    let result = gemotif::best_of_gibbs(&set, MOTIF.len(), 20, &config, &mut rng).unwrap();
    assert_eq!(result.alignment.len(), 10);
    assert_eq!(result.alignment.starts(), starts.as_slice());
    for instance in result.alignment.to_strings() {
        assert_eq!(instance, MOTIF);
    }
}

#[test]
fn converged_offsets_are_clean() {
    let mut rng = StdRng::seed_from_u64(8);
    let (set, _) = planted(8, 60, &mut rng);
    let config = GibbsConfig::default().with_budget(Budget::Unlimited);
    for _ in 0..5 {
        let mut sampler = GibbsSampler::new(&set, MOTIF.len(), config.clone(), &mut rng).unwrap();
        while sampler.pass().unwrap() {}
        assert_eq!(sampler.state(), SamplerState::Converged);
        let starts = sampler.starts().to_vec();
        // one more pass over converged offsets changes nothing
        assert!(!sampler.pass().unwrap());
        assert_eq!(sampler.starts(), starts.as_slice());
        assert!(starts.iter().all(|&s| s <= 60 - MOTIF.len()));
    }
}

#[test]
fn converged_offsets_are_stable() {
    let set = SequenceSet::encode(["TTTGT", "GTAAA", "AAGTA"]).unwrap();
    let config = GibbsConfig::default().with_budget(Budget::Unlimited);
    let mut sampler = GibbsSampler::with_starts(&set, 2, config, vec![3, 0, 2]);
    assert!(!sampler.pass().unwrap());
    assert_eq!(sampler.state(), SamplerState::Converged);
    assert_eq!(sampler.passes(), 1);
    let result = sampler.run().unwrap();
    assert_eq!(result.alignment.starts(), &[3, 0, 2]);
    assert_eq!(result.passes, 1);
}

#[test]
fn same_seed_same_result() {
    let set = SequenceSet::encode(["CGTACGGA", "GTCCCATT", "AAGGTCAG", "GCTGTTGC"]).unwrap();
    let config = GibbsConfig::default().with_budget(Budget::Passes(1000));
    let run = |seed| {
        let mut rng = StdRng::seed_from_u64(seed);
        gemotif::best_of_gibbs(&set, 3, 8, &config, &mut rng)
            .map(|r| (r.alignment.starts().to_vec(), r.passes))
    };
    assert_eq!(run(7), run(7));
}

#[test]
fn all_trials_timed_out() {
    let set = SequenceSet::encode(["TTTGT", "GTAAA", "AAGTA"]).unwrap();
    let config = GibbsConfig::default().with_budget(Budget::Passes(0));
    let mut rng = StdRng::seed_from_u64(0);
    let err = gemotif::best_of_gibbs(&set, 2, 5, &config, &mut rng).unwrap_err();
    assert_eq!(err, Error::NoSuccessfulTrial { trials: 5 });
}

#[test]
fn no_trials() {
    let set = SequenceSet::encode(["TTTGT", "GTAAA", "AAGTA"]).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    let err = gemotif::best_of_gibbs(&set, 2, 0, &GibbsConfig::default(), &mut rng).unwrap_err();
    assert_eq!(err, Error::NoSuccessfulTrial { trials: 0 });
}
