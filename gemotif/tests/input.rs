extern crate gemotif;
extern crate rand;

use gemotif::CountMatrix;
use gemotif::EmConfig;
use gemotif::EmSolver;
use gemotif::EncodedSequence;
use gemotif::Error;
use gemotif::GibbsConfig;
use gemotif::GibbsSampler;
use gemotif::InputError;
use gemotif::InvalidSymbol;
use gemotif::SequenceSet;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn length_mismatch() {
    let err = SequenceSet::encode(["ACGT", "ACG", "ACGT"]).unwrap_err();
    assert_eq!(
        err,
        InputError::LengthMismatch {
            index: 1,
            expected: 4,
            found: 3
        }
    );

    let seqs = ["ACGT", "ACGT", "AC"]
        .iter()
        .map(|s| EncodedSequence::encode(s).unwrap())
        .collect::<Vec<_>>();
    let err = CountMatrix::from_sequences(&seqs).unwrap_err();
    assert_eq!(
        err,
        InputError::LengthMismatch {
            index: 2,
            expected: 4,
            found: 2
        }
    );
}

#[test]
fn invalid_symbol() {
    let err = SequenceSet::encode(["ACGT", "ACNT"]).unwrap_err();
    assert_eq!(err, InputError::InvalidSymbol(InvalidSymbol('N')));
    assert!(EncodedSequence::encode("acgt").is_err());
}

#[test]
fn empty() {
    let err = SequenceSet::encode(Vec::<&str>::new()).unwrap_err();
    assert_eq!(err, InputError::Empty);
}

#[test]
fn invalid_width() {
    let set = SequenceSet::encode(["ACGT", "TGCA"]).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    let expected = |width| Error::Input(InputError::InvalidWidth { width, length: 4 });

    for width in [0, 4, 5] {
        let err = GibbsSampler::new(&set, width, GibbsConfig::default(), &mut rng).unwrap_err();
        assert_eq!(err, expected(width));
        let err = EmSolver::new(&set, width, EmConfig::default()).unwrap_err();
        assert_eq!(err, expected(width));
        let err = gemotif::best_of_gibbs(&set, width, 3, &GibbsConfig::default(), &mut rng)
            .unwrap_err();
        assert_eq!(err, expected(width));
        let err =
            gemotif::best_of_em(&set, width, 3, &EmConfig::default(), &mut rng).unwrap_err();
        assert_eq!(err, expected(width));
    }
}

#[test]
fn too_few_sequences() {
    let set = SequenceSet::encode(["ACGTACGT"]).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    let err = gemotif::best_of_gibbs(&set, 3, 3, &GibbsConfig::default(), &mut rng).unwrap_err();
    assert_eq!(
        err,
        Error::Input(InputError::TooFewSequences {
            required: 2,
            found: 1
        })
    );
    // EM has no leave-one-out step and accepts a single sequence
    assert!(gemotif::find_motif_em(&set, 3, &EmConfig::default(), &mut rng).is_ok());
}
