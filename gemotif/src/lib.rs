#![doc = include_str!("../README.md")]

extern crate generic_array;
extern crate typenum;

pub mod abc;
pub mod align;
pub mod config;
pub mod dense;
pub mod em;
pub mod err;
pub mod gibbs;
pub mod pwm;
pub mod seq;
pub mod trials;

pub use abc::Dna;
pub use abc::Nucleotide;
pub use abc::Symbol;
pub use align::Alignment;
pub use config::Budget;
pub use config::EmConfig;
pub use config::GibbsConfig;
pub use dense::DenseMatrix;
pub use em::find_motif_em;
pub use em::BeliefMatrix;
pub use em::EmResult;
pub use em::EmSolver;
pub use em::HiddenVariables;
pub use err::DomainError;
pub use err::Error;
pub use err::InputError;
pub use err::InvalidSymbol;
pub use gibbs::gibbs_sample;
pub use gibbs::GibbsResult;
pub use gibbs::GibbsSampler;
pub use gibbs::SamplerState;
pub use pwm::CountMatrix;
pub use pwm::FrequencyMatrix;
pub use pwm::ScoringMatrix;
pub use seq::EncodedSequence;
pub use seq::SequenceSet;
pub use trials::best_of_em;
pub use trials::best_of_gibbs;
