use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use std::time::Instant;

use clap::Parser;
use gemotif::config::DEFAULT_EM_TRIALS;
use gemotif::config::DEFAULT_EPSILON;
use gemotif::config::DEFAULT_GIBBS_TRIALS;
use gemotif::pwm::DEFAULT_PSEUDOCOUNT;
use gemotif::Alignment;
use gemotif::EmConfig;
use gemotif::EmSolver;
use gemotif::EncodedSequence;
use gemotif::GibbsConfig;
use gemotif::SequenceSet;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

// --- Algorithm ---------------------------------------------------------------

#[derive(Debug, Clone)]
struct InvalidAlgorithm(String);

impl std::error::Error for InvalidAlgorithm {}

impl std::fmt::Display for InvalidAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid algorithm: {}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Algorithm {
    Gibbs,
    BestGibbs,
    Em,
    BestEm,
}

impl Algorithm {
    fn default_trials(&self) -> usize {
        match self {
            Algorithm::Gibbs | Algorithm::Em => 1,
            Algorithm::BestGibbs => DEFAULT_GIBBS_TRIALS,
            Algorithm::BestEm => DEFAULT_EM_TRIALS,
        }
    }
}

impl FromStr for Algorithm {
    type Err = InvalidAlgorithm;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use self::Algorithm::*;
        match s {
            "gibbs" => Ok(Gibbs),
            "best-gibbs" => Ok(BestGibbs),
            "em" => Ok(Em),
            "best-em" => Ok(BestEm),
            _ => Err(InvalidAlgorithm(s.into())),
        }
    }
}

// --- Cleanup -----------------------------------------------------------------

/// Keep only upper-cased `ACGT` characters, then cut every sequence down to
/// the length of the shortest one.
fn clean_up(sequences: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
    let mut cleaned = sequences
        .into_iter()
        .map(|seq| {
            seq.into_iter()
                .map(|c| c.to_ascii_uppercase())
                .filter(|c| matches!(c, b'A' | b'C' | b'G' | b'T'))
                .collect::<Vec<u8>>()
        })
        .collect::<Vec<_>>();
    let shortest = cleaned.iter().map(|s| s.len()).min().unwrap_or(0);
    for seq in cleaned.iter_mut() {
        seq.truncate(shortest);
    }
    cleaned
}

// --- Summary -----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct Summary {
    total: f64,
    min: f64,
    max: f64,
    mean: f64,
    median: f64,
    std: f64,
}

impl Summary {
    fn new(scores: &[f64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let mut sorted = scores.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len() as f64;
        let total: f64 = sorted.iter().sum();
        let mean = total / n;
        let median = if sorted.len() % 2 == 1 {
            sorted[sorted.len() / 2]
        } else {
            (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) / 2.0
        };
        let var = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            total,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean,
            median,
            std: var.sqrt(),
        })
    }
}

// --- Main --------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Parameters {
    /// FASTA file with the sequences to search
    #[arg(short, long, required = true)]
    input: PathBuf,

    /// width of the motif to find
    #[arg(short, long, required = true)]
    width: usize,

    /// search strategy (gibbs, best-gibbs, em, best-em)
    #[arg(short, long, default_value = "best-em")]
    algorithm: Algorithm,

    /// number of independent trials of the best-of strategies
    #[arg(short = 'n', long)]
    trials: Option<usize>,

    /// seed of the random number generator
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// budget of a single Gibbs trial, in milliseconds
    #[arg(long, default_value_t = 1000)]
    timeout: u64,

    /// convergence threshold of the EM finder
    #[arg(long, default_value_t = DEFAULT_EPSILON)]
    epsilon: f64,

    /// a known motif to compare the found instances against
    #[arg(long)]
    solution: Option<String>,

    /// output file to write to, standard output if absent
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// The result of a search, whatever the algorithm.
struct Found {
    alignment: Alignment,
    /// The consensus the instances are measured against.
    consensus: EncodedSequence,
    /// Gibbs passes or EM iterations of the reported trial.
    iterations: usize,
}

fn search(
    params: &Parameters,
    sequences: &SequenceSet,
    rng: &mut StdRng,
) -> Result<Found, gemotif::Error> {
    let trials = params.trials.unwrap_or(params.algorithm.default_trials());
    let gibbs = GibbsConfig::default().with_budget(Duration::from_millis(params.timeout));
    let em = EmConfig::default().with_epsilon(params.epsilon);

    let found = match params.algorithm {
        Algorithm::Gibbs | Algorithm::BestGibbs => {
            let result = if params.algorithm == Algorithm::Gibbs {
                gemotif::gibbs_sample(sequences, params.width, &gibbs, rng)?
            } else {
                gemotif::best_of_gibbs(sequences, params.width, trials, &gibbs, rng)?
            };
            Found {
                consensus: result.alignment.frequency_matrix()?.consensus(),
                alignment: result.alignment,
                iterations: result.passes,
            }
        }
        Algorithm::Em | Algorithm::BestEm => {
            let result = if params.algorithm == Algorithm::Em {
                EmSolver::new(sequences, params.width, em)?.run(rng)?
            } else {
                gemotif::best_of_em(sequences, params.width, trials, &em, rng)?
            };
            Found {
                alignment: result.alignment,
                consensus: result.consensus,
                iterations: result.iterations,
            }
        }
    };
    Ok(found)
}

fn write_summary<W: Write>(out: &mut W, name: &str, scores: &[f64]) -> std::io::Result<()> {
    if let Some(s) = Summary::new(scores) {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            name, s.total, s.min, s.max, s.mean, s.median, s.std
        )?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let params = Parameters::parse();
    let started = Instant::now();

    let mut raw = Vec::new();
    let file = File::open(&params.input).map(BufReader::new)?;
    for result in noodles_fasta::io::Reader::new(file).records() {
        let record = result?;
        raw.push(record.sequence().as_ref().to_vec());
    }
    let sequences = SequenceSet::encode(clean_up(raw))?;
    info!(
        "loaded {} sequences (L={})",
        sequences.len(),
        sequences.sequence_length()
    );

    let solution = params
        .solution
        .as_ref()
        .map(|motif| EncodedSequence::encode(motif.to_ascii_uppercase()))
        .transpose()?;

    let mut rng = StdRng::seed_from_u64(params.seed);
    let found = search(&params, &sequences, &mut rng)?;
    let alignment = &found.alignment;
    let scores = alignment.instance_costs(DEFAULT_PSEUDOCOUNT)?;
    let probabilities = alignment.instance_probabilities()?;
    let occurrences = alignment.occurrences(&sequences);
    let solution_scores = match &solution {
        Some(motif) => Some(alignment.solution_costs(motif, DEFAULT_PSEUDOCOUNT)?),
        None => None,
    };
    let identity = alignment.identity(&found.consensus).iter().sum::<usize>();
    let elapsed = started.elapsed();

    let mut out: Box<dyn Write> = match &params.output {
        Some(path) => Box::new(File::create(path).map(BufWriter::new)?),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    write!(out, "seq_index\toffset\tinstance\tscore\tprobability\toccurrences")?;
    if solution_scores.is_some() {
        write!(out, "\tsolution_score")?;
    }
    writeln!(out)?;
    for (i, instance) in alignment.instances().iter().enumerate() {
        write!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            i + 1,
            alignment.starts()[i],
            instance,
            scores[i],
            probabilities[i],
            occurrences[i],
        )?;
        if let Some(costs) = &solution_scores {
            write!(out, "\t{}", costs[i])?;
        }
        writeln!(out)?;
    }

    writeln!(out)?;
    writeln!(out, "metric\ttotal\tmin\tmax\tmean\tmedian\tstd")?;
    write_summary(&mut out, "score", &scores)?;
    write_summary(&mut out, "probability", &probabilities)?;
    if let Some(costs) = &solution_scores {
        write_summary(&mut out, "solution_score", costs)?;
    }

    writeln!(out)?;
    writeln!(out, "consensus\t{}", found.consensus)?;
    let cells = alignment.len() * alignment.width();
    if cells > 0 {
        writeln!(out, "identity\t{:.2}%", 100.0 * identity as f64 / cells as f64)?;
    }
    writeln!(out, "iterations\t{}", found.iterations)?;
    writeln!(out, "elapsed\t{:.3}s", elapsed.as_secs_f64())?;
    out.flush()?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clean_up_filters_and_truncates() {
        let cleaned = clean_up(vec![b"ac-gtNa".to_vec(), b"TTG".to_vec(), b"ggcc\n".to_vec()]);
        assert_eq!(cleaned, vec![b"ACG".to_vec(), b"TTG".to_vec(), b"GGC".to_vec()]);
    }

    #[test]
    fn algorithm_from_str() {
        assert_eq!(Algorithm::from_str("best-em").unwrap(), Algorithm::BestEm);
        assert_eq!(Algorithm::from_str("gibbs").unwrap(), Algorithm::Gibbs);
        assert!(Algorithm::from_str("meme").is_err());
    }

    #[test]
    fn summary_line() {
        let mut out = Vec::new();
        write_summary(&mut out, "score", &[1.0, 3.0]).unwrap();
        write_summary(&mut out, "empty", &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "score\t4\t1\t3\t2\t2\t1\n");
    }

    #[test]
    fn parameters() {
        let params = Parameters::parse_from([
            "gemotif", "-i", "seqs.fa", "-w", "8", "-a", "gibbs", "--solution", "acgtacgt",
        ]);
        assert_eq!(params.algorithm, Algorithm::Gibbs);
        assert_eq!(params.width, 8);
        assert_eq!(params.solution.as_deref(), Some("acgtacgt"));
        assert_eq!(params.seed, 42);
        assert!(params.output.is_none());
    }

    #[test]
    fn summary() {
        let summary = Summary::new(&[3.0, 1.0, 2.0, 2.0]).unwrap();
        assert_eq!(summary.total, 8.0);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 3.0);
        assert_eq!(summary.mean, 2.0);
        assert_eq!(summary.median, 2.0);
        assert!((summary.std - 0.5f64.sqrt()).abs() < 1e-12);
        assert_eq!(Summary::new(&[]), None);
    }
}
