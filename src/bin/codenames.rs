// Reads the board from stdin, one whitespace separated list per line:
//   target words
//   opposing words
//   penalty words
// and prints one clue per grouping.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use codenames::{
    ClusterSearch, EmbeddingSpace, ExhaustiveSearch, Partition, PartitionSearch, SearchConfig, SearchError,
    SimilarityOracle, TimedOracle, VectorSource, WordLists,
};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Strategy {
    Exhaustive,
    Cluster,
}

#[derive(Parser, Debug)]
#[command(name = "codenames")]
#[command(about = "Find clue words covering a set of target words")]
struct Args {
    /// Embedding table, one `word v1 v2 ...` line per word, most frequent first.
    #[arg(long)]
    embeddings: PathBuf,

    /// JSON search configuration. Missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "exhaustive")]
    strategy: Strategy,

    /// Overrides the configured seed.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(short, long)]
    verbose: bool,
}

fn run_search<O>(oracle: &O, config: &SearchConfig, strategy: Strategy, lists: &WordLists) -> Result<Partition, SearchError>
where
    O: SimilarityOracle + VectorSource,
{
    let targets = lists.target_set();
    let forbidden = lists.forbidden_set();
    info!(targets = targets.len(), forbidden = forbidden.len(), ?strategy, "searching");

    match strategy {
        Strategy::Exhaustive => ExhaustiveSearch::new(oracle, config).search(&targets, &forbidden),
        Strategy::Cluster => ClusterSearch::new(oracle, config).search(&targets, &forbidden),
    }
}

fn run(args: Args) -> Result<Partition, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => SearchConfig::from_file(path)?,
        None => SearchConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let space = EmbeddingSpace::parse(BufReader::new(File::open(&args.embeddings)?))?;
    info!(words = space.len(), "embedding table loaded");

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    let lists: WordLists = input.parse()?;

    let partition = match config.query_timeout() {
        Some(timeout) => {
            let oracle = TimedOracle::new(Arc::new(space), timeout);
            run_search(&oracle, &config, args.strategy, &lists)?
        }
        None => run_search(&space, &config, args.strategy, &lists)?,
    };
    Ok(partition)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Failed to install the log subscriber");
    }

    match run(args) {
        Ok(partition) => {
            for result in partition.iter() {
                let words = result
                    .grouping
                    .iter()
                    .map(|word| word.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{words} -> {} ({})", result.clue.word(), result.score());
            }
            println!("total {}", partition.total_score());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
