use crate::discover::{ClusteringAlgorithm, DiscoveryParams};
use crate::utils::Result;
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="smod",
          version=&**FULL_VERSION,
          about="Sequence motif discovery",
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Discover motifs in a set of sequences")]
    Discover(DiscoverArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("discover")))]
#[command(arg_required_else_help(true))]
pub struct DiscoverArgs {
    #[clap(required = true)]
    #[clap(short = 'i')]
    #[clap(long = "input")]
    #[clap(help = "FASTA file with the input sequences (plain or gzipped)")]
    #[clap(value_name = "FASTA")]
    #[arg(value_parser = check_file_exists)]
    pub input_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "2")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(long = "seed")]
    #[clap(value_name = "SEED")]
    #[clap(help = "Seed for decoys, training and clustering; random if unset")]
    pub seed: Option<u64>,

    #[clap(long = "min-subarray-size")]
    #[clap(value_name = "LEN")]
    #[clap(help = "Minimum motif candidate length")]
    #[clap(default_value = "7")]
    #[arg(value_parser = at_least_one)]
    pub min_subarray_size: usize,

    #[clap(long = "max-subarray-size")]
    #[clap(value_name = "LEN")]
    #[clap(help = "Maximum motif candidate length")]
    #[clap(default_value = "10")]
    #[arg(value_parser = at_least_one)]
    pub max_subarray_size: usize,

    #[clap(long = "min-motif-count")]
    #[clap(value_name = "COUNT")]
    #[clap(help = "Minimum occurrences of a motif within its cluster")]
    #[clap(default_value = "1")]
    pub min_motif_count: usize,

    #[clap(long = "min-cluster-size")]
    #[clap(value_name = "SIZE")]
    #[clap(help = "Minimum number of candidates in a cluster")]
    #[clap(default_value = "1")]
    pub min_cluster_size: usize,

    #[clap(long = "algorithm")]
    #[clap(value_name = "ALGORITHM")]
    #[clap(help = "Clustering algorithm (dbscan, minibatch or birch)")]
    #[clap(default_value = "dbscan")]
    #[arg(value_parser = algorithm_from_string)]
    pub algorithm: ClusteringAlgorithm,

    #[clap(help_heading("Clustering"))]
    #[clap(long = "eps")]
    #[clap(value_name = "EPS")]
    #[clap(help = "Neighbourhood radius for dbscan")]
    #[clap(default_value = "0.3")]
    #[arg(value_parser = positive_float)]
    pub eps: f64,

    #[clap(help_heading("Clustering"))]
    #[clap(long = "min-samples")]
    #[clap(value_name = "COUNT")]
    #[clap(help = "Neighbours (including the point) that make a dbscan core point")]
    #[clap(default_value = "3")]
    #[arg(value_parser = at_least_one)]
    pub min_samples: usize,

    #[clap(help_heading("Clustering"))]
    #[clap(long = "n-clusters")]
    #[clap(value_name = "K")]
    #[clap(help = "Number of minibatch k-means clusters")]
    #[clap(default_value = "4")]
    #[arg(value_parser = at_least_one)]
    pub n_clusters: usize,

    #[clap(help_heading("Clustering"))]
    #[clap(long = "threshold")]
    #[clap(value_name = "RADIUS")]
    #[clap(help = "Subcluster merge radius for birch")]
    #[clap(default_value = "0.2")]
    #[arg(value_parser = positive_float)]
    pub threshold: f64,

    #[clap(help_heading("Clustering"))]
    #[clap(long = "branching-factor")]
    #[clap(value_name = "COUNT")]
    #[clap(help = "Maximum entries per birch node")]
    #[clap(default_value = "3")]
    pub branching_factor: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "training-size")]
    #[clap(value_name = "COUNT")]
    #[clap(help = "Train the scorer on the first COUNT sequences only")]
    #[arg(value_parser = at_least_one)]
    pub training_size: Option<usize>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "negative-ratio")]
    #[clap(value_name = "RATIO")]
    #[clap(help = "Shuffled decoys generated per input sequence")]
    #[clap(default_value = "2")]
    pub negative_ratio: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "shuffle-order")]
    #[clap(value_name = "ORDER")]
    #[clap(help = "Block size used when shuffling decoys")]
    #[clap(default_value = "2")]
    #[arg(value_parser = at_least_one)]
    pub shuffle_order: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "nbits")]
    #[clap(value_name = "NBITS")]
    #[clap(help = "Feature space size as a power of two")]
    #[clap(default_value = "20")]
    #[arg(value_parser = nbits_in_range)]
    pub nbits: u32,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "complexity")]
    #[clap(value_name = "COMPLEXITY")]
    #[clap(help = "Neighbourhood radius and distance bound of the features")]
    #[clap(default_value = "4")]
    #[arg(value_parser = at_least_one)]
    pub complexity: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "n-iter-search")]
    #[clap(value_name = "TRIALS")]
    #[clap(help = "Randomized hyper-parameter search trials (1 keeps the defaults)")]
    #[clap(default_value = "1")]
    #[arg(value_parser = at_least_one)]
    pub n_iter_search: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "n-blocks")]
    #[clap(value_name = "BLOCKS")]
    #[clap(help = "Training blocks fitted in parallel and averaged")]
    #[clap(default_value = "2")]
    #[arg(value_parser = at_least_one)]
    pub n_blocks: usize,
}

impl DiscoverArgs {
    pub fn discovery_params(&self) -> DiscoveryParams {
        let algorithm = match self.algorithm {
            ClusteringAlgorithm::Density { .. } => ClusteringAlgorithm::Density {
                eps: self.eps,
                min_samples: self.min_samples,
            },
            ClusteringAlgorithm::Centroid { .. } => ClusteringAlgorithm::Centroid {
                n_clusters: self.n_clusters,
            },
            ClusteringAlgorithm::Tree { .. } => ClusteringAlgorithm::Tree {
                threshold: self.threshold,
                branching_factor: self.branching_factor,
            },
        };
        DiscoveryParams {
            training_size: self.training_size,
            negative_ratio: self.negative_ratio,
            shuffle_order: self.shuffle_order,
            min_subarray_size: self.min_subarray_size,
            max_subarray_size: self.max_subarray_size,
            min_motif_count: self.min_motif_count,
            min_cluster_size: self.min_cluster_size,
            algorithm,
            nbits: self.nbits,
            complexity: self.complexity,
            n_iter_search: self.n_iter_search,
            n_jobs: self.num_threads,
            n_blocks: self.n_blocks,
            seed: self.seed,
        }
    }
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn at_least_one(s: &str) -> Result<usize> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid count", s))?;
    if value >= 1 {
        Ok(value)
    } else {
        Err("The value must be at least 1".into())
    }
}

fn nbits_in_range(s: &str) -> Result<u32> {
    let nbits: u32 = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid number of bits", s))?;
    if (1..=crate::discover::features::MAX_NBITS).contains(&nbits) {
        Ok(nbits)
    } else {
        Err(format!(
            "nbits must be between 1 and {}, got: {}",
            crate::discover::features::MAX_NBITS,
            nbits
        ))
    }
}

fn positive_float(s: &str) -> Result<f64> {
    let value = s
        .parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("The value must be positive, got: {}", value))
    }
}

fn algorithm_from_string(s: &str) -> Result<ClusteringAlgorithm> {
    s.parse::<ClusteringAlgorithm>()
        .map_err(|_| format!("Unknown algorithm `{}`: expected dbscan, minibatch or birch", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> DiscoverArgs {
        let input = tempfile::NamedTempFile::new().unwrap();
        let input = input.path().to_str().unwrap().to_string();
        let mut argv = vec!["smod", "discover", "-i", &input, "-o", "out"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Discover(args) => args,
        }
    }

    #[test]
    fn defaults_match_discovery_params() {
        assert_eq!(parse(&[]).discovery_params(), DiscoveryParams::default());
    }

    #[test]
    fn algorithm_knobs_follow_the_chosen_algorithm() {
        let params = parse(&["--algorithm", "birch", "--threshold", "0.5"]).discovery_params();
        assert_eq!(
            params.algorithm,
            ClusteringAlgorithm::Tree {
                threshold: 0.5,
                branching_factor: 3
            }
        );
        let params = parse(&["--algorithm", "centroid", "--n-clusters", "6"]).discovery_params();
        assert_eq!(params.algorithm, ClusteringAlgorithm::Centroid { n_clusters: 6 });
    }

    #[test]
    fn value_checks() {
        assert!(threads_in_range("0").is_err());
        assert!(at_least_one("0").is_err());
        assert_eq!(at_least_one("3"), Ok(3));
        assert!(nbits_in_range("31").is_err());
        assert_eq!(nbits_in_range("20"), Ok(20));
        assert!(positive_float("-0.1").is_err());
        assert!(algorithm_from_string("kmedoids").is_err());
    }
}
