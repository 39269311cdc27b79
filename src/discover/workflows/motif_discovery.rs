use crate::discover::{
    cluster::cluster_vectors,
    decoy::generate_decoys,
    importance::{annotate, annotate_all, ScoreProfile},
    results::{assemble, hits_of, scan_occurrences, DiscoveryResult, MotifDatabase, SpanMap},
    scorer::TrainingConfig,
    subarray::extract_candidates,
    Candidate, DiscoveryParams, FeatureEncoder, MotifError, MotifResult, Scorer, Sequence,
};
use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};
use rayon::{prelude::*, ThreadPoolBuilder};
use std::borrow::Cow;

/// Unfitted pipeline holding validated parameters.
#[derive(Debug, Clone)]
pub struct MotifDiscovery {
    params: DiscoveryParams,
}

/// A pipeline after `fit`: the trained scorer plus the motif database,
/// reusable on new sequences without retraining.
#[derive(Debug, Clone)]
pub struct FittedMotifDiscovery {
    params: DiscoveryParams,
    encoder: FeatureEncoder,
    scorer: Scorer,
    candidates: Vec<Candidate>,
    result: DiscoveryResult,
}

impl MotifDiscovery {
    pub fn new(params: DiscoveryParams) -> MotifResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &DiscoveryParams {
        &self.params
    }

    pub fn fit(self, sequences: &[Sequence]) -> MotifResult<FittedMotifDiscovery> {
        check_input(sequences, self.params.min_subarray_size)?;

        let mut rng = match self.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let encoder = FeatureEncoder::new(self.params.complexity, self.params.nbits)?;
        let pool = initialize_thread_pool(self.params.n_jobs)?;

        let params = &self.params;
        let (scorer, candidates, result) = pool.install(|| {
            let scorer = train_scorer(params, &encoder, sequences, &mut rng)?;
            let (candidates, result) = mine_motifs(params, &encoder, &scorer, sequences, &mut rng)?;
            Ok::<_, MotifError>((scorer, candidates, result))
        })?;

        Ok(FittedMotifDiscovery {
            params: self.params,
            encoder,
            scorer,
            candidates,
            result,
        })
    }
}

impl FittedMotifDiscovery {
    pub fn params(&self) -> &DiscoveryParams {
        &self.params
    }

    pub fn result(&self) -> &DiscoveryResult {
        &self.result
    }

    pub fn motifs(&self) -> &MotifDatabase {
        &self.result.motifs
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// Candidates extracted from the training run, in input order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Importance profile of a new sequence under the fitted scorer.
    pub fn annotate(&self, symbols: &str) -> ScoreProfile {
        annotate(&self.scorer, &self.encoder, symbols.as_bytes())
    }

    /// Spans of every occurrence of every database motif, per sequence.
    pub fn transform(&self, sequences: &[Sequence]) -> Vec<SpanMap> {
        scan_occurrences(&self.result.motifs, sequences)
    }

    /// Cluster ids hit by each sequence.
    pub fn predict(&self, sequences: &[Sequence]) -> Vec<Vec<usize>> {
        hits_of(&self.transform(sequences))
    }
}

fn check_input(sequences: &[Sequence], min_subarray_size: usize) -> MotifResult<()> {
    if sequences.is_empty() {
        return Err(MotifError::InputError("no input sequences".into()));
    }
    if sequences.iter().all(|s| s.len() < min_subarray_size) {
        return Err(MotifError::InputError(format!(
            "all {} sequences are shorter than min_subarray_size ({})",
            sequences.len(),
            min_subarray_size
        )));
    }
    if let Some(seq) = sequences.iter().find(|s| !s.symbols.is_ascii()) {
        return Err(MotifError::InputError(format!(
            "sequence {} contains non-ASCII symbols",
            seq.header
        )));
    }
    Ok(())
}

/// Draws `training_size` sequences with the run RNG, kept in input order.
fn training_set<'a, R: Rng + ?Sized>(
    sequences: &'a [Sequence],
    training_size: Option<usize>,
    rng: &mut R,
) -> Cow<'a, [Sequence]> {
    match training_size {
        Some(n) if n < sequences.len() => {
            let mut picked = index::sample(rng, sequences.len(), n).into_vec();
            picked.sort_unstable();
            Cow::Owned(picked.into_iter().map(|i| sequences[i].clone()).collect())
        }
        _ => Cow::Borrowed(sequences),
    }
}

fn train_scorer<R: Rng + ?Sized>(
    params: &DiscoveryParams,
    encoder: &FeatureEncoder,
    sequences: &[Sequence],
    rng: &mut R,
) -> MotifResult<Scorer> {
    let training = training_set(sequences, params.training_size, rng);
    let decoys = generate_decoys(&training, params.negative_ratio, params.shuffle_order, rng);
    log::debug!(
        "Training on {} sequences against {} decoys",
        training.len(),
        decoys.len()
    );

    let positives: Vec<&[u8]> = training.iter().map(Sequence::as_bytes).collect();
    let negatives: Vec<&[u8]> = decoys.iter().map(Sequence::as_bytes).collect();
    let positives = encoder.encode_batch(&positives);
    let negatives = encoder.encode_batch(&negatives);
    let config = TrainingConfig {
        dimension: encoder.dimension(),
        n_iter_search: params.n_iter_search,
        n_blocks: params.n_blocks,
    };
    Scorer::fit(&positives, &negatives, &config, rng)
}

/// Annotates, extracts candidates, clusters them and assembles the result.
fn mine_motifs<R: Rng + ?Sized>(
    params: &DiscoveryParams,
    encoder: &FeatureEncoder,
    scorer: &Scorer,
    sequences: &[Sequence],
    rng: &mut R,
) -> MotifResult<(Vec<Candidate>, DiscoveryResult)> {
    let bounds = params.bounds()?;
    let profiles = annotate_all(scorer, encoder, sequences);
    let candidates: Vec<Candidate> = sequences
        .par_iter()
        .zip(profiles.par_iter())
        .map(|(seq, profile)| extract_candidates(seq, profile, bounds))
        .collect::<Vec<_>>()
        .concat();
    log::debug!(
        "Extracted {} candidates from {} sequences",
        candidates.len(),
        sequences.len()
    );

    let vectors = encoder.encode_batch(
        &candidates
            .iter()
            .map(|c| c.subsequence.as_bytes())
            .collect::<Vec<_>>(),
    );
    let algorithm = params.algorithm.with_min_cluster_size(params.min_cluster_size);
    let labels = cluster_vectors(&vectors, &algorithm, rng)?;
    let result = assemble(
        sequences.len(),
        &candidates,
        &labels,
        params.min_cluster_size,
        params.min_motif_count,
    );
    Ok((candidates, result))
}

fn initialize_thread_pool(num_threads: usize) -> MotifResult<rayon::ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("smod-{}", i))
        .start_handler(|_thread_index| {
            log::trace!("Initialized thread {:?}", std::thread::current().id());
        })
        .build()
        .map_err(|e| MotifError::ParameterError(format!("Failed to initialize thread pool: {}", e)))
}
