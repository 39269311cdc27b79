//! Linear real-vs-decoy classifier trained online by SGD.
//!
//! Training deals the shuffled labelled stream round-robin into `n_blocks`
//! blocks, trains one [`SgdState`] per block on the current rayon pool, and
//! averages the resulting partial models.

mod search;
mod sgd;

pub use search::{balanced_accuracy, sample_hyper_params};
pub use sgd::{LabeledSample, LearningRate, LinearModel, Loss, SgdState};

use crate::discover::{FeatureVector, MotifError, MotifResult};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HyperParams {
    pub alpha: f64,
    pub eta0: f64,
    pub epochs: usize,
    pub loss: Loss,
}

impl Default for HyperParams {
    fn default() -> Self {
        Self {
            alpha: 1e-4,
            eta0: 0.1,
            epochs: 10,
            loss: Loss::Hinge,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    pub dimension: usize,
    pub n_iter_search: usize,
    pub n_blocks: usize,
}

#[derive(Debug, Clone)]
pub struct Scorer {
    model: LinearModel,
    params: HyperParams,
}

impl Scorer {
    pub fn fit<R: Rng + ?Sized>(
        positives: &[FeatureVector],
        negatives: &[FeatureVector],
        config: &TrainingConfig,
        rng: &mut R,
    ) -> MotifResult<Scorer> {
        check_training_data(positives, negatives)?;

        let samples = labeled_samples(positives, negatives);
        let mut stream: Vec<&LabeledSample> = samples.iter().collect();
        stream.shuffle(&mut *rng);

        let params = search::search(
            &stream,
            config.n_iter_search,
            &mut *rng,
            |train, params, rng| train_blocks(train, params, config, rng.random()),
        );
        log::debug!("Training scorer with {:?}", params);

        let model = train_blocks(&stream, &params, config, rng.random()).ok_or_else(|| {
            MotifError::TrainingDataError("no training samples were dealt to any block".into())
        })?;
        Ok(Scorer { model, params })
    }

    pub fn from_model(model: LinearModel, params: HyperParams) -> Self {
        Self { model, params }
    }

    /// Signed distance from the decision boundary; positive means "real".
    pub fn predict_margin(&self, vector: &FeatureVector) -> f64 {
        self.model.margin(vector)
    }

    pub fn weights(&self) -> FeatureVector {
        let pairs = self
            .model
            .weights
            .iter()
            .enumerate()
            .filter(|(_, &w)| w != 0.0)
            .map(|(index, &w)| (index as u32, w))
            .collect();
        FeatureVector::from_pairs(pairs)
    }

    pub fn intercept(&self) -> f64 {
        self.model.intercept
    }

    pub fn hyper_params(&self) -> &HyperParams {
        &self.params
    }
}

fn check_training_data(
    positives: &[FeatureVector],
    negatives: &[FeatureVector],
) -> MotifResult<()> {
    if positives.is_empty() {
        return Err(MotifError::TrainingDataError(
            "no positive sequences to train on".into(),
        ));
    }
    if negatives.is_empty() {
        return Err(MotifError::TrainingDataError(
            "no decoy sequences to train on (is negative_ratio 0?)".into(),
        ));
    }
    let first = &positives[0];
    if positives.iter().chain(negatives).all(|v| v == first) {
        return Err(MotifError::TrainingDataError(
            "positive and decoy sequences have identical feature representations".into(),
        ));
    }
    Ok(())
}

/// Class-balanced weights: each class carries half of the total sample weight.
fn labeled_samples(
    positives: &[FeatureVector],
    negatives: &[FeatureVector],
) -> Vec<LabeledSample> {
    let total = (positives.len() + negatives.len()) as f64;
    let pos_weight = total / (2.0 * positives.len() as f64);
    let neg_weight = total / (2.0 * negatives.len() as f64);
    let make = |vector: &FeatureVector, label: f64, weight: f64| LabeledSample {
        vector: vector.clone(),
        label,
        weight,
    };
    positives
        .iter()
        .map(|v| make(v, 1.0, pos_weight))
        .chain(negatives.iter().map(|v| make(v, -1.0, neg_weight)))
        .collect()
}

/// Trains one model per block in parallel and averages them. Returns `None`
/// when there are no samples.
pub fn train_blocks(
    samples: &[&LabeledSample],
    params: &HyperParams,
    config: &TrainingConfig,
    seed: u64,
) -> Option<LinearModel> {
    let n_blocks = config.n_blocks.clamp(1, samples.len().max(1));
    let mut blocks: Vec<Vec<&LabeledSample>> = vec![Vec::new(); n_blocks];
    for (i, sample) in samples.iter().enumerate() {
        blocks[i % n_blocks].push(sample);
    }

    let schedule = LearningRate {
        eta0: params.eta0,
        alpha: params.alpha,
    };
    let partials: Vec<LinearModel> = blocks
        .par_iter()
        .enumerate()
        .filter(|(_, block)| !block.is_empty())
        .map(|(block_index, block)| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(block_index as u64));
            let mut state = SgdState::new(config.dimension, schedule, params.loss);
            state.fit(block, params.epochs, &mut rng);
            state.into_model()
        })
        .collect();

    LinearModel::average(&partials)
}
