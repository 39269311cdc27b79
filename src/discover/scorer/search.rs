use super::{
    sgd::{LabeledSample, LinearModel, Loss},
    HyperParams,
};
use rand::{seq::SliceRandom, Rng};

const HOLDOUT_FRACTION: f64 = 0.3;

pub fn sample_hyper_params<R: Rng + ?Sized>(rng: &mut R) -> HyperParams {
    let log_alpha = rng.random_range(-6.0..-2.0);
    HyperParams {
        alpha: 10_f64.powf(log_alpha),
        eta0: rng.random_range(0.01..1.0),
        epochs: rng.random_range(5..=20),
        loss: if rng.random_bool(0.5) {
            Loss::Hinge
        } else {
            Loss::Log
        },
    }
}

/// Mean of the per-class accuracies, so the decoy majority cannot dominate.
pub fn balanced_accuracy(model: &LinearModel, samples: &[&LabeledSample]) -> f64 {
    let mut hits = [0_usize; 2];
    let mut totals = [0_usize; 2];
    for sample in samples {
        let class = usize::from(sample.label > 0.0);
        totals[class] += 1;
        let predicted_positive = model.margin(&sample.vector) > 0.0;
        if predicted_positive == (sample.label > 0.0) {
            hits[class] += 1;
        }
    }
    let rates: Vec<f64> = hits
        .iter()
        .zip(totals.iter())
        .filter(|(_, &total)| total > 0)
        .map(|(&hit, &total)| hit as f64 / total as f64)
        .collect();
    if rates.is_empty() {
        return 0.0;
    }
    rates.iter().sum::<f64>() / rates.len() as f64
}

/// Randomized search over `n_iter` trials; trial 0 always uses the defaults.
/// `train` fits a model on the given samples with the given hyper-parameters.
pub fn search<R, F>(
    samples: &[&LabeledSample],
    n_iter: usize,
    rng: &mut R,
    mut train: F,
) -> HyperParams
where
    R: Rng + ?Sized,
    F: FnMut(&[&LabeledSample], &HyperParams, &mut R) -> Option<LinearModel>,
{
    if n_iter <= 1 {
        return HyperParams::default();
    }

    let mut shuffled = samples.to_vec();
    shuffled.shuffle(rng);
    let holdout_len = ((shuffled.len() as f64) * HOLDOUT_FRACTION).round() as usize;
    if holdout_len == 0 || holdout_len >= shuffled.len() {
        return HyperParams::default();
    }
    let (holdout, train_set) = shuffled.split_at(holdout_len);

    let mut best = (HyperParams::default(), f64::NEG_INFINITY);
    for trial in 0..n_iter {
        let params = if trial == 0 {
            HyperParams::default()
        } else {
            sample_hyper_params(&mut *rng)
        };
        let Some(model) = train(train_set, &params, &mut *rng) else {
            continue;
        };
        let score = balanced_accuracy(&model, holdout);
        log::trace!("Search trial {}: {:?} -> {:.4}", trial, params, score);
        if score > best.1 {
            best = (params, score);
        }
    }
    best.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::FeatureVector;
    use rand::{rngs::StdRng, SeedableRng};

    fn sample(index: u32, label: f64) -> LabeledSample {
        LabeledSample {
            vector: FeatureVector::from_pairs(vec![(index, 1.0)]),
            label,
            weight: 1.0,
        }
    }

    #[test]
    fn sampled_params_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let params = sample_hyper_params(&mut rng);
            assert!((1e-6..=1e-2).contains(&params.alpha));
            assert!((0.01..1.0).contains(&params.eta0));
            assert!((5..=20).contains(&params.epochs));
        }
    }

    #[test]
    fn balanced_accuracy_weights_classes_equally() {
        let model = LinearModel {
            weights: vec![1.0, -1.0],
            intercept: 0.0,
        };
        let pos = sample(0, 1.0);
        let neg_right = sample(1, -1.0);
        let neg_wrong = sample(0, -1.0);
        let samples = vec![&pos, &neg_right, &neg_wrong, &neg_wrong];
        // positives: 1/1, decoys: 1/3
        let score = balanced_accuracy(&model, &samples);
        assert!((score - (1.0 + 1.0 / 3.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn single_trial_returns_defaults_without_training() {
        let pos = sample(0, 1.0);
        let samples = vec![&pos];
        let mut calls = 0;
        let params = search(&samples, 1, &mut StdRng::seed_from_u64(1), |_, _, _| {
            calls += 1;
            None
        });
        assert_eq!(params, HyperParams::default());
        assert_eq!(calls, 0);
    }

    #[test]
    fn search_runs_every_trial() {
        let samples_owned: Vec<LabeledSample> = (0..20)
            .map(|i| sample(i % 2, if i % 2 == 0 { 1.0 } else { -1.0 }))
            .collect();
        let samples: Vec<&LabeledSample> = samples_owned.iter().collect();
        let mut calls = 0;
        search(&samples, 4, &mut StdRng::seed_from_u64(1), |_, _, _| {
            calls += 1;
            Some(LinearModel {
                weights: vec![1.0, -1.0],
                intercept: 0.0,
            })
        });
        assert_eq!(calls, 4);
    }
}
