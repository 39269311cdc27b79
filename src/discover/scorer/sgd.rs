use crate::discover::FeatureVector;
use rand::{seq::SliceRandom, Rng};

const MIN_SCALE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Loss {
    Hinge,
    Log,
}

impl Loss {
    /// Derivative of the loss with respect to the margin `p` for label `y`.
    fn dloss(&self, p: f64, y: f64) -> f64 {
        let z = p * y;
        match self {
            Loss::Hinge => {
                if z < 1.0 {
                    -y
                } else {
                    0.0
                }
            }
            Loss::Log => {
                if z > 18.0 {
                    -y * (-z).exp()
                } else if z < -18.0 {
                    -y
                } else {
                    -y / (z.exp() + 1.0)
                }
            }
        }
    }
}

/// `eta_t = eta0 / (1 + alpha * eta0 * t)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearningRate {
    pub eta0: f64,
    pub alpha: f64,
}

impl LearningRate {
    pub fn eta(&self, step: u64) -> f64 {
        self.eta0 / (1.0 + self.alpha * self.eta0 * step as f64)
    }
}

#[derive(Debug, Clone)]
pub struct LabeledSample {
    pub vector: FeatureVector,
    /// +1.0 for real sequences, -1.0 for decoys
    pub label: f64,
    pub weight: f64,
}

/// Online learner state. The effective weights are `scale * weights`, which
/// keeps the L2 shrinkage of each step O(1).
#[derive(Debug, Clone)]
pub struct SgdState {
    weights: Vec<f64>,
    scale: f64,
    intercept: f64,
    step: u64,
    schedule: LearningRate,
    loss: Loss,
}

impl SgdState {
    pub fn new(dimension: usize, schedule: LearningRate, loss: Loss) -> Self {
        Self {
            weights: vec![0.0; dimension],
            scale: 1.0,
            intercept: 0.0,
            step: 0,
            schedule,
            loss,
        }
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn margin(&self, x: &FeatureVector) -> f64 {
        self.scale * x.dot_dense(&self.weights) + self.intercept
    }

    pub fn update(&mut self, sample: &LabeledSample) {
        let eta = self.schedule.eta(self.step);
        let p = self.margin(&sample.vector);
        let gradient = self.loss.dloss(p, sample.label) * sample.weight;

        self.scale *= (1.0 - eta * self.schedule.alpha).max(MIN_SCALE);
        if self.scale < MIN_SCALE {
            self.rescale();
        }

        if gradient != 0.0 {
            let step = -eta * gradient;
            for (index, value) in sample.vector.iter() {
                if let Some(w) = self.weights.get_mut(index as usize) {
                    *w += step * value / self.scale;
                }
            }
            self.intercept += step;
        }
        self.step += 1;
    }

    /// Runs `epochs` passes, visiting samples in a fresh random order each pass.
    pub fn fit<R: Rng + ?Sized>(&mut self, samples: &[&LabeledSample], epochs: usize, rng: &mut R) {
        let mut order: Vec<usize> = (0..samples.len()).collect();
        for _ in 0..epochs {
            order.shuffle(rng);
            for &i in &order {
                self.update(samples[i]);
            }
        }
    }

    fn rescale(&mut self) {
        let scale = self.scale;
        self.weights.iter_mut().for_each(|w| *w *= scale);
        self.scale = 1.0;
    }

    pub fn into_model(mut self) -> LinearModel {
        self.rescale();
        LinearModel {
            weights: self.weights,
            intercept: self.intercept,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    pub fn margin(&self, x: &FeatureVector) -> f64 {
        x.dot_dense(&self.weights) + self.intercept
    }

    /// Averages partial models trained on disjoint blocks.
    pub fn average(partials: &[LinearModel]) -> Option<LinearModel> {
        let first = partials.first()?;
        let n = partials.len() as f64;
        let mut weights = vec![0.0; first.weights.len()];
        let mut intercept = 0.0;
        for model in partials {
            for (acc, w) in weights.iter_mut().zip(&model.weights) {
                *acc += w / n;
            }
            intercept += model.intercept / n;
        }
        Some(LinearModel { weights, intercept })
    }
}
