//! Grouping of candidate feature vectors into motif clusters.

mod birch;
mod dbscan;
mod kmeans;

pub use birch::{birch, ClusteringFeature};
pub use dbscan::dbscan;
pub use kmeans::mini_batch_kmeans;

use crate::discover::{FeatureVector, MotifError, MotifResult};
use rand::Rng;
use std::{fmt, str::FromStr};

/// Cluster id per input vector; `None` marks noise.
pub type Labels = Vec<Option<usize>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClusteringAlgorithm {
    Density { eps: f64, min_samples: usize },
    Centroid { n_clusters: usize },
    Tree { threshold: f64, branching_factor: usize },
}

impl ClusteringAlgorithm {
    pub fn density() -> Self {
        Self::Density {
            eps: 0.3,
            min_samples: 3,
        }
    }

    pub fn centroid() -> Self {
        Self::Centroid { n_clusters: 4 }
    }

    pub fn tree() -> Self {
        Self::Tree {
            threshold: 0.2,
            branching_factor: 3,
        }
    }

    /// Density clustering also accepts a dense group that already reaches a
    /// `min_cluster_size` of two or more.
    pub fn with_min_cluster_size(self, min_cluster_size: usize) -> Self {
        match self {
            Self::Density { eps, min_samples } if min_cluster_size > 1 => Self::Density {
                eps,
                min_samples: min_samples.min(min_cluster_size),
            },
            other => other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Density { .. } => "dbscan",
            Self::Centroid { .. } => "minibatch",
            Self::Tree { .. } => "birch",
        }
    }

    pub fn validate(&self) -> MotifResult<()> {
        let invalid = |msg: String| Err(MotifError::ParameterError(msg));
        match *self {
            Self::Density { eps, min_samples } => {
                if !(eps.is_finite() && eps > 0.0) {
                    return invalid(format!("eps must be positive, got {}", eps));
                }
                if min_samples == 0 {
                    return invalid("min_samples must be at least 1".into());
                }
            }
            Self::Centroid { n_clusters } => {
                if n_clusters == 0 {
                    return invalid("n_clusters must be at least 1".into());
                }
            }
            Self::Tree {
                threshold,
                branching_factor,
            } => {
                if !(threshold.is_finite() && threshold > 0.0) {
                    return invalid(format!("threshold must be positive, got {}", threshold));
                }
                if branching_factor < 2 {
                    return invalid(format!(
                        "branching_factor must be at least 2, got {}",
                        branching_factor
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Default for ClusteringAlgorithm {
    fn default() -> Self {
        Self::density()
    }
}

impl fmt::Display for ClusteringAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parses an algorithm name into that algorithm with its default knobs.
impl FromStr for ClusteringAlgorithm {
    type Err = MotifError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dbscan" | "density" => Ok(Self::density()),
            "minibatch" | "centroid" => Ok(Self::centroid()),
            "birch" | "tree" => Ok(Self::tree()),
            other => Err(MotifError::ParameterError(format!(
                "unknown clustering algorithm: {}",
                other
            ))),
        }
    }
}

pub fn cluster_vectors<R: Rng + ?Sized>(
    vectors: &[FeatureVector],
    algorithm: &ClusteringAlgorithm,
    rng: &mut R,
) -> MotifResult<Labels> {
    algorithm.validate()?;
    if vectors.is_empty() {
        return Ok(Vec::new());
    }
    log::debug!(
        "Clustering {} candidates with {}",
        vectors.len(),
        algorithm.name()
    );
    match *algorithm {
        ClusteringAlgorithm::Density { eps, min_samples } => Ok(dbscan(vectors, eps, min_samples)),
        ClusteringAlgorithm::Centroid { n_clusters } => mini_batch_kmeans(vectors, n_clusters, rng),
        ClusteringAlgorithm::Tree {
            threshold,
            branching_factor,
        } => Ok(birch(vectors, threshold, branching_factor)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!(
            "dbscan".parse::<ClusteringAlgorithm>().unwrap(),
            ClusteringAlgorithm::density()
        );
        assert_eq!(
            "Centroid".parse::<ClusteringAlgorithm>().unwrap(),
            ClusteringAlgorithm::centroid()
        );
        assert_eq!(
            "tree".parse::<ClusteringAlgorithm>().unwrap(),
            ClusteringAlgorithm::tree()
        );
        assert!(matches!(
            "spectral".parse::<ClusteringAlgorithm>(),
            Err(MotifError::ParameterError(_))
        ));
    }

    #[test]
    fn default_is_density() {
        assert_eq!(ClusteringAlgorithm::default().name(), "dbscan");
    }

    #[test]
    fn min_cluster_size_caps_density_core_size() {
        let density = ClusteringAlgorithm::density();
        assert_eq!(
            density.with_min_cluster_size(2),
            ClusteringAlgorithm::Density {
                eps: 0.3,
                min_samples: 2,
            }
        );
        assert_eq!(density.with_min_cluster_size(1), density);
        assert_eq!(density.with_min_cluster_size(5), density);
        let tree = ClusteringAlgorithm::tree();
        assert_eq!(tree.with_min_cluster_size(2), tree);
    }

    #[test]
    fn identical_pair_needs_a_lowered_core_size() {
        let shared = FeatureVector::from_pairs(vec![(3, 0.6), (9, 0.8)]);
        let other = FeatureVector::from_pairs(vec![(1, 1.0)]);
        let vectors = vec![shared.clone(), other, shared];
        let mut rng = StdRng::seed_from_u64(0);

        let strict = cluster_vectors(&vectors, &ClusteringAlgorithm::default(), &mut rng).unwrap();
        assert_eq!(strict, vec![None, None, None]);

        let algorithm = ClusteringAlgorithm::default().with_min_cluster_size(2);
        let labels = cluster_vectors(&vectors, &algorithm, &mut rng).unwrap();
        assert!(labels[0].is_some());
        assert_eq!(labels[0], labels[2]);
        assert_eq!(labels[1], None);
    }

    #[test]
    fn invalid_knobs_are_rejected() {
        let bad = [
            ClusteringAlgorithm::Density {
                eps: 0.0,
                min_samples: 3,
            },
            ClusteringAlgorithm::Density {
                eps: 0.3,
                min_samples: 0,
            },
            ClusteringAlgorithm::Centroid { n_clusters: 0 },
            ClusteringAlgorithm::Tree {
                threshold: f64::NAN,
                branching_factor: 3,
            },
            ClusteringAlgorithm::Tree {
                threshold: 0.2,
                branching_factor: 1,
            },
        ];
        for algorithm in bad {
            assert!(matches!(
                algorithm.validate(),
                Err(MotifError::ParameterError(_))
            ));
        }
    }

    #[test]
    fn identical_vectors_share_a_cluster_under_every_algorithm() {
        let shared = FeatureVector::from_pairs(vec![(3, 0.6), (9, 0.8)]);
        let other = FeatureVector::from_pairs(vec![(1, 1.0)]);
        let vectors = vec![shared.clone(), other.clone(), shared.clone(), other, shared];
        for algorithm in [
            ClusteringAlgorithm::Density {
                eps: 0.3,
                min_samples: 2,
            },
            ClusteringAlgorithm::Centroid { n_clusters: 2 },
            ClusteringAlgorithm::tree(),
        ] {
            let labels =
                cluster_vectors(&vectors, &algorithm, &mut StdRng::seed_from_u64(2)).unwrap();
            assert!(labels[0].is_some(), "{}", algorithm);
            assert_eq!(labels[0], labels[2], "{}", algorithm);
            assert_eq!(labels[0], labels[4], "{}", algorithm);
            assert_ne!(labels[0], labels[1], "{}", algorithm);
        }
    }

    #[test]
    fn empty_pool_yields_no_labels() {
        let labels = cluster_vectors(
            &[],
            &ClusteringAlgorithm::centroid(),
            &mut StdRng::seed_from_u64(0),
        )
        .unwrap();
        assert!(labels.is_empty());
    }
}
