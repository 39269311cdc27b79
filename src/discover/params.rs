use super::{
    cluster::ClusteringAlgorithm, features::MAX_NBITS, subarray::SubarrayBounds, MotifError,
    MotifResult,
};

/// Run parameters of one discovery pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryParams {
    /// Train on the first `n` sequences only; `None` trains on all of them.
    pub training_size: Option<usize>,
    pub negative_ratio: usize,
    pub shuffle_order: usize,
    pub min_subarray_size: usize,
    pub max_subarray_size: usize,
    pub min_motif_count: usize,
    pub min_cluster_size: usize,
    pub algorithm: ClusteringAlgorithm,
    pub nbits: u32,
    pub complexity: usize,
    pub n_iter_search: usize,
    pub n_jobs: usize,
    pub n_blocks: usize,
    pub seed: Option<u64>,
}

impl Default for DiscoveryParams {
    fn default() -> Self {
        Self {
            training_size: None,
            negative_ratio: 2,
            shuffle_order: 2,
            min_subarray_size: 7,
            max_subarray_size: 10,
            min_motif_count: 1,
            min_cluster_size: 1,
            algorithm: ClusteringAlgorithm::default(),
            nbits: 20,
            complexity: 4,
            n_iter_search: 1,
            n_jobs: 2,
            n_blocks: 2,
            seed: None,
        }
    }
}

impl DiscoveryParams {
    pub fn validate(&self) -> MotifResult<()> {
        SubarrayBounds::new(self.min_subarray_size, self.max_subarray_size)?;
        self.algorithm.validate()?;

        let checks = [
            (self.shuffle_order == 0, "shuffle_order must be at least 1"),
            (self.n_jobs == 0, "n_jobs must be at least 1"),
            (self.n_blocks == 0, "n_blocks must be at least 1"),
            (self.n_iter_search == 0, "n_iter_search must be at least 1"),
            (self.complexity == 0, "complexity must be at least 1"),
            (self.training_size == Some(0), "training_size must be at least 1"),
        ];
        if let Some((_, msg)) = checks.iter().find(|(failed, _)| *failed) {
            return Err(MotifError::ParameterError(msg.to_string()));
        }
        if self.nbits == 0 || self.nbits > MAX_NBITS {
            return Err(MotifError::ParameterError(format!(
                "nbits must be in 1..={}, got {}",
                MAX_NBITS, self.nbits
            )));
        }
        Ok(())
    }

    pub fn bounds(&self) -> MotifResult<SubarrayBounds> {
        SubarrayBounds::new(self.min_subarray_size, self.max_subarray_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = DiscoveryParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.bounds().unwrap(), SubarrayBounds::new(7, 10).unwrap());
        assert_eq!(params.algorithm, ClusteringAlgorithm::density());
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let params = DiscoveryParams {
            min_subarray_size: 10,
            max_subarray_size: 5,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(MotifError::ParameterError(_))
        ));
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let cases = [
            DiscoveryParams {
                shuffle_order: 0,
                ..Default::default()
            },
            DiscoveryParams {
                n_jobs: 0,
                ..Default::default()
            },
            DiscoveryParams {
                n_blocks: 0,
                ..Default::default()
            },
            DiscoveryParams {
                training_size: Some(0),
                ..Default::default()
            },
            DiscoveryParams {
                nbits: 31,
                ..Default::default()
            },
            DiscoveryParams {
                algorithm: ClusteringAlgorithm::Centroid { n_clusters: 0 },
                ..Default::default()
            },
        ];
        for params in cases {
            assert!(matches!(
                params.validate(),
                Err(MotifError::ParameterError(_))
            ));
        }
    }

    #[test]
    fn zero_negative_ratio_passes_validation() {
        // surfaces later as a training data error
        let params = DiscoveryParams {
            negative_ratio: 0,
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }
}
