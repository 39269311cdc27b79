//! Error taxonomy of the motif discovery core.
//!
//! Every stage surfaces its failure unrecovered; a run either completes or
//! aborts with one of these.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotifError {
    /// Empty or unusable sequence set.
    #[error("Input error: {0}")]
    InputError(String),

    /// Degenerate positive/decoy split handed to the scorer.
    #[error("Training data error: {0}")]
    TrainingDataError(String),

    /// Invalid run parameters, detected before any computation.
    #[error("Parameter error: {0}")]
    ParameterError(String),

    /// Clustering did not converge or could not run on the candidate pool.
    #[error("Clustering error: {0}")]
    ClusteringError(String),
}

pub type MotifResult<T> = std::result::Result<T, MotifError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_the_stage() {
        let errors = [
            MotifError::InputError("no sequences".into()),
            MotifError::TrainingDataError("no decoys".into()),
            MotifError::ParameterError("min > max".into()),
            MotifError::ClusteringError("did not converge".into()),
        ];
        let expected = [
            "Input error: no sequences",
            "Training data error: no decoys",
            "Parameter error: min > max",
            "Clustering error: did not converge",
        ];
        for (err, msg) in errors.iter().zip(expected) {
            assert_eq!(err.to_string(), msg);
        }
    }
}
