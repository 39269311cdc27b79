use super::{FeatureEncoder, Scorer, Sequence};
use rayon::prelude::*;

/// One importance score per sequence position.
pub type ScoreProfile = Vec<f64>;

/// Scores every position by the margin of its anchored feature vector.
pub fn annotate(scorer: &Scorer, encoder: &FeatureEncoder, symbols: &[u8]) -> ScoreProfile {
    let table = encoder.neighborhoods(symbols);
    (0..table.len())
        .map(|position| scorer.predict_margin(&table.anchored(position)))
        .collect()
}

/// Annotates sequences in parallel on the current rayon pool; output order
/// follows input order.
pub fn annotate_all(
    scorer: &Scorer,
    encoder: &FeatureEncoder,
    sequences: &[Sequence],
) -> Vec<ScoreProfile> {
    sequences
        .par_iter()
        .map(|seq| annotate(scorer, encoder, seq.as_bytes()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::{load_sequences, scorer::HyperParams, FeatureVector, LinearModel};

    fn scorer_favouring(encoder: &FeatureEncoder, motif: &[u8]) -> Scorer {
        let mut weights = vec![0.0; encoder.dimension()];
        let table = encoder.neighborhoods(motif);
        for p in 0..table.len() {
            for (index, value) in table.anchored(p).iter() {
                weights[index as usize] += value;
            }
        }
        Scorer::from_model(
            LinearModel {
                weights,
                intercept: 0.0,
            },
            HyperParams::default(),
        )
    }

    #[test]
    fn profile_length_matches_sequence() {
        let encoder = FeatureEncoder::new(2, 12).unwrap();
        let scorer = scorer_favouring(&encoder, b"GGCC");
        assert_eq!(annotate(&scorer, &encoder, b"ACGTACGTAA").len(), 10);
        assert!(annotate(&scorer, &encoder, b"").is_empty());
    }

    #[test]
    fn favoured_structure_scores_higher() {
        let encoder = FeatureEncoder::new(2, 16).unwrap();
        let scorer = scorer_favouring(&encoder, b"GGCC");
        let profile = annotate(&scorer, &encoder, b"ATATGGCCATAT");
        let core = profile[4];
        assert!(profile[..3].iter().all(|&s| s < core));
        assert!(profile[9..].iter().all(|&s| s < core));
    }

    #[test]
    fn annotate_all_preserves_order() {
        let encoder = FeatureEncoder::new(2, 12).unwrap();
        let scorer = scorer_favouring(&encoder, b"ACGT");
        let seqs = load_sequences([("a", "ACGTAA"), ("b", "TTT"), ("c", "GGACGTGG")]);
        let profiles = annotate_all(&scorer, &encoder, &seqs);
        assert_eq!(profiles.len(), 3);
        for (seq, profile) in seqs.iter().zip(&profiles) {
            assert_eq!(profile, &annotate(&scorer, &encoder, seq.as_bytes()));
        }
    }

    #[test]
    fn zero_weights_score_the_intercept() {
        let encoder = FeatureEncoder::new(2, 8).unwrap();
        let scorer = Scorer::from_model(
            LinearModel {
                weights: vec![0.0; encoder.dimension()],
                intercept: -0.25,
            },
            HyperParams::default(),
        );
        let profile = annotate(&scorer, &encoder, b"ACGT");
        assert!(profile.iter().all(|&s| s == -0.25));
        assert_eq!(scorer.weights(), FeatureVector::new());
    }
}
