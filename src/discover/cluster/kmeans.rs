use super::Labels;
use crate::discover::{FeatureVector, MotifError, MotifResult};
use rand::Rng;

const BATCH_SIZE: usize = 256;
const MAX_BATCHES: usize = 1000;
const MAX_NO_IMPROVEMENT: usize = 10;
const CENTER_SHIFT_TOL: f64 = 1e-3;

/// Mini-batch k-means with k-means++ seeding. Every point is labelled with its
/// nearest final centre.
pub fn mini_batch_kmeans<R: Rng + ?Sized>(
    vectors: &[FeatureVector],
    n_clusters: usize,
    rng: &mut R,
) -> MotifResult<Labels> {
    if n_clusters == 0 {
        return Err(MotifError::ParameterError(
            "n_clusters must be at least 1".into(),
        ));
    }
    if vectors.len() < n_clusters {
        return Err(MotifError::ClusteringError(format!(
            "{} candidates cannot be split into {} clusters",
            vectors.len(),
            n_clusters
        )));
    }

    let mut centers = kmeans_plus_plus(vectors, n_clusters, rng);
    let mut counts = vec![0_usize; n_clusters];
    let batch_size = BATCH_SIZE.min(vectors.len());
    let smoothing = batch_size as f64 / vectors.len() as f64;

    let mut ewa_inertia: Option<f64> = None;
    let mut best_inertia = f64::INFINITY;
    let mut no_improvement = 0;
    let mut converged = false;

    for batch_index in 0..MAX_BATCHES {
        let batch: Vec<usize> = (0..batch_size)
            .map(|_| rng.random_range(0..vectors.len()))
            .collect();

        let mut inertia = 0.0;
        let mut assignments = Vec::with_capacity(batch.len());
        for &i in &batch {
            let (center, dist_sq) = nearest(&centers, &vectors[i]);
            inertia += dist_sq;
            assignments.push(center);
        }
        inertia /= batch_size as f64;

        let previous = centers.clone();
        for (&i, &center) in batch.iter().zip(&assignments) {
            counts[center] += 1;
            let rate = 1.0 / counts[center] as f64;
            centers[center] = centers[center]
                .scaled(1.0 - rate)
                .add_scaled(&vectors[i], rate);
        }
        let shift = previous
            .iter()
            .zip(&centers)
            .map(|(a, b)| a.squared_distance(b))
            .sum::<f64>()
            / n_clusters as f64;

        let ewa = match ewa_inertia {
            Some(prev) => prev * (1.0 - smoothing) + inertia * smoothing,
            None => inertia,
        };
        ewa_inertia = Some(ewa);
        log::trace!(
            "Mini-batch {}: inertia {:.5}, centre shift {:.5}",
            batch_index,
            ewa,
            shift
        );

        if shift <= CENTER_SHIFT_TOL {
            converged = true;
            break;
        }
        if ewa < best_inertia {
            best_inertia = ewa;
            no_improvement = 0;
        } else {
            no_improvement += 1;
            if no_improvement >= MAX_NO_IMPROVEMENT {
                converged = true;
                break;
            }
        }
    }

    if !converged {
        return Err(MotifError::ClusteringError(format!(
            "mini-batch k-means did not converge within {} batches",
            MAX_BATCHES
        )));
    }

    Ok(vectors
        .iter()
        .map(|v| Some(nearest(&centers, v).0))
        .collect())
}

fn nearest(centers: &[FeatureVector], vector: &FeatureVector) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (index, center) in centers.iter().enumerate() {
        let dist_sq = center.squared_distance(vector);
        if dist_sq < best.1 {
            best = (index, dist_sq);
        }
    }
    best
}

/// Picks each next centre with probability proportional to its squared
/// distance from the closest centre chosen so far.
fn kmeans_plus_plus<R: Rng + ?Sized>(
    vectors: &[FeatureVector],
    n_clusters: usize,
    rng: &mut R,
) -> Vec<FeatureVector> {
    let mut centers = Vec::with_capacity(n_clusters);
    centers.push(vectors[rng.random_range(0..vectors.len())].clone());
    let mut closest: Vec<f64> = vectors
        .iter()
        .map(|v| v.squared_distance(&centers[0]))
        .collect();

    while centers.len() < n_clusters {
        let total: f64 = closest.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.random_range(0.0..total);
            let mut pick = vectors.len() - 1;
            for (index, &weight) in closest.iter().enumerate() {
                if target < weight {
                    pick = index;
                    break;
                }
                target -= weight;
            }
            pick
        } else {
            rng.random_range(0..vectors.len())
        };
        let center = vectors[pick].clone();
        for (dist, v) in closest.iter_mut().zip(vectors) {
            *dist = dist.min(v.squared_distance(&center));
        }
        centers.push(center);
    }
    centers
}
