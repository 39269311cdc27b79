use super::Labels;
use crate::discover::FeatureVector;

/// Density-based clustering. A point is a core point when at least
/// `min_samples` points, itself included, lie within `eps`. Noise stays `None`.
pub fn dbscan(vectors: &[FeatureVector], eps: f64, min_samples: usize) -> Labels {
    let mut labels: Labels = vec![None; vectors.len()];
    let mut visited = vec![false; vectors.len()];
    let eps_sq = eps * eps;
    let mut cluster_id = 0;

    for point in 0..vectors.len() {
        if visited[point] {
            continue;
        }
        visited[point] = true;
        let mut neighbors = region_query(vectors, point, eps_sq);
        if neighbors.len() < min_samples {
            continue;
        }
        labels[point] = Some(cluster_id);
        let mut i = 0;
        while i < neighbors.len() {
            let neighbor = neighbors[i];
            if !visited[neighbor] {
                visited[neighbor] = true;
                let expansion = region_query(vectors, neighbor, eps_sq);
                if expansion.len() >= min_samples {
                    neighbors.extend(expansion);
                }
            }
            if labels[neighbor].is_none() {
                labels[neighbor] = Some(cluster_id);
            }
            i += 1;
        }
        cluster_id += 1;
    }
    log::trace!("DBSCAN found {} clusters", cluster_id);
    labels
}

fn region_query(vectors: &[FeatureVector], point: usize, eps_sq: f64) -> Vec<usize> {
    vectors
        .iter()
        .enumerate()
        .filter(|(_, other)| vectors[point].squared_distance(other) <= eps_sq)
        .map(|(index, _)| index)
        .collect()
}
