//! BIRCH: a height-balanced tree of clustering features (CFs). Points are
//! absorbed into the closest leaf subcluster while its radius stays within
//! `threshold`; overflowing nodes split around their farthest pair of entries.
//! The leaf subclusters are finally merged by an average-linkage dendrogram
//! over their centroids cut at the same threshold.

use super::Labels;
use crate::discover::FeatureVector;
use kodama::{linkage, Method};

/// `(n, linear sum, squared sum)` summary of a set of points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClusteringFeature {
    pub n: usize,
    pub ls: FeatureVector,
    pub ss: f64,
}

impl ClusteringFeature {
    pub fn from_point(point: &FeatureVector) -> Self {
        Self {
            n: 1,
            ls: point.clone(),
            ss: point.norm_sq(),
        }
    }

    pub fn merge(&mut self, other: &ClusteringFeature) {
        self.n += other.n;
        self.ls = self.ls.add_scaled(&other.ls, 1.0);
        self.ss += other.ss;
    }

    pub fn centroid(&self) -> FeatureVector {
        if self.n == 0 {
            return FeatureVector::new();
        }
        self.ls.scaled(1.0 / self.n as f64)
    }

    /// RMS distance of the points from the centroid.
    pub fn radius(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        let n = self.n as f64;
        (self.ss / n - self.ls.norm_sq() / (n * n)).max(0.0).sqrt()
    }

    /// Radius the subcluster would have after absorbing `point`.
    fn radius_with(&self, point: &FeatureVector) -> f64 {
        let n = (self.n + 1) as f64;
        let ls = self.ls.add_scaled(point, 1.0);
        let ss = self.ss + point.norm_sq();
        (ss / n - ls.norm_sq() / (n * n)).max(0.0).sqrt()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    cf: ClusteringFeature,
    centroid: FeatureVector,
    child: Option<Box<Node>>,
    members: Vec<usize>,
}

impl Entry {
    fn leaf(index: usize, point: &FeatureVector) -> Self {
        Self {
            cf: ClusteringFeature::from_point(point),
            centroid: point.clone(),
            child: None,
            members: vec![index],
        }
    }

    fn internal(child: Node) -> Self {
        let mut cf = ClusteringFeature::default();
        for entry in &child.entries {
            cf.merge(&entry.cf);
        }
        Self {
            centroid: cf.centroid(),
            cf,
            child: Some(Box::new(child)),
            members: Vec::new(),
        }
    }

    fn absorb(&mut self, index: usize, point: &FeatureVector) {
        self.cf.merge(&ClusteringFeature::from_point(point));
        self.centroid = self.cf.centroid();
        self.members.push(index);
    }
}

#[derive(Debug, Clone)]
struct Node {
    is_leaf: bool,
    entries: Vec<Entry>,
}

impl Node {
    fn closest(&self, point: &FeatureVector) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, entry) in self.entries.iter().enumerate() {
            let dist_sq = entry.centroid.squared_distance(point);
            if best.map_or(true, |(_, d)| dist_sq < d) {
                best = Some((index, dist_sq));
            }
        }
        best.map(|(index, _)| index)
    }

    /// Inserts a point; returns the two halves when this node overflowed.
    fn insert(
        &mut self,
        index: usize,
        point: &FeatureVector,
        params: &TreeParams,
    ) -> Option<(Node, Node)> {
        let closest = self.closest(point);
        if self.is_leaf {
            match closest {
                Some(i) if self.entries[i].cf.radius_with(point) <= params.threshold => {
                    self.entries[i].absorb(index, point);
                }
                _ => self.entries.push(Entry::leaf(index, point)),
            }
        } else if let Some(i) = closest {
            let split = match self.entries[i].child.as_mut() {
                Some(child) => child.insert(index, point, params),
                None => None,
            };
            match split {
                Some((left, right)) => {
                    self.entries.remove(i);
                    self.entries.push(Entry::internal(left));
                    self.entries.push(Entry::internal(right));
                }
                None => {
                    let entry = &mut self.entries[i];
                    entry.cf.merge(&ClusteringFeature::from_point(point));
                    entry.centroid = entry.cf.centroid();
                }
            }
        }

        if self.entries.len() > params.branching_factor {
            Some(self.split())
        } else {
            None
        }
    }

    fn split(&mut self) -> (Node, Node) {
        let entries = std::mem::take(&mut self.entries);
        let (mut seed_a, mut seed_b, mut farthest) = (0, 1, f64::NEG_INFINITY);
        for a in 0..entries.len() {
            for b in (a + 1)..entries.len() {
                let dist_sq = entries[a].centroid.squared_distance(&entries[b].centroid);
                if dist_sq > farthest {
                    (seed_a, seed_b, farthest) = (a, b, dist_sq);
                }
            }
        }

        let centroid_a = entries[seed_a].centroid.clone();
        let centroid_b = entries[seed_b].centroid.clone();
        let mut left = Node {
            is_leaf: self.is_leaf,
            entries: Vec::new(),
        };
        let mut right = left.clone();
        for (i, entry) in entries.into_iter().enumerate() {
            let to_left = if i == seed_a {
                true
            } else if i == seed_b {
                false
            } else {
                entry.centroid.squared_distance(&centroid_a)
                    <= entry.centroid.squared_distance(&centroid_b)
            };
            if to_left {
                left.entries.push(entry);
            } else {
                right.entries.push(entry);
            }
        }
        (left, right)
    }

    fn collect_leaves(self, leaves: &mut Vec<Entry>) {
        for mut entry in self.entries {
            match entry.child.take() {
                Some(child) => child.collect_leaves(leaves),
                None => leaves.push(entry),
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TreeParams {
    threshold: f64,
    branching_factor: usize,
}

pub fn birch(vectors: &[FeatureVector], threshold: f64, branching_factor: usize) -> Labels {
    let params = TreeParams {
        threshold,
        branching_factor: branching_factor.max(2),
    };
    let mut root = Node {
        is_leaf: true,
        entries: Vec::new(),
    };
    for (index, point) in vectors.iter().enumerate() {
        if let Some((left, right)) = root.insert(index, point, &params) {
            root = Node {
                is_leaf: false,
                entries: vec![Entry::internal(left), Entry::internal(right)],
            };
        }
    }

    let mut leaves = Vec::new();
    root.collect_leaves(&mut leaves);
    log::trace!("BIRCH tree holds {} leaf subclusters", leaves.len());

    let centroids: Vec<FeatureVector> = leaves.iter().map(|leaf| leaf.centroid.clone()).collect();
    let groups = merge_subclusters(&centroids, threshold);

    let mut labels: Labels = vec![None; vectors.len()];
    for (leaf, group) in leaves.iter().zip(groups) {
        for &member in &leaf.members {
            labels[member] = Some(group);
        }
    }
    labels
}

/// Average-linkage dendrogram over subcluster centroids, cut at `cutoff`.
/// Returns one group id per subcluster.
fn merge_subclusters(centroids: &[FeatureVector], cutoff: f64) -> Vec<usize> {
    let num_points = centroids.len();
    if num_points < 2 {
        return vec![0; num_points];
    }

    let mut dists = Vec::with_capacity(num_points * (num_points - 1) / 2);
    for a in 0..num_points {
        for b in (a + 1)..num_points {
            dists.push(centroids[a].distance(&centroids[b]));
        }
    }
    let dendrogram = linkage(&mut dists, num_points, Method::Average);

    let mut num_groups = 0;
    let mut membership = vec![None; 2 * num_points - 1];
    for (cluster_index, step) in dendrogram.steps().iter().enumerate().rev() {
        let cluster = cluster_index + num_points;
        if step.dissimilarity <= cutoff {
            if membership[cluster].is_none() {
                membership[cluster] = Some(num_groups);
                num_groups += 1;
            }
            membership[step.cluster1] = membership[cluster];
            membership[step.cluster2] = membership[cluster];
        }
    }

    membership
        .into_iter()
        .take(num_points)
        .map(|group| {
            group.unwrap_or_else(|| {
                num_groups += 1;
                num_groups - 1
            })
        })
        .collect()
}
