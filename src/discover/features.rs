//! Hashed neighbourhood-pair features over a sequence viewed as a path graph.
//!
//! A feature pairs the neighbourhood of radius `r` rooted at position `u` with
//! the neighbourhood of the same radius rooted at `v = u + d`, for every
//! `r < complexity` and `d <= complexity`. Neighbourhood hashes are computed
//! once per sequence in a [`NeighborhoodTable`] and shared by the
//! whole-sequence and the position-anchored encodings.

use super::{MotifError, MotifResult};
use rayon::prelude::*;
use std::cmp::Ordering;

pub const MAX_NBITS: u32 = 30;

const NEIGHBORHOOD_SEED: u64 = 0x5EED_0F_5E9;
const END_OF_SEQUENCE: u64 = 256;

/// Sparse vector sorted by feature index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureVector {
    indices: Vec<u32>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sums duplicate indices and drops zero entries.
    pub fn from_pairs(mut pairs: Vec<(u32, f64)>) -> Self {
        pairs.sort_unstable_by_key(|&(index, _)| index);
        let mut indices: Vec<u32> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f64> = Vec::with_capacity(pairs.len());
        for (index, value) in pairs {
            match (indices.last(), values.last_mut()) {
                (Some(&last), Some(acc)) if last == index => *acc += value,
                _ => {
                    indices.push(index);
                    values.push(value);
                }
            }
        }
        let (indices, values) = indices
            .into_iter()
            .zip(values)
            .filter(|&(_, value)| value != 0.0)
            .unzip();
        Self { indices, values }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn get(&self, index: u32) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    pub fn norm_sq(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }

    pub fn norm(&self) -> f64 {
        self.norm_sq().sqrt()
    }

    pub fn normalized(mut self) -> Self {
        let norm = self.norm();
        if norm > 0.0 {
            self.values.iter_mut().for_each(|v| *v /= norm);
        }
        self
    }

    pub fn scaled(&self, factor: f64) -> Self {
        if factor == 0.0 {
            return Self::new();
        }
        Self {
            indices: self.indices.clone(),
            values: self.values.iter().map(|v| v * factor).collect(),
        }
    }

    pub fn dot(&self, other: &FeatureVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Dot product against a dense weight vector; indices past its end count as zero.
    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        self.iter()
            .filter_map(|(index, value)| dense.get(index as usize).map(|w| w * value))
            .sum()
    }

    /// `self + factor * other`
    pub fn add_scaled(&self, other: &FeatureVector, factor: f64) -> Self {
        let mut indices = Vec::with_capacity(self.len() + other.len());
        let mut values = Vec::with_capacity(self.len() + other.len());
        let (mut i, mut j) = (0, 0);
        while i < self.len() || j < other.len() {
            let ordering = match (self.indices.get(i), other.indices.get(j)) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => Ordering::Less,
                _ => Ordering::Greater,
            };
            let (index, value) = match ordering {
                Ordering::Less => {
                    i += 1;
                    (self.indices[i - 1], self.values[i - 1])
                }
                Ordering::Greater => {
                    j += 1;
                    (other.indices[j - 1], factor * other.values[j - 1])
                }
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                    (
                        self.indices[i - 1],
                        self.values[i - 1] + factor * other.values[j - 1],
                    )
                }
            };
            if value != 0.0 {
                indices.push(index);
                values.push(value);
            }
        }
        Self { indices, values }
    }

    pub fn squared_distance(&self, other: &FeatureVector) -> f64 {
        (self.norm_sq() + other.norm_sq() - 2.0 * self.dot(other)).max(0.0)
    }

    pub fn distance(&self, other: &FeatureVector) -> f64 {
        self.squared_distance(other).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureEncoder {
    complexity: usize,
    nbits: u32,
}

impl FeatureEncoder {
    pub fn new(complexity: usize, nbits: u32) -> MotifResult<Self> {
        if complexity == 0 {
            return Err(MotifError::ParameterError(
                "complexity must be at least 1".to_string(),
            ));
        }
        if nbits == 0 || nbits > MAX_NBITS {
            return Err(MotifError::ParameterError(format!(
                "nbits must be between 1 and {}, got {}",
                MAX_NBITS, nbits
            )));
        }
        Ok(Self { complexity, nbits })
    }

    pub fn complexity(&self) -> usize {
        self.complexity
    }

    pub fn nbits(&self) -> u32 {
        self.nbits
    }

    pub fn dimension(&self) -> usize {
        1 << self.nbits
    }

    pub fn neighborhoods(&self, symbols: &[u8]) -> NeighborhoodTable {
        NeighborhoodTable::new(*self, symbols)
    }

    /// Whole-sequence encoding, L2-normalised.
    pub fn encode(&self, symbols: &[u8]) -> FeatureVector {
        self.neighborhoods(symbols).whole()
    }

    /// Encodes in parallel on the current rayon pool, preserving input order.
    pub fn encode_batch<S>(&self, seqs: &[S]) -> Vec<FeatureVector>
    where
        S: AsRef<[u8]> + Sync,
    {
        seqs.par_iter().map(|s| self.encode(s.as_ref())).collect()
    }

    fn feature_index(&self, radius: usize, distance: usize, root: u64, other: u64) -> u32 {
        let hash = mix(mix(mix(radius as u64, distance as u64), root), other);
        (hash & ((1_u64 << self.nbits) - 1)) as u32
    }
}

/// Neighbourhood hashes of one sequence, `complexity` radii per position.
pub struct NeighborhoodTable {
    encoder: FeatureEncoder,
    len: usize,
    hashes: Vec<u64>,
}

impl NeighborhoodTable {
    fn new(encoder: FeatureEncoder, symbols: &[u8]) -> Self {
        let radii = encoder.complexity;
        let len = symbols.len();
        let mut hashes = vec![0_u64; len * radii];
        for u in 0..len {
            let mut hash = NEIGHBORHOOD_SEED;
            for r in 0..radii {
                // truncated neighbourhoods hash apart from full-length ones
                let symbol = symbols
                    .get(u + r)
                    .map_or(END_OF_SEQUENCE, |b| b.to_ascii_uppercase() as u64);
                hash = mix(hash, symbol);
                hashes[u * radii + r] = hash;
            }
        }
        Self {
            encoder,
            len,
            hashes,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn hash(&self, position: usize, radius: usize) -> u64 {
        self.hashes[position * self.encoder.complexity + radius]
    }

    fn push_rooted(&self, root: usize, out: &mut Vec<(u32, f64)>) {
        let complexity = self.encoder.complexity;
        for radius in 0..complexity {
            let root_hash = self.hash(root, radius);
            for distance in 0..=complexity {
                let other = root + distance;
                if other >= self.len {
                    break;
                }
                let index = self.encoder.feature_index(
                    radius,
                    distance,
                    root_hash,
                    self.hash(other, radius),
                );
                out.push((index, 1.0));
            }
        }
    }

    /// Features rooted at `position`, L2-normalised.
    pub fn anchored(&self, position: usize) -> FeatureVector {
        if position >= self.len {
            return FeatureVector::new();
        }
        let complexity = self.encoder.complexity;
        let mut pairs = Vec::with_capacity(complexity * (complexity + 1));
        self.push_rooted(position, &mut pairs);
        FeatureVector::from_pairs(pairs).normalized()
    }

    pub fn whole(&self) -> FeatureVector {
        let complexity = self.encoder.complexity;
        let mut pairs = Vec::with_capacity(self.len * complexity * (complexity + 1));
        for root in 0..self.len {
            self.push_rooted(root, &mut pairs);
        }
        FeatureVector::from_pairs(pairs).normalized()
    }
}

#[inline]
fn mix(seed: u64, value: u64) -> u64 {
    let mut z = seed
        ^ value
            .wrapping_add(0x9E37_79B9_7F4A_7C15)
            .wrapping_add(seed << 6)
            .wrapping_add(seed >> 2);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn from_pairs_merges_duplicates_and_drops_zeros() {
        let v = FeatureVector::from_pairs(vec![(5, 1.0), (2, 2.0), (5, 0.5), (7, 1.0), (7, -1.0)]);
        assert_eq!(v.iter().collect::<Vec<_>>(), vec![(2, 2.0), (5, 1.5)]);
        assert_eq!(v.get(5), 1.5);
        assert_eq!(v.get(7), 0.0);
    }

    #[test]
    fn dot_and_distance() {
        let a = FeatureVector::from_pairs(vec![(0, 3.0), (4, 4.0)]);
        let b = FeatureVector::from_pairs(vec![(4, 1.0), (9, 2.0)]);
        assert!(approx(a.dot(&b), 4.0));
        assert!(approx(a.norm(), 5.0));
        assert!(approx(a.squared_distance(&a), 0.0));
        assert!(approx(a.squared_distance(&b), 9.0 + 9.0 + 4.0));
        assert!(approx(a.dot_dense(&[1.0, 0.0, 0.0, 0.0, 0.5]), 5.0));
    }

    #[test]
    fn add_scaled_merges_supports() {
        let a = FeatureVector::from_pairs(vec![(1, 1.0), (3, 2.0)]);
        let b = FeatureVector::from_pairs(vec![(3, 4.0), (8, 1.0)]);
        let c = a.add_scaled(&b, -0.5);
        assert_eq!(c.iter().collect::<Vec<_>>(), vec![(1, 1.0), (8, -0.5)]);
    }

    #[test]
    fn encoder_rejects_bad_parameters() {
        assert!(matches!(
            FeatureEncoder::new(0, 10),
            Err(MotifError::ParameterError(_))
        ));
        assert!(FeatureEncoder::new(2, 0).is_err());
        assert!(FeatureEncoder::new(2, MAX_NBITS + 1).is_err());
        assert_eq!(FeatureEncoder::new(2, 10).unwrap().dimension(), 1024);
    }

    #[test]
    fn encoding_is_deterministic_and_normalised() {
        let encoder = FeatureEncoder::new(3, 16).unwrap();
        let a = encoder.encode(b"ACGTTGCAAC");
        let b = encoder.encode(b"ACGTTGCAAC");
        assert_eq!(a, b);
        assert!(approx(a.norm(), 1.0));
        assert!(a.iter().all(|(index, _)| (index as usize) < encoder.dimension()));
    }

    #[test]
    fn encoding_ignores_case() {
        let encoder = FeatureEncoder::new(3, 16).unwrap();
        assert_eq!(encoder.encode(b"acgtTG"), encoder.encode(b"ACGTTG"));
    }

    #[test]
    fn shared_local_structure_shares_anchored_features() {
        // with complexity 2 the features rooted at u only see symbols u..u+4
        let encoder = FeatureEncoder::new(2, 18).unwrap();
        let left = encoder.neighborhoods(b"TTACGTAA");
        let right = encoder.neighborhoods(b"GGACGTCC");
        assert_eq!(left.anchored(2), right.anchored(2));
        assert_ne!(left.anchored(1), right.anchored(1));
    }

    #[test]
    fn different_sequences_encode_differently() {
        let encoder = FeatureEncoder::new(3, 20).unwrap();
        let a = encoder.encode(b"AAAAGGGG");
        let b = encoder.encode(b"CCCCTTTT");
        assert!(a.dot(&b) < 0.5);
    }

    #[test]
    fn anchored_vectors_cover_every_position() {
        let encoder = FeatureEncoder::new(2, 16).unwrap();
        let table = encoder.neighborhoods(b"ACGTA");
        assert_eq!(table.len(), 5);
        for p in 0..5 {
            assert!(approx(table.anchored(p).norm(), 1.0));
        }
        assert!(table.anchored(5).is_empty());
        assert!(encoder.encode(b"").is_empty());
    }

    #[test]
    fn batch_encoding_preserves_order() {
        let encoder = FeatureEncoder::new(2, 16).unwrap();
        let seqs = vec!["ACGT", "GGCC", "TTAA"];
        let batch = encoder.encode_batch(&seqs);
        for (seq, vector) in seqs.iter().zip(batch.iter()) {
            assert_eq!(&encoder.encode(seq.as_bytes()), vector);
        }
    }
}
