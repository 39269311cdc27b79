//! Motif discovery core: decoys, hashed features, a discriminative scorer,
//! per-position importance, candidate extraction, clustering and assembly.

pub mod cluster;
pub mod decoy;
mod error;
pub mod features;
pub mod importance;
mod params;
pub mod results;
pub mod scorer;
mod sequence;
pub mod subarray;
pub mod workflows;

pub use cluster::ClusteringAlgorithm;
pub use decoy::generate_decoys;
pub use error::{MotifError, MotifResult};
pub use features::{FeatureEncoder, FeatureVector};
pub use params::DiscoveryParams;
pub use results::{DiscoveryResult, MotifDatabase, MotifEntry, SpanMap};
pub use scorer::{LinearModel, Scorer};
pub use sequence::{load_sequences, Sequence};
pub use subarray::{Candidate, SubarrayBounds};
pub use workflows::{FittedMotifDiscovery, MotifDiscovery};
