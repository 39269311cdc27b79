mod motif_discovery;

pub use motif_discovery::{FittedMotifDiscovery, MotifDiscovery};
