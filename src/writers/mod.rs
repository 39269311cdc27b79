//! Tab-separated and BED views of a discovery run.

mod write_bed;
mod write_tsv;

pub use write_bed::write_positions;
pub use write_tsv::{write_hits, write_motifs};
