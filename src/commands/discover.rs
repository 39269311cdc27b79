use crate::cli::DiscoverArgs;
use crate::discover::MotifDiscovery;
use crate::utils::{create_writer, read_fasta, Result};
use crate::writers::{write_hits, write_motifs, write_positions};
use std::io::Write;

pub fn discover(args: DiscoverArgs) -> Result<()> {
    let params = args.discovery_params();
    let pipeline = MotifDiscovery::new(params).map_err(|e| e.to_string())?;

    let sequences = read_fasta(&args.input_path)?;
    log::info!(
        "Loaded {} sequences from {}",
        sequences.len(),
        args.input_path.display()
    );

    let fitted = pipeline.fit(&sequences).map_err(|e| e.to_string())?;
    let result = fitted.result();
    log::info!(
        "Found {} clusters from {} candidates",
        result.num_clusters(),
        fitted.candidates().len()
    );

    let mut motif_writer = create_writer(&args.output_prefix, "motifs.tsv")?;
    write_motifs(&mut motif_writer, &result.motifs)?;
    motif_writer.flush().map_err(|e| e.to_string())?;

    let mut hits_writer = create_writer(&args.output_prefix, "hits.tsv")?;
    write_hits(&mut hits_writer, &sequences, &result.cluster_hits)?;
    hits_writer.flush().map_err(|e| e.to_string())?;

    let mut bed_writer = create_writer(&args.output_prefix, "positions.bed")?;
    write_positions(&mut bed_writer, &sequences, &result.positions)?;
    bed_writer.flush().map_err(|e| e.to_string())?;

    Ok(())
}
