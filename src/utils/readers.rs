use super::Result;
use crate::discover::{load_sequences, Sequence};
use bio::io::fasta;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, Read as ioRead};
use std::path::Path;

pub fn open_fasta_reader(path: &Path) -> Result<BufReader<Box<dyn ioRead>>> {
    fn is_gzipped(path: &Path) -> bool {
        let path_str = path.to_string_lossy().to_lowercase();
        path_str.ends_with(".gz") || path_str.ends_with(".gzip")
    }
    let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    if is_gzipped(path) {
        let gz_decoder = MultiGzDecoder::new(file);
        if gz_decoder.header().is_some() {
            Ok(BufReader::new(Box::new(gz_decoder)))
        } else {
            Err(format!("Invalid gzip header: {}", path.to_string_lossy()))
        }
    } else {
        Ok(BufReader::new(Box::new(file)))
    }
}

/// Loads every record of a (possibly gzipped) FASTA file, in file order.
pub fn read_fasta(path: &Path) -> Result<Vec<Sequence>> {
    let reader = fasta::Reader::from_bufread(open_fasta_reader(path)?);
    let mut pairs = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| format!("{}: {}", path.display(), e))?;
        record
            .check()
            .map_err(|e| format!("{}: record {}: {}", path.display(), record.id(), e))?;
        let symbols = String::from_utf8_lossy(record.seq()).into_owned();
        pairs.push((record.id().to_string(), symbols));
    }
    log::debug!("Loaded {} sequences from {}", pairs.len(), path.display());
    Ok(load_sequences(pairs))
}
