use crate::utils::Result;
use std::{fs::File, io::BufWriter};

/// Opens `<output_prefix>.<output_suffix>` for buffered writing.
pub fn create_writer(output_prefix: &str, output_suffix: &str) -> Result<BufWriter<File>> {
    let output_path = format!("{}.{}", output_prefix, output_suffix);
    let file = File::create(&output_path)
        .map_err(|e| format!("Failed to create {}: {}", output_path, e))?;
    Ok(BufWriter::new(file))
}
