use crate::discover::{Sequence, SpanMap};
use crate::utils::Result;
use std::io::Write;

/// BED records of every reported span, ordered by sequence, then start.
pub fn write_positions<W: Write>(
    writer: &mut W,
    sequences: &[Sequence],
    positions: &[SpanMap],
) -> Result<()> {
    writeln!(writer, "#header\tstart\tend\tcluster").map_err(|e| e.to_string())?;
    for (seq, spans) in sequences.iter().zip(positions) {
        let mut records: Vec<(usize, usize, usize)> = spans
            .iter()
            .flat_map(|(&id, ranges)| ranges.iter().map(move |&(start, end)| (start, end, id)))
            .collect();
        records.sort_unstable();
        for (start, end, id) in records {
            writeln!(writer, "{}\t{}\t{}\tcluster_{}", seq.header, start, end, id)
                .map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}
