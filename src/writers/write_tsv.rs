use crate::discover::{MotifDatabase, Sequence};
use crate::utils::Result;
use itertools::Itertools;
use std::io::Write;

/// One `cluster_id  count  motif` line per database entry.
pub fn write_motifs<W: Write>(writer: &mut W, motifs: &MotifDatabase) -> Result<()> {
    writeln!(writer, "#cluster_id\tcount\tmotif").map_err(|e| e.to_string())?;
    for (id, entries) in motifs {
        for entry in entries {
            writeln!(writer, "{}\t{}\t{}", id, entry.count, entry.motif)
                .map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

/// One `header  ids` line per sequence; sequences without hits get `.`.
pub fn write_hits<W: Write>(
    writer: &mut W,
    sequences: &[Sequence],
    hits: &[Vec<usize>],
) -> Result<()> {
    writeln!(writer, "#header\tcluster_ids").map_err(|e| e.to_string())?;
    for (seq, ids) in sequences.iter().zip(hits) {
        let ids = if ids.is_empty() {
            ".".to_string()
        } else {
            ids.iter().join(",")
        };
        writeln!(writer, "{}\t{}", seq.header, ids).map_err(|e| e.to_string())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::{load_sequences, MotifEntry};

    #[test]
    fn motif_table_lists_entries_by_cluster() {
        let mut motifs = MotifDatabase::new();
        motifs.insert(
            0,
            vec![
                MotifEntry {
                    motif: "GGGGCC".into(),
                    count: 2,
                },
                MotifEntry {
                    motif: "GGGCCC".into(),
                    count: 1,
                },
            ],
        );
        motifs.insert(
            1,
            vec![MotifEntry {
                motif: "ACGT".into(),
                count: 3,
            }],
        );
        let mut out = Vec::new();
        write_motifs(&mut out, &motifs).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "#cluster_id\tcount\tmotif\n0\t2\tGGGGCC\n0\t1\tGGGCCC\n1\t3\tACGT\n"
        );
    }

    #[test]
    fn hits_table_joins_ids() {
        let seqs = load_sequences([("s1", "ACGT"), ("s2", "GG")]);
        let mut out = Vec::new();
        write_hits(&mut out, &seqs, &[vec![0, 2], vec![]]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "#header\tcluster_ids\ns1\t0,2\ns2\t.\n"
        );
    }
}
