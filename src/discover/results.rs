//! Assembly of clustered candidates into the motif database and the
//! per-sequence views.

use super::{cluster::Labels, Candidate, Sequence};
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotifEntry {
    pub motif: String,
    pub count: usize,
}

/// Cluster id to its motifs, most frequent first.
pub type MotifDatabase = BTreeMap<usize, Vec<MotifEntry>>;

/// Cluster id to sorted half-open spans.
pub type SpanMap = BTreeMap<usize, Vec<(usize, usize)>>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiscoveryResult {
    pub motifs: MotifDatabase,
    /// Sorted cluster ids hit by each input sequence.
    pub cluster_hits: Vec<Vec<usize>>,
    pub positions: Vec<SpanMap>,
}

impl DiscoveryResult {
    pub fn num_clusters(&self) -> usize {
        self.motifs.len()
    }
}

/// Applies the cluster size and motif count filters, renumbers the surviving
/// clusters densely in order of first appearance, and records where their
/// originating candidates sit.
pub fn assemble(
    num_sequences: usize,
    candidates: &[Candidate],
    labels: &Labels,
    min_cluster_size: usize,
    min_motif_count: usize,
) -> DiscoveryResult {
    let mut members: Vec<(usize, Vec<&Candidate>)> = Vec::new();
    let mut slot_of: HashMap<usize, usize> = HashMap::new();
    for (candidate, label) in candidates.iter().zip(labels) {
        let Some(raw) = *label else {
            continue;
        };
        let slot = *slot_of.entry(raw).or_insert_with(|| {
            members.push((raw, Vec::new()));
            members.len() - 1
        });
        members[slot].1.push(candidate);
    }

    let mut motifs = MotifDatabase::new();
    let mut kept: HashMap<usize, (usize, Vec<String>)> = HashMap::new();
    for (raw, group) in members {
        if group.len() < min_cluster_size {
            continue;
        }
        let entries: Vec<MotifEntry> = group
            .iter()
            .map(|c| c.subsequence.as_str())
            .counts()
            .into_iter()
            .filter(|&(_, count)| count >= min_motif_count)
            .map(|(motif, count)| MotifEntry {
                motif: motif.to_string(),
                count,
            })
            .sorted_by(|a, b| b.count.cmp(&a.count).then_with(|| a.motif.cmp(&b.motif)))
            .collect();
        if entries.is_empty() {
            continue;
        }
        let id = motifs.len();
        let names = entries.iter().map(|e| e.motif.clone()).collect();
        kept.insert(raw, (id, names));
        motifs.insert(id, entries);
    }

    let mut positions = vec![SpanMap::new(); num_sequences];
    for (candidate, label) in candidates.iter().zip(labels) {
        let Some((id, names)) = (*label).and_then(|raw| kept.get(&raw)) else {
            continue;
        };
        if !names.contains(&candidate.subsequence) {
            continue;
        }
        if let Some(spans) = positions.get_mut(candidate.sequence_id) {
            spans
                .entry(*id)
                .or_default()
                .push((candidate.start, candidate.end));
        }
    }
    positions
        .iter_mut()
        .flat_map(|spans| spans.values_mut())
        .for_each(|spans| spans.sort_unstable());

    log::debug!(
        "Kept {} clusters with {} distinct motifs",
        motifs.len(),
        motifs.values().map(Vec::len).sum::<usize>()
    );

    let cluster_hits = hits_of(&positions);
    DiscoveryResult {
        motifs,
        cluster_hits,
        positions,
    }
}

/// Every occurrence of every database motif in each sequence, overlapping
/// matches included, compared case-insensitively.
pub fn scan_occurrences(motifs: &MotifDatabase, sequences: &[Sequence]) -> Vec<SpanMap> {
    sequences
        .iter()
        .map(|seq| {
            let haystack = seq.as_bytes();
            let mut spans = SpanMap::new();
            for (&id, entries) in motifs {
                let mut found: Vec<(usize, usize)> = entries
                    .iter()
                    .flat_map(|entry| occurrences(haystack, entry.motif.as_bytes()))
                    .collect();
                if found.is_empty() {
                    continue;
                }
                found.sort_unstable();
                found.dedup();
                spans.insert(id, found);
            }
            spans
        })
        .collect()
}

pub fn hits_of(positions: &[SpanMap]) -> Vec<Vec<usize>> {
    positions
        .iter()
        .map(|spans| spans.keys().copied().collect())
        .collect()
}

fn occurrences(haystack: &[u8], needle: &[u8]) -> Vec<(usize, usize)> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| window.eq_ignore_ascii_case(needle))
        .map(|(start, _)| (start, start + needle.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::load_sequences;

    fn candidate(sequence_id: usize, start: usize, motif: &str) -> Candidate {
        Candidate {
            sequence_id,
            start,
            end: start + motif.len(),
            subsequence: motif.to_string(),
            score: 1.0,
        }
    }

    #[test]
    fn renumbers_densely_in_order_of_appearance() {
        let candidates = vec![
            candidate(0, 0, "ACGT"),
            candidate(0, 6, "GGCC"),
            candidate(1, 2, "ACGT"),
            candidate(1, 8, "TTTT"),
        ];
        let labels = vec![Some(7), Some(3), Some(7), None];
        let result = assemble(2, &candidates, &labels, 1, 1);
        assert_eq!(result.motifs.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(
            result.motifs[&0],
            vec![MotifEntry {
                motif: "ACGT".into(),
                count: 2
            }]
        );
        assert_eq!(result.motifs[&1][0].motif, "GGCC");
        assert_eq!(result.cluster_hits, vec![vec![0, 1], vec![0]]);
        assert_eq!(result.positions[0][&1], vec![(6, 10)]);
        assert_eq!(result.positions[1][&0], vec![(2, 6)]);
    }

    #[test]
    fn small_clusters_and_rare_motifs_are_dropped() {
        let candidates = vec![
            candidate(0, 0, "AAAC"),
            candidate(0, 5, "AAAC"),
            candidate(1, 0, "AAAG"),
            candidate(1, 5, "CCCC"),
            candidate(2, 0, "GGGG"),
            candidate(2, 5, "GGGT"),
        ];
        let labels = vec![Some(0), Some(0), Some(0), Some(1), Some(2), Some(2)];
        let result = assemble(3, &candidates, &labels, 2, 2);
        // cluster 1 is too small, cluster 2 has no motif seen twice
        assert_eq!(result.num_clusters(), 1);
        assert_eq!(
            result.motifs[&0],
            vec![MotifEntry {
                motif: "AAAC".into(),
                count: 2
            }]
        );
        assert_eq!(result.cluster_hits, vec![vec![0], vec![], vec![]]);
        assert_eq!(result.positions[0][&0], vec![(0, 4), (5, 9)]);
    }

    #[test]
    fn entries_sort_by_count_then_motif() {
        let candidates = vec![
            candidate(0, 0, "TTTT"),
            candidate(0, 4, "CCCC"),
            candidate(0, 8, "AAAA"),
            candidate(0, 12, "CCCC"),
        ];
        let labels = vec![Some(0); 4];
        let result = assemble(1, &candidates, &labels, 1, 1);
        let motifs: Vec<&str> = result.motifs[&0].iter().map(|e| e.motif.as_str()).collect();
        assert_eq!(motifs, vec!["CCCC", "AAAA", "TTTT"]);
    }

    #[test]
    fn scan_finds_overlapping_occurrences() {
        let mut motifs = MotifDatabase::new();
        motifs.insert(
            0,
            vec![MotifEntry {
                motif: "AA".into(),
                count: 1,
            }],
        );
        motifs.insert(
            1,
            vec![MotifEntry {
                motif: "GC".into(),
                count: 1,
            }],
        );
        let seqs = load_sequences([("x", "AAAgc"), ("y", "TTT")]);
        let spans = scan_occurrences(&motifs, &seqs);
        assert_eq!(spans[0][&0], vec![(0, 2), (1, 3)]);
        assert_eq!(spans[0][&1], vec![(3, 5)]);
        assert!(spans[1].is_empty());
        assert_eq!(hits_of(&spans), vec![vec![0, 1], vec![]]);
    }
}
