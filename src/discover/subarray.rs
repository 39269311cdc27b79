use super::{MotifError, MotifResult, Sequence};

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub sequence_id: usize,
    pub start: usize,
    pub end: usize,
    pub subsequence: String,
    pub score: f64,
}

impl Candidate {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubarrayBounds {
    pub min_size: usize,
    pub max_size: usize,
}

impl SubarrayBounds {
    pub fn new(min_size: usize, max_size: usize) -> MotifResult<Self> {
        if min_size == 0 {
            return Err(MotifError::ParameterError(
                "min_subarray_size must be at least 1".to_string(),
            ));
        }
        if min_size > max_size {
            return Err(MotifError::ParameterError(format!(
                "min_subarray_size ({}) is larger than max_subarray_size ({})",
                min_size, max_size
            )));
        }
        Ok(Self { min_size, max_size })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Window {
    start: usize,
    end: usize,
    sum: f64,
}

/// Repeatedly takes the best window over unclaimed positions. The first window
/// is always taken; later ones only while their sum stays positive.
pub fn extract_candidates(
    sequence: &Sequence,
    profile: &[f64],
    bounds: SubarrayBounds,
) -> Vec<Candidate> {
    let len = profile.len().min(sequence.len());
    if len < bounds.min_size {
        return Vec::new();
    }
    let profile = &profile[..len];

    let mut prefix = vec![0.0; len + 1];
    for (i, score) in profile.iter().enumerate() {
        prefix[i + 1] = prefix[i] + score;
    }
    let mut claimed = vec![false; len];
    let mut candidates = Vec::new();

    while let Some(window) = best_window(&prefix, &claimed, bounds) {
        if !candidates.is_empty() && window.sum <= 0.0 {
            break;
        }
        claimed[window.start..window.end].fill(true);
        let Some(subsequence) = sequence.slice(window.start, window.end) else {
            break;
        };
        candidates.push(Candidate {
            sequence_id: sequence.id,
            start: window.start,
            end: window.end,
            subsequence: subsequence.to_string(),
            score: window.sum,
        });
    }
    candidates
}

/// Leftmost, then shortest, among the windows of maximal sum that avoid
/// claimed positions.
fn best_window(prefix: &[f64], claimed: &[bool], bounds: SubarrayBounds) -> Option<Window> {
    let len = claimed.len();
    let mut best: Option<Window> = None;
    let mut start = 0;
    while start + bounds.min_size <= len {
        if claimed[start] {
            start += 1;
            continue;
        }
        // windows may not run into a claimed position
        let max_end = (start + bounds.max_size).min(len);
        let mut free_end = start + 1;
        while free_end < max_end && !claimed[free_end] {
            free_end += 1;
        }
        for end in (start + bounds.min_size)..=free_end {
            let sum = prefix[end] - prefix[start];
            if best.map_or(true, |b| sum > b.sum) {
                best = Some(Window { start, end, sum });
            }
        }
        start += 1;
    }
    best
}
