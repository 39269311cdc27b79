use super::Sequence;
use rand::{seq::SliceRandom, Rng};

/// Shuffles blocks of `shuffle_order` symbols, keeping a trailing partial
/// block intact as one unit.
pub fn shuffle_blocks<R: Rng + ?Sized>(symbols: &str, shuffle_order: usize, rng: &mut R) -> String {
    let order = shuffle_order.max(1);
    let bytes = symbols.as_bytes();
    let mut blocks: Vec<&[u8]> = bytes.chunks(order).collect();
    blocks.shuffle(rng);
    let shuffled: Vec<u8> = blocks.concat();
    String::from_utf8_lossy(&shuffled).into_owned()
}

/// Generates `negative_ratio` decoys per positive sequence. Decoy ids continue
/// after the largest positive id.
pub fn generate_decoys<R: Rng + ?Sized>(
    positives: &[Sequence],
    negative_ratio: usize,
    shuffle_order: usize,
    rng: &mut R,
) -> Vec<Sequence> {
    let first_id = positives.iter().map(|s| s.id + 1).max().unwrap_or(0);
    let mut decoys = Vec::with_capacity(positives.len() * negative_ratio);
    for seq in positives {
        for k in 0..negative_ratio {
            let symbols = shuffle_blocks(&seq.symbols, shuffle_order, rng);
            let header = format!("{}_shuffled_{}", seq.header, k);
            decoys.push(Sequence::new(first_id + decoys.len(), header, symbols));
        }
    }
    decoys
}
