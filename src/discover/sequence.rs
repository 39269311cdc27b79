#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub id: usize,
    pub header: String,
    pub symbols: String,
}

impl Sequence {
    pub fn new(id: usize, header: impl Into<String>, symbols: impl Into<String>) -> Self {
        Self {
            id,
            header: header.into(),
            symbols: symbols.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.symbols.as_bytes()
    }

    /// Slice of the original symbols, `None` when the span is out of bounds.
    pub fn slice(&self, start: usize, end: usize) -> Option<&str> {
        self.symbols.get(start..end)
    }
}

/// Assigns ids in insertion order.
pub fn load_sequences<I, H, S>(pairs: I) -> Vec<Sequence>
where
    I: IntoIterator<Item = (H, S)>,
    H: Into<String>,
    S: Into<String>,
{
    pairs
        .into_iter()
        .enumerate()
        .map(|(id, (header, symbols))| Sequence::new(id, header, symbols))
        .collect()
}
