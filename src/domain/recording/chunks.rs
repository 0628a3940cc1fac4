//! Ordered chunk accumulation for a recording session

/// Binary fragments in the order the capture source delivered them.
#[derive(Debug, Default, Clone)]
pub struct ChunkBuffer {
    chunks: Vec<Vec<u8>>,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment. Empty fragments carry nothing and are skipped.
    pub fn push(&mut self, chunk: Vec<u8>) {
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total payload size
    pub fn byte_len(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// `c1 || c2 || ... || cn`, leaving the buffer empty
    pub fn concat(&mut self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for chunk in self.chunks.drain(..) {
            out.extend_from_slice(&chunk);
        }
        out
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_preserves_delivery_order() {
        let mut buffer = ChunkBuffer::new();
        buffer.push(vec![1, 2]);
        buffer.push(vec![3]);
        buffer.push(vec![4, 5, 6]);
        assert_eq!(buffer.byte_len(), 6);
        assert_eq!(buffer.concat(), vec![1, 2, 3, 4, 5, 6]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn empty_chunks_are_skipped() {
        let mut buffer = ChunkBuffer::new();
        buffer.push(vec![]);
        buffer.push(vec![7]);
        buffer.push(vec![]);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn clear_discards() {
        let mut buffer = ChunkBuffer::new();
        buffer.push(vec![1]);
        buffer.clear();
        assert!(buffer.concat().is_empty());
    }
}
