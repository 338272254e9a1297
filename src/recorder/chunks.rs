use bytes::Bytes;

/// An opaque piece of an in-progress media container stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment(Bytes);

impl Fragment {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Bytes> for Fragment {
    fn from(data: Bytes) -> Self {
        Self(data)
    }
}

impl From<Vec<u8>> for Fragment {
    fn from(data: Vec<u8>) -> Self {
        Self(Bytes::from(data))
    }
}

/// Ordered, append-only sequence of fragments from a recording
///
/// Fragments keep their arrival order and are never mutated once accepted.
/// Empty fragments are rejected.
#[derive(Debug, Clone, Default)]
pub struct ChunkSequence {
    fragments: Vec<Fragment>,
    total_bytes: usize,
}

impl ChunkSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment, returning whether it was accepted
    pub fn append(&mut self, fragment: Fragment) -> bool {
        if fragment.is_empty() {
            return false;
        }

        self.total_bytes += fragment.len();
        self.fragments.push(fragment);
        true
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn reset(&mut self) {
        self.fragments.clear();
        self.total_bytes = 0;
    }
}
