use ndarray::Array1;

/// Per-word embedding lookup consumed by the [`Vectorizer`](crate::Vectorizer).
///
/// Implementations map a single lowercased token to a fixed-length numeric
/// vector, or report the word as unknown. The native dimension is whatever
/// the provider produces; the vectorizer takes care of resizing to the
/// classifier's input shape.
pub trait WordEmbedding: Send + Sync {
    /// Returns the embedding vector for `word`, or `None` if the word is
    /// not in the provider's vocabulary.
    fn vector(&self, word: &str) -> Option<Vec<f32>>;
}

/// Deterministic hash-based word embedding.
///
/// Stands in for a real pretrained word-embedding model so the crate works
/// out of the box: every token containing at least one alphabetic character
/// maps to a stable pseudo-random unit vector, so identical words always
/// produce identical vectors. Tokens with no alphabetic characters (amounts,
/// card numbers, dates) are reported as unknown.
///
/// There is no semantic similarity between different words under this
/// scheme; it is suitable for exact-vocabulary personalization and for
/// tests, not for generalizing across unseen phrasings.
#[derive(Debug, Clone)]
pub struct HashedEmbedding {
    dim: usize,
}

impl HashedEmbedding {
    /// Creates a hashed embedding producing vectors of `dim` components.
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    /// The native dimension of vectors produced by this provider.
    pub fn dim(&self) -> usize {
        self.dim
    }
}

impl Default for HashedEmbedding {
    fn default() -> Self {
        // Smaller than the classifier's 128-dim input, so the vectorizer's
        // zero-padding path is exercised in normal operation.
        Self::new(64)
    }
}

fn fnv1a(word: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in word.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn xorshift(state: &mut u64) -> u64 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    *state = x;
    x
}

impl WordEmbedding for HashedEmbedding {
    fn vector(&self, word: &str) -> Option<Vec<f32>> {
        if !word.chars().any(|c| c.is_alphabetic()) {
            return None;
        }

        let mut state = fnv1a(word) | 1;
        let raw: Vec<f32> = (0..self.dim)
            .map(|_| {
                let bits = xorshift(&mut state);
                // Map to [-1, 1)
                (bits >> 40) as f32 / (1u64 << 24) as f32 * 2.0 - 1.0
            })
            .collect();

        let vec = Array1::from_vec(raw);
        let norm: f32 = vec.iter().map(|&x| x * x).sum::<f32>().sqrt();
        if norm > 1e-10 {
            Some((vec / norm).to_vec())
        } else {
            Some(vec.to_vec())
        }
    }
}
