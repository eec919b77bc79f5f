use log::debug;
use ndarray::Array1;

use crate::embedding::WordEmbedding;

/// The fixed input dimension expected by the downstream classifier.
///
/// The vectorizer resizes every embedding to exactly this many components,
/// so the classifier sees a uniform input shape irrespective of the
/// embedding provider's native dimensionality.
pub const FEATURE_DIM: usize = 128;

/// Turns free text into a fixed-dimension feature vector using a per-word
/// embedding lookup.
///
/// The conversion lowercases the text, splits it on whitespace, looks each
/// token up in the embedding provider, and averages the vectors of the
/// tokens that are known. Unknown tokens are silently dropped. When no
/// token embeds at all, the result is `None`: a legitimate miss, not an
/// error, which callers must treat as "this input cannot be classified or
/// trained on".
///
/// Pure: the output depends only on the text and the embedding provider.
#[derive(Debug, Clone)]
pub struct Vectorizer<E> {
    embedding: E,
}

impl<E: WordEmbedding> Vectorizer<E> {
    pub fn new(embedding: E) -> Self {
        Self { embedding }
    }

    /// Converts `text` into a feature vector of exactly [`FEATURE_DIM`]
    /// components, or `None` when no token has a known embedding.
    ///
    /// If the provider's native dimension exceeds [`FEATURE_DIM`] the mean
    /// vector is truncated to the first [`FEATURE_DIM`] components; if it is
    /// smaller, the tail is zero-padded.
    pub fn vectorize(&self, text: &str) -> Option<Array1<f32>> {
        let lowered = text.to_lowercase();
        let token_vectors: Vec<Vec<f32>> = lowered
            .split_whitespace()
            .filter_map(|token| self.embedding.vector(token))
            .collect();

        if token_vectors.is_empty() {
            debug!("no embeddable tokens in input");
            return None;
        }

        let native_dim = token_vectors[0].len();
        let mut mean = vec![0f32; native_dim];
        for vector in &token_vectors {
            for (slot, value) in mean.iter_mut().zip(vector.iter()) {
                *slot += value;
            }
        }
        let count = token_vectors.len() as f32;
        for slot in mean.iter_mut() {
            *slot /= count;
        }

        // Resize to the classifier's input shape: truncate or zero-pad.
        let mut features = Array1::zeros(FEATURE_DIM);
        for (slot, value) in features.iter_mut().zip(mean.iter()) {
            *slot = *value;
        }
        Some(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct StaticEmbedding {
        vocab: HashMap<String, Vec<f32>>,
    }

    impl StaticEmbedding {
        fn new(entries: &[(&str, Vec<f32>)]) -> Self {
            Self {
                vocab: entries
                    .iter()
                    .map(|(word, vec)| (word.to_string(), vec.clone()))
                    .collect(),
            }
        }
    }

    impl WordEmbedding for StaticEmbedding {
        fn vector(&self, word: &str) -> Option<Vec<f32>> {
            self.vocab.get(word).cloned()
        }
    }

    #[test]
    fn test_output_is_always_feature_dim() {
        let vectorizer = Vectorizer::new(StaticEmbedding::new(&[
            ("coffee", vec![1.0, 2.0]),
            ("shop", vec![3.0, 4.0]),
        ]));

        assert_eq!(vectorizer.vectorize("coffee").unwrap().len(), FEATURE_DIM);
        assert_eq!(
            vectorizer.vectorize("coffee shop coffee shop").unwrap().len(),
            FEATURE_DIM
        );
    }

    #[test]
    fn test_no_embeddable_tokens_is_a_miss() {
        let vectorizer = Vectorizer::new(StaticEmbedding::new(&[("coffee", vec![1.0])]));
        assert!(vectorizer.vectorize("totally unknown words").is_none());
        assert!(vectorizer.vectorize("").is_none());
        assert!(vectorizer.vectorize("   ").is_none());
    }

    #[test]
    fn test_unknown_tokens_are_dropped() {
        let vectorizer = Vectorizer::new(StaticEmbedding::new(&[("coffee", vec![2.0, 4.0])]));
        let features = vectorizer.vectorize("coffee 12.99 unknownword").unwrap();
        assert_eq!(features[0], 2.0);
        assert_eq!(features[1], 4.0);
    }

    #[test]
    fn test_lowercasing() {
        let vectorizer = Vectorizer::new(StaticEmbedding::new(&[("coffee", vec![1.0])]));
        assert!(vectorizer.vectorize("COFFEE").is_some());
        assert!(vectorizer.vectorize("Coffee").is_some());
    }

    #[test]
    fn test_elementwise_mean() {
        let vectorizer = Vectorizer::new(StaticEmbedding::new(&[
            ("coffee", vec![1.0, 2.0]),
            ("shop", vec![3.0, 4.0]),
        ]));
        let features = vectorizer.vectorize("coffee shop").unwrap();
        assert_eq!(features[0], 2.0);
        assert_eq!(features[1], 3.0);
    }

    #[test]
    fn test_zero_padding_below_feature_dim() {
        let vectorizer = Vectorizer::new(StaticEmbedding::new(&[("coffee", vec![5.0, 6.0])]));
        let features = vectorizer.vectorize("coffee").unwrap();
        assert_eq!(features[0], 5.0);
        assert_eq!(features[1], 6.0);
        for i in 2..FEATURE_DIM {
            assert_eq!(features[i], 0.0);
        }
    }

    #[test]
    fn test_truncation_above_feature_dim() {
        let long: Vec<f32> = (0..200).map(|i| i as f32).collect();
        let vectorizer = Vectorizer::new(StaticEmbedding::new(&[("coffee", long.clone())]));
        let features = vectorizer.vectorize("coffee").unwrap();
        assert_eq!(features.len(), FEATURE_DIM);
        for i in 0..FEATURE_DIM {
            assert_eq!(features[i], long[i]);
        }
    }
}
