//! Embedding BLOB conversion and cosine similarity.
//!
//! Vector search is a brute-force linear scan: every query computes the
//! cosine similarity against every stored embedding, O(n) in the number of
//! memories. There is no approximate index.

use crate::errors::Error;

/// Convert a vector of f32 embedding values to a BLOB (little-endian bytes).
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|&x| x.to_le_bytes()).collect()
}

/// Convert a BLOB (little-endian bytes) to a vector of f32 embedding values.
///
/// # Errors
///
/// Returns `Error::Storage` if the blob is empty or its length is not a
/// multiple of 4 bytes.
pub fn blob_to_vec(blob: &[u8]) -> Result<Vec<f32>, Error> {
    if blob.is_empty() || blob.len() % 4 != 0 {
        return Err(Error::Storage(format!(
            "Invalid embedding BLOB size: {} bytes is not a positive multiple of 4",
            blob.len()
        )));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Compute cosine similarity between two embedding vectors.
///
/// Never fails. Returns 0.0 when the vectors have different lengths (mixed
/// embedding histories stay queryable), when either is empty or has zero
/// norm, or when any value is NaN or infinite. Otherwise the result is in
/// [-1, 1].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    if a.iter().chain(b.iter()).any(|x| !x.is_finite()) {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Rank candidates by similarity to `query`, keeping the top `limit`.
///
/// Candidates must be supplied in insertion order; the stable sort keeps
/// that order for equal similarities.
pub fn rank_by_similarity<T>(
    query: &[f32],
    candidates: impl IntoIterator<Item = T>,
    embedding_of: impl Fn(&T) -> &[f32],
    limit: usize,
) -> Vec<(T, f64)> {
    let mut scored: Vec<(T, f64)> = candidates
        .into_iter()
        .map(|item| {
            let similarity = cosine_similarity(query, embedding_of(&item));
            (item, similarity)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_to_blob_size() {
        let blob = vec_to_blob(&[0.1f32; 384]);
        assert_eq!(blob.len(), 1536);
    }

    #[test]
    fn test_blob_to_vec_recovers_values() {
        let vec = vec![0.5f32, -1.25, 3.0];
        let recovered = blob_to_vec(&vec_to_blob(&vec)).unwrap();
        assert_eq!(recovered, vec);
    }

    #[test]
    fn test_blob_to_vec_little_endian() {
        let blob = 1.0f32.to_le_bytes();
        assert_eq!(blob_to_vec(&blob).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_blob_to_vec_wrong_size() {
        assert!(matches!(blob_to_vec(&[0u8; 1535]), Err(Error::Storage(_))));
        assert!(matches!(blob_to_vec(&[]), Err(Error::Storage(_))));
    }

    #[test]
    fn test_cosine_similarity_identical_vectors() {
        let vec = vec![1.0f32; 16];
        assert!((cosine_similarity(&vec, &vec) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_vectors() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_similarity_opposite_vectors() {
        let sim = cosine_similarity(&[1.0, 2.0, 3.0], &[-1.0, -2.0, -3.0]);
        assert!((sim + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_similarity_mismatched_dimensions_is_zero() {
        assert_eq!(cosine_similarity(&[1.0; 384], &[1.0; 256]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_empty_and_zero_norm() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0; 4], &[1.0; 4]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_non_finite_is_zero() {
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::INFINITY, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_bounds() {
        let pairs: [(&[f32], &[f32]); 4] = [
            (&[0.3, -0.7, 2.0], &[1.5, 0.2, -0.9]),
            (&[1e-20, 1e-20], &[1e-20, 1e-20]),
            (&[1e30, -1e30], &[1e30, 1e30]),
            (&[0.1, 0.2, 0.3, 0.4], &[0.4, 0.3, 0.2, 0.1]),
        ];
        for (a, b) in pairs {
            let sim = cosine_similarity(a, b);
            assert!((-1.0..=1.0).contains(&sim), "{sim} out of bounds");
        }
    }

    #[test]
    fn test_rank_by_similarity_orders_and_truncates() {
        let candidates = vec![
            ("far", vec![-1.0f32, 0.0]),
            ("near", vec![1.0, 0.1]),
            ("exact", vec![1.0, 0.0]),
        ];
        let ranked = rank_by_similarity(&[1.0, 0.0], candidates, |c| c.1.as_slice(), 2);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0 .0, "exact");
        assert_eq!(ranked[1].0 .0, "near");
    }

    #[test]
    fn test_rank_by_similarity_ties_keep_insertion_order() {
        let candidates = vec![("first", vec![1.0f32]), ("second", vec![2.0])];
        let ranked = rank_by_similarity(&[1.0], candidates, |c| c.1.as_slice(), 10);
        assert_eq!(ranked[0].0 .0, "first");
        assert_eq!(ranked[1].0 .0, "second");
    }
}
