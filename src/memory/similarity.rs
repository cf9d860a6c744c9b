//! Cosine similarity and top-k ranking
//!
//! Scoring is a linear scan; the collection is bounded by the memory
//! capacity so no index structure is needed.

/// Cosine similarity between two vectors
///
/// Returns 0 when either vector is empty or has zero magnitude, and when the
/// lengths differ.
///
/// # Examples
///
/// ```
/// use parley::memory::cosine_similarity;
///
/// assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
/// assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
/// assert_eq!(cosine_similarity(&[1.0], &[1.0, 1.0]), 0.0);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

/// Rank items by similarity to a query and keep the best `k`
///
/// Items for which `embedding_of` returns `None` are skipped. Results are in
/// descending score order; ties keep their original order.
pub fn rank_by_similarity<T, F>(
    query: &[f32],
    items: Vec<T>,
    embedding_of: F,
    k: usize,
) -> Vec<(T, f32)>
where
    F: Fn(&T) -> Option<&[f32]>,
{
    let mut scored: Vec<(T, f32)> = items
        .into_iter()
        .filter_map(|item| {
            let score = cosine_similarity(query, embedding_of(&item)?);
            Some((item, score))
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(k);
    scored
}
