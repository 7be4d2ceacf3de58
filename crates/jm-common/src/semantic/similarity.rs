use std::collections::HashSet;

use super::tfidf::SparseVector;

/// Cosine of two L2-normalised vectors, in [0, 1] since weights are
/// non-negative. Zero when either vector is empty.
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    a.dot(b).clamp(0.0, 1.0)
}

/// |A ∩ B| / |A ∪ B|; zero when both sets are empty.
pub fn jaccard_similarity<T: Eq + std::hash::Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_returns_one_for_identical_vectors() {
        let a = SparseVector::normalized(vec![(0, 1.0), (3, 2.0)]);
        let sim = cosine_similarity(&a, &a.clone());
        assert!((sim - 1.0).abs() < 1e-12);
    }

    #[test]
    fn cosine_similarity_handles_empty_and_disjoint_vectors() {
        let a = SparseVector::normalized(vec![(0, 1.0)]);
        let b = SparseVector::normalized(vec![(1, 1.0)]);
        assert_eq!(cosine_similarity(&a, &b), 0.0);
        assert_eq!(cosine_similarity(&a, &SparseVector::default()), 0.0);
    }

    #[test]
    fn jaccard_counts_shared_tokens() {
        let a: HashSet<&str> = ["rust", "backend", "payments"].into_iter().collect();
        let b: HashSet<&str> = ["rust", "payments", "fintech", "api"].into_iter().collect();
        assert!((jaccard_similarity(&a, &b) - 2.0 / 5.0).abs() < 1e-12);
        assert_eq!(jaccard_similarity::<&str>(&HashSet::new(), &HashSet::new()), 0.0);
    }
}
