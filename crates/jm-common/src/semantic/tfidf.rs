use std::collections::{BTreeMap, HashMap, HashSet};

use super::tokenizer::{ngrams, tokenize};
use super::{SemanticConfig, SemanticError};

/// Sparse, index-sorted term-weight vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    /// Builds from (index, weight) pairs; sorts, drops zero weights and
    /// L2-normalises.
    pub fn normalized(mut entries: Vec<(usize, f64)>) -> Self {
        entries.retain(|(_, weight)| *weight > 0.0 && weight.is_finite());
        entries.sort_by_key(|(index, _)| *index);
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, weight) in &mut entries {
                *weight /= norm;
            }
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    /// Merge-join dot product over the sorted indices.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.entries.len() && j < other.entries.len() {
            let (ia, wa) = self.entries[i];
            let (ib, wb) = other.entries[j];
            match ia.cmp(&ib) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += wa * wb;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// TF-IDF vectoriser fitted over a document corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct TfidfModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    ngram_min: usize,
    ngram_max: usize,
    documents: usize,
}

impl TfidfModel {
    /// Vocabulary is the `max_features` most frequent n-grams across the
    /// corpus (ties by term). Idf is smoothed: `ln((1 + n) / (1 + df)) + 1`.
    pub fn fit(documents: &[String], config: &SemanticConfig) -> Result<Self, SemanticError> {
        if documents.len() < config.min_corpus_size {
            return Err(SemanticError::CorpusTooSmall {
                documents: documents.len(),
                required: config.min_corpus_size,
            });
        }

        let (ngram_min, ngram_max) = config.ngram_bounds();
        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for document in documents {
            let terms = ngrams(&tokenize(document), ngram_min, ngram_max);
            let mut unique: HashSet<&str> = HashSet::new();
            for term in &terms {
                *term_counts.entry(term.clone()).or_insert(0) += 1;
                unique.insert(term.as_str());
            }
            for term in unique {
                *doc_freq.entry(term.to_string()).or_insert(0) += 1;
            }
        }

        if term_counts.is_empty() {
            return Err(SemanticError::EmptyVocabulary);
        }

        let mut ranked: Vec<(String, usize)> = term_counts.into_iter().collect();
        ranked.sort_by(|(term_a, count_a), (term_b, count_b)| {
            count_b.cmp(count_a).then_with(|| term_a.cmp(term_b))
        });
        ranked.truncate(config.max_features.max(1));

        // Indices follow lexical order so equal vocabularies vectorise alike.
        let selected: BTreeMap<String, usize> = ranked
            .into_iter()
            .map(|(term, _)| {
                let df = doc_freq.get(&term).copied().unwrap_or(0);
                (term, df)
            })
            .collect();

        let n = documents.len() as f64;
        let mut vocabulary = HashMap::with_capacity(selected.len());
        let mut idf = Vec::with_capacity(selected.len());
        for (index, (term, df)) in selected.into_iter().enumerate() {
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        Ok(Self {
            vocabulary,
            idf,
            ngram_min,
            ngram_max,
            documents: documents.len(),
        })
    }

    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn contains(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }

    pub fn transform(&self, text: &str) -> SparseVector {
        self.transform_tokens(&tokenize(text))
    }

    /// Raw term counts times idf, L2-normalised. Out-of-vocabulary terms are
    /// ignored, so the result may be empty.
    pub fn transform_tokens(&self, tokens: &[String]) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in ngrams(tokens, self.ngram_min, self.ngram_max) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }
        SparseVector::normalized(
            counts
                .into_iter()
                .map(|(index, tf)| (index, tf * self.idf[index]))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<String> {
        [
            "rust backend engineer building payment services",
            "python data scientist machine learning models",
            "frontend react engineer design systems",
            "rust systems programmer embedded firmware",
            "devops engineer kubernetes terraform aws",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn refuses_small_corpus() {
        let err = TfidfModel::fit(&corpus()[..3], &SemanticConfig::default()).unwrap_err();
        assert_eq!(
            err,
            SemanticError::CorpusTooSmall {
                documents: 3,
                required: 5
            }
        );
    }

    #[test]
    fn smooth_idf_weights_rare_terms_higher() {
        let model = TfidfModel::fit(&corpus(), &SemanticConfig::default()).unwrap();
        assert!(model.contains("rust"));
        assert!(model.contains("rust backend"));
        let engineer = model.idf[model.vocabulary["engineer"]];
        let firmware = model.idf[model.vocabulary["firmware"]];
        // engineer: df 3 of 5, firmware: df 1 of 5
        assert!((engineer - ((6.0f64 / 4.0).ln() + 1.0)).abs() < 1e-12);
        assert!((firmware - ((6.0f64 / 2.0).ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn max_features_keeps_most_frequent_terms() {
        let config = SemanticConfig {
            max_features: 2,
            ..SemanticConfig::default()
        };
        let model = TfidfModel::fit(&corpus(), &config).unwrap();
        assert_eq!(model.vocabulary_size(), 2);
        // engineer (3) and rust (2) beat every other term.
        assert!(model.contains("engineer"));
        assert!(model.contains("rust"));
    }

    #[test]
    fn vectors_are_unit_length() {
        let model = TfidfModel::fit(&corpus(), &SemanticConfig::default()).unwrap();
        let vector = model.transform("Rust engineer for payment services");
        assert!(!vector.is_empty());
        assert!((vector.dot(&vector) - 1.0).abs() < 1e-9);
        assert!(model.transform("completely unrelated gardening").is_empty());
    }
}
