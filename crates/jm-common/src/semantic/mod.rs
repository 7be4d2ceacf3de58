pub mod similarity;
pub mod tfidf;
pub mod tokenizer;

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use thiserror::Error;

pub use similarity::{cosine_similarity, jaccard_similarity};
pub use tfidf::{SparseVector, TfidfModel};
pub use tokenizer::{candidate_document, job_document, tokenize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// Vocabulary cap, most frequent n-grams first.
    pub max_features: usize,
    pub ngram_min: usize,
    pub ngram_max: usize,
    /// Below this many documents no model is fitted and the Jaccard
    /// fallback is used.
    pub min_corpus_size: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            max_features: 1500,
            ngram_min: 1,
            ngram_max: 2,
            min_corpus_size: 5,
        }
    }
}

impl SemanticConfig {
    pub(crate) fn ngram_bounds(&self) -> (usize, usize) {
        let min = self.ngram_min.max(1);
        (min, self.ngram_max.max(min))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("corpus has {documents} documents, at least {required} are needed")]
    CorpusTooSmall { documents: usize, required: usize },
    #[error("corpus produced an empty vocabulary")]
    EmptyVocabulary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SemanticMethod {
    Primary,
    Fallback,
}

/// Which path produced a semantic score. The two are never blended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SemanticScore {
    /// TF-IDF cosine under a published model.
    Primary(f64),
    /// Token-set Jaccard.
    Fallback(f64),
}

impl SemanticScore {
    pub fn value(self) -> f64 {
        match self {
            Self::Primary(score) | Self::Fallback(score) => score,
        }
    }

    pub fn method(self) -> SemanticMethod {
        match self {
            Self::Primary(_) => SemanticMethod::Primary,
            Self::Fallback(_) => SemanticMethod::Fallback,
        }
    }

    pub fn is_fallback(self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// A published model version.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub version: u64,
    pub model: TfidfModel,
}

/// Similarity between two documents.
///
/// Cosine under `model` when both documents have in-vocabulary terms,
/// otherwise Jaccard over the normalised unigrams. Either side empty yields
/// `Fallback(0.0)`.
pub fn semantic_similarity(model: Option<&FittedModel>, a: &str, b: &str) -> SemanticScore {
    let a_tokens = tokenize(a);
    let b_tokens = tokenize(b);
    if a_tokens.is_empty() || b_tokens.is_empty() {
        return SemanticScore::Fallback(0.0);
    }

    if let Some(fitted) = model {
        let a_vec = fitted.model.transform_tokens(&a_tokens);
        let b_vec = fitted.model.transform_tokens(&b_tokens);
        if !a_vec.is_empty() && !b_vec.is_empty() {
            return SemanticScore::Primary(cosine_similarity(&a_vec, &b_vec));
        }
    }

    let a_set: HashSet<&str> = a_tokens.iter().map(String::as_str).collect();
    let b_set: HashSet<&str> = b_tokens.iter().map(String::as_str).collect();
    SemanticScore::Fallback(jaccard_similarity(&a_set, &b_set))
}

/// Shared, refreshable model slot.
///
/// Readers clone the `Arc` under a short read lock; `refit` fits outside the
/// lock and swaps the pointer, so in-flight readers keep their version.
#[derive(Debug, Default)]
pub struct SemanticModelHandle {
    current: RwLock<Option<Arc<FittedModel>>>,
    last_version: AtomicU64,
}

impl SemanticModelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<FittedModel>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn version(&self) -> Option<u64> {
        self.current().map(|fitted| fitted.version)
    }

    /// Fits a model over `corpus` and publishes it under the next version.
    /// On error the current model stays published.
    pub fn refit(
        &self,
        corpus: &[String],
        config: &SemanticConfig,
    ) -> Result<Arc<FittedModel>, SemanticError> {
        let model = TfidfModel::fit(corpus, config)?;
        Ok(self.publish(model))
    }

    pub fn publish(&self, model: TfidfModel) -> Arc<FittedModel> {
        let version = self.last_version.fetch_add(1, Ordering::SeqCst) + 1;
        let fitted = Arc::new(FittedModel { version, model });
        {
            let mut slot = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *slot = Some(Arc::clone(&fitted));
        }
        tracing::info!(
            model_version = version,
            vocabulary_size = fitted.model.vocabulary_size(),
            documents = fitted.model.documents(),
            "semantic model published"
        );
        fitted
    }
}
