//! TF-IDF term weights over a chunk collection.
//!
//! Weight of term `t` in document `d` is `tf(t, d) * (1 + ln(N / (1 + df(t))))`
//! with `tf` the raw count, `N` the document count and `df` the number of
//! documents containing `t`. Terms are lowercased and stopwords dropped.

use crate::analysis::content_terms;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Document frequencies of a fitted collection.
#[derive(Debug, Clone, Default)]
pub struct TfIdf {
    documents: usize,
    document_frequency: HashMap<String, usize>,
}

impl TfIdf {
    /// Counts document frequencies over `documents`.
    #[must_use]
    pub fn fit<S: AsRef<str> + Sync>(documents: &[S]) -> Self {
        let document_frequency = documents
            .par_iter()
            .map(|doc| content_terms(doc.as_ref()).into_iter().collect::<HashSet<_>>())
            .fold(HashMap::new, |mut df, terms| {
                for term in terms {
                    *df.entry(term).or_insert(0) += 1;
                }
                df
            })
            .reduce(HashMap::new, |mut a, b| {
                for (term, n) in b {
                    *a.entry(term).or_insert(0) += n;
                }
                a
            });

        Self {
            documents: documents.len(),
            document_frequency,
        }
    }

    /// Inverse document frequency of `term`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn idf(&self, term: &str) -> f64 {
        let df = self.document_frequency.get(term).copied().unwrap_or(0);
        1.0 + (self.documents as f64 / (1.0 + df as f64)).ln()
    }

    /// Term weights for `text`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn weights(&self, text: &str) -> BTreeMap<String, f64> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for term in content_terms(text) {
            *counts.entry(term).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .map(|(term, tf)| {
                let weight = tf as f64 * self.idf(&term);
                (term, weight)
            })
            .collect()
    }
}
