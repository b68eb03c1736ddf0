//! Inverted index over full-text fields.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use ahash::AHashMap;

use crate::analysis::Analyzer;
use crate::document::DocId;
use crate::error::Result;

/// Postings from normalized term to the documents containing it.
///
/// Indexing and querying both run text through the same analyzer, so a query
/// term only matches if it normalizes to exactly an indexed term. There is no
/// stemming or fuzzy matching.
#[derive(Clone)]
pub struct TextIndex {
    analyzer: Arc<dyn Analyzer>,
    postings: AHashMap<String, BTreeSet<DocId>>,
}

impl TextIndex {
    /// Create a new empty text index using `analyzer` for normalization.
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        TextIndex {
            analyzer,
            postings: AHashMap::new(),
        }
    }

    /// Get the analyzer of this index.
    pub fn analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.analyzer
    }

    /// Normalize text into its distinct terms.
    pub fn analyze(&self, text: &str) -> Result<Vec<String>> {
        self.analyzer.distinct_terms(text)
    }

    /// Post `id` under every distinct term of `text`.
    pub fn index(&mut self, text: &str, id: DocId) -> Result<()> {
        for term in self.analyze(text)? {
            self.postings.entry(term).or_default().insert(id);
        }
        Ok(())
    }

    /// Retract `id` from every distinct term of `text`.
    pub fn deindex(&mut self, text: &str, id: DocId) -> Result<()> {
        for term in self.analyze(text)? {
            if let Some(ids) = self.postings.get_mut(&term) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.postings.remove(&term);
                }
            }
        }
        Ok(())
    }

    /// Documents containing every term of `query` after normalization.
    ///
    /// A query that normalizes to no terms matches nothing.
    pub fn search_term(&self, query: &str) -> Result<BTreeSet<DocId>> {
        let terms = self.analyze(query)?;
        Ok(self.search_terms(&terms))
    }

    /// Documents posted under every one of the already-normalized `terms`.
    pub fn search_terms(&self, terms: &[String]) -> BTreeSet<DocId> {
        let mut lists = Vec::with_capacity(terms.len());
        for term in terms {
            match self.postings.get(term) {
                Some(ids) => lists.push(ids),
                None => return BTreeSet::new(),
            }
        }
        lists.sort_by_key(|ids| ids.len());

        let mut iter = lists.into_iter();
        let Some(first) = iter.next() else {
            return BTreeSet::new();
        };
        let mut result = first.clone();
        for ids in iter {
            result.retain(|id| ids.contains(id));
            if result.is_empty() {
                break;
            }
        }
        result
    }

    /// Check whether `id` is posted under the normalized `term`.
    pub fn contains(&self, term: &str, id: DocId) -> bool {
        self.postings
            .get(term)
            .map(|ids| ids.contains(&id))
            .unwrap_or(false)
    }

    /// Number of distinct terms.
    pub fn key_count(&self) -> usize {
        self.postings.len()
    }

    /// Total number of (term, id) postings.
    pub fn posting_count(&self) -> usize {
        self.postings.values().map(BTreeSet::len).sum()
    }

    /// Drop every posting.
    pub fn clear(&mut self) {
        self.postings.clear();
    }
}

impl fmt::Debug for TextIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextIndex")
            .field("analyzer", &self.analyzer.name())
            .field("terms", &self.postings.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::StandardAnalyzer;

    fn create_test_index() -> TextIndex {
        let analyzer: Arc<dyn Analyzer> = Arc::new(StandardAnalyzer::new().unwrap());
        let mut index = TextIndex::new(analyzer);
        index
            .index("Hello, I'd like to ask about insurance options.", 1)
            .unwrap();
        index.index("My insurance claim was denied", 2).unwrap();
        index.index("Billing question about my invoice", 3).unwrap();
        index
    }

    #[test]
    fn test_exact_term_match() {
        let index = create_test_index();
        assert_eq!(index.search_term("insurance").unwrap(), BTreeSet::from([1, 2]));
        assert_eq!(index.search_term("INSURANCE").unwrap(), BTreeSet::from([1, 2]));
        assert!(index.search_term("insuranc").unwrap().is_empty());
        assert!(index.search_term("!!!").unwrap().is_empty());
    }

    #[test]
    fn test_multi_term_query_is_conjunctive() {
        let index = create_test_index();
        assert_eq!(index.search_term("insurance claim").unwrap(), BTreeSet::from([2]));
        assert_eq!(index.search_term("about").unwrap(), BTreeSet::from([1, 3]));
        assert!(index.search_term("insurance invoice").unwrap().is_empty());
    }

    #[test]
    fn test_deindex_removes_postings() {
        let mut index = create_test_index();
        let before = index.key_count();
        index.deindex("Billing question about my invoice", 3).unwrap();

        assert!(index.search_term("billing").unwrap().is_empty());
        assert_eq!(index.search_term("about").unwrap(), BTreeSet::from([1]));
        assert_eq!(index.search_term("my").unwrap(), BTreeSet::from([2]));
        assert_eq!(index.key_count(), before - 3);
    }

    #[test]
    fn test_repeated_terms_post_once() {
        let analyzer: Arc<dyn Analyzer> = Arc::new(StandardAnalyzer::new().unwrap());
        let mut index = TextIndex::new(analyzer);
        index.index("claim claim CLAIM", 7).unwrap();
        assert_eq!(index.posting_count(), 1);
        assert!(index.contains("claim", 7));
    }
}
