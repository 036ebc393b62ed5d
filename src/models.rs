use std::collections::HashSet;

use ndarray::Array2;

use crate::error::{Result, TopicError};

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub index: usize,  // Position in the corpus, 0..D-1
    pub text: String,  // Pre-cleaned text, possibly empty
}

/// Ordered, immutable table of documents.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    /// Build a corpus from texts in order; the position becomes the document index.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let documents = texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Document {
                index,
                text: text.into(),
            })
            .collect();
        Corpus { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, index: usize) -> Option<&Document> {
        self.documents.get(index)
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(|doc| doc.text.as_str())
    }
}

/// Ordered list of distinct terms. A term's position is its column in every
/// term-weight matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    terms: Vec<String>,
}

impl Vocabulary {
    pub fn new(terms: Vec<String>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(terms.len());
        for term in &terms {
            if !seen.insert(term.as_str()) {
                return Err(TopicError::InvalidConfig(format!(
                    "duplicate vocabulary term '{}'",
                    term
                )));
            }
        }
        Ok(Vocabulary { terms })
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

/// Output of one factorization run, with its dimensions checked against each
/// other and against the vocabulary.
#[derive(Debug, Clone)]
pub struct TopicModel {
    components: Array2<f64>, // Topics x Terms
    projection: Array2<f64>, // Documents x Topics
    vocabulary: Vocabulary,
}

impl TopicModel {
    pub fn new(
        components: Array2<f64>,
        projection: Array2<f64>,
        vocabulary: Vocabulary,
    ) -> Result<Self> {
        if components.ncols() != vocabulary.len() {
            return Err(TopicError::ShapeMismatch {
                what: "topic-term columns vs vocabulary",
                expected: vocabulary.len(),
                actual: components.ncols(),
            });
        }
        if projection.ncols() != components.nrows() {
            return Err(TopicError::ShapeMismatch {
                what: "projection columns vs topic count",
                expected: components.nrows(),
                actual: projection.ncols(),
            });
        }
        Ok(TopicModel {
            components,
            projection,
            vocabulary,
        })
    }

    pub fn n_topics(&self) -> usize {
        self.components.nrows()
    }

    pub fn n_documents(&self) -> usize {
        self.projection.nrows()
    }

    pub fn components(&self) -> &Array2<f64> {
        &self.components
    }

    pub fn projection(&self) -> &Array2<f64> {
        &self.projection
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Check that the projection has one row per corpus document.
    pub fn check_corpus(&self, corpus: &Corpus) -> Result<()> {
        if corpus.len() != self.n_documents() {
            return Err(TopicError::ShapeMismatch {
                what: "corpus documents vs projection rows",
                expected: self.n_documents(),
                actual: corpus.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn vocab(terms: &[&str]) -> Vocabulary {
        Vocabulary::new(terms.iter().map(|t| t.to_string()).collect()).unwrap()
    }

    #[test]
    fn corpus_indexes_by_position() {
        let corpus = Corpus::from_texts(["a", "", "c"]);
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.get(1).unwrap().index, 1);
        assert_eq!(corpus.get(1).unwrap().text, "");
        assert_eq!(corpus.texts().collect::<Vec<_>>(), vec!["a", "", "c"]);
    }

    #[test]
    fn vocabulary_rejects_duplicates() {
        let err = Vocabulary::new(vec!["mask".into(), "mask".into()]).unwrap_err();
        assert!(matches!(err, TopicError::InvalidConfig(_)));
    }

    #[test]
    fn topic_model_accepts_consistent_shapes() {
        let components = array![[0.1, 0.2, 0.3], [0.0, 0.5, 0.1]];
        let projection = array![[0.4, 0.1], [0.0, 0.9], [0.2, 0.2], [0.3, 0.0]];
        let model = TopicModel::new(components, projection, vocab(&["a", "b", "c"])).unwrap();
        assert_eq!(model.n_topics(), 2);
        assert_eq!(model.n_documents(), 4);
        assert_eq!(model.components().dim(), (2, 3));
        assert_eq!(model.projection().dim(), (4, 2));
    }

    #[test]
    fn topic_model_rejects_vocabulary_mismatch() {
        let components = array![[0.1, 0.2, 0.3]];
        let projection = array![[1.0]];
        let err = TopicModel::new(components, projection, vocab(&["a", "b"])).unwrap_err();
        assert!(matches!(
            err,
            TopicError::ShapeMismatch { expected: 2, actual: 3, .. }
        ));
    }

    #[test]
    fn topic_model_rejects_topic_count_mismatch() {
        let components = array![[0.1, 0.2], [0.3, 0.4]];
        let projection = array![[1.0, 0.0, 0.0]];
        let err = TopicModel::new(components, projection, vocab(&["a", "b"])).unwrap_err();
        assert!(matches!(
            err,
            TopicError::ShapeMismatch { expected: 2, actual: 3, .. }
        ));
    }

    #[test]
    fn check_corpus_compares_document_counts() {
        let model = TopicModel::new(array![[1.0]], array![[0.5], [0.5]], vocab(&["a"])).unwrap();
        assert!(model.check_corpus(&Corpus::from_texts(["x", "y"])).is_ok());
        assert!(model.check_corpus(&Corpus::from_texts(["x"])).is_err());
    }
}
