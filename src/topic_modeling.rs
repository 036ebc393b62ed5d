use tracing::info;

use crate::analysis;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::models::{Corpus, TopicModel};
use crate::nmf::Nmf;
use crate::vectorizer::TfidfVectorizer;

/// Result of one batch run over a corpus.
#[derive(Debug)]
pub struct Analysis {
    pub model: TopicModel,
    pub assignments: Vec<usize>, // Dominant topic per document
    pub reconstruction_err: f64,
    pub iterations: usize,
}

pub struct TopicAnalyzer {
    config: AnalysisConfig,
}

impl TopicAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(TopicAnalyzer { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn fit(&self, corpus: &Corpus) -> Result<Analysis> {
        // Step 1: TF-IDF document-term matrix and vocabulary
        let vectorizer = TfidfVectorizer::new(self.config.vectorizer.clone())?;
        let (doc_term, vocabulary) = vectorizer.fit_transform(corpus)?;

        // Step 2: Factorize into projection and components
        let factorization = Nmf::new(self.config.nmf.clone()).fit(&doc_term)?;

        // Step 3: Check the artifacts agree with each other and with the corpus
        let model = TopicModel::new(
            factorization.components,
            factorization.projection,
            vocabulary,
        )?;
        model.check_corpus(corpus)?;

        // Step 4: Dominant topic per document
        let assignments = analysis::dominant_topics(model.projection())?;

        info!(
            documents = model.n_documents(),
            topics = model.n_topics(),
            "Assigned dominant topics"
        );

        Ok(Analysis {
            model,
            assignments,
            reconstruction_err: factorization.reconstruction_err,
            iterations: factorization.iterations,
        })
    }
}

impl Analysis {
    pub fn most_populous_topic(&self) -> Result<usize> {
        analysis::most_populous_topic(&self.assignments)
    }

    pub fn topic_sizes(&self) -> Result<Vec<usize>> {
        analysis::topic_sizes(&self.assignments, self.model.n_topics())
    }

    pub fn top_words(&self, n: usize) -> Result<Vec<Vec<String>>> {
        analysis::top_words(self.model.components(), self.model.vocabulary(), n)
    }

    pub fn outliers(&self, corpus: &Corpus, topic: usize, threshold: f64) -> Result<Vec<String>> {
        analysis::outlier_texts(self.model.projection(), corpus, topic, threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Init;
    use crate::error::TopicError;

    fn corpus() -> Corpus {
        Corpus::from_texts([
            "vaccine dose appointment booked",
            "second vaccine dose today",
            "vaccine appointment clinic",
            "lockdown school closed again",
            "school lockdown kids home",
            "kids home school online",
        ])
    }

    fn config(n_topics: usize) -> AnalysisConfig {
        let mut config = AnalysisConfig::default();
        config.nmf.n_topics = n_topics;
        config.nmf.init = Init::Nndsvda;
        config.nmf.max_iter = 400;
        config
    }

    #[test]
    fn fit_produces_consistent_shapes() {
        let corpus = corpus();
        let analysis = TopicAnalyzer::new(config(2)).unwrap().fit(&corpus).unwrap();
        let v = analysis.model.vocabulary().len();
        assert_eq!(analysis.model.components().dim(), (2, v));
        assert_eq!(analysis.model.projection().dim(), (6, 2));
        assert_eq!(analysis.assignments.len(), 6);
        assert_eq!(analysis.topic_sizes().unwrap().iter().sum::<usize>(), 6);
    }

    #[test]
    fn groups_related_posts() {
        let corpus = corpus();
        let analysis = TopicAnalyzer::new(config(2)).unwrap().fit(&corpus).unwrap();
        let a = &analysis.assignments;
        assert_eq!(a[0], a[1]);
        assert_eq!(a[1], a[2]);
        assert_eq!(a[3], a[4]);
        assert_eq!(a[4], a[5]);
        assert_ne!(a[0], a[3]);
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut bad = config(2);
        bad.outlier_topic = Some(2);
        assert!(matches!(
            TopicAnalyzer::new(bad),
            Err(TopicError::InvalidIndex { .. })
        ));
    }
}
