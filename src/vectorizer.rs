use std::collections::{HashMap, HashSet};

use counter::Counter;
use ndarray::Array2;
use regex::Regex;
use stop_words::{get, LANGUAGE};
use tracing::{debug, info};

use crate::config::VectorizerConfig;
use crate::error::{Result, TopicError};
use crate::models::{Corpus, Vocabulary};

/// Turns a corpus into an L2-normalized TF-IDF document-term matrix.
pub struct TfidfVectorizer {
    config: VectorizerConfig,
    token_re: Regex,
    stop_words: HashSet<String>,
}

impl TfidfVectorizer {
    pub fn new(config: VectorizerConfig) -> Result<Self> {
        if !(config.max_df > 0.0 && config.max_df <= 1.0) {
            return Err(TopicError::InvalidConfig(format!(
                "max_df must be in (0, 1], got {}",
                config.max_df
            )));
        }

        let token_re = Regex::new(r"\b\w\w+\b")
            .map_err(|e| TopicError::InvalidConfig(format!("token pattern: {}", e)))?;

        let stop_words: HashSet<String> = if config.stop_words {
            get(LANGUAGE::English).into_iter().collect()
        } else {
            HashSet::new()
        };

        Ok(TfidfVectorizer {
            config,
            token_re,
            stop_words,
        })
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let text = if self.config.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        self.token_re
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|token| !self.stop_words.contains(*token))
            .map(|token| token.to_string())
            .collect()
    }

    /// Learn the vocabulary from `corpus` and return its TF-IDF matrix (D x V).
    pub fn fit_transform(&self, corpus: &Corpus) -> Result<(Array2<f64>, Vocabulary)> {
        if corpus.is_empty() {
            return Err(TopicError::EmptyInput("corpus has no documents"));
        }

        // Step 1: Count terms per document and document frequencies
        let term_counts: Vec<Counter<String>> = corpus
            .texts()
            .map(|text| self.tokenize(text).into_iter().collect())
            .collect();

        let mut doc_freq: Counter<String> = Counter::new();
        for counts in &term_counts {
            for term in counts.keys() {
                doc_freq[term] += 1;
            }
        }

        if doc_freq.is_empty() {
            return Err(TopicError::EmptyInput(
                "empty vocabulary; documents may contain only stop words",
            ));
        }

        // Step 2: Prune by document frequency
        let n_docs = corpus.len();
        let max_doc_count = self.config.max_df * n_docs as f64;
        if max_doc_count < self.config.min_df as f64 {
            return Err(TopicError::InvalidConfig(format!(
                "max_df ({}) covers fewer documents than min_df ({})",
                self.config.max_df, self.config.min_df
            )));
        }

        let total_terms = doc_freq.len();
        let mut kept: Vec<(String, usize)> = doc_freq
            .into_iter()
            .filter(|(_, df)| *df as f64 <= max_doc_count && *df >= self.config.min_df)
            .collect();

        if kept.is_empty() {
            return Err(TopicError::EmptyInput(
                "no terms remain after document-frequency pruning",
            ));
        }

        kept.sort_by(|a, b| a.0.cmp(&b.0));
        debug!(
            total_terms,
            kept = kept.len(),
            "Pruned vocabulary by document frequency"
        );

        // Step 3: Smoothed IDF per kept term
        let idf: Vec<f64> = kept
            .iter()
            .map(|(_, df)| ((1.0 + n_docs as f64) / (1.0 + *df as f64)).ln() + 1.0)
            .collect();
        let terms: Vec<String> = kept.into_iter().map(|(term, _)| term).collect();
        let vocabulary = Vocabulary::new(terms)?;

        // Step 4: Weighted counts, then L2-normalize each row
        let term_index: HashMap<&str, usize> = vocabulary
            .terms()
            .iter()
            .enumerate()
            .map(|(i, term)| (term.as_str(), i))
            .collect();

        let mut matrix = Array2::<f64>::zeros((n_docs, vocabulary.len()));
        for (doc_id, counts) in term_counts.iter().enumerate() {
            for (term, &count) in counts.iter() {
                if let Some(&term_id) = term_index.get(term.as_str()) {
                    matrix[[doc_id, term_id]] = count as f64 * idf[term_id];
                }
            }
        }

        for mut row in matrix.rows_mut() {
            let norm = row.iter().map(|w| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|w| w / norm);
            }
        }

        info!(
            documents = n_docs,
            terms = vocabulary.len(),
            "Built TF-IDF matrix"
        );

        Ok((matrix, vocabulary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectorizer(config: VectorizerConfig) -> TfidfVectorizer {
        TfidfVectorizer::new(config).unwrap()
    }

    #[test]
    fn tokenizes_words_of_two_or_more_characters() {
        let v = vectorizer(VectorizerConfig::default());
        assert_eq!(
            v.tokenize("I got a COVID-19 test today"),
            vec!["got", "covid", "19", "test", "today"]
        );
    }

    #[test]
    fn stop_words_are_removed_when_enabled() {
        let v = vectorizer(VectorizerConfig {
            stop_words: true,
            ..VectorizerConfig::default()
        });
        let tokens = v.tokenize("the vaccine and the booster");
        assert!(tokens.contains(&"vaccine".to_string()));
        assert!(!tokens.contains(&"the".to_string()));
        assert!(!tokens.contains(&"and".to_string()));
    }

    #[test]
    fn vocabulary_is_sorted_and_rows_are_unit_length() {
        let corpus = Corpus::from_texts([
            "masks masks work",
            "vaccine rollout slow",
            "masks and vaccine",
        ]);
        let (matrix, vocab) = vectorizer(VectorizerConfig::default())
            .fit_transform(&corpus)
            .unwrap();

        let mut sorted = vocab.terms().to_vec();
        sorted.sort();
        assert_eq!(vocab.terms(), sorted.as_slice());
        assert_eq!(matrix.dim(), (3, vocab.len()));

        for row in matrix.rows() {
            let norm = row.iter().map(|w| w * w).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
        assert!(matrix.iter().all(|&w| w >= 0.0));
    }

    #[test]
    fn max_df_drops_terms_in_every_document() {
        let corpus = Corpus::from_texts(["covid lockdown", "covid vaccine", "covid masks"]);
        let (_, vocab) = vectorizer(VectorizerConfig::default())
            .fit_transform(&corpus)
            .unwrap();
        assert!(!vocab.terms().contains(&"covid".to_string()));
        assert_eq!(vocab.terms(), &["lockdown", "masks", "vaccine"]);
    }

    #[test]
    fn min_df_drops_rare_terms() {
        let corpus = Corpus::from_texts(["home office", "home school", "beach trip"]);
        let (_, vocab) = vectorizer(VectorizerConfig {
            min_df: 2,
            max_df: 1.0,
            ..VectorizerConfig::default()
        })
        .fit_transform(&corpus)
        .unwrap();
        assert_eq!(vocab.terms(), &["home"]);
    }

    #[test]
    fn smoothed_idf_weights_rarer_terms_higher() {
        let corpus = Corpus::from_texts(["alpha beta", "alpha gamma", "delta"]);
        let (matrix, vocab) = vectorizer(VectorizerConfig {
            max_df: 1.0,
            ..VectorizerConfig::default()
        })
        .fit_transform(&corpus)
        .unwrap();
        let alpha = vocab.terms().iter().position(|t| t == "alpha").unwrap();
        let beta = vocab.terms().iter().position(|t| t == "beta").unwrap();
        assert!(matrix[[0, beta]] > matrix[[0, alpha]]);
    }

    #[test]
    fn empty_documents_give_zero_rows() {
        let corpus = Corpus::from_texts(["", "quarantine diary"]);
        let (matrix, _) = vectorizer(VectorizerConfig {
            max_df: 1.0,
            ..VectorizerConfig::default()
        })
        .fit_transform(&corpus)
        .unwrap();
        assert!(matrix.row(0).iter().all(|&w| w == 0.0));
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let err = vectorizer(VectorizerConfig::default())
            .fit_transform(&Corpus::default())
            .unwrap_err();
        assert!(matches!(err, TopicError::EmptyInput(_)));
    }

    #[test]
    fn out_of_range_max_df_is_rejected() {
        for max_df in [1.5, 0.0, -0.2, f64::NAN] {
            let result = TfidfVectorizer::new(VectorizerConfig {
                max_df,
                ..VectorizerConfig::default()
            });
            assert!(matches!(result, Err(TopicError::InvalidConfig(_))));
        }
    }

    #[test]
    fn max_df_below_min_df_is_rejected() {
        let corpus = Corpus::from_texts(["aa bb", "aa cc"]);
        let err = vectorizer(VectorizerConfig {
            min_df: 3,
            max_df: 1.0,
            ..VectorizerConfig::default()
        })
        .fit_transform(&corpus)
        .unwrap_err();
        assert!(matches!(err, TopicError::InvalidConfig(ref msg) if msg.contains("min_df (3)")));
    }

    #[test]
    fn all_terms_pruned_is_rejected() {
        let corpus = Corpus::from_texts(["same words", "same words"]);
        let err = vectorizer(VectorizerConfig::default())
            .fit_transform(&corpus)
            .unwrap_err();
        assert!(matches!(err, TopicError::EmptyInput(_)));
    }
}
