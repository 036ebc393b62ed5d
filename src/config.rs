//! Configuration for the vectorizer, the factorizer and the analysis run.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TopicError};

/// TF-IDF vectorizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    pub max_df: f64,      // Drop terms found in more than this fraction of documents
    pub min_df: usize,    // Drop terms found in fewer than this many documents
    pub stop_words: bool, // Remove English stop words before counting
    pub lowercase: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        VectorizerConfig {
            max_df: 0.95,
            min_df: 1,
            stop_words: false,
            lowercase: true,
        }
    }
}

/// How the factor matrices are seeded before the multiplicative updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Init {
    /// Scaled absolute normal draws from a (optionally seeded) RNG
    Random,
    /// Non-negative double SVD
    Nndsvd,
    /// Non-negative double SVD with zeros filled by the data mean
    Nndsvda,
}

/// NMF solver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NmfConfig {
    pub n_topics: usize,
    pub init: Init,
    pub max_iter: usize,
    pub tol: f64,
    pub seed: Option<u64>,
}

impl Default for NmfConfig {
    fn default() -> Self {
        NmfConfig {
            n_topics: 5,
            init: Init::Nndsvda,
            max_iter: 200,
            tol: 1e-4,
            seed: None,
        }
    }
}

/// Settings for one end-to-end analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub text_column: String,
    pub vectorizer: VectorizerConfig,
    pub nmf: NmfConfig,
    pub top_n: usize,
    /// Topic whose column is thresholded for outliers; `None` means the last topic
    pub outlier_topic: Option<usize>,
    pub outlier_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            text_column: "text".to_string(),
            vectorizer: VectorizerConfig::default(),
            nmf: NmfConfig::default(),
            top_n: 10,
            outlier_topic: None,
            outlier_threshold: 0.15,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Topic index used for outlier extraction.
    pub fn outlier_topic(&self) -> usize {
        self.outlier_topic
            .unwrap_or_else(|| self.nmf.n_topics.saturating_sub(1))
    }

    pub fn validate(&self) -> Result<()> {
        if self.text_column.trim().is_empty() {
            return Err(TopicError::InvalidConfig(
                "text column name must not be empty".into(),
            ));
        }
        if !(self.vectorizer.max_df > 0.0 && self.vectorizer.max_df <= 1.0) {
            return Err(TopicError::InvalidConfig(format!(
                "max_df must be in (0, 1], got {}",
                self.vectorizer.max_df
            )));
        }
        if self.nmf.n_topics == 0 {
            return Err(TopicError::InvalidConfig(
                "n_topics must be at least 1".into(),
            ));
        }
        if self.nmf.max_iter == 0 {
            return Err(TopicError::InvalidConfig(
                "max_iter must be at least 1".into(),
            ));
        }
        if !(self.nmf.tol >= 0.0) {
            return Err(TopicError::InvalidConfig(format!(
                "tol must be non-negative, got {}",
                self.nmf.tol
            )));
        }
        if !(self.outlier_threshold >= 0.0) {
            return Err(TopicError::InvalidConfig(format!(
                "outlier threshold must be non-negative, got {}",
                self.outlier_threshold
            )));
        }
        let topic = self.outlier_topic();
        if topic >= self.nmf.n_topics {
            return Err(TopicError::InvalidIndex {
                what: "outlier topic",
                index: topic,
                len: self.nmf.n_topics,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.outlier_threshold, 0.15);
        assert_eq!(config.vectorizer.max_df, 0.95);
        assert_eq!(config.outlier_topic(), 4);
    }

    #[test]
    fn outlier_topic_must_exist() {
        let config = AnalysisConfig {
            outlier_topic: Some(5),
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TopicError::InvalidIndex { index: 5, len: 5, .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_max_df() {
        let mut config = AnalysisConfig::default();
        config.vectorizer.max_df = 1.5;
        assert!(matches!(config.validate(), Err(TopicError::InvalidConfig(_))));
        config.vectorizer.max_df = 0.0;
        assert!(matches!(config.validate(), Err(TopicError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_nan_threshold() {
        let config = AnalysisConfig {
            outlier_threshold: f64::NAN,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"text_column": "clean_text", "nmf": {{"n_topics": 3, "init": "random", "seed": 7}}}}"#
        )
        .unwrap();
        let config = AnalysisConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.text_column, "clean_text");
        assert_eq!(config.nmf.n_topics, 3);
        assert_eq!(config.nmf.init, Init::Random);
        assert_eq!(config.nmf.seed, Some(7));
        assert_eq!(config.nmf.max_iter, 200);
        assert_eq!(config.top_n, 10);
        assert_eq!(config.outlier_topic(), 2);
    }
}
