use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Corpus;
use crate::topic_modeling::Analysis;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSummary {
    pub id: usize,
    pub top_words: Vec<String>,
    pub documents: usize, // Documents whose dominant topic this is
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierSummary {
    pub topic: usize,
    pub threshold: f64,
    pub texts: Vec<String>, // Unique texts, first-seen order
}

/// Serializable summary of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub documents: usize,
    pub vocabulary_size: usize,
    pub topics: Vec<TopicSummary>,
    pub most_populous_topic: usize,
    pub reconstruction_err: f64,
    pub iterations: usize,
    pub outliers: OutlierSummary,
}

impl AnalysisReport {
    pub fn build(
        analysis: &Analysis,
        corpus: &Corpus,
        top_n: usize,
        outlier_topic: usize,
        outlier_threshold: f64,
    ) -> Result<Self> {
        let top_words = analysis.top_words(top_n)?;
        let sizes = analysis.topic_sizes()?;

        let topics = top_words
            .into_iter()
            .zip(sizes)
            .enumerate()
            .map(|(id, (top_words, documents))| TopicSummary {
                id,
                top_words,
                documents,
            })
            .collect();

        Ok(AnalysisReport {
            generated_at: Utc::now(),
            documents: analysis.model.n_documents(),
            vocabulary_size: analysis.model.vocabulary().len(),
            topics,
            most_populous_topic: analysis.most_populous_topic()?,
            reconstruction_err: analysis.reconstruction_err,
            iterations: analysis.iterations,
            outliers: OutlierSummary {
                topic: outlier_topic,
                threshold: outlier_threshold,
                texts: analysis.outliers(corpus, outlier_topic, outlier_threshold)?,
            },
        })
    }

    /// Summary lines for the terminal. Top words are printed separately by
    /// [`crate::analysis::report_top_words`].
    pub fn write_text<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(
            out,
            "📊 {} documents, {} terms, {} topics (reconstruction error {:.4} after {} iterations)",
            self.documents,
            self.vocabulary_size,
            self.topics.len(),
            self.reconstruction_err,
            self.iterations
        )?;

        writeln!(out, "\nDocuments per topic:")?;
        for topic in &self.topics {
            let share = if self.documents > 0 {
                topic.documents as f64 / self.documents as f64 * 100.0
            } else {
                0.0
            };
            writeln!(
                out,
                "   Topic {:<3} {:>6} documents ({:>5.1}%)",
                topic.id, topic.documents, share
            )?;
        }

        if let Some(populous) = self.topics.get(self.most_populous_topic) {
            writeln!(
                out,
                "\n🏆 Most populous topic: {} ({} documents) [{}]",
                populous.id,
                populous.documents,
                populous.top_words.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
            )?;
        }

        writeln!(
            out,
            "\n🔍 Outliers on topic {} (weight >= {}): {} unique texts",
            self.outliers.topic,
            self.outliers.threshold,
            self.outliers.texts.len()
        )?;
        for text in &self.outliers.texts {
            writeln!(out, "   - {}", text)?;
        }

        Ok(())
    }

    /// Write the report as pretty JSON; `-` means stdout.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if path.as_os_str() == "-" {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, self)?;
            writeln!(handle)?;
        } else {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.flush()?;
        }
        Ok(())
    }
}
