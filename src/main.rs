use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use nmf_topics::analysis;
use nmf_topics::config::{AnalysisConfig, Init};
use nmf_topics::models::Corpus;
use nmf_topics::report::AnalysisReport;
use nmf_topics::topic_modeling::TopicAnalyzer;

/// Topic analysis of a post corpus with NMF over TF-IDF.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// CSV file with a header row and a text column
    path: PathBuf,
    #[clap(long, help = "JSON config file; command-line flags override its values")]
    config: Option<PathBuf>,
    #[clap(short, long, help = "Name of the text column (default: text)")]
    column: Option<String>,
    #[clap(short = 'k', long, help = "Number of topics (default: 5)")]
    topics: Option<usize>,
    #[clap(long, value_enum, help = "Factor initialization (default: nndsvda)")]
    init: Option<Init>,
    #[clap(long, help = "Random seed for reproducible factorization")]
    seed: Option<u64>,
    #[clap(long, help = "Maximum solver iterations (default: 200)")]
    max_iter: Option<usize>,
    #[clap(long, help = "Drop terms in more than this fraction of documents (default: 0.95)")]
    max_df: Option<f64>,
    #[clap(long, help = "Drop terms in fewer than this many documents (default: 1)")]
    min_df: Option<usize>,
    #[clap(long, help = "Remove English stop words before vectorizing")]
    stop_words: bool,
    #[clap(long, conflicts_with = "stop_words", help = "Keep stop words even if the config file removes them")]
    no_stop_words: bool,
    #[clap(short = 'n', long, help = "Top words shown per topic (default: 10)")]
    top_n: Option<usize>,
    #[clap(long, help = "Topic used for outlier extraction (default: last topic)")]
    outlier_topic: Option<usize>,
    #[clap(short, long, help = "Outlier weight threshold, inclusive (default: 0.15)")]
    threshold: Option<f64>,
    #[clap(long, help = "Show the N highest-weighted documents of every topic")]
    inspect: Option<usize>,
    #[clap(long, help = "Write the report as JSON to this path ('-' for stdout)")]
    json: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<(AnalysisConfig, Option<usize>, Option<PathBuf>, PathBuf)> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)
                .with_context(|| format!("failed to read config {}", path.display()))?,
            None => AnalysisConfig::default(),
        };

        if let Some(column) = self.column {
            config.text_column = column;
        }
        if let Some(topics) = self.topics {
            config.nmf.n_topics = topics;
        }
        if let Some(init) = self.init {
            config.nmf.init = init;
        }
        if self.seed.is_some() {
            config.nmf.seed = self.seed;
        }
        if let Some(max_iter) = self.max_iter {
            config.nmf.max_iter = max_iter;
        }
        if let Some(max_df) = self.max_df {
            config.vectorizer.max_df = max_df;
        }
        if let Some(min_df) = self.min_df {
            config.vectorizer.min_df = min_df;
        }
        if self.stop_words {
            config.vectorizer.stop_words = true;
        }
        if self.no_stop_words {
            config.vectorizer.stop_words = false;
        }
        if let Some(top_n) = self.top_n {
            config.top_n = top_n;
        }
        if self.outlier_topic.is_some() {
            config.outlier_topic = self.outlier_topic;
        }
        if let Some(threshold) = self.threshold {
            config.outlier_threshold = threshold;
        }

        Ok((config, self.inspect, self.json, self.path))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("nmf_topics=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let (config, inspect, json, path) = args.into_config()?;
    println!("Path: {}", path.display());

    let analyzer = TopicAnalyzer::new(config).context("invalid analysis configuration")?;
    let config = analyzer.config();

    let corpus = Corpus::from_csv_path(&path, &config.text_column)
        .with_context(|| format!("failed to load corpus from {}", path.display()))?;
    println!("Loaded {} documents. Fitting {} topics...", corpus.len(), config.nmf.n_topics);

    let analysis = analyzer.fit(&corpus).context("topic analysis failed")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out, "\nTop {} words per topic:", config.top_n)?;
    analysis::report_top_words(
        analysis.model.components(),
        analysis.model.vocabulary(),
        config.top_n,
        &mut out,
    )?;
    writeln!(out)?;

    if let Some(n) = inspect {
        print_top_documents(&mut out, &analysis.model, &corpus, n)?;
    }

    let report = AnalysisReport::build(
        &analysis,
        &corpus,
        config.top_n,
        config.outlier_topic(),
        config.outlier_threshold,
    )?;
    report.write_text(&mut out)?;
    out.flush()?;
    drop(out);

    if let Some(json_path) = json {
        report
            .write_json(&json_path)
            .with_context(|| format!("failed to write report to {}", json_path.display()))?;
        info!(path = %json_path.display(), "Wrote JSON report");
    }

    Ok(())
}

fn print_top_documents<W: Write>(
    out: &mut W,
    model: &nmf_topics::models::TopicModel,
    corpus: &Corpus,
    n: usize,
) -> Result<()> {
    writeln!(out, "Top {} documents per topic:", n)?;
    for topic in 0..model.n_topics() {
        writeln!(out, "Topic {}:", topic)?;
        for (row, weight) in analysis::top_documents(model.projection(), topic, n)? {
            let text = corpus.get(row).map(|doc| doc.text.as_str()).unwrap_or("");
            writeln!(out, "   [{:>6}] {:.4}  {}", row, weight, text)?;
        }
    }
    writeln!(out)?;
    Ok(())
}
