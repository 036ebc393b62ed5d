//! Topic analysis over a fitted factorization: word ranking, dominant-topic
//! assignment and outlier extraction.

use std::collections::HashSet;
use std::io::Write;

use counter::Counter;
use ndarray::{Array2, ArrayView1};

use crate::error::{Result, TopicError};
use crate::models::{Corpus, Vocabulary};

/// Order `terms` by their weight in one topic, highest first.
///
/// Terms with equal weight keep their vocabulary order.
pub fn rank_topic_words(weights: ArrayView1<'_, f64>, terms: &[String]) -> Result<Vec<String>> {
    if weights.len() != terms.len() {
        return Err(TopicError::ShapeMismatch {
            what: "topic weights vs vocabulary",
            expected: terms.len(),
            actual: weights.len(),
        });
    }

    let mut order: Vec<usize> = (0..terms.len()).collect();
    order.sort_by(|&a, &b| weights[b].total_cmp(&weights[a]));

    Ok(order.into_iter().map(|i| terms[i].clone()).collect())
}

/// The first `n` ranked terms of every topic, in topic order. `n` is capped at
/// the vocabulary size.
pub fn top_words(
    components: &Array2<f64>,
    vocabulary: &Vocabulary,
    n: usize,
) -> Result<Vec<Vec<String>>> {
    components
        .rows()
        .into_iter()
        .map(|row| {
            let mut ranked = rank_topic_words(row, vocabulary.terms())?;
            ranked.truncate(n);
            Ok(ranked)
        })
        .collect()
}

/// Write one `Topic {k}: a, b, c` line per topic.
pub fn report_top_words<W: Write>(
    components: &Array2<f64>,
    vocabulary: &Vocabulary,
    n: usize,
    out: &mut W,
) -> Result<()> {
    for (topic, words) in top_words(components, vocabulary, n)?.iter().enumerate() {
        writeln!(out, "Topic {}: {}", topic, words.join(", "))?;
    }
    Ok(())
}

/// Column index of the largest weight in each projection row. When several
/// topics share the maximum, the lowest index wins.
pub fn dominant_topics(projection: &Array2<f64>) -> Result<Vec<usize>> {
    if projection.ncols() == 0 && projection.nrows() > 0 {
        return Err(TopicError::EmptyInput("projection has no topic columns"));
    }

    Ok(projection
        .rows()
        .into_iter()
        .map(|row| {
            let mut best = 0;
            for topic in 1..row.len() {
                if row[topic] > row[best] {
                    best = topic;
                }
            }
            best
        })
        .collect())
}

/// Topic assigned to the most documents; ties go to the lowest topic index.
pub fn most_populous_topic(assignments: &[usize]) -> Result<usize> {
    let counts: Counter<usize> = assignments.iter().copied().collect();

    counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(&topic, _)| topic)
        .ok_or(TopicError::EmptyInput("no documents to assign"))
}

/// Number of documents assigned to each of the `k` topics.
pub fn topic_sizes(assignments: &[usize], k: usize) -> Result<Vec<usize>> {
    let mut sizes = vec![0; k];
    for &topic in assignments {
        let slot = sizes.get_mut(topic).ok_or(TopicError::InvalidIndex {
            what: "assigned topic",
            index: topic,
            len: k,
        })?;
        *slot += 1;
    }
    Ok(sizes)
}

fn check_topic(projection: &Array2<f64>, topic: usize) -> Result<()> {
    if topic >= projection.ncols() {
        return Err(TopicError::InvalidIndex {
            what: "topic",
            index: topic,
            len: projection.ncols(),
        });
    }
    Ok(())
}

/// Rows whose weight on `topic` is at least `threshold`, in ascending order.
pub fn outlier_rows(projection: &Array2<f64>, topic: usize, threshold: f64) -> Result<Vec<usize>> {
    check_topic(projection, topic)?;
    if !(threshold >= 0.0) {
        return Err(TopicError::InvalidConfig(format!(
            "outlier threshold must be non-negative, got {}",
            threshold
        )));
    }

    Ok(projection
        .column(topic)
        .iter()
        .enumerate()
        .filter(|(_, weight)| **weight >= threshold)
        .map(|(row, _)| row)
        .collect())
}

/// Drop exact duplicates, keeping the first occurrence of each text.
pub fn unique_texts<'a, I>(texts: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    texts
        .into_iter()
        .filter(|text| seen.insert(*text))
        .map(str::to_string)
        .collect()
}

/// Distinct texts of the documents selected by [`outlier_rows`], in order of
/// first appearance.
pub fn outlier_texts(
    projection: &Array2<f64>,
    corpus: &Corpus,
    topic: usize,
    threshold: f64,
) -> Result<Vec<String>> {
    if corpus.len() != projection.nrows() {
        return Err(TopicError::ShapeMismatch {
            what: "corpus documents vs projection rows",
            expected: projection.nrows(),
            actual: corpus.len(),
        });
    }

    let rows = outlier_rows(projection, topic, threshold)?;
    let documents = corpus.documents();
    Ok(unique_texts(rows.iter().map(|&row| documents[row].text.as_str())))
}

/// The `n` documents weighted highest on `topic`, as `(row, weight)` pairs.
/// Equal weights are ordered by row.
pub fn top_documents(projection: &Array2<f64>, topic: usize, n: usize) -> Result<Vec<(usize, f64)>> {
    check_topic(projection, topic)?;

    let mut weighted: Vec<(usize, f64)> = projection.column(topic).iter().copied().enumerate().collect();
    weighted.sort_by(|a, b| b.1.total_cmp(&a.1));
    weighted.truncate(n);
    Ok(weighted)
}
