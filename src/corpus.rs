use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::error::{Result, TopicError};
use crate::models::Corpus;

impl Corpus {
    /// Load the text column of a CSV file with a header row.
    ///
    /// Records that are shorter than the header, or whose text field is empty,
    /// produce an empty document rather than being skipped, so row positions
    /// line up with the CSV data rows.
    pub fn from_csv_path(path: &Path, column: &str) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers = reader.headers()?.clone();
        let column_index = headers
            .iter()
            .position(|name| name.trim() == column)
            .ok_or_else(|| TopicError::MissingColumn(column.to_string()))?;

        let mut texts = Vec::new();
        let mut missing = 0usize;
        for record in reader.records() {
            let record = record?;
            let text = record.get(column_index).unwrap_or("");
            if text.is_empty() {
                missing += 1;
            }
            texts.push(text.to_string());
        }

        if missing > 0 {
            debug!(missing, "Normalized missing text fields to empty strings");
        }
        info!(
            path = %path.display(),
            column,
            documents = texts.len(),
            "Loaded corpus"
        );

        Ok(Corpus::from_texts(texts))
    }
}
