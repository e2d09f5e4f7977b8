//! Currency pair configuration loaded from the delimited currency table

use crate::core::error::PipelineError;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// One row of the currency table: a base currency and the pairs to keep for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyPairSpec {
    pub base: String,
    /// Requested pair codes in configuration order, without duplicates.
    pub pairs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CurrencyRow {
    base: String,
    with_pairs: String,
}

pub fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

impl CurrencyPairSpec {
    fn from_row(row: CurrencyRow, line: usize) -> Result<Self, PipelineError> {
        let base = row.base.trim().to_uppercase();
        if !is_currency_code(&base) {
            return Err(PipelineError::Config(format!(
                "row {line}: '{}' is not a 3-letter currency code",
                row.base
            )));
        }

        let mut pairs: Vec<String> = Vec::new();
        for code in row.with_pairs.split_whitespace().map(str::to_uppercase) {
            if !is_currency_code(&code) {
                return Err(PipelineError::Config(format!(
                    "row {line}: '{code}' is not a 3-letter currency code"
                )));
            }
            if pairs.contains(&code) {
                warn!(base = %base, pair = %code, "Ignoring duplicate pair");
                continue;
            }
            pairs.push(code);
        }

        if pairs.is_empty() {
            return Err(PipelineError::Config(format!(
                "row {line}: base {base} has no pairs"
            )));
        }

        Ok(CurrencyPairSpec { base, pairs })
    }
}

/// Parses `base;with_pairs` rows, keeping the order they appear in.
pub fn parse_pair_specs(content: &str) -> Result<Vec<CurrencyPairSpec>, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut specs = Vec::new();
    for (idx, row) in reader.deserialize::<CurrencyRow>().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let row = row.map_err(|e| PipelineError::Config(format!("row {line}: {e}")))?;
        specs.push(CurrencyPairSpec::from_row(row, line)?);
    }
    debug!("Parsed {} currency specs", specs.len());
    Ok(specs)
}

pub async fn load_pair_specs<P: AsRef<Path>>(path: P) -> Result<Vec<CurrencyPairSpec>, PipelineError> {
    let content = tokio::fs::read_to_string(path.as_ref()).await?;
    parse_pair_specs(&content)
}
