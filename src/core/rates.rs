//! Rate snapshots, normalized rate records and the source abstraction

use crate::core::currency::CurrencyPairSpec;
use crate::core::error::PipelineError;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::HashMap;

/// Rates published for one base currency on one date.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RateSnapshot {
    #[serde(rename = "date")]
    pub as_of: NaiveDate,
    /// Kept as JSON numbers so `160` is written back as `160`, not `160.0`
    pub rates: HashMap<String, Number>,
}

/// A snapshot projected onto the pairs requested for its base currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateRecord {
    pub base: String,
    #[serde(serialize_with = "serialize_ordered_rates")]
    pub rates: Vec<(String, Number)>,
    #[serde(rename = "last_update")]
    pub as_of: NaiveDate,
}

fn serialize_ordered_rates<S>(rates: &[(String, Number)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(rates.iter().map(|(code, rate)| (code, rate)))
}

impl RateRecord {
    pub fn rate(&self, pair: &str) -> Option<f64> {
        self.rates
            .iter()
            .find(|(code, _)| code == pair)
            .and_then(|(_, rate)| rate.as_f64())
    }

    /// Serializes the record as a single JSON line, without the trailing newline.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self, base: &str) -> Result<RateSnapshot, PipelineError>;
}

/// Keeps only the requested pairs, failing if any of them is absent.
pub fn project(spec: &CurrencyPairSpec, snapshot: &RateSnapshot) -> Result<RateRecord, PipelineError> {
    let rates = spec
        .pairs
        .iter()
        .map(|pair| {
            snapshot
                .rates
                .get(pair)
                .map(|rate| (pair.clone(), rate.clone()))
                .ok_or_else(|| PipelineError::MissingPair {
                    base: spec.base.clone(),
                    pair: pair.clone(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RateRecord {
        base: spec.base.clone(),
        rates,
        as_of: snapshot.as_of,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eur_snapshot() -> RateSnapshot {
        serde_json::from_str(r#"{"date":"2024-01-01","rates":{"USD":1.1,"GBP":0.85,"JPY":160}}"#)
            .unwrap()
    }

    fn spec(base: &str, pairs: &[&str]) -> CurrencyPairSpec {
        CurrencyPairSpec {
            base: base.to_string(),
            pairs: pairs.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_project_keeps_exactly_requested_pairs() {
        let record = project(&spec("EUR", &["USD", "GBP"]), &eur_snapshot()).unwrap();

        let keys: Vec<&str> = record.rates.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["USD", "GBP"]);
        assert_eq!(record.rate("USD"), Some(1.1));
        assert_eq!(record.rate("JPY"), None);
        assert_eq!(record.as_of, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_project_serializes_in_output_format() {
        let record = project(&spec("EUR", &["USD", "GBP"]), &eur_snapshot()).unwrap();
        assert_eq!(
            record.to_json_line().unwrap(),
            r#"{"base":"EUR","rates":{"USD":1.1,"GBP":0.85},"last_update":"2024-01-01"}"#
        );
    }

    #[test]
    fn test_project_keeps_integer_rates_as_published() {
        let record = project(&spec("EUR", &["JPY", "USD"]), &eur_snapshot()).unwrap();
        assert_eq!(record.rate("JPY"), Some(160.0));
        assert_eq!(
            record.to_json_line().unwrap(),
            r#"{"base":"EUR","rates":{"JPY":160,"USD":1.1},"last_update":"2024-01-01"}"#
        );
    }

    #[test]
    fn test_project_fails_on_missing_pair() {
        let err = project(&spec("EUR", &["USD", "CAD"]), &eur_snapshot()).unwrap_err();
        match err {
            PipelineError::MissingPair { base, pair } => {
                assert_eq!(base, "EUR");
                assert_eq!(pair, "CAD");
            }
            other => panic!("Expected MissingPair, got {other:?}"),
        }
    }
}
