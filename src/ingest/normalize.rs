// src/ingest/normalize.rs
//! Raw provider article -> [`CanonicalArticle`].

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use serde_json::Value;

use crate::error::IngestError;
use crate::ingest::classify::CountryClassifier;
use crate::ingest::ledger::TitleLedger;
use crate::ingest::types::{ArticleFields, CanonicalArticle, RawArticle};

/// `YYYY-MM-DD...` -> `D/M/YY` with no leading zeros on any component.
/// Only the first 10 characters are looked at.
pub fn format_date(iso: &str) -> Result<String, IngestError> {
    let prefix = iso
        .get(..10)
        .ok_or_else(|| IngestError::MalformedArticle(format!("date too short: {iso:?}")))?;
    let d = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
        .map_err(|e| IngestError::MalformedArticle(format!("bad date {prefix:?}: {e}")))?;
    Ok(format!(
        "{}/{}/{}",
        d.day(),
        d.month(),
        d.year().rem_euclid(100)
    ))
}

/// An article dropped from a batch, with the reason.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkippedArticle {
    pub provider: String,
    pub title: Option<String>,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub accepted: Vec<CanonicalArticle>,
    pub duplicates: usize,
    pub malformed: Vec<SkippedArticle>,
}

pub struct ArticleNormalizer<'a> {
    classifier: &'a CountryClassifier,
    ledger: &'a mut dyn TitleLedger,
}

impl<'a> ArticleNormalizer<'a> {
    pub fn new(classifier: &'a CountryClassifier, ledger: &'a mut dyn TitleLedger) -> Self {
        Self { classifier, ledger }
    }

    /// `Ok(None)` means the title was already seen. On acceptance the title is
    /// staged in the ledger before returning; the caller commits it once the
    /// batch has been written.
    pub fn normalize(
        &mut self,
        raw: &RawArticle,
        fields: &ArticleFields,
    ) -> Result<Option<CanonicalArticle>, IngestError> {
        let title = required_str(raw, &fields.title, "title")?;
        if self.ledger.contains(title) {
            return Ok(None);
        }

        let date = format_date(required_str(raw, &fields.published_at, "published date")?)?;
        let outlet = required_str(raw, &fields.outlet, "outlet name")?;
        let url = required_str(raw, &fields.url, "url")?;

        let article = CanonicalArticle {
            content: title.to_string(),
            country: self.classifier.classify(title),
            date,
            kind: outlet.to_string(),
            source: url.to_string(),
        };
        self.ledger.record(title)?;
        Ok(Some(article))
    }

    /// Normalize in input order. Malformed articles are skipped and reported;
    /// only ledger failures escape.
    pub fn normalize_batch(
        &mut self,
        provider: &str,
        raws: &[RawArticle],
        fields: &ArticleFields,
    ) -> Result<BatchOutcome, IngestError> {
        let mut out = BatchOutcome {
            accepted: Vec::with_capacity(raws.len()),
            ..Default::default()
        };
        for raw in raws {
            match self.normalize(raw, fields) {
                Ok(Some(a)) => out.accepted.push(a),
                Ok(None) => out.duplicates += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    let title = raw
                        .pointer(&fields.title)
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    tracing::debug!(provider, error = %e, "skipping malformed article");
                    out.malformed.push(SkippedArticle {
                        provider: provider.to_string(),
                        title,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(out)
    }
}

fn required_str<'v>(raw: &'v Value, pointer: &str, what: &str) -> Result<&'v str, IngestError> {
    match raw.pointer(pointer).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(IngestError::MalformedArticle(format!(
            "missing {what} at {pointer}"
        ))),
    }
}
