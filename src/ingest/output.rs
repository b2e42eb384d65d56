// src/ingest/output.rs
//! Output sink: one JSON document per run, appended.
//!
//! The output file is a stream of independent `{"news articles": [...]}`
//! documents, not one growing array. Use [`read_batches`] to parse it back.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::error::IngestError;
use crate::ingest::types::NewsBatch;

pub trait OutputSink: Send {
    /// Called exactly once per run, also for empty batches.
    fn write_batch(&mut self, batch: &NewsBatch) -> Result<(), IngestError>;
}

pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, batch: &NewsBatch) -> io::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        // serialize fully first so a failure never leaves half a document
        let mut doc = serde_json::to_vec_pretty(batch).map_err(io::Error::other)?;
        doc.push(b'\n');
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        f.write_all(&doc)
    }
}

impl OutputSink for JsonFileSink {
    fn write_batch(&mut self, batch: &NewsBatch) -> Result<(), IngestError> {
        self.append(batch).map_err(|e| IngestError::Output {
            path: self.path.clone(),
            source: e,
        })?;
        tracing::debug!(
            path = %self.path.display(),
            articles = batch.articles.len(),
            "news batch appended"
        );
        Ok(())
    }
}

/// Keeps batches in memory; dry runs and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub batches: Vec<NewsBatch>,
}

impl OutputSink for MemorySink {
    fn write_batch(&mut self, batch: &NewsBatch) -> Result<(), IngestError> {
        self.batches.push(batch.clone());
        Ok(())
    }
}

/// Prints the batch instead of persisting it (`run --dry-run`).
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_batch(&mut self, batch: &NewsBatch) -> Result<(), IngestError> {
        let out = io::stdout();
        let mut lock = out.lock();
        serde_json::to_writer_pretty(&mut lock, batch)
            .map_err(io::Error::other)
            .and_then(|_| writeln!(lock))
            .map_err(|e| IngestError::Output {
                path: PathBuf::from("<stdout>"),
                source: e,
            })
    }
}

/// Parse every document in an output file, oldest first. Missing file is empty.
pub fn read_batches(path: &Path) -> anyhow::Result<Vec<NewsBatch>> {
    let content = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    serde_json::Deserializer::from_str(&content)
        .into_iter::<NewsBatch>()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("parsing news batches in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::CanonicalArticle;

    fn article(title: &str) -> CanonicalArticle {
        CanonicalArticle {
            content: title.into(),
            country: "World".into(),
            date: "5/3/22".into(),
            kind: "Reuters".into(),
            source: "https://example.test".into(),
        }
    }

    #[test]
    fn wire_shape_matches_output_format() {
        let batch = NewsBatch {
            articles: vec![article("A")],
        };
        let v = serde_json::to_value(&batch).unwrap();
        let a = &v["news articles"][0];
        assert_eq!(a["Content"], "A");
        assert_eq!(a["Country"], "World");
        assert_eq!(a["Date"], "5/3/22");
        assert_eq!(a["Type"], "Reuters");
        assert_eq!(a["Source"], "https://example.test");
    }

    #[test]
    fn runs_append_independent_documents() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("out/news_file.json");
        let mut sink = JsonFileSink::new(&p);
        sink.write_batch(&NewsBatch {
            articles: vec![article("A"), article("B")],
        })
        .unwrap();
        sink.write_batch(&NewsBatch::default()).unwrap();

        let batches = read_batches(&p).unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].articles.len(), 2);
        assert!(batches[1].articles.is_empty());
    }

    #[test]
    fn unwritable_sink_reports_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonFileSink::new(dir.path());
        let err = sink.write_batch(&NewsBatch::default()).unwrap_err();
        assert!(matches!(err, IngestError::Output { .. }));
    }
}
