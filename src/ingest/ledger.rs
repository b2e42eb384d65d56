// src/ingest/ledger.rs
//! Seen-title ledger backing deduplication across runs.
//!
//! The on-disk form is a newline-delimited, append-only list of raw titles.
//! Membership is exact string equality.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::IngestError;

/// Titles are staged by `record` and visible to `contains` at once. They only
/// become durable on `commit`; `rollback` forgets whatever is still staged.
pub trait TitleLedger: Send {
    fn contains(&self, title: &str) -> bool;

    /// Stage `title`. Recording a title twice is allowed and harmless.
    fn record(&mut self, title: &str) -> Result<(), IngestError>;

    /// Persist everything staged since the last commit.
    fn commit(&mut self) -> Result<(), IngestError>;

    fn rollback(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Membership key of a title. Line breaks become spaces, which is exactly how
/// the title reads back from the newline-delimited file.
pub fn ledger_key(title: &str) -> Cow<'_, str> {
    if title.contains(['\r', '\n']) {
        Cow::Owned(title.replace(['\r', '\n'], " "))
    } else {
        Cow::Borrowed(title)
    }
}

/// What to do when the ledger file cannot be read or appended to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerFallback {
    /// Abort the run with `LedgerUnavailable`.
    #[default]
    Fail,
    /// Start empty on read failure; keep failed appends in memory only.
    TreatAsEmpty,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryLedger {
    entries: Vec<String>,
    index: HashSet<String>,
    // entries[..committed] are durable
    committed: usize,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger whose titles are all committed.
    pub fn with_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut l = Self::new();
        for t in titles {
            let t: String = t.into();
            l.push(ledger_key(&t).into_owned());
        }
        l.committed = l.entries.len();
        l
    }

    /// Titles in recording order, duplicates and staged ones included.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn staged(&self) -> &[String] {
        &self.entries[self.committed..]
    }

    fn push(&mut self, key: String) {
        self.index.insert(key.clone());
        self.entries.push(key);
    }
}

impl TitleLedger for MemoryLedger {
    fn contains(&self, title: &str) -> bool {
        self.index.contains(ledger_key(title).as_ref())
    }

    fn record(&mut self, title: &str) -> Result<(), IngestError> {
        self.push(ledger_key(title).into_owned());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), IngestError> {
        self.committed = self.entries.len();
        Ok(())
    }

    fn rollback(&mut self) {
        if self.staged().is_empty() {
            return;
        }
        self.entries.truncate(self.committed);
        self.index = self.entries.iter().cloned().collect();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// File-backed ledger. The whole file is read once on open; staged titles
/// are appended in one go on commit.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    mem: MemoryLedger,
    fallback: LedgerFallback,
}

impl FileLedger {
    pub fn open(path: impl Into<PathBuf>, fallback: LedgerFallback) -> Result<Self, IngestError> {
        let path = path.into();
        let mem = match read_titles(&path) {
            Ok(titles) => MemoryLedger::with_titles(titles),
            Err(e) if fallback == LedgerFallback::TreatAsEmpty => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "title ledger unreadable; treating as empty"
                );
                MemoryLedger::new()
            }
            Err(e) => return Err(IngestError::LedgerUnavailable { path, source: e }),
        };
        tracing::debug!(path = %path.display(), titles = mem.len(), "title ledger loaded");
        Ok(Self {
            path,
            mem,
            fallback,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// In-memory copy, e.g. for dry runs that must not touch the file.
    pub fn snapshot(&self) -> MemoryLedger {
        self.mem.clone()
    }
}

impl TitleLedger for FileLedger {
    fn contains(&self, title: &str) -> bool {
        self.mem.contains(title)
    }

    fn record(&mut self, title: &str) -> Result<(), IngestError> {
        self.mem.record(title)
    }

    /// On a fatal append failure the titles stay staged, so the next commit
    /// retries them.
    fn commit(&mut self) -> Result<(), IngestError> {
        let staged = self.mem.staged();
        if staged.is_empty() {
            return Ok(());
        }
        match append_lines(&self.path, staged) {
            Ok(()) => {}
            Err(e) if self.fallback == LedgerFallback::TreatAsEmpty => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    titles = staged.len(),
                    "title ledger append failed; keeping titles in memory only"
                );
            }
            Err(e) => {
                return Err(IngestError::LedgerUnavailable {
                    path: self.path.clone(),
                    source: e,
                })
            }
        }
        self.mem.commit()
    }

    fn rollback(&mut self) {
        self.mem.rollback();
    }

    fn len(&self) -> usize {
        self.mem.len()
    }
}

/// Missing file means first run: empty ledger, not an error.
fn read_titles(path: &Path) -> io::Result<Vec<String>> {
    let content = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    Ok(content
        .lines()
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

// keys never contain line breaks, one per line
fn append_lines(path: &Path, keys: &[String]) -> io::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut buf = String::new();
    for k in keys {
        buf.push_str(k);
        buf.push('\n');
    }
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    f.write_all(buf.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_ledger_keeps_duplicates_but_membership_is_boolean() {
        let mut l = MemoryLedger::new();
        l.record("A").unwrap();
        l.record("A").unwrap();
        assert!(l.contains("A"));
        assert!(!l.contains("a"));
        assert_eq!(l.len(), 2);
        assert_eq!(l.entries(), &["A".to_string(), "A".to_string()]);
    }

    #[test]
    fn file_ledger_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("titles.txt");

        let mut l = FileLedger::open(&p, LedgerFallback::Fail).unwrap();
        assert!(l.is_empty());
        l.record("Omicron wave peaks").unwrap();
        assert!(l.contains("Omicron wave peaks"));
        // staged only until commit
        assert!(!FileLedger::open(&p, LedgerFallback::Fail).unwrap().contains("Omicron wave peaks"));
        l.commit().unwrap();

        let reopened = FileLedger::open(&p, LedgerFallback::Fail).unwrap();
        assert!(reopened.contains("Omicron wave peaks"));
        assert!(!reopened.contains("Omicron wave peaks "));
        assert_eq!(fs::read_to_string(&p).unwrap(), "Omicron wave peaks\n");
    }

    #[test]
    fn unreadable_ledger_fails_unless_fallback_configured() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be read as a file
        let p = dir.path().join("titles.txt");
        fs::create_dir(&p).unwrap();

        let err = FileLedger::open(&p, LedgerFallback::Fail).unwrap_err();
        assert!(matches!(err, IngestError::LedgerUnavailable { .. }));

        let mut l = FileLedger::open(&p, LedgerFallback::TreatAsEmpty).unwrap();
        assert!(l.is_empty());
        // append fails too, but the title is still remembered for this process
        l.record("Vaccine rollout").unwrap();
        l.commit().unwrap();
        assert!(l.contains("Vaccine rollout"));
    }

    #[test]
    fn title_with_line_break_is_still_seen_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("titles.txt");

        let mut l = FileLedger::open(&p, LedgerFallback::Fail).unwrap();
        l.record("Omicron\nwave\r\npeaks").unwrap();
        l.commit().unwrap();
        assert!(l.contains("Omicron\nwave\r\npeaks"));

        let reopened = FileLedger::open(&p, LedgerFallback::Fail).unwrap();
        assert!(reopened.contains("Omicron\nwave\r\npeaks"));
        assert_eq!(reopened.len(), 1);
        assert_eq!(fs::read_to_string(&p).unwrap(), "Omicron wave  peaks\n");
    }

    #[test]
    fn rollback_drops_staged_titles_only() {
        let mut l = MemoryLedger::with_titles(["Old"]);
        l.record("New").unwrap();
        l.record("Old").unwrap();
        assert!(l.contains("New"));
        l.rollback();
        assert!(!l.contains("New"));
        assert!(l.contains("Old"));
        assert_eq!(l.entries(), &["Old".to_string()]);
    }

    #[test]
    fn failed_commit_keeps_titles_staged_for_retry() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("titles.txt");
        let mut l = FileLedger::open(&p, LedgerFallback::Fail).unwrap();
        fs::create_dir(&p).unwrap();

        l.record("A").unwrap();
        let err = l.commit().unwrap_err();
        assert!(matches!(err, IngestError::LedgerUnavailable { .. }));
        assert!(l.contains("A"));

        fs::remove_dir(&p).unwrap();
        l.commit().unwrap();
        assert_eq!(fs::read_to_string(&p).unwrap(), "A\n");
    }

    #[test]
    fn blank_lines_are_ignored_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("titles.txt");
        fs::write(&p, "A\n\nB\n").unwrap();
        let l = FileLedger::open(&p, LedgerFallback::Fail).unwrap();
        assert_eq!(l.len(), 2);
        assert!(l.contains("B"));
    }
}
