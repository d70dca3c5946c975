//! Fact sinks: where translated rows go.
//!
//! A sink only appends ordered string tuples to named relations. It enforces
//! neither uniqueness nor schema; downstream tooling deduplicates rows.

use crate::errors::FactsResult;
use crate::relations::Relation;
use df_utils::{strings, writers};
use log::{debug, error};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use strum::IntoEnumIterator;

/// Output channel of the translator.
///
/// Implementations must serialize concurrent appends to a same relation.
pub trait FactSink: Send + Sync {
    fn add(&self, relation: Relation, columns: &[&str]);
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // rows are appended whole, a panicking writer cannot leave a half row
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Writes the `StringRaw` and `StringConstant` rows of a string constant and
/// returns its identifier.
pub fn write_string_constant(sink: &dyn FactSink, constant: &str) -> String {
    let raw = strings::encode_string_constant(constant);
    let id = strings::string_constant_id(&raw);
    sink.add(Relation::StringRaw, &[&id, &raw]);
    sink.add(Relation::StringConstant, &[&id]);
    id
}

/// A directory of tab-separated `.facts` files, one per relation, each
/// guarded by its own lock.
///
/// Write failures do not interrupt translation: the first one is kept and
/// returned by [`Database::flush`].
#[derive(Debug)]
pub struct Database {
    dir: PathBuf,
    writers: BTreeMap<Relation, Mutex<BufWriter<File>>>,
    failure: Mutex<Option<io::Error>>,
}

impl Database {
    /// Creates the output directory if needed and truncates every relation
    /// file, so that relations without rows still exist as empty files.
    pub fn create<P: AsRef<Path>>(dir: P) -> FactsResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let mut writers = BTreeMap::new();
        for relation in Relation::iter() {
            let file = File::create(dir.join(relation.file_name()))?;
            writers.insert(relation, Mutex::new(BufWriter::new(file)));
        }
        debug!("{} relation files created in {}", writers.len(), dir.display());
        Ok(Self {
            dir,
            writers,
            failure: Mutex::new(None),
        })
    }

    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Flushes every relation file and reports the first write failure.
    pub fn flush(&self) -> FactsResult<()> {
        for writer in self.writers.values() {
            lock(writer).flush()?;
        }
        match lock(&self.failure).take() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    fn record_failure(&self, relation: Relation, err: io::Error) {
        let mut failure = lock(&self.failure);
        if failure.is_none() {
            error!("cannot write {} row: {err}", relation.name());
            *failure = Some(err);
        }
    }
}

impl FactSink for Database {
    fn add(&self, relation: Relation, columns: &[&str]) {
        if let Some(writer) = self.writers.get(&relation) {
            if let Err(err) = writers::row(&mut *lock(writer), columns) {
                self.record_failure(relation, err);
            }
        }
    }
}

/// An in-memory sink keeping rows in insertion order.
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: Mutex<BTreeMap<Relation, Vec<Vec<String>>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn rows(&self, relation: Relation) -> Vec<Vec<String>> {
        lock(&self.rows)
            .get(&relation)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn count(&self, relation: Relation) -> usize {
        lock(&self.rows).get(&relation).map_or(0, Vec::len)
    }

    /// Returns every relation with at least one row.
    #[must_use]
    pub fn relations(&self) -> Vec<Relation> {
        lock(&self.rows).keys().copied().collect()
    }
}

impl FactSink for MemorySink {
    fn add(&self, relation: Relation, columns: &[&str]) {
        lock(&self.rows)
            .entry(relation)
            .or_default()
            .push(columns.iter().map(ToString::to_string).collect());
    }
}
