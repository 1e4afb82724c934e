//! Joke dataset snapshots
//!
//! The dataset file is a JSON object keyed by level ("1".."5"), each value an
//! ordered array of joke strings. A [`JokeStore`] is an immutable in-memory
//! snapshot of that file. Tools never edit a snapshot in place: they build a
//! new one and [`JokeStore::commit`] it (backup first, then atomic write).

use crate::fsutil::{write_atomic, write_backup};
use crate::{CornLevel, Error, Result};
use chrono::Local;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Top-level entries of a dataset document in file order, repeats included
struct LevelEntries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for LevelEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = LevelEntries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object keyed by level")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<LevelEntries, A::Error> {
                let mut entries = Vec::new();
                while let Some(entry) = map.next_entry::<String, serde_json::Value>()? {
                    entries.push(entry);
                }
                Ok(LevelEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// One joke as filed in the dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct JokeRecord {
    pub text: String,
    pub declared_level: CornLevel,
}

impl JokeRecord {
    pub fn new(text: impl Into<String>, declared_level: CornLevel) -> Self {
        Self {
            text: text.into(),
            declared_level,
        }
    }

    /// Length in characters (not bytes)
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Immutable snapshot of the dataset
///
/// Records are ordered by level, then by position within the level. The index
/// of a record in [`JokeStore::records`] is its first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JokeStore {
    records: Vec<JokeRecord>,
}

/// What [`JokeStore::commit`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Dry run: nothing touched
    DryRun,
    /// New contents identical to the file on disk: nothing touched
    Unchanged,
    /// File written; `backup` holds the copy of the previous contents, if any
    Written { backup: Option<PathBuf> },
}

/// Options for [`JokeStore::commit`]
#[derive(Debug, Clone)]
pub struct CommitOptions<'a> {
    /// Operation name used in the backup file name ("clean", "dedup", ...)
    pub operation: &'a str,
    pub dry_run: bool,
}

/// Records present in one snapshot and not the other (multiset difference)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreDiff {
    pub removed: Vec<JokeRecord>,
    pub added: Vec<JokeRecord>,
}

impl StoreDiff {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

impl JokeStore {
    /// Build a snapshot, ordering records by level (stable within a level)
    pub fn from_records(mut records: Vec<JokeRecord>) -> Self {
        records.sort_by_key(|r| r.declared_level);
        Self { records }
    }

    /// Load and validate a dataset file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::MalformedDataset(format!("dataset file not found: {}", path.display()))
            } else {
                Error::Io(e)
            }
        })?;
        let store = Self::from_json_str(&content)?;
        info!(
            "Loaded {} jokes from {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    /// Parse and validate the level-keyed JSON document
    ///
    /// Fails on unparseable JSON, a non-object root, unknown or missing level
    /// keys, non-array values and non-string entries.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let root: Value = serde_json::from_str(content)
            .map_err(|e| Error::MalformedDataset(format!("unparseable JSON: {}", e)))?;
        if !root.is_object() {
            return Err(Error::MalformedDataset(
                "top-level value must be an object keyed by level".to_string(),
            ));
        }
        // serde_json's object keeps only the last of a repeated key
        let LevelEntries(entries) = serde_json::from_str(content)
            .map_err(|e| Error::MalformedDataset(format!("unparseable JSON: {}", e)))?;

        let mut by_level: [Option<&Vec<Value>>; 5] = [None; 5];
        for (key, value) in &entries {
            let level = CornLevel::from_key(key)
                .filter(|l| l.key() == *key)
                .ok_or_else(|| {
                    Error::MalformedDataset(format!("unexpected key '{}' (expected \"1\"..\"5\")", key))
                })?;
            if by_level[level.index()].is_some() {
                return Err(Error::MalformedDataset(format!(
                    "level key \"{}\" appears more than once",
                    key
                )));
            }
            let list = value.as_array().ok_or_else(|| {
                Error::MalformedDataset(format!("level {} must be an array of strings", key))
            })?;
            by_level[level.index()] = Some(list);
        }

        let mut records = Vec::new();
        for level in CornLevel::all() {
            let list = by_level[level.index()].ok_or_else(|| {
                Error::MalformedDataset(format!("missing level key \"{}\"", level.key()))
            })?;
            for (position, entry) in list.iter().enumerate() {
                let text = entry.as_str().ok_or_else(|| {
                    Error::MalformedDataset(format!(
                        "level {} entry {} is not a string: {}",
                        level, position, entry
                    ))
                })?;
                records.push(JokeRecord::new(text, *level));
            }
        }

        Ok(Self { records })
    }

    /// Serialize to the dataset document (2-space indent, trailing newline)
    pub fn to_json_string(&self) -> Result<String> {
        let mut document: BTreeMap<String, Vec<&str>> = CornLevel::all()
            .iter()
            .map(|l| (l.key(), Vec::new()))
            .collect();
        for record in &self.records {
            if let Some(list) = document.get_mut(&record.declared_level.key()) {
                list.push(&record.text);
            }
        }
        let mut out = serde_json::to_string_pretty(&document)?;
        out.push('\n');
        Ok(out)
    }

    /// Write this snapshot to `target`
    ///
    /// Order of operations: skip if dry run, skip if contents unchanged,
    /// back up the existing file, then write atomically. A failed write leaves
    /// both the original file and the backup intact.
    pub fn commit(&self, target: &Path, options: &CommitOptions<'_>) -> Result<CommitOutcome> {
        if options.dry_run {
            debug!("Dry run: not writing {}", target.display());
            return Ok(CommitOutcome::DryRun);
        }

        let contents = self.to_json_string()?;
        let mut backup = None;
        if target.exists() {
            if std::fs::read(target)? == contents.as_bytes() {
                info!("No changes to write to {}", target.display());
                return Ok(CommitOutcome::Unchanged);
            }
            let path = write_backup(target, options.operation, Local::now())?;
            info!("Backup created: {}", path.display());
            backup = Some(path);
        }

        write_atomic(target, contents.as_bytes())?;
        info!("Wrote {} jokes to {}", self.len(), target.display());
        Ok(CommitOutcome::Written { backup })
    }

    pub fn records(&self) -> &[JokeRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<JokeRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records filed under `level`, in dataset order
    pub fn level(&self, level: CornLevel) -> impl Iterator<Item = &JokeRecord> {
        self.records
            .iter()
            .filter(move |r| r.declared_level == level)
    }

    /// Joke texts filed under `level`, in dataset order
    pub fn texts(&self, level: CornLevel) -> Vec<&str> {
        self.level(level).map(|r| r.text.as_str()).collect()
    }

    /// Record count per level, indexed by [`CornLevel::index`]
    pub fn count_by_level(&self) -> [usize; 5] {
        let mut counts = [0; 5];
        for record in &self.records {
            counts[record.declared_level.index()] += 1;
        }
        counts
    }

    /// Multiset difference between `self` (before) and `after`
    pub fn diff(&self, after: &JokeStore) -> StoreDiff {
        let mut remaining: Vec<Option<&JokeRecord>> = after.records.iter().map(Some).collect();
        let mut removed = Vec::new();
        for record in &self.records {
            let found = remaining
                .iter_mut()
                .find(|slot| slot.map_or(false, |r| r == record));
            match found {
                Some(slot) => *slot = None,
                None => removed.push(record.clone()),
            }
        }
        let added = remaining.into_iter().flatten().cloned().collect();
        StoreDiff { removed, added }
    }
}
