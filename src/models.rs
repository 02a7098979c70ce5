use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotMode {
    #[default]
    Full,
    Skeleton,
    Blueprint,
}

impl SnapshotMode {
    /// Never fails: anything that is not a reduced-mode tag means `Full`.
    pub fn parse(raw: &str) -> Self {
        let tag = raw.trim();
        if tag.eq_ignore_ascii_case("skeleton") {
            SnapshotMode::Skeleton
        } else if tag.eq_ignore_ascii_case("blueprint") {
            SnapshotMode::Blueprint
        } else {
            SnapshotMode::Full
        }
    }

    pub fn is_reduced(self) -> bool {
        matches!(self, SnapshotMode::Skeleton | SnapshotMode::Blueprint)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotMode::Full => "full",
            SnapshotMode::Skeleton => "skeleton",
            SnapshotMode::Blueprint => "blueprint",
        }
    }
}

impl fmt::Display for SnapshotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileRecord {
    pub path: String,
    pub bundle: String,
    pub language: String,
    pub content: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Stats {
    pub total_files: usize,
    pub by_language: BTreeMap<String, usize>,
}

impl Stats {
    pub fn record(&mut self, language: &str) {
        self.total_files += 1;
        *self.by_language.entry(language.to_string()).or_insert(0) += 1;
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Metadata {
    pub project_name: String,
    pub mode: SnapshotMode,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SnapshotDocument {
    pub metadata: Metadata,
    pub files: Vec<FileRecord>,
    pub stats: Stats,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// In-memory result of a traversal, before anything touches the output.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub document: SnapshotDocument,
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug, Clone)]
pub struct ExportReport {
    pub stats: Stats,
    pub skipped: Vec<SkippedFile>,
    pub output: PathBuf,
}
