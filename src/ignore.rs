/*============================================================
  Synavera Project: Syn-Syu
  Module: sysup_core::ignore
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Move records matching user glob patterns out of their
    buckets into the ignored or warned lists.

  Security / Safety Notes:
    Patterns are matched against package names only.

  Dependencies:
    glob for shell-style pattern matching.

  Operational Scope:
    Runs once between classification and ranking.

  Revision History:
    2025-11-12 COD  Authored ignore/warn filtering.
    2025-11-19 COD  Removed unused list helpers.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Partition semantics: every record ends in one place
    - Invalid patterns degrade to exact-name matches
============================================================*/

use glob::Pattern;
use serde::Serialize;

use crate::classify::{BucketKind, BucketSet};
use crate::logger::Logger;
use crate::package_info::UpdateRecord;

/// Compiled set of shell-style patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<NamePattern>,
}

#[derive(Debug, Clone)]
enum NamePattern {
    Glob(Pattern),
    Exact(String),
}

impl PatternSet {
    /// Compile patterns, keeping unparsable ones as exact names.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let patterns = patterns
            .iter()
            .map(|raw| raw.as_ref().trim())
            .filter(|raw| !raw.is_empty())
            .map(|raw| match Pattern::new(raw) {
                Ok(pattern) => NamePattern::Glob(pattern),
                Err(_) => NamePattern::Exact(raw.to_string()),
            })
            .collect();
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| match pattern {
            NamePattern::Glob(glob) => glob.matches(name),
            NamePattern::Exact(exact) => exact == name,
        })
    }
}

/// A record removed from its bucket, with the bucket it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilteredRecord {
    pub bucket: BucketKind,
    pub record: UpdateRecord,
}

/// Buckets after filtering plus the moved records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOutcome {
    pub buckets: BucketSet,
    pub ignored: Vec<FilteredRecord>,
    pub warned: Vec<FilteredRecord>,
}

/// Ignore and warn pattern sets applied to a bucket set.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    ignore: PatternSet,
    warn: PatternSet,
}

impl IgnoreFilter {
    pub fn new(ignore: PatternSet, warn: PatternSet) -> Self {
        Self { ignore, warn }
    }

    /// Move matching records out; ignore patterns take precedence over warn.
    pub fn apply(&self, mut buckets: BucketSet, logger: &Logger) -> FilterOutcome {
        let ignored = into_filtered(buckets.extract_if(|record| self.ignore.matches(record.name())));
        let warned = into_filtered(buckets.extract_if(|record| self.warn.matches(record.name())));

        for entry in &ignored {
            logger.info("IGNORE", format!("Ignoring {}", entry.record.name()));
        }
        if !warned.is_empty() {
            logger.info(
                "WARN_PKG",
                format!("{} package(s) flagged for update warning", warned.len()),
            );
        }

        FilterOutcome {
            buckets,
            ignored,
            warned,
        }
    }
}

fn into_filtered(moved: Vec<(BucketKind, UpdateRecord)>) -> Vec<FilteredRecord> {
    moved
        .into_iter()
        .map(|(bucket, record)| FilteredRecord { bucket, record })
        .collect()
}
