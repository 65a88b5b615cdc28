/*============================================================
  Synavera Project: Syn-Syu
  Module: sysup_core::package_info
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Shared structures describing installed packages, sync
    database candidates, AUR records and the typed update
    records produced by classification.

  Security / Safety Notes:
    Pure data container; no I/O performed in this module.

  Dependencies:
    serde for report serialization, chrono for timestamps.

  Operational Scope:
    Used by the classifier, filter, ranking and formatting
    layers, and filled by the pacman/AUR adapters.

  Revision History:
    2024-11-04 COD  Introduced shared VersionInfo type.
    2025-11-12 COD  Replaced VersionInfo with snapshot types
                    and the origin-tagged UpdateRecord.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Clear data contracts between modules
    - Invariants checked once, at construction
============================================================*/

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Result, SysupError};

/// Literal new-version placeholder for staleness-driven devel updates.
pub const DEVEL_SENTINEL: &str = "devel";

/// A package currently installed on the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPackage {
    pub version: String,
    pub installed_at: DateTime<Utc>,
}

/// Installed packages keyed by name.
pub type LocalSnapshot = BTreeMap<String, LocalPackage>;

/// A candidate from a sync database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoPackage {
    pub name: String,
    pub version: String,
    pub repository: String,
    pub description: Option<String>,
    pub download_size: Option<u64>,
    pub installed_size: Option<u64>,
    pub groups: Vec<String>,
    pub replaces: Vec<String>,
    pub build_date: Option<DateTime<Utc>>,
}

/// A record returned by the AUR RPC interface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AurPackage {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub maintainer: Option<String>,
    pub out_of_date: Option<DateTime<Utc>>,
    pub popularity: Option<f64>,
    pub votes: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Outcome of an AUR lookup: found records plus names without a match.
#[derive(Debug, Clone, Default)]
pub struct AurLookup {
    pub found: Vec<AurPackage>,
    pub not_found: Vec<String>,
}

/// Where the suggested version comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Origin {
    Repo {
        repository: String,
        download_size: Option<u64>,
        installed_size: Option<u64>,
    },
    Aur {
        maintainer: Option<String>,
        out_of_date: Option<DateTime<Utc>>,
        devel_staleness_days: Option<i64>,
    },
}

impl Origin {
    /// Repo origin without size information.
    pub fn repo(repository: impl Into<String>) -> Self {
        Origin::Repo {
            repository: repository.into(),
            download_size: None,
            installed_size: None,
        }
    }

    /// AUR origin with a maintainer and no markers.
    pub fn aur(maintainer: Option<&str>) -> Self {
        Origin::Aur {
            maintainer: maintainer.map(str::to_string),
            out_of_date: None,
            devel_staleness_days: None,
        }
    }

    pub fn is_aur(&self) -> bool {
        matches!(self, Origin::Aur { .. })
    }
}

/// A classified update suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateRecord {
    name: String,
    current_version: String,
    new_version: String,
    description: Option<String>,
    origin: Origin,
    required_by: Vec<String>,
    provided_by: Vec<String>,
    member_of_groups: Vec<String>,
    replaces: Vec<String>,
}

impl UpdateRecord {
    /// Build a record, rejecting an empty name or two empty versions.
    pub fn new(
        name: impl Into<String>,
        current_version: impl Into<String>,
        new_version: impl Into<String>,
        origin: Origin,
    ) -> Result<Self> {
        let name = name.into();
        let current_version = current_version.into();
        let new_version = new_version.into();

        if name.is_empty() {
            return Err(SysupError::malformed("<unnamed>", "package name is empty"));
        }
        if current_version.is_empty() && new_version.is_empty() {
            return Err(SysupError::malformed(
                name,
                "current and new version are both empty",
            ));
        }

        Ok(Self {
            name,
            current_version,
            new_version,
            description: None,
            origin,
            required_by: Vec::new(),
            provided_by: Vec::new(),
            member_of_groups: Vec::new(),
            replaces: Vec::new(),
        })
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|desc| !desc.is_empty());
        self
    }

    pub fn with_required_by(mut self, names: Vec<String>) -> Self {
        self.required_by = names;
        self
    }

    pub fn with_provided_by(mut self, names: Vec<String>) -> Self {
        self.provided_by = names;
        self
    }

    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.member_of_groups = groups;
        self
    }

    pub fn with_replaces(mut self, names: Vec<String>) -> Self {
        self.replaces = names;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    pub fn new_version(&self) -> &str {
        &self.new_version
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn required_by(&self) -> &[String] {
        &self.required_by
    }

    pub fn provided_by(&self) -> &[String] {
        &self.provided_by
    }

    pub fn member_of_groups(&self) -> &[String] {
        &self.member_of_groups
    }

    pub fn replaces(&self) -> &[String] {
        &self.replaces
    }

    /// Repository name for repo-origin records.
    pub fn repository(&self) -> Option<&str> {
        match &self.origin {
            Origin::Repo { repository, .. } => Some(repository),
            Origin::Aur { .. } => None,
        }
    }

    pub fn devel_staleness_days(&self) -> Option<i64> {
        match &self.origin {
            Origin::Aur {
                devel_staleness_days,
                ..
            } => *devel_staleness_days,
            Origin::Repo { .. } => None,
        }
    }

    /// True when the record was synthesized from install age, not versions.
    pub fn is_devel_refresh(&self) -> bool {
        self.new_version == DEVEL_SENTINEL && self.devel_staleness_days().is_some()
    }
}

/// A package offered by a search, from either source.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchCandidate {
    Repo(RepoPackage),
    Aur(AurPackage),
}

impl SearchCandidate {
    pub fn name(&self) -> &str {
        match self {
            SearchCandidate::Repo(pkg) => &pkg.name,
            SearchCandidate::Aur(pkg) => &pkg.name,
        }
    }

    pub fn version(&self) -> &str {
        match self {
            SearchCandidate::Repo(pkg) => &pkg.version,
            SearchCandidate::Aur(pkg) => &pkg.version,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            SearchCandidate::Repo(pkg) => pkg.description.as_deref(),
            SearchCandidate::Aur(pkg) => pkg.description.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_rejects_two_empty_versions() {
        let err = UpdateRecord::new("foo", "", "", Origin::repo("core")).unwrap_err();
        assert!(matches!(err, SysupError::MalformedInput { ref name, .. } if name == "foo"));
    }

    #[test]
    fn record_rejects_empty_name() {
        assert!(UpdateRecord::new("", "1.0", "1.1", Origin::repo("core")).is_err());
    }

    #[test]
    fn new_dependency_may_lack_current_version() {
        let record = UpdateRecord::new("libfoo", "", "2.0", Origin::repo("extra")).unwrap();
        assert_eq!(record.current_version(), "");
        assert_eq!(record.repository(), Some("extra"));
    }

    #[test]
    fn repo_records_never_report_staleness() {
        let record = UpdateRecord::new("foo", "1.0", "1.1", Origin::repo("core")).unwrap();
        assert_eq!(record.devel_staleness_days(), None);
        assert!(!record.is_devel_refresh());
    }

    #[test]
    fn empty_description_is_dropped() {
        let record = UpdateRecord::new("foo", "1.0", "1.1", Origin::aur(Some("me")))
            .unwrap()
            .with_description(Some(String::new()));
        assert_eq!(record.description(), None);
    }
}
