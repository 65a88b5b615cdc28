/*============================================================
  Synavera Project: Syn-Syu
  Module: sysup_core::classify
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Reconcile installed packages against sync databases and
    the AUR, producing typed update records and the bucket set
    consumed by filtering and reporting.

  Security / Safety Notes:
    Operates on in-memory snapshots only; no I/O.

  Dependencies:
    chrono for staleness timestamps, serde for bucket export.

  Operational Scope:
    Invoked once per run by the binary after the pacman and
    AUR adapters have resolved their snapshots.

  Revision History:
    2024-11-04 COD  Authored manifest builder.
    2025-11-12 COD  Reworked into the bucketed update
                    classifier with devel staleness support.
    2025-11-19 COD  Dropped unused bucket clearing.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic ordering for reproducible listings
    - Explicit source attribution for each record
    - Not-found and skipped outcomes returned as data
============================================================*/

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::color::Painter;
use crate::error::{Result, SysupError};
use crate::logger::Logger;
use crate::package_info::{
    AurLookup, AurPackage, LocalSnapshot, Origin, RepoPackage, UpdateRecord, DEVEL_SENTINEL,
};
use crate::report::format_outofdate_skip;
use crate::staleness::{compute_staleness, effective_ttl, is_development_package};
use crate::version::VersionMetric;

/// The eight mutually exclusive classification categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKind {
    RepoUpdates,
    ThirdpartyRepoUpdates,
    AurUpdates,
    RepoReplacements,
    ThirdpartyReplacements,
    NewRepoDeps,
    NewThirdpartyDeps,
    NewAurDeps,
}

impl BucketKind {
    /// All buckets in canonical order.
    pub const ALL: [BucketKind; 8] = [
        BucketKind::RepoUpdates,
        BucketKind::ThirdpartyRepoUpdates,
        BucketKind::AurUpdates,
        BucketKind::RepoReplacements,
        BucketKind::ThirdpartyReplacements,
        BucketKind::NewRepoDeps,
        BucketKind::NewThirdpartyDeps,
        BucketKind::NewAurDeps,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Buckets holding AUR-origin records.
    pub fn is_aur(self) -> bool {
        matches!(self, BucketKind::AurUpdates | BucketKind::NewAurDeps)
    }

    /// Buckets holding newly introduced dependencies.
    pub fn is_dependency(self) -> bool {
        matches!(
            self,
            BucketKind::NewRepoDeps | BucketKind::NewThirdpartyDeps | BucketKind::NewAurDeps
        )
    }
}

/// Ordered record lists, one per [`BucketKind`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketSet {
    buckets: [Vec<UpdateRecord>; 8],
}

impl BucketSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, rejecting an origin that does not fit the bucket.
    pub fn push(&mut self, kind: BucketKind, record: UpdateRecord) -> Result<()> {
        if kind.is_aur() != record.origin().is_aur() {
            return Err(SysupError::malformed(
                record.name(),
                format!("origin does not belong in bucket {kind:?}"),
            ));
        }
        self.buckets[kind.index()].push(record);
        Ok(())
    }

    pub fn get(&self, kind: BucketKind) -> &[UpdateRecord] {
        &self.buckets[kind.index()]
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Vec::is_empty)
    }

    /// Iterate `(bucket, record)` in bucket-then-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (BucketKind, &UpdateRecord)> {
        BucketKind::ALL
            .into_iter()
            .flat_map(move |kind| self.get(kind).iter().map(move |record| (kind, record)))
    }

    /// Move records matching `predicate` out, in bucket-then-insertion order.
    pub fn extract_if<F>(&mut self, mut predicate: F) -> Vec<(BucketKind, UpdateRecord)>
    where
        F: FnMut(&UpdateRecord) -> bool,
    {
        let mut moved = Vec::new();
        for kind in BucketKind::ALL {
            let bucket = std::mem::take(&mut self.buckets[kind.index()]);
            let (taken, kept): (Vec<_>, Vec<_>) =
                bucket.into_iter().partition(|record| predicate(record));
            self.buckets[kind.index()] = kept;
            moved.extend(taken.into_iter().map(|record| (kind, record)));
        }
        moved
    }
}

impl Serialize for BucketSet {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(BucketKind::ALL.len()))?;
        for kind in BucketKind::ALL {
            map.serialize_entry(&kind, self.get(kind))?;
        }
        map.end()
    }
}

/// User policy for the AUR path.
#[derive(Debug, Clone, Copy)]
pub struct AurPolicy {
    /// Skip upgrades whose AUR record is flagged out of date.
    pub ignore_outofdate: bool,
    /// Configured devel TTL in days; negative disables devel checks.
    pub devel_ttl_days: i64,
    /// Treat every devel package as stale.
    pub force_devel: bool,
}

impl Default for AurPolicy {
    fn default() -> Self {
        Self {
            ignore_outofdate: false,
            devel_ttl_days: -1,
            force_devel: false,
        }
    }
}

/// Result of the AUR path.
#[derive(Debug, Clone, Default)]
pub struct AurClassification {
    pub updates: Vec<UpdateRecord>,
    pub not_found: Vec<String>,
    pub skipped_outofdate: Vec<UpdateRecord>,
}

/// Installed packages that no sync database offers, sorted by name.
pub fn names_missing_from_repos(local: &LocalSnapshot, repo: &[RepoPackage]) -> Vec<String> {
    let repo_names: HashSet<&str> = repo.iter().map(|pkg| pkg.name.as_str()).collect();
    local
        .keys()
        .filter(|name| !repo_names.contains(name.as_str()))
        .cloned()
        .collect()
}

/// Turns snapshots into update records.
pub struct UpdateClassifier<'a, M: VersionMetric> {
    metric: &'a M,
    logger: &'a Logger,
}

impl<'a, M: VersionMetric> UpdateClassifier<'a, M> {
    pub fn new(metric: &'a M, logger: &'a Logger) -> Self {
        Self { metric, logger }
    }

    /// Upgrades available from sync databases, in snapshot order.
    ///
    /// The first candidate for a name wins, mirroring sync database order.
    pub fn repo_updates(
        &self,
        local: &LocalSnapshot,
        repo: &[RepoPackage],
    ) -> Result<Vec<UpdateRecord>> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut updates = Vec::new();
        for candidate in repo {
            if !seen.insert(candidate.name.as_str()) {
                continue;
            }
            let Some(installed) = local.get(&candidate.name) else {
                continue;
            };
            if installed.version.is_empty() {
                return Err(SysupError::malformed(
                    &candidate.name,
                    "installed package has an empty version",
                ));
            }
            if self.metric.compare(&installed.version, &candidate.version) != Ordering::Less {
                continue;
            }
            let origin = Origin::Repo {
                repository: candidate.repository.clone(),
                download_size: candidate.download_size,
                installed_size: candidate.installed_size,
            };
            let record = UpdateRecord::new(
                candidate.name.clone(),
                installed.version.clone(),
                candidate.version.clone(),
                origin,
            )?
            .with_description(candidate.description.clone())
            .with_groups(candidate.groups.clone())
            .with_replaces(candidate.replaces.clone());
            self.logger.debug(
                "REPO",
                format!(
                    "{} {} → {} via {}",
                    record.name(),
                    record.current_version(),
                    record.new_version(),
                    candidate.repository
                ),
            );
            updates.push(record);
        }
        Ok(updates)
    }

    /// Upgrades and devel refreshes for packages resolved through the AUR.
    pub fn aur_updates(
        &self,
        local: &LocalSnapshot,
        lookup: &AurLookup,
        policy: AurPolicy,
        now: DateTime<Utc>,
    ) -> Result<AurClassification> {
        let mut outcome = AurClassification {
            not_found: lookup.not_found.clone(),
            ..AurClassification::default()
        };
        let mut up_to_date: Vec<&AurPackage> = Vec::new();

        for remote in &lookup.found {
            let installed = local.get(&remote.name).ok_or_else(|| {
                SysupError::malformed(&remote.name, "AUR returned a package that is not installed")
            })?;
            if installed.version.is_empty() {
                return Err(SysupError::malformed(
                    &remote.name,
                    "installed package has an empty version",
                ));
            }

            if self.metric.compare(&installed.version, &remote.version) == Ordering::Less {
                let record = aur_record(remote, &installed.version, &remote.version, None)?;
                if policy.ignore_outofdate && remote.out_of_date.is_some() {
                    self.logger.warn(
                        "OUTOFDATE",
                        format_outofdate_skip(&record, Painter::new(false)),
                    );
                    outcome.skipped_outofdate.push(record);
                    continue;
                }
                outcome.updates.push(record);
            } else {
                up_to_date.push(remote);
            }
        }

        let ttl = effective_ttl(policy.devel_ttl_days, policy.force_devel);
        if ttl > -1 && !up_to_date.is_empty() {
            up_to_date.sort_by(|a, b| a.name.cmp(&b.name));
            for remote in up_to_date {
                if !is_development_package(&remote.name) {
                    continue;
                }
                let installed = &local[&remote.name];
                let Some(age) = compute_staleness(installed.installed_at, now, ttl) else {
                    continue;
                };
                self.logger.debug(
                    "DEVEL",
                    format!("{} installed {age} days ago, suggesting rebuild", remote.name),
                );
                outcome.updates.push(aur_record(
                    remote,
                    &installed.version,
                    DEVEL_SENTINEL,
                    Some(age),
                )?);
            }
        }

        Ok(outcome)
    }

    /// Place repo and AUR updates into their buckets.
    pub fn bucket_updates(
        &self,
        repo_updates: Vec<UpdateRecord>,
        aur_updates: Vec<UpdateRecord>,
        official_repos: &BTreeSet<String>,
    ) -> Result<BucketSet> {
        let mut buckets = BucketSet::new();
        for record in repo_updates {
            let official = record
                .repository()
                .is_some_and(|repo| official_repos.contains(repo));
            let kind = if official {
                BucketKind::RepoUpdates
            } else {
                BucketKind::ThirdpartyRepoUpdates
            };
            buckets.push(kind, record)?;
        }
        for record in aur_updates {
            buckets.push(BucketKind::AurUpdates, record)?;
        }
        Ok(buckets)
    }
}

fn aur_record(
    remote: &AurPackage,
    current: &str,
    new: &str,
    staleness: Option<i64>,
) -> Result<UpdateRecord> {
    let origin = Origin::Aur {
        maintainer: remote.maintainer.clone(),
        out_of_date: remote.out_of_date,
        devel_staleness_days: staleness,
    };
    Ok(UpdateRecord::new(remote.name.clone(), current, new, origin)?
        .with_description(remote.description.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package_info::LocalPackage;
    use crate::version::AlpmVersion;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 12, 12, 0, 0).unwrap()
    }

    fn local(entries: &[(&str, &str, i64)]) -> LocalSnapshot {
        entries
            .iter()
            .map(|(name, version, age_days)| {
                (
                    name.to_string(),
                    LocalPackage {
                        version: version.to_string(),
                        installed_at: now() - Duration::days(*age_days),
                    },
                )
            })
            .collect()
    }

    fn repo_pkg(name: &str, version: &str, repository: &str) -> RepoPackage {
        RepoPackage {
            name: name.into(),
            version: version.into(),
            repository: repository.into(),
            ..RepoPackage::default()
        }
    }

    fn aur_pkg(name: &str, version: &str) -> AurPackage {
        AurPackage {
            name: name.into(),
            version: version.into(),
            maintainer: Some("someone".into()),
            ..AurPackage::default()
        }
    }

    fn official() -> BTreeSet<String> {
        ["core", "extra"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn newer_repo_candidate_lands_in_official_bucket() {
        let logger = Logger::capturing();
        let classifier = UpdateClassifier::new(&AlpmVersion, &logger);
        let updates = classifier
            .repo_updates(&local(&[("foo", "1.0", 1)]), &[repo_pkg("foo", "1.1", "core")])
            .unwrap();
        let buckets = classifier
            .bucket_updates(updates, Vec::new(), &official())
            .unwrap();

        let repo = buckets.get(BucketKind::RepoUpdates);
        assert_eq!(repo.len(), 1);
        assert_eq!(repo[0].current_version(), "1.0");
        assert_eq!(repo[0].new_version(), "1.1");
        assert_eq!(repo[0].repository(), Some("core"));
        assert_eq!(buckets.len(), 1);
    }

    #[test]
    fn unofficial_repository_goes_to_thirdparty_bucket() {
        let logger = Logger::capturing();
        let classifier = UpdateClassifier::new(&AlpmVersion, &logger);
        let updates = classifier
            .repo_updates(&local(&[("foo", "1.0", 1)]), &[repo_pkg("foo", "2.0", "chaotic")])
            .unwrap();
        let buckets = classifier
            .bucket_updates(updates, Vec::new(), &official())
            .unwrap();
        assert_eq!(buckets.get(BucketKind::ThirdpartyRepoUpdates).len(), 1);
        assert!(buckets.get(BucketKind::RepoUpdates).is_empty());
    }

    #[test]
    fn equal_versions_produce_no_records() {
        let logger = Logger::capturing();
        let classifier = UpdateClassifier::new(&AlpmVersion, &logger);
        let snapshot = local(&[("foo", "1.0", 30), ("bar", "2:3.1-1", 30)]);
        let repo = classifier
            .repo_updates(
                &snapshot,
                &[repo_pkg("foo", "1.0", "core"), repo_pkg("bar", "2:3.1-1", "extra")],
            )
            .unwrap();
        assert!(repo.is_empty());

        let lookup = AurLookup {
            found: vec![aur_pkg("foo", "1.0"), aur_pkg("bar", "2:3.1-1")],
            not_found: Vec::new(),
        };
        let policy = AurPolicy {
            devel_ttl_days: 0,
            ..AurPolicy::default()
        };
        let aur = classifier.aur_updates(&snapshot, &lookup, policy, now()).unwrap();
        assert!(aur.updates.is_empty());
    }

    #[test]
    fn first_sync_database_wins() {
        let logger = Logger::capturing();
        let classifier = UpdateClassifier::new(&AlpmVersion, &logger);
        let updates = classifier
            .repo_updates(
                &local(&[("foo", "1.0", 1)]),
                &[repo_pkg("foo", "1.1", "core"), repo_pkg("foo", "9.0", "custom")],
            )
            .unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].repository(), Some("core"));
    }

    #[test]
    fn stale_devel_package_gets_sentinel_record() {
        let logger = Logger::capturing();
        let classifier = UpdateClassifier::new(&AlpmVersion, &logger);
        let snapshot = local(&[("foo-git", "r10.abc-1", 10)]);
        let lookup = AurLookup {
            found: vec![aur_pkg("foo-git", "r10.abc-1")],
            not_found: Vec::new(),
        };
        let policy = AurPolicy {
            devel_ttl_days: 5,
            ..AurPolicy::default()
        };
        let outcome = classifier.aur_updates(&snapshot, &lookup, policy, now()).unwrap();
        assert_eq!(outcome.updates.len(), 1);
        assert_eq!(outcome.updates[0].new_version(), "devel");
        assert_eq!(outcome.updates[0].devel_staleness_days(), Some(10));
        assert!(outcome.updates[0].is_devel_refresh());
    }

    #[test]
    fn disabled_ttl_skips_staleness_path() {
        let logger = Logger::capturing();
        let classifier = UpdateClassifier::new(&AlpmVersion, &logger);
        let snapshot = local(&[("foo-git", "r10.abc-1", 10)]);
        let lookup = AurLookup {
            found: vec![aur_pkg("foo-git", "r10.abc-1")],
            not_found: Vec::new(),
        };
        let outcome = classifier
            .aur_updates(&snapshot, &lookup, AurPolicy::default(), now())
            .unwrap();
        assert!(outcome.updates.is_empty());

        let forced = AurPolicy {
            force_devel: true,
            ..AurPolicy::default()
        };
        let outcome = classifier.aur_updates(&snapshot, &lookup, forced, now()).unwrap();
        assert_eq!(outcome.updates.len(), 1);
    }

    #[test]
    fn outofdate_upgrade_is_skipped_with_notice() {
        let logger = Logger::capturing();
        let classifier = UpdateClassifier::new(&AlpmVersion, &logger);
        let snapshot = local(&[("baz", "1.0", 1), ("qux", "1.0", 1)]);
        let mut flagged = aur_pkg("baz", "1.2");
        flagged.out_of_date = Some(now());
        let lookup = AurLookup {
            found: vec![flagged, aur_pkg("qux", "1.5")],
            not_found: vec!["ghost".into()],
        };
        let policy = AurPolicy {
            ignore_outofdate: true,
            ..AurPolicy::default()
        };
        let outcome = classifier.aur_updates(&snapshot, &lookup, policy, now()).unwrap();

        assert_eq!(outcome.updates.len(), 1);
        assert_eq!(outcome.updates[0].name(), "qux");
        assert_eq!(outcome.skipped_outofdate.len(), 1);
        assert_eq!(outcome.not_found, vec!["ghost".to_string()]);
        assert!(logger
            .entries()
            .iter()
            .any(|entry| entry.code == "OUTOFDATE" && entry.message.starts_with("baz 1.2")));
    }

    #[test]
    fn remote_for_uninstalled_package_is_malformed() {
        let logger = Logger::capturing();
        let classifier = UpdateClassifier::new(&AlpmVersion, &logger);
        let lookup = AurLookup {
            found: vec![aur_pkg("stranger", "1.0")],
            not_found: Vec::new(),
        };
        let err = classifier
            .aur_updates(&LocalSnapshot::new(), &lookup, AurPolicy::default(), now())
            .unwrap_err();
        assert!(matches!(err, SysupError::MalformedInput { .. }));
    }

    #[test]
    fn missing_from_repos_lists_aur_candidates() {
        let snapshot = local(&[("foo", "1.0", 1), ("yay", "12.0", 1), ("abc-git", "r1", 1)]);
        let names = names_missing_from_repos(&snapshot, &[repo_pkg("foo", "1.1", "core")]);
        assert_eq!(names, vec!["abc-git".to_string(), "yay".to_string()]);
    }

    #[test]
    fn bucket_rejects_mismatched_origin() {
        let mut buckets = BucketSet::new();
        let record = UpdateRecord::new("foo", "1", "2", Origin::aur(None)).unwrap();
        assert!(buckets.push(BucketKind::RepoUpdates, record).is_err());
    }

    #[test]
    fn extract_preserves_bucket_then_insertion_order() {
        let mut buckets = BucketSet::new();
        for (kind, name) in [
            (BucketKind::AurUpdates, "a-aur"),
            (BucketKind::RepoUpdates, "b-repo"),
            (BucketKind::RepoUpdates, "a-repo"),
        ] {
            let origin = if kind.is_aur() {
                Origin::aur(Some("m"))
            } else {
                Origin::repo("core")
            };
            buckets
                .push(kind, UpdateRecord::new(name, "1", "2", origin).unwrap())
                .unwrap();
        }
        let moved: Vec<String> = buckets
            .extract_if(|_| true)
            .into_iter()
            .map(|(_, record)| record.name().to_string())
            .collect();
        assert_eq!(moved, vec!["b-repo", "a-repo", "a-aur"]);
        assert!(buckets.is_empty());
    }
}
