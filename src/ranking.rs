/*============================================================
  Synavera Project: Syn-Syu
  Module: sysup_core::ranking
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Deterministic orderings for upgrade listings and search
    results, including reversal and 1-based enumeration.

  Security / Safety Notes:
    Pure ordering over in-memory records.

  Dependencies:
    serde for configuration-driven mode selection.

  Operational Scope:
    Called by the listing formatter's callers, the sysupgrade
    report and the search command.

  Revision History:
    2025-11-12 COD  Authored upgrade and search rankings.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Name is always the final tie-break, so orders are total
    - Modes are closed enums with exhaustive matches
============================================================*/

use std::cmp::{Ordering, Reverse};

use serde::Deserialize;

use crate::package_info::{AurPackage, RepoPackage, SearchCandidate, UpdateRecord};
use crate::version::VersionMetric;

/// Sort position for repositories missing from the sync order.
const UNLISTED_REPO_INDEX: usize = 999;

/// Ordering of upgrade listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeSorting {
    /// Biggest version jumps first, then by name.
    #[default]
    VersionDiff,
    PkgName,
    /// By repository, AUR last, then by name.
    Repo,
}

/// Ordering of AUR search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AurSearchSorting {
    /// Combined votes and popularity score.
    #[default]
    Hottest,
    PkgName,
    Popularity,
    NumVotes,
    LastModified,
}

/// Order update records for display.
pub fn sort_updates<'r, M: VersionMetric>(
    records: &'r [UpdateRecord],
    sorting: UpgradeSorting,
    metric: &M,
) -> Vec<&'r UpdateRecord> {
    let mut ordered: Vec<&UpdateRecord> = records.iter().collect();
    match sorting {
        UpgradeSorting::VersionDiff => ordered.sort_by_cached_key(|record| {
            let (_, weight) =
                metric.common_version(record.current_version(), record.new_version());
            (Reverse(weight), record.name().to_string())
        }),
        UpgradeSorting::PkgName => ordered.sort_by(|a, b| a.name().cmp(b.name())),
        UpgradeSorting::Repo => ordered.sort_by(|a, b| {
            let key = |record: &UpdateRecord| {
                let repo = record.repository();
                (repo.is_none(), repo.unwrap_or_default().to_string())
            };
            key(*a).cmp(&key(*b)).then_with(|| a.name().cmp(b.name()))
        }),
    }
    ordered
}

/// Options steering search result ordering.
#[derive(Debug, Clone, Default)]
pub struct SearchRanking {
    /// Sync database names in configured order.
    pub sync_order: Vec<String>,
    pub group_by_repository: bool,
    pub aur_sorting: AurSearchSorting,
    pub reverse: bool,
}

/// A search result with its printed 1-based position.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub index: usize,
    pub candidate: SearchCandidate,
}

impl SearchRanking {
    /// Repo results (grouped or by name) followed by AUR results.
    ///
    /// Reversal happens before enumeration, so indices always ascend
    /// from 1 over the printed sequence.
    pub fn rank(&self, candidates: Vec<SearchCandidate>) -> Vec<RankedCandidate> {
        let (mut repo, mut aur): (Vec<RepoPackage>, Vec<AurPackage>) =
            (Vec::new(), Vec::new());
        for candidate in candidates {
            match candidate {
                SearchCandidate::Repo(pkg) => repo.push(pkg),
                SearchCandidate::Aur(pkg) => aur.push(pkg),
            }
        }

        repo.sort_by_cached_key(|pkg| (self.repo_index(&pkg.repository), pkg.name.clone()));
        aur.sort_by(|a, b| self.compare_aur(a, b));

        let mut ordered: Vec<SearchCandidate> = repo
            .into_iter()
            .map(SearchCandidate::Repo)
            .chain(aur.into_iter().map(SearchCandidate::Aur))
            .collect();
        if self.reverse {
            ordered.reverse();
        }
        ordered
            .into_iter()
            .enumerate()
            .map(|(idx, candidate)| RankedCandidate {
                index: idx + 1,
                candidate,
            })
            .collect()
    }

    fn repo_index(&self, repository: &str) -> usize {
        if !self.group_by_repository {
            return UNLISTED_REPO_INDEX;
        }
        self.sync_order
            .iter()
            .position(|name| name == repository)
            .unwrap_or(UNLISTED_REPO_INDEX)
    }

    fn compare_aur(&self, a: &AurPackage, b: &AurPackage) -> Ordering {
        let votes = |pkg: &AurPackage| pkg.votes.unwrap_or(0) as f64;
        let popularity = |pkg: &AurPackage| pkg.popularity.unwrap_or(0.0);
        let descending = |x: f64, y: f64| y.total_cmp(&x);

        let primary = match self.aur_sorting {
            AurSearchSorting::PkgName => Ordering::Equal,
            AurSearchSorting::Popularity => descending(popularity(a), popularity(b))
                .then_with(|| descending(votes(a), votes(b))),
            AurSearchSorting::NumVotes => descending(votes(a), votes(b))
                .then_with(|| descending(popularity(a), popularity(b))),
            AurSearchSorting::LastModified => {
                let stamp = |pkg: &AurPackage| {
                    pkg.last_modified.map(|ts| ts.timestamp()).unwrap_or(0)
                };
                stamp(b).cmp(&stamp(a))
            }
            AurSearchSorting::Hottest => {
                let score = |pkg: &AurPackage| (votes(pkg) + 1.0) * (popularity(pkg) + 1.0);
                descending(score(a), score(b))
            }
        };
        primary.then_with(|| a.name.cmp(&b.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package_info::Origin;
    use crate::version::AlpmVersion;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn record(name: &str, current: &str, new: &str, repo: Option<&str>) -> UpdateRecord {
        let origin = match repo {
            Some(repo) => Origin::repo(repo),
            None => Origin::aur(Some("m")),
        };
        UpdateRecord::new(name, current, new, origin).unwrap()
    }

    fn names(records: &[&UpdateRecord]) -> Vec<String> {
        records.iter().map(|r| r.name().to_string()).collect()
    }

    fn sample() -> Vec<UpdateRecord> {
        vec![
            record("zlib", "1.2.13", "1.2.14", Some("core")),
            record("yay", "11.0", "12.0", None),
            record("bash", "5.1", "5.2", Some("core")),
            record("mesa", "23.1.0", "24.0.0", Some("extra")),
        ]
    }

    #[test]
    fn version_diff_puts_big_jumps_first() {
        let records = sample();
        let ordered = sort_updates(&records, UpgradeSorting::VersionDiff, &AlpmVersion);
        assert_eq!(names(&ordered), vec!["mesa", "yay", "bash", "zlib"]);
    }

    #[test]
    fn repo_mode_sorts_aur_last() {
        let mut records = sample();
        records.push(record("aaa", "1", "2", None));
        records.push(record("zzz", "1", "2", Some("zzzz-custom")));
        let ordered = sort_updates(&records, UpgradeSorting::Repo, &AlpmVersion);
        assert_eq!(
            names(&ordered),
            vec!["bash", "zlib", "mesa", "zzz", "aaa", "yay"]
        );
    }

    #[test]
    fn sorting_twice_is_stable() {
        let records = sample();
        for mode in [
            UpgradeSorting::VersionDiff,
            UpgradeSorting::PkgName,
            UpgradeSorting::Repo,
        ] {
            let once = sort_updates(&records, mode, &AlpmVersion);
            let owned: Vec<UpdateRecord> = once.iter().map(|r| (*r).clone()).collect();
            let twice = sort_updates(&owned, mode, &AlpmVersion);
            assert_eq!(names(&once), names(&twice));
        }
    }

    fn aur(name: &str, votes: u64, popularity: f64, modified: Option<i64>) -> SearchCandidate {
        SearchCandidate::Aur(AurPackage {
            name: name.into(),
            version: "1".into(),
            votes: Some(votes),
            popularity: Some(popularity),
            last_modified: modified.map(|ts| Utc.timestamp_opt(ts, 0).unwrap()),
            ..AurPackage::default()
        })
    }

    fn repo(name: &str, repository: &str) -> SearchCandidate {
        SearchCandidate::Repo(RepoPackage {
            name: name.into(),
            version: "1".into(),
            repository: repository.into(),
            ..RepoPackage::default()
        })
    }

    fn ranked_names(ranked: &[RankedCandidate]) -> Vec<String> {
        ranked.iter().map(|r| r.candidate.name().to_string()).collect()
    }

    #[test]
    fn repo_results_follow_sync_order_then_aur() {
        let ranking = SearchRanking {
            sync_order: vec!["core".into(), "extra".into()],
            group_by_repository: true,
            ..SearchRanking::default()
        };
        let ranked = ranking.rank(vec![
            aur("aur-pkg", 1, 0.1, None),
            repo("b", "extra"),
            repo("c", "custom"),
            repo("z", "core"),
        ]);
        assert_eq!(ranked_names(&ranked), vec!["z", "b", "c", "aur-pkg"]);
    }

    #[test]
    fn ungrouped_repo_results_sort_by_name() {
        let ranking = SearchRanking {
            sync_order: vec!["core".into(), "extra".into()],
            group_by_repository: false,
            ..SearchRanking::default()
        };
        let ranked = ranking.rank(vec![repo("b", "extra"), repo("z", "core")]);
        assert_eq!(ranked_names(&ranked), vec!["b", "z"]);
    }

    #[test]
    fn aur_modes_rank_as_configured() {
        let candidates = || {
            vec![
                aur("low", 1, 0.5, Some(100)),
                aur("voted", 50, 0.1, None),
                aur("popular", 2, 9.0, Some(50)),
            ]
        };
        let rank = |sorting| {
            let ranking = SearchRanking {
                aur_sorting: sorting,
                ..SearchRanking::default()
            };
            ranked_names(&ranking.rank(candidates()))
        };
        assert_eq!(rank(AurSearchSorting::PkgName), vec!["low", "popular", "voted"]);
        assert_eq!(rank(AurSearchSorting::Popularity), vec!["popular", "low", "voted"]);
        assert_eq!(rank(AurSearchSorting::NumVotes), vec!["voted", "popular", "low"]);
        assert_eq!(rank(AurSearchSorting::LastModified), vec!["low", "popular", "voted"]);
        assert_eq!(rank(AurSearchSorting::Hottest), vec!["voted", "popular", "low"]);
    }

    #[test]
    fn reversal_happens_before_enumeration() {
        let base = SearchRanking {
            aur_sorting: AurSearchSorting::PkgName,
            ..SearchRanking::default()
        };
        let reversed = SearchRanking {
            reverse: true,
            ..base.clone()
        };
        let items = || vec![aur("a", 0, 0.0, None), aur("b", 0, 0.0, None), aur("c", 0, 0.0, None)];

        let forward = base.rank(items());
        let backward = reversed.rank(items());

        let mut expected = ranked_names(&forward);
        expected.reverse();
        assert_eq!(ranked_names(&backward), expected);
        let indices: Vec<usize> = backward.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }
}
