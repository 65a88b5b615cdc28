/*============================================================
  Synavera Project: Syn-Syu
  Module: sysup_core::staleness
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Recognise VCS-tracking ("devel") packages and decide when
    their installed copy is old enough to suggest a rebuild.

  Security / Safety Notes:
    Pure functions of names and timestamps.

  Dependencies:
    chrono for timestamp arithmetic.

  Operational Scope:
    Consulted by the AUR path of the update classifier for
    packages whose version string did not advance.

  Revision History:
    2025-11-12 COD  Authored devel staleness rules.
  ------------------------------------------------------------
  SSE Principles Observed:
    - No hidden clock reads; callers pass `now`
============================================================*/

use chrono::{DateTime, Utc};

/// Name suffixes of packages that follow an upstream branch.
pub const DEVEL_SUFFIXES: [&str; 6] = ["-git", "-svn", "-bzr", "-hg", "-cvs", "-nightly"];

/// True when the package name marks a VCS-tracking package.
pub fn is_development_package(name: &str) -> bool {
    DEVEL_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Whole-day age of the install when it reaches `ttl_days`.
///
/// A negative TTL disables the check; zero treats every install as stale.
pub fn compute_staleness(
    installed_at: DateTime<Utc>,
    now: DateTime<Utc>,
    ttl_days: i64,
) -> Option<i64> {
    if ttl_days < 0 {
        return None;
    }
    let age_days = (now - installed_at).num_days();
    (age_days >= ttl_days).then_some(age_days)
}

/// TTL after applying the "always check devel packages" override.
pub fn effective_ttl(configured_ttl: i64, force_devel: bool) -> i64 {
    if force_devel {
        0
    } else {
        configured_ttl
    }
}
