/*============================================================
  Synavera Project: Syn-Syu
  Module: sysup_core::pacman
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Interface with pacman to snapshot installed packages, list
    sync databases, fetch candidate details, search repos and
    read the IgnorePkg setting.

  Security / Safety Notes:
    Executes pacman with user privileges only; read-only
    queries, no privilege escalation is attempted.

  Dependencies:
    tokio::process for async command execution, chrono for
    install and build dates.

  Operational Scope:
    Feeds the classifier and the search command in the binary.

  Revision History:
    2024-11-04 COD  Crafted pacman integration layer.
    2025-11-12 COD  Snapshot, sync listing and search queries.
    2025-11-19 COD  IgnorePkg via pacman-conf.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic command invocation under LC_ALL=C
    - Parsing kept pure and separately testable
    - Reusable helpers for external command diagnostics
============================================================*/

use std::collections::{HashMap, HashSet};
use std::io;
use std::process::Stdio;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use tokio::process::Command;

use crate::error::{Result, SysupError};
use crate::package_info::{LocalPackage, LocalSnapshot, RepoPackage};

const PACMAN: &str = "pacman";
const PACMAN_CONF: &str = "pacman-conf";
const DATE_FORMAT: &str = "%a %b %e %H:%M:%S %Y";
const CHUNK_SIZE: usize = 64;

/// Contents of every sync database, in configured order.
#[derive(Debug, Clone, Default)]
pub struct SyncListing {
    /// Database names as pacman.conf orders them.
    pub order: Vec<String>,
    pub packages: Vec<RepoPackage>,
}

impl SyncListing {
    /// First entry per installed name, in database order.
    pub fn installed_candidates(&self, local: &LocalSnapshot) -> Vec<RepoPackage> {
        let mut seen: HashSet<&str> = HashSet::new();
        self.packages
            .iter()
            .filter(|pkg| local.contains_key(&pkg.name) && seen.insert(pkg.name.as_str()))
            .cloned()
            .collect()
    }
}

/// Snapshot installed packages via `pacman -Qi`.
pub async fn local_snapshot() -> Result<LocalSnapshot> {
    let stdout = run_command(PACMAN, &["-Qi"], false).await?;
    parse_local_info(&stdout)
}

/// List all sync database entries via `pacman -Sl`.
pub async fn list_sync_packages() -> Result<SyncListing> {
    let stdout = run_command(PACMAN, &["-Sl"], false).await?;
    Ok(parse_sync_listing(&stdout))
}

/// Fill in details for `candidates` via `pacman -Si repo/name`.
pub async fn query_repo_details(candidates: &[RepoPackage]) -> Result<Vec<RepoPackage>> {
    let mut details: HashMap<(String, String), RepoPackage> = HashMap::new();
    for chunk in candidates.chunks(CHUNK_SIZE) {
        let mut args: Vec<String> = vec!["-Si".into()];
        args.extend(
            chunk
                .iter()
                .map(|pkg| format!("{}/{}", pkg.repository, pkg.name)),
        );
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = run_command(PACMAN, &args, false).await?;
        for pkg in parse_sync_info(&stdout)? {
            details.insert((pkg.repository.clone(), pkg.name.clone()), pkg);
        }
    }

    Ok(candidates
        .iter()
        .map(|pkg| {
            details
                .remove(&(pkg.repository.clone(), pkg.name.clone()))
                .unwrap_or_else(|| pkg.clone())
        })
        .collect())
}

/// Search sync databases via `pacman -Ss`; no match yields an empty list.
pub async fn search_repo(terms: &[String]) -> Result<Vec<RepoPackage>> {
    let mut args: Vec<&str> = vec!["-Ss"];
    args.extend(terms.iter().map(String::as_str));
    let stdout = run_command(PACMAN, &args, true).await?;
    Ok(parse_search_output(&stdout))
}

/// `IgnorePkg` entries from pacman.conf via `pacman-conf`.
pub async fn ignored_packages() -> Result<Vec<String>> {
    let stdout = run_command(PACMAN_CONF, &["IgnorePkg"], false).await?;
    Ok(parse_ignore_pkg(&stdout))
}

async fn run_command(program: &str, args: &[&str], empty_on_no_match: bool) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .env("LC_ALL", "C")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|err| map_spawn_error(err, program))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if empty_on_no_match && output.status.code() == Some(1) && stderr.is_empty() {
            return Ok(String::new());
        }
        return Err(SysupError::CommandFailure {
            command: format!("{program} {}", args.join(" ")),
            status: output.status.code().unwrap_or(-1),
            stderr,
        });
    }

    String::from_utf8(output.stdout).map_err(|err| {
        SysupError::Serialization(format!(
            "{program} {} emitted invalid UTF-8: {err}",
            args.first().copied().unwrap_or_default()
        ))
    })
}

/// `Key : Value` pairs of one info block.
fn fields(block: &str) -> impl Iterator<Item = (&str, &str)> {
    block.lines().filter_map(|line| {
        if line.starts_with(char::is_whitespace) {
            return None;
        }
        line.split_once(':')
            .map(|(key, value)| (key.trim(), value.trim()))
    })
}

fn blocks(stdout: &str) -> impl Iterator<Item = &str> {
    stdout.split("\n\n").filter(|block| !block.trim().is_empty())
}

pub(crate) fn parse_local_info(stdout: &str) -> Result<LocalSnapshot> {
    let mut snapshot = LocalSnapshot::new();
    for block in blocks(stdout) {
        let mut name: Option<&str> = None;
        let mut version: Option<&str> = None;
        let mut installed: Option<&str> = None;
        for (key, value) in fields(block) {
            match key {
                "Name" => name = Some(value),
                "Version" => version = Some(value),
                "Install Date" => installed = Some(value),
                _ => {}
            }
        }
        let (Some(name), Some(version)) = (name, version) else {
            continue;
        };
        let installed_at = installed.and_then(parse_pacman_date).ok_or_else(|| {
            SysupError::Serialization(format!("pacman -Qi: missing or invalid install date for {name}"))
        })?;
        snapshot.insert(
            name.to_string(),
            LocalPackage {
                version: version.to_string(),
                installed_at,
            },
        );
    }
    Ok(snapshot)
}

pub(crate) fn parse_sync_listing(stdout: &str) -> SyncListing {
    let mut listing = SyncListing::default();
    for line in stdout.lines() {
        let mut parts = line.split_whitespace();
        let (Some(repo), Some(name), Some(version)) = (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        if !listing.order.iter().any(|known| known == repo) {
            listing.order.push(repo.to_string());
        }
        listing.packages.push(RepoPackage {
            name: name.to_string(),
            version: version.to_string(),
            repository: repo.to_string(),
            ..RepoPackage::default()
        });
    }
    listing
}

pub(crate) fn parse_sync_info(stdout: &str) -> Result<Vec<RepoPackage>> {
    let mut packages = Vec::new();
    for block in blocks(stdout) {
        let mut pkg = RepoPackage::default();
        for (key, value) in fields(block) {
            match key {
                "Repository" => pkg.repository = value.to_string(),
                "Name" => pkg.name = value.to_string(),
                "Version" => pkg.version = value.to_string(),
                "Description" => {
                    pkg.description = (!value.is_empty() && value != "None").then(|| value.to_string())
                }
                "Groups" => pkg.groups = parse_list(value),
                "Replaces" => pkg.replaces = parse_list(value),
                "Download Size" => pkg.download_size = parse_pacman_size(value),
                "Installed Size" => pkg.installed_size = parse_pacman_size(value),
                "Build Date" => pkg.build_date = parse_pacman_date(value),
                _ => {}
            }
        }
        if pkg.name.is_empty() || pkg.version.is_empty() {
            return Err(SysupError::Serialization(
                "pacman -Si: block without name or version".into(),
            ));
        }
        packages.push(pkg);
    }
    Ok(packages)
}

pub(crate) fn parse_search_output(stdout: &str) -> Vec<RepoPackage> {
    let mut packages: Vec<RepoPackage> = Vec::new();
    for line in stdout.lines() {
        if line.starts_with(char::is_whitespace) {
            if let Some(last) = packages.last_mut() {
                let text = line.trim();
                if !text.is_empty() {
                    last.description = Some(text.to_string());
                }
            }
            continue;
        }
        let mut parts = line.split_whitespace();
        let (Some(qualified), Some(version)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Some((repo, name)) = qualified.split_once('/') else {
            continue;
        };
        let rest: Vec<&str> = parts.collect();
        let rest = rest.join(" ");
        let groups = rest
            .strip_prefix('(')
            .and_then(|tail| tail.split_once(')'))
            .map(|(inside, _)| inside.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        packages.push(RepoPackage {
            name: name.to_string(),
            version: version.to_string(),
            repository: repo.to_string(),
            groups,
            ..RepoPackage::default()
        });
    }
    packages
}

pub(crate) fn parse_ignore_pkg(stdout: &str) -> Vec<String> {
    stdout.split_whitespace().map(str::to_string).collect()
}

fn parse_list(value: &str) -> Vec<String> {
    if value == "None" {
        return Vec::new();
    }
    value.split_whitespace().map(str::to_string).collect()
}

/// Parse pacman's C-locale timestamp as local time.
fn parse_pacman_date(value: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), DATE_FORMAT).ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

fn parse_pacman_size(value: &str) -> Option<u64> {
    let mut parts = value.split_whitespace();
    let number = parts.next()?.replace(',', "");
    let unit = parts.next().unwrap_or("B");
    let magnitude = number.parse::<f64>().ok()?;
    let multiplier = match unit {
        "KiB" => 1024_f64,
        "MiB" => 1024_f64.powi(2),
        "GiB" => 1024_f64.powi(3),
        "TiB" => 1024_f64.powi(4),
        _ => 1_f64,
    };
    let bytes = magnitude * multiplier;
    (bytes.is_finite() && bytes >= 0.0).then(|| bytes.round() as u64)
}

fn map_spawn_error(err: io::Error, command: &str) -> SysupError {
    if err.kind() == io::ErrorKind::NotFound {
        SysupError::CommandMissing {
            command: command.into(),
        }
    } else {
        SysupError::Runtime(format!("Failed to spawn {command}: {err}"))
    }
}
