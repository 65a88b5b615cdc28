/*============================================================
  Synavera Project: Syn-Syu
  Module: sysup_core::config
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load sysup configuration from TOML, falling back to built-in
    defaults for every omitted key.

  Security / Safety Notes:
    Reads a single user-owned file; never writes configuration.

  Dependencies:
    toml + serde for parsing, dirs for XDG locations.

  Operational Scope:
    Loaded once per invocation by the binary.

  Revision History:
    2025-11-12 COD  Authored sysup configuration layer.
    2025-11-19 COD  Took over command-line flag conflict resolution.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Missing default file yields defaults; missing explicit
      file is an error
    - Every section tolerates partial tables
============================================================*/

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SysupError};
use crate::listing::ColorScheme;
use crate::logger::Logger;
use crate::ranking::{AurSearchSorting, UpgradeSorting};

const CONFIG_DIR: &str = "syn-syu";
const CONFIG_FILE: &str = "sysup.toml";

/// Official Arch repositories, including testing and staging.
pub const OFFICIAL_REPOS: [&str; 8] = [
    "core",
    "extra",
    "multilib",
    "core-testing",
    "extra-testing",
    "multilib-testing",
    "core-staging",
    "extra-staging",
];

/// Top-level sysup configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SysupConfig {
    pub sync: SyncConfig,
    pub ui: UiConfig,
    pub colors: ColorConfig,
    pub repos: RepoConfig,
    pub aur: AurConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Days before an installed devel package is suggested for rebuild; -1 disables.
    pub devel_pkgs_expiration: i64,
    pub upgrade_sorting: UpgradeSorting,
    pub always_show_pkg_origin: bool,
    pub show_download_size: bool,
    pub ignore_outofdate: bool,
    pub ignore: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            devel_pkgs_expiration: -1,
            upgrade_sorting: UpgradeSorting::default(),
            always_show_pkg_origin: false,
            show_download_size: false,
            ignore_outofdate: false,
            ignore: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub warn_about_package_updates: Vec<String>,
    pub group_by_repository: bool,
    pub aur_search_sorting: AurSearchSorting,
    pub reverse_search_sorting: bool,
    pub display_last_updated: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            warn_about_package_updates: Vec::new(),
            group_by_repository: true,
            aur_search_sorting: AurSearchSorting::default(),
            reverse_search_sorting: false,
            display_last_updated: false,
        }
    }
}

/// Terminal colour numbers; 8 and above are the bright variants.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub version: u8,
    pub version_diff_old: u8,
    pub version_diff_new: u8,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            version: 10,
            version_diff_old: 9,
            version_diff_new: 11,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    pub official: Vec<String>,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            official: OFFICIAL_REPOS.iter().map(|repo| repo.to_string()).collect(),
        }
    }
}

/// AUR RPC client settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AurConfig {
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Package names per `info` request.
    pub max_args: usize,
    pub max_retries: usize,
    pub max_parallel_requests: usize,
}

impl Default for AurConfig {
    fn default() -> Self {
        Self {
            base_url: "https://aur.archlinux.org/rpc".into(),
            timeout: 20,
            max_args: 200,
            max_retries: 3,
            max_parallel_requests: 4,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub log_dir: Option<PathBuf>,
}

impl SysupConfig {
    /// Default configuration file location under `$XDG_CONFIG_HOME`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`, or from the default location when `None`.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(SysupError::Config(format!(
                        "Configuration file {} does not exist",
                        explicit.display()
                    )));
                }
                Self::load_from_path(explicit)
            }
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::load_from_path(&default),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| {
            SysupError::Filesystem(format!("Failed to read {}: {err}", path.display()))
        })?;
        Self::from_toml(&raw).map_err(|err| match err {
            SysupError::Config(reason) => {
                SysupError::Config(format!("{}: {reason}", path.display()))
            }
            other => other,
        })
    }

    /// Parse configuration text.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| SysupError::Config(err.to_string()))
    }

    /// Directory for session logs.
    pub fn log_dir(&self) -> PathBuf {
        if let Some(dir) = &self.paths.log_dir {
            return dir.clone();
        }
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join(CONFIG_DIR)
            .join("logs")
    }

    pub fn official_repos(&self) -> BTreeSet<String> {
        self.repos.official.iter().cloned().collect()
    }

    pub fn color_scheme(&self) -> ColorScheme {
        ColorScheme {
            version: self.colors.version,
            version_diff_old: self.colors.version_diff_old,
            version_diff_new: self.colors.version_diff_new,
        }
    }
}

/// `--repo` and `--aur` select disjoint sources and cannot be combined.
pub fn reject_exclusive_sources(repo_only: bool, aur_only: bool) -> Result<()> {
    if repo_only && aur_only {
        return Err(SysupError::Config(
            "--repo and --aur are mutually exclusive".into(),
        ));
    }
    Ok(())
}

/// Resolve `--quiet` against `--verbose`. Quiet wins and the clash is logged once.
pub fn resolve_verbosity(quiet: bool, verbose: bool, logger: &Logger) -> bool {
    if quiet && verbose {
        logger.warn("CONFLICT", "--quiet overrides --verbose");
        return false;
    }
    verbose
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::LogLevel;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_document_yields_defaults() {
        let config = SysupConfig::from_toml("").unwrap();
        assert_eq!(config.sync.devel_pkgs_expiration, -1);
        assert_eq!(config.sync.upgrade_sorting, UpgradeSorting::VersionDiff);
        assert!(config.ui.group_by_repository);
        assert_eq!(config.official_repos().len(), OFFICIAL_REPOS.len());
        assert_eq!(config.color_scheme(), ColorScheme::default());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = SysupConfig::from_toml(
            r#"
            [sync]
            upgrade_sorting = "repo"
            ignore = ["linux*", "nvidia"]

            [ui]
            aur_search_sorting = "numvotes"

            [aur]
            max_args = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.sync.upgrade_sorting, UpgradeSorting::Repo);
        assert_eq!(config.sync.ignore, vec!["linux*", "nvidia"]);
        assert!(!config.sync.show_download_size);
        assert_eq!(config.ui.aur_search_sorting, AurSearchSorting::NumVotes);
        assert_eq!(config.aur.max_args, 50);
        assert_eq!(config.aur.max_retries, 3);
    }

    #[test]
    fn unknown_sorting_mode_is_config_error() {
        let err = SysupConfig::from_toml("[sync]\nupgrade_sorting = \"size\"\n").unwrap_err();
        assert!(matches!(err, SysupError::Config(_)));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[paths]\nlog_dir = \"/tmp/sysup-logs\"").unwrap();
        let config = SysupConfig::load_from_optional_path(Some(file.path())).unwrap();
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/sysup-logs"));
    }

    #[test]
    fn explicit_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = SysupConfig::load_from_optional_path(Some(&missing)).unwrap_err();
        assert!(matches!(err, SysupError::Config(_)));
    }

    #[test]
    fn quiet_overrides_verbose_with_one_warning() {
        let logger = Logger::capturing();
        assert!(!resolve_verbosity(true, true, &logger));

        let entries = logger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Warn);
        assert_eq!(entries[0].code, "CONFLICT");
    }

    #[test]
    fn verbosity_without_clash_is_silent() {
        let logger = Logger::capturing();
        assert!(resolve_verbosity(false, true, &logger));
        assert!(!resolve_verbosity(true, false, &logger));
        assert!(logger.entries().is_empty());
    }

    #[test]
    fn repo_and_aur_together_is_config_error() {
        let err = reject_exclusive_sources(true, true).unwrap_err();
        assert!(matches!(err, SysupError::Config(_)));
        assert!(reject_exclusive_sources(true, false).is_ok());
        assert!(reject_exclusive_sources(false, true).is_ok());
        assert!(reject_exclusive_sources(false, false).is_ok());
    }
}
