/*============================================================
  Synavera Project: Syn-Syu
  Module: sysup_core::main
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Entry point for sysup. Snapshots installed packages,
    resolves upgrades against sync databases and the AUR, and
    prints upgrade listings, sysupgrade reports and searches.

  Security / Safety Notes:
    Operates within user privileges. Executes read-only pacman
    queries and performs HTTPS GET requests only.

  Dependencies:
    clap for CLI parsing, chrono for timestamps, serde_json for
    machine-readable reports.

  Operational Scope:
    Invoked directly by operators or by the Syn-Syu Bash layer.

  Revision History:
    2025-10-28 COD  Authored Syn-Syu Core runtime.
    2025-11-12 COD  Reworked into the sysup upgrade reporter.
    2025-11-19 COD  pacman IgnorePkg merge; notices always on stderr.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging following Synavera cadence
    - Configurable execution via CLI and config file
============================================================*/

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Utc;
use clap::{ArgAction, Args, Parser, Subcommand};
use console::Term;

use sysup_core::aur::AurClient;
use sysup_core::classify::{names_missing_from_repos, AurPolicy, UpdateClassifier};
use sysup_core::color::ColorAllocator;
use sysup_core::config::{reject_exclusive_sources, resolve_verbosity, SysupConfig};
use sysup_core::error::{Result, SysupError};
use sysup_core::ignore::{FilterOutcome, IgnoreFilter, PatternSet};
use sysup_core::listing::{ListingFormatter, ListingOptions, SearchRowOptions};
use sysup_core::logger::Logger;
use sysup_core::package_info::{SearchCandidate, UpdateRecord};
use sysup_core::pacman::{self, SyncListing};
use sysup_core::ranking::{sort_updates, SearchRanking};
use sysup_core::report::{ReportOptions, SysupgradeReport};
use sysup_core::term::terminal_width;
use sysup_core::version::{AlpmVersion, VersionMetric};

/// Command-line arguments for sysup.
#[derive(Debug, Parser)]
#[command(
    name = "sysup",
    version,
    author = "Synavera Systems",
    about = "Upgrade listings and reports for pacman and the AUR"
)]
struct Cli {
    /// Override configuration file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Explicit log file path.
    #[arg(long, global = true, value_name = "PATH")]
    log: Option<PathBuf>,
    /// Echo every log entry to stderr.
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    debug: bool,
    /// Disable colored output.
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    no_color: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List available upgrades.
    Upgrades(UpgradeArgs),
    /// Print the full sysupgrade report.
    Sysupgrade {
        #[command(flatten)]
        upgrade: UpgradeArgs,
        /// Packages were picked by hand; hide dependency sections.
        #[arg(long, action = ArgAction::SetTrue)]
        manual: bool,
        /// Emit the filtered buckets as JSON.
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Search sync databases and the AUR.
    Search {
        #[arg(required = true, value_name = "TERM")]
        terms: Vec<String>,
        /// Search sync databases only.
        #[arg(long, action = ArgAction::SetTrue)]
        repo: bool,
        /// Search the AUR only.
        #[arg(long, action = ArgAction::SetTrue)]
        aur: bool,
        /// Number results.
        #[arg(long, action = ArgAction::SetTrue)]
        enumerate: bool,
        /// Print names only.
        #[arg(long, short, action = ArgAction::SetTrue)]
        quiet: bool,
    },
}

#[derive(Debug, Args)]
struct UpgradeArgs {
    /// Consider sync databases only.
    #[arg(long, action = ArgAction::SetTrue)]
    repo: bool,
    /// Consider the AUR only.
    #[arg(long, action = ArgAction::SetTrue)]
    aur: bool,
    /// Suggest rebuilds for every development package.
    #[arg(long, action = ArgAction::SetTrue)]
    devel: bool,
    /// Skip AUR upgrades flagged out of date.
    #[arg(long, action = ArgAction::SetTrue)]
    ignore_outofdate: bool,
    /// Ignore packages matching PAT (glob, comma separated).
    #[arg(long, value_name = "PAT", value_delimiter = ',', action = ArgAction::Append)]
    ignore: Vec<String>,
    /// Print names only.
    #[arg(long, short, action = ArgAction::SetTrue)]
    quiet: bool,
    /// Show descriptions and repositories.
    #[arg(long, short, action = ArgAction::SetTrue)]
    verbose: bool,
}

/// Classified and filtered upgrades plus unresolved names.
struct Collected {
    outcome: FilterOutcome,
    not_found: Vec<String>,
    skipped_outofdate: Vec<UpdateRecord>,
    sync_order: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[sysup] {}", err);
            err.exit_code()
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = SysupConfig::load_from_optional_path(cli.config.as_deref())?;

    let session_stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let log_path = cli
        .log
        .clone()
        .unwrap_or_else(|| config.log_dir().join(format!("sysup_{session_stamp}.log")));
    let logger = Logger::new(Some(log_path), cli.debug)?;
    logger.info("INIT", "sysup awakening.");

    let color = !cli.no_color && Term::stdout().is_term();
    let result = match cli.command {
        Command::Upgrades(args) => upgrades(&args, &config, &logger, color).await,
        Command::Sysupgrade {
            upgrade,
            manual,
            json,
        } => sysupgrade(&upgrade, manual, json, &config, &logger, color).await,
        Command::Search {
            terms,
            repo,
            aur,
            enumerate,
            quiet,
        } => {
            let options = SearchRowOptions {
                enumerate,
                quiet,
                display_last_updated: config.ui.display_last_updated,
                color,
            };
            search(&terms, repo, aur, options, &config, &logger).await
        }
    };

    if let Err(err) = &result {
        logger.error("FAILED", err.to_string());
    } else {
        logger.info("COMPLETE", "Consciousness synchronised.");
    }
    logger.finalize()?;
    result
}

async fn collect_updates(
    args: &UpgradeArgs,
    config: &SysupConfig,
    logger: &Logger,
) -> Result<Collected> {
    reject_exclusive_sources(args.repo, args.aur)?;

    let local = pacman::local_snapshot().await?;
    logger.info("PACKAGES", format!("Detected {} installed packages", local.len()));
    let listing: SyncListing = pacman::list_sync_packages().await?;

    let metric = AlpmVersion;
    let classifier = UpdateClassifier::new(&metric, logger);

    let repo_updates = if args.aur {
        Vec::new()
    } else {
        let newer: Vec<_> = listing
            .installed_candidates(&local)
            .into_iter()
            .filter(|candidate| {
                local.get(&candidate.name).is_some_and(|installed| {
                    metric.compare(&installed.version, &candidate.version) == Ordering::Less
                })
            })
            .collect();
        let detailed = pacman::query_repo_details(&newer).await?;
        classifier.repo_updates(&local, &detailed)?
    };

    let (aur_updates, not_found, skipped_outofdate) = if args.repo {
        (Vec::new(), Vec::new(), Vec::new())
    } else {
        let names = names_missing_from_repos(&local, &listing.packages);
        let client = AurClient::new(&config.aur)?;
        let lookup = client.fetch_info(&names).await?;
        let policy = AurPolicy {
            ignore_outofdate: args.ignore_outofdate || config.sync.ignore_outofdate,
            devel_ttl_days: config.sync.devel_pkgs_expiration,
            force_devel: args.devel,
        };
        let classified = classifier.aur_updates(&local, &lookup, policy, Utc::now())?;
        (
            classified.updates,
            classified.not_found,
            classified.skipped_outofdate,
        )
    };

    logger.info(
        "SOURCES",
        format!(
            "Repo updates={} AUR updates={}",
            repo_updates.len(),
            aur_updates.len()
        ),
    );

    let buckets =
        classifier.bucket_updates(repo_updates, aur_updates, &config.official_repos())?;
    let pacman_ignored = pacman::ignored_packages().await?;
    let ignore: Vec<&str> = config
        .sync
        .ignore
        .iter()
        .chain(&args.ignore)
        .chain(&pacman_ignored)
        .map(String::as_str)
        .collect();
    let filter = IgnoreFilter::new(
        PatternSet::new(&ignore),
        PatternSet::new(&config.ui.warn_about_package_updates),
    );

    Ok(Collected {
        outcome: filter.apply(buckets, logger),
        not_found,
        skipped_outofdate,
        sync_order: listing.order,
    })
}

fn report_options(config: &SysupConfig, verbose: bool, manual: bool, color: bool) -> ReportOptions {
    ReportOptions {
        verbose,
        manual_package_selection: manual,
        always_show_origin: config.sync.always_show_pkg_origin,
        show_download_size: config.sync.show_download_size,
        sorting: config.sync.upgrade_sorting,
        color,
    }
}

fn print_notices<M: VersionMetric>(report: &SysupgradeReport<'_, M>, collected: &Collected) {
    for notice in report.notices(&collected.outcome, &collected.not_found, terminal_width()) {
        eprintln!("{notice}");
    }
}

async fn upgrades(
    args: &UpgradeArgs,
    config: &SysupConfig,
    logger: &Logger,
    color: bool,
) -> Result<ExitCode> {
    let verbose = resolve_verbosity(args.quiet, args.verbose, logger);
    let collected = collect_updates(args, config, logger).await?;

    let colors = ColorAllocator::with_repositories(
        config.repos.official.iter().map(String::as_str),
        collected.sync_order.iter().map(String::as_str),
    );
    let report = SysupgradeReport::new(
        &AlpmVersion,
        &colors,
        config.color_scheme(),
        report_options(config, verbose, false, color),
    );
    print_notices(&report, &collected);

    let records: Vec<UpdateRecord> = collected
        .outcome
        .warned
        .iter()
        .map(|entry| entry.record.clone())
        .chain(collected.outcome.buckets.iter().map(|(_, record)| record.clone()))
        .collect();

    let formatter = ListingFormatter::new(&AlpmVersion, &colors, config.color_scheme());
    let options = ListingOptions {
        verbose,
        print_repo: config.sync.always_show_pkg_origin,
        color,
        show_download_size: config.sync.show_download_size,
        ..ListingOptions::default()
    };
    if args.quiet {
        for record in sort_updates(&records, config.sync.upgrade_sorting, &AlpmVersion) {
            println!("{}", record.name());
        }
    } else {
        for line in formatter.render_sorted(&records, config.sync.upgrade_sorting, options) {
            println!("{line}");
        }
    }

    logger.info(
        "SUMMARY",
        format!(
            "upgrades={} skipped_outofdate={}",
            records.len(),
            collected.skipped_outofdate.len()
        ),
    );
    Ok(ExitCode::SUCCESS)
}

async fn sysupgrade(
    args: &UpgradeArgs,
    manual: bool,
    json: bool,
    config: &SysupConfig,
    logger: &Logger,
    color: bool,
) -> Result<ExitCode> {
    let verbose = resolve_verbosity(args.quiet, args.verbose, logger);
    let collected = collect_updates(args, config, logger).await?;

    if json {
        let rendered = serde_json::to_string_pretty(&collected.outcome).map_err(|err| {
            SysupError::Serialization(format!("Failed to encode report: {err}"))
        })?;
        println!("{rendered}");
        return Ok(ExitCode::SUCCESS);
    }

    let colors = ColorAllocator::with_repositories(
        config.repos.official.iter().map(String::as_str),
        collected.sync_order.iter().map(String::as_str),
    );
    let report = SysupgradeReport::new(
        &AlpmVersion,
        &colors,
        config.color_scheme(),
        report_options(config, verbose, manual, color),
    );
    print_notices(&report, &collected);

    if collected.outcome.buckets.is_empty() && collected.outcome.warned.is_empty() {
        println!(" there is nothing to do");
        logger.info("EMPTY", "No upgrades available");
        return Ok(ExitCode::SUCCESS);
    }
    println!("{}", report.render(&collected.outcome));

    logger.info(
        "SUMMARY",
        format!(
            "updates={} ignored={} warned={} skipped_outofdate={}",
            collected.outcome.buckets.len(),
            collected.outcome.ignored.len(),
            collected.outcome.warned.len(),
            collected.skipped_outofdate.len()
        ),
    );
    Ok(ExitCode::SUCCESS)
}

async fn search(
    terms: &[String],
    repo_only: bool,
    aur_only: bool,
    options: SearchRowOptions,
    config: &SysupConfig,
    logger: &Logger,
) -> Result<ExitCode> {
    reject_exclusive_sources(repo_only, aur_only)?;

    let installed: HashMap<String, String> = pacman::local_snapshot()
        .await?
        .into_iter()
        .map(|(name, pkg)| (name, pkg.version))
        .collect();

    let mut candidates: Vec<SearchCandidate> = Vec::new();
    let mut sync_order: Vec<String> = Vec::new();
    if !aur_only {
        if config.ui.group_by_repository {
            sync_order = pacman::list_sync_packages().await?.order;
        }
        candidates.extend(
            pacman::search_repo(terms)
                .await?
                .into_iter()
                .map(SearchCandidate::Repo),
        );
    }
    if !repo_only {
        let client = AurClient::new(&config.aur)?;
        candidates.extend(
            client
                .search(terms)
                .await?
                .into_iter()
                .map(SearchCandidate::Aur),
        );
    }
    logger.info("SEARCH", format!("{} results for {}", candidates.len(), terms.join(" ")));

    let ranking = SearchRanking {
        sync_order,
        group_by_repository: config.ui.group_by_repository,
        aur_sorting: config.ui.aur_search_sorting,
        reverse: config.ui.reverse_search_sorting,
    };
    let ranked = ranking.rank(candidates);

    let colors = ColorAllocator::with_repositories(
        config.repos.official.iter().map(String::as_str),
        ranking.sync_order.iter().map(String::as_str),
    );
    let formatter = ListingFormatter::new(&AlpmVersion, &colors, config.color_scheme());
    for row in formatter.render_search(&ranked, &installed, options) {
        println!("{row}");
    }
    Ok(ExitCode::SUCCESS)
}
