/*============================================================
  Synavera Project: Syn-Syu
  Module: sysup_core::aur
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Query the Arch User Repository RPC API for package info and
    search results.

  Security / Safety Notes:
    Performs read-only HTTPS requests to the public AUR API.
    No credentials are transmitted.

  Dependencies:
    reqwest for HTTP, serde for response parsing, chrono for
    RPC timestamps, urlencoding for query arguments.

  Operational Scope:
    Resolves packages absent from the sync databases and feeds
    the search command.

  Revision History:
    2024-11-04 COD  Implemented asynchronous AUR client.
    2025-11-12 COD  Full info records, not-found tracking, search.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Retry logic with exponential backoff
    - Structured response parsing with explicit error paths
    - Configurable timeouts, batching and parallelism
============================================================*/

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use urlencoding::encode;

use crate::config::AurConfig;
use crate::error::{Result, SysupError};
use crate::package_info::{AurLookup, AurPackage};

/// Client for interacting with the AUR RPC API.
#[derive(Clone)]
pub struct AurClient {
    client: reqwest::Client,
    base_url: String,
    max_args: usize,
    max_retries: usize,
    max_parallel_requests: usize,
}

impl AurClient {
    /// Construct a new client from configuration.
    pub fn new(config: &AurConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(concat!("sysup/", env!("CARGO_PKG_VERSION"), " (linux)"))
            .build()
            .map_err(|err| SysupError::Network(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_args: config.max_args.max(1),
            max_retries: config.max_retries.max(1),
            max_parallel_requests: config.max_parallel_requests.max(1),
        })
    }

    /// Look up `packages`; names the AUR does not know land in `not_found`.
    pub async fn fetch_info(&self, packages: &[String]) -> Result<AurLookup> {
        let mut lookup = AurLookup::default();
        if packages.is_empty() {
            return Ok(lookup);
        }

        let semaphore = Arc::new(Semaphore::new(self.max_parallel_requests));
        let mut tasks = Vec::new();
        for chunk in packages.chunks(self.max_args) {
            let client = self.clone();
            let semaphore = semaphore.clone();
            let url = self.info_url(chunk);
            tasks.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| SysupError::Runtime("AUR semaphore closed".into()))?;
                client.fetch(&url).await
            }));
        }

        for task in tasks {
            let entries = task
                .await
                .map_err(|err| SysupError::Runtime(format!("AUR task failed: {err}")))??;
            lookup
                .found
                .extend(entries.into_iter().map(AurEntry::into_package));
        }

        let found: HashSet<&str> = lookup.found.iter().map(|pkg| pkg.name.as_str()).collect();
        let missing: BTreeSet<String> = packages
            .iter()
            .filter(|name| !found.contains(name.as_str()))
            .cloned()
            .collect();
        lookup.not_found = missing.into_iter().collect();
        Ok(lookup)
    }

    /// Packages whose name or description matches every term.
    pub async fn search(&self, terms: &[String]) -> Result<Vec<AurPackage>> {
        let mut results: Option<Vec<AurPackage>> = None;
        for term in terms {
            let entries = self.fetch(&self.search_url(term)).await?;
            let packages: Vec<AurPackage> =
                entries.into_iter().map(AurEntry::into_package).collect();
            results = Some(match results {
                None => packages,
                Some(previous) => {
                    let names: HashSet<&str> =
                        packages.iter().map(|pkg| pkg.name.as_str()).collect();
                    previous
                        .into_iter()
                        .filter(|pkg| names.contains(pkg.name.as_str()))
                        .collect()
                }
            });
        }
        Ok(results.unwrap_or_default())
    }

    fn info_url(&self, packages: &[String]) -> String {
        let mut url = format!("{}?v=5&type=info", self.base_url);
        for pkg in packages {
            url.push_str("&arg[]=");
            url.push_str(&encode(pkg));
        }
        url
    }

    fn search_url(&self, term: &str) -> String {
        format!(
            "{}?v=5&type=search&by=name-desc&arg={}",
            self.base_url,
            encode(term)
        )
    }

    async fn fetch(&self, url: &str) -> Result<Vec<AurEntry>> {
        let mut attempt = 0;
        loop {
            let response = self.client.get(url).send().await.map_err(|err| {
                SysupError::Network(format!("AUR request to {url} failed: {err}"))
            })?;

            if response.status() == StatusCode::OK {
                let payload = response.json::<AurResponse>().await.map_err(|err| {
                    SysupError::Serialization(format!("Failed to decode AUR response: {err}"))
                })?;
                return payload.into_results(url);
            }

            attempt += 1;
            if attempt >= self.max_retries {
                return Err(SysupError::Network(format!(
                    "AUR request {url} failed with status {} after {attempt} retries",
                    response.status()
                )));
            }
            let exponent = (attempt as u32).min(8);
            let backoff = Duration::from_millis(200_u64.saturating_mul(1_u64 << exponent));
            sleep(backoff).await;
        }
    }
}

#[derive(Debug, Deserialize)]
struct AurResponse {
    #[serde(default)]
    results: Vec<AurEntry>,
    error: Option<String>,
}

impl AurResponse {
    fn into_results(self, url: &str) -> Result<Vec<AurEntry>> {
        match self.error {
            Some(error) => Err(SysupError::Network(format!(
                "AUR responded with error for {url}: {error}"
            ))),
            None => Ok(self.results),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AurEntry {
    name: String,
    version: String,
    description: Option<String>,
    maintainer: Option<String>,
    out_of_date: Option<i64>,
    num_votes: Option<u64>,
    popularity: Option<f64>,
    last_modified: Option<i64>,
}

impl AurEntry {
    fn into_package(self) -> AurPackage {
        AurPackage {
            name: self.name,
            version: self.version,
            description: self.description.filter(|desc| !desc.is_empty()),
            maintainer: self.maintainer,
            out_of_date: self.out_of_date.and_then(timestamp),
            popularity: self.popularity,
            votes: self.num_votes,
            last_modified: self.last_modified.and_then(timestamp),
        }
    }
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}
