/*============================================================
  Synavera Project: Syn-Syu
  Module: sysup_core
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Upgrade classification and presentation core: turns local
    and remote package snapshots into ordered, filtered and
    rendered upgrade reports.

  Security / Safety Notes:
    The classification core is pure; only `pacman` and `aur`
    touch external commands or the network.

  Dependencies:
    See Cargo.toml; adapters use tokio and reqwest.

  Operational Scope:
    Library behind the `sysup` binary and its tests.

  Revision History:
    2025-11-12 COD  Split library surface from the binary.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Pure core, effectful edges
    - One error taxonomy shared by every module
============================================================*/

pub mod aur;
pub mod classify;
pub mod color;
pub mod config;
pub mod error;
pub mod ignore;
pub mod listing;
pub mod logger;
pub mod package_info;
pub mod pacman;
pub mod ranking;
pub mod report;
pub mod staleness;
pub mod term;
pub mod version;
