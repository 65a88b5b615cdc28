/*============================================================
  Synavera Project: Syn-Syu
  Module: sysup_core::report
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Assemble the multi-section sysupgrade report and the short
    notices for ignored, skipped and unresolved packages.

  Security / Safety Notes:
    Output only; consumes filtered buckets read-only.

  Dependencies:
    None beyond crate modules.

  Operational Scope:
    Final stage of the sysupgrade flow in the binary.

  Revision History:
    2025-11-12 COD  Authored sysupgrade report assembly.
    2025-11-19 COD  Notice assembly moved out of the binary.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Fixed section order; headers only for non-empty buckets
    - Totals cover surfaced records only
============================================================*/

use crate::classify::{BucketKind, BucketSet};
use crate::color::{colors, ColorAllocator, Painter};
use crate::ignore::FilterOutcome;
use crate::listing::{ColorScheme, LineTemplate, ListingFormatter, ListingOptions, TerminalWidth};
use crate::package_info::{Origin, UpdateRecord};
use crate::ranking::UpgradeSorting;
use crate::term::{format_paragraph, pluralize};
use crate::version::VersionMetric;

const MIB: f64 = 1024.0 * 1024.0;

/// Display switches for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub verbose: bool,
    /// User picked packages by hand: hide dependency sections, no colour.
    pub manual_package_selection: bool,
    pub always_show_origin: bool,
    pub show_download_size: bool,
    pub sorting: UpgradeSorting,
    pub color: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            manual_package_selection: false,
            always_show_origin: false,
            show_download_size: false,
            sorting: UpgradeSorting::default(),
            color: true,
        }
    }
}

struct Section {
    bucket: BucketKind,
    marker: u8,
    singular: &'static str,
    plural: &'static str,
    print_repo: Option<bool>,
}

const fn section(
    bucket: BucketKind,
    marker: u8,
    singular: &'static str,
    plural: &'static str,
    print_repo: Option<bool>,
) -> Section {
    Section {
        bucket,
        marker,
        singular,
        plural,
        print_repo,
    }
}

const INSTALL_MARKER: u8 = colors::BLUE + colors::HIGHLIGHT;
const DEPENDENCY_MARKER: u8 = colors::YELLOW + colors::HIGHLIGHT;
const AUR_MARKER: u8 = colors::CYAN + colors::HIGHLIGHT;

const SECTIONS: [Section; 8] = [
    section(
        BucketKind::RepoReplacements,
        INSTALL_MARKER,
        "Repository package suggested as a replacement:",
        "Repository packages suggested as a replacement:",
        None,
    ),
    section(
        BucketKind::ThirdpartyReplacements,
        INSTALL_MARKER,
        "Third-party repository package suggested as a replacement:",
        "Third-party repository packages suggested as a replacement:",
        None,
    ),
    section(
        BucketKind::RepoUpdates,
        INSTALL_MARKER,
        "Repository package will be installed:",
        "Repository packages will be installed:",
        None,
    ),
    section(
        BucketKind::NewRepoDeps,
        DEPENDENCY_MARKER,
        "New dependency will be installed from repository:",
        "New dependencies will be installed from repository:",
        None,
    ),
    section(
        BucketKind::ThirdpartyRepoUpdates,
        INSTALL_MARKER,
        "Third-party repository package will be installed:",
        "Third-party repository packages will be installed:",
        Some(true),
    ),
    section(
        BucketKind::NewThirdpartyDeps,
        DEPENDENCY_MARKER,
        "New dependency will be installed from third-party repository:",
        "New dependencies will be installed from third-party repository:",
        None,
    ),
    section(
        BucketKind::AurUpdates,
        AUR_MARKER,
        "AUR package will be installed:",
        "AUR packages will be installed:",
        Some(false),
    ),
    section(
        BucketKind::NewAurDeps,
        DEPENDENCY_MARKER,
        "New dependency will be installed from AUR:",
        "New dependencies will be installed from AUR:",
        Some(false),
    ),
];

/// Builds the sysupgrade report text.
pub struct SysupgradeReport<'a, M: VersionMetric> {
    formatter: ListingFormatter<'a, M>,
    options: ReportOptions,
    painter: Painter,
}

impl<'a, M: VersionMetric> SysupgradeReport<'a, M> {
    pub fn new(
        metric: &'a M,
        colors: &'a ColorAllocator,
        scheme: ColorScheme,
        options: ReportOptions,
    ) -> Self {
        let color = options.color && !options.manual_package_selection;
        Self {
            formatter: ListingFormatter::new(metric, colors, scheme),
            options: ReportOptions { color, ..options },
            painter: Painter::new(color),
        }
    }

    pub fn with_width(mut self, width: TerminalWidth) -> Self {
        self.formatter = self.formatter.with_width(width);
        self
    }

    /// Render all sections for the filtered buckets.
    pub fn render(&self, outcome: &FilterOutcome) -> String {
        let mut result: Vec<String> = Vec::new();
        let manual = self.options.manual_package_selection;

        let warned: Vec<UpdateRecord> = outcome
            .warned
            .iter()
            .filter(|entry| !(manual && entry.bucket.is_dependency()))
            .map(|entry| entry.record.clone())
            .collect();
        if !warned.is_empty() {
            let banner = pluralize(
                "WARNING about package installation:",
                "WARNING about packages installation:",
                warned.len(),
            );
            let alert = colors::RED + colors::HIGHLIGHT;
            result.push(format!(
                "\n{} {} {} {}",
                self.painter.paint("::", INSTALL_MARKER),
                self.painter.paint("!!", alert),
                self.painter.paint(banner, alert),
                self.painter.paint("!!", alert),
            ));
            result.push(self.listing(&warned, None));
        }

        for section in &SECTIONS {
            if manual && section.bucket.is_dependency() {
                continue;
            }
            let records = outcome.buckets.get(section.bucket);
            if records.is_empty() {
                continue;
            }
            result.push(format!(
                "\n{} {}",
                self.painter.paint("::", section.marker),
                self.painter
                    .bold(pluralize(section.singular, section.plural, records.len())),
            ));
            result.push(self.listing(records, section.print_repo));
        }

        result.push(self.totals(&outcome.buckets));
        result.join("\n")
    }

    fn listing(&self, records: &[UpdateRecord], print_repo: Option<bool>) -> String {
        let options = ListingOptions {
            verbose: self.options.verbose,
            print_repo: print_repo.unwrap_or(self.options.always_show_origin),
            color: self.options.color,
            template: LineTemplate::Full,
            show_download_size: self.options.show_download_size,
        };
        self.formatter
            .render_sorted(records, self.options.sorting, options)
            .join("\n")
    }

    fn totals(&self, buckets: &BucketSet) -> String {
        if !self.options.show_download_size {
            return String::new();
        }
        let manual = self.options.manual_package_selection;
        let (download, installed) = buckets
            .iter()
            .filter(|(kind, _)| !(manual && kind.is_dependency()))
            .fold((0u64, 0u64), |(download, installed), (_, record)| {
                match record.origin() {
                    Origin::Repo {
                        download_size,
                        installed_size,
                        ..
                    } => (
                        download.saturating_add(download_size.unwrap_or(0)),
                        installed.saturating_add(installed_size.unwrap_or(0)),
                    ),
                    Origin::Aur { .. } => (download, installed),
                }
            });
        format!(
            "\n{}{:>10} MiB\n{}{:>9} MiB\n",
            self.painter.bold("Total Download Size:"),
            format!("{:.2}", download as f64 / MIB),
            self.painter.bold("Total Installed Size:"),
            format!("{:.2}", installed as f64 / MIB),
        )
    }

    /// One-line notice for a package removed by an ignore pattern.
    pub fn format_ignored_notice(&self, record: &UpdateRecord) -> String {
        let template = if !record.current_version().is_empty() && !record.new_version().is_empty()
        {
            LineTemplate::NameAndVersions
        } else if !record.current_version().is_empty() {
            LineTemplate::NameAndCurrent
        } else {
            LineTemplate::NameAndNew
        };
        let options = ListingOptions {
            color: self.options.color,
            template,
            ..ListingOptions::default()
        };
        let rendered = self.formatter.render([record], options).join("");
        let message = if template == LineTemplate::NameAndVersions {
            format!("Ignoring package update {rendered}")
        } else {
            format!("Ignoring package {rendered}")
        };
        format!(
            "{} {message}",
            self.painter.paint("::", colors::YELLOW + colors::HIGHLIGHT)
        )
    }

    /// Stderr notices: one per ignored record, then the AUR not-found block.
    /// Emitted in quiet mode too.
    pub fn notices(&self, outcome: &FilterOutcome, not_found: &[String], width: usize) -> Vec<String> {
        let mut notices: Vec<String> = outcome
            .ignored
            .iter()
            .map(|entry| self.format_ignored_notice(&entry.record))
            .collect();
        if !not_found.is_empty() {
            notices.push(format_not_found(not_found, false, self.painter, width));
        }
        notices
    }
}

/// Warning line for an upgrade skipped because the AUR flags it out of date.
pub fn format_outofdate_skip(record: &UpdateRecord, painter: Painter) -> String {
    format!(
        "{} {} AUR package marked as 'outofdate' - skipping",
        record.name(),
        painter.bold(record.new_version())
    )
}

/// Header plus indented names for packages nobody could resolve.
pub fn format_not_found(names: &[String], repo: bool, painter: Painter, width: usize) -> String {
    let header = if repo {
        pluralize(
            "Following package cannot be found in repositories:",
            "Following packages cannot be found in repositories:",
            names.len(),
        )
    } else {
        pluralize(
            "Following package cannot be found in AUR:",
            "Following packages cannot be found in AUR:",
            names.len(),
        )
    };
    let mut lines = vec![painter.bold(header)];
    lines.extend(names.iter().map(|name| format_paragraph(name, width)));
    lines.join("\n")
}
