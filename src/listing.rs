/*============================================================
  Synavera Project: Syn-Syu
  Module: sysup_core::listing
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Render update records and search results as aligned,
    diff-highlighted terminal lines.

  Security / Safety Notes:
    Output only; records are never mutated here.

  Dependencies:
    chrono for out-of-date and last-updated dates.

  Operational Scope:
    Used by the upgrade listing, the sysupgrade report, the
    ignored-package notices and the search command.

  Revision History:
    2025-11-12 COD  Authored listing formatter.
    2025-11-19 COD  Devel age shown only for aged refreshes.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Alignment counts visible characters only
    - Padding never drops below one space
    - Templates are a closed set of pure functions
============================================================*/

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::color::{colors, ColorAllocator, Painter, GROUP_COLOR, ORPHANED_COLOR, REPLACEMENTS_COLOR};
use crate::package_info::{Origin, SearchCandidate, UpdateRecord};
use crate::ranking::{sort_updates, RankedCandidate, UpgradeSorting};
use crate::term::{format_paragraph, pluralize, terminal_width};
use crate::version::VersionMetric;

const MAX_COLUMN_WIDTH: i64 = 37;
/// Space reserved for the arrow and the start of the new version.
const VERSION_COLUMN_OFFSET: i64 = 18;
const AUR_PREFIX: &str = "aur/";
const DATE_FORMAT: &str = "%Y/%m/%d";

/// Colours for the version columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorScheme {
    pub version: u8,
    pub version_diff_old: u8,
    pub version_diff_new: u8,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            version: colors::GREEN + colors::HIGHLIGHT,
            version_diff_old: colors::RED + colors::HIGHLIGHT,
            version_diff_new: colors::YELLOW + colors::HIGHLIGHT,
        }
    }
}

/// Where the terminal width comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TerminalWidth {
    #[default]
    Live,
    Fixed(usize),
}

impl TerminalWidth {
    fn resolve(self) -> usize {
        match self {
            TerminalWidth::Live => terminal_width(),
            TerminalWidth::Fixed(width) => width,
        }
    }
}

/// Column where versions start, capped at 37.
pub fn column_width(terminal_width: usize) -> i64 {
    ((terminal_width as f64 / 2.5) as i64).min(MAX_COLUMN_WIDTH)
}

/// Named line layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineTemplate {
    /// Aligned name, versions, size and markers.
    #[default]
    Full,
    /// `name (current => new)`
    NameAndVersions,
    /// `name current`
    NameAndCurrent,
    /// `name new`
    NameAndNew,
}

impl LineTemplate {
    fn apply(self, fields: &RenderedFields) -> String {
        match self {
            LineTemplate::Full => format!(
                " {}{} {}{}{}{}{}{}{}{}{}",
                fields.name,
                spaces(fields.spacing),
                fields.current_version,
                spaces(fields.spacing2),
                fields.version_separator,
                fields.new_version,
                fields.spacing3.map(spaces).unwrap_or_default(),
                fields.size,
                fields.days_old,
                fields.out_of_date,
                fields.verbose,
            ),
            LineTemplate::NameAndVersions => format!(
                "{} ({} => {})",
                fields.name, fields.current_version, fields.new_version
            ),
            LineTemplate::NameAndCurrent => format!("{} {}", fields.name, fields.current_version),
            LineTemplate::NameAndNew => format!("{} {}", fields.name, fields.new_version),
        }
    }
}

/// Per-call rendering switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingOptions {
    /// Append the description paragraph and always show the repository.
    pub verbose: bool,
    /// Show `repo/` or `aur/` before every name.
    pub print_repo: bool,
    pub color: bool,
    pub template: LineTemplate,
    /// Show the download size of repository packages.
    pub show_download_size: bool,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            print_repo: false,
            color: true,
            template: LineTemplate::Full,
            show_download_size: false,
        }
    }
}

/// Pieces of one rendered record before template substitution.
#[derive(Debug, Default)]
struct RenderedFields {
    name: String,
    current_version: String,
    new_version: String,
    version_separator: &'static str,
    spacing: usize,
    spacing2: usize,
    spacing3: Option<usize>,
    size: String,
    days_old: String,
    out_of_date: String,
    verbose: String,
}

fn spaces(count: usize) -> String {
    " ".repeat(count)
}

/// Padding that never drops below a single space.
fn padding(width: i64) -> usize {
    width.max(1) as usize
}

/// Renders update records and search results.
pub struct ListingFormatter<'a, M: VersionMetric> {
    metric: &'a M,
    colors: &'a ColorAllocator,
    scheme: ColorScheme,
    width: TerminalWidth,
}

impl<'a, M: VersionMetric> ListingFormatter<'a, M> {
    pub fn new(metric: &'a M, colors: &'a ColorAllocator, scheme: ColorScheme) -> Self {
        Self {
            metric,
            colors,
            scheme,
            width: TerminalWidth::Live,
        }
    }

    pub fn with_width(mut self, width: TerminalWidth) -> Self {
        self.width = width;
        self
    }

    /// Render records in the order given.
    pub fn render<'r, I>(&self, records: I, options: ListingOptions) -> Vec<String>
    where
        I: IntoIterator<Item = &'r UpdateRecord>,
    {
        let term_width = self.width.resolve();
        let column = column_width(term_width);
        let painter = Painter::new(options.color);
        records
            .into_iter()
            .map(|record| {
                let fields = self.fields(record, options, painter, column, term_width);
                options.template.apply(&fields)
            })
            .collect()
    }

    /// Sort with `sorting`, then render.
    pub fn render_sorted(
        &self,
        records: &[UpdateRecord],
        sorting: UpgradeSorting,
        options: ListingOptions,
    ) -> Vec<String> {
        self.render(sort_updates(records, sorting, self.metric), options)
    }

    fn fields(
        &self,
        record: &UpdateRecord,
        options: ListingOptions,
        painter: Painter,
        column: i64,
        term_width: usize,
    ) -> RenderedFields {
        let current = record.current_version();
        let new = record.new_version();
        let (common, _) = self.metric.common_version(current, new);

        let mut name_len = record.name().chars().count() as i64;
        let mut name = painter.bold(record.name());

        match record.origin() {
            Origin::Repo { repository, .. } if options.print_repo || options.verbose => {
                name = format!("{}{name}", self.colors.repo_prefix(repository, painter));
                name_len += repository.chars().count() as i64 + 1;
            }
            Origin::Aur { .. } if options.print_repo => {
                name = format!("{}{name}", painter.paint(AUR_PREFIX, colors::RED + colors::HIGHLIGHT));
                name_len += AUR_PREFIX.len() as i64;
            }
            _ => {}
        }

        if !record.required_by().is_empty() {
            let (segment, visible) = required_by_segment(record.required_by(), painter);
            name.push_str(&segment);
            name_len += visible;
        }
        if !record.provided_by().is_empty() {
            let plain = format!(" ({})", record.provided_by().join(" # "));
            name_len += plain.chars().count() as i64;
            name.push_str(&painter.paint(&plain, colors::GREEN));
        }
        if !record.member_of_groups().is_empty() {
            let (segment, visible) = groups_segment(record.member_of_groups(), painter);
            name.push_str(&segment);
            name_len += visible;
        }
        if !record.replaces().is_empty() {
            let plain = format!(" (replaces {})", record.replaces().join(", "));
            name_len += plain.chars().count() as i64;
            name.push_str(&painter.paint(&plain, REPLACEMENTS_COLOR));
            if !painter.enabled() {
                name = format!("# {name}");
            }
        }

        let size = match record.origin() {
            Origin::Repo {
                download_size: Some(bytes),
                ..
            } if options.show_download_size => format_mib(*bytes),
            _ => String::new(),
        };

        let days_old = match record.devel_staleness_days() {
            Some(days) if days > 0 && record.is_devel_refresh() => format!(" ({days} days old)"),
            _ => String::new(),
        };

        let mut out_of_date = String::new();
        if let Origin::Aur {
            maintainer,
            out_of_date: flagged,
            ..
        } = record.origin()
        {
            if maintainer.is_none() {
                let plain = " [orphaned]";
                name_len += plain.len() as i64;
                name.push_str(&painter.paint(plain, ORPHANED_COLOR));
            }
            if let Some(flagged) = flagged {
                out_of_date = painter.paint(
                    &format!(" [outofdate: {}]", flagged.format(DATE_FORMAT)),
                    self.scheme.version_diff_old,
                );
            }
        }

        let overflow = (name_len - column).max(-1);
        let version_pad = |version: &str| {
            padding(column - VERSION_COLUMN_OFFSET - version.chars().count() as i64 - overflow)
        };

        let verbose = match record.description() {
            Some(desc) if options.verbose => format!("\n{}", format_paragraph(desc, term_width)),
            _ => String::new(),
        };

        RenderedFields {
            current_version: self.version_text(current, &common, self.scheme.version_diff_old, painter),
            new_version: self.version_text(new, &common, self.scheme.version_diff_new, painter),
            version_separator: if current.is_empty() && new.is_empty() {
                ""
            } else {
                " -> "
            },
            spacing: padding(column - name_len),
            spacing2: version_pad(current),
            spacing3: (!size.is_empty()).then(|| version_pad(new)),
            name,
            size,
            days_old,
            out_of_date,
            verbose,
        }
    }

    fn version_text(&self, full: &str, common: &str, diff_color: u8, painter: Painter) -> String {
        format!(
            "{}{}",
            painter.paint(common, self.scheme.version),
            painter.paint(self.metric.remainder(full, common), diff_color)
        )
    }

    /// Render ranked search results; each entry may span two lines.
    pub fn render_search(
        &self,
        ranked: &[RankedCandidate],
        installed: &HashMap<String, String>,
        options: SearchRowOptions,
    ) -> Vec<String> {
        let term_width = self.width.resolve();
        let painter = Painter::new(options.color);
        ranked
            .iter()
            .map(|entry| self.search_row(entry, installed, options, painter, term_width))
            .collect()
    }

    fn search_row(
        &self,
        entry: &RankedCandidate,
        installed: &HashMap<String, String>,
        options: SearchRowOptions,
        painter: Painter,
        term_width: usize,
    ) -> String {
        let package = &entry.candidate;
        let idx = if options.enumerate {
            painter.bold(&format!("{}) ", entry.index))
        } else {
            String::new()
        };
        if options.quiet {
            return format!("{idx}{}", package.name());
        }

        let mut version_color = self.scheme.version;
        let mut version = package.version().to_string();
        let (repo, groups, rating, last_update) = match package {
            SearchCandidate::Repo(pkg) => {
                let groups = if pkg.groups.is_empty() {
                    String::new()
                } else {
                    painter.paint(&format!("({}) ", pkg.groups.join(" ")), GROUP_COLOR)
                };
                (
                    self.colors.repo_prefix(&pkg.repository, painter),
                    groups,
                    String::new(),
                    pkg.build_date,
                )
            }
            SearchCandidate::Aur(pkg) => {
                if let Some(flagged) = pkg.out_of_date {
                    version_color = self.scheme.version_diff_old;
                    version = format!("{version} [outofdate: {}]", flagged.format(DATE_FORMAT));
                }
                let rating = match (pkg.votes, pkg.popularity) {
                    (Some(votes), Some(popularity)) => {
                        painter.paint(&format!("({votes}, {popularity:.2})"), colors::YELLOW)
                    }
                    _ => String::new(),
                };
                (
                    painter.paint(AUR_PREFIX, colors::RED + colors::HIGHLIGHT),
                    String::new(),
                    rating,
                    pkg.last_modified,
                )
            }
        };

        let installed_marker = match installed.get(package.name()) {
            Some(local) if local != package.version() => painter.paint(
                &format!("[installed: {local}] "),
                colors::CYAN + colors::HIGHLIGHT,
            ),
            Some(_) => painter.paint("[installed] ", colors::CYAN + colors::HIGHLIGHT),
            None => String::new(),
        };

        let last_updated = if options.display_last_updated {
            painter.paint(
                &format!(" (last updated: {})", format_date(last_update)),
                colors::BLACK + colors::HIGHLIGHT,
            )
        } else {
            String::new()
        };

        format!(
            "{idx}{repo}{} {} {groups}{installed_marker}{rating}{last_updated}\n{}",
            painter.bold(package.name()),
            painter.paint(&version, version_color),
            format_paragraph(package.description().unwrap_or_default(), term_width),
        )
    }
}

/// Switches for search rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchRowOptions {
    /// Prefix rows with their 1-based index.
    pub enumerate: bool,
    /// Names only.
    pub quiet: bool,
    pub display_last_updated: bool,
    pub color: bool,
}

fn required_by_segment(names: &[String], painter: Painter) -> (String, i64) {
    let dep_color = colors::YELLOW;
    let plain = format!(" (for {})", names.join(", "));
    let painted_names: Vec<String> = names
        .iter()
        .map(|name| painter.paint(name, dep_color + colors::HIGHLIGHT))
        .collect();
    let painted = format!(
        "{}{}{}",
        painter.paint(" (for ", dep_color),
        painted_names.join(&painter.paint(", ", dep_color)),
        painter.paint(")", dep_color)
    );
    (painted, plain.chars().count() as i64)
}

fn groups_segment(groups: &[String], painter: Painter) -> (String, i64) {
    let suffix = pluralize("group", "groups", groups.len());
    let plain = format!(" ({} {suffix})", groups.join(", "));
    let painted_groups: Vec<String> = groups
        .iter()
        .map(|group| painter.paint(group, GROUP_COLOR + colors::HIGHLIGHT))
        .collect();
    let painted = format!(
        "{}{}{}",
        painter.paint(" (", GROUP_COLOR),
        painted_groups.join(&painter.paint(", ", GROUP_COLOR)),
        painter.paint(&format!(" {suffix})"), GROUP_COLOR)
    );
    (painted, plain.chars().count() as i64)
}

/// Bytes as `X.XX MiB`.
pub fn format_mib(bytes: u64) -> String {
    format!("{:.2} MiB", bytes as f64 / 1024.0 / 1024.0)
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::strip_ansi;
    use crate::package_info::{AurPackage, RepoPackage};
    use crate::version::AlpmVersion;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn formatter<'a>(colors: &'a ColorAllocator) -> ListingFormatter<'a, AlpmVersion> {
        ListingFormatter::new(&AlpmVersion, colors, ColorScheme::default())
            .with_width(TerminalWidth::Fixed(100))
    }

    fn plain() -> ListingOptions {
        ListingOptions {
            color: false,
            ..ListingOptions::default()
        }
    }

    fn repo_record(name: &str, current: &str, new: &str) -> UpdateRecord {
        UpdateRecord::new(name, current, new, Origin::repo("core")).unwrap()
    }

    #[test]
    fn column_width_is_capped() {
        assert_eq!(column_width(80), 32);
        assert_eq!(column_width(200), 37);
        assert_eq!(column_width(10), 4);
    }

    #[test]
    fn repo_update_renders_with_origin_prefix() {
        let colors = ColorAllocator::new();
        let options = ListingOptions {
            print_repo: true,
            ..plain()
        };
        let lines = formatter(&colors).render([&repo_record("foo", "1.0", "1.1")], options);
        let expected = format!(" core/foo{} 1.0{} -> 1.1", " ".repeat(37 - 8), " ".repeat(37 - 18 - 3 + 1));
        assert_eq!(lines, vec![expected]);
    }

    #[test]
    fn versions_start_at_fixed_column() {
        let colors = ColorAllocator::new();
        let records = [
            repo_record("a", "1.0", "1.1"),
            repo_record("much-longer-package-name", "2.3.4", "2.4.0"),
        ];
        let lines = formatter(&colors).render(&records, plain());
        for line in &lines {
            // one leading space, the padded name block, one separating space
            assert_eq!(line.chars().nth(1 + 37).unwrap(), ' ');
            assert_ne!(line.chars().nth(1 + 37 + 1).unwrap(), ' ');
        }
    }

    #[test]
    fn overlong_names_keep_one_space_of_padding() {
        let colors = ColorAllocator::new();
        let long = "x".repeat(60);
        let lines = formatter(&colors).render([&repo_record(&long, "1", "2")], plain());
        assert!(lines[0].starts_with(&format!(" {long}  1  -> 2")));
    }

    #[test]
    fn color_does_not_change_visible_layout() {
        let colors = ColorAllocator::new();
        let record = repo_record("foo", "1.2.3", "1.2.4")
            .with_groups(vec!["base".into()])
            .with_required_by(vec!["bar".into(), "baz".into()]);
        let fmt = formatter(&colors);
        let colored = fmt.render([&record], ListingOptions::default());
        let uncolored = fmt.render([&record], plain());
        assert_eq!(strip_ansi(&colored[0]), uncolored[0]);
        assert!(uncolored[0].starts_with(" foo (for bar, baz) (base group) "));
    }

    #[test]
    fn replacements_are_commented_without_color() {
        let colors = ColorAllocator::new();
        let record = repo_record("pipewire-pulse", "", "1.0").with_replaces(vec!["pulseaudio".into()]);
        let lines = formatter(&colors).render([&record], plain());
        assert!(lines[0].starts_with(" # pipewire-pulse (replaces pulseaudio)"));
        assert!(lines[0].ends_with(" -> 1.0"));
    }

    #[test]
    fn aur_markers_and_devel_age_are_appended() {
        let colors = ColorAllocator::new();
        let flagged = Utc.with_ymd_and_hms(2025, 3, 4, 0, 0, 0).unwrap();
        let record = UpdateRecord::new(
            "foo-git",
            "r1.abc-1",
            "devel",
            Origin::Aur {
                maintainer: None,
                out_of_date: Some(flagged),
                devel_staleness_days: Some(12),
            },
        )
        .unwrap();
        let line = &formatter(&colors).render([&record], plain())[0];
        assert!(line.starts_with(" foo-git [orphaned]"));
        assert!(line.ends_with(" -> devel (12 days old) [outofdate: 2025/03/04]"));
    }

    #[test]
    fn fresh_devel_refresh_has_no_age() {
        let colors = ColorAllocator::new();
        let record = UpdateRecord::new(
            "bar-git",
            "r3.def-1",
            "devel",
            Origin::Aur {
                maintainer: Some("m".into()),
                out_of_date: None,
                devel_staleness_days: Some(0),
            },
        )
        .unwrap();
        let line = &formatter(&colors).render([&record], plain())[0];
        assert!(line.ends_with(" -> devel"));
        assert!(!line.contains("days old"));
    }

    #[test]
    fn download_size_only_for_repo_records() {
        let colors = ColorAllocator::new();
        let options = ListingOptions {
            show_download_size: true,
            ..plain()
        };
        let repo = UpdateRecord::new(
            "foo",
            "1.0",
            "1.1",
            Origin::Repo {
                repository: "core".into(),
                download_size: Some(3 * 1024 * 1024),
                installed_size: None,
            },
        )
        .unwrap();
        let aur = UpdateRecord::new("bar", "1.0", "1.1", Origin::aur(Some("m"))).unwrap();
        let lines = formatter(&colors).render([&repo, &aur], options);
        assert!(lines[0].ends_with(&format!("-> 1.1{}3.00 MiB", " ".repeat(17))));
        assert!(lines[1].ends_with("-> 1.1"));
    }

    #[test]
    fn verbose_appends_description_paragraph() {
        let colors = ColorAllocator::new();
        let record = repo_record("foo", "1.0", "1.1").with_description(Some("A foo tool".into()));
        let options = ListingOptions {
            verbose: true,
            ..plain()
        };
        let line = &formatter(&colors).render([&record], options)[0];
        assert!(line.starts_with(" core/foo"));
        assert!(line.ends_with("\n    A foo tool"));
    }

    #[test]
    fn compact_templates() {
        let colors = ColorAllocator::new();
        let record = repo_record("foo", "1.0", "1.1");
        let render = |template| {
            let options = ListingOptions {
                template,
                ..plain()
            };
            formatter(&colors).render([&record], options).remove(0)
        };
        assert_eq!(render(LineTemplate::NameAndVersions), "foo (1.0 => 1.1)");
        assert_eq!(render(LineTemplate::NameAndCurrent), "foo 1.0");
        assert_eq!(render(LineTemplate::NameAndNew), "foo 1.1");
    }

    #[test]
    fn search_rows_show_origin_and_install_state() {
        let colors = ColorAllocator::new();
        let ranked = vec![
            RankedCandidate {
                index: 1,
                candidate: SearchCandidate::Repo(RepoPackage {
                    name: "foo".into(),
                    version: "1.1".into(),
                    repository: "extra".into(),
                    description: Some("Foo tool".into()),
                    groups: vec!["tools".into()],
                    ..RepoPackage::default()
                }),
            },
            RankedCandidate {
                index: 2,
                candidate: SearchCandidate::Aur(AurPackage {
                    name: "foo-git".into(),
                    version: "r5".into(),
                    votes: Some(7),
                    popularity: Some(0.5),
                    ..AurPackage::default()
                }),
            },
        ];
        let installed: HashMap<String, String> = [("foo".to_string(), "1.0".to_string())].into();
        let options = SearchRowOptions {
            enumerate: true,
            ..SearchRowOptions::default()
        };
        let rows = formatter(&colors).render_search(&ranked, &installed, options);
        assert_eq!(rows[0], "1) extra/foo 1.1 (tools) [installed: 1.0] \n    Foo tool");
        assert_eq!(rows[1], "2) aur/foo-git r5 (7, 0.50)\n    ");

        let quiet = SearchRowOptions {
            quiet: true,
            ..SearchRowOptions::default()
        };
        let rows = formatter(&colors).render_search(&ranked, &installed, quiet);
        assert_eq!(rows, vec!["foo".to_string(), "foo-git".to_string()]);
    }
}
