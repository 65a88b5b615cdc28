/*============================================================
  Synavera Project: Syn-Syu
  Module: sysup_core::color
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    ANSI colouring helpers and the per-run repository colour
    allocator used by listings and reports.

  Security / Safety Notes:
    Emits terminal styling sequences only.

  Dependencies:
    console for styling and escape stripping.

  Operational Scope:
    Shared by the listing formatter, search rows and the
    sysupgrade report.

  Revision History:
    2025-11-12 COD  Authored colour allocation and painting.
    2025-11-19 COD  Styling delegated to console.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Allocation is explicit state, never a global
    - Visible text is identical with colour on or off
============================================================*/

use std::cell::RefCell;
use std::collections::HashMap;

use console::{strip_ansi_codes, Style};

/// Base terminal colours; add [`HIGHLIGHT`] for the bright variant.
pub mod colors {
    pub const BLACK: u8 = 0;
    pub const RED: u8 = 1;
    pub const GREEN: u8 = 2;
    pub const YELLOW: u8 = 3;
    pub const BLUE: u8 = 4;
    pub const PURPLE: u8 = 5;
    pub const CYAN: u8 = 6;
    pub const WHITE: u8 = 7;
    pub const HIGHLIGHT: u8 = 8;
}

pub const GROUP_COLOR: u8 = colors::BLUE;
pub const REPLACEMENTS_COLOR: u8 = colors::CYAN + colors::HIGHLIGHT;
pub const ORPHANED_COLOR: u8 = colors::RED + colors::HIGHLIGHT;

/// Style `text` with terminal colour `color`; `HIGHLIGHT` and above are bold.
pub fn paint(text: &str, color: u8) -> String {
    let style = if color >= colors::HIGHLIGHT {
        Style::new().color256(color - colors::HIGHLIGHT).bold()
    } else {
        Style::new().color256(color)
    };
    style.force_styling(true).apply_to(text).to_string()
}

pub fn bold(text: &str) -> String {
    Style::new()
        .bold()
        .force_styling(true)
        .apply_to(text)
        .to_string()
}

/// Applies colour only when enabled.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn paint(&self, text: &str, color: u8) -> String {
        if self.enabled {
            paint(text, color)
        } else {
            text.to_string()
        }
    }

    pub fn bold(&self, text: &str) -> String {
        if self.enabled {
            bold(text)
        } else {
            text.to_string()
        }
    }
}

/// Category used for repository name colours.
pub const REPO_CATEGORY: &str = "repo";

const FIRST_COLOR: u8 = 10;
const MAX_COLOR: u8 = 15;

/// Hands out stable colours per `(category, id)` in first-seen order.
///
/// Colours cycle through `10..=15` per category. Single-threaded: the
/// allocator is created for one report and shared by reference.
#[derive(Debug, Default)]
pub struct ColorAllocator {
    state: RefCell<AllocatorState>,
}

#[derive(Debug, Default)]
struct AllocatorState {
    cursors: HashMap<String, u8>,
    assigned: HashMap<(String, String), u8>,
}

impl ColorAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator with official repositories first, then sync databases.
    pub fn with_repositories<'r>(
        official: impl IntoIterator<Item = &'r str>,
        sync_order: impl IntoIterator<Item = &'r str>,
    ) -> Self {
        let allocator = Self::new();
        for repo in official.into_iter().chain(sync_order) {
            allocator.color_for(REPO_CATEGORY, repo);
        }
        allocator
    }

    /// Colour for `id` within `category`, allocating on first request.
    pub fn color_for(&self, category: &str, id: &str) -> u8 {
        let mut state = self.state.borrow_mut();
        let key = (category.to_string(), id.to_string());
        if let Some(color) = state.assigned.get(&key) {
            return *color;
        }
        let next = match state.cursors.get(category) {
            Some(cursor) if *cursor < MAX_COLOR => cursor + 1,
            _ => FIRST_COLOR,
        };
        state.cursors.insert(category.to_string(), next);
        state.assigned.insert(key, next);
        next
    }

    /// `repo/` prefix in the repository's colour.
    pub fn repo_prefix(&self, repository: &str, painter: Painter) -> String {
        let text = format!("{repository}/");
        if painter.enabled() {
            paint(&text, self.color_for(REPO_CATEGORY, repository))
        } else {
            text
        }
    }
}

/// Remove escape sequences, leaving the visible text.
pub fn strip_ansi(text: &str) -> String {
    strip_ansi_codes(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_repository_always_gets_same_color() {
        let allocator = ColorAllocator::new();
        let first = allocator.color_for(REPO_CATEGORY, "core");
        allocator.color_for(REPO_CATEGORY, "extra");
        assert_eq!(allocator.color_for(REPO_CATEGORY, "core"), first);
    }

    #[test]
    fn colors_cycle_after_palette_end() {
        let allocator = ColorAllocator::new();
        let assigned: Vec<u8> = (0..8)
            .map(|idx| allocator.color_for(REPO_CATEGORY, &format!("repo{idx}")))
            .collect();
        assert_eq!(assigned, vec![10, 11, 12, 13, 14, 15, 10, 11]);
    }

    #[test]
    fn categories_have_independent_cursors() {
        let allocator = ColorAllocator::new();
        allocator.color_for(REPO_CATEGORY, "core");
        assert_eq!(allocator.color_for("maintainer", "alice"), 10);
    }

    #[test]
    fn prepopulated_order_is_official_then_sync() {
        let allocator = ColorAllocator::with_repositories(["core", "extra"], ["custom", "core"]);
        assert_eq!(allocator.color_for(REPO_CATEGORY, "core"), 10);
        assert_eq!(allocator.color_for(REPO_CATEGORY, "extra"), 11);
        assert_eq!(allocator.color_for(REPO_CATEGORY, "custom"), 12);
    }

    #[test]
    fn painting_never_changes_visible_text() {
        let painted = paint("core/", 12);
        assert!(painted.contains('\x1b'));
        assert_eq!(strip_ansi(&painted), "core/");
        assert_eq!(strip_ansi(&bold("foo")), "foo");
        assert_eq!(Painter::new(false).paint("x", 1), "x");
    }
}
