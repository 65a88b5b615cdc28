/*============================================================
  Synavera Project: Syn-Syu
  Module: sysup_core::version
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Compare pacman version strings and measure how far two
    versions diverge for sorting and diff highlighting.

  Security / Safety Notes:
    Pure string processing; no process spawning.

  Dependencies:
    None beyond std.

  Operational Scope:
    Supplies the classifier with ordering and the listing
    formatter with common prefixes and divergent remainders.

  Revision History:
    2025-11-12 COD  Replaced vercmp subprocess calls with a
                    native comparator behind VersionMetric.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic results for identical inputs
    - Trait seam so callers can substitute comparators
============================================================*/

use std::cmp::Ordering;

/// Separators that split a version into segments for diffing.
const VERSION_SEPARATORS: [char; 4] = ['.', '+', '-', ':'];

/// Version comparison and divergence measurement.
pub trait VersionMetric {
    /// Order `a` relative to `b` (`Less` means `b` is newer).
    fn compare(&self, a: &str, b: &str) -> Ordering;

    /// Shared leading segments of both versions and a divergence weight.
    fn common_version(&self, a: &str, b: &str) -> (String, u32);

    /// The part of `full` after the common prefix.
    fn remainder<'v>(&self, full: &'v str, common: &str) -> &'v str {
        if common.is_empty() {
            return full;
        }
        match full.find(common) {
            Some(idx) => &full[idx + common.len()..],
            None => "",
        }
    }
}

/// libalpm-compatible comparator (`epoch:version-release`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AlpmVersion;

impl VersionMetric for AlpmVersion {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        vercmp(a, b)
    }

    fn common_version(&self, a: &str, b: &str) -> (String, u32) {
        common_version(a, b)
    }
}

/// Compare two full package versions the way `vercmp` does.
pub fn vercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let (epoch_a, ver_a, rel_a) = parse_evr(a);
    let (epoch_b, ver_b, rel_b) = parse_evr(b);

    rpmvercmp(epoch_a, epoch_b)
        .then_with(|| rpmvercmp(ver_a, ver_b))
        .then_with(|| match (rel_a, rel_b) {
            (Some(rel_a), Some(rel_b)) => rpmvercmp(rel_a, rel_b),
            _ => Ordering::Equal,
        })
}

fn parse_evr(evr: &str) -> (&str, &str, Option<&str>) {
    let digits = evr.bytes().take_while(u8::is_ascii_digit).count();
    let (epoch, rest) = if evr[digits..].starts_with(':') {
        let epoch = &evr[..digits];
        (if epoch.is_empty() { "0" } else { epoch }, &evr[digits + 1..])
    } else {
        ("0", evr)
    };
    match rest.rfind('-') {
        Some(idx) => (epoch, &rest[..idx], Some(&rest[idx + 1..])),
        None => (epoch, rest, None),
    }
}

fn rpmvercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let a = a.as_bytes();
    let b = b.as_bytes();
    let (mut one, mut two) = (0usize, 0usize);

    while one < a.len() && two < b.len() {
        let sep_start_one = one;
        let sep_start_two = two;
        while one < a.len() && !a[one].is_ascii_alphanumeric() {
            one += 1;
        }
        while two < b.len() && !b[two].is_ascii_alphanumeric() {
            two += 1;
        }
        if one >= a.len() || two >= b.len() {
            break;
        }
        let sep_one = one - sep_start_one;
        let sep_two = two - sep_start_two;
        if sep_one != sep_two {
            return sep_one.cmp(&sep_two);
        }

        let numeric = a[one].is_ascii_digit();
        let seg_end = |bytes: &[u8], start: usize| {
            let mut end = start;
            while end < bytes.len()
                && (if numeric {
                    bytes[end].is_ascii_digit()
                } else {
                    bytes[end].is_ascii_alphabetic()
                })
            {
                end += 1;
            }
            end
        };
        let end_one = seg_end(a, one);
        let end_two = seg_end(b, two);

        // Segments of different types: numeric wins over alpha.
        if end_two == two {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let mut seg_a = &a[one..end_one];
        let mut seg_b = &b[two..end_two];
        if numeric {
            while seg_a.first() == Some(&b'0') {
                seg_a = &seg_a[1..];
            }
            while seg_b.first() == Some(&b'0') {
                seg_b = &seg_b[1..];
            }
            match seg_a.len().cmp(&seg_b.len()) {
                Ordering::Equal => {}
                other => return other,
            }
        }
        match seg_a.cmp(seg_b) {
            Ordering::Equal => {}
            other => return other,
        }
        one = end_one;
        two = end_two;
    }

    let rest_one = &a[one.min(a.len())..];
    let rest_two = &b[two.min(b.len())..];
    if rest_one.is_empty() && rest_two.is_empty() {
        return Ordering::Equal;
    }
    // A trailing alpha segment marks a pre-release and sorts older.
    if (rest_one.is_empty() && !rest_two[0].is_ascii_alphabetic())
        || (!rest_one.is_empty() && rest_one[0].is_ascii_alphabetic())
    {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

/// Split a version into value blocks and the separators between them.
fn split_version(version: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut start = 0;
    for (idx, ch) in version.char_indices() {
        if VERSION_SEPARATORS.contains(&ch) {
            blocks.push(&version[start..idx]);
            blocks.push(&version[idx..idx + ch.len_utf8()]);
            start = idx + ch.len_utf8();
        }
    }
    if start < version.len() {
        blocks.push(&version[start..]);
    }
    blocks
}

fn is_separator(block: &str) -> bool {
    let mut chars = block.chars();
    matches!((chars.next(), chars.next()), (Some(ch), None) if VERSION_SEPARATORS.contains(&ch))
}

/// Longest shared block prefix and the number of diverging segments.
///
/// Every value block from the first difference onward (over the longer of
/// the two versions) adds one to the weight, so a major bump outweighs a
/// patch bump. An empty side yields `("", 0)`.
pub fn common_version(a: &str, b: &str) -> (String, u32) {
    let mut common = String::new();
    let mut weight = 0u32;
    if a.is_empty() || b.is_empty() {
        return (common, weight);
    }

    let blocks_a = split_version(a);
    let blocks_b = split_version(b);
    let mut diverged = false;
    for idx in 0..blocks_a.len().max(blocks_b.len()) {
        let block_a = blocks_a.get(idx).copied();
        let block_b = blocks_b.get(idx).copied();
        if !diverged && block_a == block_b {
            common.push_str(block_a.unwrap_or_default());
            continue;
        }
        diverged = true;
        let block = block_a.or(block_b).unwrap_or_default();
        if !is_separator(block) {
            weight += 1;
        }
    }
    (common, weight)
}
