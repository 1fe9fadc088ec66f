//! Dotted version string helpers
//!
//! Store version strings are not strict semver ("1.2", "2024.1.10"), so
//! comparison is component-wise numeric with missing or non-numeric
//! components treated as 0.

use std::cmp::Ordering;

fn components(version: &str) -> Vec<u64> {
    version
        .trim()
        .split('.')
        .map(|part| part.trim().parse::<u64>().unwrap_or(0))
        .collect()
}

/// Compares two dotted version strings numerically.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a = components(a);
    let b = components(b);
    let len = a.len().max(b.len());

    (0..len)
        .map(|i| {
            let left = a.get(i).copied().unwrap_or(0);
            let right = b.get(i).copied().unwrap_or(0);
            left.cmp(&right)
        })
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Sorts items by their version string, newest first.
pub fn sort_versions<T, F>(items: &mut [T], version_of: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|a, b| compare_versions(version_of(b), version_of(a)));
}

/// Bumps the last component of a version string.
///
/// Versions shorter than three components are padded with zeros first, so
/// `"1.2"` becomes `"1.2.1"`. An empty string becomes `"1.0.0"`.
pub fn increment_version(version: &str) -> String {
    let version = version.trim();
    if version.is_empty() {
        return "1.0.0".to_string();
    }

    let mut parts = components(version);
    if parts.len() < 3 {
        parts.resize(3, 0);
    }
    if let Some(last) = parts.last_mut() {
        *last += 1;
    }
    join(&parts)
}

fn join(parts: &[u64]) -> String {
    parts
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".")
}
