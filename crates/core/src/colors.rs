//! Color tag utilities shared by the owner view and the shared view.
//!
//! Provides the color-presence check, the numeric-aware image ordering,
//! color filtering, and [`CategoryView`], which bundles them so both views
//! derive their image lists from one implementation.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::collection::{Category, DinoImage};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Highest conventional numeric color id.
pub const MAX_COLOR_ID: i64 = 254;

/// Lowest conventional numeric color id.
pub const MIN_COLOR_ID: i64 = 0;

// ---------------------------------------------------------------------------
// Color-presence check
// ---------------------------------------------------------------------------

/// Split a comma-separated color query into tokens.
///
/// Tokens are trimmed, empty tokens are dropped and duplicates keep only
/// their first occurrence. Blank input yields an empty list.
pub fn parse_color_query(input: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter(|token| seen.insert(*token))
        .map(str::to_string)
        .collect()
}

/// Requested colors absent from `images`, in query order.
///
/// Matching is exact and case-sensitive: `"red"` does not satisfy `"Red"`.
pub fn missing_colors(images: &[DinoImage], query: &str) -> Vec<String> {
    let existing: HashSet<&str> = images.iter().map(|img| img.color.as_str()).collect();
    parse_color_query(query)
        .into_iter()
        .filter(|color| !existing.contains(color.as_str()))
        .collect()
}

/// Number of distinct color tags among `images`.
pub fn unique_color_count(images: &[DinoImage]) -> usize {
    images
        .iter()
        .map(|img| img.color.as_str())
        .collect::<HashSet<_>>()
        .len()
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Read the leading integer of a color tag, ignoring leading whitespace.
///
/// An optional sign followed by at least one digit counts; anything after
/// the digit run is ignored, so `"10a"` reads as 10. Tags that do not start
/// with a digit (after the sign) are not numeric.
pub fn numeric_color(color: &str) -> Option<i64> {
    let s = color.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let value = rest[..digits].parse::<i64>().ok()?;
    Some(if negative { -value } else { value })
}

/// Numeric-aware color comparison.
///
/// Two numeric tags compare by value and two non-numeric tags compare
/// lexicographically. A numeric tag always sorts before a non-numeric one.
pub fn compare_colors(a: &str, b: &str) -> Ordering {
    match (numeric_color(a), numeric_color(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Stable sort of images by [`compare_colors`].
pub fn sort_images_by_color(images: &mut [DinoImage]) {
    images.sort_by(|a, b| compare_colors(&a.color, &b.color));
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// How a color filter string is matched against image tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Case-insensitive equality (owner view).
    Exact,
    /// Case-insensitive substring (shared view).
    Contains,
}

/// Images whose color matches `filter`. An empty filter keeps everything.
pub fn filter_images<'a>(
    images: &'a [DinoImage],
    filter: &str,
    mode: FilterMode,
) -> Vec<&'a DinoImage> {
    let needle = filter.trim().to_lowercase();
    images
        .iter()
        .filter(|img| {
            if needle.is_empty() {
                return true;
            }
            let color = img.color.to_lowercase();
            match mode {
                FilterMode::Exact => color == needle,
                FilterMode::Contains => color.contains(&needle),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CategoryView
// ---------------------------------------------------------------------------

/// Read-only derived view over one category's images.
#[derive(Debug, Clone, Copy)]
pub struct CategoryView<'a> {
    category: &'a Category,
    mode: FilterMode,
}

impl<'a> CategoryView<'a> {
    pub fn new(category: &'a Category, mode: FilterMode) -> Self {
        Self { category, mode }
    }

    pub fn category(&self) -> &'a Category {
        self.category
    }

    /// Filtered and numerically sorted images.
    pub fn images(&self, filter: &str) -> Vec<DinoImage> {
        let mut images: Vec<DinoImage> = filter_images(&self.category.images, filter, self.mode)
            .into_iter()
            .cloned()
            .collect();
        sort_images_by_color(&mut images);
        images
    }

    pub fn missing_colors(&self, query: &str) -> Vec<String> {
        missing_colors(&self.category.images, query)
    }

    pub fn unique_color_count(&self) -> usize {
        unique_color_count(&self.category.images)
    }

    /// Header text of the form `"{name} - Colors: {n}/254"`.
    pub fn summary(&self) -> String {
        format!(
            "{} - Colors: {}/{MAX_COLOR_ID}",
            self.category.name,
            self.unique_color_count()
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
