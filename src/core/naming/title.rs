//! Title normalization for release-style folder and file names.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::strip_video_extension;

// Release years 1900-2099. The leftmost run wins when several appear.
static RE_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(19|20)\d{2}").unwrap());

// Truncate at the year, swallowing a surrounding bracket or parenthesis.
static RE_YEAR_TRUNCATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\(\[]?(19|20)\d{2}[\)\]]?.*$").unwrap());

// Truncate at the first quality/source/codec tag even when no year is present.
static RE_TAG_TRUNCATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(720p|1080p|2160p|4K|HDRip|DVDRip|BRRip|BluRay|WEB-DL|WEBRip|x264|x265|HEVC).*$")
        .unwrap()
});

static RE_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[._-]").unwrap());
static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static RE_LEADING_ARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(the|a|an)\s+").unwrap());

/// A comparable identity derived from a raw name.
///
/// `title` may be empty when the name carries no usable text; an empty
/// title is still a valid grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTitle {
    /// Lower-cased, article-stripped, separator-collapsed title.
    pub title: String,
    /// Four-digit release year, when one appears in the name.
    pub year: Option<String>,
}

impl NormalizedTitle {
    /// Grouping key: `"<title>|<year>"` when the year is known, else the
    /// bare title. Entries with equal keys are naming-duplicate candidates.
    pub fn key(&self) -> String {
        match &self.year {
            Some(year) => format!("{}|{}", self.title, year),
            None => self.title.clone(),
        }
    }
}

/// Normalize a raw folder or file name into a comparable title and year.
///
/// The year is the leftmost `19xx`/`20xx` run. The title is everything
/// before the year (or before the first quality tag), with dot, underscore
/// and hyphen separators flattened to single spaces, lower-cased, and a
/// single leading article removed.
pub fn normalize(raw_name: &str) -> NormalizedTitle {
    let name = strip_video_extension(raw_name);

    let year = RE_YEAR.find(name).map(|m| m.as_str().to_string());

    let truncated = RE_YEAR_TRUNCATE.replace(name, "");
    let truncated = RE_TAG_TRUNCATE.replace(&truncated, "");
    let spaced = RE_SEPARATORS.replace_all(&truncated, " ");
    let collapsed = RE_WHITESPACE.replace_all(&spaced, " ");
    let lowered = collapsed.trim().to_lowercase();
    let title = RE_LEADING_ARTICLE.replace(&lowered, "").into_owned();

    NormalizedTitle { title, year }
}
