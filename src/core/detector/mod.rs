//! # Detector Module
//!
//! Groups analyzed media entries into ranked duplicate sets.
//!
//! ## How It Works
//! 1. Entries sharing a content fingerprint group immediately and are
//!    settled (`ExactHash`).
//! 2. Remaining entries group by title key (`TitleMatch`), with a
//!    `SimilarSize` tag for members whose size sits close to the group mean.
//! 3. Each group is ranked best-first; the first member is the copy to keep.
//!
//! ## Match Types
//! | Tag | Meaning |
//! |-----|---------|
//! | `ExactHash`   | Same content fingerprint; byte-level duplicate |
//! | `TitleMatch`  | Same normalized title and year |
//! | `SimilarSize` | Size within 10% of the group mean; likely the same release |

mod grouper;

pub use grouper::{detect_duplicates, detect_duplicates_with_events};

use crate::core::hasher::ContentHash;
use crate::core::naming::EpisodeInfo;
use crate::core::quality::QualityScore;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;
use uuid::Uuid;

/// Why two entries were put in the same group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    /// Content fingerprints are identical
    ExactHash,
    /// Title keys are identical
    TitleMatch,
    /// File size is within 10% of the group's mean size
    SimilarSize,
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchType::ExactHash => write!(f, "Exact Hash"),
            MatchType::TitleMatch => write!(f, "Title Match"),
            MatchType::SimilarSize => write!(f, "Similar Size"),
        }
    }
}

/// One fully analyzed library item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaEntry {
    /// The folder (movies) or file (episodes) that names this item
    pub path: PathBuf,
    /// Folder or file name exactly as found on disk
    pub raw_name: String,
    /// Lower-cased, article-stripped comparison title; may be empty
    pub normalized_title: String,
    /// Release year when one was found in the name
    pub year: Option<String>,
    /// The representative video file
    pub primary_video_file: PathBuf,
    /// Size of the representative file in bytes
    pub file_size_bytes: u64,
    /// Content fingerprint; absent when hashing is off or failed
    pub content_hash: Option<ContentHash>,
    /// Quality assessment of the representative file
    pub quality: QualityScore,
    /// Episode breakdown, present in episode mode when parseable
    pub episode: Option<EpisodeInfo>,
    /// Tags accumulated during grouping; empty until grouped
    pub match_types: Vec<MatchType>,
}

impl MediaEntry {
    /// The key naming-duplicate candidates share: `"<title>|<year>"` when a
    /// year is known, else the bare title. Entries with empty titles group
    /// only with each other.
    pub fn title_key(&self) -> String {
        match &self.year {
            Some(year) => format!("{}|{}", self.normalized_title, year),
            None => self.normalized_title.clone(),
        }
    }
}

/// A set of entries that are probably the same title
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Unique identifier for this group
    pub id: Uuid,
    /// Members ranked best-first; the first is the recommended keep
    pub members: Vec<MediaEntry>,
    /// Union of the members' match types
    pub match_types: Vec<MatchType>,
    /// Bytes freed by deleting everything except the recommended keep
    pub reclaimable_bytes: u64,
}

impl DuplicateGroup {
    /// Build a group from its members, ranking them best-first.
    ///
    /// Rank order: quality score descending, then file size descending,
    /// then raw name ascending. The name tie-break is arbitrary but keeps
    /// repeated runs stable.
    pub fn ranked(mut members: Vec<MediaEntry>) -> Self {
        members.sort_by(rank_order);

        let mut match_types = Vec::new();
        for tag in [
            MatchType::ExactHash,
            MatchType::TitleMatch,
            MatchType::SimilarSize,
        ] {
            if members.iter().any(|m| m.match_types.contains(&tag)) {
                match_types.push(tag);
            }
        }

        let reclaimable_bytes = members.iter().skip(1).map(|m| m.file_size_bytes).sum();

        Self {
            id: Uuid::new_v4(),
            members,
            match_types,
            reclaimable_bytes,
        }
    }

    /// The member recommended for keeping, if the group is non-empty.
    pub fn recommended(&self) -> Option<&MediaEntry> {
        self.members.first()
    }

    /// How many members are deletion candidates.
    pub fn duplicate_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }
}

fn rank_order(a: &MediaEntry, b: &MediaEntry) -> Ordering {
    b.quality
        .score
        .cmp(&a.quality.score)
        .then_with(|| b.file_size_bytes.cmp(&a.file_size_bytes))
        .then_with(|| a.raw_name.cmp(&b.raw_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::quality::{score, AttributeSource};

    fn entry(name: &str, size: u64) -> MediaEntry {
        let normalized = crate::core::naming::normalize(name);
        MediaEntry {
            path: PathBuf::from(format!("/library/{name}")),
            raw_name: name.to_string(),
            normalized_title: normalized.title,
            year: normalized.year,
            primary_video_file: PathBuf::from(format!("/library/{name}/movie.mkv")),
            file_size_bytes: size,
            content_hash: None,
            quality: score(name, AttributeSource::FilenameDerived),
            episode: None,
            match_types: Vec::new(),
        }
    }

    #[test]
    fn title_key_includes_year_when_present() {
        let with_year = entry("The.Matrix.1999.1080p.BluRay", 1000);
        assert_eq!(with_year.title_key(), "matrix|1999");

        let without_year = entry("Some Movie", 1000);
        assert_eq!(without_year.title_key(), "some movie");
    }

    #[test]
    fn ranked_puts_highest_score_first() {
        let low = entry("Heat.1995.DVDRip.XviD", 1000);
        let high = entry("Heat.1995.2160p.BluRay.x265", 9000);

        let group = DuplicateGroup::ranked(vec![low, high]);

        assert!(group.members[0].raw_name.contains("2160p"));
        assert!(group.members[0].quality.score > group.members[1].quality.score);
    }

    #[test]
    fn score_tie_prefers_larger_file() {
        let small = entry("Heat.1995.1080p.BluRay.x264", 1_000);
        let large = entry("Heat.1995.1080p.BluRay.x264", 9_000);

        let group = DuplicateGroup::ranked(vec![small, large]);

        assert_eq!(group.members[0].file_size_bytes, 9_000);
    }

    #[test]
    fn full_tie_orders_by_raw_name() {
        let b = entry("Heat.B.1080p.BluRay.x264", 1_000);
        let a = entry("Heat.A.1080p.BluRay.x264", 1_000);

        let group = DuplicateGroup::ranked(vec![b, a]);

        assert!(group.members[0].raw_name.contains("Heat.A"));
    }

    #[test]
    fn reclaimable_bytes_exclude_the_recommended_keep() {
        let keep = entry("Heat.1995.2160p.BluRay.x265", 9_000);
        let delete_a = entry("Heat.1995.720p.WEBRip", 2_000);
        let delete_b = entry("Heat.1995.DVDRip.XviD", 1_000);

        let group = DuplicateGroup::ranked(vec![delete_a, keep, delete_b]);

        assert_eq!(group.reclaimable_bytes, 3_000);
        assert_eq!(group.duplicate_count(), 2);
    }

    #[test]
    fn group_match_types_are_the_member_union() {
        let mut a = entry("Heat.1995.1080p", 1_000);
        a.match_types = vec![MatchType::TitleMatch, MatchType::SimilarSize];
        let mut b = entry("Heat.1995.720p", 1_050);
        b.match_types = vec![MatchType::TitleMatch];

        let group = DuplicateGroup::ranked(vec![a, b]);

        assert_eq!(
            group.match_types,
            vec![MatchType::TitleMatch, MatchType::SimilarSize]
        );
    }

    #[test]
    fn match_type_display_is_human_readable() {
        assert_eq!(MatchType::ExactHash.to_string(), "Exact Hash");
        assert_eq!(MatchType::TitleMatch.to_string(), "Title Match");
        assert_eq!(MatchType::SimilarSize.to_string(), "Similar Size");
    }
}
