//! Two-pass duplicate grouping.
//!
//! Pass one groups entries by content fingerprint and settles them. Pass two
//! groups the remaining entries by title key. An entry therefore lands in at
//! most one group, and a fingerprint match always beats a naming match.

use super::{DuplicateGroup, MatchType, MediaEntry};
use crate::core::hasher::ContentHash;
use crate::events::{null_sender, DetectEvent, Event, EventSender};
use std::collections::HashMap;
use tracing::debug;

/// Relative deviation from the group mean below which sizes count as similar.
const SIMILAR_SIZE_TOLERANCE: f64 = 0.1;

/// Group entries into ranked duplicate sets.
///
/// Match-type tags are written back onto the entries as a side effect, so
/// callers keeping the full entry list see why each item was grouped.
pub fn detect_duplicates(entries: &mut [MediaEntry]) -> Vec<DuplicateGroup> {
    detect_duplicates_with_events(entries, &null_sender())
}

/// [`detect_duplicates`] with progress reporting via events.
///
/// Group order follows first appearance in the input (hash groups before
/// title groups), so a fixed entry order yields a fixed group order.
pub fn detect_duplicates_with_events(
    entries: &mut [MediaEntry],
    events: &EventSender,
) -> Vec<DuplicateGroup> {
    events.send(Event::Detect(DetectEvent::Started {
        total_entries: entries.len(),
    }));

    let mut settled = vec![false; entries.len()];
    let mut member_sets: Vec<Vec<usize>> = Vec::new();

    // Pass 1: equal fingerprints are duplicates no matter what the names say.
    let (by_hash, hash_order) = hash_index(entries);
    for hash in hash_order {
        let bucket = &by_hash[&hash];
        if bucket.len() < 2 {
            continue;
        }
        debug!(%hash, members = bucket.len(), "fingerprint collision group");
        for &idx in bucket {
            entries[idx].match_types.push(MatchType::ExactHash);
            settled[idx] = true;
        }
        member_sets.push(bucket.clone());
    }

    // Pass 2: title keys over every entry, grouping only unsettled members.
    let (by_title, title_order) = title_index(entries);
    for key in title_order {
        let unsettled: Vec<usize> = by_title[&key]
            .iter()
            .copied()
            .filter(|&idx| !settled[idx])
            .collect();
        if unsettled.len() < 2 {
            continue;
        }

        let mean = unsettled
            .iter()
            .map(|&idx| entries[idx].file_size_bytes)
            .sum::<u64>() as f64
            / unsettled.len() as f64;

        for &idx in &unsettled {
            entries[idx].match_types.push(MatchType::TitleMatch);
            // Zero-byte members never qualify; a zero mean stays untagged.
            if mean > 0.0 {
                let deviation = (entries[idx].file_size_bytes as f64 - mean).abs() / mean;
                if deviation < SIMILAR_SIZE_TOLERANCE {
                    entries[idx].match_types.push(MatchType::SimilarSize);
                }
            }
        }
        member_sets.push(unsettled);
    }

    let mut groups = Vec::with_capacity(member_sets.len());
    let mut total_duplicates = 0;
    for indices in member_sets {
        let members: Vec<MediaEntry> = indices.iter().map(|&idx| entries[idx].clone()).collect();
        let group = DuplicateGroup::ranked(members);
        total_duplicates += group.duplicate_count();
        events.send(Event::Detect(DetectEvent::GroupFound {
            group_id: group.id.to_string(),
            member_count: group.members.len(),
        }));
        groups.push(group);
    }

    events.send(Event::Detect(DetectEvent::Completed {
        total_groups: groups.len(),
        total_duplicates,
    }));

    groups
}

/// Index entry positions by fingerprint, recording first-seen key order.
fn hash_index(entries: &[MediaEntry]) -> (HashMap<ContentHash, Vec<usize>>, Vec<ContentHash>) {
    let mut index: HashMap<ContentHash, Vec<usize>> = HashMap::new();
    let mut order = Vec::new();

    for (idx, entry) in entries.iter().enumerate() {
        if let Some(hash) = entry.content_hash {
            let bucket = index.entry(hash).or_default();
            if bucket.is_empty() {
                order.push(hash);
            }
            bucket.push(idx);
        }
    }

    (index, order)
}

/// Index entry positions by title key, recording first-seen key order.
fn title_index(entries: &[MediaEntry]) -> (HashMap<String, Vec<usize>>, Vec<String>) {
    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    let mut order = Vec::new();

    for (idx, entry) in entries.iter().enumerate() {
        let key = entry.title_key();
        let bucket = index.entry(key.clone()).or_default();
        if bucket.is_empty() {
            order.push(key);
        }
        bucket.push(idx);
    }

    (index, order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::quality::{score, AttributeSource};
    use crate::events::EventChannel;
    use std::path::PathBuf;

    fn entry(name: &str, size: u64, hash: Option<u64>) -> MediaEntry {
        let normalized = crate::core::naming::normalize(name);
        MediaEntry {
            path: PathBuf::from(format!("/library/{name}")),
            raw_name: name.to_string(),
            normalized_title: normalized.title,
            year: normalized.year,
            primary_video_file: PathBuf::from(format!("/library/{name}/movie.mkv")),
            file_size_bytes: size,
            content_hash: hash.map(ContentHash::new),
            quality: score(name, AttributeSource::FilenameDerived),
            episode: None,
            match_types: Vec::new(),
        }
    }

    #[test]
    fn no_entries_yields_no_groups() {
        let groups = detect_duplicates(&mut []);
        assert!(groups.is_empty());
    }

    #[test]
    fn unique_entries_are_never_grouped() {
        let mut entries = vec![
            entry("Alien.1979.1080p.BluRay", 1_000, Some(1)),
            entry("Heat.1995.1080p.BluRay", 2_000, Some(2)),
            entry("Zodiac.2007.1080p.BluRay", 3_000, Some(3)),
        ];

        let groups = detect_duplicates(&mut entries);

        assert!(groups.is_empty());
        assert!(entries.iter().all(|e| e.match_types.is_empty()));
    }

    #[test]
    fn equal_fingerprints_group_regardless_of_names() {
        let mut entries = vec![
            entry("Alien.1979.1080p.BluRay", 5_000, Some(42)),
            entry("Totally.Different.Name.2010", 5_000, Some(42)),
        ];

        let groups = detect_duplicates(&mut entries);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members.len(), 2);
        assert_eq!(groups[0].match_types, vec![MatchType::ExactHash]);
        assert!(entries
            .iter()
            .all(|e| e.match_types.contains(&MatchType::ExactHash)));
    }

    #[test]
    fn settled_entries_do_not_rejoin_title_groups() {
        // Two identical copies settle by hash; the third shares their title
        // key but has nothing left to pair with.
        let mut entries = vec![
            entry("Heat.1995.1080p.BluRay", 5_000, Some(7)),
            entry("Heat.1995.1080p.WEB-DL", 5_000, Some(7)),
            entry("Heat.1995.720p.WEBRip", 3_000, Some(8)),
        ];

        let groups = detect_duplicates(&mut entries);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].match_types, vec![MatchType::ExactHash]);
        assert!(entries[2].match_types.is_empty());
    }

    #[test]
    fn equal_title_keys_group_as_title_match() {
        let mut entries = vec![
            entry("The.Matrix.1999.1080p.BluRay.x264", 4_000, Some(1)),
            entry("Matrix (1999) 720p WEBRip", 1_000, Some(2)),
        ];

        let groups = detect_duplicates(&mut entries);

        assert_eq!(groups.len(), 1);
        assert!(groups[0].match_types.contains(&MatchType::TitleMatch));
        assert!(!groups[0].match_types.contains(&MatchType::ExactHash));
    }

    #[test]
    fn similar_size_requires_ten_percent_of_group_mean() {
        // Sizes 950 and 1050: mean 1000, both within 10%.
        let mut close = vec![
            entry("Heat.1995.1080p.BluRay", 950, None),
            entry("Heat.1995.1080p.WEB-DL", 1_050, None),
        ];
        let groups = detect_duplicates(&mut close);
        assert_eq!(
            groups[0].match_types,
            vec![MatchType::TitleMatch, MatchType::SimilarSize]
        );

        // Sizes 1000 and 2000: mean 1500, both a third away.
        let mut far = vec![
            entry("Heat.1995.1080p.BluRay", 1_000, None),
            entry("Heat.1995.1080p.WEB-DL", 2_000, None),
        ];
        let groups = detect_duplicates(&mut far);
        assert_eq!(groups[0].match_types, vec![MatchType::TitleMatch]);
    }

    #[test]
    fn similar_size_can_tag_a_subset_of_the_group() {
        // Sizes 1000, 1000 and 1300: mean 1100. The two smaller members
        // deviate by ~9% and qualify; the outlier deviates by ~18%.
        let mut entries = vec![
            entry("Heat.1995.1080p.BluRay", 1_000, None),
            entry("Heat.1995.1080p.WEB-DL", 1_000, None),
            entry("Heat.1995.1080p.REMUX", 1_300, None),
        ];

        detect_duplicates(&mut entries);

        assert!(entries[0].match_types.contains(&MatchType::SimilarSize));
        assert!(entries[1].match_types.contains(&MatchType::SimilarSize));
        assert!(!entries[2].match_types.contains(&MatchType::SimilarSize));
    }

    #[test]
    fn different_years_are_different_titles() {
        let mut entries = vec![
            entry("Dune.1984.1080p.BluRay", 1_000, None),
            entry("Dune.2021.1080p.BluRay", 1_000, None),
        ];

        let groups = detect_duplicates(&mut entries);

        assert!(groups.is_empty());
    }

    #[test]
    fn hashless_entries_still_group_by_title() {
        let mut entries = vec![
            entry("Heat.1995.1080p.BluRay", 1_000, Some(9)),
            entry("Heat.1995.1080p.WEB-DL", 1_000, None),
        ];

        let groups = detect_duplicates(&mut entries);

        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].match_types,
            vec![MatchType::TitleMatch, MatchType::SimilarSize]
        );
    }

    #[test]
    fn groups_are_ranked_best_first() {
        let mut entries = vec![
            entry("Heat.1995.DVDRip.XviD", 700, None),
            entry("Heat.1995.2160p.BluRay.x265.Atmos", 720, None),
            entry("Heat.1995.720p.HDTV", 710, None),
        ];

        let groups = detect_duplicates(&mut entries);

        assert_eq!(groups.len(), 1);
        let scores: Vec<u32> = groups[0].members.iter().map(|m| m.quality.score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert!(groups[0].members[0].raw_name.contains("2160p"));
    }

    #[test]
    fn repeated_runs_return_identical_grouping() {
        let build = || {
            vec![
                entry("Heat.1995.1080p.BluRay", 1_000, Some(1)),
                entry("Heat.1995.1080p.WEB-DL", 1_000, Some(1)),
                entry("Alien.1979.720p.HDTV", 2_000, None),
                entry("Alien.1979.1080p.BluRay", 2_100, None),
            ]
        };

        let mut first = build();
        let mut second = build();
        let groups_a = detect_duplicates(&mut first);
        let groups_b = detect_duplicates(&mut second);

        let names = |groups: &[DuplicateGroup]| -> Vec<Vec<String>> {
            groups
                .iter()
                .map(|g| g.members.iter().map(|m| m.raw_name.clone()).collect())
                .collect()
        };
        assert_eq!(names(&groups_a), names(&groups_b));
    }

    #[test]
    fn detection_reports_groups_as_events() {
        let mut entries = vec![
            entry("Heat.1995.1080p.BluRay", 1_000, Some(1)),
            entry("Heat.1995.1080p.WEB-DL", 1_000, Some(1)),
        ];

        let (sender, receiver) = EventChannel::new();
        detect_duplicates_with_events(&mut entries, &sender);
        drop(sender);

        let events: Vec<_> = receiver.iter().collect();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::Detect(DetectEvent::GroupFound { member_count, .. }) if *member_count == 2)));
        match events.last() {
            Some(Event::Detect(DetectEvent::Completed {
                total_groups,
                total_duplicates,
            })) => {
                assert_eq!(*total_groups, 1);
                assert_eq!(*total_duplicates, 1);
            }
            other => panic!("Expected Completed event, got {other:?}"),
        }
    }
}
