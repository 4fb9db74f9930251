//! Season/episode extraction from series file names.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::strip_video_extension;

// "Show.Name.S02E05", "S02E05E06", "S02E05-06". Extra episode numbers are
// collected by the fourth group and split out afterwards.
static RE_SXXEYY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?)[.\s_-]+S(\d{1,2})E(\d{1,2})((?:[E-]\d{1,2})*)(.*)$").unwrap()
});

static RE_EXTRA_EPISODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[E-](\d{1,2})").unwrap());

// "Seinfeld.3x12". Lowercase x only, matching the release convention.
static RE_NXM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)[.\s_-]+(\d{1,2})x(\d{1,2})(.*)$").unwrap());

// "Friends Season 2 Episode 14"
static RE_SEASON_EPISODE_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?)[.\s_-]+Season\s*(\d{1,2})[.\s_-]+Episode\s*(\d{1,2})(.*)$").unwrap()
});

// Quality/source noise that ends an episode title.
static RE_EPISODE_TITLE_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(720p|1080p|2160p|4K|HDTV|WEB-DL|WEBRip|BluRay|x264|x265|HEVC|AAC|AC3).*$")
        .unwrap()
});

static RE_LEADING_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[.\s_-]+").unwrap());

/// Season/episode identity parsed from a file name.
///
/// All fields are best-effort: a name with no recognizable pattern yields
/// the default value, which is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeInfo {
    /// Show name from the text before the episode marker, dots flattened.
    pub show_title: Option<String>,
    pub season: Option<u32>,
    /// All episode numbers covered by the file, in order of appearance.
    pub episodes: Vec<u32>,
    /// Trailing text after the marker with quality noise removed.
    pub episode_title: Option<String>,
    /// True when the file spans more than one episode.
    pub multi_episode: bool,
}

impl EpisodeInfo {
    /// Whether any pattern matched.
    pub fn is_episode(&self) -> bool {
        self.season.is_some()
    }
}

/// Parse season/episode information out of a raw file name.
///
/// Pattern families are tried in order: `SxxEyy` (with multi-episode
/// suffixes), `NxM`, then spelled-out `Season N Episode M`. The first
/// match wins; no match yields `EpisodeInfo::default()`.
pub fn identify(raw_file_name: &str) -> EpisodeInfo {
    let name = strip_video_extension(raw_file_name);

    match_sxxeyy(name)
        .or_else(|| match_nxm(name))
        .or_else(|| match_season_episode_words(name))
        .unwrap_or_default()
}

fn match_sxxeyy(name: &str) -> Option<EpisodeInfo> {
    let caps = RE_SXXEYY.captures(name)?;

    let season: u32 = caps[2].parse().ok()?;
    let mut episodes: Vec<u32> = vec![caps[3].parse().ok()?];
    for extra in RE_EXTRA_EPISODE.captures_iter(&caps[4]) {
        if let Ok(number) = extra[1].parse() {
            episodes.push(number);
        }
    }

    let episode_title = caps.get(5).and_then(|m| clean_episode_title(m.as_str()));
    let multi_episode = episodes.len() > 1;

    Some(EpisodeInfo {
        show_title: Some(clean_show_title(&caps[1])),
        season: Some(season),
        episodes,
        episode_title,
        multi_episode,
    })
}

fn match_nxm(name: &str) -> Option<EpisodeInfo> {
    let caps = RE_NXM.captures(name)?;

    Some(EpisodeInfo {
        show_title: Some(clean_show_title(&caps[1])),
        season: Some(caps[2].parse().ok()?),
        episodes: vec![caps[3].parse().ok()?],
        episode_title: None,
        multi_episode: false,
    })
}

fn match_season_episode_words(name: &str) -> Option<EpisodeInfo> {
    let caps = RE_SEASON_EPISODE_WORDS.captures(name)?;

    Some(EpisodeInfo {
        show_title: Some(clean_show_title(&caps[1])),
        season: Some(caps[2].parse().ok()?),
        episodes: vec![caps[3].parse().ok()?],
        episode_title: None,
        multi_episode: false,
    })
}

fn clean_show_title(raw: &str) -> String {
    raw.replace('.', " ").trim().to_string()
}

fn clean_episode_title(raw: &str) -> Option<String> {
    let trimmed = RE_LEADING_SEPARATORS.replace(raw, "");
    let spaced = trimmed.replace('.', " ");
    let cleaned = RE_EPISODE_TITLE_NOISE.replace(&spaced, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_sxxeyy() {
        let info = identify("Show.Name.S02E05.mkv");
        assert_eq!(info.show_title.as_deref(), Some("Show Name"));
        assert_eq!(info.season, Some(2));
        assert_eq!(info.episodes, vec![5]);
        assert!(!info.multi_episode);
        assert!(info.is_episode());
    }

    #[test]
    fn double_episode_with_e_separator() {
        let info = identify("Show.Name.S02E05E06.mkv");
        assert_eq!(info.episodes, vec![5, 6]);
        assert!(info.multi_episode);
    }

    #[test]
    fn double_episode_with_dash_separator() {
        let info = identify("Show.Name.S01E01-02.mkv");
        assert_eq!(info.season, Some(1));
        assert_eq!(info.episodes, vec![1, 2]);
        assert!(info.multi_episode);
    }

    #[test]
    fn triple_episode_span() {
        let info = identify("Show.S01E01E02E03.mkv");
        assert_eq!(info.episodes, vec![1, 2, 3]);
        assert!(info.multi_episode);
    }

    #[test]
    fn lowercase_marker() {
        let info = identify("the.office.s01e01.pilot.mp4");
        assert_eq!(info.show_title.as_deref(), Some("the office"));
        assert_eq!(info.season, Some(1));
        assert_eq!(info.episodes, vec![1]);
        assert_eq!(info.episode_title.as_deref(), Some("pilot"));
    }

    #[test]
    fn episode_title_sheds_quality_noise() {
        let info = identify("Breaking.Bad.S05E14.Ozymandias.1080p.WEB-DL.mkv");
        assert_eq!(info.show_title.as_deref(), Some("Breaking Bad"));
        assert_eq!(info.episode_title.as_deref(), Some("Ozymandias"));
    }

    #[test]
    fn pure_noise_remainder_means_no_episode_title() {
        let info = identify("Show.S01E01.720p.HDTV.x264.mkv");
        assert_eq!(info.episode_title, None);
    }

    #[test]
    fn nxm_format() {
        let info = identify("Seinfeld.3x12.avi");
        assert_eq!(info.show_title.as_deref(), Some("Seinfeld"));
        assert_eq!(info.season, Some(3));
        assert_eq!(info.episodes, vec![12]);
        assert_eq!(info.episode_title, None);
    }

    #[test]
    fn spelled_out_season_episode() {
        let info = identify("Friends Season 2 Episode 14.mkv");
        assert_eq!(info.show_title.as_deref(), Some("Friends"));
        assert_eq!(info.season, Some(2));
        assert_eq!(info.episodes, vec![14]);
    }

    #[test]
    fn single_digit_widths() {
        let info = identify("Show.S1E2.mkv");
        assert_eq!(info.season, Some(1));
        assert_eq!(info.episodes, vec![2]);
    }

    #[test]
    fn movie_name_is_not_an_episode() {
        let info = identify("The.Matrix.1999.mkv");
        assert_eq!(info, EpisodeInfo::default());
        assert!(!info.is_episode());
    }

    #[test]
    fn extensionless_name_still_parses() {
        let info = identify("Show.Name.S02E05");
        assert_eq!(info.season, Some(2));
        assert_eq!(info.episodes, vec![5]);
    }

    #[test]
    fn marker_without_show_prefix_does_not_match() {
        // The show-title group requires text before the marker.
        let info = identify("S01E01.mkv");
        assert!(!info.is_episode());
    }
}
