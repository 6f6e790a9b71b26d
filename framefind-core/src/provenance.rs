//! Show/season/episode extraction from media unit paths.
//!
//! An ordered, fixed-priority list of filename patterns is tried against
//! the file stem; the first match wins. Units matching nothing fall back
//! to directory-based season inference (`<Show>/<SeasonNN>/<episode>`),
//! and failing that are skipped with a `Parse` error.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{FramefindError, Result};

/// Structured identity of a media unit's origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub show: String,
    pub season: u32,
    pub episode: u32,
}

/// Which filename convention matched, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StemPattern {
    /// `Show_S01E02`
    SeasonEpisode,
    /// `Show_1x02`
    Cross,
    /// `Show [1.02]` / `Show 1 02`
    BracketDot,
    /// `[Group] Show - 02` fansub style; season defaults to 1.
    FansubDash,
}

static STEM_PATTERNS: LazyLock<Vec<(StemPattern, Regex)>> = LazyLock::new(|| {
    vec![
        (
            StemPattern::SeasonEpisode,
            Regex::new(r"(.+?)[_\s-]*[Ss](\d+)[Ee](\d+)").unwrap(),
        ),
        (
            StemPattern::Cross,
            Regex::new(r"(.+?)[_\s-]+(\d+)x(\d+)").unwrap(),
        ),
        (
            StemPattern::BracketDot,
            Regex::new(r"(.+?)[_\s]+\[?(\d+)[.\s](\d+)\]?").unwrap(),
        ),
        (
            StemPattern::FansubDash,
            Regex::new(r"\[.*?\]\s*(.+?)\s*-\s*(\d+)").unwrap(),
        ),
    ]
});

static SEASON_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[Ss](?:eason)?\s*(\d+)").unwrap());

static EPISODE_IN_STEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[Ee](?:pisode|p)?[\s._-]*(\d+)").unwrap());

/// Extract provenance from a media unit path, testing patterns in
/// priority order and taking the first match.
pub fn parse_unit_path(path: &Path) -> Result<Provenance> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    for (pattern, regex) in STEM_PATTERNS.iter() {
        let Some(caps) = regex.captures(stem) else {
            continue;
        };
        let show = normalize_show(&caps[1]);
        let parsed = match pattern {
            StemPattern::SeasonEpisode | StemPattern::Cross | StemPattern::BracketDot => {
                match (caps[2].parse(), caps[3].parse()) {
                    (Ok(season), Ok(episode)) => Some(Provenance {
                        show,
                        season,
                        episode,
                    }),
                    _ => None,
                }
            }
            StemPattern::FansubDash => caps[2].parse().ok().map(|episode| Provenance {
                show,
                season: 1,
                episode,
            }),
        };
        if let Some(provenance) = parsed {
            return Ok(provenance);
        }
    }

    if let Some(provenance) = parse_from_directories(path, stem) {
        return Ok(provenance);
    }

    Err(FramefindError::Parse {
        path: path.display().to_string(),
    })
}

/// `<Show>/<SeasonNN>/<... Ep 02 ...>.mkv` layout: show from the
/// grandparent directory, season inferred from the parent.
fn parse_from_directories(path: &Path, stem: &str) -> Option<Provenance> {
    let parent = path.parent()?;
    let season_dir = parent.file_name()?.to_str()?;
    let show_dir = parent.parent()?.file_name()?.to_str()?;

    let season = SEASON_DIR
        .captures(season_dir)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(1);
    let episode = EPISODE_IN_STEM
        .captures(stem)
        .and_then(|caps| caps[1].parse().ok())?;

    Some(Provenance {
        show: normalize_show(show_dir),
        season,
        episode,
    })
}

fn normalize_show(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '_' || c == '-')
        .replace('_', " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(path: &str) -> Provenance {
        parse_unit_path(&PathBuf::from(path)).unwrap()
    }

    #[test]
    fn test_explicit_season_episode_marker() {
        let p = parse("animes/OnePiece/Season02/OnePiece_S02E07.mkv");
        assert_eq!(p.show, "OnePiece");
        assert_eq!(p.season, 2);
        assert_eq!(p.episode, 7);
    }

    #[test]
    fn test_cross_style() {
        let p = parse("corpus/Naruto 3x12.mp4");
        assert_eq!(p.show, "Naruto");
        assert_eq!(p.season, 3);
        assert_eq!(p.episode, 12);
    }

    #[test]
    fn test_bracket_dot_style() {
        let p = parse("corpus/Bleach [2.05].mkv");
        assert_eq!(p.show, "Bleach");
        assert_eq!(p.season, 2);
        assert_eq!(p.episode, 5);
    }

    #[test]
    fn test_fansub_dash_defaults_season_one() {
        let p = parse("dl/[SubGroup] Frieren - 12.mkv");
        assert_eq!(p.show, "Frieren");
        assert_eq!(p.season, 1);
        assert_eq!(p.episode, 12);
    }

    #[test]
    fn test_priority_order_prefers_explicit_markers() {
        // Both S01E02 and the fansub pattern could apply; explicit wins.
        let p = parse("dl/[SubGroup] Gintama S01E02 - 99.mkv");
        assert_eq!(p.season, 1);
        assert_eq!(p.episode, 2);
    }

    #[test]
    fn test_directory_based_inference() {
        let p = parse("animes/Cowboy_Bebop/Season01/Episode 05.mkv");
        assert_eq!(p.show, "Cowboy Bebop");
        assert_eq!(p.season, 1);
        assert_eq!(p.episode, 5);
    }

    #[test]
    fn test_underscores_become_spaces() {
        let p = parse("x/One_Piece_S01E01.mkv");
        assert_eq!(p.show, "One Piece");
    }

    #[test]
    fn test_unparseable_path_errors() {
        let err = parse_unit_path(&PathBuf::from("random/movie.mkv")).unwrap_err();
        assert!(matches!(err, FramefindError::Parse { .. }));
    }
}
