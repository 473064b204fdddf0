//! Decomposes free-text media labels into artist and track.
//!
//! Labels come from video platforms and look like
//! `"Artist - Track (Official Video) [HD]"`, sometimes inverted, sometimes
//! with no artist at all. Parsing is deterministic and does no I/O.

use lazy_static::lazy_static;
use regex::Regex;

use super::models::{Confidence, ParsedTitle, UNKNOWN_ARTIST};
use super::similarity::similarity;

/// Separators tried in order; the first one present wins.
const SEPARATORS: [&str; 5] = [" - ", "–", "—", "|", "•"];

const ARTIST_LEN_RANGE: std::ops::RangeInclusive<usize> = 2..=30;
const TRACK_LEN_RANGE: std::ops::RangeInclusive<usize> = 2..=80;
/// A leading part longer than this is most likely a channel or a track title.
const LONG_PART_LEN: usize = 40;

/// Channel-to-part similarity required before a split is swapped.
const CHANNEL_SWAP_THRESHOLD: f64 = 0.7;

lazy_static! {
    static ref BRACKETED: Regex = Regex::new(r"\[[^\]]*\]").expect("valid bracket regex");
    static ref PARENTHETICAL: Regex =
        Regex::new(r"\(([^()]*)\)").expect("valid parenthetical regex");
    static ref EMPTY_PARENS: Regex = Regex::new(r"\(\s*\)").expect("valid empty parens regex");
    static ref FEATURING_WORD: Regex =
        Regex::new(r"(?i)\b(feat|ft|featuring|with)\b").expect("valid featuring regex");
    // Bare "with" is too common in track names; it only counts inside parentheses.
    static ref FEATURING_SPLIT: Regex =
        Regex::new(r"(?i)\(\s*(feat|ft|featuring|with)\b|\b(feat|ft|featuring)\b")
            .expect("valid featuring split regex");
    // Longer phrases first: alternation is leftmost-first.
    static ref NOISE_WORDS: Regex = Regex::new(
        r"(?i)\b(official music video|official lyric video|official video|official audio|official visualizer|lyric video|lyrics video|music video|visualizer|lyrics|lyric|remastered version|remastered|remaster|extended version|extended mix|radio edit|remix|hd|hq|4k|1080p|720p|mv)\b"
    )
    .expect("valid noise word regex");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid whitespace regex");
    static ref CHANNEL_SUFFIX: Regex =
        Regex::new(r"(?i)(\s*-\s*topic$|vevo$|\s+official$)").expect("valid channel regex");
}

/// Free-text title parser.
pub struct TitleParser;

impl TitleParser {
    /// Decompose a raw label into artist, track and a confidence level.
    pub fn parse(raw_title: &str) -> ParsedTitle {
        let cleaned = clean_title(raw_title);

        if let Some((first, second)) = split_on_separator(&cleaned) {
            return classify_parts(first, second);
        }

        if let Some(m) = FEATURING_SPLIT.find(&cleaned) {
            let track = cleaned[..m.start()]
                .trim()
                .trim_end_matches(|c: char| c == '(' || c.is_whitespace());
            if !track.is_empty() {
                return ParsedTitle::new(UNKNOWN_ARTIST, track, Confidence::Medium);
            }
        }

        let fallback = if cleaned.is_empty() {
            raw_title.trim()
        } else {
            cleaned.as_str()
        };
        ParsedTitle::new(UNKNOWN_ARTIST, title_case(fallback), Confidence::Low)
    }

    /// Parse, then use the uploader's channel label to validate a medium
    /// confidence split. The parts are swapped when the channel looks like
    /// the track part rather than the artist part. Confidence is unchanged.
    pub fn parse_with_channel(raw_title: &str, channel_label: Option<&str>) -> ParsedTitle {
        let parsed = Self::parse(raw_title);

        let Some(channel) = channel_label.map(normalize_channel) else {
            return parsed;
        };
        if channel.is_empty()
            || parsed.confidence != Confidence::Medium
            || parsed.artist == UNKNOWN_ARTIST
        {
            return parsed;
        }

        let to_track = similarity(&channel, &parsed.track);
        let to_artist = similarity(&channel, &parsed.artist);
        if to_track > CHANNEL_SWAP_THRESHOLD && to_track > to_artist {
            parsed.swapped()
        } else {
            parsed
        }
    }
}

/// Strip brackets, non-featuring parentheticals and noise words, then
/// normalize whitespace.
fn clean_title(raw: &str) -> String {
    let text = BRACKETED.replace_all(raw, " ");
    let text = PARENTHETICAL.replace_all(&text, |caps: &regex::Captures| {
        let inner = caps[1].to_lowercase();
        if FEATURING_WORD.is_match(&inner) {
            caps[0].to_string()
        } else {
            " ".to_string()
        }
    });
    let text = NOISE_WORDS.replace_all(&text, " ");
    let text = EMPTY_PARENS.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");

    text.trim()
        .trim_matches(|c: char| c.is_whitespace() || "-–—|•".contains(c))
        .to_string()
}

fn split_on_separator(text: &str) -> Option<(&str, &str)> {
    SEPARATORS.iter().find_map(|sep| {
        let (first, second) = text.split_once(sep)?;
        let (first, second) = (first.trim(), second.trim());
        if first.is_empty() || second.is_empty() {
            None
        } else {
            Some((first, second))
        }
    })
}

fn classify_parts(first: &str, second: &str) -> ParsedTitle {
    let first_len = first.chars().count();
    let second_len = second.chars().count();

    if ARTIST_LEN_RANGE.contains(&first_len) && TRACK_LEN_RANGE.contains(&second_len) {
        ParsedTitle::new(first, second, Confidence::High)
    } else if first_len > LONG_PART_LEN && second_len < LONG_PART_LEN {
        ParsedTitle::new(second, first, Confidence::Medium)
    } else {
        ParsedTitle::new(first, second, Confidence::Medium)
    }
}

fn normalize_channel(channel: &str) -> String {
    CHANNEL_SUFFIX.replace_all(channel.trim(), "").trim().to_string()
}

/// Uppercase the first letter of every word, leaving the rest untouched.
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
