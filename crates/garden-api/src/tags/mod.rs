//! Tags parsed out of topic titles: episode, resolution and subtitle languages.

mod episode;
mod keyword;

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use keyword::{RESOLUTION_KEYWORDS, SUBTITLE_KEYWORDS, SUBTITLE_TAG_CHARS};

/// An episode tag such as `"05"`, `"12.5"` or `"01-12"`.
///
/// Purely numeric values are padded to two digits so `"5"` and `"05"`
/// name the same episode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Episode(String);

impl Episode {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let raw = raw.as_ref().trim();
        match raw.parse::<u32>() {
            Ok(n) => Self(format!("{n:02}")),
            Err(_) => Self(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading episode number, if any (`"12.5"` → 12, `"01-12"` → 1).
    pub fn number(&self) -> Option<u32> {
        let digits: String = self.0.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }
}

impl From<String> for Episode {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Episode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<Episode> for String {
    fn from(e: Episode) -> Self {
        e.0
    }
}

impl Ord for Episode {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.number(), other.number()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Episode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Video resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resolution {
    R240P,
    R360P,
    R480P,
    R720P,
    R1080P,
    R1440P,
    R2160P,
}

impl Resolution {
    pub const ALL: &[Resolution] = &[
        Self::R240P,
        Self::R360P,
        Self::R480P,
        Self::R720P,
        Self::R1080P,
        Self::R1440P,
        Self::R2160P,
    ];

    /// Map a vertical line count to a resolution.
    pub fn from_lines(lines: u32) -> Option<Self> {
        match lines {
            240 => Some(Self::R240P),
            360 => Some(Self::R360P),
            480 => Some(Self::R480P),
            720 => Some(Self::R720P),
            1080 => Some(Self::R1080P),
            1440 => Some(Self::R1440P),
            2160 => Some(Self::R2160P),
            _ => None,
        }
    }

    pub fn lines(self) -> u32 {
        match self {
            Self::R240P => 240,
            Self::R360P => 360,
            Self::R480P => 480,
            Self::R720P => 720,
            Self::R1080P => 1080,
            Self::R1440P => 1440,
            Self::R2160P => 2160,
        }
    }

    /// Parse user input like `1080p`, `1080` or `4K`.
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_ascii_uppercase();
        if let Some(r) = RESOLUTION_KEYWORDS.get(upper.as_str()) {
            return Some(*r);
        }
        upper
            .trim_end_matches('P')
            .parse()
            .ok()
            .and_then(Self::from_lines)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.lines())
    }
}

/// Language of a topic's subtitles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SubtitleLanguage {
    ChineseSimplified,
    ChineseTraditional,
    Japanese,
    English,
}

impl SubtitleLanguage {
    pub const ALL: &[SubtitleLanguage] = &[
        Self::ChineseSimplified,
        Self::ChineseTraditional,
        Self::Japanese,
        Self::English,
    ];

    pub fn short_name(self) -> &'static str {
        match self {
            Self::ChineseSimplified => "CHS",
            Self::ChineseTraditional => "CHT",
            Self::Japanese => "JP",
            Self::English => "EN",
        }
    }

    /// Parse user input such as `chs`, `CHT` or `jp`.
    pub fn parse(s: &str) -> Option<Self> {
        SUBTITLE_KEYWORDS
            .get(s.trim().to_ascii_uppercase().as_str())
            .copied()
    }
}

impl fmt::Display for SubtitleLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Tags extracted from a topic's raw title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<Episode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub subtitle_languages: Vec<SubtitleLanguage>,
    /// Title with the group prefix and tag brackets removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

static RE_RESOLUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:\d{3,4}[x×])?(\d{3,4})[pi]?\b").unwrap());

static RE_LEADING_GROUPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\s*(?:[\[【][^\]】]*[\]】]|★[^★]*★))+").unwrap());

impl TopicDetails {
    pub fn parse(raw_title: &str) -> Self {
        Self {
            episode: episode::extract(raw_title).map(Episode::new),
            resolution: parse_resolution(raw_title),
            subtitle_languages: parse_subtitle_languages(raw_title),
            title: parse_title(raw_title),
        }
    }
}

fn tokens(raw_title: &str) -> impl Iterator<Item = &str> {
    raw_title
        .split(|c: char| {
            matches!(
                c,
                '[' | ']' | '【' | '】' | '(' | ')' | ' ' | '_' | '&' | '+' | '/' | '.' | ','
            )
        })
        .filter(|t| !t.is_empty())
}

fn parse_resolution(raw_title: &str) -> Option<Resolution> {
    for token in tokens(raw_title) {
        let upper = token.to_ascii_uppercase();
        if let Some(r) = RESOLUTION_KEYWORDS.get(upper.as_str()) {
            return Some(*r);
        }
        // Only tokens that look like a resolution, e.g. 1080P, 1920X1080, MA10P_1080P
        if !(upper.ends_with('P') || upper.contains('X') || upper.contains('×')) {
            continue;
        }
        if let Some(r) = RE_RESOLUTION
            .captures_iter(&upper)
            .filter_map(|c| c[1].parse().ok())
            .find_map(Resolution::from_lines)
        {
            return Some(r);
        }
    }
    None
}

fn parse_subtitle_languages(raw_title: &str) -> Vec<SubtitleLanguage> {
    let mut languages = Vec::new();
    let mut push = |lang: SubtitleLanguage| {
        if !languages.contains(&lang) {
            languages.push(lang);
        }
    };

    for token in tokens(raw_title) {
        let upper = token.to_uppercase();
        if let Some(lang) = SUBTITLE_KEYWORDS.get(upper.as_str()) {
            push(*lang);
            continue;
        }
        // CJK subtitle tags are short compounds like 简日双语 or 简繁内封.
        let is_tag = token.chars().count() <= 8
            && token.chars().any(|c| matches!(c, '简' | '簡' | '繁'));
        if is_tag {
            for (ch, lang) in SUBTITLE_TAG_CHARS {
                if token.contains(*ch) {
                    push(*lang);
                }
            }
        }
    }
    languages.sort();
    languages
}

fn parse_title(raw_title: &str) -> Option<String> {
    let rest = RE_LEADING_GROUPS.replace(raw_title, "");
    let rest = rest.trim();
    let end = [rest.find(" - "), rest.find('['), rest.find('【')]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(rest.len());
    let title = rest[..end].trim();
    if !title.is_empty() {
        return Some(title.to_string());
    }
    // Everything is bracketed: use the first bracket that reads like a title.
    raw_title
        .split(['[', ']', '【', '】'])
        .map(str::trim)
        .find(|s| s.contains(" / ") || s.chars().count() > 12)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_normalisation() {
        assert_eq!(Episode::new("5"), Episode::new("05"));
        assert_eq!(Episode::new(" 12 ").as_str(), "12");
        assert_eq!(Episode::new("12.5").as_str(), "12.5");
        assert_eq!(Episode::new("01-12").number(), Some(1));
    }

    #[test]
    fn test_episode_ordering_is_numeric() {
        let mut eps = vec![Episode::new("10"), Episode::new("SP"), Episode::new("9")];
        eps.sort();
        let names: Vec<&str> = eps.iter().map(|e| e.as_str()).collect();
        assert_eq!(names, ["09", "10", "SP"]);
    }

    #[test]
    fn test_resolution_parse() {
        assert_eq!(Resolution::parse("1080p"), Some(Resolution::R1080P));
        assert_eq!(Resolution::parse("720"), Some(Resolution::R720P));
        assert_eq!(Resolution::parse("4k"), Some(Resolution::R2160P));
        assert_eq!(Resolution::parse("999p"), None);
        assert_eq!(Resolution::R1080P.to_string(), "1080p");
    }

    #[test]
    fn test_details_ani() {
        let d = TopicDetails::parse(
            "[ANi] Sousou no Frieren - 05 [1080P][Baha][WEB-DL][AAC AVC][CHT][MP4]",
        );
        assert_eq!(d.episode, Some(Episode::new("05")));
        assert_eq!(d.resolution, Some(Resolution::R1080P));
        assert_eq!(d.subtitle_languages, vec![SubtitleLanguage::ChineseTraditional]);
        assert_eq!(d.title.as_deref(), Some("Sousou no Frieren"));
    }

    #[test]
    fn test_details_cjk_tags() {
        let d = TopicDetails::parse(
            "【喵萌奶茶屋】★10月新番★[葬送的芙莉莲 / Sousou no Frieren][05][1080p][简日双语]",
        );
        assert_eq!(d.episode, Some(Episode::new("5")));
        assert_eq!(d.resolution, Some(Resolution::R1080P));
        assert_eq!(
            d.subtitle_languages,
            vec![SubtitleLanguage::ChineseSimplified, SubtitleLanguage::Japanese]
        );
        assert_eq!(d.title.as_deref(), Some("葬送的芙莉莲 / Sousou no Frieren"));
    }

    #[test]
    fn test_details_dimension_resolution() {
        let d = TopicDetails::parse("[Lilith-Raws] Frieren - 03 [Baha][WEB-DL][1920x1080][AVC AAC][CHT]");
        assert_eq!(d.resolution, Some(Resolution::R1080P));
    }

    #[test]
    fn test_details_without_tags() {
        let d = TopicDetails::parse("Some plain upload");
        assert_eq!(d.episode, None);
        assert_eq!(d.resolution, None);
        assert!(d.subtitle_languages.is_empty());
        assert_eq!(d.title.as_deref(), Some("Some plain upload"));
    }
}
