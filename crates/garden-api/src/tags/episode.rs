use std::sync::LazyLock;

use regex::Regex;

// ── Regex patterns (compiled once) ──────────────────────────────

static RE_COMBINED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bS\d{1,2}E(\d{1,4})(?:v\d)?\b").unwrap());

static RE_JAPANESE_COUNTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"第\s*(\d{1,4})\s*[话話集]").unwrap());

static RE_KEYWORD_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:EP|E)\.?\s?(\d{1,4})(?:v\d)?\b").unwrap());

static RE_BRACKET_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[\[【]\s*(\d{1,4})\s*[-~]\s*(\d{1,4})\s*(?:END|FIN|合集|\+\s*\w+)?\s*[\]】]")
        .unwrap()
});

static RE_BRACKET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[\[【]\s*(\d{1,4}(?:\.5)?)(?:v\d)?\s*(?:END|FIN|完)?\s*[\]】]").unwrap()
});

static RE_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s-\s(\d{1,4}(?:\.5)?)(?:v\d)?(?:\s|\[|【|$)").unwrap());

/// Extract the raw episode string from a topic title.
///
/// Strategies are tried in order of specificity. Ranges come back as
/// `"01-12"`, single episodes as the digits found (normalisation happens
/// in [`super::Episode::new`]).
pub fn extract(title: &str) -> Option<String> {
    if let Some(c) = RE_COMBINED.captures(title) {
        return Some(c[1].to_string());
    }
    if let Some(c) = RE_JAPANESE_COUNTER.captures(title) {
        return Some(c[1].to_string());
    }
    if let Some(c) = RE_BRACKET_RANGE.captures(title) {
        return Some(format!("{}-{}", pad(&c[1]), pad(&c[2])));
    }
    if let Some(ep) = RE_BRACKET
        .captures_iter(title)
        .map(|c| c[1].to_string())
        .find(|ep| !is_year_like(ep))
    {
        return Some(ep);
    }
    if let Some(c) = RE_DASH.captures(title) {
        if !is_year_like(&c[1]) {
            return Some(c[1].to_string());
        }
    }
    if let Some(c) = RE_KEYWORD_PREFIX.captures(title) {
        return Some(c[1].to_string());
    }
    None
}

fn pad(digits: &str) -> String {
    match digits.parse::<u32>() {
        Ok(n) => format!("{n:02}"),
        Err(_) => digits.to_string(),
    }
}

fn is_year_like(s: &str) -> bool {
    s.len() == 4 && s.parse::<u32>().is_ok_and(|n| (1950..=2099).contains(&n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dash_episode() {
        assert_eq!(
            extract("[ANi] Sousou no Frieren - 05 [1080P][Baha][WEB-DL][AAC AVC][CHT][MP4]"),
            Some("05".into())
        );
    }

    #[test]
    fn test_bracket_episode() {
        assert_eq!(
            extract("【喵萌奶茶屋】★10月新番★[葬送的芙莉莲 / Sousou no Frieren][05][1080p][简日双语]"),
            Some("05".into())
        );
    }

    #[test]
    fn test_bracket_skips_year() {
        assert_eq!(
            extract("[桜都字幕组] 葬送的芙莉莲 [2023][12][1080p]"),
            Some("12".into())
        );
    }

    #[test]
    fn test_range() {
        assert_eq!(
            extract("[Nekomoe kissaten] Sousou no Frieren [01-28 Fin][BDRip]"),
            Some("01-28".into())
        );
        assert_eq!(extract("[LoliHouse] Frieren [1~12][WebRip]"), Some("01-12".into()));
    }

    #[test]
    fn test_japanese_counter() {
        assert_eq!(extract("葬送的芙莉莲 第5话 简体"), Some("5".into()));
    }

    #[test]
    fn test_combined_and_prefix() {
        assert_eq!(extract("Frieren S01E07 1080p"), Some("07".into()));
        assert_eq!(extract("Frieren EP08 HEVC"), Some("08".into()));
    }

    #[test]
    fn test_no_episode() {
        assert_eq!(extract("[VCB-Studio] Sousou no Frieren [Ma10p_1080p]"), None);
    }
}
