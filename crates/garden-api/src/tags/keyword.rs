use phf::phf_map;

use super::{Resolution, SubtitleLanguage};

/// Subtitle tokens as they appear in topic titles.
/// All keys are UPPERCASE for case-insensitive matching.
pub static SUBTITLE_KEYWORDS: phf::Map<&'static str, SubtitleLanguage> = phf_map! {
    // ── Simplified Chinese ───────────────────────────────────────
    "CHS" => SubtitleLanguage::ChineseSimplified,
    "SC" => SubtitleLanguage::ChineseSimplified,
    "GB" => SubtitleLanguage::ChineseSimplified,
    "简体" => SubtitleLanguage::ChineseSimplified,
    "简中" => SubtitleLanguage::ChineseSimplified,
    "簡體" => SubtitleLanguage::ChineseSimplified,
    "简" => SubtitleLanguage::ChineseSimplified,

    // ── Traditional Chinese ──────────────────────────────────────
    "CHT" => SubtitleLanguage::ChineseTraditional,
    "TC" => SubtitleLanguage::ChineseTraditional,
    "BIG5" => SubtitleLanguage::ChineseTraditional,
    "繁体" => SubtitleLanguage::ChineseTraditional,
    "繁體" => SubtitleLanguage::ChineseTraditional,
    "繁中" => SubtitleLanguage::ChineseTraditional,
    "繁" => SubtitleLanguage::ChineseTraditional,

    // ── Japanese ─────────────────────────────────────────────────
    "JP" => SubtitleLanguage::Japanese,
    "JPN" => SubtitleLanguage::Japanese,
    "JPSC" => SubtitleLanguage::Japanese,
    "日" => SubtitleLanguage::Japanese,
    "日语" => SubtitleLanguage::Japanese,
    "日語" => SubtitleLanguage::Japanese,

    // ── English ──────────────────────────────────────────────────
    "ENG" => SubtitleLanguage::English,
    "EN" => SubtitleLanguage::English,
    "英" => SubtitleLanguage::English,
};

/// Characters that mark a CJK token as a subtitle tag, e.g. `简日双语`, `简繁内封`.
pub const SUBTITLE_TAG_CHARS: &[(char, SubtitleLanguage)] = &[
    ('简', SubtitleLanguage::ChineseSimplified),
    ('簡', SubtitleLanguage::ChineseSimplified),
    ('繁', SubtitleLanguage::ChineseTraditional),
    ('日', SubtitleLanguage::Japanese),
    ('英', SubtitleLanguage::English),
];

/// Tokens that only name a resolution without a `p` suffix.
pub static RESOLUTION_KEYWORDS: phf::Map<&'static str, Resolution> = phf_map! {
    "4K" => Resolution::R2160P,
    "UHD" => Resolution::R2160P,
    "2K" => Resolution::R1440P,
    "FHD" => Resolution::R1080P,
    "HD" => Resolution::R720P,
    "SD" => Resolution::R480P,
};
