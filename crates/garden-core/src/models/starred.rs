use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use garden_api::{Alliance, Episode, Resolution, SubtitleLanguage};

/// A search the user pinned, with remembered format preferences and watch progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarredAnime {
    /// The exact keyword string the record was starred for.
    pub search_query: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_alliance: Option<Alliance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_resolution: Option<Resolution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_subtitle_language: Option<SubtitleLanguage>,
    #[serde(default)]
    pub watched_episodes: BTreeSet<Episode>,
    pub starred_at: DateTime<Utc>,
}

impl StarredAnime {
    pub fn new(search_query: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            search_query: search_query.into(),
            display_name: display_name.into(),
            preferred_alliance: None,
            preferred_resolution: None,
            preferred_subtitle_language: None,
            watched_episodes: BTreeSet::new(),
            starred_at: Utc::now(),
        }
    }

    /// Whether this record belongs to the given query keywords.
    pub fn matches(&self, keywords: Option<&str>) -> bool {
        keywords == Some(self.search_query.as_str())
    }

    pub fn is_watched(&self, episode: &Episode) -> bool {
        self.watched_episodes.contains(episode)
    }

    /// Mark `episode` watched. Returns false if it already was.
    pub fn mark_watched(&mut self, episode: Episode) -> bool {
        self.watched_episodes.insert(episode)
    }
}
