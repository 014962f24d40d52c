use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::tags::TopicDetails;

/// What the user is searching for. Replaced wholesale on every new search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub keywords: Option<String>,
    pub category: Option<TopicCategory>,
    pub alliance: Option<Alliance>,
}

impl SearchQuery {
    pub fn with_keywords(keywords: impl Into<String>) -> Self {
        Self {
            keywords: Some(keywords.into()),
            ..Default::default()
        }
    }

    /// True when there are no keywords or they are only whitespace.
    pub fn is_blank(&self) -> bool {
        self.keywords
            .as_deref()
            .map_or(true, |k| k.trim().is_empty())
    }
}

/// Feed category (e.g. "動畫", "季度全集").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicCategory {
    pub id: String,
    pub name: String,
}

/// A fansub group publishing topics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Alliance {
    pub id: String,
    pub name: String,
}

static RE_LEADING_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[\[【]([^\]】]+)[\]】]").unwrap());

impl Alliance {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// The group named by a title's leading `[group]` or `【group】`.
    /// Feeds without a team field only identify groups this way, so the
    /// name doubles as the id.
    pub fn from_title(raw_title: &str) -> Option<Self> {
        RE_LEADING_GROUP
            .captures(raw_title)
            .map(|c| c[1].trim().to_string())
            .filter(|name| !name.is_empty())
            .map(|name| Self::new(name.clone(), name))
    }
}

impl fmt::Display for Alliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
}

/// Size of the files in a topic, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileSize(pub u64);

impl FileSize {
    const UNITS: &'static [&'static str] = &["B", "KB", "MB", "GB", "TB"];
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value = self.0 as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit < Self::UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        if unit == 0 {
            write!(f, "{} B", self.0)
        } else {
            write!(f, "{value:.1} {}", Self::UNITS[unit])
        }
    }
}

/// One search-result entry from the topic feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Opaque, feed-unique identifier.
    pub id: String,
    pub published_at: Option<DateTime<Utc>>,
    pub category: Option<TopicCategory>,
    pub alliance: Option<Alliance>,
    pub raw_title: String,
    pub comments_count: u32,
    pub magnet_link: Option<String>,
    pub size: Option<FileSize>,
    pub author: Option<Author>,
    /// Tags parsed from `raw_title`.
    pub details: TopicDetails,
    /// Topic page on the feed's website.
    pub link: Option<String>,
}

impl Topic {
    /// A topic carrying only an id and a title; tags are parsed from the title.
    pub fn from_title(id: impl Into<String>, raw_title: impl Into<String>) -> Self {
        let raw_title = raw_title.into();
        Self {
            id: id.into(),
            published_at: None,
            category: None,
            alliance: Alliance::from_title(&raw_title),
            details: TopicDetails::parse(&raw_title),
            raw_title,
            comments_count: 0,
            magnet_link: None,
            size: None,
            author: None,
            link: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_query() {
        assert!(SearchQuery::default().is_blank());
        assert!(SearchQuery::with_keywords("  ").is_blank());
        assert!(!SearchQuery::with_keywords("frieren").is_blank());
    }

    #[test]
    fn test_file_size_display() {
        assert_eq!(FileSize(900).to_string(), "900 B");
        assert_eq!(FileSize(1_572_864).to_string(), "1.5 MB");
        assert_eq!(FileSize(1_288_490_189).to_string(), "1.2 GB");
    }

    #[test]
    fn test_topic_from_title_parses_details() {
        let topic = Topic::from_title("1", "[ANi] Sousou no Frieren - 05 [1080P][CHT]");
        assert_eq!(topic.details.episode.as_ref().map(|e| e.as_str()), Some("05"));
        assert_eq!(topic.alliance, Some(Alliance::new("ANi", "ANi")));
    }

    #[test]
    fn test_alliance_from_title() {
        assert_eq!(
            Alliance::from_title("【喵萌奶茶屋】★10月新番★[Frieren][05]").map(|a| a.name),
            Some("喵萌奶茶屋".to_string())
        );
        assert_eq!(Alliance::from_title("Frieren - 05 [1080p]"), None);
        assert_eq!(Alliance::from_title("[ ] Frieren"), None);
    }
}
