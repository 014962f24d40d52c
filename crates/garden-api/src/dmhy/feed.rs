use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::error::ApiError;
use crate::model::{Alliance, Author, Topic, TopicCategory};
use crate::tags::TopicDetails;

static RE_TOPIC_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/topics/view/(\d+)").unwrap());

static RE_SORT_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"sort_id/(\d+)").unwrap());

/// Parse an RSS document into topics. Items without a usable id are skipped.
pub fn parse_channel(bytes: &[u8]) -> Result<Vec<Topic>, ApiError> {
    let channel = rss::Channel::read_from(bytes).map_err(|e| ApiError::Feed(e.to_string()))?;
    Ok(channel.items().iter().filter_map(item_to_topic).collect())
}

fn item_to_topic(item: &rss::Item) -> Option<Topic> {
    let link = item.link().map(str::to_string);
    let id = link
        .as_deref()
        .and_then(|l| RE_TOPIC_ID.captures(l))
        .map(|c| c[1].to_string())
        .or_else(|| item.guid().map(|g| g.value().to_string()))
        .or_else(|| link.clone())?;

    let raw_title = item.title().unwrap_or("").trim().to_string();

    let published_at: Option<DateTime<Utc>> = item
        .pub_date()
        .and_then(|s| DateTime::parse_from_rfc2822(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    let magnet_link = item
        .enclosure()
        .map(|e| e.url())
        .filter(|u| u.starts_with("magnet:"))
        .map(str::to_string);

    let category = item.categories().first().map(|c| TopicCategory {
        id: c
            .domain()
            .and_then(|d| RE_SORT_ID.captures(d))
            .map(|cap| cap[1].to_string())
            .unwrap_or_else(|| c.name().to_string()),
        name: c.name().to_string(),
    });

    let author = item
        .author()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|name| Author {
            id: name.to_string(),
            name: name.to_string(),
        });

    Some(Topic {
        id,
        published_at,
        category,
        alliance: Alliance::from_title(&raw_title),
        details: TopicDetails::parse(&raw_title),
        raw_title,
        comments_count: 0,
        magnet_link,
        size: None,
        author,
        link,
    })
}
