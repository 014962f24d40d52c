use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::Mutex;
use url::Url;

use super::feed;
use crate::error::ApiError;
use crate::model::{SearchQuery, Topic};
use crate::traits::{AnimationGardenClient, SearchSession};

pub const DEFAULT_FEED_URL: &str = "https://share.dmhy.org/topics/rss/rss.xml";

/// dmhy RSS search client.
#[derive(Clone)]
pub struct DmhyClient {
    http: Client,
    feed_url: String,
    timeout: Duration,
}

impl DmhyClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            feed_url: DEFAULT_FEED_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_feed_url(mut self, feed_url: impl Into<String>) -> Self {
        self.feed_url = feed_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl AnimationGardenClient for DmhyClient {
    type Session = DmhySession;

    fn start_search_session(&self, query: SearchQuery) -> DmhySession {
        DmhySession {
            client: self.clone(),
            query,
            state: Mutex::new(PageState::default()),
        }
    }
}

struct PageState {
    next_page: u32,
    seen: HashSet<String>,
    exhausted: bool,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            next_page: 1,
            seen: HashSet::new(),
            exhausted: false,
        }
    }
}

/// A paged search against the dmhy feed.
///
/// The feed may ignore the `page` parameter and repeat itself, so a page
/// that brings no unseen topic ends the session.
pub struct DmhySession {
    client: DmhyClient,
    query: SearchQuery,
    state: Mutex<PageState>,
}

impl DmhySession {
    /// Feed URL for the given page number (1-based).
    pub fn page_url(&self, page: u32) -> Result<Url, ApiError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(keywords) = self.query.keywords.as_deref().map(str::trim) {
            if !keywords.is_empty() {
                params.push(("keyword", keywords.to_string()));
            }
        }
        if let Some(category) = &self.query.category {
            params.push(("sort_id", category.id.clone()));
        }
        if let Some(alliance) = &self.query.alliance {
            params.push(("team_id", alliance.id.clone()));
        }
        if page > 1 {
            params.push(("page", page.to_string()));
        }
        let mut url = Url::parse(&self.client.feed_url)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(&params);
        }
        Ok(url)
    }

    async fn fetch_page(&self, page: u32) -> Result<Vec<Topic>, ApiError> {
        let url = self.page_url(page)?;
        tracing::debug!(%url, "fetching feed page");

        let response = self
            .client
            .http
            .get(url)
            .timeout(self.client.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let bytes = response.bytes().await?;
        feed::parse_channel(&bytes[..])
    }
}

impl SearchSession for DmhySession {
    fn query(&self) -> &SearchQuery {
        &self.query
    }

    async fn next_page(&self) -> Result<Option<Vec<Topic>>, ApiError> {
        let mut state = self.state.lock().await;
        if state.exhausted {
            return Ok(None);
        }

        let page = state.next_page;
        let topics = self.fetch_page(page).await?;
        Ok(state.accept_page(topics))
    }
}

impl PageState {
    /// Keep the topics not seen on earlier pages and advance. A page with
    /// nothing new ends the session.
    fn accept_page(&mut self, topics: Vec<Topic>) -> Option<Vec<Topic>> {
        let fresh: Vec<Topic> = topics
            .into_iter()
            .filter(|t| self.seen.insert(t.id.clone()))
            .collect();

        if fresh.is_empty() {
            tracing::debug!(page = self.next_page, "feed exhausted");
            self.exhausted = true;
            return None;
        }

        self.next_page += 1;
        Some(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alliance, TopicCategory};

    fn session(query: SearchQuery) -> DmhySession {
        DmhyClient::new(Client::new())
            .with_feed_url("https://feed.example/rss.xml")
            .start_search_session(query)
    }

    #[test]
    fn test_first_page_url() {
        let s = session(SearchQuery::with_keywords(" 葬送的芙莉莲 "));
        let url = s.page_url(1).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("keyword".to_string(), "葬送的芙莉莲".to_string())]);
    }

    #[test]
    fn test_filtered_page_url() {
        let s = session(SearchQuery {
            keywords: Some("frieren".into()),
            category: Some(TopicCategory {
                id: "2".into(),
                name: "動畫".into(),
            }),
            alliance: Some(Alliance::new("816", "ANi")),
        });
        let url = s.page_url(3).unwrap();
        assert_eq!(
            url.query(),
            Some("keyword=frieren&sort_id=2&team_id=816&page=3")
        );
    }

    #[test]
    fn test_blank_keywords_are_omitted() {
        let s = session(SearchQuery::with_keywords("   "));
        assert_eq!(s.page_url(1).unwrap().query(), None);
    }

    #[test]
    fn test_session_keeps_query() {
        let s = session(SearchQuery::with_keywords("frieren"));
        assert_eq!(s.query().keywords.as_deref(), Some("frieren"));
    }

    fn ids(topics: &[Topic]) -> Vec<&str> {
        topics.iter().map(|t| t.id.as_str()).collect()
    }

    fn page(ids: &[&str]) -> Vec<Topic> {
        ids.iter()
            .map(|id| Topic::from_title(*id, format!("[ANi] Frieren - {id}")))
            .collect()
    }

    #[test]
    fn test_accept_page_advances() {
        let mut state = PageState::default();
        let fresh = state.accept_page(page(&["1", "2"])).unwrap();
        assert_eq!(ids(&fresh), ["1", "2"]);
        assert_eq!(state.next_page, 2);
        assert!(!state.exhausted);
    }

    #[test]
    fn test_overlapping_page_keeps_only_fresh_topics() {
        let mut state = PageState::default();
        state.accept_page(page(&["1", "2"]));
        let fresh = state.accept_page(page(&["2", "3"])).unwrap();
        assert_eq!(ids(&fresh), ["3"]);
        assert_eq!(state.next_page, 3);
    }

    #[test]
    fn test_repeated_page_ends_session() {
        let mut state = PageState::default();
        state.accept_page(page(&["1", "2"]));
        assert!(state.accept_page(page(&["1", "2"])).is_none());
        assert!(state.exhausted);
        assert_eq!(state.next_page, 2);
    }

    #[test]
    fn test_empty_page_ends_session() {
        let mut state = PageState::default();
        assert!(state.accept_page(Vec::new()).is_none());
        assert!(state.exhausted);
    }

    #[tokio::test]
    async fn test_exhausted_session_does_not_fetch() {
        // Nothing listens on the discard port, so any request would fail.
        let s = DmhyClient::new(Client::new())
            .with_feed_url("http://127.0.0.1:9/rss.xml")
            .start_search_session(SearchQuery::with_keywords("frieren"));
        s.state.lock().await.exhausted = true;

        assert!(matches!(s.next_page().await, Ok(None)));
        assert!(matches!(s.next_page().await, Ok(None)));
    }
}
