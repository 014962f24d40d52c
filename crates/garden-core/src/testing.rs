//! In-memory search client for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use garden_api::{AnimationGardenClient, ApiError, SearchQuery, SearchSession, Topic};

pub fn topic(id: &str, title: &str) -> Topic {
    Topic::from_title(id, title)
}

pub struct FakeSession {
    query: SearchQuery,
    pages: Mutex<VecDeque<Vec<Topic>>>,
    error: Option<String>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl FakeSession {
    pub fn new(pages: Vec<Vec<Topic>>) -> Self {
        Self {
            query: SearchQuery::default(),
            pages: Mutex::new(pages.into()),
            error: None,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SearchSession for FakeSession {
    fn query(&self) -> &SearchQuery {
        &self.query
    }

    async fn next_page(&self) -> Result<Option<Vec<Topic>>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.error {
            return Err(ApiError::Feed(message.clone()));
        }
        Ok(self.pages.lock().unwrap().pop_front())
    }
}

/// Serves fixed pages per keyword string. Unknown keywords yield no pages.
#[derive(Default)]
pub struct FakeClient {
    pages: HashMap<String, Vec<Vec<Topic>>>,
    delay: Option<Duration>,
    opened: Arc<Mutex<Vec<(SearchQuery, Arc<AtomicUsize>)>>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(mut self, keywords: &str, pages: Vec<Vec<Topic>>) -> Self {
        self.pages.insert(keywords.to_string(), pages);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queries of every session opened so far, oldest first.
    pub fn opened_queries(&self) -> Vec<SearchQuery> {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .map(|(q, _)| q.clone())
            .collect()
    }

    /// Total page requests made by sessions opened for `keywords`.
    pub fn page_requests(&self, keywords: Option<&str>) -> usize {
        self.opened
            .lock()
            .unwrap()
            .iter()
            .filter(|(q, _)| q.keywords.as_deref() == keywords)
            .map(|(_, calls)| calls.load(Ordering::SeqCst))
            .sum()
    }
}

impl AnimationGardenClient for FakeClient {
    type Session = FakeSession;

    fn start_search_session(&self, query: SearchQuery) -> FakeSession {
        let pages = query
            .keywords
            .as_deref()
            .and_then(|k| self.pages.get(k))
            .cloned()
            .unwrap_or_default();
        let session = FakeSession {
            query: query.clone(),
            pages: Mutex::new(pages.into()),
            error: None,
            delay: self.delay,
            calls: Arc::new(AtomicUsize::new(0)),
        };
        self.opened
            .lock()
            .unwrap()
            .push((query, Arc::clone(&session.calls)));
        session
    }
}
