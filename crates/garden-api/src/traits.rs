//! Trait definitions for topic search clients.
//!
//! `ApplicationState` only talks to these traits, so the feed behind a search
//! can be swapped (dmhy RSS, an in-memory fake in tests).

use std::future::Future;

use crate::error::ApiError;
use crate::model::{SearchQuery, Topic};

/// A client able to open paged searches against a topic feed.
pub trait AnimationGardenClient: Send + Sync + 'static {
    type Session: SearchSession;

    /// Open a new search. No request is made until the first page is fetched.
    fn start_search_session(&self, query: SearchQuery) -> Self::Session;
}

/// One active, paged search.
pub trait SearchSession: Send + Sync + 'static {
    /// The query this session was opened with.
    fn query(&self) -> &SearchQuery;

    /// Fetch the next page. `Ok(None)` once the search is exhausted.
    fn next_page(&self) -> impl Future<Output = Result<Option<Vec<Topic>>, ApiError>> + Send;
}
