//! The application state: current search, its results, and starred searches.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tokio::sync::watch;

use garden_api::{AnimationGardenClient, Episode, SearchQuery, Topic};

use crate::error::GardenError;
use crate::fetcher::{Fetcher, FetchingState};
use crate::keyed::KeyedList;
use crate::models::{AppData, StarredAnime};
use crate::organized::{update_starred_anime, OrganizedViewState};
use crate::saver::AppDataSaver;
use crate::scope::AppScope;

/// Everything a front end needs: the current search and its results, the
/// paging fetcher, the organized view and the user's saved data.
///
/// Must be created inside a tokio runtime. Dropping it cancels every task
/// it spawned.
pub struct ApplicationState<C: AnimationGardenClient> {
    scope: AppScope,
    search_query: watch::Sender<SearchQuery>,
    topics: KeyedList<String, Topic>,
    client: RwLock<Arc<C>>,
    session: Mutex<Arc<C::Session>>,
    organized_view: Arc<OrganizedViewState>,
    saver: Arc<AppDataSaver>,
    fetcher: Fetcher,
}

impl<C: AnimationGardenClient> ApplicationState<C> {
    /// Create the state and eagerly load `<working_dir>/data/app.yml`.
    pub fn new(client: C, working_dir: &Path) -> Result<Self, GardenError> {
        let scope = AppScope::current("application")?;

        let data_dir = working_dir.join("data");
        std::fs::create_dir_all(&data_dir)?;
        let saver = Arc::new(AppDataSaver::new(data_dir.join("app.yml")));
        saver.reload()?;

        let (search_query, _) = watch::channel(SearchQuery::default());
        let organized_view = Arc::new(OrganizedViewState::new());

        let fetcher = {
            let query = search_query.subscribe();
            let saver = Arc::clone(&saver);
            let view = Arc::clone(&organized_view);
            Fetcher::new(scope.child("fetcher"), move || {
                // Remember the user's format choices for a starred search.
                let keywords = query.borrow().keywords.clone();
                if let Some(keywords) = keywords {
                    if update_starred_anime(&saver.data().starred_anime, &keywords, &view) {
                        if let Err(e) = saver.save() {
                            tracing::warn!(error = %e, "failed to save app data");
                        }
                    }
                }
            })
        };

        let client = Arc::new(client);
        let session = Arc::new(client.start_search_session(SearchQuery::default()));

        Ok(Self {
            scope,
            search_query,
            topics: KeyedList::new(|t: &Topic| t.id.clone()),
            client: RwLock::new(client),
            session: Mutex::new(session),
            organized_view,
            saver,
            fetcher,
        })
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn scope(&self) -> &AppScope {
        &self.scope
    }

    pub fn data(&self) -> &AppData {
        self.saver.data()
    }

    pub fn saver(&self) -> &AppDataSaver {
        &self.saver
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn organized_view(&self) -> &OrganizedViewState {
        &self.organized_view
    }

    pub fn topics(&self) -> &KeyedList<String, Topic> {
        &self.topics
    }

    pub fn client(&self) -> Arc<C> {
        Arc::clone(&self.client.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the client. The next search opens its session on it.
    pub fn set_client(&self, client: C) {
        *self.client.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(client);
    }

    pub fn session(&self) -> Arc<C::Session> {
        Arc::clone(&self.lock_session())
    }

    pub fn search_query(&self) -> SearchQuery {
        self.search_query.borrow().clone()
    }

    pub fn current_keywords(&self) -> Option<String> {
        self.search_query.borrow().keywords.clone()
    }

    pub fn subscribe_search_query(&self) -> watch::Receiver<SearchQuery> {
        self.search_query.subscribe()
    }

    pub fn subscribe_topics(&self) -> watch::Receiver<Vec<Topic>> {
        self.topics.subscribe()
    }

    pub fn subscribe_starred_anime(&self) -> watch::Receiver<Vec<StarredAnime>> {
        self.data().starred_anime.subscribe()
    }

    pub fn subscribe_fetching_state(&self) -> watch::Receiver<FetchingState> {
        self.fetcher.subscribe_fetching_state()
    }

    pub fn subscribe_has_more_pages(&self) -> watch::Receiver<bool> {
        self.fetcher.subscribe_has_more_pages()
    }

    fn lock_session(&self) -> MutexGuard<'_, Arc<C::Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Searching ───────────────────────────────────────────────────

    /// Start a new search: reset paging, clear results, open a session and
    /// fetch. Paging continues automatically only for non-blank keywords.
    pub fn update_search_query(&self, query: SearchQuery) {
        let continuous = !query.is_blank();
        self.replace_search_query(query);
        self.launch_fetch_next_page(continuous);
    }

    /// Switch to `query` without fetching anything.
    pub fn replace_search_query(&self, query: SearchQuery) {
        tracing::info!(keywords = ?query.keywords, "search query changed");
        self.fetcher.reset();
        self.search_query.send_replace(query.clone());
        self.topics.clear();
        let session = Arc::new(self.client().start_search_session(query));
        *self.lock_session() = session;
    }

    /// Fetch the next page of the current session into the results.
    pub fn launch_fetch_next_page(&self, continuous: bool) -> bool {
        self.fetcher
            .launch_fetch_next_page(continuous, self.session(), self.topics.clone())
    }

    /// Search for trimmed `keywords` with no category or alliance filter.
    pub fn do_search(&self, keywords: Option<&str>) {
        self.update_search_query(SearchQuery {
            keywords: keywords.map(|k| k.trim().to_string()),
            category: None,
            alliance: None,
        });
    }

    // ── Starred anime ───────────────────────────────────────────────

    /// The starred record for exactly the current keywords.
    pub fn current_starred_anime(&self) -> Option<StarredAnime> {
        self.data().find_starred(self.current_keywords().as_deref())
    }

    pub fn is_episode_watched(&self, episode: &Episode) -> bool {
        self.current_starred_anime()
            .is_some_and(|anime| anime.is_watched(episode))
    }

    /// Mark `episode` watched on the starred record for the current keywords.
    /// Returns false (and changes nothing) when the search is not starred.
    pub fn on_episode_downloaded(&self, episode: Episode) -> Result<bool, GardenError> {
        let Some(keywords) = self.current_keywords() else {
            return Ok(false);
        };
        let added = self
            .data()
            .starred_anime
            .update(&keywords, |anime| anime.mark_watched(episode.clone()));

        match added {
            None => Ok(false),
            Some(false) => Ok(true),
            Some(true) => {
                tracing::info!(%keywords, %episode, "episode marked watched");
                self.saver.save()?;
                Ok(true)
            }
        }
    }

    /// Star the current search, seeding preferences from the view selection.
    /// An already starred search is returned unchanged.
    pub fn star_current(&self, display_name: Option<String>) -> Result<StarredAnime, GardenError> {
        let query = self.search_query();
        let Some(keywords) = query.keywords.filter(|k| !k.trim().is_empty()) else {
            return Err(GardenError::InvalidInput("cannot star an empty search".into()));
        };
        if let Some(existing) = self.data().find_starred(Some(&keywords)) {
            return Ok(existing);
        }

        let selection = self.organized_view.selection();
        let mut anime = StarredAnime::new(
            keywords.clone(),
            display_name.unwrap_or_else(|| keywords.clone()),
        );
        anime.preferred_alliance = selection.alliance;
        anime.preferred_resolution = selection.resolution;
        anime.preferred_subtitle_language = selection.subtitle_language;

        self.data().starred_anime.upsert(anime.clone());
        tracing::info!(%keywords, "search starred");
        self.saver.save()?;
        Ok(anime)
    }

    /// Remove the starred record for the current keywords.
    pub fn unstar_current(&self) -> Result<Option<StarredAnime>, GardenError> {
        let Some(keywords) = self.current_keywords() else {
            return Ok(None);
        };
        let removed = self.data().starred_anime.remove(&keywords);
        if removed.is_some() {
            tracing::info!(%keywords, "search unstarred");
            self.saver.save()?;
        }
        Ok(removed)
    }

    // ── Organized view ──────────────────────────────────────────────

    /// Load the current starred record's preferences into the view and
    /// republish the current topics.
    pub fn sync_organized_view(&self) {
        sync_view(
            &self.organized_view,
            self.data(),
            &self.topics,
            self.current_keywords(),
        );
    }

    /// Keep the organized view in sync whenever the query, the topics or
    /// the starred list change.
    pub fn launch_view_sync(&self) {
        let mut query = self.search_query.subscribe();
        let mut topics_rx = self.topics.subscribe();
        let mut starred_rx = self.data().starred_anime.subscribe();
        let view = Arc::clone(&self.organized_view);
        let data = self.data().clone();
        let topics = self.topics.clone();

        self.scope.spawn_fallible(async move {
            loop {
                let keywords = query.borrow_and_update().keywords.clone();
                topics_rx.borrow_and_update();
                starred_rx.borrow_and_update();
                sync_view(&view, &data, &topics, keywords);

                let changed = tokio::select! {
                    r = query.changed() => r,
                    r = topics_rx.changed() => r,
                    r = starred_rx.changed() => r,
                };
                if changed.is_err() {
                    return Err::<(), _>(GardenError::Runtime("view sync source closed".into()));
                }
            }
        });
    }
}

impl<C: AnimationGardenClient> Drop for ApplicationState<C> {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}

fn sync_view(
    view: &OrganizedViewState,
    data: &AppData,
    topics: &KeyedList<String, Topic>,
    keywords: Option<String>,
) {
    let starred = data.find_starred(keywords.as_deref());
    view.apply_preferences(starred.as_ref());
    view.set_topics(topics.value(), keywords);
}
