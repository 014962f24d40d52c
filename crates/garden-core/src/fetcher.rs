//! Paging fetcher: pulls pages from a search session into a topic list.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::AbortHandle;

use garden_api::{SearchSession, Topic};

use crate::keyed::KeyedList;
use crate::scope::AppScope;

/// Progress of the most recent fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchingState {
    #[default]
    Idle,
    Fetching,
    Succeed,
    Failed(String),
}

type SuccessHook = dyn Fn() + Send + Sync;

/// Fetches pages on its own scope. Cloning yields another handle to the same fetcher.
#[derive(Clone)]
pub struct Fetcher {
    inner: Arc<Inner>,
}

struct Inner {
    scope: AppScope,
    has_more_pages: watch::Sender<bool>,
    fetching_state: watch::Sender<FetchingState>,
    running: watch::Sender<bool>,
    slot: Mutex<Slot>,
    on_fetch_succeed: Box<SuccessHook>,
}

/// The in-flight task. `generation` is bumped by every reset; a task whose
/// generation is stale must not touch any state.
struct Slot {
    generation: u64,
    task: Option<AbortHandle>,
}

enum PageOutcome {
    Appended(usize),
    Exhausted,
    Failed,
}

impl Fetcher {
    /// `on_fetch_succeed` runs after each appended page, while the fetcher
    /// is locked against resets. It must not call back into the fetcher.
    pub fn new(scope: AppScope, on_fetch_succeed: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                scope,
                has_more_pages: watch::channel(true).0,
                fetching_state: watch::channel(FetchingState::Idle).0,
                running: watch::channel(false).0,
                slot: Mutex::new(Slot {
                    generation: 0,
                    task: None,
                }),
                on_fetch_succeed: Box::new(on_fetch_succeed),
            }),
        }
    }

    pub fn has_more_pages(&self) -> bool {
        *self.inner.has_more_pages.borrow()
    }

    pub fn fetching_state(&self) -> FetchingState {
        self.inner.fetching_state.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        *self.inner.running.borrow()
    }

    pub fn subscribe_has_more_pages(&self) -> watch::Receiver<bool> {
        self.inner.has_more_pages.subscribe()
    }

    pub fn subscribe_fetching_state(&self) -> watch::Receiver<FetchingState> {
        self.inner.fetching_state.subscribe()
    }

    /// Start fetching the next page of `session` into `sink`.
    ///
    /// Returns false without doing anything when the session has no more
    /// pages or a fetch is already running. With `continuous`, keeps going
    /// until the session is exhausted or a fetch fails.
    pub fn launch_fetch_next_page<S: SearchSession>(
        &self,
        continuous: bool,
        session: Arc<S>,
        sink: KeyedList<String, Topic>,
    ) -> bool {
        let mut slot = self.inner.lock_slot();
        if !self.has_more_pages() {
            tracing::debug!("no more pages");
            return false;
        }
        if self.is_running() {
            tracing::debug!("fetch already running");
            return false;
        }

        let generation = slot.generation;
        self.inner.running.send_replace(true);
        let inner = Arc::clone(&self.inner);
        let task = self.inner.scope.spawn(async move {
            inner.run(generation, continuous, session, sink).await;
        });
        slot.task = Some(task);
        true
    }

    /// Abort the in-flight fetch and restore the initial paging state.
    pub fn reset(&self) {
        let mut slot = self.inner.lock_slot();
        slot.generation += 1;
        if let Some(task) = slot.task.take() {
            task.abort();
        }
        self.inner.running.send_replace(false);
        self.inner.has_more_pages.send_replace(true);
        self.inner.fetching_state.send_replace(FetchingState::Idle);
    }

    /// Wait until no fetch task is running.
    pub async fn wait_idle(&self) {
        let mut running = self.inner.running.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = running.wait_for(|r| !*r).await;
    }
}

impl Inner {
    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` only if no reset happened since the task started. The slot
    /// stays locked while `f` runs, so a reset waits for it.
    fn if_current<R>(&self, generation: u64, f: impl FnOnce() -> R) -> Option<R> {
        let slot = self.lock_slot();
        (slot.generation == generation).then(f)
    }

    async fn run<S: SearchSession>(
        &self,
        generation: u64,
        continuous: bool,
        session: Arc<S>,
        sink: KeyedList<String, Topic>,
    ) {
        loop {
            if self
                .if_current(generation, || {
                    self.fetching_state.send_replace(FetchingState::Fetching);
                })
                .is_none()
            {
                return;
            }

            let result = session.next_page().await;

            let outcome = self.if_current(generation, || match result {
                Ok(Some(page)) if !page.is_empty() => {
                    let count = page.len();
                    sink.append(page);
                    self.fetching_state.send_replace(FetchingState::Succeed);
                    (self.on_fetch_succeed)();
                    PageOutcome::Appended(count)
                }
                Ok(_) => {
                    self.has_more_pages.send_replace(false);
                    self.fetching_state.send_replace(FetchingState::Idle);
                    PageOutcome::Exhausted
                }
                Err(e) => {
                    tracing::warn!(error = %e, "fetch failed");
                    self.fetching_state
                        .send_replace(FetchingState::Failed(e.to_string()));
                    PageOutcome::Failed
                }
            });

            match outcome {
                None => return,
                Some(PageOutcome::Appended(count)) => {
                    tracing::debug!(count, total = sink.len(), "page fetched");
                    if !continuous {
                        break;
                    }
                }
                Some(PageOutcome::Exhausted) => {
                    tracing::debug!(total = sink.len(), "search exhausted");
                    break;
                }
                Some(PageOutcome::Failed) => break,
            }
        }

        self.if_current(generation, || {
            self.running.send_replace(false);
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::testing::{topic, FakeSession};

    fn sink() -> KeyedList<String, Topic> {
        KeyedList::new(|t: &Topic| t.id.clone())
    }

    fn fetcher() -> (Fetcher, Arc<AtomicUsize>) {
        let successes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&successes);
        let scope = AppScope::current("test").unwrap();
        let fetcher = Fetcher::new(scope, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (fetcher, successes)
    }

    #[tokio::test]
    async fn test_single_page() {
        let (fetcher, successes) = fetcher();
        let session = Arc::new(FakeSession::new(vec![
            vec![topic("1", "a"), topic("2", "b")],
            vec![topic("3", "c")],
        ]));
        let topics = sink();

        assert!(fetcher.launch_fetch_next_page(false, session.clone(), topics.clone()));
        fetcher.wait_idle().await;

        assert_eq!(topics.len(), 2);
        assert_eq!(session.calls(), 1);
        assert_eq!(fetcher.fetching_state(), FetchingState::Succeed);
        assert!(fetcher.has_more_pages());
        assert_eq!(successes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_continuous_until_exhausted() {
        let (fetcher, successes) = fetcher();
        let session = Arc::new(FakeSession::new(vec![
            vec![topic("1", "a")],
            vec![topic("2", "b"), topic("1", "a again")],
        ]));
        let topics = sink();

        fetcher.launch_fetch_next_page(true, session.clone(), topics.clone());
        fetcher.wait_idle().await;

        let ids: Vec<String> = topics.value().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, ["1", "2"]);
        assert_eq!(session.calls(), 3);
        assert!(!fetcher.has_more_pages());
        assert_eq!(fetcher.fetching_state(), FetchingState::Idle);
        assert_eq!(successes.load(Ordering::SeqCst), 2);

        // Exhausted: further launches are no-ops.
        assert!(!fetcher.launch_fetch_next_page(true, session.clone(), topics.clone()));
        assert_eq!(session.calls(), 3);
    }

    #[tokio::test]
    async fn test_failure_stops_and_reports() {
        let (fetcher, successes) = fetcher();
        let session = Arc::new(FakeSession::failing("connection reset"));
        let topics = sink();

        fetcher.launch_fetch_next_page(true, session.clone(), topics.clone());
        fetcher.wait_idle().await;

        assert!(topics.is_empty());
        assert!(matches!(fetcher.fetching_state(), FetchingState::Failed(msg) if msg.contains("connection reset")));
        assert!(fetcher.has_more_pages());
        assert_eq!(successes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_launch_while_running_is_noop() {
        let (fetcher, _) = fetcher();
        let session = Arc::new(FakeSession::new(vec![vec![topic("1", "a")]]).with_delay(Duration::from_millis(50)));
        let topics = sink();

        assert!(fetcher.launch_fetch_next_page(false, session.clone(), topics.clone()));
        assert!(!fetcher.launch_fetch_next_page(false, session.clone(), topics.clone()));
        fetcher.wait_idle().await;
        assert_eq!(session.calls(), 1);
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_page() {
        let (fetcher, _) = fetcher();
        let session = Arc::new(FakeSession::new(vec![vec![topic("1", "stale")]]).with_delay(Duration::from_millis(50)));
        let topics = sink();

        fetcher.launch_fetch_next_page(false, session, topics.clone());
        fetcher.reset();
        assert!(!fetcher.is_running());
        fetcher.wait_idle().await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(topics.is_empty());
        assert_eq!(fetcher.fetching_state(), FetchingState::Idle);
        assert!(fetcher.has_more_pages());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reset_waits_for_success_hook() {
        use std::sync::atomic::AtomicBool;

        let entered = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let fetcher = {
            let entered = Arc::clone(&entered);
            let finished = Arc::clone(&finished);
            Fetcher::new(AppScope::current("test").unwrap(), move || {
                entered.store(true, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(50));
                finished.store(true, Ordering::SeqCst);
            })
        };
        let session = Arc::new(FakeSession::new(vec![vec![topic("1", "a")]]));

        fetcher.launch_fetch_next_page(false, session, sink());
        tokio::time::timeout(Duration::from_secs(5), async {
            while !entered.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("hook never ran");

        // A reset cannot slip in between the page landing and its hook.
        fetcher.reset();
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_reset_skips_success_hook_of_stale_page() {
        let (fetcher, successes) = fetcher();
        let session = Arc::new(
            FakeSession::new(vec![vec![topic("1", "stale")]]).with_delay(Duration::from_millis(20)),
        );

        fetcher.launch_fetch_next_page(false, session, sink());
        fetcher.reset();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(successes.load(Ordering::SeqCst), 0);
    }
}
