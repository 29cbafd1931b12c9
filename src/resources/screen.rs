//! List screen state
//!
//! A [`ListScreen`] owns the rows, search text and page-local error of one
//! resource screen. Fetches may overlap. Only the most recently started one may
//! write its result, and nothing is written after [`ListScreen::unmount`].

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use super::{ListQuery, Resource, ResourceApi};
use crate::error::{Error, Result};

/// What a screen currently shows
#[derive(Debug, Clone)]
pub struct ListView<R> {
    pub items: Vec<R>,
    pub loading: bool,
    /// Dismissible message for the last failed action
    pub error: Option<String>,
    /// Number of fetch results applied so far
    pub applied: u64,
}

impl<R> Default for ListView<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
            applied: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer fetch started or the screen was unmounted first
    Discarded,
}

struct ScreenInner<R> {
    view: Mutex<ListView<R>>,
    query: Mutex<ListQuery>,
    mounted: AtomicBool,
    generation: AtomicU64,
}

pub struct ListScreen<R: Resource> {
    api: ResourceApi<R>,
    inner: Arc<ScreenInner<R>>,
}

impl<R: Resource> Clone for ListScreen<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Resource> ListScreen<R> {
    /// Mount a screen with its initial filters. Nothing is fetched yet.
    pub fn mount(api: ResourceApi<R>, query: ListQuery) -> Self {
        debug!(screen = %R::KIND, "mount");
        Self {
            api,
            inner: Arc::new(ScreenInner {
                view: Mutex::new(ListView::default()),
                query: Mutex::new(query),
                mounted: AtomicBool::new(true),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Stop accepting results. Fetches still in flight are discarded when they land.
    pub fn unmount(&self) {
        debug!(screen = %R::KIND, "unmount");
        let _view = self.lock_view();
        self.inner.mounted.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    pub fn view(&self) -> ListView<R> {
        self.lock_view().clone()
    }

    pub fn query(&self) -> ListQuery {
        self.inner
            .query
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }

    /// Replace the search text and fetch again
    pub async fn search(&self, text: &str) -> Result<FetchOutcome> {
        if let Ok(mut query) = self.inner.query.lock() {
            *query = query.clone().search(text);
        }
        self.refresh().await
    }

    pub fn dismiss_error(&self) {
        self.lock_view().error = None;
    }

    /// Fetch the list with the current filters
    pub async fn refresh(&self) -> Result<FetchOutcome> {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let query = self.query();

        {
            let mut view = self.lock_view();
            if self.is_mounted() {
                view.loading = true;
            }
        }

        let result = self.api.list(&query).await;

        // Checked under the view lock so an unmount cannot slip in before the write
        let mut view = self.lock_view();
        if !self.is_current(generation) {
            debug!(screen = %R::KIND, generation, "discarding stale list response");
            return match result {
                Ok(_) => Ok(FetchOutcome::Discarded),
                Err(e) => Err(e),
            };
        }

        view.loading = false;
        match result {
            Ok(items) => {
                view.items = items;
                view.error = None;
                view.applied += 1;
                Ok(FetchOutcome::Applied)
            }
            Err(e) => {
                Self::record_error(&mut view, &e);
                Err(e)
            }
        }
    }

    /// Create, then refresh the list.
    ///
    /// A failed refresh does not undo the create: the record is returned and the
    /// refresh error is left on the view.
    pub async fn create(&self, draft: &R::Draft) -> Result<R> {
        let created = self.run_action(self.api.create(draft)).await?;
        self.refresh_after_action().await;
        Ok(created)
    }

    /// Update, then refresh the list
    pub async fn update(&self, id: &str, draft: &R::Draft) -> Result<R> {
        let updated = self.run_action(self.api.update(id, draft)).await?;
        self.refresh_after_action().await;
        Ok(updated)
    }

    /// Delete after the user confirmed; an unconfirmed delete does nothing
    pub async fn delete(&self, id: &str, confirmed: bool) -> Result<bool> {
        if !confirmed {
            debug!(screen = %R::KIND, id, "delete not confirmed");
            return Ok(false);
        }
        self.run_action(self.api.delete(id)).await?;
        self.refresh_after_action().await;
        Ok(true)
    }

    async fn refresh_after_action(&self) {
        if let Err(e) = self.refresh().await {
            debug!(screen = %R::KIND, "refresh after action failed: {}", e);
        }
    }

    async fn run_action<T>(&self, action: impl std::future::Future<Output = Result<T>>) -> Result<T> {
        match action.await {
            Ok(value) => Ok(value),
            Err(e) => {
                let mut view = self.lock_view();
                if self.is_mounted() {
                    Self::record_error(&mut view, &e);
                }
                Err(e)
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.is_mounted() && self.inner.generation.load(Ordering::SeqCst) == generation
    }

    // Validation errors belong to the form and 401 to the global handler
    fn record_error(view: &mut ListView<R>, error: &Error) {
        match error {
            Error::Validation(_) | Error::Unauthorized => {}
            other => view.error = Some(other.to_string()),
        }
    }

    fn lock_view(&self) -> MutexGuard<'_, ListView<R>> {
        self.inner
            .view
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
