//! Incremental loading for one list view.
//!
//! `PageState::loading` is the only mutual exclusion: it is raised before the
//! fetch starts and lowered on every exit path, including a dropped or
//! panicking fetch future.

use crate::domain::{Page, PageState};
use crate::protocol::network::ApiResult;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

struct ListInner<T> {
    state: PageState,
    items: Vec<T>,
    epoch: u64,
}

pub struct PagedList<T> {
    inner: Mutex<ListInner<T>>,
}

impl<T: Clone> PagedList<T> {
    pub fn new(page_size: u32) -> Self {
        Self {
            inner: Mutex::new(ListInner {
                state: PageState::new(page_size),
                items: Vec::new(),
                epoch: 0,
            }),
        }
    }

    pub fn state(&self) -> PageState {
        self.lock().state
    }

    pub fn items(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    pub fn is_exhausted(&self) -> bool {
        self.lock().state.exhausted
    }

    /// Back to page 0 with no items. A fetch still in flight is discarded.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.epoch += 1;
        inner.state = PageState::new(inner.state.page_size);
        inner.items.clear();
    }

    /// Fetches the next page and returns the items it appended.
    ///
    /// Returns an empty list without calling `fetch_page` when the list is
    /// exhausted or another load is in progress.
    pub async fn load_next<F, Fut>(&self, fetch_page: F) -> ApiResult<Vec<T>>
    where
        F: FnOnce(u32, u32) -> Fut,
        Fut: Future<Output = ApiResult<Page<T>>>,
    {
        let (page_index, page_size, epoch) = {
            let mut inner = self.lock();
            if inner.state.exhausted || inner.state.loading {
                trace!(
                    "Skipping load (exhausted: {}, loading: {})",
                    inner.state.exhausted,
                    inner.state.loading
                );
                return Ok(Vec::new());
            }
            inner.state.loading = true;
            (inner.state.page_index, inner.state.page_size, inner.epoch)
        };
        let guard = LoadingGuard { list: self, epoch };

        let outcome = fetch_page(page_index, page_size).await;

        let appended = {
            let mut inner = self.lock();
            match outcome {
                Ok(_) if inner.epoch != epoch => {
                    debug!("Discarding page {} fetched before reset", page_index);
                    Ok(Vec::new())
                }
                Ok(page) => {
                    inner.state.page_index += 1;
                    inner.state.exhausted = !page.has_more || page.items.is_empty();
                    inner.items.extend(page.items.iter().cloned());
                    debug!(
                        "Loaded page {} ({} items, exhausted: {})",
                        page_index,
                        page.items.len(),
                        inner.state.exhausted
                    );
                    Ok(page.items)
                }
                Err(e) => {
                    debug!("Page {} failed: {}", page_index, e);
                    Err(e)
                }
            }
        };
        drop(guard);
        appended
    }
}

impl<T> PagedList<T> {
    fn lock(&self) -> MutexGuard<'_, ListInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct LoadingGuard<'a, T> {
    list: &'a PagedList<T>,
    epoch: u64,
}

impl<T> Drop for LoadingGuard<'_, T> {
    fn drop(&mut self) {
        let mut inner = self.list.lock();
        if inner.epoch == self.epoch {
            inner.state.loading = false;
        }
    }
}
