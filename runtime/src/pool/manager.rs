//! Pool of open pages for one run.
//!
//! Bounds how many pages are open at once and guarantees every acquired page
//! is closed through [`PagePool::release`] or [`PagePool::with_page`].

use crate::renderer::{RenderContext, Renderer};
use anyhow::Result;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::warn;

/// Handle to a page borrowed from the pool.
pub struct PageHandle {
    context: Option<Box<dyn RenderContext>>,
    _permit: tokio::sync::OwnedSemaphorePermit,
    active_count: Arc<AtomicUsize>,
}

impl PageHandle {
    /// Get a mutable reference to the page.
    pub fn context_mut(&mut self) -> Option<&mut (dyn RenderContext + 'static)> {
        self.context.as_deref_mut()
    }

    /// Take the page out of the handle (for passing to close).
    fn take(mut self) -> Option<Box<dyn RenderContext>> {
        self.context.take()
    }
}

impl Drop for PageHandle {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Boxed future borrowing the page for the duration of one job.
pub type PageJob<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Hands out pages of one renderer with a concurrency limit.
pub struct PagePool {
    renderer: Arc<dyn Renderer>,
    semaphore: Arc<Semaphore>,
    max_pages: usize,
    active_count: Arc<AtomicUsize>,
}

impl PagePool {
    /// Create a new pool allowing `max_pages` open pages at once.
    pub fn new(renderer: Arc<dyn Renderer>, max_pages: usize) -> Self {
        let max_pages = max_pages.max(1);
        Self {
            renderer,
            semaphore: Arc::new(Semaphore::new(max_pages)),
            max_pages,
            active_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Open a page, waiting while `max_pages` pages are already open.
    pub async fn acquire(&self) -> Result<PageHandle> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| anyhow::anyhow!("semaphore closed: {}", e))?;

        let context = self.renderer.new_context().await?;
        self.active_count.fetch_add(1, Ordering::SeqCst);

        Ok(PageHandle {
            context: Some(context),
            _permit: permit,
            active_count: Arc::clone(&self.active_count),
        })
    }

    /// Close the page and return its slot to the pool.
    pub async fn release(&self, handle: PageHandle) -> Result<()> {
        match handle.take() {
            Some(context) => context.close().await,
            None => Ok(()),
        }
    }

    /// Run `job` on a freshly opened page and close the page afterwards,
    /// whatever the job returned. A failed close is logged, not returned.
    ///
    /// The job's future may only borrow the page; move anything else it
    /// needs into the closure.
    pub async fn with_page<T, F>(&self, job: F) -> Result<T>
    where
        F: for<'p> FnOnce(&'p mut (dyn RenderContext + 'static)) -> PageJob<'p, Result<T>>,
    {
        let mut handle = self.acquire().await?;
        let result = match handle.context_mut() {
            Some(page) => job(page).await,
            None => Err(anyhow::anyhow!("page handle is empty")),
        };
        if let Err(e) = self.release(handle).await {
            warn!("failed to close page: {e:#}");
        }
        result
    }

    /// Number of currently open pages.
    pub fn active(&self) -> usize {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Maximum allowed concurrent pages.
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }
}
