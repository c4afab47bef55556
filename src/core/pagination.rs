//! `@odata.nextLink` page iteration.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::errors::GraphResult;

/// One page of a Graph collection.
#[derive(Debug, Clone, Deserialize)]
pub struct ODataPage<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

impl<T> ODataPage<T> {
    pub fn new(value: Vec<T>, next_link: Option<String>) -> Self {
        Self { value, next_link }
    }
}

/// Fetches a continuation page from an absolute link.
#[async_trait]
pub trait PageFetcher<T>: Send + Sync {
    async fn fetch_page(&self, link: &str) -> GraphResult<ODataPage<T>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorState {
    /// The callback asked to stop; pages may remain.
    Paused,
    /// Every page was visited.
    Complete,
}

pub struct PageIterator<'a, T, F: ?Sized> {
    fetcher: &'a F,
    page: ODataPage<T>,
}

impl<'a, T, F> PageIterator<'a, T, F>
where
    T: Send,
    F: PageFetcher<T> + ?Sized,
{
    pub fn new(fetcher: &'a F, first_page: ODataPage<T>) -> Self {
        Self {
            fetcher,
            page: first_page,
        }
    }

    /// Visits items in arrival order until `on_item` returns `false` or no
    /// further page exists.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while fetching a continuation page.
    pub async fn iterate<C>(&mut self, mut on_item: C) -> GraphResult<IteratorState>
    where
        C: FnMut(T) -> bool + Send,
    {
        loop {
            let mut items = std::mem::take(&mut self.page.value).into_iter();
            while let Some(item) = items.next() {
                if !on_item(item) {
                    self.page.value = items.collect();
                    return Ok(IteratorState::Paused);
                }
            }

            let Some(link) = self.page.next_link.take() else {
                return Ok(IteratorState::Complete);
            };
            debug!("Fetching next page: {}", link);
            self.page = self.fetcher.fetch_page(&link).await?;
        }
    }

    /// Drains every page into one ordered list.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while fetching a continuation page.
    pub async fn collect_all(mut self) -> GraphResult<Vec<T>> {
        let mut all = Vec::new();
        self.iterate(|item| {
            all.push(item);
            true
        })
        .await?;
        Ok(all)
    }
}
