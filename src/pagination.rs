use crate::error::{Result, StarNeighboursError};
use crate::transport::Transport;
use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

pub const PER_PAGE: u32 = 100;

/// Lazy walk over a page-numbered GitHub listing.
///
/// Pages are requested one at a time, starting at page 1, until the upstream
/// returns an empty page. Nothing is fetched until [`next_page`] is awaited,
/// and [`restart`] rewinds to page 1.
///
/// [`next_page`]: PagePaginator::next_page
/// [`restart`]: PagePaginator::restart
pub struct PagePaginator<'a, T> {
    transport: &'a dyn Transport,
    url: String,
    per_page: u32,
    next_page: u32,
    pages_requested: u32,
    exhausted: bool,
    _item: PhantomData<fn() -> T>,
}

impl<'a, T: DeserializeOwned> PagePaginator<'a, T> {
    pub fn new(transport: &'a dyn Transport, url: impl Into<String>) -> Self {
        Self::with_page_size(transport, url, PER_PAGE)
    }

    pub fn with_page_size(transport: &'a dyn Transport, url: impl Into<String>, per_page: u32) -> Self {
        PagePaginator {
            transport,
            url: url.into(),
            per_page,
            next_page: 1,
            pages_requested: 0,
            exhausted: false,
            _item: PhantomData,
        }
    }

    /// Fetch the next page, or `None` once an empty page has been seen.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        if self.exhausted {
            return Ok(None);
        }

        let query = vec![
            ("page".to_string(), self.next_page.to_string()),
            ("per_page".to_string(), self.per_page.to_string()),
        ];
        self.pages_requested += 1;
        let body = self.transport.get_json(&self.url, &query).await?;

        let entries = match body {
            serde_json::Value::Array(entries) => entries,
            other => {
                return Err(StarNeighboursError::MalformedPayload(format!(
                    "expected a JSON array from {} page {}, got {}",
                    self.url, self.next_page, other
                )));
            }
        };

        if entries.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        let items = entries
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<T>, _>>()?;

        self.next_page += 1;
        Ok(Some(items))
    }

    pub fn restart(&mut self) {
        self.next_page = 1;
        self.exhausted = false;
    }

    pub fn pages_requested(&self) -> u32 {
        self.pages_requested
    }

    /// Drive the paginator as a stream of pages.
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<T>>> + 'a
    where
        T: 'a,
    {
        stream::try_unfold(self, |mut pager| async move {
            let page = pager.next_page().await?;
            Ok::<_, StarNeighboursError>(page.map(|page| (page, pager)))
        })
    }
}
