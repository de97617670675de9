use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::{DeereClient, PaginatedResponse, RequestOptions, Result};

/// Forward-only cursor over a paginated listing.
///
/// Each [`next_page`](Self::next_page) call performs at most the fetches
/// needed to reach the next non-empty page. A failed fetch ends the
/// traversal; start over with [`DeereClient::paginate`].
pub struct Paginator<'a, T> {
    client: &'a DeereClient,
    next_url: Option<String>,
    options: RequestOptions,
    _item: PhantomData<fn() -> T>,
}

impl<'a, T: DeserializeOwned> Paginator<'a, T> {
    pub(crate) fn new(client: &'a DeereClient, url: String, options: RequestOptions) -> Self {
        Self {
            client,
            next_url: Some(url),
            options,
            _item: PhantomData,
        }
    }

    /// Returns `true` once no further pages can be fetched.
    pub fn is_done(&self) -> bool {
        self.next_url.is_none()
    }

    /// Fetches the next non-empty page, or `None` when the listing is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        while let Some(url) = self.next_url.take() {
            let page: PaginatedResponse<T> = self.client.get_url(url, &self.options).await?;
            self.next_url = page
                .next_page_link()
                .map(|link| self.client.config.resolve_url(&link.uri));

            #[cfg(feature = "tracing")]
            tracing::debug!(
                items = page.values.len(),
                has_next = self.next_url.is_some(),
                "fetched page"
            );

            if !page.values.is_empty() {
                return Ok(Some(page.values));
            }
        }
        Ok(None)
    }

    /// Drains the remaining pages into one vector, preserving order.
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await? {
            items.extend(page);
        }
        Ok(items)
    }
}
