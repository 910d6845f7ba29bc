//! Registry catalog access
//!
//! The [`CatalogClient`] trait is the seam between the sync engine and the
//! registry's listing API. The production implementation is the Quay client
//! in [`quay`]; tests substitute in-memory fakes.

pub mod quay;

use crate::error::{MirrorError, Result};
use crate::reference::ImageReference;
use async_trait::async_trait;

pub use quay::QuayCatalogClient;

/// Enumerates a namespace's content and probes reference existence
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// All repository names in the source namespace, in listing order
    async fn list_repositories(&self) -> Result<Vec<String>>;

    /// All tag names of one repository, in listing order
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>>;

    /// Whether `reference` exists at the registry it names.
    ///
    /// Returns `Err` after retry exhaustion rather than a silent `false`:
    /// an errored probe must never be confused with a genuine not-found.
    async fn exists(&self, reference: &ImageReference) -> Result<bool>;
}

/// One page of a paginated listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

/// Walk a paginated listing to completion, starting at page 1.
///
/// `fetch_page` is expected to carry its own retry; any error it surfaces
/// aborts the walk and discards partial results, so a truncated catalog can
/// never be mistaken for a complete one. Pagination stops when the server
/// signals no further pages or returns an empty page.
pub async fn drain_pages<T, F, Fut>(what: &str, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<Page<T>>>,
{
    let mut all = Vec::new();
    let mut page = 1u32;

    loop {
        let fetched = fetch_page(page).await.map_err(|e| {
            MirrorError::Discovery(format!("{}: page {} failed: {}", what, page, e))
        })?;

        if fetched.items.is_empty() {
            break;
        }
        all.extend(fetched.items);

        if !fetched.has_more {
            break;
        }
        page += 1;
    }

    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(chunks: Vec<Vec<&str>>) -> Vec<Page<String>> {
        let last = chunks.len();
        chunks
            .into_iter()
            .enumerate()
            .map(|(i, items)| Page {
                items: items.into_iter().map(String::from).collect(),
                has_more: i + 1 < last,
            })
            .collect()
    }

    async fn drain(source: Vec<Page<String>>) -> Result<Vec<String>> {
        drain_pages("repositories", |page| {
            let fetched = source
                .get((page - 1) as usize)
                .cloned()
                .unwrap_or(Page {
                    items: vec![],
                    has_more: false,
                });
            async move { Ok(fetched) }
        })
        .await
    }

    #[tokio::test]
    async fn test_single_page() {
        let items = drain(pages(vec![vec!["a", "b"]])).await.unwrap();
        assert_eq!(items, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_multiple_pages_no_duplicates_no_omissions() {
        let items = drain(pages(vec![vec!["a", "b"], vec!["c"], vec!["d", "e"]]))
            .await
            .unwrap();
        assert_eq!(items, vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_page_size_one() {
        let items = drain(pages(vec![vec!["a"], vec!["b"], vec!["c"]]))
            .await
            .unwrap();
        assert_eq!(items, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let items = drain(vec![Page {
            items: vec![],
            has_more: false,
        }])
        .await
        .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_empty_page_ends_walk_even_with_has_more() {
        // Defends against servers that keep claiming more pages forever
        let items = drain(vec![
            Page {
                items: vec!["a".to_string()],
                has_more: true,
            },
            Page {
                items: vec![],
                has_more: true,
            },
        ])
        .await
        .unwrap();
        assert_eq!(items, vec!["a"]);
    }

    #[tokio::test]
    async fn test_mid_walk_failure_discards_partials() {
        let result = drain_pages("repositories", |page| async move {
            if page == 1 {
                Ok(Page {
                    items: vec!["a".to_string()],
                    has_more: true,
                })
            } else {
                Err(MirrorError::Network("connection reset".into()))
            }
        })
        .await;

        match result {
            Err(MirrorError::Discovery(msg)) => assert!(msg.contains("page 2")),
            other => panic!("expected Discovery error, got {:?}", other),
        }
    }
}
