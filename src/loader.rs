use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_FETCH_TIMEOUT;
use crate::coordinate::ContentCoordinate;
use crate::defaults::DefaultCatalog;
use crate::error::{PortalError, Result};
use crate::formats::{PageContentCreate, TableOfContentData};
use crate::store::PageStore;
use crate::toc::{TocOptions, parse_headings_with};

/// Where the displayed content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentOrigin {
    /// Content and TOC both as stored remotely.
    Stored,
    /// Stored content, TOC derived locally.
    Derived,
    /// Local default content.
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient message for the user. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    fn error(description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: "Error".to_owned(),
            description: description.into(),
        }
    }

    fn success(description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: "Success".to_owned(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedPage {
    pub coordinate: ContentCoordinate,
    pub content: String,
    pub table_of_content: TableOfContentData,
    pub origin: ContentOrigin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

/// Loads and saves pages, keeping each page's TOC in step with its markdown.
pub struct ContentLoader {
    store: Arc<dyn PageStore>,
    catalog: DefaultCatalog,
    timeout: Duration,
    toc_options: TocOptions,
}

impl ContentLoader {
    pub fn new(store: Arc<dyn PageStore>, catalog: DefaultCatalog) -> Self {
        Self {
            store,
            catalog,
            timeout: DEFAULT_FETCH_TIMEOUT,
            toc_options: TocOptions::default(),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_toc_options(mut self, toc_options: TocOptions) -> Self {
        self.toc_options = toc_options;
        self
    }

    pub async fn load(&self, coordinate: &ContentCoordinate) -> LoadedPage {
        self.load_cancellable(coordinate, &CancellationToken::new()).await
    }

    /// Races the fetch against the timeout and `cancel`. Whichever loses is
    /// dropped, so a late response never lands.
    pub async fn load_cancellable(
        &self,
        coordinate: &ContentCoordinate,
        cancel: &CancellationToken,
    ) -> LoadedPage {
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PortalError::Cancelled),
            res = self.store.get_page(coordinate) => res,
            _ = tokio::time::sleep(self.timeout) => Err(PortalError::Timeout(self.timeout)),
        };

        match fetched {
            Ok(Some(page)) if !page.page_content.trim().is_empty() => {
                let (table_of_content, origin) = match page.table_of_content {
                    Some(stored) => (stored, ContentOrigin::Stored),
                    None => (
                        parse_headings_with(&page.page_content, &self.toc_options),
                        ContentOrigin::Derived,
                    ),
                };
                tracing::info!(coordinate = %coordinate, ?origin, "loaded page");
                LoadedPage {
                    coordinate: coordinate.clone(),
                    content: page.page_content,
                    table_of_content,
                    origin,
                    notice: None,
                }
            }
            Ok(_) => {
                tracing::info!(coordinate = %coordinate, "no custom content; using default");
                self.fallback(coordinate, None)
            }
            Err(err) => {
                tracing::warn!(coordinate = %coordinate, %err, "fetch failed; using default");
                self.fallback(coordinate, Some(Notice::error("Failed to fetch content")))
            }
        }
    }

    /// Validates `markdown`, derives its TOC and stores both.
    pub async fn save(
        &self,
        coordinate: &ContentCoordinate,
        markdown: &str,
    ) -> Result<LoadedPage> {
        validate_markdown(markdown)?;

        let table_of_content = parse_headings_with(markdown, &self.toc_options);
        let page = PageContentCreate {
            page_content: markdown.to_owned(),
            page_url: coordinate.page_url(),
            table_of_content: Some(table_of_content.clone()),
        };

        self.store.put_page(coordinate, &page).await.inspect_err(|err| {
            tracing::error!(coordinate = %coordinate, %err, "save failed");
        })?;
        tracing::info!(
            coordinate = %coordinate,
            headings = table_of_content.headers.len(),
            "saved page"
        );

        Ok(LoadedPage {
            coordinate: coordinate.clone(),
            content: page.page_content,
            table_of_content,
            origin: ContentOrigin::Derived,
            notice: Some(Notice::success("Content saved successfully")),
        })
    }

    fn fallback(&self, coordinate: &ContentCoordinate, notice: Option<Notice>) -> LoadedPage {
        let content = self.catalog.default_markdown(coordinate);
        let table_of_content = parse_headings_with(&content, &self.toc_options);
        LoadedPage {
            coordinate: coordinate.clone(),
            content,
            table_of_content,
            origin: ContentOrigin::Default,
            notice,
        }
    }
}

/// Rejects markdown that cannot be saved.
pub fn validate_markdown(markdown: &str) -> Result<()> {
    if markdown.trim().is_empty() {
        return Err(PortalError::Validation("markdown is empty".to_owned()));
    }
    if markdown.contains('\0') {
        return Err(PortalError::Validation(
            "markdown contains a NUL character".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::formats::PageContentResponse;
    use crate::toc::parse_headings;

    #[derive(Default)]
    struct MemoryStore {
        pages: Mutex<HashMap<String, PageContentResponse>>,
    }

    #[async_trait]
    impl PageStore for MemoryStore {
        async fn get_page(
            &self,
            coordinate: &ContentCoordinate,
        ) -> Result<Option<PageContentResponse>> {
            Ok(self
                .pages
                .lock()
                .expect("lock")
                .get(&coordinate.to_string())
                .cloned())
        }

        async fn put_page(
            &self,
            coordinate: &ContentCoordinate,
            page: &PageContentCreate,
        ) -> Result<PageContentResponse> {
            let stored = PageContentResponse {
                page_content: page.page_content.clone(),
                table_of_content: page.table_of_content.clone(),
            };
            self.pages
                .lock()
                .expect("lock")
                .insert(coordinate.to_string(), stored.clone());
            Ok(stored)
        }
    }

    /// Never answers.
    struct HangingStore;

    #[async_trait]
    impl PageStore for HangingStore {
        async fn get_page(&self, _: &ContentCoordinate) -> Result<Option<PageContentResponse>> {
            std::future::pending().await
        }

        async fn put_page(
            &self,
            _: &ContentCoordinate,
            _: &PageContentCreate,
        ) -> Result<PageContentResponse> {
            std::future::pending().await
        }
    }

    struct FailingStore;

    #[async_trait]
    impl PageStore for FailingStore {
        async fn get_page(&self, _: &ContentCoordinate) -> Result<Option<PageContentResponse>> {
            Err(PortalError::Store(anyhow::anyhow!("disk on fire")))
        }

        async fn put_page(
            &self,
            _: &ContentCoordinate,
            _: &PageContentCreate,
        ) -> Result<PageContentResponse> {
            Err(PortalError::Store(anyhow::anyhow!("disk on fire")))
        }
    }

    fn coord() -> ContentCoordinate {
        ContentCoordinate::new("en", "invoices", "creating-invoices").expect("valid coordinate")
    }

    fn loader(store: Arc<dyn PageStore>) -> ContentLoader {
        ContentLoader::new(store, DefaultCatalog::builtin().clone())
            .with_timeout(Duration::from_millis(50))
    }

    #[tokio::test]
    async fn save_then_load_returns_same_markdown_and_derived_toc() -> anyhow::Result<()> {
        let loader = loader(Arc::new(MemoryStore::default()));
        let markdown = "# Creating Invoices\n## Line items\n### Taxes\n## Sending\n";

        loader.save(&coord(), markdown).await?;
        let page = loader.load(&coord()).await;

        assert_eq!(page.content, markdown);
        assert_eq!(page.table_of_content, parse_headings(markdown));
        assert_eq!(page.origin, ContentOrigin::Stored);
        assert!(page.notice.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn stored_toc_is_trusted_as_is() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::default());
        let stale = parse_headings("# Old title\n");
        store
            .put_page(
                &coord(),
                &PageContentCreate {
                    page_content: "# New title\n".to_owned(),
                    page_url: coord().page_url(),
                    table_of_content: Some(stale.clone()),
                },
            )
            .await?;

        let page = loader(store).load(&coord()).await;
        assert_eq!(page.table_of_content, stale);
        assert_eq!(page.origin, ContentOrigin::Stored);
        Ok(())
    }

    #[tokio::test]
    async fn missing_stored_toc_is_derived() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::default());
        store
            .put_page(
                &coord(),
                &PageContentCreate {
                    page_content: "# Title\n## Part\n".to_owned(),
                    page_url: coord().page_url(),
                    table_of_content: None,
                },
            )
            .await?;

        let page = loader(store).load(&coord()).await;
        assert_eq!(page.origin, ContentOrigin::Derived);
        assert_eq!(page.table_of_content.structure["title"].children, vec!["part"]);
        Ok(())
    }

    #[tokio::test]
    async fn missing_page_falls_back_to_default_without_notice() {
        let page = loader(Arc::new(MemoryStore::default())).load(&coord()).await;
        assert_eq!(page.origin, ContentOrigin::Default);
        assert_eq!(page.content, DefaultCatalog::builtin().default_markdown(&coord()));
        assert_eq!(page.table_of_content.headers[0].id, "creating-invoices");
        assert!(page.notice.is_none());
    }

    #[tokio::test]
    async fn timeout_falls_back_to_default_with_notice() {
        let started = std::time::Instant::now();
        let page = loader(Arc::new(HangingStore)).load(&coord()).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(page.origin, ContentOrigin::Default);
        assert_eq!(
            page.content,
            "# Creating Invoices\n\nStep by step guide to create invoices\n"
        );
        assert!(!page.table_of_content.is_empty());
        assert_eq!(page.notice.map(|n| n.level), Some(NoticeLevel::Error));
    }

    #[tokio::test]
    async fn cancelled_load_falls_back_immediately() {
        let loader = ContentLoader::new(Arc::new(HangingStore), DefaultCatalog::builtin().clone())
            .with_timeout(Duration::from_secs(3600));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let page = loader.load_cancellable(&coord(), &cancel).await;
        assert_eq!(page.origin, ContentOrigin::Default);
        assert!(page.notice.is_some());
    }

    #[tokio::test]
    async fn store_failure_falls_back_with_notice() {
        let page = loader(Arc::new(FailingStore)).load(&coord()).await;
        assert_eq!(page.origin, ContentOrigin::Default);
        assert!(page.notice.is_some());
    }

    #[tokio::test]
    async fn save_rejects_empty_markdown() {
        let loader = loader(Arc::new(MemoryStore::default()));
        let err = loader.save(&coord(), "  \n\t").await.unwrap_err();
        assert!(matches!(err, PortalError::Validation(_)));
    }

    #[tokio::test]
    async fn save_propagates_store_errors() {
        let err = loader(Arc::new(FailingStore))
            .save(&coord(), "# Fine\n")
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Store(_)));
    }
}
