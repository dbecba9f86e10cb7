use std::path::{Path, PathBuf};

use anyhow::Context as _;
use async_trait::async_trait;
use tokio::fs;

use crate::coordinate::{ContentCoordinate, validate_segment};
use crate::error::Result;
use crate::formats::{DocumentStructure, PageContentCreate, PageContentResponse};

/// Pages keyed by content coordinate.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// `Ok(None)` means the store has no custom content for the page.
    async fn get_page(&self, coordinate: &ContentCoordinate)
    -> Result<Option<PageContentResponse>>;

    async fn put_page(
        &self,
        coordinate: &ContentCoordinate,
        page: &PageContentCreate,
    ) -> Result<PageContentResponse>;
}

/// Per-language section tree.
#[async_trait]
pub trait StructureStore: Send + Sync {
    async fn get_structure(&self, language: &str) -> Result<Option<DocumentStructure>>;
    async fn put_structure(&self, language: &str, structure: &DocumentStructure) -> Result<()>;
}

/// One JSON file per page and one per language structure:
///
/// ```text
/// {base}/content/{language}/{section}-{subsection}.json
/// {base}/structure/{language}.json
/// ```
#[derive(Debug, Clone)]
pub struct LocalFsContentStore {
    base_dir: PathBuf,
}

impl LocalFsContentStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Reads a page by its dashed content id, the key the content API
    /// addresses pages with.
    pub async fn read_page(
        &self,
        language: &str,
        content_id: &str,
    ) -> Result<Option<PageContentResponse>> {
        let path = self.page_path(language, content_id)?;
        let stored: Option<PageContentCreate> = read_json(&path)
            .await
            .with_context(|| format!("read: {}", path.display()))?;
        Ok(stored.map(|page| PageContentResponse {
            page_content: page.page_content,
            table_of_content: page.table_of_content,
        }))
    }

    pub async fn write_page(
        &self,
        language: &str,
        content_id: &str,
        page: &PageContentCreate,
    ) -> Result<PageContentResponse> {
        let path = self.page_path(language, content_id)?;
        write_json_atomic(&path, page)
            .await
            .with_context(|| format!("write page: {}", path.display()))?;
        tracing::debug!(language, content_id, path = %path.display(), "stored page");
        Ok(PageContentResponse {
            page_content: page.page_content.clone(),
            table_of_content: page.table_of_content.clone(),
        })
    }

    fn page_path(&self, language: &str, content_id: &str) -> Result<PathBuf> {
        validate_segment("language", language)?;
        validate_segment("page", content_id)?;
        Ok(self
            .base_dir
            .join("content")
            .join(language)
            .join(format!("{content_id}.json")))
    }

    fn structure_path(&self, language: &str) -> PathBuf {
        self.base_dir
            .join("structure")
            .join(format!("{language}.json"))
    }
}

#[async_trait]
impl PageStore for LocalFsContentStore {
    async fn get_page(
        &self,
        coordinate: &ContentCoordinate,
    ) -> Result<Option<PageContentResponse>> {
        self.read_page(&coordinate.language, &coordinate.content_id())
            .await
    }

    async fn put_page(
        &self,
        coordinate: &ContentCoordinate,
        page: &PageContentCreate,
    ) -> Result<PageContentResponse> {
        self.write_page(&coordinate.language, &coordinate.content_id(), page)
            .await
    }
}

#[async_trait]
impl StructureStore for LocalFsContentStore {
    async fn get_structure(&self, language: &str) -> Result<Option<DocumentStructure>> {
        validate_segment("language", language)?;
        let path = self.structure_path(language);
        let structure = read_json(&path)
            .await
            .with_context(|| format!("read: {}", path.display()))?;
        Ok(structure)
    }

    async fn put_structure(&self, language: &str, structure: &DocumentStructure) -> Result<()> {
        validate_segment("language", language)?;
        let path = self.structure_path(language);
        write_json_atomic(&path, structure)
            .await
            .with_context(|| format!("write structure: {}", path.display()))?;
        Ok(())
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let value = serde_json::from_slice(&bytes).context("parse json")?;
    Ok(Some(value))
}

async fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("path has no parent: {}", path.display()))?;
    fs::create_dir_all(parent)
        .await
        .with_context(|| format!("create parent dir: {}", parent.display()))?;

    let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
    let data = serde_json::to_vec_pretty(value).context("serialize json")?;
    fs::write(&tmp_path, &data)
        .await
        .with_context(|| format!("write tmp: {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("rename tmp to final: {}", path.display()))?;
    Ok(())
}
