use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::PortalConfig;
use crate::coordinate::{ContentCoordinate, PathStyle};
use crate::error::{PortalError, Result};
use crate::formats::{
    AddSectionRequest, AddSubsectionRequest, DocumentStructure, PageContentCreate,
    PageContentResponse, WebContentRequest, WebContentResponse,
};
use crate::store::PageStore;

/// Client for the content REST API.
#[derive(Debug, Clone)]
pub struct ContentClient {
    http: reqwest::Client,
    base_url: String,
    path_style: PathStyle,
}

impl ContentClient {
    pub fn new(base_url: &Url, path_style: PathStyle) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.as_str().trim_end_matches('/').to_owned(),
            path_style,
        }
    }

    pub fn from_config(config: &PortalConfig) -> Self {
        Self::new(&config.api_base_url, config.path_style)
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `Ok(None)` on 404: the page has no custom content.
    pub async fn get_page(
        &self,
        coordinate: &ContentCoordinate,
    ) -> Result<Option<PageContentResponse>> {
        let endpoint = self.endpoint(&coordinate.api_path(self.path_style));
        let response = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|source| transport(&endpoint, source))?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(coordinate = %coordinate, "no custom content");
            return Ok(None);
        }
        read_json(&endpoint, response).await.map(Some)
    }

    pub async fn save_page(
        &self,
        coordinate: &ContentCoordinate,
        page: &PageContentCreate,
    ) -> Result<PageContentResponse> {
        let endpoint = self.endpoint(&coordinate.api_path(self.path_style));
        let response = self
            .http
            .post(&endpoint)
            .json(page)
            .send()
            .await
            .map_err(|source| transport(&endpoint, source))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|source| transport(&endpoint, source))?;
        if !status.is_success() {
            return Err(http_error(&endpoint, status, &raw));
        }

        // Some deployments answer with an empty body.
        if raw.trim().is_empty() {
            return Ok(PageContentResponse {
                page_content: page.page_content.clone(),
                table_of_content: page.table_of_content.clone(),
            });
        }
        parse_body(&endpoint, &raw)
    }

    pub async fn get_structure(&self, language: &str) -> Result<DocumentStructure> {
        let endpoint = self.endpoint(&format!("content/structure/{language}"));
        let response = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|source| transport(&endpoint, source))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(PortalError::NotFound(format!("structure for {language}")));
        }
        read_json(&endpoint, response).await
    }

    pub async fn add_section(
        &self,
        language: &str,
        request: &AddSectionRequest,
    ) -> Result<DocumentStructure> {
        self.post_json(&format!("content/structure/{language}/section"), request)
            .await
    }

    pub async fn add_subsection(
        &self,
        language: &str,
        request: &AddSubsectionRequest,
    ) -> Result<DocumentStructure> {
        self.post_json(&format!("content/structure/{language}/subsection"), request)
            .await
    }

    pub async fn add_web_content(&self, request: &WebContentRequest) -> Result<WebContentResponse> {
        self.post_json("webContent/add", request).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let endpoint = self.endpoint(path);
        let response = self
            .http
            .post(&endpoint)
            .json(body)
            .send()
            .await
            .map_err(|source| transport(&endpoint, source))?;
        read_json(&endpoint, response).await
    }
}

#[async_trait]
impl PageStore for ContentClient {
    async fn get_page(
        &self,
        coordinate: &ContentCoordinate,
    ) -> Result<Option<PageContentResponse>> {
        ContentClient::get_page(self, coordinate).await
    }

    async fn put_page(
        &self,
        coordinate: &ContentCoordinate,
        page: &PageContentCreate,
    ) -> Result<PageContentResponse> {
        self.save_page(coordinate, page).await
    }
}

async fn read_json<T: DeserializeOwned>(endpoint: &str, response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let raw = response
        .text()
        .await
        .map_err(|source| transport(endpoint, source))?;
    if !status.is_success() {
        return Err(http_error(endpoint, status, &raw));
    }
    parse_body(endpoint, &raw)
}

fn parse_body<T: DeserializeOwned>(endpoint: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|err| PortalError::Http {
        endpoint: endpoint.to_owned(),
        status: StatusCode::OK,
        detail: format!("unexpected response body: {err}"),
    })
}

fn transport(endpoint: &str, source: reqwest::Error) -> PortalError {
    PortalError::Transport {
        endpoint: endpoint.to_owned(),
        source,
    }
}

fn http_error(endpoint: &str, status: StatusCode, raw: &str) -> PortalError {
    let detail = parse_error_detail(raw).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_owned()
    });
    PortalError::Http {
        endpoint: endpoint.to_owned(),
        status,
        detail,
    }
}

/// `{"detail": "..."}` error bodies.
fn parse_error_detail(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) => Some(detail.clone()),
        other => Some(other.to_string()),
    }
}
