//! Content API and rendered documentation pages.
//!
//! ```text
//! GET  /health
//! GET  /docs/{language}/{section}/{subsection}          rendered HTML
//! GET  /api/v1/content/{language}/{section}-{subsection}
//! POST /api/v1/content/{language}/{section}-{subsection}
//! GET  /api/v1/content/{language}/{section}/{subsection}
//! POST /api/v1/content/{language}/{section}/{subsection}
//! GET  /api/v1/content/structure/{language}
//! POST /api/v1/content/structure/{language}/section
//! POST /api/v1/content/structure/{language}/subsection
//! POST /api/v1/webContent/add
//! ```
//!
//! Both page path styles address the same stored document. Errors answer
//! with `{"detail": "..."}`.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde_json::json;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::coordinate::ContentCoordinate;
use crate::defaults::DefaultCatalog;
use crate::error::PortalError;
use crate::formats::{
    AddSectionRequest, AddSubsectionRequest, DocumentStructure, PageContentCreate,
    PageContentResponse, WebContentRequest, WebContentResponse,
};
use crate::loader::{ContentLoader, validate_markdown};
use crate::render::{
    render_markdown_with_toc, render_page_html, render_sidebar_html, render_toc_html,
};
use crate::slug::import_id;
use crate::store::{LocalFsContentStore, StructureStore};
use crate::structure;
use crate::toc::{HeadingStrategy, TocOptions, parse_headings_with};

/// Language web imports are filed under.
const IMPORT_LANGUAGE: &str = "en";

#[derive(Clone)]
pub struct AppState {
    store: Arc<LocalFsContentStore>,
    loader: Arc<ContentLoader>,
    catalog: Arc<DefaultCatalog>,
    // Serialises read-modify-write of structure files.
    structure_lock: Arc<Mutex<()>>,
    http: reqwest::Client,
    admin_emails: Vec<String>,
    toc_options: TocOptions,
}

impl AppState {
    pub fn new(data_dir: impl Into<PathBuf>, catalog: DefaultCatalog) -> Self {
        let store = Arc::new(LocalFsContentStore::new(data_dir));
        let loader = ContentLoader::new(store.clone(), catalog.clone());
        Self {
            store,
            loader: Arc::new(loader),
            catalog: Arc::new(catalog),
            structure_lock: Arc::new(Mutex::new(())),
            http: reqwest::Client::new(),
            admin_emails: Vec::new(),
            toc_options: TocOptions::default(),
        }
    }

    #[must_use]
    pub fn with_admin_emails(mut self, admin_emails: Vec<String>) -> Self {
        self.admin_emails = admin_emails;
        self
    }

    #[must_use]
    pub fn with_toc_options(mut self, toc_options: TocOptions) -> Self {
        let loader = ContentLoader::new(self.store.clone(), (*self.catalog).clone())
            .with_toc_options(toc_options);
        self.loader = Arc::new(loader);
        self.toc_options = toc_options;
        self
    }

    async fn structure(&self, language: &str) -> Result<DocumentStructure, PortalError> {
        Ok(self
            .store
            .get_structure(language)
            .await?
            .unwrap_or_else(|| self.catalog.to_structure()))
    }

    async fn update_structure(
        &self,
        language: &str,
        update: impl FnOnce(&mut DocumentStructure) -> Result<(), PortalError>,
    ) -> Result<DocumentStructure, PortalError> {
        let _guard = self.structure_lock.lock().await;
        let mut structure = self.structure(language).await?;
        update(&mut structure)?;
        self.store.put_structure(language, &structure).await?;
        Ok(structure)
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/content/structure/:language",
            get(get_structure_handler),
        )
        .route(
            "/content/structure/:language/section",
            post(add_section_handler),
        )
        .route(
            "/content/structure/:language/subsection",
            post(add_subsection_handler),
        )
        .route(
            "/content/:language/:page",
            get(get_page_handler).post(save_page_handler),
        )
        // Nested style; `page` is the section id here.
        .route(
            "/content/:language/:page/:subsection",
            get(get_nested_page_handler).post(save_nested_page_handler),
        )
        .route("/webContent/add", post(add_web_content_handler));

    Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "healthy" })) }))
        .route("/docs/:language/:section/:subsection", get(docs_page_handler))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `PortalError` as a `{"detail": ..}` response.
#[derive(Debug)]
pub struct ApiError(PortalError);

impl From<PortalError> for ApiError {
    fn from(err: PortalError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PortalError::Validation(_) => StatusCode::BAD_REQUEST,
            PortalError::Unauthorized(_) => StatusCode::FORBIDDEN,
            PortalError::NotFound(_) => StatusCode::NOT_FOUND,
            PortalError::Conflict(_) => StatusCode::CONFLICT,
            PortalError::Transport { .. } | PortalError::Http { .. } => StatusCode::BAD_GATEWAY,
            PortalError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            PortalError::Cancelled | PortalError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(err = %self.0, "request failed");
        } else {
            tracing::info!(err = %self.0, %status, "request rejected");
        }
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

async fn get_page_handler(
    State(state): State<AppState>,
    Path((language, page)): Path<(String, String)>,
) -> Result<Json<PageContentResponse>, ApiError> {
    Ok(Json(read_page(&state, &language, &page).await?))
}

async fn get_nested_page_handler(
    State(state): State<AppState>,
    Path((language, section, subsection)): Path<(String, String, String)>,
) -> Result<Json<PageContentResponse>, ApiError> {
    let coordinate = ContentCoordinate::new(language, section, subsection)?;
    let page = read_page(&state, &coordinate.language, &coordinate.content_id()).await?;
    Ok(Json(page))
}

async fn save_page_handler(
    State(state): State<AppState>,
    Path((language, page)): Path<(String, String)>,
    Json(body): Json<PageContentCreate>,
) -> Result<Json<PageContentResponse>, ApiError> {
    Ok(Json(write_page(&state, &language, &page, body).await?))
}

async fn save_nested_page_handler(
    State(state): State<AppState>,
    Path((language, section, subsection)): Path<(String, String, String)>,
    Json(body): Json<PageContentCreate>,
) -> Result<Json<PageContentResponse>, ApiError> {
    let coordinate = ContentCoordinate::new(language, section, subsection)?;
    let saved = write_page(&state, &coordinate.language, &coordinate.content_id(), body).await?;
    Ok(Json(saved))
}

/// A missing page reads as empty content, not 404.
async fn read_page(
    state: &AppState,
    language: &str,
    page: &str,
) -> Result<PageContentResponse, PortalError> {
    let found = state.store.read_page(language, page).await?;
    Ok(found.unwrap_or_else(|| {
        tracing::info!(language = %language, page = %page, "no stored content");
        PageContentResponse {
            page_content: String::new(),
            table_of_content: None,
        }
    }))
}

async fn write_page(
    state: &AppState,
    language: &str,
    page: &str,
    mut body: PageContentCreate,
) -> Result<PageContentResponse, PortalError> {
    validate_markdown(&body.page_content)?;
    if body.table_of_content.is_none() {
        body.table_of_content = Some(parse_headings_with(&body.page_content, &state.toc_options));
    }

    let saved = state.store.write_page(language, page, &body).await?;
    tracing::info!(language = %language, page = %page, "saved page");
    Ok(saved)
}

async fn get_structure_handler(
    State(state): State<AppState>,
    Path(language): Path<String>,
) -> Result<Json<DocumentStructure>, ApiError> {
    Ok(Json(state.structure(&language).await?))
}

async fn add_section_handler(
    State(state): State<AppState>,
    Path(language): Path<String>,
    Json(request): Json<AddSectionRequest>,
) -> Result<Json<DocumentStructure>, ApiError> {
    let structure = state
        .update_structure(&language, |s| structure::add_section(s, &request))
        .await?;
    Ok(Json(structure))
}

async fn add_subsection_handler(
    State(state): State<AppState>,
    Path(language): Path<String>,
    Json(request): Json<AddSubsectionRequest>,
) -> Result<Json<DocumentStructure>, ApiError> {
    let structure = state
        .update_structure(&language, |s| structure::add_subsection(s, &request))
        .await?;
    Ok(Json(structure))
}

async fn add_web_content_handler(
    State(state): State<AppState>,
    Json(request): Json<WebContentRequest>,
) -> Result<Json<WebContentResponse>, ApiError> {
    let html = fetch_html(&state.http, &request.url).await.map_err(|err| {
        tracing::warn!(url = %request.url, err = %err, "web import fetch failed");
        PortalError::Validation(format!("Error fetching URL: {err}"))
    })?;
    let markdown = html2md::parse_html(&html);

    let subsection = AddSubsectionRequest {
        section_id: request.section_id.clone(),
        subsection_id: import_id(&request.title),
        title: format!("## {}", request.title),
        content: markdown.clone(),
    };
    let structure = state
        .update_structure(IMPORT_LANGUAGE, |s| structure::add_subsection(s, &subsection))
        .await?;

    let coordinate = ContentCoordinate::new(
        IMPORT_LANGUAGE,
        &subsection.section_id,
        &subsection.subsection_id,
    )?;
    // html2md may emit setext headings, which only the AST walk sees.
    let toc_options = TocOptions {
        strategy: HeadingStrategy::Ast,
        ..state.toc_options
    };
    let page = PageContentCreate {
        table_of_content: Some(parse_headings_with(&markdown, &toc_options)),
        page_content: markdown,
        page_url: coordinate.page_url(),
    };
    state
        .store
        .write_page(&coordinate.language, &coordinate.content_id(), &page)
        .await?;
    tracing::info!(url = %request.url, coordinate = %coordinate, "imported web content");

    Ok(Json(WebContentResponse {
        status: "success".to_owned(),
        structure,
    }))
}

async fn fetch_html(http: &reqwest::Client, url: &str) -> Result<String, reqwest::Error> {
    http.get(url).send().await?.error_for_status()?.text().await
}

async fn docs_page_handler(
    State(state): State<AppState>,
    Path((language, section, subsection)): Path<(String, String, String)>,
) -> Result<Html<String>, ApiError> {
    let mut ctx = AppContext::new(state.admin_emails.clone());
    ctx.set_language(&language)?;
    let coordinate = ContentCoordinate::new(language, section, subsection)?;

    let structure = state.structure(&coordinate.language).await?;
    ctx.set_breadcrumbs(structure::breadcrumbs_for(&structure, &coordinate));

    let page = state.loader.load(&coordinate).await;
    let title = ctx
        .breadcrumbs()
        .last()
        .map_or(coordinate.subsection_id.as_str(), |c| c.label.as_str());
    let sidebar = render_sidebar_html(
        ctx.language().code,
        &structure::sidebar(&structure),
        Some(coordinate.page_url().as_str()),
    );
    // On-page TOC and heading ids come from one parse.
    let (content_html, toc) =
        render_markdown_with_toc(&page.content, state.toc_options.collisions);
    let html = render_page_html(
        title,
        ctx.language().code,
        ctx.breadcrumbs(),
        &sidebar,
        &content_html,
        &render_toc_html(&toc, None),
    );
    Ok(Html(html))
}
