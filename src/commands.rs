//! Command runners behind the `docportal` CLI.

use std::io::{Read as _, Write as _};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use tokio_util::sync::CancellationToken;

use crate::cli::{
    AddSectionArgs, AddSubsectionArgs, ApiArgs, FetchArgs, ImportWebArgs, OutputFormat,
    RenderArgs, SaveArgs, SearchArgs, SlugArgs, StructureArgs, TocArgs,
};
use crate::client::ContentClient;
use crate::config::PortalConfig;
use crate::context::AppContext;
use crate::coordinate::ContentCoordinate;
use crate::formats::{AddSectionRequest, AddSubsectionRequest, DocumentStructure, WebContentRequest};
use crate::loader::ContentLoader;
use crate::nav::ActiveHeadingTracker;
use crate::render::{render_markdown_with_toc, render_page_html, render_toc_html};
use crate::search::SearchIndex;
use crate::slug::heading_id;
use crate::toc::{TocOptions, parse_headings_with};

pub fn toc(args: TocArgs) -> anyhow::Result<()> {
    let markdown = read_input(&args.input)?;
    let toc = parse_headings_with(
        &markdown,
        &TocOptions {
            strategy: args.strategy,
            collisions: args.collisions,
        },
    );
    tracing::debug!(headings = toc.headers.len(), strategy = ?args.strategy, "derived toc");

    match args.format {
        OutputFormat::Json => print_json(&toc),
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&toc).context("serialize toc as yaml")?;
            write_stdout(&yaml)
        }
    }
}

pub fn slug(args: SlugArgs) -> anyhow::Result<()> {
    write_stdout(&format!("{}\n", heading_id(&args.text)))
}

pub fn render(args: RenderArgs) -> anyhow::Result<()> {
    let markdown = read_input(&args.input)?;
    let mut ctx = AppContext::new(Vec::new());
    ctx.set_language(&args.language)?;

    let (content_html, toc) = render_markdown_with_toc(&markdown, args.collisions);
    let mut tracker = ActiveHeadingTracker::new(&toc);
    if let Some(active) = &args.active {
        let target = tracker.select(active)?;
        tracing::debug!(fragment = %target.fragment, "highlighting heading");
    }

    let title = args
        .title
        .clone()
        .or_else(|| toc.headers.first().map(|h| h.title.clone()))
        .unwrap_or_else(|| "Untitled".to_owned());
    let html = render_page_html(
        &title,
        ctx.language().code,
        ctx.breadcrumbs(),
        "",
        &content_html,
        &render_toc_html(&toc, tracker.active()),
    );
    write_stdout(&html)
}

pub async fn fetch(args: FetchArgs) -> anyhow::Result<()> {
    let config = remote_config(&args.api)?;
    let coordinate = ContentCoordinate::from_page_url(&args.language, &args.page)?;
    let loader = loader(&config)?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let page = loader.load_cancellable(&coordinate, &cancel).await;
    watcher.abort();

    if let Some(notice) = &page.notice {
        eprintln!("{}: {}", notice.title, notice.description);
    }
    print_json(&page)
}

pub async fn save(args: SaveArgs) -> anyhow::Result<()> {
    let config = remote_config(&args.api)?;
    signed_in_editor(&config, &args.user, "save page")?;

    let coordinate = ContentCoordinate::from_page_url(&args.language, &args.page)?;
    let markdown = read_input(&args.input)?;
    let page = loader(&config)?
        .save(&coordinate, &markdown)
        .await
        .with_context(|| format!("save {coordinate}"))?;

    if let Some(notice) = &page.notice {
        eprintln!("{}: {}", notice.title, notice.description);
    }
    print_json(&page)
}

pub async fn structure(args: StructureArgs) -> anyhow::Result<()> {
    let config = remote_config(&args.api)?;
    let client = ContentClient::from_config(&config);
    let structure = client
        .get_structure(&args.language)
        .await
        .with_context(|| format!("get structure for {}", args.language))?;
    print_json(&structure)
}

pub async fn search(args: SearchArgs) -> anyhow::Result<()> {
    let config = remote_config(&args.api)?;
    let structure = if args.offline {
        config.load_catalog()?.to_structure()
    } else {
        structure_or_catalog(&config, &args.language).await?
    };

    let index = SearchIndex::from_structure(&structure).with_threshold(args.threshold);
    let hits = index.search(&args.query);
    tracing::info!(
        query = %args.query,
        records = index.records().len(),
        hits = hits.len(),
        "search"
    );
    print_json(&hits)
}

pub async fn add_section(args: AddSectionArgs) -> anyhow::Result<()> {
    let config = remote_config(&args.api)?;
    signed_in_editor(&config, &args.user, "add section")?;

    let structure = ContentClient::from_config(&config)
        .add_section(
            &args.language,
            &AddSectionRequest {
                section_id: args.section_id,
                title: format!("# {}", args.title),
            },
        )
        .await
        .context("add section")?;
    print_json(&structure)
}

pub async fn add_subsection(args: AddSubsectionArgs) -> anyhow::Result<()> {
    let config = remote_config(&args.api)?;
    signed_in_editor(&config, &args.user, "add subsection")?;

    let structure = ContentClient::from_config(&config)
        .add_subsection(
            &args.language,
            &AddSubsectionRequest {
                section_id: args.section_id,
                subsection_id: args.subsection_id,
                title: format!("## {}", args.title),
                content: args.content,
            },
        )
        .await
        .context("add subsection")?;
    print_json(&structure)
}

pub async fn import_web(args: ImportWebArgs) -> anyhow::Result<()> {
    let config = remote_config(&args.api)?;
    signed_in_editor(&config, &args.user, "import web content")?;
    if !matches!(args.url.scheme(), "http" | "https") {
        anyhow::bail!("url must be http or https: {}", args.url);
    }

    let response = ContentClient::from_config(&config)
        .add_web_content(&WebContentRequest {
            url: args.url.to_string(),
            section_id: args.section_id,
            title: args.title,
        })
        .await
        .context("import web content")?;
    print_json(&response)
}

fn remote_config(api: &ApiArgs) -> anyhow::Result<PortalConfig> {
    let mut config = PortalConfig::from_env().context("read config")?;
    api.apply(&mut config);
    tracing::debug!(
        api_base_url = %config.api_base_url,
        path_style = ?config.path_style,
        "content api"
    );
    Ok(config)
}

fn loader(config: &PortalConfig) -> anyhow::Result<ContentLoader> {
    let client = ContentClient::from_config(config);
    let catalog = config.load_catalog()?;
    Ok(ContentLoader::new(Arc::new(client), catalog).with_timeout(config.fetch_timeout))
}

fn signed_in_editor(config: &PortalConfig, email: &str, action: &str) -> anyhow::Result<()> {
    let mut ctx = AppContext::new(config.admin_emails.clone());
    ctx.sign_in(email);
    ctx.ensure_can_edit(action)?;
    Ok(())
}

/// Remote structure, or the built-in catalog when the API is unreachable.
async fn structure_or_catalog(
    config: &PortalConfig,
    language: &str,
) -> anyhow::Result<DocumentStructure> {
    let client = ContentClient::from_config(config);
    match tokio::time::timeout(config.fetch_timeout, client.get_structure(language)).await {
        Ok(Ok(structure)) => Ok(structure),
        Ok(Err(err)) => {
            tracing::warn!(%err, "structure fetch failed; searching the default catalog");
            Ok(config.load_catalog()?.to_structure())
        }
        Err(_) => {
            tracing::warn!(
                timeout = ?config.fetch_timeout,
                "structure fetch timed out; searching the default catalog"
            );
            Ok(config.load_catalog()?.to_structure())
        }
    }
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("read input: {}", path.display()))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let mut json = serde_json::to_string_pretty(value).context("serialize json")?;
    json.push('\n');
    write_stdout(&json)
}

fn write_stdout(text: &str) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes()).context("write stdout")?;
    stdout.flush().context("flush stdout")?;
    Ok(())
}
