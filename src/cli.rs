use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use url::Url;

use crate::config::PortalConfig;
use crate::coordinate::PathStyle;
use crate::search::DEFAULT_THRESHOLD;
use crate::toc::{CollisionPolicy, HeadingStrategy};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the table of contents derived from a markdown file.
    Toc(TocArgs),
    /// Print the heading id for a piece of text.
    Slug(SlugArgs),
    /// Render a markdown file as an HTML page with its TOC sidebar.
    Render(RenderArgs),
    /// Load a page from the content API, falling back to default content.
    Fetch(FetchArgs),
    /// Save a markdown file as a page (admin only).
    Save(SaveArgs),
    /// Print the document structure for a language.
    Structure(StructureArgs),
    /// Fuzzy search over section and subsection titles.
    Search(SearchArgs),
    /// Add a section to the document structure (admin only).
    AddSection(AddSectionArgs),
    /// Add a subsection to a section (admin only).
    AddSubsection(AddSubsectionArgs),
    /// Import a web page as a new subsection (admin only).
    ImportWeb(ImportWebArgs),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Content API connection, overriding `DOCPORTAL_*` environment values.
#[derive(Debug, Clone, Default, Args)]
pub struct ApiArgs {
    /// Content API base URL.
    #[arg(long)]
    pub api_base_url: Option<Url>,

    /// How page paths are spelled in API requests.
    #[arg(long, value_enum)]
    pub path_style: Option<PathStyle>,

    /// Give up on the content API after this many milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl ApiArgs {
    pub fn apply(&self, config: &mut PortalConfig) {
        if let Some(url) = &self.api_base_url {
            config.api_base_url = url.clone();
        }
        if let Some(style) = self.path_style {
            config.path_style = style;
        }
        if let Some(ms) = self.timeout_ms.filter(|ms| *ms > 0) {
            config.fetch_timeout = std::time::Duration::from_millis(ms);
        }
    }
}

#[derive(Debug, Args)]
pub struct TocArgs {
    /// Markdown file (`-` for stdin).
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t)]
    pub strategy: HeadingStrategy,

    #[arg(long, value_enum, default_value_t)]
    pub collisions: CollisionPolicy,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct SlugArgs {
    pub text: String,
}

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Markdown file (`-` for stdin).
    #[arg(long)]
    pub input: PathBuf,

    /// Heading id to highlight in the TOC.
    #[arg(long)]
    pub active: Option<String>,

    /// Page title (defaults to the first heading).
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, default_value = "en")]
    pub language: String,

    #[arg(long, value_enum, default_value_t)]
    pub collisions: CollisionPolicy,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    #[arg(long, default_value = "en")]
    pub language: String,

    /// Page as `section/subsection`.
    #[arg(long)]
    pub page: String,

    #[command(flatten)]
    pub api: ApiArgs,
}

#[derive(Debug, Args)]
pub struct SaveArgs {
    #[arg(long, default_value = "en")]
    pub language: String,

    /// Page as `section/subsection`.
    #[arg(long)]
    pub page: String,

    /// Markdown file (`-` for stdin).
    #[arg(long)]
    pub input: PathBuf,

    /// Email of the signed-in editor.
    #[arg(long)]
    pub user: String,

    #[command(flatten)]
    pub api: ApiArgs,
}

#[derive(Debug, Args)]
pub struct StructureArgs {
    #[arg(long, default_value = "en")]
    pub language: String,

    #[command(flatten)]
    pub api: ApiArgs,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(long)]
    pub query: String,

    #[arg(long, default_value = "en")]
    pub language: String,

    /// Share of the query that may be mistyped (0.0 - 1.0).
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Search the built-in catalog without asking the content API.
    #[arg(long, default_value_t = false)]
    pub offline: bool,

    #[command(flatten)]
    pub api: ApiArgs,
}

#[derive(Debug, Args)]
pub struct AddSectionArgs {
    #[arg(long, default_value = "en")]
    pub language: String,

    #[arg(long)]
    pub section_id: String,

    #[arg(long)]
    pub title: String,

    /// Email of the signed-in editor.
    #[arg(long)]
    pub user: String,

    #[command(flatten)]
    pub api: ApiArgs,
}

#[derive(Debug, Args)]
pub struct AddSubsectionArgs {
    #[arg(long, default_value = "en")]
    pub language: String,

    #[arg(long)]
    pub section_id: String,

    #[arg(long)]
    pub subsection_id: String,

    #[arg(long)]
    pub title: String,

    /// Short description shown in the sidebar.
    #[arg(long, default_value = "")]
    pub content: String,

    /// Email of the signed-in editor.
    #[arg(long)]
    pub user: String,

    #[command(flatten)]
    pub api: ApiArgs,
}

#[derive(Debug, Args)]
pub struct ImportWebArgs {
    /// Page to import (must be http/https).
    #[arg(long)]
    pub url: Url,

    #[arg(long)]
    pub section_id: String,

    #[arg(long)]
    pub title: String,

    /// Email of the signed-in editor.
    #[arg(long)]
    pub user: String,

    #[command(flatten)]
    pub api: ApiArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_args_override_config() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "docportal",
            "fetch",
            "--page",
            "invoices/creating-invoices",
            "--api-base-url",
            "http://127.0.0.1:9999/api/v1",
            "--path-style",
            "nested",
            "--timeout-ms",
            "250",
        ])?;
        let Command::Fetch(args) = cli.command else {
            anyhow::bail!("expected fetch");
        };
        assert_eq!(args.language, "en");

        let mut config = PortalConfig::default();
        args.api.apply(&mut config);
        assert_eq!(config.api_base_url.as_str(), "http://127.0.0.1:9999/api/v1");
        assert_eq!(config.path_style, PathStyle::Nested);
        assert_eq!(config.fetch_timeout.as_millis(), 250);
        Ok(())
    }

    #[test]
    fn toc_defaults() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["docportal", "toc", "--input", "-"])?;
        let Command::Toc(args) = cli.command else {
            anyhow::bail!("expected toc");
        };
        assert_eq!(args.strategy, HeadingStrategy::Line);
        assert_eq!(args.collisions, CollisionPolicy::LastWriteWins);
        assert_eq!(args.format, OutputFormat::Json);
        Ok(())
    }
}
