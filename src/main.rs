use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use docportal::cli::{Cli, Command};
use docportal::commands;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    docportal::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        Command::Toc(args) => commands::toc(args).context("toc")?,
        Command::Slug(args) => commands::slug(args).context("slug")?,
        Command::Render(args) => commands::render(args).context("render")?,
        Command::Fetch(args) => commands::fetch(args).await.context("fetch")?,
        Command::Save(args) => commands::save(args).await.context("save")?,
        Command::Structure(args) => commands::structure(args).await.context("structure")?,
        Command::Search(args) => commands::search(args).await.context("search")?,
        Command::AddSection(args) => commands::add_section(args)
            .await
            .context("add section")?,
        Command::AddSubsection(args) => commands::add_subsection(args)
            .await
            .context("add subsection")?,
        Command::ImportWeb(args) => commands::import_web(args)
            .await
            .context("import web")?,
    }

    Ok(())
}
