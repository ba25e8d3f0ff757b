use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    docclassify::logging::init().context("init logging")?;

    let cli = docclassify::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        docclassify::cli::Command::Classify(args) => {
            docclassify::gateway::run(args).await.context("classify")?;
        }
        docclassify::cli::Command::Edit(args) => {
            docclassify::editor::run(args).context("edit")?;
        }
        docclassify::cli::Command::Register(args) => {
            docclassify::register::run(args).await.context("register")?;
        }
    }

    Ok(())
}
