use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use audiograb::cli::{Cli, Commands};
use audiograb::config::Config;
use audiograb::download::{DownloadOrchestrator, InheritedStdioRunner};
use audiograb::metadata::{youtube::YoutubeDataApi, ytdlp::YtDlpInfo};
use audiograb::prompt::Console;
use audiograb::session::Session;
use audiograb::utils;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "audiograb=debug" } else { "audiograb=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load().await?;

    match cli.command {
        Some(Commands::Config { show }) => {
            if show {
                config.display();
            } else {
                println!("Edit the config file to change settings:");
                println!("  {}", Config::config_path()?.display());
            }
        }
        Some(Commands::Check) => {
            let missing = utils::check_dependencies(&config.tools.downloader, &config.tools.transcoder).await;
            if missing.is_empty() {
                println!("All external tools found.");
            } else {
                println!("Missing tools:");
                for dep in missing {
                    println!("  • {}", dep);
                }
                anyhow::bail!("external tools are missing");
            }
        }
        None => {
            let missing = utils::check_dependencies(&config.tools.downloader, &config.tools.transcoder).await;
            if !missing.is_empty() {
                eprintln!("⚠️  Dependency check warnings:");
                for dep in missing {
                    eprintln!("   • {}", dep);
                }
                eprintln!("   (Continuing anyway - tools may be available)");
            }

            let mut console = Console::stdio();

            let api_key = match cli.api_key.filter(|k| !k.trim().is_empty()) {
                Some(key) => key.trim().to_string(),
                None => match config.api_key() {
                    Some(key) => key.to_string(),
                    None => console
                        .ask_non_empty("Enter API Key: ")
                        .context("Failed to read API key")?,
                },
            };

            let session = Session::new(
                Box::new(YoutubeDataApi::new(
                    api_key,
                    config.api.base_url.clone(),
                    config.api.max_results,
                )),
                Box::new(YtDlpInfo::new(config.tools.downloader.clone())),
                DownloadOrchestrator::new(
                    Box::new(InheritedStdioRunner),
                    config.tools.downloader.clone(),
                    config.tools.transcoder.clone(),
                    config.output.default_bitrate_kbps,
                ),
                config.output_dir(),
            )
            .with_progress(!cli.quiet);

            session.run(&mut console, cli.query).await?;
        }
    }

    Ok(())
}
