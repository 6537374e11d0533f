//! Replays host input against live carousel controllers and prints every
//! change notification.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use humantime::{format_duration, parse_duration};
use storefront_carousel::config::PageConfig;
use storefront_carousel::events::CarouselChange;
use storefront_carousel::page::Page;
use storefront_carousel::script::Script;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

/// Tail added after the last script step so trailing cooldowns and ticks are visible.
const SCRIPT_TAIL: Duration = Duration::from_secs(1);

#[derive(Debug, Parser)]
#[command(
    name = "carousel-sim",
    version,
    about = "Drive storefront carousels from a page description and an input script"
)]
struct Args {
    /// Path to the page YAML listing carousel containers
    #[arg(value_name = "PAGE")]
    page: PathBuf,
    /// Timestamped input script to replay
    #[arg(short, long, value_name = "FILE")]
    script: Option<PathBuf>,
    /// Stop after this long (e.g. `12s`, `1m 30s`); defaults to the script length
    #[arg(long = "run-for", value_name = "DURATION", value_parser = parse_duration)]
    run_for: Option<Duration>,
    /// Print change notifications as JSON lines on stdout
    #[arg(long)]
    json: bool,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(
            format!("storefront_carousel={level}")
                .parse()
                .context("invalid log directive")?,
        );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let page_cfg = PageConfig::from_yaml_file(&args.page)
        .with_context(|| format!("failed to load page from {}", args.page.display()))?
        .validated()
        .context("invalid page description")?;
    let script = match &args.script {
        Some(path) => Some(
            Script::from_yaml_file(path)
                .with_context(|| format!("failed to load script from {}", path.display()))?,
        ),
        None => None,
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("ctrl-c handler failed: {err}");
                return;
            }
            info!("ctrl-c received; tearing down carousels");
            cancel.cancel();
        });
    }

    let (changes_tx, mut changes_rx) = mpsc::channel::<CarouselChange>(256);
    let page = Page::attach(&page_cfg, changes_tx, cancel.clone())?;

    let json = args.json;
    let printer = tokio::spawn(async move {
        while let Some(change) = changes_rx.recv().await {
            if json {
                match serde_json::to_string(&change) {
                    Ok(line) => println!("{line}"),
                    Err(err) => warn!("failed to encode change: {err}"),
                }
            } else {
                info!(
                    carousel = change.carousel.as_str(),
                    index = change.current_index,
                    "carousel change"
                );
            }
        }
    });

    let run_for = args
        .run_for
        .or_else(|| script.as_ref().map(|s| s.duration() + SCRIPT_TAIL));
    match run_for {
        Some(limit) => info!(limit = %format_duration(limit), "running"),
        None => info!("running until ctrl-c"),
    }

    let session = async {
        if let Some(script) = &script {
            script.replay(&page).await?;
        }
        cancel.cancelled().await;
        Ok::<(), anyhow::Error>(())
    };
    let deadline = async {
        match run_for {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        res = session => res?,
        _ = deadline => info!("run time elapsed"),
    }

    page.teardown().await;
    if let Err(err) = printer.await {
        warn!("change printer failed: {err}");
    }
    Ok(())
}
