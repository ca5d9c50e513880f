//! marquee - preview the storefront banner engine from a terminal.
//!
//! Fetches banners for a page (from the backend or a JSON file), shows what
//! would render, runs auto-expiry countdowns live, and dismisses banners
//! into the same local ledger a client would use.
//!
//! Usage: marquee [--page P] [--url URL | --file PATH] [--store PATH] <command>

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use marquee_core::banners::BannerChange;
use marquee_core::{
    AppConfig, BannerEngine, BannerView, DismissalLedger, FileBannerSource, FileStore,
    HttpBannerSource, KeyValueStore, PageContext,
};
use marquee_types::BannerId;
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Preview storefront banners")]
struct Cli {
    /// Page context to load banners for (defaults to the configured page)
    #[arg(short, long)]
    page: Option<String>,

    /// Backend base URL (defaults to the configured URL)
    #[arg(long, conflicts_with = "file")]
    url: Option<String>,

    /// Read banners from a JSON file instead of the backend
    #[arg(long)]
    file: Option<PathBuf>,

    /// Dismissal store location (defaults to the platform data dir)
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the banners that would render right now
    Show,
    /// Print banners, then follow countdowns until none remain (Ctrl-C stops)
    Watch,
    /// Dismiss a visible banner and remember it
    Dismiss { id: BannerId },
    /// List dismissed banner ids
    Dismissed,
}

/// Commands that need the banners loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Show,
    Watch,
    Dismiss(BannerId),
}

impl Commands {
    /// None for commands that only read the dismissal ledger
    fn banner_action(&self) -> Option<Action> {
        match *self {
            Commands::Show => Some(Action::Show),
            Commands::Watch => Some(Action::Watch),
            Commands::Dismiss { id } => Some(Action::Dismiss(id)),
            Commands::Dismissed => None,
        }
    }
}

/// Initialize logging, writing to MARQUEE_LOG_PATH if set, otherwise stderr.
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    if let Ok(path) = std::env::var("MARQUEE_LOG_PATH")
        && let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(file)
            .init();
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), String> {
    init_logging();

    let cli = Cli::parse();
    let config = AppConfig::load();

    let store_path = cli
        .store
        .clone()
        .or_else(|| config.storage_path())
        .ok_or("no data directory available; pass --store")?;
    let ledger = DismissalLedger::open(FileStore::new(store_path));

    let Some(action) = cli.command.banner_action() else {
        print_dismissed(&ledger);
        return Ok(());
    };

    let page = cli
        .page
        .clone()
        .map(PageContext::new)
        .unwrap_or_else(|| config.default_page());
    let mut engine = BannerEngine::new(page, ledger);

    if let Some(path) = &cli.file {
        engine.load(&FileBannerSource::new(path)).await;
    } else {
        let base_url = cli.url.clone().unwrap_or_else(|| config.api_base_url.clone());
        let source =
            HttpBannerSource::new(base_url, config.request_timeout()).map_err(|e| e.to_string())?;
        engine.load(&source).await;
    }

    match action {
        Action::Show => print_views(&engine.views()),
        Action::Watch => watch(&mut engine).await,
        Action::Dismiss(id) => {
            engine.dismiss(id).map_err(|e| e.to_string())?;
            println!("Dismissed banner {id}");
            print_views(&engine.views());
        }
    }

    engine.shutdown();
    Ok(())
}

fn print_dismissed<S: KeyValueStore>(ledger: &DismissalLedger<S>) {
    let mut ids: Vec<BannerId> = ledger.dismissed().iter().copied().collect();
    ids.sort_unstable();
    if ids.is_empty() {
        println!("No dismissed banners");
    }
    for id in ids {
        println!("{id}");
    }
}

async fn watch<S, C>(engine: &mut BannerEngine<S, C>)
where
    S: KeyValueStore,
    C: marquee_core::banners::Clock,
{
    print_views(&engine.views());

    loop {
        tokio::select! {
            change = engine.next_change() => match change {
                Some(BannerChange::Countdown { banner_id, remaining }) => {
                    println!("  #{banner_id}: {}", marquee_types::formatting::format_auto_close_label(remaining));
                }
                Some(BannerChange::AutoHidden { banner_id }) => {
                    println!("#{banner_id} auto-hidden");
                    print_views(&engine.views());
                }
                None => {
                    println!("No countdowns running");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                println!("Interrupted");
                break;
            }
        }
    }
}

fn print_views(views: &[BannerView]) {
    if views.is_empty() {
        println!("No banners");
        return;
    }
    for view in views {
        let mut line = format!("[{}] #{} {}", view.banner_type, view.id, view.title);
        if !view.message.is_empty() {
            line.push_str(": ");
            line.push_str(&view.message);
        }
        if let Some(label) = &view.countdown_label {
            line.push_str(&format!(" ({label})"));
        }
        if let Some(button) = &view.button {
            line.push_str(&format!(" [{} -> {}]", button.text, button.link));
        }
        if view.dismiss.is_some() {
            line.push_str(" [x]");
        }
        println!("{line}");
    }
}
