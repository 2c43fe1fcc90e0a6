//! Single-chemical workflow: search the portal for one chemical, open its
//! Applications section, and download the generated spreadsheet export.

use chromiumoxide::Page;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use chemscout::browser::PortalBrowser;
use chemscout::core::config::{self, PortalConfig};
use chemscout::portal;

struct CliArgs {
    chemical: Option<String>,
    save_dir: PathBuf,
    headful: bool,
}

fn parse_args() -> CliArgs {
    let mut chemical = None;
    let mut save_dir = PathBuf::from("downloads");
    let mut headful = false;

    let mut args = std::env::args().skip(1);
    while let Some(a) = args.next() {
        if a == "--save-dir" {
            if let Some(v) = args.next() {
                save_dir = PathBuf::from(v);
            }
        } else if let Some(rest) = a.strip_prefix("--save-dir=") {
            save_dir = PathBuf::from(rest);
        } else if a == "--headful" {
            headful = true;
        } else if chemical.is_none() {
            chemical = Some(a);
        }
    }

    CliArgs {
        chemical,
        save_dir,
        headful,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = parse_args();
    let Some(chemical) = args.chemical.clone() else {
        eprintln!("usage: chemscout-download [--save-dir <dir>] [--headful] <chemical>");
        std::process::exit(2);
    };

    let config = config::load_portal_config();

    let (browser, page) = PortalBrowser::launch(!args.headful).await?;
    let result = run(&browser, &page, &config, &chemical, &args.save_dir).await;
    browser.close().await;
    result
}

async fn run(
    browser: &PortalBrowser,
    page: &Page,
    config: &PortalConfig,
    chemical: &str,
    save_dir: &std::path::Path,
) -> anyhow::Result<()> {
    if !portal::auth::login(page, config).await {
        error!("login failed; exiting");
        return Ok(());
    }
    info!("logged in successfully");

    info!("searching for: {}", chemical);
    if !portal::search::search_chemical(page, chemical).await {
        error!("search failed; exiting");
        return Ok(());
    }
    info!("search submitted");

    if !portal::search::open_first_result(page).await {
        error!("could not open the first result; exiting");
        return Ok(());
    }
    info!("first result opened");
    tokio::time::sleep(Duration::from_millis(1200)).await;

    if !portal::section::open_section(page, "Applications").await {
        error!("could not open Applications section; exiting");
        return Ok(());
    }
    info!("Applications section opened");
    tokio::time::sleep(Duration::from_millis(1200)).await;

    let base_url = config.resolve_base_url();
    match portal::download::download_applications(browser, page, &base_url, save_dir).await {
        Some(artifact) => info!(
            "applications export saved to {}",
            artifact.saved_path.display()
        ),
        None => error!("failed to download the applications export"),
    }

    Ok(())
}
