//! List workflow: for each chemical given on the command line, search the
//! portal, open the first matching result, scrape the supplier table, keep
//! Indian M/CM suppliers, and append them to a CSV file.

use chromiumoxide::Page;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

use chemscout::browser::PortalBrowser;
use chemscout::core::config::{self, PortalConfig};
use chemscout::export;
use chemscout::extract::tables;
use chemscout::portal;

struct CliArgs {
    chemicals: Vec<String>,
    output: PathBuf,
    headful: bool,
}

fn parse_args() -> CliArgs {
    let mut chemicals = Vec::new();
    let mut output = PathBuf::from("manufacturers_output.csv");
    let mut headful = false;

    let mut args = std::env::args().skip(1);
    while let Some(a) = args.next() {
        if a == "--output" {
            if let Some(v) = args.next() {
                output = PathBuf::from(v);
            }
        } else if let Some(rest) = a.strip_prefix("--output=") {
            output = PathBuf::from(rest);
        } else if a == "--headful" {
            headful = true;
        } else {
            chemicals.push(a);
        }
    }

    CliArgs {
        chemicals,
        output,
        headful,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args = parse_args();
    if args.chemicals.is_empty() {
        eprintln!("usage: chemscout [--output <csv>] [--headful] <chemical> [<chemical> ...]");
        std::process::exit(2);
    }

    let config = config::load_portal_config();

    let (browser, page) = PortalBrowser::launch(!args.headful).await?;
    let result = run(&page, &config, &args).await;
    // Release the browser on every exit path before surfacing the outcome.
    browser.close().await;
    result
}

async fn run(page: &Page, config: &PortalConfig, args: &CliArgs) -> anyhow::Result<()> {
    if !portal::auth::login(page, config).await {
        error!("login failed; aborting run");
        return Ok(());
    }
    info!("logged in successfully");
    tokio::time::sleep(Duration::from_secs(1)).await;

    for chemical in &args.chemicals {
        info!("searching chemical: {}", chemical);

        if !portal::search::search_chemical(page, chemical).await {
            warn!("could not search for {}", chemical);
            continue;
        }
        if !portal::search::open_first_result(page).await {
            warn!("no results found for {}", chemical);
            continue;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        // Best-effort: some detail pages put the table behind a Suppliers tab,
        // others render it inline. Either way the table scan below decides.
        portal::section::open_section(page, "Suppliers").await;

        let html = match page.content().await {
            Ok(html) => html,
            Err(e) => {
                warn!("could not capture page content for {}: {}", chemical, e);
                portal::auth::return_to_home(page).await;
                continue;
            }
        };

        let records = {
            let document = scraper::Html::parse_document(&html);
            let Some(table) = tables::locate_candidate_table(&document) else {
                warn!("no suppliers table for {}", chemical);
                portal::auth::return_to_home(page).await;
                continue;
            };
            let Some(mapping) = tables::infer_columns(&table) else {
                warn!("column detection failed for {}", chemical);
                portal::auth::return_to_home(page).await;
                continue;
            };
            let rows = tables::extract_suppliers(&table, &mapping);
            tables::filter_indian_manufacturers(chemical, rows)
        };

        if let Err(e) = export::append_records(&args.output, &records) {
            warn!("could not append results for {}: {}", chemical, e);
        }

        if !portal::auth::return_to_home(page).await {
            error!("navigation to home failed; stopping run");
            break;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    Ok(())
}
