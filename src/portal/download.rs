//! Download acquisition for the generated applications export.
//!
//! Two-tier strategy. Tier 1 clicks the download trigger and observes the
//! browser's download lifecycle events. Tier 2 fires when the trigger turns
//! out to be an in-page action instead: the URL embedded in its onclick
//! handler is extracted, resolved against the portal base URL, and opened in
//! a transient tab whose navigation is observed for the same events. There
//! is no tier 3.

use chromiumoxide::cdp::browser_protocol::browser::{
    DownloadProgressState, EventDownloadProgress, EventDownloadWillBegin,
};
use chromiumoxide::Page;
use futures::{Stream, StreamExt};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::browser::locator::{self, Locator};
use crate::browser::PortalBrowser;
use crate::core::types::DownloadArtifact;

/// Anchor trigger first (the typed variant ahead of the generic one), then
/// the download icon image.
const DOWNLOAD_ANCHOR: Locator<'static> =
    Locator::Css(r#"a[onclick*="downloadType=3"], a[onclick*="downloadType"]"#);
const DOWNLOAD_IMG: Locator<'static> =
    Locator::Css(r#"img[src*="dw.png"], img[title^="Download Chemical"]"#);

const TRIGGER_TIMEOUT: Duration = Duration::from_secs(6);
const DOWNLOAD_EVENT_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_FILENAME: &str = "applications.xlsx";

/// Acquire the applications export into `save_dir`.
/// Returns the artifact on success, `None` once both tiers are exhausted.
pub async fn download_applications(
    browser: &PortalBrowser,
    page: &Page,
    base_url: &str,
    save_dir: &Path,
) -> Option<DownloadArtifact> {
    if let Err(e) = std::fs::create_dir_all(save_dir) {
        error!("could not create save folder {}: {}", save_dir.display(), e);
        return None;
    }
    if let Err(e) = browser.allow_downloads_into(save_dir).await {
        error!("could not enable downloads: {}", e);
        return None;
    }

    let triggers = [DOWNLOAD_ANCHOR, DOWNLOAD_IMG];
    let Some(trigger) = locator::first_present(page, &triggers, TRIGGER_TIMEOUT).await else {
        error!("download control not found in Applications area (tried anchor & image)");
        return None;
    };

    // Tier 1: click while observing the download lifecycle.
    if let Some(artifact) = click_and_await(browser, page, trigger, save_dir).await {
        return Some(artifact);
    }
    warn!("no download event after clicking trigger; trying onclick URL fallback");

    // Tier 2: reconstruct the URL from the trigger's onclick handler.
    let Some(onclick) = onclick_of_trigger(page).await else {
        error!("no onclick attribute found for download control (fallback)");
        return None;
    };
    debug!(
        "onclick (excerpt): {}",
        onclick.chars().take(200).collect::<String>()
    );

    let Some(extracted) = extract_url_from_onclick(&onclick) else {
        error!("could not extract URL from onclick");
        return None;
    };
    let Some(download_url) = resolve_download_url(base_url, &extracted) else {
        error!("could not resolve {:?} against base URL {:?}", extracted, base_url);
        return None;
    };
    info!("fallback download URL: {}", download_url);

    navigate_and_await(browser, download_url, save_dir).await
}

// ── Tier 1 ────────────────────────────────────────────────────────────────────

async fn click_and_await(
    browser: &PortalBrowser,
    page: &Page,
    trigger: &Locator<'_>,
    save_dir: &Path,
) -> Option<DownloadArtifact> {
    let mut begin = browser
        .browser()
        .event_listener::<EventDownloadWillBegin>()
        .await
        .ok()?;
    let mut progress = browser
        .browser()
        .event_listener::<EventDownloadProgress>()
        .await
        .ok()?;

    let el = trigger.find(page).await?;
    if let Err(e) = el.click().await {
        warn!("download trigger click failed: {}", e);
        return None;
    }

    await_download(
        &mut begin,
        &mut progress,
        trigger.as_str().to_string(),
        save_dir,
    )
    .await
}

// ── Tier 2 ────────────────────────────────────────────────────────────────────

async fn navigate_and_await(
    browser: &PortalBrowser,
    download_url: Url,
    save_dir: &Path,
) -> Option<DownloadArtifact> {
    let mut begin = browser
        .browser()
        .event_listener::<EventDownloadWillBegin>()
        .await
        .ok()?;
    let mut progress = browser
        .browser()
        .event_listener::<EventDownloadProgress>()
        .await
        .ok()?;

    let tab = match browser.new_page("about:blank").await {
        Ok(t) => t,
        Err(e) => {
            error!("could not open tab for fallback download: {}", e);
            return None;
        }
    };

    // A navigation that resolves to a download is reported as aborted by the
    // browser; the download events are the real signal.
    if let Err(e) = tab.goto(download_url.as_str()).await {
        debug!("secondary navigation reported: {} (expected for downloads)", e);
    }

    let artifact = await_download(
        &mut begin,
        &mut progress,
        download_url.to_string(),
        save_dir,
    )
    .await;

    if let Err(e) = tab.close().await {
        debug!("fallback tab close error (non-fatal): {}", e);
    }

    if artifact.is_none() {
        error!("navigation download fallback produced no download");
    }
    artifact
}

// ── Shared download observation ───────────────────────────────────────────────

async fn await_download<B, P>(
    begin: &mut B,
    progress: &mut P,
    source: String,
    save_dir: &Path,
) -> Option<DownloadArtifact>
where
    B: Stream<Item = Arc<EventDownloadWillBegin>> + Unpin,
    P: Stream<Item = Arc<EventDownloadProgress>> + Unpin,
{
    let begun = tokio::time::timeout(DOWNLOAD_EVENT_TIMEOUT, begin.next())
        .await
        .ok()
        .flatten()?;

    let suggested = if begun.suggested_filename.trim().is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        begun.suggested_filename.clone()
    };
    debug!("download began: {} ({})", suggested, begun.url);

    let deadline = tokio::time::Instant::now() + DOWNLOAD_EVENT_TIMEOUT;
    loop {
        let remaining = deadline
            .checked_duration_since(tokio::time::Instant::now())
            .filter(|d| !d.is_zero())?;
        let event = tokio::time::timeout(remaining, progress.next())
            .await
            .ok()
            .flatten()?;
        if event.guid != begun.guid {
            continue;
        }
        match &event.state {
            DownloadProgressState::Completed => break,
            DownloadProgressState::Canceled => {
                warn!("download was canceled by the browser");
                return None;
            }
            DownloadProgressState::InProgress => {}
        }
    }

    let saved_path: PathBuf = save_dir.join(&suggested);
    info!("download saved to {}", saved_path.display());
    Some(DownloadArtifact {
        source,
        suggested_filename: suggested,
        saved_path,
    })
}

/// Trigger onclick lookup for the fallback tier: the anchor itself, else the
/// parent of the download icon image.
async fn onclick_of_trigger(page: &Page) -> Option<String> {
    if let Some(el) = DOWNLOAD_ANCHOR.find(page).await {
        if let Ok(Some(v)) = el.attribute("onclick").await {
            return Some(v);
        }
    }

    let img_parent = Locator::XPath(
        "//img[contains(@src,'dw.png') or starts-with(@title,'Download Chemical')]/parent::*",
    );
    if let Some(el) = img_parent.find(page).await {
        if let Ok(Some(v)) = el.attribute("onclick").await {
            return Some(v);
        }
    }

    None
}

// ── URL reconstruction ────────────────────────────────────────────────────────

static QUOTED_PATH: OnceLock<Regex> = OnceLock::new();
static FULL_URL: OnceLock<Regex> = OnceLock::new();

/// Pull a navigable URL out of an onclick handler body: a quoted absolute
/// path first, else the first bare http(s) URL.
pub fn extract_url_from_onclick(onclick: &str) -> Option<String> {
    if onclick.is_empty() {
        return None;
    }
    let quoted = QUOTED_PATH
        .get_or_init(|| Regex::new(r#"['"](/[^'"]+)['"]"#).expect("valid path pattern"));
    if let Some(caps) = quoted.captures(onclick) {
        return Some(caps[1].to_string());
    }
    let full = FULL_URL
        .get_or_init(|| Regex::new(r#"(https?://[^\s'"()]+)"#).expect("valid url pattern"));
    full.captures(onclick).map(|caps| caps[1].to_string())
}

/// Resolve an extracted path or URL against the portal base URL.
pub fn resolve_download_url(base_url: &str, extracted: &str) -> Option<Url> {
    Url::parse(base_url).ok()?.join(extracted).ok()
}

#[cfg(test)]
mod tests {
    use super::{extract_url_from_onclick, resolve_download_url};

    #[test]
    fn quoted_absolute_path_is_preferred() {
        let onclick = "javascript:openDownload('/download?id=123', 3); return false;";
        assert_eq!(
            extract_url_from_onclick(onclick).as_deref(),
            Some("/download?id=123")
        );
    }

    #[test]
    fn bare_full_url_is_the_second_pattern() {
        // No statement terminator: the pattern runs to whitespace, quote or
        // paren, so a trailing `;` would be captured as part of the URL.
        let onclick = "window.location = https://files.example.com/exports/apps.xlsx";
        assert_eq!(
            extract_url_from_onclick(onclick).as_deref(),
            Some("https://files.example.com/exports/apps.xlsx")
        );
    }

    #[test]
    fn quoted_full_url_still_resolves_via_url_pattern() {
        let onclick = r#"doDownload("https://files.example.com/x.xlsx")"#;
        assert_eq!(
            extract_url_from_onclick(onclick).as_deref(),
            Some("https://files.example.com/x.xlsx")
        );
    }

    #[test]
    fn empty_or_urlless_onclick_yields_none() {
        assert_eq!(extract_url_from_onclick(""), None);
        assert_eq!(extract_url_from_onclick("togglePanel(this); return false;"), None);
    }

    #[test]
    fn extracted_path_resolves_against_base_url() {
        let url = resolve_download_url("https://smartchem.example.com", "/download?id=123")
            .expect("resolvable");
        assert_eq!(
            url.as_str(),
            "https://smartchem.example.com/download?id=123"
        );
    }

    #[test]
    fn absolute_path_replaces_base_path_segment() {
        let url = resolve_download_url("https://smartchem.example.com/app/", "/download?id=9")
            .expect("resolvable");
        assert_eq!(url.as_str(), "https://smartchem.example.com/download?id=9");
    }
}
