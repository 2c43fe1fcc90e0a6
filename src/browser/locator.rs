//! Polling element location.
//!
//! The portal renders asynchronously and inconsistently between pages, so a
//! single blocking wait misses elements that attach late. Every component
//! builds on `wait_for`: poll at a fixed interval, swallow probe errors,
//! and report presence as a plain boolean.
//!
//! Ordered fallback chains (search inputs, section tabs, download triggers)
//! are plain slices of `Locator` tried in sequence, each with its own
//! timeout. Data-driven iteration, no dynamic dispatch.

use chromiumoxide::{Element, Page};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_POLL: Duration = Duration::from_millis(250);

/// A single element-resolution strategy.
///
/// XPath carries the text-match strategies CSS cannot express (the portal's
/// tab labels are stable even when their DOM shape is not).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator<'a> {
    Css(&'a str),
    XPath(&'a str),
}

impl<'a> Locator<'a> {
    pub fn as_str(&self) -> &'a str {
        match *self {
            Locator::Css(s) | Locator::XPath(s) => s,
        }
    }

    /// Resolve to an element right now, or `None`. Probe errors (detached
    /// frames, mid-navigation DOM) are swallowed; they mean "not present".
    pub async fn find(&self, page: &Page) -> Option<Element> {
        match *self {
            Locator::Css(sel) => page.find_element(sel).await.ok(),
            Locator::XPath(sel) => page.find_xpath(sel).await.ok(),
        }
    }
}

/// Poll until `locator` resolves or `timeout` elapses. Never errors.
pub async fn wait_for(
    page: &Page,
    locator: &Locator<'_>,
    timeout: Duration,
    poll: Duration,
) -> bool {
    let start = tokio::time::Instant::now();
    loop {
        if locator.find(page).await.is_some() {
            return true;
        }
        if start.elapsed() >= timeout {
            return false;
        }
        tokio::time::sleep(poll).await;
    }
}

/// First locator in the chain that becomes present within `per_timeout`.
pub async fn first_present<'a, 'b>(
    page: &Page,
    chain: &'a [Locator<'b>],
    per_timeout: Duration,
) -> Option<&'a Locator<'b>> {
    for loc in chain {
        if wait_for(page, loc, per_timeout, DEFAULT_POLL).await {
            debug!("locator resolved: {}", loc.as_str());
            return Some(loc);
        }
    }
    None
}

/// Click the first locator in the chain that resolves and accepts a click.
/// A failed click moves on to the next candidate rather than aborting the
/// chain; the element may exist in a shape that is not clickable yet.
pub async fn click_first(page: &Page, chain: &[Locator<'_>], per_timeout: Duration) -> bool {
    for loc in chain {
        if !wait_for(page, loc, per_timeout, DEFAULT_POLL).await {
            continue;
        }
        let Some(el) = loc.find(page).await else {
            continue;
        };
        match el.click().await {
            Ok(_) => {
                debug!("clicked via {}", loc.as_str());
                return true;
            }
            Err(e) => {
                warn!("click via {} failed: {}", loc.as_str(), e);
                continue;
            }
        }
    }
    false
}
