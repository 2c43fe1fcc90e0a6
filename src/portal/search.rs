//! Chemical search with tiered fill and submit fallbacks.
//!
//! The portal's search widget sometimes ignores programmatic value
//! assignment unless paired with native input events, and its markup varies
//! between deployments. Both the input locator and the fill mechanism are
//! ordered fallback chains; every tier must be exhausted before the
//! operation reports failure.

use chromiumoxide::Page;
use std::time::Duration;
use tracing::{error, warn};

use crate::browser::locator::{self, Locator, DEFAULT_POLL};
use crate::portal::eval_string;

/// Input candidates, most specific first. Short per-candidate timeout: the
/// page is already loaded by the time a search runs, so absence is cheap to
/// detect.
const INPUT_CANDIDATES: &[Locator<'static>] = &[
    Locator::Css("input#textInputChem"),
    Locator::Css(r#"input[name="T"]"#),
    Locator::Css("div#keyword input"),
    Locator::Css("input.searchField"),
];
const INPUT_CANDIDATE_TIMEOUT: Duration = Duration::from_millis(1200);

const SUBMIT_ANCHOR: Locator<'static> =
    Locator::Css(r#"a[onclick*="submitChemicalSearchForm"]"#);
const SEARCH_FORM_ID: &str = "theChemForm";

const FIRST_RESULT: Locator<'static> =
    Locator::Css(r#"a[href^="javascript:getDetailsForChemical"]"#);

/// Inter-key delay for the simulated-typing tier.
const TYPE_KEY_DELAY: Duration = Duration::from_millis(40);

/// Fill the search field with `query` and submit the search form.
///
/// Fill tiers, each verified by reading the field value back:
/// (a) direct value assignment, (b) simulated character-by-character typing,
/// (c) DOM value mutation plus synthetic input/change events.
/// Submit tiers: dedicated submit anchor, else the page's own submit routine.
pub async fn search_chemical(page: &Page, query: &str) -> bool {
    let Some(input) =
        locator::first_present(page, INPUT_CANDIDATES, INPUT_CANDIDATE_TIMEOUT).await
    else {
        error!("chemical search input not found (tried {} selectors)", INPUT_CANDIDATES.len());
        return false;
    };
    let css = input.as_str();

    let mut filled = fill_direct(page, css, query).await;
    if !filled {
        warn!("direct value assignment did not stick; trying simulated typing");
        filled = fill_typed(page, input, css, query).await;
    }
    if !filled {
        warn!("simulated typing did not stick; trying event-dispatch fill");
        filled = fill_dispatch(page, css, query).await;
    }
    if !filled {
        error!("unable to fill chemical input with any method");
        return false;
    }

    submit_search(page).await
}

/// Wait for the first result anchor and open it. Single-tier: if the anchor
/// never appears, there were no search results.
pub async fn open_first_result(page: &Page) -> bool {
    if !locator::wait_for(page, &FIRST_RESULT, Duration::from_secs(8), DEFAULT_POLL).await {
        error!("first result link not found");
        return false;
    }
    let Some(el) = FIRST_RESULT.find(page).await else {
        error!("first result link vanished before click");
        return false;
    };
    if let Err(e) = el.click().await {
        error!("could not click first result link: {}", e);
        return false;
    }
    tokio::time::sleep(Duration::from_millis(1500)).await;
    true
}

// ── Fill tiers ────────────────────────────────────────────────────────────────

/// Tier (a): plain `el.value = ...` with no events.
async fn fill_direct(page: &Page, css: &str, query: &str) -> bool {
    let (Ok(sel), Ok(q)) = (serde_json::to_string(css), serde_json::to_string(query)) else {
        return false;
    };
    let js = format!(
        "(() => {{ const el = document.querySelector({sel}); if (el) el.value = {q}; }})()"
    );
    if page.evaluate(js).await.is_err() {
        return false;
    }
    tokio::time::sleep(Duration::from_millis(200)).await;
    value_matches(current_value(page, css).await.as_deref(), query)
}

/// Tier (b): focus the field and type character by character, the way the
/// widget's own key handlers expect input to arrive.
async fn fill_typed(page: &Page, input: &Locator<'_>, css: &str, query: &str) -> bool {
    let Some(el) = input.find(page).await else {
        return false;
    };
    if el.click().await.is_err() {
        return false;
    }
    for ch in query.chars() {
        if el.type_str(ch.to_string()).await.is_err() {
            return false;
        }
        tokio::time::sleep(TYPE_KEY_DELAY).await;
    }
    tokio::time::sleep(Duration::from_millis(200)).await;
    value_matches(current_value(page, css).await.as_deref(), query)
}

/// Tier (c): mutate the value and dispatch synthetic input/change events so
/// framework listeners pick it up.
async fn fill_dispatch(page: &Page, css: &str, query: &str) -> bool {
    let (Ok(sel), Ok(q)) = (serde_json::to_string(css), serde_json::to_string(query)) else {
        return false;
    };
    let js = format!(
        "(() => {{ const el = document.querySelector({sel}); \
         if (!el) return null; \
         el.value = {q}; \
         el.dispatchEvent(new Event('input', {{bubbles: true}})); \
         el.dispatchEvent(new Event('change', {{bubbles: true}})); \
         return String(el.value); }})()"
    );
    match eval_string(page, js).await {
        Some(v) => value_matches(Some(v.as_str()), query),
        None => {
            warn!("event-dispatch fill returned nothing");
            false
        }
    }
}

async fn current_value(page: &Page, css: &str) -> Option<String> {
    let sel = serde_json::to_string(css).ok()?;
    let js = format!(
        "(() => {{ const el = document.querySelector({sel}); \
         return el ? String(el.value) : null; }})()"
    );
    eval_string(page, js).await
}

/// Case-insensitive substring match of the query against the field value.
fn value_matches(value: Option<&str>, query: &str) -> bool {
    match value {
        Some(v) if !v.is_empty() => v.to_lowercase().contains(&query.to_lowercase()),
        _ => false,
    }
}

// ── Submit tiers ──────────────────────────────────────────────────────────────

async fn submit_search(page: &Page) -> bool {
    if locator::wait_for(page, &SUBMIT_ANCHOR, Duration::from_secs(2), DEFAULT_POLL).await {
        if let Some(el) = SUBMIT_ANCHOR.find(page).await {
            match el.click().await {
                Ok(_) => {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    return true;
                }
                Err(e) => warn!("clicking submit anchor failed: {}", e),
            }
        }
    }

    // The anchor is absent on some result layouts; invoke the page's own
    // submit routine by form id instead.
    let js = format!("submitChemicalSearchForm(document.getElementById('{SEARCH_FORM_ID}'))");
    match page.evaluate(js).await {
        Ok(_) => {
            tokio::time::sleep(Duration::from_secs(1)).await;
            true
        }
        Err(e) => {
            error!("both click and JS submit failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::value_matches;

    #[test]
    fn value_match_is_case_insensitive_substring() {
        assert!(value_matches(Some("Trazodone Hydrochloride"), "trazodone"));
        assert!(value_matches(Some("19794-93-5"), "19794-93-5"));
        assert!(!value_matches(Some("Trazodone"), "hydrochloride"));
    }

    #[test]
    fn empty_or_missing_value_never_matches() {
        assert!(!value_matches(Some(""), "anything"));
        assert!(!value_matches(None, "anything"));
    }
}
