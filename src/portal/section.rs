//! Detail-page section activation.
//!
//! The exact DOM shape of a section tab varies by chemical record (plain
//! anchor, nested anchor with a javascript href, onclick anchor, bare list
//! item), but its visible label does not. The candidates below encode that
//! assumption as an ordered chain, most specific first.

use chromiumoxide::Page;
use std::time::Duration;
use tracing::{debug, warn};

use crate::browser::locator::{self, Locator, DEFAULT_POLL};

const CANDIDATE_TIMEOUT: Duration = Duration::from_secs(2);

/// Open the named sub-section of the current detail page.
/// Returns on the first candidate that resolves and accepts a click.
pub async fn open_section(page: &Page, name: &str) -> bool {
    let label = xpath_literal(name);
    let candidates = [
        // Plain text match on an anchor.
        format!("//a[normalize-space(text())={label}]"),
        // Anchor with the detail-page javascript href, matched by label.
        format!(
            "//a[starts-with(@href,'javascript:getDetailsForChemical')]\
             [contains(normalize-space(.),{label})]"
        ),
        // Anchor wired through an onclick handler instead of an href.
        format!(
            "//a[contains(@onclick,'getDetailsForChemical')]\
             [contains(normalize-space(.),{label})]"
        ),
        // Some records render the tab as a bare list item.
        format!("//li[contains(normalize-space(.),{label})]"),
    ];

    for xpath in &candidates {
        let loc = Locator::XPath(xpath);
        if !locator::wait_for(page, &loc, CANDIDATE_TIMEOUT, DEFAULT_POLL).await {
            continue;
        }
        let Some(el) = loc.find(page).await else {
            continue;
        };
        match el.click().await {
            Ok(_) => {
                tokio::time::sleep(Duration::from_secs(1)).await;
                debug!("opened section {:?} via {}", name, xpath);
                return true;
            }
            Err(e) => {
                warn!("clicking section {:?} via {} failed: {}", name, xpath, e);
                continue;
            }
        }
    }

    warn!("could not find or open section {:?}", name);
    false
}

/// Quote a string for embedding in an XPath expression. XPath 1.0 has no
/// escape sequence inside string literals, so a label containing both quote
/// kinds needs the concat() form.
fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        return format!("'{s}'");
    }
    if !s.contains('"') {
        return format!("\"{s}\"");
    }
    let parts: Vec<String> = s
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

#[cfg(test)]
mod tests {
    use super::xpath_literal;

    #[test]
    fn plain_labels_use_single_quotes() {
        assert_eq!(xpath_literal("Applications"), "'Applications'");
    }

    #[test]
    fn labels_with_apostrophes_switch_quote_kind() {
        assert_eq!(xpath_literal("Supplier's"), "\"Supplier's\"");
    }

    #[test]
    fn labels_with_both_quote_kinds_use_concat() {
        assert_eq!(
            xpath_literal(r#"a'b"c"#),
            r#"concat('a', "'", 'b"c')"#
        );
    }
}
