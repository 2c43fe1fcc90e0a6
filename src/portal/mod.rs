//! Portal interaction layer.
//!
//! Every public operation here returns a success/failure signal (`bool` or
//! `Option`) instead of raising: element probing against a third-party DOM
//! fails routinely, and the callers decide whether a failure skips one work
//! unit or ends the run. See the individual modules for the fallback chains.

pub mod auth;
pub mod download;
pub mod search;
pub mod section;

use chromiumoxide::Page;

/// Evaluate a JS expression and pull out a string-ish value, swallowing
/// every error along the way. Shared by the fill-verification reads.
pub(crate) async fn eval_string(page: &Page, js: String) -> Option<String> {
    page.evaluate(js)
        .await
        .ok()?
        .into_value::<Option<String>>()
        .ok()?
}
