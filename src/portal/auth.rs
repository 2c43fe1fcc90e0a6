//! Session bootstrap and navigational reset.
//!
//! `login` runs once per process; there is no retry and no renewal. A failed
//! login means a config or portal problem, not a transient condition, so the
//! caller must abort the run. `return_to_home` runs between work units to
//! guarantee each search starts from a known state - without it the next
//! search silently operates on stale page context.

use chromiumoxide::Page;
use std::time::Duration;
use tracing::{error, info};

use crate::browser::locator::{self, Locator, DEFAULT_POLL};
use crate::core::config::{
    PortalConfig, SELECTOR_LOGIN_BUTTON, SELECTOR_PASSWORD, SELECTOR_USERNAME,
};

/// First load of the portal is slow; the login form can take tens of
/// seconds to appear.
const LOGIN_FIELD_TIMEOUT: Duration = Duration::from_secs(40);

const HOME_LINK: Locator<'static> =
    Locator::Css(r#"a[href*="MemberServlet"][href*="requestType=1101"]"#);
const HOME_TEXT_FALLBACK: Locator<'static> =
    Locator::XPath("//a[normalize-space(text())='Home']");

/// Navigate to the portal root and submit the login form.
/// Any navigation or fill failure is a terminal `false`.
pub async fn login(page: &Page, config: &PortalConfig) -> bool {
    let base_url = config.resolve_base_url();
    if let Err(e) = page.goto(base_url.as_str()).await {
        error!("could not navigate to portal root {:?}: {}", base_url, e);
        return false;
    }

    if !locator::wait_for(
        page,
        &Locator::Css(SELECTOR_USERNAME),
        LOGIN_FIELD_TIMEOUT,
        DEFAULT_POLL,
    )
    .await
    {
        error!("username field not found on login page");
        return false;
    }

    if let Err(e) = submit_credentials(page, config).await {
        error!("failed to fill or submit login form: {}", e);
        return false;
    }

    // Give the post-login redirect a moment to land.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    true
}

async fn submit_credentials(page: &Page, config: &PortalConfig) -> anyhow::Result<()> {
    let username = page.find_element(SELECTOR_USERNAME).await?;
    username.click().await?;
    username.type_str(config.resolve_username()).await?;

    let password = page.find_element(SELECTOR_PASSWORD).await?;
    password.click().await?;
    password.type_str(config.resolve_password()).await?;

    page.find_element(SELECTOR_LOGIN_BUTTON).await?.click().await?;
    Ok(())
}

/// Reset to the home page between work units.
///
/// Primary affordance is the member-servlet home link; the generic "Home"
/// text link is the fallback. Failure of both is reported to the caller,
/// which should stop the run rather than search from an unknown page.
pub async fn return_to_home(page: &Page) -> bool {
    if locator::click_first(page, &[HOME_LINK], Duration::from_secs(5)).await {
        tokio::time::sleep(Duration::from_secs(1)).await;
        info!("navigated back to home");
        return true;
    }

    if locator::click_first(page, &[HOME_TEXT_FALLBACK], Duration::from_secs(2)).await {
        tokio::time::sleep(Duration::from_secs(1)).await;
        info!("navigated back to home (text fallback)");
        return true;
    }

    error!("failed to navigate back to home");
    false
}
