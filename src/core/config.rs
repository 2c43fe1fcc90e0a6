use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// PortalConfig - file-based config loader (chemscout.json) with env-var fallback
// ---------------------------------------------------------------------------

pub const ENV_PORTAL_URL: &str = "SMARTCHEM_URL";
pub const ENV_PORTAL_USERNAME: &str = "SMARTCHEM_USERNAME";
pub const ENV_PORTAL_PASSWORD: &str = "SMARTCHEM_PASSWORD";
pub const ENV_CONFIG_PATH: &str = "CHEMSCOUT_CONFIG";
pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";

/// Top-level config loaded from `chemscout.json`.
///
/// Credentials are deliberately not validated up front: an absent username
/// or password surfaces later as a failed form fill or a failed login, which
/// is where the portal reports it anyway.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct PortalConfig {
    /// Portal root, e.g. `https://portal.example.com`. Never logged with
    /// credentials attached.
    pub base_url: Option<String>,
    pub username: Option<String>,
    /// Password. Never logged.
    pub password: Option<String>,
}

impl PortalConfig {
    /// Base URL: JSON field -> `SMARTCHEM_URL` env var -> empty string.
    pub fn resolve_base_url(&self) -> String {
        if let Some(u) = &self.base_url {
            if !u.trim().is_empty() {
                return u.trim().to_string();
            }
        }
        std::env::var(ENV_PORTAL_URL)
            .ok()
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    /// Username: JSON field -> `SMARTCHEM_USERNAME` env var -> empty string.
    pub fn resolve_username(&self) -> String {
        if let Some(u) = &self.username {
            return u.trim().to_string();
        }
        std::env::var(ENV_PORTAL_USERNAME).unwrap_or_default()
    }

    /// Password: JSON field -> `SMARTCHEM_PASSWORD` env var -> empty string.
    pub fn resolve_password(&self) -> String {
        if let Some(p) = &self.password {
            return p.clone();
        }
        std::env::var(ENV_PORTAL_PASSWORD).unwrap_or_default()
    }
}

/// Load `chemscout.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `CHEMSCOUT_CONFIG` env var path
/// 2. `./chemscout.json`
/// 3. `../chemscout.json`
///
/// Missing file -> `PortalConfig::default()` (silent, env-var fallbacks apply).
/// Parse error -> log a warning, return `PortalConfig::default()`.
pub fn load_portal_config() -> PortalConfig {
    let candidates: Vec<PathBuf> = {
        let mut v = vec![
            PathBuf::from("chemscout.json"),
            PathBuf::from("../chemscout.json"),
        ];
        if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
            v.insert(0, PathBuf::from(env_path));
        }
        v
    };

    for path in &candidates {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<PortalConfig>(&contents) {
                Ok(cfg) => {
                    tracing::info!("chemscout.json loaded from {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    tracing::warn!(
                        "chemscout.json parse error at {}: {} - using env fallbacks",
                        path.display(),
                        e
                    );
                    return PortalConfig::default();
                }
            },
            Err(_) => continue, // file not found at this path - try next
        }
    }

    PortalConfig::default()
}

// ---------------------------------------------------------------------------
// Login form selectors. The portal's login markup has been stable for years;
// it is the search and detail pages that shift under us (see portal::search).
// ---------------------------------------------------------------------------

pub const SELECTOR_USERNAME: &str = r#"input[name="login"]"#;
pub const SELECTOR_PASSWORD: &str = r#"input[name="password"]"#;
pub const SELECTOR_LOGIN_BUTTON: &str = "input.user-submit";

/// Optional override for the Chromium-family browser executable.
///
/// Default behavior is auto-discovery (see `browser::find_chrome_executable`).
/// This function only returns a value when `CHROME_EXECUTABLE` is set to an
/// existing path.
pub fn chrome_executable_override() -> Option<String> {
    let p = std::env::var(ENV_CHROME_EXECUTABLE).ok()?;
    let p = p.trim();
    if p.is_empty() {
        return None;
    }
    if Path::new(p).exists() {
        Some(p.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_fields_win_over_defaults() {
        let cfg: PortalConfig = serde_json::from_str(
            r#"{"base_url": " https://portal.example.com ", "username": "alice"}"#,
        )
        .unwrap();
        assert_eq!(cfg.resolve_base_url(), "https://portal.example.com");
        assert_eq!(cfg.resolve_username(), "alice");
    }

    #[test]
    fn unknown_fields_are_rejected_gracefully() {
        // A config with extra keys still parses; serde ignores unknowns.
        let cfg: PortalConfig =
            serde_json::from_str(r#"{"base_url": "https://x", "theme": "dark"}"#).unwrap();
        assert_eq!(cfg.resolve_base_url(), "https://x");
    }
}
