//! Restoring a serialized login session.
//!
//! The session file uses the Playwright `storageState` layout: a `cookies`
//! array plus per-origin `localStorage` entries. Cookies go straight into the
//! browser over CDP; local storage is replayed by a script that runs before
//! any page script on a matching origin.

use std::collections::BTreeMap;
use std::path::Path;

use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, CookieSameSite, SetCookiesParams, TimeSinceEpoch,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;
use serde::{Deserialize, Serialize};

use crate::error::BrowserError;

/// Serialized authenticated browser session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageState {
    #[serde(default)]
    pub cookies: Vec<StoredCookie>,
    #[serde(default)]
    pub origins: Vec<StoredOrigin>,
}

/// One persisted cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Unix seconds; -1 marks a session cookie
    #[serde(default = "default_expires")]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: Option<String>,
}

fn default_path() -> String {
    "/".into()
}

fn default_expires() -> f64 {
    -1.0
}

/// Local storage of one origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredOrigin {
    pub origin: String,
    #[serde(default)]
    pub local_storage: Vec<StorageEntry>,
}

/// A local storage key/value pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageEntry {
    pub name: String,
    pub value: String,
}

impl StorageState {
    /// Read and parse a session file.
    pub fn load(path: &Path) -> Result<Self, BrowserError> {
        let content = std::fs::read_to_string(path).map_err(|e| BrowserError::SessionState {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| BrowserError::SessionState {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Cookies as CDP parameters. Malformed entries are skipped.
    pub fn cookie_params(&self) -> Vec<CookieParam> {
        self.cookies
            .iter()
            .filter_map(|cookie| match cookie.to_param() {
                Ok(param) => Some(param),
                Err(reason) => {
                    tracing::debug!(cookie = %cookie.name, %reason, "Skipping stored cookie");
                    None
                }
            })
            .collect()
    }

    /// Script restoring local storage for whichever stored origin the
    /// document belongs to. `None` when there is nothing to restore.
    pub fn local_storage_script(&self) -> Option<String> {
        let entries: BTreeMap<&str, Vec<(&str, &str)>> = self
            .origins
            .iter()
            .filter(|o| !o.local_storage.is_empty())
            .map(|o| {
                let pairs = o
                    .local_storage
                    .iter()
                    .map(|e| (e.name.as_str(), e.value.as_str()))
                    .collect();
                (o.origin.as_str(), pairs)
            })
            .collect();

        if entries.is_empty() {
            return None;
        }

        let payload = serde_json::to_string(&entries).ok()?;
        Some(format!(
            "(() => {{ const stored = {payload}; \
             const items = stored[window.location.origin]; \
             if (!items) return; \
             for (const [k, v] of items) {{ try {{ window.localStorage.setItem(k, v); }} catch (e) {{}} }} }})();"
        ))
    }

    /// Install cookies and the local storage script on a page.
    ///
    /// Must run before the first navigation.
    pub async fn apply(&self, page: &Page) -> Result<(), BrowserError> {
        let cookies = self.cookie_params();
        let cookie_count = cookies.len();
        if !cookies.is_empty() {
            page.execute(SetCookiesParams::new(cookies)).await?;
        }

        if let Some(script) = self.local_storage_script() {
            page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(script))
                .await?;
        }

        tracing::debug!(
            cookies = cookie_count,
            origins = self.origins.len(),
            "Session state applied"
        );
        Ok(())
    }
}

impl StoredCookie {
    fn to_param(&self) -> Result<CookieParam, String> {
        let mut builder = CookieParam::builder()
            .name(self.name.clone())
            .value(self.value.clone())
            .domain(self.domain.clone())
            .path(self.path.clone())
            .secure(self.secure)
            .http_only(self.http_only);

        if self.expires > 0.0 {
            builder = builder.expires(TimeSinceEpoch::new(self.expires));
        }
        if let Some(same_site) = self.same_site.as_deref().and_then(parse_same_site) {
            builder = builder.same_site(same_site);
        }

        builder.build()
    }
}

fn parse_same_site(value: &str) -> Option<CookieSameSite> {
    match value.to_ascii_lowercase().as_str() {
        "strict" => Some(CookieSameSite::Strict),
        "lax" => Some(CookieSameSite::Lax),
        "none" => Some(CookieSameSite::None),
        _ => None,
    }
}
