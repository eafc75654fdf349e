//! Exhibitor detail pages.
//!
//! Each page is read in its own browsing context. Every field is looked up
//! independently and degrades to an empty string; a failed visit yields an
//! all-empty [`DetailInfo`]. The secondary context is torn down on every exit path.

use std::future::Future;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::model::DetailInfo;
use crate::settings::Settings;
use crate::web::{Browser, ContextHandle, Node, Selector, WebError};

pub const BODY: Selector = Selector::css("body");
pub const DESCRIPTION: Selector = Selector::css("div.my-4.text-xs.leading-relaxed");
pub const MATURITY: Selector =
    Selector::xpath("//p[contains(text(), 'development level')]/following-sibling::p");
pub const LOCATION: Selector = Selector::xpath(
    "//span[contains(@class, 'symbols') and contains(text(), 'distance')]/following-sibling::span",
);
pub const ORIGIN: Selector = Selector::xpath(
    "//span[contains(@class, 'symbols') and contains(text(), 'flag')]/following-sibling::span",
);
pub const SCHEDULE: Selector = Selector::xpath("//span[contains(@class, 'block mt-1')]");

// "hall1 Booth C27-012"
static LOCATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^hall\s*(\d+)\s+booth\s+([A-Z0-9-]+)").unwrap());

#[derive(Debug, Clone, Copy)]
pub struct DetailTimeouts {
    pub page: Duration,
    pub description: Duration,
    pub field: Duration,
}

impl From<&Settings> for DetailTimeouts {
    fn from(s: &Settings) -> Self {
        Self {
            page: Duration::from_secs(s.page_timeout_secs),
            description: Duration::from_secs(s.description_timeout_secs),
            field: Duration::from_secs(s.field_timeout_secs),
        }
    }
}

/// Visit `url` in a fresh context and read its fields. Never fails.
pub async fn fetch_detail<B: Browser>(
    browser: &B,
    url: &str,
    timeouts: &DetailTimeouts,
) -> DetailInfo {
    let visit = within_secondary_context(browser, || async move {
        browser.goto(url).await?;
        info!("Visiting detail page in new tab: {}", url);
        browser.wait_for(&BODY, timeouts.page).await?;
        Ok::<_, WebError>(read_fields(browser, timeouts).await)
    })
    .await;

    match visit {
        Ok(detail) => detail,
        Err(e) => {
            warn!("Error getting details for {}: {}", url, e);
            DetailInfo::default()
        }
    }
}

/// Run `body` with a new context as the current one, then close that context
/// and switch back to the one that was current on entry.
pub async fn within_secondary_context<B, F, Fut, T>(browser: &B, body: F) -> Result<T, WebError>
where
    B: Browser,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, WebError>>,
{
    let origin = browser.current_context().await?;
    let mut opened: Option<ContextHandle> = None;

    let outcome = async {
        let tab = browser.open_context().await?;
        opened = Some(tab.clone());
        browser.switch_context(&tab).await?;
        body().await
    }
    .await;

    restore_context(browser, &origin, opened.as_ref()).await;
    outcome
}

async fn restore_context<B: Browser>(
    browser: &B,
    origin: &ContextHandle,
    opened: Option<&ContextHandle>,
) {
    if let Some(tab) = opened {
        let closed = async {
            browser.switch_context(tab).await?;
            browser.close_context().await
        }
        .await;
        if let Err(e) = closed {
            warn!("Failed to close context {}: {}", tab, e);
        }
    }

    if let Err(e) = browser.switch_context(origin).await {
        warn!("Failed to return to the original context: {}", e);
    }
}

async fn read_fields<B: Browser>(browser: &B, timeouts: &DetailTimeouts) -> DetailInfo {
    let description = read_text(browser, "Description", &DESCRIPTION, timeouts.description).await;
    let maturity_level = read_text(browser, "Development level", &MATURITY, timeouts.field).await;
    let location = read_text(browser, "Booth information", &LOCATION, timeouts.field).await;
    let (hall, booth) = parse_location(&location).unwrap_or_default();
    let country = read_text(browser, "Country", &ORIGIN, timeouts.field).await;
    let schedule = strip_parens(&read_text(browser, "Date", &SCHEDULE, timeouts.field).await);

    DetailInfo {
        description,
        maturity_level,
        hall,
        booth,
        country,
        schedule,
    }
}

async fn read_text<B: Browser>(
    browser: &B,
    label: &str,
    selector: &Selector,
    timeout: Duration,
) -> String {
    let found = match browser.wait_for(selector, timeout).await {
        Ok(node) => node.text().await,
        Err(e) => Err(e),
    };

    match found {
        Ok(text) => {
            let text = text.trim().to_string();
            debug!("{}: {}", label, text);
            text
        }
        Err(e) if e.is_absent() => {
            info!("{} not found", label);
            String::new()
        }
        Err(e) => {
            warn!("Failed to read {}: {}", label, e);
            String::new()
        }
    }
}

/// `"hall1 Booth C27-012"` → `("Hall 1", "C27-012")`.
pub fn parse_location(text: &str) -> Option<(String, String)> {
    let caps = LOCATION_RE.captures(text.trim())?;
    Some((format!("Hall {}", &caps[1]), caps[2].to_string()))
}

pub fn strip_parens(text: &str) -> String {
    text.replace(['(', ')'], "").trim().to_string()
}

// ── Tests ──
