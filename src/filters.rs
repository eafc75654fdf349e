use std::time::Duration;

use tracing::{info, warn};

use crate::web::{xpath_literal, Browser, Node, Selector, WebError};

pub const CONSENT_BUTTON: Selector = Selector::id("CybotCookiebotDialogBodyLevelButtonLevelOptinAllowAll");
pub const FACET_TRIGGER: Selector = Selector::css("[data-slot='trigger']");
pub const LISTBOX: Selector = Selector::css("[role='listbox']");
pub const PAGE_BODY: Selector = Selector::css("body");

/// A facet dropdown and how its options are matched.
#[derive(Debug, Clone, Copy)]
pub struct Facet {
    pub label: &'static str,
    pub exact: bool,
}

pub const HASHTAGS: Facet = Facet {
    label: "Hashtags",
    exact: true,
};
pub const COMPANY_TYPES: Facet = Facet {
    label: "Type of company",
    exact: false,
};

impl Facet {
    pub fn dropdown(&self) -> Selector {
        Selector::xpath_owned(format!(
            "//button[.//label[contains(text(), {})]]",
            xpath_literal(self.label)
        ))
    }

    pub fn option(&self, name: &str) -> Selector {
        let text = if self.exact {
            format!("text()={}", xpath_literal(name))
        } else {
            format!("contains(text(), {})", xpath_literal(name))
        };
        Selector::xpath_owned(format!("//li[@role='option']//span[{}]//ancestor::li", text))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FilterTimings {
    pub dropdown: Duration,
    pub option: Duration,
    pub pause: Duration,
}

/// Click the cookie banner's "allow all" button if it shows up.
pub async fn accept_consent<B: Browser>(browser: &B, timeout: Duration) -> Result<(), WebError> {
    let button = browser.wait_for(&CONSENT_BUTTON, timeout).await?;
    button.click().await?;
    info!("Cookie consent accepted");
    Ok(())
}

/// Select `names` in `facet`. Returns how many options were clicked.
///
/// Only a missing dropdown is an error; missing options are logged and skipped.
pub async fn select_facet<B: Browser>(
    browser: &B,
    facet: &Facet,
    names: &[String],
    timings: &FilterTimings,
) -> Result<usize, WebError> {
    if names.is_empty() {
        return Ok(0);
    }

    browser.wait_for(&facet.dropdown(), timings.dropdown).await?.click().await?;
    info!("{} dropdown opened", facet.label);
    browser.wait_for(&LISTBOX, timings.option).await?;

    let mut selected = 0;
    for name in names {
        let clicked = match browser.wait_for(&facet.option(name), timings.option).await {
            Ok(option) => option.click().await,
            Err(e) => Err(e),
        };
        match clicked {
            Ok(()) => {
                info!("{} '{}' selected", facet.label, name);
                selected += 1;
                tokio::time::sleep(timings.pause).await;
            }
            Err(e) => warn!("{} '{}' not found: {}", facet.label, name, e),
        }
    }

    // close the dropdown
    browser.find(&PAGE_BODY).await?.click().await?;
    tokio::time::sleep(timings.pause).await;
    Ok(selected)
}

/// Apply both facet allow-lists. A failing facet is logged and the other still runs.
pub async fn apply_filters<B: Browser>(
    browser: &B,
    hashtags: &[String],
    company_types: &[String],
    timings: &FilterTimings,
) -> usize {
    let mut selected = 0;
    for (facet, names) in [(HASHTAGS, hashtags), (COMPANY_TYPES, company_types)] {
        match select_facet(browser, &facet, names, timings).await {
            Ok(n) => selected += n,
            Err(e) => warn!("Error selecting {}: {}", facet.label, e),
        }
    }
    selected
}

// ── Tests ──
