use std::time::Duration;

use tracing::{debug, info, warn};

use crate::model::{ListingItem, TagSet};
use crate::web::{Browser, Node, Selector, WebError};

pub const GRID: Selector = Selector::css(r".w-full.max-w-\[1800px\].mx-auto.text-center.grid");
pub const CARD: Selector =
    Selector::css("div.flex.flex-col.relative.overflow-hidden.text-foreground.box-border.outline-none");

// Ordered fallbacks per field: first selector that finds a node wins.
pub const NAME_CHAIN: &[Selector] = &[
    Selector::css("h3.text-purple.font-bold.uppercase a"),
    Selector::css("h3 a"),
];
pub const TYPE_CHAIN: &[Selector] = &[
    Selector::css("div.flex.flex-wrap span.font-bold.capitalize"),
    Selector::css("span.font-bold.capitalize"),
];
pub const TAG_CHAIN: &[Selector] = &[
    Selector::css("div.my-4.flex.flex-wrap.gap-2 div.relative.max-w-fit.min-w-min span.flex-1"),
    Selector::css("div.flex-wrap span.flex-1"),
];

/// Why a card produced no item.
#[derive(Debug, thiserror::Error)]
pub enum ItemFault {
    #[error("card has no usable name or link")]
    Unusable,
    #[error(transparent)]
    Web(#[from] WebError),
}

/// Wait for the results grid. Returns false on timeout; extraction still runs.
pub async fn wait_for_grid<B: Browser>(browser: &B, timeout: Duration) -> bool {
    match browser.wait_for(&GRID, timeout).await {
        Ok(_) => {
            info!("Results grid loaded");
            true
        }
        Err(e) => {
            warn!("Results grid not found: {}", e);
            false
        }
    }
}

/// Extract every card rendered right now. Faulty or unusable cards are skipped.
pub async fn extract_all<B: Browser>(browser: &B) -> Result<Vec<ListingItem>, WebError> {
    let cards = browser.find_all(&CARD).await?;
    info!("Number of cards found: {}", cards.len());

    let mut items = Vec::with_capacity(cards.len());
    for (i, card) in cards.iter().enumerate() {
        match extract_item(card).await {
            Ok(item) => items.push(item),
            Err(ItemFault::Unusable) => warn!("Skipping card {}: no name or link", i + 1),
            Err(e) => warn!("Error extracting card {}: {}", i + 1, e),
        }
    }

    info!("Extracted {} of {} cards", items.len(), cards.len());
    Ok(items)
}

/// Name and link are required; any fault there loses the card. Type and tags
/// degrade to empty on their own faults.
pub async fn extract_item<N: Node>(card: &N) -> Result<ListingItem, ItemFault> {
    let (name, detail_url) = match first_match(card, NAME_CHAIN).await? {
        Some(anchor) => (
            anchor.text().await?.trim().to_string(),
            anchor.attr("href").await?.unwrap_or_default(),
        ),
        None => (String::new(), String::new()),
    };
    if name.is_empty() || detail_url.is_empty() {
        return Err(ItemFault::Unusable);
    }

    let primary_type = match extract_type(card).await {
        Ok(t) => t,
        Err(e) => {
            warn!("Error extracting type of {}: {}", name, e);
            String::new()
        }
    };

    let tags = match extract_tags(card).await {
        Ok(tags) => tags,
        Err(e) => {
            warn!("Error extracting hashtags of {}: {}", name, e);
            TagSet::default()
        }
    };

    Ok(ListingItem {
        name,
        detail_url,
        primary_type,
        tags,
    })
}

async fn first_match<N: Node>(card: &N, chain: &[Selector]) -> Result<Option<N>, WebError> {
    for selector in chain {
        match card.find(selector).await {
            Ok(node) => return Ok(Some(node)),
            Err(e) if e.is_absent() => debug!("No match for {}", selector),
            Err(e) => return Err(e),
        }
    }
    Ok(None)
}

async fn extract_type<N: Node>(card: &N) -> Result<String, WebError> {
    match first_match(card, TYPE_CHAIN).await? {
        Some(node) => Ok(node.text().await?.trim().to_string()),
        None => Ok(String::new()),
    }
}

async fn extract_tags<N: Node>(card: &N) -> Result<TagSet, WebError> {
    let mut tags = TagSet::default();
    for selector in TAG_CHAIN {
        let nodes = card.find_all(selector).await?;
        if nodes.is_empty() {
            continue;
        }
        for node in &nodes {
            let text = match node.text().await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping unreadable tag: {}", e);
                    continue;
                }
            };
            let text = text.trim();
            // each tag is decorated with a separate "#" span
            if !text.is_empty() && !text.starts_with('#') {
                tags.insert(text);
            }
        }
        break;
    }
    Ok(tags)
}

// ── Tests ──
