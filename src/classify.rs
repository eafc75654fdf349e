use std::sync::LazyLock;

use regex::Regex;

use crate::model::{DetailInfo, ListingItem};

/// Description keywords (English and French) that count as AI evidence.
pub const AI_KEYWORDS: &[&str] = &[
    "ai",
    "ia",
    "artificial intelligence",
    "intelligence artificielle",
    "machine learning",
    "neural",
    "deep learning",
];

// Whole words only, so "ai" does not fire inside "said" or "maintain".
static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = AI_KEYWORDS.iter().map(|k| regex::escape(k)).collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))).unwrap()
});

pub fn mentions_keyword(description: &str) -> bool {
    KEYWORD_RE.is_match(description)
}

/// Two-stage keep/discard decision.
///
/// Keep = relevance tag AND (secondary tag OR keyword in the description).
#[derive(Debug, Clone)]
pub struct InclusionClassifier {
    relevance_tag: String,
    secondary_tag: String,
}

impl Default for InclusionClassifier {
    fn default() -> Self {
        Self::new("Cybersecurity", "Artificial Intelligence")
    }
}

impl InclusionClassifier {
    pub fn new(relevance_tag: &str, secondary_tag: &str) -> Self {
        Self {
            relevance_tag: relevance_tag.to_string(),
            secondary_tag: secondary_tag.to_string(),
        }
    }

    /// Gate in front of the (expensive) detail page visit.
    pub fn should_fetch_detail(&self, item: &ListingItem) -> bool {
        item.tags.contains(&self.relevance_tag)
            && !item.name.is_empty()
            && !item.detail_url.is_empty()
    }

    pub fn should_include(&self, item: &ListingItem, detail: &DetailInfo) -> bool {
        if !item.tags.contains(&self.relevance_tag) {
            return false;
        }
        item.tags.contains(&self.secondary_tag) || mentions_keyword(&detail.description)
    }
}
