use serde::Serialize;

/// Tag labels of one card, deduplicated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Display form used in the output file.
    pub fn joined(&self) -> String {
        self.0.join(", ")
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::default();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

/// One exhibitor card from the listing grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingItem {
    pub name: String,
    pub detail_url: String,
    pub primary_type: String,
    pub tags: TagSet,
}

/// Fields read from an exhibitor's detail page. Missing fields stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailInfo {
    pub description: String,
    pub maturity_level: String,
    pub hall: String,
    pub booth: String,
    pub country: String,
    pub schedule: String,
}

/// One row of the output file, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Tags")]
    pub tags: String,
    #[serde(rename = "Development stage")]
    pub development_stage: String,
    #[serde(rename = "Hall")]
    pub hall: String,
    #[serde(rename = "Booth")]
    pub booth: String,
    #[serde(rename = "Schedule")]
    pub schedule: String,
    #[serde(rename = "Origin")]
    pub origin: String,
    #[serde(rename = "URL")]
    pub url: String,
}

impl OutputRecord {
    pub fn new(item: ListingItem, detail: DetailInfo) -> Self {
        Self {
            tags: item.tags.joined(),
            name: item.name,
            url: item.detail_url,
            description: detail.description,
            development_stage: detail.maturity_level,
            hall: detail.hall,
            booth: detail.booth,
            schedule: detail.schedule,
            origin: detail.country,
        }
    }
}
