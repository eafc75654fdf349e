use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "expo_scout";
const ENV_PREFIX: &str = "EXPO_SCOUT";

/// Run settings: defaults, then `expo_scout.toml` (or `--config`), then
/// `EXPO_SCOUT_*` environment variables. CLI flags are applied on top by `main`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub webdriver_url: String,
    pub headless: bool,
    pub listing_url: String,
    pub output: PathBuf,

    /// Hashtag facet allow-list; empty applies no filter.
    pub hashtags: Vec<String>,
    /// Company-type facet allow-list; empty applies no filter.
    pub company_types: Vec<String>,

    pub relevance_tag: String,
    pub secondary_tag: String,

    pub max_rounds: u32,
    pub settle_delay_ms: u64,
    pub scroll_passes: u32,
    pub step_delay_ms: u64,
    pub filter_pause_ms: u64,

    pub page_timeout_secs: u64,
    pub consent_timeout_secs: u64,
    pub grid_timeout_secs: u64,
    pub option_timeout_secs: u64,
    pub description_timeout_secs: u64,
    pub field_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".into(),
            headless: false,
            listing_url: "https://vivatechnology.com/partners".into(),
            output: PathBuf::from("vivatech_cybersecurity_ai_partners.csv"),
            hashtags: vec!["Cybersecurity".into()],
            company_types: vec!["Startup".into()],
            relevance_tag: "Cybersecurity".into(),
            secondary_tag: "Artificial Intelligence".into(),
            max_rounds: 20,
            settle_delay_ms: 1500,
            scroll_passes: 0,
            step_delay_ms: 1500,
            filter_pause_ms: 1000,
            page_timeout_secs: 10,
            consent_timeout_secs: 10,
            grid_timeout_secs: 15,
            option_timeout_secs: 5,
            description_timeout_secs: 10,
            field_timeout_secs: 5,
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("hashtags")
        .with_list_parse_key("company_types")
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, environment())
    }

    fn load_with(path: Option<&Path>, env: Environment) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(env)
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn filter_pause(&self) -> Duration {
        Duration::from_millis(self.filter_pause_ms)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn consent_timeout(&self) -> Duration {
        Duration::from_secs(self.consent_timeout_secs)
    }

    pub fn grid_timeout(&self) -> Duration {
        Duration::from_secs(self.grid_timeout_secs)
    }

    pub fn option_timeout(&self) -> Duration {
        Duration::from_secs(self.option_timeout_secs)
    }
}
