use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info};

use crate::classify::InclusionClassifier;
use crate::detail::{fetch_detail, DetailTimeouts};
use crate::filters::{accept_consent, apply_filters, FilterTimings, FACET_TRIGGER};
use crate::listing::extract::{extract_all, wait_for_grid, CARD};
use crate::listing::pager::{exhaust_listing, stepped_scroll};
use crate::model::OutputRecord;
use crate::settings::Settings;
use crate::sink::RecordSink;
use crate::web::Browser;

/// Linear run stages. A run only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    NotStarted,
    PageLoaded,
    ConsentHandled,
    FiltersApplied,
    ListingExhausted,
    Classified,
    Persisted,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::NotStarted => "not started",
            Stage::PageLoaded => "page loaded",
            Stage::ConsentHandled => "consent handled",
            Stage::FiltersApplied => "filters applied",
            Stage::ListingExhausted => "listing exhausted",
            Stage::Classified => "extracted and classified",
            Stage::Persisted => "persisted",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct RunReport {
    /// Last stage reached before persisting.
    pub reached: Stage,
    pub stage: Stage,
    pub listed: usize,
    pub fetched: usize,
    pub accepted: usize,
    pub output: Option<PathBuf>,
    pub failure: Option<String>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            reached: Stage::NotStarted,
            stage: Stage::NotStarted,
            listed: 0,
            fetched: 0,
            accepted: 0,
            output: None,
            failure: None,
        }
    }

    fn advance(&mut self, stage: Stage) {
        debug!("Stage: {} -> {}", self.stage, stage);
        self.stage = stage;
    }
}

pub struct Pipeline<'a, B: Browser> {
    browser: &'a B,
    settings: &'a Settings,
    classifier: InclusionClassifier,
}

impl<'a, B: Browser> Pipeline<'a, B> {
    pub fn new(browser: &'a B, settings: &'a Settings) -> Self {
        Self {
            browser,
            settings,
            classifier: InclusionClassifier::new(&settings.relevance_tag, &settings.secondary_tag),
        }
    }

    /// Run every stage once. Whatever was collected is handed to `sink`, even
    /// when a stage fails.
    pub async fn run(&self, sink: &mut dyn RecordSink) -> RunReport {
        let mut report = RunReport::new();
        let mut records = Vec::new();

        if let Err(e) = self.collect(&mut report, &mut records).await {
            error!("Run stopped after stage '{}': {:#}", report.stage, e);
            report.failure = Some(format!("{:#}", e));
        }
        report.reached = report.stage;

        report.accepted = records.len();
        match sink.persist(&records) {
            Ok(path) => report.output = path,
            Err(e) => {
                error!("Error saving data: {:#}", e);
                report.failure.get_or_insert_with(|| format!("{:#}", e));
            }
        }
        report.advance(Stage::Persisted);
        report.advance(Stage::Done);
        report
    }

    async fn collect(&self, report: &mut RunReport, records: &mut Vec<OutputRecord>) -> Result<()> {
        let s = self.settings;
        let browser = self.browser;

        browser
            .goto(&s.listing_url)
            .await
            .context("Failed to load listing page")?;
        browser
            .wait_for(&FACET_TRIGGER, s.page_timeout())
            .await
            .context("Listing page did not render")?;
        info!("Page loaded: {}", s.listing_url);
        report.advance(Stage::PageLoaded);

        if let Err(e) = accept_consent(browser, s.consent_timeout()).await {
            info!("No cookie banner accepted: {}", e);
        }
        report.advance(Stage::ConsentHandled);

        let timings = FilterTimings {
            dropdown: s.page_timeout(),
            option: s.option_timeout(),
            pause: s.filter_pause(),
        };
        let selected = apply_filters(browser, &s.hashtags, &s.company_types, &timings).await;
        info!("{} filter options selected", selected);
        wait_for_grid(browser, s.grid_timeout()).await;
        report.advance(Stage::FiltersApplied);

        if s.scroll_passes > 0 {
            stepped_scroll(browser, s.scroll_passes, s.step_delay()).await?;
        }
        let paged = exhaust_listing(browser, &CARD, s.max_rounds, s.settle_delay()).await?;
        info!(
            "Listing has at least {} items ({} rounds, converged: {})",
            paged.final_count, paged.rounds, paged.converged
        );
        debug!("Counts per round: {:?}", paged.counts);
        report.advance(Stage::ListingExhausted);

        let items = extract_all(browser).await?;
        report.listed = items.len();

        let timeouts = DetailTimeouts::from(s);
        let pb = progress_bar(items.len());
        for item in items {
            pb.inc(1);
            if !self.classifier.should_fetch_detail(&item) {
                debug!(
                    "Not relevant, detail skipped: {} ({}, {} tags)",
                    item.name,
                    item.primary_type,
                    item.tags.len()
                );
                continue;
            }

            let detail = fetch_detail(browser, &item.detail_url, &timeouts).await;
            report.fetched += 1;

            if self.classifier.should_include(&item, &detail) {
                info!("Added matching exhibitor: {}", item.name);
                records.push(OutputRecord::new(item, detail));
            } else {
                info!("Skipped exhibitor (no AI connection): {}", item.name);
            }
        }
        pb.finish_and_clear();
        report.advance(Stage::Classified);

        Ok(())
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
        .map(|s| s.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

// ── Tests ──
