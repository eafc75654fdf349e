mod classify;
mod detail;
mod filters;
mod listing;
mod model;
mod pipeline;
mod settings;
mod sink;
mod web;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::warn;

use crate::detail::{fetch_detail, DetailTimeouts};
use crate::pipeline::Pipeline;
use crate::settings::Settings;
use crate::sink::CsvSink;
use crate::web::webdriver::WebDriverBrowser;
use crate::web::Browser;

#[derive(Parser)]
#[command(name = "expo_scout", about = "Exhibitor directory scraper driven through WebDriver")]
struct Cli {
    /// Settings file (default: ./expo_scout.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// WebDriver endpoint, e.g. http://localhost:9515
    #[arg(long, global = true)]
    webdriver: Option<String>,

    /// Run the browser without a window
    #[arg(long, global = true)]
    headless: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the listing, classify exhibitors and write the CSV
    Run {
        /// Output file; an existing file is never overwritten
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Listing page URL
        #[arg(long)]
        listing_url: Option<String>,
        /// Hashtag filters, comma-separated ("" for none)
        #[arg(long, value_delimiter = ',')]
        hashtags: Option<Vec<String>>,
        /// Company type filters, comma-separated ("" for none)
        #[arg(long, value_delimiter = ',')]
        company_types: Option<Vec<String>>,
        /// Max scroll rounds while waiting for the listing to stop growing
        #[arg(long)]
        max_rounds: Option<u32>,
        /// Quarter-step scroll passes before the convergence loop
        #[arg(long)]
        scroll_passes: Option<u32>,
    },
    /// Fetch one exhibitor detail page and print its fields
    Detail { url: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(url) = cli.webdriver {
        settings.webdriver_url = url;
    }
    if cli.headless {
        settings.headless = true;
    }

    let result = match cli.command {
        Commands::Run {
            output,
            listing_url,
            hashtags,
            company_types,
            max_rounds,
            scroll_passes,
        } => {
            if let Some(output) = output {
                settings.output = output;
            }
            if let Some(url) = listing_url {
                settings.listing_url = url;
            }
            if let Some(tags) = hashtags {
                settings.hashtags = non_empty(tags);
            }
            if let Some(types) = company_types {
                settings.company_types = non_empty(types);
            }
            if let Some(n) = max_rounds {
                settings.max_rounds = n;
            }
            if let Some(n) = scroll_passes {
                settings.scroll_passes = n;
            }
            run(&settings).await
        }
        Commands::Detail { url } => show_detail(&settings, &url).await,
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run(settings: &Settings) -> anyhow::Result<()> {
    let browser = WebDriverBrowser::connect(&settings.webdriver_url, settings.headless).await?;
    let mut sink = CsvSink::new(&settings.output);

    let report = Pipeline::new(&browser, settings).run(&mut sink).await;

    if let Err(e) = browser.shutdown().await {
        warn!("Failed to close the browser: {}", e);
    }

    println!(
        "Completed! {} exhibitors listed, {} detail pages visited, {} matching.",
        report.listed, report.fetched, report.accepted
    );
    match &report.output {
        Some(path) => println!("Saved to {}", path.display()),
        None => println!("Nothing saved."),
    }
    if let Some(reason) = &report.failure {
        println!("Run ended early after '{}': {}", report.reached, reason);
    }
    Ok(())
}

async fn show_detail(settings: &Settings, url: &str) -> anyhow::Result<()> {
    let browser = WebDriverBrowser::connect(&settings.webdriver_url, settings.headless).await?;
    let info = fetch_detail(&browser, url, &DetailTimeouts::from(settings)).await;
    if let Err(e) = browser.shutdown().await {
        warn!("Failed to close the browser: {}", e);
    }

    println!("Description:       {}", truncate(&info.description, 160));
    println!("Development stage: {}", info.maturity_level);
    println!("Hall:              {}", info.hall);
    println!("Booth:             {}", info.booth);
    println!("Origin:            {}", info.country);
    println!("Schedule:          {}", info.schedule);
    Ok(())
}

fn non_empty(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
