use std::time::Duration;

use serde_json::Value;
use tracing::info;

use crate::web::{Browser, Selector, WebError};

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";
const PAGE_HEIGHT: &str = "return document.body.scrollHeight;";
const STEP_FRACTIONS: [f64; 4] = [0.25, 0.5, 0.75, 1.0];

/// Outcome of [`exhaust_listing`]. `final_count` is a lower bound on the listing size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerReport {
    pub rounds: u32,
    pub counts: Vec<usize>,
    pub final_count: usize,
    pub converged: bool,
}

/// Scroll until the number of items matching `selector` stops growing, or
/// `max_rounds` scrolls have been issued.
pub async fn exhaust_listing<B: Browser>(
    browser: &B,
    selector: &Selector,
    max_rounds: u32,
    settle_delay: Duration,
) -> Result<PagerReport, WebError> {
    let mut counts = Vec::new();
    let mut last: Option<usize> = None;
    let mut rounds = 0;

    while rounds < max_rounds {
        let current = browser.find_all(selector).await?.len();
        counts.push(current);
        info!("Current item count: {}", current);

        if last == Some(current) {
            info!("All items loaded after {} rounds.", rounds);
            return Ok(PagerReport {
                rounds,
                counts,
                final_count: current,
                converged: true,
            });
        }

        last = Some(current);
        browser.execute(SCROLL_TO_BOTTOM, Vec::new()).await?;
        tokio::time::sleep(settle_delay).await;
        rounds += 1;
    }

    let final_count = browser.find_all(selector).await?.len();
    counts.push(final_count);
    info!(
        "Stopped after {} rounds without convergence ({} items rendered)",
        max_rounds, final_count
    );
    Ok(PagerReport {
        rounds,
        counts,
        final_count,
        converged: false,
    })
}

/// Walk down the page in quarter steps, `passes` times, pausing after each step.
pub async fn stepped_scroll<B: Browser>(
    browser: &B,
    passes: u32,
    step_delay: Duration,
) -> Result<(), WebError> {
    for pass in 0..passes {
        info!("Scrolling slowly (pass {}/{})", pass + 1, passes);
        let height = match browser.execute(PAGE_HEIGHT, Vec::new()).await? {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            _ => 0.0,
        };

        for fraction in STEP_FRACTIONS {
            let script = format!("window.scrollTo(0, {});", (height * fraction).round());
            browser.execute(&script, Vec::new()).await?;
            tokio::time::sleep(step_delay).await;
        }
    }
    Ok(())
}

// ── Tests ──
