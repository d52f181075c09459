//! Background summarizer

use std::sync::Arc;
use std::time::Duration;

use digest_services::DigestService;
use tokio::time::interval;
use tracing::{error, info, warn};

/// Fetch, summarize and sweep the cache every `period`, forever
pub async fn run_summarizer(service: Arc<DigestService>, ignore_older_than_days: i64, period: Duration) {
    info!(
        "Starting summarizer for {} feed(s) with {}s interval",
        service.feed_urls().len(),
        period.as_secs()
    );

    let mut ticker = interval(period);
    loop {
        ticker.tick().await;

        match service.run(ignore_older_than_days).await {
            Ok(count) => info!("Summarized {} new item(s)", count),
            Err(errors) if errors.is_retryable() => {
                warn!(
                    "Model overloaded, remaining items are left for the next run:\n{}",
                    errors
                );
            }
            Err(errors) => error!("Summarization finished with {} error(s):\n{}", errors.len(), errors),
        }

        service.delete_old_cached_items();
    }
}
