use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::fetch::{FetchError, FetchStrategy, PageContext};
use crate::throttle::OriginThrottle;

/// Walks a strategy's pages until exhaustion or the safety cap.
///
/// Stop conditions, checked in order per page: an empty page, the page cap,
/// a short page (fewer records than requested). Every page request first
/// claims a slot from the shared origin throttle.
#[derive(Debug, Clone)]
pub struct PageWalker {
    throttle: Arc<OriginThrottle>,
    max_pages: u32,
    page_size: u32,
    min_request_interval: Duration,
}

impl PageWalker {
    pub fn new(
        throttle: Arc<OriginThrottle>,
        max_pages: u32,
        page_size: u32,
        min_request_interval: Duration,
    ) -> Self {
        Self {
            throttle,
            max_pages: max_pages.max(1),
            page_size,
            min_request_interval,
        }
    }

    pub async fn collect(&self, source: &dyn FetchStrategy) -> Result<Vec<Value>, FetchError> {
        let mut records = Vec::new();

        for page in 1..=self.max_pages {
            self.throttle
                .acquire(source.origin(), self.min_request_interval)
                .await;

            let ctx = PageContext {
                page,
                page_size: self.page_size,
            };
            let batch = source.fetch(ctx).await?;

            if batch.is_empty() {
                debug!(strategy = source.name(), page, "empty page, pagination complete");
                break;
            }

            let short_page = (batch.len() as u32) < self.page_size;
            records.extend(batch);

            if page == self.max_pages {
                warn!(
                    strategy = source.name(),
                    max_pages = self.max_pages,
                    "page cap reached, result may be truncated"
                );
                break;
            }
            if short_page {
                debug!(strategy = source.name(), page, "short page, pagination complete");
                break;
            }
        }

        Ok(records)
    }
}
