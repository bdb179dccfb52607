use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

pub(crate) const MAX_RETRIES: usize = 3;
pub(crate) const BASE_DELAY: Duration = Duration::from_secs(2);
const MAX_DELAY: Duration = Duration::from_secs(30);

/// The endpoint signals throttling only through these statuses; anything else
/// (including a 403 for an exhausted quota) is final.
pub(crate) fn is_throttled(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
    )
}

/// `Retry-After` in delta-seconds form.
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get("retry-after")?.to_str().ok()?.trim();
    value.parse::<u64>().ok().map(Duration::from_secs)
}

/// Exponential back-off for one request, capped at [`MAX_RETRIES`] waits.
#[derive(Debug)]
pub(crate) struct Backoff {
    retries: usize,
    delay: Duration,
}

impl Backoff {
    pub(crate) fn new(base: Duration) -> Self {
        Self {
            retries: 0,
            delay: base,
        }
    }

    /// Sleep before the next attempt. Returns `false` once retries are used up.
    pub(crate) async fn wait(&mut self, retry_after: Option<Duration>) -> bool {
        if self.retries >= MAX_RETRIES {
            return false;
        }
        self.retries += 1;
        let wait = retry_after
            .map_or(self.delay, |hint| hint.max(self.delay))
            .min(MAX_DELAY);
        warn!(
            "image API throttled; retry {}/{} in {:.1}s",
            self.retries,
            MAX_RETRIES,
            wait.as_secs_f32()
        );
        sleep(wait).await;
        self.delay = self.delay.saturating_mul(2).min(MAX_DELAY);
        true
    }
}
