use std::time::Duration;
use tokio::time::Instant;

/// Serializes outbound calls so consecutive requests are at least `interval` apart.
#[derive(Debug)]
pub struct Throttle {
    interval: Duration,
    last_request: Option<Instant>,
}

impl Throttle {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 第一次呼叫不等待，之後補足與上一次請求之間的間隔
    pub async fn acquire(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                let wait = self.interval - elapsed;
                tracing::debug!("Rate limiting geocoding request for {:?}", wait);
                tokio::time::sleep(wait).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}
