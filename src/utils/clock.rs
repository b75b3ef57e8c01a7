use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source of "now" for the ticker and the ledger. Punch timestamps and the live clock both go
/// through it, which lets tests replace wall-clock time with tokio's paused time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    async fn sleep(&self, duration: Duration);
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock anchored at `start` that advances together with tokio's clock. Under
/// `tokio::time::pause` it only moves when the runtime auto-advances.
#[cfg(test)]
#[derive(Clone)]
pub struct TokioClock {
    start: DateTime<Utc>,
    reference: tokio::time::Instant,
}

#[cfg(test)]
impl TokioClock {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start,
            reference: tokio::time::Instant::now(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Clock for TokioClock {
    fn time(&self) -> DateTime<Utc> {
        self.start + self.reference.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use super::{Clock, TokioClock};

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_follows_paused_time() {
        let start = Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap();
        let clock = TokioClock::starting_at(start);

        assert_eq!(clock.time(), start);

        clock.sleep(Duration::from_secs(5)).await;

        assert!(clock.time() >= start + Duration::from_secs(5));
        assert!(clock.time() < start + Duration::from_millis(5100));
    }
}
