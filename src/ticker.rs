use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, trace};

use crate::utils::clock::Clock;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Background task that keeps "now" fresh for the clock face. It knows nothing about the ledger.
pub struct ClockTicker {
    clock: Arc<dyn Clock>,
    interval: Duration,
    sender: watch::Sender<DateTime<Utc>>,
    shutdown: CancellationToken,
}

impl ClockTicker {
    /// Captures the current time and spawns the ticker on the current runtime. The returned
    /// handle owns the timer: dropping it or calling [TickerHandle::stop] cancels it.
    pub fn start(clock: Arc<dyn Clock>, interval: Duration) -> TickerHandle {
        let (sender, receiver) = watch::channel(clock.time());
        let shutdown = CancellationToken::new();

        let ticker = ClockTicker {
            clock,
            interval,
            sender,
            shutdown: shutdown.clone(),
        };
        let task = tokio::spawn(ticker.run());
        debug!("Started ticker every {interval:?}");

        TickerHandle {
            receiver,
            guard: shutdown.drop_guard(),
            task,
        }
    }

    /// Sleeps a full interval between captures, so ticks drift by however long a capture takes,
    /// same as a plain repeating timer.
    async fn run(self) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    debug!("Ticker cancelled");
                    return
                }
                _ = self.clock.sleep(self.interval) => ()
            }

            let now = self.clock.time();
            trace!("Tick {now}");
            self.sender.send_replace(now);
        }
    }
}

pub struct TickerHandle {
    receiver: watch::Receiver<DateTime<Utc>>,
    guard: DropGuard,
    task: JoinHandle<()>,
}

impl TickerHandle {
    /// Latest captured time.
    pub fn now(&self) -> DateTime<Utc> {
        *self.receiver.borrow()
    }

    /// Waits for the next tick and returns its time.
    pub async fn changed(&mut self) -> Result<DateTime<Utc>> {
        self.receiver.changed().await?;
        Ok(*self.receiver.borrow_and_update())
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<DateTime<Utc>> {
        self.receiver.clone()
    }

    /// Cancels the timer and waits until the task has finished.
    pub async fn stop(self) {
        let TickerHandle { guard, task, .. } = self;
        drop(guard);
        if let Err(e) = task.await {
            debug!("Ticker task ended abnormally {e:?}");
        }
    }
}
