use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Handle to a periodic background task. The task runs between `start` and
/// `stop`; dropping the handle stops it.
#[derive(Debug)]
pub struct Ticker {
    name: &'static str,
    period: Duration,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new(name: &'static str, period: Duration) -> Self {
        Self {
            name,
            period,
            handle: None,
        }
    }

    /// Spawns the task. The first tick fires one period after starting.
    /// No-op when already running or when the period is zero.
    pub fn start<F, Fut>(&mut self, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.is_running() {
            return;
        }
        if self.period.is_zero() {
            warn!(ticker = self.name, "ticker period is zero, not starting");
            return;
        }

        let period = self.period;
        let name = self.name;
        self.handle = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                debug!(ticker = name, "tick");
                tick().await;
            }
        }));
        debug!(ticker = self.name, ?period, "ticker started");
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!(ticker = self.name, "ticker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn ticks_until_stopped() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut ticker = Ticker::new("test", Duration::from_secs(1));
        let counter = Arc::clone(&count);
        ticker.start(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        assert!(ticker.is_running());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        ticker.stop();
        assert!(!ticker.is_running());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_period_never_starts() {
        let mut ticker = Ticker::new("test", Duration::ZERO);
        ticker.start(|| async {});
        assert!(!ticker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_ignored() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut ticker = Ticker::new("test", Duration::from_secs(1));
        for _ in 0..2 {
            let counter = Arc::clone(&count);
            ticker.start(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            });
        }

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
