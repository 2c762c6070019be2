use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Coalesces rapid input into a single delivery: `push` records the newest
/// value and restarts the idle timer, `settled` resolves with the latest
/// value once pushes have been quiet for the configured delay.
///
/// The pipeline itself takes no timers; this is the caller-side rate
/// limit in front of it.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<T>,
    deadline: Option<Instant>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            deadline: None,
        }
    }

    /// Replaces any queued value and restarts the idle window.
    pub fn push(&mut self, value: T) {
        self.pending = Some(value);
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Waits out the idle window and yields the coalesced value. Pends
    /// forever while nothing is queued, which makes it safe to park in a
    /// `select!` arm; cancellation leaves the queued value intact.
    pub async fn settled(&mut self) -> T {
        let Some(deadline) = self.deadline else {
            return std::future::pending().await;
        };
        sleep_until(deadline).await;
        self.deadline = None;
        match self.pending.take() {
            Some(value) => value,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, sleep};

    #[tokio::test(start_paused = true)]
    async fn delivers_after_the_idle_delay() {
        let mut debouncer = Debouncer::new(Duration::from_millis(150));
        debouncer.push("query");
        assert_eq!(debouncer.settled().await, "query");
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_pushes_coalesce_to_the_latest_value() {
        let mut debouncer = Debouncer::new(Duration::from_millis(150));
        debouncer.push("k");
        advance(Duration::from_millis(100)).await;
        debouncer.push("ka");
        advance(Duration::from_millis(100)).await;
        debouncer.push("kam");
        assert_eq!(debouncer.settled().await, "kam");
    }

    #[tokio::test(start_paused = true)]
    async fn does_not_fire_before_the_window_closes() {
        let mut debouncer = Debouncer::new(Duration::from_millis(150));
        debouncer.push(1);
        tokio::select! {
            _ = debouncer.settled() => panic!("settled before the idle window"),
            _ = sleep(Duration::from_millis(149)) => {}
        }
    }

    #[tokio::test(start_paused = true)]
    async fn idle_debouncer_never_fires() {
        let mut debouncer: Debouncer<i32> = Debouncer::new(Duration::from_millis(10));
        tokio::select! {
            _ = debouncer.settled() => panic!("nothing was pushed"),
            _ = sleep(Duration::from_secs(5)) => {}
        }
    }
}
