use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle, time::Instant};

/// Sent when an armed turn runs out. `generation` identifies which arming
/// fired, so a room can tell a current expiry from one that raced a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnExpired {
    pub generation: u64,
}

/// Single-shot countdown for the active player's turn
pub struct TurnTimer {
    duration: Duration,
    started_at: Instant,
    generation: u64,
    running: bool,
    notifier: Option<mpsc::UnboundedSender<TurnExpired>>,
    task: Option<JoinHandle<()>>,
}

impl TurnTimer {
    /// A timer that reports expiry on `notifier`
    pub fn new(duration: Duration, notifier: mpsc::UnboundedSender<TurnExpired>) -> Self {
        Self {
            duration,
            started_at: Instant::now(),
            generation: 0,
            running: false,
            notifier: Some(notifier),
            task: None,
        }
    }

    /// A timer that only tracks elapsed time, nothing fires on expiry
    #[cfg(test)]
    pub fn detached(duration: Duration) -> Self {
        Self {
            duration,
            started_at: Instant::now(),
            generation: 0,
            running: false,
            notifier: None,
            task: None,
        }
    }

    /// Cancel any armed countdown and start a fresh one
    pub fn reset(&mut self) {
        self.cancel();
        self.generation += 1;
        self.started_at = Instant::now();
        self.running = true;

        if let Some(notifier) = self.notifier.clone() {
            let expiry = TurnExpired {
                generation: self.generation,
            };
            let duration = self.duration;
            self.task = Some(tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                let _ = notifier.send(expiry);
            }));
        }
    }

    /// Cancel without rearming
    pub fn stop(&mut self) {
        self.cancel();
        self.running = false;
    }

    /// Remaining time of the current turn, zero when stopped
    pub fn time_left(&self) -> Duration {
        if !self.running {
            return Duration::ZERO;
        }
        self.duration.saturating_sub(self.started_at.elapsed())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for TurnTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_duration() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = TurnTimer::new(Duration::from_secs(60), tx);
        timer.reset();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(rx.try_recv().is_err(), "Timer must not fire early");

        let expired = rx.recv().await;
        assert_eq!(expired, Some(TurnExpired { generation: 1 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_previous_arming() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = TurnTimer::new(Duration::from_secs(10), tx);
        timer.reset();

        tokio::time::advance(Duration::from_secs(8)).await;
        timer.reset();

        // Only the second arming may fire
        let expired = rx.recv().await;
        assert_eq!(expired, Some(TurnExpired { generation: 2 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_without_rearming() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = TurnTimer::new(Duration::from_secs(5), tx);
        timer.reset();
        timer.stop();

        tokio::time::advance(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
        assert_eq!(timer.time_left(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_left_tracks_elapsed_time() {
        let mut timer = TurnTimer::detached(Duration::from_secs(60));
        timer.reset();

        tokio::time::advance(Duration::from_secs(15)).await;
        assert_eq!(timer.time_left(), Duration::from_secs(45));
    }
}
