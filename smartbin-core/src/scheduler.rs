//! Recurring timers feeding the single event-processing loop.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use crate::request::Response;

/// Identifier of one navigation session; ticks carry it so stale ones can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

/// Events produced by timers and background requests, consumed by
/// [`crate::service::Dashboard::handle_event`].
#[derive(Debug)]
pub enum AppEvent {
    /// One navigation tick for the given session.
    NavigationTick(SessionId),
    /// The periodic registry refresh is due.
    RefreshDue,
    /// A background backend request finished.
    Completed(Box<Response>),
}

/// Handle to a recurring timer task.
///
/// Cancelling (or dropping) the handle aborts the task, so it cannot fire again.
#[derive(Debug)]
pub struct TickHandle {
    task: JoinHandle<()>,
}

impl TickHandle {
    /// Abort the timer task.
    pub fn cancel(self) {
        // Drop does the work.
        drop(self);
    }

    /// Whether the timer task has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Send the event built by `event` every `period`, first one `period` from now.
///
/// The task ends on its own when the receiving side is gone. Must be called
/// inside a tokio runtime.
#[must_use]
pub fn spawn_ticker(
    period: Duration,
    event: impl Fn() -> AppEvent + Send + 'static,
    events: UnboundedSender<AppEvent>,
) -> TickHandle {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let task = tokio::spawn(async move {
        loop {
            interval.tick().await;
            if events.send(event()).is_err() {
                debug!("event receiver closed, stopping ticker");
                break;
            }
        }
    });
    TickHandle { task }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_period() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let _handle = spawn_ticker(Duration::from_secs(1), || AppEvent::RefreshDue, sender);

        settle().await;
        assert!(receiver.try_recv().is_err(), "no tick before the first period");

        time::advance(Duration::from_secs(1)).await;
        settle().await;
        assert!(matches!(receiver.try_recv(), Ok(AppEvent::RefreshDue)));
        assert!(receiver.try_recv().is_err(), "exactly one tick per period");
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_handle_never_fires() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let handle = spawn_ticker(Duration::from_secs(1), || AppEvent::RefreshDue, sender);
        handle.cancel();

        time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert!(receiver.try_recv().is_err());
    }
}
