//! Time-driven simulation of a vehicle driving toward one bin.
//!
//! The simulator is either idle or running exactly one session. A running
//! session owns a one-second [`TickHandle`]; every tick moves the simulated
//! position linearly from the start toward the destination until the
//! estimated travel time has elapsed.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::model::{Bin, BinId, Coordinate};
use crate::scheduler::{AppEvent, SessionId, TickHandle, spawn_ticker};

/// Tick granularity of the simulation.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);
/// Ticks per minute of estimated travel time.
pub const TICKS_PER_MINUTE: u32 = 60;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
/// Reasons a navigation session cannot start.
pub enum NavigationError {
    /// Destination has no usable coordinates.
    #[error("Bin {0} has no valid coordinates")]
    MissingCoordinates(BinId),
}

/// State of the running session.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationSession {
    /// Session identifier carried by its ticks.
    pub id: SessionId,
    /// Snapshot of the destination bin taken at start.
    pub destination: Bin,
    /// Where the vehicle started.
    pub start: Coordinate,
    /// Where the vehicle is heading.
    pub end: Coordinate,
    /// Current simulated position.
    pub position: Coordinate,
    /// Ticks elapsed since start.
    pub elapsed_ticks: u32,
    /// Ticks until arrival.
    pub total_ticks: u32,
}

impl NavigationSession {
    /// Fraction of the trip completed, `1.0` or more on arrival.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.total_ticks == 0 {
            return 1.0;
        }
        f64::from(self.elapsed_ticks) / f64::from(self.total_ticks)
    }

    /// Whole minutes left, rounded up.
    #[must_use]
    pub fn remaining_minutes(&self) -> u32 {
        self.total_ticks
            .saturating_sub(self.elapsed_ticks)
            .div_ceil(TICKS_PER_MINUTE)
    }
}

/// What a tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Tick belonged to no running session and was ignored.
    Ignored,
    /// Vehicle moved.
    Moved {
        /// New simulated position.
        position: Coordinate,
        /// Whole minutes left.
        remaining_minutes: u32,
    },
    /// Vehicle reached the destination; the session is over.
    Arrived {
        /// Destination snapshot.
        destination: Bin,
    },
}

/// Navigation state machine: idle, or one active session with its timer.
#[derive(Debug)]
pub struct NavigationSimulator {
    position: Coordinate,
    session: Option<NavigationSession>,
    timer: Option<TickHandle>,
    next_session: u64,
    events: UnboundedSender<AppEvent>,
}

impl NavigationSimulator {
    /// Idle simulator positioned at `origin`, sending ticks to `events`.
    #[must_use]
    pub fn new(origin: Coordinate, events: UnboundedSender<AppEvent>) -> Self {
        Self {
            position: origin,
            session: None,
            timer: None,
            next_session: 0,
            events,
        }
    }

    /// Current simulated position.
    #[must_use]
    pub fn position(&self) -> Coordinate {
        self.position
    }

    /// Running session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&NavigationSession> {
        self.session.as_ref()
    }

    /// Whether a session is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Start driving toward `destination`, replacing any running session.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::MissingCoordinates`] when the destination has no
    /// valid position; a running session is left untouched in that case.
    pub fn start(
        &mut self,
        destination: Bin,
        estimated_travel_minutes: u32,
    ) -> Result<SessionId, NavigationError> {
        let end = destination
            .position()
            .ok_or_else(|| NavigationError::MissingCoordinates(destination.id.clone()))?;

        self.teardown();

        self.next_session += 1;
        let id = SessionId(self.next_session);
        let total_ticks = estimated_travel_minutes.saturating_mul(TICKS_PER_MINUTE);

        info!(
            bin_id = %destination.id,
            session = id.0,
            total_ticks,
            "navigation started"
        );

        self.session = Some(NavigationSession {
            id,
            destination,
            start: self.position,
            end,
            position: self.position,
            elapsed_ticks: 0,
            total_ticks,
        });
        self.timer = Some(spawn_ticker(
            TICK_PERIOD,
            move || AppEvent::NavigationTick(id),
            self.events.clone(),
        ));
        Ok(id)
    }

    /// Advance the session by one tick.
    ///
    /// Ticks for any session other than the running one are ignored.
    pub fn tick(&mut self, id: SessionId) -> TickOutcome {
        let Some(session) = self.session.as_mut().filter(|session| session.id == id) else {
            debug!(session = id.0, "ignoring stale navigation tick");
            return TickOutcome::Ignored;
        };

        session.elapsed_ticks = session.elapsed_ticks.saturating_add(1);
        let progress = session.progress();

        if progress >= 1.0 {
            session.position = session.end;
            self.position = session.end;
            let destination = session.destination.clone();
            self.teardown();
            info!(bin_id = %destination.id, "navigation arrived");
            return TickOutcome::Arrived { destination };
        }

        session.position = session.start.lerp(session.end, progress);
        self.position = session.position;
        TickOutcome::Moved {
            position: session.position,
            remaining_minutes: session.remaining_minutes(),
        }
    }

    /// Cancel the running session.
    ///
    /// Returns the cancelled session, or `None` when already idle.
    pub fn stop(&mut self) -> Option<NavigationSession> {
        let session = self.teardown()?;
        info!(bin_id = %session.destination.id, "navigation stopped");
        Some(session)
    }

    fn teardown(&mut self) -> Option<NavigationSession> {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.session.take()
    }
}
