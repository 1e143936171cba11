//! Pausable, speed-scaled session clock.

use std::time::Duration;

use thiserror::Error;

/// Lifecycle states of a session clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClockState {
    /// Created but never started.
    Ready,
    /// Delivering simulated time.
    Running,
    /// Temporarily halted; resumable.
    Paused,
    /// Permanently halted.
    Stopped,
}

/// Reasons a clock transition may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum SessionError {
    /// `start` was called on a session that already started.
    #[error("session has already started")]
    AlreadyStarted,
    /// `pause` was called while the session was not running.
    #[error("session is not running")]
    NotRunning,
    /// `resume` was called while the session was not paused.
    #[error("session is not paused")]
    NotPaused,
    /// The session was stopped and accepts no further transitions.
    #[error("session has been stopped")]
    Stopped,
}

#[derive(Clone, Debug)]
pub(crate) struct Clock {
    state: ClockState,
    last_timestamp: Option<Duration>,
    speed: f32,
}

impl Clock {
    pub(crate) const fn new() -> Self {
        Self {
            state: ClockState::Ready,
            last_timestamp: None,
            speed: 1.0,
        }
    }

    pub(crate) const fn state(&self) -> ClockState {
        self.state
    }

    pub(crate) const fn speed(&self) -> f32 {
        self.speed
    }

    pub(crate) fn start(&mut self) -> Result<(), SessionError> {
        match self.state {
            ClockState::Ready => {
                self.enter(ClockState::Running);
                Ok(())
            }
            ClockState::Running | ClockState::Paused => Err(SessionError::AlreadyStarted),
            ClockState::Stopped => Err(SessionError::Stopped),
        }
    }

    pub(crate) fn pause(&mut self) -> Result<(), SessionError> {
        match self.state {
            ClockState::Running => {
                self.enter(ClockState::Paused);
                Ok(())
            }
            ClockState::Stopped => Err(SessionError::Stopped),
            ClockState::Ready | ClockState::Paused => Err(SessionError::NotRunning),
        }
    }

    pub(crate) fn resume(&mut self) -> Result<(), SessionError> {
        match self.state {
            ClockState::Paused => {
                self.enter(ClockState::Running);
                Ok(())
            }
            ClockState::Stopped => Err(SessionError::Stopped),
            ClockState::Ready | ClockState::Running => Err(SessionError::NotPaused),
        }
    }

    pub(crate) fn stop(&mut self) -> Result<(), SessionError> {
        if self.state == ClockState::Stopped {
            return Err(SessionError::Stopped);
        }
        self.enter(ClockState::Stopped);
        Ok(())
    }

    /// Sets the speed multiplier, returning `false` for rejected values.
    pub(crate) fn set_speed(&mut self, speed: f32) -> bool {
        if !speed.is_finite() || speed <= 0.0 {
            return false;
        }
        self.speed = speed;
        true
    }

    /// Converts a driver timestamp into scaled simulated time.
    ///
    /// Yields `None` when no work should happen: outside the running state,
    /// on the first timestamp after starting or resuming, and for timestamps
    /// that do not advance.
    pub(crate) fn advance(&mut self, timestamp: Duration) -> Option<Duration> {
        if self.state != ClockState::Running {
            return None;
        }
        let Some(previous) = self.last_timestamp else {
            self.last_timestamp = Some(timestamp);
            return None;
        };
        if timestamp <= previous {
            return None;
        }
        self.last_timestamp = Some(timestamp);
        let raw = timestamp - previous;
        if self.speed == 1.0 {
            return Some(raw);
        }
        let scaled = Duration::try_from_secs_f64(raw.as_secs_f64() * f64::from(self.speed)).ok()?;
        (!scaled.is_zero()).then_some(scaled)
    }

    fn enter(&mut self, state: ClockState) {
        self.state = state;
        self.last_timestamp = None;
    }
}
