use serde::{Deserialize, Serialize};

use crate::errors::SessionError;

pub const DEFAULT_TIMER_MINUTES: u32 = 5;
pub const MAX_TIMER_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    Idle,
    Running,
    Expired,
}

/// State changes a presentation or audio layer can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    Started { seconds_remaining: u32 },
    Paused { seconds_remaining: u32 },
    Reset { seconds_remaining: u32 },
    DurationChanged { minutes: u32 },
    Tick { seconds_remaining: u32 },
    Expired,
}

/// Countdown clock for a study session. Ticks are driven from outside, once per second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTimer {
    initial_minutes: u32,
    seconds_remaining: u32,
    status: TimerStatus,
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self::new(DEFAULT_TIMER_MINUTES)
    }
}

impl SessionTimer {
    pub fn new(minutes: u32) -> Self {
        let minutes = minutes.clamp(1, MAX_TIMER_MINUTES);
        Self {
            initial_minutes: minutes,
            seconds_remaining: minutes * 60,
            status: TimerStatus::Idle,
        }
    }

    pub fn initial_minutes(&self) -> u32 {
        self.initial_minutes
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn is_expired(&self) -> bool {
        self.status == TimerStatus::Expired
    }

    pub fn elapsed_seconds(&self) -> u32 {
        (self.initial_minutes * 60).saturating_sub(self.seconds_remaining)
    }

    pub fn set_duration(&mut self, minutes: u32) -> Result<TimerEvent, SessionError> {
        if self.is_running() {
            return Err(SessionError::TimerRunning);
        }
        if minutes == 0 || minutes > MAX_TIMER_MINUTES {
            return Err(SessionError::InvalidDuration(minutes));
        }

        self.initial_minutes = minutes;
        self.seconds_remaining = minutes * 60;
        self.status = TimerStatus::Idle;
        Ok(TimerEvent::DurationChanged { minutes })
    }

    /// Returns `None` when the clock is already running or has run out
    pub fn start(&mut self) -> Option<TimerEvent> {
        if self.status != TimerStatus::Idle {
            return None;
        }
        self.status = TimerStatus::Running;
        Some(TimerEvent::Started {
            seconds_remaining: self.seconds_remaining,
        })
    }

    pub fn pause(&mut self) -> Option<TimerEvent> {
        if !self.is_running() {
            return None;
        }
        self.status = TimerStatus::Idle;
        Some(TimerEvent::Paused {
            seconds_remaining: self.seconds_remaining,
        })
    }

    pub fn reset(&mut self) -> TimerEvent {
        self.status = TimerStatus::Idle;
        self.seconds_remaining = self.initial_minutes * 60;
        TimerEvent::Reset {
            seconds_remaining: self.seconds_remaining,
        }
    }

    /// Put the clock back where a saved session left it, stopped
    pub fn restore(&mut self, initial_minutes: u32, seconds_left: u32) {
        self.initial_minutes = initial_minutes.clamp(1, MAX_TIMER_MINUTES);
        self.seconds_remaining = seconds_left.min(self.initial_minutes * 60);
        self.status = if self.seconds_remaining == 0 {
            TimerStatus::Expired
        } else {
            TimerStatus::Idle
        };
    }

    pub fn tick(&mut self) -> Option<TimerEvent> {
        if !self.is_running() {
            return None;
        }

        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 {
            self.status = TimerStatus::Expired;
            return Some(TimerEvent::Expired);
        }

        Some(TimerEvent::Tick {
            seconds_remaining: self.seconds_remaining,
        })
    }
}
