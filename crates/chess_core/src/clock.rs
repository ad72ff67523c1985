//! Per-game chess clock driven by externally supplied timestamps.
//!
//! The host calls [`GameClock::tick`] periodically with a monotonic
//! millisecond timestamp. The clock only runs once the first move has been
//! made, and each step is capped so that a stalled host does not drain a
//! player's time in one go.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::Color;

/// Largest single step a tick may charge, in milliseconds.
pub const DEFAULT_MAX_STEP_MS: u64 = 1_000;

/// Time control settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControl {
    /// Starting time for each side
    pub initial_ms: u64,
    /// Added to the mover's clock after every move
    pub increment_ms: u64,
    /// Cap on the time charged by one tick
    pub max_step_ms: u64,
}

impl TimeControl {
    pub fn new(initial: Duration, increment: Duration) -> Self {
        Self {
            initial_ms: initial.as_millis() as u64,
            increment_ms: increment.as_millis() as u64,
            max_step_ms: DEFAULT_MAX_STEP_MS,
        }
    }

    pub fn with_max_step(mut self, max_step_ms: u64) -> Self {
        self.max_step_ms = max_step_ms;
        self
    }
}

impl Default for TimeControl {
    fn default() -> Self {
        Self::new(Duration::from_secs(600), Duration::ZERO)
    }
}

impl std::fmt::Display for TimeControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}+{}", self.initial_ms / 60_000, self.increment_ms / 1000)
    }
}

/// Remaining time and increments, in the shape a UCI `go` command wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchClock {
    pub white_ms: u64,
    pub black_ms: u64,
    pub white_inc_ms: u64,
    pub black_inc_ms: u64,
}

/// Chess clock for both players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameClock {
    time_control: TimeControl,
    white_ms: u64,
    black_ms: u64,
    /// Timestamp seen by the previous tick
    last_tick: Option<u64>,
    started: bool,
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new(TimeControl::default())
    }
}

impl GameClock {
    pub fn new(time_control: TimeControl) -> Self {
        Self {
            time_control,
            white_ms: time_control.initial_ms,
            black_ms: time_control.initial_ms,
            last_tick: None,
            started: false,
        }
    }

    pub fn time_control(&self) -> TimeControl {
        self.time_control
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn start(&mut self) {
        self.started = true;
    }

    pub fn remaining_ms(&self, color: Color) -> u64 {
        match color {
            Color::White => self.white_ms,
            Color::Black => self.black_ms,
        }
    }

    pub fn remaining(&self, color: Color) -> Duration {
        Duration::from_millis(self.remaining_ms(color))
    }

    pub fn add_increment(&mut self, color: Color) {
        let inc = self.time_control.increment_ms;
        let slot = self.slot(color);
        *slot = slot.saturating_add(inc);
    }

    /// Advance the clock to `now_ms`, charging `running_for` when the clock
    /// is running. Returns the charged side if its time is exhausted, which
    /// includes a clock that was already at zero.
    ///
    /// When `running_for` is `None` (clock not started, or game over) the
    /// timestamp is only recorded.
    pub fn tick(&mut self, now_ms: u64, running_for: Option<Color>) -> Option<Color> {
        let previous = self.last_tick.replace(now_ms);
        let color = running_for.filter(|_| self.started)?;
        let prev = previous?;

        let elapsed = now_ms.saturating_sub(prev).min(self.time_control.max_step_ms);
        let slot = self.slot(color);
        *slot = slot.saturating_sub(elapsed);
        (*slot == 0).then_some(color)
    }

    pub fn search_clock(&self) -> SearchClock {
        SearchClock {
            white_ms: self.white_ms,
            black_ms: self.black_ms,
            white_inc_ms: self.time_control.increment_ms,
            black_inc_ms: self.time_control.increment_ms,
        }
    }

    /// Format remaining time as MM:SS, with tenths under ten seconds.
    pub fn format_time(duration: Duration) -> String {
        let total_secs = duration.as_secs();
        let mins = total_secs / 60;
        let secs = total_secs % 60;

        if duration.as_millis() < 10_000 {
            let tenths = (duration.as_millis() % 1000) / 100;
            format!("{}:{:02}.{}", mins, secs, tenths)
        } else {
            format!("{}:{:02}", mins, secs)
        }
    }

    fn slot(&mut self, color: Color) -> &mut u64 {
        match color {
            Color::White => &mut self.white_ms,
            Color::Black => &mut self.black_ms,
        }
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod clock_tests;
