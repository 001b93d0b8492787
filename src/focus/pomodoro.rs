//! Pomodoro timer state machine

use serde::{Deserialize, Serialize};

use crate::config::PomodoroConfig;

/// Pomodoro phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PomodoroPhase {
    Work,
    Break,
}

impl std::fmt::Display for PomodoroPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PomodoroPhase::Work => write!(f, "Work Time"),
            PomodoroPhase::Break => write!(f, "Break Time"),
        }
    }
}

/// Timer snapshot for the API
#[derive(Debug, Clone, Serialize)]
pub struct PomodoroSnapshot {
    pub phase: PomodoroPhase,
    pub remaining_secs: u64,
}

/// Work/break countdown
///
/// Counts down once per second; when the countdown reaches zero the next
/// tick flips the phase and reloads the other duration.
pub struct PomodoroTimer {
    config: PomodoroConfig,
    phase: PomodoroPhase,
    remaining_secs: u64,
}

impl PomodoroTimer {
    /// Create a timer at the start of a work phase
    pub fn new(config: &PomodoroConfig) -> Self {
        Self {
            config: config.clone(),
            phase: PomodoroPhase::Work,
            remaining_secs: config.work_secs,
        }
    }

    /// Advance one second; returns the new phase on a flip
    pub fn tick(&mut self) -> Option<PomodoroPhase> {
        if self.remaining_secs == 0 {
            self.phase = match self.phase {
                PomodoroPhase::Work => PomodoroPhase::Break,
                PomodoroPhase::Break => PomodoroPhase::Work,
            };
            self.remaining_secs = match self.phase {
                PomodoroPhase::Work => self.config.work_secs,
                PomodoroPhase::Break => self.config.break_secs,
            };
            Some(self.phase)
        } else {
            self.remaining_secs -= 1;
            None
        }
    }

    /// Current state
    pub fn snapshot(&self) -> PomodoroSnapshot {
        PomodoroSnapshot {
            phase: self.phase,
            remaining_secs: self.remaining_secs,
        }
    }

    /// Back to a fresh work phase
    pub fn reset(&mut self) {
        self.phase = PomodoroPhase::Work;
        self.remaining_secs = self.config.work_secs;
    }
}
