//! Productivity aids: Pomodoro timer, task list, focus score
//!
//! Ticked once per second by the monitoring session while a productivity
//! run is active. Display-level state only.

pub mod pomodoro;
pub mod score;
pub mod tasks;

pub use pomodoro::{PomodoroPhase, PomodoroSnapshot, PomodoroTimer};
pub use score::{FocusTracker, RandomWalkSource, ScoreSource};
pub use tasks::{TaskItem, TaskList};

use parking_lot::Mutex;
use serde::Serialize;

use crate::config::PomodoroConfig;
use crate::events::{EventBus, MonitorEvent};

/// Combined snapshot for the productivity endpoints
#[derive(Debug, Clone, Serialize)]
pub struct FocusSnapshot {
    pub pomodoro: PomodoroSnapshot,
    pub focus_score: u32,
}

/// Shared productivity state
pub struct FocusState {
    pomodoro: Mutex<PomodoroTimer>,
    tracker: Mutex<FocusTracker>,
}

impl FocusState {
    pub fn new(config: &PomodoroConfig, source: Box<dyn ScoreSource>) -> Self {
        Self {
            pomodoro: Mutex::new(PomodoroTimer::new(config)),
            tracker: Mutex::new(FocusTracker::new(source)),
        }
    }

    /// Advance both timers by one second, publishing changes
    pub fn tick(&self, events: &EventBus) {
        let flip = {
            let mut pomodoro = self.pomodoro.lock();
            pomodoro.tick().map(|phase| (phase, pomodoro.snapshot().remaining_secs))
        };
        if let Some((phase, remaining_secs)) = flip {
            events.publish(MonitorEvent::PomodoroPhaseChanged {
                phase,
                remaining_secs,
            });
        }

        let score = {
            let mut tracker = self.tracker.lock();
            tracker.tick();
            tracker.score()
        };
        events.publish(MonitorEvent::FocusUpdated { score });
    }

    /// Current state
    pub fn snapshot(&self) -> FocusSnapshot {
        FocusSnapshot {
            pomodoro: self.pomodoro.lock().snapshot(),
            focus_score: self.tracker.lock().score(),
        }
    }

    /// Reset to a fresh work phase and full focus
    pub fn reset(&self) {
        self.pomodoro.lock().reset();
        self.tracker.lock().reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Steady(i32);
    impl ScoreSource for Steady {
        fn step(&mut self) -> i32 {
            self.0
        }
    }

    #[test]
    fn test_tick_publishes_focus_update() {
        let state = FocusState::new(&PomodoroConfig::default(), Box::new(Steady(-2)));
        let events = EventBus::new();
        let mut rx = events.subscribe();

        state.tick(&events);

        let event = rx.try_recv().unwrap();
        match event {
            MonitorEvent::FocusUpdated { score } => assert_eq!(score, 98),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_reset() {
        let state = FocusState::new(&PomodoroConfig::default(), Box::new(Steady(-2)));
        let events = EventBus::new();

        for _ in 0..10 {
            state.tick(&events);
        }
        assert_eq!(state.snapshot().focus_score, 80);

        state.reset();
        let snapshot = state.snapshot();
        assert_eq!(snapshot.focus_score, 100);
        assert_eq!(snapshot.pomodoro.phase, PomodoroPhase::Work);
    }
}
