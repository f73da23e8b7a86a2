use bevy::time::{Timer, TimerMode};
use std::time::Duration;

/// Trailing-edge debounce: fires once after `delay` passes with no new trigger.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    timer: Option<Timer>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self { delay, timer: None }
    }

    pub fn trigger(&mut self) {
        self.timer = Some(Timer::new(self.delay, TimerMode::Once));
    }

    /// Advances the quiet period; true on the tick it elapses.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let Some(timer) = self.timer.as_mut() else {
            return false;
        };
        timer.tick(dt);
        if timer.finished() {
            self.timer = None;
            true
        } else {
            false
        }
    }
}
