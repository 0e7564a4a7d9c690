/// Countdown state. `Expired` is entered exactly once, when the remaining
/// seconds hit zero while running; every other exit goes through
/// `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Expired,
    Cancelled,
}

/// Wall-clock countdown for one attempt. The session drives `tick` once a
/// second; the struct itself only tracks state so it stays testable without
/// a clock.
#[derive(Debug, Clone)]
pub struct Countdown {
    remaining_secs: u32,
    state: TimerState,
}

impl Countdown {
    pub fn new() -> Self {
        Self {
            remaining_secs: 0,
            state: TimerState::Idle,
        }
    }

    /// Seed and start. A reload re-seeds the full duration; there is no
    /// pause/resume and no persistence of elapsed time.
    pub fn start(&mut self, duration_secs: u32) {
        self.remaining_secs = duration_secs;
        self.state = TimerState::Running;
    }

    /// One second elapsed. Returns the state after the tick.
    pub fn tick(&mut self) -> TimerState {
        if self.state == TimerState::Running {
            self.remaining_secs = self.remaining_secs.saturating_sub(1);
            if self.remaining_secs == 0 {
                self.state = TimerState::Expired;
            }
        }
        self.state
    }

    pub fn cancel(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Cancelled;
        }
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn state(&self) -> TimerState {
        self.state
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_to_expiry_exactly_once() {
        let mut countdown = Countdown::new();
        countdown.start(3);
        assert_eq!(countdown.tick(), TimerState::Running);
        assert_eq!(countdown.tick(), TimerState::Running);
        assert_eq!(countdown.tick(), TimerState::Expired);
        // Further ticks do not re-enter Expired from anywhere else.
        assert_eq!(countdown.tick(), TimerState::Expired);
        assert_eq!(countdown.remaining_secs(), 0);
    }

    #[test]
    fn cancel_only_applies_while_running() {
        let mut countdown = Countdown::new();
        countdown.cancel();
        assert_eq!(countdown.state(), TimerState::Idle);

        countdown.start(2);
        countdown.cancel();
        assert_eq!(countdown.state(), TimerState::Cancelled);

        let mut expired = Countdown::new();
        expired.start(1);
        expired.tick();
        expired.cancel();
        assert_eq!(expired.state(), TimerState::Expired);
    }

    #[test]
    fn restart_reseeds_the_full_duration() {
        let mut countdown = Countdown::new();
        countdown.start(10);
        countdown.tick();
        countdown.start(10);
        assert_eq!(countdown.remaining_secs(), 10);
        assert_eq!(countdown.state(), TimerState::Running);
    }
}
