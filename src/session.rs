/// Longest session the countdown supports, and the default length.
pub const SESSION_SECS: u32 = 120;

const TICK_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Running,
    Expired,
    Stopped,
}

/// One-second countdown driving a session.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    session_secs: u32,
    remaining: u32,
    running: bool,
    next_tick_due: Option<u64>,
}

impl SessionTimer {
    pub fn new(session_secs: u32) -> Self {
        Self {
            session_secs,
            remaining: session_secs,
            running: false,
            next_tick_due: None,
        }
    }

    pub fn start(&mut self, now_ms: u64) {
        self.remaining = self.session_secs;
        self.running = self.remaining > 0;
        self.next_tick_due = self.running.then_some(now_ms + TICK_MS);
    }

    /// Decrements once. Reaching zero stops the timer.
    pub fn tick(&mut self) -> TimerStatus {
        if !self.running {
            return TimerStatus::Stopped;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.stop();
            return TimerStatus::Expired;
        }

        self.next_tick_due = self.next_tick_due.map(|due| due + TICK_MS);
        TimerStatus::Running
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.next_tick_due = None;
    }

    pub fn reset(&mut self) {
        self.stop();
        self.remaining = self.session_secs;
    }

    pub fn next_tick_due(&self) -> Option<u64> {
        self.next_tick_due
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self::new(SESSION_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_timer_is_idle_and_full() {
        let timer = SessionTimer::default();
        assert_eq!(timer.remaining(), 120);
        assert!(!timer.is_running());
        assert_eq!(timer.next_tick_due(), None);
    }

    #[test]
    fn start_arms_first_tick_one_second_out() {
        let mut timer = SessionTimer::default();
        timer.start(5_000);
        assert!(timer.is_running());
        assert_eq!(timer.next_tick_due(), Some(6_000));
    }

    #[test]
    fn each_tick_moves_the_deadline_one_second() {
        let mut timer = SessionTimer::default();
        timer.start(0);

        assert_eq!(timer.tick(), TimerStatus::Running);
        assert_eq!(timer.remaining(), 119);
        assert_eq!(timer.next_tick_due(), Some(2_000));

        timer.tick();
        timer.tick();
        assert_eq!(timer.remaining(), 117);
        assert_eq!(timer.next_tick_due(), Some(4_000));
    }

    #[test]
    fn expiry_stops_at_zero() {
        let mut timer = SessionTimer::new(3);
        timer.start(0);

        assert_eq!(timer.tick(), TimerStatus::Running);
        assert_eq!(timer.tick(), TimerStatus::Running);
        assert_eq!(timer.tick(), TimerStatus::Expired);
        assert_eq!(timer.remaining(), 0);
        assert!(!timer.is_running());
        assert_eq!(timer.next_tick_due(), None);

        assert_eq!(timer.tick(), TimerStatus::Stopped);
        assert_eq!(timer.remaining(), 0);
    }

    #[test]
    fn remaining_decreases_by_one_per_tick() {
        let mut timer = SessionTimer::default();
        timer.start(0);
        let mut previous = timer.remaining();
        for _ in 1..=119 {
            assert_eq!(timer.tick(), TimerStatus::Running);
            assert_eq!(timer.remaining(), previous - 1);
            previous = timer.remaining();
        }
        assert_eq!(timer.tick(), TimerStatus::Expired);
    }

    #[test]
    fn reset_discards_pending_tick() {
        let mut timer = SessionTimer::default();
        timer.start(0);
        timer.tick();
        timer.tick();
        timer.reset();

        assert_eq!(timer.remaining(), 120);
        assert_eq!(timer.next_tick_due(), None);
        assert_eq!(timer.tick(), TimerStatus::Stopped);
        assert_eq!(timer.remaining(), 120);
    }
}
