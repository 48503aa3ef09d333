//! Timestamped finite state machine
//!
//! The machine only does bookkeeping. Owners run their own exit and enter
//! hooks around [`StateMachine::switch`]:
//!
//! ```ignore
//! let mut next = Some(to);
//! while let Some(to) = next {
//!     let from = self.machine.current();
//!     self.on_exit(from, to);
//!     self.machine.switch(to, now);
//!     self.on_enter(to, from);
//!     next = self.machine.take_request();
//! }
//! ```
//!
//! A hook that wants another transition calls [`StateMachine::request`]; the
//! request becomes visible only after the outer transition has finished.

use std::collections::VecDeque;
use std::fmt::Debug;

/// Upper bound on chained transitions in one drive loop
pub const MAX_CHAINED_TRANSITIONS: usize = 8;

/// Current state, previous state and when the current one was entered
#[derive(Debug, Clone)]
pub struct StateMachine<S> {
    owner: &'static str,
    current: S,
    previous: S,
    entered_at: f64,
    requests: VecDeque<S>,
}

impl<S> StateMachine<S>
where
    S: Copy + Eq + Debug,
{
    /// Start in `initial` without running any hook
    pub fn new(owner: &'static str, initial: S, now: f64) -> Self {
        Self {
            owner,
            current: initial,
            previous: initial,
            entered_at: now,
            requests: VecDeque::new(),
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn previous(&self) -> S {
        self.previous
    }

    /// Check if in a specific state
    pub fn is_in(&self, state: S) -> bool {
        self.current == state
    }

    pub fn entered_at(&self) -> f64 {
        self.entered_at
    }

    /// Seconds since the current state was entered
    pub fn time_in_state(&self, now: f64) -> f32 {
        (now - self.entered_at).max(0.0) as f32
    }

    /// Assign the new state and record the entry time. Returns the state
    /// that was left. Entry times never go backwards.
    pub fn switch(&mut self, to: S, now: f64) -> S {
        log::debug!("{} transitioning from {:?} to {:?}", self.owner, self.current, to);
        self.previous = self.current;
        self.current = to;
        self.entered_at = now.max(self.entered_at);
        self.previous
    }

    /// Queue a transition raised from inside a hook
    pub fn request(&mut self, to: S) {
        self.requests.push_back(to);
    }

    /// Next queued transition, if any
    pub fn take_request(&mut self) -> Option<S> {
        self.requests.pop_front()
    }

    pub fn has_requests(&self) -> bool {
        !self.requests.is_empty()
    }

    /// Drop queued requests, used when a drive loop hits its chain limit
    pub fn clear_requests(&mut self) {
        if !self.requests.is_empty() {
            log::warn!("{} dropped {} chained transitions", self.owner, self.requests.len());
        }
        self.requests.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestState {
        Idle,
        Walking,
        Running,
    }

    struct Owner {
        machine: StateMachine<TestState>,
        log: Vec<String>,
    }

    impl Owner {
        fn transition(&mut self, to: TestState, now: f64) {
            let mut next = Some(to);
            let mut chained = 0;
            while let Some(to) = next {
                let from = self.machine.current();
                self.log.push(format!("exit {from:?} (current {:?})", self.machine.current()));
                self.machine.switch(to, now);
                self.log.push(format!("enter {to:?} from {from:?}"));
                if to == TestState::Walking {
                    self.machine.request(TestState::Running);
                    self.log.push(format!("requested, current {:?}", self.machine.current()));
                }
                chained += 1;
                if chained >= MAX_CHAINED_TRANSITIONS {
                    self.machine.clear_requests();
                }
                next = self.machine.take_request();
            }
        }
    }

    #[test]
    fn test_nested_request_runs_after_outer_transition() {
        let mut owner = Owner {
            machine: StateMachine::new("test", TestState::Idle, 0.0),
            log: Vec::new(),
        };
        owner.transition(TestState::Walking, 1.0);

        assert_eq!(owner.machine.current(), TestState::Running);
        assert_eq!(owner.machine.previous(), TestState::Walking);
        assert_eq!(
            owner.log,
            vec![
                "exit Idle (current Idle)",
                "enter Walking from Idle",
                "requested, current Walking",
                "exit Walking (current Walking)",
                "enter Running from Walking",
            ]
        );
    }

    #[test]
    fn test_time_in_state() {
        let mut machine = StateMachine::new("test", TestState::Idle, 2.0);
        assert_relative_eq!(machine.time_in_state(3.5), 1.5);
        machine.switch(TestState::Running, 4.0);
        assert_relative_eq!(machine.time_in_state(4.25), 0.25);
        assert!(machine.is_in(TestState::Running));
    }

    #[test]
    fn test_entry_time_is_monotonic() {
        let mut machine = StateMachine::new("test", TestState::Idle, 5.0);
        machine.switch(TestState::Walking, 4.0);
        assert_eq!(machine.entered_at(), 5.0);
    }
}
