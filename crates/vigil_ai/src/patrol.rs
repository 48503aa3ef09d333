//! Patrol guard behaviour
//!
//! The guard walks an ordered, wrapping list of waypoints and reacts to
//! what its sensor reports. A raised alarm overrides everything and sends
//! the guard to `Alerted`, which it only leaves through [`PatrolGuard::stand_down`].

use crate::error::{AiError, Result};
use crate::perception::{Observer, Perception};
use crate::services::WorldServices;
use crate::state_machine::{StateMachine, MAX_CHAINED_TRANSITIONS};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vigil_math::Vec3;

/// Guard behaviour states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuardState {
    Patrolling,
    Investigating,
    Caution,
    Searching,
    Alerted,
}

/// Guard tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatrolConfig {
    /// Seconds spent at each waypoint
    #[serde(default = "default_waypoint_wait_time")]
    pub waypoint_wait_time: f32,
    /// Horizontal distance that counts as arrived
    #[serde(default = "default_arrival_radius")]
    pub arrival_radius: f32,
    /// Continuous sight needed to raise the alarm
    #[serde(default = "default_spot_to_alarm_time")]
    pub spot_to_alarm_time: f32,
    /// Seconds spent holding position after being attacked
    #[serde(default = "default_caution_time")]
    pub caution_time: f32,
    /// Seconds spent searching before resuming the patrol
    #[serde(default = "default_search_time")]
    pub search_time: f32,
}

fn default_waypoint_wait_time() -> f32 { 3.0 }
fn default_arrival_radius() -> f32 { 0.5 }
fn default_spot_to_alarm_time() -> f32 { 1.5 }
fn default_caution_time() -> f32 { 3.0 }
fn default_search_time() -> f32 { 4.0 }

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            waypoint_wait_time: default_waypoint_wait_time(),
            arrival_radius: default_arrival_radius(),
            spot_to_alarm_time: default_spot_to_alarm_time(),
            caution_time: default_caution_time(),
            search_time: default_search_time(),
        }
    }
}

/// Where the guard wants to go and look this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardOutput {
    pub destination: Vec3,
    pub look_target: Option<Vec3>,
}

/// Perception-driven patrol brain
#[derive(Debug)]
pub struct PatrolGuard {
    name: String,
    machine: StateMachine<GuardState>,
    waypoints: Vec<Vec3>,
    waypoint_index: usize,
    arrived_at: Option<f64>,
    position: Vec3,
    destination: Vec3,
    look_target: Option<Vec3>,
    last_seen: Option<Vec3>,
    sight_time: f32,
    attacked_from: Option<Option<Vec3>>,
    services: Arc<WorldServices>,
    config: PatrolConfig,
}

impl PatrolGuard {
    /// Start patrolling toward the first waypoint
    pub fn new(
        name: impl Into<String>,
        waypoints: Vec<Vec3>,
        config: PatrolConfig,
        services: Arc<WorldServices>,
        now: f64,
    ) -> Result<Self> {
        let first = *waypoints.first().ok_or(AiError::EmptyPatrolRoute)?;
        Ok(Self {
            name: name.into(),
            machine: StateMachine::new("PatrolGuard", GuardState::Patrolling, now),
            waypoints,
            waypoint_index: 0,
            arrived_at: None,
            position: first,
            destination: first,
            look_target: None,
            last_seen: None,
            sight_time: 0.0,
            attacked_from: None,
            services,
            config,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> GuardState {
        self.machine.current()
    }

    pub fn previous_state(&self) -> GuardState {
        self.machine.previous()
    }

    pub fn time_since_entering_state(&self, now: f64) -> f32 {
        self.machine.time_in_state(now)
    }

    pub fn waypoint_index(&self) -> usize {
        self.waypoint_index
    }

    pub fn destination(&self) -> Vec3 {
        self.destination
    }

    pub fn look_target(&self) -> Option<Vec3> {
        self.look_target
    }

    pub fn last_seen(&self) -> Option<Vec3> {
        self.last_seen
    }

    /// Report a hit on the guard, handled on the next tick
    pub fn notify_attacked(&mut self, attacker_position: Option<Vec3>) {
        self.attacked_from = Some(attacker_position);
    }

    /// Leave `Alerted` once the alarm has been cleared
    pub fn stand_down(&mut self, now: f64) -> bool {
        if self.state() != GuardState::Alerted || self.services.is_alarm_raised() {
            return false;
        }
        self.transition_to(GuardState::Patrolling, now);
        true
    }

    /// Evaluate one tick
    pub fn tick(
        &mut self,
        observer: &Observer,
        target: Option<Vec3>,
        perception: &dyn Perception,
        now: f64,
        dt: f32,
    ) -> GuardOutput {
        self.position = observer.position;
        let seen = target.filter(|t| perception.is_visible(observer, *t));
        if seen.is_some() {
            self.last_seen = seen;
        }
        let attacked = self.attacked_from.take();

        if self.services.is_alarm_raised() && self.state() != GuardState::Alerted {
            self.transition_to(GuardState::Alerted, now);
        }

        match self.state() {
            GuardState::Patrolling => {
                if seen.is_some() {
                    self.transition_to(GuardState::Investigating, now);
                } else if let Some(from) = attacked {
                    self.look_target = from;
                    self.transition_to(GuardState::Caution, now);
                } else if self.has_arrived() {
                    let arrived_at = *self.arrived_at.get_or_insert(now);
                    if (now - arrived_at) as f32 >= self.config.waypoint_wait_time {
                        self.advance_waypoint();
                    }
                }
            }
            GuardState::Investigating => {
                if let Some(spotted) = seen {
                    self.destination = spotted;
                    self.look_target = Some(spotted);
                    self.sight_time += dt;
                    if self.sight_time >= self.config.spot_to_alarm_time {
                        self.services.raise_alarm(&self.name);
                        self.transition_to(GuardState::Alerted, now);
                    }
                } else {
                    self.sight_time = 0.0;
                    if self.has_arrived() {
                        self.transition_to(GuardState::Searching, now);
                    }
                }
            }
            GuardState::Caution => {
                if seen.is_some() {
                    self.transition_to(GuardState::Investigating, now);
                } else if self.time_since_entering_state(now) >= self.config.caution_time {
                    self.transition_to(GuardState::Searching, now);
                }
            }
            GuardState::Searching => {
                if seen.is_some() {
                    self.transition_to(GuardState::Investigating, now);
                } else if let Some(from) = attacked {
                    self.look_target = from;
                    self.transition_to(GuardState::Caution, now);
                } else if self.time_since_entering_state(now) >= self.config.search_time {
                    self.transition_to(GuardState::Patrolling, now);
                }
            }
            GuardState::Alerted => {
                if let Some(spotted) = seen {
                    self.destination = spotted;
                }
                self.look_target = self.last_seen;
            }
        }

        GuardOutput {
            destination: self.destination,
            look_target: self.look_target,
        }
    }

    fn has_arrived(&self) -> bool {
        (self.destination - self.position).horizontal().length() <= self.config.arrival_radius
    }

    fn advance_waypoint(&mut self) {
        self.waypoint_index = (self.waypoint_index + 1) % self.waypoints.len();
        self.destination = self.waypoints[self.waypoint_index];
        self.arrived_at = None;
    }

    fn transition_to(&mut self, to: GuardState, now: f64) {
        let mut next = Some(to);
        let mut chained = 0;
        while let Some(to) = next {
            let from = self.machine.current();
            self.on_exit(from, to);
            self.machine.switch(to, now);
            self.on_enter(to, from);

            chained += 1;
            if chained >= MAX_CHAINED_TRANSITIONS {
                self.machine.clear_requests();
            }
            next = self.machine.take_request();
        }
    }

    fn on_enter(&mut self, state: GuardState, _from: GuardState) {
        match state {
            GuardState::Patrolling => {
                self.advance_waypoint();
                self.look_target = None;
            }
            GuardState::Investigating => {
                self.sight_time = 0.0;
                if let Some(spotted) = self.last_seen {
                    self.destination = spotted;
                    self.look_target = Some(spotted);
                }
            }
            GuardState::Caution => {
                self.destination = self.position;
            }
            GuardState::Searching => {
                self.destination = self.last_seen.unwrap_or(self.position);
                self.look_target = None;
            }
            GuardState::Alerted => {
                self.sight_time = 0.0;
                self.arrived_at = None;
                if let Some(spotted) = self.last_seen {
                    self.destination = spotted;
                }
            }
        }
    }

    fn on_exit(&mut self, state: GuardState, _to: GuardState) {
        if state == GuardState::Patrolling {
            self.arrived_at = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_math::Quat;

    struct Blind;

    impl Perception for Blind {
        fn is_visible(&self, _: &Observer, _: Vec3) -> bool {
            false
        }
        fn is_in_range(&self, _: &Observer, _: Vec3) -> bool {
            false
        }
    }

    struct AllSeeing;

    impl Perception for AllSeeing {
        fn is_visible(&self, _: &Observer, _: Vec3) -> bool {
            true
        }
        fn is_in_range(&self, _: &Observer, _: Vec3) -> bool {
            true
        }
    }

    fn guard(services: Arc<WorldServices>) -> PatrolGuard {
        let route = vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 10.0)];
        PatrolGuard::new("guard", route, PatrolConfig::default(), services, 0.0).unwrap()
    }

    fn at(position: Vec3) -> Observer {
        Observer::new(position, Quat::IDENTITY)
    }

    #[test]
    fn test_empty_route_rejected() {
        let result = PatrolGuard::new("guard", Vec::new(), PatrolConfig::default(), WorldServices::shared(), 0.0);
        assert!(matches!(result, Err(AiError::EmptyPatrolRoute)));
    }

    #[test]
    fn test_alarm_overrides_any_state() {
        let services = WorldServices::shared();
        let mut guard = guard(services.clone());
        services.raise_alarm("camera");

        guard.tick(&at(Vec3::ZERO), None, &Blind, 0.1, 0.1);
        assert_eq!(guard.state(), GuardState::Alerted);

        assert!(!guard.stand_down(0.2));
        services.clear_alarm();
        guard.tick(&at(Vec3::ZERO), None, &Blind, 0.3, 0.1);
        assert_eq!(guard.state(), GuardState::Alerted);
        assert!(guard.stand_down(0.4));
        assert_eq!(guard.state(), GuardState::Patrolling);
        assert_eq!(guard.waypoint_index(), 1);
    }

    #[test]
    fn test_continuous_sight_raises_alarm() {
        let services = WorldServices::shared();
        let mut guard = guard(services.clone());
        let player = Some(Vec3::new(0.0, 0.0, 5.0));

        let mut now = 0.0;
        guard.tick(&at(Vec3::ZERO), player, &AllSeeing, now, 0.1);
        assert_eq!(guard.state(), GuardState::Investigating);

        for _ in 0..20 {
            now += 0.1;
            guard.tick(&at(Vec3::ZERO), player, &AllSeeing, now, 0.1);
        }
        assert!(services.is_alarm_raised());
        assert_eq!(services.alarm_source().as_deref(), Some("guard"));
        assert_eq!(guard.state(), GuardState::Alerted);
    }

    #[test]
    fn test_attack_causes_caution_then_search_then_patrol() {
        let services = WorldServices::shared();
        let mut guard = guard(services);
        guard.notify_attacked(Some(Vec3::new(-3.0, 0.0, 0.0)));

        guard.tick(&at(Vec3::ZERO), None, &Blind, 0.0, 0.1);
        assert_eq!(guard.state(), GuardState::Caution);
        assert_eq!(guard.look_target(), Some(Vec3::new(-3.0, 0.0, 0.0)));

        guard.tick(&at(Vec3::ZERO), None, &Blind, 3.0, 0.1);
        assert_eq!(guard.state(), GuardState::Searching);

        guard.tick(&at(Vec3::ZERO), None, &Blind, 7.0, 0.1);
        assert_eq!(guard.state(), GuardState::Patrolling);
    }
}
