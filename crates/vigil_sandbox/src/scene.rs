//! Sandbox Scene
//!
//! A small courtyard: flat ground, a kerb, a climbable wall, one patrolling
//! guard and one security camera over the far end. Damage recorded by each
//! side's sink is routed to the other side at the end of every tick.

use std::sync::Arc;

use vigil_ai::{CameraState, ConeSensor, GuardState, NavGrid, SecurityCamera, WorldServices};
use vigil_character::{
    EnemyAgent, GameConfig, InputFrame, NullAnimator, OrbitCamera, Player, PlayerAttackState, PlayerMovementState,
};
use vigil_combat::{HealthEvent, RecordingDamageSink};
use vigil_math::{Aabb, Vec2, Vec3};
use vigil_physics::{ColliderHandle, CollisionLayer, LayerMask, MotorConfig, PhysicsError, StaticWorld};

pub const PLAYER_ENTITY: u64 = 1;
pub const GUARD_ENTITY: u64 = 2;

/// Seconds between guard swings
const GUARD_ATTACK_INTERVAL: f64 = 1.0;
/// Horizontal distance at which the guard swings
const GUARD_ATTACK_RANGE: f32 = 1.2;
/// Height of the point perception aims at on the player
const PLAYER_CHEST_HEIGHT: f32 = 1.2;

/// Snapshot of everything worth logging when it changes
#[derive(Debug, Clone, Copy, PartialEq)]
struct Watched {
    movement: PlayerMovementState,
    attack: PlayerAttackState,
    guard: Option<GuardState>,
    camera: CameraState,
    alarm: bool,
}

pub struct Scene {
    world: StaticWorld,
    nav: NavGrid,
    services: Arc<WorldServices>,
    sensor: ConeSensor,
    player: Player,
    player_hurtbox: ColliderHandle,
    player_hits: Arc<RecordingDamageSink>,
    guard: EnemyAgent,
    guard_hurtbox: ColliderHandle,
    guard_hits: Arc<RecordingDamageSink>,
    guard_next_attack: f64,
    camera: SecurityCamera,
    orbit: OrbitCamera,
    watched: Watched,
    now: f64,
    ticks: u64,
}

impl Scene {
    pub fn new(config: GameConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let now = 0.0;
        let mut world = StaticWorld::new();
        world.add_ground(0.0, 30.0);
        // Kerb the player steps onto
        world.add_box(
            Aabb::new(Vec3::new(-2.0, 0.0, 3.0), Vec3::new(2.0, 0.3, 3.6)),
            CollisionLayer::ENVIRONMENT,
        );
        // Wall with a ledge at 2 m
        world.add_box(
            Aabb::new(Vec3::new(-3.0, 0.0, 14.0), Vec3::new(3.0, 2.0, 15.0)),
            CollisionLayer::ENVIRONMENT,
        );

        let mut nav = NavGrid::new(Vec3::new(-15.0, 0.0, -15.0), 30.0, 30.0, 0.5)?;
        nav.bake_obstacles(&world, 0.4, 1.6);

        let services = WorldServices::shared();

        let player_hits = Arc::new(RecordingDamageSink::new());
        let player = Player::builder(PLAYER_ENTITY)
            .config(config.clone())
            .animator(Arc::new(NullAnimator))
            .damage_sink(player_hits.clone())
            .start_time(now)
            .build()?;
        let player_hurtbox = world.add_owned_box(
            player.motor().capsule().bounds_at(player.position()),
            CollisionLayer::PLAYER,
            PLAYER_ENTITY,
        );

        let guard = EnemyAgent::new(
            GUARD_ENTITY,
            Vec3::new(-4.0, 0.0, 9.0),
            config.enemy.clone(),
            MotorConfig::default(),
            Arc::new(NullAnimator),
        )?
        .with_patrol(
            vec![Vec3::new(-4.0, 0.0, 9.0), Vec3::new(4.0, 0.0, 9.0)],
            config.patrol.clone(),
            services.clone(),
            now,
        )?;
        let guard_hurtbox = world.add_owned_box(guard.hurtbox(), CollisionLayer::ENEMIES, GUARD_ENTITY);

        let camera = SecurityCamera::new(
            "CourtyardCam",
            Vec3::new(0.0, 3.5, 16.0),
            std::f32::consts::PI,
            0.35,
            config.security_camera.clone(),
            services.clone(),
            now,
        )?;

        let orbit = OrbitCamera::new(config.camera.clone(), player.motor().character_forward(), Vec3::Y);

        let watched = Watched {
            movement: player.movement().state(),
            attack: player.attack().state(),
            guard: guard.guard_state(),
            camera: camera.state(),
            alarm: services.is_alarm_raised(),
        };

        log::info!(
            "Scene ready: {} colliders, nav grid {}x{}",
            world.len(),
            nav.cols(),
            nav.rows()
        );

        Ok(Self {
            world,
            nav,
            services,
            sensor: ConeSensor::default(),
            player,
            player_hurtbox,
            player_hits,
            guard,
            guard_hurtbox,
            guard_hits: Arc::new(RecordingDamageSink::new()),
            guard_next_attack: now,
            camera,
            orbit,
            watched,
            now,
            ticks: 0,
        })
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    /// Run one fixed tick
    pub fn step(&mut self, mut input: InputFrame, look: Vec2, dt: f32) -> Result<(), PhysicsError> {
        input.camera_rotation = self.orbit.update(look, Vec3::Y, dt);

        let outcome = self.player.tick(&input, &self.world, self.now, dt);
        if !outcome.struck.is_empty() {
            log::info!("Player struck {:?}", outcome.struck);
        }
        self.world.set_bounds(
            self.player_hurtbox,
            self.player.motor().capsule().bounds_at(self.player.position()),
        )?;

        let chest = self.player.position() + Vec3::Y * PLAYER_CHEST_HEIGHT;
        let target = (!self.player.status().is_dead()).then_some(chest);

        {
            let perception = self.sensor.occluded_by(&self.world, LayerMask::from_layers(&[CollisionLayer::ENVIRONMENT]));
            self.guard
                .tick(&self.world, &self.nav, &perception, target, self.now, dt);
            self.camera.tick(target, &perception, self.now, dt);
        }
        self.world.set_bounds(self.guard_hurtbox, self.guard.hurtbox())?;

        self.guard_swing();
        self.route_damage();
        self.log_changes();

        self.now += f64::from(dt);
        self.ticks += 1;
        Ok(())
    }

    /// Guard swings at a player in reach once it knows about them
    fn guard_swing(&mut self) {
        let engaged = matches!(
            self.guard.guard_state(),
            Some(GuardState::Alerted | GuardState::Caution)
        );
        if !engaged || self.now < self.guard_next_attack {
            return;
        }
        let offset = (self.player.position() - self.guard.position()).project_on_plane(Vec3::Y);
        if offset.length() > GUARD_ATTACK_RANGE {
            return;
        }
        let struck = self.guard.attack(&self.world, &*self.guard_hits);
        if !struck.is_empty() {
            log::info!("Guard struck {:?}", struck);
        }
        self.guard_next_attack = self.now + GUARD_ATTACK_INTERVAL;
    }

    fn route_damage(&mut self) {
        for (target, damage) in self.player_hits.take() {
            if target == GUARD_ENTITY {
                for event in self.guard.receive_attack(&damage) {
                    log_health(&event);
                }
            }
        }
        for (target, damage) in self.guard_hits.take() {
            if target == PLAYER_ENTITY {
                for event in self.player.receive_attack(&damage) {
                    log_health(&event);
                }
            }
        }
    }

    fn log_changes(&mut self) {
        let current = Watched {
            movement: self.player.movement().state(),
            attack: self.player.attack().state(),
            guard: self.guard.guard_state(),
            camera: self.camera.state(),
            alarm: self.services.is_alarm_raised(),
        };
        if current == self.watched {
            return;
        }
        let t = self.now;
        if current.movement != self.watched.movement {
            log::info!("[{t:6.2}] player movement {:?} -> {:?}", self.watched.movement, current.movement);
        }
        if current.attack != self.watched.attack {
            log::info!("[{t:6.2}] player attack {:?} -> {:?}", self.watched.attack, current.attack);
        }
        if current.guard != self.watched.guard {
            log::info!("[{t:6.2}] guard {:?} -> {:?}", self.watched.guard, current.guard);
        }
        if current.camera != self.watched.camera {
            log::info!(
                "[{t:6.2}] camera {:?} -> {:?} ({:?})",
                self.watched.camera,
                current.camera,
                self.camera.indicator()
            );
        }
        if current.alarm != self.watched.alarm {
            log::info!(
                "[{t:6.2}] alarm {} (source {:?})",
                if current.alarm { "raised" } else { "cleared" },
                self.services.alarm_source()
            );
        }
        self.watched = current;
    }

    /// Clear the alarm and send the guard back to its route
    pub fn all_clear(&mut self) {
        self.services.clear_alarm();
        if self.guard.stand_down(self.now) {
            log::info!("[{:6.2}] guard stood down", self.now);
        }
    }

    pub fn log_summary(&self) {
        log::info!("Ran {} ticks, {:.2}s simulated", self.ticks, self.now);
        log::info!(
            "Player at {:?}, health {}/{}, movement {:?}",
            self.player.position(),
            self.player.status().health(),
            self.player.status().max_health(),
            self.player.movement().state()
        );
        log::info!(
            "Guard at {:?}, health {}/{}, state {:?}, attacked {}",
            self.guard.position(),
            self.guard.status().health(),
            self.guard.status().max_health(),
            self.guard.guard_state(),
            self.guard.was_attacked()
        );
        log::info!(
            "Camera {:?}, alarm raised {} time(s)",
            self.camera.state(),
            self.services.times_raised()
        );
    }
}

fn log_health(event: &HealthEvent) {
    match event {
        HealthEvent::DamageTaken { entity, damage, new_health } => {
            log::info!("Entity {} took {} ({:?}), health now {}", entity, damage.amount, damage.kind, new_health);
        }
        other => log::debug!("{:?}", other),
    }
}
