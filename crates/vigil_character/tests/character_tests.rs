//! Gameplay scenarios for vigil_character
//!
//! Every test builds a small `StaticWorld`, drives the public tick API at a
//! fixed step and checks what a player would see: state changes, timing,
//! animation notifications and damage dealt.

use std::sync::Arc;
use vigil_ai::{ConeSensor, GuardState, NavGrid, PatrolConfig, WorldServices};
use vigil_character::prelude::*;
use vigil_combat::{DamageInfo, DamageKind, HealthEvent, RecordingDamageSink};
use vigil_math::{Aabb, Vec3};
use vigil_physics::{CapsuleShape, CollisionLayer, MotorConfig, StaticWorld};

const DT: f32 = 1.0 / 60.0;
const PLAYER: u64 = 1;
const TARGET: u64 = 10;

struct Scene {
    world: StaticWorld,
    player: Player,
    animator: Arc<RecordingAnimator>,
    sink: Arc<RecordingDamageSink>,
    now: f64,
}

impl Scene {
    fn new(config: GameConfig, spawn: Vec3) -> Self {
        let mut world = StaticWorld::new();
        world.add_ground(0.0, 50.0);

        let animator = Arc::new(RecordingAnimator::new());
        let sink = Arc::new(RecordingDamageSink::new());
        let player = Player::builder(PLAYER)
            .position(spawn)
            .config(config)
            .animator(animator.clone())
            .damage_sink(sink.clone())
            .build()
            .unwrap();

        Self {
            world,
            player,
            animator,
            sink,
            now: 0.0,
        }
    }

    fn flat() -> Self {
        Self::new(GameConfig::default(), Vec3::ZERO)
    }

    fn step(&mut self, input: &InputFrame) -> AttackOutcome {
        self.now += f64::from(DT);
        self.player.tick(input, &self.world, self.now, DT)
    }

    fn run(&mut self, input: &InputFrame, ticks: usize) {
        for _ in 0..ticks {
            self.step(input);
        }
    }

    fn movement_state(&self) -> PlayerMovementState {
        self.player.movement().state()
    }

    fn attack_state(&self) -> PlayerAttackState {
        self.player.attack().state()
    }
}

fn idle() -> InputFrame {
    InputFrame::default()
}

fn forward() -> InputFrame {
    InputFrame {
        move_axis_forward: 1.0,
        ..Default::default()
    }
}

fn jump() -> InputFrame {
    InputFrame {
        jump: true,
        jump_hold: true,
        ..Default::default()
    }
}

fn primary() -> InputFrame {
    InputFrame {
        primary_fire: true,
        primary_fire_hold: true,
        ..Default::default()
    }
}

/// Run forward long enough to pass the slide threshold, then press crouch
fn start_slide(scene: &mut Scene) -> InputFrame {
    scene.run(&forward(), 30);
    assert!(scene.player.motor().velocity().length() > SlideConfig::default().velocity_threshold);

    let press = InputFrame {
        crouch: true,
        crouch_hold: true,
        ..forward()
    };
    scene.step(&press);
    assert_eq!(scene.movement_state(), PlayerMovementState::Sliding);
    press.held()
}

// ---------------------------------------------------------------------------
// Sliding
// ---------------------------------------------------------------------------

#[test]
fn test_slide_ends_after_max_time_plus_stopped_time() {
    let mut scene = Scene::flat();
    let hold = start_slide(&mut scene);
    let entered = scene.player.movement().time_entered_state();
    assert!(scene.animator.flag(AnimFlag::Sliding));
    assert_eq!(scene.player.motor().capsule(), CapsuleShape::CROUCHING);

    let mut exited_at = None;
    for _ in 0..120 {
        scene.step(&hold);
        if scene.movement_state() == PlayerMovementState::Default {
            exited_at = Some(scene.now);
            break;
        }
    }

    let slide = SlideConfig::default();
    let expected = entered + f64::from(slide.max_slide_time) + f64::from(slide.stopped_time);
    let exited = exited_at.expect("slide never ended");
    assert!(exited >= expected - 1e-6, "exited at {exited}, expected {expected}");
    assert!(exited <= expected + f64::from(DT) + 1e-4, "exited at {exited}, expected {expected}");

    assert!(!scene.animator.flag(AnimFlag::Sliding));
    // Still grounded with crouch held, so the slide leaves us crouched
    assert!(scene.player.movement().is_crouching());
}

#[test]
fn test_slow_crouch_press_toggles_instead_of_sliding() {
    let mut scene = Scene::flat();
    scene.run(&idle(), 5);

    let press = InputFrame {
        crouch: true,
        crouch_hold: true,
        ..Default::default()
    };
    scene.step(&press);
    assert_eq!(scene.movement_state(), PlayerMovementState::Default);
    assert!(scene.player.movement().is_crouching());
}

#[test]
fn test_slide_kick_hits_target_once() {
    let mut scene = Scene::flat();
    let hold = start_slide(&mut scene);

    let ahead = scene.player.position().z + 2.0;
    scene.world.add_owned_box(
        Aabb::new(Vec3::new(-0.3, 0.0, ahead), Vec3::new(0.3, 1.8, ahead + 0.6)),
        CollisionLayer::ENEMIES,
        TARGET,
    );

    scene.step(&InputFrame {
        primary_fire: true,
        primary_fire_hold: true,
        ..hold
    });
    assert_eq!(scene.attack_state(), PlayerAttackState::SlideKicking);
    assert!(scene.animator.flag(AnimFlag::SlideKicking));

    scene.run(&hold, 40);
    assert_eq!(scene.sink.total_for(TARGET), AttackConfig::default().slide_kick_damage);
    assert_eq!(scene.sink.len(), 1);
}

// ---------------------------------------------------------------------------
// Jumping
// ---------------------------------------------------------------------------

#[test]
fn test_jump_reaches_configured_height_and_lands() {
    let mut scene = Scene::flat();
    scene.run(&idle(), 5);
    assert!(scene.player.movement().is_grounded());

    scene.step(&jump());
    assert!(scene.animator.flag(AnimFlag::Jumping));

    let mut peak: f32 = 0.0;
    for _ in 0..90 {
        scene.step(&idle());
        peak = peak.max(scene.player.position().y);
    }

    let height = JumpConfig::default().jump_height;
    assert!(peak > height - 0.2 && peak < height + 0.1, "peak {peak}");
    assert!(scene.player.movement().is_grounded());
    assert!(!scene.animator.flag(AnimFlag::Jumping));
    assert_eq!(scene.player.movement().fall_recovery(), FallRecoveryStatus::None);
}

/// Press jump once while falling just above the ground and report whether
/// the character takes off again after landing
fn jumps_again_after_early_press(pre_grounding_grace: f32) -> bool {
    let mut config = GameConfig::default();
    config.jump.pre_grounding_grace_time = pre_grounding_grace;
    let mut scene = Scene::new(config, Vec3::ZERO);
    scene.run(&idle(), 5);
    scene.step(&jump());

    let mut pressed = false;
    let mut landed_after_press = false;
    for _ in 0..120 {
        let falling = scene.player.motor().velocity().y < 0.0 && scene.player.position().y < 0.4;
        if falling && !pressed {
            pressed = true;
            scene.step(&jump());
        } else {
            scene.step(&idle());
        }

        if pressed && scene.player.movement().is_grounded() {
            landed_after_press = true;
        }
        if landed_after_press && scene.player.position().y > 0.5 {
            return true;
        }
    }
    false
}

#[test]
fn test_jump_pressed_before_landing_is_buffered_by_grace() {
    assert!(jumps_again_after_early_press(0.3));
    assert!(!jumps_again_after_early_press(0.0));
}

// ---------------------------------------------------------------------------
// Fall recovery
// ---------------------------------------------------------------------------

fn walk_off_platform(height: f32) -> Scene {
    let mut scene = Scene::new(GameConfig::default(), Vec3::new(0.0, height, 0.0));
    scene.world.add_box(
        Aabb::new(Vec3::new(-2.0, 0.0, -2.0), Vec3::new(2.0, height, 1.0)),
        CollisionLayer::ENVIRONMENT,
    );
    scene.run(&idle(), 3);
    assert!(scene.player.movement().is_grounded());

    let mut left_ground = false;
    for _ in 0..180 {
        scene.step(&forward());
        if !scene.player.movement().is_grounded() {
            left_ground = true;
        } else if left_ground {
            break;
        }
    }
    assert!(left_ground);
    assert!(scene.player.movement().is_grounded());
    scene
}

#[test]
fn test_long_fall_crouch_recovers() {
    let mut scene = walk_off_platform(4.0);
    assert_eq!(
        scene.player.movement().fall_recovery(),
        FallRecoveryStatus::CrouchRecovering
    );
    assert_eq!(scene.animator.stance(), Stance::CrouchRecovering);

    // Attacks are not evaluated while recovering
    scene.step(&primary());
    assert_eq!(scene.attack_state(), PlayerAttackState::Idle);

    // 0.25 s at 60 Hz, counting the attack tick above
    let ticks = 1 + recovery_ticks(&mut scene, FallRecoveryStatus::CrouchRecovering);
    assert_eq!(ticks, 15);
    assert_eq!(scene.player.movement().fall_recovery(), FallRecoveryStatus::None);
    assert_eq!(scene.animator.stance(), Stance::Standing);
}

#[test]
fn test_medium_fall_recovers_standing() {
    let mut scene = walk_off_platform(3.2);
    assert_eq!(scene.player.movement().fall_recovery(), FallRecoveryStatus::Recovering);
    assert_eq!(scene.animator.stance(), Stance::Recovering);

    // 0.15 s at 60 Hz
    assert_eq!(recovery_ticks(&mut scene, FallRecoveryStatus::Recovering), 9);
    assert_eq!(scene.animator.stance(), Stance::Standing);
}

/// Idles until the recovery ends and returns how many ticks that took.
fn recovery_ticks(scene: &mut Scene, status: FallRecoveryStatus) -> usize {
    let mut ticks = 0;
    while scene.player.movement().fall_recovery() != FallRecoveryStatus::None {
        assert_eq!(scene.player.movement().fall_recovery(), status);
        scene.step(&idle());
        ticks += 1;
        assert!(ticks <= 60, "recovery never ended");
    }
    ticks
}

// ---------------------------------------------------------------------------
// Crouching
// ---------------------------------------------------------------------------

#[test]
fn test_held_crouch_announces_once_and_waits_for_headroom() {
    let mut scene = Scene::flat();
    scene.run(&idle(), 5);

    let press = InputFrame {
        crouch: true,
        crouch_hold: true,
        ..Default::default()
    };
    scene.step(&press);
    scene.run(&press.held(), 20);
    assert!(scene.player.movement().is_crouching());
    let crouch_announcements = scene
        .animator
        .stance_changes()
        .into_iter()
        .filter(|stance| *stance == Stance::Crouching)
        .count();
    assert_eq!(crouch_announcements, 1);

    // Low ceiling over the crouched character
    scene.world.add_box(
        Aabb::new(Vec3::new(-1.0, 1.2, -1.0), Vec3::new(1.0, 1.5, 1.0)),
        CollisionLayer::ENVIRONMENT,
    );
    scene.run(&idle(), 10);
    assert!(!scene.player.movement().should_be_crouching());
    assert!(scene.player.movement().is_crouching());
    assert_eq!(scene.player.motor().capsule(), CapsuleShape::CROUCHING);

    // Walk out from under it
    scene.run(&forward(), 60);
    assert!(!scene.player.movement().is_crouching());
    assert_eq!(scene.player.motor().capsule(), CapsuleShape::STANDING);
    assert_eq!(scene.animator.stance(), Stance::Standing);
}

// ---------------------------------------------------------------------------
// Attacks
// ---------------------------------------------------------------------------

#[test]
fn test_short_charge_releases_basic_attack() {
    let mut scene = Scene::flat();
    scene.world.add_owned_box(
        Aabb::new(Vec3::new(-0.3, 0.0, 0.8), Vec3::new(0.3, 1.8, 1.4)),
        CollisionLayer::ENEMIES,
        TARGET,
    );
    scene.run(&idle(), 5);

    scene.step(&primary());
    assert_eq!(scene.attack_state(), PlayerAttackState::ChargingAttack);

    scene.run(&primary().held(), 12);
    assert_eq!(scene.attack_state(), PlayerAttackState::ChargingAttack);
    // Charging forces a walk
    assert!(scene.player.movement().is_walking());
    assert!(scene.player.attack().charge_percentage() < AttackConfig::default().charge_attack_minimum_charge_percentage);

    scene.step(&idle());
    assert_eq!(scene.attack_state(), PlayerAttackState::BasicAttacking);
    assert_eq!(scene.animator.attack_variant(), 1);
    assert_eq!(scene.animator.playback_speed(), 1.0);
    assert_eq!(scene.sink.total_for(TARGET), AttackConfig::default().basic_attack_damage);

    scene.run(&idle(), 30);
    assert_eq!(scene.attack_state(), PlayerAttackState::Idle);
}

#[test]
fn test_full_charge_holds_then_resets_on_next_press() {
    let config = AttackConfig::default();
    let mut scene = Scene::flat();
    scene.run(&idle(), 5);

    scene.step(&primary());
    assert_eq!(scene.attack_state(), PlayerAttackState::ChargingAttack);

    // Held past full charge, the percentage only ever climbs
    let ticks = (config.attack_fully_charged_motion_time / DT) as usize + 20;
    let mut last = scene.player.attack().charge_percentage();
    for _ in 0..ticks {
        scene.step(&primary().held());
        let charge = scene.player.attack().charge_percentage();
        assert!(charge >= last, "charge dropped from {last} to {charge}");
        last = charge;
    }
    assert_eq!(scene.attack_state(), PlayerAttackState::ChargingAttack);
    assert_eq!(last, 1.0);

    scene.step(&idle());
    assert_eq!(scene.attack_state(), PlayerAttackState::ChargeAttacking);

    let mut waited = 0;
    while scene.attack_state() != PlayerAttackState::Idle {
        scene.step(&idle());
        waited += 1;
        assert!(waited <= 60, "charge attack never finished");
    }

    scene.step(&primary());
    assert_eq!(scene.attack_state(), PlayerAttackState::ChargingAttack);
    assert_eq!(scene.player.attack().charge_percentage(), 0.0);
}

#[test]
fn test_dead_player_ignores_input() {
    let mut scene = Scene::flat();
    scene.run(&idle(), 5);

    let events = scene
        .player
        .receive_attack(&DamageInfo::new(500.0, DamageKind::Melee).with_source(TARGET));
    assert!(events
        .iter()
        .any(|event| matches!(event, HealthEvent::Death { killer: Some(TARGET), .. })));

    let start = scene.player.position();
    scene.run(&forward(), 30);
    assert_eq!(scene.player.position(), start);
}

// ---------------------------------------------------------------------------
// Ledges
// ---------------------------------------------------------------------------

fn wall_scene(top: f32, spawn_z: f32) -> Scene {
    let mut scene = Scene::new(GameConfig::default(), Vec3::new(0.0, 0.0, spawn_z));
    scene.world.add_box(
        Aabb::new(Vec3::new(-2.0, 0.0, 1.0), Vec3::new(2.0, top, 3.0)),
        CollisionLayer::ENVIRONMENT,
    );
    scene.run(&idle(), 5);
    scene
}

#[test]
fn test_jump_grabs_ledge_then_climbs_up() {
    let mut scene = wall_scene(2.6, 0.6);
    scene.step(&jump());

    let mut grabbed = false;
    for _ in 0..40 {
        scene.step(&idle());
        if scene.movement_state() == PlayerMovementState::Hanging {
            grabbed = true;
            break;
        }
    }
    assert!(grabbed);
    assert!(!scene.player.motor().collision_solving());

    scene.run(&idle(), 30);
    let hang = scene.player.position();
    assert!((hang.y - 0.9).abs() < 1e-3, "hanging at {hang:?}");
    assert!((hang.z - 0.7).abs() < 1e-3, "hanging at {hang:?}");
    assert!(scene.animator.flag(AnimFlag::Hanging));

    scene.step(&jump());
    assert_eq!(scene.movement_state(), PlayerMovementState::ClimbingUp);
    assert_eq!(scene.player.movement().climb_kind(), Some(ClimbKind::Climb));
    assert!(!scene.animator.flag(AnimFlag::Hanging));

    let mut climbed = false;
    for _ in 0..70 {
        scene.step(&idle());
        if scene.movement_state() == PlayerMovementState::Default {
            climbed = true;
            break;
        }
    }
    assert!(climbed);
    let top = scene.player.position();
    assert!((top.y - 2.6).abs() < 1e-3, "climbed to {top:?}");
    assert!((top.z - 1.35).abs() < 1e-3, "climbed to {top:?}");
    assert!(scene.player.motor().collision_solving());

    scene.run(&idle(), 5);
    assert!(scene.player.movement().is_grounded());
}

#[test]
fn test_crouch_drops_from_ledge() {
    let mut scene = wall_scene(2.6, 0.6);
    scene.step(&jump());
    for _ in 0..40 {
        scene.step(&idle());
        if scene.movement_state() == PlayerMovementState::Hanging {
            break;
        }
    }
    assert_eq!(scene.movement_state(), PlayerMovementState::Hanging);

    scene.step(&InputFrame {
        crouch: true,
        ..Default::default()
    });
    assert_eq!(scene.movement_state(), PlayerMovementState::Default);
    assert!(scene.player.motor().collision_solving());

    // The regrab cooldown keeps us from catching the same edge on the way down
    scene.run(&idle(), 60);
    assert_eq!(scene.movement_state(), PlayerMovementState::Default);
    assert!(scene.player.movement().is_grounded());
}

/// Walk into a low obstacle and return the kind of climb that started
fn climb_onto(top: f32, first: InputFrame) -> (Scene, Option<ClimbKind>) {
    let mut scene = wall_scene(top, 0.5);
    scene.step(&first);
    for _ in 0..10 {
        if scene.movement_state() == PlayerMovementState::ClimbingUp {
            break;
        }
        scene.step(&forward());
    }
    let kind = scene.player.movement().climb_kind();
    (scene, kind)
}

#[test]
fn test_walking_into_kerb_steps_up() {
    let (mut scene, kind) = climb_onto(0.3, forward());
    assert_eq!(kind, Some(ClimbKind::StepUp));
    assert!(scene.animator.flag(AnimFlag::SteppingUp));

    for _ in 0..30 {
        if scene.movement_state() == PlayerMovementState::Default {
            break;
        }
        scene.step(&forward());
    }
    assert_eq!(scene.movement_state(), PlayerMovementState::Default);
    assert!((scene.player.position().y - 0.3).abs() < 1e-3);
    assert!(!scene.animator.flag(AnimFlag::SteppingUp));
}

#[test]
fn test_jumping_at_waist_high_wall_vaults() {
    let press = InputFrame {
        jump: true,
        jump_hold: true,
        ..forward()
    };
    let (scene, kind) = climb_onto(0.9, press);
    assert_eq!(kind, Some(ClimbKind::Vault));
    assert!(scene.animator.flag(AnimFlag::Vaulting));
}

// ---------------------------------------------------------------------------
// Enemies
// ---------------------------------------------------------------------------

struct EnemyScene {
    world: StaticWorld,
    nav: NavGrid,
    sensor: ConeSensor,
    now: f64,
}

impl EnemyScene {
    fn new() -> Self {
        let mut world = StaticWorld::new();
        world.add_ground(0.0, 50.0);
        Self {
            world,
            nav: NavGrid::new(Vec3::new(-10.0, 0.0, -10.0), 20.0, 20.0, 0.5).unwrap(),
            sensor: ConeSensor::default(),
            now: 0.0,
        }
    }

    fn run(&mut self, agent: &mut EnemyAgent, target: Option<Vec3>, ticks: usize) {
        for _ in 0..ticks {
            self.now += f64::from(DT);
            agent.tick(&self.world, &self.nav, &self.sensor, target, self.now, DT);
        }
    }
}

fn enemy() -> EnemyAgent {
    EnemyAgent::new(
        TARGET,
        Vec3::ZERO,
        EnemyConfig::default(),
        MotorConfig::default(),
        Arc::new(RecordingAnimator::new()),
    )
    .unwrap()
}

#[test]
fn test_enemy_steers_to_target_and_stops() {
    let mut scene = EnemyScene::new();
    let mut agent = enemy();
    let target = Vec3::new(0.0, 0.0, 5.0);

    scene.run(&mut agent, Some(target), 150);
    let remaining = (target - agent.position()).horizontal().length();
    assert!(remaining < 0.5, "stopped {remaining} from the target");
    assert!(agent.motor().velocity().length() < 0.1);
}

#[test]
fn test_dead_enemy_stops_steering() {
    let mut scene = EnemyScene::new();
    let mut agent = enemy();
    scene.run(&mut agent, None, 30);

    let events = agent.receive_attack(&DamageInfo::new(100.0, DamageKind::ChargeAttack).with_source(PLAYER));
    assert!(agent.is_dead());
    assert!(agent.was_attacked());
    assert!(events.iter().any(|event| matches!(event, HealthEvent::Death { .. })));

    let resting = agent.position();
    scene.run(&mut agent, Some(Vec3::new(0.0, 0.0, 5.0)), 60);
    assert!((agent.position() - resting).length() < 1e-3);

    let sink = RecordingDamageSink::new();
    assert!(agent.attack(&scene.world, &sink).is_empty());
}

#[test]
fn test_guard_walks_to_first_waypoint_and_reacts_to_hits() {
    let mut scene = EnemyScene::new();
    let route = vec![Vec3::new(0.0, 0.0, 4.0), Vec3::new(4.0, 0.0, 4.0)];
    let mut agent = enemy()
        .with_patrol(route, PatrolConfig::default(), WorldServices::shared(), 0.0)
        .unwrap();

    scene.run(&mut agent, None, 120);
    assert_eq!(agent.guard_state(), Some(GuardState::Patrolling));
    assert!((Vec3::new(0.0, 0.0, 4.0) - agent.position()).horizontal().length() < 0.6);

    agent.receive_attack(&DamageInfo::new(5.0, DamageKind::BasicAttack).with_hit_point(Vec3::new(0.0, 1.0, 3.0)));
    assert!(!agent.is_dead());
    scene.run(&mut agent, None, 1);
    assert_eq!(agent.guard_state(), Some(GuardState::Caution));
}
