use std::time::{Duration, Instant};

use combat_zone::compute::{init_state, start_game};
use combat_zone::display::viewport_for;
use combat_zone::entities::*;
use combat_zone::scene::*;
use combat_zone::store::Command;

use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use glam::Vec3;

fn playing_state() -> GameState {
    start_game(&init_state(Character::Mario))
}

fn viewport() -> Viewport {
    viewport_for(80, 24)
}

fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
    MouseEvent { kind, column, row, modifiers: KeyModifiers::NONE }
}

fn screen_pos(node: &SceneNode) -> (u16, u16) {
    let (c, r) = viewport().project(node.pose.position);
    (c as u16, r as u16)
}

// ── build_scene ───────────────────────────────────────────────────────────────

#[test]
fn only_operatives_when_not_playing() {
    let mut s = playing_state();
    s.is_playing = false;
    let nodes = build_scene(&s, 1.0);
    assert_eq!(nodes.len(), 2);
    assert!(nodes.iter().all(|n| matches!(n.kind, NodeKind::Operative { .. })));
}

#[test]
fn one_node_per_entity_while_playing() {
    let s = playing_state();
    let nodes = build_scene(&s, 1.0);
    assert_eq!(nodes.len(), 2 + 7 + 5);
    let selected: Vec<_> = nodes
        .iter()
        .filter(|n| matches!(n.kind, NodeKind::Operative { selected: true, .. }))
        .collect();
    assert_eq!(selected.len(), 1);
}

#[test]
fn power_ups_without_effect_are_not_drawn() {
    let mut s = playing_state();
    s.power_ups.push(PowerUp { id: 200, position: Vec3::new(0.0, 0.5, 0.0), kind: PowerUpKind::Medkit });
    let nodes = build_scene(&s, 1.0);
    assert_eq!(nodes.len(), 2 + 7 + 5);
    assert!(!nodes.iter().any(|n| matches!(n.kind, NodeKind::PowerUp { id: 200, .. })));
}

#[test]
fn animation_is_deterministic_and_leaves_state_alone() {
    let s = playing_state();
    let before = s.clone();
    assert_eq!(build_scene(&s, 2.5), build_scene(&s, 2.5));
    assert_eq!(s, before);
}

// ── Poses ─────────────────────────────────────────────────────────────────────

#[test]
fn goomba_wobble_formula() {
    let e = Enemy { id: 1, position: Vec3::new(-5.0, 0.0, -5.0), health: 100, kind: EnemyKind::Goomba };
    let p = enemy_pose(&e, 0.0);
    assert!((p.position.x - (-5.0 + 1.0f32.sin() * 2.0)).abs() < 1e-5);
    assert!((p.position.z - (-5.0 + 1.0f32.cos() * 2.0)).abs() < 1e-5);
    assert_eq!(p.yaw, 0.0);
}

#[test]
fn skeleton_spins_and_ranges_wider() {
    let e = Enemy { id: 3, position: Vec3::ZERO, health: 150, kind: EnemyKind::Skeleton };
    for t in [0.0f32, 1.3, 7.9] {
        let p = enemy_pose(&e, t);
        assert_eq!(p.yaw, t);
        assert!(p.position.x.abs() <= 3.0 + 1e-5);
        assert!(p.position.z.abs() <= 3.0 + 1e-5);
    }
}

#[test]
fn id_offsets_phase() {
    let a = Enemy { id: 1, position: Vec3::ZERO, health: 100, kind: EnemyKind::Goomba };
    let b = Enemy { id: 2, ..a.clone() };
    assert_ne!(enemy_pose(&a, 3.0).position, enemy_pose(&b, 3.0).position);
}

#[test]
fn power_ups_bob_around_spawn_height() {
    let p = PowerUp { id: 103, position: Vec3::new(0.0, 0.5, -3.0), kind: PowerUpKind::Star };
    for t in [0.0f32, 0.4, 2.0, 9.1] {
        let pose = power_up_pose(&p, t);
        assert!((pose.position.y - 0.5).abs() <= 0.3 + 1e-5);
        assert_eq!(pose.position.x, 0.0);
        assert_eq!(pose.yaw, t * 3.0);
    }
    let ammo = PowerUp { kind: PowerUpKind::Ammo, ..p };
    assert!((power_up_pose(&ammo, 0.0).position.y - (0.5 + 1.0f32.sin() * 0.2)).abs() < 1e-5);
}

#[test]
fn only_selected_operative_bobs() {
    let t = 0.5;
    assert_eq!(operative_pose(Character::Lara, false, t).position, Vec3::new(2.0, 0.0, 8.0));
    let bobbing = operative_pose(Character::Mario, true, t);
    assert!((bobbing.position.y - (1.5f32).sin() * 0.1).abs() < 1e-6);
}

// ── Hit flash ─────────────────────────────────────────────────────────────────

#[test]
fn hit_flash_expires() {
    let mut flashes = HitFlashes::default();
    let now = Instant::now();
    flashes.trigger(5, now);
    assert!(flashes.is_flashing(5, now));
    assert!(flashes.is_flashing(5, now + Duration::from_millis(50)));
    assert!(!flashes.is_flashing(5, now + HIT_FLASH));
    assert!(!flashes.is_flashing(6, now));

    flashes.prune(now + Duration::from_millis(150));
    assert!(flashes.is_empty());
}

// ── Picking ───────────────────────────────────────────────────────────────────

#[test]
fn projection_corners() {
    let vp = viewport();
    assert_eq!(vp.project(Vec3::new(VIEW_X.0, 0.0, VIEW_Z.0)), (vp.left as i32, vp.top as i32));
    assert_eq!(
        vp.project(Vec3::new(VIEW_X.1, 0.0, VIEW_Z.1)),
        ((vp.left + vp.width - 1) as i32, (vp.top + vp.height - 1) as i32)
    );
    assert!(vp.contains(vp.left as i32, vp.top as i32));
    assert!(!vp.contains(0, 0));
}

#[test]
fn click_on_enemy_hits_it() {
    let mut s = playing_state();
    s.enemies.truncate(1);
    s.power_ups.clear();
    let nodes = build_scene(&s, 0.0);
    let enemy = nodes.iter().find(|n| matches!(n.kind, NodeKind::Enemy { .. })).unwrap();
    let (col, row) = screen_pos(enemy);

    let cmd = click_command(&nodes, &viewport(), &mouse(MouseEventKind::Down(MouseButton::Left), col, row));
    assert_eq!(cmd, Some(Command::HitEnemy(1)));
}

#[test]
fn click_on_power_up_collects_it() {
    let mut s = playing_state();
    s.enemies.clear();
    s.power_ups.retain(|p| p.id == 103);
    let nodes = build_scene(&s, 0.0);
    let node = nodes.iter().find(|n| matches!(n.kind, NodeKind::PowerUp { .. })).unwrap();
    let (col, row) = screen_pos(node);

    let cmd = click_command(&nodes, &viewport(), &mouse(MouseEventKind::Down(MouseButton::Left), col, row));
    assert_eq!(cmd, Some(Command::CollectPowerUp(103, PowerUpKind::Star)));
}

#[test]
fn only_left_press_counts() {
    let mut s = playing_state();
    s.enemies.truncate(1);
    s.power_ups.clear();
    let nodes = build_scene(&s, 0.0);
    let enemy = nodes.iter().find(|n| matches!(n.kind, NodeKind::Enemy { .. })).unwrap();
    let (col, row) = screen_pos(enemy);

    for kind in [
        MouseEventKind::Up(MouseButton::Left),
        MouseEventKind::Drag(MouseButton::Left),
        MouseEventKind::Moved,
        MouseEventKind::Down(MouseButton::Right),
    ] {
        assert_eq!(click_command(&nodes, &viewport(), &mouse(kind, col, row)), None);
    }
}

#[test]
fn operatives_and_empty_cells_are_not_pickable() {
    let s = init_state(Character::Mario);
    let nodes = build_scene(&s, 0.0);
    let (col, row) = screen_pos(&nodes[0]);
    assert!(pick(&nodes, &viewport(), col, row).is_none());
    assert!(pick(&nodes, &viewport(), 0, 0).is_none());
}

#[test]
fn nothing_pickable_when_not_playing() {
    let mut s = playing_state();
    let nodes_playing = build_scene(&s, 0.0);
    let enemy = nodes_playing.iter().find(|n| matches!(n.kind, NodeKind::Enemy { .. })).unwrap();
    let (col, row) = screen_pos(enemy);

    s.is_playing = false;
    let nodes = build_scene(&s, 0.0);
    assert!(pick(&nodes, &viewport(), col, row).is_none());
}
