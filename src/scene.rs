//! Scene nodes: where each entity is drawn this frame and what clicking it
//! means.
//!
//! Node poses are a pure function of elapsed time and the entity id (used
//! as a phase offset so enemies don't move in lockstep).  Nothing here
//! writes back to `GameState`; the transient hit flash lives in
//! [`HitFlashes`], owned by the presentation loop.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use glam::Vec3;

use crate::entities::{Character, Enemy, EnemyKind, EntityId, GameState, PowerUp, PowerUpKind};
use crate::store::Command;

/// How long an enemy glows red after being hit.
pub const HIT_FLASH: Duration = Duration::from_millis(100);

/// Part of the ground plane visible in the viewport (world units).
pub const VIEW_X: (f32, f32) = (-16.0, 16.0);
pub const VIEW_Z: (f32, f32) = (-18.0, 12.0);

const MARIO_SPOT: Vec3 = Vec3::new(-2.0, 0.0, 8.0);
const LARA_SPOT: Vec3 = Vec3::new(2.0, 0.0, 8.0);

// ── Nodes ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    /// Rotation about the vertical axis, radians.
    pub yaw: f32,
    pub roll: f32,
}

impl Pose {
    fn at(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            roll: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeKind {
    Operative { character: Character, selected: bool },
    Enemy { id: EntityId, kind: EnemyKind, health: u32 },
    PowerUp { id: EntityId, kind: PowerUpKind },
}

impl NodeKind {
    pub fn sprite(&self) -> &'static str {
        match self {
            NodeKind::Operative { character: Character::Mario, .. } => "{M}",
            NodeKind::Operative { character: Character::Lara, .. } => "{L}",
            NodeKind::Enemy { kind: EnemyKind::Goomba, .. } => "(ò_ó)",
            NodeKind::Enemy { kind: EnemyKind::Skeleton, .. } => "[☠]",
            NodeKind::PowerUp { kind: PowerUpKind::Mushroom, .. } => "♣",
            // Unknown kind: never drawn.
            NodeKind::PowerUp { kind: PowerUpKind::Medkit, .. } => "",
            NodeKind::PowerUp { kind: PowerUpKind::Ammo, .. } => "≡",
            NodeKind::PowerUp { kind: PowerUpKind::Star, .. } => "★",
        }
    }

    /// The single command a click on this node produces.  Operatives are
    /// scenery and produce none.
    pub fn click_command(&self) -> Option<Command> {
        match *self {
            NodeKind::Operative { .. } => None,
            NodeKind::Enemy { id, .. } => Some(Command::HitEnemy(id)),
            NodeKind::PowerUp { id, kind } => Some(Command::CollectPowerUp(id, kind)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub pose: Pose,
}

// ── Animation ─────────────────────────────────────────────────────────────────

/// Operatives sway gently; the selected one also bobs.
pub fn operative_pose(character: Character, selected: bool, t: f32) -> Pose {
    let (spot, phase) = match character {
        Character::Mario => (MARIO_SPOT, 0.0),
        Character::Lara => (LARA_SPOT, std::f32::consts::PI),
    };
    let bob = if selected { (t * 3.0).sin() * 0.1 } else { 0.0 };
    Pose {
        position: spot + Vec3::Y * bob,
        yaw: (t * 2.0 + phase).sin() * 0.1,
        roll: 0.0,
    }
}

/// Wander around the spawn point.  Skeletons range wider and spin.
pub fn enemy_pose(enemy: &Enemy, t: f32) -> Pose {
    let phase = enemy.id as f32;
    let base = enemy.position;
    match enemy.kind {
        EnemyKind::Goomba => Pose::at(Vec3::new(
            base.x + (t + phase).sin() * 2.0,
            base.y,
            base.z + (t * 0.5 + phase).cos() * 2.0,
        )),
        EnemyKind::Skeleton => Pose {
            position: Vec3::new(
                base.x + (t * 0.7 + phase * 2.0).sin() * 3.0,
                base.y,
                base.z + (t * 0.4 + phase * 2.0).cos() * 3.0,
            ),
            yaw: t,
            roll: 0.0,
        },
    }
}

pub fn power_up_pose(power_up: &PowerUp, t: f32) -> Pose {
    let base = power_up.position;
    match power_up.kind {
        PowerUpKind::Mushroom | PowerUpKind::Medkit => Pose {
            position: base + Vec3::Y * ((t * 3.0).sin() * 0.2),
            yaw: t * 2.0,
            roll: 0.0,
        },
        PowerUpKind::Ammo => Pose {
            position: base + Vec3::Y * ((t * 3.0 + 1.0).sin() * 0.2),
            yaw: t * 2.0,
            roll: 0.0,
        },
        PowerUpKind::Star => Pose {
            position: base + Vec3::Y * ((t * 4.0).sin() * 0.3),
            yaw: t * 3.0,
            roll: (t * 2.0).sin() * 0.2,
        },
    }
}

/// All nodes for one frame, in draw order.  Enemies and power-ups are only
/// present while a mission is running, and power-ups without an effect are
/// never drawn.
pub fn build_scene(state: &GameState, t: f32) -> Vec<SceneNode> {
    let mut nodes = Vec::with_capacity(2 + state.enemies.len() + state.power_ups.len());

    for character in [Character::Mario, Character::Lara] {
        let selected = state.selected_character == character;
        nodes.push(SceneNode {
            kind: NodeKind::Operative { character, selected },
            pose: operative_pose(character, selected, t),
        });
    }

    if !state.is_playing {
        return nodes;
    }

    nodes.extend(
        state
            .power_ups
            .iter()
            .filter(|p| p.kind.effect().is_some())
            .map(|p| SceneNode {
                kind: NodeKind::PowerUp { id: p.id, kind: p.kind },
                pose: power_up_pose(p, t),
            }),
    );
    nodes.extend(state.enemies.iter().map(|e| SceneNode {
        kind: NodeKind::Enemy {
            id: e.id,
            kind: e.kind,
            health: e.health,
        },
        pose: enemy_pose(e, t),
    }));
    nodes
}

// ── Hit flash ─────────────────────────────────────────────────────────────────

/// Presentation-only "just hit" flags.
#[derive(Debug, Default)]
pub struct HitFlashes {
    until: HashMap<EntityId, Instant>,
}

impl HitFlashes {
    pub fn trigger(&mut self, id: EntityId, now: Instant) {
        self.until.insert(id, now + HIT_FLASH);
    }

    pub fn is_flashing(&self, id: EntityId, now: Instant) -> bool {
        self.until.get(&id).is_some_and(|&until| now < until)
    }

    pub fn prune(&mut self, now: Instant) {
        self.until.retain(|_, until| now < *until);
    }

    pub fn len(&self) -> usize {
        self.until.len()
    }

    pub fn is_empty(&self) -> bool {
        self.until.is_empty()
    }
}

// ── Projection & picking ──────────────────────────────────────────────────────

/// Terminal rectangle the arena is drawn into (inside the border).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    /// Top-down projection of a world point onto a terminal cell.  Points
    /// outside the visible region map outside the viewport.
    pub fn project(&self, p: Vec3) -> (i32, i32) {
        let fx = (p.x - VIEW_X.0) / (VIEW_X.1 - VIEW_X.0);
        let fz = (p.z - VIEW_Z.0) / (VIEW_Z.1 - VIEW_Z.0);
        let col = self.left as f32 + fx * (self.width.saturating_sub(1)) as f32;
        let row = self.top as f32 + fz * (self.height.saturating_sub(1)) as f32;
        (col.round() as i32, row.round() as i32)
    }

    pub fn contains(&self, col: i32, row: i32) -> bool {
        col >= self.left as i32
            && col < (self.left + self.width) as i32
            && row >= self.top as i32
            && row < (self.top + self.height) as i32
    }

    /// First column of a sprite centred on `col`.
    pub fn sprite_left(col: i32, sprite: &str) -> i32 {
        col - sprite.chars().count() as i32 / 2
    }
}

/// The node under terminal cell (`col`, `row`).  When sprites overlap the
/// one whose centre is closest wins, then the one drawn last.
pub fn pick<'a>(
    nodes: &'a [SceneNode],
    viewport: &Viewport,
    col: u16,
    row: u16,
) -> Option<&'a SceneNode> {
    let (col, row) = (col as i32, row as i32);
    if !viewport.contains(col, row) {
        return None;
    }

    nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.kind.click_command().is_some())
        .filter_map(|(i, n)| {
            let (c, r) = viewport.project(n.pose.position);
            let sprite = n.kind.sprite();
            let left = Viewport::sprite_left(c, sprite);
            let right = left + sprite.chars().count() as i32 - 1;
            (r == row && (left..=right).contains(&col)).then(|| ((col - c).abs(), i, n))
        })
        .min_by_key(|&(dist, i, _)| (dist, std::cmp::Reverse(i)))
        .map(|(_, _, n)| n)
}

/// Translate a mouse event into at most one command.  Only the left-button
/// press counts; drags, releases and moves never produce commands.
pub fn click_command(
    nodes: &[SceneNode],
    viewport: &Viewport,
    event: &MouseEvent,
) -> Option<Command> {
    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            pick(nodes, viewport, event.column, event.row).and_then(|n| n.kind.click_command())
        }
        _ => None,
    }
}
