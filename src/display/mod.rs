/// Rendering layer — all terminal I/O lives here.
///
/// Each function receives a mutable writer and an immutable view of the
/// frame (state snapshot plus scene nodes).  No game logic is performed;
/// this module only translates state into terminal commands.

use std::io::Write;
use std::time::Instant;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal,
    QueueableCommand,
};

use crate::compute::MAX_HEALTH;
use crate::entities::{Character, EnemyKind, GameState, PowerUpKind};
use crate::scene::{HitFlashes, NodeKind, SceneNode, Viewport};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_GRID: Color = Color::DarkGreen;
const C_HUD_HEALTH: Color = Color::Red;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_AMMO: Color = Color::Cyan;
const C_MARIO: Color = Color::Red;
const C_LARA: Color = Color::DarkCyan;
const C_GOOMBA: Color = Color::DarkYellow;
const C_SKELETON: Color = Color::White;
const C_FLASH: Color = Color::Red;
const C_BAR_GOOMBA: Color = Color::Red;
const C_BAR_SKELETON: Color = Color::Magenta;
const C_CROSSHAIR: Color = Color::Green;
const C_HINT: Color = Color::DarkGrey;

const HEALTH_BAR_WIDTH: usize = 5;

/// Everything needed to draw one frame.
pub struct Frame<'a> {
    pub state: &'a GameState,
    pub nodes: &'a [SceneNode],
    pub flashes: &'a HitFlashes,
    pub now: Instant,
    /// Last known mouse position.
    pub crosshair: Option<(u16, u16)>,
    pub width: u16,
    pub height: u16,
}

/// Arena interior for a terminal of the given size: HUD on row 0, border on
/// rows 1 and height-2, status line on the last row.
pub fn viewport_for(width: u16, height: u16) -> Viewport {
    Viewport {
        left: 1,
        top: 2,
        width: width.saturating_sub(2),
        height: height.saturating_sub(4),
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(out: &mut W, frame: &Frame) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let viewport = viewport_for(frame.width, frame.height);
    draw_border(out, frame)?;
    draw_grid(out, &viewport)?;
    draw_hud(out, frame)?;

    for node in frame.nodes {
        draw_node(out, node, &viewport, frame)?;
    }

    draw_status_line(out, frame)?;

    if frame.state.is_playing {
        if let Some((col, row)) = frame.crosshair {
            if viewport.contains(col as i32, row as i32) {
                out.queue(cursor::MoveTo(col, row))?;
                out.queue(style::SetForegroundColor(C_CROSSHAIR))?;
                out.queue(Print("┼"))?;
            }
        }
    } else {
        draw_briefing(out, frame)?;
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, frame.height.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border & ground ───────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, frame: &Frame) -> std::io::Result<()> {
    let w = frame.width as usize;
    let h = frame.height;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    out.queue(cursor::MoveTo(0, h.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..h.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(frame.width.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

/// Faint dots every 2.5 world units, like the lines painted on the arena floor.
fn draw_grid<W: Write>(out: &mut W, viewport: &Viewport) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(C_GRID))?;
    let steps = (0..=20).map(|i| -25.0 + i as f32 * 2.5);
    for x in steps.clone() {
        for z in steps.clone() {
            let (col, row) = viewport.project(glam::Vec3::new(x, 0.0, z));
            if viewport.contains(col, row) {
                out.queue(cursor::MoveTo(col as u16, row as u16))?;
                out.queue(Print("·"))?;
            }
        }
    }
    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, frame: &Frame) -> std::io::Result<()> {
    let state = frame.state;

    // Health — left
    let filled = (state.health.min(MAX_HEALTH) as usize * 10).div_ceil(MAX_HEALTH as usize);
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_HEALTH))?;
    out.queue(Print(format!(
        "HEALTH {}{} {:>3}",
        "█".repeat(filled),
        "░".repeat(10 - filled),
        state.health
    )))?;

    // Score — centre
    let score_str = format!("SCORE {:06}", state.score);
    let sx = (frame.width / 2).saturating_sub(score_str.len() as u16 / 2);
    out.queue(cursor::MoveTo(sx, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(&score_str))?;

    // Ammo — right
    let ammo_str = format!("AMMO {}", state.ammo);
    let ax = frame.width.saturating_sub(ammo_str.len() as u16 + 1);
    out.queue(cursor::MoveTo(ax, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_AMMO))?;
    out.queue(Print(&ammo_str))?;

    Ok(())
}

// ── Entities ──────────────────────────────────────────────────────────────────

fn node_color(node: &SceneNode, frame: &Frame) -> Color {
    match node.kind {
        NodeKind::Operative { character: Character::Mario, .. } => C_MARIO,
        NodeKind::Operative { character: Character::Lara, .. } => C_LARA,
        NodeKind::Enemy { id, .. } if frame.flashes.is_flashing(id, frame.now) => C_FLASH,
        NodeKind::Enemy { kind: EnemyKind::Goomba, .. } => C_GOOMBA,
        NodeKind::Enemy { kind: EnemyKind::Skeleton, .. } => C_SKELETON,
        NodeKind::PowerUp { kind: PowerUpKind::Mushroom, .. } => Color::Red,
        NodeKind::PowerUp { kind: PowerUpKind::Ammo, .. } => Color::Green,
        NodeKind::PowerUp { kind: PowerUpKind::Star, .. } => Color::Yellow,
        NodeKind::PowerUp { kind: PowerUpKind::Medkit, .. } => Color::Reset,
    }
}

fn draw_node<W: Write>(
    out: &mut W,
    node: &SceneNode,
    viewport: &Viewport,
    frame: &Frame,
) -> std::io::Result<()> {
    let sprite = node.kind.sprite();
    let (col, row) = viewport.project(node.pose.position);
    let left = Viewport::sprite_left(col, sprite);
    let right = left + sprite.chars().count() as i32 - 1;
    if !viewport.contains(left, row) || !viewport.contains(right, row) {
        return Ok(());
    }

    out.queue(cursor::MoveTo(left as u16, row as u16))?;
    out.queue(style::SetForegroundColor(node_color(node, frame)))?;
    out.queue(Print(sprite))?;

    match node.kind {
        NodeKind::Enemy { kind, health, .. } => {
            draw_health_bar(out, viewport, col, row - 1, kind, health)?;
        }
        NodeKind::Operative { selected: true, .. } => {
            // Selection ring under the chosen operative
            if viewport.contains(col, row + 1) {
                out.queue(cursor::MoveTo((col - 1).max(0) as u16, (row + 1) as u16))?;
                out.queue(style::SetForegroundColor(Color::Green))?;
                out.queue(Print("◡◡◡"))?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Floating bar above an enemy, scaled to the kind's starting health.
fn draw_health_bar<W: Write>(
    out: &mut W,
    viewport: &Viewport,
    col: i32,
    row: i32,
    kind: EnemyKind,
    health: u32,
) -> std::io::Result<()> {
    let left = col - HEALTH_BAR_WIDTH as i32 / 2;
    if !viewport.contains(left, row) || !viewport.contains(left + HEALTH_BAR_WIDTH as i32 - 1, row)
    {
        return Ok(());
    }
    let max = kind.max_health() as usize;
    let filled = (health as usize * HEALTH_BAR_WIDTH).div_ceil(max).min(HEALTH_BAR_WIDTH);
    let color = match kind {
        EnemyKind::Goomba => C_BAR_GOOMBA,
        EnemyKind::Skeleton => C_BAR_SKELETON,
    };
    out.queue(cursor::MoveTo(left as u16, row as u16))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(format!(
        "{}{}",
        "▬".repeat(filled),
        " ".repeat(HEALTH_BAR_WIDTH - filled)
    )))?;
    Ok(())
}

// ── Status line (last row) ────────────────────────────────────────────────────

fn draw_status_line<W: Write>(out: &mut W, frame: &Frame) -> std::io::Result<()> {
    let character = frame.state.selected_character;
    let row = frame.height.saturating_sub(1);

    out.queue(cursor::MoveTo(1, row))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print("OPERATIVE "))?;
    out.queue(style::SetForegroundColor(match character {
        Character::Mario => C_MARIO,
        Character::Lara => C_LARA,
    }))?;
    out.queue(Print(character.display_name()))?;

    let hint = if frame.state.is_playing {
        "Click enemies to shoot · Click power-ups to collect · Q : Quit"
    } else {
        "1 / 2 : Operative   ENTER : Mission   Q : Quit"
    };
    let hx = frame.width.saturating_sub(hint.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(hx, row))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    out.queue(Print(hint))?;
    Ok(())
}

// ── Briefing overlay ──────────────────────────────────────────────────────────

fn draw_briefing<W: Write>(out: &mut W, frame: &Frame) -> std::io::Result<()> {
    let state = frame.state;
    let failed = state.mission_failed();

    let mut lines: Vec<(String, Color)> = vec![
        ("╔══════════════════════════════╗".into(), Color::Yellow),
        ("║          CROSSOVER           ║".into(), Color::Yellow),
        ("║         COMBAT  ZONE         ║".into(), Color::White),
        ("╚══════════════════════════════╝".into(), Color::Yellow),
        (String::new(), Color::Reset),
        ("SELECT YOUR OPERATIVE".into(), Color::DarkGrey),
    ];
    for (key, character) in [("1", Character::Mario), ("2", Character::Lara)] {
        let marker = if state.selected_character == character { "▶" } else { " " };
        let color = if state.selected_character == character {
            match character {
                Character::Mario => C_MARIO,
                Character::Lara => C_LARA,
            }
        } else {
            Color::DarkGrey
        };
        lines.push((
            format!(
                "{marker} [{key}] {:<10} {:<16}",
                character.display_name(),
                character.tagline()
            ),
            color,
        ));
    }
    lines.push((String::new(), Color::Reset));
    let button = if failed {
        "[ ENTER ]  RESTART MISSION"
    } else {
        "[ ENTER ]  START MISSION"
    };
    lines.push((button.into(), Color::Green));
    if failed {
        lines.push((String::new(), Color::Reset));
        lines.push(("MISSION FAILED".into(), Color::Red));
    }

    let cx = frame.width / 2;
    let start_row = (frame.height / 2).saturating_sub(lines.len() as u16 / 2);
    for (i, (msg, color)) in lines.iter().enumerate() {
        if msg.is_empty() {
            continue;
        }
        let row = start_row + i as u16;
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(msg))?;
    }
    Ok(())
}
