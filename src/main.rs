use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    terminal, ExecutableCommand,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use combat_zone::compute::init_state;
use combat_zone::config::GameConfig;
use combat_zone::display::{self, Frame};
use combat_zone::drivers::Drivers;
use combat_zone::entities::Character;
use combat_zone::scene::{build_scene, click_command, HitFlashes};
use combat_zone::store::{Command, GameStore};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CharacterArg {
    Mario,
    Lara,
}

impl From<CharacterArg> for Character {
    fn from(arg: CharacterArg) -> Self {
        match arg {
            CharacterArg::Mario => Character::Mario,
            CharacterArg::Lara => Character::Lara,
        }
    }
}

#[derive(Parser)]
#[command(name = "combat_zone", about = "Arena shooter in the terminal: click enemies, grab power-ups")]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Operative selected at start
    #[arg(long, value_enum)]
    character: Option<CharacterArg>,

    /// RNG seed for the spawners
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs to this file (the terminal is taken by the game)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(cli: &Cli) -> anyhow::Result<GameConfig> {
    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if let Some(character) = cli.character {
        config.character = character.into();
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if cli.log_file.is_some() {
        config.log_file = cli.log_file.clone();
    }
    Ok(config)
}

fn init_logging(path: &Path, verbose: bool) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ── Frame loop ────────────────────────────────────────────────────────────────

/// Runs until the player quits.
///
/// Input is drained at the top of every frame.  Clicks are resolved against
/// the scene as it was drawn on the previous frame, so the player hits what
/// they see.  The periodic drivers are brought in line with the mission
/// after input has been applied.
fn game_loop<W: Write>(
    out: &mut W,
    store: &GameStore,
    drivers: &mut Drivers,
    rx: &mpsc::Receiver<Event>,
    frame_time: Duration,
) -> std::io::Result<()> {
    let started = Instant::now();
    let mut flashes = HitFlashes::default();
    let mut crosshair: Option<(u16, u16)> = None;
    let mut nodes = Vec::new();

    loop {
        let frame_start = Instant::now();
        let (width, height) = terminal::size()?;
        let viewport = display::viewport_for(width, height);

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(KeyEvent {
                    code,
                    kind: KeyEventKind::Press,
                    modifiers,
                    ..
                }) => {
                    let (playing, failed) = store.read(|s| (s.is_playing, s.mission_failed()));
                    match code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                            return Ok(());
                        }
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(());
                        }
                        KeyCode::Char('1') if !playing => {
                            store.dispatch(Command::SelectCharacter(Character::Mario));
                        }
                        KeyCode::Char('2') if !playing => {
                            store.dispatch(Command::SelectCharacter(Character::Lara));
                        }
                        KeyCode::Enter | KeyCode::Char(' ') if !playing => {
                            store.dispatch(Command::StartOrRestart);
                        }
                        KeyCode::Char('r') | KeyCode::Char('R') if failed => {
                            store.dispatch(Command::Restart);
                        }
                        _ => {}
                    }
                }
                Event::Mouse(mouse) => {
                    crosshair = Some((mouse.column, mouse.row));
                    if let Some(command) = click_command(&nodes, &viewport, &mouse) {
                        if let Command::HitEnemy(id) = command {
                            flashes.trigger(id, Instant::now());
                        }
                        store.dispatch(command);
                    }
                }
                _ => {}
            }
        }

        let state = store.snapshot();
        drivers.sync(&state);

        let now = Instant::now();
        flashes.prune(now);
        nodes = build_scene(&state, started.elapsed().as_secs_f32());

        display::render(
            out,
            &Frame {
                state: &state,
                nodes: &nodes,
                flashes: &flashes,
                now,
                crosshair,
                width,
                height,
            },
        )?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    if let Some(path) = &config.log_file {
        init_logging(path, cli.verbose)?;
    }
    for warning in config.validate() {
        warn!("config: {warning}");
    }
    let config = config.into_valid()?;
    info!(?config, "starting");

    let store = GameStore::new(init_state(config.character));
    let mut drivers = Drivers::new(store.clone(), config.timers.clone(), config.seed);

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(EnableMouseCapture)?;
    out.execute(cursor::Hide)?;

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the frame loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(_) => break,
        }
    });

    let result = game_loop(
        &mut out,
        &store,
        &mut drivers,
        &rx,
        Duration::from_millis(config.frame_ms),
    );
    drivers.stop();

    // Always restore the terminal
    let _ = out.execute(cursor::Show);
    let _ = out.execute(DisableMouseCapture);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    let final_state = store.snapshot();
    info!(score = final_state.score, "exiting");
    result.context("terminal I/O failed")
}
