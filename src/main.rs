mod assets;
mod catalog;
mod config;
mod game;
mod progress;
mod ui;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, MouseButton, MouseEventKind};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::io;
use std::time::{Duration, Instant};

use assets::Sprite;
use catalog::{door_code, load_catalog};
use config::GameConfig;
use game::{build_objects, Flow, Input, Point, Screen, Session};
use progress::ProgressStore;
use ui::{draw_ui, TerminalGuard, Viewport};

/// stderr belongs to the terminal UI, so logs go to a file instead.
const LOG_FILE: &str = "escape.log";

const FALLBACK_BACKDROP: [u8; 3] = [30, 34, 40];

fn init_logging() {
    let Ok(file) = std::fs::File::create(LOG_FILE) else {
        return;
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let config = GameConfig::load();

    let questions = load_catalog(&config.files.catalog, &config.files.pictures)
        .context("failed to load the question catalog")?;

    if questions.is_empty() {
        log::warn!("{:?} has no questions, the door is open", config.files.catalog);
    }
    log::info!(
        "loaded {} questions, door code has {} letters",
        questions.len(),
        door_code(&questions).chars().count()
    );

    let (width, height) = (config.window.width, config.window.height);
    let backdrop = Sprite::load_stretched(&config.files.background, width as u32, height as u32)
        .unwrap_or_else(|| Sprite::solid(width as u32, height as u32, FALLBACK_BACKDROP));
    let store = ProgressStore::new(config.files.save.clone());
    let mut session = Session::new(build_objects(questions), config.rules.clone(), store);

    let guard = TerminalGuard::enter()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut session, &backdrop, &config);

    drop(terminal);
    drop(guard);
    result?;

    log::info!(
        "leaving with {}/{} solved, {} mistakes",
        session.solved_ids().len(),
        session.objects().len(),
        session.mistakes()
    );
    match session.screen() {
        Screen::Won => println!("\nYou escaped the classroom!\n"),
        Screen::Lost => println!("\nGame over. Press R next time to try again.\n"),
        _ => {}
    }

    Ok(())
}

/// Frame loop: draw, then feed every pending event to the session until the
/// frame's time slice is used up.
fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut Session,
    backdrop: &Sprite,
    config: &GameConfig,
) -> Result<()> {
    let frame_time = Duration::from_secs(1) / config.window.fps;
    let (width, height) = (config.window.width, config.window.height);
    let mut viewport = Viewport::new(Rect::default(), width, height);
    let mut pointer: Option<Point> = None;

    loop {
        let now = Instant::now();
        terminal.draw(|f| {
            viewport = Viewport::new(f.area(), width, height);
            draw_ui(f, &viewport, session, backdrop, pointer, now);
        })?;

        let deadline = now + frame_time;
        while let Some(timeout) = time_left(deadline, Instant::now()) {
            if !event::poll(timeout)? {
                break;
            }
            let input = match event::read()? {
                Event::Key(key) => Some(Input::Key(key)),
                Event::Mouse(mouse) => {
                    pointer = viewport.to_logical(mouse.column, mouse.row);
                    match mouse.kind {
                        MouseEventKind::Down(MouseButton::Left) => pointer.map(Input::Click),
                        _ => None,
                    }
                }
                _ => None,
            };
            if let Some(input) = input {
                if session.handle(input, Instant::now()) == Flow::Quit {
                    return Ok(());
                }
            }
        }
    }
}

/// Remaining time in the current frame, `None` once it is used up so a
/// steady stream of events cannot hold back the next draw.
fn time_left(deadline: Instant, now: Instant) -> Option<Duration> {
    deadline.checked_duration_since(now).filter(|d| !d.is_zero())
}
