use std::fs::File;
use std::time::{Duration, Instant};

use crossterm::terminal;
use log::LevelFilter;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use pocketbeat::audio::AudioEngine;
use pocketbeat::config::{self, Config};
use pocketbeat::middle::Middle;
use pocketbeat::pipeline::{Pattern, PatternStore};
use pocketbeat::shared::InputEvent;
use pocketbeat::tui;

fn main() {
    let verbose = std::env::args().skip(1).any(|a| a == "--verbose" || a == "-v");
    if let Err(e) = run(verbose) {
        log::error!("fatal: {e:#}");
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

// the terminal belongs to the TUI, so logs go to a file. Installed at the most
// verbose level we'd ever want; the real cutoff is set once config is read.
fn init_logging() {
    use simplelog::{Config as LogConfig, WriteLogger};

    let log_path = config::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("pocketbeat.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path).or_else(|_| File::create("/tmp/pocketbeat.log")) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("logging disabled: {e}");
            return;
        }
    };
    if let Err(e) = WriteLogger::init(LevelFilter::Debug, LogConfig::default(), log_file) {
        eprintln!("logging disabled: {e}");
    }
}

fn run(verbose: bool) -> anyhow::Result<()> {
    init_logging();
    let config = Config::load();
    let level = if verbose { LevelFilter::Debug } else { config.log_level() };
    log::set_max_level(level);
    log::info!("pocketbeat starting (log level: {:?})", level);

    let store = PatternStore::new(Pattern::default_kit(), config.tempo());
    // cold until the first key press
    let engine = AudioEngine::new(config.master_gain());
    let mut middle = Middle::new(store, engine, config.scheduler());

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(16); // ~60fps
    let blink_start = Instant::now();

    loop {
        let blink_on = (blink_start.elapsed().as_millis() / 250) % 2 == 0;
        let ds = middle.display_state().clone();
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds, blink_on);
        })?;

        for event in tui::input::poll_input(tick_rate)? {
            let quit = event == InputEvent::Quit;
            middle.handle_input(event);
            if quit {
                term.clear()?;
                log::info!("pocketbeat quitting");
                return Ok(());
            }
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
