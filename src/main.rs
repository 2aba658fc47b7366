mod app;
mod config;
mod data;
mod error;
mod event;
mod keymap;
mod model;
mod ui;
mod views;

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self as ct_event, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::app::App;
use crate::config::Settings;
use crate::data::git::Git;
use crate::data::worker::Worker;
use crate::event::AppEvent;

const LOG_FILE_ENV: &str = "GITDECK_LOG_FILE";

#[derive(Parser)]
#[command(
    name = "gitdeck",
    version,
    about = "Keyboard-driven git status, staging and history in the terminal"
)]
struct Cli {
    /// Directory inside the repository (defaults to current directory)
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Start with the verbose help bar hidden
    #[arg(long)]
    hide_help: bool,

    /// Rebind an action, e.g. --key stage=x (repeatable)
    #[arg(long = "key", value_name = "ACTION=KEY")]
    keys: Vec<String>,

    /// Write diagnostics to this file (also GITDECK_LOG_FILE; level from RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .clone()
        .or_else(|| std::env::var_os(LOG_FILE_ENV).map(PathBuf::from));
    if let Some(path) = log_file {
        init_logging(&path)?;
    }

    let cwd = match cli.cwd {
        Some(p) => p,
        None => std::env::current_dir()?,
    };
    let git = Git::discover(&cwd).context("cannot open repository")?;
    let project = config::load_project_config(git.root());
    let settings = Settings::resolve(&project, &cli.keys, cli.hide_help)?;
    log::info!("starting in {}", git.root().display());

    run_tui(git, settings)
}

/// Send log records to `path`, filtered by `RUST_LOG`.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn run_tui(git: Git, settings: Settings) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, git, settings);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        log::error!("exiting with error: {:#}", e);
    }
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    git: Git,
    settings: Settings,
) -> Result<()> {
    let tick_rate = settings.tick_rate;
    let size = terminal.size()?;
    let mut app = App::new(settings, size.height);

    let (tx, rx) = mpsc::channel::<AppEvent>();
    let worker = Worker::spawn(git.clone(), tx);

    let mut last_tick = Instant::now();

    loop {
        for (ticket, job) in app.take_jobs() {
            worker.submit(ticket, job);
        }

        if app.take_editor_request() {
            let error = commit_with_editor(terminal, &git)?;
            app.after_editor(error);
            continue;
        }

        // Draw only when dirty
        if app.dirty {
            terminal.draw(|f| ui::draw(f, &app))?;
            app.dirty = false;
        }

        let timeout = tick_rate
            .saturating_sub(last_tick.elapsed())
            .min(Duration::from_millis(50));

        if ct_event::poll(timeout)? {
            match ct_event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Event::Resize(_, height) => app.handle_resize(height),
                _ => {}
            }
        }

        while let Ok(evt) = rx.try_recv() {
            match evt {
                AppEvent::Completed { ticket, outcome } => {
                    app.handle_completion(ticket, outcome)
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            app.tick();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Hand the terminal to `git commit` and take it back afterwards. Returns
/// a message when the commit did not happen.
fn commit_with_editor(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    git: &Git,
) -> Result<Option<String>> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    let error = match git.commit_interactive() {
        Ok(status) if status.success() => None,
        Ok(status) => {
            log::warn!("interactive commit exited with {}", status);
            Some(format!("git commit exited with {}", status))
        }
        Err(e) => Some(e.to_string()),
    };

    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    terminal.clear()?;
    Ok(error)
}
