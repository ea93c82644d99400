mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyCode, KeyModifiers, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
    time::Duration,
};
use webbrowser::Browser;

use snag::config::{Config, ConfigStore, FileConfigStore};
use snag::engine::{Effect, Session};
use snag::history::{AttemptRecord, HistoryDb};
use snag::runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner, StageTimer};
use snag::stage::{StageDescriptor, StageLibrary, StageMode};
use snag::util::fmt_clock;
use snag::TICK_RATE_MS;

use crate::ui::ui;

/// sleek error-hunting tui with staged word puzzles and scored runs
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A sleek error-hunting TUI: each stage shows a short passage with planted mistakes. Find them all before your lives or the clock run out."
)]
pub struct Cli {
    /// stage id to play (see --list)
    #[clap(short = 'g', long)]
    stage: Option<String>,

    /// restrict random stage selection to one passage mode
    #[clap(short = 'm', long, value_enum)]
    mode: Option<CliMode>,

    /// restrict random stage selection to one level
    #[clap(short = 'l', long)]
    level: Option<u32>,

    /// override starting lives (capped at the configured maximum)
    #[clap(long)]
    lives: Option<u32>,

    /// override the stage time limit in seconds
    #[clap(short = 's', long)]
    seconds: Option<f64>,

    /// list the built-in stages and exit
    #[clap(long)]
    list: bool,

    /// show recent attempts and per-stage totals, then exit
    #[clap(long)]
    history: bool,

    /// export the attempt history as csv and exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum CliMode {
    Chat,
    Article,
    Text,
}

impl CliMode {
    fn as_mode(&self) -> StageMode {
        match self {
            CliMode::Chat => StageMode::Chat,
            CliMode::Article => StageMode::Article,
            CliMode::Text => StageMode::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Playing,
    Results,
}

#[derive(Debug)]
pub struct App {
    pub cli: Option<Cli>,
    pub library: StageLibrary,
    pub config: Config,
    pub session: Session,
    pub timer: StageTimer,
    pub state: AppState,
    /// Index of the keyboard-focused candidate row.
    pub focus: usize,
    pub history: Option<HistoryDb>,
    /// Best score for the current stage before this attempt.
    pub best_score: Option<u32>,
    pub last_played: Option<String>,
}

impl App {
    pub fn new(
        cli: Cli,
        library: StageLibrary,
        config: Config,
        stage: StageDescriptor,
    ) -> Result<Self, Box<dyn Error>> {
        let history = HistoryDb::new().ok();
        let best_score = history
            .as_ref()
            .and_then(|db| db.best_score(&stage.stage_id).ok().flatten());
        let last_played = history.as_ref().and_then(|db| db.last_played_human());
        let session = Session::start(stage, config.clone())?;
        let timer = StageTimer::new(session.time_limit_secs());

        Ok(Self {
            cli: Some(cli),
            library,
            config,
            session,
            timer,
            state: AppState::Playing,
            focus: 0,
            history,
            best_score,
            last_played,
        })
    }

    /// Drop the finished session and start a fresh one on `stage`.
    pub fn reset(&mut self, stage: StageDescriptor) -> Result<(), Box<dyn Error>> {
        self.best_score = self
            .history
            .as_ref()
            .and_then(|db| db.best_score(&stage.stage_id).ok().flatten());
        self.last_played = self.history.as_ref().and_then(|db| db.last_played_human());
        self.session = Session::start(stage, self.config.clone())?;
        self.timer = StageTimer::new(self.session.time_limit_secs());
        self.state = AppState::Playing;
        self.focus = 0;
        Ok(())
    }

    fn pick_next_stage(&self) -> Option<StageDescriptor> {
        let cli = self.cli.as_ref();
        let mode = cli.and_then(|c| c.mode.map(|m| m.as_mode()));
        let level = cli.and_then(|c| c.level);
        self.library.pick(mode, level).cloned()
    }

    fn focused_candidate(&self) -> Option<u32> {
        self.session
            .stage()
            .candidates
            .get(self.focus)
            .map(|c| c.id)
    }

    /// Execute the effects a transition returned. All of these are
    /// best-effort; none feed back into the session.
    pub fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Haptic => {
                    // Terminal bell as the wrong-answer cue
                    let mut stdout = io::stdout();
                    let _ = write!(stdout, "\x07");
                    let _ = stdout.flush();
                }
                Effect::ResultReady(result) => {
                    if let Some(db) = &self.history {
                        let _ = db
                            .record_attempt(&AttemptRecord::from_result(self.session.stage(), &result));
                    }
                    self.state = AppState::Results;
                }
            }
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let library = StageLibrary::builtin();

    if cli.list {
        return print_stage_list(&library);
    }
    if cli.history {
        return print_history();
    }
    if let Some(path) = cli.export.clone() {
        return export_history(&path);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut config = FileConfigStore::new().load();
    if let Some(lives) = cli.lives {
        if lives == 0 {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, "--lives must be at least 1")
                .exit();
        }
        config.default_lives = lives.min(config.max_lives);
    }

    let mut stage = match &cli.stage {
        Some(id) => library
            .by_id(id)
            .cloned()
            .ok_or_else(|| format!("unknown stage '{id}'; try --list"))?,
        None => library
            .pick(cli.mode.map(|m| m.as_mode()), cli.level)
            .cloned()
            .ok_or("no stage matches the given filters; try --list")?,
    };
    if let Some(seconds) = cli.seconds {
        if !seconds.is_finite() || seconds <= 0.0 {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, "--seconds must be positive")
                .exit();
        }
        stage.time_limit_secs = Some(seconds);
    }

    let mut app = App::new(cli, library, config, stage)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

#[derive(Debug)]
enum ExitType {
    Restart,
    New,
    Quit,
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        let mut exit_type = ExitType::Quit;
        terminal.draw(|f| ui(app, f))?;

        loop {
            match runner.step() {
                GameEvent::Tick => {
                    if app.state == AppState::Playing
                        && !app.session.has_finished()
                        && app.timer.expired()
                    {
                        let effects = app.session.on_timer_expired();
                        app.run_effects(effects);
                    }

                    // Redraw each tick while the countdown is visible
                    if app.state == AppState::Playing {
                        terminal.draw(|f| ui(app, f))?;
                    }
                }
                GameEvent::Resize => {
                    terminal.draw(|f| ui(app, f))?;
                }
                GameEvent::Mouse(mouse) => {
                    if app.state == AppState::Playing
                        && matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left))
                    {
                        let size = terminal.size()?;
                        let area = Rect::new(0, 0, size.width, size.height);
                        let passage = ui::passage_area(area);

                        let inside = mouse.column >= passage.x
                            && mouse.column < passage.x + passage.width
                            && mouse.row >= passage.y
                            && mouse.row < passage.y + passage.height;
                        if inside {
                            let idx = (mouse.row - passage.y) as usize;
                            let clicked = app.session.stage().candidates.get(idx).map(|c| c.id);
                            let effects = match clicked {
                                Some(id) => {
                                    app.focus = idx;
                                    app.session.select_candidate(id)
                                }
                                // A click on empty playfield is a miss
                                None => app.session.register_wrong_selection(),
                            };
                            app.run_effects(effects);
                            terminal.draw(|f| ui(app, f))?;
                        }
                    }
                }
                GameEvent::Key(key) => {
                    match key.code {
                        KeyCode::Esc => {
                            break;
                        }
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            break;
                        }
                        _ => {}
                    }

                    match app.state {
                        AppState::Playing => match key.code {
                            KeyCode::Up | KeyCode::Char('k') => {
                                if app.focus > 0 {
                                    app.focus -= 1;
                                }
                            }
                            KeyCode::Down | KeyCode::Char('j') => {
                                if app.focus + 1 < app.session.stage().candidates.len() {
                                    app.focus += 1;
                                }
                            }
                            KeyCode::Enter | KeyCode::Char(' ') => {
                                let effects = if app.session.state().show_explanation {
                                    app.session.dismiss_explanation()
                                } else if let Some(id) = app.focused_candidate() {
                                    app.session.select_candidate(id)
                                } else {
                                    app.session.register_wrong_selection()
                                };
                                app.run_effects(effects);
                            }
                            _ => {}
                        },
                        AppState::Results => match key.code {
                            KeyCode::Char('r') => {
                                exit_type = ExitType::Restart;
                                break;
                            }
                            KeyCode::Char('n') => {
                                exit_type = ExitType::New;
                                break;
                            }
                            KeyCode::Char('t') => {
                                if Browser::is_available() {
                                    if let Some(result) = app.session.result() {
                                        let stage_id = &app.session.stage().stage_id;
                                        webbrowser::open(&format!(
                                            "https://twitter.com/intent/tweet?text={}%20points%20on%20{}%20%2F%20snag",
                                            result.final_score, stage_id
                                        ))
                                        .unwrap_or_default();
                                    }
                                }
                            }
                            _ => {}
                        },
                    }

                    terminal.draw(|f| ui(app, f))?;
                }
            }
        }

        match exit_type {
            ExitType::Restart => {
                let stage = app.session.stage().clone();
                app.reset(stage)?;
            }
            ExitType::New => match app.pick_next_stage() {
                Some(stage) => app.reset(stage)?,
                None => break,
            },
            ExitType::Quit => break,
        }
    }

    Ok(())
}

fn print_stage_list(library: &StageLibrary) -> Result<(), Box<dyn Error>> {
    println!(
        "{:<14} {:<8} {:>5} {:>7} {:>6}",
        "stage", "mode", "level", "errors", "time"
    );
    for stage in library.iter() {
        println!(
            "{:<14} {:<8} {:>5} {:>7} {:>6}",
            stage.stage_id,
            stage.mode.to_string(),
            stage.level,
            stage.error_target_count(),
            stage
                .time_limit_secs
                .map(fmt_clock)
                .unwrap_or_else(|| "-".into()),
        );
    }
    Ok(())
}

fn print_history() -> Result<(), Box<dyn Error>> {
    let db = HistoryDb::new()?;
    if db.attempt_count()? == 0 {
        println!("no attempts recorded yet");
        return Ok(());
    }

    if let Some(last) = db.last_played_human() {
        println!("last played {last}");
        println!();
    }

    println!("recent attempts:");
    for rec in db.recent(10)? {
        println!(
            "  {:<14} {:<8} {:>5}  {}",
            rec.stage_id,
            rec.outcome,
            rec.final_score,
            rec.played_at.format("%Y-%m-%d %H:%M"),
        );
    }
    println!();

    println!("per stage:");
    for s in db.stage_summaries()? {
        println!(
            "  {:<14} {:>3} attempts  {:>3} clears  best {:>4}  avg {:>6.1}",
            s.stage_id, s.attempts, s.clears, s.best_score, s.avg_score,
        );
    }
    Ok(())
}

fn export_history(path: &PathBuf) -> Result<(), Box<dyn Error>> {
    let db = HistoryDb::new()?;
    db.export_csv(path)?;
    println!("exported attempt history to {}", path.display());
    Ok(())
}
