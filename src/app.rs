//! App: terminal init, main loop, spawn timer and key handling.

use crate::game::{BlockKind, GameState};
use crate::grid::Coord;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Target render frame interval (~30 FPS).
const FRAME_MS: u64 = 33;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
}

pub struct App {
    args: Args,
    config: GameConfig,
    theme: Theme,
    /// Canvas size in grid pixels, measured from the terminal at startup.
    canvas: (i32, i32),
    state: GameState,
    screen: Screen,
    paused: bool,
    last_spawn: Instant,
    /// Cells vacated by the latest cleanup, shown as fading ghosts.
    cleanup_cells: Vec<(Coord, BlockKind)>,
    cleanup_effect: Option<Effect>,
    cleanup_effect_process_time: Option<Instant>,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Result<Self> {
        // Placeholder canvas; run() measures the real terminal size.
        let canvas = crate::ui::canvas_size_for_terminal(80, 24);
        let state = GameState::new(theme.clone(), &config, canvas.0, canvas.1);
        let screen = if args.no_menu {
            Screen::Playing
        } else {
            Screen::Menu
        };
        Ok(Self {
            args,
            config,
            theme,
            canvas,
            state,
            screen,
            paused: false,
            last_spawn: Instant::now(),
            cleanup_cells: Vec::new(),
            cleanup_effect: None,
            cleanup_effect_process_time: None,
        })
    }

    fn start_game(&mut self) {
        self.state = GameState::new(
            self.theme.clone(),
            &self.config,
            self.canvas.0,
            self.canvas.1,
        );
        self.screen = Screen::Playing;
        self.paused = false;
        self.last_spawn = Instant::now();
        self.cleanup_cells.clear();
        self.cleanup_effect = None;
        self.cleanup_effect_process_time = None;
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
                size,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        // Size the canvas to the terminal; the grid square is clamped to fit
        // with its border.
        let (term_cols, term_rows) = size()?;
        self.canvas = crate::ui::canvas_size_for_terminal(term_cols, term_rows);
        self.state = GameState::new(
            self.theme.clone(),
            &self.config,
            self.canvas.0,
            self.canvas.1,
        );

        let result = self.run_loop(&mut terminal);

        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    self.paused,
                    self.config.gridlines,
                    f.area(),
                    &self.cleanup_cells,
                    &mut self.cleanup_effect,
                    &mut self.cleanup_effect_process_time,
                    now,
                    self.args.no_animation,
                )
            })?;

            // Cleanup fade finished: drop the ghost cells.
            if self.cleanup_effect.as_ref().is_some_and(Effect::done) {
                self.cleanup_cells.clear();
                self.cleanup_effect = None;
                self.cleanup_effect_process_time = None;
            }

            if event::poll(Duration::from_millis(FRAME_MS))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        let action = key_to_action(key);
                        match self.screen {
                            Screen::Menu => match action {
                                Action::Quit => return Ok(()),
                                Action::Confirm => self.start_game(),
                                _ => {}
                            },
                            Screen::Playing => {
                                if self.handle_playing(action) {
                                    return Ok(());
                                }
                            }
                            Screen::GameOver => match action {
                                Action::Quit => return Ok(()),
                                Action::Restart | Action::Confirm => self.start_game(),
                                _ => {}
                            },
                        }
                    }
                }
            }

            if self.screen == Screen::Playing && !self.paused {
                if self.last_spawn.elapsed() >= Duration::from_millis(self.config.spawn_delay_ms) {
                    self.last_spawn = Instant::now();
                    self.state.spawn_quad();
                }
                if self.state.game_over {
                    self.screen = Screen::GameOver;
                }
            }
        }
    }

    /// Handle a key while playing. Returns true when the app should exit.
    fn handle_playing(&mut self, action: Action) -> bool {
        if self.paused {
            match action {
                Action::Pause => self.paused = false,
                Action::Quit => return true,
                _ => {}
            }
            return false;
        }
        match action {
            Action::Quit => return true,
            Action::Pause => self.paused = true,
            _ => {
                if let Some(direction) = action.slide_direction() {
                    if self.state.slide(direction) {
                        let cleared = self.state.take_cleared();
                        if !cleared.is_empty() && !self.args.no_animation {
                            self.cleanup_cells = cleared;
                            self.cleanup_effect = None;
                            self.cleanup_effect_process_time = None;
                        }
                    }
                }
            }
        }
        false
    }
}
