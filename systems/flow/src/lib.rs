#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Screen state machine that drives Wave Escape from the splash screen to
//! finished sessions.
//!
//! [`GameFlow::tick`] is re-entrant: the adapter calls it once per fixed tick
//! with the input gathered since the previous call, and the active screen
//! either stays, switches to another screen, or asks the process to exit.
//! Every tick repopulates the provided [`Frame`].

mod screens;
mod session;

use std::{error::Error, time::Duration};

use glam::Vec2;
use thiserror::Error;
use tracing::info;
use wave_escape_core::{
    Difficulty, LevelError, ProgressStore, Statistics, DIFFICULTY_KEY, VIEWPORT_HEIGHT,
    VIEWPORT_WIDTH,
};
use wave_escape_rendering::{Frame, FrameInput, Key, TickControl};
use wave_escape_world::{parse_level, World};

pub use screens::{
    menu_buttons, settings_buttons, stats_back_button, Button, MenuAction, SettingsAction,
};
pub use session::{format_elapsed, Outcome};

use screens::clicked;
use session::Session;

/// Identifiers of the bundled levels, in play order.
pub const LEVELS: [&str; 5] = [
    "level1.txt",
    "level2.txt",
    "level3.txt",
    "level4.txt",
    "level5.txt",
];

/// Time during which a result screen ignores input.
pub const RESULT_INPUT_LOCK: Duration = Duration::from_millis(3_000);

/// Time after which a result screen returns to the menu on its own.
pub const RESULT_AUTO_ADVANCE: Duration = Duration::from_millis(5_000);

/// Supplies the text lines of a level by identifier.
pub trait LevelSource {
    /// Failure raised when the level cannot be read.
    type Error: Error + Send + Sync + 'static;

    /// Loads the raw lines of the level named `id`.
    fn load(&mut self, id: &str) -> Result<Vec<String>, Self::Error>;
}

/// Fatal failures raised while driving the screens.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The level source could not provide the level.
    #[error("failed to load level `{id}`")]
    LevelSource {
        /// Identifier of the requested level.
        id: String,
        /// Underlying source failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The level was read but cannot start a session.
    #[error("level `{id}` cannot be played")]
    Level {
        /// Identifier of the rejected level.
        id: String,
        /// Reason the level was rejected.
        #[source]
        source: LevelError,
    },
    /// A settings or statistics store failed.
    #[error("progress store failure")]
    Store(#[source] Box<dyn Error + Send + Sync>),
}

fn store_error<E>(error: E) -> FlowError
where
    E: Error + Send + Sync + 'static,
{
    FlowError::Store(Box::new(error))
}

/// Public identity of the active screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenKind {
    /// Splash screen shown once at startup.
    Start,
    /// Main menu.
    Menu,
    /// Difficulty selection.
    Settings,
    /// Lifetime counters.
    Stats,
    /// A running session.
    Play,
    /// Result screen after reaching the exit.
    Win,
    /// Result screen after the wave caught the player.
    Lose,
}

/// Cursor into the ordered list of levels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progression {
    ids: Vec<String>,
    index: usize,
}

impl Progression {
    /// Creates a progression over `ids` starting at the first level.
    ///
    /// An empty list falls back to [`LEVELS`].
    #[must_use]
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Self::default();
        }
        Self { ids, index: 0 }
    }

    /// Moves the cursor to `index`, wrapping past the end of the list.
    #[must_use]
    pub fn starting_at(mut self, index: usize) -> Self {
        self.index = index % self.ids.len();
        self
    }

    /// Position of the cursor.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Identifier of the level under the cursor.
    #[must_use]
    pub fn current(&self) -> &str {
        &self.ids[self.index]
    }

    /// Moves to the next level, wrapping after the last one.
    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.ids.len();
    }

    /// Returns to the first level.
    pub fn reset(&mut self) {
        self.index = 0;
    }
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            ids: LEVELS.iter().map(|id| (*id).to_owned()).collect(),
            index: 0,
        }
    }
}

#[derive(Debug)]
enum Screen {
    Start,
    Menu,
    Settings { selected: Difficulty },
    Stats { stats: Statistics },
    Play(Box<Session>),
    Result { outcome: Outcome, shown: Duration },
}

impl Screen {
    fn kind(&self) -> ScreenKind {
        match self {
            Self::Start => ScreenKind::Start,
            Self::Menu => ScreenKind::Menu,
            Self::Settings { .. } => ScreenKind::Settings,
            Self::Stats { .. } => ScreenKind::Stats,
            Self::Play(_) => ScreenKind::Play,
            Self::Result {
                outcome: Outcome::Won,
                ..
            } => ScreenKind::Win,
            Self::Result {
                outcome: Outcome::Lost,
                ..
            } => ScreenKind::Lose,
        }
    }
}

enum Step {
    Stay,
    Switch(ScreenKind),
    Finish(Outcome),
    Quit,
}

/// Drives the screens of the game against a settings store, a statistics
/// store and a level source.
#[derive(Debug)]
pub struct GameFlow<S, T, L> {
    settings: S,
    stats: T,
    levels: L,
    progression: Progression,
    screen: Screen,
}

impl<S, T, L> GameFlow<S, T, L>
where
    S: ProgressStore,
    T: ProgressStore,
    L: LevelSource,
{
    /// Creates a flow positioned on the splash screen with the bundled level list.
    #[must_use]
    pub fn new(settings: S, stats: T, levels: L) -> Self {
        Self {
            settings,
            stats,
            levels,
            progression: Progression::default(),
            screen: Screen::Start,
        }
    }

    /// Replaces the level progression.
    #[must_use]
    pub fn with_progression(mut self, progression: Progression) -> Self {
        self.progression = progression;
        self
    }

    /// Identity of the active screen.
    #[must_use]
    pub fn screen(&self) -> ScreenKind {
        self.screen.kind()
    }

    /// Level progression cursor.
    #[must_use]
    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    /// Session state while a level is being played.
    #[must_use]
    pub fn world(&self) -> Option<&World> {
        match &self.screen {
            Screen::Play(session) => Some(session.world()),
            _ => None,
        }
    }

    /// Settings store.
    #[must_use]
    pub fn settings_store(&self) -> &S {
        &self.settings
    }

    /// Statistics store.
    #[must_use]
    pub fn stats_store(&self) -> &T {
        &self.stats
    }

    /// Advances the active screen by one tick and redraws it into `frame`.
    ///
    /// A close request exits from every screen without further work.
    pub fn tick(
        &mut self,
        dt: Duration,
        input: &FrameInput,
        frame: &mut Frame,
    ) -> Result<TickControl, FlowError> {
        if input.close_requested {
            info!(screen = ?self.screen(), "window_close_requested");
            return Ok(TickControl::Exit);
        }

        let step = match &mut self.screen {
            Screen::Start => start_step(input),
            Screen::Menu => menu_step(input),
            Screen::Settings { selected } => {
                match settings_step(input) {
                    Some(SettingsAction::Select(difficulty)) => {
                        write_difficulty(&mut self.settings, difficulty)?;
                        info!(difficulty = difficulty.label(), "difficulty_selected");
                        *selected = difficulty;
                        Step::Stay
                    }
                    Some(SettingsAction::Back) => Step::Switch(ScreenKind::Menu),
                    None => Step::Stay,
                }
            }
            Screen::Stats { .. } => stats_step(input),
            Screen::Play(session) => {
                let difficulty = read_difficulty(&mut self.settings)?;
                match session.tick(dt, input.held, difficulty.activation_delay()) {
                    Some(outcome) => Step::Finish(outcome),
                    None => Step::Stay,
                }
            }
            Screen::Result { shown, .. } => {
                *shown = shown.saturating_add(dt);
                if *shown >= RESULT_AUTO_ADVANCE
                    || (*shown >= RESULT_INPUT_LOCK && input.any_press())
                {
                    Step::Switch(ScreenKind::Menu)
                } else {
                    Step::Stay
                }
            }
        };

        match step {
            Step::Stay => {}
            Step::Switch(target) => self.switch(target)?,
            Step::Finish(outcome) => self.finish(outcome)?,
            Step::Quit => {
                info!("exit_requested");
                return Ok(TickControl::Exit);
            }
        }

        self.draw(frame);
        Ok(TickControl::Continue)
    }

    fn switch(&mut self, target: ScreenKind) -> Result<(), FlowError> {
        let from = self.screen.kind();
        self.screen = match target {
            ScreenKind::Start => Screen::Start,
            ScreenKind::Menu => Screen::Menu,
            ScreenKind::Settings => Screen::Settings {
                selected: read_difficulty(&mut self.settings)?,
            },
            ScreenKind::Stats => Screen::Stats {
                stats: Statistics::from_values(&self.stats.read().map_err(store_error)?),
            },
            ScreenKind::Play => Screen::Play(Box::new(self.start_session()?)),
            ScreenKind::Win => Screen::Result {
                outcome: Outcome::Won,
                shown: Duration::ZERO,
            },
            ScreenKind::Lose => Screen::Result {
                outcome: Outcome::Lost,
                shown: Duration::ZERO,
            },
        };
        info!(?from, to = ?target, "screen_changed");
        Ok(())
    }

    fn start_session(&mut self) -> Result<Session, FlowError> {
        let id = self.progression.current().to_owned();
        let lines = self
            .levels
            .load(&id)
            .map_err(|source| FlowError::LevelSource {
                id: id.clone(),
                source: Box::new(source),
            })?;
        let grid = parse_level(lines).map_err(|source| FlowError::Level {
            id: id.clone(),
            source,
        })?;
        info!(
            level = %id,
            columns = grid.columns(),
            rows = grid.rows(),
            "level_loaded"
        );
        Session::new(id.clone(), grid, Vec2::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT))
            .map_err(|source| FlowError::Level { id, source })
    }

    fn finish(&mut self, outcome: Outcome) -> Result<(), FlowError> {
        let (level, elapsed) = match &self.screen {
            Screen::Play(session) => (session.level_id().to_owned(), session.elapsed()),
            _ => (self.progression.current().to_owned(), Duration::ZERO),
        };

        let mut stats = Statistics::from_values(&self.stats.read().map_err(store_error)?);
        match outcome {
            Outcome::Won => {
                stats.record_win(elapsed);
                self.progression.advance();
            }
            Outcome::Lost => {
                stats.record_loss(elapsed);
                self.progression.reset();
            }
        }
        self.stats
            .write(&stats.to_values())
            .map_err(store_error)?;

        info!(
            ?outcome,
            level = %level,
            elapsed_ms = elapsed.as_millis() as u64,
            next_level = self.progression.index(),
            wins = stats.wins,
            losses = stats.losses,
            levels_completed = stats.levels_completed,
            "session_finished"
        );

        self.switch(match outcome {
            Outcome::Won => ScreenKind::Win,
            Outcome::Lost => ScreenKind::Lose,
        })
    }

    fn draw(&self, frame: &mut Frame) {
        match &self.screen {
            Screen::Start => screens::draw_start(frame),
            Screen::Menu => screens::draw_menu(frame),
            Screen::Settings { selected } => screens::draw_settings(frame, *selected),
            Screen::Stats { stats } => screens::draw_stats(frame, stats),
            Screen::Play(session) => session.draw(frame),
            Screen::Result { outcome, shown } => {
                screens::draw_result(frame, *outcome, *shown >= RESULT_INPUT_LOCK)
            }
        }
    }
}

fn start_step(input: &FrameInput) -> Step {
    if input.any_press() {
        Step::Switch(ScreenKind::Menu)
    } else {
        Step::Stay
    }
}

fn menu_step(input: &FrameInput) -> Step {
    let action = clicked(&menu_buttons(), input).or_else(|| {
        if input.key_pressed(Key::Enter) || input.key_pressed(Key::P) {
            Some(MenuAction::Play)
        } else if input.key_pressed(Key::S) {
            Some(MenuAction::Settings)
        } else if input.key_pressed(Key::T) {
            Some(MenuAction::Stats)
        } else if input.key_pressed(Key::X) || input.key_pressed(Key::Escape) {
            Some(MenuAction::Exit)
        } else {
            None
        }
    });

    match action {
        Some(MenuAction::Play) => Step::Switch(ScreenKind::Play),
        Some(MenuAction::Settings) => Step::Switch(ScreenKind::Settings),
        Some(MenuAction::Stats) => Step::Switch(ScreenKind::Stats),
        Some(MenuAction::Exit) => Step::Quit,
        None => Step::Stay,
    }
}

fn settings_step(input: &FrameInput) -> Option<SettingsAction> {
    let [easy, medium, hard] = Difficulty::SELECTABLE;
    clicked(&settings_buttons(), input).or_else(|| {
        if input.key_pressed(Key::Digit1) {
            Some(SettingsAction::Select(easy))
        } else if input.key_pressed(Key::Digit2) {
            Some(SettingsAction::Select(medium))
        } else if input.key_pressed(Key::Digit3) {
            Some(SettingsAction::Select(hard))
        } else if input.key_pressed(Key::Escape) {
            Some(SettingsAction::Back)
        } else {
            None
        }
    })
}

fn stats_step(input: &FrameInput) -> Step {
    let back = clicked(&[stats_back_button()], input).is_some()
        || input.key_pressed(Key::Escape)
        || input.key_pressed(Key::Enter);
    if back {
        Step::Switch(ScreenKind::Menu)
    } else {
        Step::Stay
    }
}

fn read_difficulty<S: ProgressStore>(store: &mut S) -> Result<Difficulty, FlowError> {
    let values = store.read().map_err(store_error)?;
    Ok(Difficulty::from_setting(
        values.get(DIFFICULTY_KEY).copied().unwrap_or(0),
    ))
}

fn write_difficulty<S: ProgressStore>(
    store: &mut S,
    difficulty: Difficulty,
) -> Result<(), FlowError> {
    let mut values = store.read().map_err(store_error)?;
    let _ = values.insert(DIFFICULTY_KEY.to_owned(), difficulty.setting());
    store.write(&values).map_err(store_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progression_wraps_after_last_level() {
        let mut progression = Progression::default().starting_at(4);
        assert_eq!(progression.current(), "level5.txt");

        progression.advance();

        assert_eq!(progression.index(), 0);
        assert_eq!(progression.current(), "level1.txt");
    }

    #[test]
    fn progression_reset_returns_to_first_level() {
        let mut progression = Progression::new(["a", "b", "c"]).starting_at(2);
        progression.reset();
        assert_eq!(progression.current(), "a");
    }

    #[test]
    fn empty_progression_uses_bundled_levels() {
        let mut progression = Progression::new(Vec::<String>::new());
        assert_eq!(progression.current(), LEVELS[0]);
        for _ in 0..LEVELS.len() {
            progression.advance();
        }
        assert_eq!(progression.index(), 0);
    }
}
