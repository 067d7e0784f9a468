#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Wave Escape game.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Persisted progress is reached exclusively
//! through the [`ProgressStore`] trait so the simulation never touches disk.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Title shown by adapters when the experience boots.
pub const WINDOW_TITLE: &str = "Wave Escape";

/// Side length of a single square tile measured in pixels.
pub const TILE_SIZE: f32 = 50.0;

/// Distance between a tile's edge and the player sprite anchored inside it.
pub const PLAYER_INSET: f32 = 15.0;

/// Side length of the square player bounding box.
pub const PLAYER_SIZE: f32 = 20.0;

/// Distance the player travels along a single pressed axis per tick.
pub const STEP: f32 = 10.0;

/// Width of the visible viewport in pixels.
pub const VIEWPORT_WIDTH: f32 = 400.0;

/// Height of the visible viewport in pixels.
pub const VIEWPORT_HEIGHT: f32 = 300.0;

/// Simulation rate used when none is configured.
pub const DEFAULT_TICK_RATE: u32 = 50;

/// Distance the wave front advances per simulation tick.
pub const WAVE_SPEED: f32 = 2.0;

/// Height of the hazard band trailing behind the wave front.
pub const WAVE_THICKNESS: f32 = 40.0;

/// Persisted settings key holding the selected difficulty.
pub const DIFFICULTY_KEY: &str = "difficulty";

/// Persisted statistics key counting completed levels.
pub const LEVELS_COMPLETED_KEY: &str = "levels_completed";

/// Persisted statistics key accumulating play time in whole seconds.
pub const TOTAL_TIME_SECONDS_KEY: &str = "total_time_seconds";

/// Persisted statistics key counting won sessions.
pub const WINS_KEY: &str = "wins";

/// Persisted statistics key counting lost sessions.
pub const LOSSES_KEY: &str = "losses";

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the session clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Relocates the player so its bounding box starts at `to`.
    MovePlayer {
        /// Top-left corner of the player's bounding box after the move.
        to: Vec2,
    },
    /// Requests that the wave start rising.
    ActivateWave,
    /// Requests that an active wave advance its leading edge.
    AdvanceWave {
        /// Distance travelled by the wave front in pixels.
        distance: f32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the session clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
        /// Total simulated time since the session started.
        elapsed: Duration,
    },
    /// Confirms that the player moved between two positions.
    PlayerMoved {
        /// Top-left corner of the player box before the move.
        from: Vec2,
        /// Top-left corner of the player box after the move.
        to: Vec2,
    },
    /// Announces that the player box overlaps the exit tile.
    ExitReached,
    /// Announces that the wave started rising.
    WaveActivated,
    /// Reports the new position of the wave front.
    WaveAdvanced {
        /// Distance travelled by the wave front from the bottom edge.
        front: f32,
    },
    /// Announces that the wave passed the far edge and stopped.
    WaveReceded,
    /// Announces that the wave band overlaps the player box.
    PlayerCaught,
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Top-left corner of the cell expressed in pixels.
    #[must_use]
    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.column as f32 * TILE_SIZE, self.row as f32 * TILE_SIZE)
    }
}

/// Symbol stored in a single cell of a level grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellSymbol {
    /// Walkable ground (`.`).
    Floor,
    /// Impassable obstacle (`#`).
    Wall,
    /// Goal tile that ends the session with a win (`E`).
    Exit,
    /// Starting position of the player (`@`).
    PlayerStart,
}

impl CellSymbol {
    /// Parses a level character. Unknown characters are treated as floor.
    #[must_use]
    pub const fn from_char(symbol: char) -> Self {
        match symbol {
            '#' => Self::Wall,
            'E' => Self::Exit,
            '@' => Self::PlayerStart,
            _ => Self::Floor,
        }
    }
}

/// Kinds of static tiles placed into a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Visual-only ground tile.
    Floor,
    /// Obstacle that blocks player movement.
    Wall,
    /// Goal tile tested for overlap with the player.
    Exit,
}

impl TileKind {
    /// Reports whether the tile blocks movement.
    #[must_use]
    pub const fn is_solid(self) -> bool {
        matches!(self, Self::Wall)
    }
}

/// Axis-aligned rectangle expressed in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    origin: Vec2,
    size: Vec2,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// Rectangle covering the tile at the provided cell.
    #[must_use]
    pub fn from_cell(cell: CellCoord) -> Self {
        Self::new(cell.origin(), Vec2::splat(TILE_SIZE))
    }

    /// Top-left corner of the rectangle.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Width and height of the rectangle.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// Bottom-right corner of the rectangle.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.origin + self.size
    }

    /// Centre point of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    /// Returns a copy of the rectangle moved to a new origin.
    #[must_use]
    pub const fn with_origin(self, origin: Vec2) -> Self {
        Self::new(origin, self.size)
    }

    /// Returns a copy of the rectangle displaced by `offset`.
    #[must_use]
    pub fn translated(self, offset: Vec2) -> Self {
        Self::new(self.origin + offset, self.size)
    }

    /// Reports whether two rectangles share interior area.
    ///
    /// Rectangles that merely touch along an edge do not intersect.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        let max = self.max();
        let other_max = other.max();
        self.origin.x < other_max.x
            && other.origin.x < max.x
            && self.origin.y < other_max.y
            && other.origin.y < max.y
    }

    /// Reports whether the point lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.max();
        point.x >= self.origin.x && point.x < max.x && point.y >= self.origin.y && point.y < max.y
    }
}

/// Movement keys held during a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HeldDirections {
    /// Movement toward decreasing y.
    pub up: bool,
    /// Movement toward increasing y.
    pub down: bool,
    /// Movement toward decreasing x.
    pub left: bool,
    /// Movement toward increasing x.
    pub right: bool,
}

impl HeldDirections {
    /// Reports whether no movement key is held.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        !(self.up || self.down || self.left || self.right)
    }
}

/// Lifecycle of the rising wave hazard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WavePhase {
    /// The wave is not moving and cannot catch the player.
    #[default]
    Idle,
    /// The wave is rising and tested against the player every tick.
    Active,
}

/// Difficulty selected in the settings screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    /// No difficulty was chosen yet.
    #[default]
    Unset,
    /// Longest delay before the wave starts.
    Easy,
    /// Intermediate delay before the wave starts.
    Medium,
    /// Shortest delay before the wave starts.
    Hard,
}

impl Difficulty {
    /// Difficulties offered by the settings screen, in display order.
    pub const SELECTABLE: [Difficulty; 3] = [Self::Easy, Self::Medium, Self::Hard];

    /// Decodes the persisted integer representation. Out-of-range values are unset.
    #[must_use]
    pub const fn from_setting(value: u64) -> Self {
        match value {
            1 => Self::Easy,
            2 => Self::Medium,
            3 => Self::Hard,
            _ => Self::Unset,
        }
    }

    /// Integer persisted under [`DIFFICULTY_KEY`].
    #[must_use]
    pub const fn setting(self) -> u64 {
        match self {
            Self::Unset => 0,
            Self::Easy => 1,
            Self::Medium => 2,
            Self::Hard => 3,
        }
    }

    /// Session time that must elapse before the wave starts rising.
    ///
    /// An unset difficulty plays like [`Difficulty::Easy`].
    #[must_use]
    pub const fn activation_delay(self) -> Duration {
        match self {
            Self::Unset | Self::Easy => Duration::from_millis(16_000),
            Self::Medium => Duration::from_millis(12_000),
            Self::Hard => Duration::from_millis(8_000),
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unset => "Unset",
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

/// Persisted key to integer mapping.
pub type PersistedValues = BTreeMap<String, u64>;

/// Abstract key to integer persistence used for settings and statistics.
pub trait ProgressStore {
    /// Failure raised when the backing storage cannot be read or written.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reads every persisted value, materialising defaults when the store is absent.
    fn read(&mut self) -> Result<PersistedValues, Self::Error>;

    /// Replaces the persisted values.
    fn write(&mut self, values: &PersistedValues) -> Result<(), Self::Error>;
}

/// Lifetime counters describing the player's progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of levels finished by reaching the exit.
    pub levels_completed: u64,
    /// Accumulated session time; each session is rounded to the nearest second.
    pub total_time_seconds: u64,
    /// Number of won sessions.
    pub wins: u64,
    /// Number of lost sessions.
    pub losses: u64,
}

impl Statistics {
    /// Keys persisted by the statistics store.
    pub const KEYS: [&'static str; 4] = [
        LEVELS_COMPLETED_KEY,
        TOTAL_TIME_SECONDS_KEY,
        WINS_KEY,
        LOSSES_KEY,
    ];

    /// Extracts the counters from persisted values. Missing keys count as zero.
    #[must_use]
    pub fn from_values(values: &PersistedValues) -> Self {
        let read = |key: &str| values.get(key).copied().unwrap_or(0);
        Self {
            levels_completed: read(LEVELS_COMPLETED_KEY),
            total_time_seconds: read(TOTAL_TIME_SECONDS_KEY),
            wins: read(WINS_KEY),
            losses: read(LOSSES_KEY),
        }
    }

    /// Encodes the counters as persisted values.
    #[must_use]
    pub fn to_values(&self) -> PersistedValues {
        [
            (LEVELS_COMPLETED_KEY, self.levels_completed),
            (TOTAL_TIME_SECONDS_KEY, self.total_time_seconds),
            (WINS_KEY, self.wins),
            (LOSSES_KEY, self.losses),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
    }

    /// Records a won session that lasted `elapsed`.
    pub fn record_win(&mut self, elapsed: Duration) {
        self.wins = self.wins.saturating_add(1);
        self.levels_completed = self.levels_completed.saturating_add(1);
        self.record_time(elapsed);
    }

    /// Records a lost session that lasted `elapsed`.
    pub fn record_loss(&mut self, elapsed: Duration) {
        self.losses = self.losses.saturating_add(1);
        self.record_time(elapsed);
    }

    fn record_time(&mut self, elapsed: Duration) {
        let rounded = elapsed.saturating_add(Duration::from_millis(500)).as_secs();
        self.total_time_seconds = self.total_time_seconds.saturating_add(rounded);
    }
}

/// Reasons a level cannot start.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    /// The level source contained no lines.
    #[error("level source is empty")]
    Malformed,
    /// The level grid contains no `@` player spawn marker.
    #[error("level has no player spawn marker `@`")]
    NoPlayerSpawn,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unknown_symbols_parse_as_floor() {
        assert_eq!(CellSymbol::from_char('x'), CellSymbol::Floor);
        assert_eq!(CellSymbol::from_char(' '), CellSymbol::Floor);
        assert_eq!(CellSymbol::from_char('#'), CellSymbol::Wall);
        assert_eq!(CellSymbol::from_char('E'), CellSymbol::Exit);
        assert_eq!(CellSymbol::from_char('@'), CellSymbol::PlayerStart);
    }

    #[test]
    fn touching_rectangles_do_not_intersect() {
        let left = Rect::new(Vec2::ZERO, Vec2::splat(50.0));
        let right = Rect::new(Vec2::new(50.0, 0.0), Vec2::splat(50.0));
        assert!(!left.intersects(&right));
        assert!(left.intersects(&right.translated(Vec2::new(-0.5, 0.0))));
    }

    #[test]
    fn difficulty_maps_to_activation_delays() {
        assert_eq!(
            Difficulty::from_setting(1).activation_delay(),
            Duration::from_millis(16_000)
        );
        assert_eq!(
            Difficulty::from_setting(2).activation_delay(),
            Duration::from_millis(12_000)
        );
        assert_eq!(
            Difficulty::from_setting(3).activation_delay(),
            Duration::from_millis(8_000)
        );
        assert_eq!(Difficulty::from_setting(0), Difficulty::Unset);
        assert_eq!(Difficulty::from_setting(9), Difficulty::Unset);
    }

    #[test]
    fn statistics_default_missing_keys_to_zero() {
        let mut values = PersistedValues::new();
        let _ = values.insert(WINS_KEY.to_owned(), 3);
        let stats = Statistics::from_values(&values);
        assert_eq!(stats.wins, 3);
        assert_eq!(stats.losses, 0);
        assert_eq!(stats.levels_completed, 0);
    }

    #[test]
    fn win_increments_completed_levels_and_time() {
        let mut stats = Statistics {
            levels_completed: 4,
            ..Statistics::default()
        };
        stats.record_win(Duration::from_millis(12_900));
        assert_eq!(stats.levels_completed, 5);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.total_time_seconds, 13);
    }

    #[test]
    fn session_time_rounds_to_nearest_second() {
        let mut stats = Statistics::default();
        for _ in 0..3 {
            stats.record_loss(Duration::from_millis(600));
        }
        assert_eq!(stats.total_time_seconds, 3);

        stats.record_loss(Duration::from_millis(12_400));
        assert_eq!(stats.total_time_seconds, 15);
        assert_eq!(stats.losses, 4);
    }

    proptest! {
        #[test]
        fn statistics_survive_value_encoding(
            levels_completed in 0u64..1_000_000,
            total_time_seconds in 0u64..1_000_000,
            wins in 0u64..1_000_000,
            losses in 0u64..1_000_000,
        ) {
            let stats = Statistics { levels_completed, total_time_seconds, wins, losses };
            prop_assert_eq!(Statistics::from_values(&stats.to_values()), stats);
        }

        #[test]
        fn intersection_is_symmetric(
            ax in -200.0f32..200.0, ay in -200.0f32..200.0,
            bx in -200.0f32..200.0, by in -200.0f32..200.0,
        ) {
            let a = Rect::new(Vec2::new(ax, ay), Vec2::splat(PLAYER_SIZE));
            let b = Rect::new(Vec2::new(bx, by), Vec2::splat(TILE_SIZE));
            prop_assert_eq!(a.intersects(&b), b.intersects(&a));
        }
    }
}
