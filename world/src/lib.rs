#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state management for Wave Escape.
//!
//! A [`World`] owns everything a single attempt at a level needs: the parsed
//! grid, the tiles instantiated from it, the player, the wave and the session
//! clock. It is created fresh for every session and mutated only through
//! [`apply`].

pub mod level;
pub mod placement;

use std::time::Duration;

use glam::Vec2;
use tracing::debug;
use wave_escape_core::{Command, Event, LevelError, Rect, TileKind, WavePhase, WAVE_THICKNESS};

pub use level::{parse_level, parse_level_str, Grid};
pub use placement::{instantiate, Placement, Player, Tile};

/// State of the rising wave hazard.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wave {
    phase: WavePhase,
    fired: bool,
    front: f32,
    thickness: f32,
    level_width: f32,
    level_height: f32,
}

impl Wave {
    fn new(level_width: f32, level_height: f32) -> Self {
        Self {
            phase: WavePhase::Idle,
            fired: false,
            front: 0.0,
            thickness: WAVE_THICKNESS,
            level_width,
            level_height,
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Distance travelled by the leading edge from the bottom of the level.
    #[must_use]
    pub const fn front(&self) -> f32 {
        self.front
    }

    /// Band that catches the player, present only while the wave is active.
    #[must_use]
    pub fn band(&self) -> Option<Rect> {
        match self.phase {
            WavePhase::Idle => None,
            WavePhase::Active => Some(Rect::new(
                Vec2::new(0.0, self.level_height - self.front),
                Vec2::new(self.level_width, self.thickness),
            )),
        }
    }

    fn catches(&self, target: &Rect) -> bool {
        self.band().is_some_and(|band| band.intersects(target))
    }
}

/// Represents the authoritative state of one session.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    tiles: Vec<Tile>,
    walls: Vec<Rect>,
    player: Player,
    exit: Option<Tile>,
    wave: Wave,
    elapsed: Duration,
}

impl World {
    /// Creates a fresh session from a parsed grid.
    pub fn new(grid: Grid) -> Result<Self, LevelError> {
        let Placement {
            tiles,
            player,
            exit,
        } = instantiate(&grid)?;
        let walls = tiles
            .iter()
            .filter(|tile| tile.kind() == TileKind::Wall)
            .map(Tile::bounds)
            .collect();
        let wave = Wave::new(grid.pixel_width(), grid.pixel_height());

        Ok(Self {
            grid,
            tiles,
            walls,
            player,
            exit,
            wave,
            elapsed: Duration::ZERO,
        })
    }

    fn player_reached_exit(&self) -> bool {
        self.exit
            .as_ref()
            .is_some_and(|exit| exit.bounds().intersects(&self.player.bounds()))
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.elapsed = world.elapsed.saturating_add(dt);
            out_events.push(Event::TimeAdvanced {
                dt,
                elapsed: world.elapsed,
            });
        }
        Command::MovePlayer { to } => {
            let from = world.player.position();
            if from == to {
                return;
            }

            world.player.move_to(to);
            out_events.push(Event::PlayerMoved { from, to });

            if world.player_reached_exit() {
                out_events.push(Event::ExitReached);
            }
            if world.wave.catches(&world.player.bounds()) {
                out_events.push(Event::PlayerCaught);
            }
        }
        Command::ActivateWave => {
            if world.wave.fired {
                return;
            }

            world.wave.fired = true;
            world.wave.phase = WavePhase::Active;
            debug!(elapsed_ms = world.elapsed.as_millis() as u64, "wave_activated");
            out_events.push(Event::WaveActivated);
        }
        Command::AdvanceWave { distance } => {
            if world.wave.phase != WavePhase::Active {
                return;
            }

            world.wave.front += distance.max(0.0);
            if world.wave.front > world.wave.level_height {
                world.wave.phase = WavePhase::Idle;
                out_events.push(Event::WaveReceded);
                return;
            }

            out_events.push(Event::WaveAdvanced {
                front: world.wave.front,
            });
            if world.wave.catches(&world.player.bounds()) {
                out_events.push(Event::PlayerCaught);
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use glam::Vec2;
    use wave_escape_core::Rect;

    use super::{Grid, Player, Tile, Wave, World};

    /// Provides read-only access to the session's grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Every tile placed in the session, in row-major order.
    #[must_use]
    pub fn tiles(world: &World) -> &[Tile] {
        &world.tiles
    }

    /// Bounding boxes of every wall tile.
    #[must_use]
    pub fn walls(world: &World) -> &[Rect] {
        &world.walls
    }

    /// Provides read-only access to the player.
    #[must_use]
    pub fn player(world: &World) -> &Player {
        &world.player
    }

    /// Exit tile of the level, if any.
    #[must_use]
    pub fn exit(world: &World) -> Option<&Tile> {
        world.exit.as_ref()
    }

    /// Provides read-only access to the wave hazard.
    #[must_use]
    pub fn wave(world: &World) -> &Wave {
        &world.wave
    }

    /// Simulated time elapsed since the session started.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Size of the level measured in pixels.
    #[must_use]
    pub fn level_size(world: &World) -> Vec2 {
        Vec2::new(world.grid.pixel_width(), world.grid.pixel_height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wave_escape_core::{CellCoord, PLAYER_INSET};

    fn world_from(source: &str) -> World {
        World::new(parse_level_str(source).expect("level parses")).expect("session starts")
    }

    #[test]
    fn session_requires_spawn() {
        let grid = parse_level_str("..E").expect("level parses");
        assert_eq!(World::new(grid).err(), Some(LevelError::NoPlayerSpawn));
    }

    #[test]
    fn tick_accumulates_elapsed_time() {
        let mut world = world_from("@.");
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(20),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(20),
            },
            &mut events,
        );

        assert_eq!(query::elapsed(&world), Duration::from_millis(40));
        assert_eq!(
            events.last(),
            Some(&Event::TimeAdvanced {
                dt: Duration::from_millis(20),
                elapsed: Duration::from_millis(40),
            })
        );
    }

    #[test]
    fn moving_onto_exit_reports_exit_reached() {
        let mut world = world_from("@E");
        let mut events = Vec::new();
        let to = CellCoord::new(1, 0).origin() + Vec2::splat(PLAYER_INSET);
        apply(&mut world, Command::MovePlayer { to }, &mut events);

        assert_eq!(
            events,
            vec![
                Event::PlayerMoved {
                    from: Vec2::splat(PLAYER_INSET),
                    to,
                },
                Event::ExitReached,
            ]
        );
    }

    #[test]
    fn wave_activates_only_once() {
        let mut world = world_from("@.\n..");
        let mut events = Vec::new();
        apply(&mut world, Command::ActivateWave, &mut events);
        apply(&mut world, Command::ActivateWave, &mut events);
        assert_eq!(events, vec![Event::WaveActivated]);
        assert_eq!(query::wave(&world).phase(), WavePhase::Active);
    }

    #[test]
    fn wave_recedes_after_passing_top_edge() {
        let mut world = world_from("@.");
        let mut events = Vec::new();
        apply(&mut world, Command::ActivateWave, &mut events);
        apply(&mut world, Command::AdvanceWave { distance: 60.0 }, &mut events);

        assert_eq!(events.last(), Some(&Event::WaveReceded));
        assert_eq!(query::wave(&world).phase(), WavePhase::Idle);
        assert!(query::wave(&world).band().is_none());

        events.clear();
        apply(&mut world, Command::ActivateWave, &mut events);
        apply(&mut world, Command::AdvanceWave { distance: 1.0 }, &mut events);
        assert!(events.is_empty(), "wave must not re-fire within a session");
    }

    #[test]
    fn wave_catches_player_on_first_overlap() {
        let mut world = world_from("@\n.");
        let mut events = Vec::new();
        apply(&mut world, Command::ActivateWave, &mut events);

        // Player spans y 15..35 inside a 100 px tall level; band top = 100 - front.
        apply(&mut world, Command::AdvanceWave { distance: 65.0 }, &mut events);
        assert!(!events.contains(&Event::PlayerCaught));

        apply(&mut world, Command::AdvanceWave { distance: 1.0 }, &mut events);
        assert_eq!(events.last(), Some(&Event::PlayerCaught));
    }

    #[test]
    fn walking_into_active_band_is_caught() {
        let mut world = world_from("@\n.\n.");
        let mut events = Vec::new();
        apply(&mut world, Command::ActivateWave, &mut events);
        apply(&mut world, Command::AdvanceWave { distance: 50.0 }, &mut events);
        assert!(!events.contains(&Event::PlayerCaught));

        apply(
            &mut world,
            Command::MovePlayer {
                to: Vec2::new(PLAYER_INSET, 90.0),
            },
            &mut events,
        );
        assert_eq!(events.last(), Some(&Event::PlayerCaught));
    }
}
