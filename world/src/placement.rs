//! Conversion of a parsed grid into positioned tiles and the player.

use glam::Vec2;
use wave_escape_core::{CellCoord, CellSymbol, LevelError, Rect, TileKind, PLAYER_INSET, PLAYER_SIZE};

use crate::level::Grid;

/// Static tile positioned on the level grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    cell: CellCoord,
    kind: TileKind,
}

impl Tile {
    /// Creates a tile of the provided kind anchored at `cell`.
    #[must_use]
    pub const fn new(cell: CellCoord, kind: TileKind) -> Self {
        Self { cell, kind }
    }

    /// Grid cell occupied by the tile.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Kind of the tile.
    #[must_use]
    pub const fn kind(&self) -> TileKind {
        self.kind
    }

    /// Bounding box of the tile in pixels.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_cell(self.cell)
    }
}

/// The controllable player sprite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Player {
    bounds: Rect,
}

impl Player {
    /// Places the player inside the provided spawn cell, inset from its edges.
    #[must_use]
    pub fn spawn_at(cell: CellCoord) -> Self {
        Self {
            bounds: Rect::new(
                cell.origin() + Vec2::splat(PLAYER_INSET),
                Vec2::splat(PLAYER_SIZE),
            ),
        }
    }

    /// Bounding box of the player in pixels.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Top-left corner of the player's bounding box.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.bounds.origin()
    }

    pub(crate) fn move_to(&mut self, position: Vec2) {
        self.bounds = self.bounds.with_origin(position);
    }
}

/// Entities produced for a single session.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    /// Every tile in row-major order. Spawn and exit cells carry a floor tile.
    pub tiles: Vec<Tile>,
    /// The player anchored at the spawn cell.
    pub player: Player,
    /// Exit tile, if the level defines one.
    pub exit: Option<Tile>,
}

/// Walks the grid and instantiates tiles, the player and the exit.
///
/// When several `@` markers exist the last one in row-major order wins, and
/// the same rule applies to `E`. A grid without `@` cannot start a session.
pub fn instantiate(grid: &Grid) -> Result<Placement, LevelError> {
    let mut tiles = Vec::new();
    let mut player = None;
    let mut exit = None;

    for (cell, symbol) in grid.cells() {
        match symbol {
            CellSymbol::Floor => tiles.push(Tile::new(cell, TileKind::Floor)),
            CellSymbol::Wall => tiles.push(Tile::new(cell, TileKind::Wall)),
            CellSymbol::PlayerStart => {
                tiles.push(Tile::new(cell, TileKind::Floor));
                player = Some(Player::spawn_at(cell));
            }
            CellSymbol::Exit => {
                tiles.push(Tile::new(cell, TileKind::Floor));
                exit = Some(Tile::new(cell, TileKind::Exit));
            }
        }
    }

    let player = player.ok_or(LevelError::NoPlayerSpawn)?;
    Ok(Placement {
        tiles,
        player,
        exit,
    })
}
