#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that resolves player steps against walls.

use glam::Vec2;
use wave_escape_core::{Command, Event, HeldDirections, Rect, STEP};

/// Pure system that reacts to ticks and emits player movement commands.
#[derive(Clone, Copy, Debug)]
pub struct Movement {
    step: f32,
}

impl Movement {
    /// Creates a movement system travelling `step` pixels per tick along a single axis.
    #[must_use]
    pub const fn new(step: f32) -> Self {
        Self { step }
    }

    /// Translates held keys into a displacement for a single tick.
    ///
    /// Opposite keys cancel out. Diagonal input is rescaled so its length
    /// matches an orthogonal step.
    #[must_use]
    pub fn displacement(&self, held: HeldDirections) -> Vec2 {
        let axis = |negative: bool, positive: bool| match (negative, positive) {
            (true, false) => -self.step,
            (false, true) => self.step,
            _ => 0.0,
        };
        let raw = Vec2::new(axis(held.left, held.right), axis(held.up, held.down));

        if raw.x != 0.0 && raw.y != 0.0 {
            let length = raw.length();
            Vec2::new(raw.x / length * self.step, raw.y / length * self.step)
        } else {
            raw
        }
    }

    /// Consumes world events and the current input to emit movement commands.
    ///
    /// A command is only produced on ticks where the player actually moves.
    pub fn handle(
        &self,
        events: &[Event],
        held: HeldDirections,
        player: Rect,
        walls: &[Rect],
        out: &mut Vec<Command>,
    ) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        if held.is_idle() {
            return;
        }

        let to = resolve(player, walls, self.displacement(held));
        if to != player.origin() {
            out.push(Command::MovePlayer { to });
        }
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self::new(STEP)
    }
}

/// Resolves a displacement against walls, one axis at a time.
///
/// Each axis is tested with the player displaced along that axis only. An
/// axis whose displaced box overlaps any wall is discarded while the other
/// axis still applies, which lets the player slide along walls.
#[must_use]
pub fn resolve(player: Rect, walls: &[Rect], displacement: Vec2) -> Vec2 {
    let blocked = |offset: Vec2| {
        let moved = player.translated(offset);
        walls.iter().any(|wall| wall.intersects(&moved))
    };

    let mut position = player.origin();
    if displacement.x != 0.0 && !blocked(Vec2::new(displacement.x, 0.0)) {
        position.x += displacement.x;
    }
    if displacement.y != 0.0 && !blocked(Vec2::new(0.0, displacement.y)) {
        position.y += displacement.y;
    }
    position
}
