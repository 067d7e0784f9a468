#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scrolling camera that keeps the player centred without leaving the level.

use glam::Vec2;
use wave_escape_core::{Rect, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};

/// Viewport into the level measured in pixels.
///
/// The offset is added to world coordinates to obtain screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    viewport: Vec2,
    offset: Vec2,
}

impl Camera {
    /// Creates a camera with the provided viewport size and a zero offset.
    #[must_use]
    pub const fn new(viewport: Vec2) -> Self {
        Self {
            viewport,
            offset: Vec2::ZERO,
        }
    }

    /// Offset applied to world coordinates.
    #[must_use]
    pub const fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Recentres the camera on the player's top-left corner and clamps it to
    /// the level bounds.
    ///
    /// On an axis where the level is smaller than the viewport the offset is
    /// pinned to zero so the level hugs the top-left corner of the screen.
    pub fn update(&mut self, player: Rect, level_size: Vec2) -> Vec2 {
        let anchor = player.origin();
        self.offset = Vec2::new(
            clamp_axis(-anchor.x + self.viewport.x / 2.0, level_size.x, self.viewport.x),
            clamp_axis(-anchor.y + self.viewport.y / 2.0, level_size.y, self.viewport.y),
        );
        self.offset
    }

    /// Maps a world-space rectangle into screen space.
    #[must_use]
    pub fn to_screen(&self, rect: Rect) -> Rect {
        rect.translated(self.offset)
    }

    /// Reports whether a world-space rectangle is at least partly visible.
    #[must_use]
    pub fn is_visible(&self, rect: Rect) -> bool {
        Rect::new(Vec2::ZERO, self.viewport).intersects(&self.to_screen(rect))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec2::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT))
    }
}

fn clamp_axis(offset: f32, level: f32, viewport: f32) -> f32 {
    let lower = -(level - viewport);
    if lower > 0.0 {
        return 0.0;
    }
    offset.clamp(lower, 0.0)
}
