#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Wave Escape adapters.
//!
//! The simulation describes every tick as a [`Frame`]: a list of sprites
//! placed on screen rectangles plus text labels. Backends draw frames and
//! feed [`FrameInput`] snapshots back; they never see simulation state.

use anyhow::Result as AnyResult;
use glam::Vec2;
use std::{error::Error, fmt, time::Duration};
use wave_escape_core::{HeldDirections, Rect};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with a different alpha channel.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }
}

/// Keys the simulation reacts to as discrete presses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// `Enter` / `Return`.
    Enter,
    /// `Escape`.
    Escape,
    /// `Space`.
    Space,
    /// Letter `P`.
    P,
    /// Letter `S`.
    S,
    /// Letter `T`.
    T,
    /// Letter `X`.
    X,
    /// Digit `1`.
    Digit1,
    /// Digit `2`.
    Digit2,
    /// Digit `3`.
    Digit3,
    /// Any other key. Still counts as "any key" on the splash screen.
    Other,
}

/// Discrete input observed during a single tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Press {
    /// A key went down.
    Key(Key),
    /// The primary pointer button was pressed at a screen position.
    Pointer(Vec2),
}

/// Input snapshot gathered by adapters before each tick.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Movement directions held down during the tick.
    pub held: HeldDirections,
    /// Discrete presses observed since the previous tick, in arrival order.
    pub presses: Vec<Press>,
    /// Whether the window asked to close.
    pub close_requested: bool,
}

impl FrameInput {
    /// Reports whether anything was pressed during the tick.
    #[must_use]
    pub fn any_press(&self) -> bool {
        !self.presses.is_empty()
    }

    /// Reports whether the provided key was pressed during the tick.
    #[must_use]
    pub fn key_pressed(&self, key: Key) -> bool {
        self.presses.contains(&Press::Key(key))
    }

    /// Iterator over the pointer presses observed during the tick.
    pub fn pointer_presses(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.presses.iter().filter_map(|press| match press {
            Press::Pointer(position) => Some(*position),
            Press::Key(_) => None,
        })
    }
}

/// Visual identity of a drawn rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    /// Walkable ground tile.
    Floor,
    /// Wall tile.
    Wall,
    /// Exit tile.
    Exit,
    /// The player.
    Player,
    /// Translucent hazard band.
    Wave,
    /// Splash and menu background.
    Background,
    /// Result image shown after a win.
    WinBanner,
    /// Result image shown after a loss.
    LoseBanner,
    /// Menu button.
    Button,
    /// Highlighted menu button.
    ButtonSelected,
}

impl SpriteKind {
    /// Every sprite kind in manifest order.
    pub const ALL: [SpriteKind; 10] = [
        Self::Floor,
        Self::Wall,
        Self::Exit,
        Self::Player,
        Self::Wave,
        Self::Background,
        Self::WinBanner,
        Self::LoseBanner,
        Self::Button,
        Self::ButtonSelected,
    ];

    /// Name used for the sprite in asset manifests.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Floor => "Floor",
            Self::Wall => "Wall",
            Self::Exit => "Exit",
            Self::Player => "Player",
            Self::Wave => "Wave",
            Self::Background => "Background",
            Self::WinBanner => "WinBanner",
            Self::LoseBanner => "LoseBanner",
            Self::Button => "Button",
            Self::ButtonSelected => "ButtonSelected",
        }
    }

    /// Parses a manifest name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Flat color drawn when no image is available for the sprite.
    #[must_use]
    pub const fn placeholder_color(self) -> Color {
        match self {
            Self::Floor => Color::from_rgb_u8(96, 160, 72),
            Self::Wall => Color::from_rgb_u8(120, 84, 48),
            Self::Exit => Color::from_rgb_u8(240, 200, 40),
            Self::Player => Color::from_rgb_u8(220, 40, 40),
            Self::Wave => Color::new(0.15, 0.35, 0.9, 0.45),
            Self::Background => Color::from_rgb_u8(180, 210, 230),
            Self::WinBanner => Color::from_rgb_u8(40, 150, 70),
            Self::LoseBanner => Color::from_rgb_u8(150, 40, 40),
            Self::Button => Color::from_rgb_u8(70, 70, 70),
            Self::ButtonSelected => Color::from_rgb_u8(40, 110, 180),
        }
    }
}

/// Sprite placed on a screen-space rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCommand {
    /// What to draw.
    pub sprite: SpriteKind,
    /// Where to draw it, in screen pixels.
    pub rect: Rect,
}

/// Text label placed on screen.
#[derive(Clone, Debug, PartialEq)]
pub struct TextCommand {
    /// Text to draw.
    pub text: String,
    /// Baseline-left anchor in screen pixels.
    pub position: Vec2,
    /// Font size in pixels.
    pub size: f32,
    /// Fill color.
    pub color: Color,
}

/// Everything drawn during a single tick, in painter's order.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Solid color used to clear the screen.
    pub clear_color: Color,
    /// Sprites drawn back to front.
    pub draws: Vec<DrawCommand>,
    /// Labels drawn after every sprite.
    pub texts: Vec<TextCommand>,
}

impl Frame {
    /// Empties the frame so it can be repopulated.
    pub fn clear(&mut self, clear_color: Color) {
        self.clear_color = clear_color;
        self.draws.clear();
        self.texts.clear();
    }

    /// Appends a sprite.
    pub fn sprite(&mut self, sprite: SpriteKind, rect: Rect) {
        self.draws.push(DrawCommand { sprite, rect });
    }

    /// Appends a label.
    pub fn text(&mut self, text: impl Into<String>, position: Vec2, size: f32, color: Color) {
        self.texts.push(TextCommand {
            text: text.into(),
            position,
            size,
            color,
        });
    }

    /// Iterator over the sprites of a given kind.
    pub fn sprites_of(&self, sprite: SpriteKind) -> impl Iterator<Item = &DrawCommand> + '_ {
        self.draws
            .iter()
            .filter(move |command| command.sprite == sprite)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            clear_color: Color::BLACK,
            draws: Vec::new(),
            texts: Vec::new(),
        }
    }
}

/// Decision returned by the simulation after each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickControl {
    /// Keep running.
    Continue,
    /// Close the window and return from [`RenderingBackend::run`].
    Exit,
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Size of the window in pixels.
    pub viewport: Vec2,
    /// Number of simulation ticks per second.
    pub tick_rate: u32,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    ///
    /// Returns an error when `tick_rate` is zero.
    pub fn new<T>(window_title: T, viewport: Vec2, tick_rate: u32) -> Result<Self, RenderingError>
    where
        T: Into<String>,
    {
        if tick_rate == 0 {
            return Err(RenderingError::InvalidTickRate { tick_rate });
        }

        Ok(Self {
            window_title: window_title.into(),
            viewport,
            tick_rate,
        })
    }

    /// Simulated time covered by a single tick.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }
}

/// Rendering backend capable of presenting Wave Escape frames.
pub trait RenderingBackend {
    /// Runs the rendering backend until the simulation asks to exit.
    ///
    /// The provided `tick` closure is invoked at the presentation's fixed
    /// tick rate with the tick duration and the input gathered since the
    /// previous tick, and repopulates the frame that is drawn next. An error
    /// returned by the closure stops the backend and is propagated.
    fn run<F>(self, presentation: Presentation, tick: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Frame) -> AnyResult<TickControl> + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// The tick rate must be positive to produce a finite tick duration.
    InvalidTickRate {
        /// Provided tick rate that failed validation.
        tick_rate: u32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTickRate { tick_rate } => {
                write!(f, "tick_rate must be positive (received {tick_rate})")
            }
        }
    }
}

impl Error for RenderingError {}
