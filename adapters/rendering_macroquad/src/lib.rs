#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Wave Escape.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! The window is paced by the display; simulation ticks run at the fixed rate
//! requested by the [`Presentation`] through a [`TickClock`] accumulator.

mod sprites;

use anyhow::{Context, Result};
use glam::Vec2;
use macroquad::{
    input::{
        get_last_key_pressed, is_key_down, is_key_pressed, is_mouse_button_pressed,
        is_quit_requested, mouse_position, prevent_quit, KeyCode, MouseButton,
    },
    texture::{draw_texture_ex, DrawTextureParams},
};
use std::{
    collections::VecDeque,
    path::PathBuf,
    sync::mpsc,
    time::{Duration, Instant},
};
use tracing::{debug, info};
use wave_escape_core::HeldDirections;
use wave_escape_rendering::{
    Color, Frame, FrameInput, Key, Presentation, Press, RenderingBackend, SpriteKind, TickControl,
};

use self::sprites::SpriteAtlas;

/// Longest frame time fed into the tick accumulator.
const MAX_FRAME_TIME: Duration = Duration::from_millis(250);

const WATCHED_KEYS: [KeyCode; 14] = [
    KeyCode::Enter,
    KeyCode::KpEnter,
    KeyCode::Escape,
    KeyCode::Space,
    KeyCode::P,
    KeyCode::S,
    KeyCode::T,
    KeyCode::X,
    KeyCode::Key1,
    KeyCode::Key2,
    KeyCode::Key3,
    KeyCode::Kp1,
    KeyCode::Kp2,
    KeyCode::Kp3,
];

/// Converts variable frame times into a whole number of fixed ticks.
///
/// Leftover time carries over to the next frame. Frames longer than a quarter
/// of a second are truncated so a stalled window does not trigger a burst of
/// catch-up ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickClock {
    tick: Duration,
    accumulated: Duration,
}

impl TickClock {
    /// Creates a clock producing ticks of the provided length.
    #[must_use]
    pub fn new(tick: Duration) -> Self {
        Self {
            tick: tick.max(Duration::from_micros(1)),
            accumulated: Duration::ZERO,
        }
    }

    /// Length of a single tick.
    #[must_use]
    pub const fn tick(&self) -> Duration {
        self.tick
    }

    /// Records a rendered frame and returns the number of ticks that are due.
    pub fn advance(&mut self, frame_time: Duration) -> u32 {
        self.accumulated += frame_time.min(MAX_FRAME_TIME);
        let mut due = 0;
        while self.accumulated >= self.tick {
            self.accumulated -= self.tick;
            due += 1;
        }
        due
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
    load_sprites: bool,
    manifest_path: PathBuf,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            show_fps: false,
            load_sprites: true,
            manifest_path: PathBuf::from("assets/manifest.toml"),
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }

    /// Configures whether the backend should attempt to load sprite assets.
    #[must_use]
    pub fn with_sprite_loading(mut self, enabled: bool) -> Self {
        self.load_sprites = enabled;
        self
    }

    /// Overrides the location of the sprite manifest.
    #[must_use]
    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = path.into();
        self
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct FrameBreakdown {
    frame: Duration,
    simulation: Duration,
    render: Duration,
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    frame_times: VecDeque<Duration>,
    window_duration: Duration,
    simulation_accum: Duration,
    render_accum: Duration,
}

#[derive(Clone, Copy, Debug)]
struct FpsMetrics {
    per_second: f32,
    trailing_ten_seconds: f32,
    avg_simulation: Duration,
    avg_render: Duration,
}

impl FpsCounter {
    /// Records a rendered frame and returns the per-second and trailing ten-second averages once
    /// one second has elapsed.
    fn record_frame(&mut self, breakdown: FrameBreakdown) -> Option<FpsMetrics> {
        self.elapsed += breakdown.frame;
        self.frames = self.frames.saturating_add(1);
        self.simulation_accum += breakdown.simulation;
        self.render_accum += breakdown.render;

        self.frame_times.push_back(breakdown.frame);
        self.window_duration += breakdown.frame;

        let trailing_window = Duration::from_secs(10);
        while self.window_duration > trailing_window {
            if let Some(removed) = self.frame_times.pop_front() {
                self.window_duration = self.window_duration.saturating_sub(removed);
            } else {
                break;
            }
        }

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let frames = self.frames.max(1);
        let per_second = self.frames as f32 / seconds;
        let window_seconds = self.window_duration.as_secs_f32();
        let trailing_ten_seconds = if window_seconds <= f32::EPSILON {
            per_second
        } else {
            self.frame_times.len() as f32 / window_seconds
        };
        let metrics = FpsMetrics {
            per_second,
            trailing_ten_seconds,
            avg_simulation: self.simulation_accum / frames,
            avg_render: self.render_accum / frames,
        };

        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.simulation_accum = Duration::ZERO;
        self.render_accum = Duration::ZERO;
        Some(metrics)
    }
}

/// Letterboxing of the fixed-size viewport inside the actual window.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ViewportMetrics {
    scale: f32,
    offset: Vec2,
}

impl ViewportMetrics {
    fn new(viewport: Vec2, screen_width: f32, screen_height: f32) -> Self {
        if viewport.x <= f32::EPSILON || viewport.y <= f32::EPSILON {
            return Self {
                scale: 1.0,
                offset: Vec2::ZERO,
            };
        }

        let scale = (screen_width / viewport.x).min(screen_height / viewport.y);
        let scale = if scale > f32::EPSILON { scale } else { 1.0 };
        let offset = Vec2::new(
            (screen_width - viewport.x * scale) * 0.5,
            (screen_height - viewport.y * scale) * 0.5,
        );
        Self { scale, offset }
    }

    fn to_window(&self, point: Vec2) -> Vec2 {
        self.offset + point * self.scale
    }

    fn to_viewport(&self, point: Vec2) -> Vec2 {
        (point - self.offset) / self.scale
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut tick: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Frame) -> Result<TickControl> + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
            load_sprites,
            manifest_path,
        } = self;

        let tick_duration = presentation.tick_duration();
        let Presentation {
            window_title,
            viewport,
            tick_rate,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: viewport.x.round() as i32,
            window_height: viewport.y.round() as i32,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }
        info!(
            width = config.window_width,
            height = config.window_height,
            tick_rate,
            ?swap_interval,
            "window_opening"
        );

        let (result_sender, result_receiver) = mpsc::channel::<Result<()>>();

        macroquad::Window::from_config(config, async move {
            let outcome = run_loop(
                viewport,
                tick_duration,
                show_fps,
                load_sprites.then_some(manifest_path),
                tick,
            )
            .await;
            let _ = result_sender.send(outcome);
        });

        result_receiver.recv().unwrap_or_else(|_| Ok(()))
    }
}

async fn run_loop<F>(
    viewport: Vec2,
    tick_duration: Duration,
    show_fps: bool,
    manifest_path: Option<PathBuf>,
    mut tick: F,
) -> Result<()>
where
    F: FnMut(Duration, FrameInput, &mut Frame) -> Result<TickControl>,
{
    prevent_quit();

    let sprite_atlas = match manifest_path {
        Some(path) => SpriteAtlas::from_manifest_path(&path).with_context(|| {
            format!("failed to initialise sprite atlas from {}", path.display())
        })?,
        None => SpriteAtlas::placeholders_only(),
    };
    debug!(placeholders = ?sprite_atlas.placeholders(), "sprite_placeholders");

    let mut frame = Frame::default();
    let mut clock = TickClock::new(tick_duration);
    let mut fps_counter = FpsCounter::default();
    let mut pending = FrameInput::default();

    loop {
        let dt_seconds = macroquad::time::get_frame_time();
        let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
        let metrics = ViewportMetrics::new(
            viewport,
            macroquad::window::screen_width(),
            macroquad::window::screen_height(),
        );

        collect_presses(&metrics, &mut pending.presses);
        pending.close_requested |= is_quit_requested();

        let simulation_start = Instant::now();
        for _ in 0..clock.advance(frame_dt) {
            let mut input = std::mem::take(&mut pending);
            input.held = held_directions(is_key_down);
            if tick(clock.tick(), input, &mut frame)? == TickControl::Exit {
                info!("render_loop_finished");
                return Ok(());
            }
        }
        let simulation = simulation_start.elapsed();

        let render_start = Instant::now();
        draw_frame(&frame, &metrics, &sprite_atlas);
        let render = render_start.elapsed();

        let fps_metrics = fps_counter.record_frame(FrameBreakdown {
            frame: frame_dt,
            simulation,
            render,
        });
        if show_fps {
            if let Some(FpsMetrics {
                per_second,
                trailing_ten_seconds,
                avg_simulation,
                avg_render,
            }) = fps_metrics
            {
                info!(
                    fps = per_second,
                    fps_10s = trailing_ten_seconds,
                    sim_ms = avg_simulation.as_secs_f64() * 1_000.0,
                    render_ms = avg_render.as_secs_f64() * 1_000.0,
                    "frame_metrics"
                );
            }
        }

        macroquad::window::next_frame().await;
    }
}

fn map_key(code: KeyCode) -> Key {
    match code {
        KeyCode::Enter | KeyCode::KpEnter => Key::Enter,
        KeyCode::Escape => Key::Escape,
        KeyCode::Space => Key::Space,
        KeyCode::P => Key::P,
        KeyCode::S => Key::S,
        KeyCode::T => Key::T,
        KeyCode::X => Key::X,
        KeyCode::Key1 | KeyCode::Kp1 => Key::Digit1,
        KeyCode::Key2 | KeyCode::Kp2 => Key::Digit2,
        KeyCode::Key3 | KeyCode::Kp3 => Key::Digit3,
        _ => Key::Other,
    }
}

fn held_directions(is_down: impl Fn(KeyCode) -> bool) -> HeldDirections {
    HeldDirections {
        up: is_down(KeyCode::W) || is_down(KeyCode::Up),
        down: is_down(KeyCode::S) || is_down(KeyCode::Down),
        left: is_down(KeyCode::A) || is_down(KeyCode::Left),
        right: is_down(KeyCode::D) || is_down(KeyCode::Right),
    }
}

fn collect_presses(metrics: &ViewportMetrics, out: &mut Vec<Press>) {
    for code in WATCHED_KEYS {
        if is_key_pressed(code) {
            out.push(Press::Key(map_key(code)));
        }
    }
    if let Some(code) = get_last_key_pressed() {
        if map_key(code) == Key::Other {
            out.push(Press::Key(Key::Other));
        }
    }
    if is_mouse_button_pressed(MouseButton::Left) {
        let (x, y) = mouse_position();
        out.push(Press::Pointer(metrics.to_viewport(Vec2::new(x, y))));
    }
}

fn sprite_tint(kind: SpriteKind) -> Color {
    match kind {
        SpriteKind::Wave => Color::WHITE.with_alpha(kind.placeholder_color().alpha),
        _ => Color::WHITE,
    }
}

fn draw_frame(frame: &Frame, metrics: &ViewportMetrics, sprite_atlas: &SpriteAtlas) {
    macroquad::window::clear_background(to_macroquad_color(frame.clear_color));

    for command in &frame.draws {
        let position = metrics.to_window(command.rect.origin());
        let size = command.rect.size() * metrics.scale;
        match sprite_atlas.texture(command.sprite) {
            Some(texture) => draw_texture_ex(
                texture,
                position.x,
                position.y,
                to_macroquad_color(sprite_tint(command.sprite)),
                DrawTextureParams {
                    dest_size: Some(macroquad::math::Vec2::new(size.x, size.y)),
                    ..DrawTextureParams::default()
                },
            ),
            None => macroquad::shapes::draw_rectangle(
                position.x,
                position.y,
                size.x,
                size.y,
                to_macroquad_color(command.sprite.placeholder_color()),
            ),
        }
    }

    for text in &frame.texts {
        let position = metrics.to_window(text.position);
        macroquad::text::draw_text(
            &text.text,
            position.x,
            position.y,
            text.size * metrics.scale,
            to_macroquad_color(text.color),
        );
    }
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
