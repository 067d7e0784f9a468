use std::time::Duration;

use glam::Vec2;
use wave_escape_core::{Command, Event, HeldDirections, LevelError, Rect, TileKind};
use wave_escape_rendering::{Color, Frame, SpriteKind};
use wave_escape_system_camera::Camera;
use wave_escape_system_hazard::Hazard;
use wave_escape_system_movement::Movement;
use wave_escape_world::{self as world, query, Grid, World};

/// How a session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The player reached the exit.
    Won,
    /// The wave caught the player.
    Lost,
}

/// One attempt at a single level together with the systems driving it.
#[derive(Debug)]
pub(crate) struct Session {
    level_id: String,
    world: World,
    movement: Movement,
    hazard: Hazard,
    camera: Camera,
    events: Vec<Event>,
    commands: Vec<Command>,
}

impl Session {
    pub(crate) fn new(level_id: String, grid: Grid, viewport: Vec2) -> Result<Self, LevelError> {
        let world = World::new(grid)?;
        let mut camera = Camera::new(viewport);
        let _ = camera.update(query::player(&world).bounds(), query::level_size(&world));

        Ok(Self {
            level_id,
            world,
            movement: Movement::default(),
            hazard: Hazard::default(),
            camera,
            events: Vec::new(),
            commands: Vec::new(),
        })
    }

    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn level_id(&self) -> &str {
        &self.level_id
    }

    pub(crate) fn elapsed(&self) -> Duration {
        query::elapsed(&self.world)
    }

    /// Runs one simulation tick and reports the outcome once one is decided.
    ///
    /// Order: clock, movement, hazard, camera. The first decisive event in
    /// broadcast order wins, so reaching the exit on the tick the wave
    /// arrives counts as a win.
    pub(crate) fn tick(
        &mut self,
        dt: Duration,
        held: HeldDirections,
        activation_delay: Duration,
    ) -> Option<Outcome> {
        self.events.clear();
        world::apply(&mut self.world, Command::Tick { dt }, &mut self.events);

        self.movement.handle(
            &self.events,
            held,
            query::player(&self.world).bounds(),
            query::walls(&self.world),
            &mut self.commands,
        );
        self.hazard.handle(
            &self.events,
            activation_delay,
            query::wave(&self.world).phase(),
            &mut self.commands,
        );
        for command in self.commands.drain(..) {
            world::apply(&mut self.world, command, &mut self.events);
        }

        let _ = self.camera.update(
            query::player(&self.world).bounds(),
            query::level_size(&self.world),
        );

        self.events.iter().find_map(|event| match event {
            Event::ExitReached => Some(Outcome::Won),
            Event::PlayerCaught => Some(Outcome::Lost),
            _ => None,
        })
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        frame.clear(Color::BLACK);

        for tile in query::tiles(&self.world) {
            let sprite = match tile.kind() {
                TileKind::Floor => SpriteKind::Floor,
                TileKind::Wall => SpriteKind::Wall,
                TileKind::Exit => SpriteKind::Exit,
            };
            self.place(frame, sprite, tile.bounds());
        }
        if let Some(exit) = query::exit(&self.world) {
            self.place(frame, SpriteKind::Exit, exit.bounds());
        }
        self.place(
            frame,
            SpriteKind::Player,
            query::player(&self.world).bounds(),
        );
        if let Some(band) = query::wave(&self.world).band() {
            self.place(frame, SpriteKind::Wave, band);
        }

        frame.text(
            format_elapsed(self.elapsed()),
            Vec2::new(10.0, 24.0),
            24.0,
            Color::WHITE,
        );
        frame.text(
            self.level_id.as_str(),
            Vec2::new(10.0, 44.0),
            16.0,
            Color::WHITE.with_alpha(0.8),
        );
    }

    fn place(&self, frame: &mut Frame, sprite: SpriteKind, bounds: Rect) {
        if self.camera.is_visible(bounds) {
            frame.sprite(sprite, self.camera.to_screen(bounds));
        }
    }
}

/// Formats the session clock as `Time: <seconds>.<tenths>s`.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    format!(
        "Time: {}.{}s",
        elapsed.as_secs(),
        elapsed.subsec_millis() / 100
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wave_escape_core::{VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
    use wave_escape_world::parse_level_str;

    const TICK: Duration = Duration::from_millis(20);

    fn session(source: &str) -> Session {
        let grid = parse_level_str(source).expect("level parses");
        Session::new(
            "test".to_owned(),
            grid,
            Vec2::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT),
        )
        .expect("session starts")
    }

    #[test]
    fn elapsed_label_shows_tenths() {
        assert_eq!(format_elapsed(Duration::ZERO), "Time: 0.0s");
        assert_eq!(format_elapsed(Duration::from_millis(12_340)), "Time: 12.3s");
    }

    #[test]
    fn walking_into_the_exit_wins() {
        let mut session = session("@E");
        let held = HeldDirections {
            right: true,
            ..HeldDirections::default()
        };

        let outcome = (0..10).find_map(|_| session.tick(TICK, held, Duration::from_secs(60)));

        assert_eq!(outcome, Some(Outcome::Won));
    }

    #[test]
    fn standing_still_under_the_wave_loses() {
        let mut session = session("@");

        let outcome =
            (0..100).find_map(|_| session.tick(TICK, HeldDirections::default(), Duration::ZERO));

        assert_eq!(outcome, Some(Outcome::Lost));
    }

    #[test]
    fn frame_lists_tiles_player_and_clock() {
        let session = session("@.\n#E");
        let mut frame = Frame::default();

        session.draw(&mut frame);

        assert_eq!(frame.sprites_of(SpriteKind::Wall).count(), 1);
        assert_eq!(frame.sprites_of(SpriteKind::Exit).count(), 1);
        assert_eq!(frame.sprites_of(SpriteKind::Player).count(), 1);
        assert_eq!(frame.sprites_of(SpriteKind::Wave).count(), 0);
        assert_eq!(frame.texts[0].text, "Time: 0.0s");
    }
}
