use glam::Vec2;
use wave_escape_core::{Difficulty, Rect, Statistics, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use wave_escape_rendering::{Color, Frame, FrameInput, SpriteKind};

use crate::session::Outcome;

const BUTTON_SIZE: Vec2 = Vec2::new(160.0, 40.0);
const BUTTON_TOP: f32 = 70.0;
const BUTTON_SPACING: f32 = 50.0;
const INK: Color = Color::from_rgb_u8(20, 20, 30);

const RULES: [&str; 3] = [
    "WASD - move",
    "Reach the exit before the wave",
    "X - quit",
];

/// Clickable rectangle on a menu screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Button<A> {
    /// Action triggered by the button.
    pub action: A,
    /// Screen-space area that accepts clicks.
    pub rect: Rect,
    /// Caption drawn on the button.
    pub label: &'static str,
}

/// Actions offered by the main menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    /// Start the current level.
    Play,
    /// Open the difficulty screen.
    Settings,
    /// Open the statistics screen.
    Stats,
    /// Quit the game.
    Exit,
}

/// Actions offered by the settings screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsAction {
    /// Persist the difficulty.
    Select(Difficulty),
    /// Return to the menu.
    Back,
}

fn slot(index: usize) -> Rect {
    Rect::new(
        Vec2::new(
            (VIEWPORT_WIDTH - BUTTON_SIZE.x) / 2.0,
            BUTTON_TOP + index as f32 * BUTTON_SPACING,
        ),
        BUTTON_SIZE,
    )
}

/// Buttons of the main menu, top to bottom.
#[must_use]
pub fn menu_buttons() -> [Button<MenuAction>; 4] {
    let entry = |index: usize, action: MenuAction, label: &'static str| Button {
        action,
        rect: slot(index),
        label,
    };
    [
        entry(0, MenuAction::Play, "Play"),
        entry(1, MenuAction::Settings, "Settings"),
        entry(2, MenuAction::Stats, "Stats"),
        entry(3, MenuAction::Exit, "Exit"),
    ]
}

/// Buttons of the settings screen, top to bottom.
#[must_use]
pub fn settings_buttons() -> [Button<SettingsAction>; 4] {
    let [easy, medium, hard] = Difficulty::SELECTABLE;
    [
        Button {
            action: SettingsAction::Select(easy),
            rect: slot(0),
            label: easy.label(),
        },
        Button {
            action: SettingsAction::Select(medium),
            rect: slot(1),
            label: medium.label(),
        },
        Button {
            action: SettingsAction::Select(hard),
            rect: slot(2),
            label: hard.label(),
        },
        Button {
            action: SettingsAction::Back,
            rect: slot(3),
            label: "Back",
        },
    ]
}

/// Back button of the statistics screen.
#[must_use]
pub fn stats_back_button() -> Button<()> {
    Button {
        action: (),
        rect: slot(3),
        label: "Back",
    }
}

/// Returns the action of the first button hit by a pointer press.
pub(crate) fn clicked<A: Copy>(buttons: &[Button<A>], input: &FrameInput) -> Option<A> {
    input.pointer_presses().find_map(|position| {
        buttons
            .iter()
            .find(|button| button.rect.contains(position))
            .map(|button| button.action)
    })
}

fn full_screen() -> Rect {
    Rect::new(Vec2::ZERO, Vec2::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT))
}

fn draw_button<A>(frame: &mut Frame, button: &Button<A>, selected: bool) {
    let sprite = if selected {
        SpriteKind::ButtonSelected
    } else {
        SpriteKind::Button
    };
    frame.sprite(sprite, button.rect);
    frame.text(
        button.label,
        button.rect.origin() + Vec2::new(16.0, 27.0),
        22.0,
        Color::WHITE,
    );
}

fn backdrop(frame: &mut Frame, title: &str) {
    frame.clear(Color::WHITE);
    frame.sprite(SpriteKind::Background, full_screen());
    frame.text(title, Vec2::new(20.0, 45.0), 36.0, INK);
}

pub(crate) fn draw_start(frame: &mut Frame) {
    backdrop(frame, "Wave Escape");
    for (index, rule) in RULES.iter().enumerate() {
        frame.text(
            *rule,
            Vec2::new(20.0, 100.0 + index as f32 * 28.0),
            22.0,
            INK,
        );
    }
    frame.text("Press any key", Vec2::new(20.0, 270.0), 20.0, INK);
}

pub(crate) fn draw_menu(frame: &mut Frame) {
    backdrop(frame, "Wave Escape");
    for button in &menu_buttons() {
        draw_button(frame, button, false);
    }
}

pub(crate) fn draw_settings(frame: &mut Frame, selected: Difficulty) {
    backdrop(frame, "Difficulty");
    for button in &settings_buttons() {
        let highlighted = button.action == SettingsAction::Select(selected);
        draw_button(frame, button, highlighted);
    }
    frame.text(
        "1/2/3 - select, Esc - back",
        Vec2::new(20.0, 285.0),
        18.0,
        INK,
    );
}

pub(crate) fn draw_stats(frame: &mut Frame, stats: &Statistics) {
    backdrop(frame, "Statistics");
    let lines = [
        format!("Levels completed: {}", stats.levels_completed),
        format!("Total time: {}s", stats.total_time_seconds),
        format!("Wins: {}", stats.wins),
        format!("Losses: {}", stats.losses),
    ];
    for (index, line) in lines.into_iter().enumerate() {
        frame.text(line, Vec2::new(20.0, 90.0 + index as f32 * 28.0), 22.0, INK);
    }
    draw_button(frame, &stats_back_button(), false);
}

pub(crate) fn draw_result(frame: &mut Frame, outcome: Outcome, accepts_input: bool) {
    let (banner, caption) = match outcome {
        Outcome::Won => (SpriteKind::WinBanner, "You escaped!"),
        Outcome::Lost => (SpriteKind::LoseBanner, "The wave caught you"),
    };
    frame.clear(Color::BLACK);
    frame.sprite(banner, full_screen());
    frame.text(caption, Vec2::new(20.0, 150.0), 32.0, Color::WHITE);
    if accepts_input {
        frame.text("Press any key", Vec2::new(20.0, 270.0), 20.0, Color::WHITE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wave_escape_rendering::Press;

    fn click(position: Vec2) -> FrameInput {
        FrameInput {
            presses: vec![Press::Pointer(position)],
            ..FrameInput::default()
        }
    }

    #[test]
    fn buttons_stack_without_overlapping() {
        let buttons = menu_buttons();
        for pair in buttons.windows(2) {
            assert!(!pair[0].rect.intersects(&pair[1].rect));
        }
        assert!(buttons[3].rect.max().y <= VIEWPORT_HEIGHT);
    }

    #[test]
    fn click_inside_button_triggers_it() {
        let buttons = menu_buttons();
        let inside = buttons[2].rect.center();
        assert_eq!(clicked(&buttons, &click(inside)), Some(MenuAction::Stats));
        assert_eq!(clicked(&buttons, &click(Vec2::new(5.0, 5.0))), None);
    }

    #[test]
    fn settings_highlight_follows_selection() {
        let mut frame = Frame::default();
        draw_settings(&mut frame, Difficulty::Medium);

        let highlighted: Vec<_> = frame.sprites_of(SpriteKind::ButtonSelected).collect();
        assert_eq!(highlighted.len(), 1);
        assert_eq!(highlighted[0].rect, settings_buttons()[1].rect);
    }
}
