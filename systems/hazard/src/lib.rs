#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic hazard system that starts and drives the rising wave.

use std::time::Duration;

use wave_escape_core::{Command, Event, WavePhase, WAVE_SPEED};

/// Pure system that times the wave activation and advances an active wave.
///
/// A fresh instance is created for every session. The activation fires at
/// most once per instance, on the first tick whose elapsed session time
/// reaches the configured delay.
#[derive(Clone, Copy, Debug)]
pub struct Hazard {
    speed: f32,
    triggered: bool,
}

impl Hazard {
    /// Creates a hazard system advancing the wave `speed` pixels per tick.
    #[must_use]
    pub const fn new(speed: f32) -> Self {
        Self {
            speed,
            triggered: false,
        }
    }

    /// Reports whether the activation already fired.
    #[must_use]
    pub const fn triggered(&self) -> bool {
        self.triggered
    }

    /// Consumes world events to emit wave commands.
    ///
    /// `activation_delay` is passed on every call so that a difficulty change
    /// applies to the very next tick. `phase` is the wave's phase before the
    /// tick's commands are applied.
    pub fn handle(
        &mut self,
        events: &[Event],
        activation_delay: Duration,
        phase: WavePhase,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            let Event::TimeAdvanced { elapsed, .. } = event else {
                continue;
            };

            match phase {
                WavePhase::Active => out.push(Command::AdvanceWave {
                    distance: self.speed,
                }),
                WavePhase::Idle => {
                    if !self.triggered && *elapsed >= activation_delay {
                        self.triggered = true;
                        out.push(Command::ActivateWave);
                    }
                }
            }
        }
    }
}

impl Default for Hazard {
    fn default() -> Self {
        Self::new(WAVE_SPEED)
    }
}
