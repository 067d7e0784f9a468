use std::time::Duration;

use wave_escape_core::{Command, Difficulty, Event, WavePhase};
use wave_escape_system_hazard::Hazard;
use wave_escape_world::{self as world, parse_level_str, query, World};

const TICK: Duration = Duration::from_millis(20);

fn step(world: &mut World, hazard: &mut Hazard, delay: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt: TICK }, &mut events);

    let phase = query::wave(world).phase();
    let mut commands = Vec::new();
    hazard.handle(&events, delay, phase, &mut commands);
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn session(source: &str) -> World {
    World::new(parse_level_str(source).expect("level parses")).expect("session starts")
}

#[test]
fn hard_difficulty_activates_at_eight_seconds() {
    let mut world = session("@...\n....");
    let mut hazard = Hazard::default();
    let delay = Difficulty::Hard.activation_delay();

    // 399 ticks of 20 ms reach 7980 ms; the 400th tick lands on 8000 ms.
    for _ in 0..399 {
        let events = step(&mut world, &mut hazard, delay);
        assert!(!events.contains(&Event::WaveActivated));
    }
    assert_eq!(query::wave(&world).phase(), WavePhase::Idle);

    let events = step(&mut world, &mut hazard, delay);
    assert_eq!(query::elapsed(&world), Duration::from_millis(8_000));
    assert!(events.contains(&Event::WaveActivated));
    assert_eq!(query::wave(&world).phase(), WavePhase::Active);
}

#[test]
fn wave_front_rises_monotonically_and_activates_once() {
    let mut world = session(".\n.\n.\n@");
    let mut hazard = Hazard::new(5.0);
    let delay = Duration::from_millis(40);

    let mut activations = 0;
    let mut last_front = 0.0f32;
    let mut receded = false;
    for _ in 0..200 {
        for event in step(&mut world, &mut hazard, delay) {
            match event {
                Event::WaveActivated => activations += 1,
                Event::WaveAdvanced { front } => {
                    assert!(front >= last_front, "front must never move backwards");
                    last_front = front;
                }
                Event::WaveReceded => receded = true,
                _ => {}
            }
        }
    }

    assert_eq!(activations, 1);
    assert!(receded, "the wave should pass the top edge within 200 ticks");
    assert_eq!(query::wave(&world).phase(), WavePhase::Idle);
}

#[test]
fn collision_reported_on_first_overlapping_tick() {
    // The player at the bottom row spans y 165..185 of a 200 px tall level.
    let mut world = session(".\n.\n.\n@");
    let mut hazard = Hazard::new(5.0);
    let delay = Duration::ZERO;

    let mut caught_at_front = None;
    for _ in 0..20 {
        let events = step(&mut world, &mut hazard, delay);
        if events.contains(&Event::PlayerCaught) {
            caught_at_front = Some(query::wave(&world).front());
            break;
        }
    }

    // Band top = 200 - front; overlap starts once it rises above y = 185.
    assert_eq!(caught_at_front, Some(20.0));
}
