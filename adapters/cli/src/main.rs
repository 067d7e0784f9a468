#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Wave Escape experience.

mod levels;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use glam::Vec2;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wave_escape_core::{DEFAULT_TICK_RATE, VIEWPORT_HEIGHT, VIEWPORT_WIDTH, WINDOW_TITLE};
use wave_escape_persistence::FileStore;
use wave_escape_rendering::{Presentation, RenderingBackend};
use wave_escape_rendering_macroquad::MacroquadBackend;
use wave_escape_system_flow::{GameFlow, LEVELS};

use self::levels::LevelDirectory;

/// Presentation synchronisation modes exposed through the CLI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SyncMode {
    /// Synchronise presentation with the display refresh rate.
    On,
    /// Render as fast as possible.
    Off,
}

/// Command-line arguments accepted by the Wave Escape binary.
#[derive(Debug, Parser)]
#[command(name = "wave-escape", version, about = "Reach the exit before the wave does")]
struct CliArgs {
    /// Directory holding settings, statistics and the sprite manifest.
    #[arg(long, value_name = "PATH", default_value = "assets")]
    data_dir: PathBuf,
    /// Directory holding the level files. Defaults to `<data-dir>/levels`.
    #[arg(long, value_name = "PATH")]
    levels_dir: Option<PathBuf>,
    /// Simulation ticks per second.
    #[arg(
        long,
        value_name = "HZ",
        default_value_t = DEFAULT_TICK_RATE,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    tick_rate: u32,
    /// Controls whether presentation waits for the display refresh.
    #[arg(long, value_enum)]
    vsync: Option<SyncMode>,
    /// Log frame timing metrics once per second.
    #[arg(long)]
    show_fps: bool,
    /// Draw every sprite as a flat placeholder instead of loading images.
    #[arg(long)]
    no_sprites: bool,
}

impl CliArgs {
    fn levels_dir(&self) -> PathBuf {
        self.levels_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("levels"))
    }
}

/// Entry point for the Wave Escape command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing();

    let mut levels = LevelDirectory::new(args.levels_dir());
    info!(
        data_dir = %args.data_dir.display(),
        levels_dir = %levels.root().display(),
        tick_rate = args.tick_rate,
        vsync = ?args.vsync,
        show_fps = args.show_fps,
        sprites = !args.no_sprites,
        "starting"
    );
    levels
        .verify(&LEVELS)
        .context("bundled levels failed verification")?;

    let presentation = Presentation::new(
        WINDOW_TITLE,
        Vec2::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT),
        args.tick_rate,
    )
    .context("invalid presentation settings")?;

    let mut flow = GameFlow::new(
        FileStore::settings(&args.data_dir),
        FileStore::statistics(&args.data_dir),
        levels,
    );

    let mut backend = MacroquadBackend::new()
        .with_show_fps(args.show_fps)
        .with_sprite_loading(!args.no_sprites)
        .with_manifest_path(args.data_dir.join("manifest.toml"));
    if let Some(mode) = args.vsync {
        backend = backend.with_vsync(mode == SyncMode::On);
    }

    backend.run(presentation, move |dt, input, frame| {
        flow.tick(dt, &input, frame).context("game loop failed")
    })?;

    info!("shutdown");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_data_directory() {
        let args = CliArgs::try_parse_from(["wave-escape"]).expect("defaults parse");

        assert_eq!(args.data_dir, PathBuf::from("assets"));
        assert_eq!(args.levels_dir(), PathBuf::from("assets/levels"));
        assert_eq!(args.tick_rate, DEFAULT_TICK_RATE);
        assert_eq!(args.vsync, None);
        assert!(!args.show_fps);
        assert!(!args.no_sprites);
    }

    #[test]
    fn explicit_levels_dir_wins() {
        let args = CliArgs::try_parse_from([
            "wave-escape",
            "--data-dir",
            "save",
            "--levels-dir",
            "maps",
            "--vsync",
            "off",
            "--tick-rate",
            "60",
        ])
        .expect("arguments parse");

        assert_eq!(args.levels_dir(), PathBuf::from("maps"));
        assert_eq!(args.vsync, Some(SyncMode::Off));
        assert_eq!(args.tick_rate, 60);
    }

    #[test]
    fn zero_tick_rate_is_rejected() {
        assert!(CliArgs::try_parse_from(["wave-escape", "--tick-rate", "0"]).is_err());
    }
}
