use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;
use wave_escape_system_flow::LevelSource;
use wave_escape_world::{instantiate, parse_level};

/// Level files stored side by side in one directory.
#[derive(Debug)]
pub(crate) struct LevelDirectory {
    root: PathBuf,
}

/// A level file could not be read.
#[derive(Debug, Error)]
#[error("failed to read level file {}", .path.display())]
pub(crate) struct LevelFileError {
    path: PathBuf,
    #[source]
    source: io::Error,
}

impl LevelDirectory {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    /// Loads every listed level and checks that it can start a session.
    pub(crate) fn verify(&mut self, ids: &[&str]) -> Result<()> {
        for id in ids {
            let lines = self.load(id)?;
            let grid = parse_level(lines).with_context(|| format!("level `{id}` is malformed"))?;
            let _ = instantiate(&grid)
                .with_context(|| format!("level `{id}` cannot start a session"))?;
            info!(
                level = %id,
                columns = grid.columns(),
                rows = grid.rows(),
                "level_verified"
            );
        }
        Ok(())
    }
}

impl LevelSource for LevelDirectory {
    type Error = LevelFileError;

    fn load(&mut self, id: &str) -> Result<Vec<String>, LevelFileError> {
        let path = self.root.join(id);
        fs::read_to_string(&path)
            .map(|text| text.lines().map(str::to_owned).collect())
            .map_err(|source| LevelFileError { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_lines_from_the_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("level1.txt"), "@..\n.#E\n").expect("seed level");

        let mut levels = LevelDirectory::new(dir.path());
        let lines = levels.load("level1.txt").expect("level loads");

        assert_eq!(lines, vec!["@..".to_owned(), ".#E".to_owned()]);
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut levels = LevelDirectory::new(dir.path());

        let error = levels.load("level9.txt").expect_err("no such level");

        assert!(error.to_string().contains("level9.txt"));
        assert_eq!(error.source.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn verify_rejects_levels_without_spawn() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("a.txt"), "@.E").expect("seed level");
        fs::write(dir.path().join("b.txt"), "..E").expect("seed level");
        let mut levels = LevelDirectory::new(dir.path());

        levels.verify(&["a.txt"]).expect("first level is playable");
        let error = levels
            .verify(&["a.txt", "b.txt"])
            .expect_err("second level has no spawn");
        assert!(format!("{error:#}").contains("b.txt"));
    }

    #[test]
    fn verify_rejects_empty_levels() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("empty.txt"), "\n\n").expect("seed level");
        let mut levels = LevelDirectory::new(dir.path());

        assert!(levels.verify(&["empty.txt"]).is_err());
    }

    #[test]
    fn bundled_levels_are_playable() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/levels");
        let mut levels = LevelDirectory::new(root);

        levels
            .verify(&wave_escape_system_flow::LEVELS)
            .expect("bundled levels start");
    }
}
