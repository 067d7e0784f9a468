#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Key to integer stores backing Wave Escape settings and statistics.
//!
//! [`FileStore`] keeps a flat TOML table on disk. A missing file is not an
//! error: the store is created from its defaults and written immediately.
//! Every other I/O or format failure is surfaced as a [`StoreError`].
//! [`MemoryStore`] offers the same contract without touching the filesystem.

mod atomic_io;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, warn};
use wave_escape_core::{PersistedValues, ProgressStore, Statistics, DIFFICULTY_KEY};

/// File name of the settings store inside the data directory.
pub const SETTINGS_FILE: &str = "settings.toml";

/// File name of the statistics store inside the data directory.
pub const STATS_FILE: &str = "stats.toml";

/// Failures raised while reading or writing a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store file could not be read or written.
    #[error("failed to access store at {path}")]
    Io {
        /// Location of the store file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The store file exists but does not hold a `key = integer` table.
    #[error("store at {path} is not a table of non-negative integers")]
    Parse {
        /// Location of the store file.
        path: PathBuf,
        /// Underlying TOML failure.
        #[source]
        source: toml::de::Error,
    },
    /// The values could not be encoded as TOML.
    #[error("failed to encode store values")]
    Serialize(#[from] toml::ser::Error),
}

/// Default values of the settings store.
#[must_use]
pub fn default_settings() -> PersistedValues {
    let mut values = PersistedValues::new();
    let _ = values.insert(DIFFICULTY_KEY.to_owned(), 0);
    values
}

/// Default values of the statistics store.
#[must_use]
pub fn default_statistics() -> PersistedValues {
    Statistics::default().to_values()
}

/// Store persisted as a flat TOML table.
///
/// Values are cached after the first successful read; the store is the only
/// writer of its file for the lifetime of the process.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    defaults: PersistedValues,
    cached: Option<PersistedValues>,
}

impl FileStore {
    /// Creates a store backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, defaults: PersistedValues) -> Self {
        Self {
            path: path.into(),
            defaults,
            cached: None,
        }
    }

    /// Creates the settings store inside `data_dir`.
    #[must_use]
    pub fn settings(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(SETTINGS_FILE), default_settings())
    }

    /// Creates the statistics store inside `data_dir`.
    #[must_use]
    pub fn statistics(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(STATS_FILE), default_statistics())
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&mut self) -> Result<PersistedValues, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "store_missing_created_with_defaults");
                let defaults = self.defaults.clone();
                self.persist(&defaults)?;
                return Ok(defaults);
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        toml::from_str(&contents).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn persist(&self, values: &PersistedValues) -> Result<(), StoreError> {
        let text = toml::to_string(values)?;
        atomic_io::write_text_atomic(&self.path, &text).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), keys = values.len(), "store_written");
        Ok(())
    }
}

impl ProgressStore for FileStore {
    type Error = StoreError;

    fn read(&mut self) -> Result<PersistedValues, StoreError> {
        if let Some(values) = &self.cached {
            return Ok(values.clone());
        }

        let values = self.load()?;
        self.cached = Some(values.clone());
        Ok(values)
    }

    fn write(&mut self, values: &PersistedValues) -> Result<(), StoreError> {
        self.persist(values)?;
        self.cached = Some(values.clone());
        Ok(())
    }
}

/// Store kept entirely in memory.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    defaults: PersistedValues,
    values: Option<PersistedValues>,
    writes: usize,
}

impl MemoryStore {
    /// Creates an absent store that materialises `defaults` on first read.
    #[must_use]
    pub fn new(defaults: PersistedValues) -> Self {
        Self {
            defaults,
            values: None,
            writes: 0,
        }
    }

    /// Creates a store that already holds `values`.
    #[must_use]
    pub fn with_values(values: PersistedValues) -> Self {
        Self {
            defaults: values.clone(),
            values: Some(values),
            writes: 0,
        }
    }

    /// Values currently held, if the store exists.
    #[must_use]
    pub fn values(&self) -> Option<&PersistedValues> {
        self.values.as_ref()
    }

    /// Number of writes performed, including default materialisation.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }
}

impl ProgressStore for MemoryStore {
    type Error = std::convert::Infallible;

    fn read(&mut self) -> Result<PersistedValues, Self::Error> {
        if self.values.is_none() {
            self.values = Some(self.defaults.clone());
            self.writes += 1;
        }
        Ok(self.values.clone().unwrap_or_default())
    }

    fn write(&mut self, values: &PersistedValues) -> Result<(), Self::Error> {
        self.values = Some(values.clone());
        self.writes += 1;
        Ok(())
    }
}
