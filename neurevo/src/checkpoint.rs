//! Periodic population snapshots.
//!
//! A [`CheckpointStore`] serializes whole populations to disk at a
//! configurable generation interval. Snapshots include the RNG
//! state, so a restored population continues exactly as the
//! uninterrupted run would have.
use crate::populations::Population;
use crate::Genome;

use log::warn;
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error while saving or restoring a population snapshot.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("checkpoint (de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Writes population snapshots to a directory at a fixed
/// generation interval.
///
/// Snapshot `n` lands at `<directory>/<prefix>-<n>.json`. Writes go
/// through a temporary file renamed into place, so a crash mid-write
/// never leaves a truncated snapshot under the final name.
#[derive(Clone, Debug)]
pub struct CheckpointStore {
    directory: PathBuf,
    prefix: String,
    interval: NonZeroUsize,
}

impl CheckpointStore {
    /// Creates a store writing `<prefix>-<generation>.json` files
    /// under `directory` every `interval` generations.
    pub fn new(
        directory: impl Into<PathBuf>,
        prefix: impl Into<String>,
        interval: NonZeroUsize,
    ) -> CheckpointStore {
        CheckpointStore {
            directory: directory.into(),
            prefix: prefix.into(),
            interval,
        }
    }

    /// The path snapshot `generation` is (or would be) stored at.
    pub fn path_for(&self, generation: usize) -> PathBuf {
        self.directory
            .join(format!("{}-{}.json", self.prefix, generation))
    }

    /// Saves the population if its generation falls on the store's
    /// interval. Failure to write is logged and otherwise ignored;
    /// the in-memory population is never affected.
    pub fn save_if_due<C, R, G>(&self, population: &Population<C, R, G>)
    where
        G: Genome<InnovationRecord = R, Config = C> + Clone,
        Population<C, R, G>: Serialize,
    {
        if population.generation() % self.interval.get() != 0 {
            return;
        }
        if let Err(e) = self.save(population) {
            warn!(
                "failed to write checkpoint for generation {}: {}",
                population.generation(),
                e
            );
        }
    }

    /// Saves the population unconditionally.
    ///
    /// # Errors
    /// Fails if the snapshot cannot be serialized or written.
    pub fn save<C, R, G>(&self, population: &Population<C, R, G>) -> Result<(), CheckpointError>
    where
        G: Genome<InnovationRecord = R, Config = C> + Clone,
        Population<C, R, G>: Serialize,
    {
        fs::create_dir_all(&self.directory)?;
        let path = self.path_for(population.generation());
        let tmp = path.with_extension("json.tmp");
        {
            let writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(writer, population)?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Restores the snapshot taken at `generation`.
    ///
    /// # Errors
    /// Fails if the snapshot is missing or unreadable.
    pub fn restore<C, R, G>(&self, generation: usize) -> Result<Population<C, R, G>, CheckpointError>
    where
        G: Genome<InnovationRecord = R, Config = C> + Clone,
        Population<C, R, G>: DeserializeOwned,
    {
        Self::restore_from(self.path_for(generation))
    }

    /// Restores a population from any snapshot file.
    ///
    /// # Errors
    /// Fails if the file is missing or unreadable.
    pub fn restore_from<C, R, G>(
        path: impl AsRef<Path>,
    ) -> Result<Population<C, R, G>, CheckpointError>
    where
        G: Genome<InnovationRecord = R, Config = C> + Clone,
        Population<C, R, G>: DeserializeOwned,
    {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
