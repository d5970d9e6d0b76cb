//! The four output collections, and their on-disk snapshot form.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::documents::{Game, GameUser, Video, VideoFile, GAMES, GAME_USERS, VIDEOS, VIDEO_FILES};
use crate::error::{Error, Result};

/// Everything a run loads into the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// `games` collection.
    pub games: Vec<Game>,
    /// `game_users` collection.
    pub game_users: Vec<GameUser>,
    /// `video_files` collection.
    pub video_files: Vec<VideoFile>,
    /// `videos` collection.
    pub videos: Vec<Video>,
}

impl Snapshot {
    /// Collections as store documents, in load order.
    ///
    /// # Errors
    ///
    /// Returns an error if a document cannot be serialized.
    pub fn collections(&self) -> Result<Vec<(&'static str, Vec<Value>)>> {
        Ok(vec![
            (GAMES, to_documents(&self.games)?),
            (GAME_USERS, to_documents(&self.game_users)?),
            (VIDEO_FILES, to_documents(&self.video_files)?),
            (VIDEOS, to_documents(&self.videos)?),
        ])
    }

    /// Total number of documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.games.len() + self.game_users.len() + self.video_files.len() + self.videos.len()
    }

    /// True if there is nothing to load.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the snapshot as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Reads a snapshot written by [`Snapshot::to_file`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            Error::Config(format!("Cannot open snapshot '{}': {}", path.display(), e))
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

fn to_documents<T: Serialize>(items: &[T]) -> Result<Vec<Value>> {
    items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(Error::from))
        .collect()
}
