//! Persistence adapter: one JSON snapshot per competition in a data directory.
//!
//! Snapshots are written after each successful change and read back at startup.
//! Damaged tournament data is repaired on load rather than rejected. All writes go
//! through one [`SnapshotWriter`] task, so for each competition the last change
//! queued is the one left on disk.

use crate::models::{Competition, CompetitionId};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Jobs taken from the queue per wake-up.
const WRITE_BATCH: usize = 64;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored competition is not valid: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot writer has stopped")]
    WriterClosed,
}

/// Replace missing or non-array `groups` / `matches` with empty arrays.
/// Returns whether anything was changed.
pub fn repair_tournament(value: &mut Value) -> bool {
    let Some(obj) = value.as_object_mut() else {
        return false;
    };
    let mut repaired = false;
    for key in ["groups", "matches"] {
        if !obj.get(key).is_some_and(Value::is_array) {
            log::warn!("Fixing tournament structure: adding empty {} array", key);
            obj.insert(key.to_string(), Value::Array(Vec::new()));
            repaired = true;
        }
    }
    repaired
}

/// Decode a stored competition, repairing a structurally damaged tournament or bracket.
pub fn decode_competition(json: &str) -> Result<Competition, StorageError> {
    let mut value: Value = serde_json::from_str(json)?;
    if let Some(obj) = value.as_object_mut() {
        match obj.get_mut("tournament") {
            Some(t) if t.is_object() => {
                repair_tournament(t);
            }
            Some(t) if !t.is_null() => {
                log::warn!("Dropping unreadable tournament data");
                *t = Value::Null;
            }
            _ => {}
        }
        if obj.get("knockout_matches").is_some_and(|v| !v.is_array()) {
            log::warn!("Fixing bracket structure: adding empty knockout_matches array");
            obj.insert("knockout_matches".to_string(), Value::Array(Vec::new()));
        }
    }
    Ok(serde_json::from_value(value)?)
}

/// Snapshot files under one directory, named `<competition id>.json`.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: CompetitionId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Write a snapshot (temp file + rename, so readers never see half a file).
    pub async fn save(&self, competition: &Competition) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_vec_pretty(competition)?;
        let path = self.path_for(competition.id);
        let tmp = self.dir.join(format!("{}.{}.tmp", competition.id, Uuid::new_v4()));
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    pub async fn load(&self, id: CompetitionId) -> Result<Option<Competition>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(id)).await {
            Ok(text) => decode_competition(&text).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Every readable snapshot; unreadable files are logged and skipped.
    pub async fn load_all(&self) -> Result<Vec<Competition>, StorageError> {
        let mut competitions = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(competitions),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let text = tokio::fs::read_to_string(&path).await?;
            match decode_competition(&text) {
                Ok(c) => competitions.push(c),
                Err(e) => log::warn!("Skipping unreadable snapshot {}: {}", path.display(), e),
            }
        }
        Ok(competitions)
    }

    pub async fn remove(&self, id: CompetitionId) -> Result<(), StorageError> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

enum WriteJob {
    Save(Box<Competition>),
    Remove(CompetitionId, oneshot::Sender<Result<(), StorageError>>),
    Flush(oneshot::Sender<()>),
}

impl WriteJob {
    fn competition_id(&self) -> Option<CompetitionId> {
        match self {
            WriteJob::Save(c) => Some(c.id),
            WriteJob::Remove(id, _) => Some(*id),
            WriteJob::Flush(_) => None,
        }
    }
}

/// Background writer owning every change to the snapshot directory.
///
/// Jobs run one at a time in the order they were queued. A save that is followed
/// by another job for the same competition in the same batch is skipped.
#[derive(Clone, Debug)]
pub struct SnapshotWriter {
    files: FileStore,
    tx: mpsc::UnboundedSender<WriteJob>,
}

impl SnapshotWriter {
    /// Start the writer task on the current tokio runtime.
    pub fn spawn(files: FileStore) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(files.clone(), rx));
        Self { files, tx }
    }

    /// Store used for reads.
    pub fn files(&self) -> &FileStore {
        &self.files
    }

    /// Queue a snapshot. Failures are logged by the writer.
    pub fn save(&self, competition: Competition) {
        let id = competition.id;
        if self.tx.send(WriteJob::Save(Box::new(competition))).is_err() {
            log::warn!("Snapshot writer stopped, tournament {} not saved", id);
        }
    }

    /// Delete a snapshot after every write queued before it.
    pub async fn remove(&self, id: CompetitionId) -> Result<(), StorageError> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(WriteJob::Remove(id, ack))
            .map_err(|_| StorageError::WriterClosed)?;
        done.await.map_err(|_| StorageError::WriterClosed)?
    }

    /// Wait until every job queued so far has been handled.
    pub async fn flush(&self) -> Result<(), StorageError> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(WriteJob::Flush(ack))
            .map_err(|_| StorageError::WriterClosed)?;
        done.await.map_err(|_| StorageError::WriterClosed)
    }
}

async fn run_writer(files: FileStore, mut rx: mpsc::UnboundedReceiver<WriteJob>) {
    let mut batch = Vec::with_capacity(WRITE_BATCH);
    while rx.recv_many(&mut batch, WRITE_BATCH).await > 0 {
        let ids: Vec<Option<CompetitionId>> = batch.iter().map(WriteJob::competition_id).collect();
        for (i, job) in batch.drain(..).enumerate() {
            match job {
                WriteJob::Save(competition) => {
                    if ids[i + 1..].contains(&Some(competition.id)) {
                        log::debug!("Skipping superseded snapshot of {}", competition.id);
                        continue;
                    }
                    if let Err(e) = files.save(&competition).await {
                        log::warn!("Could not save tournament {}: {}", competition.id, e);
                    }
                }
                WriteJob::Remove(id, ack) => {
                    // The requester may have gone away; the file is removed regardless.
                    let _ = ack.send(files.remove(id).await);
                }
                WriteJob::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }
    }
    log::debug!("Snapshot writer stopped");
}
