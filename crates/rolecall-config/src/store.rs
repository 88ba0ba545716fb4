//! File-backed store with serialized read-modify-write transactions.
//!
//! # Design
//! - The committed document is held as an `Arc` snapshot; readers clone the
//!   pointer and never wait on a writer.
//! - Every `update` runs under one async writer lock covering the read of the
//!   base state, the transform, the durable write and the publish, so commits
//!   form a total order and no update starts from a stale base.
//! - Persistence writes a sibling temp file, syncs it, then renames it over the
//!   target so a reader of the file never sees a partial document.
//! - Persist and publish run on a spawned task that owns the writer lock, so a
//!   caller that stops waiting cannot leave a written but unpublished revision.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument};

use crate::defaults::{TEMP_FILE_PREFIX, TEMP_FILE_SUFFIX};
use crate::error::{ConfigError, ConfigResult};
use crate::model::ConfigDocument;
use crate::validate::validate_document;

/// Result of a transform applied inside [`ConfigStore::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition<T> {
    /// Persist the working copy, publish it, then hand back the value.
    Apply(T),
    /// Discard the working copy without writing and hand back the value.
    Noop(T),
}

/// Failure of a [`ConfigStore::update`] transaction.
#[derive(Debug, Error)]
pub enum UpdateError<E> {
    /// The transform declined the change; nothing was written.
    #[error("configuration update rejected")]
    Rejected(E),
    /// The store could not provide the base state or persist the result.
    #[error("configuration update failed")]
    Store(#[source] ConfigError),
}

/// Owner of the on-disk configuration document.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    committed: Arc<RwLock<Arc<ConfigDocument>>>,
    writer: Arc<Mutex<()>>,
}

impl ConfigStore {
    /// Load and validate the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the file cannot be read, `Parse` if it is
    /// not a document, or `InvalidDocument` if it violates an invariant.
    #[instrument(name = "config_store.open", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let document = load_document(&path).await?;
        info!(
            communities = document.communities.len(),
            overlords = document.overlords.len(),
            "configuration document loaded"
        );

        Ok(Self {
            path,
            committed: Arc::new(RwLock::new(Arc::new(document))),
            writer: Arc::new(Mutex::new(())),
        })
    }

    /// Location of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the most recently committed document.
    ///
    /// # Errors
    ///
    /// Returns `StatePoisoned` if a publisher panicked while swapping state.
    pub fn read(&self) -> ConfigResult<Arc<ConfigDocument>> {
        self.committed
            .read()
            .map(|committed| Arc::clone(&committed))
            .map_err(|_| ConfigError::StatePoisoned)
    }

    /// Apply `transform` to the current committed document as one serialized
    /// transaction.
    ///
    /// The transform works on a private copy. Returning
    /// [`Transition::Apply`] persists and publishes the copy before the value
    /// is handed back; [`Transition::Noop`] and `Err` leave disk and memory
    /// untouched. Once persistence has started it runs to completion even if
    /// the returned future is dropped.
    ///
    /// # Errors
    ///
    /// Returns `UpdateError::Rejected` with the transform's error, or
    /// `UpdateError::Store` if the base state is unusable or persistence fails.
    pub async fn update<T, E, F>(&self, transform: F) -> Result<T, UpdateError<E>>
    where
        F: FnOnce(&mut ConfigDocument) -> Result<Transition<T>, E>,
    {
        let writer = Arc::clone(&self.writer).lock_owned().await;
        let base = self.read().map_err(UpdateError::Store)?;
        let mut working = ConfigDocument::clone(&base);

        match transform(&mut working).map_err(UpdateError::Rejected)? {
            Transition::Noop(value) => {
                debug!("configuration update produced no change");
                Ok(value)
            }
            Transition::Apply(value) => {
                let commit = tokio::spawn(commit_document(
                    self.path.clone(),
                    Arc::clone(&self.committed),
                    working,
                    writer,
                ));
                commit
                    .await
                    .map_err(|source| UpdateError::Store(ConfigError::WriterTask { source }))?
                    .map_err(UpdateError::Store)?;
                debug!("configuration update committed");
                Ok(value)
            }
        }
    }

    /// Re-read the backing file and publish it as the committed document.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`ConfigStore::open`]; the previously
    /// committed document stays in place on failure.
    #[instrument(name = "config_store.reload", skip(self), fields(path = %self.path.display()))]
    pub async fn reload(&self) -> ConfigResult<Arc<ConfigDocument>> {
        let _writer = self.writer.lock().await;
        let document = load_document(&self.path).await?;
        let published = publish(&self.committed, document)?;
        info!("configuration document reloaded");
        Ok(published)
    }
}

async fn commit_document(
    path: PathBuf,
    committed: Arc<RwLock<Arc<ConfigDocument>>>,
    document: ConfigDocument,
    _writer: OwnedMutexGuard<()>,
) -> ConfigResult<()> {
    persist_document(&path, &document).await?;
    publish(&committed, document)?;
    Ok(())
}

fn publish(
    committed: &RwLock<Arc<ConfigDocument>>,
    document: ConfigDocument,
) -> ConfigResult<Arc<ConfigDocument>> {
    let document = Arc::new(document);
    let mut current = committed.write().map_err(|_| ConfigError::StatePoisoned)?;
    *current = Arc::clone(&document);
    Ok(document)
}

async fn load_document(path: &Path) -> ConfigResult<ConfigDocument> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::unavailable("config.read", path, source))?;
    let document: ConfigDocument =
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    validate_document(&document)?;
    Ok(document)
}

async fn persist_document(path: &Path, document: &ConfigDocument) -> ConfigResult<()> {
    let mut serialised = serde_json::to_vec_pretty(document)
        .map_err(|source| ConfigError::Serialize { source })?;
    serialised.push(b'\n');

    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_atomic(&target, &serialised))
        .await
        .map_err(|source| ConfigError::WriterTask { source })?
}

fn write_atomic(path: &Path, contents: &[u8]) -> ConfigResult<()> {
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .suffix(TEMP_FILE_SUFFIX)
        .tempfile_in(directory)
        .map_err(|source| ConfigError::persist("config.persist.create_temp", path, source))?;
    temp.write_all(contents)
        .map_err(|source| ConfigError::persist("config.persist.write", path, source))?;
    temp.as_file()
        .sync_all()
        .map_err(|source| ConfigError::persist("config.persist.sync", path, source))?;
    temp.persist(path)
        .map_err(|err| ConfigError::persist("config.persist.rename", path, err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CommunityConfig;
    use anyhow::Result;
    use std::fs;
    use tempfile::TempDir;

    const COMPACT_DOCUMENT: &str = r#"{"connectionSecret":"secret","overlords":["1"],"communities":{"7":{"allowedRoles":["scout"]}},"faces":["(o_o)"]}"#;

    fn write_compact(dir: &TempDir) -> Result<PathBuf> {
        let path = dir.path().join("config.json");
        fs::write(&path, COMPACT_DOCUMENT)?;
        Ok(path)
    }

    fn allow_in(
        community: &'static str,
        role: String,
    ) -> impl FnOnce(&mut ConfigDocument) -> std::result::Result<Transition<()>, String> {
        move |document| {
            if document.community_entry(community).allow(role.clone()) {
                Ok(Transition::Apply(()))
            } else {
                Err(role)
            }
        }
    }

    #[tokio::test]
    async fn open_reports_missing_file_as_unavailable() -> Result<()> {
        let dir = TempDir::new()?;
        let err = ConfigStore::open(dir.path().join("missing.json"))
            .await
            .expect_err("missing file must fail");
        assert!(matches!(err, ConfigError::StoreUnavailable { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn open_rejects_malformed_and_invalid_documents() -> Result<()> {
        let dir = TempDir::new()?;
        let malformed = dir.path().join("malformed.json");
        fs::write(&malformed, "{ not json")?;
        assert!(matches!(
            ConfigStore::open(&malformed).await,
            Err(ConfigError::Parse { .. })
        ));

        let duplicated = dir.path().join("duplicated.json");
        fs::write(
            &duplicated,
            r#"{"connectionSecret":"s","communities":{"7":{"allowedRoles":["a","a"]}}}"#,
        )?;
        assert!(matches!(
            ConfigStore::open(&duplicated).await,
            Err(ConfigError::InvalidDocument { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn applied_update_round_trips_through_disk() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_compact(&dir)?;
        let store = ConfigStore::open(&path).await?;

        store.update(allow_in("7", "pilot".to_string())).await?;
        store.update(allow_in("9", "medic".to_string())).await?;

        let in_memory = store.read()?;
        let reopened = ConfigStore::open(&path).await?;
        assert_eq!(*reopened.read()?, *in_memory);
        assert_eq!(
            in_memory.community("7").map(CommunityConfig::allowed_roles),
            Some(["scout".to_string(), "pilot".to_string()].as_slice())
        );
        assert_eq!(in_memory.faces, ["(o_o)"]);
        assert_eq!(in_memory.connection_secret, "secret");
        Ok(())
    }

    #[tokio::test]
    async fn noop_and_rejected_updates_leave_file_untouched() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_compact(&dir)?;
        let store = ConfigStore::open(&path).await?;

        let value: u8 = store
            .update(|_| Ok::<_, String>(Transition::Noop(7)))
            .await?;
        assert_eq!(value, 7);

        let rejected = store.update(allow_in("7", "scout".to_string())).await;
        assert!(matches!(rejected, Err(UpdateError::Rejected(ref role)) if role == "scout"));

        assert_eq!(fs::read_to_string(&path)?, COMPACT_DOCUMENT);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_are_not_lost() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_compact(&dir)?;
        let store = Arc::new(ConfigStore::open(&path).await?);

        let mut tasks = Vec::new();
        for index in 0..24 {
            let store = Arc::clone(&store);
            let community = if index % 2 == 0 { "7" } else { "8" };
            tasks.push(tokio::spawn(async move {
                store.update(allow_in(community, format!("role-{index}"))).await
            }));
        }
        for task in tasks {
            task.await??;
        }

        let reopened = ConfigStore::open(&path).await?;
        let document = reopened.read()?;
        let count = |community: &str| {
            document
                .community(community)
                .map_or(0, |config| config.allowed_roles().len())
        };
        let (seven, eight) = (count("7"), count("8"));
        assert_eq!(seven, 13);
        assert_eq!(eight, 12);
        Ok(())
    }

    #[tokio::test]
    async fn persist_failure_keeps_committed_state() -> Result<()> {
        let dir = TempDir::new()?;
        let nested = dir.path().join("nested");
        fs::create_dir(&nested)?;
        let path = nested.join("config.json");
        fs::write(&path, COMPACT_DOCUMENT)?;
        let store = ConfigStore::open(&path).await?;

        fs::remove_dir_all(&nested)?;
        let result = store.update(allow_in("7", "pilot".to_string())).await;
        assert!(matches!(
            result,
            Err(UpdateError::Store(ConfigError::PersistFailed { .. }))
        ));

        let document = store.read()?;
        assert!(
            document
                .community("7")
                .is_some_and(|config| !config.is_allowed("pilot"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn reload_publishes_hand_edits() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_compact(&dir)?;
        let store = ConfigStore::open(&path).await?;

        fs::write(
            &path,
            r#"{"connectionSecret":"secret","overlords":["1","2"],"communities":{}}"#,
        )?;
        let reloaded = store.reload().await?;
        assert!(reloaded.is_overlord("2"));
        assert!(store.read()?.communities.is_empty());

        fs::write(&path, "broken")?;
        assert!(store.reload().await.is_err());
        assert!(store.read()?.is_overlord("2"));
        Ok(())
    }

    #[tokio::test]
    async fn commit_completes_when_caller_stops_waiting() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_compact(&dir)?;
        let store = ConfigStore::open(&path).await?;

        {
            let abandoned = store.update(allow_in("7", "pilot".to_string()));
            tokio::pin!(abandoned);
            tokio::select! {
                biased;
                _ = &mut abandoned => {}
                () = std::future::ready(()) => {}
            }
        }

        store.update(allow_in("7", "medic".to_string())).await?;

        let expected = ["scout", "pilot", "medic"];
        assert_eq!(
            store
                .read()?
                .community("7")
                .map(|config| config.allowed_roles().to_vec()),
            Some(expected.map(str::to_string).to_vec())
        );
        let reopened = ConfigStore::open(&path).await?;
        assert_eq!(*reopened.read()?, *store.read()?);
        Ok(())
    }

    #[test]
    fn update_error_exposes_store_source_only() {
        let store = UpdateError::<String>::Store(ConfigError::StatePoisoned);
        assert_eq!(store.to_string(), "configuration update failed");
        assert!(std::error::Error::source(&store).is_some());

        let rejected = UpdateError::Rejected("scout".to_string());
        assert_eq!(rejected.to_string(), "configuration update rejected");
        assert!(std::error::Error::source(&rejected).is_none());
    }

    #[tokio::test]
    async fn no_temp_files_remain_after_commit() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write_compact(&dir)?;
        let store = ConfigStore::open(&path).await?;
        store.update(allow_in("7", "pilot".to_string())).await?;

        let leftovers = fs::read_dir(dir.path())?
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(TEMP_FILE_SUFFIX))
            .count();
        assert_eq!(leftovers, 0);
        Ok(())
    }
}
