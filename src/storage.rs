//! Open-tab persistence
//!
//! Every open tab is one `<id>.json` file under `<state-root>/open-tabs`.
//! [`StateStore`] does the synchronous file work and never lets an I/O or
//! parse failure escape: problems are logged and the call becomes a no-op.
//! [`StorageActor`] runs the store off the async threads and applies
//! commands in the order they were sent.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};

use crate::constants::OPEN_TABS_DIR;
use crate::models::RequestData;

/// Manages the per-tab state files
#[derive(Clone, Debug)]
pub struct StateStore {
    tabs_dir: PathBuf,
}

impl StateStore {
    /// Open the store rooted at `state_root`, creating `open-tabs/` if needed
    pub fn new(state_root: impl AsRef<Path>) -> Self {
        let store = StateStore {
            tabs_dir: state_root.as_ref().join(OPEN_TABS_DIR),
        };
        if let Err(e) = store.ensure_dir() {
            tracing::warn!(dir = %store.tabs_dir.display(), error = %e, "Could not create state directory");
        }
        store
    }

    pub fn tabs_dir(&self) -> &Path {
        &self.tabs_dir
    }

    /// Path of the file backing the given tab id
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.tabs_dir.join(format!("{}.json", id))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.tabs_dir.exists() {
            fs::create_dir_all(&self.tabs_dir)
                .with_context(|| format!("creating {}", self.tabs_dir.display()))?;
        }
        Ok(())
    }

    /// Write the tab's file, replacing any previous content.
    ///
    /// Tabs without an id are ignored.
    pub fn save(&self, data: &RequestData) {
        if data.id.is_empty() {
            return;
        }
        match self.try_save(data) {
            Ok(()) => tracing::debug!(id = %data.id, method = data.method.as_str(), "Saved tab"),
            Err(e) => tracing::warn!(id = %data.id, error = %format!("{:#}", e), "Failed to save tab"),
        }
    }

    fn try_save(&self, data: &RequestData) -> Result<()> {
        anyhow::ensure!(is_safe_id(&data.id), "tab id {:?} is not a safe file name", data.id);
        self.ensure_dir()?;
        let path = self.path_for(&data.id);
        let content = serde_json::to_string_pretty(data).context("serializing tab state")?;
        fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Remove the tab's file; missing files and empty ids are fine
    pub fn delete(&self, id: &str) {
        if id.is_empty() {
            return;
        }
        match self.try_delete(id) {
            Ok(true) => tracing::debug!(id, "Deleted tab"),
            Ok(false) => {}
            Err(e) => tracing::warn!(id, error = %format!("{:#}", e), "Failed to delete tab"),
        }
    }

    fn try_delete(&self, id: &str) -> Result<bool> {
        anyhow::ensure!(is_safe_id(id), "tab id {:?} is not a safe file name", id);
        let path = self.path_for(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
        }
    }

    /// Load every readable tab file. Unreadable or corrupt files are skipped.
    pub fn load_all(&self) -> Vec<RequestData> {
        match self.try_load_all() {
            Ok(tabs) => {
                tracing::info!(count = tabs.len(), "Loaded open tabs");
                tabs
            }
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "Failed to list open tabs");
                Vec::new()
            }
        }
    }

    fn try_load_all(&self) -> Result<Vec<RequestData>> {
        if !self.tabs_dir.exists() {
            return Ok(Vec::new());
        }

        let mut tabs = Vec::new();
        let entries = fs::read_dir(&self.tabs_dir)
            .with_context(|| format!("reading {}", self.tabs_dir.display()))?;

        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match load_file(&path) {
                Ok(data) => tabs.push(data),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %format!("{:#}", e), "Skipping corrupt tab file")
                }
            }
        }

        Ok(tabs)
    }
}

fn load_file(path: &Path) -> Result<RequestData> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut data: RequestData = serde_json::from_str(&content).context("parsing tab state")?;
    if data.id.is_empty() {
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            data.id = stem.to_string();
        }
    }
    Ok(data)
}

/// Ids become file names, so only a conservative alphabet is accepted
pub fn is_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

// ============================================================================
// Storage actor
// ============================================================================

/// Commands processed by the storage actor, in arrival order
#[derive(Debug)]
pub enum StorageCommand {
    Save(RequestData),
    Delete(String),
    /// Acknowledged once every earlier command has been applied
    Flush(oneshot::Sender<()>),
}

/// Background task owning the store
pub struct StorageActor {
    store: StateStore,
}

impl StorageActor {
    pub fn new(store: StateStore) -> Self {
        StorageActor { store }
    }

    /// Run the storage message loop until every handle is dropped
    pub async fn run(self, mut cmd_rx: mpsc::UnboundedReceiver<StorageCommand>) {
        while let Some(cmd) = cmd_rx.recv().await {
            let store = self.store.clone();
            let outcome = match cmd {
                StorageCommand::Save(data) => {
                    tokio::task::spawn_blocking(move || store.save(&data)).await
                }
                StorageCommand::Delete(id) => {
                    tokio::task::spawn_blocking(move || store.delete(&id)).await
                }
                StorageCommand::Flush(ack) => {
                    let _ = ack.send(());
                    Ok(())
                }
            };
            if let Err(e) = outcome {
                tracing::warn!(error = %e, "Storage task panicked");
            }
        }
    }
}

/// Cheap, cloneable sender side of the storage actor
#[derive(Clone, Debug)]
pub struct StorageHandle {
    cmd_tx: mpsc::UnboundedSender<StorageCommand>,
}

impl StorageHandle {
    /// Spawn a storage actor for `store` on the current runtime
    pub fn spawn(store: StateStore) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(StorageActor::new(store).run(cmd_rx));
        StorageHandle { cmd_tx }
    }

    /// Wrap an existing command channel, e.g. to run the actor elsewhere
    pub fn from_sender(cmd_tx: mpsc::UnboundedSender<StorageCommand>) -> Self {
        StorageHandle { cmd_tx }
    }

    pub fn save(&self, data: RequestData) {
        if self.cmd_tx.send(StorageCommand::Save(data)).is_err() {
            tracing::warn!("Storage actor stopped; save dropped");
        }
    }

    pub fn delete(&self, id: impl Into<String>) {
        if self.cmd_tx.send(StorageCommand::Delete(id.into())).is_err() {
            tracing::warn!("Storage actor stopped; delete dropped");
        }
    }

    /// Wait until everything sent before this call has hit the disk
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.cmd_tx.send(StorageCommand::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HttpMethod;
    use tempfile::tempdir;

    fn sample(id: &str) -> RequestData {
        let mut data = RequestData::with_id(id);
        data.method = HttpMethod::POST;
        data.url = "https://example.com/ünï?q=1".into();
        data.request_body = "{\n  \"name\": \"test\"\n}\t".into();
        data.response_body = Some("ok".into());
        data.response_headers = Some("content-type: text/plain".into());
        data.status = Some("200".into());
        data.time = Some("12 ms".into());
        data.size = Some("2 bytes".into());
        data
    }

    #[test]
    fn test_creates_directory_idempotently() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        assert!(store.tabs_dir().is_dir());
        let again = StateStore::new(dir.path());
        assert_eq!(again.tabs_dir(), store.tabs_dir());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let data = sample("tab-1");

        store.save(&data);
        let loaded = store.load_all();

        assert_eq!(loaded, vec![data]);
        assert!(store.path_for("tab-1").is_file());
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let mut data = sample("tab-1");
        store.save(&data);
        data.url = "http://localhost/changed".into();
        data.status = None;
        store.save(&data);

        let loaded = store.load_all();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].url, "http://localhost/changed");
        assert_eq!(loaded[0].status, None);
    }

    #[test]
    fn test_empty_and_unsafe_ids_are_ignored() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        store.save(&RequestData::default());
        store.save(&sample("../escape"));
        assert!(store.load_all().is_empty());
        assert!(!dir.path().join("escape.json").exists());
        store.delete("");
        store.delete("../escape");
    }

    #[test]
    fn test_delete_twice_is_noop() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        store.save(&sample("a"));
        store.save(&sample("b"));

        store.delete("a");
        store.delete("a");

        let ids: Vec<String> = store.load_all().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["b".to_string()]);
    }

    #[test]
    fn test_corrupt_files_are_skipped() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        store.save(&sample("good"));
        fs::write(store.path_for("bad"), "{ not json").unwrap();
        fs::write(store.tabs_dir().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(store.tabs_dir().join("nested.json")).unwrap();

        let loaded = store.load_all();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "good");
    }

    #[test]
    fn test_missing_id_falls_back_to_file_stem() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        fs::write(store.path_for("from-name"), r#"{"url":"http://x"}"#).unwrap();

        let loaded = store.load_all();
        assert_eq!(loaded[0].id, "from-name");
        assert_eq!(loaded[0].url, "http://x");
    }

    #[test]
    fn test_unwritable_root_does_not_panic() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        let store = StateStore::new(&blocker);
        store.save(&sample("x"));
        store.delete("x");
        assert!(store.load_all().is_empty());
    }

    #[tokio::test]
    async fn test_actor_applies_commands_in_order() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path());
        let handle = StorageHandle::spawn(store.clone());

        handle.save(sample("tab"));
        handle.delete("tab");
        handle.save(sample("kept"));
        handle.flush().await;

        let ids: Vec<String> = store.load_all().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["kept".to_string()]);
    }

    #[test]
    fn test_safe_ids() {
        assert!(is_safe_id("6f1c2c9e-8a7b-4c1d-9e2f-000000000000"));
        assert!(is_safe_id("tab_1"));
        assert!(!is_safe_id(""));
        assert!(!is_safe_id("a/b"));
        assert!(!is_safe_id("a.json"));
    }
}
