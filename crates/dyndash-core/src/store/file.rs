// # File Binding Store
//
// File-based implementation of BindingStore with crash recovery.
//
// ## File Format
//
// A plain JSON object keyed by provider record id:
//
// ```json
// {
//   "911xxx": {
//     "domain": "example.com",
//     "rr": "home",
//     "interface": "eth0",
//     "ip_mode": "interface_ip",
//     "last_ip": "1.2.3.4",
//     "update_time": "2025-01-09T12:00:00Z"
//   }
// }
// ```
//
// ## Crash Recovery
//
// - Atomic writes: new state goes to a temporary file, then rename
// - Automatic backup: last known good state kept in a `.backup` file
// - Corruption detection: JSON validated on load, backup used as fallback

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::binding_store::{Binding, BindingStore};

/// File-based binding store with crash recovery
///
/// Every mutation is written through to disk immediately: a crash between
/// reconciliation ticks never loses more than the current update. Writes go
/// to a temp file first and are renamed into place, with the previous file
/// kept as `.backup`.
#[derive(Debug)]
pub struct FileBindingStore {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

/// Internal state for the file-based store
#[derive(Debug)]
struct FileState {
    bindings: HashMap<String, Binding>,
    dirty: bool,
}

impl FileBindingStore {
    /// Create or load a file binding store
    ///
    /// Loads the existing file if present, falling back to the backup on
    /// corruption and to an empty map when both are unreadable. Parent
    /// directories are created as needed.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::store(format!(
                        "failed to create binding store directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let bindings = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(FileState {
                bindings,
                dirty: false,
            })),
        })
    }

    /// Load bindings from file with automatic backup recovery
    async fn load_with_recovery(path: &Path) -> Result<HashMap<String, Binding>, Error> {
        match Self::load(path).await {
            Ok(bindings) => {
                tracing::debug!("loaded {} binding(s) from {}", bindings.len(), path.display());
                Ok(bindings)
            }
            Err(Error::Json(e)) => {
                tracing::warn!(
                    "binding store {} appears corrupted: {}. attempting backup recovery",
                    path.display(),
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("no backup file found, starting with empty binding store");
                    return Ok(HashMap::new());
                }

                match Self::load(&backup_path).await {
                    Ok(bindings) => {
                        tracing::info!("recovered {} binding(s) from backup", bindings.len());
                        if let Err(restore_err) = fs::copy(&backup_path, path).await {
                            tracing::error!(
                                "failed to restore binding store from backup: {}",
                                restore_err
                            );
                        }
                        Ok(bindings)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "backup also unreadable: {}. starting with empty binding store",
                            backup_err
                        );
                        Ok(HashMap::new())
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Load bindings from a file
    async fn load(path: &Path) -> Result<HashMap<String, Binding>, Error> {
        if !path.exists() {
            tracing::debug!("binding store file does not exist: {}", path.display());
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::store(format!("failed to read {}: {}", path.display(), e))
        })?;

        let bindings: HashMap<String, Binding> = serde_json::from_str(&content)?;
        Ok(bindings)
    }

    /// Write the current bindings to disk atomically
    async fn write_state(&self) -> Result<(), Error> {
        let state_guard = self.state.read().await;
        let json = serde_json::to_string_pretty(&state_guard.bindings)?;
        drop(state_guard);

        // Write to a temporary file first
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!(
                    "failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::store(format!(
                    "failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::store(format!(
                    "failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Keep the previous file as backup (if it exists)
        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("failed to create binding store backup: {}", e);
            }
        }

        // Atomic rename (temp -> actual)
        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        {
            let mut state_guard = self.state.write().await;
            state_guard.dirty = false;
        }

        tracing::trace!("binding store written to {}", self.path.display());
        Ok(())
    }

    /// Path to the temporary file used for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    /// Path to the backup file
    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl BindingStore for FileBindingStore {
    async fn get(&self, record_id: &str) -> Result<Option<Binding>, Error> {
        let state_guard = self.state.read().await;
        Ok(state_guard.bindings.get(record_id).cloned())
    }

    async fn upsert(&self, record_id: &str, binding: &Binding) -> Result<(), Error> {
        {
            let mut state_guard = self.state.write().await;
            state_guard
                .bindings
                .insert(record_id.to_string(), binding.clone());
            state_guard.dirty = true;
        }

        // Immediate write for durability
        self.write_state().await
    }

    async fn remove(&self, record_id: &str) -> Result<(), Error> {
        {
            let mut state_guard = self.state.write().await;
            state_guard.bindings.remove(record_id);
            state_guard.dirty = true;
        }

        self.write_state().await
    }

    async fn all(&self) -> Result<Vec<(String, Binding)>, Error> {
        let state_guard = self.state.read().await;
        Ok(state_guard
            .bindings
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn mark_updated(&self, record_id: &str, ip: Ipv4Addr) -> Result<(), Error> {
        {
            let mut state_guard = self.state.write().await;
            match state_guard.bindings.get_mut(record_id) {
                Some(binding) => {
                    binding.last_ip = Some(ip);
                    binding.update_time = Some(chrono::Utc::now());
                    state_guard.dirty = true;
                }
                // Binding removed since the tick started; the deletion wins.
                None => return Ok(()),
            }
        }

        self.write_state().await
    }

    async fn flush(&self) -> Result<(), Error> {
        let state_guard = self.state.read().await;
        if state_guard.dirty {
            drop(state_guard);
            self.write_state().await
        } else {
            Ok(())
        }
    }
}
