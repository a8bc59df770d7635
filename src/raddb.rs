// src/raddb.rs

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum RadDbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Decryption error: {0}")]
    Decryption(String),
    #[error("Encryption error: {0}")]
    Encryption(String),
    #[error("Store lock poisoned")]
    Poisoned,
}

/// 256-bit master key.
pub type MasterKey = [u8; 32];

/// A single mutation inside a [`WriteBatch`].
#[derive(Debug, Clone)]
pub enum WriteOp {
    Put(String, Vec<u8>),
    Delete(String),
}

/// Set of mutations applied under one lock and persisted with one flush.
#[derive(Debug, Default, Clone)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: Vec<u8>) -> &mut Self {
        self.ops.push(WriteOp::Put(key.into(), value));
        self
    }

    pub fn delete(&mut self, key: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Delete(key.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// RadDB: encrypted embedded key/value store.
///
/// The whole map lives in memory and is written back to disk as a single
/// AES-256-GCM sealed blob (`nonce || ciphertext`) after every mutation.
/// A store opened with [`RadDB::in_memory`] never touches the filesystem.
pub struct RadDB {
    path: Option<PathBuf>,
    cipher: Aes256Gcm,
    cache: RwLock<HashMap<String, Vec<u8>>>,
}

impl RadDB {
    /// Open the store at `path` with the master key. A missing file is an empty store.
    pub fn open<P: AsRef<Path>>(path: P, key: &MasterKey) -> Result<Self, RadDbError> {
        let db = Self {
            path: Some(path.as_ref().to_path_buf()),
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
            cache: RwLock::new(HashMap::new()),
        };
        db.load()?;
        Ok(db)
    }

    /// Volatile store, used by tests and `--ephemeral` runs.
    pub fn in_memory() -> Self {
        let key = Self::generate_key();
        Self {
            path: None,
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Generate a fresh master key (it has to be kept somewhere safe).
    pub fn generate_key() -> MasterKey {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        key
    }

    fn read_cache(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Vec<u8>>>, RadDbError> {
        self.cache.read().map_err(|_| RadDbError::Poisoned)
    }

    fn write_cache(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Vec<u8>>>, RadDbError> {
        self.cache.write().map_err(|_| RadDbError::Poisoned)
    }

    fn load(&self) -> Result<(), RadDbError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }

        let mut file = OpenOptions::new().read(true).open(path)?;
        let mut encrypted = Vec::new();
        file.read_to_end(&mut encrypted)?;

        if encrypted.is_empty() {
            return Ok(());
        }
        if encrypted.len() < NONCE_LEN {
            return Err(RadDbError::Decryption("File too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_LEN);
        let payload = Payload {
            msg: ciphertext,
            aad: &[],
        };

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), payload)
            .map_err(|_| RadDbError::Decryption("AES-GCM decryption failed".to_string()))?;

        let data: HashMap<String, Vec<u8>> = bincode::deserialize(&plaintext)
            .map_err(|e| RadDbError::Serialization(e.to_string()))?;

        *self.write_cache()? = data;
        Ok(())
    }

    fn persist(&self, cache: &HashMap<String, Vec<u8>>) -> Result<(), RadDbError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let plaintext =
            bincode::serialize(cache).map_err(|e| RadDbError::Serialization(e.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let payload = Payload {
            msg: &plaintext,
            aad: &[],
        };
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), payload)
            .map_err(|_| RadDbError::Encryption("AES-GCM encryption failed".to_string()))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Write next to the target and rename so a crash never leaves a torn file.
        let tmp = path.with_extension("tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp)?;
            file.write_all(&nonce_bytes)?;
            file.write_all(&ciphertext)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Write the current contents to disk.
    pub fn flush(&self) -> Result<(), RadDbError> {
        let cache = self.read_cache()?;
        self.persist(&cache)
    }

    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RadDbError> {
        Ok(self.read_cache()?.get(key).cloned())
    }

    pub fn contains_key(&self, key: &str) -> Result<bool, RadDbError> {
        Ok(self.read_cache()?.contains_key(key))
    }

    /// All entries whose key starts with `prefix`, sorted by key.
    pub fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, RadDbError> {
        let cache = self.read_cache()?;
        let mut entries: Vec<(String, Vec<u8>)> = cache
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    pub fn set(&self, key: String, value: Vec<u8>) -> Result<(), RadDbError> {
        let mut batch = WriteBatch::new();
        batch.put(key, value);
        self.apply(batch)
    }

    /// Apply every operation of the batch, then flush once.
    ///
    /// Readers never observe a partially applied batch. If the flush fails the
    /// in-memory state is rolled back to what it was before the batch.
    pub fn apply(&self, batch: WriteBatch) -> Result<(), RadDbError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut cache = self.write_cache()?;
        let mut undo: Vec<(String, Option<Vec<u8>>)> = Vec::with_capacity(batch.len());

        for op in batch.ops {
            match op {
                WriteOp::Put(key, value) => {
                    let old = cache.insert(key.clone(), value);
                    undo.push((key, old));
                }
                WriteOp::Delete(key) => {
                    let old = cache.remove(&key);
                    undo.push((key, old));
                }
            }
        }

        if let Err(e) = self.persist(&cache) {
            for (key, old) in undo.into_iter().rev() {
                match old {
                    Some(value) => cache.insert(key, value),
                    None => cache.remove(&key),
                };
            }
            return Err(e);
        }
        Ok(())
    }

    /// Number of stored keys.
    pub fn len(&self) -> Result<usize, RadDbError> {
        Ok(self.read_cache()?.len())
    }
}

impl Drop for RadDB {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
