//! Raw capture-file storage.
//!
//! Transactions record a filename; the bytes behind it live here. The
//! orchestrator saves each retrieved artifact under its transaction's
//! filename, and the analysis pipeline loads them back for decoding.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use pnm_core::LedgerError;

/// Keyed byte store for retrieved capture files.
pub struct ArtifactStore {
    dir: Option<PathBuf>,
    memory: Mutex<HashMap<String, Vec<u8>>>,
}

impl ArtifactStore {
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            memory: Mutex::new(HashMap::new()),
        }
    }

    pub fn open(dir: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir: Some(dir),
            memory: Mutex::new(HashMap::new()),
        })
    }

    pub fn save(&self, filename: &str, bytes: &[u8]) -> Result<(), LedgerError> {
        match &self.dir {
            Some(dir) => {
                let tmp = dir.join(format!("{filename}.tmp"));
                fs::write(&tmp, bytes)?;
                fs::rename(&tmp, dir.join(filename))?;
            }
            None => {
                self.memory
                    .lock()
                    .insert(filename.to_string(), bytes.to_vec());
            }
        }
        Ok(())
    }

    pub fn load(&self, filename: &str) -> Result<Vec<u8>, LedgerError> {
        match &self.dir {
            Some(dir) => {
                let path = dir.join(filename);
                if !path.exists() {
                    return Err(LedgerError::NotFound(format!("artifact {filename}")));
                }
                Ok(fs::read(path)?)
            }
            None => self
                .memory
                .lock()
                .get(filename)
                .cloned()
                .ok_or_else(|| LedgerError::NotFound(format!("artifact {filename}"))),
        }
    }
}
