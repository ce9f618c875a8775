//! File-backed [`TokenStore`]: one JSON document holding the current pair.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use epiccrm_auth::{TokenPair, TokenStore};
use epiccrm_core::StoreError;

use crate::fs_util::write_atomic;

#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<TokenPair>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::new(format!(
                    "failed to read token file {}: {e}",
                    self.path.display()
                )));
            }
        };

        // A corrupt token file is treated as no session.
        match serde_json::from_str(&raw) {
            Ok(pair) => Ok(Some(pair)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "ignoring unreadable token file"
                );
                Ok(None)
            }
        }
    }
}

impl TokenStore for FileTokenStore {
    fn save(&self, pair: &TokenPair) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(pair)
            .map_err(|e| StoreError::new(format!("failed to serialize tokens: {e}")))?;
        write_atomic(&self.path, &json).map_err(|e| StoreError::new(format!("{e:#}")))?;
        tracing::debug!(path = %self.path.display(), "tokens saved");
        Ok(())
    }

    fn load_access(&self) -> Result<Option<String>, StoreError> {
        Ok(self.read()?.map(|p| p.access_token).filter(|t| !t.is_empty()))
    }

    fn load_refresh(&self) -> Result<Option<String>, StoreError> {
        Ok(self.read()?.map(|p| p.refresh_token).filter(|t| !t.is_empty()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::new(format!(
                "failed to remove token file {}: {e}",
                self.path.display()
            ))),
        }
    }
}
