use std::sync::{Arc, RwLock};

use epiccrm_core::StoreError;

use crate::session::TokenPair;

/// Local storage for the caller's current session pair.
///
/// The backing medium (file, OS credential vault, memory) is up to the
/// implementation.
pub trait TokenStore: Send + Sync {
    fn save(&self, pair: &TokenPair) -> Result<(), StoreError>;
    fn load_access(&self) -> Result<Option<String>, StoreError>;
    fn load_refresh(&self) -> Result<Option<String>, StoreError>;
    /// Forget both tokens. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), StoreError>;
}

impl<S> TokenStore for Arc<S>
where
    S: TokenStore + ?Sized,
{
    fn save(&self, pair: &TokenPair) -> Result<(), StoreError> {
        (**self).save(pair)
    }

    fn load_access(&self) -> Result<Option<String>, StoreError> {
        (**self).load_access()
    }

    fn load_refresh(&self) -> Result<Option<String>, StoreError> {
        (**self).load_refresh()
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

/// In-memory token store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    inner: RwLock<Option<TokenPair>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(pair: TokenPair) -> Self {
        Self {
            inner: RwLock::new(Some(pair)),
        }
    }
}

fn poisoned() -> StoreError {
    StoreError::new("token store lock poisoned")
}

impl TokenStore for InMemoryTokenStore {
    fn save(&self, pair: &TokenPair) -> Result<(), StoreError> {
        let mut slot = self.inner.write().map_err(|_| poisoned())?;
        *slot = Some(pair.clone());
        Ok(())
    }

    fn load_access(&self) -> Result<Option<String>, StoreError> {
        let slot = self.inner.read().map_err(|_| poisoned())?;
        Ok(slot.as_ref().map(|p| p.access_token.clone()))
    }

    fn load_refresh(&self) -> Result<Option<String>, StoreError> {
        let slot = self.inner.read().map_err(|_| poisoned())?;
        Ok(slot.as_ref().map(|p| p.refresh_token.clone()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut slot = self.inner.write().map_err(|_| poisoned())?;
        *slot = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_clear() {
        let store = InMemoryTokenStore::new();
        assert_eq!(store.load_access().unwrap(), None);

        store
            .save(&TokenPair {
                access_token: "a".into(),
                refresh_token: "r".into(),
            })
            .unwrap();
        assert_eq!(store.load_access().unwrap().as_deref(), Some("a"));
        assert_eq!(store.load_refresh().unwrap().as_deref(), Some("r"));

        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load_refresh().unwrap(), None);
    }
}
