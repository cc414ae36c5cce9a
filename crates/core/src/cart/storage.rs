//! Persistence seam for the cart snapshot.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

/// Where a cart snapshot is kept between requests.
///
/// Implementations hold a single string slot. Reads never fail: a medium
/// that cannot be read is indistinguishable from an empty one. Writes may
/// fail (quota, disabled storage) and report why.
pub trait CartStorage {
    /// The raw stored snapshot, if any.
    fn read(&self) -> Option<String>;

    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the medium rejected the write. The previous
    /// snapshot is left in place.
    fn write(&mut self, snapshot: &str) -> Result<(), StorageError>;
}

/// Reasons a snapshot write can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The encoded snapshot is larger than the medium accepts.
    #[error("cart snapshot is {size} bytes, storage limit is {limit}")]
    QuotaExceeded { size: usize, limit: usize },

    /// The snapshot could not be serialized.
    #[error("failed to encode cart snapshot: {0}")]
    Encode(String),

    /// The medium refused the write for another reason.
    #[error("cart storage unavailable: {0}")]
    Unavailable(String),
}

/// In-memory storage.
///
/// Clones share the same slot, which makes it a stand-in for one browser
/// profile's cookie jar seen from several tabs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
    limit: Option<usize>,
}

impl MemoryStorage {
    /// Empty storage with no size limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty storage that rejects snapshots longer than `limit` bytes.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            slot: Arc::default(),
            limit: Some(limit),
        }
    }

    /// Storage pre-seeded with a raw value, valid or not.
    #[must_use]
    pub fn seeded(raw: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(raw.into()))),
            limit: None,
        }
    }

    /// Drop the stored value, as an expired cookie would.
    pub fn wipe(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl CartStorage for MemoryStorage {
    fn read(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write(&mut self, snapshot: &str) -> Result<(), StorageError> {
        if let Some(limit) = self.limit
            && snapshot.len() > limit
        {
            return Err(StorageError::QuotaExceeded {
                size: snapshot.len(),
                limit,
            });
        }

        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.to_owned());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_slot() {
        let mut a = MemoryStorage::new();
        let b = a.clone();

        assert!(a.write("[]").is_ok());
        assert_eq!(b.read().as_deref(), Some("[]"));

        b.wipe();
        assert_eq!(a.read(), None);
    }

    #[test]
    fn test_limit_rejects_and_keeps_previous_value() {
        let mut storage = MemoryStorage::with_limit(4);

        assert!(storage.write("[]").is_ok());
        let err = storage.write("[1,2,3]");

        assert_eq!(
            err,
            Err(StorageError::QuotaExceeded { size: 7, limit: 4 })
        );
        assert_eq!(storage.read().as_deref(), Some("[]"));
    }
}
