use async_trait::async_trait;
use dalepata_store::{keys, DeviceStorage, StoreError};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use tracing::warn;

use crate::{Error, Result};

/// IDs of adoption requests whose notification the user has seen
pub type ReadIds = BTreeSet<i64>;

/// Durable set of read notification IDs, kept on this device only
///
/// Never synced with the backend: a new device or a reinstall starts with
/// everything unread.
#[async_trait]
pub trait ReadStateStore: Send + Sync {
    /// Current set. An absent or undecodable value is the empty set.
    async fn get(&self) -> Result<ReadIds>;

    /// Overwrite the whole set
    async fn set(&self, ids: &ReadIds) -> Result<()>;

    /// Add one ID. Adding an ID that is already there changes nothing.
    async fn add(&self, id: i64) -> Result<()>;

    /// Union `ids` into the set. Nothing is written when all of them are
    /// already there.
    ///
    /// The default goes through `get` and `set`; stores that can do it in
    /// one step override it.
    async fn add_all(&self, ids: &[i64]) -> Result<()> {
        let mut current = self.get().await?;
        let before = current.len();
        current.extend(ids.iter().copied());

        if current.len() != before {
            self.set(&current).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()>;
}

/// Read-state kept in device storage under `dalepata-read-notifications`
pub struct DeviceReadStateStore {
    storage: Arc<DeviceStorage>,
}

impl DeviceReadStateStore {
    pub fn new(storage: Arc<DeviceStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ReadStateStore for DeviceReadStateStore {
    async fn get(&self) -> Result<ReadIds> {
        match self.storage.get_json::<ReadIds>(keys::READ_NOTIFICATIONS) {
            Ok(ids) => Ok(ids.unwrap_or_default()),
            Err(e @ StoreError::Corrupt { .. }) => {
                warn!("Ignoring read markers: {}", e);
                Ok(ReadIds::new())
            }
            Err(e) => Err(Error::StoreReadError(e.to_string())),
        }
    }

    async fn set(&self, ids: &ReadIds) -> Result<()> {
        self.storage
            .set_json(keys::READ_NOTIFICATIONS, ids)
            .map_err(|e| Error::StoreWriteError(e.to_string()))
    }

    async fn add(&self, id: i64) -> Result<()> {
        // One transaction, so concurrent adds from other handles can't clobber each other
        self.storage
            .update_json_or_default(keys::READ_NOTIFICATIONS, |ids: &mut ReadIds| ids.insert(id))
            .map(|_| ())
            .map_err(|e| Error::StoreWriteError(e.to_string()))
    }

    async fn add_all(&self, ids: &[i64]) -> Result<()> {
        self.storage
            .update_json_or_default(keys::READ_NOTIFICATIONS, |set: &mut ReadIds| {
                let before = set.len();
                set.extend(ids.iter().copied());
                set.len() != before
            })
            .map(|_| ())
            .map_err(|e| Error::StoreWriteError(e.to_string()))
    }

    async fn clear(&self) -> Result<()> {
        self.storage
            .remove_item(keys::READ_NOTIFICATIONS)
            .map_err(|e| Error::StoreWriteError(e.to_string()))
    }
}

/// In-process read-state. Gone when the process exits.
#[derive(Debug, Default)]
pub struct MemoryReadStateStore {
    ids: Mutex<ReadIds>,
}

impl MemoryReadStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            ids: Mutex::new(ids.into_iter().collect()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ReadIds>> {
        self.ids
            .lock()
            .map_err(|_| Error::StoreReadError("read-state lock poisoned".into()))
    }
}

#[async_trait]
impl ReadStateStore for MemoryReadStateStore {
    async fn get(&self) -> Result<ReadIds> {
        Ok(self.lock()?.clone())
    }

    async fn set(&self, ids: &ReadIds) -> Result<()> {
        *self.lock()? = ids.clone();
        Ok(())
    }

    async fn add(&self, id: i64) -> Result<()> {
        self.lock()?.insert(id);
        Ok(())
    }

    async fn add_all(&self, ids: &[i64]) -> Result<()> {
        self.lock()?.extend(ids.iter().copied());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_store() -> (Arc<DeviceStorage>, DeviceReadStateStore) {
        let storage = Arc::new(DeviceStorage::open_in_memory().unwrap());
        let store = DeviceReadStateStore::new(storage.clone());
        (storage, store)
    }

    #[tokio::test]
    async fn test_device_store_starts_empty() {
        let (_, store) = device_store();
        assert!(store.get().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_device_store_add_is_idempotent() {
        let (storage, store) = device_store();

        store.add(123).await.unwrap();
        store.add(456).await.unwrap();
        store.add(123).await.unwrap();

        assert_eq!(store.get().await.unwrap(), ReadIds::from([123, 456]));

        // Stored as a plain JSON array, same shape the mobile app wrote
        let raw = storage.get_item(keys::READ_NOTIFICATIONS).unwrap().unwrap();
        assert_eq!(raw, "[123,456]");
    }

    #[tokio::test]
    async fn test_device_store_reads_legacy_arrays_with_duplicates() {
        let (storage, store) = device_store();
        storage.set_item(keys::READ_NOTIFICATIONS, "[5,2,5]").unwrap();

        assert_eq!(store.get().await.unwrap(), ReadIds::from([2, 5]));
    }

    #[tokio::test]
    async fn test_device_store_set_and_clear() {
        let (_, store) = device_store();

        store.set(&ReadIds::from([1, 2, 3])).await.unwrap();
        assert_eq!(store.get().await.unwrap().len(), 3);

        store.clear().await.unwrap();
        assert!(store.get().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_device_store_corrupt_value_reads_as_empty() {
        let (storage, store) = device_store();
        storage.set_item(keys::READ_NOTIFICATIONS, "{oops").unwrap();

        assert!(store.get().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_device_store_add_repairs_corrupt_value() {
        let (storage, store) = device_store();
        storage.set_item(keys::READ_NOTIFICATIONS, "{oops").unwrap();

        store.add(1).await.unwrap();

        assert_eq!(store.get().await.unwrap(), ReadIds::from([1]));
        let raw = storage.get_item(keys::READ_NOTIFICATIONS).unwrap().unwrap();
        assert_eq!(raw, "[1]");
    }

    #[tokio::test]
    async fn test_device_store_add_all_repairs_corrupt_value() {
        let (storage, store) = device_store();
        storage.set_item(keys::READ_NOTIFICATIONS, "[1, \"dos\"]").unwrap();

        store.add_all(&[3, 4]).await.unwrap();

        assert_eq!(store.get().await.unwrap(), ReadIds::from([3, 4]));
    }

    #[tokio::test]
    async fn test_device_store_add_all_unions() {
        let (storage, store) = device_store();
        store.add(9).await.unwrap();

        store.add_all(&[1, 9, 2]).await.unwrap();
        assert_eq!(store.get().await.unwrap(), ReadIds::from([1, 2, 9]));

        store.add_all(&[]).await.unwrap();
        let raw = storage.get_item(keys::READ_NOTIFICATIONS).unwrap().unwrap();
        assert_eq!(raw, "[1,2,9]");
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryReadStateStore::with_ids([4]);
        store.add(4).await.unwrap();
        store.add(8).await.unwrap();
        store.add_all(&[8, 15]).await.unwrap();
        assert_eq!(store.get().await.unwrap(), ReadIds::from([4, 8, 15]));

        store.clear().await.unwrap();
        assert!(store.get().await.unwrap().is_empty());
    }
}
