//! Key registry operations over the backing file.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::info;

use crate::{
    error::{RegistryError, RegistryResult},
    model::KeyRecord,
    store::KeyFile,
};

/// List, create, update and delete key records.
///
/// Each operation loads the file, applies its change and saves it while
/// holding `write_lock`, so concurrent requests cannot lose each other's
/// updates. The lock is never held across an `.await`.
#[derive(Debug)]
pub struct KeyRegistry {
    file: KeyFile,
    write_lock: Mutex<()>,
}

impl KeyRegistry {
    pub fn new(file: KeyFile) -> Self {
        Self {
            file,
            write_lock: Mutex::new(()),
        }
    }

    pub fn file(&self) -> &KeyFile {
        &self.file
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        // The guarded data is `()`, so a poisoned lock carries no broken state.
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All records in insertion order.
    pub fn list(&self) -> RegistryResult<Vec<KeyRecord>> {
        let _guard = self.lock();
        Ok(self.file.load()?)
    }

    /// Append `record` unless its key string is already registered.
    pub fn create(&self, record: KeyRecord) -> RegistryResult<KeyRecord> {
        let _guard = self.lock();
        let mut records = self.file.load()?;
        if records.iter().any(|k| k.key_string == record.key_string) {
            return Err(RegistryError::Conflict(record.key_string));
        }

        records.push(record.clone());
        self.file.save(&records)?;
        info!(
            "Key added: {} (expires: {})",
            record.key_string, record.expiration_date
        );
        Ok(record)
    }

    /// Replace the expiration date of `key_string`, keeping its position.
    pub fn update_expiration(
        &self,
        key_string: &str,
        expiration_date: String,
    ) -> RegistryResult<KeyRecord> {
        let _guard = self.lock();
        let mut records = self.file.load()?;
        let Some(record) = records.iter_mut().find(|k| k.key_string == key_string) else {
            return Err(RegistryError::NotFound(key_string.to_string()));
        };

        record.expiration_date = expiration_date;
        let updated = record.clone();
        self.file.save(&records)?;
        info!(
            "Key updated: {} (new expiration: {})",
            updated.key_string, updated.expiration_date
        );
        Ok(updated)
    }

    /// Remove `key_string`. Remaining records keep their relative order.
    pub fn delete(&self, key_string: &str) -> RegistryResult<()> {
        let _guard = self.lock();
        let mut records = self.file.load()?;
        let before = records.len();
        records.retain(|k| k.key_string != key_string);
        if records.len() == before {
            return Err(RegistryError::NotFound(key_string.to_string()));
        }

        self.file.save(&records)?;
        info!("Key deleted: {}", key_string);
        Ok(())
    }
}
