use std::cell::RefCell;

use thiserror::Error;

use crate::models::store::Store;
use crate::transfer::TransferError;

pub mod document;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to load store from export document: {source}")]
    LoadFailed {
        #[source]
        source: TransferError,
    },

    #[error("Failed to save store as export document: {source}")]
    SaveFailed {
        #[source]
        source: TransferError,
    },
}

pub trait Storage {
    fn load(&self) -> Result<Store, StorageError>;
    fn save(&self, store: &Store) -> Result<(), StorageError>;
}

/// Keeps the last saved store in process memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    store: RefCell<Store>,
}

impl MemoryStorage {
    pub fn new(store: Store) -> Self {
        Self {
            store: RefCell::new(store),
        }
    }

    /// Snapshot of what was last saved.
    pub fn snapshot(&self) -> Store {
        self.store.borrow().clone()
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Store, StorageError> {
        Ok(self.store.borrow().clone())
    }

    fn save(&self, store: &Store) -> Result<(), StorageError> {
        *self.store.borrow_mut() = store.clone();
        Ok(())
    }
}
