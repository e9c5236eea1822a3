use std::cell::RefCell;

use tracing::debug;

use crate::{
    models::store::Store,
    storage::{Storage, StorageError},
    transfer::{export_data, import_data},
};

/// Holds the store as an export document. Every save re-encodes the whole
/// store; every load decodes and validates it again.
pub struct DocumentStorage {
    document: RefCell<Vec<u8>>,
}

impl DocumentStorage {
    pub fn new(document: Vec<u8>) -> Self {
        Self {
            document: RefCell::new(document),
        }
    }

    pub fn document(&self) -> Vec<u8> {
        self.document.borrow().clone()
    }

    pub fn into_document(self) -> Vec<u8> {
        self.document.into_inner()
    }
}

impl Storage for DocumentStorage {
    fn load(&self) -> Result<Store, StorageError> {
        let document = self.document.borrow();
        // Nothing saved yet
        if document.iter().all(u8::is_ascii_whitespace) {
            return Ok(Store::default());
        }

        let imported = import_data(&document).map_err(|source| StorageError::LoadFailed { source })?;
        debug!(
            projects = imported.projects.len(),
            activities = imported.activities.len(),
            "loaded store from export document"
        );

        Ok(Store {
            projects: imported.projects,
            activities: imported.activities,
        })
    }

    fn save(&self, store: &Store) -> Result<(), StorageError> {
        let encoded = export_data(&store.projects, &store.activities)
            .map_err(|source| StorageError::SaveFailed { source })?;
        *self.document.borrow_mut() = encoded;
        Ok(())
    }
}
