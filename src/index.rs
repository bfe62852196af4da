//! Tenant index management.
//!
//! Every tenant gets its own `Database` (document store + vector index). The
//! manager owns the tenant -> handle map and is the only structure shared
//! across tenants.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use sha2::{Digest, Sha256};

use crate::errors::Error;
use crate::sqlite::Database;

/// Maximum tenant id length in bytes.
pub const MAX_TENANT_ID_LENGTH: usize = 256;

/// Where tenant databases live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// Private in-memory database per tenant; gone when the manager is dropped.
    InMemory,
    /// One SQLite file per tenant inside this directory.
    Directory(PathBuf),
}

/// One tenant's index. The mutex is the tenant's write serialization point.
pub struct IndexHandle {
    db: Mutex<Database>,
}

impl IndexHandle {
    /// Lock the tenant database. Never hold the guard across an `.await`.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Database> {
        self.db.lock()
    }
}

/// Owns the mapping from tenant id to isolated index instance.
pub struct IndexManager {
    storage: Storage,
    dims: usize,
    loaded: DashMap<String, Arc<IndexHandle>>,
}

/// Validate a tenant id (non-blank, bounded, no control characters).
pub fn validate_tenant_id(tenant_id: &str) -> Result<(), Error> {
    if tenant_id.trim().is_empty() {
        return Err(Error::invalid("tenant id cannot be empty"));
    }
    if tenant_id.len() > MAX_TENANT_ID_LENGTH {
        return Err(Error::invalid(format!(
            "tenant id exceeds {MAX_TENANT_ID_LENGTH} bytes"
        )));
    }
    if tenant_id.chars().any(char::is_control) {
        return Err(Error::invalid("tenant id contains control characters"));
    }
    Ok(())
}

impl IndexManager {
    /// Create a manager whose indexes store `dims`-dimensional vectors.
    pub fn new(storage: Storage, dims: usize) -> Self {
        Self {
            storage,
            dims,
            loaded: DashMap::new(),
        }
    }

    /// Vector dimensionality every index in this manager uses.
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Get the tenant's index, creating its storage on first use.
    ///
    /// The database is opened without holding any map lock, so a slow open
    /// never stalls other tenants. When concurrent first calls race, the
    /// first handle inserted wins and every caller gets that one.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a malformed tenant id; storage errors if the
    /// database cannot be created.
    pub fn get_or_create(&self, tenant_id: &str) -> Result<Arc<IndexHandle>, Error> {
        validate_tenant_id(tenant_id)?;

        if let Some(handle) = self.loaded.get(tenant_id) {
            return Ok(Arc::clone(handle.value()));
        }

        let opened = self.open(tenant_id)?;
        let handle = self
            .loaded
            .entry(tenant_id.to_string())
            .or_insert(opened);
        Ok(Arc::clone(handle.value()))
    }

    /// Get the tenant's index without creating storage.
    ///
    /// With directory storage an index written by an earlier process is
    /// opened lazily. Returns None if the tenant has no index.
    pub fn get(&self, tenant_id: &str) -> Result<Option<Arc<IndexHandle>>, Error> {
        validate_tenant_id(tenant_id)?;

        if let Some(handle) = self.loaded.get(tenant_id) {
            return Ok(Some(Arc::clone(handle.value())));
        }

        match &self.storage {
            Storage::InMemory => Ok(None),
            Storage::Directory(dir) => {
                if dir.join(index_file_name(tenant_id)).exists() {
                    self.get_or_create(tenant_id).map(Some)
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Ids of the tenant indexes loaded in this process.
    pub fn tenants(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.loaded.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    fn open(&self, tenant_id: &str) -> Result<Arc<IndexHandle>, Error> {
        let db = match &self.storage {
            Storage::InMemory => Database::open_in_memory(self.dims)?,
            Storage::Directory(dir) => {
                std::fs::create_dir_all(dir)?;
                Database::open(&dir.join(index_file_name(tenant_id)), self.dims)?
            }
        };
        tracing::info!(tenant = tenant_id, "tenant index opened");

        Ok(Arc::new(IndexHandle { db: Mutex::new(db) }))
    }
}

/// File name for a tenant's database. Hashing keeps arbitrary ids path-safe.
fn index_file_name(tenant_id: &str) -> String {
    format!("{:x}.db", Sha256::digest(tenant_id.as_bytes()))
}
