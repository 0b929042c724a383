use std::sync::Arc;

use shelf_db::Database;
use shelf_policy::PolicyTable;
use shelf_store::{BlobStore, FsBlobStore, InMemoryBlobStore};

use crate::config::LibraryConfig;
use crate::error::LibraryResult;

/// The catalog: one database, one cover store, one policy table.
///
/// Every gated operation takes the caller's identity as an explicit
/// `Option<&Principal>` and asks the policy table before touching state.
/// Operations are synchronous; mutating ones take `&mut self` and run in a
/// single database transaction.
pub struct Library {
    pub(crate) db: Database,
    pub(crate) blobs: Arc<dyn BlobStore>,
    pub(crate) policy: PolicyTable,
    pub(crate) config: LibraryConfig,
}

impl Library {
    /// Open the database and cover directory named by `config`.
    pub fn open(config: LibraryConfig) -> LibraryResult<Self> {
        let db = Database::open(&config.database)?;
        let blobs = FsBlobStore::open(&config.covers_dir)?;
        tracing::info!(
            database = %config.database.display(),
            covers = %config.covers_dir.display(),
            "library opened"
        );
        Ok(Self::from_parts(db, Arc::new(blobs), PolicyTable::standard(), config))
    }

    /// A throwaway library held entirely in memory.
    pub fn in_memory() -> LibraryResult<Self> {
        Ok(Self::from_parts(
            Database::open_in_memory()?,
            Arc::new(InMemoryBlobStore::new()),
            PolicyTable::standard(),
            LibraryConfig::default(),
        ))
    }

    pub fn from_parts(
        db: Database,
        blobs: Arc<dyn BlobStore>,
        policy: PolicyTable,
        config: LibraryConfig,
    ) -> Self {
        Self {
            db,
            blobs,
            policy,
            config,
        }
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("database", &self.db.path())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
