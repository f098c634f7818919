//! Process-wide session factory.

use std::sync::Arc;

use pso_records::{BaseStatsTable, ClientGeneration, FsStorage, LevelTable, PlayerRecordStore, RecordBackend};
use tracing::info;

use crate::config::SessionConfig;
use crate::error::Result;
use crate::lease::{SlotLease, SlotRegistry};
use crate::session::ClientSession;

/// Owns everything sessions share: the record backend, the slot registry
/// and the base-stats table.
pub struct SessionHost {
    backend: Arc<RecordBackend>,
    registry: Arc<SlotRegistry>,
    level_table: Arc<dyn LevelTable>,
}

impl SessionHost {
    /// A host over an existing backend.
    pub fn new(backend: Arc<RecordBackend>, level_table: Arc<dyn LevelTable>) -> Self {
        Self {
            backend,
            registry: Arc::new(SlotRegistry::new()),
            level_table,
        }
    }

    /// A host rooted on the filesystem as `config` describes.
    ///
    /// # Errors
    /// Any error reading the base-stats table.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        let storage = Arc::new(FsStorage::new(&config.storage_root));
        let backend = Arc::new(RecordBackend::with_storage(config.store.clone(), storage));
        let level_table = match &config.level_table {
            Some(path) => BaseStatsTable::from_file(path)?,
            None => BaseStatsTable::default(),
        };
        info!(
            root = %config.storage_root.display(),
            classes = level_table.classes.len(),
            save_to_filesystem = config.store.save_to_filesystem,
            "Session host ready"
        );
        Ok(Self::new(backend, Arc::new(level_table)))
    }

    /// The shared record backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<RecordBackend> {
        &self.backend
    }

    /// The slot registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<SlotRegistry> {
        &self.registry
    }

    /// Open a session for `username` playing `slot`.
    ///
    /// # Errors
    /// [`crate::SessionError::SlotActive`] if another session holds the
    /// slot.
    pub fn login(
        &self,
        generation: ClientGeneration,
        username: &str,
        slot: usize,
        guild_card_number: u32,
    ) -> Result<ClientSession> {
        let lease = self.registry.checkout(username, slot)?;
        let mut store = PlayerRecordStore::new(Arc::clone(&self.backend), Some(username), slot);
        store.set_guild_card_number(guild_card_number);
        info!(username, slot, generation = %generation, "Session opened");
        Ok(self.session(generation, store, Some(lease)))
    }

    /// Open a session with no account behind it. Its records live in memory
    /// and are never saved.
    #[must_use]
    pub fn anonymous(&self, generation: ClientGeneration) -> ClientSession {
        let store = PlayerRecordStore::new(Arc::clone(&self.backend), None, 0);
        self.session(generation, store, None)
    }

    fn session(&self, generation: ClientGeneration, store: PlayerRecordStore, lease: Option<SlotLease>) -> ClientSession {
        ClientSession::new(
            generation,
            store,
            lease,
            Arc::clone(&self.registry),
            Arc::clone(&self.level_table),
        )
    }
}

impl std::fmt::Debug for SessionHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHost")
            .field("backend", &self.backend)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
