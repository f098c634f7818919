//! Per-session account and player record holder.
//!
//! A [`PlayerRecordStore`] belongs to one client session. It loads records
//! lazily through the shared [`RecordBackend`] (cache, storage, clock and
//! counters), converts client submissions into canonical records and writes
//! them back on save or when the session ends.
//!
//! The store does not lock records. The session layer must guarantee at most
//! one live store per (username, slot).

use std::sync::Arc;

use binrw::{BinRead, BinWrite, Endian};
use tracing::{debug, error, info, warn};

use crate::cache::{FileCache, LruFileCache};
use crate::clock::{Clock, SystemClock};
use crate::codec::{decode, encode};
use crate::config::StoreConfig;
use crate::disp::PreviewData;
use crate::error::{RecordError, Result};
use crate::inventory::Bank;
use crate::level_table::LevelTable;
use crate::metrics::RecordCounters;
use crate::records::{AccountRecord, PlayerRecord};
use crate::storage::Storage;
use crate::text::WideText;
use crate::wire::{LegacyPlayerData, PlayerBb, PlayerDataBb};

// ---------------------------------------------------------------------------
// Shared backend
// ---------------------------------------------------------------------------

/// Process-wide collaborators shared by every session's store.
pub struct RecordBackend {
    config: StoreConfig,
    cache: Arc<dyn FileCache>,
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    counters: RecordCounters,
}

impl RecordBackend {
    /// Assemble a backend from explicit collaborators.
    pub fn new(
        config: StoreConfig,
        cache: Arc<dyn FileCache>,
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            cache,
            storage,
            clock,
            counters: RecordCounters::new(),
        }
    }

    /// A backend with an [`LruFileCache`] sized from `config` and the system
    /// clock.
    pub fn with_storage(config: StoreConfig, storage: Arc<dyn Storage>) -> Self {
        let cache = Arc::new(LruFileCache::new(config.cache_capacity_bytes));
        Self::new(config, cache, storage, Arc::new(SystemClock))
    }

    /// Store settings.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The shared cache.
    #[must_use]
    pub fn cache(&self) -> &dyn FileCache {
        self.cache.as_ref()
    }

    /// Durable storage.
    #[must_use]
    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Traffic counters.
    #[must_use]
    pub fn counters(&self) -> &RecordCounters {
        &self.counters
    }

    /// Key of an account record.
    #[must_use]
    pub fn account_key(&self, username: &str) -> String {
        format!("{}/account_{username}.nsa", self.config.player_dir)
    }

    /// Key of a player record; `slot` is zero-based, the key one-based.
    #[must_use]
    pub fn player_key(&self, username: &str, slot: usize) -> String {
        format!("{}/player_{username}_{}.nsc", self.config.player_dir, slot + 1)
    }

    /// Key of the account used when an account's own record is unusable.
    #[must_use]
    pub fn default_account_key(&self) -> String {
        format!("{}/default.nsa", self.config.player_dir)
    }

    /// Key of the character-creation template for `char_class`.
    #[must_use]
    pub fn player_template_key(&self, char_class: u8) -> String {
        format!("{}/default_player_{char_class}.nsc", self.config.player_dir)
    }

    fn load_record<T>(&self, key: &str) -> Result<T>
    where
        T: for<'a> BinRead<Args<'a> = ()>,
    {
        let bytes = self.cache.get_or_load(key, self.storage.as_ref())?;
        decode(&bytes, Endian::Little)
    }

    fn store_record<T>(&self, key: &str, record: &T, to_filesystem: bool) -> Result<()>
    where
        T: for<'a> BinWrite<Args<'a> = ()>,
    {
        let bytes = encode(record, Endian::Little)?;
        if to_filesystem {
            self.storage.write(key, &bytes)?;
            self.cache.replace(key, bytes.into());
            RecordCounters::bump(&self.counters.saves_to_filesystem);
            info!(key, "Saved record to filesystem");
        } else {
            self.cache.replace(key, bytes.into());
            RecordCounters::bump(&self.counters.saves_to_cache_only);
            info!(key, "Saved record to cache only");
        }
        Ok(())
    }
}

impl std::fmt::Debug for RecordBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordBackend")
            .field("config", &self.config)
            .field("cache_bytes", &self.cache.size_bytes())
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Record state
// ---------------------------------------------------------------------------

/// Where a held record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// The record's own stored file.
    Stored,
    /// The shared default account, after the account's own file failed.
    Fallback,
    /// Synthesized in memory for a session without a username.
    Fresh,
    /// A class template, during character creation.
    Template,
}

/// Lifecycle of one held record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Nothing held yet.
    Unloaded,
    /// Held since the last load.
    Loaded(LoadSource),
    /// Held and written at least once since loading.
    Saved,
    /// Dropped at the end of the session.
    Released,
}

#[derive(Debug)]
struct Held<T> {
    record: Option<Box<T>>,
    state: RecordState,
    dirty: bool,
}

impl<T> Held<T> {
    const fn empty() -> Self {
        Self {
            record: None,
            state: RecordState::Unloaded,
            dirty: false,
        }
    }

    fn install(&mut self, record: T, source: LoadSource) {
        self.record = Some(Box::new(record));
        self.state = RecordState::Loaded(source);
        self.dirty = false;
    }

    fn mark_saved(&mut self) {
        self.state = RecordState::Saved;
        self.dirty = false;
    }

    fn release(&mut self) {
        self.record = None;
        self.state = RecordState::Released;
        self.dirty = false;
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// One session's account and player records.
#[derive(Debug)]
pub struct PlayerRecordStore {
    backend: Arc<RecordBackend>,
    username: Option<String>,
    slot: usize,
    guild_card_number: u32,
    save_to_filesystem: bool,
    update_play_time: bool,
    last_play_time_update: u64,
    account: Held<AccountRecord>,
    player: Held<PlayerRecord>,
}

impl PlayerRecordStore {
    /// A store for `username`'s character in `slot` (zero-based). Without a
    /// username the store is not persistence-backed: records are synthesized
    /// in memory and never saved.
    pub fn new(backend: Arc<RecordBackend>, username: Option<&str>, slot: usize) -> Self {
        let save_to_filesystem = backend.config.save_to_filesystem;
        let update_play_time = backend.config.update_play_time;
        Self {
            backend,
            username: username.map(str::to_string),
            slot,
            guild_card_number: 0,
            save_to_filesystem,
            update_play_time,
            last_play_time_update: 0,
            account: Held::empty(),
            player: Held::empty(),
        }
    }

    /// The shared backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<RecordBackend> {
        &self.backend
    }

    /// Bound username, if any.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Whether the store reads and writes files.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.username.is_some()
    }

    /// Zero-based character slot.
    #[must_use]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Switch to another character slot, releasing the current player
    /// record first (saving it if modified).
    ///
    /// # Errors
    /// Any error from saving the current player record.
    pub fn select_slot(&mut self, slot: usize) -> Result<()> {
        if slot == self.slot {
            return Ok(());
        }
        self.release_player()?;
        self.player = Held::empty();
        self.slot = slot;
        Ok(())
    }

    /// Connection-assigned guild card number.
    #[must_use]
    pub fn guild_card_number(&self) -> u32 {
        self.guild_card_number
    }

    /// Set the connection-assigned guild card number.
    pub fn set_guild_card_number(&mut self, guild_card_number: u32) {
        self.guild_card_number = guild_card_number;
    }

    /// Write saves through to durable storage (`true`) or only to the cache.
    pub fn set_save_to_filesystem(&mut self, enabled: bool) {
        self.save_to_filesystem = enabled;
    }

    /// Enable or disable play-time accounting on player saves.
    pub fn set_update_play_time(&mut self, enabled: bool) {
        self.update_play_time = enabled;
    }

    /// Lifecycle state of the account record.
    #[must_use]
    pub fn account_state(&self) -> RecordState {
        self.account.state
    }

    /// Lifecycle state of the player record.
    #[must_use]
    pub fn player_state(&self) -> RecordState {
        self.player.state
    }

    /// Whether the account record has unsaved changes.
    #[must_use]
    pub fn is_account_dirty(&self) -> bool {
        self.account.dirty
    }

    /// Whether the player record has unsaved changes.
    #[must_use]
    pub fn is_player_dirty(&self) -> bool {
        self.player.dirty
    }

    /// Key of this session's account record.
    ///
    /// # Errors
    /// [`RecordError::NotPersistent`] without a username.
    pub fn account_key(&self) -> Result<String> {
        let username = self.username.as_deref().ok_or(RecordError::NotPersistent)?;
        Ok(self.backend.account_key(username))
    }

    /// Key of this session's player record.
    ///
    /// # Errors
    /// [`RecordError::NotPersistent`] without a username.
    pub fn player_key(&self) -> Result<String> {
        let username = self.username.as_deref().ok_or(RecordError::NotPersistent)?;
        Ok(self.backend.player_key(username, self.slot))
    }

    // -- Loading ---------------------------------------------------------

    /// Load the account record, replacing any held copy.
    ///
    /// An unreadable or corrupt account file is evicted from the cache and
    /// the shared default account is used instead, once.
    ///
    /// # Errors
    /// [`RecordError::HeaderMismatch`] if the default account is itself
    /// corrupt, or the read error if it is missing.
    pub fn load_account(&mut self) -> Result<&AccountRecord> {
        let Some(username) = self.username.as_deref() else {
            self.account.install(AccountRecord::new(), LoadSource::Fresh);
            return self.account.record.as_deref().ok_or(RecordError::RecordNotLoaded("account"));
        };

        let backend = &self.backend;
        let key = backend.account_key(username);
        let loaded = backend.load_record::<AccountRecord>(&key).and_then(|record| {
            if record.is_valid() {
                Ok(record)
            } else {
                RecordCounters::bump(&backend.counters.header_mismatches);
                Err(RecordError::HeaderMismatch { key: key.clone() })
            }
        });

        match loaded {
            Ok(record) => {
                RecordCounters::bump(&backend.counters.accounts_loaded);
                info!(key = %key, "Loaded account data file");
                self.account.install(record, LoadSource::Stored);
            }
            Err(e) => {
                info!(username, error = %e, "Cannot load account data; using default");
                backend.cache.delete(&key);
                let default_key = backend.default_account_key();
                let record = backend.load_record::<AccountRecord>(&default_key)?;
                if !record.is_valid() {
                    RecordCounters::bump(&backend.counters.header_mismatches);
                    error!(key = %default_key, "Default account data header is incorrect");
                    return Err(RecordError::HeaderMismatch { key: default_key });
                }
                RecordCounters::bump(&backend.counters.account_fallbacks);
                info!(key = %default_key, "Loaded default account data file");
                self.account.install(record, LoadSource::Fallback);
            }
        }
        self.account.record.as_deref().ok_or(RecordError::RecordNotLoaded("account"))
    }

    /// Load the player record for the current slot, replacing any held copy,
    /// and restart the play-time baseline.
    ///
    /// # Errors
    /// [`RecordError::HeaderMismatch`] for a corrupt record, or the read or
    /// decode error. The cache entry is evicted and nothing is installed.
    pub fn load_player(&mut self) -> Result<&PlayerRecord> {
        self.last_play_time_update = self.backend.clock.now_micros();
        let Some(username) = self.username.as_deref() else {
            self.player.install(PlayerRecord::new(), LoadSource::Fresh);
            return self.player.record.as_deref().ok_or(RecordError::RecordNotLoaded("player"));
        };

        let backend = &self.backend;
        let key = backend.player_key(username, self.slot);
        let record = match backend.load_record::<PlayerRecord>(&key) {
            Ok(record) if record.is_valid() => record,
            Ok(_) => {
                backend.cache.delete(&key);
                RecordCounters::bump(&backend.counters.header_mismatches);
                warn!(key = %key, "Player data header is incorrect");
                return Err(RecordError::HeaderMismatch { key });
            }
            Err(e) => {
                backend.cache.delete(&key);
                return Err(e);
            }
        };

        RecordCounters::bump(&backend.counters.players_loaded);
        info!(key = %key, "Loaded player data file");
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(key = %key, "Inventory:\n{}", record.inventory.describe(record.disp.stats.meseta));
        }
        self.player.install(record, LoadSource::Stored);
        self.player.record.as_deref().ok_or(RecordError::RecordNotLoaded("player"))
    }

    /// Create a character in the current slot from the class template named
    /// by `preview`, then save it.
    ///
    /// # Errors
    /// [`RecordError::NotPersistent`] without a username, the read error for
    /// a missing template, [`RecordError::TemplateInvalid`] if the template
    /// is corrupt or the class has no base stats, or any save error.
    pub fn create_player(&mut self, preview: &PreviewData, level_table: &dyn LevelTable) -> Result<()> {
        let key = self.player_key()?;
        let template_key = self.backend.player_template_key(preview.visual.char_class);
        let bytes = self.backend.storage.read(&template_key)?;
        let mut record: PlayerRecord = decode(&bytes, Endian::Little)
            .map_err(|e| RecordError::TemplateInvalid(format!("{template_key}: {e}")))?;
        if !record.is_valid() {
            return Err(RecordError::TemplateInvalid(format!(
                "{template_key}: player data header is incorrect"
            )));
        }

        record.disp.apply_preview(preview);
        record.disp.stats.char_stats = level_table
            .base_stats_for_class(record.disp.visual.char_class)
            .map_err(|e| RecordError::TemplateInvalid(e.to_string()))?;

        self.last_play_time_update = self.backend.clock.now_micros();
        self.player.install(record, LoadSource::Template);
        self.player.dirty = true;
        RecordCounters::bump(&self.backend.counters.players_created);
        info!(key = %key, template = %template_key, "Created player from template");
        self.save_player()
    }

    // -- Access ----------------------------------------------------------

    /// The account record, loading it on first use.
    ///
    /// # Errors
    /// Any [`Self::load_account`] error.
    pub fn account(&mut self) -> Result<&AccountRecord> {
        if self.account.record.is_none() {
            return self.load_account();
        }
        self.account.record.as_deref().ok_or(RecordError::RecordNotLoaded("account"))
    }

    /// The account record for modification, loading it on first use. Marks
    /// the record dirty.
    ///
    /// # Errors
    /// Any [`Self::load_account`] error.
    pub fn account_mut(&mut self) -> Result<&mut AccountRecord> {
        if self.account.record.is_none() {
            self.load_account()?;
        }
        self.account.dirty = true;
        self.account.record.as_deref_mut().ok_or(RecordError::RecordNotLoaded("account"))
    }

    /// The player record, loading it on first use.
    ///
    /// # Errors
    /// Any [`Self::load_player`] error.
    pub fn player(&mut self) -> Result<&PlayerRecord> {
        if self.player.record.is_none() {
            return self.load_player();
        }
        self.player.record.as_deref().ok_or(RecordError::RecordNotLoaded("player"))
    }

    /// The player record for modification, loading it on first use. Marks
    /// the record dirty.
    ///
    /// # Errors
    /// Any [`Self::load_player`] error.
    pub fn player_mut(&mut self) -> Result<&mut PlayerRecord> {
        if self.player.record.is_none() {
            self.load_player()?;
        }
        self.player.dirty = true;
        self.player.record.as_deref_mut().ok_or(RecordError::RecordNotLoaded("player"))
    }

    fn records_mut(&mut self) -> Result<(&mut AccountRecord, &mut PlayerRecord)> {
        if self.account.record.is_none() {
            self.load_account()?;
        }
        if self.player.record.is_none() {
            self.load_player()?;
        }
        self.account.dirty = true;
        self.player.dirty = true;
        match (self.account.record.as_deref_mut(), self.player.record.as_deref_mut()) {
            (Some(account), Some(player)) => Ok((account, player)),
            (None, _) => Err(RecordError::RecordNotLoaded("account")),
            (_, None) => Err(RecordError::RecordNotLoaded("player")),
        }
    }

    // -- Saving ----------------------------------------------------------

    /// Write the account record to the cache and, unless cache-only, to
    /// storage.
    ///
    /// # Errors
    /// [`RecordError::RecordNotLoaded`] when no account is held (a caller
    /// bug), [`RecordError::NotPersistent`] without a username, or a write
    /// error.
    pub fn save_account(&mut self) -> Result<()> {
        let Some(record) = self.account.record.as_deref() else {
            error!("save_account called when no account data loaded");
            return Err(RecordError::RecordNotLoaded("account"));
        };
        let key = self.account_key()?;
        self.backend.store_record(&key, record, self.save_to_filesystem)?;
        self.account.mark_saved();
        Ok(())
    }

    /// Write the player record, first crediting whole seconds of play time
    /// since the last baseline when play-time accounting is on.
    ///
    /// # Errors
    /// As for [`Self::save_account`].
    pub fn save_player(&mut self) -> Result<()> {
        if self.player.record.is_none() {
            error!("save_player called when no player data loaded");
            return Err(RecordError::RecordNotLoaded("player"));
        }
        let key = self.player_key()?;
        let Some(record) = self.player.record.as_deref_mut() else {
            return Err(RecordError::RecordNotLoaded("player"));
        };

        if self.update_play_time {
            let now = self.backend.clock.now_micros();
            // Sub-second remainders are dropped each cycle.
            let seconds = now.saturating_sub(self.last_play_time_update) / 1_000_000;
            let credited = u32::try_from(seconds).unwrap_or(u32::MAX);
            record.disp.play_time = record.disp.play_time.saturating_add(credited);
            RecordCounters::add(&self.backend.counters.play_time_seconds_added, seconds);
            info!(seconds, "Added play time");
            self.last_play_time_update = now;
        }

        self.backend.store_record(&key, &*record, self.save_to_filesystem)?;
        self.player.mark_saved();
        Ok(())
    }

    // -- Import / export -------------------------------------------------

    /// Merge a legacy client's submitted player data into the canonical
    /// records. Inventory and display data are replaced; V3 clients also
    /// supply the info board, blocked senders and auto reply.
    ///
    /// # Errors
    /// Any error from loading the records on first use.
    pub fn import_from_legacy(&mut self, data: &LegacyPlayerData) -> Result<()> {
        let marker = self.backend.config.language_marker;
        match data {
            LegacyPlayerData::DcPc(pd) => {
                let player = self.player_mut()?;
                player.inventory = pd.inventory;
                player.disp = pd.disp.to_current(marker);
            }
            LegacyPlayerData::V3 { data: v3, swap_mags } => {
                let (account, player) = self.records_mut()?;
                player.inventory = v3.inventory;
                if *swap_mags {
                    player.inventory.bswap_mags();
                }
                player.disp = v3.disp.to_current(marker);
                player.info_board.set(&v3.info_board.to_string_lossy());
                account.blocked_senders = v3.blocked_senders;
                if v3.auto_reply_enabled != 0 {
                    player.auto_reply.set(&v3.auto_reply.to_string_lossy());
                } else {
                    player.auto_reply.clear();
                }
            }
        }
        debug!(username = ?self.username, "Imported legacy player data");
        Ok(())
    }

    /// Merge a current client's submitted player data. Only the info board,
    /// blocked senders and auto reply are taken; the server's inventory and
    /// display data stay authoritative.
    ///
    /// # Errors
    /// Any error from loading the records on first use.
    pub fn import_from_current(&mut self, data: &PlayerDataBb) -> Result<()> {
        let (account, player) = self.records_mut()?;
        player.info_board = data.info_board;
        account.blocked_senders = data.blocked_senders;
        if data.auto_reply_enabled != 0 {
            player.auto_reply = data.auto_reply;
        } else {
            player.auto_reply.clear();
        }
        debug!(username = ?self.username, "Imported current player data");
        Ok(())
    }

    /// Assemble the full character image sent to current-generation
    /// clients.
    ///
    /// # Errors
    /// Any error from loading the records on first use.
    pub fn export_for_current(&mut self) -> Result<PlayerBb> {
        let guild_card_number = self.guild_card_number;
        self.account()?;
        self.player()?;
        let (Some(account), Some(player)) = (self.account.record.as_deref(), self.player.record.as_deref())
        else {
            return Err(RecordError::RecordNotLoaded("player"));
        };

        Ok(PlayerBb {
            inventory: player.inventory,
            disp: player.disp,
            option_flags: account.option_flags,
            quest_data1: player.quest_data1,
            bank: player.bank.clone(),
            guild_card_number,
            name: WideText::new(&player.disp.name.to_string_lossy()),
            team_name: account.team_name,
            guild_card_description: player.guild_card_description,
            section_id: player.disp.visual.section_id,
            char_class: player.disp.visual.char_class,
            symbol_chats: account.symbol_chats,
            shortcuts: account.shortcuts,
            auto_reply: player.auto_reply,
            info_board: player.info_board,
            challenge_data: player.challenge_data,
            tech_menu_config: player.tech_menu_config,
            quest_data2: player.quest_data2,
            key_config: account.key_config,
            ..PlayerBb::default()
        })
    }

    // -- Bank files ------------------------------------------------------

    /// Load a standalone bank file. Item ids are reassigned from
    /// [`crate::inventory::BANK_ITEM_ID_BASE`].
    ///
    /// # Errors
    /// The read or decode error.
    pub fn load_bank_file(&self, key: &str) -> Result<Bank> {
        let mut bank: Bank = self.backend.load_record(key)?;
        bank.assign_item_ids();
        debug!(key, items = bank.occupied().len(), "Loaded bank file");
        Ok(bank)
    }

    /// Save a standalone bank file, honouring the cache-only setting.
    ///
    /// # Errors
    /// Any write error.
    pub fn save_bank_file(&self, key: &str, bank: &Bank) -> Result<()> {
        self.backend.store_record(key, bank, self.save_to_filesystem)
    }

    // -- Teardown --------------------------------------------------------

    fn release_account(&mut self) -> Result<()> {
        let result = if self.account.dirty && self.is_persistent() {
            self.save_account()
        } else {
            Ok(())
        };
        if self.account.record.is_some() {
            self.account.release();
        }
        result
    }

    fn release_player(&mut self) -> Result<()> {
        // Clean records are still written when play time accrues.
        let needs_save = self.player.dirty || self.update_play_time;
        let result = if needs_save && self.player.record.is_some() && self.is_persistent() {
            self.save_player()
        } else {
            Ok(())
        };
        if self.player.record.is_some() {
            self.player.release();
        }
        result
    }

    /// Save modified records once and drop both from memory.
    ///
    /// # Errors
    /// The first save error; both records are released regardless.
    pub fn release(&mut self) -> Result<()> {
        let account = self.release_account();
        let player = self.release_player();
        account.and(player)
    }
}

impl Drop for PlayerRecordStore {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            error!(username = ?self.username, error = %e, "Failed to save records at session end");
        }
    }
}
