//! One connected client's view of its records.

use std::sync::Arc;

use pso_records::inventory::CarriedItems;
use pso_records::item::UNSET_ITEM_ID;
use pso_records::text::FixedText;
use pso_records::{
    BankItem, ClientGeneration, InventoryItem, LegacyPlayerData, Ledger, LevelTable, PlayerDataBb,
    PlayerDataDcPc, PlayerDataV3, PlayerRecordStore, RecordError, RecordState,
};
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::events::{ClientEvent, EventOutcome};
use crate::lease::{SlotLease, SlotRegistry};

/// A client session: its generation, its record store and, for named
/// accounts, the lease on the character slot it is playing.
///
/// Field order matters on drop: the store saves before the lease checks the
/// slot back in.
pub struct ClientSession {
    generation: ClientGeneration,
    store: PlayerRecordStore,
    lease: Option<SlotLease>,
    registry: Arc<SlotRegistry>,
    level_table: Arc<dyn LevelTable>,
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("generation", &self.generation)
            .field("store", &self.store)
            .field("lease", &self.lease)
            .finish_non_exhaustive()
    }
}

impl ClientSession {
    pub(crate) fn new(
        generation: ClientGeneration,
        store: PlayerRecordStore,
        lease: Option<SlotLease>,
        registry: Arc<SlotRegistry>,
        level_table: Arc<dyn LevelTable>,
    ) -> Self {
        Self {
            generation,
            store,
            lease,
            registry,
            level_table,
        }
    }

    /// The client's generation.
    #[must_use]
    pub fn generation(&self) -> ClientGeneration {
        self.generation
    }

    /// The underlying record store.
    pub fn store(&mut self) -> &mut PlayerRecordStore {
        &mut self.store
    }

    /// The slot lease, absent for anonymous sessions.
    #[must_use]
    pub fn lease(&self) -> Option<&SlotLease> {
        self.lease.as_ref()
    }

    /// Apply one client action to the records.
    ///
    /// # Errors
    /// Any record error. Bank transfers check the destination for room first,
    /// so a rejected transfer leaves both containers as they were.
    pub fn apply(&mut self, event: ClientEvent) -> Result<EventOutcome> {
        debug!(event = event.name(), generation = %self.generation, "Applying client event");
        match event {
            ClientEvent::SubmitPlayerData(bytes) => {
                self.submit(&bytes)?;
                Ok(EventOutcome::Applied)
            }
            ClientEvent::PickUp(item) => {
                self.store.player_mut()?.carried().add_item(InventoryItem::new(item))?;
                Ok(EventOutcome::Applied)
            }
            ClientEvent::Drop { item_id, amount } => {
                let removed = self.store.player_mut()?.carried().remove_item(item_id, amount, false)?;
                Ok(EventOutcome::ItemReleased(removed.data))
            }
            ClientEvent::BankDeposit { item_id, amount } => {
                self.deposit(item_id, amount)?;
                Ok(EventOutcome::Applied)
            }
            ClientEvent::BankWithdraw { item_id, amount } => {
                self.withdraw(item_id, amount)?;
                Ok(EventOutcome::Applied)
            }
            ClientEvent::CreateCharacter(preview) => {
                self.store.create_player(&preview, self.level_table.as_ref())?;
                Ok(EventOutcome::Applied)
            }
            ClientEvent::DressingRoom(preview) => {
                self.store.player_mut()?.disp.apply_dressing_room(&preview);
                Ok(EventOutcome::Applied)
            }
            ClientEvent::ChangeSlot(slot) => {
                self.change_slot(slot)?;
                Ok(EventOutcome::Applied)
            }
            ClientEvent::Save => {
                self.save()?;
                Ok(EventOutcome::Applied)
            }
        }
    }

    fn submit(&mut self, bytes: &[u8]) -> Result<()> {
        if self.generation.is_legacy() {
            let data = LegacyPlayerData::parse(self.generation, bytes)?;
            self.store.import_from_legacy(&data)?;
        } else {
            let data = PlayerDataBb::from_bytes(bytes)?;
            self.store.import_from_current(&data)?;
        }
        Ok(())
    }

    fn deposit(&mut self, item_id: u32, amount: u32) -> Result<()> {
        let player = self.store.player_mut()?;
        if item_id != UNSET_ITEM_ID {
            let index = player.inventory.find_item(item_id)?;
            player.bank.check_room(&player.inventory.items[index].data)?;
        }
        let item = CarriedItems {
            inventory: &mut player.inventory,
            meseta: &mut player.disp.stats.meseta,
        }
        .remove_item(item_id, amount, false)?;
        player.bank.add_item(BankItem::from(&item))?;
        Ok(())
    }

    fn withdraw(&mut self, item_id: u32, amount: u32) -> Result<()> {
        let player = self.store.player_mut()?;
        let mut carried = CarriedItems {
            inventory: &mut player.inventory,
            meseta: &mut player.disp.stats.meseta,
        };
        if item_id != UNSET_ITEM_ID {
            let index = player.bank.find_item(item_id)?;
            carried.check_room(&player.bank.items[index].data)?;
        }
        let item = player.bank.remove_item(item_id, amount, false)?;
        carried.add_item(InventoryItem::from(&item))?;
        Ok(())
    }

    fn change_slot(&mut self, slot: usize) -> Result<()> {
        let Some(username) = self.store.username().map(str::to_string) else {
            self.store.select_slot(slot)?;
            return Ok(());
        };
        if self.lease.as_ref().is_some_and(|lease| lease.slot() == slot) {
            return Ok(());
        }
        // Take the new slot before giving up the old one.
        let lease = self.registry.checkout(&username, slot)?;
        self.store.select_slot(slot)?;
        self.lease = Some(lease);
        info!(username = %username, slot, "Changed character slot");
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        if !self.store.is_persistent() {
            debug!("Save requested by anonymous session; nothing written");
            return Ok(());
        }
        if holds(self.store.account_state()) {
            self.store.save_account()?;
        }
        if holds(self.store.player_state()) {
            self.store.save_player()?;
        }
        Ok(())
    }

    /// Serialize the character in the layout this client expects.
    ///
    /// # Errors
    /// Any load or encode error.
    pub fn export_for_client(&mut self) -> Result<Vec<u8>> {
        if !self.generation.is_legacy() {
            return Ok(self.store.export_for_current()?.to_bytes()?);
        }

        let blocked_senders = self.store.account()?.blocked_senders;
        let player = self.store.player()?;
        let mut disp = player.disp.to_legacy();
        disp.enforce_legacy_limits();

        let data = match self.generation {
            ClientGeneration::Dc | ClientGeneration::Pc => LegacyPlayerData::DcPc(Box::new(PlayerDataDcPc {
                inventory: player.inventory,
                disp,
            })),
            ClientGeneration::Gc | ClientGeneration::Xb => {
                let swap_mags = self.generation.swaps_mag_payloads();
                let mut inventory = player.inventory;
                if swap_mags {
                    inventory.bswap_mags();
                }
                LegacyPlayerData::V3 {
                    data: Box::new(PlayerDataV3 {
                        inventory,
                        disp,
                        info_board: FixedText::new(&player.info_board.to_string_lossy()),
                        blocked_senders,
                        auto_reply_enabled: u32::from(!player.auto_reply.is_empty()),
                        auto_reply: FixedText::new(&player.auto_reply.to_string_lossy()),
                        ..PlayerDataV3::default()
                    }),
                    swap_mags,
                }
            }
            ClientGeneration::Bb => return Err(RecordError::UnsupportedGeneration(self.generation).into()),
        };
        Ok(data.to_bytes(self.generation)?)
    }

    /// Save and release the records, then give up the slot.
    ///
    /// # Errors
    /// The first save error; the slot is checked in regardless.
    pub fn close(mut self) -> Result<()> {
        let result = self.store.release();
        if let Err(e) = &result {
            warn!(error = %e, "Records could not be saved on close");
        }
        drop(self.lease.take());
        result.map_err(SessionError::from)
    }
}

fn holds(state: RecordState) -> bool {
    matches!(state, RecordState::Loaded(_) | RecordState::Saved)
}
