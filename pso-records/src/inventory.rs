//! Fixed-capacity item containers and the ledger operations over them.
//!
//! The character inventory (30 slots, meseta kept in the display data) and
//! the bank (200 slots, meseta kept inline) share one implementation: both
//! implement [`ItemContainer`], and [`Ledger`] provides add / remove / find
//! for anything that does.
//!
//! Invariants held after every ledger operation:
//! - occupied slots are contiguous from index 0; removal compacts left
//! - every meseta counter stays within `0..=999_999`
//! - two combinable stacks never share a primary identifier

use binrw::binrw;
use tracing::debug;

use crate::error::{RecordError, Result};
use crate::item::{EquipCategory, ItemData, MAX_MESETA, UNSET_ITEM_ID};

/// Slot count of the character inventory.
pub const INVENTORY_CAPACITY: usize = 30;

/// Slot count of the bank.
pub const BANK_CAPACITY: usize = 200;

/// Inventory slot flag marking a worn item.
pub const EQUIPPED_FLAG: u32 = 0x0000_0008;

/// Bank item ids are `BANK_ITEM_ID_BASE + slot index`.
pub const BANK_ITEM_ID_BASE: u32 = 0x0F01_0000;

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// One inventory slot.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InventoryItem {
    /// Non-zero when the slot is occupied.
    pub present: u16,
    /// Client-side extension byte.
    pub extension_data1: u8,
    /// Client-side extension byte.
    pub extension_data2: u8,
    /// Behaviour flags; see [`EQUIPPED_FLAG`].
    pub flags: u32,
    /// The item itself.
    pub data: ItemData,
}

impl InventoryItem {
    /// An occupied, unequipped slot holding `data`.
    #[must_use]
    pub fn new(data: ItemData) -> Self {
        Self {
            present: 1,
            data,
            ..Self::default()
        }
    }

    /// Whether the equipped flag is set.
    #[must_use]
    pub fn is_equipped(&self) -> bool {
        self.flags & EQUIPPED_FLAG != 0
    }

    /// Reset to an empty slot.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl From<&BankItem> for InventoryItem {
    fn from(src: &BankItem) -> Self {
        Self::new(src.data)
    }
}

/// One bank slot.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BankItem {
    /// The item itself.
    pub data: ItemData,
    /// Units in this slot, mirrored from the item's stack size.
    pub amount: u16,
    /// Non-zero when the slot is visible to the client.
    pub show_flags: u16,
}

impl BankItem {
    /// A visible bank slot holding `data`.
    #[must_use]
    pub fn new(data: ItemData) -> Self {
        Self {
            data,
            amount: u16::try_from(data.stack_size()).unwrap_or(u16::MAX),
            show_flags: 1,
        }
    }

    /// Reset to an empty slot.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl From<&InventoryItem> for BankItem {
    fn from(src: &InventoryItem) -> Self {
        Self::new(src.data)
    }
}

/// Behaviour every container slot type shares.
pub trait ContainerSlot: Clone + Default {
    /// Wrap a bare item payload in a freshly occupied slot.
    fn from_item(data: ItemData) -> Self;
    /// The slot's item payload.
    fn data(&self) -> &ItemData;
    /// Mutable access to the slot's item payload.
    fn data_mut(&mut self) -> &mut ItemData;
    /// Set the quantity of a combinable item.
    fn set_stack_size(&mut self, amount: u8) {
        self.data_mut().set_stack_size(amount);
    }
}

impl ContainerSlot for InventoryItem {
    fn from_item(data: ItemData) -> Self {
        Self::new(data)
    }

    fn data(&self) -> &ItemData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut ItemData {
        &mut self.data
    }
}

impl ContainerSlot for BankItem {
    fn from_item(data: ItemData) -> Self {
        Self::new(data)
    }

    fn data(&self) -> &ItemData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut ItemData {
        &mut self.data
    }

    fn set_stack_size(&mut self, amount: u8) {
        self.data.set_stack_size(amount);
        self.amount = u16::from(amount);
    }
}

// ---------------------------------------------------------------------------
// Containers
// ---------------------------------------------------------------------------

/// The character inventory as stored in player records and wire layouts.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Inventory {
    /// Occupied slot count.
    pub num_items: u8,
    /// HP materials consumed by the character.
    pub hp_materials_used: u8,
    /// TP materials consumed by the character.
    pub tp_materials_used: u8,
    /// Client language code.
    pub language: u8,
    /// Slots; only the first `num_items` are meaningful.
    pub items: [InventoryItem; INVENTORY_CAPACITY],
}

impl Inventory {
    /// Occupied slots.
    #[must_use]
    pub fn occupied(&self) -> &[InventoryItem] {
        let len = usize::from(self.num_items).min(INVENTORY_CAPACITY);
        &self.items[..len]
    }

    /// Index of the item id, scanning occupied slots.
    ///
    /// # Errors
    /// [`RecordError::NotFound`] if no occupied slot carries `item_id`.
    pub fn find_item(&self, item_id: u32) -> Result<usize> {
        find_in(self.occupied(), item_id)
    }

    /// Index of the single equipped item of `category`.
    ///
    /// # Errors
    /// [`RecordError::NotEquipped`] when nothing of the category is worn,
    /// [`RecordError::MultipleEquipped`] when the record is inconsistent.
    pub fn find_equipped(&self, category: EquipCategory) -> Result<usize> {
        let mut found = None;
        for (index, slot) in self.occupied().iter().enumerate() {
            if !slot.is_equipped() || slot.data.equip_category() != category {
                continue;
            }
            if found.is_some() {
                return Err(RecordError::MultipleEquipped(category));
            }
            found = Some(index);
        }
        found.ok_or(RecordError::NotEquipped(category))
    }

    /// Byte-swap mag payloads of every slot, as GC clients carry them.
    pub fn bswap_mags(&mut self) {
        for slot in &mut self.items {
            slot.data.bswap_data2_if_mag();
        }
    }

    /// One line per occupied slot, preceded by the meseta balance and count.
    #[must_use]
    pub fn describe(&self, meseta: u32) -> String {
        let mut out = format!("[PlayerInventory] Meseta: {meseta}\n");
        out.push_str(&format!("[PlayerInventory] {} items\n", self.occupied().len()));
        for (index, slot) in self.occupied().iter().enumerate() {
            out.push_str(&format!("[PlayerInventory]   {index}: {}\n", slot.data.hex()));
        }
        out
    }
}

/// The bank as stored in player records and bank files.
#[binrw]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bank {
    /// Occupied slot count.
    pub num_items: u32,
    /// Banked meseta.
    pub meseta: u32,
    /// Slots; only the first `num_items` are meaningful.
    pub items: [BankItem; BANK_CAPACITY],
}

impl Default for Bank {
    fn default() -> Self {
        Self {
            num_items: 0,
            meseta: 0,
            items: [BankItem::default(); BANK_CAPACITY],
        }
    }
}

impl Bank {
    /// Occupied slots.
    #[must_use]
    pub fn occupied(&self) -> &[BankItem] {
        let len = usize::try_from(self.num_items).map_or(BANK_CAPACITY, |n| n.min(BANK_CAPACITY));
        &self.items[..len]
    }

    /// Stamp `BANK_ITEM_ID_BASE + index` on every occupied slot. Bank files
    /// carry stale ids from whichever session saved them.
    pub fn assign_item_ids(&mut self) {
        let len = self.occupied().len();
        for (id, slot) in (BANK_ITEM_ID_BASE..).zip(&mut self.items[..len]) {
            slot.data.id = id;
        }
    }
}

/// The inventory paired with the meseta counter it is accounted against,
/// which lives in the display data rather than the inventory itself.
#[derive(Debug)]
pub struct CarriedItems<'a> {
    /// The 30-slot inventory.
    pub inventory: &'a mut Inventory,
    /// The character's on-hand meseta.
    pub meseta: &'a mut u32,
}

/// Storage shape shared by the inventory and the bank.
pub trait ItemContainer {
    /// Slot type.
    type Slot: ContainerSlot;
    /// Container name used in errors and logs.
    const NAME: &'static str;
    /// Slot capacity.
    const CAPACITY: usize;
    /// Whether meseta withdrawals may zero the balance instead of failing.
    const ALLOWS_OVERDRAFT: bool;

    /// Occupied slot count, clamped to the capacity.
    fn num_items(&self) -> usize;
    /// Set the occupied slot count.
    fn set_num_items(&mut self, count: usize);
    /// All slots, occupied or not.
    fn slots(&self) -> &[Self::Slot];
    /// All slots, mutably.
    fn slots_mut(&mut self) -> &mut [Self::Slot];
    /// The meseta counter this container is accounted against.
    fn meseta_mut(&mut self) -> &mut u32;
}

impl ItemContainer for CarriedItems<'_> {
    type Slot = InventoryItem;
    const NAME: &'static str = "inventory";
    const CAPACITY: usize = INVENTORY_CAPACITY;
    const ALLOWS_OVERDRAFT: bool = true;

    fn num_items(&self) -> usize {
        self.inventory.occupied().len()
    }

    fn set_num_items(&mut self, count: usize) {
        self.inventory.num_items = u8::try_from(count.min(INVENTORY_CAPACITY)).unwrap_or(u8::MAX);
    }

    fn slots(&self) -> &[InventoryItem] {
        &self.inventory.items
    }

    fn slots_mut(&mut self) -> &mut [InventoryItem] {
        &mut self.inventory.items
    }

    fn meseta_mut(&mut self) -> &mut u32 {
        self.meseta
    }
}

impl ItemContainer for Bank {
    type Slot = BankItem;
    const NAME: &'static str = "bank";
    const CAPACITY: usize = BANK_CAPACITY;
    const ALLOWS_OVERDRAFT: bool = false;

    fn num_items(&self) -> usize {
        self.occupied().len()
    }

    fn set_num_items(&mut self, count: usize) {
        self.num_items = u32::try_from(count.min(BANK_CAPACITY)).unwrap_or(u32::MAX);
    }

    fn slots(&self) -> &[BankItem] {
        &self.items
    }

    fn slots_mut(&mut self) -> &mut [BankItem] {
        &mut self.items
    }

    fn meseta_mut(&mut self) -> &mut u32 {
        &mut self.meseta
    }
}

fn find_in<S: ContainerSlot>(slots: &[S], item_id: u32) -> Result<usize> {
    slots
        .iter()
        .position(|slot| slot.data().id == item_id)
        .ok_or(RecordError::NotFound(item_id))
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Add / remove / find over any [`ItemContainer`].
pub trait Ledger: ItemContainer {
    /// Store `item`: meseta goes to the counter, combinable items merge into
    /// an existing stack, everything else takes the next free slot.
    ///
    /// # Errors
    /// [`RecordError::Full`] if a new slot is needed and none is free; the
    /// container is left unchanged.
    fn add_item(&mut self, item: Self::Slot) -> Result<()>;

    /// Take `amount` units of `item_id` out. `item_id == 0xFFFFFFFF`
    /// withdraws meseta; `amount == 0` takes the whole stack.
    ///
    /// # Errors
    /// [`RecordError::InsufficientFunds`] for an uncovered meseta withdrawal,
    /// [`RecordError::NotFound`] for an unknown item id.
    fn remove_item(&mut self, item_id: u32, amount: u32, allow_overdraft: bool) -> Result<Self::Slot>;

    /// Index of the slot carrying `item_id`.
    ///
    /// # Errors
    /// [`RecordError::NotFound`] if absent.
    fn find_item(&self, item_id: u32) -> Result<usize>;

    /// Check that [`Ledger::add_item`] would accept `item`, without storing it.
    ///
    /// # Errors
    /// [`RecordError::Full`] if `item` needs a new slot and none is free.
    fn check_room(&self, item: &ItemData) -> Result<()>;
}

impl<C: ItemContainer> Ledger for C {
    fn add_item(&mut self, item: Self::Slot) -> Result<()> {
        let data = *item.data();
        if data.is_meseta() {
            let meseta = self.meseta_mut();
            *meseta = meseta.saturating_add(data.meseta_amount()).min(MAX_MESETA);
            debug!(container = Self::NAME, balance = *meseta, "Meseta added");
            return Ok(());
        }

        let combine_max = data.max_stack_size();
        if combine_max > 1 {
            let pid = data.primary_identifier();
            let count = self.num_items();
            if let Some(existing) = self.slots_mut()[..count]
                .iter_mut()
                .find(|slot| slot.data().primary_identifier() == pid)
            {
                let total = (existing.data().stack_size() + data.stack_size()).min(combine_max);
                existing.set_stack_size(u8::try_from(total).unwrap_or(u8::MAX));
                debug!(container = Self::NAME, pid, total, "Stack merged");
                return Ok(());
            }
        }

        let count = self.num_items();
        if count >= Self::CAPACITY {
            return Err(RecordError::Full {
                container: Self::NAME,
                capacity: Self::CAPACITY,
            });
        }
        self.slots_mut()[count] = item;
        self.set_num_items(count + 1);
        debug!(container = Self::NAME, slot = count, item = %data.hex(), "Item added");
        Ok(())
    }

    fn remove_item(&mut self, item_id: u32, amount: u32, allow_overdraft: bool) -> Result<Self::Slot> {
        if item_id == UNSET_ITEM_ID {
            let meseta = self.meseta_mut();
            if amount <= *meseta {
                *meseta -= amount;
            } else if allow_overdraft && Self::ALLOWS_OVERDRAFT {
                *meseta = 0;
            } else {
                return Err(RecordError::InsufficientFunds {
                    requested: amount,
                    available: *meseta,
                });
            }
            return Ok(Self::Slot::from_item(ItemData::meseta(amount)));
        }

        let index = self.find_item(item_id)?;
        let count = self.num_items();
        let slots = self.slots_mut();

        // A nonzero amount below the held quantity of a stack splits it.
        let held = slots[index].data().stack_size();
        if amount != 0 && held > 1 && amount < held {
            let mut detached = slots[index].clone();
            detached.set_stack_size(u8::try_from(amount).unwrap_or(u8::MAX));
            detached.data_mut().id = UNSET_ITEM_ID;
            slots[index].set_stack_size(u8::try_from(held - amount).unwrap_or(u8::MAX));
            debug!(container = Self::NAME, item_id, amount, "Stack split");
            return Ok(detached);
        }

        let removed = slots[index].clone();
        slots[index..count].rotate_left(1);
        slots[count - 1] = Self::Slot::default();
        self.set_num_items(count - 1);
        debug!(container = Self::NAME, item_id, slot = index, "Item removed");
        Ok(removed)
    }

    fn find_item(&self, item_id: u32) -> Result<usize> {
        find_in(&self.slots()[..self.num_items()], item_id)
    }

    fn check_room(&self, item: &ItemData) -> Result<()> {
        if item.is_meseta() {
            return Ok(());
        }
        let count = self.num_items();
        if item.max_stack_size() > 1 {
            let pid = item.primary_identifier();
            if self.slots()[..count].iter().any(|slot| slot.data().primary_identifier() == pid) {
                return Ok(());
            }
        }
        if count >= Self::CAPACITY {
            return Err(RecordError::Full {
                container: Self::NAME,
                capacity: Self::CAPACITY,
            });
        }
        Ok(())
    }
}
