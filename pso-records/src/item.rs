//! Single-item classification: stacking keys, stack limits, equip slots.
//!
//! An [`ItemData`] is opaque to most of the server; everything the ledger
//! needs to know about it is derived here from the classification bytes in
//! `data1`. All functions are total over any 20-byte payload.

use std::fmt;
use std::fmt::Write as _;

use binrw::binrw;

/// Primary identifier shared by every meseta pseudo-item.
pub const MESETA_IDENTIFIER: u32 = 0x0004_0000;

/// Item id that means "no id yet" on detached stacks, and "meseta" in
/// withdrawal requests.
pub const UNSET_ITEM_ID: u32 = 0xFFFF_FFFF;

/// Balance ceiling for every meseta counter.
pub const MAX_MESETA: u32 = 999_999;

/// Index of the quantity byte of combinable items inside `data1`.
const STACK_SIZE_INDEX: usize = 5;

const TYPE_WEAPON: u8 = 0x00;
const TYPE_ARMOR: u8 = 0x01;
const TYPE_MAG: u8 = 0x02;
const TYPE_TOOL: u8 = 0x03;
const TYPE_MESETA: u8 = 0x04;

const ARMOR_SUBTYPE_BODY: u8 = 0x01;
const TOOL_SUBTYPE_TECH_DISK: u8 = 0x02;
const TOOL_SUBTYPE_PHOTON: u8 = 0x10;

/// Which equip slot an item occupies when worn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipCategory {
    /// Held weapon.
    Weapon,
    /// Body armor (frames). Shields and units are not armor here.
    Armor,
    /// Mag companion.
    Mag,
    /// Anything that is not worn in one of the three exclusive slots.
    None,
}

impl fmt::Display for EquipCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weapon => write!(f, "weapon"),
            Self::Armor => write!(f, "armor"),
            Self::Mag => write!(f, "mag"),
            Self::None => write!(f, "unequippable item"),
        }
    }
}

/// The 20-byte item payload shared by inventory, bank and wire layouts.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ItemData {
    /// Classification bytes: type, subtype, variant, then type-specific data.
    pub data1: [u8; 12],
    /// Per-game item id assigned by the server.
    pub id: u32,
    /// Type-specific payload; holds the amount for meseta.
    pub data2: [u8; 4],
}

impl ItemData {
    /// A meseta pseudo-item carrying `amount`.
    #[must_use]
    pub fn meseta(amount: u32) -> Self {
        let mut data1 = [0; 12];
        data1[0] = TYPE_MESETA;
        Self {
            data1,
            id: UNSET_ITEM_ID,
            data2: amount.to_le_bytes(),
        }
    }

    /// Canonical type key used for stacking and meseta recognition.
    #[must_use]
    pub fn primary_identifier(&self) -> u32 {
        let [kind, subtype, variant, ..] = self.data1;
        match kind {
            // The rest of data1 is ignored for meseta; the value lives in data2.
            TYPE_MESETA => MESETA_IDENTIFIER,
            // Disk level sits in the variant byte and must not split stacks.
            TYPE_TOOL if subtype == TOOL_SUBTYPE_TECH_DISK => 0x0003_0200,
            TYPE_MAG => 0x0002_0000 | (u32::from(subtype) << 8),
            _ => (u32::from(kind) << 16) | (u32::from(subtype) << 8) | u32::from(variant),
        }
    }

    /// How many units one slot may hold. 1 means the item never combines.
    #[must_use]
    pub fn max_stack_size(&self) -> u32 {
        match (self.data1[0], self.data1[1]) {
            (TYPE_MESETA, _) => MAX_MESETA,
            (TYPE_TOOL, TOOL_SUBTYPE_TECH_DISK) => 1,
            (TYPE_TOOL, 0x00..=0x08) => 10,
            (TYPE_TOOL, TOOL_SUBTYPE_PHOTON) => 99,
            _ => 1,
        }
    }

    /// Units currently held by this payload.
    #[must_use]
    pub fn stack_size(&self) -> u32 {
        if self.max_stack_size() > 1 {
            u32::from(self.data1[STACK_SIZE_INDEX])
        } else {
            1
        }
    }

    /// Overwrite the quantity byte of a combinable item.
    pub fn set_stack_size(&mut self, amount: u8) {
        self.data1[STACK_SIZE_INDEX] = amount;
    }

    /// Meseta amount carried by a meseta pseudo-item.
    #[must_use]
    pub fn meseta_amount(&self) -> u32 {
        u32::from_le_bytes(self.data2)
    }

    /// Equip slot this item would occupy, ignoring whether it is worn.
    #[must_use]
    pub fn equip_category(&self) -> EquipCategory {
        match (self.data1[0], self.data1[1]) {
            (TYPE_WEAPON, _) => EquipCategory::Weapon,
            (TYPE_ARMOR, ARMOR_SUBTYPE_BODY) => EquipCategory::Armor,
            (TYPE_MAG, _) => EquipCategory::Mag,
            _ => EquipCategory::None,
        }
    }

    /// Whether this payload is the meseta pseudo-item.
    #[must_use]
    pub fn is_meseta(&self) -> bool {
        self.primary_identifier() == MESETA_IDENTIFIER
    }

    /// Byte-reverse `data2` of mags. GC clients store mag stats there as
    /// one swapped word.
    pub fn bswap_data2_if_mag(&mut self) {
        if self.data1[0] == TYPE_MAG {
            self.data2.reverse();
        }
    }

    /// Reset to an empty payload.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// `data1` / `id` / `data2` rendered as hex, for inventory dumps.
    #[must_use]
    pub fn hex(&self) -> String {
        let mut out = String::with_capacity(44);
        for b in &self.data1 {
            let _ = write!(out, "{b:02X}");
        }
        let _ = write!(out, " ({:08X}) ", self.id);
        for b in &self.data2 {
            let _ = write!(out, "{b:02X}");
        }
        out
    }
}
