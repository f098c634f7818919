//! Client actions that touch persistent records.
//!
//! The protocol layer decodes commands into [`ClientEvent`]s and hands them
//! to [`crate::ClientSession::apply`].

use pso_records::{ItemData, PreviewData};

/// A record-affecting action taken by a connected client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Raw player data the client sent in its own generation's layout.
    SubmitPlayerData(Vec<u8>),

    /// The client picked an item up off the floor.
    PickUp(ItemData),

    /// The client dropped an item, or part of a stack. `item_id`
    /// `0xFFFFFFFF` drops meseta.
    Drop {
        /// Item to drop.
        item_id: u32,
        /// Units to drop; zero drops the whole stack.
        amount: u32,
    },

    /// Move an inventory item (or meseta) into the bank.
    BankDeposit {
        /// Item to move.
        item_id: u32,
        /// Units to move; zero moves the whole stack.
        amount: u32,
    },

    /// Move a bank item (or meseta) into the inventory.
    BankWithdraw {
        /// Item to move.
        item_id: u32,
        /// Units to move; zero moves the whole stack.
        amount: u32,
    },

    /// Create a character in the session's slot from a preview.
    CreateCharacter(PreviewData),

    /// Restyle the current character's appearance.
    DressingRoom(PreviewData),

    /// Switch to another character slot of the same account.
    ChangeSlot(usize),

    /// Write both records out now.
    Save,
}

impl ClientEvent {
    /// Short name for logs and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SubmitPlayerData(_) => "SubmitPlayerData",
            Self::PickUp(_) => "PickUp",
            Self::Drop { .. } => "Drop",
            Self::BankDeposit { .. } => "BankDeposit",
            Self::BankWithdraw { .. } => "BankWithdraw",
            Self::CreateCharacter(_) => "CreateCharacter",
            Self::DressingRoom(_) => "DressingRoom",
            Self::ChangeSlot(_) => "ChangeSlot",
            Self::Save => "Save",
        }
    }
}

/// What applying an event produced.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// Records were updated in place.
    Applied,
    /// An item left the character's containers and now belongs to the
    /// caller (e.g. it goes to the floor).
    ItemReleased(ItemData),
}
