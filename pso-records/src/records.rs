//! Canonical account and player records as stored on disk.
//!
//! Both are fixed-size little-endian images that open with a signature
//! string. A record whose signature differs from the expected magic is
//! treated as corrupt.

use binrw::binrw;

use crate::disp::DispDataCurrent;
use crate::guild_card::GuildCardFileBb;
use crate::inventory::{Bank, CarriedItems, Inventory};
use crate::text::{ByteBlock, FixedText, WideText};

/// Magic opening every player record.
pub const PLAYER_FILE_SIGNATURE: &str = "newserv player file format; 10 sections present; sequential;";

/// Magic opening every account record.
pub const ACCOUNT_FILE_SIGNATURE: &str = "newserv account file format; 7 sections present; sequential;";

/// Length of the blocked-sender list.
pub const BLOCKED_SENDER_COUNT: usize = 30;

/// Fixed-width signature field.
pub type Signature = FixedText<0x40>;

/// Per-account settings shared by every character of the account.
#[binrw]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountRecord {
    /// Format magic.
    pub signature: Signature,
    /// Guild card numbers whose mail is rejected.
    pub blocked_senders: [u32; BLOCKED_SENDER_COUNT],
    /// Saved and blocked guild cards.
    pub guild_cards: GuildCardFileBb,
    /// Key and joystick bindings.
    pub key_config: ByteBlock<0x16C>,
    /// Account-wide client option bits.
    pub option_flags: u32,
    /// Chat shortcuts.
    pub shortcuts: ByteBlock<0xA40>,
    /// Symbol chat macros.
    pub symbol_chats: ByteBlock<0x4E0>,
    /// Team name.
    pub team_name: WideText<0x10>,
}

impl AccountRecord {
    /// A blank record stamped with the account signature.
    #[must_use]
    pub fn new() -> Self {
        Self {
            signature: FixedText::new(ACCOUNT_FILE_SIGNATURE),
            ..Self::default()
        }
    }

    /// Whether the signature matches the account magic.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.signature.to_string_lossy() == ACCOUNT_FILE_SIGNATURE
    }
}

/// One character's persistent state.
#[binrw]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerRecord {
    /// Format magic.
    pub signature: Signature,
    /// Mail auto-reply text; empty when disabled.
    pub auto_reply: WideText<0xAC>,
    /// Character bank.
    pub bank: Bank,
    /// Challenge-mode progress.
    pub challenge_data: ByteBlock<0x140>,
    /// Stats, appearance, name and play time.
    pub disp: DispDataCurrent,
    /// Text shown on this character's guild card.
    pub guild_card_description: WideText<0x58>,
    /// Info board text.
    pub info_board: WideText<0xAC>,
    /// Carried items.
    pub inventory: Inventory,
    /// Quest flags.
    pub quest_data1: ByteBlock<0x208>,
    /// Quest counters.
    pub quest_data2: ByteBlock<0x58>,
    /// Technique palette.
    pub tech_menu_config: ByteBlock<0x28>,
}

impl PlayerRecord {
    /// A blank record stamped with the player signature.
    #[must_use]
    pub fn new() -> Self {
        Self {
            signature: FixedText::new(PLAYER_FILE_SIGNATURE),
            ..Self::default()
        }
    }

    /// Whether the signature matches the player magic.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.signature.to_string_lossy() == PLAYER_FILE_SIGNATURE
    }

    /// The inventory together with the on-hand meseta it is accounted
    /// against, ready for ledger operations.
    pub fn carried(&mut self) -> CarriedItems<'_> {
        CarriedItems {
            inventory: &mut self.inventory,
            meseta: &mut self.disp.stats.meseta,
        }
    }
}
