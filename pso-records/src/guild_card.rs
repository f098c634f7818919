//! Guild cards and the per-account guild card file.

use binrw::{Endian, binrw};
use crc::{CRC_32_ISO_HDLC, Crc};

use crate::codec::encode;
use crate::error::Result;
use crate::text::{ByteBlock, WideText};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Blocked-player cards kept in a guild card file.
pub const BLOCKED_CARD_COUNT: usize = 0x1C;

/// Saved cards kept in a guild card file.
pub const CARD_ENTRY_COUNT: usize = 0x69;

/// A guild card as exchanged between current-generation clients.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuildCardBb {
    /// Owner's guild card number.
    pub guild_card_number: u32,
    /// Owner's name.
    pub name: WideText<0x18>,
    /// Owner's team name.
    pub team_name: WideText<0x10>,
    /// Free-text description.
    pub description: WideText<0x58>,
    /// Non-zero when the card slot is in use.
    pub present: u8,
    /// Owner's client language.
    pub language: u8,
    /// Owner's section id.
    pub section_id: u8,
    /// Owner's class.
    pub char_class: u8,
}

impl GuildCardBb {
    /// Reset every field, including the name.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// A saved guild card plus the owner's private comment on it.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuildCardEntryBb {
    /// The card.
    pub data: GuildCardBb,
    /// Private comment.
    pub comment: WideText<0x58>,
    /// Reserved by the client.
    pub reserved: [u8; 4],
}

impl GuildCardEntryBb {
    /// Reset the card and the comment.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The guild card file stored inside each account record.
#[binrw]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildCardFileBb {
    /// Client-managed header block.
    pub header: ByteBlock<0x114>,
    /// Blocked players.
    pub blocked: [GuildCardBb; BLOCKED_CARD_COUNT],
    /// Reserved by the client.
    pub reserved: ByteBlock<0x180>,
    /// Saved cards.
    pub entries: [GuildCardEntryBb; CARD_ENTRY_COUNT],
}

impl Default for GuildCardFileBb {
    fn default() -> Self {
        Self {
            header: ByteBlock::default(),
            blocked: [GuildCardBb::default(); BLOCKED_CARD_COUNT],
            reserved: ByteBlock::default(),
            entries: [GuildCardEntryBb::default(); CARD_ENTRY_COUNT],
        }
    }
}

impl GuildCardFileBb {
    /// CRC-32 over the little-endian image of the whole file. Clients use it
    /// to detect a stale or damaged copy; loads never check it.
    ///
    /// # Errors
    /// Returns [`crate::RecordError::Decode`] if serialization fails.
    pub fn checksum(&self) -> Result<u32> {
        let bytes = encode(self, Endian::Little)?;
        Ok(CRC32.checksum(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_tracks_contents() {
        let mut file = GuildCardFileBb::default();
        let empty = file.checksum().expect("crc");
        assert_eq!(empty, file.checksum().expect("crc"), "checksum is deterministic");

        file.entries[3].data.guild_card_number = 42_000_001;
        file.entries[3].data.name = WideText::new("\tJFriend");
        let changed = file.checksum().expect("crc");
        assert_ne!(empty, changed);

        file.entries[3].clear();
        assert_eq!(file.checksum().expect("crc"), empty);
    }

    #[test]
    fn clear_zeroes_name() {
        let mut card = GuildCardBb {
            guild_card_number: 7,
            name: WideText::new("\tJAsh"),
            present: 1,
            ..GuildCardBb::default()
        };
        card.clear();
        assert!(card.name.is_empty());
        assert_eq!(card.guild_card_number, 0);
        assert_eq!(card.present, 0);
    }

    #[test]
    fn crc_matches_reference_vector() {
        assert_eq!(CRC32.checksum(b"123456789"), 0xCBF4_3926);
    }
}
