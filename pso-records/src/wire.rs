//! Per-generation player data layouts exchanged with clients.
//!
//! DC and PC share one layout, GC and XB share another. Every layout is
//! little-endian; GC clients only differ in carrying mag payloads
//! byte-swapped. The current generation submits [`PlayerDataBb`] and is sent
//! the full [`PlayerBb`] on login.

use std::fmt;

use binrw::{Endian, binrw};

use crate::codec::{decode, encode};
use crate::disp::{DispDataCurrent, DispDataLegacy};
use crate::error::{RecordError, Result};
use crate::inventory::{Bank, Inventory};
use crate::records::BLOCKED_SENDER_COUNT;
use crate::text::{ByteBlock, FixedText, WideText};

/// A client generation with its own wire layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientGeneration {
    /// Dreamcast.
    Dc,
    /// PC.
    Pc,
    /// GameCube.
    Gc,
    /// Xbox.
    Xb,
    /// Blue Burst, the current generation.
    Bb,
}

impl ClientGeneration {
    /// Whether this generation carries mag `data2` payloads byte-swapped.
    #[must_use]
    pub const fn swaps_mag_payloads(self) -> bool {
        matches!(self, Self::Gc)
    }

    /// Whether the generation uses the legacy display data layout.
    #[must_use]
    pub const fn is_legacy(self) -> bool {
        !matches!(self, Self::Bb)
    }
}

impl fmt::Display for ClientGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dc => "DC",
            Self::Pc => "PC",
            Self::Gc => "GC",
            Self::Xb => "XB",
            Self::Bb => "BB",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

/// Player data submitted by DC and PC clients.
#[binrw]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerDataDcPc {
    /// Carried items.
    pub inventory: Inventory,
    /// Display data.
    pub disp: DispDataLegacy,
}

/// Player data submitted by GC and XB clients.
#[binrw]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerDataV3 {
    /// Carried items. On GC, mag payloads arrive byte-swapped.
    pub inventory: Inventory,
    /// Display data.
    pub disp: DispDataLegacy,
    /// Client-side quest flags; not persisted.
    pub unknown: ByteBlock<0x134>,
    /// Info board text.
    pub info_board: FixedText<0xAC>,
    /// Guild card numbers whose mail is rejected.
    pub blocked_senders: [u32; BLOCKED_SENDER_COUNT],
    /// Non-zero when `auto_reply` should be used.
    pub auto_reply_enabled: u32,
    /// Mail auto-reply text.
    pub auto_reply: FixedText<0xAC>,
}

/// Player data submitted by current-generation clients.
#[binrw]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerDataBb {
    /// Carried items; the server copy is authoritative.
    pub inventory: Inventory,
    /// Display data; the server copy is authoritative.
    pub disp: DispDataCurrent,
    /// Client-side quest flags; not persisted.
    pub unknown: ByteBlock<0x174>,
    /// Info board text.
    pub info_board: WideText<0xAC>,
    /// Guild card numbers whose mail is rejected.
    pub blocked_senders: [u32; BLOCKED_SENDER_COUNT],
    /// Non-zero when `auto_reply` should be used.
    pub auto_reply_enabled: u32,
    /// Mail auto-reply text.
    pub auto_reply: WideText<0xAC>,
}

impl PlayerDataBb {
    /// Parse a little-endian submission.
    ///
    /// # Errors
    /// [`RecordError::Decode`] or [`RecordError::SizeMismatch`] when the
    /// buffer does not hold exactly one layout.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode(bytes, Endian::Little)
    }

    /// Serialize in little-endian order.
    ///
    /// # Errors
    /// [`RecordError::Decode`] if a field fails to serialize.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self, Endian::Little)
    }
}

/// A submission from one of the legacy generations, tagged by layout.
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyPlayerData {
    /// DC or PC layout.
    DcPc(Box<PlayerDataDcPc>),
    /// GC or XB layout.
    V3 {
        /// The submission.
        data: Box<PlayerDataV3>,
        /// Whether the mag payloads in `data.inventory` are byte-swapped.
        swap_mags: bool,
    },
}

impl LegacyPlayerData {
    /// Parse a submission in the layout of `generation`.
    ///
    /// # Errors
    /// [`RecordError::UnsupportedGeneration`] for the current generation,
    /// otherwise any decode error.
    pub fn parse(generation: ClientGeneration, bytes: &[u8]) -> Result<Self> {
        match generation {
            ClientGeneration::Dc | ClientGeneration::Pc => {
                Ok(Self::DcPc(Box::new(decode(bytes, Endian::Little)?)))
            }
            ClientGeneration::Gc | ClientGeneration::Xb => Ok(Self::V3 {
                data: Box::new(decode(bytes, Endian::Little)?),
                swap_mags: generation.swaps_mag_payloads(),
            }),
            ClientGeneration::Bb => Err(RecordError::UnsupportedGeneration(generation)),
        }
    }

    /// Serialize in the layout of `generation`.
    ///
    /// # Errors
    /// [`RecordError::UnsupportedGeneration`] when `generation` does not use
    /// this variant's layout.
    pub fn to_bytes(&self, generation: ClientGeneration) -> Result<Vec<u8>> {
        match (self, generation) {
            (Self::DcPc(data), ClientGeneration::Dc | ClientGeneration::Pc) => {
                encode(data.as_ref(), Endian::Little)
            }
            (Self::V3 { data, .. }, ClientGeneration::Gc | ClientGeneration::Xb) => {
                encode(data.as_ref(), Endian::Little)
            }
            _ => Err(RecordError::UnsupportedGeneration(generation)),
        }
    }

    /// The display data, whichever layout carried it.
    #[must_use]
    pub fn disp(&self) -> &DispDataLegacy {
        match self {
            Self::DcPc(data) => &data.disp,
            Self::V3 { data, .. } => &data.disp,
        }
    }
}

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

/// The full character image sent to current-generation clients.
#[binrw]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerBb {
    /// Carried items.
    pub inventory: Inventory,
    /// Display data.
    pub disp: DispDataCurrent,
    /// Always zero.
    pub unknown: ByteBlock<0x10>,
    /// Account-wide client option bits.
    pub option_flags: u32,
    /// Quest flags.
    pub quest_data1: ByteBlock<0x208>,
    /// Character bank.
    pub bank: Bank,
    /// Connection-assigned guild card number.
    pub guild_card_number: u32,
    /// Character name.
    pub name: WideText<0x18>,
    /// Team name.
    pub team_name: WideText<0x10>,
    /// Guild card text.
    pub guild_card_description: WideText<0x58>,
    /// Always zero.
    pub reserved1: u8,
    /// Always zero.
    pub reserved2: u8,
    /// Section id, duplicated from the display data.
    pub section_id: u8,
    /// Class, duplicated from the display data.
    pub char_class: u8,
    /// Always zero.
    pub unknown3: u32,
    /// Symbol chat macros.
    pub symbol_chats: ByteBlock<0x4E0>,
    /// Chat shortcuts.
    pub shortcuts: ByteBlock<0xA40>,
    /// Mail auto-reply text.
    pub auto_reply: WideText<0xAC>,
    /// Info board text.
    pub info_board: WideText<0xAC>,
    /// Always zero.
    pub unknown5: ByteBlock<0x1C>,
    /// Challenge-mode progress.
    pub challenge_data: ByteBlock<0x140>,
    /// Technique palette.
    pub tech_menu_config: ByteBlock<0x28>,
    /// Always zero.
    pub unknown6: ByteBlock<0x2C>,
    /// Quest counters.
    pub quest_data2: ByteBlock<0x58>,
    /// Key and joystick bindings.
    pub key_config: ByteBlock<0x16C>,
}

impl PlayerBb {
    /// Serialize in little-endian order.
    ///
    /// # Errors
    /// [`RecordError::Decode`] if a field fails to serialize.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode(self, Endian::Little)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::InventoryItem;
    use crate::item::ItemData;

    fn v3_sample() -> PlayerDataV3 {
        let mut data = PlayerDataV3::default();
        let mut mag = ItemData::default();
        mag.data1[0] = 0x02;
        mag.id = 0x0001_0002;
        mag.data2 = [1, 2, 3, 4];
        data.inventory.items[0] = InventoryItem::new(mag);
        data.inventory.num_items = 1;
        data.disp.stats.level = 20;
        data.disp.visual.name.set("Rico");
        data.info_board.set("hello");
        data.blocked_senders[0] = 77;
        data
    }

    #[test]
    fn gc_is_the_only_generation_swapping_mags() {
        assert!(ClientGeneration::Gc.swaps_mag_payloads());
        for generation in [ClientGeneration::Dc, ClientGeneration::Pc, ClientGeneration::Xb, ClientGeneration::Bb] {
            assert!(!generation.swaps_mag_payloads());
        }
        assert!(!ClientGeneration::Bb.is_legacy());
        assert!(ClientGeneration::Xb.is_legacy());
    }

    #[test]
    fn gc_submission_parses_as_little_endian_v3() {
        let bytes = encode(&v3_sample(), Endian::Little).expect("encode");
        let parsed = LegacyPlayerData::parse(ClientGeneration::Gc, &bytes).expect("parse");
        let LegacyPlayerData::V3 { data, swap_mags } = &parsed else {
            panic!("expected V3 layout, got {parsed:?}");
        };
        assert!(*swap_mags);
        assert_eq!(data.inventory.items[0].data.id, 0x0001_0002);
        assert_eq!(data.inventory.items[0].data.data2, [1, 2, 3, 4], "parse leaves payloads raw");
        assert_eq!(data.blocked_senders[0], 77);
        assert_eq!(parsed.disp().stats.level, 20);
        assert_eq!(parsed.to_bytes(ClientGeneration::Gc).expect("write"), bytes);
    }

    #[test]
    fn xb_submission_shares_gc_bytes_without_swap() {
        let bytes = encode(&v3_sample(), Endian::Little).expect("encode");
        let parsed = LegacyPlayerData::parse(ClientGeneration::Xb, &bytes).expect("parse");
        assert!(matches!(parsed, LegacyPlayerData::V3 { swap_mags: false, .. }));
        assert_eq!(parsed.disp().stats.level, 20);
    }

    #[test]
    fn dc_pc_submission_uses_shared_layout() {
        let data = PlayerDataDcPc::default();
        let bytes = encode(&data, Endian::Little).expect("encode");
        let parsed = LegacyPlayerData::parse(ClientGeneration::Pc, &bytes).expect("parse");
        assert!(matches!(parsed, LegacyPlayerData::DcPc(_)));
        assert!(LegacyPlayerData::parse(ClientGeneration::Gc, &bytes).is_err());
    }

    #[test]
    fn current_generation_is_not_a_legacy_layout() {
        assert!(matches!(
            LegacyPlayerData::parse(ClientGeneration::Bb, &[]),
            Err(RecordError::UnsupportedGeneration(ClientGeneration::Bb))
        ));
        let dcpc = LegacyPlayerData::DcPc(Box::default());
        assert!(dcpc.to_bytes(ClientGeneration::Gc).is_err());
    }

    #[test]
    fn bb_submission_round_trips() {
        let mut data = PlayerDataBb::default();
        data.auto_reply_enabled = 1;
        data.auto_reply.set("\tEaway");
        let bytes = data.to_bytes().expect("encode");
        assert_eq!(PlayerDataBb::from_bytes(&bytes).expect("decode"), data);
    }
}
