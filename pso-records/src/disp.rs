//! Display data: stats, appearance and name, in legacy and current shapes.
//!
//! DC, PC and V3 (GC/XB) clients share one layout, [`DispDataLegacy`]. The
//! current (BB) client uses [`DispDataCurrent`], which adds a UTF-16 name
//! with a language marker, a larger config block and play time. The
//! conversions between the two are explicit and deterministic:
//!
//! | Field              | legacy → current                 | current → legacy        |
//! |--------------------|----------------------------------|-------------------------|
//! | stats, visual      | copied                           | copied                  |
//! | `visual.name`      | set to [`LEGACY_NAME_PLACEHOLDER`] | wide name minus marker |
//! | wide name          | legacy name plus language marker | n/a                     |
//! | config             | legacy block into prefix         | prefix truncated        |
//! | technique levels   | copied                           | copied                  |
//! | play time          | zero                             | dropped                 |

use binrw::binrw;
use serde::{Deserialize, Serialize};

use crate::text::{ByteBlock, FixedText, WideText, add_language_marker, remove_language_marker};

/// What current-format records keep in `visual.name`; the real name lives
/// in the wide name field.
pub const LEGACY_NAME_PLACEHOLDER: &str = "         0";

/// Highest class code legacy clients can render.
pub const LEGACY_MAX_CLASS: u8 = 8;

/// Classes legacy clients lack, and the closest class they do have.
pub const LEGACY_CLASS_REMAP: [(u8, u8); 3] = [
    (11, 0), // FOmar -> HUmar
    (10, 1), // RAmarl -> HUnewearl
    (9, 5),  // HUcaseal -> RAcaseal
];

/// `extra_model` value of the NPC shown for classes that cannot be remapped.
pub const NPC_EXTRA_MODEL: u8 = 0;

/// `v2_flags` bit telling legacy clients to render `extra_model`.
pub const V2_FLAG_EXTRA_MODEL: u8 = 0x02;

/// `visual.version` stamped on every record sent to a legacy client.
pub const LEGACY_VISUAL_VERSION: u8 = 2;

const LEGACY_CONFIG_SIZE: usize = 0x48;
const CURRENT_CONFIG_SIZE: usize = 0xE8;

/// Base combat stats.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CharStats {
    /// Attack power.
    pub atp: u16,
    /// Mental strength.
    pub mst: u16,
    /// Evasion.
    pub evp: u16,
    /// Hit points.
    pub hp: u16,
    /// Defense.
    pub dfp: u16,
    /// Accuracy.
    pub ata: u16,
    /// Luck.
    pub lck: u16,
}

/// Level, experience, meseta and base stats.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerStats {
    /// Base combat stats.
    pub char_stats: CharStats,
    /// Reserved by the client.
    pub reserved1: u16,
    /// Reserved by the client.
    pub reserved2: u32,
    /// Reserved by the client.
    pub reserved3: u32,
    /// Zero-based level.
    pub level: u32,
    /// Total experience.
    pub experience: u32,
    /// On-hand meseta; the inventory is accounted against this counter.
    pub meseta: u32,
}

/// Appearance and class.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerVisualConfig {
    /// Legacy name, or [`LEGACY_NAME_PLACEHOLDER`] in current records.
    pub name: FixedText<0x10>,
    /// Reserved by the client.
    pub reserved1: [u8; 8],
    /// ARGB name colour.
    pub name_color: u32,
    /// Alternate model index, used when [`V2_FLAG_EXTRA_MODEL`] is set.
    pub extra_model: u8,
    /// Reserved by the client.
    pub reserved2: [u8; 0x0F],
    /// Client-computed checksum of the name colour.
    pub name_color_checksum: u32,
    /// Section id (drop table).
    pub section_id: u8,
    /// Character class code.
    pub char_class: u8,
    /// Legacy v2 flags.
    pub v2_flags: u8,
    /// Format version marker.
    pub version: u8,
    /// Legacy v1 flags.
    pub v1_flags: u32,
    /// Costume index.
    pub costume: u16,
    /// Skin index.
    pub skin: u16,
    /// Face index.
    pub face: u16,
    /// Head index.
    pub head: u16,
    /// Hair style index.
    pub hair: u16,
    /// Hair colour, red.
    pub hair_r: u16,
    /// Hair colour, green.
    pub hair_g: u16,
    /// Hair colour, blue.
    pub hair_b: u16,
    /// Body width proportion.
    pub proportion_x: f32,
    /// Body height proportion.
    pub proportion_y: f32,
}

/// Display data shared by DC, PC and V3 clients.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DispDataLegacy {
    /// Stats block.
    pub stats: PlayerStats,
    /// Appearance block; `visual.name` is the character's name.
    pub visual: PlayerVisualConfig,
    /// Client option block.
    pub config: ByteBlock<LEGACY_CONFIG_SIZE>,
    /// Technique level table.
    pub technique_levels: ByteBlock<0x14>,
}

/// Display data of the current client generation.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DispDataCurrent {
    /// Stats block.
    pub stats: PlayerStats,
    /// Appearance block; `visual.name` holds the placeholder.
    pub visual: PlayerVisualConfig,
    /// Language-tagged UTF-16 name.
    pub name: WideText<0x10>,
    /// Accumulated play time in seconds.
    pub play_time: u32,
    /// Reserved by the client.
    pub reserved: u32,
    /// Client option block.
    pub config: ByteBlock<CURRENT_CONFIG_SIZE>,
    /// Technique level table.
    pub technique_levels: ByteBlock<0x14>,
}

/// The slice of display data shown on the character-select screen.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PreviewData {
    /// Total experience.
    pub experience: u32,
    /// Zero-based level.
    pub level: u32,
    /// Appearance block.
    pub visual: PlayerVisualConfig,
    /// Language-tagged UTF-16 name.
    pub name: WideText<0x10>,
    /// Accumulated play time in seconds.
    pub play_time: u32,
}

impl DispDataLegacy {
    /// Convert to the current shape, tagging the name with `language_marker`.
    #[must_use]
    pub fn to_current(&self, language_marker: char) -> DispDataCurrent {
        let mut current = DispDataCurrent {
            stats: self.stats,
            visual: self.visual,
            technique_levels: self.technique_levels,
            ..DispDataCurrent::default()
        };
        current.visual.name = FixedText::new(LEGACY_NAME_PLACEHOLDER);
        current
            .name
            .set(&add_language_marker(&self.visual.name.to_string_lossy(), language_marker));
        current.config.0[..LEGACY_CONFIG_SIZE].copy_from_slice(&self.config.0);
        current
    }

    /// Collapse classes legacy clients cannot render onto ones they can,
    /// fall back to the NPC model for anything still out of range, and stamp
    /// the legacy version marker.
    pub fn enforce_legacy_limits(&mut self) {
        let visual = &mut self.visual;
        if let Some(&(_, to)) = LEGACY_CLASS_REMAP.iter().find(|(from, _)| *from == visual.char_class) {
            visual.char_class = to;
        }
        if visual.char_class > LEGACY_MAX_CLASS {
            visual.extra_model = NPC_EXTRA_MODEL;
            visual.v2_flags |= V2_FLAG_EXTRA_MODEL;
        }
        visual.version = LEGACY_VISUAL_VERSION;
    }
}

impl DispDataCurrent {
    /// Convert to the legacy shape. The language marker is stripped and the
    /// name narrowed to 8-bit text; play time and the tail of the config
    /// block are dropped.
    #[must_use]
    pub fn to_legacy(&self) -> DispDataLegacy {
        let mut legacy = DispDataLegacy {
            stats: self.stats,
            visual: self.visual,
            technique_levels: self.technique_levels,
            ..DispDataLegacy::default()
        };
        let name = self.name.to_string_lossy();
        legacy.visual.name = FixedText::new(remove_language_marker(&name));
        legacy.config.0.copy_from_slice(&self.config.0[..LEGACY_CONFIG_SIZE]);
        legacy
    }

    /// Project onto the character-select preview.
    #[must_use]
    pub fn to_preview(&self) -> PreviewData {
        PreviewData {
            experience: self.stats.experience,
            level: self.stats.level,
            visual: self.visual,
            name: self.name,
            play_time: self.play_time,
        }
    }

    /// Merge a preview in: level, experience, the whole visual block and the
    /// name. Play time is left alone.
    pub fn apply_preview(&mut self, preview: &PreviewData) {
        self.stats.level = preview.level;
        self.stats.experience = preview.experience;
        self.visual = preview.visual;
        self.name = preview.name;
    }

    /// Merge only the cosmetic subset of a preview plus the name. Stats,
    /// `visual.name` and the colour checksum are untouched.
    pub fn apply_dressing_room(&mut self, preview: &PreviewData) {
        let src = &preview.visual;
        let dst = &mut self.visual;
        dst.name_color = src.name_color;
        dst.extra_model = src.extra_model;
        dst.reserved2 = src.reserved2;
        dst.section_id = src.section_id;
        dst.char_class = src.char_class;
        dst.v2_flags = src.v2_flags;
        dst.version = src.version;
        dst.v1_flags = src.v1_flags;
        dst.costume = src.costume;
        dst.skin = src.skin;
        dst.face = src.face;
        dst.head = src.head;
        dst.hair = src.hair;
        dst.hair_r = src.hair_r;
        dst.hair_g = src.hair_g;
        dst.hair_b = src.hair_b;
        dst.proportion_x = src.proportion_x;
        dst.proportion_y = src.proportion_y;
        self.name = preview.name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_current() -> DispDataCurrent {
        let mut disp = DispDataCurrent::default();
        disp.stats.level = 41;
        disp.stats.experience = 123_456;
        disp.stats.meseta = 777;
        disp.stats.char_stats.atp = 300;
        disp.visual.name = FixedText::new(LEGACY_NAME_PLACEHOLDER);
        disp.visual.section_id = 3;
        disp.visual.char_class = 6;
        disp.visual.costume = 2;
        disp.visual.hair_r = 200;
        disp.visual.proportion_x = 0.25;
        disp.visual.proportion_y = 0.75;
        disp.name = WideText::new("\tJAsh");
        disp.play_time = 3600;
        disp.technique_levels.0[0] = 4;
        disp.config.0[0] = 9;
        disp.config.0[0xE0] = 1;
        disp
    }

    #[test]
    fn current_to_legacy_strips_marker() {
        let legacy = sample_current().to_legacy();
        assert_eq!(legacy.visual.name.to_string_lossy(), "Ash");
        assert_eq!(legacy.stats, sample_current().stats);
        assert_eq!(legacy.technique_levels.0[0], 4);
        assert_eq!(legacy.config.0[0], 9);
    }

    #[test]
    fn legacy_to_current_tags_name_and_placeholder() {
        let mut legacy = DispDataLegacy::default();
        legacy.visual.name = FixedText::new("Ash");
        let current = legacy.to_current('J');
        assert_eq!(current.name.to_string_lossy(), "\tJAsh");
        assert_eq!(current.visual.name.to_string_lossy(), LEGACY_NAME_PLACEHOLDER);
        assert_eq!(current.play_time, 0);
    }

    #[test]
    fn round_trip_restores_stats_and_visual() {
        let original = sample_current();
        let restored = original.to_legacy().to_current('J');
        assert_eq!(restored.stats, original.stats);
        assert_eq!(restored.visual, original.visual);
        assert_eq!(restored.name, original.name);
        assert_eq!(restored.technique_levels, original.technique_levels);
        // Documented losses.
        assert_eq!(restored.play_time, 0);
        assert_eq!(restored.config.0[0], 9);
        assert_eq!(restored.config.0[0xE0], 0);
    }

    #[test]
    fn remapped_classes() {
        for (from, to) in LEGACY_CLASS_REMAP {
            let mut legacy = DispDataLegacy::default();
            legacy.visual.char_class = from;
            legacy.visual.extra_model = 7;
            legacy.enforce_legacy_limits();
            assert_eq!(legacy.visual.char_class, to);
            assert_eq!(legacy.visual.extra_model, 7, "remapped classes keep their model");
            assert_eq!(legacy.visual.v2_flags & V2_FLAG_EXTRA_MODEL, 0);
            assert_eq!(legacy.visual.version, LEGACY_VISUAL_VERSION);
        }
    }

    #[test]
    fn unsupported_class_becomes_npc() {
        let mut legacy = DispDataLegacy::default();
        legacy.visual.char_class = 12;
        legacy.visual.extra_model = 7;
        legacy.enforce_legacy_limits();
        assert_eq!(legacy.visual.char_class, 12);
        assert_eq!(legacy.visual.extra_model, NPC_EXTRA_MODEL);
        assert_ne!(legacy.visual.v2_flags & V2_FLAG_EXTRA_MODEL, 0);
    }

    #[test]
    fn supported_class_only_gets_version() {
        let mut legacy = DispDataLegacy::default();
        legacy.visual.char_class = 4;
        legacy.visual.version = 9;
        legacy.enforce_legacy_limits();
        assert_eq!(legacy.visual.char_class, 4);
        assert_eq!(legacy.visual.version, LEGACY_VISUAL_VERSION);
        assert_eq!(legacy.visual.v2_flags, 0);
    }

    #[test]
    fn preview_projection() {
        let disp = sample_current();
        let preview = disp.to_preview();
        assert_eq!(preview.level, 41);
        assert_eq!(preview.play_time, 3600);

        let mut target = DispDataCurrent::default();
        target.play_time = 5;
        target.apply_preview(&preview);
        assert_eq!(target.stats.level, 41);
        assert_eq!(target.stats.experience, 123_456);
        assert_eq!(target.stats.meseta, 0, "meseta is not part of the preview");
        assert_eq!(target.visual, disp.visual);
        assert_eq!(target.play_time, 5);
    }

    #[test]
    fn dressing_room_is_cosmetic_only() {
        let mut disp = sample_current();
        let mut preview = disp.to_preview();
        preview.level = 1;
        preview.visual.costume = 9;
        preview.visual.char_class = 2;
        preview.visual.name = FixedText::new("ignored");
        preview.visual.name_color_checksum = 0xDEAD;
        preview.name = WideText::new("\tJNew");

        disp.apply_dressing_room(&preview);
        assert_eq!(disp.stats.level, 41);
        assert_eq!(disp.visual.costume, 9);
        assert_eq!(disp.visual.char_class, 2);
        assert_eq!(disp.visual.name.to_string_lossy(), LEGACY_NAME_PLACEHOLDER);
        assert_eq!(disp.visual.name_color_checksum, 0);
        assert_eq!(disp.name.to_string_lossy(), "\tJNew");
    }
}
