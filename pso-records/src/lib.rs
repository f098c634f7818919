//! # pso-records
//!
//! Persistent player and account records for a server that talks to every
//! PSO client generation (DC, PC, GC, XB and BB).
//!
//! Layers, leaves first:
//!
//! - [`item`]: classification of a single item payload (stacking key, stack
//!   limit, equip slot).
//! - [`inventory`]: the 30-slot inventory and 200-slot bank, and the
//!   [`Ledger`] operations that keep them consistent.
//! - [`disp`]: legacy and current display data and the conversions between
//!   them.
//! - [`store`]: per-session loading, fallback, saving and play-time
//!   accounting over a shared cache and storage.
//!
//! ## Invariants
//!
//! After every ledger operation:
//! - occupied slots are contiguous from index 0 and never exceed capacity;
//! - meseta balances stay within `0..=999_999`;
//! - no two slots hold the same combinable item;
//! - at most one inventory slot per equip category is flagged as equipped.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod clock;
pub mod codec;
pub mod config;
pub mod disp;
pub mod error;
pub mod guild_card;
pub mod inventory;
pub mod item;
pub mod level_table;
pub mod lobby;
pub mod metrics;
pub mod records;
pub mod storage;
pub mod store;
pub mod text;
pub mod wire;

pub use cache::{FileCache, LruFileCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StoreConfig;
pub use disp::{DispDataCurrent, DispDataLegacy, PreviewData};
pub use error::{RecordError, Result};
pub use inventory::{Bank, BankItem, CarriedItems, Inventory, InventoryItem, ItemContainer, Ledger};
pub use item::{EquipCategory, ItemData};
pub use level_table::{BaseStatsTable, LevelTable};
pub use metrics::RecordCounters;
pub use records::{AccountRecord, PlayerRecord};
pub use storage::{FsStorage, MemoryStorage, Storage};
pub use store::{LoadSource, PlayerRecordStore, RecordBackend, RecordState};
pub use wire::{ClientGeneration, LegacyPlayerData, PlayerBb, PlayerDataBb, PlayerDataDcPc, PlayerDataV3};
