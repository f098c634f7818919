//! Error types for the record library.

use thiserror::Error;

use crate::item::EquipCategory;
use crate::wire::ClientGeneration;

/// Top-level error type for all record, ledger and storage operations.
#[derive(Error, Debug)]
pub enum RecordError {
    /// A container has no free slot for a new, non-mergeable item.
    #[error("{container} is full (capacity: {capacity})")]
    Full {
        /// Which container rejected the item ("inventory" or "bank").
        container: &'static str,
        /// Slot capacity of that container.
        capacity: usize,
    },

    /// No occupied slot carries the requested item id.
    #[error("Item not present: {0:#010X}")]
    NotFound(u32),

    /// A meseta withdrawal exceeds the balance and overdraft is not allowed.
    #[error("Insufficient meseta: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Amount the caller asked for.
        requested: u32,
        /// Balance at the time of the request.
        available: u32,
    },

    /// No inventory slot of the category carries the equipped flag.
    #[error("No {0} is equipped")]
    NotEquipped(EquipCategory),

    /// More than one inventory slot of the category is flagged as equipped.
    #[error("Multiple {0}s are equipped")]
    MultipleEquipped(EquipCategory),

    /// A stored record's signature does not match the expected magic.
    #[error("Record header is incorrect: {key}")]
    HeaderMismatch {
        /// File key of the offending record.
        key: String,
    },

    /// A save was attempted while no record is held in memory.
    #[error("{0} data is not loaded")]
    RecordNotLoaded(&'static str),

    /// A character-creation template failed validation or stat lookup.
    #[error("Template application failed: {0}")]
    TemplateInvalid(String),

    /// The session has no username bound, so it has no files.
    #[error("Session is not persistence-backed")]
    NotPersistent,

    /// Base stats are missing for a character class.
    #[error("No base stats for class {0}")]
    UnknownClass(u8),

    /// A buffer is longer than the layout decoded from it.
    #[error("Record size mismatch: layout is {expected} bytes, buffer is {actual}")]
    SizeMismatch {
        /// Bytes consumed by the layout.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },

    /// A wire layout was requested for a generation that does not use it.
    #[error("No such layout for {0} clients")]
    UnsupportedGeneration(ClientGeneration),

    /// Binary layout decoding or encoding failure.
    #[error("Binary layout error: {0}")]
    Decode(#[from] binrw::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, RecordError>;
