//! Per-class base stats used when a character is created.
//!
//! The table is a TOML document with one `[[class]]` entry per class:
//!
//! ```toml
//! [[class]]
//! char_class = 0
//! atp = 37
//! mst = 0
//! evp = 41
//! hp = 20
//! dfp = 15
//! ata = 30
//! lck = 10
//! ```

use serde::{Deserialize, Serialize};

use crate::disp::CharStats;
use crate::error::{RecordError, Result};

/// Base-stat lookup by class.
pub trait LevelTable: Send + Sync {
    /// Level-1 stats for `char_class`.
    ///
    /// # Errors
    /// [`RecordError::UnknownClass`] when the class has no entry.
    fn base_stats_for_class(&self, char_class: u8) -> Result<CharStats>;
}

/// One class row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBaseStats {
    /// Class code.
    pub char_class: u8,
    /// Stats for that class.
    #[serde(flatten)]
    pub stats: CharStats,
}

/// A [`LevelTable`] loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStatsTable {
    /// Rows, one per class.
    #[serde(default, rename = "class")]
    pub classes: Vec<ClassBaseStats>,
}

impl BaseStatsTable {
    /// Parse a table from TOML.
    ///
    /// # Errors
    /// [`RecordError::Config`] if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| RecordError::Config(e.to_string()))
    }

    /// Load a table from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Add or replace the row for `char_class`.
    pub fn insert(&mut self, char_class: u8, stats: CharStats) {
        match self.classes.iter_mut().find(|row| row.char_class == char_class) {
            Some(row) => row.stats = stats,
            None => self.classes.push(ClassBaseStats { char_class, stats }),
        }
    }
}

impl LevelTable for BaseStatsTable {
    fn base_stats_for_class(&self, char_class: u8) -> Result<CharStats> {
        self.classes
            .iter()
            .find(|row| row.char_class == char_class)
            .map(|row| row.stats)
            .ok_or(RecordError::UnknownClass(char_class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
        [[class]]
        char_class = 0
        atp = 37
        mst = 0
        evp = 41
        hp = 20
        dfp = 15
        ata = 30
        lck = 10

        [[class]]
        char_class = 12
        atp = 30
        mst = 45
        evp = 38
        hp = 18
        dfp = 10
        ata = 28
        lck = 10
    ";

    #[test]
    fn parses_rows() {
        let table = BaseStatsTable::from_toml(SAMPLE).expect("parse");
        assert_eq!(table.classes.len(), 2);
        let stats = table.base_stats_for_class(12).expect("class 12");
        assert_eq!(stats.mst, 45);
        assert_eq!(stats.hp, 18);
    }

    #[test]
    fn unknown_class_is_an_error() {
        let table = BaseStatsTable::from_toml(SAMPLE).expect("parse");
        assert!(matches!(
            table.base_stats_for_class(5),
            Err(RecordError::UnknownClass(5))
        ));
    }

    #[test]
    fn empty_document_is_an_empty_table() {
        let table = BaseStatsTable::from_toml("").expect("parse");
        assert!(table.classes.is_empty());
    }

    #[test]
    fn insert_replaces_existing_row() {
        let mut table = BaseStatsTable::default();
        table.insert(3, CharStats { atp: 1, ..CharStats::default() });
        table.insert(3, CharStats { atp: 2, ..CharStats::default() });
        assert_eq!(table.classes.len(), 1);
        assert_eq!(table.base_stats_for_class(3).expect("row").atp, 2);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        assert!(matches!(
            BaseStatsTable::from_toml("[[class]]\nchar_class = \"x\""),
            Err(RecordError::Config(_))
        ));
    }
}
