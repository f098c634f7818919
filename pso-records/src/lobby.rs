//! Per-generation lobby player entries.
//!
//! Every `clear()` resets the whole entry, name included.

use binrw::binrw;

use crate::text::{FixedText, WideText};

/// Lobby entry sent to PC clients.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerLobbyDataPc {
    /// Session tag.
    pub player_tag: u32,
    /// Guild card number.
    pub guild_card: u32,
    /// IPv4 address, as the client expects it.
    pub ip_address: u32,
    /// Lobby client slot.
    pub client_id: u32,
    /// Display name.
    pub name: WideText<0x10>,
}

impl PlayerLobbyDataPc {
    /// Reset every field.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Lobby entry sent to DC and GC clients.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerLobbyDataDcGc {
    /// Session tag.
    pub player_tag: u32,
    /// Guild card number.
    pub guild_card: u32,
    /// IPv4 address.
    pub ip_address: u32,
    /// Lobby client slot.
    pub client_id: u32,
    /// Display name.
    pub name: FixedText<0x10>,
}

impl PlayerLobbyDataDcGc {
    /// Reset every field.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Network location block XB clients exchange instead of a bare address.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct XbNetworkLocation {
    /// LAN address.
    pub internal_ipv4_address: u32,
    /// WAN address.
    pub external_ipv4_address: u32,
    /// UDP port.
    pub port: u16,
    /// Console MAC address.
    pub mac_address: [u8; 6],
    /// Reserved by the client.
    pub reserved1: [u8; 8],
    /// Platform account id.
    pub account_id: u64,
    /// Reserved by the client.
    pub reserved2: [u32; 4],
}

impl XbNetworkLocation {
    /// Reset every field.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Lobby entry sent to XB clients.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerLobbyDataXb {
    /// Session tag.
    pub player_tag: u32,
    /// Guild card number.
    pub guild_card: u32,
    /// Network location.
    pub netloc: XbNetworkLocation,
    /// Lobby client slot.
    pub client_id: u32,
    /// Display name.
    pub name: FixedText<0x10>,
}

impl PlayerLobbyDataXb {
    /// Reset every field.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Lobby entry sent to current-generation clients.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerLobbyDataBb {
    /// Session tag.
    pub player_tag: u32,
    /// Guild card number.
    pub guild_card: u32,
    /// IPv4 address.
    pub ip_address: u32,
    /// Reserved by the client.
    pub reserved1: [u8; 0x10],
    /// Lobby client slot.
    pub client_id: u32,
    /// Display name.
    pub name: WideText<0x10>,
    /// Reserved by the client.
    pub reserved2: u32,
}

impl PlayerLobbyDataBb {
    /// Reset every field.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
