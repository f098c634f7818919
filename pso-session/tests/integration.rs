//! Integration tests: sessions over a real filesystem.
//!
//! A host is built from TOML the way a server would, with templates and a
//! base-stats table seeded into a temporary directory.

use std::path::Path;

use pso_records::codec::{decode, encode};
use pso_records::item::UNSET_ITEM_ID;
use pso_records::{
    AccountRecord, Bank, BankItem, ClientGeneration, InventoryItem, ItemData, Ledger, LegacyPlayerData,
    PlayerDataBb, PlayerDataV3, PlayerRecord, PreviewData, RecordError, Storage,
};
use pso_session::{ClientEvent, EventOutcome, SessionConfig, SessionError, SessionHost};

const LEVEL_TABLE: &str = r"
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
char_class = 6
atp = 13
mst = 53
evp = 40
hp = 14
dfp = 10
ata = 24
lck = 10
";

fn host(dir: &Path, save_to_filesystem: bool) -> anyhow::Result<SessionHost> {
    std::fs::write(dir.join("level-table.toml"), LEVEL_TABLE)?;
    let config = SessionConfig::from_toml(&format!(
        "storage_root = {root:?}\nlevel_table = {table:?}\n\n[store]\nsave_to_filesystem = {save_to_filesystem}\n",
        root = dir.display().to_string(),
        table = dir.join("level-table.toml").display().to_string(),
    ))?;
    let host = SessionHost::from_config(&config)?;

    let storage = host.backend().storage();
    storage.write(
        "system/players/default.nsa",
        &encode(&AccountRecord::new(), binrw::Endian::Little)?,
    )?;
    for class in [0u8, 6] {
        let mut template = PlayerRecord::new();
        template.disp.stats.meseta = 300;
        template.disp.visual.char_class = class;
        storage.write(
            &format!("system/players/default_player_{class}.nsc"),
            &encode(&template, binrw::Endian::Little)?,
        )?;
    }
    Ok(host)
}

fn preview(char_class: u8, name: &str) -> PreviewData {
    let mut preview = PreviewData::default();
    preview.visual.char_class = char_class;
    preview.name.set(name);
    preview
}

fn monomate(amount: u8) -> ItemData {
    let mut item = ItemData::default();
    item.data1[0] = 0x03;
    item.data1[5] = amount;
    item.id = 0x0001_0000;
    item
}

fn saber(id: u32) -> ItemData {
    let mut item = ItemData::default();
    item.data1[1] = 0x01;
    item.id = id;
    item
}

fn read_player(host: &SessionHost, key: &str) -> anyhow::Result<PlayerRecord> {
    let bytes = host.backend().storage().read(key)?;
    Ok(decode(&bytes, binrw::Endian::Little)?)
}

// ---------------------------------------------------------------------------
// Slot exclusivity
// ---------------------------------------------------------------------------

#[test]
fn second_login_to_active_slot_is_rejected() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let host = host(dir.path(), true)?;

    let first = host.login(ClientGeneration::Bb, "ash", 0, 42_000_001)?;
    let second = host.login(ClientGeneration::Gc, "ash", 0, 42_000_001);
    assert!(matches!(second, Err(SessionError::SlotActive { slot: 0, .. })));

    let other_slot = host.login(ClientGeneration::Gc, "ash", 1, 42_000_001)?;
    drop(other_slot);

    first.close()?;
    assert!(host.registry().is_empty());
    let _again = host.login(ClientGeneration::Gc, "ash", 0, 42_000_001)?;
    Ok(())
}

#[test]
fn change_slot_takes_new_lease_before_releasing_old() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let host = host(dir.path(), true)?;

    let mut a = host.login(ClientGeneration::Bb, "ash", 0, 1)?;
    let _b = host.login(ClientGeneration::Bb, "ash", 1, 1)?;

    let refused = a.apply(ClientEvent::ChangeSlot(1));
    assert!(matches!(refused, Err(SessionError::SlotActive { slot: 1, .. })));
    assert_eq!(a.lease().map(pso_session::SlotLease::slot), Some(0));

    a.apply(ClientEvent::ChangeSlot(2))?;
    assert!(!host.registry().is_active("ash", 0));
    assert!(host.registry().is_active("ash", 2));
    assert_eq!(a.store().slot(), 2);
    Ok(())
}

// ---------------------------------------------------------------------------
// Character lifecycle
// ---------------------------------------------------------------------------

#[test]
fn create_play_and_drop_saves_everything() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let host = host(dir.path(), true)?;

    {
        let mut session = host.login(ClientGeneration::Bb, "ash", 0, 7)?;
        session.apply(ClientEvent::CreateCharacter(preview(6, "\tERin")))?;
        session.apply(ClientEvent::PickUp(ItemData::meseta(200)))?;
        session.apply(ClientEvent::PickUp(monomate(3)))?;
        session.apply(ClientEvent::PickUp(saber(0x0001_0001)))?;
    }

    let saved = read_player(&host, "system/players/player_ash_1.nsc")?;
    assert_eq!(saved.disp.name.to_string_lossy(), "\tERin");
    assert_eq!(saved.disp.stats.char_stats.mst, 53);
    assert_eq!(saved.disp.stats.meseta, 500);
    assert_eq!(saved.inventory.num_items, 2);
    assert!(host.registry().is_empty());
    Ok(())
}

#[test]
fn dressing_room_renames_and_keeps_stats() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let host = host(dir.path(), true)?;
    let mut session = host.login(ClientGeneration::Bb, "dee", 0, 7)?;
    session.apply(ClientEvent::CreateCharacter(preview(6, "\tEDee")))?;
    let level = session.store().player()?.disp.stats.level;

    let mut restyle = preview(6, "\tENewDee");
    restyle.visual.costume = 4;
    restyle.level = 80;
    session.apply(ClientEvent::DressingRoom(restyle))?;
    session.close()?;

    let saved = read_player(&host, "system/players/player_dee_1.nsc")?;
    assert_eq!(saved.disp.name.to_string_lossy(), "\tENewDee");
    assert_eq!(saved.disp.visual.costume, 4);
    assert_eq!(saved.disp.stats.level, level);
    assert_eq!(saved.disp.stats.char_stats.mst, 53);
    Ok(())
}

#[test]
fn drop_releases_split_stack_and_meseta() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let host = host(dir.path(), true)?;
    let mut session = host.login(ClientGeneration::Bb, "ash", 0, 7)?;
    session.apply(ClientEvent::CreateCharacter(preview(0, "\tEAsh")))?;
    session.apply(ClientEvent::PickUp(monomate(5)))?;

    let EventOutcome::ItemReleased(part) = session.apply(ClientEvent::Drop {
        item_id: 0x0001_0000,
        amount: 2,
    })?
    else {
        panic!("expected a released item");
    };
    assert_eq!(part.stack_size(), 2);
    assert_eq!(part.id, UNSET_ITEM_ID);

    let EventOutcome::ItemReleased(coins) = session.apply(ClientEvent::Drop {
        item_id: UNSET_ITEM_ID,
        amount: 100,
    })?
    else {
        panic!("expected meseta");
    };
    assert_eq!(coins.meseta_amount(), 100);

    let overdraw = session.apply(ClientEvent::Drop {
        item_id: UNSET_ITEM_ID,
        amount: 1_000,
    });
    assert!(matches!(
        overdraw,
        Err(SessionError::Record(RecordError::InsufficientFunds { available: 200, .. }))
    ));

    let player = session.store().player()?;
    assert_eq!(player.inventory.items[0].data.stack_size(), 3);
    assert_eq!(player.disp.stats.meseta, 200);
    Ok(())
}

// ---------------------------------------------------------------------------
// Bank transfers
// ---------------------------------------------------------------------------

#[test]
fn bank_round_trip_moves_items_and_meseta() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let host = host(dir.path(), true)?;
    let mut session = host.login(ClientGeneration::Bb, "ash", 0, 7)?;
    session.apply(ClientEvent::CreateCharacter(preview(0, "\tEAsh")))?;
    session.apply(ClientEvent::PickUp(saber(0x0001_0001)))?;

    session.apply(ClientEvent::BankDeposit {
        item_id: 0x0001_0001,
        amount: 0,
    })?;
    session.apply(ClientEvent::BankDeposit {
        item_id: UNSET_ITEM_ID,
        amount: 250,
    })?;
    {
        let player = session.store().player()?;
        assert_eq!(player.inventory.num_items, 0);
        assert_eq!(player.bank.occupied().len(), 1);
        assert_eq!(player.bank.meseta, 250);
        assert_eq!(player.disp.stats.meseta, 50);
    }

    session.apply(ClientEvent::BankWithdraw {
        item_id: 0x0001_0001,
        amount: 0,
    })?;
    let refused = session.apply(ClientEvent::BankWithdraw {
        item_id: UNSET_ITEM_ID,
        amount: 251,
    });
    assert!(matches!(
        refused,
        Err(SessionError::Record(RecordError::InsufficientFunds { .. }))
    ));

    let player = session.store().player()?;
    assert_eq!(player.inventory.items[0].data.id, 0x0001_0001);
    assert_eq!(player.bank.meseta, 250);
    Ok(())
}

#[test]
fn withdraw_into_full_inventory_leaves_bank_intact() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let host = host(dir.path(), true)?;
    let mut session = host.login(ClientGeneration::Bb, "ash", 0, 7)?;
    session.apply(ClientEvent::CreateCharacter(preview(0, "\tEAsh")))?;

    let bank_saber = 0x0F01_0001;
    let before = {
        let player = session.store().player_mut()?;
        player.bank = Bank::default();
        for id in 0..3 {
            player.bank.add_item(BankItem::new(saber(0x0F01_0000 + id)))?;
        }
        for id in 0..30 {
            player.carried().add_item(InventoryItem::new(saber(0x0001_0100 + id)))?;
        }
        player.clone()
    };

    let refused = session.apply(ClientEvent::BankWithdraw {
        item_id: bank_saber,
        amount: 0,
    });
    assert!(matches!(
        refused,
        Err(SessionError::Record(RecordError::Full {
            container: "inventory",
            capacity: 30
        }))
    ));
    let player = session.store().player()?;
    assert_eq!(player.bank, before.bank);
    assert_eq!(player.bank.items[1].data.id, bank_saber);
    assert_eq!(player.inventory, before.inventory);
    Ok(())
}

#[test]
fn deposit_into_full_bank_keeps_inventory_order() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let host = host(dir.path(), true)?;
    let mut session = host.login(ClientGeneration::Bb, "bo", 0, 7)?;
    session.apply(ClientEvent::CreateCharacter(preview(0, "\tEBo")))?;

    let before = {
        let player = session.store().player_mut()?;
        player.bank = Bank::default();
        for id in 0..200 {
            player.bank.add_item(BankItem::new(saber(0x0F01_0000 + id)))?;
        }
        for id in 0..3 {
            player.carried().add_item(InventoryItem::new(saber(0x0001_0200 + id)))?;
        }
        player.clone()
    };
    let middle = before.inventory.occupied()[1].data.id;

    let refused = session.apply(ClientEvent::BankDeposit {
        item_id: middle,
        amount: 0,
    });
    assert!(matches!(
        refused,
        Err(SessionError::Record(RecordError::Full {
            container: "bank",
            capacity: 200
        }))
    ));
    let player = session.store().player()?;
    assert_eq!(player.inventory, before.inventory);
    assert_eq!(player.inventory.occupied()[1].data.id, middle);
    assert_eq!(player.bank, before.bank);

    // A stack already in the bank still takes more of the same tool.
    session.store().player_mut()?.bank.items[0] = BankItem::new(monomate(2));
    session.apply(ClientEvent::PickUp(monomate(3)))?;
    session.apply(ClientEvent::BankDeposit {
        item_id: monomate(3).id,
        amount: 0,
    })?;
    assert_eq!(session.store().player()?.bank.items[0].data.stack_size(), 5);
    Ok(())
}

// ---------------------------------------------------------------------------
// Cross-generation exchange
// ---------------------------------------------------------------------------

#[test]
fn gc_export_swaps_mags_and_reimports_cleanly() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let host = host(dir.path(), true)?;
    let mut session = host.login(ClientGeneration::Gc, "kai", 0, 9)?;
    session.apply(ClientEvent::CreateCharacter(preview(0, "\tJKai")))?;

    let mut mag = ItemData::default();
    mag.data1[0] = 0x02;
    mag.data2 = [1, 2, 3, 4];
    mag.id = 0x0001_0002;
    session.apply(ClientEvent::PickUp(mag))?;
    session.store().player_mut()?.info_board.set("hello");

    let bytes = session.export_for_client()?;
    let LegacyPlayerData::V3 { data, swap_mags } = LegacyPlayerData::parse(ClientGeneration::Gc, &bytes)?
    else {
        panic!("expected the V3 layout");
    };
    assert!(swap_mags);
    assert_eq!(data.inventory.items[0].data.data2, [4, 3, 2, 1]);

    // The GC layout is little-endian; only the mag payload is swapped.
    let raw: PlayerDataV3 = decode(&bytes, binrw::Endian::Little)?;
    assert_eq!(raw.inventory.items[0].data.id, 0x0001_0002);
    assert_eq!(raw.inventory.items[0].data.data2, [4, 3, 2, 1]);
    assert_eq!(raw.disp.stats.level, data.disp.stats.level);
    assert_eq!(data.disp.visual.name.to_string_lossy(), "Kai");
    assert_eq!(data.info_board.to_string_lossy(), "hello");

    session.apply(ClientEvent::SubmitPlayerData(bytes))?;
    let player = session.store().player()?;
    assert_eq!(player.inventory.items[0].data.data2, [1, 2, 3, 4]);
    assert_eq!(player.disp.name.to_string_lossy(), "\tJKai");
    Ok(())
}

#[test]
fn dc_export_narrows_display_data() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let host = host(dir.path(), true)?;
    let mut session = host.login(ClientGeneration::Dc, "old", 0, 9)?;
    session.apply(ClientEvent::CreateCharacter(preview(0, "\tJSonic")))?;

    let bytes = session.export_for_client()?;
    let LegacyPlayerData::DcPc(data) = LegacyPlayerData::parse(ClientGeneration::Dc, &bytes)? else {
        panic!("expected the DC/PC layout");
    };
    assert_eq!(data.disp.visual.name.to_string_lossy(), "Sonic");
    assert_eq!(data.disp.visual.version, 2);
    Ok(())
}

#[test]
fn bb_submission_only_touches_social_fields() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let host = host(dir.path(), true)?;
    let mut session = host.login(ClientGeneration::Bb, "bb", 0, 9)?;
    session.apply(ClientEvent::CreateCharacter(preview(0, "\tEBee")))?;

    let mut submitted = PlayerDataBb::default();
    submitted.disp.stats.meseta = 999_999;
    submitted.info_board.set("LF party");
    submitted.blocked_senders[0] = 1234;
    submitted.auto_reply.set("ignored while disabled");
    session.apply(ClientEvent::SubmitPlayerData(submitted.to_bytes()?))?;

    assert_eq!(session.store().account()?.blocked_senders[0], 1234);
    let player = session.store().player()?;
    assert_eq!(player.disp.stats.meseta, 300);
    assert_eq!(player.info_board.to_string_lossy(), "LF party");
    assert!(player.auto_reply.is_empty());

    let legacy_bytes = encode(&PlayerDataV3::default(), binrw::Endian::Little)?;
    assert!(matches!(
        session.apply(ClientEvent::SubmitPlayerData(legacy_bytes)),
        Err(SessionError::Record(_))
    ));
    Ok(())
}

// ---------------------------------------------------------------------------
// Anonymous and cache-only sessions
// ---------------------------------------------------------------------------

#[test]
fn anonymous_session_never_writes() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let host = host(dir.path(), true)?;
    let mut session = host.anonymous(ClientGeneration::Pc);
    assert!(session.lease().is_none());

    session.apply(ClientEvent::PickUp(ItemData::meseta(10)))?;
    session.apply(ClientEvent::Save)?;
    assert!(matches!(
        session.apply(ClientEvent::CreateCharacter(preview(0, "x"))),
        Err(SessionError::Record(RecordError::NotPersistent))
    ));
    session.close()?;

    let counters = host.backend().counters().snapshot();
    assert_eq!(counters.saves_to_filesystem + counters.saves_to_cache_only, 0);
    Ok(())
}

#[test]
fn cache_only_host_keeps_disk_clean() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let host = host(dir.path(), false)?;
    let mut session = host.login(ClientGeneration::Bb, "eph", 0, 3)?;
    session.apply(ClientEvent::CreateCharacter(preview(0, "\tEEph")))?;
    session.apply(ClientEvent::Save)?;
    session.close()?;

    assert!(!dir.path().join("system/players/player_eph_1.nsc").exists());
    let mut again = host.login(ClientGeneration::Bb, "eph", 0, 3)?;
    assert_eq!(again.store().player()?.disp.name.to_string_lossy(), "\tEEph");
    Ok(())
}
