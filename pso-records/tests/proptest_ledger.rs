//! Property-based tests for the inventory ledger and display conversions.
//!
//! Random operation sequences are applied to inventories and banks, and the
//! container invariants are checked after every step.

use std::collections::HashSet;

use proptest::prelude::*;

use pso_records::disp::DispDataCurrent;
use pso_records::inventory::{BANK_CAPACITY, INVENTORY_CAPACITY};
use pso_records::item::{MAX_MESETA, UNSET_ITEM_ID};
use pso_records::text::FixedText;
use pso_records::{Bank, BankItem, CarriedItems, Inventory, InventoryItem, ItemData, Ledger};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_item() -> impl Strategy<Value = ItemData> {
    prop_oneof![
        // Weapons and armor: never stack.
        (0u8..2, 0u8..4, any::<u32>()).prop_map(|(kind, subtype, id)| {
            let mut item = ItemData::default();
            item.data1[0] = kind;
            item.data1[1] = subtype;
            item.id = id;
            item
        }),
        // Stackable tools.
        (0u8..=8, 1u8..=10, any::<u32>()).prop_map(|(subtype, amount, id)| {
            let mut item = ItemData::default();
            item.data1[0] = 0x03;
            item.data1[1] = subtype;
            item.data1[5] = amount;
            item.id = id;
            item
        }),
        (0u32..=MAX_MESETA).prop_map(ItemData::meseta),
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Add(ItemData),
    Remove { pick: usize, amount: u32 },
    Withdraw(u32),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => arb_item().prop_map(Op::Add),
        2 => (any::<usize>(), 0u32..12).prop_map(|(pick, amount)| Op::Remove { pick, amount }),
        1 => (0u32..2_000_000).prop_map(Op::Withdraw),
    ]
}

fn check_invariants(items: &[ItemData], meseta: u32, capacity: usize) -> Result<(), TestCaseError> {
    prop_assert!(items.len() <= capacity);
    prop_assert!(meseta <= MAX_MESETA);
    let mut stack_keys = HashSet::new();
    for item in items {
        prop_assert!(!item.is_meseta(), "meseta never occupies a slot");
        if item.max_stack_size() > 1 {
            prop_assert!(
                stack_keys.insert(item.primary_identifier()),
                "duplicate stack {:#08X}",
                item.primary_identifier()
            );
            prop_assert!(item.stack_size() <= item.max_stack_size());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Property: inventory invariants hold under any operation sequence
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn inventory_invariants_hold(ops in prop::collection::vec(arb_op(), 0..120)) {
        let mut inventory = Inventory::default();
        let mut meseta = 0u32;
        for op in ops {
            let mut carried = CarriedItems { inventory: &mut inventory, meseta: &mut meseta };
            match op {
                Op::Add(item) => { let _ = carried.add_item(InventoryItem::new(item)); }
                Op::Remove { pick, amount } => {
                    let count = usize::from(carried.inventory.num_items);
                    if count > 0 {
                        let id = carried.inventory.items[pick % count].data.id;
                        let _ = carried.remove_item(id, amount, false);
                    }
                }
                Op::Withdraw(amount) => { let _ = carried.remove_item(UNSET_ITEM_ID, amount, true); }
            }
            let items: Vec<ItemData> = inventory.occupied().iter().map(|slot| slot.data).collect();
            check_invariants(&items, meseta, INVENTORY_CAPACITY)?;
            // Slots past the count are empty.
            for slot in &inventory.items[items.len()..] {
                prop_assert_eq!(*slot, InventoryItem::default());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property: bank invariants hold and withdrawals never overdraw
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn bank_invariants_hold(ops in prop::collection::vec(arb_op(), 0..300)) {
        let mut bank = Bank::default();
        for op in ops {
            match op {
                Op::Add(item) => { let _ = bank.add_item(BankItem::new(item)); }
                Op::Remove { pick, amount } => {
                    let count = bank.occupied().len();
                    if count > 0 {
                        let id = bank.items[pick % count].data.id;
                        let _ = bank.remove_item(id, amount, false);
                    }
                }
                Op::Withdraw(amount) => {
                    let before = bank.meseta;
                    let result = bank.remove_item(UNSET_ITEM_ID, amount, true);
                    prop_assert_eq!(result.is_ok(), amount <= before);
                }
            }
            let items: Vec<ItemData> = bank.occupied().iter().map(|slot| slot.data).collect();
            check_invariants(&items, bank.meseta, BANK_CAPACITY)?;
        }
    }
}

// ---------------------------------------------------------------------------
// Property: whole removal preserves the order of the other slots
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn whole_removal_shifts_left(count in 1usize..=30, pick in any::<usize>()) {
        let mut inventory = Inventory::default();
        let mut meseta = 0u32;
        for id in 0..count {
            let mut item = ItemData::default();
            item.id = u32::try_from(id).expect("small");
            CarriedItems { inventory: &mut inventory, meseta: &mut meseta }
                .add_item(InventoryItem::new(item))
                .expect("add");
        }
        let index = pick % count;
        let victim = u32::try_from(index).expect("small");
        let removed = CarriedItems { inventory: &mut inventory, meseta: &mut meseta }
            .remove_item(victim, 0, false)
            .expect("remove");
        prop_assert_eq!(removed.data.id, victim);

        let expected: Vec<u32> = (0..count)
            .filter(|&id| id != index)
            .map(|id| u32::try_from(id).expect("small"))
            .collect();
        let actual: Vec<u32> = inventory.occupied().iter().map(|slot| slot.data.id).collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(inventory.items[count - 1], InventoryItem::default());
    }
}

// ---------------------------------------------------------------------------
// Property: legacy round trip keeps stats and visual fields
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn legacy_round_trip_keeps_stats(
        level in 0u32..200,
        experience in any::<u32>(),
        meseta in 0u32..=MAX_MESETA,
        atp in any::<u16>(),
        section_id in 0u8..10,
        char_class in 0u8..=8,
        costume in any::<u16>(),
        name in "[A-Za-z0-9]{1,10}",
    ) {
        let mut disp = DispDataCurrent::default();
        disp.stats.level = level;
        disp.stats.experience = experience;
        disp.stats.meseta = meseta;
        disp.stats.char_stats.atp = atp;
        disp.visual.name = FixedText::new("         0");
        disp.visual.section_id = section_id;
        disp.visual.char_class = char_class;
        disp.visual.costume = costume;
        disp.name.set(&format!("\tJ{name}"));

        let back = disp.to_legacy().to_current('J');
        prop_assert_eq!(back.stats, disp.stats);
        prop_assert_eq!(back.visual, disp.visual);
        prop_assert_eq!(back.name.to_string_lossy(), format!("\tJ{name}"));
    }
}
