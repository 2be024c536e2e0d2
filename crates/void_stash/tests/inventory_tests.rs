//! Integration tests for void_stash

use parking_lot::Mutex;
use std::sync::Arc;
use void_stash::*;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn catalog() -> SharedCatalog {
    MemoryCatalog::new()
        .with_definition(
            ItemDefinition::new("longsword", "Longsword")
                .with_type(ItemType::Weapon)
                .non_stackable()
                .with_weight(3.0)
                .with_value(120.0),
        )
        .with_definition(
            ItemDefinition::new("arrow", "Arrow")
                .with_type(ItemType::Weapon)
                .with_weight(0.25)
                .with_value(1.0),
        )
        .with_definition(
            ItemDefinition::new("stone", "Stone")
                .with_type(ItemType::Material)
                .with_weight(4.0),
        )
        .with_definition(ItemDefinition::new("scroll", "Scroll").with_type(ItemType::Information))
        .into_shared()
}

fn authority(owner: &str, settings: &InventorySettings) -> Inventory {
    Inventory::authority(owner, catalog(), settings)
}

fn record(inventory: &mut Inventory) -> Arc<Mutex<Vec<InventorySignal>>> {
    let signals = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&signals);
    inventory.subscribe(move |signal: InventorySignal| sink.lock().push(signal));
    signals
}

fn expected_weight(inventory: &Inventory) -> f32 {
    inventory
        .items()
        .iter()
        .filter(|stack| stack.is_valid())
        .map(|stack| inventory.store().stack_weight(stack))
        .sum()
}

#[test]
fn test_non_stackable_explodes_on_add_and_validate() {
    init_logger();
    let mut inventory = authority("player", &InventorySettings::default());

    inventory.add_items(&[ItemStack::new("longsword", 4)]);
    assert_eq!(inventory.current_count(), 4);
    assert!(inventory.items().iter().all(|stack| stack.quantity == 1));

    // Observers mirror raw slots; re-adding them on the authority explodes
    let mut observer = Inventory::observer("remote", catalog(), &InventorySettings::default());
    observer
        .apply_observer_snapshot(InventorySnapshot::new(1, vec![ItemStack::new("longsword", 3).with_level(2)]))
        .unwrap();
    assert_eq!(observer.current_count(), 1);

    let mut host = authority("host", &InventorySettings::default());
    host.add_items(&observer.items_snapshot());
    assert_eq!(host.current_count(), 3);
    assert!(host.items().iter().all(|stack| stack.quantity == 1 && stack.level == 2));
}

#[test]
fn test_merge_idempotence() {
    init_logger();
    let mut inventory = authority("player", &InventorySettings::default());

    inventory.add_items(&[ItemStack::new("arrow", 3)]);
    inventory.add_items(&[ItemStack::new("arrow", 3)]);

    assert_eq!(inventory.current_count(), 1);
    assert_eq!(inventory.items()[0].quantity, 6);
}

#[test]
fn test_weight_conservation() {
    init_logger();
    let mut inventory = authority("player", &InventorySettings::default());

    inventory.add_items(&[ItemStack::new("arrow", 20), ItemStack::new("longsword", 2)]);
    assert!((inventory.current_weight() - expected_weight(&inventory)).abs() < 1e-4);
    assert!((inventory.current_weight() - 11.0).abs() < 1e-4);

    inventory.discard_items(&[ItemStack::new("arrow", 7), ItemStack::single("longsword")]);
    assert!((inventory.current_weight() - expected_weight(&inventory)).abs() < 1e-4);

    inventory.add_items(&[ItemStack::new("stone", 2), ItemStack::single("scroll")]);
    assert!((inventory.current_weight() - expected_weight(&inventory)).abs() < 1e-4);

    inventory.discard_items(&[
        ItemStack::new("arrow", 13),
        ItemStack::single("longsword"),
        ItemStack::new("stone", 2),
        ItemStack::single("scroll"),
    ]);
    assert!(inventory.is_empty());
    assert_eq!(inventory.current_weight(), 0.0);
}

#[test]
fn test_no_negative_quantity() {
    init_logger();
    for allow_empty_slots in [false, true] {
        let settings = InventorySettings::default().with_empty_slots(allow_empty_slots);
        let mut inventory = authority("player", &settings);
        inventory.add_items(&[ItemStack::new("arrow", 5), ItemStack::new("stone", 1)]);

        inventory.discard_items(&[ItemStack::new("arrow", 50)]);

        assert!(inventory.items().iter().all(|stack| stack.quantity >= 0 || stack.is_empty_slot()));
        assert!(!inventory.contains(&ItemStack::single("arrow"), false));
        if allow_empty_slots {
            assert_eq!(inventory.current_count(), 2);
            assert!(inventory.items()[0].is_empty_slot());
        } else {
            assert_eq!(inventory.current_count(), 1);
        }
    }
}

#[test]
fn test_batch_remove_walks_distinct_slots() {
    init_logger();
    let mut inventory = authority("player", &InventorySettings::default());
    inventory.add_items(&[ItemStack::new("longsword", 3)]);
    assert_eq!(inventory.current_count(), 3);

    inventory.discard_items(&[
        ItemStack::single("longsword"),
        ItemStack::single("longsword"),
        ItemStack::single("longsword"),
    ]);

    assert_eq!(inventory.current_count(), 0);
    assert_eq!(inventory.current_weight(), 0.0);
}

#[test]
fn test_trade_conservation() {
    init_logger();
    let mut from = authority("player", &InventorySettings::default());
    let mut to = authority("merchant", &InventorySettings::default());
    from.add_items(&[
        ItemStack::new("arrow", 30),
        ItemStack::new("arrow", 5).with_tag("Quality.Fine"),
        ItemStack::new("longsword", 2),
    ]);
    to.add_items(&[ItemStack::new("arrow", 1)]);

    let requested = [
        ItemStack::new("arrow", 10),
        ItemStack::new("arrow", 5).with_tag("Quality.Fine"),
        ItemStack::single("longsword"),
    ];
    let before_from: Vec<i64> = requested.iter().map(|s| from.store().quantity_of(s)).collect();
    let before_to: Vec<i64> = requested.iter().map(|s| to.store().quantity_of(s)).collect();

    let accepted = trade(&requested, &mut from, &mut to);
    assert_eq!(accepted.len(), 3);

    for (i, stack) in requested.iter().enumerate() {
        assert_eq!(from.store().quantity_of(stack), before_from[i] - stack.quantity as i64);
        assert_eq!(to.store().quantity_of(stack), before_to[i] + stack.quantity as i64);
    }
    assert!((from.current_weight() - expected_weight(&from)).abs() < 1e-4);
    assert!((to.current_weight() - expected_weight(&to)).abs() < 1e-4);
    assert!((from.current_weight() + to.current_weight() - 15.0).abs() < 1e-4);
}

#[test]
fn test_trade_conservation_across_single_unit_slots() {
    init_logger();
    let mut from = authority("player", &InventorySettings::default());
    let mut to = authority("merchant", &InventorySettings::default());
    from.add_items(&[ItemStack::new("longsword", 3), ItemStack::new("mystery", 2)]);
    assert_eq!(from.current_count(), 5);

    let accepted = trade(
        &[ItemStack::new("longsword", 3), ItemStack::new("mystery", 2)],
        &mut from,
        &mut to,
    );
    assert_eq!(accepted.len(), 2);

    let sword = ItemStack::single("longsword");
    let mystery = ItemStack::single("mystery");
    assert_eq!(from.store().quantity_of(&sword), 0);
    assert_eq!(to.store().quantity_of(&sword), 3);
    assert_eq!(from.store().quantity_of(&mystery), 0);
    assert_eq!(to.store().quantity_of(&mystery), 2);
    assert!(from.is_empty());
    assert!((to.current_weight() - 9.0).abs() < 1e-4);
}

#[test]
fn test_weight_limited_partial_trade() {
    init_logger();
    let mut from = authority("quarry", &InventorySettings::default());
    from.add_items(&[ItemStack::new("stone", 6)]);
    let mut to = authority("cart", &InventorySettings::default().with_max_weight(10.0));

    let accepted = trade(&vec![ItemStack::new("stone", 2); 3], &mut from, &mut to);

    assert_eq!(accepted, vec![ItemStack::new("stone", 2)]);
    assert_eq!(accepted[0].quantity, 2);
    assert!((to.current_weight() - 8.0).abs() < 1e-4);
    assert_eq!(from.store().quantity_of(&ItemStack::single("stone")), 4);
}

#[test]
fn test_non_authority_no_op() {
    init_logger();
    let mut observer = Inventory::observer("remote", catalog(), &InventorySettings::default());
    let signals = record(&mut observer);
    let before = observer.items_snapshot();

    observer.add_items(&[ItemStack::new("arrow", 3)]);

    assert_eq!(observer.items(), before.as_slice());
    assert!(!signals.lock().contains(&InventorySignal::Updated));
}

#[test]
fn test_observer_trim_on_empty() {
    init_logger();
    for items in [Vec::new(), vec![ItemStack::empty(), ItemStack::empty(), ItemStack::empty()]] {
        let mut observer = Inventory::observer("remote", catalog(), &InventorySettings::default());
        let signals = record(&mut observer);

        observer.apply_observer_snapshot(InventorySnapshot::new(1, items)).unwrap();

        assert!(observer.items().is_empty());
        assert_eq!(observer.current_weight(), 0.0);
        assert!(signals.lock().contains(&InventorySignal::Empty));
    }
}

#[test]
fn test_replication_over_bytes() {
    init_logger();
    let settings = InventorySettings::default().with_empty_slots(true);
    let mut host = authority("player", &settings);
    let mut client = Inventory::observer("player", catalog(), &settings);

    host.add_items(&[ItemStack::new("arrow", 12), ItemStack::single("scroll"), ItemStack::new("stone", 1)]);
    host.discard_items(&[ItemStack::new("stone", 1)]);

    let bytes = host.take_snapshot().unwrap().to_bytes().unwrap();
    client.apply_observer_snapshot(InventorySnapshot::from_bytes(&bytes).unwrap()).unwrap();

    // Host keeps its trailing tombstone, the client trims it
    assert_eq!(host.current_count(), 3);
    assert_eq!(client.current_count(), 2);
    assert_eq!(client.items()[0].quantity, 12);
    assert!((client.current_weight() - host.current_weight()).abs() < 1e-4);

    // Replayed snapshots are dropped
    let replay = InventorySnapshot::from_bytes(&bytes).unwrap();
    assert!(matches!(
        client.apply_observer_snapshot(replay),
        Err(SnapshotError::Stale { .. })
    ));
}

#[test]
fn test_unresolved_items_are_weightless_and_unstackable() {
    init_logger();
    let mut inventory = authority("player", &InventorySettings::default());

    inventory.add_items(&[ItemStack::new("mystery", 2)]);

    assert_eq!(inventory.current_count(), 2);
    assert_eq!(inventory.current_weight(), 0.0);
}

#[test]
fn test_container_destroyed_when_emptied() {
    init_logger();
    let settings = InventorySettings::default().with_destroy_when_empty(true);
    let mut chest = InventoryContainer::new("chest", catalog(), &settings)
        .with_items(&[ItemStack::new("arrow", 10), ItemStack::single("scroll")]);
    let mut player = authority("player", &InventorySettings::default());

    chest.begin_play();
    assert!(!chest.is_destroyed());

    let moved = chest.take_items(&mut player, &[ItemStack::new("arrow", 10), ItemStack::single("scroll")]);
    assert_eq!(moved.len(), 2);
    assert!(chest.process_pending());
    assert!(chest.is_destroyed());
    assert_eq!(player.store().quantity_of(&ItemStack::single("arrow")), 10);
}

#[test]
fn test_settings_from_json_drive_limits() {
    init_logger();
    let settings = InventorySettings::from_json_str(r#"{ "max_weight": 5.0, "max_item_slots": 0 }"#).unwrap();
    let inventory = authority("player", &settings);

    assert_eq!(inventory.max_weight(), 5.0);
    assert_eq!(inventory.max_item_slots(), i32::MAX);
    assert!(inventory.can_receive_item(&ItemStack::single("stone")));
    assert!(!inventory.can_receive_item(&ItemStack::new("stone", 2)));
}

#[test]
fn test_observer_follows_authority_hand_over() {
    init_logger();
    let mut old_host = authority("player", &InventorySettings::default());
    let mut client = Inventory::observer("player", catalog(), &InventorySettings::default());

    for _ in 0..5 {
        old_host.add_items(&[ItemStack::new("arrow", 1)]);
    }
    let bytes = old_host.take_snapshot().unwrap().to_bytes().unwrap();
    client.apply_observer_snapshot(InventorySnapshot::from_bytes(&bytes).unwrap()).unwrap();
    assert_eq!(client.items()[0].quantity, 5);

    // The old host migrates away and a fresh one takes over with an empty inventory
    old_host.set_role(NetRole::Observer);
    let mut new_host = authority("player", &InventorySettings::default());
    new_host.add_items(&[ItemStack::new("arrow", 1)]);
    new_host.clear();

    let bytes = new_host.take_snapshot().unwrap().to_bytes().unwrap();
    for observer in [&mut client, &mut old_host] {
        observer
            .apply_observer_snapshot(InventorySnapshot::from_bytes(&bytes).unwrap())
            .unwrap();
        assert!(observer.items().is_empty());
        assert_eq!(observer.current_weight(), 0.0);
    }
}
