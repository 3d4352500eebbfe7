//! Keyed store tests: typed get/set/delete, composite keys, atomic units,
//! width-checked counters and the event log.

use alloy_primitives::U256;
use spacestate_core::{
    error::{StateError, StateResult},
    event::StateEvent,
    store::WorldStore,
    tables::{
        self, Allowance, Balance, Health, Location, MemberAmount, PathRecord, ShipAmount,
        ShipModules, Table, ALL_TABLES,
    },
    types::{entity_id, static_tag, Coord},
};

fn store() -> WorldStore {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = WorldStore::in_memory().expect("open in-memory store");
    store.migrate().expect("migrate");
    store
}

#[test]
fn migrate_creates_every_component_table() {
    let store = store();
    let names = store.table_names().unwrap();
    for table in ALL_TABLES {
        assert!(names.iter().any(|n| n == table), "missing table {table}");
    }
    assert!(names.iter().any(|n| n == "event_log"));
}

#[test]
fn migrate_is_idempotent() {
    let store = store();
    store.set::<Health>(&entity_id("ship"), &42).unwrap();
    store.migrate().unwrap();
    assert_eq!(store.get::<Health>(&entity_id("ship")).unwrap(), Some(42));
}

#[test]
fn absent_key_reads_as_none() {
    let store = store();
    let ship = entity_id("ship");
    assert_eq!(store.get::<Location>(&ship).unwrap(), None);
    assert!(!store.contains::<Location>(&ship).unwrap());
    assert_eq!(store.get_or_default::<Health>(&ship).unwrap(), 0);
}

#[test]
fn set_overwrites_and_delete_reports_presence() {
    let store = store();
    let ship = entity_id("ship");

    store.set::<Location>(&ship, &Coord::new(3, 4)).unwrap();
    store.set::<Location>(&ship, &Coord::new(5, 6)).unwrap();
    assert_eq!(store.get::<Location>(&ship).unwrap(), Some(Coord::new(5, 6)));
    assert_eq!(store.row_count::<Location>().unwrap(), 1);

    assert!(store.delete::<Location>(&ship).unwrap());
    assert!(!store.delete::<Location>(&ship).unwrap());
    assert_eq!(store.get::<Location>(&ship).unwrap(), None);
}

#[test]
fn structured_records_survive_storage() {
    let store = store();
    let ship = entity_id("ship");
    let path = PathRecord::new(Coord::new(1, 2), Coord::new(30, 40), 1_000, 25);
    let modules = vec![entity_id("laser-1"), entity_id("laser-2")];

    store.set::<tables::Path>(&ship, &path).unwrap();
    store.set::<ShipModules>(&ship, &modules).unwrap();

    assert_eq!(store.get::<tables::Path>(&ship).unwrap(), Some(path));
    assert_eq!(store.get::<ShipModules>(&ship).unwrap(), Some(modules));
}

#[test]
fn large_amounts_are_stored_exactly() {
    let store = store();
    let key = (static_tag("spice"), entity_id("whale"));
    let big = U256::MAX - U256::from(7u64);
    store.set::<Balance>(&key, &big).unwrap();
    assert_eq!(store.get::<Balance>(&key).unwrap(), Some(big));
}

#[test]
fn composite_keys_scan_by_leading_part() {
    let store = store();
    let spice = static_tag("spice");
    let crystal = static_tag("crystal");
    let a = entity_id("a");
    let b = entity_id("b");

    store.set::<Balance>(&(spice, a), &U256::from(1u64)).unwrap();
    store.set::<Balance>(&(spice, b), &U256::from(2u64)).unwrap();
    store.set::<Balance>(&(crystal, a), &U256::from(3u64)).unwrap();

    let spice_rows = store.scan_prefix::<Balance>(spice.as_slice()).unwrap();
    assert_eq!(spice_rows.len(), 2);
    assert!(spice_rows.iter().all(|((ty, _), _)| *ty == spice));

    // (type, owner, spender): a 48-byte prefix selects one owner's grants.
    store
        .set::<Allowance>(&(spice, a, b), &U256::from(9u64))
        .unwrap();
    store
        .set::<Allowance>(&(spice, b, a), &U256::from(4u64))
        .unwrap();
    let mut prefix = spice.to_vec();
    prefix.extend_from_slice(a.as_slice());
    let grants = store.scan_prefix::<Allowance>(&prefix).unwrap();
    assert_eq!(grants, vec![((spice, a, b), U256::from(9u64))]);

    assert_eq!(store.keys::<Balance>().unwrap().len(), 3);
}

#[test]
fn failed_atomic_unit_leaves_no_writes() {
    let store = store();
    let ship = entity_id("ship");

    let result: StateResult<()> = store.atomic(|| {
        store.set::<Health>(&ship, &10)?;
        store.set::<Location>(&ship, &Coord::new(1, 1))?;
        Err(StateError::Underflow { field: "test" })
    });
    assert!(result.is_err());
    assert_eq!(store.get::<Health>(&ship).unwrap(), None);
    assert_eq!(store.get::<Location>(&ship).unwrap(), None);
}

#[test]
fn nested_unit_rolls_back_alone() {
    let store = store();
    let a = entity_id("a");
    let b = entity_id("b");

    store
        .atomic(|| {
            store.set::<Health>(&a, &1)?;
            let inner: StateResult<()> = store.atomic(|| {
                store.set::<Health>(&b, &2)?;
                Err(StateError::Underflow { field: "inner" })
            });
            assert!(inner.is_err());
            store.set::<Health>(&a, &3)
        })
        .unwrap();

    assert_eq!(store.get::<Health>(&a).unwrap(), Some(3));
    assert_eq!(store.get::<Health>(&b).unwrap(), None);
}

#[test]
fn uint8_counter_stops_at_255() {
    let store = store();
    let player = entity_id("player");
    store.set::<ShipAmount>(&player, &254).unwrap();

    assert_eq!(store.increment::<ShipAmount>(&player).unwrap(), 255);
    let err = store.increment::<ShipAmount>(&player).unwrap_err();
    assert!(matches!(err, StateError::Overflow { field } if field == ShipAmount::NAME));
    assert_eq!(store.get::<ShipAmount>(&player).unwrap(), Some(255));
}

#[test]
fn counter_below_zero_is_underflow() {
    let store = store();
    let alliance = entity_id("alliance");
    let err = store.decrement::<MemberAmount>(&alliance).unwrap_err();
    assert!(matches!(err, StateError::Underflow { .. }));
    assert_eq!(store.get::<MemberAmount>(&alliance).unwrap(), None);
}

#[test]
fn fresh_entity_ids_are_distinct_per_type() {
    let store = store();
    let ship = static_tag("ship");
    let base = static_tag("base");

    let s1 = store.next_entity_id(ship).unwrap();
    let s2 = store.next_entity_id(ship).unwrap();
    let b1 = store.next_entity_id(base).unwrap();
    assert_ne!(s1, s2);
    assert_ne!(s1, b1);
    assert_eq!(store.get::<tables::Counter>(&ship).unwrap(), Some(U256::from(2u64)));
}

#[test]
fn event_log_is_ordered_and_decodable() {
    let store = store();
    let spice = static_tag("spice");
    let owner = entity_id("owner");

    store
        .append_event(&StateEvent::Minted { resource: spice, owner, amount: U256::from(5u64) })
        .unwrap();
    store
        .append_event(&StateEvent::Burned { resource: spice, owner, amount: U256::from(2u64) })
        .unwrap();

    let events = store.events().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, "minted");
    assert_eq!(events[1].event_type, "burned");
    assert_eq!(
        events[1].decode().unwrap(),
        StateEvent::Burned { resource: spice, owner, amount: U256::from(2u64) }
    );
}

#[test]
fn file_store_is_visible_to_a_second_connection() {
    let path = std::env::temp_dir().join(format!("spacestate-{}.db", std::process::id()));
    let path_str = path.to_string_lossy().to_string();
    let _ = std::fs::remove_file(&path);

    {
        let first = WorldStore::open(&path_str).unwrap();
        first.migrate().unwrap();
        first.set::<Health>(&entity_id("outpost"), &77).unwrap();

        let second = first.reopen().unwrap();
        assert_eq!(second.get::<Health>(&entity_id("outpost")).unwrap(), Some(77));
    }

    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{path_str}{suffix}"));
    }
}
