//! World facade tests: spawning, despawning and time sources.

use spacestate_core::{
    clock::{ManualClock, TimeSource},
    error::StateError,
    tables::{
        Alliance, AllianceApplied, AllianceInfo, AllianceInfoRecord, AsteroidMining, Health,
        Location, MemberAmount, MinerAmount, Owner, ShipAmount, SpawnTime, TypeOf,
    },
    types::{entity_id, static_tag, Coord, MAX_TIMESTAMP},
    world::World,
};

fn build() -> World {
    let _ = env_logger::builder().is_test(true).try_init();
    World::build_test().expect("build test world")
}

#[test]
fn spawn_writes_identity_rows_and_full_health() {
    let world = build();
    let base = entity_id("base");
    let ship = entity_id("ship");

    world.spawn(base, static_tag("base"), None, Some(Coord::new(5, 5)), 10).unwrap();
    world.spawn(ship, static_tag("ship"), Some(base), None, 11).unwrap();

    let store = world.store();
    assert_eq!(store.get::<TypeOf>(&ship).unwrap(), Some(static_tag("ship")));
    assert_eq!(store.get::<SpawnTime>(&ship).unwrap(), Some(11));
    assert_eq!(store.get::<Owner>(&ship).unwrap(), Some(base));
    assert_eq!(store.get::<Health>(&ship).unwrap(), Some(100));
    assert_eq!(store.get::<Location>(&base).unwrap(), Some(Coord::new(5, 5)));
    assert_eq!(store.get::<Health>(&base).unwrap(), Some(5_000));
}

#[test]
fn spawn_of_uncatalogued_type_fails() {
    let world = build();
    let err = world
        .spawn(entity_id("x"), static_tag("dragon"), None, None, 0)
        .unwrap_err();
    assert!(matches!(err, StateError::UnknownEntityType { .. }));
    assert_eq!(world.store().get::<TypeOf>(&entity_id("x")).unwrap(), None);
}

#[test]
fn despawn_clears_per_entity_rows() {
    let world = build();
    let base = entity_id("base");
    world.spawn(base, static_tag("base"), None, Some(Coord::new(1, 2)), 0).unwrap();

    assert!(world.despawn(base).unwrap());
    let store = world.store();
    assert_eq!(store.get::<TypeOf>(&base).unwrap(), None);
    assert_eq!(store.get::<Location>(&base).unwrap(), None);
    assert_eq!(store.get::<Health>(&base).unwrap(), None);
    assert!(!world.despawn(base).unwrap());
}

#[test]
fn despawn_clears_count_rows_and_frees_the_alliance_slot() {
    let world = build();
    let guild = entity_id("guild");
    let pilot = entity_id("pilot");
    let asteroid = entity_id("asteroid");
    let base = entity_id("base");
    let registry = world.alliances();

    registry
        .create(guild, AllianceInfoRecord { approver: pilot, cooldown: 0, max_member: 1 })
        .unwrap();
    registry.apply(pilot, guild).unwrap();
    registry.admit(pilot).unwrap();

    world.spawn(asteroid, static_tag("spice"), None, Some(Coord::new(9, 9)), 0).unwrap();
    world.spawn(base, static_tag("base"), None, Some(Coord::new(1, 1)), 0).unwrap();
    let store = world.store();
    store.set::<AsteroidMining>(&asteroid, &true).unwrap();
    store.set::<ShipAmount>(&pilot, &3).unwrap();
    store.set::<MinerAmount>(&base, &2).unwrap();

    world.despawn(pilot).unwrap();
    world.despawn(asteroid).unwrap();
    world.despawn(base).unwrap();

    assert_eq!(store.get::<AsteroidMining>(&asteroid).unwrap(), None);
    assert_eq!(store.get::<ShipAmount>(&pilot).unwrap(), None);
    assert_eq!(store.get::<MinerAmount>(&base).unwrap(), None);
    assert_eq!(registry.alliance_of(pilot).unwrap(), None);
    assert_eq!(registry.member_amount(guild).unwrap(), 0);
    assert_eq!(world.store().event_count("member_left").unwrap(), 1);

    // The freed slot is usable again.
    let other = entity_id("other");
    registry.apply(other, guild).unwrap();
    assert_eq!(registry.admit(other).unwrap(), 1);
}

#[test]
fn despawning_an_alliance_unlinks_members_and_applicants() {
    let world = build();
    let guild = entity_id("guild");
    let member = entity_id("member");
    let applicant = entity_id("applicant");
    let registry = world.alliances();

    registry
        .create(guild, AllianceInfoRecord { approver: member, cooldown: 0, max_member: 5 })
        .unwrap();
    registry.apply(member, guild).unwrap();
    registry.admit(member).unwrap();
    registry.apply(applicant, guild).unwrap();

    world.despawn(guild).unwrap();

    let store = world.store();
    assert_eq!(store.get::<AllianceInfo>(&guild).unwrap(), None);
    assert_eq!(store.get::<MemberAmount>(&guild).unwrap(), None);
    assert_eq!(store.get::<Alliance>(&member).unwrap(), None);
    assert_eq!(store.get::<AllianceApplied>(&applicant).unwrap(), None);
    assert!(matches!(registry.info(guild), Err(StateError::UnknownAlliance { .. })));
}

#[test]
fn manual_clock_only_moves_forward() {
    let clock = ManualClock::new(100);
    assert_eq!(clock.advance(5).unwrap(), 105);
    clock.set(200).unwrap();
    assert_eq!(clock.now(), 200);

    assert!(matches!(clock.set(150), Err(StateError::ClockRegression { .. })));
    assert!(matches!(clock.set(MAX_TIMESTAMP + 1), Err(StateError::Overflow { .. })));
    assert_eq!(clock.now(), 200);
}

#[test]
fn manual_clock_stops_at_uint40() {
    let clock = ManualClock::new(MAX_TIMESTAMP - 1);
    assert_eq!(clock.advance(1).unwrap(), MAX_TIMESTAMP);
    assert!(clock.advance(1).is_err());
}
