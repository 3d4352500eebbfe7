//! Resource ledger tests.
//!
//! Tests cover: mint/burn/transfer semantics, allowance spending, the
//! supply invariant under randomized sequences, and all-or-nothing
//! failure behaviour.

use alloy_primitives::U256;
use spacestate_core::{
    error::StateError,
    rng::ScenarioRng,
    types::{entity_id, static_tag, EntityId, EntityType},
    world::World,
};

const SPICE: EntityType = static_tag("spice");
const CRYSTAL: EntityType = static_tag("crystal");

fn build() -> World {
    let _ = env_logger::builder().is_test(true).try_init();
    World::build_test().expect("build test world")
}

fn u(n: u64) -> U256 {
    U256::from(n)
}

#[test]
fn mint_increases_balance_and_supply() {
    let world = build();
    let alice = entity_id("alice");
    let ledger = world.ledger();

    ledger.mint(SPICE, alice, u(120)).unwrap();
    ledger.mint(SPICE, alice, u(30)).unwrap();

    assert_eq!(ledger.balance_of(SPICE, alice).unwrap(), u(150));
    assert_eq!(ledger.total_supply(SPICE).unwrap(), u(150));
    assert_eq!(ledger.total_supply(CRYSTAL).unwrap(), U256::ZERO);
}

#[test]
fn mint_past_uint256_overflows_without_writing() {
    let world = build();
    let alice = entity_id("alice");
    let bob = entity_id("bob");
    let ledger = world.ledger();

    ledger.mint(SPICE, alice, U256::MAX).unwrap();
    let err = ledger.mint(SPICE, bob, u(1)).unwrap_err();
    assert!(matches!(err, StateError::Overflow { field: "TotalSupply" }), "got {err:?}");

    assert_eq!(ledger.balance_of(SPICE, bob).unwrap(), U256::ZERO);
    assert_eq!(ledger.total_supply(SPICE).unwrap(), U256::MAX);
}

#[test]
fn burn_more_than_balance_fails() {
    let world = build();
    let alice = entity_id("alice");
    let ledger = world.ledger();

    ledger.mint(SPICE, alice, u(10)).unwrap();
    let err = ledger.burn(SPICE, alice, u(11)).unwrap_err();
    assert!(matches!(err, StateError::InsufficientBalance { .. }), "got {err:?}");

    ledger.burn(SPICE, alice, u(4)).unwrap();
    assert_eq!(ledger.balance_of(SPICE, alice).unwrap(), u(6));
    assert_eq!(ledger.total_supply(SPICE).unwrap(), u(6));
}

/// transfer(type, A, B, 50) with Balance[A] = 30 fails and changes nothing.
#[test]
fn transfer_with_insufficient_balance_leaves_balances_unchanged() {
    let world = build();
    let a = entity_id("a");
    let b = entity_id("b");
    let ledger = world.ledger();

    ledger.mint(SPICE, a, u(30)).unwrap();
    ledger.mint(SPICE, b, u(5)).unwrap();

    let err = ledger.transfer(SPICE, a, b, u(50)).unwrap_err();
    match err {
        StateError::InsufficientBalance { available, required, owner, .. } => {
            assert_eq!(available, u(30));
            assert_eq!(required, u(50));
            assert_eq!(owner, a);
        }
        other => panic!("expected InsufficientBalance, got {other:?}"),
    }

    assert_eq!(ledger.balance_of(SPICE, a).unwrap(), u(30));
    assert_eq!(ledger.balance_of(SPICE, b).unwrap(), u(5));
    assert_eq!(world.store().event_count("transferred").unwrap(), 0);
}

#[test]
fn transfer_keeps_supply_constant() {
    let world = build();
    let a = entity_id("a");
    let b = entity_id("b");
    let ledger = world.ledger();

    ledger.mint(SPICE, a, u(100)).unwrap();
    ledger.transfer(SPICE, a, b, u(40)).unwrap();

    assert_eq!(ledger.balance_of(SPICE, a).unwrap(), u(60));
    assert_eq!(ledger.balance_of(SPICE, b).unwrap(), u(40));
    assert_eq!(ledger.total_supply(SPICE).unwrap(), u(100));
    assert!(ledger.supply_matches(SPICE).unwrap());
}

#[test]
fn self_transfer_is_a_balance_no_op() {
    let world = build();
    let a = entity_id("a");
    let ledger = world.ledger();

    ledger.mint(SPICE, a, u(25)).unwrap();
    ledger.transfer(SPICE, a, a, u(25)).unwrap();
    assert_eq!(ledger.balance_of(SPICE, a).unwrap(), u(25));

    let err = ledger.transfer(SPICE, a, a, u(26)).unwrap_err();
    assert!(matches!(err, StateError::InsufficientBalance { .. }));
}

#[test]
fn approve_sets_rather_than_adds() {
    let world = build();
    let owner = entity_id("owner");
    let spender = entity_id("spender");
    let ledger = world.ledger();

    ledger.approve(SPICE, owner, spender, u(70)).unwrap();
    ledger.approve(SPICE, owner, spender, u(20)).unwrap();
    assert_eq!(ledger.allowance(SPICE, owner, spender).unwrap(), u(20));
}

#[test]
fn transfer_from_spends_allowance_exactly() {
    let world = build();
    let owner = entity_id("owner");
    let spender = entity_id("spender");
    let dest = entity_id("dest");
    let ledger = world.ledger();

    ledger.mint(SPICE, owner, u(100)).unwrap();
    ledger.approve(SPICE, owner, spender, u(60)).unwrap();

    ledger.transfer_from(SPICE, owner, spender, dest, u(45)).unwrap();
    assert_eq!(ledger.allowance(SPICE, owner, spender).unwrap(), u(15));
    assert_eq!(ledger.balance_of(SPICE, owner).unwrap(), u(55));
    assert_eq!(ledger.balance_of(SPICE, dest).unwrap(), u(45));

    // Over the remaining allowance: rejected even though the balance covers it.
    let err = ledger.transfer_from(SPICE, owner, spender, dest, u(16)).unwrap_err();
    assert!(matches!(err, StateError::InsufficientAllowance { .. }), "got {err:?}");
    assert_eq!(ledger.allowance(SPICE, owner, spender).unwrap(), u(15));
    assert_eq!(ledger.balance_of(SPICE, owner).unwrap(), u(55));
}

#[test]
fn transfer_from_checks_balance_after_allowance() {
    let world = build();
    let owner = entity_id("owner");
    let spender = entity_id("spender");
    let ledger = world.ledger();

    ledger.mint(SPICE, owner, u(10)).unwrap();
    ledger.approve(SPICE, owner, spender, u(500)).unwrap();

    let err = ledger.transfer_from(SPICE, owner, spender, spender, u(20)).unwrap_err();
    assert!(matches!(err, StateError::InsufficientBalance { .. }), "got {err:?}");
    // Allowance untouched by the failed call.
    assert_eq!(ledger.allowance(SPICE, owner, spender).unwrap(), u(500));
}

#[test]
fn pay_burns_every_input_or_none() {
    let world = build();
    let base = entity_id("base-1");
    let laser = static_tag("laser");
    let cost = world.specs().make_cost(&laser).unwrap().clone();
    let ledger = world.ledger();

    ledger.mint(SPICE, base, u(150)).unwrap();
    ledger.mint(CRYSTAL, base, u(10)).unwrap();

    // Crystal short by 10: the spice burn must be rolled back too.
    let err = ledger.pay(base, &cost).unwrap_err();
    assert!(matches!(err, StateError::InsufficientBalance { .. }));
    assert_eq!(ledger.balance_of(SPICE, base).unwrap(), u(150));
    assert_eq!(ledger.total_supply(SPICE).unwrap(), u(150));

    ledger.mint(CRYSTAL, base, u(10)).unwrap();
    ledger.pay(base, &cost).unwrap();
    assert_eq!(ledger.balance_of(SPICE, base).unwrap(), u(50));
    assert_eq!(ledger.balance_of(CRYSTAL, base).unwrap(), U256::ZERO);
    assert!(ledger.supply_matches(SPICE).unwrap());
    assert!(ledger.supply_matches(CRYSTAL).unwrap());
}

#[test]
fn successful_operations_are_logged() {
    let world = build();
    let a = entity_id("a");
    let b = entity_id("b");
    let ledger = world.ledger();

    ledger.mint(SPICE, a, u(10)).unwrap();
    ledger.transfer(SPICE, a, b, u(3)).unwrap();
    ledger.burn(SPICE, b, u(1)).unwrap();
    let _ = ledger.burn(SPICE, b, u(100));

    let store = world.store();
    assert_eq!(store.event_count("minted").unwrap(), 1);
    assert_eq!(store.event_count("transferred").unwrap(), 1);
    assert_eq!(store.event_count("burned").unwrap(), 1);
}

fn snapshot(world: &World, owners: &[EntityId]) -> Vec<(U256, U256)> {
    let ledger = world.ledger();
    owners
        .iter()
        .map(|o| {
            (
                ledger.balance_of(SPICE, *o).unwrap(),
                ledger.balance_of(CRYSTAL, *o).unwrap(),
            )
        })
        .collect()
}

/// TotalSupply == Σ Balance after every step of a random operation
/// sequence; failed steps change nothing; allowances never go negative.
#[test]
fn supply_invariant_holds_under_random_operations() {
    const STEPS: usize = 400;
    let world = build();
    let owners: Vec<EntityId> = (0..5).map(|i| entity_id(&format!("owner-{i}"))).collect();
    let resources = [SPICE, CRYSTAL];
    let mut rng = ScenarioRng::new(0xC0FF_EE00, 1);
    let ledger = world.ledger();

    for step in 0..STEPS {
        let resource = *rng.pick(&resources);
        let a = *rng.pick(&owners);
        let b = *rng.pick(&owners);
        let c = *rng.pick(&owners);
        let amount = u(rng.between(0, 200));

        let before = snapshot(&world, &owners);
        let allowance_before = ledger.allowance(resource, a, b).unwrap();

        let result = match rng.below(5) {
            0 => ledger.mint(resource, a, amount),
            1 => ledger.burn(resource, a, amount),
            2 => ledger.transfer(resource, a, b, amount),
            3 => ledger.approve(resource, a, b, amount),
            _ => ledger.transfer_from(resource, a, b, c, amount),
        };

        match result {
            Ok(()) => {}
            Err(StateError::InsufficientBalance { .. })
            | Err(StateError::InsufficientAllowance { .. }) => {
                assert_eq!(snapshot(&world, &owners), before, "failed step {step} wrote state");
                assert_eq!(ledger.allowance(resource, a, b).unwrap(), allowance_before);
            }
            Err(other) => panic!("unexpected error at step {step}: {other:?}"),
        }

        for r in resources {
            assert!(
                ledger.supply_matches(r).unwrap(),
                "supply invariant broken for {r} at step {step}"
            );
        }
    }
}
