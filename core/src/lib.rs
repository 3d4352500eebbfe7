//! World-state core for a multiplayer space-strategy simulation.
//!
//! Typed component tables over a SQLite keyed store, plus the derived
//! computations the schema implies: resource accrual, path
//! interpolation and a fungible-resource ledger.

pub mod alliance;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod ledger;
pub mod movement;
pub mod production;
pub mod rng;
pub mod specs;
pub mod store;
pub mod tables;
pub mod types;
pub mod world;
