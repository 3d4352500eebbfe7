use crate::types::{EntityId, EntityType, Timestamp};
use alloy_primitives::U256;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Arithmetic overflow in {field}")]
    Overflow { field: &'static str },

    #[error("Arithmetic underflow in {field}")]
    Underflow { field: &'static str },

    #[error("Insufficient balance: {owner} holds {available} of {resource}, needs {required}")]
    InsufficientBalance {
        resource:  EntityType,
        owner:     EntityId,
        available: U256,
        required:  U256,
    },

    #[error("Insufficient allowance: {spender} may move {available} of {resource} for {owner}, needs {required}")]
    InsufficientAllowance {
        resource:  EntityType,
        owner:     EntityId,
        spender:   EntityId,
        available: U256,
        required:  U256,
    },

    #[error("Clock regression: now {now} is before last update {last_updated}")]
    ClockRegression { now: Timestamp, last_updated: Timestamp },

    #[error("Unknown entity type {entity_type}: no {table} row")]
    UnknownEntityType {
        entity_type: EntityType,
        table:       &'static str,
    },

    #[error("Entity {entity} does not exist")]
    UnknownEntity { entity: EntityId },

    #[error("Miner {miner} is not attached to a celestial")]
    NotAttached { miner: EntityId },

    #[error("Cyclic reference while resolving {entity} at depth {depth}")]
    CyclicReference { entity: EntityId, depth: usize },

    #[error("No hangar reachable for {entity}")]
    MissingHangar { entity: EntityId },

    #[error("Alliance {alliance} not found")]
    UnknownAlliance { alliance: EntityId },

    #[error("Alliance {alliance} is full ({max_member} members)")]
    AllianceFull { alliance: EntityId, max_member: u32 },

    #[error("Player {player} already belongs to alliance {alliance}")]
    AlreadyMember { player: EntityId, alliance: EntityId },

    #[error("Player {player} has no pending application")]
    NotApplied { player: EntityId },

    #[error("Player {player} is not in an alliance")]
    NotMember { player: EntityId },

    #[error("Invalid key for table '{table}': {reason}")]
    InvalidKey { table: &'static str, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StateResult<T> = Result<T, StateError>;
