//! Shared primitive types used across the entire world state.

use crate::error::{StateError, StateResult};
use alloy_primitives::{keccak256, FixedBytes, B256};
use serde::{Deserialize, Serialize};

/// A stable, unique identifier for any entity: base, ship, module,
/// asteroid, grid cell, player or alliance.
pub type EntityId = B256;

/// A 16-byte type tag. Instance entities point at one through the
/// `EntityType` table; spec rows are keyed by it.
pub type EntityType = FixedBytes<16>;

/// Seconds on the world clock. Persisted columns are uint40.
pub type Timestamp = u64;

/// Largest value a uint40 timestamp column can hold.
pub const MAX_TIMESTAMP: Timestamp = (1 << 40) - 1;

/// A point on the galaxy grid. Both axes are uint32.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: u32,
    pub y: u32,
}

impl Coord {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Build a type tag from a readable name, right-padded with zero bytes.
pub fn type_tag(name: &str) -> StateResult<EntityType> {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes.len() > 16 {
        return Err(StateError::InvalidKey {
            table:  "entity_type",
            reason: format!("type name {name:?} must be 1..=16 bytes"),
        });
    }
    Ok(static_tag(name))
}

/// Compile-time form of [`type_tag`]. Names past 16 bytes are truncated.
pub const fn static_tag(name: &str) -> EntityType {
    let bytes = name.as_bytes();
    let mut tag = [0u8; 16];
    let mut i = 0;
    while i < bytes.len() && i < 16 {
        tag[i] = bytes[i];
        i += 1;
    }
    FixedBytes(tag)
}

/// Readable name of a tag built by [`type_tag`]; falls back to hex.
pub fn type_name(tag: &EntityType) -> String {
    let end = tag.0.iter().position(|b| *b == 0).unwrap_or(16);
    match std::str::from_utf8(&tag.0[..end]) {
        Ok(name) if !name.is_empty() => name.to_string(),
        _ => tag.to_string(),
    }
}

/// Derive a deterministic entity id from a readable label.
pub fn entity_id(label: &str) -> EntityId {
    keccak256(label.as_bytes())
}

/// Entity id of the grid cell at `coord`.
pub fn grid_cell_id(coord: Coord) -> EntityId {
    let mut buf = [0u8; 12];
    buf[..4].copy_from_slice(b"grid");
    buf[4..8].copy_from_slice(&coord.x.to_be_bytes());
    buf[8..].copy_from_slice(&coord.y.to_be_bytes());
    keccak256(buf)
}

/// Reject timestamps that do not fit a uint40 column.
pub fn check_timestamp(ts: Timestamp, field: &'static str) -> StateResult<Timestamp> {
    if ts > MAX_TIMESTAMP {
        return Err(StateError::Overflow { field });
    }
    Ok(ts)
}
