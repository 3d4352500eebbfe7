//! State events: the audit trail of successful mutations.
//!
//! RULE: An event is appended inside the same atomic unit as the writes
//! it describes, so a failed operation leaves no event behind.

use crate::{
    production::AccrualKind,
    types::{EntityId, EntityType, Timestamp},
};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Variants are appended, never removed or reordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    // ── Ledger ─────────────────────────────────────
    Minted {
        resource: EntityType,
        owner:    EntityId,
        amount:   U256,
    },
    Burned {
        resource: EntityType,
        owner:    EntityId,
        amount:   U256,
    },
    Transferred {
        resource: EntityType,
        from:     EntityId,
        to:       EntityId,
        amount:   U256,
    },
    Approved {
        resource: EntityType,
        owner:    EntityId,
        spender:  EntityId,
        amount:   U256,
    },
    AllowanceSpent {
        resource:  EntityType,
        owner:     EntityId,
        spender:   EntityId,
        amount:    U256,
        remaining: U256,
    },

    // ── Production ─────────────────────────────────
    Accrued {
        entity:   EntityId,
        kind:     AccrualKind,
        produced: U256,
        amount:   U256,
        at:       Timestamp,
    },

    // ── Alliances ──────────────────────────────────
    AllianceCreated {
        alliance:   EntityId,
        max_member: u32,
    },
    MemberJoined {
        alliance: EntityId,
        player:   EntityId,
        members:  u32,
    },
    MemberLeft {
        alliance: EntityId,
        player:   EntityId,
        members:  u32,
    },
}

impl StateEvent {
    /// Stable name stored in the `event_type` column.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Minted { .. }          => "minted",
            Self::Burned { .. }          => "burned",
            Self::Transferred { .. }     => "transferred",
            Self::Approved { .. }        => "approved",
            Self::AllowanceSpent { .. }  => "allowance_spent",
            Self::Accrued { .. }         => "accrued",
            Self::AllianceCreated { .. } => "alliance_created",
            Self::MemberJoined { .. }    => "member_joined",
            Self::MemberLeft { .. }      => "member_left",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub event_type: String,
    pub payload:    String, // JSON-serialized StateEvent
}

impl EventLogEntry {
    pub fn decode(&self) -> serde_json::Result<StateEvent> {
        serde_json::from_str(&self.payload)
    }
}
