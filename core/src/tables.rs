//! Component table declarations.
//!
//! Each table is a zero-sized marker implementing [`Table`]: a stable SQL
//! name, a fixed-width key and a serde record. The store is generic over
//! these markers, so adding a table means adding one line here and one
//! `CREATE TABLE` in a migration.

use crate::{
    specs::{
        BaseSpec, BlueprintSpec, BuilderSpec, ContainerSpec, MakeCostSpec, MinerSpec, ModuleSpec,
        OutpostSpec, ResourceSpec, SharedSpec,
    },
    store::TableKey,
    types::{Coord, EntityId, EntityType, Timestamp},
};
use alloy_primitives::{Address, U256};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A typed, keyed component table.
pub trait Table {
    /// SQL table name. Must match the migration.
    const NAME: &'static str;
    type Key: TableKey;
    type Record: Serialize + DeserializeOwned;
}

macro_rules! table {
    ($(#[$meta:meta])* $name:ident, $sql:literal, $key:ty => $record:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl Table for $name {
            const NAME: &'static str = $sql;
            type Key = $key;
            type Record = $record;
        }
    };
}

// ── Ownership and identity ────────────────────────────────────────

table!(
    /// ERC20 contract address per resource type.
    TokenAddress, "token_address", EntityType => Address);
table!(Constant, "constant", EntityId => u32);
table!(
    /// Instance counter per entity type, used to mint fresh ids.
    Counter, "counter", EntityType => U256);
table!(Owner, "owner", EntityId => EntityId);
table!(Commander, "commander", EntityId => EntityId);
table!(Approval, "approval", EntityId => EntityId);
table!(SpawnTime, "spawn_time", EntityId => Timestamp);
table!(
    /// entity -> its type tag. Presence of this row is what makes an entity exist.
    TypeOf, "entity_type", EntityId => EntityType);
table!(Health, "health", EntityId => u32);
table!(
    /// Canonical position of a stationary entity.
    Location, "location", EntityId => Coord);

// ── Alliances ─────────────────────────────────────────────────────

table!(
    /// player -> alliance
    Alliance, "alliance", EntityId => EntityId);
table!(
    /// player -> alliance applied to
    AllianceApplied, "alliance_applied", EntityId => EntityId);
table!(AllianceInfo, "alliance_info", EntityId => AllianceInfoRecord);
table!(MemberAmount, "member_amount", EntityId => u32);

// ── Resource ledger ───────────────────────────────────────────────

table!(Balance, "balance", (EntityType, EntityId) => U256);
table!(Allowance, "allowance", (EntityType, EntityId, EntityId) => U256);
table!(TotalSupply, "total_supply", EntityType => U256);

// ── Production ────────────────────────────────────────────────────

table!(StoredSize, "stored_size", EntityId => U256);
table!(
    /// Queue amount in builders and accumulators; mined amount in miners.
    Amount, "amount", EntityId => U256);
table!(LastUpdated, "last_updated", EntityId => Timestamp);
table!(
    /// player -> ships held
    ShipAmount, "ship_amount", EntityId => u8);
table!(
    /// base -> miners attached
    MinerAmount, "miner_amount", EntityId => u8);
table!(MinerInfo, "miner_info", EntityId => MinerInfoRecord);
table!(
    /// asteroid -> currently being mined
    AsteroidMining, "asteroid_mining", EntityId => bool);

// ── Movement ──────────────────────────────────────────────────────

table!(Path, "path", EntityId => PathRecord);
table!(WarpPath, "warp_path", EntityId => WarpPathRecord);
table!(RetreatPath, "retreat_path", EntityId => RetreatPathRecord);
table!(
    /// grid cell -> outpost or base occupying it
    GridEntity, "grid_entity", EntityId => EntityId);
table!(
    /// grid cell -> a player base has spawned here
    GridSpawned, "grid_spawned", EntityId => bool);

// ── Combat ────────────────────────────────────────────────────────

table!(ShipStats, "ship_stats", EntityId => ShipStatsRecord);
table!(ShipModules, "ship_modules", EntityId => Vec<EntityId>);

// ── Specs (mirrored from the catalog) ─────────────────────────────

table!(SharedSpecs, "shared_specs", EntityType => SharedSpec);
table!(ContainerSpecs, "container_specs", EntityType => ContainerSpec);
table!(BaseSpecs, "base_specs", EntityType => BaseSpec);
table!(OutpostSpecs, "outpost_specs", EntityType => OutpostSpec);
table!(MinerSpecs, "miner_specs", EntityType => MinerSpec);
table!(ResourceSpecs, "resource_specs", EntityType => ResourceSpec);
table!(BuilderSpecs, "builder_specs", EntityType => BuilderSpec);
table!(ModuleSpecs, "module_specs", EntityType => ModuleSpec);
table!(BlueprintSpecs, "blueprint_specs", EntityType => BlueprintSpec);
table!(MakeCost, "make_cost", EntityType => MakeCostSpec);

/// Every table name created by the migrations, in declaration order.
pub const ALL_TABLES: &[&str] = &[
    TokenAddress::NAME, Constant::NAME, Counter::NAME, Owner::NAME, Commander::NAME,
    Approval::NAME, SpawnTime::NAME, TypeOf::NAME, Health::NAME, Location::NAME,
    Alliance::NAME, AllianceApplied::NAME, AllianceInfo::NAME, MemberAmount::NAME,
    Balance::NAME, Allowance::NAME, TotalSupply::NAME, StoredSize::NAME, Amount::NAME,
    LastUpdated::NAME, ShipAmount::NAME, MinerAmount::NAME, MinerInfo::NAME,
    AsteroidMining::NAME, Path::NAME, WarpPath::NAME, RetreatPath::NAME, GridEntity::NAME,
    GridSpawned::NAME, ShipStats::NAME, ShipModules::NAME, SharedSpecs::NAME,
    ContainerSpecs::NAME, BaseSpecs::NAME, OutpostSpecs::NAME, MinerSpecs::NAME,
    ResourceSpecs::NAME, BuilderSpecs::NAME, ModuleSpecs::NAME, BlueprintSpecs::NAME,
    MakeCost::NAME,
];

// ── Records ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllianceInfoRecord {
    pub approver:   EntityId,
    pub cooldown:   Timestamp,
    pub max_member: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinerInfoRecord {
    pub celestial:    EntityId,
    pub last_updated: Timestamp,
}

/// Straight-line move between two fixed points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathRecord {
    pub from_x:       u32,
    pub from_y:       u32,
    pub to_x:         u32,
    pub to_y:         u32,
    pub last_updated: Timestamp,
    pub duration:     Timestamp,
}

impl PathRecord {
    pub fn new(from: Coord, to: Coord, last_updated: Timestamp, duration: Timestamp) -> Self {
        Self {
            from_x: from.x,
            from_y: from.y,
            to_x: to.x,
            to_y: to.y,
            last_updated,
            duration,
        }
    }

    pub fn origin(&self) -> Coord {
        Coord::new(self.from_x, self.from_y)
    }

    pub fn target(&self) -> Coord {
        Coord::new(self.to_x, self.to_y)
    }
}

/// Warp toward another entity. `to_x`/`to_y` record where the target
/// stood when the warp started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarpPathRecord {
    pub from_x:       u32,
    pub from_y:       u32,
    pub to_x:         u32,
    pub to_y:         u32,
    pub to_entity:    EntityId,
    pub last_updated: Timestamp,
    pub duration:     Timestamp,
}

impl WarpPathRecord {
    pub fn origin(&self) -> Coord {
        Coord::new(self.from_x, self.from_y)
    }

    pub fn recorded_target(&self) -> Coord {
        Coord::new(self.to_x, self.to_y)
    }
}

/// Retreat toward a base. Kept for display after the ship has docked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetreatPathRecord {
    pub from_x:       u32,
    pub from_y:       u32,
    pub to_entity:    EntityId,
    pub last_updated: Timestamp,
    pub duration:     Timestamp,
}

impl RetreatPathRecord {
    pub fn origin(&self) -> Coord {
        Coord::new(self.from_x, self.from_y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipStatsRecord {
    pub attack:     u32,
    pub range:      u32,
    pub speed:      u32,
    pub max_health: u32,
}
