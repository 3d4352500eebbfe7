//! Static specs catalog: immutable per-type constants.
//!
//! Built once at startup (see `config.rs`) and shared read-only. Every
//! lookup of a missing row is an `UnknownEntityType` error: all
//! downstream math depends on these constants, so there is no default.

use crate::{
    error::{StateError, StateResult},
    store::WorldStore,
    tables,
    types::{EntityType, Timestamp},
};
use alloy_primitives::{FixedBytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedSpec {
    pub size:       u128,
    pub max_health: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub capacity: U256,
}

/// A base owns storages, a builder, an assembler and up to
/// `miner_amount` miners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseSpec {
    pub level:        u8,
    pub ship_amount:  u8,
    pub miner_amount: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutpostSpec {
    pub health_rate: u32,
    pub attack:      u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerSpec {
    pub speed:    u32,
    pub rate:     u128,
    pub capacity: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    pub max_amount:    U256,
    pub emission_rate: u128,
    pub rarity:        u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderSpec {
    pub rate: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSpec {
    pub attack:     u32,
    pub range:      u32,
    pub speed:      u32,
    pub max_health: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintSpec {
    pub rarity: u8,
    pub price:  u128,
}

/// Recipe for repairs, outposts, modules and base upgrades.
///
/// Each input word packs the resource type in its first 16 bytes and a
/// big-endian uint128 amount in the last 16.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeCostSpec {
    pub time_cost: Timestamp,
    pub output:    EntityType,
    pub inputs:    Vec<B256>,
}

impl MakeCostSpec {
    pub fn new(time_cost: Timestamp, output: EntityType, inputs: &[(EntityType, u128)]) -> Self {
        Self {
            time_cost,
            output,
            inputs: inputs.iter().map(|(ty, amount)| pack_input(*ty, *amount)).collect(),
        }
    }

    /// Decoded `(resource, amount)` pairs in recipe order.
    pub fn decoded_inputs(&self) -> impl Iterator<Item = (EntityType, u128)> + '_ {
        self.inputs.iter().map(unpack_input)
    }
}

pub fn pack_input(resource: EntityType, amount: u128) -> B256 {
    let mut word = [0u8; 32];
    word[..16].copy_from_slice(resource.as_slice());
    word[16..].copy_from_slice(&amount.to_be_bytes());
    B256::from(word)
}

pub fn unpack_input(word: &B256) -> (EntityType, u128) {
    let mut resource = [0u8; 16];
    let mut amount = [0u8; 16];
    resource.copy_from_slice(&word[..16]);
    amount.copy_from_slice(&word[16..]);
    (FixedBytes(resource), u128::from_be_bytes(amount))
}

/// Read-only lookup of every spec family by type tag.
#[derive(Debug, Clone, Default)]
pub struct SpecsCatalog {
    shared:    HashMap<EntityType, SharedSpec>,
    container: HashMap<EntityType, ContainerSpec>,
    base:      HashMap<EntityType, BaseSpec>,
    outpost:   HashMap<EntityType, OutpostSpec>,
    miner:     HashMap<EntityType, MinerSpec>,
    resource:  HashMap<EntityType, ResourceSpec>,
    builder:   HashMap<EntityType, BuilderSpec>,
    module:    HashMap<EntityType, ModuleSpec>,
    blueprint: HashMap<EntityType, BlueprintSpec>,
    make_cost: HashMap<EntityType, MakeCostSpec>,
}

fn lookup<'a, V>(
    map: &'a HashMap<EntityType, V>,
    entity_type: &EntityType,
    table: &'static str,
) -> StateResult<&'a V> {
    map.get(entity_type).ok_or(StateError::UnknownEntityType {
        entity_type: *entity_type,
        table,
    })
}

impl SpecsCatalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn shared(&self, ty: &EntityType) -> StateResult<&SharedSpec> {
        lookup(&self.shared, ty, "SharedSpecs")
    }

    pub fn container(&self, ty: &EntityType) -> StateResult<&ContainerSpec> {
        lookup(&self.container, ty, "ContainerSpecs")
    }

    pub fn base(&self, ty: &EntityType) -> StateResult<&BaseSpec> {
        lookup(&self.base, ty, "BaseSpecs")
    }

    pub fn outpost(&self, ty: &EntityType) -> StateResult<&OutpostSpec> {
        lookup(&self.outpost, ty, "OutpostSpecs")
    }

    pub fn miner(&self, ty: &EntityType) -> StateResult<&MinerSpec> {
        lookup(&self.miner, ty, "MinerSpecs")
    }

    pub fn resource(&self, ty: &EntityType) -> StateResult<&ResourceSpec> {
        lookup(&self.resource, ty, "ResourceSpecs")
    }

    pub fn builder_spec(&self, ty: &EntityType) -> StateResult<&BuilderSpec> {
        lookup(&self.builder, ty, "BuilderSpecs")
    }

    pub fn module(&self, ty: &EntityType) -> StateResult<&ModuleSpec> {
        lookup(&self.module, ty, "ModuleSpecs")
    }

    pub fn blueprint(&self, ty: &EntityType) -> StateResult<&BlueprintSpec> {
        lookup(&self.blueprint, ty, "BlueprintSpecs")
    }

    pub fn make_cost(&self, ty: &EntityType) -> StateResult<&MakeCostSpec> {
        lookup(&self.make_cost, ty, "MakeCost")
    }

    pub fn is_base(&self, ty: &EntityType) -> bool {
        self.base.contains_key(ty)
    }

    pub fn is_miner(&self, ty: &EntityType) -> bool {
        self.miner.contains_key(ty)
    }

    pub fn is_builder(&self, ty: &EntityType) -> bool {
        self.builder.contains_key(ty)
    }

    pub fn is_outpost(&self, ty: &EntityType) -> bool {
        self.outpost.contains_key(ty)
    }

    /// Whether any spec family has a row for `ty`.
    pub fn knows(&self, ty: &EntityType) -> bool {
        self.shared.contains_key(ty)
            || self.container.contains_key(ty)
            || self.base.contains_key(ty)
            || self.outpost.contains_key(ty)
            || self.miner.contains_key(ty)
            || self.resource.contains_key(ty)
            || self.builder.contains_key(ty)
            || self.module.contains_key(ty)
            || self.blueprint.contains_key(ty)
            || self.make_cost.contains_key(ty)
    }

    /// Mirror every row into the spec tables so drivers can read them raw.
    pub fn write_to(&self, store: &WorldStore) -> StateResult<()> {
        store.atomic(|| {
            for (ty, spec) in &self.shared {
                store.set::<tables::SharedSpecs>(ty, spec)?;
            }
            for (ty, spec) in &self.container {
                store.set::<tables::ContainerSpecs>(ty, spec)?;
            }
            for (ty, spec) in &self.base {
                store.set::<tables::BaseSpecs>(ty, spec)?;
            }
            for (ty, spec) in &self.outpost {
                store.set::<tables::OutpostSpecs>(ty, spec)?;
            }
            for (ty, spec) in &self.miner {
                store.set::<tables::MinerSpecs>(ty, spec)?;
            }
            for (ty, spec) in &self.resource {
                store.set::<tables::ResourceSpecs>(ty, spec)?;
            }
            for (ty, spec) in &self.builder {
                store.set::<tables::BuilderSpecs>(ty, spec)?;
            }
            for (ty, spec) in &self.module {
                store.set::<tables::ModuleSpecs>(ty, spec)?;
            }
            for (ty, spec) in &self.blueprint {
                store.set::<tables::BlueprintSpecs>(ty, spec)?;
            }
            for (ty, spec) in &self.make_cost {
                store.set::<tables::MakeCost>(ty, spec)?;
            }
            Ok(())
        })
    }
}

/// Assembles a [`SpecsCatalog`]; the catalog itself has no setters.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: SpecsCatalog,
}

impl CatalogBuilder {
    pub fn shared(mut self, ty: EntityType, spec: SharedSpec) -> Self {
        self.catalog.shared.insert(ty, spec);
        self
    }

    pub fn container(mut self, ty: EntityType, spec: ContainerSpec) -> Self {
        self.catalog.container.insert(ty, spec);
        self
    }

    pub fn base(mut self, ty: EntityType, spec: BaseSpec) -> Self {
        self.catalog.base.insert(ty, spec);
        self
    }

    pub fn outpost(mut self, ty: EntityType, spec: OutpostSpec) -> Self {
        self.catalog.outpost.insert(ty, spec);
        self
    }

    pub fn miner(mut self, ty: EntityType, spec: MinerSpec) -> Self {
        self.catalog.miner.insert(ty, spec);
        self
    }

    pub fn resource(mut self, ty: EntityType, spec: ResourceSpec) -> Self {
        self.catalog.resource.insert(ty, spec);
        self
    }

    pub fn builder(mut self, ty: EntityType, spec: BuilderSpec) -> Self {
        self.catalog.builder.insert(ty, spec);
        self
    }

    pub fn module(mut self, ty: EntityType, spec: ModuleSpec) -> Self {
        self.catalog.module.insert(ty, spec);
        self
    }

    pub fn blueprint(mut self, ty: EntityType, spec: BlueprintSpec) -> Self {
        self.catalog.blueprint.insert(ty, spec);
        self
    }

    pub fn make_cost(mut self, ty: EntityType, spec: MakeCostSpec) -> Self {
        self.catalog.make_cost.insert(ty, spec);
        self
    }

    pub fn build(self) -> SpecsCatalog {
        self.catalog
    }
}
