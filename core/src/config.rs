//! World configuration loaded once at startup from the data directory.
//!
//! `world.json`: engine knobs (movement resolution depth).
//! `specs.json`: the static specs catalog, keyed by readable type names.

use crate::{
    specs::{
        BaseSpec, BlueprintSpec, BuilderSpec, ContainerSpec, MakeCostSpec, MinerSpec, ModuleSpec,
        OutpostSpec, ResourceSpec, SharedSpec, SpecsCatalog,
    },
    types::{static_tag as tag, type_tag, Timestamp},
};
use alloy_primitives::U256;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path, sync::Arc};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementConfig {
    /// Longest chain of warp targets followed before giving up with
    /// `CyclicReference`.
    pub max_resolution_depth: usize,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self { max_resolution_depth: 8 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WorldFile {
    #[serde(default)]
    movement: MovementConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MakeCostEntry {
    time_cost: Timestamp,
    output:    String,
    inputs:    Vec<MakeCostInput>,
}

#[derive(Debug, Clone, Deserialize)]
struct MakeCostInput {
    resource: String,
    amount:   u128,
}

/// On-disk shape of `specs.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SpecsFile {
    shared:    BTreeMap<String, SharedSpec>,
    container: BTreeMap<String, ContainerSpec>,
    base:      BTreeMap<String, BaseSpec>,
    outpost:   BTreeMap<String, OutpostSpec>,
    miner:     BTreeMap<String, MinerSpec>,
    resource:  BTreeMap<String, ResourceSpec>,
    builder:   BTreeMap<String, BuilderSpec>,
    module:    BTreeMap<String, ModuleSpec>,
    blueprint: BTreeMap<String, BlueprintSpec>,
    make_cost: BTreeMap<String, MakeCostEntry>,
}

impl SpecsFile {
    fn into_catalog(self) -> anyhow::Result<SpecsCatalog> {
        let mut b = SpecsCatalog::builder();
        for (name, spec) in self.shared {
            b = b.shared(type_tag(&name)?, spec);
        }
        for (name, spec) in self.container {
            b = b.container(type_tag(&name)?, spec);
        }
        for (name, spec) in self.base {
            b = b.base(type_tag(&name)?, spec);
        }
        for (name, spec) in self.outpost {
            b = b.outpost(type_tag(&name)?, spec);
        }
        for (name, spec) in self.miner {
            b = b.miner(type_tag(&name)?, spec);
        }
        for (name, spec) in self.resource {
            b = b.resource(type_tag(&name)?, spec);
        }
        for (name, spec) in self.builder {
            b = b.builder(type_tag(&name)?, spec);
        }
        for (name, spec) in self.module {
            b = b.module(type_tag(&name)?, spec);
        }
        for (name, spec) in self.blueprint {
            b = b.blueprint(type_tag(&name)?, spec);
        }
        for (name, entry) in self.make_cost {
            let inputs = entry
                .inputs
                .iter()
                .map(|i| Ok((type_tag(&i.resource)?, i.amount)))
                .collect::<anyhow::Result<Vec<_>>>()
                .with_context(|| format!("makeCost.{name}.inputs"))?;
            let output = type_tag(&entry.output)?;
            b = b.make_cost(type_tag(&name)?, MakeCostSpec::new(entry.time_cost, output, &inputs));
        }
        Ok(b.build())
    }
}

#[derive(Debug, Clone)]
pub struct WorldConfig {
    pub movement: MovementConfig,
    pub specs:    Arc<SpecsCatalog>,
}

impl WorldConfig {
    /// Load `world.json` and `specs.json` from `data_dir`.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let dir = Path::new(data_dir);

        let world_path = dir.join("world.json");
        let world: WorldFile = if world_path.exists() {
            let content = std::fs::read_to_string(&world_path)
                .with_context(|| format!("reading {}", world_path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", world_path.display()))?
        } else {
            log::warn!("{} missing, using default engine settings", world_path.display());
            WorldFile::default()
        };

        let specs_path = dir.join("specs.json");
        let specs_content = std::fs::read_to_string(&specs_path)
            .with_context(|| format!("reading {}", specs_path.display()))?;
        let specs_file: SpecsFile = serde_json::from_str(&specs_content)
            .with_context(|| format!("parsing {}", specs_path.display()))?;
        let specs = specs_file.into_catalog()?;

        log::info!("loaded world config from {data_dir}");
        Ok(Self {
            movement: world.movement,
            specs:    Arc::new(specs),
        })
    }

    /// Fixed catalog used by tests. Mirrors `data/specs.json`.
    pub fn default_test() -> Self {
        Self {
            movement: MovementConfig::default(),
            specs:    Arc::new(test_catalog()),
        }
    }
}

fn test_catalog() -> SpecsCatalog {
    SpecsCatalog::builder()
        // base
        .shared(tag("base"), SharedSpec { size: 100, max_health: 5_000 })
        .container(tag("base"), ContainerSpec { capacity: U256::from(10_000u64) })
        .base(tag("base"), BaseSpec { level: 1, ship_amount: 5, miner_amount: 3 })
        // ship
        .shared(tag("ship"), SharedSpec { size: 10, max_health: 100 })
        // miner
        .shared(tag("miner"), SharedSpec { size: 5, max_health: 50 })
        .miner(tag("miner"), MinerSpec { speed: 1, rate: 10, capacity: U256::from(1_000u64) })
        // builder
        .shared(tag("builder"), SharedSpec { size: 20, max_health: 200 })
        .builder(tag("builder"), BuilderSpec { rate: 2 })
        .container(tag("builder"), ContainerSpec { capacity: U256::from(50u64) })
        // outpost
        .shared(tag("outpost"), SharedSpec { size: 50, max_health: 500 })
        .outpost(tag("outpost"), OutpostSpec { health_rate: 5, attack: 3 })
        // resources (asteroid types share the resource tag)
        .resource(tag("spice"), ResourceSpec {
            max_amount:    U256::from(5_000u64),
            emission_rate: 10_000,
            rarity:        1,
        })
        .resource(tag("crystal"), ResourceSpec {
            max_amount:    U256::from(600u64),
            emission_rate: 5_000,
            rarity:        2,
        })
        // modules
        .module(tag("laser"), ModuleSpec { attack: 12, range: 3, speed: 0, max_health: 40 })
        .blueprint(tag("laser"), BlueprintSpec { rarity: 1, price: 250 })
        .make_cost(
            tag("laser"),
            MakeCostSpec::new(60, tag("laser"), &[(tag("spice"), 100), (tag("crystal"), 20)]),
        )
        .build()
}
