//! The world facade: one store, one catalog, every engine.
//!
//! RULES:
//!   - Engines never call each other; they meet only through the store.
//!   - The specs catalog is loaded once and never mutated.
//!   - Destroying an entity removes all of its per-entity rows, so later
//!     lookups see it as absent rather than stale.

use crate::{
    alliance::AllianceRegistry,
    config::WorldConfig,
    error::{StateError, StateResult},
    ledger::ResourceLedger,
    movement::MovementEngine,
    production::ProductionEngine,
    specs::SpecsCatalog,
    store::WorldStore,
    tables::{
        Amount, Approval, AsteroidMining, Commander, Health, LastUpdated, Location, MinerAmount,
        MinerInfo, Owner, Path, RetreatPath, ShipAmount, ShipModules, ShipStats, SpawnTime,
        StoredSize, TypeOf, WarpPath,
    },
    types::{check_timestamp, Coord, EntityId, EntityType, Timestamp},
};

pub struct World {
    store:  WorldStore,
    config: WorldConfig,
}

impl World {
    /// Wrap an already-migrated store.
    pub fn new(store: WorldStore, config: WorldConfig) -> Self {
        Self { store, config }
    }

    /// Open (or create) a world database, migrate it and mirror the specs.
    pub fn open(path: &str, config: WorldConfig) -> StateResult<Self> {
        let store = WorldStore::open(path)?;
        Self::prepare(store, config)
    }

    /// In-memory world (used in tests).
    pub fn in_memory(config: WorldConfig) -> StateResult<Self> {
        Self::prepare(WorldStore::in_memory()?, config)
    }

    /// In-memory world with the fixed test catalog.
    pub fn build_test() -> StateResult<Self> {
        Self::in_memory(WorldConfig::default_test())
    }

    fn prepare(store: WorldStore, config: WorldConfig) -> StateResult<Self> {
        store.migrate()?;
        config.specs.write_to(&store)?;
        Ok(Self { store, config })
    }

    pub fn store(&self) -> &WorldStore {
        &self.store
    }

    pub fn specs(&self) -> &SpecsCatalog {
        &self.config.specs
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn ledger(&self) -> ResourceLedger<'_> {
        ResourceLedger::new(&self.store)
    }

    pub fn production(&self) -> ProductionEngine<'_> {
        ProductionEngine::new(&self.store, &self.config.specs)
    }

    pub fn movement(&self) -> MovementEngine<'_> {
        MovementEngine::new(&self.store, &self.config.specs, &self.config.movement)
    }

    pub fn alliances(&self) -> AllianceRegistry<'_> {
        AllianceRegistry::new(&self.store)
    }

    /// Create an entity of a catalogued type.
    ///
    /// Writes `EntityType`, `SpawnTime`, and when given `Owner` and
    /// `Location`. Types with a `SharedSpecs` row start at full health.
    pub fn spawn(
        &self,
        entity:      EntityId,
        entity_type: EntityType,
        owner:       Option<EntityId>,
        location:    Option<Coord>,
        at:          Timestamp,
    ) -> StateResult<()> {
        check_timestamp(at, "SpawnTime")?;
        if !self.specs().knows(&entity_type) {
            return Err(StateError::UnknownEntityType {
                entity_type,
                table: "SharedSpecs",
            });
        }
        self.store.atomic(|| {
            self.store.set::<TypeOf>(&entity, &entity_type)?;
            self.store.set::<SpawnTime>(&entity, &at)?;
            if let Some(owner) = owner {
                self.store.set::<Owner>(&entity, &owner)?;
            }
            if let Some(location) = location {
                self.store.set::<Location>(&entity, &location)?;
            }
            if let Ok(shared) = self.specs().shared(&entity_type) {
                self.store.set::<Health>(&entity, &shared.max_health)?;
            }
            log::debug!("spawned {entity} as {entity_type} at t={at}");
            Ok(())
        })
    }

    /// Remove every per-entity row of `entity`, including alliance
    /// membership (the slot is freed) and, for an alliance, its members'
    /// links to it. Ledger balances stay: they belong to the resource, and
    /// burning them is the caller's decision.
    pub fn despawn(&self, entity: EntityId) -> StateResult<bool> {
        self.store.atomic(|| {
            let existed = self.store.delete::<TypeOf>(&entity)?;
            self.store.delete::<SpawnTime>(&entity)?;
            self.store.delete::<Owner>(&entity)?;
            self.store.delete::<Commander>(&entity)?;
            self.store.delete::<Approval>(&entity)?;
            self.store.delete::<Health>(&entity)?;
            self.store.delete::<Location>(&entity)?;
            self.store.delete::<Path>(&entity)?;
            self.store.delete::<WarpPath>(&entity)?;
            self.store.delete::<RetreatPath>(&entity)?;
            self.store.delete::<Amount>(&entity)?;
            self.store.delete::<StoredSize>(&entity)?;
            self.store.delete::<LastUpdated>(&entity)?;
            self.store.delete::<MinerInfo>(&entity)?;
            self.store.delete::<ShipStats>(&entity)?;
            self.store.delete::<ShipModules>(&entity)?;
            self.store.delete::<ShipAmount>(&entity)?;
            self.store.delete::<MinerAmount>(&entity)?;
            self.store.delete::<AsteroidMining>(&entity)?;
            self.alliances().purge(entity)?;
            log::debug!("despawned {entity}");
            Ok(existed)
        })
    }
}
