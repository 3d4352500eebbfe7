//! Production engine: time-elapsed accrual toward a capacity ceiling.
//!
//! One algorithm covers miners, builders and outpost health:
//!   1. elapsed  = now - last_updated         (ClockRegression if negative)
//!   2. produced = floor(rate * elapsed)      (exact, no intermediate overflow)
//!   3. amount   = min(amount + produced, capacity)
//!   4. last_updated = now
//!
//! Each entity's accrual reads only its own rows plus read-only specs, so
//! entities may be advanced in any order or on separate connections.
//!
//! Miner rate composition (per elapsed second):
//!   miner.rate * resource.emission_rate / (EMISSION_RATE_SCALE * max(rarity, 1))
//! with capacity min(miner.capacity, resource.max_amount).

use crate::{
    error::{StateError, StateResult},
    event::StateEvent,
    specs::SpecsCatalog,
    store::WorldStore,
    tables::{Amount, Health, LastUpdated, MinerInfo, TypeOf},
    types::{check_timestamp, EntityId, EntityType, Timestamp},
};
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// `emission_rate` is expressed in basis points of the miner's base rate.
pub const EMISSION_RATE_SCALE: u64 = 10_000;

/// Production per elapsed second as an exact fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    per_second: U256,
    divisor:    U256,
}

impl Rate {
    pub fn whole(per_second: U256) -> Self {
        Self { per_second, divisor: U256::from(1u64) }
    }

    /// `per_second / divisor`; a zero divisor is treated as one.
    pub fn fraction(per_second: U256, divisor: U256) -> Self {
        let divisor = if divisor.is_zero() { U256::from(1u64) } else { divisor };
        Self { per_second, divisor }
    }

    /// floor(per_second * elapsed / divisor), or `None` past 2^256.
    ///
    /// Split as q*e + floor(r*e / d) with per_second = q*d + r, which is
    /// exact and keeps r*e below d * 2^40.
    pub fn produced(&self, elapsed: Timestamp) -> Option<U256> {
        let elapsed = U256::from(elapsed);
        let whole = self.per_second / self.divisor;
        let rem = self.per_second % self.divisor;
        let bulk = whole.checked_mul(elapsed)?;
        let tail = rem.checked_mul(elapsed)? / self.divisor;
        bulk.checked_add(tail)
    }
}

/// Result of one accrual step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accrual {
    pub amount:       U256,
    pub last_updated: Timestamp,
    pub produced:     U256,
}

/// Pure accrual step. Never exceeds `capacity`.
pub fn accrue(
    amount:       U256,
    last_updated: Timestamp,
    rate:         Rate,
    capacity:     U256,
    now:          Timestamp,
) -> StateResult<Accrual> {
    let elapsed = now
        .checked_sub(last_updated)
        .ok_or(StateError::ClockRegression { now, last_updated })?;

    let new_amount = rate
        .produced(elapsed)
        .and_then(|produced| amount.checked_add(produced))
        .map_or(capacity, |total| total.min(capacity));

    Ok(Accrual {
        amount:       new_amount,
        last_updated: now,
        produced:     new_amount.saturating_sub(amount),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccrualKind {
    /// `Amount` + `MinerInfo.lastUpdated`, fed by the attached asteroid.
    Miner,
    /// `Amount` + `LastUpdated`, capped by the builder's container.
    Builder,
    /// `Health` + `LastUpdated`, regenerating to `maxHealth`.
    Outpost,
}

/// Rate and ceiling for one entity, derived from its specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccrualProfile {
    pub kind:     AccrualKind,
    pub rate:     Rate,
    pub capacity: U256,
}

pub struct ProductionEngine<'a> {
    store: &'a WorldStore,
    specs: &'a SpecsCatalog,
}

impl<'a> ProductionEngine<'a> {
    pub fn new(store: &'a WorldStore, specs: &'a SpecsCatalog) -> Self {
        Self { store, specs }
    }

    fn type_of(&self, entity: EntityId) -> StateResult<EntityType> {
        self.store
            .get::<TypeOf>(&entity)?
            .ok_or(StateError::UnknownEntity { entity })
    }

    /// Work out how `entity` accrues. Miners need an attached asteroid.
    pub fn profile(&self, entity: EntityId) -> StateResult<AccrualProfile> {
        let ty = self.type_of(entity)?;

        if self.specs.is_miner(&ty) {
            let miner = self.specs.miner(&ty)?;
            let info = self
                .store
                .get::<MinerInfo>(&entity)?
                .ok_or(StateError::NotAttached { miner: entity })?;
            let resource_type = self.type_of(info.celestial)?;
            let resource = self.specs.resource(&resource_type)?;

            let per_second = U256::from(miner.rate)
                .checked_mul(U256::from(resource.emission_rate))
                .ok_or(StateError::Overflow { field: "MinerSpecs.rate" })?;
            let divisor = U256::from(EMISSION_RATE_SCALE) * U256::from(resource.rarity.max(1));

            return Ok(AccrualProfile {
                kind:     AccrualKind::Miner,
                rate:     Rate::fraction(per_second, divisor),
                capacity: miner.capacity.min(resource.max_amount),
            });
        }

        if self.specs.is_builder(&ty) {
            let builder = self.specs.builder_spec(&ty)?;
            let container = self.specs.container(&ty)?;
            return Ok(AccrualProfile {
                kind:     AccrualKind::Builder,
                rate:     Rate::whole(U256::from(builder.rate)),
                capacity: container.capacity,
            });
        }

        if self.specs.is_outpost(&ty) {
            let outpost = self.specs.outpost(&ty)?;
            let shared = self.specs.shared(&ty)?;
            return Ok(AccrualProfile {
                kind:     AccrualKind::Outpost,
                rate:     Rate::whole(U256::from(outpost.health_rate)),
                capacity: U256::from(shared.max_health),
            });
        }

        Err(StateError::UnknownEntityType {
            entity_type: ty,
            table:       "MinerSpecs/BuilderSpecs/OutpostSpecs",
        })
    }

    /// Stored quantity and its as-of timestamp (`None` before first accrual).
    fn stored(&self, entity: EntityId, kind: AccrualKind) -> StateResult<(U256, Option<Timestamp>)> {
        match kind {
            AccrualKind::Miner => {
                let amount = self.store.get_or_default::<Amount>(&entity)?;
                let since = self.store.get::<MinerInfo>(&entity)?.map(|i| i.last_updated);
                Ok((amount, since))
            }
            AccrualKind::Builder => Ok((
                self.store.get_or_default::<Amount>(&entity)?,
                self.store.get::<LastUpdated>(&entity)?,
            )),
            AccrualKind::Outpost => Ok((
                U256::from(self.store.get_or_default::<Health>(&entity)?),
                self.store.get::<LastUpdated>(&entity)?,
            )),
        }
    }

    /// What `advance` would produce at `now`, without writing.
    pub fn preview(&self, entity: EntityId, now: Timestamp) -> StateResult<Accrual> {
        let profile = self.profile(entity)?;
        let (amount, since) = self.stored(entity, profile.kind)?;
        // An entity that never accrued starts its clock now.
        accrue(amount, since.unwrap_or(now), profile.rate, profile.capacity, now)
    }

    /// Recompute the stored quantity of `entity` at `now` and write it back.
    ///
    /// Calling twice with the same `now` is a no-op and reports the stored
    /// amount as is. `now` earlier than the stored timestamp fails with `ClockRegression` and writes nothing.
    pub fn advance(&self, entity: EntityId, now: Timestamp) -> StateResult<Accrual> {
        check_timestamp(now, "LastUpdated")?;
        self.store.atomic(|| {
            let profile = self.profile(entity)?;
            let (amount, since) = self.stored(entity, profile.kind)?;
            if since == Some(now) {
                return Ok(Accrual { amount, last_updated: now, produced: U256::ZERO });
            }
            let accrual = accrue(amount, since.unwrap_or(now), profile.rate, profile.capacity, now)?;
            self.write(entity, profile.kind, &accrual)?;

            if !accrual.produced.is_zero() {
                self.store.append_event(&StateEvent::Accrued {
                    entity,
                    kind:     profile.kind,
                    produced: accrual.produced,
                    amount:   accrual.amount,
                    at:       now,
                })?;
            }
            log::debug!(
                "advanced {entity} ({:?}) to t={now}: +{} -> {}",
                profile.kind, accrual.produced, accrual.amount
            );
            Ok(accrual)
        })
    }

    fn write(&self, entity: EntityId, kind: AccrualKind, accrual: &Accrual) -> StateResult<()> {
        match kind {
            AccrualKind::Miner => {
                let mut info = self
                    .store
                    .get::<MinerInfo>(&entity)?
                    .ok_or(StateError::NotAttached { miner: entity })?;
                info.last_updated = accrual.last_updated;
                self.store.set::<Amount>(&entity, &accrual.amount)?;
                self.store.set::<MinerInfo>(&entity, &info)
            }
            AccrualKind::Builder => {
                self.store.set::<Amount>(&entity, &accrual.amount)?;
                self.store.set::<LastUpdated>(&entity, &accrual.last_updated)
            }
            AccrualKind::Outpost => {
                let health = u32::try_from(accrual.amount)
                    .map_err(|_| StateError::Overflow { field: "Health" })?;
                self.store.set::<Health>(&entity, &health)?;
                self.store.set::<LastUpdated>(&entity, &accrual.last_updated)
            }
        }
    }
}
