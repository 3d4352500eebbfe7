//! Movement engine: position as a pure function of a path record and time.
//!
//! Position is never stored as a running value. For a path from `from` to
//! `to` started at `last_updated` and lasting `duration`:
//!
//!   elapsed  = clamp(now - last_updated, 0, duration)
//!   position = from + floor((to - from) * elapsed / duration)   per axis
//!
//! Rounding is floor toward negative infinity on the exact rational value,
//! so a moving coordinate never overshoots `to` and reaches it exactly at
//! `elapsed == duration`. A zero duration is already at `to`.
//!
//! Resolution order for an entity: `Path`, `WarpPath`, `RetreatPath`,
//! then its stationary `Location`.
//!
//! Warp and retreat destinations follow `to_entity`'s live position. When
//! `to_entity` no longer exists the destination is the hangar of the
//! mover's owning base: the `Location` of the first entity up the `Owner`
//! chain whose type has `BaseSpecs`. Chains of moving targets are followed
//! up to `max_resolution_depth`; a revisited entity is a `CyclicReference`.

use crate::{
    config::MovementConfig,
    error::{StateError, StateResult},
    specs::SpecsCatalog,
    store::WorldStore,
    tables::{Location, Owner, Path, RetreatPath, TypeOf, WarpPath},
    types::{Coord, EntityId, Timestamp},
};
use serde::{Deserialize, Serialize};

/// Interpolate one path at `now`.
pub fn interpolate(
    from:         Coord,
    to:           Coord,
    last_updated: Timestamp,
    duration:     Timestamp,
    now:          Timestamp,
) -> Coord {
    if duration == 0 {
        return to;
    }
    let elapsed = now.saturating_sub(last_updated).min(duration);
    Coord::new(
        lerp_axis(from.x, to.x, elapsed, duration),
        lerp_axis(from.y, to.y, elapsed, duration),
    )
}

fn lerp_axis(from: u32, to: u32, elapsed: Timestamp, duration: Timestamp) -> u32 {
    let delta = i128::from(to) - i128::from(from);
    let offset = (delta * i128::from(elapsed)).div_euclid(i128::from(duration));
    // elapsed <= duration keeps the result between `from` and `to`.
    (i128::from(from) + offset) as u32
}

fn arrived(last_updated: Timestamp, duration: Timestamp, now: Timestamp) -> bool {
    now >= last_updated.saturating_add(duration)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    Path,
    Warp,
    Retreat,
}

pub struct MovementEngine<'a> {
    store:  &'a WorldStore,
    specs:  &'a SpecsCatalog,
    config: &'a MovementConfig,
}

impl<'a> MovementEngine<'a> {
    pub fn new(store: &'a WorldStore, specs: &'a SpecsCatalog, config: &'a MovementConfig) -> Self {
        Self { store, specs, config }
    }

    /// Where `entity` is at `now`. `None` if it has neither a path nor a
    /// location (never placed, or deleted).
    pub fn position_at(&self, entity: EntityId, now: Timestamp) -> StateResult<Option<Coord>> {
        let mut trail = Vec::new();
        self.resolve(entity, now, &mut trail)
    }

    /// Whether the active path of `entity` has run its full duration.
    /// An existing entity without a path is where it is going; one that
    /// does not exist is `UnknownEntity`.
    pub fn has_arrived(&self, entity: EntityId, now: Timestamp) -> StateResult<bool> {
        if let Some(path) = self.store.get::<Path>(&entity)? {
            return Ok(arrived(path.last_updated, path.duration, now));
        }
        if let Some(warp) = self.store.get::<WarpPath>(&entity)? {
            return Ok(arrived(warp.last_updated, warp.duration, now));
        }
        if let Some(retreat) = self.store.get::<RetreatPath>(&entity)? {
            return Ok(arrived(retreat.last_updated, retreat.duration, now));
        }
        if !self.exists(entity)? {
            return Err(StateError::UnknownEntity { entity });
        }
        Ok(true)
    }

    /// Which path record currently drives `entity`'s position.
    pub fn active_path(&self, entity: EntityId) -> StateResult<Option<PathKind>> {
        if self.store.contains::<Path>(&entity)? {
            Ok(Some(PathKind::Path))
        } else if self.store.contains::<WarpPath>(&entity)? {
            Ok(Some(PathKind::Warp))
        } else if self.store.contains::<RetreatPath>(&entity)? {
            Ok(Some(PathKind::Retreat))
        } else {
            Ok(None)
        }
    }

    /// Fixed hangar coordinate of the base that owns `entity`, if any.
    pub fn hangar_of(&self, entity: EntityId) -> StateResult<Option<Coord>> {
        match self.owning_base(entity)? {
            Some(base) => self.store.get::<Location>(&base),
            None => Ok(None),
        }
    }

    /// First entity up the `Owner` chain whose type is a base.
    pub fn owning_base(&self, entity: EntityId) -> StateResult<Option<EntityId>> {
        let mut seen = vec![entity];
        let mut current = entity;
        while let Some(owner) = self.store.get::<Owner>(&current)? {
            if seen.contains(&owner) || seen.len() > self.config.max_resolution_depth {
                return Err(StateError::CyclicReference { entity: owner, depth: seen.len() });
            }
            if let Some(ty) = self.store.get::<TypeOf>(&owner)? {
                if self.specs.is_base(&ty) {
                    return Ok(Some(owner));
                }
            }
            seen.push(owner);
            current = owner;
        }
        Ok(None)
    }

    fn exists(&self, entity: EntityId) -> StateResult<bool> {
        self.store.contains::<TypeOf>(&entity)
    }

    fn resolve(
        &self,
        entity: EntityId,
        now:    Timestamp,
        trail:  &mut Vec<EntityId>,
    ) -> StateResult<Option<Coord>> {
        if trail.contains(&entity) || trail.len() >= self.config.max_resolution_depth {
            return Err(StateError::CyclicReference { entity, depth: trail.len() });
        }
        trail.push(entity);

        let position = if let Some(path) = self.store.get::<Path>(&entity)? {
            Some(interpolate(path.origin(), path.target(), path.last_updated, path.duration, now))
        } else if let Some(warp) = self.store.get::<WarpPath>(&entity)? {
            let to = if self.exists(warp.to_entity)? {
                self.resolve(warp.to_entity, now, trail)?
                    .unwrap_or_else(|| warp.recorded_target())
            } else {
                self.fallback_hangar(entity, warp.to_entity)?
                    .unwrap_or_else(|| {
                        log::warn!("{entity} has no hangar, keeping recorded warp target");
                        warp.recorded_target()
                    })
            };
            Some(interpolate(warp.origin(), to, warp.last_updated, warp.duration, now))
        } else if let Some(retreat) = self.store.get::<RetreatPath>(&entity)? {
            let target = if self.exists(retreat.to_entity)? {
                self.resolve(retreat.to_entity, now, trail)?
            } else {
                None
            };
            let to = match target {
                Some(to) => to,
                None => self
                    .fallback_hangar(entity, retreat.to_entity)?
                    .ok_or(StateError::MissingHangar { entity })?,
            };
            Some(interpolate(retreat.origin(), to, retreat.last_updated, retreat.duration, now))
        } else {
            self.store.get::<Location>(&entity)?
        };

        trail.pop();
        Ok(position)
    }

    fn fallback_hangar(&self, entity: EntityId, gone: EntityId) -> StateResult<Option<Coord>> {
        let hangar = self.hangar_of(entity)?;
        if let Some(h) = hangar {
            log::warn!("{entity}: target {gone} is gone, heading to hangar ({}, {})", h.x, h.y);
        }
        Ok(hangar)
    }
}
