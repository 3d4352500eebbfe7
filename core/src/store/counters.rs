//! Width-checked count tables (`ShipAmount`, `MinerAmount`,
//! `MemberAmount`, `Counter`).

use super::WorldStore;
use crate::{
    error::{StateError, StateResult},
    tables::{Counter, Table},
    types::{EntityId, EntityType},
};
use alloy_primitives::{keccak256, U256};
use serde::{de::DeserializeOwned, Serialize};

/// An unsigned count stored at its declared column width.
pub trait Count: Copy + Default + Serialize + DeserializeOwned {
    fn checked_step_up(self) -> Option<Self>;
    fn checked_step_down(self) -> Option<Self>;
}

macro_rules! count_int {
    ($($t:ty),*) => {$(
        impl Count for $t {
            fn checked_step_up(self) -> Option<Self> { self.checked_add(1) }
            fn checked_step_down(self) -> Option<Self> { self.checked_sub(1) }
        }
    )*};
}

count_int!(u8, u16, u32, u64);

impl Count for U256 {
    fn checked_step_up(self) -> Option<Self> {
        self.checked_add(U256::from(1u64))
    }

    fn checked_step_down(self) -> Option<Self> {
        self.checked_sub(U256::from(1u64))
    }
}

impl WorldStore {
    /// Add one to a count row, failing instead of wrapping at the
    /// column's width (a uint8 `ShipAmount` stops at 255).
    pub fn increment<T>(&self, key: &T::Key) -> StateResult<T::Record>
    where
        T: Table,
        T::Record: Count,
    {
        let next = self
            .get_or_default::<T>(key)?
            .checked_step_up()
            .ok_or(StateError::Overflow { field: T::NAME })?;
        self.set::<T>(key, &next)?;
        Ok(next)
    }

    /// Subtract one from a count row; zero stays an error, not a wrap.
    pub fn decrement<T>(&self, key: &T::Key) -> StateResult<T::Record>
    where
        T: Table,
        T::Record: Count,
    {
        let next = self
            .get_or_default::<T>(key)?
            .checked_step_down()
            .ok_or(StateError::Underflow { field: T::NAME })?;
        self.set::<T>(key, &next)?;
        Ok(next)
    }

    /// Mint a fresh entity id for `entity_type` by bumping its `Counter`.
    pub fn next_entity_id(&self, entity_type: EntityType) -> StateResult<EntityId> {
        let count = self.increment::<Counter>(&entity_type)?;
        let mut seed = [0u8; 48];
        seed[..16].copy_from_slice(entity_type.as_slice());
        seed[16..].copy_from_slice(&count.to_be_bytes::<32>());
        Ok(keccak256(seed))
    }
}
