//! Resource ledger: ERC20-style balance, allowance and total supply per
//! resource type.
//!
//! INVARIANT: after every operation, for every resource type,
//!   TotalSupply[type] == Σ Balance[type, *]
//!
//! Each public mutation runs as one atomic unit against the store, so a
//! reader never observes a debited source without the credited
//! destination, and a failed call leaves no writes behind.

use crate::{
    error::{StateError, StateResult},
    event::StateEvent,
    specs::MakeCostSpec,
    store::WorldStore,
    tables::{Allowance, Balance, TotalSupply},
    types::{EntityId, EntityType},
};
use alloy_primitives::U256;

pub struct ResourceLedger<'a> {
    store: &'a WorldStore,
}

impl<'a> ResourceLedger<'a> {
    pub fn new(store: &'a WorldStore) -> Self {
        Self { store }
    }

    // ── Reads ──────────────────────────────────────────────────

    pub fn balance_of(&self, resource: EntityType, owner: EntityId) -> StateResult<U256> {
        self.store.get_or_default::<Balance>(&(resource, owner))
    }

    pub fn allowance(
        &self,
        resource: EntityType,
        owner:    EntityId,
        spender:  EntityId,
    ) -> StateResult<U256> {
        self.store.get_or_default::<Allowance>(&(resource, owner, spender))
    }

    pub fn total_supply(&self, resource: EntityType) -> StateResult<U256> {
        self.store.get_or_default::<TotalSupply>(&resource)
    }

    /// Every holder of `resource` with their balance, in key order.
    pub fn balances(&self, resource: EntityType) -> StateResult<Vec<(EntityId, U256)>> {
        Ok(self
            .store
            .scan_prefix::<Balance>(resource.as_slice())?
            .into_iter()
            .map(|((_, owner), balance)| (owner, balance))
            .collect())
    }

    /// Sum of all balances of `resource`.
    pub fn sum_balances(&self, resource: EntityType) -> StateResult<U256> {
        self.balances(resource)?
            .into_iter()
            .try_fold(U256::ZERO, |acc, (_, balance)| acc.checked_add(balance))
            .ok_or(StateError::Overflow { field: "Balance" })
    }

    /// Whether the supply invariant holds for `resource`.
    pub fn supply_matches(&self, resource: EntityType) -> StateResult<bool> {
        Ok(self.sum_balances(resource)? == self.total_supply(resource)?)
    }

    // ── Mutations ──────────────────────────────────────────────

    pub fn mint(&self, resource: EntityType, owner: EntityId, amount: U256) -> StateResult<()> {
        self.store.atomic(|| {
            let balance = self
                .balance_of(resource, owner)?
                .checked_add(amount)
                .ok_or(StateError::Overflow { field: "Balance" })?;
            let supply = self
                .total_supply(resource)?
                .checked_add(amount)
                .ok_or(StateError::Overflow { field: "TotalSupply" })?;

            self.store.set::<Balance>(&(resource, owner), &balance)?;
            self.store.set::<TotalSupply>(&resource, &supply)?;
            self.store.append_event(&StateEvent::Minted { resource, owner, amount })?;
            log::debug!("minted {amount} of {resource} to {owner}");
            Ok(())
        })
    }

    pub fn burn(&self, resource: EntityType, owner: EntityId, amount: U256) -> StateResult<()> {
        self.store.atomic(|| self.burn_inner(resource, owner, amount))
    }

    pub fn transfer(
        &self,
        resource: EntityType,
        from:     EntityId,
        to:       EntityId,
        amount:   U256,
    ) -> StateResult<()> {
        self.store.atomic(|| self.move_balance(resource, from, to, amount))
    }

    /// Set (not add to) the amount `spender` may move out of `owner`.
    pub fn approve(
        &self,
        resource: EntityType,
        owner:    EntityId,
        spender:  EntityId,
        amount:   U256,
    ) -> StateResult<()> {
        self.store.atomic(|| {
            self.store.set::<Allowance>(&(resource, owner, spender), &amount)?;
            self.store.append_event(&StateEvent::Approved {
                resource,
                owner,
                spender,
                amount,
            })
        })
    }

    /// Move `amount` of `owner`'s balance to `to` on the owner's behalf.
    /// The allowance is checked before the balance.
    pub fn transfer_from(
        &self,
        resource: EntityType,
        owner:    EntityId,
        spender:  EntityId,
        to:       EntityId,
        amount:   U256,
    ) -> StateResult<()> {
        self.store.atomic(|| {
            let available = self.allowance(resource, owner, spender)?;
            let remaining = available.checked_sub(amount).ok_or(
                StateError::InsufficientAllowance {
                    resource,
                    owner,
                    spender,
                    available,
                    required: amount,
                },
            )?;

            self.move_balance(resource, owner, to, amount)?;
            self.store.set::<Allowance>(&(resource, owner, spender), &remaining)?;
            self.store.append_event(&StateEvent::AllowanceSpent {
                resource,
                owner,
                spender,
                amount,
                remaining,
            })
        })
    }

    /// Burn every input of a make-cost recipe from `owner`, all or nothing.
    pub fn pay(&self, owner: EntityId, cost: &MakeCostSpec) -> StateResult<()> {
        self.store.atomic(|| {
            for (resource, amount) in cost.decoded_inputs() {
                self.burn_inner(resource, owner, U256::from(amount))?;
            }
            Ok(())
        })
    }

    // ── Internals (callers wrap these in an atomic unit) ───────

    fn burn_inner(&self, resource: EntityType, owner: EntityId, amount: U256) -> StateResult<()> {
        let available = self.balance_of(resource, owner)?;
        let balance = available
            .checked_sub(amount)
            .ok_or(StateError::InsufficientBalance {
                resource,
                owner,
                available,
                required: amount,
            })?;
        // Supply covers every balance, so this only fails on a corrupted ledger.
        let supply = self
            .total_supply(resource)?
            .checked_sub(amount)
            .ok_or(StateError::Underflow { field: "TotalSupply" })?;

        self.store.set::<Balance>(&(resource, owner), &balance)?;
        self.store.set::<TotalSupply>(&resource, &supply)?;
        self.store.append_event(&StateEvent::Burned { resource, owner, amount })?;
        log::debug!("burned {amount} of {resource} from {owner}");
        Ok(())
    }

    fn move_balance(
        &self,
        resource: EntityType,
        from:     EntityId,
        to:       EntityId,
        amount:   U256,
    ) -> StateResult<()> {
        let available = self.balance_of(resource, from)?;
        let debited = available
            .checked_sub(amount)
            .ok_or(StateError::InsufficientBalance {
                resource,
                owner: from,
                available,
                required: amount,
            })?;
        self.store.set::<Balance>(&(resource, from), &debited)?;

        // Read after the debit so a self-transfer nets to zero.
        let credited = self
            .balance_of(resource, to)?
            .checked_add(amount)
            .ok_or(StateError::Overflow { field: "Balance" })?;
        self.store.set::<Balance>(&(resource, to), &credited)?;

        self.store.append_event(&StateEvent::Transferred {
            resource,
            from,
            to,
            amount,
        })?;
        log::debug!("moved {amount} of {resource} from {from} to {to}");
        Ok(())
    }
}
