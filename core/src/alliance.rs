//! Alliance membership bookkeeping.
//!
//! INVARIANT: MemberAmount[alliance] <= AllianceInfo[alliance].max_member
//!
//! Who may approve an application is an access-control question for the
//! caller; `approver` and `cooldown` are stored, not enforced.

use crate::{
    error::{StateError, StateResult},
    event::StateEvent,
    store::WorldStore,
    tables::{Alliance, AllianceApplied, AllianceInfo, AllianceInfoRecord, MemberAmount},
    types::{check_timestamp, EntityId},
};

pub struct AllianceRegistry<'a> {
    store: &'a WorldStore,
}

impl<'a> AllianceRegistry<'a> {
    pub fn new(store: &'a WorldStore) -> Self {
        Self { store }
    }

    pub fn info(&self, alliance: EntityId) -> StateResult<AllianceInfoRecord> {
        self.store
            .get::<AllianceInfo>(&alliance)?
            .ok_or(StateError::UnknownAlliance { alliance })
    }

    pub fn member_amount(&self, alliance: EntityId) -> StateResult<u32> {
        self.store.get_or_default::<MemberAmount>(&alliance)
    }

    pub fn alliance_of(&self, player: EntityId) -> StateResult<Option<EntityId>> {
        self.store.get::<Alliance>(&player)
    }

    /// Register or reconfigure an alliance. Shrinking `max_member` below
    /// the current member count is rejected.
    pub fn create(&self, alliance: EntityId, info: AllianceInfoRecord) -> StateResult<()> {
        check_timestamp(info.cooldown, "AllianceInfo.cooldown")?;
        self.store.atomic(|| {
            let members = self.member_amount(alliance)?;
            if members > info.max_member {
                return Err(StateError::AllianceFull {
                    alliance,
                    max_member: info.max_member,
                });
            }
            self.store.set::<AllianceInfo>(&alliance, &info)?;
            self.store.set::<MemberAmount>(&alliance, &members)?;
            self.store.append_event(&StateEvent::AllianceCreated {
                alliance,
                max_member: info.max_member,
            })
        })
    }

    /// Record `player`'s application. A newer application replaces an older one.
    pub fn apply(&self, player: EntityId, alliance: EntityId) -> StateResult<()> {
        self.info(alliance)?;
        if let Some(current) = self.alliance_of(player)? {
            return Err(StateError::AlreadyMember { player, alliance: current });
        }
        self.store.set::<AllianceApplied>(&player, &alliance)
    }

    /// Accept `player`'s pending application.
    pub fn admit(&self, player: EntityId) -> StateResult<u32> {
        self.store.atomic(|| {
            let alliance = self
                .store
                .get::<AllianceApplied>(&player)?
                .ok_or(StateError::NotApplied { player })?;
            if let Some(current) = self.alliance_of(player)? {
                return Err(StateError::AlreadyMember { player, alliance: current });
            }
            let info = self.info(alliance)?;
            if self.member_amount(alliance)? >= info.max_member {
                return Err(StateError::AllianceFull {
                    alliance,
                    max_member: info.max_member,
                });
            }

            let members = self.store.increment::<MemberAmount>(&alliance)?;
            self.store.set::<Alliance>(&player, &alliance)?;
            self.store.delete::<AllianceApplied>(&player)?;
            self.store.append_event(&StateEvent::MemberJoined { alliance, player, members })?;
            log::debug!("{player} joined {alliance} ({members}/{})", info.max_member);
            Ok(members)
        })
    }

    pub fn leave(&self, player: EntityId) -> StateResult<u32> {
        self.store.atomic(|| {
            let alliance = self
                .alliance_of(player)?
                .ok_or(StateError::NotMember { player })?;
            let members = self.store.decrement::<MemberAmount>(&alliance)?;
            self.store.delete::<Alliance>(&player)?;
            self.store.append_event(&StateEvent::MemberLeft { alliance, player, members })?;
            Ok(members)
        })
    }

    /// Drop every alliance row that mentions `entity`, as a player or as
    /// an alliance. A departing member frees their slot.
    pub fn purge(&self, entity: EntityId) -> StateResult<()> {
        self.store.atomic(|| {
            if self.alliance_of(entity)?.is_some() {
                self.leave(entity)?;
            }
            self.store.delete::<AllianceApplied>(&entity)?;

            if self.store.delete::<AllianceInfo>(&entity)? {
                for player in self.store.keys::<Alliance>()? {
                    if self.alliance_of(player)? == Some(entity) {
                        self.store.delete::<Alliance>(&player)?;
                    }
                }
                for player in self.store.keys::<AllianceApplied>()? {
                    if self.store.get::<AllianceApplied>(&player)? == Some(entity) {
                        self.store.delete::<AllianceApplied>(&player)?;
                    }
                }
                log::debug!("disbanded alliance {entity}");
            }
            self.store.delete::<MemberAmount>(&entity)?;
            Ok(())
        })
    }
}
