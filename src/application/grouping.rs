//! Grouping service.
//!
//! Bundles ungrouped trades sharing market and broker into a [`GroupTrade`].
//! Every operation writes the group and all affected member trades in one
//! commit: a batch is grouped or ungrouped entirely or not at all.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::retry::ConflictRetry;
use crate::domain::{GroupId, GroupTrade, Trade, TradeId, UserId};
use crate::error::{Entity, Error, Result};
use crate::port::{ChangeSet, JournalStore};

/// A group with its member trades resolved.
#[derive(Debug, Clone, Serialize)]
pub struct GroupView {
    #[serde(flatten)]
    pub group: GroupTrade,
    pub members: Vec<Trade>,
}

pub struct GroupingService<S> {
    store: Arc<S>,
    retry: ConflictRetry,
}

impl<S: JournalStore> GroupingService<S> {
    pub fn new(store: Arc<S>, retry: ConflictRetry) -> Self {
        Self { store, retry }
    }

    /// Create a group from `trade_ids`, flagging every member as grouped.
    ///
    /// # Errors
    /// `NotFound` for unknown trades or trades of another user,
    /// `TradeAlreadyGrouped` for deleted or grouped trades and
    /// `InconsistentGroupFields` when market or broker differ.
    pub async fn create_group(
        &self,
        user_id: &UserId,
        name: &str,
        trade_ids: &[TradeId],
    ) -> Result<GroupTrade> {
        let result = self
            .retry
            .run("create_group", || async {
                let members = self.load_members(user_id, trade_ids).await?;
                let group = GroupTrade::from_members(user_id.clone(), name, &members)?;
                let members = attach(members, group.id);

                self.store
                    .commit(ChangeSet::new().group(group.clone()).trades(members))
                    .await?;
                Ok(group)
            })
            .await;

        match result {
            Ok(mut group) => {
                group.version += 1;
                info!(group_id = %group.id, members = group.trade_ids.len(), "Group created");
                Ok(group)
            }
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "Group creation rejected");
                Err(err)
            }
        }
    }

    /// Add trades to an existing group, optionally renaming it.
    ///
    /// New members are checked against the group's own market and broker.
    ///
    /// # Errors
    /// As [`GroupingService::create_group`], plus `NotFound` for a missing or
    /// deleted group.
    pub async fn add_to_group(
        &self,
        group_id: GroupId,
        trade_ids: &[TradeId],
        new_name: Option<&str>,
    ) -> Result<GroupTrade> {
        let mut group = self
            .retry
            .run("add_to_group", || async {
                let mut group = self.load_group(group_id).await?;
                let members = self.load_members(&group.user_id, trade_ids).await?;
                group.admit(&members)?;
                if let Some(name) = new_name {
                    group.name = name.to_string();
                }
                let members = attach(members, group.id);

                self.store
                    .commit(ChangeSet::new().group(group.clone()).trades(members))
                    .await?;
                Ok(group)
            })
            .await?;

        group.version += 1;
        info!(group_id = %group_id, added = trade_ids.len(), members = group.trade_ids.len(), "Trades added to group");
        Ok(group)
    }

    /// Remove trades from a group and clear their grouped flag.
    ///
    /// The group is marked deleted once it has no members left.
    ///
    /// # Errors
    /// `NotFound` for a missing group or trade, `TradeNotInGroup` for a trade
    /// that is not a member.
    pub async fn remove_from_group(
        &self,
        group_id: GroupId,
        trade_ids: &[TradeId],
    ) -> Result<GroupTrade> {
        let mut group = self
            .retry
            .run("remove_from_group", || async {
                let mut group = self.load_group(group_id).await?;
                let mut members = Vec::with_capacity(trade_ids.len());
                for &trade_id in trade_ids {
                    members.push(self.load_trade(trade_id).await?);
                }
                group.release(&members)?;
                let members = detach(members);

                self.store
                    .commit(ChangeSet::new().group(group.clone()).trades(members))
                    .await?;
                Ok(group)
            })
            .await?;

        group.version += 1;
        info!(
            group_id = %group_id,
            removed = trade_ids.len(),
            deleted = group.is_deleted,
            "Trades removed from group"
        );
        Ok(group)
    }

    /// Mark a group deleted and ungroup all of its members. Member trades
    /// themselves are kept.
    ///
    /// # Errors
    /// `NotFound` for a missing or already deleted group.
    pub async fn delete_group(&self, group_id: GroupId) -> Result<GroupTrade> {
        let mut group = self
            .retry
            .run("delete_group", || async {
                let mut group = self.load_group(group_id).await?;
                let mut members = Vec::with_capacity(group.trade_ids.len());
                for &trade_id in &group.trade_ids {
                    if let Some(trade) = self.store.get_trade(trade_id).await? {
                        members.push(trade);
                    }
                }
                group.is_deleted = true;
                let members = detach(members);

                self.store
                    .commit(ChangeSet::new().group(group.clone()).trades(members))
                    .await?;
                Ok(group)
            })
            .await?;

        group.version += 1;
        info!(group_id = %group_id, "Group deleted");
        Ok(group)
    }

    /// A user's live groups with member trades populated.
    ///
    /// # Errors
    /// Store failures only.
    pub async fn list_groups(&self, user_id: &UserId) -> Result<Vec<GroupView>> {
        let groups = self.store.list_groups(user_id).await?;
        let mut views = Vec::with_capacity(groups.len());
        for group in groups {
            let mut members = Vec::with_capacity(group.trade_ids.len());
            for &trade_id in &group.trade_ids {
                if let Some(trade) = self.store.get_trade(trade_id).await? {
                    members.push(trade);
                }
            }
            views.push(GroupView { group, members });
        }
        Ok(views)
    }

    async fn load_group(&self, group_id: GroupId) -> Result<GroupTrade> {
        self.store
            .get_group(group_id)
            .await?
            .filter(|g| !g.is_deleted)
            .ok_or_else(|| Error::not_found(Entity::Group, group_id))
    }

    async fn load_trade(&self, trade_id: TradeId) -> Result<Trade> {
        self.store
            .get_trade(trade_id)
            .await?
            .ok_or_else(|| Error::not_found(Entity::Trade, trade_id))
    }

    /// Deleted trades are returned as-is; eligibility is the group's call.
    async fn load_members(&self, user_id: &UserId, trade_ids: &[TradeId]) -> Result<Vec<Trade>> {
        let mut members = Vec::with_capacity(trade_ids.len());
        for &trade_id in trade_ids {
            let trade = self.load_trade(trade_id).await?;
            if trade.user_id != *user_id {
                return Err(Error::not_found(Entity::Trade, trade_id));
            }
            members.push(trade);
        }
        Ok(members)
    }
}

fn attach(members: Vec<Trade>, group_id: GroupId) -> Vec<Trade> {
    members
        .into_iter()
        .map(|mut t| {
            t.is_grouped = true;
            t.group_id = Some(group_id);
            t
        })
        .collect()
}

fn detach(members: Vec<Trade>) -> Vec<Trade> {
    members
        .into_iter()
        .map(|mut t| {
            t.is_grouped = false;
            t.group_id = None;
            t
        })
        .collect()
}
