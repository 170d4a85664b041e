// Owner-based visibility of person records.
//
// A caller's view permission decides which `user_id` owners they may see.
// Group membership is the only piece that needs storage, so it sits behind
// `AuthorizationResolver::group_user_ids`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewPermission {
    /// Every person is visible
    Global,
    /// Only persons the caller owns
    Individual,
    /// Persons owned by anyone sharing a group with the caller
    Group,
}

/// Authenticated principal, passed explicitly into every operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub view_permission: ViewPermission,
}

impl Caller {
    pub fn new(user_id: i64, view_permission: ViewPermission) -> Self {
        Self { user_id, view_permission }
    }
}

#[derive(Debug, Error)]
pub enum AuthorizationError {
    #[error("Failed to resolve group members for user {user_id}: {source}")]
    GroupLookup {
        user_id: i64,
        #[source]
        source: sqlx::Error,
    },
}

#[async_trait]
pub trait AuthorizationResolver: Send + Sync {
    /// Users sharing at least one group with `user_id`, possibly including it
    async fn group_user_ids(&self, user_id: i64) -> Result<Vec<i64>, AuthorizationError>;

    /// Owner ids visible to `caller`; `None` means unrestricted
    async fn authorized_user_ids(&self, caller: &Caller) -> Result<Option<Vec<i64>>, AuthorizationError> {
        match caller.view_permission {
            ViewPermission::Global => Ok(None),
            ViewPermission::Individual => Ok(Some(vec![caller.user_id])),
            ViewPermission::Group => {
                let mut ids = self.group_user_ids(caller.user_id).await?;
                ids.push(caller.user_id);
                ids.sort_unstable();
                ids.dedup();
                Ok(Some(ids))
            }
        }
    }
}

/// Reads group membership from the `user_groups` table
pub struct PgAuthorizationResolver {
    pool: PgPool,
}

impl PgAuthorizationResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorizationResolver for PgAuthorizationResolver {
    async fn group_user_ids(&self, user_id: i64) -> Result<Vec<i64>, AuthorizationError> {
        sqlx::query_scalar(
            "SELECT DISTINCT peer.user_id FROM user_groups mine \
             JOIN user_groups peer ON peer.group_id = mine.group_id \
             WHERE mine.user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|source| AuthorizationError::GroupLookup { user_id, source })
    }
}

/// Fixed group map, group id -> member user ids
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorizationResolver {
    groups: HashMap<i64, Vec<i64>>,
}

impl StaticAuthorizationResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group_id: i64, members: impl IntoIterator<Item = i64>) -> Self {
        self.groups.entry(group_id).or_default().extend(members);
        self
    }
}

#[async_trait]
impl AuthorizationResolver for StaticAuthorizationResolver {
    async fn group_user_ids(&self, user_id: i64) -> Result<Vec<i64>, AuthorizationError> {
        Ok(self
            .groups
            .values()
            .filter(|members| members.contains(&user_id))
            .flatten()
            .copied()
            .collect())
    }
}
