//! # OAuth State Repository
//!
//! This module provides database operations for OAuth state management.
//! States are single-use: the callback consumes the row atomically with the
//! lookup, and expired rows are treated as absent.

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use super::RepositoryError;
use crate::models::oauth_state::{self, ActiveModel, Entity, Model};

/// Repository for OAuth state database operations
pub struct OAuthStateRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> OAuthStateRepository<'a> {
    /// Create a new OAuth state repository
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persist a new OAuth state token with the given time to live
    pub async fn create(&self, state: &str, ttl_secs: i64) -> Result<Model, RepositoryError> {
        let now = Utc::now();

        let new_state = ActiveModel {
            id: Set(Uuid::new_v4()),
            state: Set(state.to_string()),
            expires_at: Set(now + Duration::seconds(ttl_secs)),
            created_at: Set(now),
        };

        new_state
            .insert(self.db)
            .await
            .map_err(|err| RepositoryError::from_insert(err, "OAuth state"))
    }

    /// Find and consume an unexpired OAuth state, deleting it to prevent reuse
    pub async fn consume(&self, state: &str) -> Result<Option<Model>, RepositoryError> {
        let found = Entity::find()
            .filter(oauth_state::Column::State.eq(state))
            .filter(oauth_state::Column::ExpiresAt.gt(Utc::now()))
            .one(self.db)
            .await?;

        if let Some(ref model) = found {
            Entity::delete_by_id(model.id).exec(self.db).await?;
        }

        Ok(found)
    }

    /// Clean up expired OAuth states
    pub async fn cleanup_expired(&self) -> Result<u64, RepositoryError> {
        let result = Entity::delete_many()
            .filter(oauth_state::Column::ExpiresAt.lt(Utc::now()))
            .exec(self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;

    async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn consume_returns_the_state_exactly_once() {
        let db = setup_test_db().await;
        let repo = OAuthStateRepository::new(&db);

        let created = repo.create("state-token", 600).await.unwrap();
        assert_eq!(created.state, "state-token");

        let consumed = repo.consume("state-token").await.unwrap();
        assert_eq!(consumed.unwrap().id, created.id);

        let replayed = repo.consume("state-token").await.unwrap();
        assert!(replayed.is_none());
    }

    #[tokio::test]
    async fn unknown_state_is_absent() {
        let db = setup_test_db().await;
        let repo = OAuthStateRepository::new(&db);

        assert!(repo.consume("never-issued").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_state_is_absent() {
        let db = setup_test_db().await;
        let repo = OAuthStateRepository::new(&db);

        repo.create("stale-token", -10).await.unwrap();
        assert!(repo.consume("stale-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cleanup_removes_only_expired_states() {
        let db = setup_test_db().await;
        let repo = OAuthStateRepository::new(&db);

        repo.create("stale-token", -10).await.unwrap();
        repo.create("live-token", 600).await.unwrap();

        let removed = repo.cleanup_expired().await.unwrap();
        assert_eq!(removed, 1);

        assert!(repo.consume("live-token").await.unwrap().is_some());
    }
}
