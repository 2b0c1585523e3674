//! # User Repository
//!
//! This module contains the repository implementation for User entities.
//! Sealing of the Notion access token happens in the caller; this layer only
//! ever sees ciphertext.

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use uuid::Uuid;

use super::RepositoryError;
use crate::models::user::{self, ActiveModel, Entity, Model};

/// Fields written when a Notion workspace is linked to a user
#[derive(Debug, Clone)]
pub struct NotionLink {
    /// Display name reported by the provider; the existing name is kept when `None`
    pub name: Option<String>,
    /// Sealed access token ciphertext
    pub sealed_access_token: String,
    /// Workspace the token is scoped to
    pub workspace_id: String,
    /// Bot id of the integration behind the token
    pub bot_id: String,
    /// Token expiry, when the provider reports one
    pub token_expiry: Option<DateTimeWithTimeZone>,
}

/// Repository for User database operations
pub struct UserRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a new user
    pub async fn create(
        &self,
        public_id: &str,
        email: &str,
        name: &str,
    ) -> Result<Model, RepositoryError> {
        let now = Utc::now();

        let user = ActiveModel {
            id: Set(Uuid::new_v4()),
            public_id: Set(public_id.to_string()),
            email: Set(email.to_string()),
            name: Set(name.to_string()),
            notion_access_token: Set(None),
            notion_workspace_id: Set(None),
            notion_bot_id: Set(None),
            notion_token_expiry: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        user.insert(self.db)
            .await
            .map_err(|err| RepositoryError::from_insert(err, "User"))
    }

    /// Find a user by public id
    pub async fn find_by_public_id(
        &self,
        public_id: &str,
    ) -> Result<Option<Model>, RepositoryError> {
        let user = Entity::find()
            .filter(user::Column::PublicId.eq(public_id))
            .one(self.db)
            .await?;

        Ok(user)
    }

    /// Find a user by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Model>, RepositoryError> {
        let user = Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db)
            .await?;

        Ok(user)
    }

    /// Store the sealed Notion token and workspace details for a user
    pub async fn link_notion_workspace(
        &self,
        user_id: Uuid,
        link: NotionLink,
    ) -> Result<Model, RepositoryError> {
        let user = Entity::find_by_id(user_id)
            .one(self.db)
            .await?
            .ok_or(RepositoryError::NotFound { entity: "User" })?;

        let mut active = user.into_active_model();
        if let Some(name) = link.name {
            active.name = Set(name);
        }
        active.notion_access_token = Set(Some(link.sealed_access_token));
        active.notion_workspace_id = Set(Some(link.workspace_id));
        active.notion_bot_id = Set(Some(link.bot_id));
        active.notion_token_expiry = Set(link.token_expiry);
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(self.db).await?;
        Ok(updated)
    }
}
