//! # Project Repository
//!
//! This module contains the repository implementation for Project entities.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::RepositoryError;
use crate::models::project::{self, ActiveModel, Entity, Model};

/// Repository for Project database operations
pub struct ProjectRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ProjectRepository<'a> {
    /// Create a new ProjectRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a new project for a user
    pub async fn create(
        &self,
        public_id: &str,
        user_id: Uuid,
        notion_database_id: &str,
        notion_webhook_secret: &str,
    ) -> Result<Model, RepositoryError> {
        let now = Utc::now();

        let project = ActiveModel {
            id: Set(Uuid::new_v4()),
            public_id: Set(public_id.to_string()),
            user_id: Set(user_id),
            notion_database_id: Set(notion_database_id.to_string()),
            notion_webhook_secret: Set(notion_webhook_secret.to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        project
            .insert(self.db)
            .await
            .map_err(|err| RepositoryError::from_insert(err, "Project"))
    }

    /// List all projects owned by a user, newest first
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Model>, RepositoryError> {
        let projects = Entity::find()
            .filter(project::Column::UserId.eq(user_id))
            .order_by_desc(project::Column::CreatedAt)
            .all(self.db)
            .await?;

        Ok(projects)
    }
}
