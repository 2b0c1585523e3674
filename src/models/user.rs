//! User entity model
//!
//! This module contains the SeaORM entity model for the users table. A user
//! carries an internal UUID primary key for relations and a prefixed public
//! id for API payloads, plus the Notion account-link columns.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// User entity representing an account that can connect a Notion workspace
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Prefixed public identifier exposed in API payloads (`user_<uuid>`)
    pub public_id: String,

    /// Email address (unique)
    pub email: String,

    /// Display name
    pub name: String,

    /// Sealed Notion access token ciphertext; never exposed in responses
    pub notion_access_token: Option<String>,

    /// Workspace the Notion token is scoped to
    pub notion_workspace_id: Option<String>,

    /// Bot id of the Notion integration behind the token
    pub notion_bot_id: Option<String>,

    /// Expiry of the Notion token, when the provider reports one
    pub notion_token_expiry: Option<DateTimeWithTimeZone>,

    /// Timestamp when the user was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the user was last updated
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Whether this user has a linked Notion workspace with an unexpired token.
    pub fn has_notion_integration(&self, now: DateTimeWithTimeZone) -> bool {
        match &self.notion_access_token {
            None => false,
            Some(token) if token.is_empty() => false,
            Some(_) => self.notion_token_expiry.is_none_or(|expiry| now <= expiry),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::project::Entity")]
    Projects,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
