//! Project entity model
//!
//! This module contains the SeaORM entity model for the projects table,
//! which links a user to a Notion database and the webhook secret used to
//! verify deliveries for that database.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Project entity tying a user to one Notion database
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    /// Unique identifier for the project (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Prefixed public identifier exposed in API payloads (`project_<uuid>`)
    pub public_id: String,

    /// Owning user (internal UUID)
    pub user_id: Uuid,

    /// Notion database this project tracks
    pub notion_database_id: String,

    /// Webhook secret for this database; write-only, never exposed in responses
    pub notion_webhook_secret: String,

    /// Timestamp when the project was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the project was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
