//! # OAuth State Model
//!
//! This module contains the OAuth state entity. A row is written when the
//! authorization URL is issued and consumed exactly once by the callback;
//! rows past their expiry are treated as absent.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;

/// OAuth state token persisted for CSRF protection
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "oauth_states")]
pub struct Model {
    /// Primary key UUID
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// State token handed to the provider in the authorize redirect
    pub state: String,

    /// Expiration timestamp
    pub expires_at: chrono::DateTime<chrono::Utc>,

    /// When the state was created
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
