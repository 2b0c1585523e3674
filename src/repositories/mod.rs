//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for database entities, providing a clean API for data access.

use thiserror::Error;

pub mod oauth_state;
pub mod project;
pub mod user;

pub use oauth_state::OAuthStateRepository;
pub use project::ProjectRepository;
pub use user::{NotionLink, UserRepository};

/// Errors surfaced by the repository layer
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("{entity} already exists")]
    Conflict { entity: &'static str },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl RepositoryError {
    /// Map an insert failure, turning unique constraint violations into a
    /// conflict for the given entity.
    pub(crate) fn from_insert(err: sea_orm::DbErr, entity: &'static str) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => Self::Conflict { entity },
            _ => Self::Database(err),
        }
    }
}
