//! Database migrations for the Notion Bridge API.
//!
//! All schema changes go through SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_06_01_000001_create_users;
mod m2025_06_01_000002_create_projects;
mod m2025_06_01_000003_create_oauth_states;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_06_01_000001_create_users::Migration),
            Box::new(m2025_06_01_000002_create_projects::Migration),
            Box::new(m2025_06_01_000003_create_oauth_states::Migration),
        ]
    }
}
