use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db_backend = manager.get_database_backend();

        if db_backend == sea_orm::DatabaseBackend::Sqlite {
            manager
                .create_table(
                    Table::create()
                        .table(OauthStates::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OauthStates::Id)
                                .text()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(OauthStates::State)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(OauthStates::ExpiresAt).timestamp().not_null())
                        .col(
                            ColumnDef::new(OauthStates::CreatedAt)
                                .timestamp()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;
        } else {
            manager
                .create_table(
                    Table::create()
                        .table(OauthStates::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OauthStates::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(OauthStates::State)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(OauthStates::ExpiresAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OauthStates::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null()
                                .default(Expr::current_timestamp()),
                        )
                        .to_owned(),
                )
                .await?;

            // Index on expires_at for cleanup sweeps
            manager
                .create_index(
                    Index::create()
                        .name("idx_oauth_states_expires_at")
                        .table(OauthStates::Table)
                        .col(OauthStates::ExpiresAt)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OauthStates::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OauthStates {
    Table,
    Id,
    State,
    ExpiresAt,
    CreatedAt,
}
