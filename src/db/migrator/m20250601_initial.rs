use crate::entities::prelude::*;
use crate::entities::search_history;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(SearchHistory)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(WeatherCache)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Repeat searches bump the timestamp of the existing row, so one
        // row per (user, city, country) is an invariant, not just an index.
        manager
            .create_index(
                Index::create()
                    .name("idx_search_history_user_place")
                    .table(SearchHistory)
                    .col(search_history::Column::UserId)
                    .col(search_history::Column::City)
                    .col(search_history::Column::Country)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_search_history_timestamp")
                    .table(SearchHistory)
                    .col(search_history::Column::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WeatherCache).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SearchHistory).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
