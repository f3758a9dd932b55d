use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "weather_cache")]
pub struct Model {
    /// One cache row per search record
    #[sea_orm(primary_key, auto_increment = false)]
    pub search_id: i32,

    /// Serialized `{ current_weather, forecast }` payload
    #[sea_orm(column_type = "Text")]
    pub data: String,

    pub last_fetched: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
