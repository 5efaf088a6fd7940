//! Poll entity for restaurant votes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "poll")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub title: String,

    /// "active" or "closed"
    #[sea_orm(indexed)]
    pub status: String,

    pub end_date: DateTimeWithTimeZone,

    /// Options with their votes (JSON array, read and written as one unit)
    #[sea_orm(column_type = "JsonBinary")]
    pub options: JsonValue,

    /// User who created the poll
    #[sea_orm(indexed)]
    pub created_by: String,

    /// Sum of votes over all options (denormalized)
    pub total_votes: i32,

    /// Restaurant of the leading option (denormalized)
    #[sea_orm(nullable)]
    pub most_voted: Option<String>,

    /// Optimistic concurrency counter
    pub version: i32,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Creator,

    #[sea_orm(
        belongs_to = "super::restaurant::Entity",
        from = "Column::MostVoted",
        to = "super::restaurant::Column::Id",
        on_delete = "SetNull"
    )]
    MostVoted,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::restaurant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MostVoted.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
