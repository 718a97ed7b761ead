use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publication_date: Option<String>,
    pub publisher: Option<String>,
    pub image_url: Option<String>,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::read_book::Entity")]
    ReadBooks,
    #[sea_orm(has_many = "super::imported_rating::Entity")]
    ImportedRatings,
}

impl Related<super::read_book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReadBooks.def()
    }
}

impl Related<super::imported_rating::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ImportedRatings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
