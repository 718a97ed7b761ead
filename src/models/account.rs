use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    /// PHC-formatted argon2 hash, never the plaintext
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: Option<String>,
    pub hobbies: Option<String>,
    pub country: Option<String>,
    pub about: Option<String>,
    /// Bumped on logout; tokens minted under an older value stop working
    pub session_epoch: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::to_read::Entity")]
    ToRead,
    #[sea_orm(has_many = "super::wishlist::Entity")]
    Wishlist,
    #[sea_orm(has_many = "super::read_book::Entity")]
    ReadBooks,
}

impl Related<super::to_read::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ToRead.def()
    }
}

impl Related<super::wishlist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wishlist.def()
    }
}

impl Related<super::read_book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReadBooks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
