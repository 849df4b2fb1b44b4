use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Subject id asserted by the identity provider. Immutable once assigned.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub email: String,

    pub name: Option<String>,

    pub is_admin: bool,

    pub is_suspended: bool,

    pub avatar_url: Option<String>,

    pub avatar_thumbnail_url: Option<String>,

    /// Byte count as recorded by the upload pipeline. Kept as text because
    /// historical rows carry inconsistent encodings.
    pub avatar_size: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::events::Entity")]
    Events,
}

impl Related<super::events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
