use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "photos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub event_id: String,

    pub url: String,

    pub thumbnail_url: Option<String>,

    pub caption: Option<String>,

    /// Visitor uploads start unapproved and stay hidden from the public
    /// gallery until the host flips this.
    pub approved: bool,

    /// Host account the bytes are charged against.
    pub uploaded_by: Option<String>,

    /// Opaque token identifying an anonymous visitor uploader.
    pub guest_token: Option<String>,

    /// Byte count as recorded by the upload pipeline; text for legacy rows.
    pub file_size: Option<String>,

    pub uploaded_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::events::Entity",
        from = "Column::EventId",
        to = "super::events::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Events,
}

impl Related<super::events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
