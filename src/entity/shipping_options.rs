use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shipping_options")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub provider_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shipping_providers::Entity",
        from = "Column::ProviderId",
        to = "super::shipping_providers::Column::Id"
    )]
    ShippingProviders,
}

impl Related<super::shipping_providers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShippingProviders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
