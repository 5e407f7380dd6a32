use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shipping_providers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::shipping_options::Entity")]
    ShippingOptions,
}

impl Related<super::shipping_options::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShippingOptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
