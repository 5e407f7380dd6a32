use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "seller_profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub shop_type: Option<String>,
    pub shop_name: Option<String>,
    pub business_name: Option<String>,
    pub return_address_line1: Option<String>,
    pub return_address_line2: Option<String>,
    pub return_city: Option<String>,
    pub return_state: Option<String>,
    pub return_postcode: Option<String>,
    pub return_country: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
