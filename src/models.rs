use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub order_amount: f64,
    pub quantity: i32,
    pub status: String,
    pub delivery_status: String,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Listing {
    pub id: Uuid,
    pub product_name: String,
    pub thumbnail: Option<String>,
    /// Kilograms; missing or non-positive weights are defaulted downstream.
    pub weight: Option<f64>,
    pub sku: Option<String>,
    pub stream_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SellerProfile {
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

impl SellerProfile {
    /// Warehouse sellers ship house inventory through the bulk carrier.
    pub fn is_warehouse(&self) -> bool {
        self.shop_type.as_deref() == Some("master")
    }

    /// Fallback profile when the seller row is missing; downstream payload
    /// fields default to empty rather than aborting the label.
    pub fn empty(id: Uuid) -> Self {
        Self {
            id,
            shop_type: None,
            shop_name: None,
            business_name: None,
            return_address_line1: None,
            return_address_line2: None,
            return_city: None,
            return_state: None,
            return_postcode: None,
            return_country: None,
            contact_email: None,
            contact_phone: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShippingOption {
    pub id: Uuid,
    /// Courier display name from the linked provider, e.g. "DPD".
    pub provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShippingLabel {
    pub id: Uuid,
    pub order_id: Uuid,
    pub tracking_number: String,
    pub label_type: String,
    pub label_data: serde_json::Value,
    pub generated_at: DateTime<Utc>,
}

/// Destination for delivery; supplied per request, never persisted here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ShippingAddress {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl ShippingAddress {
    pub fn country_or_default(&self) -> &str {
        self.country.as_deref().filter(|c| !c.is_empty()).unwrap_or("GB")
    }
}
