use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::ShippingAddress;

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateLabelRequest {
    /// Required; rejected with 400 when absent, empty or not a UUID.
    pub order_id: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
    /// Required for non-warehouse sellers only.
    pub shipping_option_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum LabelResponse {
    Generated(GeneratedLabel),
    AlreadyGenerated(ExistingLabel),
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GeneratedLabel {
    pub order_id: Uuid,
    pub tracking_number: String,
    pub label_type: String,
    /// Raw carrier response, kept opaque for audit.
    pub data: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExistingLabel {
    pub tracking_number: String,
    pub label_id: Uuid,
}
