use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::{
    carriers::carrier_reference,
    config::CarrierConfig,
    dimensions::{Dimensions, dimensions_for_weight, effective_weight},
    error::{AppError, AppResult},
    models::{Listing, Order, SellerProfile, ShippingAddress, ShippingOption},
};

const CARRIER_NAME: &str = "courier-aggregator";
const REQUEST_ID_PREFIX: &str = "VS";
const ORIGIN_COUNTRY: &str = "GB";
// Placeholder commodity code until per-category codes land in listings.
const HS_CODE: &str = "640399";

/// Service code used when a seller's chosen courier has no mapping.
pub const DEFAULT_SERVICE_CODE: &str = "DPD-12DROPQR";

/// Adapter for the peer-to-peer courier aggregator used by individual
/// sellers. One label-creation call, authenticated with api-user/api-token
/// headers. No local persistence.
pub struct CourierAggregator<'a> {
    http: &'a reqwest::Client,
    config: &'a CarrierConfig,
}

#[derive(Debug, Serialize)]
pub struct LabelRequest {
    pub request_id: String,
    pub service_code: String,
    pub collection_date: DateTime<Utc>,
    pub ship_from: Party,
    pub ship_to: Party,
    pub parcels: Vec<ParcelRequest>,
}

#[derive(Debug, Serialize)]
pub struct Party {
    pub name: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct ParcelRequest {
    pub weight: f64,
    #[serde(flatten)]
    pub dimensions: Dimensions,
    pub items: Vec<ParcelItem>,
}

#[derive(Debug, Serialize)]
pub struct ParcelItem {
    pub description: String,
    pub origin_country: &'static str,
    pub hs_code: &'static str,
    pub declared_value: f64,
    pub weight: f64,
    pub quantity: i32,
}

impl<'a> CourierAggregator<'a> {
    pub fn new(http: &'a reqwest::Client, config: &'a CarrierConfig) -> Self {
        Self { http, config }
    }

    /// Request a label from the aggregator and return its raw response. The
    /// caller extracts `tracking_codes` and treats an empty list as failure.
    pub async fn create_label(
        &self,
        order: &Order,
        listing: &Listing,
        address: &ShippingAddress,
        seller: &SellerProfile,
        option: &ShippingOption,
    ) -> AppResult<Value> {
        let service_code = resolve_service_code(&self.config.service_codes, &option.provider);
        let request = build_label_request(order, listing, address, seller, service_code);

        let response = self
            .http
            .post(&self.config.courier_label_url)
            .header("api-user", &self.config.courier_api_user)
            .header("api-token", &self.config.courier_api_token)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::from_outbound(CARRIER_NAME, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::from_outbound(CARRIER_NAME, e))?;
        if !status.is_success() {
            return Err(AppError::CarrierLabel {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("aggregator response not JSON: {e}")))
    }
}

/// Courier display name -> aggregator service code, from the configured map.
/// Unknown couriers fall back to the DPD drop-off service rather than
/// blocking the order.
pub fn resolve_service_code(
    codes: &std::collections::HashMap<String, String>,
    provider: &str,
) -> String {
    match codes.get(provider) {
        Some(code) => code.clone(),
        None => {
            tracing::warn!(
                provider = %provider,
                fallback = DEFAULT_SERVICE_CODE,
                "no service code configured for courier, using fallback"
            );
            DEFAULT_SERVICE_CODE.to_string()
        }
    }
}

pub fn build_label_request(
    order: &Order,
    listing: &Listing,
    address: &ShippingAddress,
    seller: &SellerProfile,
    service_code: String,
) -> LabelRequest {
    let weight = effective_weight(listing.weight);
    let dimensions = dimensions_for_weight(weight);

    let ship_from_name = seller
        .business_name
        .clone()
        .or_else(|| seller.shop_name.clone())
        .unwrap_or_default();

    LabelRequest {
        request_id: carrier_reference(&order.id.to_string(), REQUEST_ID_PREFIX),
        service_code,
        collection_date: Utc::now() + Duration::hours(24),
        ship_from: Party {
            name: ship_from_name,
            address_line1: seller.return_address_line1.clone().unwrap_or_default(),
            address_line2: seller.return_address_line2.clone().unwrap_or_default(),
            city: seller.return_city.clone().unwrap_or_default(),
            state: seller.return_state.clone().unwrap_or_default(),
            postal_code: seller.return_postcode.clone().unwrap_or_default(),
            country: seller
                .return_country
                .clone()
                .unwrap_or_else(|| ORIGIN_COUNTRY.to_string()),
            email: seller.contact_email.clone().unwrap_or_default(),
            phone: seller.contact_phone.clone().unwrap_or_default(),
        },
        ship_to: Party {
            name: format!(
                "{} {}",
                address.first_name.clone().unwrap_or_default(),
                address.last_name.clone().unwrap_or_default()
            )
            .trim()
            .to_string(),
            address_line1: address.address_line1.clone().unwrap_or_default(),
            address_line2: address.address_line2.clone().unwrap_or_default(),
            city: address.city.clone().unwrap_or_default(),
            state: address.state.clone().unwrap_or_default(),
            postal_code: address.postal_code.clone().unwrap_or_default(),
            country: address.country_or_default().to_string(),
            email: address.email.clone().unwrap_or_default(),
            phone: address.phone.clone().unwrap_or_default(),
        },
        parcels: vec![ParcelRequest {
            weight,
            dimensions,
            items: vec![ParcelItem {
                description: listing.product_name.clone(),
                origin_country: ORIGIN_COUNTRY,
                hs_code: HS_CODE,
                declared_value: order.order_amount,
                weight,
                quantity: order.quantity,
            }],
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CarrierConfig;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_order() -> Order {
        Order {
            id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            order_amount: 25.0,
            quantity: 1,
            status: "paid".into(),
            delivery_status: "pending".into(),
            tracking_number: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_listing() -> Listing {
        Listing {
            id: Uuid::new_v4(),
            product_name: "Retro trainers".into(),
            thumbnail: None,
            weight: Some(1.5),
            sku: Some("RT-99".into()),
            stream_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn known_couriers_map_to_their_service_codes() {
        let codes = CarrierConfig::default_service_codes();
        assert_eq!(resolve_service_code(&codes, "DPD"), "DPD-12DROPQR");
        assert_eq!(resolve_service_code(&codes, "Yodel"), "YOD-C2CPS");
        assert_eq!(resolve_service_code(&codes, "Evri"), "EVR-C2CPS");
    }

    #[test]
    fn unknown_courier_falls_back_to_dpd() {
        let codes = CarrierConfig::default_service_codes();
        assert_eq!(resolve_service_code(&codes, "Parcelforce"), DEFAULT_SERVICE_CODE);
    }

    #[test]
    fn request_id_is_prefixed_and_bounded() {
        let request = build_label_request(
            &sample_order(),
            &sample_listing(),
            &ShippingAddress::default(),
            &SellerProfile::empty(Uuid::new_v4()),
            DEFAULT_SERVICE_CODE.into(),
        );
        assert!(request.request_id.starts_with(REQUEST_ID_PREFIX));
        assert!(request.request_id.len() <= 30);
    }

    #[test]
    fn parcel_uses_weight_band_dimensions() {
        let request = build_label_request(
            &sample_order(),
            &sample_listing(),
            &ShippingAddress::default(),
            &SellerProfile::empty(Uuid::new_v4()),
            DEFAULT_SERVICE_CODE.into(),
        );
        let parcel = &request.parcels[0];
        assert_eq!(parcel.weight, 1.5);
        assert_eq!(parcel.dimensions.length, 47);
        assert_eq!(parcel.dimensions.width, 34);
        assert_eq!(parcel.dimensions.height, 15);
    }

    #[test]
    fn item_declares_order_amount_and_fixed_origin() {
        let request = build_label_request(
            &sample_order(),
            &sample_listing(),
            &ShippingAddress::default(),
            &SellerProfile::empty(Uuid::new_v4()),
            DEFAULT_SERVICE_CODE.into(),
        );
        let item = &request.parcels[0].items[0];
        assert_eq!(item.declared_value, 25.0);
        assert_eq!(item.origin_country, "GB");
        assert_eq!(item.quantity, 1);
    }

    #[test]
    fn collection_date_is_next_day() {
        let before = Utc::now();
        let request = build_label_request(
            &sample_order(),
            &sample_listing(),
            &ShippingAddress::default(),
            &SellerProfile::empty(Uuid::new_v4()),
            DEFAULT_SERVICE_CODE.into(),
        );
        let lower = before + Duration::hours(23);
        let upper = Utc::now() + Duration::hours(25);
        assert!(request.collection_date > lower && request.collection_date < upper);
    }
}
