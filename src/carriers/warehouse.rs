use serde::Serialize;
use serde_json::Value;

use crate::{
    carriers::carrier_reference,
    config::CarrierConfig,
    dimensions::{Dimensions, dimensions_for_weight, effective_weight},
    error::{AppError, AppResult},
    models::{Listing, Order, ShippingAddress},
};

const CARRIER_NAME: &str = "warehouse";
const CHANNEL_NAME: &str = "VintStreet";
const CHANNEL_TYPE: &str = "API";

/// Adapter for the bulk fulfillment API used by warehouse ("master") sellers.
/// Two outbound calls: credential login for a bearer token, then a
/// single-element order-import batch. No local persistence.
pub struct WarehouseCarrier<'a> {
    http: &'a reqwest::Client,
    config: &'a CarrierConfig,
}

#[derive(Debug, Serialize)]
pub struct ImportBatch {
    pub orders: Vec<ImportOrder>,
}

#[derive(Debug, Serialize)]
pub struct ImportOrder {
    pub order_id: String,
    pub primary_reference_id: String,
    pub customer: Customer,
    pub shipping_address: Address,
    pub invoice_address: Address,
    pub payment: Payment,
    pub order_lines: Vec<OrderLine>,
    pub parcel: Parcel,
    pub channel: Channel,
}

#[derive(Debug, Serialize)]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Serialize)]
pub struct Address {
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Serialize)]
pub struct Payment {
    pub order_total: f64,
    pub subtotal: f64,
    pub tax: f64,
    pub discount: f64,
}

#[derive(Debug, Serialize)]
pub struct OrderLine {
    pub sku: String,
    pub description: String,
    pub quantity: i32,
    pub unit_price: f64,
}

#[derive(Debug, Serialize)]
pub struct Parcel {
    pub weight: f64,
    #[serde(flatten)]
    pub dimensions: Dimensions,
}

#[derive(Debug, Serialize)]
pub struct Channel {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub channel_type: &'static str,
}

impl<'a> WarehouseCarrier<'a> {
    pub fn new(http: &'a reqwest::Client, config: &'a CarrierConfig) -> Self {
        Self { http, config }
    }

    /// Import the order into the bulk carrier and return its raw response.
    /// The caller extracts the tracking identifier.
    pub async fn import_order(
        &self,
        order: &Order,
        listing: &Listing,
        address: &ShippingAddress,
    ) -> AppResult<Value> {
        let token = self.login().await?;
        let batch = build_import_batch(order, listing, address);

        let response = self
            .http
            .post(&self.config.warehouse_import_url)
            .bearer_auth(token)
            .json(&batch)
            .send()
            .await
            .map_err(|e| AppError::from_outbound(CARRIER_NAME, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::from_outbound(CARRIER_NAME, e))?;
        if !status.is_success() {
            return Err(AppError::CarrierImport {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("warehouse response not JSON: {e}")))
    }

    async fn login(&self) -> AppResult<String> {
        let response = self
            .http
            .post(&self.config.warehouse_login_url)
            .json(&serde_json::json!({
                "email": self.config.warehouse_email,
                "password": self.config.warehouse_password,
            }))
            .send()
            .await
            .map_err(|e| AppError::from_outbound(CARRIER_NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Authentication(format!(
                "login returned status {status}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::from_outbound(CARRIER_NAME, e))?;

        body.get("access_token")
            .or_else(|| body.get("token"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::Authentication("login response carried no token".into()))
    }
}

pub fn build_import_batch(
    order: &Order,
    listing: &Listing,
    address: &ShippingAddress,
) -> ImportBatch {
    let reference = carrier_reference(&order.id.to_string(), "");
    let quantity = order.quantity.max(1);
    let unit_price = order.order_amount / f64::from(quantity);
    let weight = effective_weight(listing.weight);

    let shipping_address = Address {
        address_line1: address.address_line1.clone().unwrap_or_default(),
        address_line2: address.address_line2.clone().unwrap_or_default(),
        city: address.city.clone().unwrap_or_default(),
        state: address.state.clone().unwrap_or_default(),
        postal_code: address.postal_code.clone().unwrap_or_default(),
        country: address.country_or_default().to_string(),
    };
    // The import API wants the invoice address even for marketplace orders;
    // it is always the delivery address here.
    let invoice_address = Address {
        address_line1: shipping_address.address_line1.clone(),
        address_line2: shipping_address.address_line2.clone(),
        city: shipping_address.city.clone(),
        state: shipping_address.state.clone(),
        postal_code: shipping_address.postal_code.clone(),
        country: shipping_address.country.clone(),
    };

    ImportBatch {
        orders: vec![ImportOrder {
            order_id: reference.clone(),
            primary_reference_id: reference,
            customer: Customer {
                first_name: address.first_name.clone().unwrap_or_default(),
                last_name: address.last_name.clone().unwrap_or_default(),
                email: address.email.clone().unwrap_or_default(),
                phone: address.phone.clone().unwrap_or_default(),
            },
            shipping_address,
            invoice_address,
            payment: Payment {
                order_total: order.order_amount,
                subtotal: order.order_amount,
                tax: 0.0,
                discount: 0.0,
            },
            order_lines: vec![OrderLine {
                sku: listing.sku.clone().unwrap_or_default(),
                description: listing.product_name.clone(),
                quantity: order.quantity,
                unit_price,
            }],
            parcel: Parcel {
                weight,
                dimensions: dimensions_for_weight(weight),
            },
            channel: Channel {
                name: CHANNEL_NAME,
                channel_type: CHANNEL_TYPE,
            },
        }],
    }
}
