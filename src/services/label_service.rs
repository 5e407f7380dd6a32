use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, Set, SqlErr};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    carriers::{LabelOutcome, courier::CourierAggregator, warehouse::WarehouseCarrier},
    dto::labels::{ExistingLabel, GenerateLabelRequest, GeneratedLabel, LabelResponse},
    entity::{
        listings::Entity as Listings,
        orders::{ActiveModel as OrderActive, Entity as Orders, Model as OrderModel},
        seller_profiles::{Entity as SellerProfiles, Model as SellerModel},
        shipping_labels::{
            ActiveModel as LabelActive, Column as LabelCol, Entity as ShippingLabels,
            Model as LabelModel,
        },
        shipping_options::Entity as ShippingOptions,
        shipping_providers::Entity as ShippingProviders,
    },
    error::{AppError, AppResult},
    models::{Listing, Order, SellerProfile, ShippingAddress, ShippingLabel, ShippingOption},
    reconciliation::record_event,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Generate a shipping label for an order, routing warehouse sellers to the
/// bulk carrier and everyone else through the courier aggregator. Idempotent
/// per order: an existing label short-circuits before any carrier call. If
/// the carrier or a local write fails after the order was loaded, the order
/// row is deleted so no order lingers that can never be fulfilled.
pub async fn generate_label(
    state: &AppState,
    payload: GenerateLabelRequest,
) -> AppResult<ApiResponse<LabelResponse>> {
    let order_id = payload
        .order_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("order_id is required".into()))?;
    let order_id = Uuid::parse_str(order_id)
        .map_err(|_| AppError::BadRequest("order_id is not a valid UUID".into()))?;

    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .map(order_from_entity)
        .ok_or_else(|| AppError::NotFound("Order".into()))?;

    // Fast-path idempotency; the unique index on shipping_labels.order_id is
    // the authoritative guard at insert time.
    if let Some(existing) = find_label(state, order_id).await? {
        return Ok(already_generated(existing));
    }

    let listing = Listings::find_by_id(order.listing_id)
        .one(&state.orm)
        .await?
        .map(listing_from_entity)
        .ok_or_else(|| AppError::NotFound("Listing".into()))?;

    // Best effort: a missing profile must not block the label, downstream
    // payload fields default to empty.
    let seller = SellerProfiles::find_by_id(order.seller_id)
        .one(&state.orm)
        .await?
        .map(seller_from_entity)
        .unwrap_or_else(|| SellerProfile::empty(order.seller_id));

    let address = payload.shipping_address.unwrap_or_default();

    // Routing happens before the compensable section: a missing shipping
    // option is a 404 on the request, not grounds to delete the order.
    let courier_option = if seller.is_warehouse() {
        None
    } else {
        let option_id = payload
            .shipping_option_id
            .ok_or_else(|| AppError::NotFound("Shipping option".into()))?;
        Some(load_shipping_option(state, option_id).await?)
    };

    let outcome = match &courier_option {
        None => generate_warehouse_label(state, &order, &listing, &address).await,
        Some(option) => {
            generate_courier_label(state, &order, &listing, &address, &seller, option).await
        }
    };

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(err) => {
            compensate(state, order_id, &err.to_string()).await;
            return Err(err);
        }
    };

    let label = match persist_label(state, order_id, &outcome).await {
        Ok(PersistResult::Inserted(label)) => label,
        // Lost the insert race to a concurrent request; its label is the
        // truth, so hand that back instead of compensating.
        Ok(PersistResult::AlreadyExists(existing)) => return Ok(already_generated(existing)),
        Err(err) => {
            report_unrecorded_label(state, order_id, &outcome).await;
            compensate(state, order_id, "label insert failed").await;
            return Err(AppError::Persistence(err.to_string()));
        }
    };

    if let Err(err) = set_order_tracking(state, order_id, &label.tracking_number).await {
        if let Err(log_err) = record_event(
            &state.pool,
            Some(order_id),
            "order_update_failed_after_label",
            Some(serde_json::json!({
                "tracking_number": label.tracking_number,
                "error": err.to_string(),
            })),
        )
        .await
        {
            tracing::warn!(error = %log_err, "fulfillment event write failed");
        }
        compensate(state, order_id, "order tracking update failed").await;
        return Err(AppError::Persistence(err.to_string()));
    }

    tracing::info!(
        order_id = %order_id,
        tracking_number = %label.tracking_number,
        label_type = %label.label_type,
        "shipping label generated"
    );

    Ok(ApiResponse::success(
        "Label generated",
        LabelResponse::Generated(GeneratedLabel {
            order_id,
            tracking_number: label.tracking_number,
            label_type: label.label_type,
            data: label.label_data,
        }),
        Some(Meta::empty()),
    ))
}

/// Read-only companion: the persisted label for an order, if any.
pub async fn get_label(state: &AppState, order_id: Uuid) -> AppResult<ApiResponse<ShippingLabel>> {
    let label = find_label(state, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Shipping label".into()))?;
    Ok(ApiResponse::success("OK", label, Some(Meta::empty())))
}

async fn generate_warehouse_label(
    state: &AppState,
    order: &Order,
    listing: &Listing,
    address: &ShippingAddress,
) -> AppResult<LabelOutcome> {
    let carrier = WarehouseCarrier::new(&state.http, &state.carriers);
    let raw = carrier.import_order(order, listing, address).await?;
    let tracking_number = warehouse_tracking(&raw).ok_or_else(|| {
        AppError::LabelGeneration("warehouse import returned no tracking identifier".into())
    })?;
    Ok(LabelOutcome::Warehouse {
        tracking_number,
        raw,
    })
}

async fn generate_courier_label(
    state: &AppState,
    order: &Order,
    listing: &Listing,
    address: &ShippingAddress,
    seller: &SellerProfile,
    option: &ShippingOption,
) -> AppResult<LabelOutcome> {
    let aggregator = CourierAggregator::new(&state.http, &state.carriers);
    let raw = aggregator
        .create_label(order, listing, address, seller, option)
        .await?;
    // A 200 with no tracking codes is still a failed label.
    let tracking_number = courier_tracking(&raw).ok_or_else(|| {
        AppError::LabelGeneration("aggregator returned no tracking codes".into())
    })?;
    Ok(LabelOutcome::PeerToPeer {
        tracking_number,
        raw,
    })
}

/// Compensating cleanup: the label could not be produced or recorded, so the
/// order must not linger implying fulfillment is possible. Best effort; the
/// caller's original error is what propagates.
async fn compensate(state: &AppState, order_id: Uuid, reason: &str) {
    if let Err(err) = Orders::delete_by_id(order_id).exec(&state.orm).await {
        tracing::error!(
            order_id = %order_id,
            error = %err,
            "compensating order deletion failed"
        );
    } else {
        tracing::warn!(order_id = %order_id, reason = %reason, "order deleted after label failure");
    }

    if let Err(err) = record_event(
        &state.pool,
        Some(order_id),
        "order_deleted_after_label_failure",
        Some(serde_json::json!({ "reason": reason })),
    )
    .await
    {
        tracing::warn!(error = %err, "fulfillment event write failed");
    }
}

/// A carrier-side label exists but could not be recorded locally. Log loudly
/// and leave a durable trail for manual reconciliation; retrying would print
/// a duplicate physical label.
async fn report_unrecorded_label(state: &AppState, order_id: Uuid, outcome: &LabelOutcome) {
    tracing::error!(
        order_id = %order_id,
        tracking_number = %outcome.tracking_number(),
        label_type = %outcome.label_type(),
        "carrier issued a label that could not be persisted, manual reconciliation required"
    );
    if let Err(err) = record_event(
        &state.pool,
        Some(order_id),
        "label_issued_but_unrecorded",
        Some(serde_json::json!({
            "tracking_number": outcome.tracking_number(),
            "label_type": outcome.label_type(),
            "carrier_response": outcome.raw(),
        })),
    )
    .await
    {
        tracing::error!(error = %err, "fulfillment event write failed for unrecorded label");
    }
}

pub enum PersistResult {
    Inserted(ShippingLabel),
    /// A concurrent request won the insert race; this is its row.
    AlreadyExists(ShippingLabel),
}

pub async fn persist_label(
    state: &AppState,
    order_id: Uuid,
    outcome: &LabelOutcome,
) -> Result<PersistResult, sea_orm::DbErr> {
    let inserted = LabelActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        tracking_number: Set(outcome.tracking_number().to_string()),
        label_type: Set(outcome.label_type().to_string()),
        label_data: Set(outcome.raw().clone()),
        generated_at: NotSet,
    }
    .insert(&state.orm)
    .await;

    match inserted {
        Ok(label) => Ok(PersistResult::Inserted(label_from_entity(label))),
        Err(err) => {
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                if let Ok(Some(existing)) = find_label(state, order_id).await {
                    return Ok(PersistResult::AlreadyExists(existing));
                }
            }
            Err(err)
        }
    }
}

async fn set_order_tracking(
    state: &AppState,
    order_id: Uuid,
    tracking_number: &str,
) -> Result<(), sea_orm::DbErr> {
    let mut active = OrderActive {
        id: Set(order_id),
        ..Default::default()
    };
    active.tracking_number = Set(Some(tracking_number.to_string()));
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;
    Ok(())
}

async fn load_shipping_option(state: &AppState, option_id: Uuid) -> AppResult<ShippingOption> {
    let option = ShippingOptions::find_by_id(option_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Shipping option".into()))?;

    let provider = option
        .find_related(ShippingProviders)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Shipping option".into()))?;

    Ok(ShippingOption {
        id: option.id,
        provider: provider.name,
    })
}

async fn find_label(state: &AppState, order_id: Uuid) -> AppResult<Option<ShippingLabel>> {
    Ok(ShippingLabels::find()
        .filter(LabelCol::OrderId.eq(order_id))
        .one(&state.orm)
        .await?
        .map(label_from_entity))
}

fn already_generated(label: ShippingLabel) -> ApiResponse<LabelResponse> {
    ApiResponse::success(
        "Label already generated",
        LabelResponse::AlreadyGenerated(ExistingLabel {
            tracking_number: label.tracking_number,
            label_id: label.id,
        }),
        Some(Meta::empty()),
    )
}

/// Bulk carrier responses name the identifier inconsistently across API
/// versions; accept either spelling.
fn warehouse_tracking(raw: &Value) -> Option<String> {
    raw.get("tracking_code")
        .or_else(|| raw.get("tracking_number"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn courier_tracking(raw: &Value) -> Option<String> {
    raw.get("tracking_codes")
        .and_then(Value::as_array)
        .and_then(|codes| codes.first())
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        listing_id: model.listing_id,
        buyer_id: model.buyer_id,
        seller_id: model.seller_id,
        order_amount: model.order_amount,
        quantity: model.quantity,
        status: model.status,
        delivery_status: model.delivery_status,
        tracking_number: model.tracking_number,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn listing_from_entity(model: crate::entity::listings::Model) -> Listing {
    Listing {
        id: model.id,
        product_name: model.product_name,
        thumbnail: model.thumbnail,
        weight: model.weight,
        sku: model.sku,
        stream_id: model.stream_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn seller_from_entity(model: SellerModel) -> SellerProfile {
    SellerProfile {
        id: model.id,
        shop_type: model.shop_type,
        shop_name: model.shop_name,
        business_name: model.business_name,
        return_address_line1: model.return_address_line1,
        return_address_line2: model.return_address_line2,
        return_city: model.return_city,
        return_state: model.return_state,
        return_postcode: model.return_postcode,
        return_country: model.return_country,
        contact_email: model.contact_email,
        contact_phone: model.contact_phone,
    }
}

fn label_from_entity(model: LabelModel) -> ShippingLabel {
    ShippingLabel {
        id: model.id,
        order_id: model.order_id,
        tracking_number: model.tracking_number,
        label_type: model.label_type,
        label_data: model.label_data,
        generated_at: model.generated_at.with_timezone(&Utc),
    }
}
