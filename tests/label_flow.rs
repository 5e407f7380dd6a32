use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, Statement};
use serde_json::{Value, json};
use uuid::Uuid;

use shipping_label_api::{
    carriers::LabelOutcome,
    config::CarrierConfig,
    db::{create_orm_conn, create_pool},
    dto::labels::{GenerateLabelRequest, LabelResponse},
    entity::{
        listings::ActiveModel as ListingActive,
        orders::{ActiveModel as OrderActive, Entity as Orders},
        seller_profiles::ActiveModel as SellerActive,
        shipping_labels::ActiveModel as LabelActive,
        shipping_options::ActiveModel as OptionActive,
        shipping_providers::ActiveModel as ProviderActive,
    },
    error::AppError,
    models::ShippingAddress,
    services::label_service::{self, PersistResult},
    state::AppState,
};

// Fake carrier endpoints: counts every call and captures aggregator payloads
// so the flow below can assert routing and idempotency without real carriers.
#[derive(Default)]
struct CarrierCalls {
    login: AtomicUsize,
    import: AtomicUsize,
    label: AtomicUsize,
    label_requests: Mutex<Vec<Value>>,
    label_response: Mutex<Option<Value>>,
}

impl CarrierCalls {
    fn set_label_response(&self, response: Value) {
        *self.label_response.lock().unwrap() = Some(response);
    }
}

async fn warehouse_login(State(calls): State<Arc<CarrierCalls>>) -> Json<Value> {
    calls.login.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "access_token": "test-token" }))
}

async fn warehouse_import(
    State(calls): State<Arc<CarrierCalls>>,
    Json(_body): Json<Value>,
) -> Json<Value> {
    calls.import.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "tracking_code": "NJA-0001" }))
}

async fn courier_label(
    State(calls): State<Arc<CarrierCalls>>,
    Json(body): Json<Value>,
) -> Json<Value> {
    calls.label.fetch_add(1, Ordering::SeqCst);
    calls.label_requests.lock().unwrap().push(body);
    let configured = calls.label_response.lock().unwrap().clone();
    Json(configured.unwrap_or_else(|| json!({ "tracking_codes": ["VLA-0001"] })))
}

async fn warehouse_login_denied() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "bad credentials" })),
    )
}

async fn warehouse_import_rejected(Json(_body): Json<Value>) -> (StatusCode, String) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        r#"{"error":"sku missing"}"#.to_string(),
    )
}

async fn courier_label_rejected(Json(_body): Json<Value>) -> (StatusCode, String) {
    (
        StatusCode::BAD_REQUEST,
        r#"{"error":"postcode invalid"}"#.to_string(),
    )
}

async fn courier_label_slow(Json(_body): Json<Value>) -> Json<Value> {
    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
    Json(json!({ "tracking_codes": ["VLA-SLOW"] }))
}

async fn spawn_fake_carriers(calls: Arc<CarrierCalls>) -> anyhow::Result<String> {
    let app = Router::new()
        .route("/warehouse/login", post(warehouse_login))
        .route("/warehouse/login-denied", post(warehouse_login_denied))
        .route("/warehouse/import", post(warehouse_import))
        .route("/warehouse/import-rejected", post(warehouse_import_rejected))
        .route("/courier/labels", post(courier_label))
        .route("/courier/labels-rejected", post(courier_label_rejected))
        .route("/courier/labels-slow", post(courier_label_slow))
        .with_state(calls);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Ok(format!("http://{addr}"))
}

// Integration flow: C2C label via the aggregator -> idempotent repeat ->
// warehouse label via login+import -> missing shipping option -> empty
// tracking codes with compensating order deletion -> timeout and carrier
// rejection paths -> insert race on the unique order_id index.
#[tokio::test]
async fn label_generation_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let calls = Arc::new(CarrierCalls::default());
    let base_url = spawn_fake_carriers(calls.clone()).await?;
    let state = setup_state(&database_url, &base_url).await?;

    let listing_id = seed_listing(&state, Some(1.5)).await?;
    let individual_seller = seed_seller(&state, "individual").await?;
    let warehouse_seller = seed_seller(&state, "master").await?;
    let dpd_option = seed_option(&state, "DPD").await?;

    // C2C happy path: aggregator call with banded dimensions, voila label.
    let order_id = seed_order(&state, listing_id, individual_seller).await?;
    let response = label_service::generate_label(
        &state,
        GenerateLabelRequest {
            order_id: Some(order_id.to_string()),
            shipping_address: Some(sample_address()),
            shipping_option_id: Some(dpd_option),
        },
    )
    .await?;

    assert_eq!(response.message, "Label generated");
    let tracking = match response.data.unwrap() {
        LabelResponse::Generated(label) => {
            assert_eq!(label.label_type, "voila");
            assert_eq!(label.tracking_number, "VLA-0001");
            label.tracking_number
        }
        LabelResponse::AlreadyGenerated(_) => panic!("expected a fresh label"),
    };
    assert_eq!(calls.label.load(Ordering::SeqCst), 1);

    let captured = calls.label_requests.lock().unwrap().last().cloned().unwrap();
    assert_eq!(captured["service_code"], "DPD-12DROPQR");
    assert!(captured["request_id"].as_str().unwrap().starts_with("VS"));
    assert!(captured["request_id"].as_str().unwrap().len() <= 30);
    let parcel = &captured["parcels"][0];
    assert_eq!(parcel["weight"], 1.5);
    assert_eq!(parcel["length"], 47);
    assert_eq!(parcel["width"], 34);
    assert_eq!(parcel["height"], 15);

    let order = Orders::find_by_id(order_id).one(&state.orm).await?.unwrap();
    assert_eq!(order.tracking_number.as_deref(), Some("VLA-0001"));

    // Second call short-circuits on the existing label with no carrier call.
    let repeat = label_service::generate_label(
        &state,
        GenerateLabelRequest {
            order_id: Some(order_id.to_string()),
            shipping_address: None,
            shipping_option_id: Some(dpd_option),
        },
    )
    .await?;
    assert_eq!(repeat.message, "Label already generated");
    match repeat.data.unwrap() {
        LabelResponse::AlreadyGenerated(existing) => {
            assert_eq!(existing.tracking_number, tracking);
        }
        LabelResponse::Generated(_) => panic!("expected the existing label"),
    }
    assert_eq!(calls.label.load(Ordering::SeqCst), 1);

    // Warehouse seller routes to login+import even with an option supplied.
    let warehouse_order = seed_order(&state, listing_id, warehouse_seller).await?;
    let response = label_service::generate_label(
        &state,
        GenerateLabelRequest {
            order_id: Some(warehouse_order.to_string()),
            shipping_address: Some(sample_address()),
            shipping_option_id: Some(dpd_option),
        },
    )
    .await?;
    match response.data.unwrap() {
        LabelResponse::Generated(label) => {
            assert_eq!(label.label_type, "ninja");
            assert_eq!(label.tracking_number, "NJA-0001");
        }
        LabelResponse::AlreadyGenerated(_) => panic!("expected a fresh label"),
    }
    assert_eq!(calls.login.load(Ordering::SeqCst), 1);
    assert_eq!(calls.import.load(Ordering::SeqCst), 1);
    assert_eq!(calls.label.load(Ordering::SeqCst), 1);

    // Non-warehouse seller without a shipping option is a 404 before any
    // carrier call, and the order survives.
    let optionless_order = seed_order(&state, listing_id, individual_seller).await?;
    let err = label_service::generate_label(
        &state,
        GenerateLabelRequest {
            order_id: Some(optionless_order.to_string()),
            shipping_address: None,
            shipping_option_id: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(calls.label.load(Ordering::SeqCst), 1);
    assert!(
        Orders::find_by_id(optionless_order)
            .one(&state.orm)
            .await?
            .is_some()
    );

    // HTTP 200 with no tracking codes is a hard failure; the order row is
    // deleted by the compensating cleanup.
    calls.set_label_response(json!({ "tracking_codes": [] }));
    let doomed_order = seed_order(&state, listing_id, individual_seller).await?;
    let err = label_service::generate_label(
        &state,
        GenerateLabelRequest {
            order_id: Some(doomed_order.to_string()),
            shipping_address: Some(sample_address()),
            shipping_option_id: Some(dpd_option),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::LabelGeneration(_)));
    assert!(
        Orders::find_by_id(doomed_order)
            .one(&state.orm)
            .await?
            .is_none()
    );

    let (events,): (i64,) = sqlx::query_as(
        "SELECT count(*) FROM fulfillment_events WHERE order_id = $1 AND event = 'order_deleted_after_label_failure'",
    )
    .bind(doomed_order)
    .fetch_one(&state.pool)
    .await?;
    assert_eq!(events, 1);

    // Unknown order id.
    let err = label_service::generate_label(
        &state,
        GenerateLabelRequest {
            order_id: Some(Uuid::new_v4().to_string()),
            shipping_address: None,
            shipping_option_id: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Missing order id.
    let err = label_service::generate_label(
        &state,
        GenerateLabelRequest {
            order_id: None,
            shipping_address: None,
            shipping_option_id: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Malformed order id is a 400, not a deserialization failure.
    let err = label_service::generate_label(
        &state,
        GenerateLabelRequest {
            order_id: Some("not-a-uuid".into()),
            shipping_address: None,
            shipping_option_id: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // A carrier that hangs past the configured timeout surfaces as a
    // timeout, and the order is cleaned up like any other carrier failure.
    let slow_state = override_carriers(&state, |cfg| {
        cfg.courier_label_url = format!("{base_url}/courier/labels-slow");
        cfg.timeout = std::time::Duration::from_millis(500);
    })?;
    let stalled_order = seed_order(&state, listing_id, individual_seller).await?;
    let err = label_service::generate_label(
        &slow_state,
        GenerateLabelRequest {
            order_id: Some(stalled_order.to_string()),
            shipping_address: Some(sample_address()),
            shipping_option_id: Some(dpd_option),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::CarrierTimeout(_)));
    assert!(
        Orders::find_by_id(stalled_order)
            .one(&state.orm)
            .await?
            .is_none()
    );

    // Warehouse login rejection: no import attempt, order deleted.
    let denied_state = override_carriers(&state, |cfg| {
        cfg.warehouse_login_url = format!("{base_url}/warehouse/login-denied");
    })?;
    let imports_before = calls.import.load(Ordering::SeqCst);
    let denied_order = seed_order(&state, listing_id, warehouse_seller).await?;
    let err = label_service::generate_label(
        &denied_state,
        GenerateLabelRequest {
            order_id: Some(denied_order.to_string()),
            shipping_address: Some(sample_address()),
            shipping_option_id: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Authentication(_)));
    assert_eq!(calls.import.load(Ordering::SeqCst), imports_before);
    assert!(
        Orders::find_by_id(denied_order)
            .one(&state.orm)
            .await?
            .is_none()
    );

    // Warehouse import rejection carries the carrier's raw body.
    let rejecting_state = override_carriers(&state, |cfg| {
        cfg.warehouse_import_url = format!("{base_url}/warehouse/import-rejected");
    })?;
    let rejected_order = seed_order(&state, listing_id, warehouse_seller).await?;
    let err = label_service::generate_label(
        &rejecting_state,
        GenerateLabelRequest {
            order_id: Some(rejected_order.to_string()),
            shipping_address: Some(sample_address()),
            shipping_option_id: None,
        },
    )
    .await
    .unwrap_err();
    match &err {
        AppError::CarrierImport { status, body } => {
            assert_eq!(*status, 422);
            assert!(body.contains("sku missing"));
        }
        other => panic!("expected CarrierImport, got {other:?}"),
    }
    assert!(
        Orders::find_by_id(rejected_order)
            .one(&state.orm)
            .await?
            .is_none()
    );

    // Aggregator rejection carries the carrier's raw body too.
    let bouncing_state = override_carriers(&state, |cfg| {
        cfg.courier_label_url = format!("{base_url}/courier/labels-rejected");
    })?;
    let bounced_order = seed_order(&state, listing_id, individual_seller).await?;
    let err = label_service::generate_label(
        &bouncing_state,
        GenerateLabelRequest {
            order_id: Some(bounced_order.to_string()),
            shipping_address: Some(sample_address()),
            shipping_option_id: Some(dpd_option),
        },
    )
    .await
    .unwrap_err();
    match &err {
        AppError::CarrierLabel { status, body } => {
            assert_eq!(*status, 400);
            assert!(body.contains("postcode invalid"));
        }
        other => panic!("expected CarrierLabel, got {other:?}"),
    }
    assert!(
        Orders::find_by_id(bounced_order)
            .one(&state.orm)
            .await?
            .is_none()
    );

    // Insert race: a row already present under the unique order_id index
    // wins, and the loser gets the existing label back.
    let raced_order = seed_order(&state, listing_id, individual_seller).await?;
    LabelActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(raced_order),
        tracking_number: Set("VLA-RACE".into()),
        label_type: Set("voila".into()),
        label_data: Set(json!({})),
        generated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    let outcome = LabelOutcome::PeerToPeer {
        tracking_number: "VLA-LOSER".into(),
        raw: json!({}),
    };
    match label_service::persist_label(&state, raced_order, &outcome).await? {
        PersistResult::AlreadyExists(existing) => {
            assert_eq!(existing.tracking_number, "VLA-RACE");
        }
        PersistResult::Inserted(_) => panic!("expected the pre-existing label to win"),
    }

    Ok(())
}

fn override_carriers(
    state: &AppState,
    adjust: impl FnOnce(&mut CarrierConfig),
) -> anyhow::Result<AppState> {
    let mut carriers = state.carriers.clone();
    adjust(&mut carriers);
    AppState::new(state.pool.clone(), state.orm.clone(), carriers)
}

async fn setup_state(database_url: &str, carrier_base_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let orm = create_orm_conn(database_url).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE shipping_labels, fulfillment_events, orders, shipping_options, shipping_providers, seller_profiles, listings CASCADE",
    ))
    .await?;

    let carriers = CarrierConfig {
        warehouse_email: "ops@example.com".into(),
        warehouse_password: "secret".into(),
        warehouse_login_url: format!("{carrier_base_url}/warehouse/login"),
        warehouse_import_url: format!("{carrier_base_url}/warehouse/import"),
        courier_api_user: "api-user".into(),
        courier_api_token: "api-token".into(),
        courier_label_url: format!("{carrier_base_url}/courier/labels"),
        service_codes: CarrierConfig::default_service_codes(),
        timeout: std::time::Duration::from_secs(5),
    };

    AppState::new(pool, orm, carriers)
}

fn sample_address() -> ShippingAddress {
    ShippingAddress {
        first_name: Some("Ada".into()),
        last_name: Some("Lovelace".into()),
        address_line1: Some("1 High Street".into()),
        address_line2: None,
        city: Some("London".into()),
        state: None,
        postal_code: Some("E1 6AN".into()),
        country: Some("GB".into()),
        phone: Some("+447700900123".into()),
        email: Some("ada@example.com".into()),
    }
}

async fn seed_listing(state: &AppState, weight: Option<f64>) -> anyhow::Result<Uuid> {
    let listing = ListingActive {
        id: Set(Uuid::new_v4()),
        product_name: Set("Vintage denim jacket".into()),
        thumbnail: Set(None),
        weight: Set(weight),
        sku: Set(Some("VDJ-001".into())),
        stream_id: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(listing.id)
}

async fn seed_seller(state: &AppState, shop_type: &str) -> anyhow::Result<Uuid> {
    let seller = SellerActive {
        id: Set(Uuid::new_v4()),
        shop_type: Set(Some(shop_type.into())),
        shop_name: Set(Some("Retro Rita".into())),
        business_name: Set(Some("Retro Rita Ltd".into())),
        return_address_line1: Set(Some("12 Market Row".into())),
        return_address_line2: Set(None),
        return_city: Set(Some("London".into())),
        return_state: Set(None),
        return_postcode: Set(Some("E8 4PH".into())),
        return_country: Set(Some("GB".into())),
        contact_email: Set(Some("rita@example.com".into())),
        contact_phone: Set(Some("+447700900000".into())),
    }
    .insert(&state.orm)
    .await?;
    Ok(seller.id)
}

async fn seed_option(state: &AppState, provider_name: &str) -> anyhow::Result<Uuid> {
    let provider = ProviderActive {
        id: Set(Uuid::new_v4()),
        name: Set(provider_name.into()),
    }
    .insert(&state.orm)
    .await?;

    let option = OptionActive {
        id: Set(Uuid::new_v4()),
        provider_id: Set(provider.id),
    }
    .insert(&state.orm)
    .await?;
    Ok(option.id)
}

async fn seed_order(state: &AppState, listing_id: Uuid, seller_id: Uuid) -> anyhow::Result<Uuid> {
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        listing_id: Set(listing_id),
        buyer_id: Set(Uuid::new_v4()),
        seller_id: Set(seller_id),
        order_amount: Set(40.0),
        quantity: Set(2),
        status: Set("paid".into()),
        delivery_status: Set("pending".into()),
        tracking_number: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(order.id)
}
