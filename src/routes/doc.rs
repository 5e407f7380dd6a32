use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::labels::{ExistingLabel, GenerateLabelRequest, GeneratedLabel, LabelResponse},
    models::{Listing, Order, SellerProfile, ShippingAddress, ShippingLabel, ShippingOption},
    response::Meta,
    routes::{health, labels},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        labels::generate_label,
        labels::get_label,
    ),
    components(schemas(
        Meta,
        GenerateLabelRequest,
        LabelResponse,
        GeneratedLabel,
        ExistingLabel,
        Order,
        Listing,
        SellerProfile,
        ShippingOption,
        ShippingLabel,
        ShippingAddress,
        health::HealthData,
    )),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Labels", description = "Shipping label generation and lookup"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> axum::Router<crate::state::AppState> {
    axum::Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()))
}
