use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// Durable fulfillment trail. Compensating deletions and post-issuance
/// persistence failures land here so support can reconcile carrier-side
/// labels that never made it into `shipping_labels`.
pub async fn record_event(
    pool: &DbPool,
    order_id: Option<Uuid>,
    event: &str,
    detail: Option<Value>,
) -> AppResult<()> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO fulfillment_events (id, order_id, event, detail)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(id)
    .bind(order_id)
    .bind(event)
    .bind(detail)
    .execute(pool)
    .await?;

    Ok(())
}
