use shipping_label_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

// Seeds one unlabeled order per seller kind so the generate endpoint can be
// exercised locally against stub carrier endpoints.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let listing_id = seed_listing(&pool).await?;
    let individual_seller = seed_seller(&pool, "individual", "Retro Rita").await?;
    let warehouse_seller = seed_seller(&pool, "master", "VintStreet Warehouse").await?;
    let option_id = seed_dpd_option(&pool).await?;

    let c2c_order = seed_order(&pool, listing_id, individual_seller).await?;
    let warehouse_order = seed_order(&pool, listing_id, warehouse_seller).await?;

    println!("Seed completed.");
    println!("C2C order: {c2c_order} (shipping option {option_id})");
    println!("Warehouse order: {warehouse_order}");
    Ok(())
}

async fn seed_listing(pool: &sqlx::PgPool) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO listings (id, product_name, weight, sku)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(id)
    .bind("Vintage denim jacket")
    .bind(1.5_f64)
    .bind("VDJ-001")
    .execute(pool)
    .await?;
    Ok(id)
}

async fn seed_seller(pool: &sqlx::PgPool, shop_type: &str, shop_name: &str) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO seller_profiles
            (id, shop_type, shop_name, business_name, return_address_line1,
             return_city, return_postcode, return_country, contact_email, contact_phone)
        VALUES ($1, $2, $3, $3, '12 Market Row', 'London', 'E8 4PH', 'GB',
                'seller@example.com', '+447700900000')
        "#,
    )
    .bind(id)
    .bind(shop_type)
    .bind(shop_name)
    .execute(pool)
    .await?;
    Ok(id)
}

async fn seed_dpd_option(pool: &sqlx::PgPool) -> anyhow::Result<Uuid> {
    let provider_id = Uuid::new_v4();
    sqlx::query("INSERT INTO shipping_providers (id, name) VALUES ($1, 'DPD')")
        .bind(provider_id)
        .execute(pool)
        .await?;

    let option_id = Uuid::new_v4();
    sqlx::query("INSERT INTO shipping_options (id, provider_id) VALUES ($1, $2)")
        .bind(option_id)
        .bind(provider_id)
        .execute(pool)
        .await?;
    Ok(option_id)
}

async fn seed_order(pool: &sqlx::PgPool, listing_id: Uuid, seller_id: Uuid) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO orders (id, listing_id, buyer_id, seller_id, order_amount, quantity, status, delivery_status)
        VALUES ($1, $2, $3, $4, 40.0, 2, 'paid', 'pending')
        "#,
    )
    .bind(id)
    .bind(listing_id)
    .bind(Uuid::new_v4())
    .bind(seller_id)
    .execute(pool)
    .await?;
    Ok(id)
}
