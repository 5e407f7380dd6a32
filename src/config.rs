use std::collections::HashMap;
use std::env;
use std::time::Duration;

use crate::carriers::courier::DEFAULT_SERVICE_CODE;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub carriers: CarrierConfig,
}

/// Carrier credentials and endpoints, injected into the adapters so nothing
/// downstream reads the process environment directly.
#[derive(Debug, Clone)]
pub struct CarrierConfig {
    pub warehouse_email: String,
    pub warehouse_password: String,
    pub warehouse_login_url: String,
    pub warehouse_import_url: String,
    pub courier_api_user: String,
    pub courier_api_token: String,
    pub courier_label_url: String,
    /// Courier display name -> aggregator service code.
    pub service_codes: HashMap<String, String>,
    pub timeout: Duration,
}

impl CarrierConfig {
    pub fn default_service_codes() -> HashMap<String, String> {
        HashMap::from([
            ("DPD".to_string(), DEFAULT_SERVICE_CODE.to_string()),
            ("Yodel".to_string(), "YOD-C2CPS".to_string()),
            ("Evri".to_string(), "EVR-C2CPS".to_string()),
        ])
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let timeout_secs = env::var("CARRIER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        let carriers = CarrierConfig {
            warehouse_email: env::var("WAREHOUSE_API_EMAIL")?,
            warehouse_password: env::var("WAREHOUSE_API_PASSWORD")?,
            warehouse_login_url: env::var("WAREHOUSE_LOGIN_URL")?,
            warehouse_import_url: env::var("WAREHOUSE_IMPORT_URL")?,
            courier_api_user: env::var("COURIER_API_USER")?,
            courier_api_token: env::var("COURIER_API_TOKEN")?,
            courier_label_url: env::var("COURIER_LABEL_URL")?,
            service_codes: CarrierConfig::default_service_codes(),
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            port,
            database_url,
            host,
            carriers,
        })
    }
}
