use crate::{
    config::CarrierConfig,
    db::{DbPool, OrmConn},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    /// Shared outbound client; carries the carrier call timeout.
    pub http: reqwest::Client,
    pub carriers: CarrierConfig,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn, carriers: CarrierConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(carriers.timeout)
            .build()?;
        Ok(Self {
            pool,
            orm,
            http,
            carriers,
        })
    }
}
