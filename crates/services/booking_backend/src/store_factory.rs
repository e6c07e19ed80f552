//! Picks the booking store for the running configuration.
//!
//! The in-memory store is the default. With the `database` feature compiled in and
//! `use_database = true`, the SQL store is opened and its schema created.
use booking_common::services::BookingStore;
use booking_common::AppError;
use booking_config::AppConfig;
use booking_slots::InMemoryStore;
use std::sync::Arc;
#[allow(unused_imports)] // only some feature sets use these
use {
    booking_common::error::Context,
    booking_common::internal_error,
    tracing::{info, warn},
};

#[cfg(feature = "database")]
use booking_db::{DbClient, SqlBookingStore};

/// Build the store the booking service runs against.
pub async fn create_store(config: &AppConfig) -> Result<Arc<dyn BookingStore>, AppError> {
    if config.use_database {
        #[cfg(feature = "database")]
        {
            let db_config = config
                .database
                .as_ref()
                .ok_or_else(|| internal_error("use_database is set but [database] is missing"))?;
            let client = DbClient::from_config(db_config)
                .await
                .context("Failed to open the database")?;
            let store = SqlBookingStore::new(client);
            store
                .init_schema()
                .await
                .context("Failed to create the booking schema")?;
            info!("Using the SQL booking store");
            return Ok(Arc::new(store));
        }
        #[cfg(not(feature = "database"))]
        warn!("use_database is set but the database feature is not compiled in; using memory");
    }

    info!("Using the in-memory booking store");
    Ok(Arc::new(InMemoryStore::new()))
}
