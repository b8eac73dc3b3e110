//! Statistics, ranking and recommendation core for the article platform.
//!
//! The library exposes the counter store ([`metrics`]), the windowed
//! ranking queries ([`ranking`]), the related-article selectors
//! ([`related`]) and profile rollups ([`profile`]); the [`aggregator`]
//! module is the scheduled batch recompute driven by the `stats` binary.

use std::sync::Arc;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::{AsyncDieselConnectionManager, deadpool::Pool};

pub mod aggregator;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod profile;
pub mod ranking;
pub mod related;
pub mod schema;

/// Shared handle passed to every component. Built once at process
/// bootstrap; there are no ambient globals.
#[derive(Clone)]
pub struct App {
    pub diesel: Pool<AsyncPgConnection>,
    pub config: Arc<config::Config>,
}

impl App {
    pub fn initialize(config: config::Config) -> eyre::Result<Self> {
        let manager =
            AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);
        let diesel = Pool::builder(manager)
            .max_size(config.max_db_connections)
            .build()?;

        Ok(App {
            diesel,
            config: Arc::new(config),
        })
    }
}
