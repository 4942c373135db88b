pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod migrate;
pub mod normalize;
pub mod query;
pub mod record;
pub mod schema;
pub mod store;
pub mod tabular;
pub mod upsert;
