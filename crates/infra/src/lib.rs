//! `ledgerly-infra` — storage adapters and process-level plumbing.
//!
//! Domain crates define their ports (stores, directories, senders); this
//! crate provides the implementations: tenant-isolated in-memory stores for
//! dev and tests, a Postgres-backed notification store, and the login rate
//! limiter.

pub mod postgres;
pub mod rate_limit;
pub mod stores;
pub mod tenant_store;

pub use postgres::PostgresNotificationStore;
pub use rate_limit::LoginRateLimiter;
pub use stores::alerts::{InMemoryAlertRuleStore, InMemoryNotificationStore, InMemorySettingsStore};
pub use stores::directory::InMemoryDirectory;
pub use stores::finance::InMemoryFinanceStore;
pub use stores::webhooks::InMemoryWebhookStore;
pub use tenant_store::{InMemoryTenantStore, TenantStore};
