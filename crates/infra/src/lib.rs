//! Infrastructure layer: persistence gateway, balance aggregation and party orchestration.

pub mod balance;
pub mod service;
pub mod store;

pub use balance::BalanceAggregator;
pub use service::{CustomerParties, PartyService, PartyVariant, ServiceError, SupplierParties};
pub use store::{InMemoryPartyStore, PartyStore, PostgresPartyStore, StoreError};
