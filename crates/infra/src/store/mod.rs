//! Persistence gateway for parties.
//!
//! One trait, [`PartyStore`], covers the four document families (customers, customer-store
//! infos, suppliers, stores). Adapters:
//! - [`InMemoryPartyStore`] for tests/dev
//! - [`PostgresPartyStore`] for production (JSONB documents)

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use thiserror::Error;

use partyhub_core::{CustomerId, PartyId, StoreId};
use partyhub_parties::{
    BalanceTotals, Customer, CustomerStoreInfo, ListQuery, ListedCustomer, NewCustomer, Page,
    PartyPatch, PartyType, Store, Supplier,
};

pub use in_memory::InMemoryPartyStore;
pub use postgres::PostgresPartyStore;

/// Gateway operation error.
///
/// "Not found" is not an error here: lookups return `Option`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A caller-supplied identifier could not be cast by the storage engine.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// A uniqueness rule was violated (one store-info row per customer and store).
    #[error("duplicate party: {0}")]
    Duplicate(String),

    /// An aggregation ran over zero records.
    #[error("no records found: {0}")]
    NoRecords(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Store-scoped persistence for customer and supplier parties.
///
/// ## Implementation requirements
///
/// - every store-scoped read filters on `store_id`; a record of another store is never returned
/// - `resolve_customer` is atomic per phone number (no two identities created concurrently
///   for the same phone by this gateway)
/// - `insert_customer_store_info` rejects a second row for the same `(customer_id, store_id)`
/// - list operations exclude soft-deleted rows; by-id lookups do not
/// - list totals re-apply the same filter as the page query
#[async_trait::async_trait]
pub trait PartyStore: Send + Sync {
    async fn find_store_by_phone(&self, phone_number: &str) -> Result<Option<Store>, StoreError>;

    /// Most recent customer with `seed.phone_number` (legacy data may hold several), or a
    /// new one created from the seed.
    async fn resolve_customer(&self, seed: NewCustomer) -> Result<Customer, StoreError>;

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError>;

    async fn find_customer_store_info(
        &self,
        store_id: StoreId,
        customer_id: CustomerId,
    ) -> Result<Option<CustomerStoreInfo>, StoreError>;

    async fn insert_customer_store_info(
        &self,
        info: CustomerStoreInfo,
    ) -> Result<CustomerStoreInfo, StoreError>;

    async fn get_customer_store_info(
        &self,
        store_id: StoreId,
        id: PartyId,
    ) -> Result<Option<CustomerStoreInfo>, StoreError>;

    async fn update_customer_store_info(
        &self,
        id: PartyId,
        patch: &PartyPatch,
    ) -> Result<Option<CustomerStoreInfo>, StoreError>;

    /// Customer rows of a store with their identity populated.
    async fn list_customer_store_infos(
        &self,
        store_id: StoreId,
        query: &ListQuery,
    ) -> Result<Page<ListedCustomer>, StoreError>;

    async fn insert_supplier(&self, supplier: Supplier) -> Result<Supplier, StoreError>;

    async fn get_supplier(
        &self,
        store_id: StoreId,
        id: PartyId,
    ) -> Result<Option<Supplier>, StoreError>;

    async fn update_supplier(
        &self,
        id: PartyId,
        patch: &PartyPatch,
    ) -> Result<Option<Supplier>, StoreError>;

    async fn list_suppliers(
        &self,
        store_id: StoreId,
        query: &ListQuery,
    ) -> Result<Page<Supplier>, StoreError>;

    /// Signed balance sums over every record of the family in the store.
    ///
    /// Returns `StoreError::NoRecords` when the store has none.
    async fn balance_totals(
        &self,
        party_type: PartyType,
        store_id: StoreId,
    ) -> Result<BalanceTotals, StoreError>;

    /// Flag matching store-scoped rows as deleted; returns how many were flagged.
    async fn soft_delete(
        &self,
        party_type: PartyType,
        store_id: StoreId,
        ids: &[PartyId],
    ) -> Result<u64, StoreError>;
}

#[async_trait::async_trait]
impl<S> PartyStore for Arc<S>
where
    S: PartyStore + ?Sized,
{
    async fn find_store_by_phone(&self, phone_number: &str) -> Result<Option<Store>, StoreError> {
        (**self).find_store_by_phone(phone_number).await
    }

    async fn resolve_customer(&self, seed: NewCustomer) -> Result<Customer, StoreError> {
        (**self).resolve_customer(seed).await
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        (**self).get_customer(id).await
    }

    async fn find_customer_store_info(
        &self,
        store_id: StoreId,
        customer_id: CustomerId,
    ) -> Result<Option<CustomerStoreInfo>, StoreError> {
        (**self).find_customer_store_info(store_id, customer_id).await
    }

    async fn insert_customer_store_info(
        &self,
        info: CustomerStoreInfo,
    ) -> Result<CustomerStoreInfo, StoreError> {
        (**self).insert_customer_store_info(info).await
    }

    async fn get_customer_store_info(
        &self,
        store_id: StoreId,
        id: PartyId,
    ) -> Result<Option<CustomerStoreInfo>, StoreError> {
        (**self).get_customer_store_info(store_id, id).await
    }

    async fn update_customer_store_info(
        &self,
        id: PartyId,
        patch: &PartyPatch,
    ) -> Result<Option<CustomerStoreInfo>, StoreError> {
        (**self).update_customer_store_info(id, patch).await
    }

    async fn list_customer_store_infos(
        &self,
        store_id: StoreId,
        query: &ListQuery,
    ) -> Result<Page<ListedCustomer>, StoreError> {
        (**self).list_customer_store_infos(store_id, query).await
    }

    async fn insert_supplier(&self, supplier: Supplier) -> Result<Supplier, StoreError> {
        (**self).insert_supplier(supplier).await
    }

    async fn get_supplier(
        &self,
        store_id: StoreId,
        id: PartyId,
    ) -> Result<Option<Supplier>, StoreError> {
        (**self).get_supplier(store_id, id).await
    }

    async fn update_supplier(
        &self,
        id: PartyId,
        patch: &PartyPatch,
    ) -> Result<Option<Supplier>, StoreError> {
        (**self).update_supplier(id, patch).await
    }

    async fn list_suppliers(
        &self,
        store_id: StoreId,
        query: &ListQuery,
    ) -> Result<Page<Supplier>, StoreError> {
        (**self).list_suppliers(store_id, query).await
    }

    async fn balance_totals(
        &self,
        party_type: PartyType,
        store_id: StoreId,
    ) -> Result<BalanceTotals, StoreError> {
        (**self).balance_totals(party_type, store_id).await
    }

    async fn soft_delete(
        &self,
        party_type: PartyType,
        store_id: StoreId,
        ids: &[PartyId],
    ) -> Result<u64, StoreError> {
        (**self).soft_delete(party_type, store_id, ids).await
    }
}
