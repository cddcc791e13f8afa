//! Party orchestration (application-level).
//!
//! A party is either a customer or a supplier. Each family implements [`PartyVariant`];
//! [`PartyService`] selects the variant for a [`PartyType`] and makes one generic call.
//!
//! ```text
//! request ─▶ PartyService ─▶ variant(type) ─▶ PartyStore
//!                         └─▶ BalanceAggregator ─▶ PartyStore
//! ```
//!
//! Customers are deduplicated by phone number: one global identity, one store-info row per
//! (customer, store). Suppliers are plain store-scoped rows.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use partyhub_core::{DomainError, PartyId, StoreId};
use partyhub_parties::{
    BalanceTotals, CreateParty, CustomerParty, ListQuery, Page, PartyDetails, PartyListItem,
    PartyPatch, PartyRecord, PartyType, SoftDeleteParties,
};

use crate::balance::BalanceAggregator;
use crate::store::{PartyStore, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("duplicate party: {0}")]
    Duplicate(String),

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("no records found: {0}")]
    NoRecords(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidId(msg) => ServiceError::InvalidId(msg),
            StoreError::Duplicate(msg) => ServiceError::Duplicate(msg),
            StoreError::NoRecords(msg) => ServiceError::NoRecords(msg),
            StoreError::Storage(msg) => ServiceError::Storage(msg),
        }
    }
}

/// Operations every party family supports.
#[async_trait::async_trait]
pub trait PartyVariant: Send + Sync {
    async fn create(&self, cmd: CreateParty) -> Result<PartyRecord, ServiceError>;

    /// `Ok(None)` when no record has this id.
    async fn update(
        &self,
        id: PartyId,
        patch: &PartyPatch,
    ) -> Result<Option<PartyRecord>, ServiceError>;

    async fn get_by_id(
        &self,
        store_id: StoreId,
        id: PartyId,
    ) -> Result<Option<PartyDetails>, ServiceError>;

    async fn list(
        &self,
        store_id: StoreId,
        query: &ListQuery,
    ) -> Result<Page<PartyListItem>, ServiceError>;
}

/// Customer family: global identity plus per-store relationship rows.
#[derive(Debug, Clone)]
pub struct CustomerParties<S> {
    store: S,
}

impl<S> CustomerParties<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl<S> PartyVariant for CustomerParties<S>
where
    S: PartyStore,
{
    async fn create(&self, cmd: CreateParty) -> Result<PartyRecord, ServiceError> {
        let customer = self.store.resolve_customer(cmd.customer_seed()).await?;

        if self
            .store
            .find_customer_store_info(cmd.store_id, customer.id)
            .await?
            .is_some()
        {
            info!(
                customer_id = %customer.id,
                store_id = %cmd.store_id,
                "customer already linked to store"
            );
            return Err(ServiceError::Duplicate(format!(
                "customer with phone {} already exists in store {}",
                customer.phone_number, cmd.store_id
            )));
        }

        let store_info = self
            .store
            .insert_customer_store_info(cmd.store_info(customer.id, Utc::now()))
            .await?;
        debug!(party_id = %store_info.id, customer_id = %customer.id, "customer linked to store");

        Ok(PartyRecord::Customer(CustomerParty {
            store_info,
            phone_number: customer.phone_number,
        }))
    }

    async fn update(
        &self,
        id: PartyId,
        patch: &PartyPatch,
    ) -> Result<Option<PartyRecord>, ServiceError> {
        Ok(self
            .store
            .update_customer_store_info(id, patch)
            .await?
            .map(PartyRecord::StoreInfo))
    }

    async fn get_by_id(
        &self,
        store_id: StoreId,
        id: PartyId,
    ) -> Result<Option<PartyDetails>, ServiceError> {
        let Some(store_info) = self.store.get_customer_store_info(store_id, id).await? else {
            return Ok(None);
        };
        let customer = self.store.get_customer(store_info.customer_id).await?;
        if customer.is_none() {
            warn!(customer_id = %store_info.customer_id, "store info references a missing customer");
        }
        Ok(Some(PartyDetails::Customer {
            customer,
            store_info,
        }))
    }

    async fn list(
        &self,
        store_id: StoreId,
        query: &ListQuery,
    ) -> Result<Page<PartyListItem>, ServiceError> {
        Ok(self
            .store
            .list_customer_store_infos(store_id, query)
            .await?
            .map(PartyListItem::Customer))
    }
}

/// Supplier family: store-scoped rows, optionally linked to the supplier's own store.
#[derive(Debug, Clone)]
pub struct SupplierParties<S> {
    store: S,
}

impl<S> SupplierParties<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl<S> PartyVariant for SupplierParties<S>
where
    S: PartyStore,
{
    async fn create(&self, cmd: CreateParty) -> Result<PartyRecord, ServiceError> {
        let own_store = self.store.find_store_by_phone(&cmd.phone_number).await?;
        if let Some(own_store) = &own_store {
            debug!(supplier_store_id = %own_store.id, "supplier has its own store");
        }
        let supplier = self
            .store
            .insert_supplier(cmd.supplier(own_store.map(|s| s.id), Utc::now()))
            .await?;
        Ok(PartyRecord::Supplier(supplier))
    }

    async fn update(
        &self,
        id: PartyId,
        patch: &PartyPatch,
    ) -> Result<Option<PartyRecord>, ServiceError> {
        Ok(self
            .store
            .update_supplier(id, patch)
            .await?
            .map(PartyRecord::Supplier))
    }

    async fn get_by_id(
        &self,
        store_id: StoreId,
        id: PartyId,
    ) -> Result<Option<PartyDetails>, ServiceError> {
        Ok(self
            .store
            .get_supplier(store_id, id)
            .await?
            .map(PartyDetails::Supplier))
    }

    async fn list(
        &self,
        store_id: StoreId,
        query: &ListQuery,
    ) -> Result<Page<PartyListItem>, ServiceError> {
        Ok(self
            .store
            .list_suppliers(store_id, query)
            .await?
            .map(PartyListItem::Supplier))
    }
}

/// Entry point for every party operation.
#[derive(Debug, Clone)]
pub struct PartyService<S> {
    customers: CustomerParties<S>,
    suppliers: SupplierParties<S>,
    balances: BalanceAggregator<S>,
    store: S,
}

impl<S> PartyService<S>
where
    S: PartyStore + Clone,
{
    pub fn new(store: S) -> Self {
        Self {
            customers: CustomerParties::new(store.clone()),
            suppliers: SupplierParties::new(store.clone()),
            balances: BalanceAggregator::new(store.clone()),
            store,
        }
    }

    fn variant(&self, party_type: PartyType) -> &dyn PartyVariant {
        match party_type {
            PartyType::Customer => &self.customers,
            PartyType::Supplier => &self.suppliers,
        }
    }

    #[instrument(
        skip(self, cmd),
        fields(store_id = %cmd.store_id, party_type = %cmd.party_type),
        err
    )]
    pub async fn create(&self, cmd: CreateParty) -> Result<PartyRecord, ServiceError> {
        let mut missing = Vec::new();
        if cmd.name.trim().is_empty() {
            missing.push("name");
        }
        if cmd.phone_number.trim().is_empty() {
            missing.push("phoneNumber");
        }
        if !missing.is_empty() {
            return Err(DomainError::missing(&missing).into());
        }

        let record = self.variant(cmd.party_type).create(cmd).await?;
        info!("party created");
        Ok(record)
    }

    #[instrument(skip(self, patch), fields(party_id = %id, party_type = %party_type), err)]
    pub async fn update(
        &self,
        id: PartyId,
        party_type: PartyType,
        patch: &PartyPatch,
    ) -> Result<Option<PartyRecord>, ServiceError> {
        self.variant(party_type).update(id, patch).await
    }

    #[instrument(
        skip(self),
        fields(store_id = %store_id, party_id = %id, party_type = %party_type),
        err
    )]
    pub async fn get_by_id(
        &self,
        store_id: StoreId,
        id: PartyId,
        party_type: PartyType,
    ) -> Result<Option<PartyDetails>, ServiceError> {
        self.variant(party_type).get_by_id(store_id, id).await
    }

    #[instrument(skip(self, query), fields(store_id = %store_id, party_type = %party_type), err)]
    pub async fn list(
        &self,
        store_id: StoreId,
        party_type: PartyType,
        query: &ListQuery,
    ) -> Result<Page<PartyListItem>, ServiceError> {
        self.variant(party_type).list(store_id, query).await
    }

    pub async fn total_balance(
        &self,
        store_id: StoreId,
        party_type: PartyType,
    ) -> Result<BalanceTotals, ServiceError> {
        Ok(self.balances.total_balance(party_type, store_id).await?)
    }

    #[instrument(
        skip(self, cmd),
        fields(store_id = %cmd.store_id, party_type = %cmd.party_type, requested = cmd.party_ids.len()),
        err
    )]
    pub async fn soft_delete(&self, cmd: SoftDeleteParties) -> Result<u64, ServiceError> {
        if cmd.party_ids.is_empty() {
            return Err(DomainError::missing(&["partyIds"]).into());
        }
        let flagged = self
            .store
            .soft_delete(cmd.party_type, cmd.store_id, &cmd.party_ids)
            .await?;
        info!(flagged, "parties soft-deleted");
        Ok(flagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use partyhub_parties::{Address, AddressPair, GstType, RawListParams, Store};

    use crate::store::InMemoryPartyStore;

    fn service() -> (PartyService<Arc<InMemoryPartyStore>>, Arc<InMemoryPartyStore>) {
        let store = InMemoryPartyStore::arc();
        (PartyService::new(store.clone()), store)
    }

    fn shipping() -> AddressPair {
        AddressPair {
            shipping: Address {
                line1: "7 Lake View".to_string(),
                line2: String::new(),
                city: "Indore".to_string(),
                state: "Madhya Pradesh".to_string(),
                pin_code: "452001".to_string(),
            },
            billing_same_as_shipping: true,
            billing: Some(Address {
                line1: "elsewhere".to_string(),
                line2: String::new(),
                city: "Bhopal".to_string(),
                state: "Madhya Pradesh".to_string(),
                pin_code: "462001".to_string(),
            }),
            name: None,
            phone_number: None,
            kind: None,
        }
    }

    fn create(party_type: PartyType, store_id: StoreId, phone: &str) -> CreateParty {
        CreateParty {
            party_type,
            store_id,
            name: "Kiran Stores".to_string(),
            phone_number: phone.to_string(),
            gst_type: GstType::Consumer,
            address: Some(shipping()),
            trade_name: None,
            email: None,
            gstin: None,
            balance: None,
        }
    }

    fn customer_party(record: PartyRecord) -> CustomerParty {
        match record {
            PartyRecord::Customer(party) => party,
            other => panic!("expected customer party, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn new_phone_creates_identity_and_store_link() {
        let (service, store) = service();
        let shop = StoreId::new();

        let party = customer_party(
            service
                .create(create(PartyType::Customer, shop, "+919000000001"))
                .await
                .unwrap(),
        );

        assert_eq!(party.phone_number, "+919000000001");
        assert_eq!(party.store_info.store_id, shop);
        assert_eq!(party.store_info.balance, Some(0.0));
        assert!(party.store_info.addresses[0].billing.is_none());
        assert_eq!(store.customer_count().unwrap(), 1);
        assert_eq!(store.store_info_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn same_phone_same_store_is_duplicate() {
        let (service, store) = service();
        let shop = StoreId::new();
        service
            .create(create(PartyType::Customer, shop, "+919000000002"))
            .await
            .unwrap();

        let err = service
            .create(create(PartyType::Customer, shop, "+919000000002"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Duplicate(_)));
        assert_eq!(store.store_info_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn soft_deleted_link_still_blocks_recreation() {
        let (service, store) = service();
        let shop = StoreId::new();
        let linked = customer_party(
            service
                .create(create(PartyType::Customer, shop, "+919000000009"))
                .await
                .unwrap(),
        );
        service
            .soft_delete(SoftDeleteParties {
                party_type: PartyType::Customer,
                store_id: shop,
                party_ids: vec![linked.store_info.id],
            })
            .await
            .unwrap();

        let err = service
            .create(create(PartyType::Customer, shop, "+919000000009"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Duplicate(_)));
        assert_eq!(store.store_info_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn known_phone_in_new_store_reuses_identity() {
        let (service, store) = service();
        let first = customer_party(
            service
                .create(create(PartyType::Customer, StoreId::new(), "+919000000003"))
                .await
                .unwrap(),
        );
        let second = customer_party(
            service
                .create(create(PartyType::Customer, StoreId::new(), "+919000000003"))
                .await
                .unwrap(),
        );

        assert_eq!(first.store_info.customer_id, second.store_info.customer_id);
        assert_ne!(first.store_info.id, second.store_info.id);
        assert_eq!(store.customer_count().unwrap(), 1);
        assert_eq!(store.store_info_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn concurrent_creates_for_one_phone_link_once() {
        let (service, store) = service();
        let shop = StoreId::new();

        let (a, b) = tokio::join!(
            service.create(create(PartyType::Customer, shop, "+919000000009")),
            service.create(create(PartyType::Customer, shop, "+919000000009")),
        );
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        assert_eq!(store.customer_count().unwrap(), 1);
        assert_eq!(store.store_info_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn customer_lookup_is_store_scoped() {
        let (service, _) = service();
        let shop = StoreId::new();
        let party = customer_party(
            service
                .create(create(PartyType::Customer, shop, "+919000000004"))
                .await
                .unwrap(),
        );

        let details = service
            .get_by_id(shop, party.store_info.id, PartyType::Customer)
            .await
            .unwrap()
            .unwrap();
        match details {
            PartyDetails::Customer {
                customer,
                store_info,
            } => {
                assert_eq!(store_info.id, party.store_info.id);
                assert_eq!(customer.unwrap().phone_number, "+919000000004");
            }
            other => panic!("expected customer details, got {other:?}"),
        }

        let elsewhere = service
            .get_by_id(StoreId::new(), party.store_info.id, PartyType::Customer)
            .await
            .unwrap();
        assert!(elsewhere.is_none());
    }

    #[tokio::test]
    async fn supplier_links_to_its_own_store() {
        let (service, store) = service();
        let own = Store {
            id: StoreId::new(),
            phone_number: "+919000000005".to_string(),
            name: Some("Wholesale Hub".to_string()),
        };
        store.insert_store(own.clone()).unwrap();

        let linked = service
            .create(create(PartyType::Supplier, StoreId::new(), "+919000000005"))
            .await
            .unwrap();
        let unlinked = service
            .create(create(PartyType::Supplier, StoreId::new(), "+919000000006"))
            .await
            .unwrap();

        match (linked, unlinked) {
            (PartyRecord::Supplier(linked), PartyRecord::Supplier(unlinked)) => {
                assert_eq!(linked.supplier_store_id, Some(own.id));
                assert_eq!(unlinked.supplier_store_id, None);
            }
            other => panic!("expected suppliers, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_overwrites_supplied_fields_only() {
        let (service, _) = service();
        let shop = StoreId::new();
        let created = match service
            .create(create(PartyType::Supplier, shop, "+919000000007"))
            .await
            .unwrap()
        {
            PartyRecord::Supplier(s) => s,
            other => panic!("expected supplier, got {other:?}"),
        };

        let patch = PartyPatch {
            balance: Some(-300.0),
            gst_type: Some(GstType::Registered),
            ..Default::default()
        };
        let updated = service
            .update(created.id, PartyType::Supplier, &patch)
            .await
            .unwrap();
        match updated {
            Some(PartyRecord::Supplier(s)) => {
                assert_eq!(s.balance, Some(-300.0));
                assert_eq!(s.gst_type, GstType::Registered);
                assert_eq!(s.name, created.name);
                assert_eq!(s.addresses, created.addresses);
            }
            other => panic!("expected updated supplier, got {other:?}"),
        }

        let missing = service
            .update(PartyId::new(), PartyType::Supplier, &patch)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn listing_customers_populates_identity() {
        let (service, _) = service();
        let shop = StoreId::new();
        for i in 0..25 {
            service
                .create(create(PartyType::Customer, shop, &format!("+9180000000{i:02}")))
                .await
                .unwrap();
        }

        let query = ListQuery::from_raw(&RawListParams::default());
        let page = service.list(shop, PartyType::Customer, &query).await.unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.items.len(), 10);
        match &page.items[0] {
            PartyListItem::Customer(row) => {
                assert_eq!(row.customer.as_ref().unwrap().phone_number, "+918000000024");
            }
            other => panic!("expected customer row, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_required_fields_are_rejected() {
        let (service, _) = service();
        let mut cmd = create(PartyType::Customer, StoreId::new(), "  ");
        cmd.name = String::new();

        let err = service.create(cmd).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::MissingParameters(ref fields)) if fields == "name, phoneNumber"
        ));
    }

    #[tokio::test]
    async fn soft_delete_requires_ids_and_hides_rows() {
        let (service, _) = service();
        let shop = StoreId::new();
        let party = customer_party(
            service
                .create(create(PartyType::Customer, shop, "+919000000008"))
                .await
                .unwrap(),
        );

        let err = service
            .soft_delete(SoftDeleteParties {
                party_type: PartyType::Customer,
                store_id: shop,
                party_ids: Vec::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(_)));

        let flagged = service
            .soft_delete(SoftDeleteParties {
                party_type: PartyType::Customer,
                store_id: shop,
                party_ids: vec![party.store_info.id],
            })
            .await
            .unwrap();
        assert_eq!(flagged, 1);

        let page = service
            .list(shop, PartyType::Customer, &ListQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total, 0);

        let still_there = service
            .get_by_id(shop, party.store_info.id, PartyType::Customer)
            .await
            .unwrap();
        assert!(still_there.is_some());
    }

    #[tokio::test]
    async fn total_balance_without_records_is_no_records() {
        let (service, _) = service();
        let err = service
            .total_balance(StoreId::new(), PartyType::Customer)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoRecords(_)));
    }
}
