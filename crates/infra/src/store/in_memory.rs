use std::cmp::Ordering;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use partyhub_core::{CustomerId, Entity, PartyId, StoreId};
use partyhub_parties::{
    BalanceTotals, Customer, CustomerStoreInfo, ListQuery, ListedCustomer, NewCustomer, Page,
    PartyPatch, PartyType, SortDirection, SortField, Store, Supplier,
};

use super::{PartyStore, StoreError};

/// Document collections. Vectors keep insertion order, which doubles as id order.
#[derive(Debug, Default)]
struct Collections {
    stores: Vec<Store>,
    customers: Vec<Customer>,
    store_infos: Vec<CustomerStoreInfo>,
    suppliers: Vec<Supplier>,
}

/// In-memory party store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryPartyStore {
    state: RwLock<Collections>,
}

impl InMemoryPartyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a platform store (stores are owned by another service).
    #[cfg(test)]
    pub(crate) fn insert_store(&self, store: Store) -> Result<Store, StoreError> {
        let mut state = self.write()?;
        if by_id(&state.stores, store.id).is_some() {
            return Err(StoreError::Duplicate(format!("store {} already exists", store.id)));
        }
        state.stores.push(store.clone());
        Ok(store)
    }

    /// Insert a customer identity as-is, bypassing phone resolution (legacy duplicates).
    #[cfg(test)]
    pub(crate) fn insert_customer(&self, customer: Customer) -> Result<Customer, StoreError> {
        self.write()?.customers.push(customer.clone());
        Ok(customer)
    }

    #[cfg(test)]
    pub(crate) fn customer_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.customers.len())
    }

    #[cfg(test)]
    pub(crate) fn store_info_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.store_infos.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))
    }
}

fn by_id<T: Entity>(rows: &[T], id: T::Id) -> Option<&T> {
    rows.iter().find(|row| row.id() == id)
}

/// Merge `patch` over the row with `id` in place; `None` when no row has that id.
fn patch_row<T>(rows: &mut [T], id: T::Id, patch: &PartyPatch) -> Result<Option<T>, StoreError>
where
    T: Entity + Clone + Serialize + DeserializeOwned,
{
    let Some(slot) = rows.iter_mut().find(|row| row.id() == id) else {
        return Ok(None);
    };
    let updated = patch
        .merge_into(&*slot, Utc::now())
        .map_err(|e| StoreError::Storage(format!("patch failed: {e}")))?;
    *slot = updated.clone();
    Ok(Some(updated))
}

fn latest_by_phone<'a>(customers: &'a [Customer], phone_number: &str) -> Option<&'a Customer> {
    customers
        .iter()
        .enumerate()
        .filter(|(_, c)| c.phone_number == phone_number)
        .max_by(|a, b| a.1.created_at.cmp(&b.1.created_at).then(a.0.cmp(&b.0)))
        .map(|(_, c)| c)
}

/// Fields a listing can filter and sort on.
trait ListRow {
    fn store_id(&self) -> StoreId;
    fn is_deleted(&self) -> bool;
    fn balance(&self) -> Option<f64>;
    fn created_at(&self) -> DateTime<Utc>;
    fn text(&self, field: SortField) -> Option<&str>;
    fn number(&self, field: SortField) -> Option<f64>;
}

impl ListRow for CustomerStoreInfo {
    fn store_id(&self) -> StoreId {
        self.store_id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn balance(&self) -> Option<f64> {
        self.balance
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn text(&self, field: SortField) -> Option<&str> {
        match field {
            SortField::Name => self.name.as_deref(),
            SortField::TradeName => self.trade_name.as_deref(),
            SortField::Email => self.email.as_deref(),
            SortField::Gstin => self.gstin.as_deref(),
            _ => None,
        }
    }

    fn number(&self, field: SortField) -> Option<f64> {
        match field {
            SortField::Balance => self.balance,
            SortField::TotalSpent => Some(self.total_spent),
            _ => None,
        }
    }
}

impl ListRow for Supplier {
    fn store_id(&self) -> StoreId {
        self.store_id
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn balance(&self) -> Option<f64> {
        self.balance
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn text(&self, field: SortField) -> Option<&str> {
        match field {
            SortField::Name => self.name.as_deref(),
            SortField::TradeName => self.trade_name.as_deref(),
            SortField::Email => self.email.as_deref(),
            SortField::Gstin => self.gstin.as_deref(),
            SortField::PhoneNumber => Some(self.phone_number.as_str()),
            _ => None,
        }
    }

    fn number(&self, field: SortField) -> Option<f64> {
        match field {
            SortField::Balance => self.balance,
            _ => None,
        }
    }
}

// Absent values sort first ascending.
fn compare_rows<T: ListRow>(a: (usize, &T), b: (usize, &T), field: SortField) -> Ordering {
    match field {
        SortField::Id => a.0.cmp(&b.0),
        SortField::CreatedAt => a.1.created_at().cmp(&b.1.created_at()),
        f if f.is_numeric() => match (a.1.number(f), b.1.number(f)) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (x, y) => x.is_some().cmp(&y.is_some()),
        },
        f => a
            .1
            .text(f)
            .map(str::to_lowercase)
            .cmp(&b.1.text(f).map(str::to_lowercase)),
    }
}

/// Filter, count, sort, skip and limit one family's rows.
fn page_rows<'a, T: ListRow>(
    rows: &'a [T],
    store_id: StoreId,
    party_type: PartyType,
    query: &ListQuery,
) -> Page<&'a T> {
    let mut matched: Vec<(usize, &T)> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.store_id() == store_id && !row.is_deleted())
        .filter(|(_, row)| query.balance.is_none_or(|f| f.matches(row.balance())))
        .collect();
    let total = matched.len() as u64;

    let sort = query.sort.for_party(party_type);
    matched.sort_by(|a, b| {
        let ord = compare_rows(*a, *b, sort.field);
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });

    let skip = usize::try_from(query.skip()).unwrap_or(usize::MAX);
    let limit = usize::try_from(query.limit()).unwrap_or(usize::MAX);
    Page {
        items: matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|(_, row)| row)
            .collect(),
        total,
    }
}

fn totals_or_empty<T: ListRow>(
    rows: &[T],
    party_type: PartyType,
    store_id: StoreId,
) -> Result<BalanceTotals, StoreError> {
    BalanceTotals::accumulate(
        rows.iter()
            .filter(|row| row.store_id() == store_id)
            .map(ListRow::balance),
    )
    .ok_or_else(|| StoreError::NoRecords(format!("no {party_type} records for store {store_id}")))
}

#[async_trait::async_trait]
impl PartyStore for InMemoryPartyStore {
    async fn find_store_by_phone(&self, phone_number: &str) -> Result<Option<Store>, StoreError> {
        let state = self.read()?;
        Ok(state
            .stores
            .iter()
            .find(|s| s.phone_number == phone_number)
            .cloned())
    }

    async fn resolve_customer(&self, seed: NewCustomer) -> Result<Customer, StoreError> {
        let mut state = self.write()?;
        if let Some(existing) = latest_by_phone(&state.customers, &seed.phone_number) {
            return Ok(existing.clone());
        }
        let customer = seed.into_customer(Utc::now());
        state.customers.push(customer.clone());
        Ok(customer)
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let state = self.read()?;
        Ok(by_id(&state.customers, id).cloned())
    }

    async fn find_customer_store_info(
        &self,
        store_id: StoreId,
        customer_id: CustomerId,
    ) -> Result<Option<CustomerStoreInfo>, StoreError> {
        let state = self.read()?;
        Ok(state
            .store_infos
            .iter()
            .find(|i| i.store_id == store_id && i.customer_id == customer_id)
            .cloned())
    }

    async fn insert_customer_store_info(
        &self,
        info: CustomerStoreInfo,
    ) -> Result<CustomerStoreInfo, StoreError> {
        let mut state = self.write()?;
        if state
            .store_infos
            .iter()
            .any(|i| i.store_id == info.store_id && i.customer_id == info.customer_id)
        {
            return Err(StoreError::Duplicate(format!(
                "customer {} already linked to store {}",
                info.customer_id, info.store_id
            )));
        }
        state.store_infos.push(info.clone());
        Ok(info)
    }

    async fn get_customer_store_info(
        &self,
        store_id: StoreId,
        id: PartyId,
    ) -> Result<Option<CustomerStoreInfo>, StoreError> {
        let state = self.read()?;
        Ok(state
            .store_infos
            .iter()
            .find(|i| i.id == id && i.store_id == store_id)
            .cloned())
    }

    async fn update_customer_store_info(
        &self,
        id: PartyId,
        patch: &PartyPatch,
    ) -> Result<Option<CustomerStoreInfo>, StoreError> {
        let mut state = self.write()?;
        patch_row(&mut state.store_infos, id, patch)
    }

    async fn list_customer_store_infos(
        &self,
        store_id: StoreId,
        query: &ListQuery,
    ) -> Result<Page<ListedCustomer>, StoreError> {
        let state = self.read()?;
        let page = page_rows(&state.store_infos, store_id, PartyType::Customer, query);
        Ok(page.map(|info| ListedCustomer {
            customer: by_id(&state.customers, info.customer_id).cloned(),
            store_info: info.clone(),
        }))
    }

    async fn insert_supplier(&self, supplier: Supplier) -> Result<Supplier, StoreError> {
        let mut state = self.write()?;
        if by_id(&state.suppliers, supplier.id).is_some() {
            return Err(StoreError::Duplicate(format!(
                "supplier {} already exists",
                supplier.id
            )));
        }
        state.suppliers.push(supplier.clone());
        Ok(supplier)
    }

    async fn get_supplier(
        &self,
        store_id: StoreId,
        id: PartyId,
    ) -> Result<Option<Supplier>, StoreError> {
        let state = self.read()?;
        Ok(state
            .suppliers
            .iter()
            .find(|s| s.id == id && s.store_id == store_id)
            .cloned())
    }

    async fn update_supplier(
        &self,
        id: PartyId,
        patch: &PartyPatch,
    ) -> Result<Option<Supplier>, StoreError> {
        let mut state = self.write()?;
        patch_row(&mut state.suppliers, id, patch)
    }

    async fn list_suppliers(
        &self,
        store_id: StoreId,
        query: &ListQuery,
    ) -> Result<Page<Supplier>, StoreError> {
        let state = self.read()?;
        let page = page_rows(&state.suppliers, store_id, PartyType::Supplier, query);
        Ok(page.map(|supplier| supplier.clone()))
    }

    async fn balance_totals(
        &self,
        party_type: PartyType,
        store_id: StoreId,
    ) -> Result<BalanceTotals, StoreError> {
        let state = self.read()?;
        match party_type {
            PartyType::Customer => totals_or_empty(&state.store_infos, party_type, store_id),
            PartyType::Supplier => totals_or_empty(&state.suppliers, party_type, store_id),
        }
    }

    async fn soft_delete(
        &self,
        party_type: PartyType,
        store_id: StoreId,
        ids: &[PartyId],
    ) -> Result<u64, StoreError> {
        let mut state = self.write()?;
        let now = Utc::now();
        let mut flagged = 0;
        match party_type {
            PartyType::Customer => {
                for info in state
                    .store_infos
                    .iter_mut()
                    .filter(|i| i.store_id == store_id && ids.contains(&i.id))
                {
                    info.is_deleted = true;
                    info.updated_at = now;
                    flagged += 1;
                }
            }
            PartyType::Supplier => {
                for supplier in state
                    .suppliers
                    .iter_mut()
                    .filter(|s| s.store_id == store_id && ids.contains(&s.id))
                {
                    supplier.is_deleted = true;
                    supplier.updated_at = now;
                    flagged += 1;
                }
            }
        }
        Ok(flagged)
    }
}
