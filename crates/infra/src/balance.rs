//! Balance aggregation per party family.

use tracing::{debug, instrument};

use partyhub_core::StoreId;
use partyhub_parties::{BalanceTotals, PartyType};

use crate::store::{PartyStore, StoreError};

/// Sums negative and positive balances of one family in one store.
///
/// Both families share the same contract; the gateway picks the collection.
#[derive(Debug, Clone)]
pub struct BalanceAggregator<S> {
    store: S,
}

impl<S> BalanceAggregator<S>
where
    S: PartyStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip(self), fields(store_id = %store_id, party_type = %party_type), err)]
    pub async fn total_balance(
        &self,
        party_type: PartyType,
        store_id: StoreId,
    ) -> Result<BalanceTotals, StoreError> {
        let totals = self.store.balance_totals(party_type, store_id).await?;
        debug!(
            negative = totals.total_balance_less_than_zero,
            positive = totals.total_balance_greater_than_zero,
            "balance totals computed"
        );
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryPartyStore;
    use chrono::Utc;
    use partyhub_core::{CustomerId, PartyId};
    use partyhub_parties::CustomerStoreInfo;

    fn info(store_id: StoreId, balance: Option<f64>) -> CustomerStoreInfo {
        let now = Utc::now();
        CustomerStoreInfo {
            id: PartyId::new(),
            customer_id: CustomerId::new(),
            store_id,
            cart: None,
            total_spent: 0.0,
            balance,
            name: None,
            trade_name: None,
            email: None,
            gstin: None,
            gst_type: None,
            addresses: Vec::new(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn customer_totals_ignore_other_stores() {
        let store = InMemoryPartyStore::arc();
        let shop = StoreId::new();
        for b in [-50.0, -10.0, 0.0, 20.0, 30.0] {
            store.insert_customer_store_info(info(shop, Some(b))).await.unwrap();
        }
        store
            .insert_customer_store_info(info(StoreId::new(), Some(-1000.0)))
            .await
            .unwrap();

        let aggregator = BalanceAggregator::new(store);
        let totals = aggregator
            .total_balance(PartyType::Customer, shop)
            .await
            .unwrap();
        assert_eq!(totals.total_balance_less_than_zero, -60.0);
        assert_eq!(totals.total_balance_greater_than_zero, 50.0);

        let err = aggregator
            .total_balance(PartyType::Supplier, shop)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NoRecords(_)));
    }
}
