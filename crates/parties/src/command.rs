use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

use partyhub_core::{CustomerId, PartyId, StoreId};

use crate::address::{AddressPair, address_book};
use crate::gst::GstType;
use crate::party::{CustomerStoreInfo, NewCustomer, PartyType, Supplier};

/// Create a customer or supplier party in a store.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateParty {
    pub party_type: PartyType,
    pub store_id: StoreId,
    pub name: String,
    pub phone_number: String,
    pub gst_type: GstType,
    pub address: Option<AddressPair>,
    pub trade_name: Option<String>,
    pub email: Option<String>,
    pub gstin: Option<String>,
    /// Opening balance; defaults to zero.
    pub balance: Option<f64>,
}

impl CreateParty {
    /// Seed for the global identity when this phone number has never been seen.
    pub fn customer_seed(&self) -> NewCustomer {
        NewCustomer {
            phone_number: self.phone_number.clone(),
            name: Some(self.name.clone()),
            email: self.email.clone(),
            trade_name: self.trade_name.clone(),
            gstin: self.gstin.clone(),
            gst_type: Some(self.gst_type),
            addresses: address_book(self.address.clone()),
        }
    }

    pub fn store_info(&self, customer_id: CustomerId, now: DateTime<Utc>) -> CustomerStoreInfo {
        CustomerStoreInfo {
            id: PartyId::new(),
            customer_id,
            store_id: self.store_id,
            cart: None,
            total_spent: 0.0,
            balance: Some(self.balance.unwrap_or(0.0)),
            name: Some(self.name.clone()),
            trade_name: self.trade_name.clone(),
            email: self.email.clone(),
            gstin: self.gstin.clone(),
            gst_type: Some(self.gst_type),
            addresses: address_book(self.address.clone()),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn supplier(&self, supplier_store_id: Option<StoreId>, now: DateTime<Utc>) -> Supplier {
        Supplier {
            id: PartyId::new(),
            store_id: self.store_id,
            phone_number: self.phone_number.clone(),
            name: Some(self.name.clone()),
            trade_name: self.trade_name.clone(),
            email: self.email.clone(),
            balance: Some(self.balance.unwrap_or(0.0)),
            gstin: self.gstin.clone(),
            gst_type: self.gst_type,
            addresses: address_book(self.address.clone()),
            photo_url: None,
            supplier_store_id,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a party record. Only supplied fields are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartyPatch {
    pub name: Option<String>,
    pub trade_name: Option<String>,
    pub email: Option<String>,
    pub gstin: Option<String>,
    pub gst_type: Option<GstType>,
    pub balance: Option<f64>,
    /// Replaces the whole address book when present.
    pub address: Option<AddressPair>,
}

impl PartyPatch {
    /// Render the patch as a partial document (camelCase keys, supplied fields only).
    pub fn to_document(&self, now: DateTime<Utc>) -> serde_json::Result<Map<String, JsonValue>> {
        let mut doc = Map::new();
        if let Some(name) = &self.name {
            doc.insert("name".into(), JsonValue::from(name.as_str()));
        }
        if let Some(trade_name) = &self.trade_name {
            doc.insert("tradeName".into(), JsonValue::from(trade_name.as_str()));
        }
        if let Some(email) = &self.email {
            doc.insert("email".into(), JsonValue::from(email.as_str()));
        }
        if let Some(gstin) = &self.gstin {
            doc.insert("gstin".into(), JsonValue::from(gstin.as_str()));
        }
        if let Some(gst_type) = self.gst_type {
            doc.insert("gstType".into(), JsonValue::from(gst_type.as_str()));
        }
        if let Some(balance) = self.balance {
            doc.insert("balance".into(), JsonValue::from(balance));
        }
        if let Some(pair) = &self.address {
            let book = address_book(Some(pair.clone()));
            doc.insert("addresses".into(), serde_json::to_value(book)?);
        }
        doc.insert("updatedAt".into(), JsonValue::from(now.to_rfc3339()));
        Ok(doc)
    }

    /// Shallow-merge the patch document over a record.
    pub fn merge_into<T>(&self, record: &T, now: DateTime<Utc>) -> serde_json::Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut doc = match serde_json::to_value(record)? {
            JsonValue::Object(map) => map,
            other => return serde_json::from_value(other),
        };
        doc.extend(self.to_document(now)?);
        serde_json::from_value(JsonValue::Object(doc))
    }
}

/// Flag a set of store-scoped party records as deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftDeleteParties {
    pub party_type: PartyType,
    pub store_id: StoreId,
    pub party_ids: Vec<PartyId>,
}
