use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use partyhub_core::{CartId, CustomerId, DomainError, Entity, PartyId, StoreId};

use crate::address::AddressPair;
use crate::gst::GstType;

/// Party kind: customer or supplier.
///
/// Selects which records back a party id and which persistence path every operation takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyType {
    Customer,
    Supplier,
}

impl PartyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyType::Customer => "customer",
            PartyType::Supplier => "supplier",
        }
    }
}

impl FromStr for PartyType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(PartyType::Customer),
            "supplier" => Ok(PartyType::Supplier),
            other => Err(DomainError::invalid_enum("type", other)),
        }
    }
}

impl core::fmt::Display for PartyType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A search a customer ran on a storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub search_term: String,
    pub store_id: StoreId,
}

/// Global customer identity, keyed (but not uniquely constrained) by phone number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gstin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst_type: Option<GstType>,
    #[serde(default)]
    pub addresses: Vec<AddressPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub favourite_products: Vec<Uuid>,
    #[serde(default)]
    pub search_queries: Vec<SearchQuery>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Seed for a lazily created customer identity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    pub phone_number: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub trade_name: Option<String>,
    pub gstin: Option<String>,
    pub gst_type: Option<GstType>,
    pub addresses: Vec<AddressPair>,
}

impl NewCustomer {
    pub fn into_customer(self, now: DateTime<Utc>) -> Customer {
        Customer {
            id: CustomerId::new(),
            phone_number: self.phone_number,
            name: self.name,
            email: self.email,
            trade_name: self.trade_name,
            gstin: self.gstin,
            gst_type: self.gst_type,
            addresses: self.addresses,
            photo_url: None,
            last_login: None,
            favourite_products: Vec::new(),
            search_queries: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Per-(customer, store) relationship record: the customer party a store sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStoreInfo {
    pub id: PartyId,
    pub customer_id: CustomerId,
    pub store_id: StoreId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart: Option<CartId>,
    #[serde(default)]
    pub total_spent: f64,
    /// Absent on records written before balances were tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gstin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gst_type: Option<GstType>,
    #[serde(default)]
    pub addresses: Vec<AddressPair>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Store-scoped supplier record. Not deduplicated across stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: PartyId,
    pub store_id: StoreId,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gstin: Option<String>,
    pub gst_type: GstType,
    #[serde(default)]
    pub addresses: Vec<AddressPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// The supplier's own storefront, when the supplier also sells on the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_store_id: Option<StoreId>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Platform store, looked up by registered phone number. Owned elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: StoreId,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> CustomerId {
        self.id
    }
}

impl Entity for CustomerStoreInfo {
    type Id = PartyId;

    fn id(&self) -> PartyId {
        self.id
    }
}

impl Entity for Supplier {
    type Id = PartyId;

    fn id(&self) -> PartyId {
        self.id
    }
}

impl Entity for Store {
    type Id = StoreId;

    fn id(&self) -> StoreId {
        self.id
    }
}

/// A freshly created customer party: the store-info record plus the identity's phone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerParty {
    #[serde(flatten)]
    pub store_info: CustomerStoreInfo,
    pub phone_number: String,
}

/// A customer-store-info row with its customer identity populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedCustomer {
    #[serde(flatten)]
    pub store_info: CustomerStoreInfo,
    pub customer: Option<Customer>,
}

/// Result of a create or update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PartyRecord {
    Customer(CustomerParty),
    StoreInfo(CustomerStoreInfo),
    Supplier(Supplier),
}

/// Result of a get-by-id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PartyDetails {
    #[serde(rename_all = "camelCase")]
    Customer {
        customer: Option<Customer>,
        store_info: CustomerStoreInfo,
    },
    Supplier(Supplier),
}

/// One row of a party listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PartyListItem {
    Customer(ListedCustomer),
    Supplier(Supplier),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn party_type_parses_only_known_tags() {
        assert_eq!("customer".parse::<PartyType>().unwrap(), PartyType::Customer);
        assert_eq!("supplier".parse::<PartyType>().unwrap(), PartyType::Supplier);

        let err = "vendor".parse::<PartyType>().unwrap_err();
        assert_eq!(err, DomainError::invalid_enum("type", "vendor"));
    }

    #[test]
    fn absent_balance_stays_absent_in_documents() {
        let now = Utc::now();
        let info = CustomerStoreInfo {
            id: PartyId::new(),
            customer_id: CustomerId::new(),
            store_id: StoreId::new(),
            cart: None,
            total_spent: 0.0,
            balance: None,
            name: Some("Asha".to_string()),
            trade_name: None,
            email: None,
            gstin: None,
            gst_type: Some(GstType::Consumer),
            addresses: Vec::new(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        let doc = serde_json::to_value(&info).unwrap();
        assert!(doc.get("balance").is_none());
        assert_eq!(doc["gstType"], "CONSUMER");

        let back: CustomerStoreInfo = serde_json::from_value(doc).unwrap();
        assert_eq!(back.balance, None);
    }

    #[test]
    fn created_customer_party_flattens_phone_number() {
        let now = Utc::now();
        let party = CustomerParty {
            store_info: CustomerStoreInfo {
                id: PartyId::new(),
                customer_id: CustomerId::new(),
                store_id: StoreId::new(),
                cart: None,
                total_spent: 0.0,
                balance: Some(0.0),
                name: Some("Asha".to_string()),
                trade_name: None,
                email: None,
                gstin: None,
                gst_type: Some(GstType::Consumer),
                addresses: Vec::new(),
                is_deleted: false,
                created_at: now,
                updated_at: now,
            },
            phone_number: "+919800000001".to_string(),
        };

        let json = serde_json::to_value(&party).unwrap();
        assert_eq!(json["phoneNumber"], "+919800000001");
        assert_eq!(json["name"], "Asha");
        assert!(json.get("storeInfo").is_none());
    }
}
