use serde::{Deserialize, Serialize};

/// A postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub state: String,
    pub pin_code: String,
}

/// Shipping address plus an optional distinct billing address.
///
/// `name`, `phone_number` and `kind` are denormalized labels carried with the pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressPair {
    pub shipping: Address,
    pub billing_same_as_shipping: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl AddressPair {
    /// Drop the billing address when billing mirrors shipping.
    pub fn normalized(mut self) -> Self {
        if self.billing_same_as_shipping {
            self.billing = None;
        }
        self
    }
}

/// Address book as stored on a record: at most the single normalized pair supplied.
pub fn address_book(pair: Option<AddressPair>) -> Vec<AddressPair> {
    pair.map(AddressPair::normalized).into_iter().collect()
}
