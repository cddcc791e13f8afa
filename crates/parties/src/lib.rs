//! Parties domain module (customers and suppliers, scoped per store).
//!
//! Records, tax classification, address books, create/update payloads and the list query
//! normalizer. Pure data and rules: no IO, no HTTP, no storage.

pub mod address;
pub mod balance;
pub mod command;
pub mod gst;
pub mod party;
pub mod query;

pub use address::{Address, AddressPair};
pub use balance::BalanceTotals;
pub use command::{CreateParty, PartyPatch, SoftDeleteParties};
pub use gst::{GST_TYPES, GstType, GstTypeInfo};
pub use party::{
    Customer, CustomerParty, CustomerStoreInfo, ListedCustomer, NewCustomer, PartyDetails,
    PartyListItem, PartyRecord, PartyType, SearchQuery, Store, Supplier,
};
pub use query::{
    BalanceFilter, BalanceOp, ListQuery, Page, PageInfo, RawListParams, Sort, SortDirection,
    SortField,
};
