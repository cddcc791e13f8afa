//! `partyhub-core`: shared building blocks for the parties service.
//!
//! Identifiers, the domain error model and the entity trait. No IO lives here.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::DomainError;
pub use id::{CartId, CustomerId, PartyId, StoreId};
