//! Storefront services for a shop that settles orders in an SPL token.
//!
//! The checkout payment flow lives in [`application::payment`]; the rest of
//! the crate is the catalog, cart, order and settings plumbing around it.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
