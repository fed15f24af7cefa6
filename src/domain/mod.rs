//! Domain types and the ports the storefront talks to the outside world through.

pub mod address;
pub mod amount;
pub mod cart;
pub mod catalog;
pub mod locale;
pub mod order;
pub mod payment;
pub mod ports;
pub mod settings;
