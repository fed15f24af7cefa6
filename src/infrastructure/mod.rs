//! Adapters for the ports in [`crate::domain::ports`].

pub mod gecko_price;
pub mod in_memory;
pub mod rest_backend;
pub mod solana_rpc;
pub mod watch_wallet;
