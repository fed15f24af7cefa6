//! Adapters between the outside world's file formats and the domain.

pub mod csv;
