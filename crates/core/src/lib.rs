//! Vietmarket Core - Shared types library.
//!
//! This crate provides the domain primitives used across all Vietmarket
//! components:
//! - `cart` - Shopping-cart aggregation and checkout engine
//! - `integration-tests` - Workspace-level behavioral tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! persistence. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, decimal quantities, and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
