//! Marketplace Core - Shared types library.
//!
//! This crate provides common types used across all marketplace components:
//! - `storefront` - Customer-facing API over the backend-as-a-service
//! - `cli` - Command-line tools for seeding and inspecting backend data
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no backend access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for document IDs, emails, ratings, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
