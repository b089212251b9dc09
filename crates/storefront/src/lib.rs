//! Marketplace storefront library.
//!
//! Buyer-facing API of a marketplace built on a backend-as-a-service: profile,
//! orders, catalog, wallet, product reviews, support chat, FAQ and address
//! book. The binary in `main.rs` wires configuration, tracing and Sentry
//! around [`routes::app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
