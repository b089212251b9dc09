//! Domain models for the storefront.
//!
//! These are the validated shapes handed to route handlers and serialized to
//! the UI (camelCase JSON). Stored document layouts live next to their
//! repositories in `crate::db`.

pub mod address;
pub mod chat;
pub mod faq;
pub mod order;
pub mod product;
pub mod review;
pub mod session;
pub mod user;
pub mod wallet;

pub use address::{Address, AddressInput, AddressQuery};
pub use chat::{ChatMessage, ChatThread};
pub use faq::{Faq, FaqCategory, FaqGroup};
pub use order::{Order, OrderItem};
pub use product::{Product, ProductFilter, ProductSort};
pub use review::{
    NewReview, ProductReviews, Review, ReviewSummary, ReviewUpdate, ReviewableOrder,
};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{ProfileUpdate, User};
pub use wallet::{Receipt, Transaction, Wallet};
