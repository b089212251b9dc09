//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login and password reset
//! - `profile` - Profile edits and avatar upload
//! - `orders` - Order history
//! - `products` - Catalog browsing
//! - `reviews` - Product reviews, eligibility and rating aggregation
//! - `chat` - Support chat with live message subscription
//! - `faq` - Help center content
//! - `addresses` - Address book with a single default
//! - `wallet` - Stored balance and its ledger
//! - `uploads` - Image validation and upload shared by profile and reviews
//!
//! Services borrow the [`Backend`](crate::backend::Backend) for the duration
//! of a request and are cheap to construct per handler call.

pub mod addresses;
pub mod auth;
pub mod chat;
pub mod faq;
pub mod orders;
pub mod products;
pub mod profile;
pub mod reviews;
pub mod uploads;
pub mod wallet;

pub use addresses::{AddressError, AddressService};
pub use auth::{AuthError, AuthService};
pub use chat::{ChatError, ChatService};
pub use faq::FaqService;
pub use orders::OrderService;
pub use products::ProductService;
pub use profile::{ProfileError, ProfileService};
pub use reviews::{ReviewError, ReviewService};
pub use uploads::UploadError;
pub use wallet::{WalletError, WalletService};
