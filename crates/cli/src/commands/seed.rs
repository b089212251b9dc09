//! Load fixture data into the backend.
//!
//! Orders and catalog products are written by systems outside the storefront,
//! so a fresh project needs fixtures before the account and review flows have
//! anything to show. The file format mirrors the stored documents:
//!
//! ```yaml
//! faqCategories:
//!   - { id: shipping, name: Shipping, order: 1 }
//! faqs:
//!   - id: ship-time
//!     question: How long does shipping take?
//!     answer: Three to five business days.
//!     category: Shipping
//!     order: 1
//! products:
//!   - id: p1
//!     name: Trail Mug
//!     price: 12.5
//!     category: Kitchen
//!     stock: 40
//! orders:
//!   - id: o1
//!     userId: u1
//!     orderNumber: MP-1001
//!     status: delivered
//!     items:
//!       - { productId: p1, name: Trail Mug, price: 12.5, quantity: 2 }
//! ```

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info};

use marketplace_core::{FaqCategoryId, FaqId, OrderId, OrderStatus, ProductId, UserId};
use marketplace_storefront::backend::Backend;
use marketplace_storefront::db::{self, FaqRepository, OrderRepository, ProductRepository};
use marketplace_storefront::models::{Faq, FaqCategory, Order, OrderItem, Product};

use super::CliError;

/// Top-level fixture file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedFile {
    pub faq_categories: Vec<SeedCategory>,
    pub faqs: Vec<SeedFaq>,
    pub products: Vec<SeedProduct>,
    pub orders: Vec<SeedOrder>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub id: FaqCategoryId,
    pub name: String,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Deserialize)]
pub struct SeedFaq {
    pub id: FaqId,
    pub question: String,
    pub answer: String,
    /// Category name or ID; anything else lands under "Other".
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub seller_id: Option<UserId>,
    #[serde(default)]
    pub stock: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedOrder {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_number: String,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<SeedOrderItem>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedOrderItem {
    pub product_id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

/// What a seeding run wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub faqs: usize,
    pub products: usize,
    pub orders: usize,
}

/// Seed fixtures from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a backend write fails.
pub async fn run(file_path: &str, validate_only: bool) -> Result<(), CliError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading fixtures from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io {
            path: file_path.to_owned(),
            source,
        })?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    info!(
        categories = seed.faq_categories.len(),
        faqs = seed.faqs.len(),
        products = seed.products.len(),
        orders = seed.orders.len(),
        "Parsed fixtures"
    );

    let errors = validate_seed(&seed);
    if !errors.is_empty() {
        error!("Fixture validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CliError::Invalid(errors.len()));
    }

    info!("Fixtures validated successfully");
    if validate_only {
        return Ok(());
    }

    let backend = super::connect()?;
    let summary = apply(&backend, &seed).await?;

    info!(
        categories = summary.categories,
        faqs = summary.faqs,
        products = summary.products,
        orders = summary.orders,
        "Seeding complete"
    );

    Ok(())
}

/// Check a fixture file for problems that would produce broken documents.
///
/// Returns one message per problem; an empty list means the file is usable.
#[must_use]
pub fn validate_seed(seed: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();

    let mut category_ids = HashSet::new();
    for category in &seed.faq_categories {
        if !category_ids.insert(category.id.as_str()) {
            errors.push(format!("duplicate FAQ category id: {}", category.id));
        }
        if category.name.trim().is_empty() {
            errors.push(format!("FAQ category {} has no name", category.id));
        }
    }

    let mut faq_ids = HashSet::new();
    for faq in &seed.faqs {
        if !faq_ids.insert(faq.id.as_str()) {
            errors.push(format!("duplicate FAQ id: {}", faq.id));
        }
        if faq.question.trim().is_empty() || faq.answer.trim().is_empty() {
            errors.push(format!("FAQ {} needs both a question and an answer", faq.id));
        }
    }

    let mut product_ids = HashSet::new();
    for product in &seed.products {
        if !product_ids.insert(product.id.as_str()) {
            errors.push(format!("duplicate product id: {}", product.id));
        }
        if product.name.trim().is_empty() {
            errors.push(format!("product {} has no name", product.id));
        }
        if product.price.is_sign_negative() {
            errors.push(format!("product {} has a negative price", product.id));
        }
    }

    let mut order_ids = HashSet::new();
    for order in &seed.orders {
        if !order_ids.insert(order.id.as_str()) {
            errors.push(format!("duplicate order id: {}", order.id));
        }
        if order.order_number.trim().is_empty() {
            errors.push(format!("order {} has no order number", order.id));
        }
        for item in &order.items {
            if !product_ids.contains(item.product_id.as_str()) {
                errors.push(format!(
                    "order {} references unknown product {}",
                    order.id, item.product_id
                ));
            }
            if item.quantity == 0 {
                errors.push(format!(
                    "order {} has a zero quantity for {}",
                    order.id, item.product_id
                ));
            }
            if item.price.is_sign_negative() {
                errors.push(format!(
                    "order {} has a negative price for {}",
                    order.id, item.product_id
                ));
            }
        }
    }

    errors
}

/// Write every fixture, replacing documents with the same IDs.
///
/// Products start unrated; ratings come from reviews.
///
/// # Errors
///
/// Returns `CliError::Repository` on the first failed write.
pub async fn apply(backend: &Backend, seed: &SeedFile) -> Result<SeedSummary, CliError> {
    let faqs = FaqRepository::new(backend.documents.as_ref());
    let products = ProductRepository::new(backend.documents.as_ref());
    let orders = OrderRepository::new(backend.documents.as_ref());
    let now = db::now();

    for category in &seed.faq_categories {
        faqs.put_category(&FaqCategory {
            id: category.id.clone(),
            name: category.name.trim().to_owned(),
            order: category.order,
        })
        .await?;
    }

    for faq in &seed.faqs {
        faqs.put(&Faq {
            id: faq.id.clone(),
            question: faq.question.trim().to_owned(),
            answer: faq.answer.trim().to_owned(),
            category: faq.category.trim().to_owned(),
            order: faq.order,
        })
        .await?;
    }

    for product in &seed.products {
        products
            .put(&Product {
                id: product.id.clone(),
                name: product.name.trim().to_owned(),
                description: product.description.clone(),
                price: product.price,
                category: product.category.trim().to_owned(),
                images: product.images.clone(),
                seller_id: product.seller_id.clone(),
                stock: product.stock,
                rating: 0.0,
                review_count: 0,
                created_at: now,
            })
            .await?;
    }

    for order in &seed.orders {
        orders.put(&into_order(order, now)).await?;
    }

    Ok(SeedSummary {
        categories: seed.faq_categories.len(),
        faqs: seed.faqs.len(),
        products: seed.products.len(),
        orders: seed.orders.len(),
    })
}

fn into_order(order: &SeedOrder, now: DateTime<Utc>) -> Order {
    let items: Vec<OrderItem> = order
        .items
        .iter()
        .map(|item| OrderItem {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity,
            image: item.image.clone(),
        })
        .collect();
    let total_amount = items
        .iter()
        .map(|item| item.price * Decimal::from(item.quantity))
        .sum();

    Order {
        id: order.id.clone(),
        user_id: order.user_id.clone(),
        order_number: order.order_number.clone(),
        status: order.status,
        items,
        total_amount,
        created_at: order.created_at.unwrap_or(now),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use marketplace_storefront::models::ProductFilter;
    use marketplace_storefront::services::{FaqService, OrderService, ProductService};

    const FIXTURE: &str = r"
faqCategories:
  - { id: shipping, name: Shipping, order: 1 }
  - { id: returns, name: Returns, order: 2 }
faqs:
  - id: ship-time
    question: How long does shipping take?
    answer: Three to five business days.
    category: Shipping
    order: 1
  - id: refund
    question: How do refunds work?
    answer: Refunds go back to your wallet.
    category: returns
    order: 1
products:
  - id: p1
    name: Trail Mug
    price: 12.5
    category: Kitchen
    stock: 40
  - id: p2
    name: Camp Stove
    price: 80
    category: Outdoor
orders:
  - id: o1
    userId: u1
    orderNumber: MP-1001
    status: delivered
    items:
      - { productId: p1, name: Trail Mug, price: 12.5, quantity: 2 }
      - { productId: p2, name: Camp Stove, price: 80, quantity: 1 }
";

    #[test]
    fn test_parse_fixture() {
        let seed: SeedFile = serde_yaml::from_str(FIXTURE).unwrap();
        assert_eq!(seed.faq_categories.len(), 2);
        assert_eq!(seed.faqs.len(), 2);
        assert_eq!(seed.products.len(), 2);
        assert_eq!(seed.orders[0].status, OrderStatus::Delivered);
        assert_eq!(seed.orders[0].items[0].price, Decimal::new(125, 1));
        assert!(validate_seed(&seed).is_empty());
    }

    #[test]
    fn test_empty_file_is_valid() {
        let seed: SeedFile = serde_yaml::from_str("{}").unwrap();
        assert!(validate_seed(&seed).is_empty());
    }

    #[test]
    fn test_validate_reports_problems() {
        let seed: SeedFile = serde_yaml::from_str(
            r"
products:
  - { id: p1, name: Mug, price: 5 }
  - { id: p1, name: '', price: -1 }
orders:
  - id: o1
    userId: u1
    orderNumber: ''
    items:
      - { productId: missing, name: Ghost, price: 1, quantity: 0 }
",
        )
        .unwrap();

        let errors = validate_seed(&seed);
        assert!(errors.iter().any(|e| e.contains("duplicate product id: p1")));
        assert!(errors.iter().any(|e| e.contains("has no name")));
        assert!(errors.iter().any(|e| e.contains("negative price")));
        assert!(errors.iter().any(|e| e.contains("no order number")));
        assert!(errors.iter().any(|e| e.contains("unknown product missing")));
        assert!(errors.iter().any(|e| e.contains("zero quantity")));
    }

    #[tokio::test]
    async fn test_apply_writes_documents() {
        let backend = Backend::in_memory();
        let seed: SeedFile = serde_yaml::from_str(FIXTURE).unwrap();

        let summary = apply(&backend, &seed).await.unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                categories: 2,
                faqs: 2,
                products: 2,
                orders: 1,
            }
        );

        let groups = FaqService::new(&backend).grouped().await.unwrap();
        let names: Vec<_> = groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(names, ["Shipping", "Returns"]);

        let products = ProductService::new(&backend)
            .list_products(&ProductFilter::default())
            .await
            .unwrap();
        assert_eq!(products.len(), 2);
        assert!(products.iter().all(|p| p.review_count == 0));

        let order = OrderService::new(&backend)
            .get_order(&UserId::new("u1"), &OrderId::new("o1"))
            .await
            .unwrap();
        assert_eq!(order.total_amount, Decimal::new(105, 0));
        assert_eq!(order.items.len(), 2);
    }

    #[tokio::test]
    async fn test_apply_is_repeatable() {
        let backend = Backend::in_memory();
        let seed: SeedFile = serde_yaml::from_str(FIXTURE).unwrap();

        apply(&backend, &seed).await.unwrap();
        apply(&backend, &seed).await.unwrap();

        let faqs = FaqService::new(&backend).list_faqs(None).await.unwrap();
        assert_eq!(faqs.len(), 2);
    }
}
