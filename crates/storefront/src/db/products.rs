//! Product repository (`products`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use marketplace_core::{ProductId, UserId};

use super::{RepositoryError, collections, decode, fields, timestamp, to_fields};
use crate::backend::{CollectionPath, DocumentSnapshot, DocumentStore, Query};
use crate::models::product::Product;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDocument {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    #[serde(default)]
    category: String,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    seller_id: Option<String>,
    #[serde(default)]
    stock: u32,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    review_count: u32,
    #[serde(with = "timestamp")]
    created_at: DateTime<Utc>,
}

fn into_product(snapshot: &DocumentSnapshot) -> Result<Product, RepositoryError> {
    let doc: ProductDocument = decode(snapshot)?;
    Ok(Product {
        id: ProductId::new(snapshot.id.clone()),
        name: doc.name,
        description: doc.description,
        price: doc.price,
        category: doc.category,
        images: doc.images,
        seller_id: doc.seller_id.map(UserId::new),
        stock: doc.stock,
        rating: doc.rating,
        review_count: doc.review_count,
        created_at: doc.created_at,
    })
}

/// Repository for catalog products.
pub struct ProductRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    fn collection() -> CollectionPath {
        CollectionPath::root(collections::PRODUCTS)
    }

    /// List products, optionally restricted to one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    pub async fn list(&self, category: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
        let mut query = Query::new(Self::collection());
        if let Some(category) = category {
            query = query.where_eq("category", category);
        }

        self.store
            .query(&query)
            .await?
            .iter()
            .map(into_product)
            .collect()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the read fails.
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        match self.store.get(&Self::collection().doc(id.as_str())).await? {
            Some(snapshot) => Ok(Some(into_product(&snapshot)?)),
            None => Ok(None),
        }
    }

    /// Write the aggregated review statistics.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn set_rating(
        &self,
        id: &ProductId,
        rating: f64,
        review_count: u32,
    ) -> Result<(), RepositoryError> {
        self.store
            .update(
                &Self::collection().doc(id.as_str()),
                fields(json!({ "rating": rating, "reviewCount": review_count })),
            )
            .await
            .map_err(RepositoryError::missing_as_not_found)
    }

    /// Write a product under its own ID (seeding and fixtures).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the write fails.
    pub async fn put(&self, product: &Product) -> Result<(), RepositoryError> {
        let document = ProductDocument {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            category: product.category.clone(),
            images: product.images.clone(),
            seller_id: product.seller_id.as_ref().map(|s| s.as_str().to_owned()),
            stock: product.stock,
            rating: product.rating,
            review_count: product.review_count,
            created_at: product.created_at,
        };
        self.store
            .set(
                &Self::collection().doc(product.id.as_str()),
                to_fields(&document)?,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryDocumentStore;

    fn product(id: &str, category: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: Decimal::new(500, 2),
            category: category.into(),
            images: vec![],
            seller_id: None,
            stock: 3,
            rating: 0.0,
            review_count: 0,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_list_by_category() {
        let store = MemoryDocumentStore::new();
        let products = ProductRepository::new(&store);
        products.put(&product("p1", "kitchen")).await.unwrap();
        products.put(&product("p2", "garden")).await.unwrap();

        assert_eq!(products.list(None).await.unwrap().len(), 2);
        let kitchen = products.list(Some("kitchen")).await.unwrap();
        assert_eq!(kitchen.len(), 1);
        assert_eq!(kitchen[0].id.as_str(), "p1");
    }

    #[tokio::test]
    async fn test_set_rating() {
        let store = MemoryDocumentStore::new();
        let products = ProductRepository::new(&store);
        products.put(&product("p1", "kitchen")).await.unwrap();

        products.set_rating(&ProductId::new("p1"), 4.5, 2).await.unwrap();

        let stored = products.get(&ProductId::new("p1")).await.unwrap().unwrap();
        assert!((stored.rating - 4.5).abs() < f64::EPSILON);
        assert_eq!(stored.review_count, 2);
    }

    #[tokio::test]
    async fn test_set_rating_missing_product() {
        let store = MemoryDocumentStore::new();
        let err = ProductRepository::new(&store)
            .set_rating(&ProductId::new("nope"), 0.0, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }
}
