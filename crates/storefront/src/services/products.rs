//! Catalog browsing service.

use std::cmp::Ordering;

use tracing::instrument;

use marketplace_core::ProductId;

use crate::backend::Backend;
use crate::db::{ProductRepository, RepositoryError};
use crate::models::{Product, ProductFilter, ProductSort};

/// Catalog service.
pub struct ProductService<'a> {
    products: ProductRepository<'a>,
}

impl<'a> ProductService<'a> {
    /// Create a new product service.
    #[must_use]
    pub fn new(backend: &'a Backend) -> Self {
        Self {
            products: ProductRepository::new(backend.documents.as_ref()),
        }
    }

    /// Products matching `filter`, in the requested order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let category = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let mut products = self.products.list(category).await?;

        if let Some(needle) = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
        {
            products.retain(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            });
        }

        sort_products(&mut products, filter.sort);
        Ok(products)
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        self.products.get(id).await?.ok_or(RepositoryError::NotFound)
    }
}

fn sort_products(products: &mut [Product], sort: ProductSort) {
    products.sort_by(|a, b| {
        let primary = match sort {
            ProductSort::Newest => b.created_at.cmp(&a.created_at),
            ProductSort::PriceAsc => a.price.cmp(&b.price),
            ProductSort::PriceDesc => b.price.cmp(&a.price),
            ProductSort::Rating => b
                .rating
                .partial_cmp(&a.rating)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.review_count.cmp(&a.review_count)),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    });
}
