//! FAQ repository (`faqs`, `faqCategories`).

use serde::{Deserialize, Serialize};

use marketplace_core::{FaqCategoryId, FaqId};

use super::{RepositoryError, collections, decode, to_fields};
use crate::backend::{CollectionPath, Direction, DocumentSnapshot, DocumentStore, Query};
use crate::models::faq::{Faq, FaqCategory};

#[derive(Debug, Serialize, Deserialize)]
struct FaqDocument {
    question: String,
    #[serde(default)]
    answer: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    order: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct CategoryDocument {
    name: String,
    #[serde(default)]
    order: i64,
}

fn into_faq(snapshot: &DocumentSnapshot) -> Result<Faq, RepositoryError> {
    let doc: FaqDocument = decode(snapshot)?;
    Ok(Faq {
        id: FaqId::new(snapshot.id.clone()),
        question: doc.question,
        answer: doc.answer,
        category: doc.category,
        order: doc.order,
    })
}

fn into_category(snapshot: &DocumentSnapshot) -> Result<FaqCategory, RepositoryError> {
    let doc: CategoryDocument = decode(snapshot)?;
    Ok(FaqCategory {
        id: FaqCategoryId::new(snapshot.id.clone()),
        name: doc.name,
        order: doc.order,
    })
}

/// Repository for help center content.
pub struct FaqRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> FaqRepository<'a> {
    /// Create a new FAQ repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    fn faqs() -> CollectionPath {
        CollectionPath::root(collections::FAQS)
    }

    fn categories() -> CollectionPath {
        CollectionPath::root(collections::FAQ_CATEGORIES)
    }

    /// Categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<FaqCategory>, RepositoryError> {
        let query = Query::new(Self::categories()).order_by("order", Direction::Ascending);
        self.store
            .query(&query)
            .await?
            .iter()
            .map(into_category)
            .collect()
    }

    /// FAQs in display order, optionally restricted to one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    pub async fn list(&self, category: Option<&str>) -> Result<Vec<Faq>, RepositoryError> {
        let mut query = Query::new(Self::faqs());
        if let Some(category) = category {
            query = query.where_eq("category", category);
        }
        let query = query.order_by("order", Direction::Ascending);

        self.store.query(&query).await?.iter().map(into_faq).collect()
    }

    /// Create or replace a category under its own ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the write fails.
    pub async fn put_category(&self, category: &FaqCategory) -> Result<(), RepositoryError> {
        let document = CategoryDocument {
            name: category.name.clone(),
            order: category.order,
        };
        self.store
            .set(
                &Self::categories().doc(category.id.as_str()),
                to_fields(&document)?,
            )
            .await?;
        Ok(())
    }

    /// Create or replace an FAQ under its own ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the write fails.
    pub async fn put(&self, faq: &Faq) -> Result<(), RepositoryError> {
        let document = FaqDocument {
            question: faq.question.clone(),
            answer: faq.answer.clone(),
            category: faq.category.clone(),
            order: faq.order,
        };
        self.store
            .set(&Self::faqs().doc(faq.id.as_str()), to_fields(&document)?)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryDocumentStore;

    fn faq(id: &str, category: &str, order: i64) -> Faq {
        Faq {
            id: FaqId::new(id),
            question: format!("Question {id}?"),
            answer: "Answer.".into(),
            category: category.into(),
            order,
        }
    }

    #[tokio::test]
    async fn test_list_is_ordered() {
        let store = MemoryDocumentStore::new();
        let repo = FaqRepository::new(&store);
        repo.put(&faq("a", "Shipping", 2)).await.unwrap();
        repo.put(&faq("b", "Shipping", 1)).await.unwrap();
        repo.put(&faq("c", "Returns", 0)).await.unwrap();

        let shipping = repo.list(Some("Shipping")).await.unwrap();
        let ids: Vec<&str> = shipping.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(repo.list(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_put_is_idempotent() {
        let store = MemoryDocumentStore::new();
        let repo = FaqRepository::new(&store);
        let category = FaqCategory {
            id: FaqCategoryId::new("shipping"),
            name: "Shipping".into(),
            order: 1,
        };
        repo.put_category(&category).await.unwrap();
        repo.put_category(&category).await.unwrap();

        assert_eq!(repo.list_categories().await.unwrap(), vec![category]);
    }
}
