//! Help center service.

use tracing::instrument;

use crate::backend::Backend;
use crate::db::{FaqRepository, RepositoryError};
use crate::models::faq::OTHER_CATEGORY;
use crate::models::{Faq, FaqCategory, FaqGroup};

/// Help center service.
pub struct FaqService<'a> {
    faqs: FaqRepository<'a>,
}

impl<'a> FaqService<'a> {
    /// Create a new FAQ service.
    #[must_use]
    pub fn new(backend: &'a Backend) -> Self {
        Self {
            faqs: FaqRepository::new(backend.documents.as_ref()),
        }
    }

    /// Categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<FaqCategory>, RepositoryError> {
        self.faqs.list_categories().await
    }

    /// FAQs in display order, optionally limited to one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_faqs(&self, category: Option<&str>) -> Result<Vec<Faq>, RepositoryError> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        self.faqs.list(category).await
    }

    /// FAQs whose question or answer contains `term`, ignoring case.
    ///
    /// A blank term returns every FAQ.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<Faq>, RepositoryError> {
        let needle = term.trim().to_lowercase();
        let mut faqs = self.faqs.list(None).await?;
        if !needle.is_empty() {
            faqs.retain(|faq| faq.matches(&needle));
        }
        Ok(faqs)
    }

    /// FAQs grouped under their categories, in category order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if a query fails.
    #[instrument(skip(self))]
    pub async fn grouped(&self) -> Result<Vec<FaqGroup>, RepositoryError> {
        let categories = self.faqs.list_categories().await?;
        let faqs = self.faqs.list(None).await?;
        Ok(group_faqs(&categories, faqs))
    }
}

/// Assign each FAQ to the category it names (by name or ID).
///
/// Empty categories are left out; unmatched FAQs go to a trailing
/// `OTHER_CATEGORY` group.
fn group_faqs(categories: &[FaqCategory], faqs: Vec<Faq>) -> Vec<FaqGroup> {
    let mut groups: Vec<FaqGroup> = categories
        .iter()
        .map(|c| FaqGroup {
            category: c.name.clone(),
            faqs: Vec::new(),
        })
        .collect();
    let mut other = Vec::new();

    for faq in faqs {
        let slot = categories
            .iter()
            .position(|c| c.name == faq.category || c.id.as_str() == faq.category);
        match slot.and_then(|i| groups.get_mut(i)) {
            Some(group) => group.faqs.push(faq),
            None => other.push(faq),
        }
    }

    groups.retain(|g| !g.faqs.is_empty());
    if !other.is_empty() {
        groups.push(FaqGroup {
            category: OTHER_CATEGORY.to_owned(),
            faqs: other,
        });
    }
    groups
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketplace_core::{FaqCategoryId, FaqId};

    use super::*;

    fn faq(id: &str, question: &str, category: &str, order: i64) -> Faq {
        Faq {
            id: FaqId::new(id),
            question: question.into(),
            answer: format!("Answer to {question}"),
            category: category.into(),
            order,
        }
    }

    async fn seeded() -> Backend {
        let backend = Backend::in_memory();
        let repo = FaqRepository::new(backend.documents.as_ref());
        for (id, name, order) in [("ship", "Shipping", 2), ("pay", "Payments", 1), ("empty", "Empty", 3)] {
            repo.put_category(&FaqCategory {
                id: FaqCategoryId::new(id),
                name: name.into(),
                order,
            })
            .await
            .unwrap();
        }
        repo.put(&faq("f1", "How long does delivery take?", "Shipping", 1)).await.unwrap();
        repo.put(&faq("f2", "Which cards are accepted?", "pay", 1)).await.unwrap();
        repo.put(&faq("f3", "Can I change my username?", "Account", 1)).await.unwrap();
        repo.put(&faq("f4", "Do you ship abroad?", "Shipping", 0)).await.unwrap();
        backend
    }

    #[tokio::test]
    async fn test_grouped_follows_category_order() {
        let backend = seeded().await;
        let groups = FaqService::new(&backend).grouped().await.unwrap();

        let names: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(names, ["Payments", "Shipping", OTHER_CATEGORY]);

        let shipping: Vec<&str> = groups[1].faqs.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(shipping, ["f4", "f1"]);
        assert_eq!(groups[2].faqs[0].id.as_str(), "f3");
    }

    #[tokio::test]
    async fn test_search_matches_question_and_answer() {
        let backend = seeded().await;
        let service = FaqService::new(&backend);

        let hits = service.search("SHIP").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_str(), "f4");

        let hits = service.search("answer to which").await.unwrap();
        assert_eq!(hits[0].id.as_str(), "f2");

        assert_eq!(service.search("  ").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_list_by_category() {
        let backend = seeded().await;
        let faqs = FaqService::new(&backend)
            .list_faqs(Some("Shipping"))
            .await
            .unwrap();
        assert_eq!(faqs.len(), 2);
    }
}
