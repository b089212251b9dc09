//! FAQ types.

use serde::{Deserialize, Serialize};

use marketplace_core::{FaqCategoryId, FaqId};

/// Group name for FAQs whose category does not exist.
pub const OTHER_CATEGORY: &str = "Other";

/// A question and answer (`faqs/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faq {
    pub id: FaqId,
    pub question: String,
    pub answer: String,
    /// Category name or ID.
    pub category: String,
    /// Position within the category.
    pub order: i64,
}

impl Faq {
    /// Case-insensitive substring match over question and answer.
    ///
    /// `needle` must already be lowercase.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        self.question.to_lowercase().contains(needle)
            || self.answer.to_lowercase().contains(needle)
    }
}

/// An FAQ section (`faqCategories/{id}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqCategory {
    pub id: FaqCategoryId,
    pub name: String,
    pub order: i64,
}

/// FAQs of one category, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqGroup {
    pub category: String,
    pub faqs: Vec<Faq>,
}
