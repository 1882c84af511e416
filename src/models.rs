use serde::{Deserialize, Serialize};

pub const PRODUCT_STATUSES: [&str; 3] = ["available", "sold", "reserved"];

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub condition: String,
    pub category_id: i32,
    pub whatsapp: Option<String>,
    pub location: Option<String>,
    pub observation: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub condition: Option<String>,
    pub category_id: Option<i32>,
    pub whatsapp: Option<String>,
    pub location: Option<String>,
    pub observation: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

/// Storefront filter state, carried as query parameters so the current
/// search and category selection stay shareable as a URL.
#[derive(Debug, Deserialize, Default)]
pub struct CatalogQuery {
    pub search: Option<String>,
    /// Comma-separated category ids, e.g. `categories=2,5`.
    pub categories: Option<String>,
}

impl CatalogQuery {
    pub fn category_ids(&self) -> Vec<i32> {
        self.categories
            .as_deref()
            .unwrap_or("")
            .split(',')
            .filter_map(|part| part.trim().parse().ok())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct AdminProductQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeaturedToggleRequest {
    pub featured: bool,
}

/// "Move the entry at `from` to position `to`" — the abstract form of the
/// admin screen's drag gesture.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user_id: i32,
    pub expires_at: chrono::NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_ids_parses_comma_list() {
        let query = CatalogQuery {
            search: None,
            categories: Some("2,5".to_string()),
        };
        assert_eq!(query.category_ids(), vec![2, 5]);
    }

    #[test]
    fn category_ids_skips_malformed_entries() {
        let query = CatalogQuery {
            search: None,
            categories: Some("1, x, ,3".to_string()),
        };
        assert_eq!(query.category_ids(), vec![1, 3]);
    }

    #[test]
    fn category_ids_empty_when_absent() {
        assert!(CatalogQuery::default().category_ids().is_empty());
    }
}
