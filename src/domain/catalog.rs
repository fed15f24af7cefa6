use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Placeholder image used when an imported product has none.
pub const DEFAULT_PRODUCT_IMAGE: &str =
    "https://images.pexels.com/photos/3373736/pexels-photo-3373736.jpeg?auto=compress&cs=tinysrgb&w=400";

/// Rating from which a product counts as best-selling.
const BEST_SELLING_RATING: Decimal = Decimal::from_parts(45, 0, 0, false, 1);

/// A product row. `price` is denominated in the settlement token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    pub category: String,
    #[serde(default)]
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Unit price after the product's own discount.
    pub fn effective_price(&self) -> Decimal {
        match self.discount_percentage {
            Some(pct) if pct > Decimal::ZERO => {
                self.price * (Decimal::ONE - pct / Decimal::ONE_HUNDRED)
            }
            _ => self.price,
        }
    }

    pub fn is_discounted(&self) -> bool {
        self.discount_percentage.unwrap_or_default() > Decimal::ZERO
    }
}

/// A product category. Products reference categories by `slug`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name_en: String,
    #[serde(default)]
    pub name_tr: String,
    pub slug: String,
}

impl Category {
    /// Builds a category, deriving the slug from the English name when none is given.
    pub fn new(name_en: impl Into<String>, slug: Option<String>) -> Self {
        let name_en = name_en.into();
        let slug = slug
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| generate_slug(&name_en));
        Self {
            id: None,
            name_tr: name_en.clone(),
            name_en,
            slug,
        }
    }

    /// Whether `key` names this category by slug or by English name.
    pub fn matches(&self, key: &str) -> bool {
        self.slug == key || self.name_en.eq_ignore_ascii_case(key)
    }
}

/// Lowercases and collapses every run of non-alphanumerics into a single `-`.
pub fn generate_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Storefront product tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductTab {
    #[default]
    All,
    Featured,
    BestSelling,
    Discounted,
}

/// Storefront listing filter.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: String,
    /// Category slug; `None` means all categories.
    pub category: Option<String>,
    pub tab: ProductTab,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        let query = self.search.trim().to_lowercase();
        let matches_search = query.is_empty()
            || product.name.to_lowercase().contains(&query)
            || product.description.to_lowercase().contains(&query);
        let matches_category = self
            .category
            .as_deref()
            .is_none_or(|slug| slug == "all" || product.category == slug);
        let matches_tab = match self.tab {
            ProductTab::All => true,
            ProductTab::Featured => product.is_new == Some(true),
            ProductTab::BestSelling => product.rating.unwrap_or_default() >= BEST_SELLING_RATING,
            ProductTab::Discounted => product.is_discounted(),
        };
        matches_search && matches_category && matches_tab
    }

    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }
}

#[cfg(test)]
pub(crate) fn sample_product(id: i64, price: Decimal, stock: u32) -> Product {
    Product {
        id: Some(id),
        name: format!("Product {id}"),
        description: "A sample product".to_string(),
        price,
        image: DEFAULT_PRODUCT_IMAGE.to_string(),
        category: "skincare".to_string(),
        stock,
        product_code: None,
        barcode: None,
        cost_usd: None,
        rating: None,
        is_new: None,
        discount_percentage: None,
        created_at: None,
    }
}
