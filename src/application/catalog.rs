use super::pricing::PriceService;
use super::{first_row, from_rows, to_row};
use crate::domain::catalog::{Category, DEFAULT_PRODUCT_IMAGE, Product};
use crate::domain::ports::{Filter, Query, Table, TableStoreRef};
use crate::error::Result;
use crate::interfaces::csv::product_reader::{ImportRow, RowError};
use tracing::{debug, info};

/// Outcome of validating an import file against the catalog.
#[derive(Debug, Default)]
pub struct ImportPreview {
    pub products: Vec<Product>,
    pub errors: Vec<RowError>,
}

/// Products and categories, backed by the table store.
#[derive(Clone)]
pub struct CatalogService {
    store: TableStoreRef,
}

impl CatalogService {
    pub fn new(store: TableStoreRef) -> Self {
        Self { store }
    }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = self
            .store
            .select(Table::Products, &Query::new().order_asc("id"))
            .await?;
        from_rows(rows)
    }

    pub async fn add_product(&self, product: &Product) -> Result<Product> {
        let row = to_row(&Product {
            id: None,
            ..product.clone()
        })?;
        let rows = self.store.insert(Table::Products, vec![row]).await?;
        let stored: Product = first_row(rows, "inserted product")?;
        info!(id = ?stored.id, name = %stored.name, "product added");
        Ok(stored)
    }

    /// Updates product `id` and returns the row as the store now holds it.
    pub async fn update_product(&self, id: i64, product: &Product) -> Result<Product> {
        let patch = to_row(&Product {
            id: None,
            created_at: None,
            ..product.clone()
        })?;
        let rows = self
            .store
            .update(Table::Products, &Filter::equals("id", id), patch)
            .await?;
        let updated = first_row(rows, &format!("product {id}"))?;
        debug!(id, "product updated");
        Ok(updated)
    }

    pub async fn delete_product(&self, id: i64) -> Result<()> {
        self.store
            .delete(Table::Products, &Filter::equals("id", id))
            .await?;
        info!(id, "product deleted");
        Ok(())
    }

    pub async fn bulk_add_products(&self, products: &[Product]) -> Result<Vec<Product>> {
        if products.is_empty() {
            return Ok(Vec::new());
        }
        let rows = products
            .iter()
            .map(|p| to_row(&Product { id: None, ..p.clone() }))
            .collect::<Result<Vec<_>>>()?;
        let stored: Vec<Product> = from_rows(self.store.insert(Table::Products, rows).await?)?;
        info!(count = stored.len(), "products bulk added");
        Ok(stored)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = self
            .store
            .select(Table::Categories, &Query::new().order_asc("name_en"))
            .await?;
        from_rows(rows)
    }

    pub async fn add_category(&self, category: &Category) -> Result<Category> {
        let row = to_row(&Category {
            id: None,
            ..category.clone()
        })?;
        let rows = self.store.insert(Table::Categories, vec![row]).await?;
        let stored: Category = first_row(rows, "inserted category")?;
        info!(slug = %stored.slug, "category added");
        Ok(stored)
    }

    pub async fn update_category(&self, id: i64, category: &Category) -> Result<Category> {
        let patch = to_row(&Category {
            id: None,
            ..category.clone()
        })?;
        let rows = self
            .store
            .update(Table::Categories, &Filter::equals("id", id), patch)
            .await?;
        first_row(rows, &format!("category {id}"))
    }

    pub async fn delete_category(&self, id: i64) -> Result<()> {
        self.store
            .delete(Table::Categories, &Filter::equals("id", id))
            .await?;
        info!(id, "category deleted");
        Ok(())
    }

    /// Turns validated import rows into token-priced products.
    ///
    /// Rows naming an unknown category become errors. The rest are filed under
    /// the matching category's slug and have their USD price converted
    /// through `prices`.
    pub async fn preview_import<I>(&self, rows: I, prices: &PriceService) -> Result<ImportPreview>
    where
        I: IntoIterator<Item = std::result::Result<ImportRow, RowError>>,
    {
        let categories = self.list_categories().await?;
        let mut preview = ImportPreview::default();

        for row in rows {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    preview.errors.push(e);
                    continue;
                }
            };
            let Some(category) = categories.iter().find(|c| c.matches(&row.category)) else {
                preview.errors.push(RowError::new(
                    row.row,
                    format!("Invalid category \"{}\"", row.category),
                ));
                continue;
            };
            let price = prices.usd_to_token(row.price_usd).await;
            preview.products.push(Product {
                id: None,
                name: row.name,
                description: row.description,
                price,
                image: row
                    .image
                    .unwrap_or_else(|| DEFAULT_PRODUCT_IMAGE.to_string()),
                category: category.slug.clone(),
                stock: row.stock,
                product_code: Some(row.product_code),
                barcode: row.barcode,
                cost_usd: row.cost_usd,
                rating: None,
                is_new: None,
                discount_percentage: None,
                created_at: None,
            });
        }

        debug!(
            valid = preview.products.len(),
            errors = preview.errors.len(),
            "import previewed"
        );
        Ok(preview)
    }
}
